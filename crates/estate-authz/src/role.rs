use crate::AccessRef;
use estate_common::ids::RoleId;
use serde::{Deserialize, Serialize};

/// Composite grouping of capabilities and other roles.
///
/// `children` is the ordered list of direct children only; nested roles are
/// referenced by id and expanded by the resolver. The Role→Role edges across
/// all roles must stay acyclic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub children: Vec<AccessRef>,
}

impl Role {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: RoleId::new(),
            name: name.into(),
            description: description.into(),
            children: Vec::new(),
        }
    }

    pub fn contains(&self, child: &AccessRef) -> bool {
        self.children.contains(child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use estate_common::ids::CapabilityId;

    #[test]
    fn contains_matches_tag_and_id() {
        let cap = CapabilityId::new();
        let nested = RoleId::new();
        let mut role = Role::new("Leasing", "Leasing staff");
        role.children.push(AccessRef::Leaf(cap));
        role.children.push(AccessRef::Composite(nested));

        assert!(role.contains(&AccessRef::Composite(nested)));
        assert!(role.contains(&AccessRef::Leaf(cap)));
        assert!(!role.contains(&AccessRef::Leaf(CapabilityId::new())));
    }
}
