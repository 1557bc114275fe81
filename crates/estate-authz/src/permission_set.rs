//! Flattened, deduplicated capability set held by a principal.
//!
//! # Purpose
//! The resolver produces a [`PermissionSet`]; the authorization checker asks
//! it whether a resource identifier is allowed.
//!
//! # Key invariants
//! - Each capability id appears once; inserting again is a no-op.
//! - `allows` matches resource identifiers exactly (no wildcards).
//!
//! # Examples
//! ```rust
//! use estate_authz::PermissionSet;
//! use estate_common::ids::CapabilityId;
//!
//! let mut set = PermissionSet::default();
//! let id = CapabilityId::new();
//! assert!(set.insert(id, "frmLeases"));
//! assert!(!set.insert(id, "frmLeases"));
//! assert!(set.allows("frmLeases"));
//! assert!(!set.allows("frmOwners"));
//! ```
use estate_common::ids::CapabilityId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    by_id: HashMap<CapabilityId, String>,
    resources: BTreeSet<String>,
}

impl PermissionSet {
    /// Record a capability; returns `false` when it was already present.
    pub fn insert(&mut self, id: CapabilityId, resource: impl Into<String>) -> bool {
        if self.by_id.contains_key(&id) {
            return false;
        }
        let resource = resource.into();
        self.resources.insert(resource.clone());
        self.by_id.insert(id, resource);
        true
    }

    pub fn contains(&self, id: &CapabilityId) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn allows(&self, resource: &str) -> bool {
        self.resources.contains(resource)
    }

    pub fn capability_ids(&self) -> BTreeSet<CapabilityId> {
        self.by_id.keys().copied().collect()
    }

    /// Resource identifiers in sorted order.
    pub fn resources(&self) -> impl Iterator<Item = &str> {
        self.resources.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_denies_everything() {
        let set = PermissionSet::default();
        assert!(set.is_empty());
        assert!(!set.allows(""));
        assert!(!set.allows("frmLeases"));
    }

    #[test]
    fn resources_are_sorted_and_unique() {
        let mut set = PermissionSet::default();
        let a = CapabilityId::new();
        let b = CapabilityId::new();
        set.insert(b, "frmOwners");
        set.insert(a, "frmAgents");
        set.insert(a, "frmAgents");

        assert_eq!(set.len(), 2);
        assert_eq!(set.resources().collect::<Vec<_>>(), vec!["frmAgents", "frmOwners"]);
        assert_eq!(set.capability_ids(), BTreeSet::from([a, b]));
        assert!(set.contains(&a));
    }
}
