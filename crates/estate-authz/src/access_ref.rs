//! Tagged references to grantable entities.
//!
//! # Purpose
//! An [`AccessRef`] points at either a leaf capability or a composite role by
//! id. Role children and principal grants are stored as lists of these, so the
//! containment graph is a graph of ids with no in-memory reference cycles.
//!
//! # Key invariants
//! - The textual form is `capability:<uuid>` or `role:<uuid>`.
//! - Matching on the tag is exhaustive; there is no runtime type inspection.
//!
//! # Examples
//! ```rust
//! use estate_authz::AccessRef;
//! use estate_common::ids::RoleId;
//!
//! let role = RoleId::new();
//! let grant = AccessRef::Composite(role);
//! assert_eq!(grant.as_role(), Some(role));
//! assert_eq!(grant.to_string().parse::<AccessRef>().ok(), Some(grant));
//! ```
use crate::{AuthzError, AuthzResult};
use estate_common::ids::{CapabilityId, RoleId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum AccessRef {
    /// A single capability.
    #[serde(rename = "capability")]
    Leaf(CapabilityId),
    /// A role whose children are expanded during resolution.
    #[serde(rename = "role")]
    Composite(RoleId),
}

impl AccessRef {
    pub fn as_capability(&self) -> Option<CapabilityId> {
        match self {
            AccessRef::Leaf(id) => Some(*id),
            AccessRef::Composite(_) => None,
        }
    }

    pub fn as_role(&self) -> Option<RoleId> {
        match self {
            AccessRef::Leaf(_) => None,
            AccessRef::Composite(id) => Some(*id),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            AccessRef::Leaf(_) => "capability",
            AccessRef::Composite(_) => "role",
        }
    }
}

impl From<CapabilityId> for AccessRef {
    fn from(id: CapabilityId) -> Self {
        AccessRef::Leaf(id)
    }
}

impl From<RoleId> for AccessRef {
    fn from(id: RoleId) -> Self {
        AccessRef::Composite(id)
    }
}

impl std::fmt::Display for AccessRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessRef::Leaf(id) => write!(f, "{}:{id}", self.tag()),
            AccessRef::Composite(id) => write!(f, "{}:{id}", self.tag()),
        }
    }
}

impl std::str::FromStr for AccessRef {
    type Err = AuthzError;

    fn from_str(value: &str) -> AuthzResult<Self> {
        let (tag, id) = value
            .split_once(':')
            .ok_or_else(|| AuthzError::InvalidAccessRef(value.to_string()))?;
        match tag {
            "capability" => Ok(AccessRef::Leaf(id.parse()?)),
            "role" => Ok(AccessRef::Composite(id.parse()?)),
            _ => Err(AuthzError::InvalidAccessRef(value.to_string())),
        }
    }
}
