//! Association rows between principals, roles and capabilities.
//!
//! # Purpose
//! Relations are persisted separately from the entities they connect. Each
//! row is a pair of ids; the variant is the relation kind, so a row can never
//! pair ids of the wrong entity types.
use crate::AccessRef;
use estate_common::ids::{CapabilityId, PrincipalId, RoleId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    UserCapability,
    UserRole,
    RoleCapability,
    RoleRole,
}

impl RelationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationKind::UserCapability => "user_capability",
            RelationKind::UserRole => "user_role",
            RelationKind::RoleCapability => "role_capability",
            RelationKind::RoleRole => "role_role",
        }
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Relation {
    UserCapability {
        principal: PrincipalId,
        capability: CapabilityId,
    },
    UserRole {
        principal: PrincipalId,
        role: RoleId,
    },
    RoleCapability {
        role: RoleId,
        capability: CapabilityId,
    },
    RoleRole {
        parent: RoleId,
        child: RoleId,
    },
}

impl Relation {
    /// Relation row granting `grant` directly to `principal`.
    pub fn grant(principal: PrincipalId, grant: AccessRef) -> Self {
        match grant {
            AccessRef::Leaf(capability) => Relation::UserCapability {
                principal,
                capability,
            },
            AccessRef::Composite(role) => Relation::UserRole { principal, role },
        }
    }

    /// Relation row placing `child` under `parent`.
    pub fn child(parent: RoleId, child: AccessRef) -> Self {
        match child {
            AccessRef::Leaf(capability) => Relation::RoleCapability {
                role: parent,
                capability,
            },
            AccessRef::Composite(child) => Relation::RoleRole { parent, child },
        }
    }

    pub fn kind(&self) -> RelationKind {
        match self {
            Relation::UserCapability { .. } => RelationKind::UserCapability,
            Relation::UserRole { .. } => RelationKind::UserRole,
            Relation::RoleCapability { .. } => RelationKind::RoleCapability,
            Relation::RoleRole { .. } => RelationKind::RoleRole,
        }
    }

    /// The referenced grantable on the "to" side of the row.
    pub fn target(&self) -> AccessRef {
        match self {
            Relation::UserCapability { capability, .. }
            | Relation::RoleCapability { capability, .. } => AccessRef::Leaf(*capability),
            Relation::UserRole { role, .. } => AccessRef::Composite(*role),
            Relation::RoleRole { child, .. } => AccessRef::Composite(*child),
        }
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Relation::UserCapability {
                principal,
                capability,
            } => write!(f, "{}({principal} -> {capability})", self.kind()),
            Relation::UserRole { principal, role } => {
                write!(f, "{}({principal} -> {role})", self.kind())
            }
            Relation::RoleCapability { role, capability } => {
                write!(f, "{}({role} -> {capability})", self.kind())
            }
            Relation::RoleRole { parent, child } => {
                write!(f, "{}({parent} -> {child})", self.kind())
            }
        }
    }
}
