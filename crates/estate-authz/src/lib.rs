//! Capability/role/principal primitives for the estate access-control core.
//!
//! # Purpose
//! Defines the data model shared by the store, the resolver and the service
//! layer: leaf [`Capability`] entries, composite [`Role`] groupings,
//! [`Principal`] identities, the tagged [`AccessRef`] used for children and
//! grants, the [`Relation`] rows that persist them, and the flattened
//! [`PermissionSet`] produced by resolution.
//!
//! # How it fits
//! The `gatekeeper` service owns persistence and the algorithms (cycle guard,
//! resolver, registry synchronizer); this crate holds only plain data so it can
//! be shared with host applications without pulling in the runtime.
//!
//! # Key invariants
//! - Roles reference children by id, never by object, so the containment graph
//!   cannot form memory cycles.
//! - A capability `name` is the resource identifier the host application gates.
//!
//! # Examples
//! ```rust
//! use estate_authz::{AccessRef, Capability, CapabilityKind, Role};
//!
//! let cap = Capability::new("frmContracts", "contracts", CapabilityKind::Screen);
//! let mut role = Role::new("Leasing", "Leasing staff");
//! role.children.push(AccessRef::Leaf(cap.id));
//! assert!(role.contains(&AccessRef::Leaf(cap.id)));
//! ```

mod access_ref;
mod capability;
mod errors;
mod kind;
mod permission_set;
mod principal;
mod relation;
mod role;

pub use access_ref::AccessRef;
pub use capability::Capability;
pub use errors::{AuthzError, AuthzResult};
pub use kind::CapabilityKind;
pub use permission_set::PermissionSet;
pub use principal::Principal;
pub use relation::{Relation, RelationKind};
pub use role::Role;
