use crate::CapabilityKind;
use estate_common::ids::CapabilityId;
use serde::{Deserialize, Serialize};

/// Leaf permission tied to one protected resource of the host application.
///
/// # Invariants
/// - `name` is unique across the registry and equals the resource identifier
///   the host application uses to gate a feature.
/// - `id` never changes once a relation references it.
///
/// # Example
/// ```rust
/// use estate_authz::{Capability, CapabilityKind};
///
/// let cap = Capability::new("frmContracts", "contracts", CapabilityKind::Screen);
/// assert_eq!(cap.name, "frmContracts");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    pub id: CapabilityId,
    pub name: String,
    pub data_key: String,
    pub kind: CapabilityKind,
}

impl Capability {
    pub fn new(name: impl Into<String>, data_key: impl Into<String>, kind: CapabilityKind) -> Self {
        Self {
            id: CapabilityId::new(),
            name: name.into(),
            data_key: data_key.into(),
            kind,
        }
    }
}
