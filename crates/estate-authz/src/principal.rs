use crate::AccessRef;
use estate_common::ids::PrincipalId;
use serde::{Deserialize, Serialize};

/// An identity holding direct grants of capabilities and/or roles.
///
/// `credential_hash` is opaque to this crate; it is stored and returned as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    pub user_name: String,
    #[serde(skip_serializing)]
    #[serde(default)]
    pub credential_hash: String,
    #[serde(default)]
    pub direct_grants: Vec<AccessRef>,
}

impl Principal {
    pub fn new(user_name: impl Into<String>, credential_hash: impl Into<String>) -> Self {
        Self {
            id: PrincipalId::new(),
            user_name: user_name.into(),
            credential_hash: credential_hash.into(),
            direct_grants: Vec::new(),
        }
    }
}
