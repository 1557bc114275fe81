//! Error taxonomy for the access-control core.
//!
//! # Purpose
//! Separates validation failures the caller must see (`DuplicateName`,
//! `CompositeCycle`), lookups on unknown ids (`NotFound`), and opaque store
//! failures (`Store`), which are carried unchanged.
//!
//! # Notes
//! `DanglingReference` is produced while resolving a corrupted graph and is
//! logged and skipped there; it only reaches callers from operations that
//! hydrate a specific reference.
use crate::store::StoreError;
use estate_authz::AccessRef;
use estate_common::ids::RoleId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("name already registered: {0}")]
    DuplicateName(String),
    #[error("adding role {child} under role {parent} would create a cycle")]
    CompositeCycle { parent: RoleId, child: RoleId },
    #[error("dangling reference: {0}")]
    DanglingReference(AccessRef),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid name: {0:?}")]
    InvalidName(String),
    #[error(transparent)]
    Store(StoreError),
}

pub type AccessResult<T> = Result<T, AccessError>;

impl From<StoreError> for AccessError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => AccessError::NotFound(what),
            other => AccessError::Store(other),
        }
    }
}

impl AccessError {
    /// Whether the error is a validation rejection an administrator can act on.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AccessError::DuplicateName(_)
                | AccessError::CompositeCycle { .. }
                | AccessError::InvalidName(_)
        )
    }
}
