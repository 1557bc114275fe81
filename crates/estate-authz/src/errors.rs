use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthzError {
    #[error("invalid capability kind: {0}")]
    InvalidCapabilityKind(String),
    #[error("invalid access reference: {0}")]
    InvalidAccessRef(String),
    #[error(transparent)]
    Common(#[from] estate_common::Error),
}

pub type AuthzResult<T> = Result<T, AuthzError>;
