use async_trait::async_trait;
use estate_authz::{AccessRef, Capability, Principal, Relation, Role};
use estate_common::ids::{CapabilityId, PrincipalId, RoleId};
use thiserror::Error;

pub mod memory;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence contract for the access-control core.
///
/// Entities are keyed by id. Relations are stored separately as id pairs and
/// every `add_relation` must verify both ends exist. Deleting an entity detaches
/// every relation row that references it and nothing else.
///
/// `create_capability` returns [`StoreError::Conflict`] when the name is taken;
/// `update_capability` does the same on a rename onto an existing name.
#[async_trait]
pub trait AccessStore: Send + Sync {
    async fn create_capability(&self, capability: Capability) -> StoreResult<Capability>;
    async fn update_capability(&self, capability: Capability) -> StoreResult<Capability>;
    async fn delete_capability(&self, id: CapabilityId) -> StoreResult<()>;
    async fn get_capability(&self, id: CapabilityId) -> StoreResult<Capability>;
    async fn find_capability_by_name(&self, name: &str) -> StoreResult<Option<Capability>>;
    async fn list_capabilities(&self) -> StoreResult<Vec<Capability>>;

    /// Stores the role's name and description; `children` are managed only
    /// through relations and are ignored here.
    async fn create_role(&self, role: Role) -> StoreResult<Role>;
    async fn update_role(&self, role: Role) -> StoreResult<Role>;
    async fn delete_role(&self, id: RoleId) -> StoreResult<()>;
    /// Returns the role with its direct children, in insertion order.
    async fn get_role(&self, id: RoleId) -> StoreResult<Role>;
    async fn list_roles(&self) -> StoreResult<Vec<Role>>;

    /// Stores the principal's identity; grants are managed through relations.
    async fn create_principal(&self, principal: Principal) -> StoreResult<Principal>;
    async fn update_principal(&self, principal: Principal) -> StoreResult<Principal>;
    async fn delete_principal(&self, id: PrincipalId) -> StoreResult<()>;
    async fn get_principal(&self, id: PrincipalId) -> StoreResult<Principal>;
    async fn find_principal_by_user_name(&self, user_name: &str)
    -> StoreResult<Option<Principal>>;
    async fn list_principals(&self) -> StoreResult<Vec<Principal>>;

    /// Inserts a relation row. Re-inserting an existing row is a no-op.
    async fn add_relation(&self, relation: Relation) -> StoreResult<()>;
    async fn remove_relation(&self, relation: Relation) -> StoreResult<()>;
    async fn role_children(&self, id: RoleId) -> StoreResult<Vec<AccessRef>>;
    async fn principal_grants(&self, id: PrincipalId) -> StoreResult<Vec<AccessRef>>;

    async fn health_check(&self) -> StoreResult<()>;
    fn is_durable(&self) -> bool;
    fn backend_name(&self) -> &'static str;
}
