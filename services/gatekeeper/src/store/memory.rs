//! In-memory implementation of the access store.
//!
//! # Purpose
//! Implements [`AccessStore`] with `HashMap`s guarded by `tokio::sync::RwLock`.
//! It backs local development, tests, and hosts that load their access model
//! from a seed file at start-up.
//!
//! # Durability and consistency
//! - **Not durable**: all state is lost on process restart.
//! - Relation rows live in two ordered adjacency maps: role children
//!   (Role→Capability and Role→Role) and principal grants (User→Capability and
//!   User→Role). Child order is insertion order.
//! - Referential integrity is checked while holding read locks on the entity
//!   maps, so an entity cannot disappear between the check and the insert.
//!
//! # Lock ordering
//! Locks are always taken in the order capabilities, roles, principals,
//! role children, principal grants. Every method follows it to stay
//! deadlock-free.
use super::{AccessStore, StoreError, StoreResult};
use async_trait::async_trait;
use estate_authz::{AccessRef, Capability, Principal, Relation, Role};
use estate_common::ids::{CapabilityId, PrincipalId, RoleId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type Adjacency<K> = Arc<RwLock<HashMap<K, Vec<AccessRef>>>>;

/// In-memory access store.
///
/// All maps are wrapped in `Arc<RwLock<...>>` so the store can be shared across
/// tasks; reads proceed concurrently and writes are serialized per map.
#[derive(Default)]
pub struct InMemoryStore {
    /// Capabilities keyed by id.
    capabilities: Arc<RwLock<HashMap<CapabilityId, Capability>>>,
    /// Role metadata keyed by id. Stored roles always have empty `children`.
    roles: Arc<RwLock<HashMap<RoleId, Role>>>,
    /// Principals keyed by id. Stored principals always have empty grants.
    principals: Arc<RwLock<HashMap<PrincipalId, Principal>>>,
    /// Ordered direct children per role.
    role_children: Adjacency<RoleId>,
    /// Ordered direct grants per principal.
    principal_grants: Adjacency<PrincipalId>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a relation row without any integrity check.
    ///
    /// Only used to simulate a corrupted backend in tests.
    #[cfg(test)]
    pub(crate) async fn insert_unchecked(&self, relation: Relation) {
        match relation {
            Relation::UserCapability { principal, .. } | Relation::UserRole { principal, .. } => {
                self.principal_grants
                    .write()
                    .await
                    .entry(principal)
                    .or_default()
                    .push(relation.target());
            }
            Relation::RoleCapability { role: parent, .. } | Relation::RoleRole { parent, .. } => {
                self.role_children
                    .write()
                    .await
                    .entry(parent)
                    .or_default()
                    .push(relation.target());
            }
        }
    }
}

fn detach(adjacency: &mut HashMap<impl std::hash::Hash + Eq, Vec<AccessRef>>, target: AccessRef) {
    for refs in adjacency.values_mut() {
        refs.retain(|item| *item != target);
    }
}

fn record_relation_change(relation: &Relation, op: &'static str) {
    metrics::counter!(
        "estate_relation_changes_total",
        "kind" => relation.kind().as_str(),
        "op" => op
    )
    .increment(1);
}

#[async_trait]
impl AccessStore for InMemoryStore {
    async fn create_capability(&self, capability: Capability) -> StoreResult<Capability> {
        let mut capabilities = self.capabilities.write().await;
        if capabilities.contains_key(&capability.id) {
            return Err(StoreError::Conflict("capability id exists".into()));
        }
        if capabilities.values().any(|cap| cap.name == capability.name) {
            return Err(StoreError::Conflict(format!(
                "capability name exists: {}",
                capability.name
            )));
        }
        capabilities.insert(capability.id, capability.clone());
        metrics::gauge!("estate_capabilities_total").set(capabilities.len() as f64);
        Ok(capability)
    }

    async fn update_capability(&self, capability: Capability) -> StoreResult<Capability> {
        let mut capabilities = self.capabilities.write().await;
        if !capabilities.contains_key(&capability.id) {
            return Err(StoreError::NotFound("capability".into()));
        }
        if capabilities
            .values()
            .any(|cap| cap.id != capability.id && cap.name == capability.name)
        {
            return Err(StoreError::Conflict(format!(
                "capability name exists: {}",
                capability.name
            )));
        }
        capabilities.insert(capability.id, capability.clone());
        Ok(capability)
    }

    async fn delete_capability(&self, id: CapabilityId) -> StoreResult<()> {
        let mut capabilities = self.capabilities.write().await;
        if capabilities.remove(&id).is_none() {
            return Err(StoreError::NotFound("capability".into()));
        }
        metrics::gauge!("estate_capabilities_total").set(capabilities.len() as f64);
        // Detach rows pointing at the capability; roles and principals survive.
        detach(&mut *self.role_children.write().await, AccessRef::Leaf(id));
        detach(&mut *self.principal_grants.write().await, AccessRef::Leaf(id));
        Ok(())
    }

    async fn get_capability(&self, id: CapabilityId) -> StoreResult<Capability> {
        self.capabilities
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("capability".into()))
    }

    async fn find_capability_by_name(&self, name: &str) -> StoreResult<Option<Capability>> {
        Ok(self
            .capabilities
            .read()
            .await
            .values()
            .find(|cap| cap.name == name)
            .cloned())
    }

    async fn list_capabilities(&self) -> StoreResult<Vec<Capability>> {
        Ok(self.capabilities.read().await.values().cloned().collect())
    }

    async fn create_role(&self, mut role: Role) -> StoreResult<Role> {
        let mut roles = self.roles.write().await;
        if roles.contains_key(&role.id) {
            return Err(StoreError::Conflict("role id exists".into()));
        }
        role.children.clear();
        roles.insert(role.id, role.clone());
        metrics::gauge!("estate_roles_total").set(roles.len() as f64);
        Ok(role)
    }

    async fn update_role(&self, role: Role) -> StoreResult<Role> {
        let mut roles = self.roles.write().await;
        let Some(existing) = roles.get_mut(&role.id) else {
            return Err(StoreError::NotFound("role".into()));
        };
        existing.name = role.name;
        existing.description = role.description;
        let mut updated = existing.clone();
        drop(roles);
        updated.children = self
            .role_children
            .read()
            .await
            .get(&updated.id)
            .cloned()
            .unwrap_or_default();
        Ok(updated)
    }

    async fn delete_role(&self, id: RoleId) -> StoreResult<()> {
        let mut roles = self.roles.write().await;
        if roles.remove(&id).is_none() {
            return Err(StoreError::NotFound("role".into()));
        }
        metrics::gauge!("estate_roles_total").set(roles.len() as f64);
        drop(roles);
        // Drop the role's own child rows and its membership in every parent;
        // the child entities themselves are left untouched.
        let mut children = self.role_children.write().await;
        children.remove(&id);
        detach(&mut *children, AccessRef::Composite(id));
        drop(children);
        detach(
            &mut *self.principal_grants.write().await,
            AccessRef::Composite(id),
        );
        Ok(())
    }

    async fn get_role(&self, id: RoleId) -> StoreResult<Role> {
        let mut role = self
            .roles
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("role".into()))?;
        role.children = self
            .role_children
            .read()
            .await
            .get(&id)
            .cloned()
            .unwrap_or_default();
        Ok(role)
    }

    async fn list_roles(&self) -> StoreResult<Vec<Role>> {
        let roles = self.roles.read().await;
        let children = self.role_children.read().await;
        Ok(roles
            .values()
            .map(|role| {
                let mut role = role.clone();
                role.children = children.get(&role.id).cloned().unwrap_or_default();
                role
            })
            .collect())
    }

    async fn create_principal(&self, mut principal: Principal) -> StoreResult<Principal> {
        let mut principals = self.principals.write().await;
        if principals.contains_key(&principal.id) {
            return Err(StoreError::Conflict("principal id exists".into()));
        }
        if principals
            .values()
            .any(|item| item.user_name == principal.user_name)
        {
            return Err(StoreError::Conflict(format!(
                "user name exists: {}",
                principal.user_name
            )));
        }
        principal.direct_grants.clear();
        principals.insert(principal.id, principal.clone());
        Ok(principal)
    }

    async fn update_principal(&self, principal: Principal) -> StoreResult<Principal> {
        let mut principals = self.principals.write().await;
        if !principals.contains_key(&principal.id) {
            return Err(StoreError::NotFound("principal".into()));
        }
        if principals
            .values()
            .any(|item| item.id != principal.id && item.user_name == principal.user_name)
        {
            return Err(StoreError::Conflict(format!(
                "user name exists: {}",
                principal.user_name
            )));
        }
        let Some(existing) = principals.get_mut(&principal.id) else {
            return Err(StoreError::NotFound("principal".into()));
        };
        existing.user_name = principal.user_name;
        existing.credential_hash = principal.credential_hash;
        let mut updated = existing.clone();
        drop(principals);
        updated.direct_grants = self
            .principal_grants
            .read()
            .await
            .get(&updated.id)
            .cloned()
            .unwrap_or_default();
        Ok(updated)
    }

    async fn delete_principal(&self, id: PrincipalId) -> StoreResult<()> {
        let mut principals = self.principals.write().await;
        if principals.remove(&id).is_none() {
            return Err(StoreError::NotFound("principal".into()));
        }
        drop(principals);
        self.principal_grants.write().await.remove(&id);
        Ok(())
    }

    async fn get_principal(&self, id: PrincipalId) -> StoreResult<Principal> {
        let mut principal = self
            .principals
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("principal".into()))?;
        principal.direct_grants = self
            .principal_grants
            .read()
            .await
            .get(&id)
            .cloned()
            .unwrap_or_default();
        Ok(principal)
    }

    async fn find_principal_by_user_name(
        &self,
        user_name: &str,
    ) -> StoreResult<Option<Principal>> {
        let found = self
            .principals
            .read()
            .await
            .values()
            .find(|item| item.user_name == user_name)
            .map(|item| item.id);
        match found {
            Some(id) => self.get_principal(id).await.map(Some),
            None => Ok(None),
        }
    }

    async fn list_principals(&self) -> StoreResult<Vec<Principal>> {
        let principals = self.principals.read().await;
        let grants = self.principal_grants.read().await;
        Ok(principals
            .values()
            .map(|principal| {
                let mut principal = principal.clone();
                principal.direct_grants = grants.get(&principal.id).cloned().unwrap_or_default();
                principal
            })
            .collect())
    }

    async fn add_relation(&self, relation: Relation) -> StoreResult<()> {
        // Hold read locks on every entity map until the row is written.
        let capabilities = self.capabilities.read().await;
        let roles = self.roles.read().await;
        let principals = self.principals.read().await;

        let target_exists = match relation.target() {
            AccessRef::Leaf(id) => capabilities.contains_key(&id),
            AccessRef::Composite(id) => roles.contains_key(&id),
        };
        if !target_exists {
            return Err(StoreError::NotFound(relation.target().to_string()));
        }

        match relation {
            Relation::UserCapability { principal, .. } | Relation::UserRole { principal, .. } => {
                if !principals.contains_key(&principal) {
                    return Err(StoreError::NotFound("principal".into()));
                }
                let mut grants = self.principal_grants.write().await;
                let entry = grants.entry(principal).or_default();
                if !entry.contains(&relation.target()) {
                    entry.push(relation.target());
                }
            }
            Relation::RoleCapability { role: parent, .. } | Relation::RoleRole { parent, .. } => {
                if !roles.contains_key(&parent) {
                    return Err(StoreError::NotFound("role".into()));
                }
                let mut children = self.role_children.write().await;
                let entry = children.entry(parent).or_default();
                if !entry.contains(&relation.target()) {
                    entry.push(relation.target());
                }
            }
        }
        record_relation_change(&relation, "added");
        Ok(())
    }

    async fn remove_relation(&self, relation: Relation) -> StoreResult<()> {
        let target = relation.target();
        let removed = match relation {
            Relation::UserCapability { principal, .. } | Relation::UserRole { principal, .. } => {
                let mut grants = self.principal_grants.write().await;
                grants.get_mut(&principal).is_some_and(|entry| {
                    let before = entry.len();
                    entry.retain(|item| *item != target);
                    entry.len() != before
                })
            }
            Relation::RoleCapability { role: parent, .. } | Relation::RoleRole { parent, .. } => {
                let mut children = self.role_children.write().await;
                children.get_mut(&parent).is_some_and(|entry| {
                    let before = entry.len();
                    entry.retain(|item| *item != target);
                    entry.len() != before
                })
            }
        };
        if !removed {
            return Err(StoreError::NotFound(format!("relation {relation}")));
        }
        record_relation_change(&relation, "removed");
        Ok(())
    }

    async fn role_children(&self, id: RoleId) -> StoreResult<Vec<AccessRef>> {
        if !self.roles.read().await.contains_key(&id) {
            return Err(StoreError::NotFound("role".into()));
        }
        Ok(self
            .role_children
            .read()
            .await
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    async fn principal_grants(&self, id: PrincipalId) -> StoreResult<Vec<AccessRef>> {
        if !self.principals.read().await.contains_key(&id) {
            return Err(StoreError::NotFound("principal".into()));
        }
        Ok(self
            .principal_grants
            .read()
            .await
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    async fn health_check(&self) -> StoreResult<()> {
        // Nothing external to reach; the maps are always available.
        Ok(())
    }

    /// In-memory store does not persist state and is therefore not durable.
    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use estate_authz::CapabilityKind;

    fn capability(name: &str) -> Capability {
        Capability::new(name, name, CapabilityKind::Screen)
    }

    #[tokio::test]
    async fn capability_name_conflicts() {
        let store = InMemoryStore::new();
        store
            .create_capability(capability("frmLeases"))
            .await
            .expect("capability");

        let err = store
            .create_capability(capability("frmLeases"))
            .await
            .expect_err("conflict");
        assert!(matches!(err, StoreError::Conflict(_)));

        let mut other = store
            .create_capability(capability("frmOwners"))
            .await
            .expect("capability");
        other.name = "frmLeases".to_string();
        let err = store.update_capability(other).await.expect_err("rename");
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn relations_require_both_ends() {
        let store = InMemoryStore::new();
        let role = store
            .create_role(Role::new("Leasing", ""))
            .await
            .expect("role");
        let missing_cap = CapabilityId::new();

        let err = store
            .add_relation(Relation::child(role.id, AccessRef::Leaf(missing_cap)))
            .await
            .expect_err("missing capability");
        assert!(matches!(err, StoreError::NotFound(_)));

        let cap = store
            .create_capability(capability("frmLeases"))
            .await
            .expect("capability");
        let err = store
            .add_relation(Relation::child(RoleId::new(), AccessRef::Leaf(cap.id)))
            .await
            .expect_err("missing parent");
        assert!(matches!(err, StoreError::NotFound(_)));

        let err = store
            .add_relation(Relation::grant(PrincipalId::new(), AccessRef::Leaf(cap.id)))
            .await
            .expect_err("missing principal");
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn duplicate_rows_are_collapsed_and_order_kept() {
        let store = InMemoryStore::new();
        let role = store
            .create_role(Role::new("Leasing", ""))
            .await
            .expect("role");
        let a = store
            .create_capability(capability("frmA"))
            .await
            .expect("a");
        let b = store
            .create_capability(capability("frmB"))
            .await
            .expect("b");

        for child in [a.id, b.id, a.id] {
            store
                .add_relation(Relation::child(role.id, AccessRef::Leaf(child)))
                .await
                .expect("relation");
        }

        let children = store.role_children(role.id).await.expect("children");
        assert_eq!(children, vec![AccessRef::Leaf(a.id), AccessRef::Leaf(b.id)]);
    }

    #[tokio::test]
    async fn delete_role_detaches_both_directions() {
        let store = InMemoryStore::new();
        let parent = store
            .create_role(Role::new("Parent", ""))
            .await
            .expect("parent");
        let middle = store
            .create_role(Role::new("Middle", ""))
            .await
            .expect("middle");
        let leaf_role = store
            .create_role(Role::new("Leaf", ""))
            .await
            .expect("leaf");
        let cap = store
            .create_capability(capability("frmA"))
            .await
            .expect("cap");
        let user = store
            .create_principal(Principal::new("ana", "hash"))
            .await
            .expect("principal");

        store
            .add_relation(Relation::child(parent.id, AccessRef::Composite(middle.id)))
            .await
            .expect("edge");
        store
            .add_relation(Relation::child(middle.id, AccessRef::Composite(leaf_role.id)))
            .await
            .expect("edge");
        store
            .add_relation(Relation::child(middle.id, AccessRef::Leaf(cap.id)))
            .await
            .expect("edge");
        store
            .add_relation(Relation::grant(user.id, AccessRef::Composite(middle.id)))
            .await
            .expect("grant");

        store.delete_role(middle.id).await.expect("delete");

        assert!(store.role_children(parent.id).await.expect("children").is_empty());
        assert!(store.principal_grants(user.id).await.expect("grants").is_empty());
        store.get_role(leaf_role.id).await.expect("leaf role survives");
        store.get_capability(cap.id).await.expect("capability survives");
        let err = store.role_children(middle.id).await.expect_err("gone");
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_capability_detaches_relations() {
        let store = InMemoryStore::new();
        let role = store
            .create_role(Role::new("Leasing", ""))
            .await
            .expect("role");
        let cap = store
            .create_capability(capability("frmA"))
            .await
            .expect("cap");
        let user = store
            .create_principal(Principal::new("ana", "hash"))
            .await
            .expect("principal");
        store
            .add_relation(Relation::child(role.id, AccessRef::Leaf(cap.id)))
            .await
            .expect("edge");
        store
            .add_relation(Relation::grant(user.id, AccessRef::Leaf(cap.id)))
            .await
            .expect("grant");

        store.delete_capability(cap.id).await.expect("delete");

        assert!(store.get_role(role.id).await.expect("role").children.is_empty());
        assert!(store.get_principal(user.id).await.expect("user").direct_grants.is_empty());
    }

    #[tokio::test]
    async fn remove_missing_relation_is_not_found() {
        let store = InMemoryStore::new();
        let role = store
            .create_role(Role::new("Leasing", ""))
            .await
            .expect("role");
        let err = store
            .remove_relation(Relation::child(role.id, AccessRef::Leaf(CapabilityId::new())))
            .await
            .expect_err("missing row");
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn user_names_are_unique() {
        let store = InMemoryStore::new();
        store
            .create_principal(Principal::new("ana", "h1"))
            .await
            .expect("principal");
        let err = store
            .create_principal(Principal::new("ana", "h2"))
            .await
            .expect_err("conflict");
        assert!(matches!(err, StoreError::Conflict(_)));
        let found = store
            .find_principal_by_user_name("ana")
            .await
            .expect("lookup")
            .expect("present");
        assert_eq!(found.credential_hash, "h1");
    }

    #[tokio::test]
    async fn backend_health_and_identity() {
        let store = InMemoryStore::new();
        store.health_check().await.expect("health");
        assert!(!store.is_durable());
        assert_eq!(store.backend_name(), "memory");
    }
}
