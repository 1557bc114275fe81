#![allow(dead_code)]

use async_trait::async_trait;
use estate_authz::{AccessRef, Capability, CapabilityKind, Principal, Relation, Role};
use estate_common::ids::{CapabilityId, PrincipalId, RoleId};
use gatekeeper::access::AccessCore;
use gatekeeper::store::memory::InMemoryStore;
use gatekeeper::store::{AccessStore, StoreResult};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
}

pub fn memory_core(cache: bool) -> AccessCore {
    AccessCore::new(Arc::new(InMemoryStore::new()), cache)
}

pub async fn capability(core: &AccessCore, name: &str) -> CapabilityId {
    core.registry
        .create(name, name, CapabilityKind::Screen)
        .await
        .expect("create capability")
        .id
}

pub async fn role(core: &AccessCore, name: &str, children: &[AccessRef]) -> RoleId {
    let role = core.roles.create(name, "").await.expect("create role");
    for child in children {
        core.roles.add_child(role.id, *child).await.expect("add child");
    }
    role.id
}

pub async fn user(core: &AccessCore, name: &str, grants: &[AccessRef]) -> PrincipalId {
    let principal = core.principals.create(name, "").await.expect("create user");
    for grant in grants {
        core.principals
            .grant(principal.id, *grant)
            .await
            .expect("grant");
    }
    principal.id
}

/// Where a [`TestStore`] holds the first caller until a second one arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldPoint {
    RoleChildren,
    ListCapabilities,
}

/// Lines up two concurrent callers at one store call.
///
/// The first caller waits until the second arrives or `patience` elapses,
/// whichever comes first; later callers pass straight through. If the code
/// under test serializes the two callers, the second never arrives while the
/// first is held and the wait simply times out.
struct Rendezvous {
    point: HoldPoint,
    patience: Duration,
    arrivals: AtomicUsize,
    met: AtomicBool,
    ready: Notify,
}

impl Rendezvous {
    async fn hold(&self) {
        if self.met.load(Ordering::Acquire) {
            return;
        }
        let notified = self.ready.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.arrivals.fetch_add(1, Ordering::AcqRel) + 1 >= 2 {
            self.met.store(true, Ordering::Release);
            self.ready.notify_waiters();
            return;
        }
        let _ = tokio::time::timeout(self.patience, notified).await;
    }
}

/// Store wrapper for integration tests.
///
/// `inject_child` appends extra rows to `role_children`, standing in for a
/// database whose relation tables were edited by hand. `hold_at` parks the
/// first caller of one store method until a second concurrent caller reaches
/// it, so validate-then-write sequences interleave as badly as possible.
pub struct TestStore {
    inner: InMemoryStore,
    extra_children: Mutex<HashMap<RoleId, Vec<AccessRef>>>,
    rendezvous: Mutex<Option<Arc<Rendezvous>>>,
}

impl TestStore {
    pub fn new() -> Self {
        Self {
            inner: InMemoryStore::new(),
            extra_children: Mutex::new(HashMap::new()),
            rendezvous: Mutex::new(None),
        }
    }

    pub fn inject_child(&self, parent: RoleId, child: AccessRef) {
        self.extra_children
            .lock()
            .expect("lock")
            .entry(parent)
            .or_default()
            .push(child);
    }

    pub fn hold_at(&self, point: HoldPoint, patience: Duration) {
        *self.rendezvous.lock().expect("lock") = Some(Arc::new(Rendezvous {
            point,
            patience,
            arrivals: AtomicUsize::new(0),
            met: AtomicBool::new(false),
            ready: Notify::new(),
        }));
    }

    async fn maybe_hold(&self, point: HoldPoint) {
        let rendezvous = self
            .rendezvous
            .lock()
            .expect("lock")
            .as_ref()
            .filter(|r| r.point == point)
            .cloned();
        if let Some(rendezvous) = rendezvous {
            rendezvous.hold().await;
        }
    }
}

#[async_trait]
impl AccessStore for TestStore {
    async fn create_capability(&self, capability: Capability) -> StoreResult<Capability> {
        self.inner.create_capability(capability).await
    }
    async fn update_capability(&self, capability: Capability) -> StoreResult<Capability> {
        self.inner.update_capability(capability).await
    }
    async fn delete_capability(&self, id: CapabilityId) -> StoreResult<()> {
        self.inner.delete_capability(id).await
    }
    async fn get_capability(&self, id: CapabilityId) -> StoreResult<Capability> {
        self.inner.get_capability(id).await
    }
    async fn find_capability_by_name(&self, name: &str) -> StoreResult<Option<Capability>> {
        self.inner.find_capability_by_name(name).await
    }
    async fn list_capabilities(&self) -> StoreResult<Vec<Capability>> {
        self.maybe_hold(HoldPoint::ListCapabilities).await;
        self.inner.list_capabilities().await
    }
    async fn create_role(&self, role: Role) -> StoreResult<Role> {
        self.inner.create_role(role).await
    }
    async fn update_role(&self, role: Role) -> StoreResult<Role> {
        self.inner.update_role(role).await
    }
    async fn delete_role(&self, id: RoleId) -> StoreResult<()> {
        self.inner.delete_role(id).await
    }
    async fn get_role(&self, id: RoleId) -> StoreResult<Role> {
        let mut role = self.inner.get_role(id).await?;
        role.children.extend(self.extra(id));
        Ok(role)
    }
    async fn list_roles(&self) -> StoreResult<Vec<Role>> {
        self.inner.list_roles().await
    }
    async fn create_principal(&self, principal: Principal) -> StoreResult<Principal> {
        self.inner.create_principal(principal).await
    }
    async fn update_principal(&self, principal: Principal) -> StoreResult<Principal> {
        self.inner.update_principal(principal).await
    }
    async fn delete_principal(&self, id: PrincipalId) -> StoreResult<()> {
        self.inner.delete_principal(id).await
    }
    async fn get_principal(&self, id: PrincipalId) -> StoreResult<Principal> {
        self.inner.get_principal(id).await
    }
    async fn find_principal_by_user_name(
        &self,
        user_name: &str,
    ) -> StoreResult<Option<Principal>> {
        self.inner.find_principal_by_user_name(user_name).await
    }
    async fn list_principals(&self) -> StoreResult<Vec<Principal>> {
        self.inner.list_principals().await
    }
    async fn add_relation(&self, relation: Relation) -> StoreResult<()> {
        self.inner.add_relation(relation).await
    }
    async fn remove_relation(&self, relation: Relation) -> StoreResult<()> {
        self.inner.remove_relation(relation).await
    }
    async fn role_children(&self, id: RoleId) -> StoreResult<Vec<AccessRef>> {
        self.maybe_hold(HoldPoint::RoleChildren).await;
        let mut children = self.inner.role_children(id).await?;
        children.extend(self.extra(id));
        Ok(children)
    }
    async fn principal_grants(&self, id: PrincipalId) -> StoreResult<Vec<AccessRef>> {
        self.inner.principal_grants(id).await
    }
    async fn health_check(&self) -> StoreResult<()> {
        self.inner.health_check().await
    }
    fn is_durable(&self) -> bool {
        false
    }
    fn backend_name(&self) -> &'static str {
        "test-memory"
    }
}

impl TestStore {
    fn extra(&self, id: RoleId) -> Vec<AccessRef> {
        self.extra_children
            .lock()
            .expect("lock")
            .get(&id)
            .cloned()
            .unwrap_or_default()
    }
}
