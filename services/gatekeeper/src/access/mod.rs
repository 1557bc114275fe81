//! Access-control core: registry, roles, principals, resolution and sync.
//!
//! # Purpose
//! Every component is built from one [`AccessContext`], which carries the
//! injected store, the write gate that serializes mutations, and the mutation
//! generation used to invalidate cached permission sets.
//!
//! # Key invariants
//! - Every mutation holds the write gate for its whole validate-then-write
//!   sequence, so two concurrent `add_child` calls cannot each pass the cycle
//!   guard against a stale graph.
//! - Every successful mutation bumps the generation.
//! - Reads (resolution, lookups) never take the gate.
use crate::store::AccessStore;
use estate_authz::CapabilityKind;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, MutexGuard};

pub mod checker;
pub mod guard;
pub mod principals;
pub mod registry;
pub mod resolver;
pub mod roles;
pub mod synchronizer;

pub use checker::AuthorizationChecker;
pub use principals::PrincipalDirectory;
pub use registry::CapabilityRegistry;
pub use resolver::PermissionResolver;
pub use roles::{RoleComposite, RoleTree, RoleTreeNode};
pub use synchronizer::{RegistrySynchronizer, SyncReport};

#[derive(Clone)]
pub struct AccessContext {
    store: Arc<dyn AccessStore>,
    write_gate: Arc<Mutex<()>>,
    generation: Arc<AtomicU64>,
}

impl AccessContext {
    pub fn new(store: Arc<dyn AccessStore>) -> Self {
        Self {
            store,
            write_gate: Arc::new(Mutex::new(())),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn store(&self) -> &dyn AccessStore {
        self.store.as_ref()
    }

    /// Current mutation generation; changes after every successful mutation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub(crate) async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_gate.lock().await
    }

    pub(crate) fn mark_mutated(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}

/// All core components wired over one shared context.
///
/// Constructed once at start-up and handed to the host application.
#[derive(Clone)]
pub struct AccessCore {
    pub registry: CapabilityRegistry,
    pub roles: RoleComposite,
    pub principals: PrincipalDirectory,
    pub resolver: PermissionResolver,
    pub synchronizer: RegistrySynchronizer,
    pub checker: AuthorizationChecker,
}

impl AccessCore {
    pub fn new(store: Arc<dyn AccessStore>, cache_effective_permissions: bool) -> Self {
        let ctx = AccessContext::new(store);
        let registry = CapabilityRegistry::new(ctx.clone());
        let resolver = PermissionResolver::new(ctx.clone());
        Self {
            roles: RoleComposite::new(ctx.clone()),
            principals: PrincipalDirectory::new(ctx.clone()),
            synchronizer: RegistrySynchronizer::new(registry.clone()),
            checker: AuthorizationChecker::new(resolver.clone(), cache_effective_permissions),
            registry,
            resolver,
        }
    }

    /// Kind the synchronizer assigns to capabilities it creates.
    pub fn with_default_kind(mut self, kind: CapabilityKind) -> Self {
        self.synchronizer = self.synchronizer.with_default_kind(kind);
        self
    }
}
