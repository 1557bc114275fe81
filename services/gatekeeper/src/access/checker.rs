//! Authorization checker: the gate the host asks before showing a resource.
//!
//! # Key invariants
//! - An unknown principal is denied, never an error.
//! - With caching enabled, an entry is only served while its generation matches
//!   the context's current generation. Any mutation through the core bumps the
//!   generation, so grants and role changes are visible on the next check.
use super::PermissionResolver;
use crate::error::{AccessError, AccessResult};
use estate_authz::PermissionSet;
use estate_common::ids::PrincipalId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type PermissionCache = RwLock<HashMap<PrincipalId, (u64, Arc<PermissionSet>)>>;

#[derive(Clone)]
pub struct AuthorizationChecker {
    resolver: PermissionResolver,
    cache: Option<Arc<PermissionCache>>,
}

impl AuthorizationChecker {
    pub fn new(resolver: PermissionResolver, cache_effective_permissions: bool) -> Self {
        Self {
            resolver,
            cache: cache_effective_permissions.then(|| Arc::new(RwLock::new(HashMap::new()))),
        }
    }

    pub fn caches_permissions(&self) -> bool {
        self.cache.is_some()
    }

    /// Whether `principal` may use `resource`.
    ///
    /// Returns `Ok(false)` for a principal that does not exist. Store failures
    /// propagate.
    pub async fn has_access(&self, principal: PrincipalId, resource: &str) -> AccessResult<bool> {
        let allowed = match self.effective_permissions(principal).await {
            Ok(set) => set.allows(resource.trim()),
            Err(AccessError::NotFound(_)) => {
                tracing::debug!(%principal, "access check for unknown principal");
                false
            }
            Err(err) => {
                metrics::counter!("estate_access_checks_total", "outcome" => "error").increment(1);
                return Err(err);
            }
        };
        let outcome = if allowed { "allow" } else { "deny" };
        metrics::counter!("estate_access_checks_total", "outcome" => outcome).increment(1);
        tracing::debug!(%principal, resource = %resource, outcome, "access checked");
        Ok(allowed)
    }

    pub async fn effective_permissions(&self, principal: PrincipalId) -> AccessResult<Arc<PermissionSet>> {
        let Some(cache) = &self.cache else {
            return Ok(Arc::new(self.resolver.effective_permissions(principal).await?));
        };

        let generation = self.resolver.context().generation();
        if let Some((cached_at, set)) = cache.read().await.get(&principal) {
            if *cached_at == generation {
                return Ok(set.clone());
            }
        }

        let set = match self.resolver.effective_permissions(principal).await {
            Ok(set) => Arc::new(set),
            Err(err @ AccessError::NotFound(_)) => {
                // The principal is gone; drop whatever was cached for it.
                self.invalidate(principal).await;
                return Err(err);
            }
            Err(err) => return Err(err),
        };
        // Only publish if nothing changed while resolving.
        if self.resolver.context().generation() == generation {
            cache
                .write()
                .await
                .insert(principal, (generation, set.clone()));
        }
        Ok(set)
    }

    #[cfg(test)]
    pub(crate) async fn cached_entries(&self) -> usize {
        match &self.cache {
            Some(cache) => cache.read().await.len(),
            None => 0,
        }
    }

    pub async fn invalidate(&self, principal: PrincipalId) {
        if let Some(cache) = &self.cache {
            cache.write().await.remove(&principal);
        }
    }
}
