//! Permission resolver: transitive closure over a principal's grants.
//!
//! # Purpose
//! Flattens direct capability grants and every capability reachable through
//! granted roles into one [`PermissionSet`].
//!
//! # Key invariants
//! - One visited-role set is shared across the whole call; a role is expanded
//!   at most once even when reachable from several grants or when the stored
//!   graph contains a cycle.
//! - A relation row pointing at a missing capability or role is logged and
//!   skipped; resolution continues with the remaining branches.
//! - Store failures other than a missing entity abort the call.
//!
//! # Complexity
//! O(V + E) over the portion of the role graph reachable from the grants.
use super::AccessContext;
use crate::error::{AccessError, AccessResult};
use crate::store::StoreError;
use estate_authz::{AccessRef, PermissionSet};
use estate_common::ids::{CapabilityId, PrincipalId, RoleId};
use std::collections::HashSet;

#[derive(Clone)]
pub struct PermissionResolver {
    ctx: AccessContext,
}

impl PermissionResolver {
    pub fn new(ctx: AccessContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &AccessContext {
        &self.ctx
    }

    /// Effective permission set of a stored principal.
    ///
    /// # Errors
    /// - [`AccessError::NotFound`] if the principal does not exist.
    pub async fn effective_permissions(&self, principal: PrincipalId) -> AccessResult<PermissionSet> {
        let grants = self.ctx.store().principal_grants(principal).await?;
        let set = self.resolve(&grants).await?;
        tracing::debug!(%principal, grants = grants.len(), capabilities = set.len(), "resolved permissions");
        Ok(set)
    }

    /// Resolve an arbitrary list of direct grants.
    pub async fn resolve(&self, grants: &[AccessRef]) -> AccessResult<PermissionSet> {
        let mut result = PermissionSet::default();
        let mut visited: HashSet<RoleId> = HashSet::new();
        let mut pending: Vec<RoleId> = Vec::new();

        for grant in grants {
            match *grant {
                AccessRef::Leaf(id) => self.collect_capability(id, &mut result).await?,
                AccessRef::Composite(id) => {
                    if visited.insert(id) {
                        pending.push(id);
                    }
                }
            }
        }

        while let Some(role) = pending.pop() {
            let children = match self.ctx.store().role_children(role).await {
                Ok(children) => children,
                Err(StoreError::NotFound(_)) => {
                    let err = AccessError::DanglingReference(AccessRef::Composite(role));
                    tracing::warn!(error = %err, "skipping missing role during resolution");
                    continue;
                }
                Err(err) => return Err(AccessError::Store(err)),
            };
            for child in children {
                match child {
                    AccessRef::Leaf(id) => self.collect_capability(id, &mut result).await?,
                    AccessRef::Composite(id) => {
                        if visited.insert(id) {
                            pending.push(id);
                        }
                    }
                }
            }
        }

        Ok(result)
    }

    async fn collect_capability(&self, id: CapabilityId, result: &mut PermissionSet) -> AccessResult<()> {
        if result.contains(&id) {
            return Ok(());
        }
        match self.ctx.store().get_capability(id).await {
            Ok(capability) => {
                result.insert(capability.id, capability.name);
                Ok(())
            }
            Err(StoreError::NotFound(_)) => {
                let err = AccessError::DanglingReference(AccessRef::Leaf(id));
                tracing::warn!(error = %err, "skipping missing capability during resolution");
                Ok(())
            }
            Err(err) => Err(AccessError::Store(err)),
        }
    }
}
