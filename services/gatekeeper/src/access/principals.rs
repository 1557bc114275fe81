//! Principal directory: identities and their direct grants.
//!
//! `grant` writes to the User→Capability or User→Role relation depending on
//! the `AccessRef` tag. Granting the same reference twice is accepted and
//! leaves a single row; the resolver works on sets either way.
use super::AccessContext;
use crate::error::{AccessError, AccessResult};
use crate::store::StoreError;
use estate_authz::{AccessRef, Principal, Relation};
use estate_common::ids::PrincipalId;

#[derive(Clone)]
pub struct PrincipalDirectory {
    ctx: AccessContext,
}

impl PrincipalDirectory {
    pub fn new(ctx: AccessContext) -> Self {
        Self { ctx }
    }

    pub async fn create(&self, user_name: &str, credential_hash: &str) -> AccessResult<Principal> {
        let user_name = user_name.trim();
        if user_name.is_empty() {
            return Err(AccessError::InvalidName(user_name.to_string()));
        }
        let _gate = self.ctx.lock_writes().await;
        let principal = match self
            .ctx
            .store()
            .create_principal(Principal::new(user_name, credential_hash))
            .await
        {
            Ok(principal) => principal,
            Err(StoreError::Conflict(_)) => {
                return Err(AccessError::DuplicateName(user_name.to_string()));
            }
            Err(err) => return Err(err.into()),
        };
        self.ctx.mark_mutated();
        tracing::info!(principal = %principal.id, user = %principal.user_name, "principal created");
        Ok(principal)
    }

    /// Update user name and credential hash; grants are left untouched.
    pub async fn update(&self, principal: Principal) -> AccessResult<Principal> {
        let user_name = principal.user_name.clone();
        let _gate = self.ctx.lock_writes().await;
        let updated = match self.ctx.store().update_principal(principal).await {
            Ok(updated) => updated,
            Err(StoreError::Conflict(_)) => return Err(AccessError::DuplicateName(user_name)),
            Err(err) => return Err(err.into()),
        };
        self.ctx.mark_mutated();
        Ok(updated)
    }

    pub async fn delete(&self, id: PrincipalId) -> AccessResult<()> {
        let _gate = self.ctx.lock_writes().await;
        self.ctx.store().delete_principal(id).await?;
        self.ctx.mark_mutated();
        tracing::info!(principal = %id, "principal deleted");
        Ok(())
    }

    pub async fn get(&self, id: PrincipalId) -> AccessResult<Principal> {
        Ok(self.ctx.store().get_principal(id).await?)
    }

    pub async fn find_by_user_name(&self, user_name: &str) -> AccessResult<Option<Principal>> {
        Ok(self
            .ctx
            .store()
            .find_principal_by_user_name(user_name.trim())
            .await?)
    }

    pub async fn list(&self) -> AccessResult<Vec<Principal>> {
        let mut items = self.ctx.store().list_principals().await?;
        items.sort_by(|a, b| a.user_name.cmp(&b.user_name));
        Ok(items)
    }

    pub async fn grant(&self, principal: PrincipalId, grant: AccessRef) -> AccessResult<()> {
        let _gate = self.ctx.lock_writes().await;
        self.ctx
            .store()
            .add_relation(Relation::grant(principal, grant))
            .await?;
        self.ctx.mark_mutated();
        tracing::info!(%principal, %grant, "grant added");
        Ok(())
    }

    pub async fn revoke(&self, principal: PrincipalId, grant: AccessRef) -> AccessResult<()> {
        let _gate = self.ctx.lock_writes().await;
        self.ctx
            .store()
            .remove_relation(Relation::grant(principal, grant))
            .await?;
        self.ctx.mark_mutated();
        tracing::info!(%principal, %grant, "grant revoked");
        Ok(())
    }

    pub async fn grants(&self, principal: PrincipalId) -> AccessResult<Vec<AccessRef>> {
        Ok(self.ctx.store().principal_grants(principal).await?)
    }
}
