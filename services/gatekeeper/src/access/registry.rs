//! Capability registry: CRUD over leaf capabilities.
//!
//! # Key invariants
//! - Capability names are unique; the name is the host resource identifier.
//! - Deleting a capability detaches the relations that point at it and never
//!   removes roles or principals.
use super::AccessContext;
use crate::error::{AccessError, AccessResult};
use crate::store::StoreError;
use estate_authz::{Capability, CapabilityKind};
use estate_common::ResourceName;
use estate_common::ids::CapabilityId;

#[derive(Clone)]
pub struct CapabilityRegistry {
    ctx: AccessContext,
}

fn parse_name(raw: &str) -> AccessResult<ResourceName> {
    ResourceName::parse(raw).map_err(|_| AccessError::InvalidName(raw.to_string()))
}

impl CapabilityRegistry {
    pub fn new(ctx: AccessContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &AccessContext {
        &self.ctx
    }

    /// Register a new capability.
    ///
    /// # Errors
    /// - [`AccessError::DuplicateName`] when a capability with that name exists.
    /// - [`AccessError::InvalidName`] for a blank name.
    pub async fn create(
        &self,
        name: &str,
        data_key: &str,
        kind: CapabilityKind,
    ) -> AccessResult<Capability> {
        let name = parse_name(name)?;
        let _gate = self.ctx.lock_writes().await;
        if self
            .ctx
            .store()
            .find_capability_by_name(name.as_str())
            .await?
            .is_some()
        {
            return Err(AccessError::DuplicateName(name.into_inner()));
        }
        let capability = Capability::new(name.as_str(), data_key, kind);
        let created = match self.ctx.store().create_capability(capability).await {
            Ok(created) => created,
            Err(StoreError::Conflict(_)) => return Err(AccessError::DuplicateName(name.into_inner())),
            Err(err) => return Err(err.into()),
        };
        self.ctx.mark_mutated();
        tracing::info!(capability = %created.id, name = %created.name, kind = %created.kind, "capability registered");
        Ok(created)
    }

    /// Replace a capability's name, data key and kind.
    pub async fn update(&self, mut capability: Capability) -> AccessResult<Capability> {
        capability.name = parse_name(&capability.name)?.into_inner();
        let _gate = self.ctx.lock_writes().await;
        let name = capability.name.clone();
        let updated = match self.ctx.store().update_capability(capability).await {
            Ok(updated) => updated,
            Err(StoreError::Conflict(_)) => return Err(AccessError::DuplicateName(name)),
            Err(err) => return Err(err.into()),
        };
        self.ctx.mark_mutated();
        tracing::info!(capability = %updated.id, name = %updated.name, "capability updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: CapabilityId) -> AccessResult<()> {
        let _gate = self.ctx.lock_writes().await;
        self.ctx.store().delete_capability(id).await?;
        self.ctx.mark_mutated();
        tracing::info!(capability = %id, "capability deleted");
        Ok(())
    }

    pub async fn get(&self, id: CapabilityId) -> AccessResult<Capability> {
        Ok(self.ctx.store().get_capability(id).await?)
    }

    pub async fn find_by_name(&self, name: &str) -> AccessResult<Option<Capability>> {
        Ok(self.ctx.store().find_capability_by_name(name.trim()).await?)
    }

    /// All capabilities ordered by name.
    pub async fn list(&self) -> AccessResult<Vec<Capability>> {
        let mut items = self.ctx.store().list_capabilities().await?;
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }
}
