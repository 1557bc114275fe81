//! Boot wiring: config → store → seed → manifest sync.
use crate::access::{AccessCore, SyncReport};
use crate::catalog::ManifestCatalog;
use crate::config::GatekeeperConfig;
use crate::seed::{Seed, SeedReport};
use crate::store::AccessStore;
use crate::store::memory::InMemoryStore;
use anyhow::Context;
use std::sync::Arc;

/// A booted access-control core plus what start-up did to it.
pub struct Gatekeeper {
    pub core: AccessCore,
    pub catalog: Option<ManifestCatalog>,
    pub seed: Option<SeedReport>,
    pub sync: Option<SyncReport>,
}

impl Gatekeeper {
    /// Re-run the synchronizer against the configured manifest.
    pub async fn resync(&self) -> anyhow::Result<Option<SyncReport>> {
        let Some(catalog) = &self.catalog else {
            return Ok(None);
        };
        Ok(Some(self.core.synchronizer.synchronize_from(catalog).await?))
    }
}

pub async fn build_gatekeeper(config: &GatekeeperConfig) -> anyhow::Result<Gatekeeper> {
    let store: Arc<dyn AccessStore> = Arc::new(InMemoryStore::new());
    store.health_check().await.context("store health check")?;
    tracing::info!(
        backend = store.backend_name(),
        durable = store.is_durable(),
        cache = config.cache_effective_permissions,
        "access store ready"
    );
    let core = AccessCore::new(store, config.cache_effective_permissions)
        .with_default_kind(config.default_kind);

    let seed = match &config.seed_path {
        Some(path) => {
            let seed = Seed::from_path(path)?;
            Some(seed.apply(&core).await.context("apply seed")?)
        }
        None => None,
    };

    let catalog = match &config.manifest_path {
        Some(path) => Some(ManifestCatalog::from_path(path)?),
        None => {
            tracing::warn!("no resource manifest configured; skipping registry sync");
            None
        }
    };

    let sync = match &catalog {
        Some(catalog) => Some(
            core.synchronizer
                .synchronize_from(catalog)
                .await
                .context("synchronize registry")?,
        ),
        None => None,
    };

    Ok(Gatekeeper {
        core,
        catalog,
        seed,
        sync,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use estate_authz::CapabilityKind;
    use std::io::Write;

    #[tokio::test]
    async fn boots_without_files() {
        let gatekeeper = build_gatekeeper(&GatekeeperConfig::default())
            .await
            .expect("boot");
        assert!(gatekeeper.sync.is_none());
        assert!(gatekeeper.seed.is_none());
        assert!(gatekeeper.resync().await.expect("resync").is_none());
    }

    #[tokio::test]
    async fn boot_syncs_manifest_after_seed() {
        let mut seed = tempfile::NamedTempFile::new().expect("seed");
        writeln!(seed, "capabilities:\n  - name: frmOld").expect("write");
        let mut manifest = tempfile::NamedTempFile::new().expect("manifest");
        writeln!(manifest, "resources: [frmLeases]").expect("write");

        let config = GatekeeperConfig {
            seed_path: Some(seed.path().to_path_buf()),
            manifest_path: Some(manifest.path().to_path_buf()),
            ..GatekeeperConfig::default()
        };
        let gatekeeper = build_gatekeeper(&config).await.expect("boot");
        let sync = gatekeeper.sync.as_ref().expect("sync report");
        assert_eq!(sync.created_names(), vec!["frmLeases"]);
        assert_eq!(sync.orphaned_names(), vec!["frmOld"]);

        let again = gatekeeper.resync().await.expect("resync").expect("report");
        assert!(again.created.is_empty());
    }

    #[tokio::test]
    async fn core_synchronizer_uses_configured_kind() {
        let config = GatekeeperConfig {
            default_kind: CapabilityKind::Action,
            ..GatekeeperConfig::default()
        };
        let gatekeeper = build_gatekeeper(&config).await.expect("boot");
        assert_eq!(
            gatekeeper.core.synchronizer.default_kind(),
            CapabilityKind::Action
        );

        let discovered = ["actExportLeases".to_string()].into_iter().collect();
        let report = gatekeeper
            .core
            .synchronizer
            .synchronize(&discovered)
            .await
            .expect("sync");
        assert_eq!(report.created[0].kind, CapabilityKind::Action);
    }
}
