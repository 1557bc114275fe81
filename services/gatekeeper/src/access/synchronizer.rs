//! Registry synchronizer: reconcile capabilities with discovered resources.
//!
//! # Purpose
//! At start-up the host reports which protected resources it currently exposes.
//! Every identifier without a capability of that name gets one; capabilities
//! whose name is no longer discovered are reported as orphans and kept.
//!
//! # Key invariants
//! - Idempotent: a second run over the same input creates nothing.
//! - Never deletes. Orphans only show up in the report and a `warn` log.
//! - A concurrent writer registering the same name first is not an error; the
//!   existing capability is authoritative.
use super::CapabilityRegistry;
use crate::catalog::ResourceCatalog;
use crate::error::{AccessError, AccessResult};
use estate_authz::{Capability, CapabilityKind};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// Outcome of one synchronization run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub created: Vec<Capability>,
    pub orphaned: Vec<Capability>,
    /// Discovered identifiers that already had a capability.
    pub unchanged: usize,
    /// Blank identifiers dropped from the input.
    pub ignored: usize,
}

impl SyncReport {
    pub fn created_names(&self) -> Vec<&str> {
        self.created.iter().map(|cap| cap.name.as_str()).collect()
    }

    pub fn orphaned_names(&self) -> Vec<&str> {
        self.orphaned.iter().map(|cap| cap.name.as_str()).collect()
    }
}

#[derive(Clone)]
pub struct RegistrySynchronizer {
    registry: CapabilityRegistry,
    default_kind: CapabilityKind,
}

impl RegistrySynchronizer {
    pub fn new(registry: CapabilityRegistry) -> Self {
        Self {
            registry,
            default_kind: CapabilityKind::default(),
        }
    }

    /// Kind assigned to capabilities created during synchronization.
    pub fn with_default_kind(mut self, kind: CapabilityKind) -> Self {
        self.default_kind = kind;
        self
    }

    pub fn default_kind(&self) -> CapabilityKind {
        self.default_kind
    }

    pub async fn synchronize_from(&self, catalog: &dyn ResourceCatalog) -> AccessResult<SyncReport> {
        let discovered = catalog.discovered_resources();
        self.synchronize(&discovered).await
    }

    pub async fn synchronize(&self, discovered: &BTreeSet<String>) -> AccessResult<SyncReport> {
        let mut report = SyncReport::default();
        let mut wanted: BTreeSet<&str> = BTreeSet::new();
        for raw in discovered {
            let name = raw.trim();
            if name.is_empty() {
                report.ignored += 1;
            } else {
                wanted.insert(name);
            }
        }

        let existing: HashSet<String> = self
            .registry
            .list()
            .await?
            .into_iter()
            .map(|cap| cap.name)
            .collect();

        for name in &wanted {
            if existing.contains(*name) {
                report.unchanged += 1;
                continue;
            }
            match self.registry.create(name, name, self.default_kind).await {
                Ok(created) => report.created.push(created),
                Err(AccessError::DuplicateName(_)) => {
                    tracing::debug!(name = %name, "capability registered concurrently");
                    report.unchanged += 1;
                }
                Err(err) => return Err(err),
            }
        }

        // Fresh listing: includes entries other writers added during this run.
        for cap in self.registry.list().await? {
            if !wanted.contains(cap.name.as_str()) {
                tracing::warn!(capability = %cap.id, name = %cap.name, "orphaned capability: resource no longer discovered");
                report.orphaned.push(cap);
            }
        }

        metrics::counter!("estate_sync_created_total").increment(report.created.len() as u64);
        metrics::gauge!("estate_sync_orphaned").set(report.orphaned.len() as f64);
        tracing::info!(
            discovered = wanted.len(),
            created = report.created.len(),
            unchanged = report.unchanged,
            orphaned = report.orphaned.len(),
            ignored = report.ignored,
            "registry synchronized"
        );
        Ok(report)
    }
}
