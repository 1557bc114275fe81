//! Seed file: initial capabilities, roles and principals applied at boot.
//!
//! ```yaml
//! capabilities:
//!   - name: frmLeases
//!     kind: screen
//! roles:
//!   - name: Leasing
//!     capabilities: [frmLeases]
//!   - name: Admin
//!     roles: [Leasing]
//! principals:
//!   - user_name: ana
//!     roles: [Admin]
//! ```
//!
//! Entities are matched by name, so applying the same seed twice leaves the
//! store unchanged. Roles are created before any child is linked; a role may
//! name another role declared later in the file.
use crate::access::AccessCore;
use anyhow::{Context, Result, bail};
use estate_authz::{AccessRef, CapabilityKind};
use estate_common::ids::{CapabilityId, RoleId};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Seed {
    #[serde(default)]
    pub capabilities: Vec<SeedCapability>,
    #[serde(default)]
    pub roles: Vec<SeedRole>,
    #[serde(default)]
    pub principals: Vec<SeedPrincipal>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedCapability {
    pub name: String,
    pub data_key: Option<String>,
    #[serde(default)]
    pub kind: CapabilityKind,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedRole {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedPrincipal {
    pub user_name: String,
    #[serde(default)]
    pub credential_hash: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Counts of entities the seed had to create.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub capabilities_created: usize,
    pub roles_created: usize,
    pub principals_created: usize,
}

impl Seed {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("read seed file: {}", path.display()))?;
        Self::from_yaml(&contents).with_context(|| format!("parse seed file: {}", path.display()))
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    pub async fn apply(&self, core: &AccessCore) -> Result<SeedReport> {
        let mut report = SeedReport::default();

        let mut capabilities: HashMap<String, CapabilityId> = core
            .registry
            .list()
            .await?
            .into_iter()
            .map(|cap| (cap.name, cap.id))
            .collect();
        for entry in &self.capabilities {
            let name = entry.name.trim();
            if capabilities.contains_key(name) {
                continue;
            }
            let data_key = entry.data_key.as_deref().unwrap_or(name);
            let created = core
                .registry
                .create(name, data_key, entry.kind)
                .await
                .with_context(|| format!("seed capability {name}"))?;
            capabilities.insert(created.name, created.id);
            report.capabilities_created += 1;
        }

        let mut roles: HashMap<String, RoleId> = core
            .roles
            .list()
            .await?
            .into_iter()
            .map(|role| (role.name, role.id))
            .collect();
        for entry in &self.roles {
            let name = entry.name.trim();
            if roles.contains_key(name) {
                continue;
            }
            let created = core
                .roles
                .create(name, &entry.description)
                .await
                .with_context(|| format!("seed role {name}"))?;
            roles.insert(created.name, created.id);
            report.roles_created += 1;
        }

        for entry in &self.roles {
            let role = lookup(&roles, &entry.name, "role")?;
            let current = core.roles.get(role).await?;
            let wanted = refs(&capabilities, &roles, &entry.capabilities, &entry.roles)?;
            for child in wanted {
                if current.contains(&child) {
                    continue;
                }
                core.roles
                    .add_child(role, child)
                    .await
                    .with_context(|| format!("seed child {child} of role {}", entry.name))?;
            }
        }

        for entry in &self.principals {
            let user_name = entry.user_name.trim();
            let principal = match core.principals.find_by_user_name(user_name).await? {
                Some(existing) => existing,
                None => {
                    let created = core
                        .principals
                        .create(user_name, &entry.credential_hash)
                        .await
                        .with_context(|| format!("seed principal {user_name}"))?;
                    report.principals_created += 1;
                    created
                }
            };
            let current = core.principals.grants(principal.id).await?;
            let wanted = refs(&capabilities, &roles, &entry.capabilities, &entry.roles)?;
            for grant in wanted {
                if current.contains(&grant) {
                    continue;
                }
                core.principals
                    .grant(principal.id, grant)
                    .await
                    .with_context(|| format!("seed grant {grant} to {user_name}"))?;
            }
        }

        tracing::info!(
            capabilities = report.capabilities_created,
            roles = report.roles_created,
            principals = report.principals_created,
            "seed applied"
        );
        Ok(report)
    }
}

fn lookup<T: Copy>(index: &HashMap<String, T>, name: &str, what: &str) -> Result<T> {
    match index.get(name.trim()) {
        Some(id) => Ok(*id),
        None => bail!("seed references unknown {what} {name:?}"),
    }
}

fn refs(
    capabilities: &HashMap<String, CapabilityId>,
    roles: &HashMap<String, RoleId>,
    capability_names: &[String],
    role_names: &[String],
) -> Result<Vec<AccessRef>> {
    let mut out = Vec::with_capacity(capability_names.len() + role_names.len());
    for name in capability_names {
        out.push(AccessRef::Leaf(lookup(capabilities, name, "capability")?));
    }
    for name in role_names {
        out.push(AccessRef::Composite(lookup(roles, name, "role")?));
    }
    Ok(out)
}
