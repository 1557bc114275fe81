use anyhow::{Context, Result};
use estate_authz::CapabilityKind;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

// Gatekeeper configuration sourced from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct GatekeeperConfig {
    /// YAML list of resources the host currently exposes.
    pub manifest_path: Option<PathBuf>,
    /// Optional seed of capabilities, roles and principals applied at boot.
    pub seed_path: Option<PathBuf>,
    pub cache_effective_permissions: bool,
    /// Kind given to capabilities the synchronizer creates.
    pub default_kind: CapabilityKind,
}

#[derive(Debug, Deserialize)]
struct GatekeeperConfigOverride {
    manifest_path: Option<PathBuf>,
    seed_path: Option<PathBuf>,
    cache_effective_permissions: Option<bool>,
    default_kind: Option<String>,
}

impl Default for GatekeeperConfig {
    fn default() -> Self {
        Self {
            manifest_path: None,
            seed_path: None,
            cache_effective_permissions: true,
            default_kind: CapabilityKind::Screen,
        }
    }
}

impl GatekeeperConfig {
    pub fn from_env() -> Result<Self> {
        let manifest_path = std::env::var("GATEKEEPER_MANIFEST").ok().map(PathBuf::from);
        let seed_path = std::env::var("GATEKEEPER_SEED").ok().map(PathBuf::from);
        let cache_effective_permissions = std::env::var("GATEKEEPER_CACHE_PERMISSIONS")
            .ok()
            .map(|value| matches!(value.as_str(), "1" | "true" | "yes"))
            .unwrap_or(true);
        let default_kind = match std::env::var("GATEKEEPER_DEFAULT_KIND") {
            Ok(value) => value
                .parse()
                .with_context(|| "parse GATEKEEPER_DEFAULT_KIND")?,
            Err(_) => CapabilityKind::Screen,
        };
        Ok(Self {
            manifest_path,
            seed_path,
            cache_effective_permissions,
            default_kind,
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("GATEKEEPER_CONFIG") {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read GATEKEEPER_CONFIG: {path}"))?;
            let override_cfg: GatekeeperConfigOverride = serde_yaml::from_str(&contents)
                .with_context(|| "parse gatekeeper config yaml")?;
            if let Some(value) = override_cfg.manifest_path {
                config.manifest_path = Some(value);
            }
            if let Some(value) = override_cfg.seed_path {
                config.seed_path = Some(value);
            }
            if let Some(value) = override_cfg.cache_effective_permissions {
                config.cache_effective_permissions = value;
            }
            if let Some(value) = override_cfg.default_kind {
                config.default_kind = value.parse().with_context(|| "parse default_kind")?;
            }
        }
        Ok(config)
    }
}
