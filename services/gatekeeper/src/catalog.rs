//! Host-application contract: the set of currently discovered resource ids.
//!
//! The synchronizer only needs the identifiers. [`StaticCatalog`] serves a
//! fixed list (hosts that enumerate their screens in code, tests);
//! [`ManifestCatalog`] reads a YAML manifest written at deploy time.
use anyhow::Context;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub trait ResourceCatalog: Send + Sync {
    fn discovered_resources(&self) -> BTreeSet<String>;
}

#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    resources: BTreeSet<String>,
}

impl StaticCatalog {
    pub fn new<I, S>(resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            resources: resources.into_iter().map(Into::into).collect(),
        }
    }
}

impl ResourceCatalog for StaticCatalog {
    fn discovered_resources(&self) -> BTreeSet<String> {
        self.resources.clone()
    }
}

/// Manifest layout:
///
/// ```yaml
/// resources:
///   - frmLeases
///   - frmOwners
/// ```
#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    resources: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ManifestCatalog {
    path: PathBuf,
    resources: BTreeSet<String>,
}

impl ManifestCatalog {
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("read resource manifest: {}", path.display()))?;
        let mut catalog = Self::from_yaml(&contents)
            .with_context(|| format!("parse resource manifest: {}", path.display()))?;
        catalog.path = path.to_path_buf();
        Ok(catalog)
    }

    pub fn from_yaml(contents: &str) -> anyhow::Result<Self> {
        let manifest: Manifest = serde_yaml::from_str(contents)?;
        Ok(Self {
            path: PathBuf::new(),
            resources: manifest.resources.into_iter().collect(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResourceCatalog for ManifestCatalog {
    fn discovered_resources(&self) -> BTreeSet<String> {
        self.resources.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn static_catalog_dedupes() {
        let catalog = StaticCatalog::new(["frmA", "frmB", "frmA"]);
        assert_eq!(catalog.discovered_resources().len(), 2);
    }

    #[test]
    fn manifest_reads_resource_list() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "resources:\n  - frmLeases\n  - frmOwners\n  - frmLeases").expect("write");
        let catalog = ManifestCatalog::from_path(file.path()).expect("load");
        let found: Vec<_> = catalog.discovered_resources().into_iter().collect();
        assert_eq!(found, vec!["frmLeases", "frmOwners"]);
        assert_eq!(catalog.path(), file.path());
    }

    #[test]
    fn empty_manifest_is_empty() {
        let catalog = ManifestCatalog::from_yaml("{}").expect("parse");
        assert!(catalog.discovered_resources().is_empty());
    }

    #[test]
    fn missing_manifest_names_the_path() {
        let err = ManifestCatalog::from_path("/nonexistent/manifest.yaml").expect_err("missing");
        assert!(err.to_string().contains("/nonexistent/manifest.yaml"));
    }
}
