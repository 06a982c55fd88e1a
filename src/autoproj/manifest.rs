//! Installation manifest loading.
//!
//! Autoproj records every package of a workspace in
//! `.autoproj/installation-manifest`, a YAML list mixing package entries and
//! package set entries.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use async_trait::async_trait;
use serde::Deserialize;

use super::Workspace;

/// Loads the manifest of a workspace.
#[async_trait]
pub trait ManifestLoader: Send + Sync {
    /// Load the manifest of `ws`.
    async fn load(&self, ws: &Workspace) -> anyhow::Result<Manifest>;
}

/// Directories autoproj uses for a package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PackageInfo {
    /// Source directory
    pub srcdir: PathBuf,

    /// Build directory
    #[serde(default)]
    pub builddir: PathBuf,

    /// Installation prefix
    #[serde(default)]
    pub prefix: PathBuf,
}

/// A package entry of the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManifestPackage {
    /// Package name
    pub name: String,

    /// Declared type, e.g. `Autobuild::CMake`
    #[serde(rename = "type")]
    pub kind: String,

    /// Package directories
    #[serde(flatten)]
    pub info: PackageInfo,

    /// Names of the packages this one depends on
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// A package set entry of the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PackageSet {
    /// Package set name
    #[serde(rename = "package_set")]
    pub name: String,

    /// Where the package set is checked out
    #[serde(default)]
    pub raw_local_dir: Option<PathBuf>,

    /// Where the package set is visible to the user
    #[serde(default)]
    pub user_local_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Entry {
    Package(ManifestPackage),
    PackageSet(PackageSet),
}

/// The loaded manifest of a workspace.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    packages: HashMap<String, ManifestPackage>,
    package_sets: HashMap<String, PackageSet>,
}

impl Manifest {
    /// Parse the YAML text of an installation manifest.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let mut manifest = Self::default();
        if content.trim().is_empty() {
            return Ok(manifest);
        }
        let entries: Vec<Entry> = serde_yaml::from_str(content)?;
        for entry in entries {
            match entry {
                Entry::Package(pkg) => manifest.insert(pkg),
                Entry::PackageSet(set) => {
                    manifest.package_sets.insert(set.name.clone(), set);
                }
            }
        }
        Ok(manifest)
    }

    /// Add a package entry.
    pub fn insert(&mut self, pkg: ManifestPackage) {
        self.packages.insert(pkg.name.clone(), pkg);
    }

    /// Package entry by name.
    pub fn package(&self, name: &str) -> Option<&ManifestPackage> {
        self.packages.get(name)
    }

    /// Package set entry by name.
    pub fn package_set(&self, name: &str) -> Option<&PackageSet> {
        self.package_sets.get(name)
    }

    /// Declared type of a package.
    pub fn package_type(&self, name: &str) -> Option<&str> {
        self.packages.get(name).map(|pkg| pkg.kind.as_str())
    }

    /// Find the package checked out at `path` in workspace `ws`.
    ///
    /// Matches on source directory first, then on the path relative to
    /// the workspace root.
    pub fn find_by_path(&self, ws: &Workspace, path: &Path) -> Option<&ManifestPackage> {
        self.packages.values().find(|pkg| pkg.info.srcdir == path).or_else(|| {
            let relative = path.strip_prefix(ws.root()).ok()?;
            self.packages.get(relative.to_str()?)
        })
    }

    /// Number of packages.
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Whether the manifest lists no package.
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// Reads `.autoproj/installation-manifest` from disk on every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct InstallationManifestLoader;

#[async_trait]
impl ManifestLoader for InstallationManifestLoader {
    async fn load(&self, ws: &Workspace) -> anyhow::Result<Manifest> {
        let path = ws.manifest_path();
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("could not read {}", path.display()))?;
        Manifest::parse(&content).with_context(|| format!("could not parse {}", path.display()))
    }
}
