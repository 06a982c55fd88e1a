//! Autoproj workspaces and the folders that belong to them.
//!
//! A workspace is identified by its root directory, the first ancestor of a
//! path that contains a `.autoproj` directory.

mod manifest;

pub use manifest::{
    InstallationManifestLoader, Manifest, ManifestLoader, ManifestPackage, PackageInfo,
    PackageSet,
};

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

/// Directory that marks the root of an autoproj workspace.
pub const MARKER_DIR: &str = ".autoproj";

/// Directories under the root holding the workspace configuration.
pub const CONFIG_DIRS: &[&str] = &["autoproj", ".autoproj"];

/// Walk `path` and its ancestors looking for a workspace root.
///
/// Always checks the live filesystem, nothing is cached.
pub fn find_workspace_root(path: &Path) -> Option<PathBuf> {
    path.ancestors().find(|dir| dir.join(MARKER_DIR).is_dir()).map(Path::to_path_buf)
}

/// Path of the autoproj executable installed in a workspace.
pub fn autoproj_exe_path(root: &Path) -> PathBuf {
    root.join(MARKER_DIR).join("bin").join("autoproj")
}

/// An autoproj workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
    name: String,
}

impl Workspace {
    /// Create a workspace rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());
        Self { root, name }
    }

    /// Create the workspace owning `dir`, if any.
    pub fn from_dir(dir: &Path) -> Option<Self> {
        find_workspace_root(dir).map(Self::new)
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Display name, the basename of the root.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path to the autoproj executable of this workspace.
    pub fn autoproj_exe_path(&self) -> PathBuf {
        autoproj_exe_path(&self.root)
    }

    /// Location of the installation manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MARKER_DIR).join("installation-manifest")
    }

    /// Whether `path` is, or is inside, one of the configuration directories.
    pub fn is_config(&self, path: &Path) -> bool {
        CONFIG_DIRS.iter().any(|dir| path.starts_with(self.root.join(dir)))
    }
}

/// Registry of known workspaces and of the folders associated with them.
///
/// Iteration follows insertion order.
#[derive(Debug, Default)]
pub struct Workspaces {
    workspaces: IndexMap<PathBuf, Workspace>,
    folder_to_workspace: IndexMap<PathBuf, Workspace>,
}

impl Workspaces {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a workspace by root, reusing the existing one if known.
    pub fn add(&mut self, root: &Path) -> Workspace {
        self.workspaces.entry(root.to_path_buf()).or_insert_with(|| Workspace::new(root)).clone()
    }

    /// Associate a folder with its owning workspace.
    ///
    /// Folders outside of any workspace are not recorded.
    pub fn add_folder(&mut self, path: &Path) -> Option<Workspace> {
        let Some(root) = find_workspace_root(path) else {
            tracing::debug!(folder = %path.display(), "Folder is not in an autoproj workspace");
            return None;
        };
        let ws = self.add(&root);
        self.folder_to_workspace.insert(path.to_path_buf(), ws.clone());
        Some(ws)
    }

    /// Forget a folder, dropping its workspace once no folder refers to it.
    pub fn remove_folder(&mut self, path: &Path) -> Option<Workspace> {
        let ws = self.folder_to_workspace.shift_remove(path)?;
        let still_used = self.folder_to_workspace.values().any(|other| other.root == ws.root);
        if !still_used {
            self.workspaces.shift_remove(&ws.root);
        }
        Some(ws)
    }

    /// Workspace associated with a folder.
    pub fn folder_workspace(&self, folder: &Path) -> Option<&Workspace> {
        self.folder_to_workspace.get(folder)
    }

    /// Workspace with the given root.
    pub fn get(&self, root: &Path) -> Option<&Workspace> {
        self.workspaces.get(root)
    }

    /// Whether `path` is in a configuration directory of its workspace.
    pub fn is_config(&self, path: &Path) -> bool {
        Workspace::from_dir(path).is_some_and(|ws| ws.is_config(path))
    }

    /// Call `f` for every workspace.
    pub fn for_each_workspace(&self, mut f: impl FnMut(&Workspace)) {
        self.workspaces.values().for_each(|ws| f(ws));
    }

    /// Call `f` with every folder and its workspace.
    pub fn for_each_folder(&self, mut f: impl FnMut(&Workspace, &Path)) {
        for (folder, ws) in &self.folder_to_workspace {
            f(ws, folder);
        }
    }

    /// Number of workspaces.
    pub fn len(&self) -> usize {
        self.workspaces.len()
    }

    /// Whether no workspace is known.
    pub fn is_empty(&self) -> bool {
        self.workspaces.is_empty()
    }

    /// Number of tracked folders.
    pub fn folder_count(&self) -> usize {
        self.folder_to_workspace.len()
    }
}
