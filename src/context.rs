//! Session state shared by the package, task and debug components.
//!
//! A [`Context`] is created when a session starts and dropped when it ends.
//! It owns the workspace registry, the generated tasks and the
//! [`SelectionState`], and holds the collaborators the core talks to.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::autoproj::{ManifestLoader, Workspace, Workspaces};
use crate::config::{DebugSettings, SelectionMode};
use crate::debug::DebuggingTarget;
use crate::host::{EnvironmentBridge, Host};
use crate::packages::{Package, PackageFactory, PackageType};
use crate::state::StateStore;
use crate::tasks::TaskProvider;
use crate::Result;

const SELECTED_PACKAGE_KEY: &str = "rockSelectedPackage";
const PACKAGE_TYPES_KEY: &str = "rockPackageTypes";
const DEBUGGING_TARGETS_KEY: &str = "rockDebuggingTargets";
const DEBUG_CONFIGS_KEY: &str = "rockDebugConfigs";

/// Orogen specific debug settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrogenDebugConfig {
    /// Start the task once deployed
    pub start: bool,

    /// Open the task inspector
    pub gui: bool,

    /// Directory holding the task configuration files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conf_dir: Option<PathBuf>,
}

/// Debug settings of a package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RockDebugConfig {
    /// Working directory, the package directory when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,

    /// Extra arguments
    pub args: Vec<String>,

    /// Orogen settings
    pub orogen: OrogenDebugConfig,
}

/// A path-keyed map persisted under one store key, read on first use.
#[derive(Debug)]
struct PersistedMap<V> {
    key: &'static str,
    values: OnceLock<HashMap<PathBuf, V>>,
}

impl<V: Clone + Serialize + DeserializeOwned> PersistedMap<V> {
    const fn new(key: &'static str) -> Self {
        Self { key, values: OnceLock::new() }
    }

    fn load(&self, store: &dyn StateStore) -> HashMap<PathBuf, V> {
        let Some(value) = store.get(self.key) else {
            return HashMap::new();
        };
        serde_json::from_value(value).unwrap_or_else(|e| {
            tracing::warn!(key = self.key, error = %e, "Ignoring unreadable persisted state");
            HashMap::new()
        })
    }

    fn get(&self, store: &dyn StateStore, path: &Path) -> Option<V> {
        self.values.get_or_init(|| self.load(store)).get(path).cloned()
    }

    fn set(&mut self, store: &mut dyn StateStore, path: &Path, value: V) -> Result<()> {
        let mut values = self.values.take().unwrap_or_else(|| self.load(store));
        values.insert(path.to_path_buf(), value);
        let serialized = serde_json::to_value(&values);
        self.values = OnceLock::from(values);
        store.update(self.key, serialized?)
    }
}

/// Which package is selected, plus per-package user choices.
pub struct SelectionState {
    mode: SelectionMode,
    store: Box<dyn StateStore>,
    package_types: PersistedMap<PackageType>,
    targets: PersistedMap<DebuggingTarget>,
    debug_configs: PersistedMap<RockDebugConfig>,
}

impl std::fmt::Debug for SelectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionState").field("mode", &self.mode).finish()
    }
}

impl SelectionState {
    /// Create the state, persisting user choices in `store`.
    pub fn new(mode: SelectionMode, store: Box<dyn StateStore>) -> Self {
        Self {
            mode,
            store,
            package_types: PersistedMap::new(PACKAGE_TYPES_KEY),
            targets: PersistedMap::new(DEBUGGING_TARGETS_KEY),
            debug_configs: PersistedMap::new(DEBUG_CONFIGS_KEY),
        }
    }

    /// Current selection mode.
    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Switch the selection mode.
    pub fn set_mode(&mut self, mode: SelectionMode) {
        self.mode = mode;
    }

    /// Path of the selected package.
    ///
    /// In manual mode, a stored path that no longer belongs to a tracked
    /// folder reads as no selection. In auto mode, the selection is the
    /// folder owning the active local file.
    pub fn selected_path(&self, workspaces: &Workspaces, host: &dyn Host) -> Option<PathBuf> {
        match self.mode {
            SelectionMode::Manual => {
                let stored = self.store.get(SELECTED_PACKAGE_KEY)?;
                let path = PathBuf::from(stored.as_str()?);
                workspaces.folder_workspace(&path).is_some().then_some(path)
            }
            SelectionMode::Auto => {
                let resource = host.active_resource()?;
                if !resource.is_file() {
                    return None;
                }
                host.workspace_folder(&resource.path)
            }
        }
    }

    /// Store the manually selected package.
    pub fn set_selected_path(&mut self, path: &Path) -> Result<()> {
        let value = serde_json::Value::String(path.display().to_string());
        self.store.update(SELECTED_PACKAGE_KEY, value)
    }

    /// Type the user set for a package.
    pub fn package_type(&self, path: &Path) -> Option<PackageType> {
        self.package_types.get(self.store.as_ref(), path)
    }

    /// Set the type of a package.
    pub fn set_package_type(&mut self, path: &Path, kind: PackageType) -> Result<()> {
        self.package_types.set(self.store.as_mut(), path, kind)
    }

    /// Debugging target picked for a package.
    pub fn debugging_target(&self, path: &Path) -> Option<DebuggingTarget> {
        self.targets.get(self.store.as_ref(), path)
    }

    /// Replace the debugging target of a package.
    pub fn set_debugging_target(&mut self, path: &Path, target: DebuggingTarget) -> Result<()> {
        self.targets.set(self.store.as_mut(), path, target)
    }

    /// Debug settings of a package, with defaults applied.
    pub fn debug_config(&self, path: &Path) -> RockDebugConfig {
        let mut config = self.debug_configs.get(self.store.as_ref(), path).unwrap_or_default();
        config.cwd.get_or_insert_with(|| path.to_path_buf());
        config
    }

    /// Replace the debug settings of a package.
    pub fn set_debug_config(&mut self, path: &Path, config: RockDebugConfig) -> Result<()> {
        self.debug_configs.set(self.store.as_mut(), path, config)
    }
}

/// State and collaborators of a session.
pub struct Context {
    /// Known workspaces and folders
    pub workspaces: Workspaces,

    /// Generated autoproj tasks
    pub tasks: TaskProvider,

    /// Selection and per-package choices
    pub selection: SelectionState,

    /// Debugging settings
    pub debug: DebugSettings,

    host: Arc<dyn Host>,
    bridge: Arc<dyn EnvironmentBridge>,
    manifests: Arc<dyn ManifestLoader>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("workspaces", &self.workspaces)
            .field("tasks", &self.tasks.provide_tasks().len())
            .field("selection", &self.selection)
            .finish()
    }
}

impl Context {
    /// Create a session without any folder.
    pub fn new(
        host: Arc<dyn Host>,
        bridge: Arc<dyn EnvironmentBridge>,
        manifests: Arc<dyn ManifestLoader>,
        selection: SelectionState,
    ) -> Self {
        Self {
            workspaces: Workspaces::new(),
            tasks: TaskProvider::default(),
            selection,
            debug: DebugSettings::default(),
            host,
            bridge,
            manifests,
        }
    }

    /// Set the debugging settings.
    #[must_use]
    pub fn with_debug_settings(mut self, debug: DebugSettings) -> Self {
        self.debug = debug;
        self
    }

    /// The host.
    pub fn host(&self) -> Arc<dyn Host> {
        Arc::clone(&self.host)
    }

    /// The environment bridge.
    pub fn bridge(&self) -> Arc<dyn EnvironmentBridge> {
        Arc::clone(&self.bridge)
    }

    /// The manifest loader.
    pub fn manifests(&self) -> &dyn ManifestLoader {
        self.manifests.as_ref()
    }

    /// Track a folder and regenerate the tasks.
    pub fn add_folder(&mut self, path: &Path) -> Option<Workspace> {
        let ws = self.workspaces.add_folder(path);
        self.reload_tasks();
        ws
    }

    /// Stop tracking a folder and regenerate the tasks.
    pub fn remove_folder(&mut self, path: &Path) -> Option<Workspace> {
        let ws = self.workspaces.remove_folder(path);
        self.reload_tasks();
        ws
    }

    /// Regenerate the tasks from the current folders.
    pub fn reload_tasks(&mut self) {
        self.tasks.reload_tasks(&self.workspaces);
    }

    /// Package at `path`, classified from the current state.
    pub async fn get_package_by_path(&self, path: &Path) -> Package {
        PackageFactory::create_package(Some(path), self).await
    }

    /// Path of the selected package.
    pub fn selected_package_path(&self) -> Option<PathBuf> {
        self.selection.selected_path(&self.workspaces, self.host.as_ref())
    }

    /// The selected package, invalid when nothing is selected.
    pub async fn get_selected_package(&self) -> Package {
        let path = self.selected_package_path();
        PackageFactory::create_package(path.as_deref(), self).await
    }

    /// Manually select a package.
    pub fn set_selected_package(&mut self, path: &Path) -> Result<()> {
        self.selection.set_selected_path(path)
    }
}
