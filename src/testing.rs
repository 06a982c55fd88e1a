//! Test doubles for the host, the environment bridge and manifests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tempfile::TempDir;

use crate::autoproj::{Manifest, ManifestLoader, ManifestPackage, PackageInfo, Workspace, Workspaces, MARKER_DIR};
use crate::config::SelectionMode;
use crate::context::{Context, SelectionState};
use crate::debug::DebugConfiguration;
use crate::host::{Choice, EnvironmentBridge, Host, OrogenTask, Resource};
use crate::state::MemoryStore;
use crate::tasks::TaskDescriptor;

/// Manifest loader serving an in-memory manifest.
#[derive(Debug, Default)]
pub struct StaticManifest {
    manifest: Mutex<Manifest>,
    failure: Mutex<Option<String>>,
    loads: AtomicUsize,
}

impl StaticManifest {
    pub fn failing(message: &str) -> Self {
        let loader = Self::default();
        loader.set_failure(message);
        loader
    }

    pub fn with_package(name: &str, kind: &str, srcdir: &str) -> Self {
        let loader = Self::default();
        loader.add_package(
            name,
            kind,
            PackageInfo { srcdir: srcdir.into(), ..PackageInfo::default() },
        );
        loader
    }

    pub fn add_package(&self, name: &str, kind: &str, info: PackageInfo) {
        self.manifest.lock().insert(ManifestPackage {
            name: name.to_string(),
            kind: kind.to_string(),
            info,
            dependencies: Vec::new(),
        });
    }

    pub fn set_failure(&self, message: &str) {
        *self.failure.lock() = Some(message.to_string());
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ManifestLoader for StaticManifest {
    async fn load(&self, _ws: &Workspace) -> anyhow::Result<Manifest> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.failure.lock().clone() {
            anyhow::bail!(message);
        }
        Ok(self.manifest.lock().clone())
    }
}

/// Host recording what it is asked to do.
#[derive(Debug, Default)]
pub struct MockHost {
    folders: Mutex<Vec<PathBuf>>,
    active: Mutex<Option<Resource>>,
    open_dialog_answer: Mutex<Option<PathBuf>>,
    quick_pick_answer: Mutex<Option<usize>>,
    task_failure: Mutex<Option<String>>,
    ran_tasks: Mutex<Vec<TaskDescriptor>>,
    debug_sessions: Mutex<Vec<(PathBuf, DebugConfiguration)>>,
    launch_configs: Mutex<Vec<(PathBuf, DebugConfiguration)>>,
    quick_picks: Mutex<Vec<Vec<Choice>>>,
}

impl MockHost {
    pub fn add_folder(&self, path: impl Into<PathBuf>) {
        self.folders.lock().push(path.into());
    }

    pub fn open_editor(&self, resource: Resource) {
        *self.active.lock() = Some(resource);
    }

    pub fn answer_open_dialog(&self, answer: Option<PathBuf>) {
        *self.open_dialog_answer.lock() = answer;
    }

    pub fn answer_quick_pick(&self, answer: Option<usize>) {
        *self.quick_pick_answer.lock() = answer;
    }

    pub fn fail_tasks(&self, message: &str) {
        *self.task_failure.lock() = Some(message.to_string());
    }

    pub fn ran_tasks(&self) -> Vec<TaskDescriptor> {
        self.ran_tasks.lock().clone()
    }

    pub fn debug_sessions(&self) -> Vec<(PathBuf, DebugConfiguration)> {
        self.debug_sessions.lock().clone()
    }

    pub fn launch_configs(&self) -> Vec<(PathBuf, DebugConfiguration)> {
        self.launch_configs.lock().clone()
    }

    pub fn quick_picks(&self) -> Vec<Vec<Choice>> {
        self.quick_picks.lock().clone()
    }
}

#[async_trait]
impl Host for MockHost {
    fn workspace_folder(&self, path: &Path) -> Option<PathBuf> {
        self.folders
            .lock()
            .iter()
            .filter(|folder| path.starts_with(folder))
            .max_by_key(|folder| folder.as_os_str().len())
            .cloned()
    }

    fn active_resource(&self) -> Option<Resource> {
        self.active.lock().clone()
    }

    async fn run_task(&self, task: &TaskDescriptor) -> anyhow::Result<()> {
        if let Some(message) = self.task_failure.lock().clone() {
            anyhow::bail!(message);
        }
        self.ran_tasks.lock().push(task.clone());
        Ok(())
    }

    async fn start_debugging(
        &self,
        folder: &Path,
        config: &DebugConfiguration,
    ) -> anyhow::Result<()> {
        self.debug_sessions.lock().push((folder.to_path_buf(), config.clone()));
        Ok(())
    }

    async fn add_launch_config(
        &self,
        folder: &Path,
        config: &DebugConfiguration,
    ) -> anyhow::Result<()> {
        self.launch_configs.lock().push((folder.to_path_buf(), config.clone()));
        Ok(())
    }

    async fn show_open_dialog(&self, _default: &Path) -> Option<PathBuf> {
        self.open_dialog_answer.lock().clone()
    }

    async fn show_quick_pick(&self, _placeholder: &str, choices: &[Choice]) -> Option<usize> {
        self.quick_picks.lock().push(choices.to_vec());
        *self.quick_pick_answer.lock()
    }
}

/// Environment bridge answering from canned data.
#[derive(Debug, Default)]
pub struct MockBridge {
    env: Mutex<HashMap<String, String>>,
    orogen_tasks: Mutex<Vec<OrogenTask>>,
    failure: Mutex<Option<String>>,
}

impl MockBridge {
    pub fn set_env(&self, env: HashMap<String, String>) {
        *self.env.lock() = env;
    }

    pub fn set_orogen_tasks(&self, tasks: Vec<OrogenTask>) {
        *self.orogen_tasks.lock() = tasks;
    }

    pub fn set_failure(&self, message: &str) {
        *self.failure.lock() = Some(message.to_string());
    }

    fn check(&self) -> anyhow::Result<()> {
        match self.failure.lock().clone() {
            Some(message) => Err(anyhow::anyhow!(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl EnvironmentBridge for MockBridge {
    async fn env(&self, _path: &Path) -> anyhow::Result<HashMap<String, String>> {
        self.check()?;
        Ok(self.env.lock().clone())
    }

    async fn which(&self, ws: &Workspace, name: &str) -> anyhow::Result<PathBuf> {
        self.check()?;
        Ok(ws.root().join("bin").join(name))
    }

    async fn describe_orogen_project(
        &self,
        _path: &Path,
        _name: &str,
    ) -> anyhow::Result<Vec<OrogenTask>> {
        self.check()?;
        Ok(self.orogen_tasks.lock().clone())
    }
}

/// Temporary directory tree plus the doubles a [`Context`] needs.
pub struct TestSetup {
    tmp: TempDir,
    pub host: Arc<MockHost>,
    pub bridge: Arc<MockBridge>,
    pub manifests: Arc<StaticManifest>,
}

impl TestSetup {
    pub fn new() -> Self {
        Self {
            tmp: TempDir::new().unwrap(),
            host: Arc::new(MockHost::default()),
            bridge: Arc::new(MockBridge::default()),
            manifests: Arc::new(StaticManifest::default()),
        }
    }

    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    /// Create `rel` without making it a workspace.
    pub fn plain_dir(&self, rel: &str) -> PathBuf {
        let dir = self.root().join(rel);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Create the workspace `ws` and the directory `rel` inside it.
    pub fn package_dir(&self, ws: &str, rel: &str) -> PathBuf {
        self.plain_dir(&format!("{ws}/{MARKER_DIR}"));
        self.plain_dir(&format!("{ws}/{rel}"))
    }

    pub fn workspaces(&self) -> Workspaces {
        Workspaces::new()
    }

    pub fn context(&self) -> Context {
        Context::new(
            self.host.clone(),
            self.bridge.clone(),
            self.manifests.clone(),
            SelectionState::new(SelectionMode::Manual, Box::new(MemoryStore::new())),
        )
    }

    /// A context tracking `folders`, known to the host as well.
    pub fn context_with_folders<P: AsRef<Path>>(&self, folders: &[P]) -> Context {
        let mut ctx = self.context();
        for folder in folders {
            self.host.add_folder(folder.as_ref());
            ctx.add_folder(folder.as_ref());
        }
        ctx
    }
}
