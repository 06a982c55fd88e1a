//! Autoproj task generation.
//!
//! Derives the build, update, checkout and osdeps invocations for every
//! known workspace and for every folder inside them. Tasks are plain
//! descriptors; running them is up to the host.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::autoproj::{Workspace, Workspaces};

/// Problem matcher attached to build tasks.
pub const BUILD_PROBLEM_MATCHER: &str = "$autoproj-build";

/// What an autoproj task does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskMode {
    /// `autoproj build`
    Build,
    /// `autoproj build --force` on a single package
    ForceBuild,
    /// `autoproj update`
    Update,
    /// `autoproj update --checkout-only`
    Checkout,
    /// `autoproj osdeps`
    Osdeps,
    /// `autoproj update --config`
    UpdateConfig,
}

impl TaskMode {
    /// Identifier of the mode.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::ForceBuild => "force-build",
            Self::Update => "update",
            Self::Checkout => "checkout",
            Self::Osdeps => "osdeps",
            Self::UpdateConfig => "update-config",
        }
    }

    /// Arguments every task of this mode starts with.
    pub fn arg_prefix(self) -> Vec<String> {
        let args: &[&str] = match self {
            Self::Build => &["build", "--tool"],
            Self::ForceBuild => &["build", "--tool", "--force", "--deps=f", "--no-confirm"],
            Self::Update => &["update", "--progress=f", "-k", "--color"],
            Self::Checkout => &["update", "--progress=f", "-k", "--color", "--checkout-only"],
            Self::Osdeps => &["osdeps", "--color"],
            Self::UpdateConfig => &["update", "--progress=f", "-k", "--color", "--config"],
        };
        args.iter().map(|arg| (*arg).to_string()).collect()
    }

    /// Action label used in task names.
    const fn action(self) -> &'static str {
        match self {
            Self::Build => "Build",
            Self::ForceBuild => "Force Build",
            Self::Update => "Update",
            Self::Checkout => "Checkout",
            Self::Osdeps => "Install OS Dependencies",
            Self::UpdateConfig => "Update Configuration",
        }
    }
}

/// Task group understood by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskGroup {
    /// Build tasks
    Build,
}

/// Data identifying a task independently of its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskMetadata {
    /// Task type, `autoproj` or `rock`
    #[serde(rename = "type")]
    pub kind: String,

    /// Autoproj mode, absent for launch tasks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<TaskMode>,

    /// Root of the workspace the task runs in
    pub workspace_root: PathBuf,

    /// Folder the task applies to, absent for workspace tasks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<PathBuf>,
}

/// A process invocation ready to be handed to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDescriptor {
    /// Display name
    pub name: String,

    /// Provider of the task
    pub source: String,

    /// Executable to run
    pub command_path: PathBuf,

    /// Arguments, in order
    pub args: Vec<String>,

    /// Working directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,

    /// Group of the task
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<TaskGroup>,

    /// Problem matchers applied to the output
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub problem_matchers: Vec<String>,

    /// Editor folder the task is scoped to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<PathBuf>,

    /// Identification data
    pub metadata: TaskMetadata,
}

impl TaskDescriptor {
    /// Create an autoproj task running in `ws`.
    pub fn autoproj(name: impl Into<String>, ws: &Workspace, mode: TaskMode) -> Self {
        Self {
            name: name.into(),
            source: "autoproj".to_string(),
            command_path: ws.autoproj_exe_path(),
            args: mode.arg_prefix(),
            cwd: Some(ws.root().to_path_buf()),
            group: None,
            problem_matchers: Vec::new(),
            scope: None,
            metadata: TaskMetadata {
                kind: "autoproj".to_string(),
                mode: Some(mode),
                workspace_root: ws.root().to_path_buf(),
                folder: None,
            },
        }
    }

    /// Create a task of type `rock` running the autoproj executable of `ws`.
    pub fn rock(name: impl Into<String>, ws: &Workspace, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            source: "rock".to_string(),
            command_path: ws.autoproj_exe_path(),
            args,
            cwd: None,
            group: None,
            problem_matchers: Vec::new(),
            scope: None,
            metadata: TaskMetadata {
                kind: "rock".to_string(),
                mode: None,
                workspace_root: ws.root().to_path_buf(),
                folder: None,
            },
        }
    }

    /// Restrict the task to a folder, passed as the last argument.
    #[must_use]
    pub fn with_folder(mut self, folder: &Path) -> Self {
        self.args.push(folder.display().to_string());
        self.metadata.folder = Some(folder.to_path_buf());
        self
    }

    /// Set the working directory.
    #[must_use]
    pub fn with_cwd(mut self, cwd: Option<PathBuf>) -> Self {
        self.cwd = cwd;
        self
    }

    /// Set the folder scope.
    #[must_use]
    pub fn with_scope(mut self, scope: Option<PathBuf>) -> Self {
        self.scope = scope;
        self
    }

    /// Mark as a build task.
    #[must_use]
    pub fn as_build(mut self) -> Self {
        self.group = Some(TaskGroup::Build);
        self.problem_matchers = vec![BUILD_PROBLEM_MATCHER.to_string()];
        self
    }

    /// Name the host uses to find the task, `<source>: <name>`.
    pub fn label(&self) -> String {
        format!("{}: {}", self.source, self.name)
    }
}

/// Generates and indexes the autoproj tasks of a set of workspaces.
#[derive(Debug, Default)]
pub struct TaskProvider {
    tasks: Vec<TaskDescriptor>,
    index: HashMap<(TaskMode, PathBuf), usize>,
}

impl TaskProvider {
    /// Generate the tasks of `workspaces`.
    pub fn new(workspaces: &Workspaces) -> Self {
        let mut provider = Self::default();
        provider.reload_tasks(workspaces);
        provider
    }

    /// Discard all tasks and generate them again.
    pub fn reload_tasks(&mut self, workspaces: &Workspaces) {
        self.tasks = generate_tasks(workspaces);
        self.index = self
            .tasks
            .iter()
            .enumerate()
            .filter_map(|(i, task)| {
                let mode = task.metadata.mode?;
                let key = task.metadata.folder.as_ref().unwrap_or(&task.metadata.workspace_root);
                Some(((mode, key.clone()), i))
            })
            .collect();
        tracing::debug!(count = self.tasks.len(), "Generated autoproj tasks");
    }

    /// All tasks, workspace tasks first.
    pub fn provide_tasks(&self) -> &[TaskDescriptor] {
        &self.tasks
    }

    /// Look a task up by mode and folder (or workspace root).
    pub fn task(&self, mode: TaskMode, path: &Path) -> Option<&TaskDescriptor> {
        self.index.get(&(mode, path.to_path_buf())).map(|&i| &self.tasks[i])
    }

    /// Build task of a folder or workspace root.
    pub fn build_task(&self, path: &Path) -> Option<&TaskDescriptor> {
        self.task(TaskMode::Build, path)
    }

    /// Force-build task of a folder.
    pub fn force_build_task(&self, path: &Path) -> Option<&TaskDescriptor> {
        self.task(TaskMode::ForceBuild, path)
    }

    /// Update task of a folder or workspace root.
    pub fn update_task(&self, path: &Path) -> Option<&TaskDescriptor> {
        self.task(TaskMode::Update, path)
    }

    /// Checkout task of a folder or workspace root.
    pub fn checkout_task(&self, path: &Path) -> Option<&TaskDescriptor> {
        self.task(TaskMode::Checkout, path)
    }

    /// Osdeps task of a workspace root.
    pub fn osdeps_task(&self, path: &Path) -> Option<&TaskDescriptor> {
        self.task(TaskMode::Osdeps, path)
    }

    /// Configuration update task of a workspace root.
    pub fn update_config_task(&self, path: &Path) -> Option<&TaskDescriptor> {
        self.task(TaskMode::UpdateConfig, path)
    }
}

fn workspace_task(ws: &Workspace, mode: TaskMode) -> TaskDescriptor {
    let task = TaskDescriptor::autoproj(format!("{}: {}", ws.name(), mode.action()), ws, mode);
    if mode == TaskMode::Build {
        task.as_build()
    } else {
        task
    }
}

fn folder_task(ws: &Workspace, folder: &Path, mode: TaskMode) -> TaskDescriptor {
    let relative = folder.strip_prefix(ws.root()).unwrap_or(folder);
    let name = format!("{}: {} {}", ws.name(), mode.action(), relative.display());
    let task = TaskDescriptor::autoproj(name, ws, mode).with_folder(folder);
    if matches!(mode, TaskMode::Build | TaskMode::ForceBuild) {
        task.as_build()
    } else {
        task
    }
}

/// Generate every task for `workspaces`.
pub fn generate_tasks(workspaces: &Workspaces) -> Vec<TaskDescriptor> {
    let mut tasks = Vec::new();
    workspaces.for_each_workspace(|ws| {
        for mode in [
            TaskMode::Build,
            TaskMode::Checkout,
            TaskMode::Osdeps,
            TaskMode::UpdateConfig,
            TaskMode::Update,
        ] {
            tasks.push(workspace_task(ws, mode));
        }
    });
    workspaces.for_each_folder(|ws, folder| {
        if folder == ws.root() {
            return;
        }
        for mode in [TaskMode::Build, TaskMode::Checkout, TaskMode::ForceBuild, TaskMode::Update] {
            tasks.push(folder_task(ws, folder, mode));
        }
    });
    tasks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arg_prefixes() {
        assert_eq!(TaskMode::Build.arg_prefix(), vec!["build", "--tool"]);
        assert_eq!(
            TaskMode::Checkout.arg_prefix(),
            vec!["update", "--progress=f", "-k", "--color", "--checkout-only"]
        );
        assert_eq!(TaskMode::Osdeps.arg_prefix(), vec!["osdeps", "--color"]);
        assert_eq!(
            TaskMode::UpdateConfig.arg_prefix(),
            vec!["update", "--progress=f", "-k", "--color", "--config"]
        );
        assert_eq!(TaskMode::Update.arg_prefix(), vec!["update", "--progress=f", "-k", "--color"]);
    }

    #[test]
    fn test_folder_task_naming_and_args() {
        let ws = Workspace::new("/ws/one");
        let folder = Path::new("/ws/one/drivers/iodrivers_base");

        let build = folder_task(&ws, folder, TaskMode::Build);
        assert_eq!(build.name, "one: Build drivers/iodrivers_base");
        assert_eq!(build.args, vec!["build", "--tool", "/ws/one/drivers/iodrivers_base"]);
        assert_eq!(build.command_path, PathBuf::from("/ws/one/.autoproj/bin/autoproj"));
        assert_eq!(build.group, Some(TaskGroup::Build));
        assert_eq!(build.problem_matchers, vec![BUILD_PROBLEM_MATCHER]);

        let force = folder_task(&ws, folder, TaskMode::ForceBuild);
        assert_eq!(force.name, "one: Force Build drivers/iodrivers_base");
        assert_eq!(
            force.args,
            vec![
                "build",
                "--tool",
                "--force",
                "--deps=f",
                "--no-confirm",
                "/ws/one/drivers/iodrivers_base"
            ]
        );
        assert_eq!(force.metadata.mode, Some(TaskMode::ForceBuild));
        assert_eq!(force.metadata.folder.as_deref(), Some(folder));
    }

    #[test]
    fn test_workspace_task_naming() {
        let ws = Workspace::new("/ws/one");
        let osdeps = workspace_task(&ws, TaskMode::Osdeps);
        assert_eq!(osdeps.name, "one: Install OS Dependencies");
        assert_eq!(osdeps.label(), "autoproj: one: Install OS Dependencies");
        assert!(osdeps.group.is_none());
        assert!(osdeps.metadata.folder.is_none());
        assert_eq!(osdeps.cwd.as_deref(), Some(Path::new("/ws/one")));
    }

    #[test]
    fn test_empty_registry() {
        let provider = TaskProvider::new(&Workspaces::new());
        assert!(provider.provide_tasks().is_empty());
        assert!(provider.build_task(Path::new("/ws")).is_none());
    }

    #[test]
    fn test_metadata_serialization() {
        let ws = Workspace::new("/ws/one");
        let task = folder_task(&ws, Path::new("/ws/one/pkg"), TaskMode::UpdateConfig);
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["metadata"]["mode"], "update-config");
        assert_eq!(json["metadata"]["type"], "autoproj");
        assert_eq!(json["metadata"]["workspaceRoot"], "/ws/one");
        assert_eq!(json["commandPath"], "/ws/one/.autoproj/bin/autoproj");
    }
}
