//! Collaborators the core relies on but does not implement.
//!
//! The host owns the user interface (pickers, folders, editors) and
//! executes tasks and debug sessions. The environment bridge knows how to
//! query an autoproj installation.

mod local;

pub use local::{AutoprojBridge, LocalHost};

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::autoproj::Workspace;
use crate::debug::DebugConfiguration;
use crate::tasks::TaskDescriptor;

/// A resource opened in the host, identified by URI scheme and path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// URI scheme, `file` for local files
    pub scheme: String,

    /// Path component of the URI
    pub path: PathBuf,
}

impl Resource {
    /// A local file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self { scheme: "file".to_string(), path: path.into() }
    }

    /// Whether this resource is a local file.
    pub fn is_file(&self) -> bool {
        self.scheme == "file"
    }
}

/// One entry of a quick pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    /// Main text
    pub label: String,

    /// Secondary text
    pub description: String,
}

impl Choice {
    /// Create a choice.
    pub fn new(label: impl Into<String>, description: impl Into<String>) -> Self {
        Self { label: label.into(), description: description.into() }
    }
}

/// An orogen deployment as reported by project introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrogenTask {
    /// Task model name
    pub model_name: String,

    /// Name of the default deployment
    pub deployment_name: String,

    /// Deployment executable
    pub file: PathBuf,
}

/// The user interface and execution environment hosting the core.
#[async_trait]
pub trait Host: Send + Sync {
    /// Editor folder containing `path`, if any.
    fn workspace_folder(&self, path: &Path) -> Option<PathBuf>;

    /// Resource of the active editor, if any.
    fn active_resource(&self) -> Option<Resource>;

    /// Run a task.
    async fn run_task(&self, task: &TaskDescriptor) -> anyhow::Result<()>;

    /// Start a debug session in `folder`.
    async fn start_debugging(
        &self,
        folder: &Path,
        config: &DebugConfiguration,
    ) -> anyhow::Result<()>;

    /// Save a launch configuration for `folder`.
    async fn add_launch_config(
        &self,
        folder: &Path,
        config: &DebugConfiguration,
    ) -> anyhow::Result<()>;

    /// Ask the user for a file, returns `None` when cancelled.
    async fn show_open_dialog(&self, default: &Path) -> Option<PathBuf>;

    /// Ask the user to pick one of `choices`, returns its index.
    async fn show_quick_pick(&self, placeholder: &str, choices: &[Choice]) -> Option<usize>;
}

/// Access to the autoproj environment of a workspace.
#[async_trait]
pub trait EnvironmentBridge: Send + Sync {
    /// Environment in which the package at `path` runs.
    async fn env(&self, path: &Path) -> anyhow::Result<HashMap<String, String>>;

    /// Resolve `name` to an absolute path within `ws`.
    async fn which(&self, ws: &Workspace, name: &str) -> anyhow::Result<PathBuf>;

    /// List the deployments of the orogen project at `path`.
    async fn describe_orogen_project(
        &self,
        path: &Path,
        name: &str,
    ) -> anyhow::Result<Vec<OrogenTask>>;
}
