//! Host and environment bridge for command-line use.
//!
//! Tasks run as child processes attached to the terminal, debug
//! configurations are printed as JSON, and interactive pickers report
//! cancellation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::Context as _;
use async_trait::async_trait;
use tokio::process::Command;

use super::{Choice, EnvironmentBridge, Host, OrogenTask, Resource};
use crate::autoproj::{autoproj_exe_path, find_workspace_root, Workspace};
use crate::debug::DebugConfiguration;
use crate::tasks::TaskDescriptor;

/// Host treating a fixed list of directories as the open folders.
#[derive(Debug, Clone, Default)]
pub struct LocalHost {
    folders: Vec<PathBuf>,
    active: Option<PathBuf>,
}

impl LocalHost {
    /// Create a host with the given open folders.
    pub fn new(folders: Vec<PathBuf>) -> Self {
        Self { folders, active: None }
    }

    /// Treat `path` as the file of the active editor.
    #[must_use]
    pub fn with_active_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.active = Some(path.into());
        self
    }

    /// Open folders.
    pub fn folders(&self) -> &[PathBuf] {
        &self.folders
    }
}

#[async_trait]
impl Host for LocalHost {
    fn workspace_folder(&self, path: &Path) -> Option<PathBuf> {
        self.folders
            .iter()
            .filter(|folder| path.starts_with(folder))
            .max_by_key(|folder| folder.components().count())
            .cloned()
    }

    fn active_resource(&self) -> Option<Resource> {
        self.active.clone().map(Resource::file)
    }

    async fn run_task(&self, task: &TaskDescriptor) -> anyhow::Result<()> {
        tracing::info!(task = %task.label(), "Running task");

        let mut cmd = Command::new(&task.command_path);
        cmd.args(&task.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(ref dir) = task.cwd {
            cmd.current_dir(dir);
        }

        let status = cmd
            .status()
            .await
            .with_context(|| format!("could not start {}", task.command_path.display()))?;
        if !status.success() {
            anyhow::bail!("{} failed with {status}", task.label());
        }
        Ok(())
    }

    async fn start_debugging(
        &self,
        folder: &Path,
        config: &DebugConfiguration,
    ) -> anyhow::Result<()> {
        tracing::info!(folder = %folder.display(), "Debug session requested");
        println!("{}", serde_json::to_string_pretty(config)?);
        Ok(())
    }

    async fn add_launch_config(
        &self,
        folder: &Path,
        config: &DebugConfiguration,
    ) -> anyhow::Result<()> {
        tracing::info!(folder = %folder.display(), "Launch configuration requested");
        println!("{}", serde_json::to_string_pretty(config)?);
        Ok(())
    }

    async fn show_open_dialog(&self, default: &Path) -> Option<PathBuf> {
        tracing::debug!(default = %default.display(), "File dialog not available, cancelling");
        None
    }

    async fn show_quick_pick(&self, placeholder: &str, choices: &[Choice]) -> Option<usize> {
        tracing::debug!(placeholder, choices = choices.len(), "Picker not available, cancelling");
        None
    }
}

/// Bridge querying the autoproj executable of each workspace.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoprojBridge;

impl AutoprojBridge {
    async fn autoproj(root: &Path, args: &[&str]) -> anyhow::Result<String> {
        let exe = autoproj_exe_path(root);
        let output = Command::new(&exe)
            .args(args)
            .current_dir(root)
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("could not start {}", exe.display()))?;
        if !output.status.success() {
            anyhow::bail!(
                "autoproj {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Parse `KEY=VALUE` lines.
fn parse_env(output: &str) -> HashMap<String, String> {
    output
        .lines()
        .filter_map(|line| line.split_once('='))
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

#[async_trait]
impl EnvironmentBridge for AutoprojBridge {
    async fn env(&self, path: &Path) -> anyhow::Result<HashMap<String, String>> {
        let root = find_workspace_root(path)
            .with_context(|| format!("{} is not in an autoproj workspace", path.display()))?;
        let output = Self::autoproj(&root, &["exec", "env"]).await?;
        Ok(parse_env(&output))
    }

    async fn which(&self, ws: &Workspace, name: &str) -> anyhow::Result<PathBuf> {
        let output = Self::autoproj(ws.root(), &["which", name]).await?;
        let resolved = output.trim();
        if resolved.is_empty() {
            anyhow::bail!("could not find {name} in {}", ws.name());
        }
        Ok(PathBuf::from(resolved))
    }

    async fn describe_orogen_project(
        &self,
        path: &Path,
        name: &str,
    ) -> anyhow::Result<Vec<OrogenTask>> {
        anyhow::bail!(
            "cannot introspect orogen project {name} at {}: no introspection server",
            path.display()
        )
    }
}
