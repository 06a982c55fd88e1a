//! Debug configurations for rock packages.
//!
//! Packages produce a [`DebugConfiguration`] for the host to launch. The
//! providers in this module complete such configurations with the
//! workspace environment, and [`PreLaunchTaskProvider`] derives the
//! `rock-run` task orogen deployments need before a debugger can attach.

mod config;
mod launch;

pub use config::{
    ConfigurationProvider, CxxConfigurationProvider, RubyConfigurationProvider,
};
pub use launch::PreLaunchTaskProvider;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::autoproj::PackageInfo;

/// Name given to generated debug configurations.
pub const CONFIGURATION_NAME: &str = "rock debug";

/// An executable or script a debug session launches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebuggingTarget {
    name: String,
    path: PathBuf,
}

impl DebuggingTarget {
    /// Create a target.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self { name: name.into(), path: path.into() }
    }

    /// Target name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Target path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// An environment variable of a native debug configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentEntry {
    /// Variable name
    pub name: String,

    /// Variable value
    pub value: String,
}

impl EnvironmentEntry {
    /// Create an entry.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

/// A gdb command run when the session starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupCommand {
    /// What the command does
    pub description: String,

    /// The command
    pub text: String,

    /// Whether the session continues if the command fails
    pub ignore_failures: bool,
}

/// Launch configuration for compiled programs, run under gdb.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeDebugConfig {
    /// Debugger type
    #[serde(rename = "type")]
    pub kind: String,

    /// Configuration name
    pub name: String,

    /// `launch` or `attach`
    pub request: String,

    /// Program to debug
    pub program: PathBuf,

    /// Working directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,

    /// Program arguments
    #[serde(default)]
    pub args: Vec<String>,

    /// Launch environment
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment: Vec<EnvironmentEntry>,

    /// Debugger kind, `gdb` or `lldb`
    #[serde(rename = "MIMode")]
    pub mi_mode: String,

    /// Debugger executable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mi_debugger_path: Option<PathBuf>,

    /// Commands run when the session starts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub setup_commands: Vec<SetupCommand>,

    /// Whether the program gets its own console
    #[serde(default)]
    pub external_console: bool,

    /// Label of the task to run before launching
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_launch_task: Option<String>,

    /// Fields this crate does not interpret
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl NativeDebugConfig {
    /// A gdb launch configuration with pretty-printing enabled.
    pub fn launch(program: impl Into<PathBuf>) -> Self {
        Self {
            kind: "cppdbg".to_string(),
            name: CONFIGURATION_NAME.to_string(),
            request: "launch".to_string(),
            program: program.into(),
            cwd: None,
            args: Vec::new(),
            environment: Vec::new(),
            mi_mode: "gdb".to_string(),
            mi_debugger_path: None,
            setup_commands: vec![SetupCommand {
                description: "Enable pretty-printing for gdb".to_string(),
                text: "-enable-pretty-printing".to_string(),
                ignore_failures: false,
            }],
            external_console: false,
            pre_launch_task: None,
            extra: serde_json::Map::new(),
        }
    }
}

/// Launch configuration for Ruby scripts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpretedDebugConfig {
    /// Debugger type
    #[serde(rename = "type")]
    pub kind: String,

    /// Configuration name
    pub name: String,

    /// `launch` or `attach`
    pub request: String,

    /// Script to run
    pub program: PathBuf,

    /// Working directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,

    /// Script arguments
    #[serde(default)]
    pub args: Vec<String>,

    /// Launch environment
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Whether to run through bundler
    #[serde(default)]
    pub use_bundler: bool,

    /// Bundler executable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_to_bundler: Option<PathBuf>,

    /// Fields this crate does not interpret
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl InterpretedDebugConfig {
    /// A Ruby launch configuration.
    pub fn launch(program: impl Into<PathBuf>) -> Self {
        Self {
            kind: "Ruby".to_string(),
            name: CONFIGURATION_NAME.to_string(),
            request: "launch".to_string(),
            program: program.into(),
            cwd: None,
            args: Vec::new(),
            env: BTreeMap::new(),
            use_bundler: false,
            path_to_bundler: None,
            extra: serde_json::Map::new(),
        }
    }
}

/// A configuration the host can start a debug session with.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DebugConfiguration {
    /// Compiled program under gdb
    Native(NativeDebugConfig),
    /// Ruby script
    Interpreted(InterpretedDebugConfig),
}

impl DebugConfiguration {
    /// Program the session launches.
    pub fn program(&self) -> &Path {
        match self {
            Self::Native(config) => &config.program,
            Self::Interpreted(config) => &config.program,
        }
    }
}

const SRC_DIR_TOKEN: &str = "${rock:srcDir}";
const BUILD_DIR_TOKEN: &str = "${rock:buildDir}";
const PREFIX_DIR_TOKEN: &str = "${rock:prefixDir}";

/// Replace the `${rock:srcDir}`, `${rock:buildDir}` and `${rock:prefixDir}`
/// tokens of `template` with the directories of `info`.
///
/// Substitution is a single left-to-right pass: replaced text is never
/// scanned again and unknown tokens are kept as-is.
pub fn expand_autoproj_paths(info: &PackageInfo, template: &str) -> String {
    let tokens = [
        (SRC_DIR_TOKEN, &info.srcdir),
        (BUILD_DIR_TOKEN, &info.builddir),
        (PREFIX_DIR_TOKEN, &info.prefix),
    ];

    let mut expanded = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("${rock:") {
        expanded.push_str(&rest[..start]);
        rest = &rest[start..];
        match tokens.iter().find(|(token, _)| rest.starts_with(token)) {
            Some((token, dir)) => {
                expanded.push_str(&dir.to_string_lossy());
                rest = &rest[token.len()..];
            }
            None => {
                expanded.push('$');
                rest = &rest[1..];
            }
        }
    }
    expanded.push_str(rest);
    expanded
}

/// Whether `template` contains a path token.
pub fn has_autoproj_paths(template: &str) -> bool {
    [SRC_DIR_TOKEN, BUILD_DIR_TOKEN, PREFIX_DIR_TOKEN].iter().any(|t| template.contains(t))
}
