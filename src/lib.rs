//! # rock-workspace
//!
//! Workspace model for autoproj/rock development environments.
//!
//! Given a set of folders, rock-workspace finds the autoproj workspaces
//! they belong to, classifies each folder as a package, generates the
//! autoproj build, update and checkout tasks, and derives debugger launch
//! configurations for the selected package.
//!
//! ## Features
//!
//! - **Workspace discovery**: Finds workspace roots by their `.autoproj` directory
//! - **Package types**: Reads types from the installation manifest, with user overrides
//! - **Tasks**: Generates autoproj invocations per workspace and per package
//! - **Debugging**: gdb and Ruby launch configurations, orogen deployments under gdbserver
//!
//! ## Quick Start
//!
//! ```bash
//! # List the tasks of the package in the current directory
//! rock-ws tasks
//!
//! # Build a package
//! rock-ws --folder ~/rock/drivers/iodrivers_base build
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Allow common patterns that are intentional in this codebase
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::map_unwrap_or)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::future_not_send)]

pub mod autoproj;
pub mod commands;
pub mod config;
pub mod context;
pub mod debug;
pub mod error;
pub mod host;
pub mod packages;
pub mod state;
pub mod tasks;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use autoproj::{InstallationManifestLoader, ManifestLoader, Workspace, Workspaces};
pub use config::Config;
pub use context::{Context, RockDebugConfig, SelectionState};
pub use debug::{DebugConfiguration, DebuggingTarget, PreLaunchTaskProvider};
pub use error::{Error, ErrorKind, Result};
pub use host::{AutoprojBridge, EnvironmentBridge, Host, LocalHost};
pub use packages::{Package, PackageFactory, PackageType};
pub use tasks::{TaskDescriptor, TaskMode, TaskProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "rock-workspace";
