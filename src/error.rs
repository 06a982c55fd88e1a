//! Error types.
//!
//! Every failure the core reports falls in one of three kinds: the wrong
//! package variant for an operation, a collaborator that failed to deliver
//! data, or a missing precondition.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for workspace operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The package variant does not support the requested operation.
    Structural,

    /// A manifest, environment or host collaborator failed.
    Resolution,

    /// A lookup came back empty where a value was required.
    NotFound,
}

/// Errors that can occur while working with packages.
#[derive(Debug, Error)]
pub enum Error {
    /// No package could be resolved for the requested path.
    #[error("Select a valid package")]
    InvalidPackage,

    /// The package is the workspace configuration.
    #[error("{0} is a configuration package")]
    ConfigPackage(String),

    /// The package lives outside of any autoproj workspace.
    #[error("{0} is not part of an autoproj workspace")]
    ForeignPackage(String),

    /// The package type is unknown and must be set by the user.
    #[error("Set the package type before picking a debugging target or debugging")]
    UnknownPackageType,

    /// Debugging was requested before a target was picked.
    #[error("Select a debugging target before debugging")]
    NoDebuggingTarget,

    /// The installation manifest does not list the package.
    #[error("{0} is not in the installation manifest")]
    NotInManifest(PathBuf),

    /// The package has no editor folder to attach a session to.
    #[error("{0} is not in an open folder")]
    NoWorkspaceFolder(PathBuf),

    /// No generated task matches the request.
    #[error("No {mode} task found for {path}")]
    TaskNotFound { mode: &'static str, path: PathBuf },

    /// There are no folders to choose from.
    #[error("Current workspace is empty")]
    EmptyWorkspace,

    /// The installation manifest could not be loaded.
    #[error(transparent)]
    Manifest(anyhow::Error),

    /// The environment bridge failed.
    #[error(transparent)]
    Bridge(anyhow::Error),

    /// The host refused or failed an action.
    #[error(transparent)]
    Host(anyhow::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted state could not be (de)serialized.
    #[error("State error: {0}")]
    State(#[from] serde_json::Error),
}

impl Error {
    /// Classify this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPackage
            | Self::ConfigPackage(_)
            | Self::ForeignPackage(_)
            | Self::UnknownPackageType
            | Self::NoDebuggingTarget
            | Self::EmptyWorkspace => ErrorKind::Structural,
            Self::Manifest(_) | Self::Bridge(_) | Self::Host(_) | Self::Io(_) | Self::State(_) => {
                ErrorKind::Resolution
            }
            Self::NotInManifest(_) | Self::NoWorkspaceFolder(_) | Self::TaskNotFound { .. } => {
                ErrorKind::NotFound
            }
        }
    }
}
