//! Packages and their capabilities.
//!
//! Every path the user works on classifies as exactly one [`Package`]
//! variant. All variants answer the same operations; the ones that make no
//! sense for a variant fail with a message telling the user why.

mod types;

pub use types::{PackageType, PackageTypeResolver, TypeResolution};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::autoproj::{ManifestLoader, PackageInfo, Workspace};
use crate::context::Context;
use crate::debug::{
    DebugConfiguration, DebuggingTarget, InterpretedDebugConfig, NativeDebugConfig,
    PreLaunchTaskProvider,
};
use crate::host::Choice;
use crate::{Error, Result};

/// Name reported for [`Package::Invalid`].
pub const INVALID_PACKAGE_NAME: &str = "(Invalid package)";

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Ask the user for a type and store it as the override for `path`.
async fn pick_type_for(path: &Path, ctx: &mut Context) -> Result<()> {
    let choices: Vec<_> =
        PackageType::PICKABLE.iter().map(|kind| Choice::new(kind.label(), "")).collect();
    let host = ctx.host();
    let Some(index) = host.show_quick_pick("Select the package type", &choices).await else {
        return Ok(());
    };
    let Some(kind) = PackageType::PICKABLE.get(index).copied() else {
        return Ok(());
    };
    tracing::debug!(path = %path.display(), kind = kind.id(), "Setting package type");
    ctx.selection.set_package_type(path, kind)
}

/// A package inside a workspace configuration directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPackage {
    path: PathBuf,
}

impl ConfigPackage {
    /// Package at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Package directory.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A folder the host tracks that is not in an autoproj workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignPackage {
    path: PathBuf,
    kind: PackageType,
}

impl ForeignPackage {
    /// Package at `path` with the type the user gave it.
    pub fn new(path: impl Into<PathBuf>, kind: PackageType) -> Self {
        Self { path: path.into(), kind }
    }

    /// Package directory.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A package of an autoproj workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RockPackage {
    path: PathBuf,
    ws: Workspace,
    kind: PackageType,
}

impl RockPackage {
    /// Package at `path` in `ws`.
    pub fn new(path: impl Into<PathBuf>, ws: Workspace, kind: PackageType) -> Self {
        Self { path: path.into(), ws, kind }
    }

    /// Package directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Owning workspace.
    pub fn workspace(&self) -> &Workspace {
        &self.ws
    }

    /// Resolved type.
    pub fn package_type(&self) -> PackageType {
        self.kind
    }

    /// Basename of the package directory.
    pub fn name(&self) -> String {
        basename(&self.path)
    }

    /// Directories of the package, read from the installation manifest.
    pub async fn info(&self, loader: &dyn ManifestLoader) -> Result<PackageInfo> {
        let manifest = loader.load(&self.ws).await.map_err(Error::Manifest)?;
        manifest
            .find_by_path(&self.ws, &self.path)
            .map(|pkg| pkg.info.clone())
            .ok_or_else(|| Error::NotInManifest(self.path.clone()))
    }

    /// Debugging target the user picked.
    pub fn target(&self, ctx: &Context) -> Option<DebuggingTarget> {
        ctx.selection.debugging_target(&self.path)
    }

    /// Run the build task of this package.
    pub async fn build(&self, ctx: &Context) -> Result<()> {
        let task = ctx
            .tasks
            .build_task(&self.path)
            .ok_or_else(|| Error::TaskNotFound { mode: "build", path: self.path.clone() })?;
        tracing::info!(task = %task.label(), "Building package");
        ctx.host().run_task(task).await.map_err(Error::Host)
    }

    /// Launch configuration for the picked target.
    pub async fn debug_configuration(&self, ctx: &Context) -> Result<DebugConfiguration> {
        if self.kind == PackageType::Other {
            return Err(Error::UnknownPackageType);
        }
        let target = self.target(ctx).ok_or(Error::NoDebuggingTarget)?;
        let conf = ctx.selection.debug_config(&self.path);

        match self.kind {
            PackageType::Ruby => {
                let env = ctx.bridge().env(&self.path).await.map_err(Error::Bridge)?;
                let mut config = InterpretedDebugConfig::launch(target.path());
                config.cwd = conf.cwd;
                config.args = conf.args;
                config.env = env.into_iter().collect::<BTreeMap<_, _>>();
                Ok(DebugConfiguration::Interpreted(config))
            }
            _ => {
                let mut config = NativeDebugConfig::launch(target.path());
                config.mi_mode.clone_from(&ctx.debug.mi_mode);
                config.cwd = conf.cwd;
                config.args = conf.args;
                if self.kind == PackageType::Orogen {
                    config.pre_launch_task =
                        PreLaunchTaskProvider::task(self, ctx).map(|task| task.label());
                }
                Ok(DebugConfiguration::Native(config))
            }
        }
    }

    /// Start a debug session in the editor folder of this package.
    pub async fn debug(&self, ctx: &Context) -> Result<()> {
        let config = self.debug_configuration(ctx).await?;
        let host = ctx.host();
        let folder = host
            .workspace_folder(&self.path)
            .ok_or_else(|| Error::NoWorkspaceFolder(self.path.clone()))?;
        host.start_debugging(&folder, &config).await.map_err(Error::Host)
    }

    /// Ask the user for the program to debug.
    pub async fn pick_target(&self, ctx: &mut Context) -> Result<()> {
        let host = ctx.host();
        let target = match self.kind {
            PackageType::Cxx | PackageType::Ruby => host
                .show_open_dialog(&self.path)
                .await
                .map(|picked| DebuggingTarget::new(basename(&picked), picked)),
            PackageType::Orogen => {
                let tasks = ctx
                    .bridge()
                    .describe_orogen_project(&self.path, &self.name())
                    .await
                    .map_err(Error::Bridge)?;
                let choices: Vec<_> = tasks
                    .iter()
                    .map(|task| Choice::new(&task.model_name, &task.deployment_name))
                    .collect();
                host.show_quick_pick("Select a task", &choices)
                    .await
                    .and_then(|index| tasks.get(index))
                    .map(|task| DebuggingTarget::new(&task.model_name, &task.file))
            }
            _ => return Err(Error::UnknownPackageType),
        };

        match target {
            Some(target) => ctx.selection.set_debugging_target(&self.path, target),
            None => Ok(()),
        }
    }
}

/// A package, in one of the forms a path can take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Package {
    /// No usable path
    Invalid,
    /// Workspace configuration
    Config(ConfigPackage),
    /// Outside of any autoproj workspace
    Foreign(ForeignPackage),
    /// Inside an autoproj workspace
    Rock(RockPackage),
}

impl Package {
    /// Display name.
    pub fn name(&self) -> String {
        match self.path() {
            Some(path) => basename(path),
            None => INVALID_PACKAGE_NAME.to_string(),
        }
    }

    /// Package directory, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Invalid => None,
            Self::Config(pkg) => Some(pkg.path()),
            Self::Foreign(pkg) => Some(pkg.path()),
            Self::Rock(pkg) => Some(pkg.path()),
        }
    }

    /// Package type.
    pub fn package_type(&self) -> PackageType {
        match self {
            Self::Invalid => PackageType::Invalid,
            Self::Config(_) => PackageType::Config,
            Self::Foreign(pkg) => pkg.kind,
            Self::Rock(pkg) => pkg.kind,
        }
    }

    /// The rock package, or the error explaining why this is not one.
    pub fn as_rock(&self) -> Result<&RockPackage> {
        match self {
            Self::Invalid => Err(Error::InvalidPackage),
            Self::Config(_) => Err(Error::ConfigPackage(self.name())),
            Self::Foreign(_) => Err(Error::ForeignPackage(self.name())),
            Self::Rock(pkg) => Ok(pkg),
        }
    }

    /// Debugging target the user picked.
    pub fn target(&self, ctx: &Context) -> Option<DebuggingTarget> {
        self.as_rock().ok()?.target(ctx)
    }

    /// Run the build task.
    pub async fn build(&self, ctx: &Context) -> Result<()> {
        self.as_rock()?.build(ctx).await
    }

    /// Launch configuration for the picked target.
    pub async fn debug_configuration(&self, ctx: &Context) -> Result<DebugConfiguration> {
        self.as_rock()?.debug_configuration(ctx).await
    }

    /// Start a debug session.
    pub async fn debug(&self, ctx: &Context) -> Result<()> {
        self.as_rock()?.debug(ctx).await
    }

    /// Ask the user for the program to debug.
    pub async fn pick_target(&self, ctx: &mut Context) -> Result<()> {
        self.as_rock()?.pick_target(ctx).await
    }

    /// Ask the user for the package type.
    pub async fn pick_type(&self, ctx: &mut Context) -> Result<()> {
        match self {
            Self::Foreign(ForeignPackage { path, .. }) | Self::Rock(RockPackage { path, .. }) => {
                pick_type_for(path, ctx).await
            }
            _ => self.as_rock().map(|_| ()),
        }
    }
}

/// Classifies paths into packages.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageFactory;

impl PackageFactory {
    /// Classify `path` against the current state of `ctx`.
    ///
    /// Never fails: a manifest that cannot be read only makes the type
    /// fall back to `Other`.
    pub async fn create_package(path: Option<&Path>, ctx: &Context) -> Package {
        let Some(path) = path else {
            return Package::Invalid;
        };
        if ctx.workspaces.is_config(path) {
            return Package::Config(ConfigPackage::new(path));
        }
        if ctx.host().workspace_folder(path).is_none() {
            return Package::Invalid;
        }

        let user_type = ctx.selection.package_type(path);
        let Some(ws) = ctx.workspaces.folder_workspace(path) else {
            return Package::Foreign(ForeignPackage::new(
                path,
                user_type.unwrap_or(PackageType::Other),
            ));
        };

        let resolution = PackageTypeResolver::new(ctx.manifests()).resolve(ws, path, user_type).await;
        if let TypeResolution::ManifestUnavailable(e) = &resolution {
            tracing::warn!(
                workspace = %ws.root().display(),
                error = %e,
                "Could not load installation manifest"
            );
        }
        Package::Rock(RockPackage::new(path, ws.clone(), resolution.package_type()))
    }
}
