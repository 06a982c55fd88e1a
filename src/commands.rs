//! User commands acting on the session.

use std::path::Path;

use crate::context::Context;
use crate::debug::{
    ConfigurationProvider, CxxConfigurationProvider, DebugConfiguration,
    RubyConfigurationProvider,
};
use crate::host::Choice;
use crate::{Error, Result};

/// Ask the user which tracked folder to work on and select it.
///
/// Cancelling the picker leaves the selection unchanged.
pub async fn select_package(ctx: &mut Context) -> Result<()> {
    if ctx.workspaces.folder_count() == 0 {
        return Err(Error::EmptyWorkspace);
    }

    let mut folders = Vec::new();
    let mut choices = Vec::new();
    ctx.workspaces.for_each_folder(|ws, folder| {
        let relative = folder.strip_prefix(ws.root()).unwrap_or(folder);
        choices.push(Choice::new(relative.display().to_string(), ws.name()));
        folders.push(folder.to_path_buf());
    });

    let host = ctx.host();
    let Some(index) = host.show_quick_pick("Select the package to work on", &choices).await else {
        return Ok(());
    };
    match folders.get(index) {
        Some(folder) => ctx.set_selected_package(folder),
        None => Ok(()),
    }
}

/// Write the debug configuration of the selected package as a launch
/// configuration.
pub async fn add_launch_config(ctx: &Context) -> Result<()> {
    let pkg = ctx.get_selected_package().await;
    let config = pkg.debug_configuration(ctx).await?;
    let path = pkg.path().unwrap_or(Path::new(""));
    let host = ctx.host();
    let folder = host
        .workspace_folder(path)
        .ok_or_else(|| Error::NoWorkspaceFolder(path.to_path_buf()))?;
    host.add_launch_config(&folder, &config).await.map_err(Error::Host)
}

/// Complete a launch configuration with the workspace data of `folder`.
///
/// Native configurations go through the gdb stubs, Ruby ones through the
/// autoproj bundler wrapper.
pub async fn resolve_debug_configuration(
    ctx: &Context,
    folder: Option<&Path>,
    config: DebugConfiguration,
) -> Result<DebugConfiguration> {
    match config {
        DebugConfiguration::Native(config) => {
            let provider = CxxConfigurationProvider::new(ctx.debug.stubs_dir());
            let config = provider.resolve_debug_configuration(ctx, folder, config).await?;
            Ok(DebugConfiguration::Native(config))
        }
        DebugConfiguration::Interpreted(config) => {
            let config =
                RubyConfigurationProvider.resolve_debug_configuration(ctx, folder, config).await?;
            Ok(DebugConfiguration::Interpreted(config))
        }
    }
}

/// Regenerate the tasks after the workspace changed on disk.
pub fn update_package_info(ctx: &mut Context) {
    ctx.reload_tasks();
}
