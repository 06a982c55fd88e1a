//! rock-ws - autoproj workspace helper.
//!
//! Lists the autoproj tasks of a set of folders, classifies packages and
//! builds the selected one.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rock_workspace::config::Config;
use rock_workspace::debug::{expand_autoproj_paths, DebuggingTarget};
use rock_workspace::state::{JsonFileStore, MemoryStore, StateStore};
use rock_workspace::{
    commands, AutoprojBridge, Context, InstallationManifestLoader, LocalHost, Package,
    PackageType, SelectionState,
};

/// Autoproj workspace helper
#[derive(Parser)]
#[command(name = "rock-ws")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Folder to work on (repeatable, defaults to the configured folders)
    #[arg(short, long, global = true)]
    folder: Vec<PathBuf>,

    /// Configuration file to use instead of the default locations
    #[arg(long, global = true, env = "ROCK_WS_CONFIG")]
    config: Option<PathBuf>,

    /// File persisting the selection and per-package choices
    #[arg(long, global = true, env = "ROCK_WS_STATE")]
    state: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the autoproj tasks of the folders
    Tasks {
        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Show how a path classifies as a package
    Package {
        /// Package directory
        path: PathBuf,
    },

    /// Substitute the ${rock:...} tokens of a template for a package
    Expand {
        /// Package directory
        path: PathBuf,

        /// Template string
        template: String,
    },

    /// Select the package to work on
    Select {
        /// Package directory
        path: PathBuf,
    },

    /// Show the selected package
    Selected,

    /// Build a package, the selected one by default
    Build {
        /// Package directory
        path: Option<PathBuf>,
    },

    /// Print the launch configuration of the selected package
    LaunchConfig,

    /// Set the type of a package (cxx, ruby, orogen, other)
    SetType {
        /// Package directory
        path: PathBuf,

        /// Type identifier
        kind: String,
    },

    /// Set the program to debug for a package
    SetTarget {
        /// Package directory
        path: PathBuf,

        /// Program or script
        program: PathBuf,
    },

    /// Print the completed debug configuration of a package
    Debug {
        /// Package directory, the selected package by default
        path: Option<PathBuf>,
    },

    /// Show configuration
    Config {
        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose { EnvFilter::new("debug") } else { EnvFilter::new("warn") };

    tracing_subscriber::registry().with(fmt::layer().with_target(false)).with(filter).init();

    let config = match &cli.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::load()?,
    };

    if let Commands::Config { path } = cli.command {
        return cmd_config(&config, path);
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let mut ctx = open_session(&cli, &config)?;
        match cli.command {
            Commands::Tasks { format } => cmd_tasks(&ctx, &format),
            Commands::Package { path } => cmd_package(&ctx, &path).await,
            Commands::Expand { path, template } => cmd_expand(&ctx, &path, &template).await,
            Commands::Select { path } => cmd_select(&mut ctx, &path),
            Commands::Selected => cmd_selected(&ctx).await,
            Commands::Build { path } => cmd_build(&ctx, path.as_deref()).await,
            Commands::LaunchConfig => Ok(commands::add_launch_config(&ctx).await?),
            Commands::SetType { path, kind } => cmd_set_type(&mut ctx, &path, &kind),
            Commands::SetTarget { path, program } => cmd_set_target(&mut ctx, &path, &program),
            Commands::Debug { path } => cmd_debug(&ctx, path.as_deref()).await,
            Commands::Config { .. } => Ok(()),
        }
    })
}

/// Absolute form of `path`, resolving symlinks when it exists.
fn absolute(path: &Path) -> Result<PathBuf> {
    match std::fs::canonicalize(path) {
        Ok(path) => Ok(path),
        Err(_) if path.is_absolute() => Ok(path.to_path_buf()),
        Err(_) => Ok(std::env::current_dir()?.join(path)),
    }
}

/// Build the session for the folders given on the command line.
fn open_session(cli: &Cli, config: &Config) -> Result<Context> {
    let folders = if !cli.folder.is_empty() {
        cli.folder.clone()
    } else if !config.workspace.folders.is_empty() {
        config.workspace.folders.clone()
    } else {
        vec![std::env::current_dir()?]
    };
    let folders = folders.iter().map(|f| absolute(f)).collect::<Result<Vec<_>>>()?;

    let store: Box<dyn StateStore> = match cli.state.clone().or_else(JsonFileStore::default_path) {
        Some(path) => Box::new(JsonFileStore::open(path)?),
        None => Box::new(MemoryStore::new()),
    };

    let host = LocalHost::new(folders.clone()).with_active_file(std::env::current_dir()?);
    let mut ctx = Context::new(
        Arc::new(host),
        Arc::new(AutoprojBridge),
        Arc::new(InstallationManifestLoader),
        SelectionState::new(config.selection.mode, store),
    )
    .with_debug_settings(config.debug.clone());

    for folder in &folders {
        ctx.add_folder(folder);
    }
    Ok(ctx)
}

/// List generated tasks.
fn cmd_tasks(ctx: &Context, format: &str) -> Result<()> {
    let tasks = ctx.tasks.provide_tasks();
    match format {
        "json" => {
            let json = serde_json::to_string_pretty(tasks)?;
            println!("{json}");
        }
        _ => {
            for task in tasks {
                println!("{}", task.name);
                println!("    {} {}", task.command_path.display(), task.args.join(" "));
            }
            println!("\nTotal: {} tasks", tasks.len());
        }
    }
    Ok(())
}

fn variant_name(pkg: &Package) -> &'static str {
    match pkg {
        Package::Invalid => "invalid",
        Package::Config(_) => "config",
        Package::Foreign(_) => "foreign",
        Package::Rock(_) => "rock",
    }
}

fn print_package(pkg: &Package) {
    println!("name: {}", pkg.name());
    println!("kind: {}", variant_name(pkg));
    println!("type: {}", pkg.package_type());
    if let Package::Rock(rock) = pkg {
        println!("workspace: {}", rock.workspace().root().display());
    }
}

/// Show the classification of a path.
async fn cmd_package(ctx: &Context, path: &Path) -> Result<()> {
    let pkg = ctx.get_package_by_path(&absolute(path)?).await;
    print_package(&pkg);
    Ok(())
}

/// Expand path tokens using the manifest of a package.
async fn cmd_expand(ctx: &Context, path: &Path, template: &str) -> Result<()> {
    let pkg = ctx.get_package_by_path(&absolute(path)?).await;
    let info = pkg.as_rock()?.info(ctx.manifests()).await?;
    println!("{}", expand_autoproj_paths(&info, template));
    Ok(())
}

/// Select a package.
fn cmd_select(ctx: &mut Context, path: &Path) -> Result<()> {
    let path = absolute(path)?;
    if ctx.workspaces.folder_workspace(&path).is_none() {
        anyhow::bail!("{} is not a folder of an autoproj workspace", path.display());
    }
    ctx.set_selected_package(&path)?;
    println!("Selected {}", path.display());
    Ok(())
}

/// Show the selected package.
async fn cmd_selected(ctx: &Context) -> Result<()> {
    match ctx.selected_package_path() {
        Some(_) => print_package(&ctx.get_selected_package().await),
        None => println!("No package selected"),
    }
    Ok(())
}

/// Build a package.
async fn cmd_build(ctx: &Context, path: Option<&Path>) -> Result<()> {
    let pkg = match path {
        Some(path) => ctx.get_package_by_path(&absolute(path)?).await,
        None => ctx.get_selected_package().await,
    };
    pkg.build(ctx).await?;
    Ok(())
}

/// Override the type of a package.
fn cmd_set_type(ctx: &mut Context, path: &Path, kind: &str) -> Result<()> {
    let kind = PackageType::from_id(kind)
        .filter(|kind| PackageType::PICKABLE.contains(kind))
        .ok_or_else(|| anyhow::anyhow!("unknown package type '{kind}'"))?;
    let path = absolute(path)?;
    ctx.selection.set_package_type(&path, kind)?;
    println!("{}: {kind}", path.display());
    Ok(())
}

/// Set the debugging target of a package.
fn cmd_set_target(ctx: &mut Context, path: &Path, program: &Path) -> Result<()> {
    let path = absolute(path)?;
    let program = absolute(program)?;
    let name = program
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow::anyhow!("{} is not a program", program.display()))?;
    ctx.selection.set_debugging_target(&path, DebuggingTarget::new(name, &program))?;
    println!("{}: {}", path.display(), program.display());
    Ok(())
}

/// Print the debug configuration of a package, completed with the
/// workspace environment.
async fn cmd_debug(ctx: &Context, path: Option<&Path>) -> Result<()> {
    let pkg = match path {
        Some(path) => ctx.get_package_by_path(&absolute(path)?).await,
        None => ctx.get_selected_package().await,
    };
    let config = pkg.debug_configuration(ctx).await?;
    let config = commands::resolve_debug_configuration(ctx, pkg.path(), config).await?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// Show configuration.
fn cmd_config(config: &Config, show_path: bool) -> Result<()> {
    if show_path {
        if let Some(path) = Config::config_dir() {
            println!("{}", path.display());
        }
        return Ok(());
    }

    let toml = toml::to_string_pretty(config)?;
    println!("{toml}");

    Ok(())
}
