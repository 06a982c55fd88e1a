//! Configuration management.
//!
//! Handles loading and saving configuration from TOML files.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Package selection settings
    pub selection: SelectionConfig,

    /// Debugging settings
    pub debug: DebugSettings,

    /// Folders and workspaces
    pub workspace: WorkspaceConfig,
}

/// How the current package is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// The user picks the package explicitly
    #[default]
    Manual,
    /// The package owning the active file is selected
    Auto,
}

/// Package selection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Selection mode
    pub mode: SelectionMode,
}

/// Debugging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugSettings {
    /// Directory holding one debugger stub per MI mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stubs_dir: Option<PathBuf>,

    /// Debugger used when a configuration does not name one
    pub mi_mode: String,
}

/// Folder settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Folders treated as open editor folders
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub folders: Vec<PathBuf>,
}

impl Default for DebugSettings {
    fn default() -> Self {
        Self { stubs_dir: None, mi_mode: "gdb".to_string() }
    }
}

impl DebugSettings {
    /// Stub directory, falling back to the data directory.
    pub fn stubs_dir(&self) -> PathBuf {
        self.stubs_dir
            .clone()
            .or_else(|| Config::data_dir().map(|d| d.join("stubs")))
            .unwrap_or_else(|| PathBuf::from("stubs"))
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Looks for config in:
    /// 1. `.rock.toml` in current directory
    /// 2. `~/.config/rock-workspace/config.toml`
    /// 3. Falls back to defaults
    pub fn load() -> anyhow::Result<Self> {
        let local_config = PathBuf::from(".rock.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Some(config_dir) = Self::config_dir() {
            let global_config = config_dir.join("config.toml");
            if global_config.exists() {
                return Self::load_from_file(&global_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("could not read {}", path.display()))?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the global config file.
    pub fn save(&self) -> anyhow::Result<()> {
        let dir = Self::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        std::fs::create_dir_all(&dir)?;

        let content = toml::to_string_pretty(self)?;
        std::fs::write(dir.join("config.toml"), content)?;

        Ok(())
    }

    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(crate::APP_NAME))
    }

    /// Get the data directory path (for persisted state, stubs).
    pub fn data_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join(crate::APP_NAME))
    }
}
