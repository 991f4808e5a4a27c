//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.lumen/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;

/// Visual theme selection, propagated to every component.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ThemeKind {
    #[default]
    Dark,
    Light,
}

impl ThemeKind {
    pub fn toggled(self) -> Self {
        match self {
            ThemeKind::Dark => ThemeKind::Light,
            ThemeKind::Light => ThemeKind::Dark,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ThemeKind::Dark => "dark",
            ThemeKind::Light => "light",
        }
    }
}

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LumenConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub uploads: UploadsConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub theme: Option<ThemeKind>,
    /// How often relative headers ("Today", "Yesterday") are re-derived.
    pub label_refresh_secs: Option<u64>,
    pub default_chat: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UploadsConfig {
    /// Delay before a finished/failed upload row disappears.
    pub removal_delay_secs: Option<u64>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_LABEL_REFRESH_SECS: u64 = 30;
pub const DEFAULT_UPLOAD_REMOVAL_DELAY_SECS: u64 = 4;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub theme: ThemeKind,
    pub label_refresh_secs: u64,
    pub upload_removal_delay_secs: u64,
    /// Route parameter: the chat to open on startup, if any.
    pub chat: Option<String>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.lumen/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".lumen").join("config.toml"))
}

/// Load config from `~/.lumen/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `LumenConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<LumenConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(LumenConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(LumenConfig::default());
    }

    let contents = fs::read_to_string(&path).map_err(ConfigError::Io)?;
    let config: LumenConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &PathBuf) {
    let default_content = r#"# Lumen Configuration
# All settings are optional — defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# theme = "dark"               # "dark" or "light" (LUMEN_THEME env var also works)
# label_refresh_secs = 30      # how often "Today"/"Yesterday" headers refresh
# default_chat = "general"     # chat id to open on startup

# [uploads]
# removal_delay_secs = 4       # delay before finished upload rows disappear
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env
/// vars → CLI flags. `cli_theme` and `cli_chat` are from CLI flags
/// (None = not specified).
pub fn resolve(
    config: &LumenConfig,
    cli_theme: Option<ThemeKind>,
    cli_chat: Option<String>,
) -> ResolvedConfig {
    // Theme: CLI → env → config → default
    let theme = cli_theme
        .or_else(|| match std::env::var("LUMEN_THEME").ok().as_deref() {
            Some("light") => Some(ThemeKind::Light),
            Some("dark") => Some(ThemeKind::Dark),
            _ => None,
        })
        .or(config.general.theme)
        .unwrap_or_default();

    // Startup chat: CLI → config
    let chat = cli_chat.or_else(|| config.general.default_chat.clone());

    ResolvedConfig {
        theme,
        label_refresh_secs: config
            .general
            .label_refresh_secs
            .unwrap_or(DEFAULT_LABEL_REFRESH_SECS),
        upload_removal_delay_secs: config
            .uploads
            .removal_delay_secs
            .unwrap_or(DEFAULT_UPLOAD_REMOVAL_DELAY_SECS),
        chat,
    }
}
