//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable TOML file never stops startup; the caller logs a
//! warning and continues with defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Primary environment variable for the root folder
pub const ROOT_FOLDER_ENV: &str = "REELCHECK_ROOT_FOLDER";

/// Alternative environment variable for the root folder
pub const ROOT_ENV: &str = "REELCHECK_ROOT";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "reelcheck.db";

/// Bootstrap configuration loaded from TOML
///
/// These settings cannot change while a service is running.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the database (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// External classifier service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// URL the classification request is POSTed to
    #[serde(default = "default_classifier_endpoint")]
    pub endpoint: String,

    /// Bearer token sent with each request (optional)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Upper bound for one classification call
    #[serde(default = "default_classifier_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: default_classifier_endpoint(),
            api_key: None,
            timeout_ms: default_classifier_timeout_ms(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5790
}

fn default_classifier_endpoint() -> String {
    "http://127.0.0.1:54321/functions/v1/analyze-bechdel".to_string()
}

fn default_classifier_timeout_ms() -> u64 {
    60_000
}

/// Compiled defaults for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            log_level: default_log_level(),
            log_file: None,
        }
    }
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/reelcheck (or /var/lib/reelcheck for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("reelcheck"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/reelcheck"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/reelcheck
        dirs::data_dir()
            .map(|d| d.join("reelcheck"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/reelcheck"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\reelcheck
        dirs::data_local_dir()
            .map(|d| d.join("reelcheck"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\reelcheck"))
    } else {
        PathBuf::from("./reelcheck_data")
    }
}

/// Default TOML location for a module: `<config_dir>/reelcheck/<module>.toml`
pub fn default_config_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("reelcheck").join(format!("{}.toml", module_name)))
}

/// Load and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load a TOML config file, falling back to defaults
///
/// A missing file is expected on first run and only logged at debug level;
/// an unreadable or invalid file is logged as a warning.
pub fn load_toml_config_or_default(path: Option<&Path>) -> TomlConfig {
    let Some(path) = path else {
        debug!("No config file location available, using defaults");
        return TomlConfig::default();
    };

    if !path.exists() {
        debug!("Config file not found: {}, using defaults", path.display());
        return TomlConfig::default();
    }

    match load_toml_config(path) {
        Ok(config) => config,
        Err(e) => {
            warn!("{} (using defaults)", e);
            TomlConfig::default()
        }
    }
}

/// Write a TOML config file atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, content)?;
    std::fs::rename(&temp_path, path)?;

    Ok(())
}

/// Resolves the root folder following CLI → ENV → TOML → default priority
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
            toml_root: None,
        }
    }

    /// Root folder passed on the command line
    pub fn with_cli_arg(mut self, cli_arg: Option<PathBuf>) -> Self {
        self.cli_arg = cli_arg;
        self
    }

    /// Root folder from an already-loaded TOML config
    pub fn with_toml(mut self, config: &TomlConfig) -> Self {
        self.toml_root = config.root_folder.clone();
        self
    }

    pub fn resolve(&self) -> PathBuf {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_arg {
            debug!(module = %self.module_name, "Root folder from command line");
            return path.clone();
        }

        // Priority 2: Environment variables
        for var in [ROOT_FOLDER_ENV, ROOT_ENV] {
            if let Ok(path) = std::env::var(var) {
                if !path.trim().is_empty() {
                    debug!(module = %self.module_name, "Root folder from {}", var);
                    return PathBuf::from(path);
                }
            }
        }

        // Priority 3: TOML config file
        if let Some(path) = &self.toml_root {
            debug!(module = %self.module_name, "Root folder from TOML config");
            return path.clone();
        }

        // Priority 4: OS-dependent compiled default
        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Prepares the resolved root folder for use
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    /// Create the root folder if it is missing
    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder).map_err(|e| {
                Error::Config(format!(
                    "Failed to create root folder {}: {}",
                    self.root_folder.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }
}
