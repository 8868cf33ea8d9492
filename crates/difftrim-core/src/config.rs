//! Configuration management for difftrim
//!
//! Supports feature-specific configuration sections:
//! - [budget] - Token budget and tokenizer settings
//! - [summarizer] - External summarizer plugin settings
//! - [log] - Logging settings

use crate::error::{ConfigError, ConfigResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: &str = "1";

/// Supported configuration versions
pub const SUPPORTED_CONFIG_VERSIONS: &[&str] = &["1"];

/// Name of the per-repository config file
pub const REPO_CONFIG_FILE: &str = ".difftrim.toml";

/// Root configuration structure supporting multiple features
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Configuration version for tracking schema changes
    #[serde(default = "default_config_version")]
    pub version: String,

    /// Token budget configuration
    #[serde(default)]
    pub budget: Option<BudgetConfig>,

    /// Summarizer plugin configuration
    #[serde(default)]
    pub summarizer: Option<SummarizerConfig>,

    /// Logging configuration
    #[serde(default)]
    pub log: Option<LogConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_config_version(),
            budget: None,
            summarizer: None,
            log: None,
        }
    }
}

/// Configuration for the token budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Maximum number of tokens the fitted diff may use
    #[serde(default = "default_token_limit")]
    pub token_limit: usize,

    /// Tokenizer encoding: cl100k_base, o200k_base, p50k_base or heuristic
    #[serde(default = "default_encoding")]
    pub encoding: String,

    /// Characters per token used by the heuristic tokenizer
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: f64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            token_limit: default_token_limit(),
            encoding: default_encoding(),
            chars_per_token: default_chars_per_token(),
        }
    }
}

/// Configuration for the external summarizer command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_summarizer_command")]
    pub command: String,

    /// Arguments passed to `command`
    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default = "default_plugins_dir")]
    pub plugins_dir: String,

    #[serde(default = "default_summarizer_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_pass_env")]
    pub pass_env: Vec<String>,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            command: default_summarizer_command(),
            args: Vec::new(),
            plugins_dir: default_plugins_dir(),
            timeout_secs: default_summarizer_timeout(),
            pass_env: default_pass_env(),
        }
    }
}

impl SummarizerConfig {
    /// Resolve the command path: absolute commands are used as-is, relative
    /// ones are looked up in `plugins_dir`.
    pub fn command_path(&self) -> PathBuf {
        let command = expand_path(&self.command);
        if Path::new(&command).is_absolute() {
            PathBuf::from(command)
        } else {
            PathBuf::from(expand_path(&self.plugins_dir)).join(command)
        }
    }
}

/// Configuration for logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for log files; logs go to stderr when unset
    #[serde(default)]
    pub dir: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
        }
    }
}

// Default value functions for root Config
fn default_config_version() -> String {
    CURRENT_CONFIG_VERSION.to_string()
}

// Default value functions for Budget
fn default_token_limit() -> usize {
    4000
}

fn default_encoding() -> String {
    "cl100k_base".to_string()
}

fn default_chars_per_token() -> f64 {
    3.5
}

// Default value functions for Summarizer
fn default_summarizer_command() -> String {
    "summarize.sh".to_string()
}

fn default_plugins_dir() -> String {
    if let Some(config_dir) = Config::get_config_dir() {
        config_dir.join("plugins").to_string_lossy().to_string()
    } else {
        "~/.config/difftrim/plugins".to_string()
    }
}

fn default_summarizer_timeout() -> u64 {
    30
}

fn default_pass_env() -> Vec<String> {
    vec![
        "DIFFTRIM_*".to_string(),
        "OPENAI_*".to_string(),
        "PATH".to_string(),
        "HOME".to_string(),
    ]
}

// Default value functions for Log
fn default_log_level() -> String {
    "warn".to_string()
}

/// Expand environment variables and tilde in path
pub fn expand_path(path: &str) -> String {
    let mut expanded = path.to_string();

    if expanded.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            expanded = expanded.replacen("~", &home.to_string_lossy(), 1);
        }
    } else if expanded == "~" {
        if let Some(home) = dirs::home_dir() {
            expanded = home.to_string_lossy().to_string();
        }
    }

    // Expand environment variables like $HOME, $VAR, etc.
    let Ok(re) = Regex::new(r"\$([A-Z_][A-Z0-9_]*)") else {
        return expanded;
    };
    re.replace_all(&expanded, |caps: &regex::Captures| {
        let var_name = &caps[1];
        env::var(var_name).unwrap_or_else(|_| format!("${}", var_name))
    })
    .to_string()
}

impl Config {
    /// Check if the configuration version is supported
    pub fn is_version_supported(&self) -> bool {
        SUPPORTED_CONFIG_VERSIONS.contains(&self.version.as_str())
    }

    /// Get a warning message for unsupported versions
    pub fn version_warning(&self) -> Option<String> {
        if !self.is_version_supported() {
            Some(format!(
                "Configuration version '{}' is not supported. Supported versions: {}. Using defaults where needed.",
                self.version,
                SUPPORTED_CONFIG_VERSIONS.join(", ")
            ))
        } else {
            None
        }
    }

    /// Load configuration from file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let mut config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        // Set to current version if empty or missing
        if config.version.is_empty() {
            config.version = CURRENT_CONFIG_VERSION.to_string();
        }

        Ok(config)
    }

    /// Get the default config directory path
    pub fn get_config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".config").join("difftrim"))
    }

    /// Load configuration with priority:
    /// 1. Defaults
    /// 2. Global config (~/.config/difftrim/config.toml)
    /// 3. Repo config (.difftrim.toml)
    /// 4. Explicit config file, if given
    ///
    /// Unreadable global or repo files are skipped; an explicit file that
    /// fails to load is an error. Skipped files and unsupported versions
    /// come back as warnings, since logging is not set up yet when the
    /// config is read.
    pub fn load(explicit: Option<&Path>) -> ConfigResult<(Self, Vec<String>)> {
        let global_config = Self::get_config_dir().map(|dir| dir.join("config.toml"));
        Self::load_layers(
            global_config.as_deref(),
            Path::new(REPO_CONFIG_FILE),
            explicit,
        )
    }

    fn load_layers(
        global: Option<&Path>,
        repo: &Path,
        explicit: Option<&Path>,
    ) -> ConfigResult<(Self, Vec<String>)> {
        let mut config = Self::default();
        let mut warnings = Vec::new();

        let optional = [("global", global), ("repo", Some(repo))];
        for (label, path) in optional {
            let Some(path) = path.filter(|p| p.exists()) else {
                continue;
            };
            match Self::load_from_file(path) {
                Ok(loaded) => {
                    if let Some(warning) = loaded.version_warning() {
                        warnings.push(format!("{}: {}", path.display(), warning));
                    }
                    config = config.merge(loaded);
                }
                Err(e) => warnings.push(format!("ignoring {} config: {}", label, e)),
            }
        }

        if let Some(path) = explicit {
            let loaded = Self::load_from_file(path)?;
            if let Some(warning) = loaded.version_warning() {
                warnings.push(format!("{}: {}", path.display(), warning));
            }
            config = config.merge(loaded);
        }

        Ok((config, warnings))
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(mut self, other: Config) -> Self {
        if !other.version.is_empty() {
            self.version = other.version;
        }

        if other.budget.is_some() {
            self.budget = other.budget;
        }
        if other.summarizer.is_some() {
            self.summarizer = other.summarizer;
        }
        if other.log.is_some() {
            self.log = other.log;
        }
        self
    }

    pub fn budget(&self) -> BudgetConfig {
        self.budget.clone().unwrap_or_default()
    }

    pub fn summarizer(&self) -> SummarizerConfig {
        self.summarizer.clone().unwrap_or_default()
    }

    pub fn log(&self) -> LogConfig {
        self.log.clone().unwrap_or_default()
    }
}
