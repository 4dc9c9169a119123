//! Configuration management for termroute.
//!
//! Handles loading and saving configuration from TOML files.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Name of the project-local config file.
pub const LOCAL_CONFIG_FILE: &str = ".termroute.toml";

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Discovery settings
    pub discovery: DiscoveryConfig,

    /// Routing settings
    pub router: RouterConfig,

    /// Command safety settings
    pub safety: SafetyConfig,

    /// Local execution settings
    pub local: LocalConfig,

    /// Persisted target aliases
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<AliasConfig>,
}

/// Discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// How long a discovery snapshot stays fresh, in seconds
    pub refresh_interval_secs: u64,

    /// Upper bound for any single adapter call, in seconds
    pub adapter_timeout_secs: u64,

    /// Enabled backends, in registration order
    pub backends: Vec<String>,
}

impl DiscoveryConfig {
    /// Refresh interval as a duration.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// Adapter timeout as a duration.
    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_secs(self.adapter_timeout_secs.max(1))
    }
}

/// Routing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Dispatch entries kept per target
    pub history_limit: usize,

    /// Ask before sending a command flagged as dangerous
    pub confirm_dangerous: bool,

    /// Press Enter after raw text
    pub press_enter_after_text: bool,

    /// Target selected at startup
    pub default_target: String,
}

/// Command safety settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Extra substrings that mark a command as dangerous
    pub blocked_patterns: Vec<String>,
}

/// Local execution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    /// Shell used for local commands (defaults to `$SHELL`, then `sh`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,

    /// Local command timeout, in seconds
    pub timeout_secs: u64,
}

impl LocalConfig {
    /// Timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// A persisted alias for a target id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasConfig {
    /// Alias name
    pub name: String,

    /// Target id (`Terminal:2`, `iTerm2:<uuid>`, ...)
    pub target: String,
}

impl AliasConfig {
    /// Create a new alias entry.
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self { name: name.into(), target: target.into() }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Looks for config in:
    /// 1. `.termroute.toml` in current directory
    /// 2. `~/.config/termroute/config.toml`
    /// 3. Falls back to defaults
    pub fn load() -> anyhow::Result<Self> {
        match Self::existing_path() {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Save configuration to the global config file.
    pub fn save(&self) -> anyhow::Result<()> {
        let config_dir = Self::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        self.save_to_file(&config_dir.join("config.toml"))
    }

    /// Save configuration to a specific file.
    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Path of the config file `load` would read, if any exists.
    pub fn existing_path() -> Option<PathBuf> {
        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Some(local_config);
        }
        Self::config_dir().map(|d| d.join("config.toml")).filter(|p| p.exists())
    }

    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("termroute"))
    }

    /// Persist an alias, replacing any entry with the same name or target.
    ///
    /// Names compare trimmed and case-insensitively; the given casing is kept.
    pub fn set_alias(&mut self, name: &str, target: &str) {
        let name = name.trim();
        let key = name.to_lowercase();
        self.aliases.retain(|a| a.name.trim().to_lowercase() != key && a.target != target);
        self.aliases.push(AliasConfig::new(name, target));
    }

    /// Forget an alias. Returns `true` if one was removed.
    pub fn remove_alias(&mut self, name: &str) -> bool {
        let key = name.trim().to_lowercase();
        let before = self.aliases.len();
        self.aliases.retain(|a| a.name.trim().to_lowercase() != key);
        self.aliases.len() != before
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 5,
            adapter_timeout_secs: 10,
            backends: vec![
                "terminal".to_string(),
                "iterm2".to_string(),
                "vscode".to_string(),
                "warp".to_string(),
            ],
        }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            history_limit: super::history::DEFAULT_HISTORY_LIMIT,
            confirm_dangerous: true,
            press_enter_after_text: true,
            default_target: "local".to_string(),
        }
    }
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self { shell: None, timeout_secs: 30 }
    }
}
