//! Host Configuration
//!
//! Handles parsing of modlink.toml configuration files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config file not found: {0}")]
    NotFound(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Root configuration structure matching modlink.toml.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModlinkConfig {
    /// Host state settings
    #[serde(default)]
    pub host: HostConfig,

    /// Plugin resolution settings
    #[serde(default)]
    pub plugins: PluginsConfig,
}

impl ModlinkConfig {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: ModlinkConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from the current directory or parents.
    pub fn load_from_cwd() -> ConfigResult<Self> {
        let cwd = std::env::current_dir().map_err(ConfigError::Io)?;
        Self::find_and_load(&cwd)
    }

    /// Find and load configuration by searching up from the given
    /// directory. A missing file yields the defaults, not an error.
    pub fn find_and_load(start_dir: &Path) -> ConfigResult<Self> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let config_path = dir.join("modlink.toml");
            if config_path.exists() {
                return Self::load(&config_path);
            }
            if !dir.pop() {
                return Ok(Self::default());
            }
        }
    }
}

/// Host state settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Initial shared value injected into plugin calls
    #[serde(default = "default_shared")]
    pub shared: i64,
}

fn default_shared() -> i64 {
    100
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            shared: default_shared(),
        }
    }
}

/// Plugin resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PluginsConfig {
    /// Extra directories searched for plugin artifacts, in order
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,

    /// Plugin used when the CLI is given none
    #[serde(default)]
    pub default_plugin: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ModlinkConfig::default();
        assert_eq!(config.host.shared, 100);
        assert!(config.plugins.search_paths.is_empty());
        assert!(config.plugins.default_plugin.is_none());
    }

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
[host]
shared = 7

[plugins]
search_paths = ["plugins", "/opt/modlink/plugins"]
default_plugin = "notify"
"#;
        let config: ModlinkConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.host.shared, 7);
        assert_eq!(config.plugins.search_paths.len(), 2);
        assert_eq!(config.plugins.default_plugin.as_deref(), Some("notify"));
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: ModlinkConfig = toml::from_str("[plugins]\ndefault_plugin = \"notify\"\n").unwrap();
        assert_eq!(config.host.shared, 100);
        assert_eq!(config.plugins.default_plugin.as_deref(), Some("notify"));
    }

    #[test]
    fn test_find_and_load_walks_up() {
        let base = std::env::temp_dir().join(format!("modlink_cfg_{}", std::process::id()));
        let nested = base.join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(base.join("modlink.toml"), "[host]\nshared = 5\n").unwrap();

        let config = ModlinkConfig::find_and_load(&nested).unwrap();
        assert_eq!(config.host.shared, 5);

        std::fs::remove_dir_all(&base).ok();
    }

    #[test]
    fn test_find_and_load_defaults_when_absent() {
        let config = ModlinkConfig::find_and_load(Path::new("/nonexistent/dir")).unwrap();
        assert_eq!(config.host.shared, 100);
    }
}
