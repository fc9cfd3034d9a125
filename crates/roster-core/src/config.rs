//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/roster/config.toml)
//! 3. Environment variables (ROSTER_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable prefix
const ENV_PREFIX: &str = "ROSTER";

/// Default remote directory API
pub const DEFAULT_API_BASE: &str = "https://jsonplaceholder.typicode.com";

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for data storage (user snapshot, avatar map)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Base URL of the remote user directory
    #[serde(default = "default_api_base")]
    pub api_base_url: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            api_base_url: default_api_base(),
            request_timeout_secs: default_timeout(),
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (ROSTER_DATA_DIR, ROSTER_API_BASE_URL, ROSTER_TIMEOUT_SECS)
    /// 2. Config file (~/.config/roster/config.toml or ROSTER_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a CLI-supplied path over the default
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_path(p),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // ROSTER_DATA_DIR
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        // ROSTER_API_BASE_URL
        if let Ok(val) = std::env::var(format!("{}_API_BASE_URL", ENV_PREFIX)) {
            if !val.is_empty() {
                self.api_base_url = val;
            }
        }

        // ROSTER_TIMEOUT_SECS
        if let Ok(val) = std::env::var(format!("{}_TIMEOUT_SECS", ENV_PREFIX)) {
            if let Ok(secs) = val.parse() {
                self.request_timeout_secs = secs;
            }
        }
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to the default file location
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config_path: &PathBuf) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with ROSTER_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("roster")
            .join("config.toml")
    }

    /// Get the path to the persisted user snapshot
    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join("users.json")
    }

    /// Get the path to the persisted avatar map
    pub fn avatars_path(&self) -> PathBuf {
        self.data_dir.join("avatars.json")
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("roster")
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap();
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            // Clear all the vars
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "ROSTER_DATA_DIR",
        "ROSTER_API_BASE_URL",
        "ROSTER_TIMEOUT_SECS",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE);
        assert_eq!(config.request_timeout_secs, 10);
        assert!(config.data_dir.ends_with("roster"));
    }

    #[test]
    fn test_file_paths() {
        let config = Config::default();
        assert!(config.users_path().ends_with("users.json"));
        assert!(config.avatars_path().ends_with("avatars.json"));
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("ROSTER_DATA_DIR", "/tmp/roster-test");
        config.apply_env_overrides();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/roster-test"));
    }

    #[test]
    fn test_env_override_api_base() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("ROSTER_API_BASE_URL", "http://localhost:4000");
        config.apply_env_overrides();
        assert_eq!(config.api_base_url, "http://localhost:4000");

        // Empty string keeps the current value
        env::set_var("ROSTER_API_BASE_URL", "");
        config.apply_env_overrides();
        assert_eq!(config.api_base_url, "http://localhost:4000");
    }

    #[test]
    fn test_env_override_timeout() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("ROSTER_TIMEOUT_SECS", "30");
        config.apply_env_overrides();
        assert_eq!(config.request_timeout_secs, 30);

        // Unparsable value keeps the current one
        env::set_var("ROSTER_TIMEOUT_SECS", "soon");
        config.apply_env_overrides();
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_serialization() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config {
            data_dir: PathBuf::from("/data/roster"),
            api_base_url: "https://api.example.com".to_string(),
            request_timeout_secs: 5,
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("data_dir"));
        assert!(toml_str.contains("api_base_url"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.data_dir, config.data_dir);
        assert_eq!(parsed.api_base_url, config.api_base_url);
        assert_eq!(parsed.request_timeout_secs, config.request_timeout_secs);
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            data_dir = "/custom/data"
            api_base_url = "http://localhost:9000"
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(config.api_base_url, "http://localhost:9000");
        // Missing keys fall back to defaults
        assert_eq!(config.request_timeout_secs, 10);
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = tempfile::TempDir::new().unwrap();
        env::set_var("ROSTER_DATA_DIR", temp_dir.path().join("data"));

        let path = temp_dir.path().join("missing.toml");
        let config = Config::load_from_path(&path).unwrap();
        // Should return defaults when file doesn't exist
        assert_eq!(config.api_base_url, DEFAULT_API_BASE);
    }
}
