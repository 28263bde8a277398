//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/stamped/config.toml)
//! 3. Environment variables (STAMPED_* prefix)
//!
//! Environment variables take precedence over config file values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::document::DocumentKind;

/// Environment variable prefix
const ENV_PREFIX: &str = "STAMPED";

/// Quiescence window before an automatic save, in seconds
pub const DEFAULT_AUTOSAVE_DELAY_SECS: u64 = 5;

/// Character that triggers timestamp insertion
pub const DEFAULT_TERMINATOR: char = '.';

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for data storage (documents, logs)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory that receives `stamped.csv` exports (current dir if unset)
    #[serde(default)]
    pub export_dir: Option<PathBuf>,

    /// Seconds of inactivity before an automatic save
    #[serde(default = "default_autosave_delay")]
    pub autosave_delay_secs: u64,

    /// Character that stamps the elapsed time after it
    #[serde(default = "default_terminator")]
    pub terminator: char,

    /// Layout of new and loaded documents
    #[serde(default)]
    pub document_kind: DocumentKind,

    /// Upper bound on total stored bytes (unlimited if unset)
    #[serde(default)]
    pub storage_quota_bytes: Option<u64>,

    /// Whether usage events are written to the log
    #[serde(default)]
    pub analytics_enabled: bool,

    /// Log file for TUI mode (defaults to {data_dir}/debug.log)
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            export_dir: None,
            autosave_delay_secs: DEFAULT_AUTOSAVE_DELAY_SECS,
            terminator: DEFAULT_TERMINATOR,
            document_kind: DocumentKind::default(),
            storage_quota_bytes: None,
            analytics_enabled: false,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (STAMPED_DATA_DIR, STAMPED_EXPORT_DIR, ...)
    /// 2. Config file (~/.config/stamped/config.toml or STAMPED_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a path given on the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
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
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        // Empty string clears it
        if let Ok(val) = std::env::var(format!("{}_EXPORT_DIR", ENV_PREFIX)) {
            self.export_dir = if val.is_empty() {
                None
            } else {
                Some(PathBuf::from(val))
            };
        }

        if let Ok(val) = std::env::var(format!("{}_AUTOSAVE_DELAY", ENV_PREFIX)) {
            match val.parse() {
                Ok(secs) => self.autosave_delay_secs = secs,
                Err(_) => tracing::warn!("Ignoring invalid {}_AUTOSAVE_DELAY: {}", ENV_PREFIX, val),
            }
        }

        if let Ok(val) = std::env::var(format!("{}_ANALYTICS", ENV_PREFIX)) {
            self.analytics_enabled = val.eq_ignore_ascii_case("true") || val == "1";
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

    /// Save configuration to the default config file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
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
    /// Can be overridden with STAMPED_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("stamped")
            .join("config.toml")
    }

    /// Directory holding one file per stored document
    pub fn documents_dir(&self) -> PathBuf {
        self.data_dir.join("documents")
    }

    /// Directory that receives exports
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Log file used by the TUI
    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join("debug.log"))
    }

    /// Quiescence window as a duration
    pub fn autosave_delay(&self) -> Duration {
        Duration::from_secs(self.autosave_delay_secs)
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stamped")
}

fn default_autosave_delay() -> u64 {
    DEFAULT_AUTOSAVE_DELAY_SECS
}

fn default_terminator() -> char {
    DEFAULT_TERMINATOR
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
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
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
        "STAMPED_DATA_DIR",
        "STAMPED_EXPORT_DIR",
        "STAMPED_AUTOSAVE_DELAY",
        "STAMPED_ANALYTICS",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.autosave_delay_secs, 5);
        assert_eq!(config.autosave_delay(), Duration::from_secs(5));
        assert_eq!(config.terminator, '.');
        assert_eq!(config.document_kind, DocumentKind::Grid);
        assert!(config.storage_quota_bytes.is_none());
        assert!(!config.analytics_enabled);
        assert!(config.data_dir.ends_with("stamped"));
    }

    #[test]
    fn test_file_paths() {
        let config = Config {
            data_dir: PathBuf::from("/data/stamped"),
            ..Config::default()
        };

        assert_eq!(config.documents_dir(), PathBuf::from("/data/stamped/documents"));
        assert_eq!(config.log_path(), PathBuf::from("/data/stamped/debug.log"));
        assert_eq!(config.export_dir(), PathBuf::from("."));
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("STAMPED_DATA_DIR", "/tmp/stamped-test");
        config.apply_env_overrides();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/stamped-test"));
    }

    #[test]
    fn test_env_override_autosave_delay() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("STAMPED_AUTOSAVE_DELAY", "12");
        config.apply_env_overrides();
        assert_eq!(config.autosave_delay_secs, 12);

        // Garbage is ignored
        env::set_var("STAMPED_AUTOSAVE_DELAY", "soon");
        config.apply_env_overrides();
        assert_eq!(config.autosave_delay_secs, 12);
    }

    #[test]
    fn test_env_override_export_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("STAMPED_EXPORT_DIR", "/tmp/exports");
        config.apply_env_overrides();
        assert_eq!(config.export_dir(), PathBuf::from("/tmp/exports"));

        env::set_var("STAMPED_EXPORT_DIR", "");
        config.apply_env_overrides();
        assert!(config.export_dir.is_none());
    }

    #[test]
    fn test_env_override_analytics() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("STAMPED_ANALYTICS", "true");
        config.apply_env_overrides();
        assert!(config.analytics_enabled);

        env::set_var("STAMPED_ANALYTICS", "0");
        config.apply_env_overrides();
        assert!(!config.analytics_enabled);
    }

    #[test]
    fn test_serialization() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config {
            data_dir: PathBuf::from("/data/stamped"),
            terminator: '!',
            document_kind: DocumentKind::Text,
            storage_quota_bytes: Some(5_000_000),
            ..Config::default()
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("data_dir"));
        assert!(toml_str.contains("terminator"));
        assert!(toml_str.contains("document_kind = \"text\""));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.data_dir, config.data_dir);
        assert_eq!(parsed.terminator, '!');
        assert_eq!(parsed.document_kind, DocumentKind::Text);
        assert_eq!(parsed.storage_quota_bytes, Some(5_000_000));
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            data_dir = "/custom/data"
            autosave_delay_secs = 2
            analytics_enabled = true
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(config.autosave_delay_secs, 2);
        assert!(config.analytics_enabled);
        // Unset keys fall back to defaults
        assert_eq!(config.terminator, '.');
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = tempfile::TempDir::new().unwrap();
        env::set_var("STAMPED_DATA_DIR", temp_dir.path().join("data"));

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.autosave_delay_secs, 5);
        assert!(config.data_dir.exists());
    }

    #[test]
    fn test_save_to_path_roundtrip() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = Config {
            data_dir: temp_dir.path().join("data"),
            autosave_delay_secs: 9,
            ..Config::default()
        };
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.autosave_delay_secs, 9);
        assert_eq!(loaded.data_dir, config.data_dir);
    }
}
