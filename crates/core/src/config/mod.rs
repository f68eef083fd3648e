//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (GEMINI_SEARCH_*)
//! 2. Legacy variables (SEARCH_CACHE_DIR, SEARCH_CACHE_TTL, ANALYTICS_LOG)
//! 3. TOML config file (if GEMINI_SEARCH_CONFIG_FILE set)
//! 4. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// File name of the SQLite cache database inside `cache_dir`.
pub const CACHE_DB_FILE: &str = "search-cache.sqlite";

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (GEMINI_SEARCH_*)
/// 2. Legacy unprefixed variables
/// 3. TOML config file (if GEMINI_SEARCH_CONFIG_FILE set)
/// 4. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the search cache database.
    ///
    /// Set via GEMINI_SEARCH_CACHE_DIR or SEARCH_CACHE_DIR.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Seconds a cached result stays fresh.
    ///
    /// Set via GEMINI_SEARCH_CACHE_TTL_SECS or SEARCH_CACHE_TTL.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Path of the persisted analytics record.
    ///
    /// Set via GEMINI_SEARCH_ANALYTICS_LOG or ANALYTICS_LOG.
    #[serde(default = "default_analytics_log")]
    pub analytics_log: PathBuf,

    /// Model identifier passed to the backend when the caller names none.
    #[serde(default = "default_model")]
    pub model: String,

    /// Per-invocation backend timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Explicit backend command, bypassing discovery.
    ///
    /// Set via GEMINI_SEARCH_GEMINI_COMMAND.
    #[serde(default)]
    pub gemini_command: Option<GeminiCommand>,
}

/// Backend command override.
///
/// A plain string is split on whitespace. Use the array form when a path
/// contains spaces, e.g. `["C:\\Program Files\\nodejs\\node.exe", "index.js"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeminiCommand {
    Argv(Vec<String>),
    Line(String),
}

impl GeminiCommand {
    /// Program followed by its leading arguments.
    pub fn argv(&self) -> Vec<String> {
        match self {
            Self::Argv(args) => args.clone(),
            Self::Line(line) => line.split_whitespace().map(String::from).collect(),
        }
    }
}

impl From<&str> for GeminiCommand {
    fn from(line: &str) -> Self {
        Self::Line(line.to_string())
    }
}

impl From<Vec<String>> for GeminiCommand {
    fn from(args: Vec<String>) -> Self {
        Self::Argv(args)
    }
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".cache/gemini-searches")
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_analytics_log() -> PathBuf {
    PathBuf::from("search_analytics.json")
}

fn default_model() -> String {
    crate::orchestrator::DEFAULT_MODEL.into()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            cache_ttl_secs: default_cache_ttl_secs(),
            analytics_log: default_analytics_log(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            gemini_command: None,
        }
    }
}

impl AppConfig {
    /// Cache TTL as a Duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Backend timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Full path of the cache database file.
    pub fn cache_db_path(&self) -> PathBuf {
        self.cache_dir.join(CACHE_DB_FILE)
    }

    /// Build the layered figment without extracting it.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("GEMINI_SEARCH_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment
            .merge(Env::raw().filter_map(|key| match key.as_str().to_lowercase().as_str() {
                "search_cache_dir" => Some("cache_dir".into()),
                "search_cache_ttl" => Some("cache_ttl_secs".into()),
                "analytics_log" => Some("analytics_log".into()),
                _ => None,
            }))
            .merge(
                Env::prefixed("GEMINI_SEARCH_")
                    .ignore(&["CONFIG_FILE"])
                    .map(|key| key.as_str().to_lowercase().into()),
            )
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment()
            .extract()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.cache_dir, PathBuf::from(".cache/gemini-searches"));
        assert_eq!(config.cache_ttl_secs, 3600);
        assert_eq!(config.analytics_log, PathBuf::from("search_analytics.json"));
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.timeout_secs, 120);
        assert!(config.gemini_command.is_none());
    }

    #[test]
    fn test_durations() {
        let config = AppConfig::default();
        assert_eq!(config.cache_ttl(), Duration::from_secs(3600));
        assert_eq!(config.timeout(), Duration::from_secs(120));
        assert_eq!(config.cache_db_path(), PathBuf::from(".cache/gemini-searches/search-cache.sqlite"));
    }

    #[test]
    fn test_legacy_env_overrides() {
        Jail::expect_with(|jail| {
            jail.set_env("SEARCH_CACHE_DIR", "/tmp/searches");
            jail.set_env("SEARCH_CACHE_TTL", "60");
            jail.set_env("ANALYTICS_LOG", "/tmp/analytics.json");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.cache_dir, PathBuf::from("/tmp/searches"));
            assert_eq!(config.cache_ttl_secs, 60);
            assert_eq!(config.analytics_log, PathBuf::from("/tmp/analytics.json"));
            Ok(())
        });
    }

    #[test]
    fn test_prefixed_env_wins_over_legacy() {
        Jail::expect_with(|jail| {
            jail.set_env("SEARCH_CACHE_TTL", "60");
            jail.set_env("GEMINI_SEARCH_CACHE_TTL_SECS", "90");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.cache_ttl_secs, 90);
            Ok(())
        });
    }

    #[test]
    fn test_toml_file_layer() {
        Jail::expect_with(|jail| {
            jail.create_file("search.toml", "model = \"gemini-2.5-pro\"\ntimeout_secs = 30\n")?;
            jail.set_env("GEMINI_SEARCH_CONFIG_FILE", "search.toml");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.model, "gemini-2.5-pro");
            assert_eq!(config.timeout_secs, 30);
            Ok(())
        });
    }

    #[test]
    fn test_gemini_command_forms() {
        assert_eq!(GeminiCommand::from("node  /opt/gemini/index.js").argv(), ["node", "/opt/gemini/index.js"]);

        let argv = GeminiCommand::from(vec!["/opt/my tools/node".to_string(), "index.js".to_string()]);
        assert_eq!(argv.argv(), ["/opt/my tools/node", "index.js"]);
    }

    #[test]
    fn test_gemini_command_toml_array() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "search.toml",
                "gemini_command = [\"C:\\\\Program Files\\\\nodejs\\\\node.exe\", \"index.js\"]\n",
            )?;
            jail.set_env("GEMINI_SEARCH_CONFIG_FILE", "search.toml");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            let command = config.gemini_command.expect("command override");
            assert_eq!(command.argv(), [r"C:\Program Files\nodejs\node.exe", "index.js"]);
            Ok(())
        });
    }

    #[test]
    fn test_gemini_command_env_string() {
        Jail::expect_with(|jail| {
            jail.set_env("GEMINI_SEARCH_GEMINI_COMMAND", "node /opt/gemini/index.js");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.gemini_command, Some(GeminiCommand::from("node /opt/gemini/index.js")));
            Ok(())
        });
    }

    #[test]
    fn test_invalid_env_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("GEMINI_SEARCH_TIMEOUT_SECS", "0");
            assert!(matches!(AppConfig::load(), Err(ConfigError::Invalid { .. })));
            Ok(())
        });
    }
}
