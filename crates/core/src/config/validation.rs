//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `timeout_secs` is 0 or exceeds 10 minutes
    /// - `model` is empty
    /// - `cache_dir` or `analytics_log` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid { field: "timeout_secs".into(), reason: "must be at least 1s".into() });
        }
        if self.timeout_secs > 600 {
            return Err(ConfigError::Invalid {
                field: "timeout_secs".into(),
                reason: "must not exceed 10 minutes (600s)".into(),
            });
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "model".into(), reason: "must not be empty".into() });
        }

        if self.cache_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid { field: "cache_dir".into(), reason: "must not be empty".into() });
        }

        if self.analytics_log.as_os_str().is_empty() {
            return Err(ConfigError::Invalid { field: "analytics_log".into(), reason: "must not be empty".into() });
        }

        if self.cache_ttl_secs == 0 {
            tracing::warn!("cache_ttl_secs is 0; every cached entry expires immediately");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_timeout_zero() {
        let config = AppConfig { timeout_secs: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "timeout_secs"));
    }

    #[test]
    fn test_validate_timeout_exceeds_limit() {
        let config = AppConfig { timeout_secs: 601, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "timeout_secs"));
    }

    #[test]
    fn test_validate_empty_model() {
        let config = AppConfig { model: "  ".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "model"));
    }

    #[test]
    fn test_validate_empty_paths() {
        let config = AppConfig { cache_dir: PathBuf::new(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "cache_dir"));

        let config = AppConfig { analytics_log: PathBuf::new(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "analytics_log"));
    }

    #[test]
    fn test_validate_edge_case_values() {
        let config = AppConfig { timeout_secs: 1, cache_ttl_secs: 0, ..Default::default() };
        assert!(config.validate().is_ok());

        let config = AppConfig { timeout_secs: 600, ..Default::default() };
        assert!(config.validate().is_ok());
    }
}
