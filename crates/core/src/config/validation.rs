//! Configuration validation rules.
//!
//! This module provides validation logic for `ShellConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::ShellConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl ShellConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `cache_name` is empty
    /// - `scope` is not an http(s) URL ending in `/`
    /// - `document_entry` is empty or contains `/`
    /// - any API path segment or host suffix is empty
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_name.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "cache_name".into(), reason: "must not be empty".into() });
        }

        let scope = self.scope_url()?;
        if !matches!(scope.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                field: "scope".into(),
                reason: format!("unsupported scheme: {}", scope.scheme()),
            });
        }
        if !scope.path().ends_with('/') {
            return Err(ConfigError::Invalid { field: "scope".into(), reason: "must end with '/'".into() });
        }

        if self.document_entry.is_empty() || self.document_entry.contains('/') {
            return Err(ConfigError::Invalid {
                field: "document_entry".into(),
                reason: "must be a bare filename".into(),
            });
        }

        if self.api_path_segments.iter().any(|s| s.is_empty()) {
            return Err(ConfigError::Invalid {
                field: "api_path_segments".into(),
                reason: "segments must not be empty".into(),
            });
        }
        if self.remote_host_suffixes.iter().any(|s| s.is_empty()) {
            return Err(ConfigError::Invalid {
                field: "remote_host_suffixes".into(),
                reason: "suffixes must not be empty".into(),
            });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.precache.is_empty() {
            tracing::warn!(cache_name = %self.cache_name, "precache list is empty; install seeds nothing");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invalid(config: ShellConfig, expected: &str) {
        let result = config.validate();
        assert!(
            matches!(&result, Err(ConfigError::Invalid { field, .. }) if field == expected),
            "expected invalid {expected}, got {result:?}"
        );
    }

    #[test]
    fn test_validate_default_config() {
        assert!(ShellConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_cache_name() {
        assert_invalid(ShellConfig { cache_name: "  ".into(), ..Default::default() }, "cache_name");
    }

    #[test]
    fn test_validate_scope_unparsable() {
        assert_invalid(ShellConfig::for_scope("not a url"), "scope");
    }

    #[test]
    fn test_validate_scope_scheme() {
        assert_invalid(ShellConfig::for_scope("ftp://app.test/"), "scope");
    }

    #[test]
    fn test_validate_scope_trailing_slash() {
        assert_invalid(ShellConfig::for_scope("https://app.test/shop"), "scope");
    }

    #[test]
    fn test_validate_document_entry() {
        assert_invalid(ShellConfig { document_entry: "pages/index.html".into(), ..Default::default() }, "document_entry");
        assert_invalid(ShellConfig { document_entry: String::new(), ..Default::default() }, "document_entry");
    }

    #[test]
    fn test_validate_empty_api_segment() {
        assert_invalid(ShellConfig { api_path_segments: vec![String::new()], ..Default::default() }, "api_path_segments");
    }

    #[test]
    fn test_validate_empty_host_suffix() {
        let config = ShellConfig { remote_host_suffixes: vec![String::new()], ..Default::default() };
        assert_invalid(config, "remote_host_suffixes");
    }

    #[test]
    fn test_validate_timeout_bounds() {
        assert_invalid(ShellConfig { timeout_ms: 50, ..Default::default() }, "timeout_ms");
        assert_invalid(ShellConfig { timeout_ms: 301_000, ..Default::default() }, "timeout_ms");
        assert!(ShellConfig { timeout_ms: 100, ..Default::default() }.validate().is_ok());
        assert!(ShellConfig { timeout_ms: 300_000, ..Default::default() }.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_user_agent() {
        assert_invalid(ShellConfig { user_agent: String::new(), ..Default::default() }, "user_agent");
    }

    #[test]
    fn test_validate_empty_precache_is_allowed() {
        assert!(ShellConfig { precache: Vec::new(), ..Default::default() }.validate().is_ok());
    }
}
