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

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `origin` is not an absolute http(s) URL
    /// - `version` is empty or contains whitespace
    /// - `cache_prefix`, `cdn_host`, or `cdn_path` is empty
    /// - `icon_pattern` does not compile
    /// - an `app_shell` entry or `shell_root` is empty
    /// - `max_bytes` is 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        let origin = self.origin_url()?;
        if !matches!(origin.scheme(), "http" | "https") {
            return Err(invalid("origin", "scheme must be http or https"));
        }

        if self.version.is_empty() {
            return Err(invalid("version", "must not be empty"));
        }
        if self.version.chars().any(char::is_whitespace) {
            return Err(invalid("version", "must not contain whitespace"));
        }
        if self.cache_prefix.is_empty() {
            return Err(invalid("cache_prefix", "must not be empty"));
        }

        if self.cdn_host.is_empty() {
            return Err(invalid("cdn_host", "must not be empty"));
        }
        if self.cdn_path.is_empty() {
            return Err(invalid("cdn_path", "must not be empty"));
        }

        if let Err(e) = regex::Regex::new(&self.icon_pattern) {
            return Err(ConfigError::Invalid { field: "icon_pattern".into(), reason: e.to_string() });
        }

        if self.app_shell.iter().any(|entry| entry.trim().is_empty()) {
            return Err(invalid("app_shell", "entries must not be empty"));
        }
        if self.shell_root.trim().is_empty() {
            return Err(invalid("shell_root", "must not be empty"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }

        if self.app_shell.is_empty() {
            tracing::warn!("app_shell is empty; install will pre-populate nothing");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(result: Result<(), ConfigError>) -> Option<String> {
        match result {
            Err(ConfigError::Invalid { field, .. }) => Some(field),
            _ => None,
        }
    }

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_origin_unparsable() {
        let config = AppConfig { origin: "not a url".into(), ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("origin"));
    }

    #[test]
    fn test_validate_origin_scheme() {
        let config = AppConfig { origin: "ftp://example.com/".into(), ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("origin"));
    }

    #[test]
    fn test_validate_version_whitespace() {
        let config = AppConfig { version: "v 2".into(), ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("version"));
    }

    #[test]
    fn test_validate_empty_cdn_host() {
        let config = AppConfig { cdn_host: String::new(), ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("cdn_host"));
    }

    #[test]
    fn test_validate_bad_icon_pattern() {
        let config = AppConfig { icon_pattern: "icon-(192".into(), ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("icon_pattern"));
    }

    #[test]
    fn test_validate_blank_shell_entry() {
        let mut config = AppConfig::default();
        config.app_shell.push("  ".into());
        assert_eq!(field_of(config.validate()).as_deref(), Some("app_shell"));
    }

    #[test]
    fn test_validate_max_bytes_zero() {
        let config = AppConfig { max_bytes: 0, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("max_bytes"));
    }

    #[test]
    fn test_validate_empty_shell_allowed() {
        let config = AppConfig { app_shell: Vec::new(), ..Default::default() };
        assert!(config.validate().is_ok());
    }
}
