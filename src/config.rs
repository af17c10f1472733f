//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Default client-side deadline for webhook calls.
pub const DEFAULT_WEBHOOK_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Runtime configuration for a wizard session.
#[derive(Debug, Clone)]
pub struct KitConfig {
    /// Base URL serving `_data/branding.json` and `modules/...`.
    /// Takes precedence over `site_dir` when set.
    pub base_url: Option<String>,
    /// Local directory with the same layout as the served site.
    pub site_dir: PathBuf,
    /// Webhook URL used by submit and chat steps that don't set `webhookUrl`.
    pub default_webhook_url: Option<String>,
    /// Deadline for one webhook exchange.
    pub webhook_timeout: Duration,
    /// Port for the HTTP front end.
    pub port: u16,
    /// Directory for rolling log files. Logs go to stderr when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for KitConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            site_dir: PathBuf::from("./_site"),
            default_webhook_url: None,
            webhook_timeout: DEFAULT_WEBHOOK_TIMEOUT,
            port: 8080,
            log_dir: None,
        }
    }
}

impl KitConfig {
    /// Build configuration from `EASY_KIT_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let webhook_timeout = non_empty("EASY_KIT_WEBHOOK_TIMEOUT_MS")
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.webhook_timeout);

        let port: u16 = non_empty("EASY_KIT_PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);

        Self {
            base_url: non_empty("EASY_KIT_BASE_URL"),
            site_dir: non_empty("EASY_KIT_SITE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.site_dir),
            default_webhook_url: non_empty("EASY_KIT_WEBHOOK_URL"),
            webhook_timeout,
            port,
            log_dir: non_empty("EASY_KIT_LOG_DIR").map(PathBuf::from),
        }
    }

    /// Reject values that would only fail later, mid-session.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let urls = [
            ("EASY_KIT_BASE_URL", self.base_url.as_deref()),
            ("EASY_KIT_WEBHOOK_URL", self.default_webhook_url.as_deref()),
        ];
        for (key, url) in urls {
            if let Some(url) = url
                && !(url.starts_with("http://") || url.starts_with("https://"))
            {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("expected an http(s) URL, got {url:?}"),
                });
            }
        }
        if self.webhook_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "EASY_KIT_WEBHOOK_TIMEOUT_MS".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = KitConfig::from_lookup(|_| None);
        assert!(config.base_url.is_none());
        assert_eq!(config.site_dir, PathBuf::from("./_site"));
        assert!(config.default_webhook_url.is_none());
        assert_eq!(config.webhook_timeout, Duration::from_secs(30));
        assert_eq!(config.port, 8080);
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn reads_all_variables() {
        let config = KitConfig::from_lookup(lookup_from(&[
            ("EASY_KIT_BASE_URL", "http://localhost:8081"),
            ("EASY_KIT_SITE_DIR", "/srv/site"),
            ("EASY_KIT_WEBHOOK_URL", "https://hooks.example.com/kit"),
            ("EASY_KIT_WEBHOOK_TIMEOUT_MS", "1500"),
            ("EASY_KIT_PORT", "9000"),
            ("EASY_KIT_LOG_DIR", "/var/log/easy-kit"),
        ]));
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:8081"));
        assert_eq!(config.site_dir, PathBuf::from("/srv/site"));
        assert_eq!(
            config.default_webhook_url.as_deref(),
            Some("https://hooks.example.com/kit")
        );
        assert_eq!(config.webhook_timeout, Duration::from_millis(1500));
        assert_eq!(config.port, 9000);
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/easy-kit")));
    }

    #[test]
    fn unparsable_numbers_fall_back() {
        let config = KitConfig::from_lookup(lookup_from(&[
            ("EASY_KIT_WEBHOOK_TIMEOUT_MS", "soon"),
            ("EASY_KIT_PORT", "99999"),
        ]));
        assert_eq!(config.webhook_timeout, DEFAULT_WEBHOOK_TIMEOUT);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn validate_rejects_non_http_urls() {
        let config = KitConfig::from_lookup(lookup_from(&[("EASY_KIT_WEBHOOK_URL", "ftp://x")]));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("EASY_KIT_WEBHOOK_URL"));
        assert!(KitConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let config = KitConfig::from_lookup(lookup_from(&[("EASY_KIT_WEBHOOK_TIMEOUT_MS", "0")]));
        assert!(config.validate().is_err());
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = KitConfig::from_lookup(lookup_from(&[("EASY_KIT_WEBHOOK_URL", "  ")]));
        assert!(config.default_webhook_url.is_none());
    }
}
