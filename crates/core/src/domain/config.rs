// Relay Configuration Model

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lower bound for the poll period (protects the remote authority)
pub const MIN_POLL_INTERVAL_SECS: u64 = 3;

/// Lower bound for the spacing between two dispatched commands
pub const MIN_DISPATCH_SPACING_SECS: f64 = 0.05;

/// Persisted relay configuration.
///
/// Every field has a default so partially written documents still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelayConfig {
    pub website_url: String,
    pub api_key: String,
    pub server_token: String,
    pub poll_interval_sec: u64,
    pub max_per_poll: u32,
    pub delay_between_sec: f64,
    pub check_player_online: bool,
    pub debug: bool,
    pub request_timeout_sec: u64,
    pub connect_flush_delay_sec: f64,
    pub ack_max_attempts: u32,
    pub console_command: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            website_url: String::new(),
            api_key: String::new(),
            server_token: String::new(),
            poll_interval_sec: 8,
            max_per_poll: 50,
            delay_between_sec: 0.75,
            check_player_online: true,
            debug: false,
            request_timeout_sec: 10,
            connect_flush_delay_sec: 2.0,
            ack_max_attempts: 1,
            console_command: "rcon-cli".to_string(),
        }
    }
}

fn secs_f64(secs: f64, fallback: Duration) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(fallback)
}

impl RelayConfig {
    /// Effective poll period, floored at [`MIN_POLL_INTERVAL_SECS`]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_sec.max(MIN_POLL_INTERVAL_SECS))
    }

    /// Effective spacing between dispatched commands, floored at [`MIN_DISPATCH_SPACING_SECS`]
    pub fn dispatch_spacing(&self) -> Duration {
        let floor = Duration::from_secs_f64(MIN_DISPATCH_SPACING_SECS);
        secs_f64(self.delay_between_sec.max(MIN_DISPATCH_SPACING_SECS), floor)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_sec.max(1))
    }

    /// Settle delay between a user connecting and their queue being flushed
    pub fn connect_flush_delay(&self) -> Duration {
        secs_f64(self.connect_flush_delay_sec.max(0.0), Duration::ZERO)
    }

    pub fn ack_max_attempts(&self) -> u32 {
        self.ack_max_attempts.max(1)
    }

    pub fn pull_url(&self) -> String {
        format!("{}/api/zcr/pull", self.website_url.trim_end_matches('/'))
    }

    pub fn ack_url(&self) -> String {
        format!("{}/api/zcr/ack", self.website_url.trim_end_matches('/'))
    }

    /// Check the fields polling cannot run without.
    ///
    /// All problems are reported together in a single `AppError::Config`.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();
        if self.website_url.trim().is_empty() {
            problems.push("Website URL must be set and use HTTPS in production.");
        }
        if self.api_key.trim().is_empty() {
            problems.push("API Key must be set.");
        }
        if self.server_token.trim().is_empty() {
            problems.push("Server Token must be set.");
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(AppError::Config(problems.join(" ")))
        }
    }

    pub fn uses_plain_http(&self) -> bool {
        self.website_url.trim_start().starts_with("http://")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> RelayConfig {
        RelayConfig {
            website_url: "https://example.com/".into(),
            api_key: "key".into(),
            server_token: "token".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_poll_interval_floor() {
        let mut cfg = valid();
        cfg.poll_interval_sec = 1;
        assert_eq!(cfg.poll_interval(), Duration::from_secs(3));
        cfg.poll_interval_sec = 8;
        assert_eq!(cfg.poll_interval(), Duration::from_secs(8));
    }

    #[test]
    fn test_dispatch_spacing_floor() {
        let mut cfg = valid();
        cfg.delay_between_sec = 0.0;
        assert_eq!(cfg.dispatch_spacing(), Duration::from_millis(50));
        cfg.delay_between_sec = -3.0;
        assert_eq!(cfg.dispatch_spacing(), Duration::from_millis(50));
        cfg.delay_between_sec = f64::NAN;
        assert_eq!(cfg.dispatch_spacing(), Duration::from_millis(50));
        cfg.delay_between_sec = 0.75;
        assert_eq!(cfg.dispatch_spacing(), Duration::from_millis(750));
    }

    #[test]
    fn test_urls_trim_trailing_slash() {
        let cfg = valid();
        assert_eq!(cfg.pull_url(), "https://example.com/api/zcr/pull");
        assert_eq!(cfg.ack_url(), "https://example.com/api/zcr/ack");
    }

    #[test]
    fn test_validate_reports_all_missing_fields() {
        let err = RelayConfig::default().validate().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Website URL"));
        assert!(msg.contains("API Key"));
        assert!(msg.contains("Server Token"));
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let cfg: RelayConfig =
            serde_json::from_str(r#"{"websiteUrl":"https://a.b","debug":true}"#).unwrap();
        assert_eq!(cfg.website_url, "https://a.b");
        assert!(cfg.debug);
        assert_eq!(cfg.poll_interval_sec, 8);
        assert_eq!(cfg.max_per_poll, 50);
        assert!(cfg.check_player_online);
    }

    #[test]
    fn test_plain_http_detection() {
        let mut cfg = valid();
        assert!(!cfg.uses_plain_http());
        cfg.website_url = "http://localhost:8000".into();
        assert!(cfg.uses_plain_http());
    }
}
