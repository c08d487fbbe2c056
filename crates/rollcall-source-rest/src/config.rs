//! REST source configuration
//!
//! Connection settings for one backend, validated at construction and
//! threaded into the adapter explicitly.

use serde::{Deserialize, Serialize};
use url::Url;

use rollcall_core::Source;
use rollcall_sync::error::{SyncError, SyncResult};

/// Authentication for one backend.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceAuth {
    /// No authentication (local development only).
    None,
    /// Bearer token in the Authorization header.
    Bearer { token: String },
    /// API key in a custom header.
    ApiKey { header_name: String, key: String },
}

impl std::fmt::Debug for SourceAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceAuth::None => write!(f, "None"),
            SourceAuth::Bearer { .. } => write!(f, "Bearer {{ token: \"***\" }}"),
            SourceAuth::ApiKey { header_name, .. } => {
                write!(f, "ApiKey {{ header_name: {header_name:?}, key: \"***\" }}")
            }
        }
    }
}

/// Configuration for one REST source adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestSourceConfig {
    /// Base URL of the backend API.
    pub base_url: String,

    /// Authentication.
    #[serde(default = "default_auth")]
    pub auth: SourceAuth,

    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Read timeout in seconds.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
}

fn default_auth() -> SourceAuth {
    SourceAuth::None
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_read_timeout() -> u64 {
    30
}

impl RestSourceConfig {
    /// Create a configuration for the given base URL with defaults.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth: SourceAuth::None,
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
        }
    }

    /// Set the authentication.
    pub fn with_auth(mut self, auth: SourceAuth) -> Self {
        self.auth = auth;
        self
    }

    /// Set the timeouts.
    pub fn with_timeouts(mut self, connect_secs: u64, read_secs: u64) -> Self {
        self.connect_timeout_secs = connect_secs;
        self.read_timeout_secs = read_secs;
        self
    }

    /// Validate the configuration and return the parsed base URL.
    pub fn validate(&self, source: Source) -> SyncResult<Url> {
        let url = Url::parse(&self.base_url).map_err(|e| {
            SyncError::internal(format!("invalid base url for {source}: {e}"))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(SyncError::internal(format!(
                "unsupported scheme for {source}: {}",
                url.scheme()
            )));
        }
        if self.read_timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err(SyncError::internal(format!(
                "timeouts for {source} must be non-zero"
            )));
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_https() {
        let config = RestSourceConfig::new("https://api.example.com/v2/");
        assert!(config.validate(Source::Crm).is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        assert!(RestSourceConfig::new("not a url").validate(Source::Crm).is_err());
        assert!(RestSourceConfig::new("ftp://example.com")
            .validate(Source::Crm)
            .is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeouts() {
        let config = RestSourceConfig::new("https://api.example.com").with_timeouts(0, 30);
        assert!(config.validate(Source::Crm).is_err());
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let auth = SourceAuth::Bearer {
            token: "secret".to_string(),
        };
        let rendered = format!("{auth:?}");
        assert!(!rendered.contains("secret"));
    }
}
