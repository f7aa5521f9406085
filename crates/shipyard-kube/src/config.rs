//! Kubernetes client configuration

use std::time::Duration;

/// Environment variable naming the API server URL.
pub const SERVER_ENV: &str = "SHIPYARD_KUBE_SERVER";
/// Environment variable holding the request timeout in seconds.
pub const TIMEOUT_ENV: &str = "SHIPYARD_KUBE_TIMEOUT_SECS";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings for the innermost HTTP transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KubeClientConfig {
    /// API server base URL
    pub server_url: String,
    /// Per-request timeout; callers can still cancel earlier by dropping the call
    pub timeout: Duration,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for KubeClientConfig {
    fn default() -> Self {
        let timeout_secs = std::env::var(TIMEOUT_ENV)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        KubeClientConfig {
            server_url: std::env::var(SERVER_ENV)
                .unwrap_or_else(|_| "https://kubernetes.default.svc".to_string()),
            timeout: Duration::from_secs(timeout_secs),
            user_agent: format!("shipyard-kube/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl KubeClientConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for a specific server
    pub fn new(server_url: &str) -> Self {
        KubeClientConfig {
            server_url: server_url.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: format!("shipyard-kube/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full URL for an API path
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.server_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_double_slashes() {
        let config = KubeClientConfig::new("https://api.example.com/");
        assert_eq!(
            config.url("/api/v1/namespaces"),
            "https://api.example.com/api/v1/namespaces"
        );
    }

    #[test]
    fn with_timeout_overrides_default() {
        let config = KubeClientConfig::new("https://api.example.com")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
