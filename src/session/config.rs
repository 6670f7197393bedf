use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

/// Session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// User-Agent for HTTP requests and websocket handshakes
    pub user_agent: String,
    /// Proxy for plain HTTP requests
    pub http_proxy: Option<String>,
    /// Proxy for HTTPS requests
    pub https_proxy: Option<String>,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Redirects followed while resolving a URL
    pub max_redirects: usize,
    /// Entries kept by the resolution cache
    pub cache_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            http_proxy: None,
            https_proxy: None,
            timeout_seconds: 20,
            max_redirects: 10,
            cache_capacity: 128,
        }
    }
}

impl SessionConfig {
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_http_proxy(mut self, proxy: Option<String>) -> Self {
        self.http_proxy = proxy;
        self
    }

    pub fn with_https_proxy(mut self, proxy: Option<String>) -> Self {
        self.https_proxy = proxy;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_max_redirects(mut self, redirects: usize) -> Self {
        self.max_redirects = redirects;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Proxy applied to every request. The HTTPS proxy wins when both are
    /// set; a single proxy covers both schemes.
    pub fn effective_proxy(&self) -> Option<&str> {
        self.https_proxy.as_deref().or(self.http_proxy.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_proxy() {
        let config = SessionConfig::default();
        assert_eq!(config.effective_proxy(), None);

        let http_only = config.clone().with_http_proxy(Some("http://testproxy.com".into()));
        assert_eq!(http_only.effective_proxy(), Some("http://testproxy.com"));

        let https_only = config.clone().with_https_proxy(Some("https://secure.com".into()));
        assert_eq!(https_only.effective_proxy(), Some("https://secure.com"));

        let both = http_only.with_https_proxy(Some("https://secure.com".into()));
        assert_eq!(both.effective_proxy(), Some("https://secure.com"));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"http_proxy": "socks5://localhost:1234", "cache_capacity": 4}"#)
                .unwrap();

        assert_eq!(config.effective_proxy(), Some("socks5://localhost:1234"));
        assert_eq!(config.cache_capacity, 4);
        assert_eq!(config.timeout_seconds, 20);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }
}
