use std::time::Duration;

/// Handshake and timing options for a websocket client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketConfig {
    pub url: String,
    /// Extra handshake headers, sent in order
    pub headers: Vec<(String, String)>,
    pub subprotocols: Vec<String>,
    /// HTTP proxy to tunnel through with CONNECT
    pub proxy: Option<String>,
    /// Send a ping frame this often while open
    pub ping_interval: Option<Duration>,
    pub connect_timeout: Duration,
    /// How long `close()` waits for the worker thread
    pub close_timeout: Duration,
}

impl SocketConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            subprotocols: Vec::new(),
            proxy: None,
            ping_interval: None,
            connect_timeout: Duration::from_secs(10),
            close_timeout: Duration::from_secs(3),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_subprotocols<I, S>(mut self, subprotocols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subprotocols = subprotocols.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = Some(interval);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Add a User-Agent header unless one is already configured
    pub fn with_default_user_agent(self, user_agent: &str) -> Self {
        if self.header("user-agent").is_some() {
            self
        } else {
            self.with_header("User-Agent", user_agent)
        }
    }

    /// Use `proxy` unless one is already configured
    pub fn with_default_proxy(self, proxy: Option<&str>) -> Self {
        match (&self.proxy, proxy) {
            (None, Some(proxy)) => self.with_proxy(Some(proxy.to_string())),
            _ => self,
        }
    }
}
