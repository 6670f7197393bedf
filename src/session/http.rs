// HTTP collaborator - builds the shared client and follows redirects

use async_trait::async_trait;
use reqwest::{redirect, Client, StatusCode};
use tracing::debug;

use super::config::SessionConfig;
use super::errors::HttpError;

/// Follows a redirect chain and reports the final URL
#[async_trait]
pub trait RedirectResolver: Send + Sync {
    async fn resolve(&self, url: &str) -> Result<String, HttpError>;
}

/// Build the shared HTTP client from the session config
pub fn build_client(config: &SessionConfig) -> Result<Client, HttpError> {
    let mut builder = Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout())
        .redirect(redirect::Policy::limited(config.max_redirects));

    if let Some(proxy_url) = config.effective_proxy() {
        let proxy = reqwest::Proxy::all(proxy_url).map_err(|source| HttpError::InvalidProxy {
            url: proxy_url.to_string(),
            source,
        })?;
        builder = builder.proxy(proxy);
    }

    Ok(builder.build()?)
}

/// Redirect resolver on top of reqwest
#[derive(Debug, Clone)]
pub struct HttpRedirectResolver {
    client: Client,
}

impl HttpRedirectResolver {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RedirectResolver for HttpRedirectResolver {
    async fn resolve(&self, url: &str) -> Result<String, HttpError> {
        let mut response = self.client.head(url).send().await?;

        // Fall back to GET when the server does not implement HEAD
        if response.status() == StatusCode::NOT_IMPLEMENTED {
            response = self.client.get(url).send().await?;
        }

        let final_url = response.url().to_string();
        if final_url != url {
            debug!(from = url, to = %final_url, "Followed redirect");
        }
        Ok(final_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client_rejects_bad_proxy() {
        let config = SessionConfig::default().with_http_proxy(Some("http://[::1".to_string()));

        let err = build_client(&config).unwrap_err();
        assert!(matches!(err, HttpError::InvalidProxy { .. }));
    }

    #[test]
    fn test_build_client_accepts_socks_proxy() {
        let config =
            SessionConfig::default().with_https_proxy(Some("socks5://localhost:1234".to_string()));

        assert!(build_client(&config).is_ok());
    }
}
