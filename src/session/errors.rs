// Error types for URL resolution

use thiserror::Error;

/// Errors raised by the redirect resolver
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid proxy URL {url}: {source}")]
    InvalidProxy {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Used by non-reqwest resolvers
    #[error("HTTP error: {0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    /// No registered plugin claims the URL
    #[error("No plugin can handle URL: {0}")]
    NoPlugin(String),

    /// Redirect resolution failed; passed through untouched
    #[error(transparent)]
    Http(#[from] HttpError),
}

impl SessionError {
    pub fn is_no_plugin(&self) -> bool {
        matches!(self, Self::NoPlugin(_))
    }
}
