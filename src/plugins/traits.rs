// Plugin trait and common types

use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::stream::RawStreams;

/// Generic "resolution failed" signal raised by plugins
#[derive(Debug, Error)]
pub enum PluginError {
    /// Extraction failed with a plugin-specific reason
    #[error("Unable to extract streams: {0}")]
    Failed(String),

    /// Nothing is available right now (offline channel, geo block...)
    #[error("No streams found")]
    NoStreams,

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unable to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything a plugin instance is built from
#[derive(Debug, Clone)]
pub struct PluginInput {
    /// URL the plugin was resolved for (after redirects)
    pub url: String,
    /// Named capture groups of the matcher that claimed the URL
    pub groups: BTreeMap<String, String>,
    /// Shared HTTP client configured by the session
    pub http: reqwest::Client,
}

impl PluginInput {
    pub fn group(&self, name: &str) -> Option<&str> {
        self.groups.get(name).map(String::as_str)
    }
}

/// Trait for site plugins
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Fetch the raw stream list. Names may repeat across transport types.
    async fn get_streams(&self) -> Result<RawStreams, PluginError>;

    /// Title of the content, if the plugin knows it
    fn title(&self) -> Option<String> {
        None
    }
}
