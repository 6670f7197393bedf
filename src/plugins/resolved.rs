// ResolvedPlugin - a plugin instance bound to the URL it was resolved for

use std::fmt;
use tracing::debug;

use super::traits::{Plugin, PluginError};
use crate::stream::{Exclusions, StreamMap, StreamSelector};

/// Options for `ResolvedPlugin::streams`
#[derive(Debug, Clone, Default)]
pub struct StreamOptions {
    /// Preferred transport types, in order. `None` uses the defaults.
    pub stream_types: Option<Vec<String>>,
    /// Qualities removed from best/worst selection
    pub sorting_excludes: Exclusions,
}

impl StreamOptions {
    pub fn with_stream_types<S: Into<String>>(mut self, types: impl IntoIterator<Item = S>) -> Self {
        self.stream_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_sorting_excludes(mut self, excludes: Exclusions) -> Self {
        self.sorting_excludes = excludes;
        self
    }
}

/// Plugin instance returned by the session
pub struct ResolvedPlugin {
    name: String,
    url: String,
    plugin: Box<dyn Plugin>,
}

impl ResolvedPlugin {
    pub(crate) fn new(name: impl Into<String>, url: impl Into<String>, plugin: Box<dyn Plugin>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            plugin,
        }
    }

    /// Registry name of the plugin class
    pub fn name(&self) -> &str {
        &self.name
    }

    /// URL the plugin is bound to
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> Option<String> {
        self.plugin.title()
    }

    /// Fetch streams and add the best/worst synonyms
    pub async fn streams(&self, options: &StreamOptions) -> Result<StreamMap, PluginError> {
        let raw = match self.plugin.get_streams().await {
            Ok(raw) => raw,
            Err(PluginError::NoStreams) => {
                debug!(plugin = %self.name, "No streams found");
                return Ok(StreamMap::new());
            }
            Err(e) => return Err(e),
        };

        debug!(plugin = %self.name, count = raw.len(), "Fetched raw streams");
        Ok(StreamSelector::build(
            raw,
            options.stream_types.as_deref(),
            &options.sorting_excludes,
        ))
    }
}

impl fmt::Debug for ResolvedPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedPlugin")
            .field("name", &self.name)
            .field("url", &self.url)
            .finish()
    }
}
