// Stream handle trait and common types

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Opaque stream produced by a plugin
///
/// The core only looks at `shortname()` when merging transport types.
/// Everything else belongs to the plugin that created the handle.
pub trait Stream: Send + Sync + fmt::Debug {
    /// Transport type name (e.g. "hls", "http", "rtmp")
    fn shortname(&self) -> &str;

    /// Direct URL of the stream, if the transport has one
    fn url(&self) -> Option<&str> {
        None
    }
}

/// Shared stream handle; aliases point at the same allocation
pub type StreamHandle = Arc<dyn Stream>;

/// Final name → handle mapping returned to callers
pub type StreamMap = BTreeMap<String, StreamHandle>;

/// Raw plugin output. Names may repeat across transport types.
pub type RawStreams = Vec<(String, StreamHandle)>;

/// Simple URL-backed stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlStream {
    kind: String,
    url: String,
}

impl UrlStream {
    pub fn new(kind: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            url: url.into(),
        }
    }

    pub fn http(url: impl Into<String>) -> Self {
        Self::new("http", url)
    }

    pub fn hls(url: impl Into<String>) -> Self {
        Self::new("hls", url)
    }

    /// Wrap into a shared handle
    pub fn into_handle(self) -> StreamHandle {
        Arc::new(self)
    }
}

impl Stream for UrlStream {
    fn shortname(&self) -> &str {
        &self.kind
    }

    fn url(&self) -> Option<&str> {
        Some(&self.url)
    }
}
