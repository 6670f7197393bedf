// Connection state of the websocket client

use serde::Serialize;
use std::fmt;

/// Lifecycle: Idle -> Connecting -> Open -> Closing -> Closed.
///
/// A reconnect goes from Open back to Connecting; nothing leaves Closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SocketState {
    #[default]
    Idle,
    Connecting,
    Open,
    Closing,
    Closed,
}

impl SocketState {
    /// Closing or Closed
    pub fn is_shutting_down(&self) -> bool {
        matches!(self, Self::Closing | Self::Closed)
    }
}

impl fmt::Display for SocketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
        };
        write!(f, "{}", name)
    }
}
