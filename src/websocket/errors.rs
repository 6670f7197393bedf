// Error types for the websocket client

use std::time::Duration;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Debug, Error)]
pub enum SocketError {
    #[error("Invalid handshake header: {0}")]
    InvalidHeader(String),

    #[error("Websocket transport error: {0}")]
    Transport(#[from] tungstenite::Error),

    #[error("Connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    #[error("Websocket client is not running")]
    NotRunning,

    #[error("Websocket client already started")]
    AlreadyStarted,

    #[error("Invalid proxy URL: {0}")]
    InvalidProxy(String),

    #[error("Proxy tunnel failed: {0}")]
    Proxy(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
