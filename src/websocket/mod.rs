// Websocket module - push-data channel for plugins that need one
//
// Provides:
// - WebsocketClient, a reconnecting client on its own thread
// - SocketConfig for handshake headers and timeouts
// - The Connector / Connection seam with a tokio-tungstenite backend

mod client;
mod config;
mod errors;
mod state;
mod transport;

pub use client::{LoggingHandler, SocketHandler, SocketSender, WebsocketClient};
pub use config::SocketConfig;
pub use errors::SocketError;
pub use state::SocketState;
pub use transport::{Connection, Connector, Frame, TungsteniteConnector, CLOSE_NORMAL};
