// Transport seam - what the worker needs from a websocket connection
//
// The worker only talks to Connector / Connection, so tests can swap the
// network for in-memory channels.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures_util::{SinkExt, StreamExt};
use reqwest::Url;
use std::borrow::Cow;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::error::UrlError;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::debug;

use super::config::SocketConfig;
use super::errors::SocketError;

/// Normal closure status code
pub const CLOSE_NORMAL: u16 = 1000;

const MAX_PROXY_HEAD: usize = 8192;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    Close { code: u16, reason: String },
}

impl Frame {
    /// Text or binary payload
    pub fn is_data(&self) -> bool {
        matches!(self, Self::Text(_) | Self::Binary(_))
    }
}

/// Opens connections
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str, config: &SocketConfig) -> Result<Box<dyn Connection>, SocketError>;
}

/// One open websocket connection. `recv` must be cancel safe.
#[async_trait]
pub trait Connection: Send {
    async fn send(&mut self, frame: Frame) -> Result<(), SocketError>;

    /// Next frame; `None` once the peer is gone
    async fn recv(&mut self) -> Option<Result<Frame, SocketError>>;

    /// Send a close frame and flush
    async fn close(&mut self, code: u16, reason: &str) -> Result<(), SocketError>;
}

/// Connector on top of tokio-tungstenite
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(&self, url: &str, config: &SocketConfig) -> Result<Box<dyn Connection>, SocketError> {
        let mut request = url.into_client_request()?;
        let headers = request.headers_mut();

        for (name, value) in &config.headers {
            let header = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| SocketError::InvalidHeader(name.clone()))?;
            let value =
                HeaderValue::from_str(value).map_err(|_| SocketError::InvalidHeader(name.clone()))?;
            headers.append(header, value);
        }

        if !config.subprotocols.is_empty() {
            let value = HeaderValue::from_str(&config.subprotocols.join(", "))
                .map_err(|_| SocketError::InvalidHeader(SEC_WEBSOCKET_PROTOCOL.to_string()))?;
            headers.insert(SEC_WEBSOCKET_PROTOCOL, value);
        }

        let (stream, response) = match &config.proxy {
            Some(proxy) => {
                let uri = request.uri();
                let host = uri
                    .host()
                    .ok_or(tungstenite::Error::Url(UrlError::NoHostName))?
                    .to_string();
                let port = uri
                    .port_u16()
                    .unwrap_or(if uri.scheme_str() == Some("wss") { 443 } else { 80 });

                let tunnel = open_tunnel(proxy, &host, port).await?;
                tokio_tungstenite::client_async_tls(request, tunnel).await?
            }
            None => tokio_tungstenite::connect_async(request).await?,
        };
        debug!(url, status = %response.status(), "Websocket handshake complete");

        Ok(Box::new(TungsteniteConnection { stream }))
    }
}

/// Connect to an HTTP proxy and ask it to tunnel to `host:port`
async fn open_tunnel(proxy: &str, host: &str, port: u16) -> Result<TcpStream, SocketError> {
    let invalid = || SocketError::InvalidProxy(proxy.to_string());
    let proxy_url = Url::parse(proxy).map_err(|_| invalid())?;
    if !matches!(proxy_url.scheme(), "http" | "https") {
        return Err(invalid());
    }
    let proxy_host = proxy_url.host_str().ok_or_else(invalid)?;
    let proxy_port = proxy_url.port_or_known_default().ok_or_else(invalid)?;

    let mut stream =
        TcpStream::connect((proxy_host.trim_start_matches('[').trim_end_matches(']'), proxy_port)).await?;

    let target = format!("{host}:{port}");
    let mut request = format!("CONNECT {target} HTTP/1.1\r\nHost: {target}\r\n");
    if !proxy_url.username().is_empty() {
        let credentials = format!("{}:{}", proxy_url.username(), proxy_url.password().unwrap_or(""));
        request.push_str(&format!("Proxy-Authorization: Basic {}\r\n", STANDARD.encode(credentials)));
    }
    request.push_str("\r\n");
    stream.write_all(request.as_bytes()).await?;

    let head = read_head(&mut stream).await?;
    let status = head.lines().next().unwrap_or_default();
    if status.split_whitespace().nth(1) != Some("200") {
        return Err(SocketError::Proxy(status.to_string()));
    }

    debug!(proxy = proxy_host, target = %target, "Proxy tunnel established");
    Ok(stream)
}

// One byte at a time so nothing after the blank line is consumed
async fn read_head<S: AsyncRead + Unpin>(stream: &mut S) -> Result<String, SocketError> {
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        if head.len() >= MAX_PROXY_HEAD {
            return Err(SocketError::Proxy("response head too large".to_string()));
        }
        if stream.read(&mut byte).await? == 0 {
            return Err(SocketError::Proxy("connection closed during CONNECT".to_string()));
        }
        head.push(byte[0]);
    }
    Ok(String::from_utf8_lossy(&head).into_owned())
}

struct TungsteniteConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Connection for TungsteniteConnection {
    async fn send(&mut self, frame: Frame) -> Result<(), SocketError> {
        self.stream.send(to_message(frame)).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<Frame, SocketError>> {
        loop {
            match self.stream.next().await? {
                Ok(message) => {
                    if let Some(frame) = from_message(message) {
                        return Some(Ok(frame));
                    }
                }
                Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                    return None
                }
                Err(err) => return Some(Err(err.into())),
            }
        }
    }

    async fn close(&mut self, code: u16, reason: &str) -> Result<(), SocketError> {
        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: Cow::Owned(reason.to_string()),
        };
        match self.stream.close(Some(frame)).await {
            Ok(()) | Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

fn to_message(frame: Frame) -> Message {
    match frame {
        Frame::Text(text) => Message::Text(text),
        Frame::Binary(data) => Message::Binary(data),
        Frame::Ping(data) => Message::Ping(data),
        Frame::Pong(data) => Message::Pong(data),
        Frame::Close { code, reason } => Message::Close(Some(CloseFrame {
            code: CloseCode::from(code),
            reason: Cow::Owned(reason),
        })),
    }
}

// Raw frames never surface from a client stream
fn from_message(message: Message) -> Option<Frame> {
    match message {
        Message::Text(text) => Some(Frame::Text(text)),
        Message::Binary(data) => Some(Frame::Binary(data)),
        Message::Ping(data) => Some(Frame::Ping(data)),
        Message::Pong(data) => Some(Frame::Pong(data)),
        Message::Close(frame) => Some(match frame {
            Some(frame) => Frame::Close {
                code: frame.code.into(),
                reason: frame.reason.into_owned(),
            },
            None => Frame::Close {
                code: CLOSE_NORMAL,
                reason: String::new(),
            },
        }),
        Message::Frame(_) => None,
    }
}
