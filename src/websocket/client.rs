// Reconnecting websocket client
//
// The network loop runs on its own OS thread with a current-thread tokio
// runtime. Callers talk to it through a command channel, so the worker is
// the only writer of the connection.
//
// Reconnect rules:
// - reconnect() only acts while Open and no reconnect is pending
// - the pending flag is cleared by the worker when it re-enters Connecting
// - close() wins over a pending reconnect

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc as std_mpsc, Arc};
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval};
use tracing::{debug, error};

use super::config::SocketConfig;
use super::errors::SocketError;
use super::state::SocketState;
use super::transport::{Connection, Connector, Frame, TungsteniteConnector, CLOSE_NORMAL};
use crate::session::Session;

/// Callbacks invoked on the worker thread
pub trait SocketHandler: Send + Sync + 'static {
    fn on_open(&self, _sender: &SocketSender) {
        debug!("Websocket connection opened");
    }

    /// Text and binary frames
    fn on_message(&self, _sender: &SocketSender, _frame: &Frame) {}

    fn on_error(&self, error: &SocketError) {
        error!(error = %error, "Websocket error");
    }

    fn on_close(&self, code: Option<u16>, reason: &str) {
        debug!(code, reason, "Websocket connection closed");
    }
}

/// Handler that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHandler;

impl SocketHandler for LoggingHandler {}

#[derive(Debug)]
enum Command {
    Send(Frame),
    Reconnect,
    Close { code: u16, reason: String },
}

struct Shared {
    state: Mutex<SocketState>,
    reconnect: AtomicBool,
    url: Mutex<String>,
    connections: AtomicUsize,
}

/// Cloneable handle for queueing frames from any thread
#[derive(Clone)]
pub struct SocketSender {
    commands: mpsc::UnboundedSender<Command>,
    shared: Arc<Shared>,
}

impl SocketSender {
    pub fn send(&self, frame: Frame) -> Result<(), SocketError> {
        if self.shared.state.lock().is_shutting_down() {
            return Err(SocketError::NotRunning);
        }
        self.commands
            .send(Command::Send(frame))
            .map_err(|_| SocketError::NotRunning)
    }

    pub fn send_text(&self, text: impl Into<String>) -> Result<(), SocketError> {
        self.send(Frame::Text(text.into()))
    }

    pub fn send_binary(&self, data: impl Into<Vec<u8>>) -> Result<(), SocketError> {
        self.send(Frame::Binary(data.into()))
    }

    /// Serialize as compact JSON and send as a text frame
    pub fn send_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), SocketError> {
        let text = serde_json::to_string(value)?;
        self.send(Frame::Text(text))
    }
}

struct Worker {
    config: SocketConfig,
    connector: Arc<dyn Connector>,
    handler: Arc<dyn SocketHandler>,
    commands: mpsc::UnboundedReceiver<Command>,
    sender: SocketSender,
    shared: Arc<Shared>,
}

/// Websocket client that keeps its connection on a background thread
pub struct WebsocketClient {
    config: SocketConfig,
    sender: SocketSender,
    worker: Mutex<Option<Worker>>,
    thread: Mutex<Option<JoinHandle<()>>>,
    exited: Mutex<Option<std_mpsc::Receiver<()>>>,
}

impl WebsocketClient {
    pub fn new(config: SocketConfig, connector: Arc<dyn Connector>, handler: Arc<dyn SocketHandler>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            state: Mutex::new(SocketState::Idle),
            reconnect: AtomicBool::new(false),
            url: Mutex::new(config.url.clone()),
            connections: AtomicUsize::new(0),
        });
        let sender = SocketSender {
            commands: tx,
            shared: shared.clone(),
        };

        let worker = Worker {
            config: config.clone(),
            connector,
            handler,
            commands: rx,
            sender: sender.clone(),
            shared,
        };

        Self {
            config,
            sender,
            worker: Mutex::new(Some(worker)),
            thread: Mutex::new(None),
            exited: Mutex::new(None),
        }
    }

    /// Client over tokio-tungstenite using the session's User-Agent and proxy
    pub fn with_session(session: &Session, config: SocketConfig, handler: Arc<dyn SocketHandler>) -> Self {
        let config = config
            .with_default_user_agent(&session.config().user_agent)
            .with_default_proxy(session.config().effective_proxy());
        Self::new(config, Arc::new(TungsteniteConnector), handler)
    }

    pub fn config(&self) -> &SocketConfig {
        &self.config
    }

    pub fn state(&self) -> SocketState {
        *self.sender.shared.state.lock()
    }

    /// URL used by the next connection attempt
    pub fn url(&self) -> String {
        self.sender.shared.url.lock().clone()
    }

    pub fn reconnect_pending(&self) -> bool {
        self.sender.shared.reconnect.load(Ordering::SeqCst)
    }

    /// Connection attempts made so far
    pub fn connection_count(&self) -> usize {
        self.sender.shared.connections.load(Ordering::SeqCst)
    }

    pub fn sender(&self) -> SocketSender {
        self.sender.clone()
    }

    /// Spawn the worker thread
    pub fn start(&self) -> Result<(), SocketError> {
        let mut slot = self.worker.lock();
        if slot.is_none() {
            return Err(SocketError::AlreadyStarted);
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let (exit_tx, exit_rx) = std_mpsc::channel();

        let worker = slot.take().ok_or(SocketError::AlreadyStarted)?;
        let handle = std::thread::Builder::new()
            .name("websocket-client".to_string())
            .spawn(move || {
                runtime.block_on(worker.run());
                let _ = exit_tx.send(());
            })?;

        *self.thread.lock() = Some(handle);
        *self.exited.lock() = Some(exit_rx);
        Ok(())
    }

    pub fn send(&self, frame: Frame) -> Result<(), SocketError> {
        self.sender.send(frame)
    }

    pub fn send_text(&self, text: impl Into<String>) -> Result<(), SocketError> {
        self.sender.send_text(text)
    }

    pub fn send_binary(&self, data: impl Into<Vec<u8>>) -> Result<(), SocketError> {
        self.sender.send_binary(data)
    }

    pub fn send_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), SocketError> {
        self.sender.send_json(value)
    }

    /// Drop the current connection and connect again.
    ///
    /// Returns false without doing anything unless the client is Open and
    /// no reconnect is already pending.
    pub fn reconnect(&self) -> bool {
        self.request_reconnect(None)
    }

    /// Reconnect, switching to `url` for this and later connections.
    ///
    /// The URL is left untouched when the request is refused.
    pub fn reconnect_to(&self, url: impl Into<String>) -> bool {
        self.request_reconnect(Some(url.into()))
    }

    fn request_reconnect(&self, url: Option<String>) -> bool {
        let shared = &self.sender.shared;
        let previous = {
            let state = shared.state.lock();
            if *state != SocketState::Open || shared.reconnect.load(Ordering::SeqCst) {
                return false;
            }
            shared.reconnect.store(true, Ordering::SeqCst);
            url.map(|url| std::mem::replace(&mut *shared.url.lock(), url))
        };

        debug!(url = %self.url(), "Websocket reconnect requested");
        if self.sender.commands.send(Command::Reconnect).is_err() {
            let _state = shared.state.lock();
            shared.reconnect.store(false, Ordering::SeqCst);
            if let Some(previous) = previous {
                *shared.url.lock() = previous;
            }
            return false;
        }
        true
    }

    /// Graceful close with the configured timeout
    pub fn close(&self, code: u16, reason: &str) -> bool {
        self.close_with_timeout(code, reason, self.config.close_timeout)
    }

    /// Ask the worker to close and wait up to `timeout` for its thread.
    ///
    /// Returns whether the worker thread has exited. A connect attempt in
    /// progress is not interrupted; it is bounded by the connect timeout.
    pub fn close_with_timeout(&self, code: u16, reason: &str, timeout: Duration) -> bool {
        // the worker takes the state lock on its way out, so never wait under it
        let already_closed = {
            let mut state = self.sender.shared.state.lock();
            match *state {
                SocketState::Closed => true,
                SocketState::Idle if self.thread.lock().is_none() => {
                    *state = SocketState::Closed;
                    return true;
                }
                _ => {
                    *state = SocketState::Closing;
                    false
                }
            }
        };

        if !already_closed {
            let _ = self.sender.commands.send(Command::Close {
                code,
                reason: reason.to_string(),
            });
        }
        self.wait(timeout)
    }

    /// Wait up to `timeout` for the worker thread to exit
    pub fn wait(&self, timeout: Duration) -> bool {
        let exited = match self.exited.lock().as_ref() {
            Some(rx) => !matches!(
                rx.recv_timeout(timeout),
                Err(std_mpsc::RecvTimeoutError::Timeout)
            ),
            None => true,
        };

        if exited {
            if let Some(handle) = self.thread.lock().take() {
                let _ = handle.join();
            }
        }
        exited
    }

    pub fn is_running(&self) -> bool {
        self.thread
            .lock()
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }
}

impl Drop for WebsocketClient {
    fn drop(&mut self) {
        if self.is_running() {
            *self.sender.shared.state.lock() = SocketState::Closing;
            let _ = self.sender.commands.send(Command::Close {
                code: CLOSE_NORMAL,
                reason: String::new(),
            });
        }
    }
}

enum Ended {
    Remote { code: Option<u16>, reason: String },
    Local { code: u16, reason: String },
    Reconnect,
}

impl Worker {
    async fn run(mut self) {
        loop {
            {
                let mut state = self.shared.state.lock();
                if state.is_shutting_down() {
                    break;
                }
                *state = SocketState::Connecting;
                self.shared.reconnect.store(false, Ordering::SeqCst);
            }
            self.shared.connections.fetch_add(1, Ordering::SeqCst);

            let url = self.shared.url.lock().clone();
            debug!(url = %url, "Websocket connecting");

            let connected = tokio::time::timeout(
                self.config.connect_timeout,
                self.connector.connect(&url, &self.config),
            )
            .await;
            let mut conn = match connected {
                Ok(Ok(conn)) => conn,
                Ok(Err(err)) => {
                    self.handler.on_error(&err);
                    break;
                }
                Err(_) => {
                    self.handler
                        .on_error(&SocketError::ConnectTimeout(self.config.connect_timeout));
                    break;
                }
            };

            let opened = {
                let mut state = self.shared.state.lock();
                if *state == SocketState::Connecting {
                    *state = SocketState::Open;
                    true
                } else {
                    false
                }
            };
            if opened {
                self.handler.on_open(&self.sender);
            }

            match self.session(conn.as_mut()).await {
                Ended::Remote { code, reason } => self.handler.on_close(code, &reason),
                Ended::Local { code, reason } => self.handler.on_close(Some(code), &reason),
                Ended::Reconnect => self.handler.on_close(Some(CLOSE_NORMAL), ""),
            }

            // a reconnect requested while the peer was hanging up still counts
            let reconnecting = {
                let mut state = self.shared.state.lock();
                let again = self.shared.reconnect.load(Ordering::SeqCst) && !state.is_shutting_down();
                if !again {
                    *state = SocketState::Closed;
                }
                again
            };
            if !reconnecting {
                break;
            }
            debug!("Websocket reconnecting");
        }

        *self.shared.state.lock() = SocketState::Closed;
        debug!("Websocket client stopped");
    }

    /// Pump one connection until it ends
    async fn session(&mut self, conn: &mut dyn Connection) -> Ended {
        // a zero period disables pings
        let mut ticker = self
            .config
            .ping_interval
            .filter(|period| !period.is_zero())
            .map(|period| tokio::time::interval_at(Instant::now() + period, period));

        loop {
            tokio::select! {
                incoming = conn.recv() => match incoming {
                    Some(Ok(Frame::Close { code, reason })) => {
                        return Ended::Remote { code: Some(code), reason };
                    }
                    Some(Ok(frame)) if frame.is_data() => self.handler.on_message(&self.sender, &frame),
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        self.handler.on_error(&err);
                        return Ended::Remote { code: None, reason: String::new() };
                    }
                    None => return Ended::Remote { code: None, reason: String::new() },
                },
                command = self.commands.recv() => match command {
                    Some(Command::Send(frame)) => {
                        if let Err(err) = conn.send(frame).await {
                            self.handler.on_error(&err);
                            return Ended::Remote { code: None, reason: String::new() };
                        }
                    }
                    // stale request from an earlier connection
                    Some(Command::Reconnect) if !self.shared.reconnect.load(Ordering::SeqCst) => {}
                    Some(Command::Reconnect) => {
                        if !self.shared.state.lock().is_shutting_down() {
                            self.close_quietly(conn, CLOSE_NORMAL, "").await;
                            return Ended::Reconnect;
                        }
                    }
                    Some(Command::Close { code, reason }) => {
                        self.close_quietly(conn, code, &reason).await;
                        return Ended::Local { code, reason };
                    }
                    None => {
                        self.close_quietly(conn, CLOSE_NORMAL, "").await;
                        return Ended::Local { code: CLOSE_NORMAL, reason: String::new() };
                    }
                },
                _ = next_ping(&mut ticker) => {
                    if let Err(err) = conn.send(Frame::Ping(Vec::new())).await {
                        self.handler.on_error(&err);
                        return Ended::Remote { code: None, reason: String::new() };
                    }
                }
            }
        }
    }

    async fn close_quietly(&self, conn: &mut dyn Connection, code: u16, reason: &str) {
        if let Err(err) = conn.close(code, reason).await {
            debug!(error = %err, "Websocket close handshake failed");
        }
    }
}

async fn next_ping(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
