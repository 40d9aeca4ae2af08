//! Native WebSocket client with automatic reconnection.
//!
//! A background thread owns the blocking tungstenite socket and talks to the
//! caller through two channels, so the caller never blocks on the network.

use super::{Backoff, ConnectionState, Transport, TransportEvent};
use crate::error::{TransportError, TransportResult};
use std::net::TcpStream;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, TryRecvError, channel};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket, connect};
use url::Url;

/// Commands sent to the WebSocket thread.
enum WsCommand {
    Send(Vec<u8>),
    Close,
}

/// How a connected session ended.
enum LoopOutcome {
    /// Close was requested or the caller went away; stop for good.
    Closed,
    /// The socket failed; reconnect after a backoff.
    Lost,
}

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

/// WebSocket client for native platforms.
///
/// Uses a background thread for non-blocking operation. Lost connections are
/// retried forever with capped exponential backoff until [`close`](Transport::close).
pub struct NativeWebSocket {
    state: ConnectionState,
    backoff: Backoff,
    url: Option<Url>,
    /// Channel to send commands to the WebSocket thread.
    cmd_tx: Option<Sender<WsCommand>>,
    /// Channel to receive events from the WebSocket thread.
    event_rx: Option<Receiver<TransportEvent>>,
    /// Handle to the WebSocket thread.
    _thread: Option<JoinHandle<()>>,
}

impl NativeWebSocket {
    /// Create a new disconnected client with the default backoff.
    pub fn new() -> Self {
        Self::with_backoff(Backoff::default())
    }

    pub fn with_backoff(backoff: Backoff) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            backoff,
            url: None,
            cmd_tx: None,
            event_rx: None,
            _thread: None,
        }
    }

    /// Start connecting to `url` in the background.
    pub fn connect(&mut self, url: Url) -> TransportResult<()> {
        if self.cmd_tx.is_some() {
            return Err(TransportError::AlreadyConnected);
        }
        if url.scheme() != "ws" && url.scheme() != "wss" {
            return Err(TransportError::InvalidUrl(format!(
                "unsupported scheme: {}",
                url.scheme()
            )));
        }

        self.state = ConnectionState::Connecting;

        let (cmd_tx, cmd_rx) = channel::<WsCommand>();
        let (event_tx, event_rx) = channel::<TransportEvent>();
        let backoff = self.backoff.clone();
        let thread_url = url.clone();

        let handle = thread::Builder::new()
            .name(format!("syncdraw-ws {}", url.path()))
            .spawn(move || run_connection_loop(thread_url, backoff, cmd_rx, event_tx))
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        self.url = Some(url);
        self.cmd_tx = Some(cmd_tx);
        self.event_rx = Some(event_rx);
        self._thread = Some(handle);
        Ok(())
    }

    /// The URL this client was connected to.
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }
}

impl Transport for NativeWebSocket {
    fn send(&mut self, frame: Vec<u8>) -> TransportResult<()> {
        match &self.cmd_tx {
            Some(tx) => tx
                .send(WsCommand::Send(frame))
                .map_err(|e| TransportError::Send(e.to_string())),
            None => Err(TransportError::Closed),
        }
    }

    fn poll_events(&mut self) -> Vec<TransportEvent> {
        let mut events = Vec::new();
        if let Some(ref rx) = self.event_rx {
            while let Ok(event) = rx.try_recv() {
                // Update state based on event
                match &event {
                    TransportEvent::Connected => self.state = ConnectionState::Connected,
                    TransportEvent::Disconnected => self.state = ConnectionState::Connecting,
                    TransportEvent::Error { .. } => self.state = ConnectionState::Error,
                    TransportEvent::Frame(_) => {}
                }
                events.push(event);
            }
        }
        events
    }

    fn state(&self) -> ConnectionState {
        self.state
    }

    fn close(&mut self) {
        if let Some(tx) = self.cmd_tx.take() {
            let _ = tx.send(WsCommand::Close);
        }
        self.event_rx = None;
        self._thread = None;
        self.state = ConnectionState::Disconnected;
    }
}

impl Default for NativeWebSocket {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for NativeWebSocket {
    fn drop(&mut self) {
        self.close();
    }
}

fn run_connection_loop(
    url: Url,
    mut backoff: Backoff,
    cmd_rx: Receiver<WsCommand>,
    event_tx: Sender<TransportEvent>,
) {
    loop {
        log::info!("WebSocket thread: connecting to {}", url);
        match connect(url.as_str()) {
            Ok((mut socket, response)) => {
                log::info!("WebSocket connected, status: {}", response.status());
                backoff.reset();
                set_timeouts(&mut socket);
                if event_tx.send(TransportEvent::Connected).is_err() {
                    let _ = socket.close(None);
                    return;
                }

                let outcome = pump_socket(&mut socket, &cmd_rx, &event_tx);
                let _ = event_tx.send(TransportEvent::Disconnected);
                if let LoopOutcome::Closed = outcome {
                    log::info!("WebSocket thread exiting");
                    return;
                }
            }
            Err(e) => {
                log::error!("WebSocket connection failed: {}", e);
                let _ = event_tx.send(TransportEvent::Error {
                    message: format!("Connection failed: {}", e),
                });
            }
        }

        let delay = backoff.next_delay();
        log::debug!("Reconnecting in {:?}", delay);
        if !wait_for_retry(&cmd_rx, delay) {
            log::info!("WebSocket thread exiting");
            return;
        }
    }
}

/// Set a read timeout on the underlying TCP stream so the loop can
/// interleave reads with outgoing commands.
fn set_timeouts(socket: &mut Socket) {
    match socket.get_mut() {
        MaybeTlsStream::Plain(tcp) => {
            let _ = tcp.set_read_timeout(Some(Duration::from_millis(50)));
            let _ = tcp.set_write_timeout(Some(Duration::from_secs(5)));
        }
        #[allow(unreachable_patterns)]
        _ => {
            // For TLS streams, we'll rely on WouldBlock/TimedOut errors
            log::debug!("TLS or other stream - using default timeout handling");
        }
    }
}

fn pump_socket(
    socket: &mut Socket,
    cmd_rx: &Receiver<WsCommand>,
    event_tx: &Sender<TransportEvent>,
) -> LoopOutcome {
    loop {
        // Drain outgoing commands first (non-blocking)
        loop {
            match cmd_rx.try_recv() {
                Ok(WsCommand::Send(frame)) => {
                    log::debug!("WebSocket sending {} bytes", frame.len());
                    if let Err(e) = socket.send(Message::Binary(frame)) {
                        log::error!("WebSocket send error: {}", e);
                        return LoopOutcome::Lost;
                    }
                }
                Ok(WsCommand::Close) => {
                    log::info!("WebSocket close requested");
                    let _ = socket.close(None);
                    let _ = socket.flush();
                    return LoopOutcome::Closed;
                }
                Err(TryRecvError::Disconnected) => {
                    log::info!("WebSocket command channel disconnected");
                    let _ = socket.close(None);
                    return LoopOutcome::Closed;
                }
                Err(TryRecvError::Empty) => break,
            }
        }

        // Check for incoming messages (with timeout)
        match socket.read() {
            Ok(Message::Binary(frame)) => {
                log::debug!("WebSocket received {} bytes", frame.len());
                if event_tx.send(TransportEvent::Frame(frame)).is_err() {
                    let _ = socket.close(None);
                    return LoopOutcome::Closed;
                }
            }
            Ok(Message::Close(_)) => {
                log::info!("WebSocket received close frame");
                return LoopOutcome::Lost;
            }
            // Pings are answered by tungstenite on the next write or flush.
            Ok(_) => {}
            Err(tungstenite::Error::Io(ref e))
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                // Timeout on read; flush any queued pong and continue
                let _ = socket.flush();
            }
            Err(e) => {
                log::error!("WebSocket read error: {}", e);
                return LoopOutcome::Lost;
            }
        }
    }
}

/// Sleep for `delay` unless a close arrives first. Returns false on close.
fn wait_for_retry(cmd_rx: &Receiver<WsCommand>, delay: Duration) -> bool {
    let deadline = std::time::Instant::now() + delay;
    loop {
        let remaining = deadline.saturating_duration_since(std::time::Instant::now());
        if remaining.is_zero() {
            return true;
        }
        match cmd_rx.recv_timeout(remaining) {
            Ok(WsCommand::Close) | Err(RecvTimeoutError::Disconnected) => return false,
            // Frames queued while offline are dropped; the resync handshake
            // after reconnecting covers them.
            Ok(WsCommand::Send(_)) => {}
            Err(RecvTimeoutError::Timeout) => return true,
        }
    }
}
