//! WebSocket sync transport.
//!
//! A [`Transport`] moves opaque binary frames for exactly one room. The
//! session on top of it speaks the [`SyncMessage`] protocol; the transport
//! itself only knows about connection state and frames.

mod backoff;
mod memory;
mod native;
mod protocol;

pub use backoff::Backoff;
pub use memory::MemoryTransport;
pub use native::NativeWebSocket;
pub use protocol::SyncMessage;

use crate::error::{TransportError, TransportResult};
use url::Url;

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Events from a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Connected (or reconnected) to the relay
    Connected,
    /// Connection lost; a reconnect may follow
    Disconnected,
    /// A binary frame arrived
    Frame(Vec<u8>),
    /// Connecting failed or the socket errored
    Error { message: String },
}

/// A bidirectional frame pipe for one room.
pub trait Transport {
    /// Queue a frame for sending.
    fn send(&mut self, frame: Vec<u8>) -> TransportResult<()>;

    /// Drain pending events (non-blocking).
    fn poll_events(&mut self) -> Vec<TransportEvent>;

    /// Current connection state.
    fn state(&self) -> ConnectionState;

    /// Stop the connection and any pending reconnect.
    fn close(&mut self);

    fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }
}

/// Build the WebSocket URL of a room: the room id becomes the last path segment.
pub fn room_url(endpoint: &str, room: &str) -> TransportResult<Url> {
    if room.is_empty() {
        return Err(TransportError::InvalidUrl("empty room id".to_string()));
    }

    let mut url =
        Url::parse(endpoint).map_err(|e| TransportError::InvalidUrl(format!("{}: {}", endpoint, e)))?;
    if url.scheme() != "ws" && url.scheme() != "wss" {
        return Err(TransportError::InvalidUrl(format!(
            "unsupported scheme: {}",
            url.scheme()
        )));
    }

    url.path_segments_mut()
        .map_err(|_| TransportError::InvalidUrl(format!("cannot be a base: {}", endpoint)))?
        .pop_if_empty()
        .push(room);
    Ok(url)
}
