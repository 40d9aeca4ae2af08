//! In-process transport driven by hand.
//!
//! Useful for tests and for embedding a session next to a relay in the same
//! process: the owner decides when the link goes up or down, feeds inbound
//! frames with [`deliver`](MemoryTransport::deliver) and collects outbound
//! frames with [`take_sent`](MemoryTransport::take_sent).

use super::{ConnectionState, Transport, TransportEvent};
use crate::error::{TransportError, TransportResult};

#[derive(Debug)]
pub struct MemoryTransport {
    state: ConnectionState,
    events: Vec<TransportEvent>,
    sent: Vec<Vec<u8>>,
}

impl MemoryTransport {
    /// A transport that starts disconnected.
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            events: Vec::new(),
            sent: Vec::new(),
        }
    }

    /// Bring the link up. The session sees a `Connected` event on its next poll.
    pub fn connect(&mut self) {
        self.state = ConnectionState::Connected;
        self.events.push(TransportEvent::Connected);
    }

    /// Drop the link. Frames sent while down are rejected.
    pub fn disconnect(&mut self) {
        if self.state == ConnectionState::Connected {
            self.events.push(TransportEvent::Disconnected);
        }
        self.state = ConnectionState::Disconnected;
    }

    /// Queue an inbound frame.
    pub fn deliver(&mut self, frame: Vec<u8>) {
        self.events.push(TransportEvent::Frame(frame));
    }

    /// Queue an error event, as a failed connect attempt would.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.state = ConnectionState::Error;
        self.events.push(TransportEvent::Error {
            message: message.into(),
        });
    }

    /// Drain the frames sent so far.
    pub fn take_sent(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.sent)
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, frame: Vec<u8>) -> TransportResult<()> {
        if self.state != ConnectionState::Connected {
            return Err(TransportError::Closed);
        }
        self.sent.push(frame);
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<TransportEvent> {
        std::mem::take(&mut self.events)
    }

    fn state(&self) -> ConnectionState {
        self.state
    }

    fn close(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.events.clear();
    }
}
