//! A room session: one document bound to one transport.
//!
//! The session owns its document exclusively. Local edits are applied to the
//! document immediately and shipped as `Update` frames on the next
//! [`flush`](RoomSession::flush). Every (re)connection starts with a
//! `SyncStep1`/`SyncStep2` exchange, which also re-sends edits made offline.

use crate::config::SyncConfig;
use crate::crdt::DrawingDocument;
use crate::error::TransportResult;
use crate::sync::{
    Backoff, ConnectionState, NativeWebSocket, SyncMessage, Transport, TransportEvent, room_url,
};

pub struct RoomSession<T: Transport = NativeWebSocket> {
    room: String,
    document: DrawingDocument,
    transport: T,
    closed: bool,
}

impl RoomSession<NativeWebSocket> {
    /// Open a room over a native WebSocket.
    ///
    /// The connection is started before the session is returned; edits made
    /// before it completes are delivered by the handshake.
    pub fn open(config: &SyncConfig, room: &str) -> TransportResult<Self> {
        let url = room_url(&config.endpoint, room)?;
        let mut transport =
            NativeWebSocket::with_backoff(Backoff::new(config.backoff_initial, config.backoff_max));
        transport.connect(url)?;
        log::info!("Opened room {} at {}", room, config.endpoint);
        Ok(Self::with_transport(room, transport, DrawingDocument::new()))
    }
}

impl<T: Transport> RoomSession<T> {
    pub fn with_transport(room: impl Into<String>, transport: T, document: DrawingDocument) -> Self {
        Self {
            room: room.into(),
            document,
            transport,
            closed: false,
        }
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    pub fn document(&self) -> &DrawingDocument {
        &self.document
    }

    /// Mutable access for local edits. They are sent on the next flush.
    pub fn document_mut(&mut self) -> &mut DrawingDocument {
        &mut self.document
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Connectivity, for a status indicator.
    pub fn state(&self) -> ConnectionState {
        self.transport.state()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Process transport events, then flush local edits.
    ///
    /// Returns the number of inbound frames applied. Frames that fail to
    /// decode or apply are logged and dropped.
    pub fn poll(&mut self) -> usize {
        if self.closed {
            return 0;
        }

        let mut applied = 0;
        for event in self.transport.poll_events() {
            match event {
                TransportEvent::Connected => {
                    log::info!("Room {} connected, starting sync", self.room);
                    let hello = SyncMessage::SyncStep1 {
                        version: self.document.encoded_version(),
                    };
                    if let Err(e) = self.send_message(&hello) {
                        log::warn!("Room {}: failed to send sync step 1: {}", self.room, e);
                    }
                }
                TransportEvent::Disconnected => {
                    log::info!("Room {} disconnected", self.room);
                }
                TransportEvent::Error { message } => {
                    log::warn!("Room {} transport error: {}", self.room, message);
                }
                TransportEvent::Frame(frame) => match self.handle_frame(&frame) {
                    Ok(()) => applied += 1,
                    Err(e) => log::warn!("Room {}: dropping frame: {}", self.room, e),
                },
            }
        }

        self.flush();
        applied
    }

    fn handle_frame(&mut self, frame: &[u8]) -> TransportResult<()> {
        let message = SyncMessage::decode(frame)?;
        log::debug!("Room {} received {}", self.room, message.kind());
        match message {
            SyncMessage::SyncStep1 { version } => {
                let update = self.document.export_since(&version)?;
                self.send_message(&SyncMessage::SyncStep2 { update })?;
            }
            SyncMessage::SyncStep2 { update } | SyncMessage::Update { update } => {
                self.document.import(&update)?;
            }
        }
        Ok(())
    }

    /// Send queued local edits. Returns the number of frames sent.
    ///
    /// While disconnected the queue is discarded; the next handshake carries
    /// those edits instead.
    pub fn flush(&mut self) -> usize {
        let updates = self.document.take_local_updates();
        if updates.is_empty() || self.closed {
            return 0;
        }
        if !self.transport.is_connected() {
            log::debug!(
                "Room {} offline, {} local updates deferred to resync",
                self.room,
                updates.len()
            );
            return 0;
        }

        let mut sent = 0;
        for update in updates {
            if let Err(e) = self.send_message(&SyncMessage::Update { update }) {
                log::warn!("Room {}: send failed, deferring to resync: {}", self.room, e);
                break;
            }
            sent += 1;
        }
        sent
    }

    fn send_message(&mut self, message: &SyncMessage) -> TransportResult<()> {
        let frame = message.encode()?;
        log::debug!("Room {} sending {} ({} bytes)", self.room, message.kind(), frame.len());
        self.transport.send(frame)
    }

    /// Close the transport, cancel reconnection and drop all observers.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.transport.close();
        self.document.clear_observers();
        log::info!("Room {} closed", self.room);
    }
}

impl<T: Transport> Drop for RoomSession<T> {
    fn drop(&mut self) {
        self.close();
    }
}
