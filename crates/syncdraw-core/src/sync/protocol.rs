//! Wire messages exchanged between a client and the room relay.
//!
//! Every message travels as one binary WebSocket frame, encoded with postcard.
//! The update payloads are opaque Loro deltas.

use crate::error::{TransportError, TransportResult};
use serde::{Deserialize, Serialize};

/// One sync protocol message.
///
/// On every (re)connection both ends send `SyncStep1` with their version
/// vector and answer the other side's `SyncStep1` with a `SyncStep2`
/// carrying only the operations it is missing. After the handshake, local
/// changes flow as `Update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncMessage {
    /// "This is my state vector."
    SyncStep1 { version: Vec<u8> },
    /// "Here is everything you are missing."
    SyncStep2 { update: Vec<u8> },
    /// A live incremental delta.
    Update { update: Vec<u8> },
}

impl SyncMessage {
    /// Encode into a binary frame.
    pub fn encode(&self) -> TransportResult<Vec<u8>> {
        postcard::to_allocvec(self).map_err(|e| TransportError::Encode(e.to_string()))
    }

    /// Decode a binary frame.
    pub fn decode(frame: &[u8]) -> TransportResult<Self> {
        postcard::from_bytes(frame).map_err(|e| TransportError::Decode(e.to_string()))
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncMessage::SyncStep1 { .. } => "sync_step1",
            SyncMessage::SyncStep2 { .. } => "sync_step2",
            SyncMessage::Update { .. } => "update",
        }
    }

    /// The delta carried by this message, if any.
    pub fn update(&self) -> Option<&[u8]> {
        match self {
            SyncMessage::SyncStep1 { .. } => None,
            SyncMessage::SyncStep2 { update } | SyncMessage::Update { update } => Some(update),
        }
    }
}
