//! Room registry.
//!
//! Each room keeps its own replica of the drawing document so it can answer
//! `SyncStep1` from new or reconnecting peers with exactly the operations
//! they are missing. A room disappears with its last peer.

use bytes::Bytes;
use dashmap::DashMap;
use serde::Serialize;
use std::collections::HashSet;
use syncdraw_core::{DrawingDocument, SyncMessage, TransportResult};
use tokio::sync::broadcast;
use uuid::Uuid;

const CHANNEL_CAPACITY: usize = 256;

/// Connection-scoped peer id.
pub type PeerId = Uuid;

/// A frame broadcast to a room, tagged with the peer it came from.
pub type RoomFrame = (PeerId, Bytes);

/// Room state
struct Room {
    /// Broadcast channel for this room
    tx: broadcast::Sender<RoomFrame>,
    /// Connected peer IDs
    peers: HashSet<PeerId>,
    /// Merged state of everything relayed so far
    replica: DrawingDocument,
}

impl Room {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            peers: HashSet::new(),
            replica: DrawingDocument::new(),
        }
    }
}

/// Occupancy of one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomStats {
    pub room: String,
    pub peers: usize,
}

/// Active rooms
#[derive(Default)]
pub struct RoomRegistry {
    rooms: DashMap<String, Room>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peer to a room, creating it if needed.
    ///
    /// Returns the room's broadcast receiver and the `SyncStep1` frame to
    /// greet the peer with.
    pub fn join(
        &self,
        room_id: &str,
        peer: PeerId,
    ) -> TransportResult<(broadcast::Receiver<RoomFrame>, Bytes)> {
        let mut room = self.rooms.entry(room_id.to_string()).or_insert_with(Room::new);
        room.peers.insert(peer);
        let rx = room.tx.subscribe();
        let hello = SyncMessage::SyncStep1 {
            version: room.replica.encoded_version(),
        }
        .encode()?;
        Ok((rx, Bytes::from(hello)))
    }

    /// Remove a peer from a room. Empty rooms are dropped.
    pub fn leave(&self, room_id: &str, peer: PeerId) {
        self.rooms.remove_if_mut(room_id, |_, room| {
            room.peers.remove(&peer);
            room.peers.is_empty()
        });
    }

    /// Handle one frame from a peer.
    ///
    /// `SyncStep1` is answered with the reply frame returned here. Deltas are
    /// merged into the room replica, and whatever they added is broadcast to
    /// the room as an `Update`.
    pub fn apply(&self, room_id: &str, peer: PeerId, frame: &[u8]) -> TransportResult<Option<Bytes>> {
        let message = SyncMessage::decode(frame)?;
        let Some(mut room) = self.rooms.get_mut(room_id) else {
            return Ok(None);
        };

        match message {
            SyncMessage::SyncStep1 { version } => {
                let update = room.replica.export_since(&version)?;
                let reply = SyncMessage::SyncStep2 { update }.encode()?;
                Ok(Some(Bytes::from(reply)))
            }
            SyncMessage::SyncStep2 { update } | SyncMessage::Update { update } => {
                let before = room.replica.version();
                if room.replica.import(&update)? {
                    let delta = room.replica.export_updates(&before)?;
                    let frame = SyncMessage::Update { update: delta }.encode()?;
                    // No receivers is fine: the sender may be alone in the room
                    let _ = room.tx.send((peer, Bytes::from(frame)));
                }
                Ok(None)
            }
        }
    }

    /// A `SyncStep2` frame carrying the whole room state.
    pub fn full_state(&self, room_id: &str) -> TransportResult<Option<Bytes>> {
        let Some(room) = self.rooms.get(room_id) else {
            return Ok(None);
        };
        let update = room.replica.export_all()?;
        Ok(Some(Bytes::from(SyncMessage::SyncStep2 { update }.encode()?)))
    }

    /// Occupancy of every room, sorted by name.
    pub fn stats(&self) -> Vec<RoomStats> {
        let mut stats: Vec<RoomStats> = self
            .rooms
            .iter()
            .map(|entry| RoomStats {
                room: entry.key().clone(),
                peers: entry.value().peers.len(),
            })
            .collect();
        stats.sort_by(|a, b| a.room.cmp(&b.room));
        stats
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
