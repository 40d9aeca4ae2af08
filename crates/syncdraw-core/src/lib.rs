//! SyncDraw Core Library
//!
//! Replicated drawing document, eraser geometry, gesture handling and the
//! room sync client for the SyncDraw shared canvas.

pub mod config;
pub mod crdt;
pub mod error;
pub mod geometry;
pub mod selection;
pub mod session;
pub mod shapes;
pub mod sync;
pub mod tools;

pub use config::SyncConfig;
pub use crdt::{DrawingDocument, ObserverId};
pub use error::{DocumentError, DocumentResult, TransportError, TransportResult};
pub use selection::{EntityTransform, Selection};
pub use session::RoomSession;
pub use shapes::{Collection, Entity, EntityId, EntityIdGenerator, ShapeEntity, ShapeKind, Stroke};
pub use sync::{ConnectionState, MemoryTransport, NativeWebSocket, SyncMessage, Transport, TransportEvent};
pub use tools::{Draft, GestureController, ToolKind};
