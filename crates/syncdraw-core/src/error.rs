//! Error types.
//!
//! Concurrent edits are never errors, and an entity that is no longer live is
//! reported as `Ok(false)` by the document rather than as a failure.

use crate::shapes::Collection;
use loro::LoroError;
use thiserror::Error;

/// Errors raised by the replicated drawing document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("CRDT error: {0}")]
    Loro(#[from] LoroError),
    #[error("Failed to decode update: {0}")]
    Decode(String),
    #[error("Failed to encode update: {0}")]
    Encode(String),
    #[error("Entity belongs to {found}, expected {expected}")]
    WrongCollection {
        expected: Collection,
        found: Collection,
    },
}

/// Result type for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Errors raised by the sync transport and wire codec.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid WebSocket URL: {0}")]
    InvalidUrl(String),
    #[error("Already connected")]
    AlreadyConnected,
    #[error("Connection failed: {0}")]
    Connect(String),
    #[error("Send failed: {0}")]
    Send(String),
    #[error("Not connected")]
    Closed,
    #[error("Failed to encode message: {0}")]
    Encode(String),
    #[error("Failed to decode message: {0}")]
    Decode(String),
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
