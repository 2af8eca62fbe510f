use crate::{alerts::AlertError, store::StoreError};

pub use super::normalize::NormalizeError;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Unable to decode envelope: {0}")]
    Envelope(serde_json::Error),
    #[error("Unable to decode snapshot: {0}")]
    Snapshot(serde_json::Error),
    #[error("Snapshot is missing `{0}`")]
    MissingStructure(&'static str),
}

/// Why one queue message could not be fully processed.
///
/// None of these stop an ingestion loop; the message is logged and dropped.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("Normalize error: {0}")]
    Normalize(#[from] NormalizeError),
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("Unable to read previous snapshot: {0}")]
    DiffRead(StoreError),
    #[error("Unable to send alert: {0}")]
    Alert(#[from] AlertError),
    #[error("Unable to persist snapshot: {0}")]
    Persist(StoreError),
}
