//! Queue and snapshot persistence collaborators.
//!
//! The watcher only needs a blocking pop on a named list and whole-hash
//! reads and writes keyed by snapshot name. Both are expressed as traits so
//! the ingestion loops receive their backend explicitly.

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;

pub mod redis;

/// Flat field-name to text-value representation of one snapshot.
pub type PersistedHash = HashMap<String, String>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),
    #[error("Call did not complete within {0:?}")]
    Timeout(Duration),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Pops the next message of `list`, waiting for one to arrive.
    ///
    /// Returns `Ok(None)` when the backend gave up waiting without data.
    async fn blocking_pop(&self, list: &str) -> Result<Option<Vec<u8>>, StoreError>;
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Reads the hash stored under `name`. A missing hash is an empty map.
    async fn read_hash(&self, name: &str) -> Result<PersistedHash, StoreError>;

    /// Replaces the hash stored under `name` with exactly `hash`.
    async fn write_hash(&self, name: &str, hash: &PersistedHash) -> Result<(), StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
