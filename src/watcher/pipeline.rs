use std::{marker::PhantomData, sync::Arc, time::Duration};

use super::{
    alert,
    diff::{self, ChangeEvent},
    error::{DecodeError, WatchError},
    model::Envelope,
    normalize::normalize,
    persist,
    snapshot::Snapshot,
};
use crate::{
    alerts::AlertSink,
    store::{PersistedHash, SnapshotStore, StoreError},
};

/// Everything that happens to one queue message of a snapshot type `S`.
pub struct Pipeline<S> {
    store: Arc<dyn SnapshotStore>,
    alerts: Arc<dyn AlertSink>,
    call_timeout: Duration,
    snapshot: PhantomData<fn() -> S>,
}

impl<S: Snapshot> Pipeline<S> {
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        alerts: Arc<dyn AlertSink>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            store,
            alerts,
            call_timeout,
            snapshot: PhantomData,
        }
    }

    /// Decodes `raw`, alerts on watched changes and stores the new snapshot.
    ///
    /// The store is only written after every alert was accepted. Returns the
    /// changes that were alerted.
    pub async fn process(&self, raw: &[u8]) -> Result<Vec<ChangeEvent>, WatchError> {
        let envelope: Envelope = serde_json::from_slice(raw).map_err(DecodeError::Envelope)?;
        log::debug!(
            "Processing {} message from {:?} ({}) shipped at {:?}",
            S::HASH_NAME, envelope.path, envelope.source_type, envelope.timestamp
        );

        let payload = normalize(envelope.message.get().as_bytes())?;
        let snapshot = S::decode(&payload)?;

        let previous = self.read_previous().await.map_err(WatchError::DiffRead)?;
        let events = diff::diff(&snapshot, &previous);

        alert::dispatch(self.alerts.as_ref(), &events, self.call_timeout).await?;

        persist::persist(self.store.as_ref(), &snapshot, self.call_timeout)
            .await
            .map_err(WatchError::Persist)?;

        Ok(events)
    }

    async fn read_previous(&self) -> Result<PersistedHash, StoreError> {
        let read = self.store.read_hash(S::HASH_NAME);
        match tokio::time::timeout(self.call_timeout, read).await {
            Ok(res) => res,
            Err(_) => Err(StoreError::Timeout(self.call_timeout)),
        }
    }
}
