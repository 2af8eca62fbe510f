use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;

use super::{pipeline::Pipeline, snapshot::Snapshot};
use crate::store::MessageQueue;

/// Pause after a failed pop so an unreachable queue does not spin the loop.
const POP_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Consumes one queue list, one message at a time, until cancelled.
pub struct IngestionLoop<S> {
    list: String,
    queue: Arc<dyn MessageQueue>,
    pipeline: Pipeline<S>,
}

impl<S: Snapshot> IngestionLoop<S> {
    pub fn new(list: String, queue: Arc<dyn MessageQueue>, pipeline: Pipeline<S>) -> Self {
        Self {
            list,
            queue,
            pipeline,
        }
    }

    /// Runs until `cancel` fires. Cancellation is observed between pops: a
    /// pop in flight is awaited and whatever it returned is processed, so a
    /// popped message is never dropped. Shutdown therefore takes up to one
    /// pop timeout.
    pub async fn run(self, cancel: CancellationToken) {
        log::info!("Watching list {} for {}", self.list, S::HASH_NAME);

        while !cancel.is_cancelled() {
            match self.queue.blocking_pop(&self.list).await {
                Ok(Some(raw)) => match self.pipeline.process(&raw).await {
                    Ok(events) => log::debug!(
                        "Processed {} message from {} ({} changes)",
                        S::HASH_NAME,
                        self.list,
                        events.len()
                    ),
                    Err(e) => log::error!(
                        "Error processing {} message from {}: {e}",
                        S::HASH_NAME, self.list
                    ),
                },
                Ok(None) => log::debug!("No message on {}", self.list),
                Err(e) => {
                    log::error!("Error popping message from {}: {e}", self.list);
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(POP_ERROR_BACKOFF) => {}
                    }
                }
            }
        }

        log::info!("Stopped watching list {}", self.list);
    }
}
