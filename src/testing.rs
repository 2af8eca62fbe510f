//! In-memory collaborators for exercising the watcher without Redis or a
//! webhook.

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::{
    alerts::{AlertError, AlertSink},
    store::{MessageQueue, PersistedHash, SnapshotStore, StoreError},
};

/// How long an empty [`MemoryQueue`] waits before reporting a pop timeout.
const POP_TIMEOUT: Duration = Duration::from_millis(50);
const WAIT_LIMIT: Duration = Duration::from_secs(5);

/// Wraps a snapshot JSON document into a queue envelope, with `message` as an
/// escaped string literal the way the log shipper sends it.
pub fn envelope(snapshot_json: &str) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "message": snapshot_json,
        "path": "/var/lib/docker/containers/abc123/abc123-json.log",
        "source_type": "docker_logs",
        "timestamp": "2024-03-01T12:00:00Z",
    }))
    .unwrap()
}

pub fn game_state_envelope(game_state_json: &str) -> Vec<u8> {
    envelope(&format!(
        r#"{{"data":{{"server_game_state":{game_state_json}}}}}"#
    ))
}

#[derive(Default)]
pub struct MemoryQueue {
    lists: Mutex<HashMap<String, VecDeque<Vec<u8>>>>,
    failing_pops: AtomicUsize,
    pushed: Notify,
}

impl MemoryQueue {
    pub fn push(&self, list: &str, message: Vec<u8>) {
        self.lists
            .lock()
            .unwrap()
            .entry(list.to_string())
            .or_default()
            .push_back(message);
        self.pushed.notify_waiters();
    }

    pub fn len(&self, list: &str) -> usize {
        self.lists
            .lock()
            .unwrap()
            .get(list)
            .map_or(0, VecDeque::len)
    }

    pub fn fail_next_pops(&self, count: usize) {
        self.failing_pops.store(count, Ordering::SeqCst);
    }

    fn try_pop(&self, list: &str) -> Option<Vec<u8>> {
        self.lists
            .lock()
            .unwrap()
            .get_mut(list)
            .and_then(VecDeque::pop_front)
    }
}

#[async_trait]
impl MessageQueue for MemoryQueue {
    async fn blocking_pop(&self, list: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let failing = self
            .failing_pops
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            return Err(StoreError::Unavailable("injected pop failure".to_string()));
        }

        let deadline = tokio::time::sleep(POP_TIMEOUT);
        tokio::pin!(deadline);
        loop {
            let pushed = self.pushed.notified();
            if let Some(message) = self.try_pop(list) {
                return Ok(Some(message));
            }
            tokio::select! {
                _ = pushed => {}
                _ = &mut deadline => return Ok(None),
            }
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    hashes: Mutex<HashMap<String, PersistedHash>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    written: Notify,
}

impl MemoryStore {
    pub fn seed(&self, name: &str, fields: &[(&str, &str)]) {
        let hash = fields
            .iter()
            .map(|(field, value)| (field.to_string(), value.to_string()))
            .collect();
        self.hashes.lock().unwrap().insert(name.to_string(), hash);
    }

    pub fn hash(&self, name: &str) -> PersistedHash {
        self.hashes
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Successful writes so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub async fn wait_for_writes(&self, count: usize) {
        loop {
            let written = self.written.notified();
            if self.writes() >= count {
                return;
            }
            tokio::time::timeout(WAIT_LIMIT, written)
                .await
                .unwrap_or_else(|_| panic!("store never reached {count} writes"));
        }
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn read_hash(&self, name: &str) -> Result<PersistedHash, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected read failure".to_string()));
        }
        Ok(self.hash(name))
    }

    async fn write_hash(&self, name: &str, hash: &PersistedHash) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "injected write failure".to_string(),
            ));
        }
        self.hashes
            .lock()
            .unwrap()
            .insert(name.to_string(), hash.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.written.notify_waiters();
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected ping failure".to_string()));
        }
        Ok(())
    }
}

#[derive(Default)]
enum SinkMode {
    #[default]
    Accept,
    /// Every attempt from this index on fails.
    FailFrom(usize),
    FailOnce,
    Stall,
}

/// Alert sink that remembers what it accepted.
#[derive(Default)]
pub struct RecordingSink {
    mode: SinkMode,
    sent: Mutex<Vec<String>>,
    attempts: AtomicUsize,
}

impl RecordingSink {
    pub fn failing_from(attempt: usize) -> Self {
        Self {
            mode: SinkMode::FailFrom(attempt),
            ..Default::default()
        }
    }

    pub fn failing_once() -> Self {
        Self {
            mode: SinkMode::FailOnce,
            ..Default::default()
        }
    }

    pub fn stalled() -> Self {
        Self {
            mode: SinkMode::Stall,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AlertSink for RecordingSink {
    async fn send(&self, text: &str) -> Result<(), AlertError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        let fail = match self.mode {
            SinkMode::Accept => false,
            SinkMode::FailFrom(from) => attempt >= from,
            SinkMode::FailOnce => attempt == 0,
            SinkMode::Stall => {
                std::future::pending::<()>().await;
                false
            }
        };
        if fail {
            return Err(AlertError::Status(reqwest::StatusCode::SERVICE_UNAVAILABLE));
        }
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }
}
