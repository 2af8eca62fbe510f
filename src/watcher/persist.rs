use std::time::Duration;

use super::snapshot::Snapshot;
use crate::store::{SnapshotStore, StoreError};

/// Replaces the stored hash of `S` with every field of `snapshot`.
pub async fn persist<S: Snapshot>(
    store: &dyn SnapshotStore,
    snapshot: &S,
    timeout: Duration,
) -> Result<(), StoreError> {
    let hash = snapshot.to_hash();
    let write = store.write_hash(S::HASH_NAME, &hash);
    match tokio::time::timeout(timeout, write).await {
        Ok(res) => res,
        Err(_) => Err(StoreError::Timeout(timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;
    use crate::watcher::model::ContainerSnapshot;

    #[tokio::test]
    async fn test_overwrites_whole_hash() {
        let store = MemoryStore::default();
        store.seed(
            "docker_info",
            &[("State", "exited"), ("Stale", "left over")],
        );
        let snapshot = ContainerSnapshot {
            state: "running".to_string(),
            ..Default::default()
        };

        persist(&store, &snapshot, Duration::from_secs(1)).await.unwrap();

        let stored = store.hash("docker_info");
        assert_eq!(stored, snapshot.to_hash());
        assert!(!stored.contains_key("Stale"));
    }

    #[tokio::test]
    async fn test_write_failure_keeps_previous_hash() {
        let store = MemoryStore::default();
        store.seed("docker_info", &[("State", "exited")]);
        store.fail_writes();

        let res = persist(
            &store,
            &ContainerSnapshot::default(),
            Duration::from_secs(1),
        )
        .await;

        assert!(matches!(res, Err(StoreError::Unavailable(_))), "{:?}", res);
        assert_eq!(store.hash("docker_info")["State"], "exited");
    }
}
