use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Client, Pipeline, Value, aio::MultiplexedConnection};

use super::{MessageQueue, PersistedHash, SnapshotStore, StoreError};

/// Blocking list consumer.
///
/// BLPOP occupies the connection it runs on until it returns, so every
/// ingestion loop gets its own `RedisQueue` and hash traffic goes through a
/// separate [`RedisStore`].
pub struct RedisQueue {
    conn: MultiplexedConnection,
    pop_timeout: Duration,
}

impl RedisQueue {
    pub async fn connect(client: &Client, pop_timeout: Duration) -> Result<Self, StoreError> {
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn, pop_timeout })
    }
}

#[async_trait]
impl MessageQueue for RedisQueue {
    async fn blocking_pop(&self, list: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let mut conn = self.conn.clone();
        let reply: Value = conn.blpop(list, self.pop_timeout.as_secs_f64()).await?;
        popped_message(&reply)
    }
}

/// BLPOP answers `[list, message]`, or nil once the timeout expired.
fn popped_message(reply: &Value) -> Result<Option<Vec<u8>>, StoreError> {
    let popped: Option<(String, Vec<u8>)> = redis::from_redis_value(reply)?;
    Ok(popped.map(|(_, message)| message))
}

/// `MULTI; DEL name; HSET name f1 v1 ...; EXEC`, so readers never observe a
/// half written hash. An empty hash is only deleted.
fn replace_hash(name: &str, hash: &PersistedHash) -> Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic().del(name).ignore();
    if !hash.is_empty() {
        pipe.cmd("HSET").arg(name);
        for (field, value) in hash {
            pipe.arg(field).arg(value);
        }
        pipe.ignore();
    }
    pipe
}

#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl RedisStore {
    pub async fn connect(client: &Client) -> Result<Self, StoreError> {
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl SnapshotStore for RedisStore {
    async fn read_hash(&self, name: &str) -> Result<PersistedHash, StoreError> {
        let mut conn = self.conn.clone();
        let hash: PersistedHash = conn.hgetall(name).await?;
        Ok(hash)
    }

    async fn write_hash(&self, name: &str, hash: &PersistedHash) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = replace_hash(name, hash).query_async(&mut conn).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        if pong != "PONG" {
            return Err(StoreError::Unavailable(format!(
                "unexpected PING reply {pong:?}"
            )));
        }
        Ok(())
    }
}
