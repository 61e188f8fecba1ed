//! Snapshot store backed by redis.
//!
//! Each repository's record is a plain string value under its identity, so
//! records written by earlier deployments of the dashboard are read as-is.

use redis::AsyncCommands;

use super::store::{Result, SnapshotStore};

#[derive(Debug, Clone)]
pub struct RedisSnapshotStore {
    client: redis::Client,
}

impl RedisSnapshotStore {
    /// Parses `url` (e.g. `redis://localhost:6379`). Does not connect.
    pub fn open(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        Ok(RedisSnapshotStore { client })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }
}

impl SnapshotStore for RedisSnapshotStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.set(key, value).await?;
        Ok(())
    }
}
