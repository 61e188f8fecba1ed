//! The key-value store that persisted histories are written to.
//!
//! Keys are repository identities; values are whole encoded records. A `set`
//! always replaces the entire value.

use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

use super::file_store::FileSnapshotStore;
use super::redis_store::RedisSnapshotStore;

/// Errors talking to a snapshot store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error from the file store.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from the redis client.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// A blocking store task panicked or was cancelled.
    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// The store refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// A key-value store holding one encoded record per repository.
pub trait SnapshotStore: Send + Sync {
    /// Reads the record under `key`. A missing key is `Ok(None)`.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Replaces the record under `key`.
    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<()>> + Send;
}

/// In-process store. Nothing survives a restart.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    records: Arc<Mutex<HashMap<String, String>>>,
    unavailable: Arc<AtomicBool>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent operation fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store disabled".to_string()));
        }
        Ok(())
    }

    fn records(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a consistent map: every write is a single insert.
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SnapshotStore for MemorySnapshotStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.check_available()?;
        Ok(self.records().get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.check_available()?;
        self.records().insert(key.to_string(), value);
        Ok(())
    }
}

/// The store selected by configuration.
#[derive(Debug, Clone)]
pub enum AnyStore {
    File(FileSnapshotStore),
    Redis(RedisSnapshotStore),
    Memory(MemorySnapshotStore),
}

impl AnyStore {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AnyStore::File(_) => "file",
            AnyStore::Redis(_) => "redis",
            AnyStore::Memory(_) => "memory",
        }
    }
}

impl SnapshotStore for AnyStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self {
            AnyStore::File(store) => store.get(key).await,
            AnyStore::Redis(store) => store.get(key).await,
            AnyStore::Memory(store) => store.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        match self {
            AnyStore::File(store) => store.set(key, value).await,
            AnyStore::Redis(store) => store.set(key, value).await,
            AnyStore::Memory(store) => store.set(key, value).await,
        }
    }
}
