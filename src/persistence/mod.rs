//! Persistence layer for the build grid.
//!
//! The in-memory windows are the source of truth. This module only writes
//! copies of them so that a restart does not lose the visible history.
//!
//! # Architecture
//!
//! - **Records**: one JSON object per repository, mapping day keys to
//!   buckets ([`snapshot`])
//! - **Stores**: a key-value [`SnapshotStore`] keyed by repository identity,
//!   backed by files, redis, or memory
//!
//! # Crash Safety
//!
//! Every write replaces a repository's whole record. The file store uses
//! write-to-temp-then-rename with fsync on both the file and the directory;
//! a redis `SET` is atomic on the server.
//!
//! # Module Structure
//!
//! - [`snapshot`]: record encoding and lenient decoding
//! - [`store`]: the store trait, its error type and the in-memory store
//! - [`file_store`]: one file per repository
//! - [`redis_store`]: one redis key per repository

pub mod file_store;
pub mod redis_store;
pub mod snapshot;
pub mod store;

pub use file_store::FileSnapshotStore;
pub use redis_store::RedisSnapshotStore;
pub use snapshot::{DecodedHistory, PersistedBucket, PersistedHistory, SnapshotError, decode_history};
pub use store::{AnyStore, MemorySnapshotStore, SnapshotStore, StoreError};
