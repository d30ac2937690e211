//! Durable storage and caching

pub mod cache;
pub mod storage;

pub use cache::{CacheError, CacheResult, LookupCache, MemoryCache};
pub use storage::{
    BatchOp, DurableStore, GraphSnapshot, RocksStore, StorageError, StorageResult,
};
