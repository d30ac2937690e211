//! Lookup cache
//!
//! A small key/value side channel for hot node and edge lookups. The
//! engine treats cache writes as best-effort: failures are logged and
//! never fail the calling operation.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// TTL'd string cache for serialized graph entities
pub trait LookupCache: Send + Sync {
    fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    /// Returns `None` for missing or expired keys
    fn get(&self, key: &str) -> CacheResult<Option<String>>;
}

/// Process-local [`LookupCache`]
///
/// Expired entries are dropped lazily on read.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LookupCache for MemoryCache {
    fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        match entries.get(key) {
            Some((value, expires_at)) if *expires_at > Instant::now() => {
                Ok(Some(value.clone()))
            }
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }
}
