//! In-memory keyed cache with request coalescing
//!
//! Completed payloads are stored by key (an image URL). While a fetch for
//! a key is running, every further request for that key attaches to it
//! instead of starting another fetch; all of them receive the same result.
//!
//! ```text
//! slot A ─┐
//!         │                          fetch(key)
//! slot B ─┼──► KeyedAsyncCache ─────► (one task)
//!         │        │                     │
//! slot C ─┘        ▼                     ▼
//!            [A, B, C receive      Ready(payload)
//!             the same result]◄──────────┘
//! ```
//!
//! Failures are handed to the attached waiters and then forgotten, so the
//! next request for the key fetches again. Nothing is evicted here.

use bytes::Bytes;
use gallery_common::Result;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

/// Cache for image bytes keyed by URL
pub type ImageCache = KeyedAsyncCache<Bytes>;

enum Entry<V> {
    Ready(V),
    InFlight(broadcast::Sender<Result<V>>),
}

/// Counters for monitoring cache effectiveness
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Requests answered from a completed entry
    pub hits: u64,
    /// Requests that started a fetch
    pub misses: u64,
    /// Requests that attached to a running fetch
    pub coalesced: u64,
    /// Fetches that failed
    pub failures: u64,
}

struct Inner<V> {
    entries: HashMap<String, Entry<V>>,
    stats: CacheStats,
}

enum Claim<V> {
    Hit(V),
    Wait(broadcast::Receiver<Result<V>>),
    Lead(broadcast::Sender<Result<V>>),
}

pub struct KeyedAsyncCache<V> {
    inner: Mutex<Inner<V>>,
}

impl<V: Clone> Default for KeyedAsyncCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> KeyedAsyncCache<V> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                stats: CacheStats::default(),
            }),
        }
    }

    // The lock is never held across an await, so a poisoned map is still consistent
    fn lock(&self) -> MutexGuard<'_, Inner<V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Completed payload for `key`, without fetching
    pub fn get(&self, key: &str) -> Option<V> {
        match self.lock().entries.get(key) {
            Some(Entry::Ready(value)) => Some(value.clone()),
            _ => None,
        }
    }

    /// Check if a completed payload is cached
    pub fn contains(&self, key: &str) -> bool {
        matches!(self.lock().entries.get(key), Some(Entry::Ready(_)))
    }

    /// Check if a fetch for `key` is running
    pub fn is_in_flight(&self, key: &str) -> bool {
        matches!(self.lock().entries.get(key), Some(Entry::InFlight(_)))
    }

    /// Number of completed entries
    pub fn len(&self) -> usize {
        self.lock()
            .entries
            .values()
            .filter(|e| matches!(e, Entry::Ready(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }

    /// Drop the entry for `key`.
    ///
    /// A running fetch still delivers to its waiters but its result is
    /// not stored. Returns true if anything was removed.
    pub fn remove(&self, key: &str) -> bool {
        let removed = self.lock().entries.remove(key).is_some();
        if removed {
            log::debug!("Removed cache entry for {}", key);
        }
        removed
    }

    /// Drop every entry, completed or running
    pub fn clear(&self) {
        let mut inner = self.lock();
        log::debug!("Clearing {} cache entries", inner.entries.len());
        inner.entries.clear();
    }

    fn claim(&self, key: &str) -> Claim<V> {
        let mut inner = self.lock();
        let claim = match inner.entries.get(key) {
            Some(Entry::Ready(value)) => Claim::Hit(value.clone()),
            Some(Entry::InFlight(sender)) => Claim::Wait(sender.subscribe()),
            None => {
                // One send per channel, so capacity 1 never lags
                let (sender, _) = broadcast::channel(1);
                inner
                    .entries
                    .insert(key.to_string(), Entry::InFlight(sender.clone()));
                Claim::Lead(sender)
            }
        };
        match &claim {
            Claim::Hit(_) => inner.stats.hits += 1,
            Claim::Wait(_) => inner.stats.coalesced += 1,
            Claim::Lead(_) => inner.stats.misses += 1,
        }
        claim
    }

    /// Return the cached payload for `key`, or fetch it.
    ///
    /// Concurrent calls for the same key run `fetch` exactly once. Calls
    /// for different keys never wait on each other.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> Result<V>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        let sender = loop {
            match self.claim(key) {
                Claim::Hit(value) => {
                    log::debug!("Cache HIT for {}", key);
                    return Ok(value);
                }
                Claim::Wait(mut receiver) => {
                    log::debug!("Cache coalesced request for {}", key);
                    match receiver.recv().await {
                        Ok(result) => return result,
                        // Leader went away without a result; start over
                        Err(_) => continue,
                    }
                }
                Claim::Lead(sender) => break sender,
            }
        };

        log::debug!("Cache MISS for {}, fetching", key);
        let mut flight = Flight {
            cache: self,
            key,
            sender: Some(sender),
        };
        let result = fetch(key.to_string()).await;
        flight.finish(result.clone());
        result
    }
}

/// Owns the in-flight marker of one fetch. Dropping it before `finish`
/// (the fetching future was cancelled) clears the marker so that waiters
/// and later requests retry.
struct Flight<'a, V: Clone> {
    cache: &'a KeyedAsyncCache<V>,
    key: &'a str,
    sender: Option<broadcast::Sender<Result<V>>>,
}

impl<V: Clone> Flight<'_, V> {
    fn owns_marker(entry: Option<&Entry<V>>, sender: &broadcast::Sender<Result<V>>) -> bool {
        matches!(entry, Some(Entry::InFlight(current)) if current.same_channel(sender))
    }

    fn finish(&mut self, result: Result<V>) {
        let Some(sender) = self.sender.take() else {
            return;
        };
        {
            let mut inner = self.cache.lock();
            let owned = Self::owns_marker(inner.entries.get(self.key), &sender);
            match &result {
                Ok(value) if owned => {
                    inner
                        .entries
                        .insert(self.key.to_string(), Entry::Ready(value.clone()));
                }
                Ok(_) => {
                    log::debug!("Entry for {} invalidated during fetch, not storing", self.key);
                }
                Err(kind) => {
                    inner.stats.failures += 1;
                    if owned {
                        inner.entries.remove(self.key);
                    }
                    log::warn!("Fetch for {} failed: {}", self.key, kind);
                }
            }
        }
        // Receivers may all be gone already
        let _ = sender.send(result);
    }
}

impl<V: Clone> Drop for Flight<'_, V> {
    fn drop(&mut self) {
        if let Some(sender) = self.sender.take() {
            let mut inner = self.cache.lock();
            if Self::owns_marker(inner.entries.get(self.key), &sender) {
                inner.entries.remove(self.key);
            }
            log::debug!("Fetch for {} abandoned", self.key);
        }
    }
}

#[cfg(test)]
#[path = "image_cache_tests.rs"]
mod tests;
