//! Cache manager: the single entry point the rest of the application
//! talks to.
//!
//! Wraps the [`CacheStore`](crate::store::CacheStore) with:
//! - TTL-aware reads (lazy expiry: a stale entry reads as a miss but is
//!   not deleted)
//! - Typed get/set that handle JSON conversion at the boundary
//! - [`get_or_fetch`](CacheManager::get_or_fetch), which memoizes an
//!   async operation so at most one underlying call per key runs at a
//!   time, with everyone else waiting for its result
//! - Hit/miss/fetch counters for the stats surface
//!
//! ## Coalescing
//!
//! `get_or_fetch` keeps a table of in-flight locks keyed by
//! `namespace:key`. The first caller to miss takes the key's lock and
//! runs the fetch; concurrent callers for the same key block on that
//! lock (bounded by `lock_timeout`), then re-check the cache and find
//! the freshly stored value. Locks are created lazily and removed when
//! the last interested caller releases them, so the table tracks only
//! keys with active traffic.
//!
//! Fetch failures propagate to the caller and are never cached: the next
//! caller retries the underlying operation.

use crate::config::CacheConfig;
use crate::entry::CacheEntry;
use crate::error::{CacheError, Result};
use crate::store::{CacheStore, NamespaceStats};
use chrono::Utc;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Lookup and fetch counters, updated with relaxed ordering since they
/// only feed diagnostics
#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    expired: AtomicU64,
    fetches: AtomicU64,
    fetch_errors: AtomicU64,
}

/// Point-in-time snapshot of cache activity
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Misses caused by an entry being present but past its TTL
    pub expired_misses: u64,
    /// Underlying fetches actually executed by `get_or_fetch`
    pub fetches: u64,
    pub fetch_errors: u64,
    /// Coalescing locks currently tracked
    pub in_flight_locks: usize,
    pub namespaces: Vec<NamespaceStats>,
    pub cache_dir: PathBuf,
}

/// Thread-safe, TTL-aware cache front end.
///
/// One instance is created at startup and shared behind an `Arc`; all
/// request handling goes through it.
pub struct CacheManager {
    store: CacheStore,
    config: CacheConfig,
    /// One coalescing lock per key with in-flight traffic
    in_flight: DashMap<String, Arc<Mutex<()>>>,
    counters: Counters,
}

impl CacheManager {
    /// Open the backing store and wire up the manager.
    pub fn open(config: CacheConfig) -> Result<Self> {
        let store = CacheStore::open(&config.cache_dir)?;
        info!(
            "Cache manager ready at {} (default ttl {}s)",
            config.cache_dir.display(),
            config.default_ttl_seconds
        );
        Ok(Self {
            store,
            config,
            in_flight: DashMap::new(),
            counters: Counters::default(),
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// TTL-aware read. Returns the raw JSON value if a fresh entry
    /// exists.
    ///
    /// An expired entry counts as a miss but stays on disk until a
    /// write replaces it or a cleanup pass removes it.
    pub fn get(&self, namespace: &str, key: &str) -> Option<Value> {
        match self.store.get(namespace, key) {
            Some(entry) if entry.is_fresh(Utc::now()) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                debug!("cache hit: {}:{}", namespace, key);
                Some(entry.value)
            }
            Some(_) => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                self.counters.expired.fetch_add(1, Ordering::Relaxed);
                debug!("cache miss (expired): {}:{}", namespace, key);
                None
            }
            None => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                debug!("cache miss: {}:{}", namespace, key);
                None
            }
        }
    }

    /// Typed read. A fresh entry that no longer deserializes as `T`
    /// (e.g. the stored shape changed between releases) reads as a miss.
    pub fn get_as<T: DeserializeOwned>(&self, namespace: &str, key: &str) -> Option<T> {
        let value = self.get(namespace, key)?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                debug!(
                    "cached value for {}:{} no longer matches expected shape: {}",
                    namespace, key, e
                );
                None
            }
        }
    }

    /// Raw entry peek ignoring freshness. For diagnostics only.
    pub fn get_entry(&self, namespace: &str, key: &str) -> Option<CacheEntry> {
        self.store.get(namespace, key)
    }

    /// Store a value under the namespace's configured TTL.
    pub async fn set<T: Serialize>(&self, namespace: &str, key: &str, value: &T) -> Result<()> {
        let ttl = self.config.ttl_for(namespace);
        self.set_with_ttl(namespace, key, value, ttl).await
    }

    /// Store a value with an explicit TTL, persisting before returning.
    pub async fn set_with_ttl<T: Serialize>(
        &self,
        namespace: &str,
        key: &str,
        value: &T,
        ttl_seconds: u64,
    ) -> Result<()> {
        let value = serde_json::to_value(value).map_err(|source| CacheError::Serialization {
            namespace: namespace.to_string(),
            source,
        })?;
        let entry = CacheEntry::new(value, ttl_seconds);
        self.store.insert(namespace, key, entry).await?;
        debug!("cache set: {}:{} (ttl {}s)", namespace, key, ttl_seconds);
        Ok(())
    }

    /// Remove one entry. Returns whether it existed.
    pub async fn invalidate(&self, namespace: &str, key: &str) -> Result<bool> {
        let removed = self.store.remove(namespace, key).await?;
        if removed {
            info!("Invalidated {}:{}", namespace, key);
        }
        Ok(removed)
    }

    /// Drop every entry in a namespace. Returns how many were removed.
    pub async fn clear_namespace(&self, namespace: &str) -> Result<usize> {
        let removed = self.store.clear(namespace).await?;
        info!("Cleared namespace '{}' ({} entries)", namespace, removed);
        Ok(removed)
    }

    /// Physically delete expired entries across all namespaces.
    pub async fn purge_expired(&self) -> Result<usize> {
        let removed = self.store.purge_expired(Utc::now()).await?;
        if removed > 0 {
            info!("Purged {} expired cache entries", removed);
        }
        Ok(removed)
    }

    /// Memoized fetch using the namespace's configured TTL.
    ///
    /// See [`get_or_fetch_with_ttl`](Self::get_or_fetch_with_ttl).
    pub async fn get_or_fetch<T, F, Fut>(&self, namespace: &str, key: &str, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        self.get_or_fetch_with_ttl(namespace, key, None, fetch).await
    }

    /// Memoized fetch: return the cached value if fresh, otherwise run
    /// `fetch` exactly once across all concurrent callers of this key
    /// and cache its result.
    ///
    /// - A concurrent caller waits for the in-flight fetch (up to
    ///   `lock_timeout`) and then reads the stored result instead of
    ///   fetching again
    /// - The fetch itself is bounded by `fetch_timeout`
    /// - Errors and timeouts propagate to the caller and nothing is
    ///   cached, so the next caller retries
    /// - If the fetch succeeds but persisting fails, the value is still
    ///   returned; the cache degrades to a miss next time
    pub async fn get_or_fetch_with_ttl<T, F, Fut>(
        &self,
        namespace: &str,
        key: &str,
        ttl_seconds: Option<u64>,
        fetch: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        // Fast path: fresh value already stored
        if let Some(value) = self.get_as(namespace, key) {
            return Ok(value);
        }

        let slot = format!("{}:{}", namespace, key);
        let lock = self
            .in_flight
            .entry(slot.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let outcome = match timeout(self.config.lock_timeout, lock.lock()).await {
            Err(_) => {
                let waited = self.config.lock_timeout.as_secs();
                warn!("Gave up waiting {}s for in-flight fetch of {}", waited, slot);
                Err(CacheError::LockTimeout {
                    key: slot.clone(),
                    waited_seconds: waited,
                })
            }
            // Double check: whoever held the lock before us probably
            // stored the value we wanted
            Ok(guard) => {
                if let Some(value) = self.get_as(namespace, key) {
                    drop(guard);
                    Ok(value)
                } else {
                    debug!("cache call: {} (fetching)", slot);
                    self.counters.fetches.fetch_add(1, Ordering::Relaxed);
                    let started = Instant::now();

                    let result = match timeout(self.config.fetch_timeout, fetch()).await {
                        Ok(Ok(value)) => {
                            debug!(
                                "cache call: {} took {:.3}s",
                                slot,
                                started.elapsed().as_secs_f64()
                            );
                            let ttl = ttl_seconds.unwrap_or_else(|| self.config.ttl_for(namespace));
                            if let Err(e) = self.set_with_ttl(namespace, key, &value, ttl).await {
                                // Serving the value matters more than
                                // remembering it
                                warn!("Failed to persist {}: {}", slot, e);
                            }
                            Ok(value)
                        }
                        Ok(Err(source)) => {
                            self.counters.fetch_errors.fetch_add(1, Ordering::Relaxed);
                            Err(CacheError::Fetch { key: slot.clone(), source })
                        }
                        Err(_) => {
                            self.counters.fetch_errors.fetch_add(1, Ordering::Relaxed);
                            Err(CacheError::FetchTimeout {
                                key: slot.clone(),
                                timeout_seconds: self.config.fetch_timeout.as_secs(),
                            })
                        }
                    };

                    drop(guard);
                    result
                }
            }
        };

        // Our own clone has to go before the sweep so the count reflects
        // only the table entry and any still-waiting tasks
        drop(lock);
        self.release_slot(&slot);
        outcome
    }

    /// Drop a coalescing lock once nobody is using it.
    ///
    /// Every caller drops its own clone of the lock's `Arc` before
    /// calling this, so a count above one means another task still
    /// holds or waits on the lock.
    fn release_slot(&self, slot: &str) {
        self.in_flight
            .remove_if(slot, |_, lock| Arc::strong_count(lock) <= 1);
    }

    /// Snapshot of counters and per-namespace entry counts.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            expired_misses: self.counters.expired.load(Ordering::Relaxed),
            fetches: self.counters.fetches.load(Ordering::Relaxed),
            fetch_errors: self.counters.fetch_errors.load(Ordering::Relaxed),
            in_flight_locks: self.in_flight.len(),
            namespaces: self.store.namespace_stats(Utc::now()),
            cache_dir: self.store.cache_dir().to_path_buf(),
        }
    }

    /// Where a namespace's document lives. For the CLI stats display.
    pub fn document_path(&self, namespace: &str) -> PathBuf {
        self.store.document_path(namespace)
    }
}
