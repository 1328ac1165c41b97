//! Disk-backed namespace documents.
//!
//! Each namespace is one JSON document at `<cache_dir>/<namespace>.json`
//! mapping key -> entry. The whole directory is read into memory when the
//! store opens; every mutation rewrites the owning namespace's document
//! before returning (write-through), so the cache survives process
//! restarts without any shutdown hook.
//!
//! Concurrency rules:
//! - Reads never touch disk and never block other reads
//! - Writes to one namespace document are serialized by that namespace's
//!   async write lock; writes to different namespaces proceed in parallel
//! - A read racing a write on the same key may see either value
//!
//! A corrupt document is never fatal: the namespace loads as empty with a
//! logged warning and heals on the next write.

use crate::entry::CacheEntry;
use crate::error::{CacheError, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// In-memory state for one namespace
struct Namespace {
    /// Live entries, keyed uniquely within this namespace
    entries: DashMap<String, CacheEntry>,
    /// Serializes document writes so the file is never torn by
    /// concurrent sets
    write_lock: Mutex<()>,
}

impl Namespace {
    fn empty() -> Self {
        Self {
            entries: DashMap::new(),
            write_lock: Mutex::new(()),
        }
    }

    fn from_entries(entries: HashMap<String, CacheEntry>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
            write_lock: Mutex::new(()),
        }
    }
}

/// Per-namespace entry counts for stats reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceStats {
    pub name: String,
    /// Entries physically present in the document
    pub total_entries: usize,
    /// Of those, how many are past their TTL and awaiting cleanup
    pub expired_entries: usize,
}

/// Persistent key-value store partitioned into namespaces.
pub struct CacheStore {
    cache_dir: PathBuf,
    namespaces: DashMap<String, Arc<Namespace>>,
}

impl CacheStore {
    /// Open the store, creating `cache_dir` if needed and loading every
    /// existing namespace document.
    ///
    /// Documents are parsed in parallel since they are independent files.
    pub fn open(cache_dir: impl Into<PathBuf>) -> Result<Self> {
        let cache_dir = cache_dir.into();
        std::fs::create_dir_all(&cache_dir)?;

        let mut document_paths = Vec::new();
        for dir_entry in std::fs::read_dir(&cache_dir)? {
            let path = dir_entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                document_paths.push(path);
            }
        }

        let loaded: Vec<(String, HashMap<String, CacheEntry>)> = document_paths
            .par_iter()
            .filter_map(|path| {
                let name = path.file_stem()?.to_string_lossy().into_owned();
                Some((name, load_document(path)))
            })
            .collect();

        let namespaces = DashMap::new();
        let mut total = 0;
        for (name, entries) in loaded {
            total += entries.len();
            namespaces.insert(name, Arc::new(Namespace::from_entries(entries)));
        }

        info!(
            "Opened cache store at {} ({} namespaces, {} entries)",
            cache_dir.display(),
            namespaces.len(),
            total
        );

        Ok(Self {
            cache_dir,
            namespaces,
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Where a namespace's document lives on disk
    pub fn document_path(&self, namespace: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", document_name(namespace)))
    }

    /// Raw entry lookup. No freshness check, no disk I/O, never deletes.
    pub fn get(&self, namespace: &str, key: &str) -> Option<CacheEntry> {
        let ns = self.namespaces.get(namespace)?;
        let entry = ns.entries.get(key)?.clone();
        Some(entry)
    }

    /// Insert or overwrite an entry and persist the namespace document
    /// before returning.
    pub async fn insert(&self, namespace: &str, key: &str, entry: CacheEntry) -> Result<()> {
        let ns = self.namespace(namespace);
        let _guard = ns.write_lock.lock().await;
        ns.entries.insert(key.to_string(), entry);
        self.persist(namespace, &ns).await
    }

    /// Remove an entry, persisting if anything changed. Returns whether
    /// the key was present.
    pub async fn remove(&self, namespace: &str, key: &str) -> Result<bool> {
        let Some(ns) = self.existing(namespace) else {
            return Ok(false);
        };
        let _guard = ns.write_lock.lock().await;
        let removed = ns.entries.remove(key).is_some();
        if removed {
            self.persist(namespace, &ns).await?;
        }
        Ok(removed)
    }

    /// Drop every entry in a namespace. Returns how many were removed.
    pub async fn clear(&self, namespace: &str) -> Result<usize> {
        let Some(ns) = self.existing(namespace) else {
            return Ok(0);
        };
        let _guard = ns.write_lock.lock().await;
        let removed = ns.entries.len();
        ns.entries.clear();
        self.persist(namespace, &ns).await?;
        Ok(removed)
    }

    /// Physically remove every expired entry across all namespaces.
    ///
    /// This is the only path that deletes on expiry; regular reads leave
    /// stale entries in place.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let snapshot: Vec<(String, Arc<Namespace>)> = self
            .namespaces
            .iter()
            .map(|kv| (kv.key().clone(), kv.value().clone()))
            .collect();

        let mut removed = 0;
        for (name, ns) in snapshot {
            let _guard = ns.write_lock.lock().await;
            let expired: Vec<String> = ns
                .entries
                .iter()
                .filter(|kv| kv.value().is_expired(now))
                .map(|kv| kv.key().clone())
                .collect();

            if expired.is_empty() {
                continue;
            }
            for key in &expired {
                ns.entries.remove(key);
            }
            self.persist(&name, &ns).await?;
            debug!("Purged {} expired entries from '{}'", expired.len(), name);
            removed += expired.len();
        }

        Ok(removed)
    }

    /// Entry counts per namespace, sorted by name
    pub fn namespace_stats(&self, now: DateTime<Utc>) -> Vec<NamespaceStats> {
        let mut stats: Vec<NamespaceStats> = self
            .namespaces
            .iter()
            .map(|kv| {
                let expired = kv
                    .value()
                    .entries
                    .iter()
                    .filter(|entry| entry.value().is_expired(now))
                    .count();
                NamespaceStats {
                    name: kv.key().clone(),
                    total_entries: kv.value().entries.len(),
                    expired_entries: expired,
                }
            })
            .collect();
        stats.sort_by(|a, b| a.name.cmp(&b.name));
        stats
    }

    /// Get or lazily create a namespace.
    ///
    /// Returns an owned Arc so no map guard is held across awaits.
    fn namespace(&self, name: &str) -> Arc<Namespace> {
        if let Some(existing) = self.namespaces.get(name) {
            return existing.clone();
        }
        self.namespaces
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Namespace::empty()))
            .clone()
    }

    fn existing(&self, name: &str) -> Option<Arc<Namespace>> {
        self.namespaces.get(name).map(|ns| ns.clone())
    }

    /// Write a namespace's document. Caller must hold the namespace's
    /// write lock.
    ///
    /// The document is written to a sibling temp file and renamed into
    /// place, so a crash mid-write leaves the previous document intact.
    async fn persist(&self, name: &str, ns: &Namespace) -> Result<()> {
        let snapshot: HashMap<String, CacheEntry> = ns
            .entries
            .iter()
            .map(|kv| (kv.key().clone(), kv.value().clone()))
            .collect();

        let json = serde_json::to_vec_pretty(&snapshot).map_err(|source| {
            CacheError::Serialization {
                namespace: name.to_string(),
                source,
            }
        })?;

        let path = self.document_path(name);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!(
            "Persisted {} entries to {}",
            snapshot.len(),
            path.display()
        );
        Ok(())
    }
}

/// Load one namespace document, degrading to empty on any failure
fn load_document(path: &Path) -> HashMap<String, CacheEntry> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Could not read cache document {}: {}", path.display(), e);
            return HashMap::new();
        }
    };

    match serde_json::from_str::<HashMap<String, CacheEntry>>(&raw) {
        Ok(entries) => {
            debug!(
                "Loaded {} entries from {}",
                entries.len(),
                path.display()
            );
            entries
        }
        Err(e) => {
            // Treat the namespace as empty rather than failing startup;
            // the next write replaces the corrupt document
            warn!(
                "Corrupt cache document {} ({}); starting namespace empty",
                path.display(),
                e
            );
            HashMap::new()
        }
    }
}

/// File-safe rendition of a namespace name
fn document_name(namespace: &str) -> String {
    namespace
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> CacheStore {
        CacheStore::open(dir.path()).expect("store should open")
    }

    #[tokio::test]
    async fn test_insert_then_get() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let entry = CacheEntry::new(json!([{"title": "Dune"}]), 60);
        store
            .insert("api_cache", "movies:genre=sci-fi", entry.clone())
            .await
            .unwrap();

        let loaded = store.get("api_cache", "movies:genre=sci-fi").unwrap();
        assert_eq!(loaded.value, entry.value);
        assert_eq!(loaded.ttl_seconds, 60);
    }

    #[tokio::test]
    async fn test_insert_is_write_through() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        store
            .insert("api_cache", "k", CacheEntry::new(json!(1), 60))
            .await
            .unwrap();

        // The document must exist on disk before insert returns
        let path = store.document_path("api_cache");
        assert!(path.exists(), "document should be written through");

        let raw = std::fs::read_to_string(&path).unwrap();
        let doc: HashMap<String, CacheEntry> = serde_json::from_str(&raw).unwrap();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc["k"].value, json!(1));
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = open_store(&dir);
            store
                .insert("api_cache", "k1", CacheEntry::new(json!("a"), 60))
                .await
                .unwrap();
            store
                .insert("rating_cache", "movie:dune", CacheEntry::new(json!(8.1), 60))
                .await
                .unwrap();
        }

        let reopened = open_store(&dir);
        assert_eq!(reopened.get("api_cache", "k1").unwrap().value, json!("a"));
        assert_eq!(
            reopened.get("rating_cache", "movie:dune").unwrap().value,
            json!(8.1)
        );
    }

    #[tokio::test]
    async fn test_corrupt_document_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("api_cache.json"), "{not valid json").unwrap();

        let store = open_store(&dir);
        assert!(store.get("api_cache", "anything").is_none());

        // The namespace heals on the next write
        store
            .insert("api_cache", "k", CacheEntry::new(json!(2), 60))
            .await
            .unwrap();
        assert_eq!(store.get("api_cache", "k").unwrap().value, json!(2));
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        store
            .insert("ns", "a", CacheEntry::new(json!(1), 60))
            .await
            .unwrap();
        store
            .insert("ns", "b", CacheEntry::new(json!(2), 60))
            .await
            .unwrap();

        assert!(store.remove("ns", "a").await.unwrap());
        assert!(!store.remove("ns", "a").await.unwrap(), "already gone");
        assert!(!store.remove("other", "a").await.unwrap(), "no namespace");

        assert_eq!(store.clear("ns").await.unwrap(), 1);
        assert!(store.get("ns", "b").is_none());
    }

    #[tokio::test]
    async fn test_purge_removes_only_expired() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        store
            .insert("ns", "fresh", CacheEntry::new(json!(1), 3600))
            .await
            .unwrap();
        store
            .insert("ns", "stale", CacheEntry::new(json!(2), 0))
            .await
            .unwrap();

        let removed = store.purge_expired(Utc::now()).await.unwrap();
        assert_eq!(removed, 1);
        assert!(store.get("ns", "fresh").is_some());
        assert!(store.get("ns", "stale").is_none());

        // Purge persisted the change
        let raw = std::fs::read_to_string(store.document_path("ns")).unwrap();
        assert!(!raw.contains("stale"));
    }

    #[tokio::test]
    async fn test_namespace_stats_counts_expired() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        store
            .insert("ns", "fresh", CacheEntry::new(json!(1), 3600))
            .await
            .unwrap();
        store
            .insert("ns", "stale", CacheEntry::new(json!(2), 0))
            .await
            .unwrap();

        let stats = store.namespace_stats(Utc::now());
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].name, "ns");
        assert_eq!(stats[0].total_entries, 2);
        assert_eq!(stats[0].expired_entries, 1);
    }

    #[tokio::test]
    async fn test_concurrent_sets_to_one_namespace_lose_nothing() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(open_store(&dir));

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .insert("ns", &format!("key-{}", i), CacheEntry::new(json!(i), 60))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // Every key present in memory and in the final document
        let raw = std::fs::read_to_string(store.document_path("ns")).unwrap();
        let doc: HashMap<String, CacheEntry> = serde_json::from_str(&raw).unwrap();
        assert_eq!(doc.len(), 16);
        for i in 0..16 {
            assert!(store.get("ns", &format!("key-{}", i)).is_some());
        }
    }

    #[test]
    fn test_document_name_sanitizes_separators() {
        assert_eq!(document_name("api_cache"), "api_cache");
        assert_eq!(document_name("a/b\\c"), "a_b_c");
    }
}
