//! Background cache warming.
//!
//! The warmer pre-fills the cache for requests users are likely to make
//! next (popular genres, or seeds from configuration). Each seed runs
//! as a spawned task through [`MediaService::discover`], the same
//! coalesced, cached path live requests use, so a warm entry is
//! indistinguishable from one a user request created, and a warm racing
//! a live request coalesces into one upstream fetch instead of two.
//!
//! Warming is strictly best effort: callers never wait on it (except
//! tests and the CLI via [`CacheWarmer::wait`]), failures are logged
//! and swallowed, and [`CacheWarmer::shutdown`] abandons whatever is
//! still running.

use crate::service::MediaService;
use dashmap::DashMap;
use media::{MediaRequest, MediaType};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Name of the environment variable listing warm seeds
pub const WARM_SEEDS_ENV: &str = "MEDIA_RECS_WARM_SEEDS";

/// One request worth pre-fetching, e.g. `movie:sci-fi`
#[derive(Debug, Clone, PartialEq)]
pub struct WarmSeed {
    pub media_type: MediaType,
    pub genre: String,
}

impl WarmSeed {
    pub fn new(media_type: MediaType, genre: impl Into<String>) -> Self {
        Self {
            media_type,
            genre: genre.into(),
        }
    }

    /// Parse one `type:genre` seed. Returns `None` for anything
    /// malformed.
    pub fn parse(raw: &str) -> Option<Self> {
        let (media_type, genre) = raw.split_once(':')?;
        let media_type = media_type.parse::<MediaType>().ok()?;
        let genre = genre.trim();
        if genre.is_empty() {
            return None;
        }
        Some(Self::new(media_type, genre))
    }

    /// Parse a comma-separated seed list, skipping malformed entries
    /// with a warning.
    pub fn parse_list(raw: &str) -> Vec<Self> {
        raw.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .filter_map(|part| match Self::parse(part) {
                Some(seed) => Some(seed),
                None => {
                    warn!("Skipping malformed warm seed '{}'", part);
                    None
                }
            })
            .collect()
    }

    /// Seeds from `MEDIA_RECS_WARM_SEEDS`, or the defaults when unset.
    pub fn from_env() -> Vec<Self> {
        match std::env::var(WARM_SEEDS_ENV) {
            Ok(raw) => Self::parse_list(&raw),
            Err(_) => Self::defaults(),
        }
    }

    /// The genres most sessions start with
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new(MediaType::Movie, "sci-fi"),
            Self::new(MediaType::Movie, "action"),
            Self::new(MediaType::Tv, "drama"),
            Self::new(MediaType::Book, "fantasy"),
        ]
    }

    pub fn request(&self) -> MediaRequest {
        MediaRequest::discover(self.media_type, self.genre.clone())
    }
}

impl fmt::Display for WarmSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.media_type, self.genre)
    }
}

/// Spawns and tracks background warm tasks.
pub struct CacheWarmer {
    service: Arc<MediaService>,
    tasks: DashMap<u64, JoinHandle<()>>,
    next_id: AtomicU64,
}

impl CacheWarmer {
    pub fn new(service: Arc<MediaService>) -> Self {
        Self {
            service,
            tasks: DashMap::new(),
            next_id: AtomicU64::new(0),
        }
    }

    /// Spawn one background task per seed and return immediately.
    /// Returns how many tasks were spawned.
    ///
    /// Warming an already-fresh key is a cheap cache hit, so calling
    /// this repeatedly with the same seeds is harmless.
    pub fn warm<I>(&self, seeds: I) -> usize
    where
        I: IntoIterator<Item = WarmSeed>,
    {
        self.tasks.retain(|_, handle| !handle.is_finished());

        let mut spawned = 0;
        for seed in seeds {
            let service = self.service.clone();
            let request = seed.request();
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            let handle = tokio::spawn(async move {
                let key = request.cache_key();
                match service.discover(&request).await {
                    Ok(items) => debug!("Warmed '{}' ({} items)", key, items.len()),
                    // A failed warm is only a missed head start
                    Err(e) => warn!("Cache warm for '{}' failed: {}", key, e),
                }
            });
            self.tasks.insert(id, handle);
            spawned += 1;
        }

        if spawned > 0 {
            info!("Warming {} cache entries in the background", spawned);
        }
        spawned
    }

    /// Warm a single genre, as the UI does when the user picks one.
    pub fn warm_genre(&self, media_type: MediaType, genre: &str) {
        self.warm([WarmSeed::new(media_type, genre)]);
    }

    /// Warm tasks still running
    pub fn pending(&self) -> usize {
        self.tasks
            .iter()
            .filter(|kv| !kv.value().is_finished())
            .count()
    }

    /// Wait for every tracked warm task to finish.
    pub async fn wait(&self) {
        let ids: Vec<u64> = self.tasks.iter().map(|kv| *kv.key()).collect();
        for id in ids {
            if let Some((_, handle)) = self.tasks.remove(&id) {
                let _ = handle.await;
            }
        }
    }

    /// Abort whatever is still running. In-flight upstream calls are
    /// dropped mid-air; the cache is simply left unwarmed.
    pub fn shutdown(&self) {
        let mut aborted = 0;
        self.tasks.retain(|_, handle| {
            handle.abort();
            aborted += 1;
            false
        });
        if aborted > 0 {
            info!("Aborted {} warm tasks", aborted);
        }
    }
}
