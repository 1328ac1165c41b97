//! Integration tests for the service crate.
//!
//! These tests wire a real cache manager and profile store to sample
//! fetchers and verify the request path end to end: caching, fetch
//! coalescing, failure propagation, and personalization.

use async_trait::async_trait;
use cache::{CacheConfig, CacheManager};
use media::{Feedback, MediaItem, MediaRef, MediaRequest, MediaType};
use personalization::PersonalizationStore;
use service::{
    CacheWarmer, MediaFetcher, MediaService, SampleCatalog, WarmSeed, API_CACHE_NAMESPACE,
    DEFAULT_RECOMMENDATION_LIMIT, RATING_CACHE_NAMESPACE,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn build_service(
    dir: &TempDir,
    config: CacheConfig,
    fetcher: Arc<dyn MediaFetcher>,
) -> (Arc<MediaService>, Arc<CacheManager>, Arc<PersonalizationStore>) {
    let config = config.with_cache_dir(dir.path().join("cache"));
    let cache = Arc::new(CacheManager::open(config).unwrap());
    let profiles = Arc::new(PersonalizationStore::open(dir.path().join("profiles")).unwrap());
    let service = Arc::new(MediaService::new(cache.clone(), profiles.clone(), fetcher));
    (service, cache, profiles)
}

/// Fails its first `failures` fetches, then succeeds
struct FlakyFetcher {
    failures: usize,
    calls: AtomicUsize,
}

impl FlakyFetcher {
    fn new(failures: usize) -> Self {
        Self {
            failures,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl MediaFetcher for FlakyFetcher {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn fetch(&self, _request: &MediaRequest) -> anyhow::Result<Vec<MediaItem>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            anyhow::bail!("transient upstream failure {}", call);
        }
        Ok(vec![MediaItem {
            title: "Dune".to_string(),
            media_type: MediaType::Movie,
            year: Some(2021),
            genres: vec!["Sci-Fi".to_string()],
            rating: Some(8.0),
            description: None,
        }])
    }

    async fn fetch_rating(&self, _item: &MediaRef) -> anyhow::Result<Option<f32>> {
        Ok(None)
    }
}

#[tokio::test]
async fn test_discover_serves_repeat_requests_from_cache() {
    let dir = TempDir::new().unwrap();
    let catalog = Arc::new(SampleCatalog::new());
    let (service, cache, _) = build_service(&dir, CacheConfig::default(), catalog.clone());
    let request = MediaRequest::discover(MediaType::Movie, "sci-fi");

    let first = service.discover(&request).await.unwrap();
    let second = service.discover(&request).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(catalog.fetch_count(), 1, "second request should be a cache hit");
    assert!(cache
        .get_entry(API_CACHE_NAMESPACE, "movies:genre=sci-fi")
        .is_some());
}

#[tokio::test]
async fn test_concurrent_discovers_share_one_fetch() {
    let dir = TempDir::new().unwrap();
    let catalog = Arc::new(SampleCatalog::new().with_latency(Duration::from_millis(100)));
    let (service, _, _) = build_service(&dir, CacheConfig::default(), catalog.clone());

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .discover(&MediaRequest::discover(MediaType::Movie, "sci-fi"))
                .await
        }));
    }

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(catalog.fetch_count(), 1, "callers should coalesce into one fetch");
    assert!(results.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test]
async fn test_failed_fetch_propagates_and_next_call_recovers() {
    let dir = TempDir::new().unwrap();
    let fetcher = Arc::new(FlakyFetcher::new(1));
    let (service, cache, _) = build_service(&dir, CacheConfig::default(), fetcher.clone());
    let request = MediaRequest::discover(MediaType::Movie, "sci-fi");

    let failed = service.discover(&request).await;
    assert!(failed.is_err(), "the first upstream failure must reach the caller");
    assert!(
        cache
            .get_entry(API_CACHE_NAMESPACE, "movies:genre=sci-fi")
            .is_none(),
        "failures must not be cached"
    );

    let recovered = service.discover(&request).await.unwrap();
    assert_eq!(recovered[0].title, "Dune");
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_lock_timeout_falls_back_to_direct_fetch() {
    let dir = TempDir::new().unwrap();
    let catalog = Arc::new(SampleCatalog::new().with_latency(Duration::from_millis(500)));
    let config = CacheConfig::default().with_lock_timeout(Duration::from_millis(50));
    let (service, _, _) = build_service(&dir, config, catalog.clone());
    let request = MediaRequest::discover(MediaType::Movie, "sci-fi");

    // First caller occupies the coalescing lock with a slow fetch
    let slow = {
        let service = service.clone();
        let request = request.clone();
        tokio::spawn(async move { service.discover(&request).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Second caller times out on the lock and fetches directly instead
    // of hanging or failing
    let fallback = service.discover(&request).await.unwrap();
    assert!(!fallback.is_empty());

    let coalesced = slow.await.unwrap().unwrap();
    assert_eq!(coalesced, fallback);
    assert_eq!(catalog.fetch_count(), 2, "one coalesced fetch plus one direct");
}

#[tokio::test]
async fn test_ratings_cache_under_long_ttl() {
    let dir = TempDir::new().unwrap();
    let catalog = Arc::new(SampleCatalog::new());
    let (service, cache, _) = build_service(&dir, CacheConfig::default(), catalog.clone());
    let dune = MediaRef::new("Dune", MediaType::Movie);

    assert_eq!(service.rating(&dune).await.unwrap(), Some(8.0));
    assert_eq!(service.rating(&dune).await.unwrap(), Some(8.0));
    assert_eq!(catalog.rating_count(), 1);

    let entry = cache
        .get_entry(RATING_CACHE_NAMESPACE, "movie:dune")
        .expect("rating should be cached");
    assert_eq!(
        entry.ttl_seconds,
        cache.config().ttl_for(RATING_CACHE_NAMESPACE),
        "ratings should use their namespace TTL"
    );
}

#[tokio::test]
async fn test_unknown_rating_is_cached_as_none() {
    struct UnratedFetcher {
        rating_calls: AtomicUsize,
    }

    #[async_trait]
    impl MediaFetcher for UnratedFetcher {
        fn name(&self) -> &str {
            "unrated"
        }
        async fn fetch(&self, _request: &MediaRequest) -> anyhow::Result<Vec<MediaItem>> {
            Ok(Vec::new())
        }
        async fn fetch_rating(&self, _item: &MediaRef) -> anyhow::Result<Option<f32>> {
            self.rating_calls.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }
    }

    let dir = TempDir::new().unwrap();
    let fetcher = Arc::new(UnratedFetcher {
        rating_calls: AtomicUsize::new(0),
    });
    let (service, cache, _) = build_service(&dir, CacheConfig::default(), fetcher.clone());
    let solaris = MediaRef::new("Solaris", MediaType::Movie);

    // "No rating known" memoizes like any other answer
    assert_eq!(service.rating(&solaris).await.unwrap(), None);
    assert_eq!(service.rating(&solaris).await.unwrap(), None);
    assert_eq!(
        fetcher.rating_calls.load(Ordering::SeqCst),
        1,
        "the second lookup should be served from the cache"
    );
    assert!(
        cache
            .get_entry(RATING_CACHE_NAMESPACE, "movie:solaris")
            .is_some(),
        "a null rating should be persisted like any other value"
    );
}

#[tokio::test]
async fn test_enrich_ratings_fills_missing_values_best_effort() {
    struct RatingOnlyFetcher;

    #[async_trait]
    impl MediaFetcher for RatingOnlyFetcher {
        fn name(&self) -> &str {
            "rating-only"
        }
        async fn fetch(&self, _request: &MediaRequest) -> anyhow::Result<Vec<MediaItem>> {
            Ok(Vec::new())
        }
        async fn fetch_rating(&self, item: &MediaRef) -> anyhow::Result<Option<f32>> {
            if item.title == "Dune" {
                Ok(Some(8.0))
            } else {
                anyhow::bail!("rating source offline")
            }
        }
    }

    let dir = TempDir::new().unwrap();
    let (service, _, _) = build_service(&dir, CacheConfig::default(), Arc::new(RatingOnlyFetcher));

    let mut items = vec![
        MediaItem {
            title: "Dune".to_string(),
            media_type: MediaType::Movie,
            year: Some(2021),
            genres: vec!["Sci-Fi".to_string()],
            rating: None,
            description: None,
        },
        MediaItem {
            title: "Arrival".to_string(),
            media_type: MediaType::Movie,
            year: Some(2016),
            genres: vec!["Sci-Fi".to_string()],
            rating: None,
            description: None,
        },
    ];

    service.enrich_ratings(&mut items).await;

    assert_eq!(items[0].rating, Some(8.0));
    assert_eq!(items[1].rating, None, "a failed lookup leaves the item unrated");
}

#[tokio::test]
async fn test_recommend_personalizes_and_records_history() {
    let dir = TempDir::new().unwrap();
    let catalog = Arc::new(SampleCatalog::new());
    let (service, _, profiles) = build_service(&dir, CacheConfig::default(), catalog);
    let request = MediaRequest::discover(MediaType::Movie, "sci-fi");

    // Fresh user: default context, recommendations recorded
    let first = service
        .recommend("user42", &request, DEFAULT_RECOMMENDATION_LIMIT)
        .await
        .unwrap();
    assert_eq!(first.context, "New user - no previous preferences available.");
    assert!(!first.items.is_empty());

    let profile = profiles.load("user42");
    assert_eq!(profile.history.len(), 1);
    assert_eq!(profile.history[0].request, "sci-fi movies");

    // Dislike the top item; it disappears from the next answer
    let top = first.items[0].clone();
    service
        .record_feedback("user42", &top, Feedback::Disliked)
        .await
        .unwrap();

    let second = service
        .recommend("user42", &request, DEFAULT_RECOMMENDATION_LIMIT)
        .await
        .unwrap();
    assert!(
        second.items.iter().all(|item| item.title != top.title),
        "disliked items must not be recommended again"
    );
    assert!(second.context.contains("Previously disliked items:"));
}

#[tokio::test]
async fn test_warmed_and_live_paths_share_the_cache() {
    let dir = TempDir::new().unwrap();
    let catalog = Arc::new(SampleCatalog::new().with_latency(Duration::from_millis(100)));
    let (service, _, _) = build_service(&dir, CacheConfig::default(), catalog.clone());

    // Start warming, then immediately issue the same request live: the
    // two must coalesce rather than race two upstream calls
    let warmer = CacheWarmer::new(service.clone());
    warmer.warm([WarmSeed::new(MediaType::Movie, "sci-fi")]);

    let live = service
        .discover(&MediaRequest::discover(MediaType::Movie, "sci-fi"))
        .await
        .unwrap();
    warmer.wait().await;

    assert!(!live.is_empty());
    assert_eq!(catalog.fetch_count(), 1, "warm and live request should share one fetch");
}
