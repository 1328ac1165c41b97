//! The request path: cache-fronted lookups plus personalization.
//!
//! [`MediaService`] owns the wiring between the three stores:
//! catalog lookups go through the cache's coalesced fetch path, ratings
//! get their own long-lived namespace, and recommendations fold in the
//! user's profile before anything is returned.
//!
//! Failure policy, in one place:
//! - Fetcher errors propagate to the caller (and are never cached)
//! - A coalescing lock timeout falls back to one direct bounded fetch,
//!   so a wedged in-flight call cannot take the request path down
//! - Rating enrichment and history recording are best effort; their
//!   failures are logged and the response still goes out

use crate::fetch::MediaFetcher;
use cache::{CacheError, CacheManager};
use media::{Feedback, MediaItem, MediaRef, MediaRequest};
use personalization::{PersonalizationStore, RecommendedItem, UserProfile};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Namespace for catalog lookup results
pub const API_CACHE_NAMESPACE: &str = "api_cache";
/// Namespace for per-title ratings; long TTL, configured separately
pub const RATING_CACHE_NAMESPACE: &str = "rating_cache";

/// Default number of items a recommendation returns
pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 5;

/// A personalized answer: the items plus the profile context that
/// shaped their order
#[derive(Debug, Clone)]
pub struct Recommendation {
    pub items: Vec<MediaItem>,
    pub context: String,
}

/// The shared application service. One instance is built at startup and
/// handed around behind an `Arc`.
pub struct MediaService {
    cache: Arc<CacheManager>,
    profiles: Arc<PersonalizationStore>,
    fetcher: Arc<dyn MediaFetcher>,
}

impl MediaService {
    pub fn new(
        cache: Arc<CacheManager>,
        profiles: Arc<PersonalizationStore>,
        fetcher: Arc<dyn MediaFetcher>,
    ) -> Self {
        Self {
            cache,
            profiles,
            fetcher,
        }
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    pub fn profiles(&self) -> &PersonalizationStore {
        &self.profiles
    }

    /// Answer a request through the cache.
    ///
    /// Concurrent calls for the same key share one upstream fetch. If
    /// the coalescing lock cannot be acquired in time, the lookup falls
    /// back to a single direct fetch so the caller is never stuck
    /// behind a wedged peer.
    pub async fn discover(&self, request: &MediaRequest) -> anyhow::Result<Vec<MediaItem>> {
        let key = request.cache_key();
        match self
            .cache
            .get_or_fetch(API_CACHE_NAMESPACE, &key, || self.fetcher.fetch(request))
            .await
        {
            Ok(items) => Ok(items),
            Err(CacheError::LockTimeout { .. }) => {
                warn!("Coalescing lock for '{}' timed out; fetching directly", key);
                let budget = self.cache.config().fetch_timeout;
                match tokio::time::timeout(budget, self.fetcher.fetch(request)).await {
                    Ok(result) => result,
                    Err(_) => Err(anyhow::anyhow!(
                        "Direct fetch for '{}' timed out after {}s",
                        key,
                        budget.as_secs()
                    )),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Rating for one item, cached in its own namespace.
    ///
    /// "No rating known" is a real answer and gets cached too.
    pub async fn rating(&self, item: &MediaRef) -> anyhow::Result<Option<f32>> {
        let key = rating_key(item);
        let rating = self
            .cache
            .get_or_fetch(RATING_CACHE_NAMESPACE, &key, || {
                self.fetcher.fetch_rating(item)
            })
            .await?;
        Ok(rating)
    }

    /// Fill in missing ratings, item by item. Lookup failures are
    /// logged and skipped; the items are still usable without them.
    pub async fn enrich_ratings(&self, items: &mut [MediaItem]) {
        for item in items.iter_mut().filter(|item| item.rating.is_none()) {
            match self.rating(&item.as_ref()).await {
                Ok(rating) => item.rating = rating,
                Err(e) => {
                    warn!("Could not fetch rating for {}: {}", item.as_ref(), e);
                }
            }
        }
    }

    /// Personalized recommendations for a user, at most `limit` items.
    ///
    /// Looks up candidates through the cache, drops items the user
    /// disliked, reorders by their taste, and records the interaction
    /// in their history.
    pub async fn recommend(
        &self,
        user_id: &str,
        request: &MediaRequest,
        limit: usize,
    ) -> anyhow::Result<Recommendation> {
        let profile = self.profiles.load(user_id);
        let context = profile.context_summary();

        let mut items = self.discover(request).await?;
        self.enrich_ratings(&mut items).await;

        let mut items = personalize(&profile, items);
        items.truncate(limit);
        debug!(
            "Recommending {} items to '{}' for '{}'",
            items.len(),
            user_id,
            request
        );

        let remembered: Vec<RecommendedItem> =
            items.iter().map(RecommendedItem::from_item).collect();
        if let Err(e) = self
            .profiles
            .record_request(user_id, &request.to_string(), remembered)
            .await
        {
            // The recommendation is still good; only history suffered
            warn!("Could not record history for '{}': {}", user_id, e);
        }

        Ok(Recommendation { items, context })
    }

    /// Record a liked/disliked verdict against the user's profile.
    pub async fn record_feedback(
        &self,
        user_id: &str,
        item: &MediaItem,
        feedback: Feedback,
    ) -> anyhow::Result<()> {
        self.profiles
            .record_feedback(user_id, RecommendedItem::from_item(item), feedback)
            .await?;
        Ok(())
    }
}

/// Cache key for one item's rating, e.g. `movie:dune`
fn rating_key(item: &MediaRef) -> String {
    format!("{}:{}", item.media_type, item.title.to_lowercase())
}

/// Drop disliked items and order the rest by how well they match the
/// profile: liked genres count, the stated preferred genre counts
/// extra, ratings break ties.
fn personalize(profile: &UserProfile, items: Vec<MediaItem>) -> Vec<MediaItem> {
    let disliked: Vec<MediaRef> = profile
        .feedback_of(Feedback::Disliked)
        .map(|record| MediaRef::new(&record.item.title, record.item.media_type))
        .collect();

    let mut liked_genres: HashMap<String, i64> = HashMap::new();
    for record in profile.feedback_of(Feedback::Liked) {
        if let Some(genre) = &record.item.genre {
            *liked_genres.entry(genre.to_lowercase()).or_insert(0) += 1;
        }
    }
    let preferred_genre = profile.preferences.genre.as_ref().map(|g| g.to_lowercase());

    let mut scored: Vec<(i64, MediaItem)> = items
        .into_iter()
        .filter(|item| {
            let item_ref = item.as_ref();
            !disliked.iter().any(|d| d.matches(&item_ref))
        })
        .map(|item| {
            let mut score = 0;
            for genre in &item.genres {
                let genre = genre.to_lowercase();
                score += liked_genres.get(&genre).copied().unwrap_or(0);
                if preferred_genre.as_deref() == Some(genre.as_str()) {
                    score += 3;
                }
            }
            (score, item)
        })
        .collect();

    scored.sort_by(|a, b| {
        b.0.cmp(&a.0).then_with(|| {
            b.1.rating
                .unwrap_or(0.0)
                .total_cmp(&a.1.rating.unwrap_or(0.0))
        })
    });
    scored.into_iter().map(|(_, item)| item).collect()
}
