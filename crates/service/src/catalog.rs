//! Built-in catalog used for demos and tests.
//!
//! [`SampleCatalog`] answers requests from a fixed in-memory item list,
//! optionally with simulated latency so cache behavior (coalescing,
//! warming) is observable from the CLI. It also counts how often each
//! fetch method runs, which is how tests prove that a cached or
//! coalesced path never reached the upstream.

use crate::fetch::MediaFetcher;
use async_trait::async_trait;
use media::{MediaItem, MediaRef, MediaRequest, MediaType};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

/// Items released in or after this year count as "recent"
const RECENT_CUTOFF_YEAR: u16 = 2015;
/// Items released before this year count as "classic"
const CLASSIC_CUTOFF_YEAR: u16 = 2000;
/// How many items a trending request returns
const TRENDING_LIMIT: usize = 5;

/// A fetcher backed by a fixed item list.
pub struct SampleCatalog {
    items: Vec<MediaItem>,
    latency: Duration,
    fetch_count: AtomicUsize,
    rating_count: AtomicUsize,
}

impl SampleCatalog {
    /// Catalog seeded with a spread of titles across types and genres.
    pub fn new() -> Self {
        Self::with_items(default_items())
    }

    /// Catalog over a caller-supplied item list (for tests).
    pub fn with_items(items: Vec<MediaItem>) -> Self {
        Self {
            items,
            latency: Duration::ZERO,
            fetch_count: AtomicUsize::new(0),
            rating_count: AtomicUsize::new(0),
        }
    }

    /// Sleep this long on every fetch, imitating a slow upstream.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// How many catalog lookups actually ran
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    /// How many rating lookups actually ran
    pub fn rating_count(&self) -> usize {
        self.rating_count.load(Ordering::SeqCst)
    }

    fn matching(&self, request: &MediaRequest) -> Vec<MediaItem> {
        let mut items: Vec<MediaItem> = match request {
            MediaRequest::Discover {
                media_type,
                genre,
                timeframe,
            } => self
                .items
                .iter()
                .filter(|item| item.media_type == *media_type)
                .filter(|item| {
                    item.genres
                        .iter()
                        .any(|g| g.eq_ignore_ascii_case(genre.trim()))
                })
                .filter(|item| in_timeframe(item, timeframe.as_deref()))
                .cloned()
                .collect(),
            MediaRequest::Search { query, .. } => {
                let query = query.trim().to_lowercase();
                // An empty type list means search everything
                let types = request.media_types();
                self.items
                    .iter()
                    .filter(|item| types.contains(&item.media_type))
                    .filter(|item| item.title.to_lowercase().contains(&query))
                    .cloned()
                    .collect()
            }
            MediaRequest::Trending { media_type } => {
                let mut trending: Vec<MediaItem> = self
                    .items
                    .iter()
                    .filter(|item| item.media_type == *media_type)
                    .cloned()
                    .collect();
                by_rating(&mut trending);
                trending.truncate(TRENDING_LIMIT);
                return trending;
            }
        };
        by_rating(&mut items);
        items
    }
}

impl Default for SampleCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaFetcher for SampleCatalog {
    fn name(&self) -> &str {
        "sample-catalog"
    }

    async fn fetch(&self, request: &MediaRequest) -> anyhow::Result<Vec<MediaItem>> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let items = self.matching(request);
        debug!("{}: '{}' matched {} items", self.name(), request, items.len());
        Ok(items)
    }

    async fn fetch_rating(&self, item: &MediaRef) -> anyhow::Result<Option<f32>> {
        self.rating_count.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let rating = self
            .items
            .iter()
            .find(|candidate| candidate.as_ref().matches(item))
            .and_then(|candidate| candidate.rating);
        Ok(rating)
    }
}

fn in_timeframe(item: &MediaItem, timeframe: Option<&str>) -> bool {
    let Some(timeframe) = timeframe else {
        return true;
    };
    match timeframe.trim().to_lowercase().as_str() {
        "recent" => item.year.is_some_and(|y| y >= RECENT_CUTOFF_YEAR),
        "classic" => item.year.is_some_and(|y| y < CLASSIC_CUTOFF_YEAR),
        // Unknown timeframes select everything rather than nothing
        _ => true,
    }
}

/// Highest rated first; unrated items sink to the end
fn by_rating(items: &mut [MediaItem]) {
    items.sort_by(|a, b| {
        b.rating
            .unwrap_or(0.0)
            .total_cmp(&a.rating.unwrap_or(0.0))
    });
}

fn seed(
    title: &str,
    media_type: MediaType,
    year: u16,
    genres: &[&str],
    rating: f32,
    description: &str,
) -> MediaItem {
    MediaItem {
        title: title.to_string(),
        media_type,
        year: Some(year),
        genres: genres.iter().map(|g| g.to_string()).collect(),
        rating: Some(rating),
        description: Some(description.to_string()),
    }
}

fn default_items() -> Vec<MediaItem> {
    use MediaType::{Book, Movie, Tv};

    vec![
        // Movies
        seed("Dune", Movie, 2021, &["Sci-Fi", "Adventure"], 8.0,
            "Paul Atreides leads a desert rebellion on Arrakis."),
        seed("Inception", Movie, 2010, &["Sci-Fi", "Thriller"], 8.8,
            "A thief plants an idea through layered dreams."),
        seed("Interstellar", Movie, 2014, &["Sci-Fi", "Drama"], 8.7,
            "Explorers cross a wormhole to save humanity."),
        seed("Arrival", Movie, 2016, &["Sci-Fi", "Drama"], 7.9,
            "A linguist races to decode an alien language."),
        seed("The Dark Knight", Movie, 2008, &["Action", "Crime"], 9.0,
            "Batman faces the Joker's escalating chaos."),
        seed("Mad Max: Fury Road", Movie, 2015, &["Action", "Sci-Fi"], 8.1,
            "A convoy chase across a post-apocalyptic desert."),
        seed("Get Out", Movie, 2017, &["Horror", "Thriller"], 7.8,
            "A weekend visit hides something monstrous."),
        seed("Knives Out", Movie, 2019, &["Mystery", "Comedy"], 7.9,
            "A detective untangles a patriarch's death."),
        seed("The Grand Budapest Hotel", Movie, 2014, &["Comedy", "Drama"], 8.1,
            "A concierge and his lobby boy on the run."),
        // Books
        seed("Dune", Book, 1965, &["Sci-Fi"], 8.4,
            "The original desert-planet epic."),
        seed("Project Hail Mary", Book, 2021, &["Sci-Fi"], 8.6,
            "A lone astronaut must save two worlds."),
        seed("The Martian", Book, 2011, &["Sci-Fi"], 8.2,
            "Stranded on Mars with duct tape and potatoes."),
        seed("The Name of the Wind", Book, 2007, &["Fantasy"], 8.4,
            "An innkeeper recounts his legendary youth."),
        seed("Gone Girl", Book, 2012, &["Mystery", "Thriller"], 8.0,
            "A marriage unravels into a media storm."),
        seed("The Hobbit", Book, 1937, &["Fantasy", "Adventure"], 8.3,
            "There and back again."),
        // TV
        seed("Breaking Bad", Tv, 2008, &["Crime", "Drama"], 9.5,
            "A chemistry teacher builds a drug empire."),
        seed("The Expanse", Tv, 2015, &["Sci-Fi", "Drama"], 8.5,
            "Detectives and ice haulers unravel a system-wide conspiracy."),
        seed("Severance", Tv, 2022, &["Sci-Fi", "Thriller"], 8.7,
            "Office workers with surgically split memories."),
        seed("Stranger Things", Tv, 2016, &["Sci-Fi", "Horror"], 8.7,
            "A small town meets the Upside Down."),
        seed("The Office", Tv, 2005, &["Comedy"], 9.0,
            "A paper company, documented."),
        seed("True Detective", Tv, 2014, &["Crime", "Drama"], 8.9,
            "Two detectives, one case, seventeen years."),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_discover_filters_by_type_and_genre() {
        let catalog = SampleCatalog::new();
        let items = catalog
            .fetch(&MediaRequest::discover(MediaType::Movie, "sci-fi"))
            .await
            .unwrap();

        assert!(!items.is_empty());
        for item in &items {
            assert_eq!(item.media_type, MediaType::Movie);
            assert!(item.genres.iter().any(|g| g.eq_ignore_ascii_case("sci-fi")));
        }
        // Sorted best-first
        assert_eq!(items[0].title, "Inception");
    }

    #[tokio::test]
    async fn test_discover_timeframe_narrows_by_year() {
        let catalog = SampleCatalog::new();
        let recent = catalog
            .fetch(&MediaRequest::Discover {
                media_type: MediaType::Movie,
                genre: "sci-fi".to_string(),
                timeframe: Some("recent".to_string()),
            })
            .await
            .unwrap();

        assert!(recent.iter().all(|i| i.year.unwrap() >= RECENT_CUTOFF_YEAR));
        assert!(recent.iter().any(|i| i.title == "Dune"));
        assert!(!recent.iter().any(|i| i.title == "Inception"));
    }

    #[tokio::test]
    async fn test_search_spans_types_and_matches_substrings() {
        let catalog = SampleCatalog::new();
        let items = catalog
            .fetch(&MediaRequest::search("dune", vec![]))
            .await
            .unwrap();

        let types: Vec<MediaType> = items.iter().map(|i| i.media_type).collect();
        assert!(types.contains(&MediaType::Movie) && types.contains(&MediaType::Book));

        let books_only = catalog
            .fetch(&MediaRequest::search("dune", vec![MediaType::Book]))
            .await
            .unwrap();
        assert_eq!(books_only.len(), 1);
        assert_eq!(books_only[0].year, Some(1965));
    }

    #[tokio::test]
    async fn test_trending_returns_top_rated_of_type() {
        let catalog = SampleCatalog::new();
        let items = catalog
            .fetch(&MediaRequest::Trending {
                media_type: MediaType::Tv,
            })
            .await
            .unwrap();

        assert_eq!(items.len(), TRENDING_LIMIT);
        assert_eq!(items[0].title, "Breaking Bad");
        assert!(items.iter().all(|i| i.media_type == MediaType::Tv));
    }

    #[tokio::test]
    async fn test_rating_lookup_distinguishes_media_types() {
        let catalog = SampleCatalog::new();

        let movie = catalog
            .fetch_rating(&MediaRef::new("dune", MediaType::Movie))
            .await
            .unwrap();
        let book = catalog
            .fetch_rating(&MediaRef::new("Dune", MediaType::Book))
            .await
            .unwrap();
        let unknown = catalog
            .fetch_rating(&MediaRef::new("Dune", MediaType::Tv))
            .await
            .unwrap();

        assert_eq!(movie, Some(8.0));
        assert_eq!(book, Some(8.4));
        assert_eq!(unknown, None);
        assert_eq!(catalog.rating_count(), 3);
    }

    #[tokio::test]
    async fn test_fetch_count_tracks_every_call() {
        let catalog = SampleCatalog::new();
        let request = MediaRequest::discover(MediaType::Book, "fantasy");

        catalog.fetch(&request).await.unwrap();
        catalog.fetch(&request).await.unwrap();
        assert_eq!(catalog.fetch_count(), 2, "the catalog itself never caches");
    }
}
