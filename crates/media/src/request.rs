//! Request shapes and deterministic cache key derivation.
//!
//! The live request path and the cache warmer both describe what they want
//! as a [`MediaRequest`] and derive the cache key from it, so entries
//! populated by either path are addressed (and formatted) identically.
//!
//! Key derivation rules:
//! - Arguments are normalized (lowercased, trimmed, whitespace collapsed)
//!   before they enter the key, so "Sci-Fi" and "sci-fi " hit the same entry
//! - Set-valued arguments are sorted, so argument order never matters
//! - Absent optional arguments are omitted entirely

use crate::types::MediaType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A request for media items, as issued by the UI or the warmer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaRequest {
    /// Browse a genre, optionally narrowed to a timeframe (e.g., "recent")
    Discover {
        media_type: MediaType,
        genre: String,
        timeframe: Option<String>,
    },
    /// Free-text search, optionally restricted to some media types
    Search {
        query: String,
        media_types: Vec<MediaType>,
    },
    /// What is popular right now for one media type
    Trending { media_type: MediaType },
}

impl MediaRequest {
    /// Convenience constructor for the most common request shape
    pub fn discover(media_type: MediaType, genre: impl Into<String>) -> Self {
        MediaRequest::Discover {
            media_type,
            genre: genre.into(),
            timeframe: None,
        }
    }

    pub fn search(query: impl Into<String>, media_types: Vec<MediaType>) -> Self {
        MediaRequest::Search {
            query: query.into(),
            media_types,
        }
    }

    /// Derive the cache key for this request.
    ///
    /// The key is deterministic: equal requests (after normalization) always
    /// produce equal keys, and different request shapes can never collide
    /// because each shape has its own leading segment.
    ///
    /// Examples: `movies:genre=sci-fi`, `movies:genre=sci-fi&timeframe=recent`,
    /// `search:q=dune&types=book,movie`, `trending:tv`.
    pub fn cache_key(&self) -> String {
        match self {
            MediaRequest::Discover {
                media_type,
                genre,
                timeframe,
            } => {
                let mut key = format!("{}:genre={}", media_type.plural(), normalize(genre));
                if let Some(tf) = timeframe {
                    let tf = normalize(tf);
                    if !tf.is_empty() {
                        key.push_str("&timeframe=");
                        key.push_str(&tf);
                    }
                }
                key
            }
            MediaRequest::Search { query, media_types } => {
                let mut key = format!("search:q={}", normalize(query));
                if !media_types.is_empty() {
                    // Sort and deduplicate so the key ignores argument order
                    let mut types: Vec<&str> =
                        media_types.iter().map(|t| t.plural()).collect();
                    types.sort_unstable();
                    types.dedup();
                    key.push_str("&types=");
                    key.push_str(&types.join(","));
                }
                key
            }
            MediaRequest::Trending { media_type } => {
                format!("trending:{}", media_type.plural())
            }
        }
    }

    /// The media types this request is asking about (empty Search = all)
    pub fn media_types(&self) -> Vec<MediaType> {
        match self {
            MediaRequest::Discover { media_type, .. }
            | MediaRequest::Trending { media_type } => vec![*media_type],
            MediaRequest::Search { media_types, .. } => {
                if media_types.is_empty() {
                    vec![MediaType::Movie, MediaType::Book, MediaType::Tv]
                } else {
                    media_types.clone()
                }
            }
        }
    }
}

/// Human-readable summary, used for history records and log lines
impl fmt::Display for MediaRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaRequest::Discover {
                media_type,
                genre,
                timeframe,
            } => {
                write!(f, "{} {}", genre, media_type.plural())?;
                if let Some(tf) = timeframe {
                    write!(f, " ({})", tf)?;
                }
                Ok(())
            }
            MediaRequest::Search { query, media_types } => {
                write!(f, "search '{}'", query)?;
                if !media_types.is_empty() {
                    let types: Vec<&str> = media_types.iter().map(|t| t.plural()).collect();
                    write!(f, " in {}", types.join(", "))?;
                }
                Ok(())
            }
            MediaRequest::Trending { media_type } => {
                write!(f, "trending {}", media_type.plural())
            }
        }
    }
}

/// Lowercase, trim, and collapse internal whitespace runs to single hyphens
fn normalize(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_key_shape() {
        let request = MediaRequest::discover(MediaType::Movie, "sci-fi");
        assert_eq!(request.cache_key(), "movies:genre=sci-fi");
    }

    #[test]
    fn test_discover_key_normalizes_genre() {
        let shouty = MediaRequest::discover(MediaType::Movie, "  Sci-Fi ");
        let plain = MediaRequest::discover(MediaType::Movie, "sci-fi");
        assert_eq!(shouty.cache_key(), plain.cache_key());

        let spaced = MediaRequest::discover(MediaType::Book, "Science  Fiction");
        assert_eq!(spaced.cache_key(), "books:genre=science-fiction");
    }

    #[test]
    fn test_discover_key_includes_timeframe_when_present() {
        let request = MediaRequest::Discover {
            media_type: MediaType::Movie,
            genre: "sci-fi".to_string(),
            timeframe: Some("Recent".to_string()),
        };
        assert_eq!(request.cache_key(), "movies:genre=sci-fi&timeframe=recent");

        // An empty timeframe keys the same as no timeframe
        let blank = MediaRequest::Discover {
            media_type: MediaType::Movie,
            genre: "sci-fi".to_string(),
            timeframe: Some("  ".to_string()),
        };
        assert_eq!(blank.cache_key(), "movies:genre=sci-fi");
    }

    #[test]
    fn test_search_key_sorts_media_types() {
        let forward = MediaRequest::search("Dune", vec![MediaType::Movie, MediaType::Book]);
        let reverse = MediaRequest::search("dune", vec![MediaType::Book, MediaType::Movie]);

        assert_eq!(forward.cache_key(), "search:q=dune&types=book,movie");
        assert_eq!(forward.cache_key(), reverse.cache_key());
    }

    #[test]
    fn test_search_key_omits_empty_type_list() {
        let request = MediaRequest::search("dune", vec![]);
        assert_eq!(request.cache_key(), "search:q=dune");
    }

    #[test]
    fn test_trending_key_shape() {
        let request = MediaRequest::Trending {
            media_type: MediaType::Tv,
        };
        assert_eq!(request.cache_key(), "trending:tv");
    }

    #[test]
    fn test_different_shapes_never_collide() {
        let discover = MediaRequest::discover(MediaType::Tv, "drama");
        let trending = MediaRequest::Trending {
            media_type: MediaType::Tv,
        };
        let search = MediaRequest::search("drama", vec![MediaType::Tv]);

        assert_ne!(discover.cache_key(), trending.cache_key());
        assert_ne!(discover.cache_key(), search.cache_key());
        assert_ne!(trending.cache_key(), search.cache_key());
    }

    #[test]
    fn test_display_reads_naturally() {
        let discover = MediaRequest::discover(MediaType::Movie, "sci-fi");
        assert_eq!(discover.to_string(), "sci-fi movies");

        let search = MediaRequest::search("dune", vec![MediaType::Book, MediaType::Movie]);
        assert_eq!(search.to_string(), "search 'dune' in books, movies");

        let trending = MediaRequest::Trending {
            media_type: MediaType::Tv,
        };
        assert_eq!(trending.to_string(), "trending tv");
    }

    #[test]
    fn test_media_types_expands_empty_search_to_all() {
        let request = MediaRequest::search("dune", vec![]);
        assert_eq!(request.media_types().len(), 3);

        let narrow = MediaRequest::search("dune", vec![MediaType::Book]);
        assert_eq!(narrow.media_types(), vec![MediaType::Book]);
    }
}
