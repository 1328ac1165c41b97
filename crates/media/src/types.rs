//! Core domain types for media recommendations.
//!
//! This module defines the fundamental data structures shared by the cache,
//! personalization, and service crates. Key Rust concepts demonstrated here:
//! - Enums for fixed sets of values (MediaType, Feedback)
//! - Structs with public fields
//! - Derive macros for common traits
//! - Implementing Display and FromStr for CLI-friendly types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// Media Kinds
// =============================================================================

/// The kinds of media the system recommends.
///
/// Rust concept: a `Copy` enum is the natural shape for a small closed set;
/// serde renames keep the persisted form lowercase and stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Book,
    Tv,
}

impl MediaType {
    /// Plural path segment used in cache keys (e.g., "movies:genre=sci-fi").
    pub fn plural(&self) -> &'static str {
        match self {
            MediaType::Movie => "movies",
            MediaType::Book => "books",
            MediaType::Tv => "tv",
        }
    }

    /// Human-readable label for CLI output.
    pub fn label(&self) -> &'static str {
        match self {
            MediaType::Movie => "Movie",
            MediaType::Book => "Book",
            MediaType::Tv => "TV Series",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MediaType::Movie => "movie",
            MediaType::Book => "book",
            MediaType::Tv => "tv",
        };
        write!(f, "{}", s)
    }
}

/// Error returned when a string names no known media type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown media type: {0} (expected movie, book, or tv)")]
pub struct ParseMediaTypeError(pub String);

impl FromStr for MediaType {
    type Err = ParseMediaTypeError;

    /// Accepts the common spellings users type at the CLI
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "movie" | "movies" | "film" => Ok(MediaType::Movie),
            "book" | "books" => Ok(MediaType::Book),
            "tv" | "show" | "series" | "tv series" => Ok(MediaType::Tv),
            other => Err(ParseMediaTypeError(other.to_string())),
        }
    }
}

// =============================================================================
// Catalog Items
// =============================================================================

/// A single recommendable item as returned by a fetcher.
///
/// This is the payload that gets cached as JSON, so every field must
/// round-trip through serde unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub title: String,
    pub media_type: MediaType,
    pub year: Option<u16>,
    pub genres: Vec<String>,
    /// Aggregate rating on a 0-10 scale, when known
    pub rating: Option<f32>,
    pub description: Option<String>,
}

impl MediaItem {
    /// Identity reference for watchlist and feedback records
    pub fn as_ref(&self) -> MediaRef {
        MediaRef {
            title: self.title.clone(),
            media_type: self.media_type,
        }
    }
}

// =============================================================================
// Item References and Feedback
// =============================================================================

/// Lightweight reference to an item, used by the personalization store.
///
/// Two refs identify the same item when their media types match and their
/// titles match case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub title: String,
    pub media_type: MediaType,
}

impl MediaRef {
    pub fn new(title: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            title: title.into(),
            media_type,
        }
    }

    /// Identity check: same media type, title compared case-insensitively
    pub fn matches(&self, other: &MediaRef) -> bool {
        self.media_type == other.media_type
            && self.title.to_lowercase() == other.title.to_lowercase()
    }
}

impl fmt::Display for MediaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.media_type.label())
    }
}

/// User feedback on a recommended item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    Liked,
    Disliked,
}
