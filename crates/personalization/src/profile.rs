//! The user profile document and its mutation rules.
//!
//! A profile is everything the service remembers about one user:
//! stated preferences, a capped interaction history, liked/disliked
//! items, and a watchlist. Profiles are plain data; the
//! [`PersonalizationStore`](crate::store::PersonalizationStore) handles
//! locking and persistence.
//!
//! Every list is bounded so a long-lived profile document cannot grow
//! without limit.

use chrono::{DateTime, Utc};
use media::{Feedback, MediaItem, MediaRef, MediaType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Most recent interaction records kept per user
pub const HISTORY_LIMIT: usize = 50;
/// Most recent feedback records kept per user, per kind
pub const FEEDBACK_LIMIT: usize = 100;

/// Stated preferences, all optional until the user sets them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub media_type: Option<MediaType>,
    pub genre: Option<String>,
    pub mood: Option<String>,
    pub timeframe: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Preferences {
    /// Whether the user has stated anything at all
    pub fn is_set(&self) -> bool {
        self.media_type.is_some()
            || self.genre.is_some()
            || self.mood.is_some()
            || self.timeframe.is_some()
    }
}

/// How a recommended item is remembered in history and feedback records.
///
/// Deliberately lighter than [`MediaItem`]: just enough to describe the
/// item back to the user and count patterns later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedItem {
    pub title: String,
    pub media_type: MediaType,
    pub genre: Option<String>,
}

impl RecommendedItem {
    pub fn new(title: impl Into<String>, media_type: MediaType, genre: Option<String>) -> Self {
        Self {
            title: title.into(),
            media_type,
            genre,
        }
    }

    /// Remember a full catalog item by its primary genre
    pub fn from_item(item: &MediaItem) -> Self {
        Self {
            title: item.title.clone(),
            media_type: item.media_type,
            genre: item.genres.first().cloned(),
        }
    }
}

impl fmt::Display for RecommendedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.media_type.label())
    }
}

/// One answered request: what the user asked for and what we suggested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub at: DateTime<Utc>,
    pub request: String,
    pub recommended: Vec<RecommendedItem>,
}

/// One liked/disliked verdict on a recommended item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub at: DateTime<Utc>,
    pub item: RecommendedItem,
    pub feedback: Feedback,
}

/// An item the user saved for later
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub item: MediaRef,
    pub added_at: DateTime<Utc>,
}

/// Everything remembered about one user.
///
/// `Default` is the state of a user we have never seen; loading an
/// unknown user yields this rather than an error. Fields individually
/// default so documents written before a field existed still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub history: Vec<RequestRecord>,
    #[serde(default)]
    pub feedback: Vec<FeedbackRecord>,
    #[serde(default)]
    pub watchlist: Vec<WatchlistEntry>,
}

impl UserProfile {
    /// A user with no stated preferences and no interactions yet.
    ///
    /// The watchlist is ignored here: saving items for later says
    /// nothing about taste.
    pub fn is_new(&self) -> bool {
        !self.preferences.is_set() && self.history.is_empty() && self.feedback.is_empty()
    }

    /// Replace stated preferences, stamping the update time.
    pub fn set_preferences(&mut self, mut preferences: Preferences) {
        preferences.last_updated = Some(Utc::now());
        self.preferences = preferences;
    }

    /// Append an interaction record, dropping the oldest beyond the cap.
    pub fn record_request(&mut self, request: impl Into<String>, recommended: Vec<RecommendedItem>) {
        self.history.push(RequestRecord {
            at: Utc::now(),
            request: request.into(),
            recommended,
        });
        if self.history.len() > HISTORY_LIMIT {
            let excess = self.history.len() - HISTORY_LIMIT;
            self.history.drain(..excess);
        }
    }

    /// Record a liked/disliked verdict, dropping the oldest of that kind
    /// beyond the cap.
    pub fn record_feedback(&mut self, item: RecommendedItem, feedback: Feedback) {
        self.feedback.push(FeedbackRecord {
            at: Utc::now(),
            item,
            feedback,
        });
        while self.count_feedback(feedback) > FEEDBACK_LIMIT {
            if let Some(oldest) = self.feedback.iter().position(|f| f.feedback == feedback) {
                self.feedback.remove(oldest);
            }
        }
    }

    pub fn count_feedback(&self, kind: Feedback) -> usize {
        self.feedback.iter().filter(|f| f.feedback == kind).count()
    }

    /// Records of one kind, oldest first
    pub fn feedback_of(&self, kind: Feedback) -> impl Iterator<Item = &FeedbackRecord> {
        self.feedback.iter().filter(move |f| f.feedback == kind)
    }

    /// Add an item to the watchlist. Returns false if an equivalent item
    /// is already saved.
    pub fn add_to_watchlist(&mut self, item: MediaRef) -> bool {
        if self.watchlist.iter().any(|w| w.item.matches(&item)) {
            return false;
        }
        self.watchlist.push(WatchlistEntry {
            item,
            added_at: Utc::now(),
        });
        true
    }

    /// Remove an item from the watchlist. Returns whether it was there.
    pub fn remove_from_watchlist(&mut self, item: &MediaRef) -> bool {
        let before = self.watchlist.len();
        self.watchlist.retain(|w| !w.item.matches(item));
        self.watchlist.len() < before
    }

    /// Forget preferences, history, and feedback. The watchlist is a
    /// to-read/to-watch list the user curated, so it survives.
    pub fn clear_history(&mut self) {
        self.preferences = Preferences::default();
        self.history.clear();
        self.feedback.clear();
    }

    /// Render the profile as context for recommendation prompts.
    ///
    /// Sections appear only when there is something to say: stated
    /// preferences, the last three requests, the last five liked items,
    /// and the last three disliked items.
    pub fn context_summary(&self) -> String {
        if self.is_new() {
            return "New user - no previous preferences available.".to_string();
        }

        let mut lines: Vec<String> = Vec::new();

        if self.preferences.is_set() {
            let prefs = &self.preferences;
            lines.push("User preferences:".to_string());
            lines.push(format!(
                "- Preferred media type: {}",
                prefs
                    .media_type
                    .map_or("Not specified", |media_type| media_type.label())
            ));
            lines.push(format!(
                "- Preferred genre: {}",
                prefs.genre.as_deref().unwrap_or("Not specified")
            ));
            lines.push(format!(
                "- Typical mood: {}",
                prefs.mood.as_deref().unwrap_or("Not specified")
            ));
            lines.push(format!(
                "- Timeframe preference: {}",
                prefs.timeframe.as_deref().unwrap_or("Not specified")
            ));
        }

        if !self.history.is_empty() {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.push("Recent interaction history:".to_string());
            let start = self.history.len().saturating_sub(3);
            for (i, record) in self.history[start..].iter().enumerate() {
                lines.push(format!("{}. {}", i + 1, record.request));
            }
        }

        let liked: Vec<&FeedbackRecord> = self.feedback_of(Feedback::Liked).collect();
        if !liked.is_empty() {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.push("Previously liked items:".to_string());
            for record in liked.iter().rev().take(5).rev() {
                lines.push(format!("- {}", record.item));
            }
        }

        let disliked: Vec<&FeedbackRecord> = self.feedback_of(Feedback::Disliked).collect();
        if !disliked.is_empty() {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.push("Previously disliked items:".to_string());
            for record in disliked.iter().rev().take(3).rev() {
                lines.push(format!("- {}", record.item));
            }
        }

        lines.join("\n")
    }
}
