//! # Personalization Crate
//!
//! Per-user profiles for the recommendation service: stated
//! preferences, interaction history, liked/disliked feedback, and a
//! watchlist, persisted as one JSON document per user.
//!
//! ## Main Components
//!
//! - **`UserProfile`**: The profile document and its mutation rules
//!   (capped lists, watchlist identity, context rendering)
//! - **`PersonalizationStore`**: Durable storage with per-user write
//!   locking; unknown users load as the default profile
//! - **`UserInsights`**: Taste patterns recomputed from the profile
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use personalization::PersonalizationStore;
//!
//! # fn demo() -> std::io::Result<()> {
//! let store = PersonalizationStore::open("profiles")?;
//!
//! // Never a "not found": a fresh user is just a default profile
//! let profile = store.load("user42");
//! assert!(profile.is_new());
//! # Ok(())
//! # }
//! ```
//!
//! ## Learning Goals
//!
//! This crate demonstrates:
//! - Defaults instead of errors for absent data
//! - Per-key async locking for read-modify-write sequences
//! - Whole-document persistence with bounded document size

pub mod error;
pub mod insights;
pub mod profile;
pub mod store;

pub use error::{ProfileError, Result};
pub use insights::UserInsights;
pub use profile::{
    FeedbackRecord, Preferences, RecommendedItem, RequestRecord, UserProfile, WatchlistEntry,
    FEEDBACK_LIMIT, HISTORY_LIMIT,
};
pub use store::PersonalizationStore;
