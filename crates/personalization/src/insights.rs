//! Aggregate patterns mined from a profile.
//!
//! Nothing here is stored; insights are recomputed from the capped
//! history and feedback lists on demand, so they always reflect the
//! current document.

use crate::profile::UserProfile;
use media::Feedback;
use std::collections::HashMap;

/// What a user's history says about their taste
#[derive(Debug, Clone, PartialEq)]
pub struct UserInsights {
    /// Genres of recommended items, most frequent first
    pub favorite_genres: Vec<(String, usize)>,
    /// Media types of recommended items, most frequent first
    pub preferred_media_types: Vec<(String, usize)>,
    pub liked: usize,
    pub disliked: usize,
    /// Share of feedback that was positive, as a percentage.
    /// `None` until the user has given any feedback.
    pub success_rate: Option<f32>,
    pub watchlist_size: usize,
}

impl UserInsights {
    pub fn for_profile(profile: &UserProfile) -> Self {
        let mut genres: HashMap<String, usize> = HashMap::new();
        let mut media_types: HashMap<String, usize> = HashMap::new();

        for record in &profile.history {
            for item in &record.recommended {
                if let Some(genre) = &item.genre {
                    *genres.entry(genre.clone()).or_insert(0) += 1;
                }
                *media_types
                    .entry(item.media_type.label().to_string())
                    .or_insert(0) += 1;
            }
        }

        let liked = profile.count_feedback(Feedback::Liked);
        let disliked = profile.count_feedback(Feedback::Disliked);
        let total = liked + disliked;
        let success_rate = if total > 0 {
            Some(liked as f32 / total as f32 * 100.0)
        } else {
            None
        };

        Self {
            favorite_genres: sorted_by_count(genres),
            preferred_media_types: sorted_by_count(media_types),
            liked,
            disliked,
            success_rate,
            watchlist_size: profile.watchlist.len(),
        }
    }
}

/// Highest count first; ties break alphabetically so output is stable
fn sorted_by_count(counts: HashMap<String, usize>) -> Vec<(String, usize)> {
    let mut entries: Vec<(String, usize)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries
}
