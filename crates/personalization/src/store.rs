//! Durable per-user profile storage.
//!
//! Each user's profile is one JSON document at
//! `<profile_dir>/<user_id>.json`, rewritten whole on every change.
//! Documents are small (capped lists), so whole-document writes keep
//! recovery trivial: the file on disk is always a complete profile.
//!
//! Writes for one user are serialized through a per-user async lock,
//! making read-modify-write sequences safe when two requests touch the
//! same profile at once. Different users never contend.
//!
//! Reads never fail: an absent, unreadable, or corrupt document loads
//! as the default profile with a logged warning (see
//! [`UserProfile::is_new`]).

use crate::error::{ProfileError, Result};
use crate::insights::UserInsights;
use crate::profile::{Preferences, RecommendedItem, UserProfile, WatchlistEntry};
use dashmap::DashMap;
use media::{Feedback, MediaRef};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Profile storage shared across the application.
pub struct PersonalizationStore {
    profile_dir: PathBuf,
    /// One write lock per user seen this process
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl PersonalizationStore {
    /// Open the store, creating the profile directory if needed.
    pub fn open(profile_dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let profile_dir = profile_dir.into();
        std::fs::create_dir_all(&profile_dir)?;
        info!("Profile store ready at {}", profile_dir.display());
        Ok(Self {
            profile_dir,
            locks: DashMap::new(),
        })
    }

    pub fn profile_dir(&self) -> &Path {
        &self.profile_dir
    }

    /// Where a user's document lives on disk
    pub fn profile_path(&self, user_id: &str) -> PathBuf {
        self.profile_dir.join(format!("{}.json", file_name(user_id)))
    }

    /// How many profile documents are stored on disk.
    pub fn profile_count(&self) -> usize {
        match std::fs::read_dir(&self.profile_dir) {
            Ok(dir) => dir
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "json"))
                .count(),
            Err(_) => 0,
        }
    }

    /// Load a user's profile. Unknown users get the default profile;
    /// corrupt documents load as default with a warning.
    pub fn load(&self, user_id: &str) -> UserProfile {
        let path = self.profile_path(user_id);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No profile for '{}' yet, using defaults", user_id);
                return UserProfile::default();
            }
            Err(e) => {
                warn!("Could not read profile {}: {}", path.display(), e);
                return UserProfile::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(profile) => profile,
            Err(e) => {
                warn!(
                    "Corrupt profile {} ({}); starting '{}' from defaults",
                    path.display(),
                    e,
                    user_id
                );
                UserProfile::default()
            }
        }
    }

    /// Write a user's profile, replacing whatever was stored.
    pub async fn save(&self, user_id: &str, profile: &UserProfile) -> Result<()> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;
        self.write_document(user_id, profile).await
    }

    /// Read-modify-write a profile under the user's lock, returning the
    /// profile as saved.
    ///
    /// All the convenience mutators below go through here, so
    /// concurrent updates to one user cannot lose each other's changes.
    pub async fn update<F>(&self, user_id: &str, mutate: F) -> Result<UserProfile>
    where
        F: FnOnce(&mut UserProfile),
    {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;
        let mut profile = self.load(user_id);
        mutate(&mut profile);
        self.write_document(user_id, &profile).await?;
        Ok(profile)
    }

    /// Forget a user entirely. Returns whether a document existed.
    pub async fn delete(&self, user_id: &str) -> Result<bool> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;
        match tokio::fs::remove_file(self.profile_path(user_id)).await {
            Ok(()) => {
                info!("Deleted profile for '{}'", user_id);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(ProfileError::Io {
                user_id: user_id.to_string(),
                source,
            }),
        }
    }

    // ==================================================================
    // Convenience operations used by the service and CLI
    // ==================================================================

    pub async fn set_preferences(&self, user_id: &str, preferences: Preferences) -> Result<UserProfile> {
        self.update(user_id, |profile| profile.set_preferences(preferences))
            .await
    }

    pub async fn record_request(
        &self,
        user_id: &str,
        request: &str,
        recommended: Vec<RecommendedItem>,
    ) -> Result<UserProfile> {
        self.update(user_id, |profile| {
            profile.record_request(request, recommended)
        })
        .await
    }

    pub async fn record_feedback(
        &self,
        user_id: &str,
        item: RecommendedItem,
        feedback: Feedback,
    ) -> Result<UserProfile> {
        self.update(user_id, |profile| profile.record_feedback(item, feedback))
            .await
    }

    /// Returns false when an equivalent item was already saved.
    pub async fn add_to_watchlist(&self, user_id: &str, item: MediaRef) -> Result<bool> {
        let mut added = false;
        self.update(user_id, |profile| {
            added = profile.add_to_watchlist(item);
        })
        .await?;
        Ok(added)
    }

    /// Returns whether the item was on the list.
    pub async fn remove_from_watchlist(&self, user_id: &str, item: &MediaRef) -> Result<bool> {
        let mut removed = false;
        self.update(user_id, |profile| {
            removed = profile.remove_from_watchlist(item);
        })
        .await?;
        Ok(removed)
    }

    pub fn watchlist(&self, user_id: &str) -> Vec<WatchlistEntry> {
        self.load(user_id).watchlist
    }

    pub async fn clear_history(&self, user_id: &str) -> Result<UserProfile> {
        self.update(user_id, |profile| profile.clear_history()).await
    }

    /// Prompt context for this user; see [`UserProfile::context_summary`].
    pub fn context(&self, user_id: &str) -> String {
        self.load(user_id).context_summary()
    }

    /// Aggregate patterns from this user's history and feedback.
    pub fn insights(&self, user_id: &str) -> UserInsights {
        UserInsights::for_profile(&self.load(user_id))
    }

    fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        if let Some(existing) = self.locks.get(user_id) {
            return existing.clone();
        }
        self.locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Caller must hold the user's lock.
    async fn write_document(&self, user_id: &str, profile: &UserProfile) -> Result<()> {
        let json = serde_json::to_vec_pretty(profile).map_err(|source| {
            ProfileError::Serialization {
                user_id: user_id.to_string(),
                source,
            }
        })?;

        let io_err = |source| ProfileError::Io {
            user_id: user_id.to_string(),
            source,
        };

        let path = self.profile_path(user_id);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &path).await.map_err(io_err)?;

        debug!("Saved profile for '{}' to {}", user_id, path.display());
        Ok(())
    }
}

/// File-safe rendition of a user id
fn file_name(user_id: &str) -> String {
    user_id
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
