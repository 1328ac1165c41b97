//! Error types for profile persistence.
//!
//! Reads intentionally have no error type: a missing or unreadable
//! profile loads as the default profile. Only writes can fail.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Could not write profile for user '{user_id}': {source}")]
    Io {
        user_id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not serialize profile for user '{user_id}': {source}")]
    Serialization {
        user_id: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, ProfileError>;
