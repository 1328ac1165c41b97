//! Cache entry representation and freshness rules.
//!
//! Every cached value carries its own expiry metadata, stamped when the
//! entry is stored. Freshness is always judged against the entry's own
//! recorded TTL, so entries written with different policies can coexist
//! in one namespace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single cached value with its expiry metadata.
///
/// Invariant: the entry is fresh iff `now - stored_at < ttl_seconds`.
/// An expired entry is logically absent even while it still exists on
/// disk; only explicit invalidation or a purge removes it physically.
///
/// The persisted form is exactly these three fields. Documents written by
/// newer versions may carry extra fields; they are ignored on load (serde's
/// default), which keeps old readers working against new documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cached payload, kept as raw JSON so one namespace can hold
    /// values of different shapes
    pub value: Value,
    /// When this entry was written
    pub stored_at: DateTime<Utc>,
    /// How long past `stored_at` the entry stays fresh
    pub ttl_seconds: u64,
}

impl CacheEntry {
    /// Create an entry stamped with the current time
    pub fn new(value: Value, ttl_seconds: u64) -> Self {
        Self {
            value,
            stored_at: Utc::now(),
            ttl_seconds,
        }
    }

    /// Whether this entry is still fresh at `now`.
    ///
    /// A `stored_at` in the future (clock skew) counts as fresh; age only
    /// accumulates forward.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        let age_seconds = now.signed_duration_since(self.stored_at).num_seconds();
        age_seconds < self.ttl_seconds.min(i64::MAX as u64) as i64
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        !self.is_fresh(now)
    }
}
