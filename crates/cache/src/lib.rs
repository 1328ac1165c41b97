//! # Cache Crate
//!
//! Disk-backed response cache for the recommendation service. External
//! lookups (catalog searches, rating fetches) are expensive and rate
//! limited, so their results are cached as JSON documents that survive
//! process restarts.
//!
//! ## Main Components
//!
//! - **`CacheEntry`**: A stored value with its timestamp and TTL
//! - **`CacheStore`**: One JSON document per namespace, loaded at startup
//!   and rewritten on every change
//! - **`CacheManager`**: The shared front end with TTL-aware reads,
//!   write-through sets, and fetch coalescing via
//!   [`get_or_fetch`](CacheManager::get_or_fetch)
//! - **`CacheConfig`**: Directory, TTL policy, and timeout knobs, with
//!   environment overrides
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use cache::{CacheConfig, CacheManager};
//!
//! # async fn demo() -> cache::Result<()> {
//! let manager = CacheManager::open(CacheConfig::default())?;
//!
//! // Ten concurrent callers of the same key produce one fetch; the
//! // other nine wait and reuse its result.
//! let titles: Vec<String> = manager
//!     .get_or_fetch("api_cache", "movies:genre=sci-fi", || async {
//!         Ok(vec!["Dune".to_string()])
//!     })
//!     .await?;
//! # let _ = titles;
//! # Ok(())
//! # }
//! ```
//!
//! ## Learning Goals
//!
//! This crate demonstrates:
//! - Lazy expiry: reads treat stale entries as misses without deleting
//!   them
//! - Request coalescing with a per-key lock table that grows and shrinks
//!   with traffic
//! - Degrading on failure: corrupt documents and failed writes log a
//!   warning and keep serving

pub mod config;
pub mod entry;
pub mod error;
pub mod manager;
pub mod store;

pub use config::CacheConfig;
pub use entry::CacheEntry;
pub use error::{CacheError, Result};
pub use manager::{CacheManager, CacheStats};
pub use store::{CacheStore, NamespaceStats};
