//! # Media Crate
//!
//! Shared domain types for the media recommendation stack.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (MediaType, MediaItem, MediaRef, Feedback)
//! - **request**: Request shapes and their deterministic cache keys
//!
//! ## Example Usage
//!
//! ```ignore
//! use media::{MediaRequest, MediaType};
//!
//! let request = MediaRequest::discover(MediaType::Movie, "Sci-Fi");
//!
//! // Equal requests always derive equal keys, so the live request path
//! // and the cache warmer address the same entries.
//! assert_eq!(request.cache_key(), "movies:genre=sci-fi");
//! ```

// Public modules
pub mod request;
pub mod types;

// Re-export commonly used types for convenience
pub use request::MediaRequest;
pub use types::{Feedback, MediaItem, MediaRef, MediaType, ParseMediaTypeError};
