//! Cache configuration: storage location, TTL policy, timeout bounds.
//!
//! All knobs can be set three ways, later ones winning:
//! 1. Built-in defaults
//! 2. Environment variables read once at startup (`from_env`)
//! 3. `with_*` builder methods
//!
//! Configuration is never fatal: a malformed environment value is logged
//! as a warning and the default kept.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Directory used when no cache dir is configured
pub const DEFAULT_CACHE_DIR: &str = ".cache";

/// TTL applied to namespaces without an explicit policy (5 minutes)
pub const DEFAULT_TTL_SECONDS: u64 = 300;

/// Default TTL for the rating enrichment namespace (24 hours)
pub const RATING_CACHE_TTL_SECONDS: u64 = 86_400;

const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(60);

/// Tunable policy for a cache manager instance.
///
/// Rust concept: builder-style `with_*` methods take `mut self` and return
/// `Self`, so configuration chains read top to bottom.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory holding one JSON document per namespace
    pub cache_dir: PathBuf,
    /// TTL stamped on entries in namespaces without their own policy
    pub default_ttl_seconds: u64,
    /// Per-namespace TTL overrides
    pub namespace_ttls: HashMap<String, u64>,
    /// Bound on a single underlying fetch
    pub fetch_timeout: Duration,
    /// Bound on waiting for another caller's in-flight fetch
    pub lock_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let mut namespace_ttls = HashMap::new();
        namespace_ttls.insert("rating_cache".to_string(), RATING_CACHE_TTL_SECONDS);

        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            default_ttl_seconds: DEFAULT_TTL_SECONDS,
            namespace_ttls,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }
}

impl CacheConfig {
    /// Default knobs over a specific cache directory
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self::default().with_cache_dir(cache_dir)
    }

    /// Read configuration from the environment at startup.
    ///
    /// Recognized variables:
    /// - `MEDIA_RECS_CACHE_DIR` - storage directory
    /// - `MEDIA_RECS_DEFAULT_TTL` - default TTL in seconds
    /// - `MEDIA_RECS_NAMESPACE_TTLS` - comma list of `namespace=seconds`
    ///   (e.g., "api_cache=300,rating_cache=86400")
    /// - `MEDIA_RECS_FETCH_TIMEOUT` - fetch bound in seconds
    /// - `MEDIA_RECS_LOCK_TIMEOUT` - in-flight wait bound in seconds
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("MEDIA_RECS_CACHE_DIR") {
            if !dir.trim().is_empty() {
                config.cache_dir = PathBuf::from(dir.trim());
            }
        }
        if let Some(ttl) = read_env_seconds("MEDIA_RECS_DEFAULT_TTL") {
            config.default_ttl_seconds = ttl;
        }
        if let Ok(raw) = std::env::var("MEDIA_RECS_NAMESPACE_TTLS") {
            for (namespace, ttl) in parse_namespace_ttls(&raw) {
                config.namespace_ttls.insert(namespace, ttl);
            }
        }
        if let Some(seconds) = read_env_seconds("MEDIA_RECS_FETCH_TIMEOUT") {
            config.fetch_timeout = Duration::from_secs(seconds);
        }
        if let Some(seconds) = read_env_seconds("MEDIA_RECS_LOCK_TIMEOUT") {
            config.lock_timeout = Duration::from_secs(seconds);
        }

        config
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn with_default_ttl(mut self, seconds: u64) -> Self {
        self.default_ttl_seconds = seconds;
        self
    }

    /// Set the TTL policy for one namespace
    pub fn with_namespace_ttl(mut self, namespace: impl Into<String>, seconds: u64) -> Self {
        self.namespace_ttls.insert(namespace.into(), seconds);
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// TTL stamped on new entries in `namespace`
    pub fn ttl_for(&self, namespace: &str) -> u64 {
        self.namespace_ttls
            .get(namespace)
            .copied()
            .unwrap_or(self.default_ttl_seconds)
    }
}

fn read_env_seconds(name: &str) -> Option<u64> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(seconds) => Some(seconds),
        Err(_) => {
            warn!(
                "Ignoring {}: '{}' is not a whole number of seconds",
                name, raw
            );
            None
        }
    }
}

/// Parse a comma list of `namespace=seconds` pairs.
///
/// Malformed pairs are skipped with a warning so one typo never takes the
/// whole configuration down.
fn parse_namespace_ttls(raw: &str) -> Vec<(String, u64)> {
    let mut parsed = Vec::new();

    for pair in raw.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        match pair.split_once('=') {
            Some((namespace, seconds)) => match seconds.trim().parse::<u64>() {
                Ok(ttl) if !namespace.trim().is_empty() => {
                    parsed.push((namespace.trim().to_string(), ttl));
                }
                _ => warn!("Ignoring malformed namespace TTL pair: '{}'", pair),
            },
            None => warn!("Ignoring malformed namespace TTL pair: '{}'", pair),
        }
    }

    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.cache_dir, PathBuf::from(".cache"));
        assert_eq!(config.default_ttl_seconds, 300);
        assert_eq!(config.ttl_for("rating_cache"), 86_400);
        assert_eq!(config.ttl_for("api_cache"), 300);
    }

    #[test]
    fn test_builder_chain() {
        let config = CacheConfig::new("/tmp/recs-cache")
            .with_default_ttl(120)
            .with_namespace_ttl("api_cache", 60)
            .with_fetch_timeout(Duration::from_secs(5))
            .with_lock_timeout(Duration::from_secs(10));

        assert_eq!(config.cache_dir, PathBuf::from("/tmp/recs-cache"));
        assert_eq!(config.ttl_for("api_cache"), 60);
        assert_eq!(config.ttl_for("anything_else"), 120);
        assert_eq!(config.fetch_timeout, Duration::from_secs(5));
        assert_eq!(config.lock_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_parse_namespace_ttls_happy_path() {
        let pairs = parse_namespace_ttls("api_cache=300,rating_cache=86400");
        assert_eq!(
            pairs,
            vec![
                ("api_cache".to_string(), 300),
                ("rating_cache".to_string(), 86_400)
            ]
        );
    }

    #[test]
    fn test_parse_namespace_ttls_tolerates_whitespace_and_blanks() {
        let pairs = parse_namespace_ttls(" api_cache = 300 , , rating_cache=10 ");
        assert_eq!(
            pairs,
            vec![
                ("api_cache".to_string(), 300),
                ("rating_cache".to_string(), 10)
            ]
        );
    }

    #[test]
    fn test_parse_namespace_ttls_skips_malformed_pairs() {
        let pairs = parse_namespace_ttls("good=5,bad,also_bad=xyz,=9,fine=7");
        assert_eq!(
            pairs,
            vec![("good".to_string(), 5), ("fine".to_string(), 7)]
        );
    }
}
