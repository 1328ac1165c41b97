use anyhow::{Context, Result};
use cache::{CacheConfig, CacheManager};
use clap::{Parser, Subcommand};
use colored::Colorize;
use media::{Feedback, MediaRef, MediaRequest, MediaType};
use personalization::{PersonalizationStore, Preferences, RecommendedItem};
use service::{
    CacheWarmer, MediaService, Recommendation, SampleCatalog, WarmSeed, API_CACHE_NAMESPACE,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The sample catalog stands in for a remote API; the added latency
/// makes cache hits visibly faster than upstream round trips
const UPSTREAM_LATENCY: Duration = Duration::from_millis(400);

/// MediaRecs - cached, personalized media recommendations
#[derive(Parser)]
#[command(name = "media-recs")]
#[command(about = "Media recommendations served through a persistent response cache", long_about = None)]
struct Cli {
    /// Cache directory (overrides MEDIA_RECS_CACHE_DIR)
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Profile directory (overrides MEDIA_RECS_PROFILE_DIR)
    #[arg(long)]
    profile_dir: Option<PathBuf>,

    /// User the command acts as
    #[arg(long, default_value = "default")]
    user: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get recommendations for a genre
    Discover {
        /// Media type to browse (movie, book, or tv)
        #[arg(long)]
        media_type: MediaType,

        /// Genre to browse, e.g. "sci-fi"
        #[arg(long)]
        genre: String,

        /// Narrow to a timeframe ("recent" or "classic")
        #[arg(long)]
        timeframe: Option<String>,

        /// Number of recommendations to return
        #[arg(long, default_value = "5")]
        limit: usize,
    },

    /// Search titles across media types
    Search {
        /// Text to look for in titles (case-insensitive)
        #[arg(long)]
        query: String,

        /// Restrict to these media types (repeatable); all when omitted
        #[arg(long = "media-type")]
        media_types: Vec<MediaType>,

        /// Number of results to return
        #[arg(long, default_value = "5")]
        limit: usize,
    },

    /// Show what is popular for one media type
    Trending {
        /// Media type to rank
        #[arg(long)]
        media_type: MediaType,

        /// Number of results to return
        #[arg(long, default_value = "5")]
        limit: usize,
    },

    /// Pre-fetch popular requests into the cache
    Warm {
        /// Comma-separated seeds like "movie:sci-fi,tv:drama"
        /// (defaults to MEDIA_RECS_WARM_SEEDS or a built-in list)
        #[arg(long)]
        seeds: Option<String>,
    },

    /// Show cache and profile statistics
    Stats,

    /// Physically remove expired cache entries
    Cleanup,

    /// Remove one cache entry
    Invalidate {
        /// Namespace the entry lives in
        #[arg(long)]
        namespace: String,

        /// Exact cache key, e.g. "movies:genre=sci-fi"
        #[arg(long)]
        key: String,
    },

    /// Remove every entry in one cache namespace
    Clear {
        /// Namespace to empty
        #[arg(long)]
        namespace: String,
    },

    /// Inspect or update the active user's profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Measure the cache under concurrent load
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,

        /// How many distinct requests the load is spread over
        #[arg(long, default_value = "5")]
        distinct_keys: usize,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Print the stored profile
    Show,

    /// Aggregate taste patterns from history and feedback
    Insights,

    /// Save stated preferences (warms the chosen genre in the background)
    Prefs {
        /// Preferred media type
        #[arg(long)]
        media_type: Option<MediaType>,

        /// Preferred genre
        #[arg(long)]
        genre: Option<String>,

        /// Typical mood, e.g. "thoughtful"
        #[arg(long)]
        mood: Option<String>,

        /// Timeframe preference ("recent" or "classic")
        #[arg(long)]
        timeframe: Option<String>,
    },

    /// Record a liked/disliked verdict on an item
    Feedback {
        /// Exact title of the item
        #[arg(long)]
        title: String,

        /// The item's media type
        #[arg(long)]
        media_type: MediaType,

        /// Genre to credit the verdict to (improves future ranking)
        #[arg(long)]
        genre: Option<String>,

        /// The user liked it
        #[arg(long, conflicts_with = "disliked", required_unless_present = "disliked")]
        liked: bool,

        /// The user disliked it
        #[arg(long)]
        disliked: bool,
    },

    /// Save an item to watch later
    WatchlistAdd {
        /// Exact title of the item
        #[arg(long)]
        title: String,

        /// The item's media type
        #[arg(long)]
        media_type: MediaType,
    },

    /// Drop an item from the watchlist
    WatchlistRemove {
        /// Exact title of the item
        #[arg(long)]
        title: String,

        /// The item's media type
        #[arg(long)]
        media_type: MediaType,
    },

    /// Forget preferences, history, and feedback (watchlist stays)
    ClearHistory,

    /// Delete the stored profile entirely
    Delete,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Benchmark provisions its own throwaway stores, so it skips the
    // shared ones below
    if let Commands::Benchmark {
        requests,
        concurrent,
        distinct_keys,
    } = &cli.command
    {
        return handle_benchmark(*requests, *concurrent, *distinct_keys).await;
    }

    // Open the shared cache and profile stores
    let config = cache_config(&cli);
    println!("Opening cache at {}...", config.cache_dir.display());
    let start = Instant::now();
    let cache = Arc::new(CacheManager::open(config).context("Failed to open cache store")?);
    let profiles = Arc::new(
        PersonalizationStore::open(profile_dir(&cli)).context("Failed to open profile store")?,
    );
    println!("{} Stores ready in {:?}", "✓".green(), start.elapsed());

    let catalog = Arc::new(SampleCatalog::new().with_latency(UPSTREAM_LATENCY));
    let service = Arc::new(MediaService::new(
        cache.clone(),
        profiles.clone(),
        catalog.clone(),
    ));

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Discover {
            media_type,
            genre,
            timeframe,
            limit,
        } => {
            let request = MediaRequest::Discover {
                media_type,
                genre,
                timeframe,
            };
            handle_request(&service, &catalog, &cli.user, request, limit).await?
        }
        Commands::Search {
            query,
            media_types,
            limit,
        } => {
            let request = MediaRequest::search(query, media_types);
            handle_request(&service, &catalog, &cli.user, request, limit).await?
        }
        Commands::Trending { media_type, limit } => {
            let request = MediaRequest::Trending { media_type };
            handle_request(&service, &catalog, &cli.user, request, limit).await?
        }
        Commands::Warm { seeds } => handle_warm(service.clone(), &cache, seeds).await?,
        Commands::Stats => handle_stats(&cache, &profiles)?,
        Commands::Cleanup => handle_cleanup(&cache).await?,
        Commands::Invalidate { namespace, key } => {
            handle_invalidate(&cache, &namespace, &key).await?
        }
        Commands::Clear { namespace } => handle_clear(&cache, &namespace).await?,
        Commands::Profile { action } => {
            handle_profile(service.clone(), &profiles, &cli.user, action).await?
        }
        Commands::Benchmark { .. } => unreachable!("dispatched before the stores open"),
    }

    Ok(())
}

/// Environment-derived cache configuration with CLI flags layered on top
fn cache_config(cli: &Cli) -> CacheConfig {
    let mut config = CacheConfig::from_env();
    if let Some(dir) = &cli.cache_dir {
        config = config.with_cache_dir(dir);
    }
    config
}

/// Profile directory: flag, then MEDIA_RECS_PROFILE_DIR, then ./profiles
fn profile_dir(cli: &Cli) -> PathBuf {
    if let Some(dir) = &cli.profile_dir {
        return dir.clone();
    }
    std::env::var("MEDIA_RECS_PROFILE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("profiles"))
}

/// Handle the 'discover', 'search', and 'trending' commands, which all
/// run one request through the personalized path
async fn handle_request(
    service: &MediaService,
    catalog: &SampleCatalog,
    user: &str,
    request: MediaRequest,
    limit: usize,
) -> Result<()> {
    let fetches_before = catalog.fetch_count();
    let start = Instant::now();
    let recommendation = service.recommend(user, &request, limit).await?;
    let elapsed = start.elapsed();
    let fetched = catalog.fetch_count() - fetches_before;

    print_recommendation(&request, &recommendation);

    let source = if fetched == 0 {
        "cache".green()
    } else {
        "upstream".yellow()
    };
    println!("\n{} Answered from {} in {:?}", "✓".green(), source, elapsed);
    Ok(())
}

/// Handle the 'warm' command
async fn handle_warm(
    service: Arc<MediaService>,
    cache: &CacheManager,
    seeds: Option<String>,
) -> Result<()> {
    let seeds = match seeds {
        Some(raw) => WarmSeed::parse_list(&raw),
        None => WarmSeed::from_env(),
    };
    if seeds.is_empty() {
        anyhow::bail!("No valid warm seeds given (expected e.g. \"movie:sci-fi,tv:drama\")");
    }

    let stats_before = cache.stats();
    let warmer = CacheWarmer::new(service);
    let start = Instant::now();
    warmer.warm(seeds.iter().cloned());
    warmer.wait().await;

    println!("{}", "Warm results:".bold().blue());
    for seed in &seeds {
        let key = seed.request().cache_key();
        if cache.get_entry(API_CACHE_NAMESPACE, &key).is_some() {
            println!("{} {} -> {}", "✓".green(), seed, key);
        } else {
            println!("{} {} (fetch failed, see log)", "✗".red(), seed);
        }
    }

    let stats = cache.stats();
    println!(
        "\n{} Warmed in {:?} ({} fetched fresh, {} already cached)",
        "✓".green(),
        start.elapsed(),
        stats.fetches - stats_before.fetches,
        stats.hits - stats_before.hits,
    );
    Ok(())
}

/// Handle the 'stats' command
fn handle_stats(cache: &CacheManager, profiles: &PersonalizationStore) -> Result<()> {
    let stats = cache.stats();

    println!("{}", "Cache:".bold().blue());
    println!("{}Directory: {}", "• ".green(), stats.cache_dir.display());
    println!(
        "{}Lookups: {} hits / {} misses ({} of those expired)",
        "• ".green(),
        stats.hits,
        stats.misses,
        stats.expired_misses
    );
    println!(
        "{}Fetches: {} ({} failed)",
        "• ".green(),
        stats.fetches,
        stats.fetch_errors
    );
    println!(
        "{}In-flight coalescing locks: {}",
        "• ".green(),
        stats.in_flight_locks
    );
    if stats.namespaces.is_empty() {
        println!("{}Namespaces: none yet", "• ".cyan());
    } else {
        println!("{}Namespaces:", "• ".cyan());
        for ns in &stats.namespaces {
            println!(
                "  - {}: {} entries ({} expired) at {}",
                ns.name,
                ns.total_entries,
                ns.expired_entries,
                cache.document_path(&ns.name).display()
            );
        }
    }

    println!("\n{}", "Profiles:".bold().blue());
    println!(
        "{}Directory: {}",
        "• ".green(),
        profiles.profile_dir().display()
    );
    println!(
        "{}Stored profiles: {}",
        "• ".green(),
        profiles.profile_count()
    );
    Ok(())
}

/// Handle the 'cleanup' command
async fn handle_cleanup(cache: &CacheManager) -> Result<()> {
    let removed = cache.purge_expired().await?;
    if removed == 0 {
        println!(
            "{} Nothing to remove; every stored entry is still fresh",
            "✓".green()
        );
    } else {
        println!("{} Removed {} expired entries", "✓".green(), removed);
    }
    Ok(())
}

/// Handle the 'invalidate' command
async fn handle_invalidate(cache: &CacheManager, namespace: &str, key: &str) -> Result<()> {
    if cache.invalidate(namespace, key).await? {
        println!("{} Removed {}:{}", "✓".green(), namespace, key);
    } else {
        println!("No entry stored at {}:{}", namespace, key);
    }
    Ok(())
}

/// Handle the 'clear' command
async fn handle_clear(cache: &CacheManager, namespace: &str) -> Result<()> {
    let removed = cache.clear_namespace(namespace).await?;
    println!(
        "{} Cleared namespace '{}' ({} entries)",
        "✓".green(),
        namespace,
        removed
    );
    Ok(())
}

/// Dispatch the 'profile' subcommands
async fn handle_profile(
    service: Arc<MediaService>,
    profiles: &PersonalizationStore,
    user: &str,
    action: ProfileAction,
) -> Result<()> {
    match action {
        ProfileAction::Show => handle_profile_show(profiles, user),
        ProfileAction::Insights => handle_profile_insights(profiles, user),
        ProfileAction::Prefs {
            media_type,
            genre,
            mood,
            timeframe,
        } => {
            handle_profile_prefs(service, profiles, user, media_type, genre, mood, timeframe)
                .await?
        }
        ProfileAction::Feedback {
            title,
            media_type,
            genre,
            liked,
            disliked: _,
        } => handle_profile_feedback(profiles, user, title, media_type, genre, liked).await?,
        ProfileAction::WatchlistAdd { title, media_type } => {
            let item = MediaRef::new(title, media_type);
            if profiles.add_to_watchlist(user, item.clone()).await? {
                println!("{} Added {} to the watchlist", "✓".green(), item);
            } else {
                println!("{} is already on the watchlist", item);
            }
        }
        ProfileAction::WatchlistRemove { title, media_type } => {
            let item = MediaRef::new(title, media_type);
            if profiles.remove_from_watchlist(user, &item).await? {
                println!("{} Removed {} from the watchlist", "✓".green(), item);
            } else {
                println!("{} was not on the watchlist", item);
            }
        }
        ProfileAction::ClearHistory => {
            profiles.clear_history(user).await?;
            println!(
                "{} Cleared preferences, history, and feedback for '{}'",
                "✓".green(),
                user
            );
        }
        ProfileAction::Delete => {
            if profiles.delete(user).await? {
                println!("{} Deleted profile for '{}'", "✓".green(), user);
            } else {
                println!("No stored profile for '{}'", user);
            }
        }
    }
    Ok(())
}

/// Handle 'profile show'
fn handle_profile_show(profiles: &PersonalizationStore, user: &str) {
    let profile = profiles.load(user);
    println!("{}", format!("Profile for '{}':", user).bold().blue());

    let prefs = &profile.preferences;
    println!(
        "{}Preferred media type: {}",
        "• ".green(),
        option_label(prefs.media_type.map(|t| t.label().to_string()))
    );
    println!(
        "{}Preferred genre: {}",
        "• ".green(),
        option_label(prefs.genre.clone())
    );
    println!(
        "{}Typical mood: {}",
        "• ".green(),
        option_label(prefs.mood.clone())
    );
    println!(
        "{}Timeframe: {}",
        "• ".green(),
        option_label(prefs.timeframe.clone())
    );

    println!(
        "{}Requests remembered: {}",
        "• ".cyan(),
        profile.history.len()
    );
    println!(
        "{}Feedback: {} liked / {} disliked",
        "• ".cyan(),
        profile.count_feedback(Feedback::Liked),
        profile.count_feedback(Feedback::Disliked)
    );
    if profile.watchlist.is_empty() {
        println!("{}Watchlist: empty", "• ".cyan());
    } else {
        println!("{}Watchlist:", "• ".cyan());
        for entry in &profile.watchlist {
            println!(
                "  - {} (added {})",
                entry.item,
                entry.added_at.format("%Y-%m-%d")
            );
        }
    }

    println!("\n{}", "Context used for recommendations:".bold().blue());
    println!("{}", profile.context_summary());
}

/// Handle 'profile insights'
fn handle_profile_insights(profiles: &PersonalizationStore, user: &str) {
    let insights = profiles.insights(user);
    println!("{}", format!("Insights for '{}':", user).bold().blue());

    if insights.favorite_genres.is_empty() {
        println!("{}Favorite genres: not enough history yet", "• ".green());
    } else {
        println!("{}Favorite genres:", "• ".green());
        for (genre, count) in &insights.favorite_genres {
            println!("  - {} (seen {} times)", genre, count);
        }
    }
    if insights.preferred_media_types.is_empty() {
        println!("{}Media type lean: not enough history yet", "• ".green());
    } else {
        println!("{}Media type lean:", "• ".green());
        for (label, count) in &insights.preferred_media_types {
            println!("  - {} (seen {} times)", label, count);
        }
    }

    println!(
        "{}Feedback: {} liked / {} disliked",
        "• ".cyan(),
        insights.liked,
        insights.disliked
    );
    match insights.success_rate {
        Some(rate) => println!("{}Success rate: {:.0}%", "• ".cyan(), rate),
        None => println!("{}Success rate: no feedback yet", "• ".cyan()),
    }
    println!("{}Watchlist size: {}", "• ".cyan(), insights.watchlist_size);
}

/// Handle 'profile prefs'
async fn handle_profile_prefs(
    service: Arc<MediaService>,
    profiles: &PersonalizationStore,
    user: &str,
    media_type: Option<MediaType>,
    genre: Option<String>,
    mood: Option<String>,
    timeframe: Option<String>,
) -> Result<()> {
    let preferences = Preferences {
        media_type,
        genre: genre.clone(),
        mood,
        timeframe,
        last_updated: None,
    };
    profiles.set_preferences(user, preferences).await?;
    println!("{} Preferences saved for '{}'", "✓".green(), user);

    // Picking a genre kicks off a warm pass, the same way the app
    // pre-fetches when a user changes their settings
    if let (Some(media_type), Some(genre)) = (media_type, genre) {
        println!(
            "  Warming {} {} in the background...",
            genre,
            media_type.plural()
        );
        let warmer = CacheWarmer::new(service);
        warmer.warm_genre(media_type, &genre);
        warmer.wait().await;
        println!(
            "{} The next discover for that genre is a cache hit",
            "✓".green()
        );
    }
    Ok(())
}

/// Handle 'profile feedback'
async fn handle_profile_feedback(
    profiles: &PersonalizationStore,
    user: &str,
    title: String,
    media_type: MediaType,
    genre: Option<String>,
    liked: bool,
) -> Result<()> {
    let feedback = if liked {
        Feedback::Liked
    } else {
        Feedback::Disliked
    };
    let item = RecommendedItem::new(title, media_type, genre);
    profiles
        .record_feedback(user, item.clone(), feedback)
        .await?;

    match feedback {
        Feedback::Liked => println!("{} Recorded that '{}' liked {}", "✓".green(), user, item),
        Feedback::Disliked => println!(
            "{} Recorded that '{}' disliked {}; it won't come up again",
            "✓".green(),
            user,
            item
        ),
    }
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(requests: usize, concurrent: usize, distinct_keys: usize) -> Result<()> {
    anyhow::ensure!(
        requests > 0 && concurrent > 0 && distinct_keys > 0,
        "requests, concurrent, and distinct-keys must all be at least 1"
    );

    // An isolated stack over a slow catalog, so the numbers show what
    // caching and coalescing buy rather than what a previous run stored
    let scratch = std::env::temp_dir().join(format!("media-recs-bench-{}", std::process::id()));
    let cache = Arc::new(
        CacheManager::open(CacheConfig::new(scratch.join("cache")))
            .context("Failed to open benchmark cache")?,
    );
    let profiles = Arc::new(
        PersonalizationStore::open(scratch.join("profiles"))
            .context("Failed to open benchmark profiles")?,
    );
    let catalog = Arc::new(SampleCatalog::new().with_latency(Duration::from_millis(250)));
    let service = Arc::new(MediaService::new(cache.clone(), profiles, catalog.clone()));

    let seeds = benchmark_requests(distinct_keys);

    // Assign each request a random key, like real traffic hammering a
    // handful of popular queries
    let picks: Vec<usize> = (0..requests)
        .map(|_| rand::random::<u32>() as usize % seeds.len())
        .collect();
    let mut touched = picks.clone();
    touched.sort_unstable();
    touched.dedup();
    let distinct_hit = touched.len();

    println!(
        "Running {} requests ({} concurrent) over {} distinct keys...",
        requests, concurrent, distinct_keys
    );

    // Use tokio::spawn to make concurrent requests, bounded by a
    // semaphore so at most `concurrent` run at once
    let semaphore = Arc::new(tokio::sync::Semaphore::new(concurrent));
    let started = Instant::now();
    let mut handles = vec![];
    for pick in picks {
        let request = seeds[pick].clone();
        let service = service.clone();
        let semaphore = semaphore.clone();
        let handle = tokio::spawn(async move {
            let _permit = semaphore.acquire().await?;
            let start = Instant::now();
            service.discover(&request).await?;
            Ok::<_, anyhow::Error>(start.elapsed())
        });
        handles.push(handle);
    }

    // Wait for all tasks to complete and collect timings
    let mut timings = vec![];
    for handle in handles {
        let elapsed = handle.await??;
        timings.push(elapsed);
    }
    let wall_time = started.elapsed();

    // Calculate and display statistics
    let total_time: Duration = timings.iter().sum();
    let avg_latency = total_time / (timings.len() as u32);
    timings.sort();
    let p50 = timings[timings.len() / 2];
    let p95 = timings[(timings.len() as f32 * 0.95) as usize];
    let p99 = timings[(timings.len() as f32 * 0.99) as usize];
    let throughput = requests as f32 / wall_time.as_secs_f32();

    println!("\n{}", "Benchmark results:".bold().blue());
    println!("Total time: {:?}", wall_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", p50);
    println!("P95 latency: {:?}", p95);
    println!("P99 latency: {:?}", p99);
    println!("Throughput: {:.2} requests/second", throughput);

    let stats = cache.stats();
    println!(
        "\nUpstream fetches: {} (distinct keys requested: {})",
        catalog.fetch_count(),
        distinct_hit
    );
    println!("Lookups: {} hits / {} misses", stats.hits, stats.misses);
    if catalog.fetch_count() == distinct_hit {
        println!(
            "{} Every repeat was served from cache or joined an in-flight fetch",
            "✓".green()
        );
    }

    let _ = std::fs::remove_dir_all(&scratch);
    Ok(())
}

/// Distinct discover requests for the benchmark to spread load over
fn benchmark_requests(distinct_keys: usize) -> Vec<MediaRequest> {
    const GENRES: [&str; 10] = [
        "sci-fi", "action", "drama", "fantasy", "comedy", "horror", "mystery", "crime", "romance",
        "thriller",
    ];

    (0..distinct_keys)
        .map(|i| {
            // Cycle the list, suffixing repeats so every key stays distinct
            let genre = if i < GENRES.len() {
                GENRES[i].to_string()
            } else {
                format!("{}-{}", GENRES[i % GENRES.len()], i / GENRES.len())
            };
            MediaRequest::discover(MediaType::Movie, genre)
        })
        .collect()
}

/// Helper function to format and print one answered request
fn print_recommendation(request: &MediaRequest, recommendation: &Recommendation) {
    println!(
        "{}",
        format!("Recommendations for {}:", request).bold().blue()
    );
    if recommendation.items.is_empty() {
        println!("  No matches. Try a different genre or query.");
        return;
    }
    for (i, item) in recommendation.items.iter().enumerate() {
        let rank = i + 1;
        let year = item.year.map(|y| format!(", {}", y)).unwrap_or_default();
        let rating = item
            .rating
            .map(|r| format!(" - {:.1}/10", r))
            .unwrap_or_default();
        println!(
            "{}. {} ({}{}) [{}]{}",
            rank.to_string().green(),
            item.title,
            item.media_type.label(),
            year,
            item.genres.join(", "),
            rating
        );
        if let Some(description) = &item.description {
            println!("   {}", description);
        }
    }
}

fn option_label(value: Option<String>) -> String {
    value.unwrap_or_else(|| "Not specified".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_benchmark_flags_parse_with_defaults() {
        let cli = Cli::parse_from(["media-recs", "benchmark"]);
        assert!(matches!(
            cli.command,
            Commands::Benchmark {
                requests: 100,
                concurrent: 10,
                distinct_keys: 5,
            }
        ));
    }

    #[test]
    fn test_benchmark_flags_override_defaults() {
        let cli = Cli::parse_from([
            "media-recs",
            "benchmark",
            "--requests",
            "40",
            "--concurrent",
            "8",
            "--distinct-keys",
            "4",
        ]);
        assert!(matches!(
            cli.command,
            Commands::Benchmark {
                requests: 40,
                concurrent: 8,
                distinct_keys: 4,
            }
        ));
    }
}
