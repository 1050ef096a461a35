//! # feedfinder2
//!
//! Finds the syndication feeds (RSS, Atom, RDF) of a website given only a
//! starting URL.
//!
//! Discovery is a cascade of progressively weaker heuristics. Each stage
//! probes its candidates concurrently, and the cascade stops at the first
//! stage that confirms a feed:
//!
//! ```text
//! page is a feed? → <link> tags → local <a> links → remote <a> links → guessed filenames
//! ```
//!
//! Confirmed feeds are deduplicated and ranked by how feed-like their URL
//! looks. Network and parse failures never surface as errors; a site without
//! a discoverable feed simply yields an empty list.
//!
//! ```no_run
//! # async fn demo() {
//! use feedfinder2::{find_feeds, Config};
//!
//! let feeds = find_feeds("blog.rust-lang.org", &Config::default(), None).await;
//! if let Some(best) = feeds.first() {
//!     println!("best feed: {}", best.url);
//! }
//! # }
//! ```
//!
//! Options can live in a TOML file (`exhaustive`, `user_agent`,
//! `timeout_secs`, `max_body_bytes`); a missing file means the defaults:
//!
//! ```no_run
//! # async fn demo() -> Result<(), feedfinder2::ConfigError> {
//! use feedfinder2::{find_feeds, Config};
//! use std::path::Path;
//!
//! let config = Config::load(Path::new("feedfinder.toml"))?;
//! let client = reqwest::Client::new();
//! let feeds = find_feeds("example.com", &config, Some(&client)).await;
//! # let _ = feeds;
//! # Ok(())
//! # }
//! ```
//!
//! Logging goes through `tracing`; each discovery runs inside a `discover`
//! span, so the caller's subscriber decides where it ends up.

pub mod config;
pub mod feed;
pub mod util;

pub use config::{Config, ConfigError, DEFAULT_USER_AGENT};
pub use feed::{DiscoveredFeed, DiscoveryError, FeedFinder, FetchError, ProbeResult, Stage};

/// Discovers the feeds of `url`, best first.
///
/// With `client`, requests go through the caller's connection pool, which is
/// left open. Without one, a private client is created for this call and
/// released before returning.
pub async fn find_feeds(
    url: &str,
    config: &Config,
    client: Option<&reqwest::Client>,
) -> Vec<DiscoveredFeed> {
    match client {
        Some(client) => FeedFinder::with_client(client, config).discover(url).await,
        None => match FeedFinder::new(config) {
            Ok(finder) => finder.discover(url).await,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Could not start feed discovery");
                Vec::new()
            }
        },
    }
}
