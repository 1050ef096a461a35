//! Feed discovery: find the RSS/Atom/RDF feeds of a website.
//!
//! - [`fetcher`] - one GET with timeout, size limit and lenient charset decoding
//! - [`sniffer`] - textual feed detection and candidate link extraction
//! - [`ranker`] - dedup and order confirmed feeds by URL heuristics
//! - [`discovery`] - the staged cascade tying them together
//!
//! # Example
//!
//! ```ignore
//! use crate::feed::FeedFinder;
//!
//! let finder = FeedFinder::with_client(&client, &config);
//! let feeds = finder.discover("example.com").await;
//! ```

mod discovery;
mod fetcher;
mod ranker;
mod sniffer;

pub use discovery::{
    DiscoveredFeed, DiscoveryError, FeedFinder, ProbeResult, Stage, GUESSED_FILENAMES,
};
pub use fetcher::{FetchError, FetchedPage};
pub use ranker::{rank, score};
pub use sniffer::{
    anchor_candidates, feed_marker_count, is_feed_data, is_feed_url, is_feedlike_url,
    link_tag_candidates, AnchorCandidates, FEED_LINK_TYPES,
};
