use super::discovery::DiscoveredFeed;
use std::cmp::Reverse;
use std::collections::HashSet;

/// Keywords in descending order of how strongly they suggest a primary feed.
const KEYWORDS: [&str; 5] = ["atom", "rss", "rdf", ".xml", "feed"];

/// Heuristic relevance of a feed URL; higher is better.
///
/// Comment feeds score -2 and GeoRSS feeds -1 regardless of other keywords.
/// Otherwise the first keyword of `atom, rss, rdf, .xml, feed` found in the
/// URL scores 5 down to 1, and a URL with none of them scores 0.
pub fn score(url: &str) -> i32 {
    if url.contains("comments") {
        return -2;
    }
    if url.contains("georss") {
        return -1;
    }
    KEYWORDS
        .iter()
        .zip((1..=KEYWORDS.len() as i32).rev())
        .find(|(keyword, _)| url.contains(*keyword))
        .map_or(0, |(_, weight)| weight)
}

/// Deduplicates by URL (first seen wins) and sorts by descending [`score`].
///
/// The sort is stable, so equal scores keep their discovery order.
pub fn rank(feeds: Vec<DiscoveredFeed>) -> Vec<DiscoveredFeed> {
    let mut seen = HashSet::new();
    let mut unique: Vec<DiscoveredFeed> = feeds
        .into_iter()
        .filter(|feed| seen.insert(feed.url.clone()))
        .collect();
    unique.sort_by_key(|feed| Reverse(score(&feed.url)));
    unique
}
