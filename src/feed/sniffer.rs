//! Cheap textual feed detection and candidate link extraction.
//!
//! Nothing here understands RSS or Atom. A document counts as a feed when it
//! carries root-level feed markers and no `<html` tag; candidate links are
//! picked out of HTML by MIME type, file extension, or keyword.

use crate::util::resolve_url;
use scraper::{Html, Selector};
use url::Url;

/// `<link type="...">` values that announce a feed.
pub const FEED_LINK_TYPES: [&str; 5] = [
    "application/rss+xml",
    "text/xml",
    "application/atom+xml",
    "application/x.atom+xml",
    "application/x-atom+xml",
];

const FEED_SUFFIXES: [&str; 4] = [".rss", ".rdf", ".xml", ".atom"];
const FEEDLIKE_KEYWORDS: [&str; 5] = ["rss", "rdf", "xml", "atom", "feed"];

/// Counts feed markers (`<rss`, `<rdf`, `<feed`) in `text`, case-insensitively.
///
/// Returns 0 for anything containing `<html`, even if feed markers are also
/// present: a page mentioning `<rss` in an icon's alt text is still a page.
pub fn feed_marker_count(text: &str) -> usize {
    let data = text.to_lowercase();
    if data.contains("<html") {
        return 0;
    }
    ["<rss", "<rdf", "<feed"]
        .iter()
        .map(|marker| data.matches(marker).count())
        .sum()
}

/// Whether `text` looks like feed markup.
pub fn is_feed_data(text: &str) -> bool {
    feed_marker_count(text) > 0
}

/// Whether the href ends in a feed file extension.
pub fn is_feed_url(href: &str) -> bool {
    let lower = href.to_lowercase();
    FEED_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
}

/// Whether the href mentions a feed keyword anywhere.
pub fn is_feedlike_url(href: &str) -> bool {
    let lower = href.to_lowercase();
    FEEDLIKE_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

/// `<a>` hrefs that may point at feeds, split by how confident we are.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AnchorCandidates {
    /// Relative hrefs with a feed file extension.
    pub local: Vec<String>,
    /// Any href mentioning a feed keyword, absolute or not.
    pub remote: Vec<String>,
}

/// Resolves the `href` of every `<link>` whose `type` is a feed MIME type.
///
/// A missing `href` resolves as the empty string, i.e. to `base` itself.
pub fn link_tag_candidates(document: &Html, base: &Url) -> Vec<Url> {
    let Ok(selector) = Selector::parse("link") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter(|link| {
            link.value()
                .attr("type")
                .is_some_and(|kind| FEED_LINK_TYPES.contains(&kind))
        })
        .filter_map(|link| resolve_url(base, link.value().attr("href").unwrap_or("")))
        .collect()
}

/// Collects raw `<a href>` values that look like feeds.
///
/// The two lists are not exclusive: `/index.rss` lands in both.
pub fn anchor_candidates(document: &Html) -> AnchorCandidates {
    let mut candidates = AnchorCandidates::default();
    let Ok(selector) = Selector::parse("a[href]") else {
        return candidates;
    };

    for anchor in document.select(&selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !href.contains("://") && is_feed_url(href) {
            candidates.local.push(href.to_owned());
        }
        if is_feedlike_url(href) {
            candidates.remote.push(href.to_owned());
        }
    }

    candidates
}
