use super::fetcher::{fetch_page, FetchError, FetchOptions, FetchedPage};
use super::ranker::rank;
use super::sniffer::{anchor_candidates, is_feed_data, link_tag_candidates};
use crate::config::Config;
use crate::util::{coerce_url, resolve_url};
use futures::stream::{self, StreamExt};
use reqwest::header::HeaderValue;
use scraper::Html;
use std::collections::HashSet;
use thiserror::Error;
use tracing::Instrument;
use url::Url;

/// Filenames tried against the page URL when no link pointed at a feed.
pub const GUESSED_FILENAMES: [&str; 6] = [
    "atom.xml",
    "index.atom",
    "index.rdf",
    "rss.xml",
    "index.xml",
    "index.rss",
];

/// A URL that probing confirmed serves feed markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFeed {
    /// Absolute URL of the feed
    pub url: String,
    /// Raw response body, so callers need not fetch it again
    pub body: Vec<u8>,
    /// Charset label the body was decoded with
    pub charset: String,
}

impl DiscoveredFeed {
    fn from_page(url: String, page: FetchedPage) -> Self {
        Self {
            url,
            body: page.body,
            charset: page.charset,
        }
    }
}

/// Errors that can occur while setting up feed discovery.
///
/// Discovery itself never fails: fetch and parse problems only shrink the
/// result, and "no feed found" is an empty list.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The private HTTP client could not be built (TLS backend, bad User-Agent)
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Outcome of fetching and sniffing one candidate URL.
#[derive(Debug)]
pub enum ProbeResult {
    Confirmed(FetchedPage),
    NotAFeed,
    FetchFailed(FetchError),
}

/// One heuristic phase of the discovery cascade, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// `<link>` tags with a feed MIME type
    LinkTags,
    /// Relative `<a>` hrefs with a feed file extension
    LocalAnchors,
    /// Any `<a>` href mentioning a feed keyword
    RemoteAnchors,
    /// Well-known feed filenames next to the page
    Guesses,
}

impl Stage {
    /// Fixed cascade order; never reordered at runtime.
    pub const ORDER: [Stage; 4] = [
        Stage::LinkTags,
        Stage::LocalAnchors,
        Stage::RemoteAnchors,
        Stage::Guesses,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::LinkTags => "feed <link> tags",
            Stage::LocalAnchors => "local <a> links to feeds",
            Stage::RemoteAnchors => "remote <a> links to feeds",
            Stage::Guesses => "guessed feed filenames",
        }
    }

    /// Whether candidates may live on another host than the page.
    pub fn permits_remote(self) -> bool {
        !matches!(self, Stage::LocalAnchors | Stage::Guesses)
    }
}

/// Candidates for every stage, extracted from the root page up front.
///
/// The parsed document is dropped before any probe is awaited.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct StageCandidates {
    link_tags: Vec<Url>,
    local_anchors: Vec<Url>,
    remote_anchors: Vec<Url>,
    guesses: Vec<Url>,
}

impl StageCandidates {
    pub(crate) fn extract(page: &FetchedPage) -> Self {
        let base = &page.url;
        let document = Html::parse_document(&page.text);

        let link_tags = link_tag_candidates(&document, base);
        let anchors = anchor_candidates(&document);
        let resolve_all = |hrefs: &[String]| -> Vec<Url> {
            hrefs
                .iter()
                .filter_map(|href| resolve_url(base, href))
                .collect()
        };

        Self {
            link_tags,
            local_anchors: resolve_all(&anchors.local),
            remote_anchors: resolve_all(&anchors.remote),
            guesses: GUESSED_FILENAMES
                .iter()
                .filter_map(|name| resolve_url(base, name))
                .collect(),
        }
    }

    fn take(&mut self, stage: Stage) -> Vec<Url> {
        std::mem::take(match stage {
            Stage::LinkTags => &mut self.link_tags,
            Stage::LocalAnchors => &mut self.local_anchors,
            Stage::RemoteAnchors => &mut self.remote_anchors,
            Stage::Guesses => &mut self.guesses,
        })
    }
}

/// HTTP session for a finder: either private or lent by the caller.
///
/// An owned client is released when the finder drops; a borrowed one never is.
#[derive(Debug)]
enum Session<'c> {
    Owned(reqwest::Client),
    Borrowed(&'c reqwest::Client),
}

impl Session<'_> {
    fn client(&self) -> &reqwest::Client {
        match self {
            Session::Owned(client) => client,
            Session::Borrowed(client) => *client,
        }
    }
}

/// Runs the feed discovery cascade for a site.
///
/// # Example
///
/// ```no_run
/// # async fn demo() -> Result<(), feedfinder2::DiscoveryError> {
/// use feedfinder2::{Config, FeedFinder};
///
/// let finder = FeedFinder::new(&Config::default())?;
/// for feed in finder.discover("blog.rust-lang.org").await {
///     println!("{} ({} bytes, {})", feed.url, feed.body.len(), feed.charset);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FeedFinder<'c> {
    session: Session<'c>,
    options: FetchOptions,
    exhaustive: bool,
}

impl FeedFinder<'static> {
    /// Creates a finder with its own HTTP client carrying the configured
    /// User-Agent.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Client`] if the client cannot be built.
    pub fn new(config: &Config) -> Result<Self, DiscoveryError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent())
            .build()?;

        Ok(Self {
            session: Session::Owned(client),
            options: FetchOptions {
                timeout: config.timeout(),
                max_body_bytes: config.max_body_bytes,
                user_agent: None,
            },
            exhaustive: config.exhaustive,
        })
    }
}

impl<'c> FeedFinder<'c> {
    /// Creates a finder on a caller-supplied client.
    ///
    /// The client's own default headers are kept unless `config.user_agent`
    /// is set, in which case it is sent with every request.
    pub fn with_client(client: &'c reqwest::Client, config: &Config) -> Self {
        let user_agent = config
            .user_agent
            .as_deref()
            .and_then(|ua| match HeaderValue::from_str(ua) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!(user_agent = %ua, error = %e, "Ignoring invalid User-Agent");
                    None
                }
            });

        Self {
            session: Session::Borrowed(client),
            options: FetchOptions {
                timeout: config.timeout(),
                max_body_bytes: config.max_body_bytes,
                user_agent,
            },
            exhaustive: config.exhaustive,
        }
    }

    /// Discovers feed URLs for `url`, best first.
    ///
    /// Stages run in [`Stage::ORDER`] and the cascade stops after the first
    /// stage that confirms a feed, unless the finder is exhaustive. Fetch
    /// failures are logged and dropped; an unreachable site yields an empty
    /// list.
    pub async fn discover(&self, url: &str) -> Vec<DiscoveredFeed> {
        let url = coerce_url(url);
        let span = tracing::info_span!("discover", url = %url, exhaustive = self.exhaustive);
        self.run_cascade(url).instrument(span).await
    }

    async fn run_cascade(&self, url: String) -> Vec<DiscoveredFeed> {
        let page = match fetch_page(self.session.client(), &url, &self.options).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Failed to fetch page");
                return Vec::new();
            }
        };

        // A feed has no document to mine for further links, even in exhaustive mode
        if is_feed_data(&page.text) {
            tracing::info!(url = %url, "Page is already a feed");
            return vec![DiscoveredFeed::from_page(url, page)];
        }

        let mut candidates = StageCandidates::extract(&page);
        drop(page);

        let mut feeds = Vec::new();
        for stage in Stage::ORDER {
            tracing::info!(
                stage = stage.name(),
                remote = stage.permits_remote(),
                "Looking for {}",
                stage.name()
            );
            let found = self.probe_all(candidates.take(stage), &feeds).await;
            feeds.extend(found);
            tracing::info!(
                stage = stage.name(),
                total = feeds.len(),
                "Found {} {}",
                feeds.len(),
                stage.name()
            );

            if !feeds.is_empty() && !self.exhaustive {
                break;
            }
        }

        rank(feeds)
    }

    /// Probes all candidates concurrently, keeping confirmed feeds in
    /// candidate order regardless of completion order.
    ///
    /// Duplicates, including URLs already confirmed by an earlier stage, are
    /// probed once.
    async fn probe_all(
        &self,
        candidates: Vec<Url>,
        confirmed: &[DiscoveredFeed],
    ) -> Vec<DiscoveredFeed> {
        let mut seen: HashSet<String> = confirmed.iter().map(|f| f.url.clone()).collect();
        let urls: Vec<String> = candidates
            .into_iter()
            .map(String::from)
            .filter(|url| seen.insert(url.clone()))
            .collect();

        if urls.is_empty() {
            return Vec::new();
        }

        let results: Vec<ProbeResult> = stream::iter(urls.iter())
            .map(|url| self.probe(url))
            .buffered(urls.len())
            .collect()
            .await;

        urls.into_iter()
            .zip(results)
            .filter_map(|(url, result)| match result {
                ProbeResult::Confirmed(page) => Some(DiscoveredFeed::from_page(url, page)),
                ProbeResult::NotAFeed | ProbeResult::FetchFailed(_) => None,
            })
            .collect()
    }

    /// Fetches one candidate and sniffs whether it is feed markup.
    pub async fn probe(&self, url: &str) -> ProbeResult {
        match fetch_page(self.session.client(), url, &self.options).await {
            Ok(page) if is_feed_data(&page.text) => ProbeResult::Confirmed(page),
            Ok(_) => ProbeResult::NotAFeed,
            Err(e) => {
                if e.is_timeout() {
                    tracing::warn!(url = %url, "Connection timed out");
                } else if e.is_disconnect() {
                    tracing::warn!(url = %url, error = %e, "Server closed connection");
                } else {
                    tracing::warn!(url = %url, error = %e, "Error while probing candidate");
                }
                ProbeResult::FetchFailed(e)
            }
        }
    }

    /// Whether this finder runs every stage.
    pub fn is_exhaustive(&self) -> bool {
        self.exhaustive
    }
}
