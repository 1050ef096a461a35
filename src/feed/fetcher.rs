use encoding_rs::Encoding;
use futures::StreamExt;
use reqwest::header::{HeaderValue, CONTENT_TYPE, USER_AGENT};
use std::time::Duration;
use thiserror::Error;
use url::Url;

const DEFAULT_CHARSET: &str = "utf-8";

/// Errors that can occur while fetching a page or probe candidate.
///
/// [`FetchError::Timeout`] and [`FetchError::Disconnected`] are the two
/// failures callers may want to tell apart; everything else is a generic
/// transport failure. HTTP error statuses are not failures: a 403 or 404 body
/// is still decoded and sniffed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Server closed the connection before the response was complete
    #[error("Server closed connection: {0}")]
    Disconnected(String),
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(reqwest::Error),
    /// The URL could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// Response body exceeded the configured size limit
    #[error("Response too large")]
    ResponseTooLarge,
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout)
    }

    pub fn is_disconnect(&self) -> bool {
        matches!(self, FetchError::Disconnected(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_body() || e.is_decode() || is_incomplete_message(&e) {
            FetchError::Disconnected(e.to_string())
        } else {
            FetchError::Network(e)
        }
    }
}

/// Whether hyper gave up because the server closed before a full message.
fn is_incomplete_message(e: &reqwest::Error) -> bool {
    let mut source = std::error::Error::source(e);
    while let Some(err) = source {
        if let Some(hyper_err) = err.downcast_ref::<hyper::Error>() {
            if hyper_err.is_incomplete_message() {
                return true;
            }
        }
        source = err.source();
    }
    false
}

/// A successfully fetched and decoded page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects; relative links resolve against this.
    pub url: Url,
    /// Raw response body.
    pub body: Vec<u8>,
    /// Body decoded with `charset`, lossily if it held invalid sequences.
    pub text: String,
    /// Charset label used for decoding.
    pub charset: String,
}

/// Per-request settings shared by every fetch in a discovery session.
#[derive(Debug, Clone)]
pub(crate) struct FetchOptions {
    pub timeout: Duration,
    pub max_body_bytes: usize,
    /// Sent per request; `None` when the client already carries it.
    pub user_agent: Option<HeaderValue>,
}

/// Issues one GET for `url` and decodes the body as text.
///
/// The timeout covers the whole exchange, headers and body alike.
pub(crate) async fn fetch_page(
    client: &reqwest::Client,
    url: &str,
    options: &FetchOptions,
) -> Result<FetchedPage, FetchError> {
    let parsed = Url::parse(url)?;

    tokio::time::timeout(options.timeout, fetch_inner(client, parsed, options))
        .await
        .map_err(|_| FetchError::Timeout)?
}

async fn fetch_inner(
    client: &reqwest::Client,
    url: Url,
    options: &FetchOptions,
) -> Result<FetchedPage, FetchError> {
    let mut request = client.get(url);
    if let Some(user_agent) = &options.user_agent {
        request = request.header(USER_AGENT, user_agent.clone());
    }

    let response = request.send().await?;
    if !response.status().is_success() {
        tracing::debug!(
            url = %response.url(),
            status = %response.status(),
            "Non-success status, sniffing body anyway"
        );
    }

    let final_url = response.url().clone();
    let declared = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(charset_from_content_type);

    let body = read_limited_bytes(response, options.max_body_bytes).await?;
    let (text, charset) = decode_body(&body, declared.as_deref());

    Ok(FetchedPage {
        url: final_url,
        body,
        text,
        charset,
    })
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if usize::try_from(len).map_or(true, |len| len > limit) {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Disconnected(e.to_string())
            }
        })?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::Disconnected(format!(
                "expected {expected} bytes, received {}",
                bytes.len()
            )));
        }
    }

    Ok(bytes)
}

/// Extracts the `charset` parameter from a `Content-Type` header value.
fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
        (!value.is_empty()).then(|| value.to_ascii_lowercase())
    })
}

/// Decodes `body` with the declared charset, never failing.
///
/// Invalid byte sequences are re-decoded with U+FFFD substitution in the same
/// encoding. An unknown charset label falls back to lossy UTF-8. The returned
/// label is the declared charset (or `utf-8` when none was declared).
fn decode_body(body: &[u8], declared: Option<&str>) -> (String, String) {
    let label = declared.unwrap_or(DEFAULT_CHARSET);

    let Some(encoding) = Encoding::for_label(label.as_bytes()) else {
        tracing::debug!(charset = %label, "Unknown charset, decoding as lossy UTF-8");
        return (String::from_utf8_lossy(body).into_owned(), label.to_owned());
    };

    if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(body) {
        return (text.into_owned(), label.to_owned());
    }

    tracing::debug!(charset = %label, "Body has invalid byte sequences, substituting replacements");
    let (text, _had_errors) = encoding.decode_without_bom_handling(body);
    (text.into_owned(), label.to_owned())
}
