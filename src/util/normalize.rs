use url::Url;

/// Coerces a user-supplied string into an absolute `http(s)://` URL.
///
/// Leading and trailing whitespace is stripped, `feed://` is rewritten to
/// `http://`, existing `http://` and `https://` URLs are kept verbatim, and
/// anything else gets `http://` prepended. This never fails: a malformed host
/// is passed through untouched and left for the fetcher to reject.
///
/// # Examples
///
/// ```
/// use feedfinder2::util::coerce_url;
///
/// assert_eq!(coerce_url("feed://example.com/f.xml"), "http://example.com/f.xml");
/// assert_eq!(coerce_url("example.com"), "http://example.com");
/// assert_eq!(coerce_url("https://example.com"), "https://example.com");
/// ```
pub fn coerce_url(input: &str) -> String {
    let url = input.trim();

    if let Some(rest) = url.strip_prefix("feed://") {
        return format!("http://{rest}");
    }

    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_owned();
    }

    format!("http://{url}")
}

/// Resolves a possibly relative `href` against `base` (RFC 3986 semantics).
///
/// Returns `None` when the href cannot be joined, e.g. a malformed authority
/// in a scheme-relative link.
pub fn resolve_url(base: &Url, href: &str) -> Option<Url> {
    match base.join(href) {
        Ok(resolved) => Some(resolved),
        Err(e) => {
            tracing::debug!(base = %base, href = %href, error = %e, "Skipping unresolvable link");
            None
        }
    }
}
