//! Utility functions for common operations.
//!
//! This module provides URL normalization:
//!
//! - **Coercion**: turn loose user input (`example.com`, `feed://...`) into an
//!   absolute `http(s)` URL
//! - **Resolution**: resolve relative links found in a page against its URL
//!
//! # Examples
//!
//! ```
//! use feedfinder2::util::{coerce_url, resolve_url};
//!
//! let page = url::Url::parse(&coerce_url("example.com/blog/")).unwrap();
//! let feed = resolve_url(&page, "atom.xml").unwrap();
//! assert_eq!(feed.as_str(), "http://example.com/blog/atom.xml");
//! ```

mod normalize;

pub use normalize::{coerce_url, resolve_url};
