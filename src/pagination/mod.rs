//! Pagination module
//!
//! Page-number pagination with an empty-page stop signal.
//!
//! # Overview
//!
//! A [`PageFetcher`] issues `GET <base_url>?page=<n>` for `n = 1, 2, ...`,
//! strictly one request at a time, and yields every non-empty page as a
//! [`Page`](crate::types::Page). The first empty page ends the sequence
//! without being yielded. Any non-success status or unparseable body ends
//! the sequence with an error.

mod fetcher;
mod types;

pub use fetcher::{fetch_pages, PageFetcher, PageStream};
pub use types::{is_falsy, json_type_name, EndOfDataPolicy, PageBody, PageCursor};
