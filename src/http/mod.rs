//! HTTP client module
//!
//! Thin wrapper over reqwest used by every source.
//!
//! # Features
//!
//! - **Default headers and user agent** applied to every request
//! - **Transport timeout** configured once per client
//! - **Status classification**: any non-2xx response becomes `Error::Request`
//!
//! There is no retry or backoff layer: a failed request
//! surfaces to the caller immediately.

mod client;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};

#[cfg(test)]
mod tests;
