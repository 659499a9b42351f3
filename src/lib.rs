// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # pagefeed
//!
//! Lazy ingestion of paginated JSON endpoints, JSON-lines resources and CSV
//! files into local files, object stores and DuckDB.
//!
//! ## Features
//!
//! - **Page-number pagination**: `?page=1`, `?page=2`, ... until an empty page
//! - **Streaming JSON lines**: records parsed as the body arrives
//! - **CSV files**: sequential downloads, gzip handled transparently
//! - **Pull-based**: nothing is requested until the consumer asks for it
//! - **Sinks**: JSON-lines files, local or GCS objects, DuckDB tables
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use futures::TryStreamExt;
//! use pagefeed::{fetch_pages, http::HttpClient, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = HttpClient::new()?;
//!     let mut pages = fetch_pages(&client, "https://example.com/api/rides");
//!
//!     while let Some(page) = pages.try_next().await? {
//!         println!("page {} has {} records", page.number, page.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                Pipeline::run(source, sink)                   │
//! └──────────────────────────────────────────────────────────────┘
//!                │                                │
//! ┌──────────────┴──────────────┐  ┌──────────────┴──────────────┐
//! │           Source            │  │            Sink             │
//! ├─────────────────────────────┤  ├─────────────────────────────┤
//! │ PageFetcher  (pages)        │  │ JsonlSink                   │
//! │ LinesSource  (JSON lines)   │  │ ObjectStoreSink (file, gs)  │
//! │ CsvFileSource (csv, gzip)   │  │ DuckDbSink                  │
//! └─────────────────────────────┘  └─────────────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// HTTP client
pub mod http;

/// Page-number pagination
pub mod pagination;

/// Streaming JSON-lines reader
pub mod lines;

/// CSV and compression decoding
pub mod decode;

/// Record sources
pub mod source;

/// Record transforms
pub mod transform;

/// Pipeline configuration
pub mod config;

/// Record destinations
pub mod sink;

/// Source-to-sink orchestration
pub mod pipeline;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use lines::read_json_lines;
pub use pagination::{fetch_pages, PageFetcher};
pub use pipeline::{run_config, LoadInfo, Pipeline};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
