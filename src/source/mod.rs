//! Record sources
//!
//! Every source exposes its data as a lazy [`BatchStream`] so the pipeline
//! can drive any of them the same way.
//!
//! # Sources
//!
//! - [`PageFetcher`](crate::pagination::PageFetcher): one batch per page
//! - [`LinesSource`]: JSON lines grouped into fixed-size batches
//! - [`CsvFileSource`]: one batch per downloaded CSV file

mod csv_files;

pub use csv_files::CsvFileSource;

use crate::config::SourceConfig;
use crate::decode::CsvDecoder;
use crate::error::Result;
use crate::http::HttpClient;
use crate::lines::{batch_records, JsonLinesReader};
use crate::pagination::PageFetcher;
use crate::types::Batch;
use futures::{Stream, TryStreamExt};
use std::pin::Pin;

/// Lazy, ordered sequence of batches
pub type BatchStream = Pin<Box<dyn Stream<Item = Result<Batch>> + Send>>;

/// Anything that can produce a fresh sequence of batches
pub trait Source: Send + Sync {
    /// Short human-readable description for logs
    fn describe(&self) -> String;

    /// Start a new sequence; nothing is fetched until it is polled
    fn batches(&self) -> BatchStream;
}

impl Source for PageFetcher {
    fn describe(&self) -> String {
        format!("pages of {}", self.base_url())
    }

    fn batches(&self) -> BatchStream {
        Box::pin(self.pages().map_ok(Batch::from))
    }
}

/// JSON-lines reader with a batch size
#[derive(Debug, Clone)]
pub struct LinesSource {
    reader: JsonLinesReader,
    batch_size: usize,
}

impl LinesSource {
    /// Create a source grouping lines into batches of `batch_size`
    pub fn new(reader: JsonLinesReader, batch_size: usize) -> Self {
        Self { reader, batch_size }
    }
}

impl Source for LinesSource {
    fn describe(&self) -> String {
        format!("JSON lines from {}", self.reader.url())
    }

    fn batches(&self) -> BatchStream {
        batch_records(self.reader.numbered_records(), self.batch_size)
    }
}

/// Build the source described by a configuration
pub fn from_config(
    config: &SourceConfig,
    client: HttpClient,
    batch_size: usize,
) -> Box<dyn Source> {
    match config {
        SourceConfig::Pages {
            url,
            page_param,
            start_page,
            query,
            end_of_data,
        } => {
            let mut fetcher = PageFetcher::new(client, url)
                .with_page_param(page_param)
                .with_start_page(*start_page)
                .with_policy(*end_of_data);
            for (key, value) in query {
                fetcher = fetcher.with_query(key, value);
            }
            Box::new(fetcher)
        }
        SourceConfig::Lines { url } => Box::new(LinesSource::new(
            JsonLinesReader::new(client, url),
            batch_size,
        )),
        SourceConfig::Csv {
            urls,
            delimiter,
            has_header,
            compression,
        } => Box::new(
            CsvFileSource::new(client, urls.clone())
                .with_decoder(CsvDecoder::with_options(*delimiter, *has_header))
                .with_compression(*compression),
        ),
    }
}
