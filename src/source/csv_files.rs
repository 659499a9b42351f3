//! Sequential CSV file download

use super::{BatchStream, Source};
use crate::decode::{decompress, Compression, CsvDecoder};
use crate::error::Result;
use crate::http::HttpClient;
use crate::types::{Batch, BatchOrigin};
use futures::stream;
use tracing::info;

/// Downloads a fixed list of CSV files, one batch per file, in order
#[derive(Debug, Clone)]
pub struct CsvFileSource {
    client: HttpClient,
    urls: Vec<String>,
    decoder: CsvDecoder,
    compression: Compression,
}

impl CsvFileSource {
    /// Create a source for the given URLs
    pub fn new(client: HttpClient, urls: Vec<String>) -> Self {
        Self {
            client,
            urls,
            decoder: CsvDecoder::default(),
            compression: Compression::Auto,
        }
    }

    /// Set the CSV decoder
    #[must_use]
    pub fn with_decoder(mut self, decoder: CsvDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    /// Set the compression handling
    #[must_use]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Download and decode a single file
    pub async fn fetch_file(&self, url: &str) -> Result<Batch> {
        let response = self.client.get(url).await?;
        let body = decompress(self.compression, url, response.bytes().await?)?;

        let records = self.decoder.decode(url, &body)?;
        info!(url, records = records.len(), "Downloaded CSV file");
        Ok(Batch::new(BatchOrigin::File(url.to_string()), records))
    }
}

impl Source for CsvFileSource {
    fn describe(&self) -> String {
        format!("{} CSV file(s)", self.urls.len())
    }

    fn batches(&self) -> BatchStream {
        Box::pin(stream::try_unfold(
            (self.clone(), 0usize),
            |(source, index)| async move {
                let Some(url) = source.urls.get(index).cloned() else {
                    return Ok(None);
                };
                let batch = source.fetch_file(&url).await?;
                Ok(Some((batch, (source, index + 1))))
            },
        ))
    }
}
