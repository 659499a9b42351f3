//! JSON-lines record reader

use super::splitter::LineSplitter;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::source::BatchStream;
use crate::types::{Batch, BatchOrigin, Record};
use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt, TryStreamExt};
use std::pin::Pin;
use tracing::debug;

type ByteStream = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;

/// Lazy, ordered sequence of parsed records
pub type RecordStream = Pin<Box<dyn Stream<Item = Result<Record>> + Send>>;

/// Lazy, ordered sequence of parsed records with their line numbers
pub type NumberedRecordStream = Pin<Box<dyn Stream<Item = Result<NumberedRecord>> + Send>>;

/// A record together with the 1-based line it was parsed from
#[derive(Debug, Clone, PartialEq)]
pub struct NumberedRecord {
    /// Line number in the body, counting blank lines
    pub line_number: u64,
    /// Parsed record
    pub record: Record,
}

/// Reads newline-delimited JSON objects from a URL
#[derive(Debug, Clone)]
pub struct JsonLinesReader {
    client: HttpClient,
    url: String,
}

impl JsonLinesReader {
    /// Create a reader for the given URL
    pub fn new(client: HttpClient, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// URL being read
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Stream records with their line numbers
    ///
    /// The request is sent on first poll. The stream ends after the last
    /// line, or after the first request, transport or parse error.
    pub fn numbered_records(&self) -> NumberedRecordStream {
        let state = ReadState {
            reader: self.clone(),
            body: None,
            splitter: LineSplitter::new(),
            line_number: 0,
            body_done: false,
        };

        Box::pin(stream::try_unfold(state, |mut state| async move {
            Ok(state.next_record().await?.map(|record| (record, state)))
        }))
    }

    /// Stream records only
    pub fn records(&self) -> RecordStream {
        Box::pin(self.numbered_records().map_ok(|numbered| numbered.record))
    }

    async fn open(&self) -> Result<ByteStream> {
        debug!(url = %self.url, "Opening JSON-lines stream");
        let response = self.client.get(&self.url).await?;
        Ok(Box::pin(response.bytes_stream()))
    }
}

/// Stream the records of a JSON-lines resource
pub fn read_json_lines(client: &HttpClient, url: &str) -> RecordStream {
    JsonLinesReader::new(client.clone(), url).records()
}

struct ReadState {
    reader: JsonLinesReader,
    body: Option<ByteStream>,
    splitter: LineSplitter,
    line_number: u64,
    body_done: bool,
}

impl ReadState {
    async fn next_record(&mut self) -> Result<Option<NumberedRecord>> {
        loop {
            if let Some(line) = self.splitter.next_line() {
                if let Some(record) = self.parse(&line)? {
                    return Ok(Some(record));
                }
                continue;
            }

            if self.body_done {
                if let Some(line) = self.splitter.finish() {
                    if let Some(record) = self.parse(&line)? {
                        return Ok(Some(record));
                    }
                }
                debug!(url = %self.reader.url, lines = self.line_number, "JSON-lines stream complete");
                return Ok(None);
            }

            if self.body.is_none() {
                self.body = Some(self.reader.open().await?);
            }
            let Some(body) = self.body.as_mut() else {
                return Ok(None);
            };

            match body.next().await {
                Some(chunk) => self.splitter.push(&chunk?),
                None => self.body_done = true,
            }
        }
    }

    fn parse(&mut self, raw: &[u8]) -> Result<Option<NumberedRecord>> {
        self.line_number += 1;
        parse_line(self.line_number, raw).map(|record| {
            record.map(|record| NumberedRecord {
                line_number: self.line_number,
                record,
            })
        })
    }
}

/// Parse one line; blank lines yield `None`
fn parse_line(line_number: u64, raw: &[u8]) -> Result<Option<Record>> {
    let text = std::str::from_utf8(raw).map_err(|e| {
        Error::line_parse(line_number, String::from_utf8_lossy(raw), e.to_string())
    })?;

    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    serde_json::from_str::<Record>(text)
        .map(Some)
        .map_err(|e| Error::line_parse(line_number, text, e.to_string()))
}

struct BatchState {
    inner: NumberedRecordStream,
    batch_size: usize,
    pending_error: Option<Error>,
    done: bool,
}

/// Group numbered records into batches of at most `batch_size`
///
/// Records parsed before an error are delivered as a final short batch,
/// then the error is yielded and the stream ends.
pub fn batch_records(inner: NumberedRecordStream, batch_size: usize) -> BatchStream {
    let state = BatchState {
        inner,
        batch_size: batch_size.max(1),
        pending_error: None,
        done: false,
    };

    Box::pin(stream::try_unfold(state, |mut state| async move {
        if let Some(err) = state.pending_error.take() {
            return Err(err);
        }
        if state.done {
            return Ok(None);
        }

        let mut records = Vec::with_capacity(state.batch_size.min(1024));
        let mut lines: Option<(u64, u64)> = None;

        while records.len() < state.batch_size {
            match state.inner.next().await {
                Some(Ok(numbered)) => {
                    let first = lines.map_or(numbered.line_number, |(first, _)| first);
                    lines = Some((first, numbered.line_number));
                    records.push(numbered.record);
                }
                Some(Err(err)) => {
                    if records.is_empty() {
                        return Err(err);
                    }
                    state.pending_error = Some(err);
                    break;
                }
                None => {
                    state.done = true;
                    break;
                }
            }
        }

        Ok(lines.map(|(first, last)| {
            (
                Batch::new(BatchOrigin::Lines { first, last }, records),
                state,
            )
        }))
    }))
}
