//! Streaming JSON-lines reader
//!
//! Downloads a newline-delimited JSON body as a byte stream and yields one
//! record per non-blank line, holding at most one partial line in memory.
//!
//! # Overview
//!
//! - [`LineSplitter`] turns arbitrary byte chunks into complete lines
//! - [`JsonLinesReader`] issues the GET request on first poll and parses
//!   each line into a [`Record`](crate::types::Record)
//! - [`batch_records`] groups numbered records into
//!   [`Batch`](crate::types::Batch)es for a sink

mod reader;
mod splitter;

pub use reader::{
    batch_records, read_json_lines, JsonLinesReader, NumberedRecord, NumberedRecordStream,
    RecordStream,
};
pub use splitter::LineSplitter;

#[cfg(test)]
mod tests;
