//! Response decoder module
//!
//! Supports: CSV bodies, optionally gzip-compressed
//!
//! # Overview
//!
//! Turns downloaded file bodies into records. JSON pages and JSON lines are
//! parsed where they are fetched; this module covers the whole-file formats.

mod compression;
mod delimited;

pub use compression::{decompress, Compression};
pub use delimited::CsvDecoder;
