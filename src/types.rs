//! Common types used throughout pagefeed
//!
//! Shared record, page and batch definitions plus small enums used by
//! more than one module.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// A single record: string keys mapped to arbitrary JSON values
pub type Record = JsonObject;

// ============================================================================
// Page
// ============================================================================

/// One fetched page of records, keyed by its page number
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Page number that was requested
    pub number: u32,
    /// Records in the order the endpoint returned them
    pub records: Vec<Record>,
}

impl Page {
    /// Create a page
    pub fn new(number: u32, records: Vec<Record>) -> Self {
        Self { number, records }
    }

    /// Number of records on the page
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if the page carries no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ============================================================================
// Batch
// ============================================================================

/// Where a batch of records came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOrigin {
    /// A numbered page from a paginated endpoint
    Page(u32),
    /// A range of 1-based line numbers from a JSON-lines body
    Lines { first: u64, last: u64 },
    /// A whole downloaded file
    File(String),
}

impl fmt::Display for BatchOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchOrigin::Page(n) => write!(f, "page {n}"),
            BatchOrigin::Lines { first, last } => write!(f, "lines {first}-{last}"),
            BatchOrigin::File(url) => write!(f, "file {url}"),
        }
    }
}

/// The unit a pipeline hands to a sink
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Origin of the records
    pub origin: BatchOrigin,
    /// The records
    pub records: Vec<Record>,
}

impl Batch {
    /// Create a batch
    pub fn new(origin: BatchOrigin, records: Vec<Record>) -> Self {
        Self { origin, records }
    }

    /// Number of records in the batch
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if the batch carries no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Page> for Batch {
    fn from(page: Page) -> Self {
        Self {
            origin: BatchOrigin::Page(page.number),
            records: page.records,
        }
    }
}

// ============================================================================
// Write Disposition
// ============================================================================

/// How a sink treats data loaded by earlier runs
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum WriteDisposition {
    /// Keep existing data and add the new records
    #[default]
    Append,
    /// Drop existing data before loading
    Replace,
}

impl fmt::Display for WriteDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteDisposition::Append => f.write_str("append"),
            WriteDisposition::Replace => f.write_str("replace"),
        }
    }
}

// ============================================================================
// Utilities
// ============================================================================

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.is_empty())
    }
}

impl OptionStringExt for String {
    fn none_if_empty(self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}
