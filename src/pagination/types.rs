//! Pagination types
//!
//! The fetch cursor and the rules deciding whether a decoded page body
//! carries records or signals end-of-data.

use crate::types::{JsonValue, Record};
use serde::{Deserialize, Serialize};

/// How a decoded page body is recognised as the end-of-data signal
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum EndOfDataPolicy {
    /// Only an empty JSON array ends the sequence; anything that is not an
    /// array of objects is a parse error
    #[default]
    Strict,
    /// Any falsy JSON value (`[]`, `{}`, `null`, `0`, `false`, `""`) ends
    /// the sequence, and a single non-empty object is a one-record page
    Truthy,
}

/// Classified page body
#[derive(Debug, Clone, PartialEq)]
pub enum PageBody {
    /// A non-empty page
    Records(Vec<Record>),
    /// End-of-data signal
    EndOfData,
}

impl EndOfDataPolicy {
    /// Classify a decoded page body
    ///
    /// Returns a message describing the problem when the body has a shape
    /// the policy does not accept.
    pub fn classify(self, body: JsonValue) -> std::result::Result<PageBody, String> {
        match self {
            EndOfDataPolicy::Strict => match body {
                JsonValue::Array(items) if items.is_empty() => Ok(PageBody::EndOfData),
                JsonValue::Array(items) => into_records(items).map(PageBody::Records),
                other => Err(format!(
                    "expected a JSON array of records, got {}",
                    json_type_name(&other)
                )),
            },
            EndOfDataPolicy::Truthy => {
                if is_falsy(&body) {
                    return Ok(PageBody::EndOfData);
                }
                match body {
                    JsonValue::Array(items) => into_records(items).map(PageBody::Records),
                    JsonValue::Object(map) => Ok(PageBody::Records(vec![map])),
                    other => Err(format!(
                        "expected records, got {}",
                        json_type_name(&other)
                    )),
                }
            }
        }
    }
}

fn into_records(items: Vec<JsonValue>) -> std::result::Result<Vec<Record>, String> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            JsonValue::Object(map) => Ok(map),
            other => Err(format!(
                "record {} is {}, not an object",
                i + 1,
                json_type_name(&other)
            )),
        })
        .collect()
}

/// Truthiness of a JSON value, as dynamic languages define it
pub fn is_falsy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::Bool(b) => !b,
        JsonValue::Number(n) => n.as_f64() == Some(0.0),
        JsonValue::String(s) => s.is_empty(),
        JsonValue::Array(a) => a.is_empty(),
        JsonValue::Object(o) => o.is_empty(),
    }
}

/// Short name of a JSON value's type for error messages
pub fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

/// Per-invocation fetch cursor
///
/// Holds the next page number to request. Created fresh for every
/// sequence and never persisted. Once page `u32::MAX` has been yielded
/// there is no next page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    next_page: Option<u32>,
    pages_yielded: u64,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::new(1)
    }
}

impl PageCursor {
    /// Create a cursor starting at the given page number
    pub fn new(start_page: u32) -> Self {
        Self {
            next_page: Some(start_page),
            pages_yielded: 0,
        }
    }

    /// Page number to request next, `None` when the page numbers ran out
    pub fn next_page(&self) -> Option<u32> {
        self.next_page
    }

    /// Number of pages yielded so far
    pub fn pages_yielded(&self) -> u64 {
        self.pages_yielded
    }

    /// Record that the current page was yielded and move to the next one
    pub fn advance(&mut self) {
        self.next_page = self.next_page.and_then(|n| n.checked_add(1));
        self.pages_yielded += 1;
    }
}
