//! CSV decoder
//!
//! RFC 4180 quoting: quoted fields may hold the delimiter, doubled quotes
//! and line breaks. Whitespace is kept as written.

use crate::error::{Error, Result};
use crate::types::{JsonValue, Record};

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// CSV decoder with configurable delimiter and header handling
#[derive(Debug, Clone)]
pub struct CsvDecoder {
    /// Field delimiter
    delimiter: char,
    /// Whether the first row is a header
    has_header: bool,
}

impl Default for CsvDecoder {
    fn default() -> Self {
        Self {
            delimiter: ',',
            has_header: true,
        }
    }
}

impl CsvDecoder {
    /// Create a CSV decoder with custom settings
    pub fn with_options(delimiter: char, has_header: bool) -> Self {
        Self {
            delimiter,
            has_header,
        }
    }

    /// Decode a CSV body into records
    ///
    /// Without a header the columns are named `column_0`, `column_1`, ...
    /// after the first row. Missing trailing fields become `null`; a row
    /// with more fields than the header, an unbalanced quote or invalid
    /// UTF-8 is a decode error naming `source_name`.
    pub fn decode(&self, source_name: &str, body: &[u8]) -> Result<Vec<Record>> {
        let body = body.strip_prefix(UTF8_BOM).unwrap_or(body);
        let delimiter = u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                Error::decode(
                    source_name,
                    format!("delimiter {:?} is not a single ASCII character", self.delimiter),
                )
            })?;

        // The reader closes an open quote at end of input without complaint.
        if body.iter().filter(|&&b| b == b'"').count() % 2 != 0 {
            return Err(Error::decode(source_name, "unterminated quoted field"));
        }

        let mut reader = ::csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(body);
        let mut rows = reader.records();

        let mut headers: Vec<String> = Vec::new();
        if self.has_header {
            match rows.next() {
                Some(row) => {
                    let row = row.map_err(|e| csv_error(source_name, &e))?;
                    headers = row.iter().map(str::to_string).collect();
                }
                None => return Ok(Vec::new()),
            }
        }

        let mut records = Vec::new();
        for row in rows {
            let row = row.map_err(|e| csv_error(source_name, &e))?;
            if headers.is_empty() {
                headers = (0..row.len()).map(|i| format!("column_{i}")).collect();
            }
            if row.len() > headers.len() {
                let line = row.position().map_or(0, ::csv::Position::line);
                return Err(Error::decode(
                    source_name,
                    format!(
                        "line {line} has {} fields, expected at most {}",
                        row.len(),
                        headers.len()
                    ),
                ));
            }

            let mut fields = row.iter();
            records.push(
                headers
                    .iter()
                    .map(|header| {
                        let value = fields.next().map_or(JsonValue::Null, parse_csv_value);
                        (header.clone(), value)
                    })
                    .collect(),
            );
        }

        Ok(records)
    }
}

fn csv_error(source_name: &str, error: &::csv::Error) -> Error {
    Error::decode(source_name, format!("invalid CSV: {error}"))
}

/// Coerce a CSV field into a JSON value
///
/// Numbers and booleans may carry surrounding spaces; strings are kept verbatim.
fn parse_csv_value(value: &str) -> JsonValue {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return JsonValue::Null;
    }

    if let Ok(n) = trimmed.parse::<i64>() {
        return JsonValue::Number(n.into());
    }

    if let Ok(n) = trimmed.parse::<f64>() {
        if let Some(num) = serde_json::Number::from_f64(n) {
            return JsonValue::Number(num);
        }
    }

    if trimmed.eq_ignore_ascii_case("true") {
        return JsonValue::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return JsonValue::Bool(false);
    }

    JsonValue::String(value.to_string())
}
