//! Pipeline types
//!
//! Load identifiers and the summary returned by a run.

use chrono::Utc;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Generate a load id from the current UTC time
///
/// Microsecond resolution, sortable as text: `20240131235959123456`.
pub fn new_load_id() -> String {
    Utc::now().format("%Y%m%d%H%M%S%6f").to_string()
}

/// Summary of a completed load
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadInfo {
    /// Pipeline name
    pub pipeline: String,
    /// Identifier shared by everything written in this run
    pub load_id: String,
    /// Batches pulled from the source
    pub batches: usize,
    /// Records pulled from the source (after the record limit)
    pub records_read: usize,
    /// Records dropped by the transform
    pub records_filtered: usize,
    /// Records the sink reports as persisted
    pub records_written: usize,
    /// Whether the record limit ended the run
    pub limit_reached: bool,
    /// Sink location
    pub destination: String,
    /// Wall-clock duration of the run
    #[serde(with = "duration_ms")]
    pub elapsed: Duration,
}

impl fmt::Display for LoadInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pipeline {} load {}: {} records in {} batches written to {} ({} filtered) in {:.2}s",
            self.pipeline,
            self.load_id,
            self.records_written,
            self.batches,
            self.destination,
            self.records_filtered,
            self.elapsed.as_secs_f64()
        )
    }
}

mod duration_ms {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }
}
