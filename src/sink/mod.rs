//! Destinations for loaded records
//!
//! A [`Sink`] receives batches in source order and persists them as raw
//! JSON documents. Sinks do not infer schemas or flatten nested values.
//!
//! # Sinks
//!
//! - [`StdoutSink`]: JSON lines on standard output
//! - [`MemorySink`]: keeps batches in memory
//! - [`JsonlSink`]: local JSON-lines file
//! - [`ObjectStoreSink`]: one JSON-lines object per load, local or `gs://`
//! - [`DuckDbSink`]: one row per record in a DuckDB table

mod duckdb;
mod jsonl;
mod memory;
mod object_store;

pub use self::duckdb::DuckDbSink;
pub use self::jsonl::JsonlSink;
pub use self::memory::{MemorySink, StdoutSink};
pub use self::object_store::{build_partitioned_path, ObjectStoreSink};

use crate::config::{DestinationConfig, PipelineConfig};
use crate::error::Result;
use crate::types::Batch;
use async_trait::async_trait;

/// Summary returned by a sink when a load completes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkReport {
    /// Records persisted during this load
    pub records_written: usize,
    /// Where they went (file path, object URL, table name)
    pub location: String,
}

/// Destination collaborator
#[async_trait]
pub trait Sink: Send {
    /// Short human-readable description for logs
    fn describe(&self) -> String;

    /// Persist one batch
    async fn write_batch(&mut self, load_id: &str, batch: &Batch) -> Result<()>;

    /// Complete the load
    async fn finish(&mut self, load_id: &str) -> Result<SinkReport>;
}

/// Build the sink described by a pipeline configuration
pub fn from_config(config: &PipelineConfig) -> Result<Box<dyn Sink>> {
    let table = config.table_name();

    let sink: Box<dyn Sink> = match &config.destination {
        DestinationConfig::Stdout => Box::new(StdoutSink::new()),
        DestinationConfig::Jsonl {
            path,
            write_disposition,
        } => Box::new(JsonlSink::open(path, *write_disposition)?),
        DestinationConfig::ObjectStore {
            url,
            credentials_path,
            ..
        } => Box::new(ObjectStoreSink::parse(
            url,
            credentials_path.as_deref(),
            &table,
        )?),
        DestinationConfig::Duckdb {
            path,
            dataset,
            write_disposition,
            ..
        } => Box::new(DuckDbSink::open(path, dataset, &table, *write_disposition)?),
    };

    Ok(sink)
}
