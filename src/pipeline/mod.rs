//! Pipeline module
//!
//! Drives a [`Source`] into a [`Sink`], one batch at a time.
//!
//! # Overview
//!
//! - `Pipeline` - Pulls batches, applies the record transform, writes to the sink
//! - `LoadInfo` - Summary of a completed run
//! - `run_config` - Builds client, source and sink from a `PipelineConfig` and runs it

mod types;

pub use types::{new_load_id, LoadInfo};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::http::HttpClient;
use crate::sink::{self, Sink};
use crate::source::{self, Source};
use crate::transform::{RecordTransform, TransformConfig};
use futures::TryStreamExt;
use std::time::Instant;
use tracing::{debug, info};

/// Moves records from a source to a sink
#[derive(Debug, Clone)]
pub struct Pipeline {
    name: String,
    transform: RecordTransform,
    max_records: Option<usize>,
}

impl Pipeline {
    /// Create a pipeline with no transform and no record limit
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: RecordTransform::default(),
            max_records: None,
        }
    }

    /// Create a pipeline from its configuration
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(&config.name)
            .with_transform(config.transform.clone())
            .with_max_records(config.max_records)
    }

    /// Set the record transform
    #[must_use]
    pub fn with_transform(mut self, config: TransformConfig) -> Self {
        self.transform = RecordTransform::new(config);
        self
    }

    /// Stop after this many records have been read from the source
    #[must_use]
    pub fn with_max_records(mut self, max_records: Option<usize>) -> Self {
        self.max_records = max_records;
        self
    }

    /// Pipeline name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run one load
    ///
    /// The first error from the source, the transform or the sink ends the
    /// run and the sink is not finished. Once the record limit is reached
    /// the source stream is dropped without being polled again.
    pub async fn run(&self, source: &dyn Source, sink: &mut dyn Sink) -> Result<LoadInfo> {
        let start = Instant::now();
        let load_id = new_load_id();
        info!(
            pipeline = %self.name,
            load_id = %load_id,
            source = %source.describe(),
            destination = %sink.describe(),
            "Starting load"
        );

        let mut batches = source.batches();
        let mut batch_count = 0;
        let mut records_read = 0;
        let mut records_filtered = 0;
        let mut limit_reached = self.max_records == Some(0);

        while !limit_reached {
            let Some(mut batch) = batches.try_next().await? else {
                break;
            };

            if let Some(limit) = self.max_records {
                batch.records.truncate(limit - records_read);
                limit_reached = records_read + batch.len() >= limit;
            }

            batch_count += 1;
            records_read += batch.len();
            records_filtered += self.transform.apply(&mut batch.records);

            if !batch.is_empty() {
                debug!(origin = %batch.origin, records = batch.len(), "Writing batch");
                sink.write_batch(&load_id, &batch).await?;
            }
        }
        drop(batches);

        if limit_reached {
            debug!(records_read, "Record limit reached");
        }

        let report = sink.finish(&load_id).await?;
        let load = LoadInfo {
            pipeline: self.name.clone(),
            load_id,
            batches: batch_count,
            records_read,
            records_filtered,
            records_written: report.records_written,
            limit_reached,
            destination: report.location,
            elapsed: start.elapsed(),
        };

        info!(
            pipeline = %load.pipeline,
            load_id = %load.load_id,
            records = load.records_written,
            filtered = load.records_filtered,
            elapsed_ms = u64::try_from(load.elapsed.as_millis()).unwrap_or(u64::MAX),
            "Load complete"
        );
        Ok(load)
    }
}

/// Build everything a configuration describes and run one load
pub async fn run_config(config: &PipelineConfig) -> Result<LoadInfo> {
    config.validate()?;

    let client = HttpClient::with_config(config.http.to_client_config())?;
    let source = source::from_config(&config.source, client, config.batch_size);
    let mut sink = sink::from_config(config)?;

    Pipeline::from_config(config)
        .run(source.as_ref(), sink.as_mut())
        .await
}
