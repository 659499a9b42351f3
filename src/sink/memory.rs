//! In-process sinks

use super::{Sink, SinkReport};
use crate::error::Result;
use crate::types::{Batch, Record};
use async_trait::async_trait;
use std::io::Write;

/// Keeps every batch in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    batches: Vec<Batch>,
    finished: bool,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Batches received so far
    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// All records received so far, in order
    pub fn records(&self) -> Vec<&Record> {
        self.batches.iter().flat_map(|b| b.records.iter()).collect()
    }

    /// Whether `finish` was called
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

#[async_trait]
impl Sink for MemorySink {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    async fn write_batch(&mut self, _load_id: &str, batch: &Batch) -> Result<()> {
        self.batches.push(batch.clone());
        Ok(())
    }

    async fn finish(&mut self, _load_id: &str) -> Result<SinkReport> {
        self.finished = true;
        Ok(SinkReport {
            records_written: self.batches.iter().map(Batch::len).sum(),
            location: "memory".to_string(),
        })
    }
}

/// Prints records to standard output, one JSON document per line
#[derive(Debug, Default)]
pub struct StdoutSink {
    written: usize,
}

impl StdoutSink {
    /// Create a stdout sink
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Sink for StdoutSink {
    fn describe(&self) -> String {
        "stdout".to_string()
    }

    async fn write_batch(&mut self, _load_id: &str, batch: &Batch) -> Result<()> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        for record in &batch.records {
            serde_json::to_writer(&mut out, record)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
        self.written += batch.len();
        Ok(())
    }

    async fn finish(&mut self, _load_id: &str) -> Result<SinkReport> {
        Ok(SinkReport {
            records_written: self.written,
            location: "stdout".to_string(),
        })
    }
}
