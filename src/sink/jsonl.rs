//! Local JSON-lines file sink

use super::{Sink, SinkReport};
use crate::error::{Error, Result};
use crate::types::{Batch, WriteDisposition};
use async_trait::async_trait;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes one JSON object per line to a local file
#[derive(Debug)]
pub struct JsonlSink {
    path: PathBuf,
    writer: BufWriter<File>,
    written: usize,
}

impl JsonlSink {
    /// Open the file, truncating it for `Replace` and appending for `Append`
    pub fn open(path: impl AsRef<Path>, disposition: WriteDisposition) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::output(format!("Failed to create directory {}: {e}", parent.display()))
            })?;
        }

        let mut options = OpenOptions::new();
        options.create(true);
        match disposition {
            WriteDisposition::Append => options.append(true),
            WriteDisposition::Replace => options.write(true).truncate(true),
        };

        let file = options.open(&path).map_err(|e| {
            Error::output(format!("Failed to open {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), %disposition, "Opened JSON-lines sink");

        Ok(Self {
            path,
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    /// Output file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Sink for JsonlSink {
    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }

    async fn write_batch(&mut self, _load_id: &str, batch: &Batch) -> Result<()> {
        for record in &batch.records {
            serde_json::to_writer(&mut self.writer, record)?;
            self.writer.write_all(b"\n")?;
        }
        self.written += batch.len();
        Ok(())
    }

    async fn finish(&mut self, _load_id: &str) -> Result<SinkReport> {
        self.writer.flush()?;
        Ok(SinkReport {
            records_written: self.written,
            location: self.path.display().to_string(),
        })
    }
}
