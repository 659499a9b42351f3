//! Object store sink (GCS bucket or local directory)

use super::{Sink, SinkReport};
use crate::error::{Error, Result};
use crate::types::{Batch, OptionStringExt};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Build a Hive-style partitioned path for one load
///
/// Format: `{table}/dt={YYYY-MM-DD}/{load_id}.{ext}`
pub fn build_partitioned_path(table: &str, load_id: &str, extension: &str) -> String {
    let date = Utc::now().format("%Y-%m-%d");
    let sanitized_table = table.replace('.', "_");
    format!("{sanitized_table}/dt={date}/{load_id}.{extension}")
}

/// Buffers a load as JSON lines and writes it as a single object
#[derive(Debug)]
pub struct ObjectStoreSink {
    /// The object store implementation
    store: Arc<dyn ObjectStore>,
    /// Prefix within the bucket
    prefix: Option<String>,
    /// `gs` or `file`
    scheme: String,
    /// Top-level folder for this pipeline's objects
    table: String,
    buffer: Vec<u8>,
    written: usize,
}

impl ObjectStoreSink {
    /// Parse a destination URL and create the matching store
    ///
    /// Supported formats:
    /// - `gs://bucket/prefix/` - Google Cloud Storage, authenticated with
    ///   the given service account key file
    /// - `file:///local/path/`, `/local/path/` or `./path/` - local directory
    pub fn parse(url: &str, credentials_path: Option<&Path>, table: &str) -> Result<Self> {
        if let Some(without_scheme) = url.strip_prefix("gs://") {
            Self::parse_gcs(without_scheme, credentials_path, table)
        } else {
            Self::parse_local(url, table)
        }
    }

    fn parse_gcs(without_scheme: &str, credentials_path: Option<&Path>, table: &str) -> Result<Self> {
        let (bucket, prefix) = match without_scheme.split_once('/') {
            Some((bucket, prefix)) => (bucket, prefix.trim_matches('/').to_string()),
            None => (without_scheme, String::new()),
        };
        if bucket.is_empty() {
            return Err(Error::config("GCS URL is missing a bucket name"));
        }

        let credentials = credentials_path
            .ok_or_else(|| Error::config("GCS destination requires a credentials path"))?;

        let store = GoogleCloudStorageBuilder::new()
            .with_bucket_name(bucket)
            .with_service_account_path(credentials.to_string_lossy())
            .build()
            .map_err(|e| Error::config(format!("Failed to create GCS client: {e}")))?;

        Ok(Self::with_store(Arc::new(store), prefix.none_if_empty(), "gs", table))
    }

    fn parse_local(path: &str, table: &str) -> Result<Self> {
        let path = path.strip_prefix("file://").unwrap_or(path);

        std::fs::create_dir_all(path)
            .map_err(|e| Error::config(format!("Failed to create directory {path}: {e}")))?;

        let store = LocalFileSystem::new_with_prefix(path)
            .map_err(|e| Error::config(format!("Failed to create local store: {e}")))?;

        Ok(Self::with_store(Arc::new(store), None, "file", table))
    }

    /// Use an already configured store
    pub fn with_store(
        store: Arc<dyn ObjectStore>,
        prefix: Option<String>,
        scheme: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            store,
            prefix,
            scheme: scheme.into(),
            table: table.into(),
            buffer: Vec::new(),
            written: 0,
        }
    }

    fn object_path(&self, load_id: &str) -> ObjectPath {
        let filename = build_partitioned_path(&self.table, load_id, "jsonl");
        match &self.prefix {
            Some(prefix) => ObjectPath::from(format!("{prefix}/{filename}")),
            None => ObjectPath::from(filename),
        }
    }
}

#[async_trait]
impl Sink for ObjectStoreSink {
    fn describe(&self) -> String {
        format!("{} object store", self.scheme)
    }

    async fn write_batch(&mut self, _load_id: &str, batch: &Batch) -> Result<()> {
        for record in &batch.records {
            serde_json::to_writer(&mut self.buffer, record)?;
            self.buffer.push(b'\n');
        }
        self.written += batch.len();
        Ok(())
    }

    async fn finish(&mut self, load_id: &str) -> Result<SinkReport> {
        let path = self.object_path(load_id);
        let data = Bytes::from(std::mem::take(&mut self.buffer));
        let size = data.len();

        self.store.put(&path, data.into()).await?;

        let location = format!("{}://{path}", self.scheme);
        info!(location = %location, bytes = size, "Wrote object");
        Ok(SinkReport {
            records_written: self.written,
            location,
        })
    }
}
