//! Pipeline configuration
//!
//! A pipeline is described by a single YAML document. Every setting a run
//! needs, destination credentials included, lives in this structure; nothing
//! is read from the process environment.
//!
//! ```yaml
//! name: rides
//! source:
//!   kind: pages
//!   url: https://example.com/api/rides
//! destination:
//!   kind: duckdb
//!   path: rides.duckdb
//!   dataset: rides_data
//!   table: rides
//!   write_disposition: replace
//! ```

use crate::decode::Compression;
use crate::error::{Error, Result};
use crate::http::HttpClientConfig;
use crate::pagination::EndOfDataPolicy;
use crate::transform::TransformConfig;
use crate::types::WriteDisposition;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Top-Level Pipeline Config
// ============================================================================

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name, also the default table name
    pub name: String,

    /// Where records come from
    pub source: SourceConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Transform applied to every record
    #[serde(default)]
    pub transform: TransformConfig,

    /// Where records go
    #[serde(default)]
    pub destination: DestinationConfig,

    /// Stop after this many records have been read
    #[serde(default)]
    pub max_records: Option<usize>,

    /// Records per batch for line-oriented sources
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_batch_size() -> usize {
    1000
}

impl PipelineConfig {
    /// Create a config with defaults for everything but name and source
    pub fn new(name: impl Into<String>, source: SourceConfig) -> Self {
        Self {
            name: name.into(),
            source,
            http: HttpConfig::default(),
            transform: TransformConfig::default(),
            destination: DestinationConfig::default(),
            max_records: None,
            batch_size: default_batch_size(),
        }
    }

    /// Set the destination
    #[must_use]
    pub fn with_destination(mut self, destination: DestinationConfig) -> Self {
        self.destination = destination;
        self
    }

    /// Set the transform
    #[must_use]
    pub fn with_transform(mut self, transform: TransformConfig) -> Self {
        self.transform = transform;
        self
    }

    /// Set the record limit
    #[must_use]
    pub fn with_max_records(mut self, max_records: Option<usize>) -> Self {
        self.max_records = max_records;
        self
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Check values serde cannot
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_value("name", "must not be empty"));
        }
        if self.batch_size == 0 {
            return Err(Error::invalid_value("batch_size", "must be at least 1"));
        }
        self.source.validate()?;
        self.destination.validate()?;

        let table = self.table_name();
        if matches!(self.destination, DestinationConfig::Duckdb { .. }) && !is_identifier(&table) {
            return Err(Error::invalid_value(
                "destination.table",
                format!("'{table}' (from the pipeline name) is not a valid identifier"),
            ));
        }
        Ok(())
    }

    /// Table name used by destinations that do not set their own
    pub fn table_name(&self) -> String {
        self.destination
            .table()
            .map_or_else(|| self.name.clone(), str::to_string)
    }
}

// ============================================================================
// Source Config
// ============================================================================

/// Source definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Page-number paginated JSON endpoint
    Pages {
        /// Endpoint URL
        url: String,
        /// Query parameter carrying the page number
        #[serde(default = "default_page_param")]
        page_param: String,
        /// First page number
        #[serde(default = "default_start_page")]
        start_page: u32,
        /// Extra query parameters sent with every request
        #[serde(default)]
        query: BTreeMap<String, String>,
        /// End-of-data detection
        #[serde(default)]
        end_of_data: EndOfDataPolicy,
    },

    /// Newline-delimited JSON resource
    Lines {
        /// Resource URL
        url: String,
    },

    /// List of CSV files, optionally gzip-compressed
    Csv {
        /// File URLs, fetched in order
        urls: Vec<String>,
        /// Field delimiter
        #[serde(default = "default_delimiter")]
        delimiter: char,
        /// Whether the first row is a header
        #[serde(default = "default_true")]
        has_header: bool,
        /// Compression handling
        #[serde(default)]
        compression: Compression,
    },
}

fn default_page_param() -> String {
    "page".to_string()
}

fn default_start_page() -> u32 {
    1
}

fn default_delimiter() -> char {
    ','
}

fn default_true() -> bool {
    true
}

impl SourceConfig {
    /// Paginated source with default parameter name and start page
    pub fn pages(url: impl Into<String>) -> Self {
        Self::Pages {
            url: url.into(),
            page_param: default_page_param(),
            start_page: default_start_page(),
            query: BTreeMap::new(),
            end_of_data: EndOfDataPolicy::default(),
        }
    }

    /// JSON-lines source
    pub fn lines(url: impl Into<String>) -> Self {
        Self::Lines { url: url.into() }
    }

    /// CSV file list source with default decoding
    pub fn csv(urls: Vec<String>) -> Self {
        Self::Csv {
            urls,
            delimiter: default_delimiter(),
            has_header: true,
            compression: Compression::Auto,
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            SourceConfig::Pages {
                url, page_param, ..
            } => {
                check_url("source.url", url)?;
                if page_param.is_empty() {
                    return Err(Error::invalid_value("source.page_param", "must not be empty"));
                }
            }
            SourceConfig::Lines { url } => check_url("source.url", url)?,
            SourceConfig::Csv {
                urls, delimiter, ..
            } => {
                if !delimiter.is_ascii() {
                    return Err(Error::invalid_value(
                        "source.delimiter",
                        format!("{delimiter:?} is not an ASCII character"),
                    ));
                }
                if urls.is_empty() {
                    return Err(Error::invalid_value("source.urls", "must not be empty"));
                }
                for url in urls {
                    check_url("source.urls", url)?;
                }
            }
        }
        Ok(())
    }
}

fn check_url(field: &str, value: &str) -> Result<()> {
    let parsed = url::Url::parse(value)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::invalid_value(
            field,
            format!("unsupported scheme '{}'", parsed.scheme()),
        ));
    }
    Ok(())
}

// ============================================================================
// HTTP Config
// ============================================================================

/// HTTP client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Transport timeout in seconds
    pub timeout_secs: u64,
    /// User agent override
    pub user_agent: Option<String>,
    /// Headers sent with every request
    pub headers: BTreeMap<String, String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: None,
            headers: BTreeMap::new(),
        }
    }
}

impl HttpConfig {
    /// Convert into the HTTP client configuration
    pub fn to_client_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder().timeout(Duration::from_secs(self.timeout_secs));
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent);
        }
        for (key, value) in &self.headers {
            builder = builder.header(key, value);
        }
        builder.build()
    }
}

// ============================================================================
// Destination Config
// ============================================================================

/// Destination definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DestinationConfig {
    /// Print records as JSON lines
    #[default]
    Stdout,

    /// Local JSON-lines file
    Jsonl {
        /// Output file
        path: PathBuf,
        /// Append to or replace the file
        #[serde(default)]
        write_disposition: WriteDisposition,
    },

    /// Local directory or GCS bucket (`gs://bucket/prefix`)
    ObjectStore {
        /// Destination URL
        url: String,
        /// Service account key file for `gs://` URLs
        #[serde(default)]
        credentials_path: Option<PathBuf>,
        /// Table (top-level folder) name; defaults to the pipeline name
        #[serde(default)]
        table: Option<String>,
    },

    /// DuckDB table of raw JSON documents
    Duckdb {
        /// Database file, or `:memory:`
        #[serde(default = "default_duckdb_path")]
        path: String,
        /// Schema holding the table
        dataset: String,
        /// Table name; defaults to the pipeline name
        #[serde(default)]
        table: Option<String>,
        /// Append to or replace the table
        #[serde(default)]
        write_disposition: WriteDisposition,
    },
}

fn default_duckdb_path() -> String {
    ":memory:".to_string()
}

impl DestinationConfig {
    /// Explicit table name, if the destination has one
    pub fn table(&self) -> Option<&str> {
        match self {
            DestinationConfig::ObjectStore { table, .. }
            | DestinationConfig::Duckdb { table, .. } => table.as_deref(),
            DestinationConfig::Stdout | DestinationConfig::Jsonl { .. } => None,
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            DestinationConfig::Stdout | DestinationConfig::Jsonl { .. } => Ok(()),
            DestinationConfig::ObjectStore {
                url,
                credentials_path,
                ..
            } => {
                if url.starts_with("gs://") && credentials_path.is_none() {
                    return Err(Error::invalid_value(
                        "destination.credentials_path",
                        "required for gs:// destinations",
                    ));
                }
                Ok(())
            }
            DestinationConfig::Duckdb { dataset, table, .. } => {
                if !is_identifier(dataset) {
                    return Err(Error::invalid_value(
                        "destination.dataset",
                        format!("'{dataset}' is not a valid identifier"),
                    ));
                }
                if let Some(table) = table {
                    if !is_identifier(table) {
                        return Err(Error::invalid_value(
                            "destination.table",
                            format!("'{table}' is not a valid identifier"),
                        ));
                    }
                }
                Ok(())
            }
        }
    }
}

/// ASCII letters, digits and underscores, not starting with a digit
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
