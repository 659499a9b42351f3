//! CLI commands and argument parsing

use crate::config::DestinationConfig;
use crate::decode::Compression;
use crate::error::{Error, Result};
use crate::pagination::EndOfDataPolicy;
use crate::types::WriteDisposition;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Load paginated JSON, JSON lines and CSV files into local or cloud storage
#[derive(Parser, Debug)]
#[command(name = "pagefeed")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format for the load summary
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load every page of a page-number paginated endpoint
    Pages {
        /// Endpoint URL
        url: String,

        /// Query parameter carrying the page number
        #[arg(long, default_value = "page")]
        page_param: String,

        /// First page number
        #[arg(long, default_value = "1")]
        start_page: u32,

        /// Extra query parameter sent with every request (key=value, repeatable)
        #[arg(short, long = "query", value_name = "KEY=VALUE")]
        query: Vec<String>,

        /// Which bodies end the sequence
        #[arg(long, default_value = "strict")]
        end_of_data: EndOfDataPolicy,

        #[command(flatten)]
        load: LoadArgs,
    },

    /// Load a newline-delimited JSON resource
    Lines {
        /// Resource URL
        url: String,

        /// Records per batch
        #[arg(long, default_value = "1000")]
        batch_size: usize,

        #[command(flatten)]
        load: LoadArgs,
    },

    /// Load a list of CSV files, in order
    Csv {
        /// File URLs
        #[arg(required = true)]
        urls: Vec<String>,

        /// Field delimiter
        #[arg(long, default_value = ",")]
        delimiter: char,

        /// Files have no header row
        #[arg(long)]
        no_header: bool,

        /// Compression of the downloaded files
        #[arg(long, default_value = "auto")]
        compression: Compression,

        #[command(flatten)]
        load: LoadArgs,
    },

    /// Run a pipeline described by a YAML file
    Run {
        /// Pipeline definition file (YAML)
        #[arg(short, long)]
        pipeline: PathBuf,
    },

    /// Validate a pipeline definition without running it
    Validate {
        /// Pipeline definition file (YAML)
        #[arg(short, long)]
        pipeline: PathBuf,
    },
}

/// Pipeline name, destination and limits shared by the ad-hoc load commands
#[derive(Args, Debug, Clone)]
pub struct LoadArgs {
    /// Pipeline name (also the default table name)
    #[arg(long, default_value = "pagefeed")]
    pub name: String,

    /// Object store destination: local directory or gs://bucket/prefix
    #[arg(short, long, conflicts_with_all = ["jsonl", "duckdb"])]
    pub output: Option<String>,

    /// Service account key file for gs:// destinations
    #[arg(long, requires = "output")]
    pub credentials: Option<PathBuf>,

    /// Local JSON-lines file destination
    #[arg(long, conflicts_with = "duckdb")]
    pub jsonl: Option<PathBuf>,

    /// DuckDB database file (or :memory:)
    #[arg(long, requires = "dataset")]
    pub duckdb: Option<String>,

    /// DuckDB schema holding the table
    #[arg(long)]
    pub dataset: Option<String>,

    /// Table name (defaults to the pipeline name)
    #[arg(long)]
    pub table: Option<String>,

    /// Append to or replace earlier loads
    #[arg(long, default_value = "append")]
    pub disposition: WriteDisposition,

    /// Stop after this many records
    #[arg(long)]
    pub max_records: Option<usize>,
}

impl LoadArgs {
    /// Destination selected by the flags; stdout when none is given
    pub fn destination(&self) -> Result<DestinationConfig> {
        if let Some(url) = &self.output {
            return Ok(DestinationConfig::ObjectStore {
                url: url.clone(),
                credentials_path: self.credentials.clone(),
                table: self.table.clone(),
            });
        }

        if let Some(path) = &self.jsonl {
            return Ok(DestinationConfig::Jsonl {
                path: path.clone(),
                write_disposition: self.disposition,
            });
        }

        if let Some(path) = &self.duckdb {
            let dataset = self
                .dataset
                .clone()
                .ok_or_else(|| Error::config("--duckdb requires --dataset"))?;
            return Ok(DestinationConfig::Duckdb {
                path: path.clone(),
                dataset,
                table: self.table.clone(),
                write_disposition: self.disposition,
            });
        }

        Ok(DestinationConfig::Stdout)
    }
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
