//! CLI module
//!
//! Command-line interface for running loads.
//!
//! # Commands
//!
//! - `pages` - Load a page-number paginated endpoint
//! - `lines` - Load a JSON-lines resource
//! - `csv` - Load a list of CSV files
//! - `run` - Run a pipeline from a YAML file
//! - `validate` - Check a pipeline file

mod commands;
mod runner;

pub use commands::{Cli, Commands, LoadArgs, OutputFormat};
pub use runner::Runner;
