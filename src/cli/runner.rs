//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, LoadArgs, OutputFormat};
use crate::config::{PipelineConfig, SourceConfig};
use crate::error::{Error, Result, ResultExt};
use crate::pipeline::{run_config, LoadInfo};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Run { pipeline } => {
                let config = load_pipeline(pipeline)?;
                self.load(&config).await
            }
            Commands::Validate { pipeline } => self.validate(pipeline),
            command => {
                let config = pipeline_for(command)?;
                self.load(&config).await
            }
        }
    }

    async fn load(&self, config: &PipelineConfig) -> Result<()> {
        let load = run_config(config).await?;
        self.output_load(&load);
        Ok(())
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let config = load_pipeline(path)?;
        info!(pipeline = %config.name, "Pipeline definition is valid");

        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": format!(
                    "Pipeline '{}' is valid: {} source, destination table '{}'",
                    config.name,
                    source_kind(&config.source),
                    config.table_name()
                )
            }
        }));
        Ok(())
    }

    fn output_load(&self, load: &LoadInfo) {
        match self.cli.format {
            OutputFormat::Json => self.output_message(&json!({
                "type": "LOAD",
                "load": load,
            })),
            OutputFormat::Pretty => eprintln!("{load}"),
        }
    }

    /// Write a message to stderr; stdout may be carrying records
    fn output_message(&self, msg: &serde_json::Value) {
        match self.cli.format {
            OutputFormat::Json => eprintln!("{}", serde_json::to_string(msg).unwrap_or_default()),
            OutputFormat::Pretty => {
                eprintln!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

fn load_pipeline(path: &Path) -> Result<PipelineConfig> {
    PipelineConfig::from_file(path)
        .with_context(|| format!("Failed to load pipeline {}", path.display()))
}

fn source_kind(source: &SourceConfig) -> &'static str {
    match source {
        SourceConfig::Pages { .. } => "pages",
        SourceConfig::Lines { .. } => "lines",
        SourceConfig::Csv { .. } => "csv",
    }
}

/// Build the pipeline configuration for an ad-hoc load command
pub(crate) fn pipeline_for(command: &Commands) -> Result<PipelineConfig> {
    let (source, load, batch_size) = match command {
        Commands::Pages {
            url,
            page_param,
            start_page,
            query,
            end_of_data,
            load,
        } => (
            SourceConfig::Pages {
                url: url.clone(),
                page_param: page_param.clone(),
                start_page: *start_page,
                query: parse_query(query)?,
                end_of_data: *end_of_data,
            },
            load,
            None,
        ),
        Commands::Lines {
            url,
            batch_size,
            load,
        } => (SourceConfig::lines(url), load, Some(*batch_size)),
        Commands::Csv {
            urls,
            delimiter,
            no_header,
            compression,
            load,
        } => (
            SourceConfig::Csv {
                urls: urls.clone(),
                delimiter: *delimiter,
                has_header: !no_header,
                compression: *compression,
            },
            load,
            None,
        ),
        Commands::Run { .. } | Commands::Validate { .. } => {
            return Err(Error::config("not an ad-hoc load command"));
        }
    };

    let mut config = build_config(source, load)?;
    if let Some(batch_size) = batch_size {
        config.batch_size = batch_size;
    }
    config.validate()?;
    Ok(config)
}

fn build_config(source: SourceConfig, load: &LoadArgs) -> Result<PipelineConfig> {
    Ok(PipelineConfig::new(&load.name, source)
        .with_destination(load.destination()?)
        .with_max_records(load.max_records))
}

fn parse_query(pairs: &[String]) -> Result<BTreeMap<String, String>> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .ok_or_else(|| {
                    Error::invalid_value("query", format!("expected KEY=VALUE, got '{pair}'"))
                })
        })
        .collect()
}
