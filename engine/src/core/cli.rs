use clap::{Parser, Subcommand};

use std::path::PathBuf;

use crate::data::sql::Backend;

use super::constants::{ENV_BACKEND, ENV_CONFIG, ENV_METRICS, ENV_SCHEMA};

#[derive(Parser)]
#[command(name = "pgfilter")]
#[command(version, about = "Compile filter requests into parameterized SQL", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Path to the schema catalog (JSON)
    #[arg(long, short = 's', global = true, env = ENV_SCHEMA)]
    pub schema: Option<PathBuf>,

    /// SQL backend used for rendering (postgres or sqlite)
    #[arg(long, short = 'b', global = true, env = ENV_BACKEND, value_parser = parse_backend)]
    pub backend: Option<Backend>,

    /// Print resolver metrics to stderr when the command finishes
    #[arg(long, global = true, env = ENV_METRICS)]
    pub metrics: Option<bool>,
}

/// Parse backend from CLI/env string
fn parse_backend(s: &str) -> Result<Backend, String> {
    s.parse()
}

#[derive(Subcommand, Clone, Debug, PartialEq)]
pub enum Commands {
    /// Compile a filter request against an entity and print the SQL
    Compile {
        /// Root entity name as it appears in the schema catalog
        #[arg(long, short = 'e')]
        entity: String,

        /// Alias of the root entity (defaults to the snake-cased entity name)
        #[arg(long, short = 'a')]
        alias: Option<String>,

        /// Request JSON file, or `-` for stdin
        #[arg(long, short = 'r', default_value = "-")]
        request: String,

        /// Render positional placeholders for the configured backend
        #[arg(long)]
        positional: bool,
    },
    /// Print the relation map of an entity
    Relations {
        /// Entity name as it appears in the schema catalog
        #[arg(long, short = 'e')]
        entity: String,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub schema: Option<PathBuf>,
    pub backend: Option<Backend>,
    pub metrics: Option<bool>,
}

impl From<&Cli> for CliConfig {
    fn from(cli: &Cli) -> Self {
        Self {
            config: cli.config.clone(),
            schema: cli.schema.clone(),
            backend: cli.backend,
            metrics: cli.metrics,
        }
    }
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Commands) {
    let cli = Cli::parse();
    (CliConfig::from(&cli), cli.command)
}
