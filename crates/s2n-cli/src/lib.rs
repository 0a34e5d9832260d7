//! s2n CLI library
//!
//! Command-line driver for the Specify Network broker core. Provider
//! payloads come from a fixture directory (see [`fixtures`]); the broker
//! standardizes and aggregates them and the result is printed as JSON or as
//! a comparison table.
//!
//! - **Occurrences**: `s2n occ --occid ID`
//! - **Names**: `s2n name "Poa annua" --gbif-count`
//! - **Maps**: `s2n map "Acer rubrum" --scenario worldclim-curr`
//! - **GUID resolution**: `s2n resolve ID`
//! - **Providers**: `s2n providers`

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod commands;
pub mod error;
pub mod fixtures;
pub mod output;

pub use error::{CliError, Result};
pub use fixtures::FixtureFetcher;
pub use output::OutputFormat;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// s2n - Specify Network broker
#[derive(Parser, Debug)]
#[command(name = "s2n")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory of saved provider responses
    #[arg(long, env = "S2N_FIXTURES", global = true)]
    pub fixtures: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json, global = true)]
    pub format: OutputFormat,
}

/// Provider selection shared by the query commands
#[derive(Args, Debug, Clone, Default)]
pub struct ProviderArgs {
    /// Comma-separated provider codes, all providers of the service if omitted
    #[arg(short, long, value_delimiter = ',')]
    pub provider: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Find specimen occurrence records
    Occ {
        /// Occurrence identifier
        #[arg(long, conflicts_with = "dataset_key", required_unless_present = "dataset_key")]
        occid: Option<String>,

        /// GBIF dataset key
        #[arg(long)]
        dataset_key: Option<String>,

        /// Report provider totals only
        #[arg(long)]
        count_only: bool,

        #[command(flatten)]
        providers: ProviderArgs,
    },

    /// Find taxonomic name records
    Name {
        /// Scientific name
        namestr: String,

        /// Only accepted names
        #[arg(long)]
        accepted: bool,

        /// Add GBIF occurrence counts
        #[arg(long)]
        gbif_count: bool,

        /// Restrict to a kingdom
        #[arg(long)]
        kingdom: Option<String>,

        #[command(flatten)]
        providers: ProviderArgs,
    },

    /// Find species distribution map layers
    Map {
        /// Scientific name
        namestr: String,

        /// Projection scenario codes to keep
        #[arg(long = "scenario")]
        scenarios: Vec<String>,

        /// Layer color
        #[arg(long)]
        color: Option<String>,

        #[command(flatten)]
        providers: ProviderArgs,
    },

    /// Resolve an occurrence GUID to its Specify record
    Resolve {
        /// Occurrence identifier
        occid: String,

        #[command(flatten)]
        providers: ProviderArgs,
    },

    /// List known providers and the services they answer
    Providers,
}
