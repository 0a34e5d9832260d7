//! The occ, name, map and resolve commands
//!
//! All four build a [`Query`], aggregate it over the fixture directory and
//! print the outer envelope.

use std::path::Path;

use s2n_broker::{Aggregator, BrokerConfig, Query, QueryOptions, SchemaRegistry, StandardizerTable};
use tracing::info;

use crate::error::{CliError, Result};
use crate::fixtures::FixtureFetcher;
use crate::output::{render, OutputFormat};
use crate::Commands;

/// Query described by a query subcommand, with its requested providers
pub fn build_query(command: &Commands) -> Result<(Query, Vec<String>)> {
    match command {
        Commands::Occ {
            occid,
            dataset_key,
            count_only,
            providers,
        } => {
            let query = match (occid, dataset_key) {
                (Some(occid), None) => Query::occurrence(occid.as_str()),
                (None, Some(key)) => Query::dataset(key.as_str()),
                _ => return Err(CliError::invalid_argument("Give exactly one of --occid or --dataset-key")),
            };
            let options = QueryOptions {
                count_only: *count_only,
                ..Default::default()
            };
            Ok((query.with_options(options), providers.provider.clone()))
        },
        Commands::Name {
            namestr,
            accepted,
            gbif_count,
            kingdom,
            providers,
        } => {
            let options = QueryOptions {
                is_accepted: *accepted,
                gbif_count: *gbif_count,
                kingdom: kingdom.clone(),
                ..Default::default()
            };
            Ok((
                Query::name(namestr.as_str()).with_options(options),
                providers.provider.clone(),
            ))
        },
        Commands::Map {
            namestr,
            scenarios,
            color,
            providers,
        } => {
            let options = QueryOptions {
                scenario_codes: scenarios.clone(),
                color: color.clone(),
                ..Default::default()
            };
            Ok((
                Query::map(namestr.as_str()).with_options(options),
                providers.provider.clone(),
            ))
        },
        Commands::Resolve { occid, providers } => {
            Ok((Query::resolve(occid.as_str()), providers.provider.clone()))
        },
        Commands::Providers => Err(CliError::invalid_argument("providers is not a query command")),
    }
}

/// Aggregate `query` over the fixtures under `root` and render the result
pub async fn execute(query: &Query, requested: &[String], root: &Path, format: OutputFormat) -> Result<String> {
    if !root.is_dir() {
        return Err(CliError::config(format!(
            "Fixture directory '{}' does not exist",
            root.display()
        )));
    }

    let config = BrokerConfig::load()?;
    let registry = SchemaRegistry::build()?;
    let standardizers = StandardizerTable::with_defaults();
    let fetcher = FixtureFetcher::new(root);
    let aggregator = Aggregator::new(&registry, &standardizers, &fetcher, &config)?;

    let envelope = aggregator.aggregate_requested(query, requested).await?;
    info!(
        service = %query.service,
        providers = envelope.count(),
        "Query answered"
    );

    let kind = query
        .service
        .record_kind()
        .ok_or_else(|| CliError::invalid_argument(format!("The {} service carries no records", query.service)))?;
    let schema = registry.get_canonical_fields(kind)?;
    render(&envelope, schema, format)
}

pub async fn run(command: &Commands, fixtures: Option<&Path>, format: OutputFormat) -> Result<()> {
    let root = fixtures.ok_or_else(|| {
        CliError::config("No fixture directory given. Pass --fixtures DIR or set S2N_FIXTURES")
    })?;
    let (query, requested) = build_query(command)?;
    let output = execute(&query, &requested, root, format).await?;
    println!("{}", output);
    Ok(())
}
