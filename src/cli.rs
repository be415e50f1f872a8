//! Command line parsing for the `mongo-fluent` binary.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use mongodb::bson::{Bson, Document};

/// Run fluent find and aggregate operations against MongoDB.
///
/// Connects using `MONGODB_URI` and `MONGODB_DATABASE` (default: test).
/// `RUST_LOG` controls the log filter.
#[derive(Parser, Debug)]
#[command(name = "mongo-fluent", version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// All matching documents
    Find(FilterArgs),

    /// First matching document
    First(FilterArgs),

    /// The single matching document
    One(FilterArgs),

    /// All matching documents via cursor
    Stream(FilterArgs),

    /// Run an aggregation pipeline
    Aggregate {
        /// Collection to aggregate
        collection: String,

        /// Pipeline as a JSON array of stage objects
        #[arg(value_name = "PIPELINE_JSON", value_parser = parse_pipeline)]
        pipeline: Pipeline,
    },

    /// Documents near a point
    Near {
        /// Collection to search
        collection: String,

        #[arg(allow_negative_numbers = true)]
        x: f64,

        #[arg(allow_negative_numbers = true)]
        y: f64,

        /// Maximum distance in kilometers
        #[arg(long)]
        max_km: Option<f64>,
    },
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct FilterArgs {
    /// Collection to query
    pub collection: String,

    /// Filter as a JSON object, extended JSON allowed
    #[arg(value_name = "FILTER_JSON", value_parser = parse_filter, default_value = "{}")]
    pub filter: Document,
}

/// Aggregation stages parsed from a single argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline(pub Vec<Document>);

fn parse_json(raw: &str) -> Result<Bson> {
    let value: serde_json::Value = serde_json::from_str(raw).context("invalid JSON")?;
    Bson::try_from(value).context("invalid extended JSON")
}

fn parse_filter(raw: &str) -> Result<Document> {
    match parse_json(raw)? {
        Bson::Document(filter) => Ok(filter),
        other => bail!("filter must be a JSON object, got {:?}", other.element_type()),
    }
}

fn parse_pipeline(raw: &str) -> Result<Pipeline> {
    let Bson::Array(stages) = parse_json(raw)? else {
        bail!("pipeline must be a JSON array");
    };

    stages
        .into_iter()
        .enumerate()
        .map(|(i, stage)| match stage {
            Bson::Document(stage) => Ok(stage),
            _ => bail!("pipeline stage {} must be a JSON object", i),
        })
        .collect::<Result<Vec<_>>>()
        .map(Pipeline)
}
