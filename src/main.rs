//! mongo-fluent - command line runner for fluent MongoDB operations.
//!
//! Connects using `MONGODB_URI` / `MONGODB_DATABASE` and prints results as
//! relaxed extended JSON, one document per line.

mod cli;

use clap::Parser;
use futures::TryStreamExt;
use mongodb::bson::{Bson, Document};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, FilterArgs, Pipeline};
use mongo_fluent::{
    AggregateOperationBuilder, Aggregation, Config, Database, Distance, FindOperationBuilder,
    NearQuery, Query,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mongo_fluent=info,mongodb=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let Cli { command } = Cli::parse();

    let config = Config::from_env()?;
    info!("Connecting to MongoDB database {}...", config.mongodb_database);
    let db = Database::connect(&config.mongodb_uri, &config.mongodb_database).await?;

    let result = run(&db, command).await;
    db.shutdown().await;
    result
}

async fn run(db: &Database, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Find(FilterArgs { collection, filter }) => {
            let documents = db
                .query::<Document>()
                .in_collection(collection)?
                .find_all_by(&Query::new(filter))
                .await?;
            documents.into_iter().for_each(print_document);
        }
        Command::First(FilterArgs { collection, filter }) => {
            let document = db
                .query::<Document>()
                .in_collection(collection)?
                .find_first_by(&Query::new(filter))
                .await?;
            document.into_iter().for_each(print_document);
        }
        Command::One(FilterArgs { collection, filter }) => {
            let document = db
                .query::<Document>()
                .in_collection(collection)?
                .find_by(&Query::new(filter))
                .await?;
            document.into_iter().for_each(print_document);
        }
        Command::Stream(FilterArgs { collection, filter }) => {
            let mut stream = db
                .query::<Document>()
                .in_collection(collection)?
                .stream_all_by(&Query::new(filter))
                .await?;

            let mut count = 0_u64;
            while let Some(document) = stream.try_next().await? {
                print_document(document);
                count += 1;
            }
            stream.close();
            info!("Streamed {} documents", count);
        }
        Command::Aggregate { collection, pipeline: Pipeline(pipeline) } => {
            let results = db
                .aggregate_and_return::<Document>()
                .in_collection(collection)?
                .process(&Aggregation::new(pipeline))
                .await?;
            results.into_iter().for_each(print_document);
        }
        Command::Near { collection, x, y, max_km } => {
            let mut near = NearQuery::near(x, y);
            if let Some(max_km) = max_km {
                near = near.max_distance(Distance::kilometers(max_km));
            }

            let results = db
                .query::<Document>()
                .in_collection(collection)?
                .find_all_near_by(&near)
                .await?;

            info!("Average distance: {}", results.average_distance());
            for result in results {
                let distance = result.distance().value();
                let mut document = result.into_content();
                document.insert("distance", distance);
                print_document(document);
            }
        }
    }

    Ok(())
}

fn print_document(document: Document) {
    println!("{}", Bson::Document(document).into_relaxed_extjson());
}
