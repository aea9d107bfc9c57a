//! Catalog Check Binary
//!
//! Connects to the movie graph, prints the catalog and the user list, and
//! optionally the page payload for one viewer. Useful as a smoke check that
//! credentials, connectivity and the row mappers agree with a live database.
//!
//! # Usage
//!
//! ```bash
//! # Against Neo4j, configured from the environment (or a .env file)
//! cargo run --bin catalog-check
//!
//! # Against a seeded in-process graph, no database needed
//! cargo run --bin catalog-check -- --memory
//!
//! # Also print the page payload for a viewer
//! cargo run --bin catalog-check -- --viewer ana
//! ```
//!
//! # Environment Variables
//!
//! - `NEO4J_URI`, `NEO4J_USER`, `NEO4J_PASSWORD`: required unless `--memory`
//! - `NEO4J_MAX_CONNECTIONS`, `NEO4J_FETCH_SIZE`: optional pool tuning
//! - `RUST_LOG`: Logging level (e.g., "info", "debug", "trace")

use std::sync::Arc;

use clap::Parser;

use cinegraph_core::db::{GraphClient, MemoryGraph, Neo4jClient, StoreConfig};
use cinegraph_core::MovieService;

#[derive(Parser)]
#[command(name = "catalog-check")]
#[command(about = "Print the movie catalog and users from a Cinegraph store")]
struct Args {
    /// Use a seeded in-memory graph instead of Neo4j
    #[arg(long)]
    memory: bool,

    /// Also print the page payload for this user
    #[arg(long)]
    viewer: Option<String>,
}

/// Small fixed catalog for `--memory` runs
async fn seeded_memory_graph() -> MemoryGraph {
    let graph = MemoryGraph::new();
    graph.insert_movie("Alien", Some(4.0)).await;
    graph.insert_movie("Heat", Some(4.5)).await;
    graph.insert_movie("The Room", None).await;
    graph.insert_user("u1", "ana", 31).await;
    graph.insert_user("u2", "ben", 45).await;
    graph
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the process environment still applies
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let client: Arc<dyn GraphClient> = if args.memory {
        tracing::info!("Using seeded in-memory graph");
        Arc::new(seeded_memory_graph().await)
    } else {
        let config = StoreConfig::from_env()?;
        tracing::info!("Connecting to {} as {}", config.uri, config.user);
        Arc::new(Neo4jClient::connect(&config).await?)
    };

    let service = MovieService::new(client);
    let result = report(&service, args.viewer.as_deref()).await;

    if let Err(e) = service.shutdown().await {
        tracing::warn!("Failed to close graph client: {}", e);
    }
    result
}

async fn report(service: &MovieService, viewer: Option<&str>) -> anyhow::Result<()> {
    let movies = service.list_movies().await?;
    tracing::info!("Movies: {}", movies.len());
    for movie in &movies {
        match movie.rating {
            Some(rating) => println!("{:<40} {:.2}", movie.title, rating),
            None => println!("{:<40} -", movie.title),
        }
    }

    let users = service.list_users().await?;
    tracing::info!("Users: {}", users.len());
    for user in &users {
        println!(
            "{:<16} {:<24} {}",
            user.user_id.as_deref().unwrap_or("-"),
            user.name,
            user.age
                .map(|a| a.to_string())
                .unwrap_or_else(|| "-".to_string())
        );
    }

    if let Some(name) = viewer {
        let context = service.select_viewer(name)?;
        let page = service.page_data(&context).await?;
        println!("{}", serde_json::to_string_pretty(&page)?);
    }

    Ok(())
}
