//! Cinegraph Core
//!
//! This crate provides the data access and business logic of the Cinegraph
//! movie-rating backend: listing movies and users, creating users, rating
//! movies and maintaining each movie's average rating in a Neo4j graph.
//!
//! # Architecture
//!
//! - **Unit of work**: every operation opens one session, runs one statement,
//!   maps the rows and releases the session on every exit path
//! - **Injected client**: the driver is built once from [`db::StoreConfig`] and
//!   shared as `Arc<dyn GraphClient>`; there is no ambient connection state
//! - **Explicit request context**: the viewing user travels in a
//!   [`ViewerContext`], never in process-wide state
//!
//! # Modules
//!
//! - [`db`] - Record model, store client seam, unit of work, Neo4j and in-memory backends
//! - [`models`] - Data structures (Movie, User, UserMovies, etc.)
//! - [`services`] - Business services (MovieService)
//!
//! # Examples
//!
//! ```rust
//! use cinegraph_core::db::MemoryGraph;
//! use cinegraph_core::MovieService;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let graph = MemoryGraph::new();
//! graph.insert_movie("Heat", None).await;
//!
//! let service = MovieService::new(Arc::new(graph));
//! let id = service.create_user("ana", 31).await?;
//! service.rate_movie("ana", "Heat", 5).await?;
//! service.recompute_movie_rating("Heat").await?;
//!
//! assert!(id.as_known().is_some());
//! assert_eq!(service.list_movies().await?[0].rating, Some(5.0));
//! # Ok(())
//! # }
//! ```

pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use models::*;
pub use services::*;
