//! Database Layer
//!
//! This module handles all graph store interactions:
//!
//! - The tabular record model ([`Value`], [`Row`], [`RecordSet`], [`Statement`])
//! - The store client seam ([`GraphClient`], [`GraphSession`])
//! - The request-scoped unit of work ([`GraphUnitOfWork`])
//! - Backends: [`Neo4jClient`] (Bolt, production) and [`MemoryGraph`]
//!   (in-process, tests and offline runs)
//!
//! # Architecture
//!
//! The driver is created once at process start from a validated
//! [`StoreConfig`] and injected as `Arc<dyn GraphClient>`. Every operation
//! opens its own session, runs one statement, maps the rows and releases the
//! session, whatever the outcome.

mod config;
pub mod cypher;
mod error;
mod graph_client;
mod memory_store;
mod neo4j_store;
mod unit_of_work;
mod value;

pub use config::{
    StoreConfig, ENV_FETCH_SIZE, ENV_MAX_CONNECTIONS, ENV_PASSWORD, ENV_URI, ENV_USER,
};
pub use error::{BoxError, MappingError, StoreError, StoreErrorKind};
pub use graph_client::{GraphClient, GraphSession};
pub use memory_store::{FaultKind, MemoryGraph, MemorySession, SessionStats};
pub use neo4j_store::{Neo4jClient, Neo4jSession};
pub use unit_of_work::GraphUnitOfWork;
pub use value::{FromValue, Params, RecordSet, Row, Statement, Value};
