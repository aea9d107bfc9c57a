//! Neo4jClient - GraphClient Implementation for Neo4j
//!
//! Production backend over the `neo4rs` Bolt driver. The driver's [`Graph`]
//! holds the connection pool and is created exactly once per process by
//! [`Neo4jClient::connect`]; each session is one explicit driver transaction
//! checked out of that pool.
//!
//! # Session semantics
//!
//! - `open_session` starts a transaction (fails with a Connection error when
//!   the pool cannot produce an authenticated connection)
//! - `run` executes one statement and drains its row stream
//! - `close` commits, or rolls back if a statement in the session failed
//!
//! A session dropped without `close` (cancelled caller) drops its transaction,
//! which hands the pooled connection back to the driver uncommitted.
//!
//! # Examples
//!
//! ```rust,no_run
//! use cinegraph_core::db::{GraphClient, Neo4jClient, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StoreConfig::from_env()?;
//!     let client = Neo4jClient::connect(&config).await?;
//!     // ... hand Arc::new(client) to GraphUnitOfWork ...
//!     client.close().await?;
//!     Ok(())
//! }
//! ```

use crate::db::config::StoreConfig;
use crate::db::error::{MappingError, StoreError};
use crate::db::graph_client::{GraphClient, GraphSession};
use crate::db::value::{RecordSet, Row, Statement, Value};
use async_trait::async_trait;
use neo4rs::{BoltList, BoltMap, BoltNull, BoltString, BoltType, ConfigBuilder, Graph, Query, Txn};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// Neo4j store client holding the process-wide driver
pub struct Neo4jClient {
    uri: String,
    /// `None` once the client has been closed
    graph: RwLock<Option<Graph>>,
}

impl Neo4jClient {
    /// Validate `config` and connect the driver
    ///
    /// # Errors
    ///
    /// - [`StoreError::Configuration`] if a setting is missing or invalid;
    ///   no connection is attempted in that case
    /// - [`StoreError::Connection`] if the driver cannot reach the server
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        config.validate()?;

        let driver_config = ConfigBuilder::default()
            .uri(config.uri.as_str())
            .user(config.user.as_str())
            .password(config.password.as_str())
            .max_connections(config.max_connections)
            .fetch_size(config.fetch_size)
            .build()
            .map_err(|e| StoreError::configuration(e.to_string()))?;

        let graph = Graph::connect(driver_config).await.map_err(|e| {
            StoreError::connection_caused_by(format!("Failed to connect to {}", config.uri), e)
        })?;

        info!(uri = %config.uri, "Connected to Neo4j");
        Ok(Self {
            uri: config.uri.clone(),
            graph: RwLock::new(Some(graph)),
        })
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }
}

#[async_trait]
impl GraphClient for Neo4jClient {
    async fn open_session(&self) -> Result<Box<dyn GraphSession>, StoreError> {
        let graph = self.graph.read().await.clone().ok_or(StoreError::Closed)?;
        let txn = graph
            .start_txn()
            .await
            .map_err(|e| StoreError::connection_caused_by("Failed to start session", e))?;

        let id = Uuid::new_v4().to_string();
        debug!(session = %id, "Opened Neo4j session");
        Ok(Box::new(Neo4jSession {
            id,
            txn: Some(txn),
            failed: false,
        }))
    }

    async fn close(&self) -> Result<(), StoreError> {
        if self.graph.write().await.take().is_some() {
            info!(uri = %self.uri, "Closed Neo4j client");
        }
        Ok(())
    }
}

/// One Neo4j transaction scoped to a unit of work
pub struct Neo4jSession {
    id: String,
    txn: Option<Txn>,
    failed: bool,
}

impl Neo4jSession {
    /// Any failed statement, including one whose rows did not decode, turns
    /// the closing commit into a rollback
    fn record_outcome<T>(&mut self, outcome: Result<T, StoreError>) -> Result<T, StoreError> {
        if outcome.is_err() {
            self.failed = true;
        }
        outcome
    }
}

#[async_trait]
impl GraphSession for Neo4jSession {
    async fn run(&mut self, statement: &Statement) -> Result<RecordSet, StoreError> {
        let txn = self
            .txn
            .as_mut()
            .ok_or_else(|| StoreError::query("Session already closed"))?;

        let outcome = drain(txn, statement).await;
        self.record_outcome(outcome)
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        let Some(txn) = self.txn.take() else {
            return Ok(());
        };

        let released = if self.failed {
            txn.rollback().await
        } else {
            txn.commit().await
        };
        debug!(session = %self.id, rolled_back = self.failed, "Closed Neo4j session");
        released.map_err(|e| StoreError::connection_caused_by("Failed to release session", e))
    }

    fn id(&self) -> &str {
        &self.id
    }
}

async fn drain(txn: &mut Txn, statement: &Statement) -> Result<RecordSet, StoreError> {
    let mut stream = txn
        .execute(to_query(statement))
        .await
        .map_err(|e| StoreError::query_caused_by(statement.text().to_string(), e))?;

    let mut rows = Vec::new();
    while let Some(row) = stream
        .next(txn.handle())
        .await
        .map_err(|e| StoreError::query_caused_by(statement.text().to_string(), e))?
    {
        rows.push(from_neo4j_row(&row)?);
    }
    Ok(RecordSet::new(rows))
}

fn to_query(statement: &Statement) -> Query {
    statement
        .params()
        .iter()
        .fold(neo4rs::query(statement.text()), |query, (name, value)| {
            query.param(name, to_bolt(value))
        })
}

fn to_bolt(value: &Value) -> BoltType {
    match value {
        Value::Null => BoltType::Null(BoltNull),
        Value::Bool(b) => BoltType::from(*b),
        Value::Integer(i) => BoltType::from(*i),
        Value::Float(f) => BoltType::from(*f),
        Value::String(s) => BoltType::from(s.clone()),
        Value::List(items) => {
            let items: Vec<BoltType> = items.iter().map(to_bolt).collect();
            BoltType::List(BoltList::from(items))
        }
        Value::Map(entries) => {
            let mut map = BoltMap::with_capacity(entries.len());
            for (key, value) in entries {
                map.put(BoltString::from(key.as_str()), to_bolt(value));
            }
            BoltType::Map(map)
        }
    }
}

fn from_neo4j_row(row: &neo4rs::Row) -> Result<Row, MappingError> {
    let columns: HashMap<String, BoltType> = row
        .to()
        .map_err(|e| MappingError::invalid(format!("Undecodable record: {}", e)))?;

    let mut out = Row::new();
    for (column, value) in columns {
        out.insert(column, from_bolt(value)?);
    }
    Ok(out)
}

fn from_bolt(value: BoltType) -> Result<Value, MappingError> {
    Ok(match value {
        BoltType::Null(_) => Value::Null,
        BoltType::Boolean(b) => Value::Bool(b.value),
        BoltType::Integer(i) => Value::Integer(i.value),
        BoltType::Float(f) => Value::Float(f.value),
        BoltType::String(s) => Value::String(s.value),
        BoltType::List(list) => Value::List(
            list.value
                .into_iter()
                .map(from_bolt)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        BoltType::Map(map) => Value::Map(
            map.value
                .into_iter()
                .map(|(key, value)| Ok((key.value, from_bolt(value)?)))
                .collect::<Result<BTreeMap<_, _>, MappingError>>()?,
        ),
        other => {
            return Err(MappingError::invalid(format!(
                "Unsupported Bolt value: {:?}",
                other
            )))
        }
    })
}
