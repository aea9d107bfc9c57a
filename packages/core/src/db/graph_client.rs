//! GraphClient Trait - Store Client Abstraction
//!
//! The capability the core consumes from a graph store client:
//!
//! - [`GraphClient::open_session`] acquires a query execution context
//! - [`GraphSession::run`] submits one parameterized statement
//! - [`GraphSession::close`] releases the context
//!
//! A client is a process-wide resource, created once at startup and closed once
//! at shutdown. It must be safe to open independent sessions from concurrent
//! tasks. A session is exclusively owned by the single operation that opened it.
//!
//! Backends: [`Neo4jClient`](crate::db::Neo4jClient) for production and
//! [`MemoryGraph`](crate::db::MemoryGraph) for tests and offline runs.

use crate::db::error::StoreError;
use crate::db::value::{RecordSet, Statement};
use async_trait::async_trait;

/// Shared handle to a graph store
#[async_trait]
pub trait GraphClient: Send + Sync {
    /// Acquire a new execution context
    ///
    /// # Errors
    ///
    /// Returns a Connection-kind error if the store is unreachable, the
    /// credentials are rejected, or the client has been closed.
    async fn open_session(&self) -> Result<Box<dyn GraphSession>, StoreError>;

    /// Tear down the client; later `open_session` calls fail with
    /// [`StoreError::Closed`]
    async fn close(&self) -> Result<(), StoreError>;
}

/// One logical conversation with the store
///
/// Dropping a session without calling [`close`](GraphSession::close) must still
/// release its underlying resources; this is what happens when the future of
/// an in-flight operation is cancelled.
#[async_trait]
pub trait GraphSession: Send {
    /// Execute a statement and return all rows in store order
    async fn run(&mut self, statement: &Statement) -> Result<RecordSet, StoreError>;

    /// Release the session
    ///
    /// Called exactly once by the unit of work. Implementations treat a second
    /// call as a no-op.
    async fn close(&mut self) -> Result<(), StoreError>;

    /// Identifier used for log correlation
    fn id(&self) -> &str;
}
