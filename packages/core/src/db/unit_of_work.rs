//! GraphUnitOfWork - Request-Scoped Session Lifecycle
//!
//! Every data-access operation follows the same shape: acquire a session, run
//! one parameterized statement, map the returned rows, release the session.
//! [`GraphUnitOfWork::execute`] owns that shape so each operation only declares
//! its statement and row mapper.
//!
//! # Guarantees
//!
//! - Exactly one `open_session` and one `close` per call
//! - The session is closed before any error reaches the caller
//! - Rows are returned in store order, never re-sorted
//! - Nothing is retried; retry policy belongs to the caller
//!
//! Two calls are two independent units of work. Sequencing them (for example a
//! rating write followed by an aggregate recompute) is never atomic.

use crate::db::error::{MappingError, StoreError};
use crate::db::graph_client::{GraphClient, GraphSession};
use crate::db::value::{RecordSet, Row, Statement};
use std::sync::Arc;
use tracing::{debug, warn, Instrument};

/// Acquire-run-map-release primitive over a shared [`GraphClient`]
#[derive(Clone)]
pub struct GraphUnitOfWork {
    client: Arc<dyn GraphClient>,
}

impl GraphUnitOfWork {
    pub fn new(client: Arc<dyn GraphClient>) -> Self {
        Self { client }
    }

    /// The injected client, e.g. for closing it at shutdown
    pub fn client(&self) -> &Arc<dyn GraphClient> {
        &self.client
    }

    /// Run `statement` in a fresh session and map every returned row
    ///
    /// # Errors
    ///
    /// - Connection-kind error if no session can be acquired
    /// - [`StoreError::Query`] if the store fails the statement
    /// - [`StoreError::Mapping`] if `mapper` rejects a row
    ///
    /// When both the run and the close fail, the run's error is returned and
    /// the close failure is logged.
    pub async fn execute<R, F>(
        &self,
        statement: &Statement,
        mapper: F,
    ) -> Result<Vec<R>, StoreError>
    where
        F: Fn(&Row) -> Result<R, MappingError>,
    {
        let mut session = self.client.open_session().await?;
        let span = tracing::debug_span!("unit_of_work", session = %session.id());

        async move {
            let outcome = run_and_map(session.as_mut(), statement, &mapper).await;
            let released = session.close().await;

            match (outcome, released) {
                (Ok(results), Ok(())) => {
                    debug!(rows = results.len(), "Unit of work completed");
                    Ok(results)
                }
                (Ok(_), Err(close_err)) => Err(close_err),
                (Err(err), Ok(())) => {
                    debug!(error = %err, "Unit of work failed");
                    Err(err)
                }
                (Err(err), Err(close_err)) => {
                    warn!(error = %close_err, "Failed to close session after error");
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Like [`execute`](Self::execute), keeping only the first mapped row
    pub async fn execute_optional<R, F>(
        &self,
        statement: &Statement,
        mapper: F,
    ) -> Result<Option<R>, StoreError>
    where
        F: Fn(&Row) -> Result<R, MappingError>,
    {
        Ok(self.execute(statement, mapper).await?.into_iter().next())
    }

    /// Run a statement for its side effects, returning the number of rows
    pub async fn run(&self, statement: &Statement) -> Result<usize, StoreError> {
        Ok(self.execute(statement, |_| Ok(())).await?.len())
    }
}

async fn run_and_map<R, F>(
    session: &mut dyn GraphSession,
    statement: &Statement,
    mapper: &F,
) -> Result<Vec<R>, StoreError>
where
    F: Fn(&Row) -> Result<R, MappingError>,
{
    let records: RecordSet = session.run(statement).await?;
    let mut results = Vec::with_capacity(records.len());
    for row in records.rows() {
        results.push(mapper(row)?);
    }
    Ok(results)
}
