//! MemoryGraph - In-Process GraphClient
//!
//! A small in-memory movie graph that answers the statements in
//! [`cypher`](crate::db::cypher) with the row shapes Neo4j produces, including
//! the all-null element `collect()` yields for an empty OPTIONAL MATCH and the
//! `null`-first ordering of `ORDER BY ... DESC`.
//!
//! Besides serving as an offline backend it instruments the session lifecycle:
//!
//! - [`session_stats`](MemoryGraph::session_stats) counts opened and released
//!   sessions, including sessions released by `Drop` after cancellation
//! - [`inject_fault`](MemoryGraph::inject_fault) makes the next open, run or
//!   close fail once, and
//!   [`inject_statement_fault`](MemoryGraph::inject_statement_fault) the next
//!   run of one particular statement
//! - [`discard_next_result`](MemoryGraph::discard_next_result) applies the
//!   next run of a statement but answers it with no rows
//! - [`with_latency`](MemoryGraph::with_latency) delays every statement so
//!   timeouts can be exercised
//!
//! Statements it does not recognize fail with a Query error, as would a
//! statement referencing a placeholder with no bound parameter.

use crate::db::cypher;
use crate::db::error::StoreError;
use crate::db::graph_client::{GraphClient, GraphSession};
use crate::db::value::{Params, RecordSet, Row, Statement, Value};
use async_trait::async_trait;
use std::cmp::Ordering as CmpOrdering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Which session lifecycle step an injected fault hits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    Open,
    Run,
    Close,
}

/// Session lifecycle counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub opened: usize,
    pub closed: usize,
}

impl SessionStats {
    /// Sessions opened but not yet released
    pub fn in_flight(&self) -> usize {
        self.opened.saturating_sub(self.closed)
    }
}

#[derive(Debug, Clone)]
struct MovieNode {
    title: String,
    rating: Option<f64>,
}

#[derive(Debug, Clone)]
struct UserNode {
    user_id: Value,
    name: Value,
    age: Value,
}

#[derive(Debug, Clone)]
struct RatedEdge {
    user: usize,
    movie: usize,
    rating: Value,
}

#[derive(Debug, Default)]
struct GraphState {
    movies: Vec<MovieNode>,
    users: Vec<UserNode>,
    rated: Vec<RatedEdge>,
}

struct Inner {
    state: RwLock<GraphState>,
    faults: Mutex<Vec<FaultKind>>,
    statement_faults: Mutex<Vec<String>>,
    discarded_results: Mutex<Vec<String>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
    shut_down: AtomicBool,
    latency: Option<Duration>,
}

impl Inner {
    fn new(latency: Option<Duration>) -> Self {
        Self {
            state: RwLock::new(GraphState::default()),
            faults: Mutex::new(Vec::new()),
            statement_faults: Mutex::new(Vec::new()),
            discarded_results: Mutex::new(Vec::new()),
            opened: AtomicUsize::new(0),
            closed: AtomicUsize::new(0),
            shut_down: AtomicBool::new(false),
            latency,
        }
    }

    async fn take_fault(&self, kind: FaultKind) -> bool {
        let mut faults = self.faults.lock().await;
        match faults.iter().position(|f| *f == kind) {
            Some(index) => {
                faults.remove(index);
                true
            }
            None => false,
        }
    }

    async fn take_statement_fault(&self, text: &str) -> bool {
        take_text(&self.statement_faults, text).await
    }

    async fn take_discarded_result(&self, text: &str) -> bool {
        take_text(&self.discarded_results, text).await
    }
}

async fn take_text(pending: &Mutex<Vec<String>>, text: &str) -> bool {
    let mut pending = pending.lock().await;
    match pending.iter().position(|t| t == text) {
        Some(index) => {
            pending.remove(index);
            true
        }
        None => false,
    }
}

/// In-memory movie graph implementing [`GraphClient`]
///
/// Cloning shares the same graph and counters.
#[derive(Clone)]
pub struct MemoryGraph {
    inner: Arc<Inner>,
}

impl Default for MemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner::new(None)),
        }
    }

    /// Graph whose sessions sleep for `latency` before answering each statement
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            inner: Arc::new(Inner::new(Some(latency))),
        }
    }

    /// Insert a movie, or overwrite the rating of an existing title
    pub async fn insert_movie(&self, title: &str, rating: Option<f64>) {
        let mut state = self.inner.state.write().await;
        match state.movies.iter().position(|m| m.title == title) {
            Some(index) => state.movies[index].rating = rating,
            None => state.movies.push(MovieNode {
                title: title.to_string(),
                rating,
            }),
        }
    }

    /// Insert a user node directly, bypassing sessions
    pub async fn insert_user(&self, user_id: &str, name: &str, age: i64) {
        let mut state = self.inner.state.write().await;
        state.users.push(UserNode {
            user_id: Value::from(user_id),
            name: Value::from(name),
            age: Value::from(age),
        });
    }

    /// Make the next matching lifecycle step fail once
    pub async fn inject_fault(&self, kind: FaultKind) {
        self.inner.faults.lock().await.push(kind);
    }

    /// Make the next run of the statement with exactly this text fail once
    pub async fn inject_statement_fault(&self, text: &str) {
        self.inner
            .statement_faults
            .lock()
            .await
            .push(text.to_string());
    }

    /// Apply the next run of this statement but answer it with no rows
    pub async fn discard_next_result(&self, text: &str) {
        self.inner
            .discarded_results
            .lock()
            .await
            .push(text.to_string());
    }

    pub fn session_stats(&self) -> SessionStats {
        SessionStats {
            opened: self.inner.opened.load(Ordering::SeqCst),
            closed: self.inner.closed.load(Ordering::SeqCst),
        }
    }

    /// `None` if the title is unknown, `Some(None)` if it has no rating yet
    pub async fn movie_rating(&self, title: &str) -> Option<Option<f64>> {
        let state = self.inner.state.read().await;
        state
            .movies
            .iter()
            .find(|m| m.title == title)
            .map(|m| m.rating)
    }

    pub async fn movie_count(&self) -> usize {
        self.inner.state.read().await.movies.len()
    }

    pub async fn user_count(&self) -> usize {
        self.inner.state.read().await.users.len()
    }

    pub async fn rated_edge_count(&self) -> usize {
        self.inner.state.read().await.rated.len()
    }

    /// Stored rating on the edge from the first user named `name` to `title`
    pub async fn edge_rating(&self, name: &str, title: &str) -> Option<Value> {
        let state = self.inner.state.read().await;
        let user = state
            .users
            .iter()
            .position(|u| u.name.as_str() == Some(name))?;
        let movie = state.movies.iter().position(|m| m.title == title)?;
        state
            .rated
            .iter()
            .find(|e| e.user == user && e.movie == movie)
            .map(|e| e.rating.clone())
    }
}

#[async_trait]
impl GraphClient for MemoryGraph {
    async fn open_session(&self) -> Result<Box<dyn GraphSession>, StoreError> {
        if self.inner.shut_down.load(Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        if self.inner.take_fault(FaultKind::Open).await {
            return Err(StoreError::connection("Injected fault: store unreachable"));
        }

        self.inner.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySession {
            id: Uuid::new_v4().to_string(),
            inner: Arc::clone(&self.inner),
            released: false,
        }))
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.inner.shut_down.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Session over a [`MemoryGraph`]
pub struct MemorySession {
    id: String,
    inner: Arc<Inner>,
    released: bool,
}

impl MemorySession {
    fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;
        self.inner.closed.fetch_add(1, Ordering::SeqCst);
        true
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.release();
    }
}

#[async_trait]
impl GraphSession for MemorySession {
    async fn run(&mut self, statement: &Statement) -> Result<RecordSet, StoreError> {
        if self.released {
            return Err(StoreError::query("Session already closed"));
        }
        if let Some(latency) = self.inner.latency {
            tokio::time::sleep(latency).await;
        }
        if self.inner.take_fault(FaultKind::Run).await
            || self.inner.take_statement_fault(statement.text()).await
        {
            return Err(StoreError::query_caused_by(
                statement.text().to_string(),
                "Injected fault: statement failed",
            ));
        }

        let missing = statement.missing_params();
        if !missing.is_empty() {
            return Err(StoreError::query(format!(
                "Expected parameter(s): {}",
                missing.join(", ")
            )));
        }

        let params = statement.params();
        let records = match statement.text() {
            cypher::LIST_MOVIES => self.list_movies().await,
            cypher::LIST_USERS => self.list_users().await,
            cypher::CREATE_USER => self.create_user(params).await,
            cypher::USER_MOVIES => self.user_movies(params).await,
            cypher::RATE_MOVIE => self.rate_movie(params).await,
            cypher::RECOMPUTE_RATING => self.recompute_rating(params).await,
            other => {
                return Err(StoreError::query(format!(
                    "Unsupported statement: {}",
                    other.lines().next().unwrap_or_default()
                )))
            }
        };

        if self.inner.take_discarded_result(statement.text()).await {
            return Ok(RecordSet::empty());
        }
        Ok(records)
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        if !self.release() {
            return Ok(());
        }
        if self.inner.take_fault(FaultKind::Close).await {
            return Err(StoreError::connection(
                "Injected fault: session release failed",
            ));
        }
        Ok(())
    }

    fn id(&self) -> &str {
        &self.id
    }
}

fn param<'a>(params: &'a Params, name: &str) -> &'a Value {
    params.get(name).unwrap_or(&Value::Null)
}

/// Cypher `toInteger`
fn to_integer(value: &Value) -> Value {
    match value {
        Value::Integer(i) => Value::Integer(*i),
        Value::Float(f) => Value::Integer(f.trunc() as i64),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Integer)
            .or_else(|_| {
                s.trim()
                    .parse::<f64>()
                    .map(|f| Value::Integer(f.trunc() as i64))
            })
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

/// Cypher `toFloat`
fn to_float(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Cypher ordering for `ORDER BY x DESC`: null first, then largest first
fn cmp_rating_desc(a: Option<f64>, b: Option<f64>) -> CmpOrdering {
    match (a, b) {
        (None, None) => CmpOrdering::Equal,
        (None, Some(_)) => CmpOrdering::Less,
        (Some(_), None) => CmpOrdering::Greater,
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(CmpOrdering::Equal),
    }
}

fn map_value(entries: Vec<(&str, Value)>) -> Value {
    Value::Map(
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect::<BTreeMap<_, _>>(),
    )
}

impl MemorySession {
    async fn list_movies(&self) -> RecordSet {
        let state = self.inner.state.read().await;
        let mut movies: Vec<&MovieNode> = state.movies.iter().collect();
        movies.sort_by(|a, b| {
            cmp_rating_desc(a.rating, b.rating)
                .then_with(|| a.title.cmp(&b.title))
        });

        movies
            .into_iter()
            .map(|m| {
                Row::new()
                    .with("title", m.title.as_str())
                    .with("rating", m.rating)
            })
            .collect()
    }

    async fn list_users(&self) -> RecordSet {
        let state = self.inner.state.read().await;
        state
            .users
            .iter()
            .map(|u| {
                Row::new()
                    .with("userId", u.user_id.clone())
                    .with("name", u.name.clone())
                    .with("age", u.age.clone())
            })
            .collect()
    }

    async fn create_user(&self, params: &Params) -> RecordSet {
        let mut state = self.inner.state.write().await;
        let user = UserNode {
            user_id: param(params, "id").clone(),
            name: param(params, "name").clone(),
            age: param(params, "age").clone(),
        };
        let row = Row::new().with("userId", user.user_id.clone());
        state.users.push(user);
        RecordSet::new(vec![row])
    }

    async fn user_movies(&self, params: &Params) -> RecordSet {
        let state = self.inner.state.read().await;
        let name = param(params, "name");
        let Some(user) = state.users.iter().position(|u| &u.name == name) else {
            return RecordSet::empty();
        };

        let rated: Vec<Value> = state
            .rated
            .iter()
            .filter(|e| e.user == user)
            .map(|e| {
                let movie = &state.movies[e.movie];
                map_value(vec![
                    ("title", Value::from(movie.title.as_str())),
                    ("rating", Value::from(movie.rating)),
                    ("userRating", to_integer(&e.rating)),
                ])
            })
            .collect();

        let unrated: Vec<Value> = state
            .movies
            .iter()
            .enumerate()
            .filter(|(index, _)| {
                !state
                    .rated
                    .iter()
                    .any(|e| e.user == user && e.movie == *index)
            })
            .map(|(_, movie)| {
                map_value(vec![
                    ("title", Value::from(movie.title.as_str())),
                    ("rating", Value::from(movie.rating)),
                ])
            })
            .collect();

        let rated_count = rated.len() as i64;
        let unrated_count = unrated.len() as i64;
        let rated = if rated.is_empty() {
            vec![map_value(vec![
                ("title", Value::Null),
                ("rating", Value::Null),
                ("userRating", Value::Null),
            ])]
        } else {
            rated
        };
        let unrated = if unrated.is_empty() {
            vec![map_value(vec![
                ("title", Value::Null),
                ("rating", Value::Null),
            ])]
        } else {
            unrated
        };

        RecordSet::new(vec![Row::new()
            .with("ratedCount", rated_count)
            .with("ratedMovies", Value::List(rated))
            .with("unratedCount", unrated_count)
            .with("unratedMovies", Value::List(unrated))])
    }

    async fn rate_movie(&self, params: &Params) -> RecordSet {
        let mut guard = self.inner.state.write().await;
        let state = &mut *guard;
        let name = param(params, "name");
        let title = param(params, "movieTitle");
        let rating = param(params, "rating").clone();

        let Some(movie) = state
            .movies
            .iter()
            .position(|m| title.as_str() == Some(m.title.as_str()))
        else {
            return RecordSet::empty();
        };
        let users: Vec<usize> = state
            .users
            .iter()
            .enumerate()
            .filter(|(_, u)| &u.name == name)
            .map(|(index, _)| index)
            .collect();

        let mut rows = Vec::with_capacity(users.len());
        for user in users {
            let existing = state
                .rated
                .iter()
                .position(|e| e.user == user && e.movie == movie);
            match existing {
                Some(index) => state.rated[index].rating = rating.clone(),
                None => state.rated.push(RatedEdge {
                    user,
                    movie,
                    rating: rating.clone(),
                }),
            }
            rows.push(
                Row::new()
                    .with("title", state.movies[movie].title.as_str())
                    .with("rating", rating.clone()),
            );
        }
        RecordSet::new(rows)
    }

    async fn recompute_rating(&self, params: &Params) -> RecordSet {
        let mut guard = self.inner.state.write().await;
        let state = &mut *guard;
        let title = param(params, "title");
        let Some(movie) = state
            .movies
            .iter()
            .position(|m| title.as_str() == Some(m.title.as_str()))
        else {
            return RecordSet::empty();
        };

        let edges: Vec<&RatedEdge> = state.rated.iter().filter(|e| e.movie == movie).collect();
        if edges.is_empty() {
            return RecordSet::empty();
        }
        let values: Vec<f64> = edges.iter().filter_map(|e| to_float(&e.rating)).collect();
        let average = if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        };

        let node = &mut state.movies[movie];
        node.rating = average;
        RecordSet::new(vec![Row::new()
            .with("title", node.title.as_str())
            .with("updatedRating", average)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn run(graph: &MemoryGraph, statement: Statement) -> Result<RecordSet, StoreError> {
        let mut session = graph.open_session().await?;
        let result = session.run(&statement).await;
        session.close().await?;
        result
    }

    #[tokio::test]
    async fn test_list_movies_orders_null_first_then_desc() {
        let graph = MemoryGraph::new();
        graph.insert_movie("Heat", Some(3.0)).await;
        graph.insert_movie("Alien", None).await;
        graph.insert_movie("Up", Some(4.5)).await;
        graph.insert_movie("Big", Some(3.0)).await;

        let records = run(&graph, Statement::new(cypher::LIST_MOVIES))
            .await
            .unwrap();
        let titles: Vec<String> = records
            .rows()
            .iter()
            .map(|r| r.get::<String>("title").unwrap())
            .collect();

        assert_eq!(titles, vec!["Alien", "Up", "Big", "Heat"]);
    }

    #[tokio::test]
    async fn test_missing_parameter_is_query_error() {
        let graph = MemoryGraph::new();
        let err = run(&graph, Statement::new(cypher::RECOMPUTE_RATING))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Query { .. }));
        assert!(err.to_string().contains("Query failed"));
    }

    #[tokio::test]
    async fn test_empty_optional_branch_yields_all_null_element() {
        let graph = MemoryGraph::new();
        graph.insert_movie("Heat", None).await;
        graph.insert_user("u1", "ana", 30).await;

        let records = run(
            &graph,
            Statement::new(cypher::USER_MOVIES).param("name", "ana"),
        )
        .await
        .unwrap();

        let row = records.first().unwrap();
        assert_eq!(row.get::<i64>("ratedCount").unwrap(), 0);
        let rated = row.get::<Vec<Value>>("ratedMovies").unwrap();
        assert_eq!(rated.len(), 1);
        assert!(Row::try_from(&rated[0]).unwrap().is_all_null());
    }

    #[tokio::test]
    async fn test_string_ratings_are_coerced() {
        let graph = MemoryGraph::new();
        graph.insert_movie("Heat", None).await;
        graph.insert_user("u1", "ana", 30).await;

        run(
            &graph,
            Statement::new(cypher::RATE_MOVIE)
                .param("name", "ana")
                .param("movieTitle", "Heat")
                .param("rating", "4"),
        )
        .await
        .unwrap();
        let records = run(
            &graph,
            Statement::new(cypher::RECOMPUTE_RATING).param("title", "Heat"),
        )
        .await
        .unwrap();

        let updated: f64 = records.first().unwrap().get("updatedRating").unwrap();
        assert_eq!(updated, 4.0);
    }

    #[tokio::test]
    async fn test_closed_client_refuses_sessions() {
        let graph = MemoryGraph::new();
        graph.close().await.unwrap();

        let err = graph.open_session().await.err().unwrap();
        assert!(matches!(err, StoreError::Closed));
        assert_eq!(graph.session_stats().opened, 0);
    }

    #[tokio::test]
    async fn test_dropped_session_is_released_once() {
        let graph = MemoryGraph::new();
        let mut session = graph.open_session().await.unwrap();
        session.close().await.unwrap();
        session.close().await.unwrap();
        drop(session);

        assert_eq!(
            graph.session_stats(),
            SessionStats {
                opened: 1,
                closed: 1
            }
        );

        let session = graph.open_session().await.unwrap();
        drop(session);
        assert_eq!(graph.session_stats().in_flight(), 0);
    }
}
