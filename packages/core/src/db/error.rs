//! Store Error Types
//!
//! This module defines error types for graph store operations. Every failure
//! surfaced by the unit of work falls into one of three kinds:
//!
//! - **Connection**: no usable session could be acquired (configuration,
//!   network, or a client that has already been closed)
//! - **Query**: the store rejected or failed a submitted statement
//! - **Mapping**: a returned row did not have the shape the mapper expected
//!
//! The core only classifies failures. Translating them into user-facing
//! messages is the caller's job.

use thiserror::Error;

/// Boxed native error from the underlying store client
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Classification of a [`StoreError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    Connection,
    Query,
    Mapping,
}

/// Row-shape errors raised while mapping records into typed results
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MappingError {
    /// Column is not present in the row
    #[error("Missing column: {column}")]
    MissingColumn { column: String },

    /// Column is present but holds a value of the wrong type
    #[error("Column {column} has type {found}, expected {expected}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Row is well-typed but semantically unusable
    #[error("Invalid row: {0}")]
    Invalid(String),
}

impl MappingError {
    /// Create a missing column error
    pub fn missing_column(column: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(
        column: impl Into<String>,
        expected: &'static str,
        found: &'static str,
    ) -> Self {
        Self::TypeMismatch {
            column: column.into(),
            expected,
            found,
        }
    }

    /// Create an invalid row error
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

/// Graph store operation errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Required connection setting is missing or malformed
    #[error("Invalid store configuration: {0}")]
    Configuration(String),

    /// Failed to acquire or release a session
    #[error("Store connection failed: {context}")]
    Connection {
        context: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The client was closed before the operation started
    #[error("Store client is closed")]
    Closed,

    /// Store rejected or failed the statement
    #[error("Query failed: {context}")]
    Query {
        context: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Returned row did not match the mapper's expectations
    #[error("Row mapping failed: {0}")]
    Mapping(#[from] MappingError),
}

impl StoreError {
    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a connection error without an underlying cause
    pub fn connection(context: impl Into<String>) -> Self {
        Self::Connection {
            context: context.into(),
            source: None,
        }
    }

    /// Create a connection error wrapping the client's native error
    pub fn connection_caused_by(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Connection {
            context: context.into(),
            source: Some(source.into()),
        }
    }

    /// Create a query error without an underlying cause
    pub fn query(context: impl Into<String>) -> Self {
        Self::Query {
            context: context.into(),
            source: None,
        }
    }

    /// Create a query error wrapping the client's native error
    pub fn query_caused_by(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Query {
            context: context.into(),
            source: Some(source.into()),
        }
    }

    /// Classify this error into one of the three error kinds
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            Self::Configuration(_) | Self::Connection { .. } | Self::Closed => {
                StoreErrorKind::Connection
            }
            Self::Query { .. } => StoreErrorKind::Query,
            Self::Mapping(_) => StoreErrorKind::Mapping,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            StoreError::configuration("NEO4J_URI").kind(),
            StoreErrorKind::Connection
        );
        assert_eq!(StoreError::Closed.kind(), StoreErrorKind::Connection);
        assert_eq!(StoreError::query("bad").kind(), StoreErrorKind::Query);
        assert_eq!(
            StoreError::from(MappingError::missing_column("title")).kind(),
            StoreErrorKind::Mapping
        );
    }

    #[test]
    fn test_query_error_keeps_native_source() {
        let native = std::io::Error::new(std::io::ErrorKind::Other, "syntax error near RETURN");
        let err = StoreError::query_caused_by("MATCH (m:Movie) RETURN", native);

        let source = err.source().expect("source should be preserved");
        assert_eq!(source.to_string(), "syntax error near RETURN");
        assert_eq!(err.to_string(), "Query failed: MATCH (m:Movie) RETURN");
    }
}
