//! Service Layer Error Types
//!
//! Errors for the composite page flows. Single-statement operations return
//! [`StoreError`] directly; the flows wrap it and add the request-level
//! failures they can detect before touching the store.

use crate::db::{StoreError, StoreErrorKind};
use thiserror::Error;

/// Movie service operation errors
#[derive(Error, Debug)]
pub enum MovieServiceError {
    /// Store operation failed
    #[error("Store operation failed: {0}")]
    Store(#[from] StoreError),

    /// Operation needs a selected viewer but the request has none
    #[error("No viewer selected")]
    NoViewerSelected,

    /// Request field could not be used
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl MovieServiceError {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Kind of the underlying store failure, if this is one
    pub fn store_kind(&self) -> Option<StoreErrorKind> {
        match self {
            Self::Store(err) => Some(err.kind()),
            _ => None,
        }
    }
}
