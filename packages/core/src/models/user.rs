//! User Data Structures
//!
//! Users are looked up by `name`, which the store does not require to be
//! unique. Two users created with the same name are two distinct nodes with
//! distinct `user_id`s, and name-keyed operations touch all of them.

use crate::db::{MappingError, Row};
use crate::models::movie::{Movie, RatedMovie};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A user node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Generated identifier; absent on nodes created outside this service
    pub user_id: Option<String>,
    pub name: String,
    pub age: Option<i64>,
}

impl User {
    /// Map a `userId`, `name`, `age` row
    pub fn from_row(row: &Row) -> Result<Self, MappingError> {
        Ok(Self {
            user_id: row.get("userId")?,
            name: row.get("name")?,
            age: row.get("age")?,
        })
    }
}

/// Identifier reported back after creating a user
///
/// `Unknown` means the store acknowledged the write without returning a row.
/// It is not a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssignedUserId {
    Known(String),
    Unknown,
}

impl AssignedUserId {
    pub fn as_known(&self) -> Option<&str> {
        match self {
            Self::Known(id) => Some(id),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for AssignedUserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(id) => f.write_str(id),
            Self::Unknown => f.write_str("Unknown ID"),
        }
    }
}

/// Per-request record of which user is viewing the page
///
/// Owned by the caller (cookie, session store, request extension) and passed
/// into every operation that depends on it. Never shared between requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerContext {
    pub username: Option<String>,
}

impl ViewerContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_user(name: impl Into<String>) -> Self {
        Self {
            username: Some(name.into()),
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }
}

/// Everything the movie page shows
///
/// The movie lists are `None` when no viewer is selected, and also when the
/// selected viewer does not exist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
    pub users: Vec<User>,
    pub rated_movies: Option<Vec<RatedMovie>>,
    pub unrated_movies: Option<Vec<Movie>>,
}
