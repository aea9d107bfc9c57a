//! Movie Data Structures
//!
//! Movies are keyed by title. `rating` is derived data: the mean of all
//! incoming RATED edges, rewritten by an explicit recompute, and `None` until
//! the first recompute.

use crate::db::{MappingError, Row, Value};
use serde::{Deserialize, Serialize};

/// A movie as listed in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub title: String,
    pub rating: Option<f64>,
}

impl Movie {
    /// Map a `title`, `rating` row
    pub fn from_row(row: &Row) -> Result<Self, MappingError> {
        Ok(Self {
            title: row.get("title")?,
            rating: row.get("rating")?,
        })
    }
}

/// A movie together with the viewing user's own rating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatedMovie {
    pub title: String,
    pub rating: Option<f64>,
    /// `None` if the stored edge rating is not numeric
    pub user_rating: Option<i64>,
}

impl RatedMovie {
    pub fn from_row(row: &Row) -> Result<Self, MappingError> {
        Ok(Self {
            title: row.get("title")?,
            rating: row.get("rating")?,
            user_rating: row.get("userRating")?,
        })
    }
}

/// Rated and unrated movies for one user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMovies {
    pub rated_movies: Vec<RatedMovie>,
    pub unrated_movies: Vec<Movie>,
}

impl UserMovies {
    /// Map the single row of the dual-fetch statement
    ///
    /// Each collected list is paired with a count. A count of zero means the
    /// list is empty, whatever placeholder element `collect()` left in it.
    pub fn from_row(row: &Row) -> Result<Self, MappingError> {
        Ok(Self {
            rated_movies: collected(row, "ratedCount", "ratedMovies", RatedMovie::from_row)?,
            unrated_movies: collected(row, "unratedCount", "unratedMovies", Movie::from_row)?,
        })
    }
}

fn collected<T>(
    row: &Row,
    count_column: &str,
    list_column: &str,
    mapper: fn(&Row) -> Result<T, MappingError>,
) -> Result<Vec<T>, MappingError> {
    let count: i64 = row.get(count_column)?;
    if count == 0 {
        return Ok(Vec::new());
    }

    let items: Vec<Value> = row.get(list_column)?;
    if items.len() as i64 != count {
        return Err(MappingError::invalid(format!(
            "{} holds {} entries but {} is {}",
            list_column,
            items.len(),
            count_column,
            count
        )));
    }
    items
        .iter()
        .map(|item| Row::try_from(item).and_then(|entry| mapper(&entry)))
        .collect()
}

/// Result of upserting a RATED edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum RatingOutcome {
    /// Edge written; `edges` counts the users matched by name
    Applied {
        title: String,
        edges: usize,
    },

    /// User or movie does not exist, nothing was written
    NoMatch,
}

impl RatingOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Result of recomputing a movie's average rating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum RecomputeOutcome {
    Updated {
        title: String,
        rating: Option<f64>,
    },

    /// Movie missing or without ratings; its stored rating is unchanged
    NotFound,
}
