//! Data Models
//!
//! This module contains the data structures exchanged with callers:
//!
//! - `Movie`, `RatedMovie`, `UserMovies` - catalog views
//! - `User`, `AssignedUserId` - user nodes and creation results
//! - `RatingOutcome`, `RecomputeOutcome` - write results that are not errors
//! - `ViewerContext`, `PageData` - per-request state and page payload
//!
//! Each row-backed model has a `from_row` mapper used with
//! [`GraphUnitOfWork`](crate::db::GraphUnitOfWork).

mod movie;
mod user;

pub use movie::{Movie, RatedMovie, RatingOutcome, RecomputeOutcome, UserMovies};
pub use user::{AssignedUserId, PageData, User, ViewerContext};
