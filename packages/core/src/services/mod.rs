//! Business Services
//!
//! This module contains the movie-rating business logic:
//!
//! - `MovieService` - catalog, user and rating operations plus the page flows
//! - `UserIdGenerator` - monotonic `u<millis>` user identifiers
//!
//! Services declare statements and row mappers; session handling lives in
//! [`GraphUnitOfWork`](crate::db::GraphUnitOfWork).

pub mod error;
pub mod movie_service;
pub mod user_ids;

pub use error::MovieServiceError;
pub use movie_service::{MovieService, SubmittedRating};
pub use user_ids::UserIdGenerator;
