//! Movie Service - Catalog, Users and Ratings
//!
//! Every operation here is one statement from [`cypher`] plus a row mapper,
//! executed through [`GraphUnitOfWork`]:
//!
//! - `list_movies` / `list_users` - plain reads; an empty store is an empty `Vec`
//! - `fetch_user_movies` - rated and unrated movies in one round trip
//! - `create_user` - insert with a generated `u<millis>` identifier
//! - `rate_movie` - MERGE of the RATED edge; missing endpoints are a no-op
//! - `recompute_movie_rating` - rewrite the movie's mean rating
//!
//! On top of those sit the page flows (`page_data`, `submit_rating`) which take
//! the viewing user as an explicit [`ViewerContext`] instead of keeping it in
//! shared state.
//!
//! # Consistency
//!
//! `submit_rating` runs the rating write and the recompute as two units of
//! work. They are not atomic: if the recompute fails the edge stays written,
//! and two concurrent submissions for one movie may leave a stale average
//! until the next recompute.

use crate::db::cypher;
use crate::db::{GraphClient, GraphUnitOfWork, Row, Statement, StoreError};
use crate::models::{
    AssignedUserId, Movie, PageData, RatingOutcome, RecomputeOutcome, User, UserMovies,
    ViewerContext,
};
use crate::services::error::MovieServiceError;
use crate::services::user_ids::UserIdGenerator;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Outcome of the rate-then-recompute flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedRating {
    pub rating: RatingOutcome,
    /// `None` when the recompute was skipped because nothing was rated
    pub recompute: Option<RecomputeOutcome>,
}

/// Movie-rating operations over a graph store
pub struct MovieService {
    uow: GraphUnitOfWork,
    user_ids: UserIdGenerator,
}

impl MovieService {
    pub fn new(client: Arc<dyn GraphClient>) -> Self {
        Self::with_unit_of_work(GraphUnitOfWork::new(client))
    }

    pub fn with_unit_of_work(uow: GraphUnitOfWork) -> Self {
        Self {
            uow,
            user_ids: UserIdGenerator::new(),
        }
    }

    pub fn unit_of_work(&self) -> &GraphUnitOfWork {
        &self.uow
    }

    /// Close the underlying client at process shutdown
    pub async fn shutdown(&self) -> Result<(), StoreError> {
        self.uow.client().close().await
    }

    /// All movies, best rated first (unrated movies lead, per Cypher null ordering)
    #[instrument(skip(self))]
    pub async fn list_movies(&self) -> Result<Vec<Movie>, StoreError> {
        self.uow
            .execute(&Statement::new(cypher::LIST_MOVIES), Movie::from_row)
            .await
    }

    /// All users in store order
    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        self.uow
            .execute(&Statement::new(cypher::LIST_USERS), User::from_row)
            .await
    }

    /// Create a user with an identifier derived from the current time
    pub async fn create_user(&self, name: &str, age: i64) -> Result<AssignedUserId, StoreError> {
        self.create_user_at(name, age, Utc::now()).await
    }

    /// Create a user with an identifier derived from `now`
    ///
    /// Names are not unique: creating the same name twice yields two nodes
    /// with distinct identifiers.
    #[instrument(skip(self, now))]
    pub async fn create_user_at(
        &self,
        name: &str,
        age: i64,
        now: DateTime<Utc>,
    ) -> Result<AssignedUserId, StoreError> {
        let id = self.user_ids.next_id_at(now);
        let statement = Statement::new(cypher::CREATE_USER)
            .param("id", id.as_str())
            .param("name", name)
            .param("age", age);

        let returned = self
            .uow
            .execute_optional(&statement, |row: &Row| row.get::<Option<String>>("userId"))
            .await?;

        Ok(match returned.flatten() {
            Some(user_id) => {
                debug!(%user_id, "Created user");
                AssignedUserId::Known(user_id)
            }
            None => {
                debug!(attempted_id = %id, "Store returned no id for created user");
                AssignedUserId::Unknown
            }
        })
    }

    /// Rated and unrated movies of the user called `name`
    ///
    /// Returns `None` if no such user exists. A user without ratings gets an
    /// empty `rated_movies` and every movie in `unrated_movies`.
    #[instrument(skip(self))]
    pub async fn fetch_user_movies(&self, name: &str) -> Result<Option<UserMovies>, StoreError> {
        let statement = Statement::new(cypher::USER_MOVIES).param("name", name);
        self.uow
            .execute_optional(&statement, UserMovies::from_row)
            .await
    }

    /// Create or overwrite the RATED edge from `username` to `title`
    ///
    /// Does not recompute the movie's average; see
    /// [`submit_rating`](Self::submit_rating). A missing user or movie writes
    /// nothing and yields [`RatingOutcome::NoMatch`].
    #[instrument(skip(self))]
    pub async fn rate_movie(
        &self,
        username: &str,
        title: &str,
        rating: i64,
    ) -> Result<RatingOutcome, StoreError> {
        let statement = Statement::new(cypher::RATE_MOVIE)
            .param("name", username)
            .param("movieTitle", title)
            .param("rating", rating);

        let titles = self
            .uow
            .execute(&statement, |row: &Row| row.get::<String>("title"))
            .await?;

        match titles.first() {
            Some(matched) => Ok(RatingOutcome::Applied {
                title: matched.clone(),
                edges: titles.len(),
            }),
            None => {
                debug!("No user/movie pair matched, rating not stored");
                Ok(RatingOutcome::NoMatch)
            }
        }
    }

    /// Rewrite the movie's rating as the mean of its incoming ratings
    ///
    /// A missing or never-rated movie yields [`RecomputeOutcome::NotFound`] and
    /// keeps its current rating.
    #[instrument(skip(self))]
    pub async fn recompute_movie_rating(
        &self,
        title: &str,
    ) -> Result<RecomputeOutcome, StoreError> {
        let statement = Statement::new(cypher::RECOMPUTE_RATING).param("title", title);

        let updated = self
            .uow
            .execute_optional(&statement, |row: &Row| {
                Ok((
                    row.get::<String>("title")?,
                    row.get::<Option<f64>>("updatedRating")?,
                ))
            })
            .await?;

        match updated {
            Some((title, rating)) => {
                info!(%title, ?rating, "Movie rating updated");
                Ok(RecomputeOutcome::Updated { title, rating })
            }
            None => {
                info!("Movie not found or not rated yet");
                Ok(RecomputeOutcome::NotFound)
            }
        }
    }

    /// Build the viewer context for a user picked on the page
    pub fn select_viewer(&self, name: &str) -> Result<ViewerContext, MovieServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MovieServiceError::invalid_input("name cannot be empty"));
        }
        Ok(ViewerContext::for_user(name))
    }

    /// Users plus, when a viewer is selected, the viewer's movie lists
    #[instrument(skip(self))]
    pub async fn page_data(&self, viewer: &ViewerContext) -> Result<PageData, MovieServiceError> {
        let users = self.list_users().await?;

        let Some(username) = viewer.username() else {
            return Ok(PageData {
                users,
                ..PageData::default()
            });
        };

        match self.fetch_user_movies(username).await? {
            Some(movies) => Ok(PageData {
                users,
                rated_movies: Some(movies.rated_movies),
                unrated_movies: Some(movies.unrated_movies),
            }),
            None => {
                debug!(username = %username, "Selected viewer does not exist");
                Ok(PageData {
                    users,
                    ..PageData::default()
                })
            }
        }
    }

    /// Rate a movie as the viewer, then recompute its average
    ///
    /// The recompute is skipped when the rating matched nothing. A failing
    /// recompute is returned as an error; the rating stays written.
    #[instrument(skip(self))]
    pub async fn submit_rating(
        &self,
        viewer: &ViewerContext,
        title: &str,
        rating: i64,
    ) -> Result<SubmittedRating, MovieServiceError> {
        let username = viewer
            .username()
            .ok_or(MovieServiceError::NoViewerSelected)?;
        if title.trim().is_empty() {
            return Err(MovieServiceError::invalid_input("title cannot be empty"));
        }

        let outcome = self.rate_movie(username, title, rating).await?;
        if !outcome.is_applied() {
            return Ok(SubmittedRating {
                rating: outcome,
                recompute: None,
            });
        }

        let recompute = self.recompute_movie_rating(title).await?;
        Ok(SubmittedRating {
            rating: outcome,
            recompute: Some(recompute),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryGraph;

    async fn service_with(graph: &MemoryGraph) -> MovieService {
        MovieService::new(Arc::new(graph.clone()))
    }

    #[tokio::test]
    async fn test_rate_movie_reports_matched_title() {
        let graph = MemoryGraph::new();
        graph.insert_movie("Heat", None).await;
        graph.insert_user("u1", "ana", 30).await;
        let service = service_with(&graph).await;

        let outcome = service.rate_movie("ana", "Heat", 4).await.unwrap();

        assert_eq!(
            outcome,
            RatingOutcome::Applied {
                title: "Heat".to_string(),
                edges: 1
            }
        );
        assert_eq!(graph.movie_rating("Heat").await, Some(None));
    }

    #[tokio::test]
    async fn test_select_viewer_rejects_blank_name() {
        let service = service_with(&MemoryGraph::new()).await;

        assert!(matches!(
            service.select_viewer("   "),
            Err(MovieServiceError::InvalidInput(_))
        ));
        assert_eq!(
            service.select_viewer(" ana ").unwrap(),
            ViewerContext::for_user("ana")
        );
    }

    #[tokio::test]
    async fn test_submit_rating_requires_viewer() {
        let graph = MemoryGraph::new();
        let service = service_with(&graph).await;

        let err = service
            .submit_rating(&ViewerContext::anonymous(), "Heat", 5)
            .await
            .unwrap_err();

        assert!(matches!(err, MovieServiceError::NoViewerSelected));
        assert_eq!(graph.session_stats().opened, 0);
    }

    #[tokio::test]
    async fn test_shutdown_closes_client() {
        let graph = MemoryGraph::new();
        let service = service_with(&graph).await;

        service.shutdown().await.unwrap();
        let err = service.list_movies().await.unwrap_err();

        assert!(matches!(err, StoreError::Closed));
    }
}
