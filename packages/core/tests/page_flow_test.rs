//! Page Flow Tests
//!
//! The composite flows behind the movie page:
//!
//! - `select_viewer` builds the per-request `ViewerContext`
//! - `page_data` loads users plus the viewer's rated/unrated lists
//! - `submit_rating` writes the viewer's rating, then recomputes the average
//!   as a second, separate unit of work
//!
//! Viewers are plain values passed per call, so two requests for different
//! users never see each other's selection.

#[cfg(test)]
mod page_flow_tests {
    use anyhow::Result;
    use cinegraph_core::db::{cypher, MemoryGraph, StoreErrorKind, Value};
    use cinegraph_core::{
        MovieService, MovieServiceError, PageData, RatingOutcome, RecomputeOutcome,
        ViewerContext,
    };
    use futures::future::join_all;
    use std::sync::Arc;

    async fn create_service() -> (MovieService, MemoryGraph) {
        let graph = MemoryGraph::new();
        graph.insert_movie("Alien", None).await;
        graph.insert_movie("Heat", None).await;
        graph.insert_user("u1", "ana", 31).await;
        graph.insert_user("u2", "ben", 45).await;
        (MovieService::new(Arc::new(graph.clone())), graph)
    }

    #[tokio::test]
    async fn test_page_without_viewer_lists_users_only() -> Result<()> {
        let (service, graph) = create_service().await;

        let page = service.page_data(&ViewerContext::anonymous()).await?;

        assert_eq!(page.users.len(), 2);
        assert!(page.rated_movies.is_none());
        assert!(page.unrated_movies.is_none());
        assert_eq!(graph.session_stats().opened, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_page_for_selected_viewer() -> Result<()> {
        let (service, _graph) = create_service().await;
        service.rate_movie("ana", "Heat", 4).await?;
        let viewer = service.select_viewer("ana")?;

        let page = service.page_data(&viewer).await?;

        let rated = page.rated_movies.expect("viewer selected");
        let unrated = page.unrated_movies.expect("viewer selected");
        assert_eq!(rated.len(), 1);
        assert_eq!(rated[0].title, "Heat");
        assert_eq!(rated[0].user_rating, Some(4));
        assert_eq!(unrated.len(), 1);
        assert_eq!(unrated[0].title, "Alien");
        Ok(())
    }

    #[tokio::test]
    async fn test_page_for_unknown_viewer_has_no_lists() -> Result<()> {
        let (service, _graph) = create_service().await;

        let page = service.page_data(&ViewerContext::for_user("ghost")).await?;

        assert_eq!(page.users.len(), 2);
        assert_eq!(
            page,
            PageData {
                users: page.users.clone(),
                rated_movies: None,
                unrated_movies: None,
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_submit_rating_updates_average() -> Result<()> {
        let (service, graph) = create_service().await;
        service.rate_movie("ben", "Heat", 5).await?;
        let viewer = service.select_viewer("ana")?;

        let submitted = service.submit_rating(&viewer, "Heat", 4).await?;

        assert!(submitted.rating.is_applied());
        assert_eq!(
            submitted.recompute,
            Some(RecomputeOutcome::Updated {
                title: "Heat".to_string(),
                rating: Some(4.5)
            })
        );
        assert_eq!(graph.movie_rating("Heat").await, Some(Some(4.5)));
        assert_eq!(graph.session_stats().in_flight(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_submit_rating_for_missing_movie_skips_recompute() -> Result<()> {
        let (service, graph) = create_service().await;
        let viewer = service.select_viewer("ana")?;

        let submitted = service.submit_rating(&viewer, "Nonexistent", 5).await?;

        assert_eq!(submitted.rating, RatingOutcome::NoMatch);
        assert!(submitted.recompute.is_none());
        assert_eq!(graph.rated_edge_count().await, 0);
        assert_eq!(graph.session_stats().opened, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_recompute_keeps_written_rating() -> Result<()> {
        let (service, graph) = create_service().await;
        graph.inject_statement_fault(cypher::RECOMPUTE_RATING).await;
        let viewer = service.select_viewer("ana")?;

        let err = service.submit_rating(&viewer, "Heat", 3).await.unwrap_err();

        assert!(matches!(err, MovieServiceError::Store(_)));
        assert_eq!(err.store_kind(), Some(StoreErrorKind::Query));
        assert_eq!(
            graph.edge_rating("ana", "Heat").await,
            Some(Value::Integer(3))
        );
        assert_eq!(graph.movie_rating("Heat").await, Some(None));
        assert_eq!(graph.session_stats().in_flight(), 0);

        // A later recompute catches the average up
        service.recompute_movie_rating("Heat").await?;
        assert_eq!(graph.movie_rating("Heat").await, Some(Some(3.0)));
        Ok(())
    }

    #[tokio::test]
    async fn test_submit_rating_rejects_blank_title() -> Result<()> {
        let (service, graph) = create_service().await;
        let viewer = service.select_viewer("ana")?;

        let err = service.submit_rating(&viewer, "  ", 3).await.unwrap_err();

        assert!(matches!(err, MovieServiceError::InvalidInput(_)));
        assert_eq!(graph.session_stats().opened, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_viewers_stay_isolated() -> Result<()> {
        let (service, graph) = create_service().await;
        let ana = service.select_viewer("ana")?;
        let ben = service.select_viewer("ben")?;

        let submissions = join_all(vec![
            service.submit_rating(&ana, "Alien", 2),
            service.submit_rating(&ben, "Heat", 5),
        ])
        .await;
        for submitted in submissions {
            assert!(submitted?.rating.is_applied());
        }

        let (ana_page, ben_page) = tokio::join!(service.page_data(&ana), service.page_data(&ben));

        let ana_rated = ana_page?.rated_movies.expect("ana selected");
        let ben_rated = ben_page?.rated_movies.expect("ben selected");
        assert_eq!(ana_rated.len(), 1);
        assert_eq!(ana_rated[0].title, "Alien");
        assert_eq!(ben_rated.len(), 1);
        assert_eq!(ben_rated[0].title, "Heat");
        assert_eq!(graph.movie_rating("Alien").await, Some(Some(2.0)));
        assert_eq!(graph.movie_rating("Heat").await, Some(Some(5.0)));
        assert_eq!(graph.session_stats().in_flight(), 0);
        Ok(())
    }
}
