//! Unit of Work Lifecycle Tests
//!
//! Every operation owns exactly one session, and that session is released on
//! every exit path:
//!
//! - success
//! - statement failure
//! - row mapping failure
//! - session close failure
//! - caller cancellation (the operation future is dropped mid-statement)
//!
//! The in-process `MemoryGraph` counts opened and released sessions, so each
//! test asserts `in_flight() == 0` after the operation settles.

#[cfg(test)]
mod unit_of_work_lifecycle_tests {
    use anyhow::Result;
    use cinegraph_core::db::{
        cypher, FaultKind, GraphUnitOfWork, MappingError, MemoryGraph, Row, StoreError,
        StoreErrorKind, Statement,
    };
    use cinegraph_core::MovieService;
    use futures::future::join_all;
    use std::sync::Arc;
    use std::time::Duration;

    fn unit_of_work(graph: &MemoryGraph) -> GraphUnitOfWork {
        GraphUnitOfWork::new(Arc::new(graph.clone()))
    }

    #[tokio::test]
    async fn test_session_released_after_success() -> Result<()> {
        let graph = MemoryGraph::new();
        graph.insert_movie("Heat", Some(4.0)).await;
        let uow = unit_of_work(&graph);

        let titles = uow
            .execute(&Statement::new(cypher::LIST_MOVIES), |row: &Row| {
                row.get::<String>("title")
            })
            .await?;

        assert_eq!(titles, vec!["Heat".to_string()]);
        let stats = graph.session_stats();
        assert_eq!(stats.opened, 1);
        assert_eq!(stats.closed, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_session_released_after_statement_failure() -> Result<()> {
        let graph = MemoryGraph::new();
        graph.inject_fault(FaultKind::Run).await;
        let service = MovieService::new(Arc::new(graph.clone()));

        let err = service.list_movies().await.unwrap_err();

        assert_eq!(err.kind(), StoreErrorKind::Query);
        assert_eq!(graph.session_stats().opened, 1);
        assert_eq!(graph.session_stats().in_flight(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_session_released_after_mapping_failure() -> Result<()> {
        let graph = MemoryGraph::new();
        graph.insert_movie("Heat", None).await;
        let uow = unit_of_work(&graph);

        let err = uow
            .execute(&Statement::new(cypher::LIST_MOVIES), |row: &Row| {
                row.get::<String>("director")
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StoreError::Mapping(MappingError::MissingColumn { .. })
        ));
        assert_eq!(graph.session_stats().in_flight(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_statement_error_wins_over_close_error() -> Result<()> {
        let graph = MemoryGraph::new();
        graph.inject_fault(FaultKind::Run).await;
        graph.inject_fault(FaultKind::Close).await;
        let service = MovieService::new(Arc::new(graph.clone()));

        let err = service.list_users().await.unwrap_err();

        assert_eq!(err.kind(), StoreErrorKind::Query);
        assert_eq!(graph.session_stats().closed, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_close_failure_after_success_is_reported() -> Result<()> {
        let graph = MemoryGraph::new();
        graph.inject_fault(FaultKind::Close).await;
        let service = MovieService::new(Arc::new(graph.clone()));

        let err = service.list_movies().await.unwrap_err();

        assert_eq!(err.kind(), StoreErrorKind::Connection);
        assert_eq!(graph.session_stats().in_flight(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_open_failure_opens_nothing() -> Result<()> {
        let graph = MemoryGraph::new();
        graph.inject_fault(FaultKind::Open).await;
        let service = MovieService::new(Arc::new(graph.clone()));

        let err = service.list_movies().await.unwrap_err();

        assert_eq!(err.kind(), StoreErrorKind::Connection);
        assert_eq!(graph.session_stats().opened, 0);
        assert_eq!(graph.session_stats().closed, 0);

        // The fault fired once; the next operation goes through
        assert!(service.list_movies().await?.is_empty());
        assert_eq!(graph.session_stats().closed, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_cancelled_operation_releases_session() -> Result<()> {
        let graph = MemoryGraph::with_latency(Duration::from_millis(200));
        graph.insert_movie("Heat", None).await;
        let service = MovieService::new(Arc::new(graph.clone()));

        let limit = Duration::from_millis(10);
        let outcome = tokio::time::timeout(limit, service.list_movies()).await;

        assert!(outcome.is_err(), "operation should have timed out");
        let stats = graph.session_stats();
        assert_eq!(stats.opened, 1);
        assert_eq!(stats.closed, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_aborted_task_releases_session() -> Result<()> {
        let graph = MemoryGraph::with_latency(Duration::from_secs(5));
        let service = Arc::new(MovieService::new(Arc::new(graph.clone())));

        let task = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.list_users().await })
        };
        while graph.session_stats().opened == 0 {
            tokio::task::yield_now().await;
        }
        task.abort();
        let joined = task.await;

        assert!(joined.unwrap_err().is_cancelled());
        assert_eq!(graph.session_stats().in_flight(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_operations_use_independent_sessions() -> Result<()> {
        let graph = MemoryGraph::with_latency(Duration::from_millis(5));
        graph.insert_movie("Heat", Some(4.0)).await;
        graph.insert_movie("Alien", Some(3.5)).await;
        let service = MovieService::new(Arc::new(graph.clone()));

        let results = join_all((0..20).map(|_| service.list_movies())).await;

        for movies in results {
            assert_eq!(movies?.len(), 2);
        }
        let stats = graph.session_stats();
        assert_eq!(stats.opened, 20);
        assert_eq!(stats.closed, 20);
        Ok(())
    }

    #[tokio::test]
    async fn test_closed_client_rejects_new_sessions() -> Result<()> {
        let graph = MemoryGraph::new();
        let service = MovieService::new(Arc::new(graph.clone()));

        service.shutdown().await?;
        let err = service.list_movies().await.unwrap_err();

        assert!(matches!(err, StoreError::Closed));
        assert_eq!(err.kind(), StoreErrorKind::Connection);
        assert_eq!(graph.session_stats().opened, 0);
        Ok(())
    }
}
