use crate::models::{DashboardResponse, ErrorResponse, QueryOutcome, QuerySpec, VideoRecord};
use crate::services::query_service::{
    self, list_videos, load_snapshot, QueryError, Snapshot,
};
use crate::services::record_source::RecordSource;
use log::{error, warn};
use rocket::http::Status;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

impl DashboardResponse {
    fn failed(e: QueryError) -> Self {
        let error = ErrorResponse::from(e);
        DashboardResponse {
            listing: QueryOutcome::Failed(error.clone()),
            trends: QueryOutcome::Failed(error.clone()),
            hashtags: QueryOutcome::Failed(error.clone()),
            channels: QueryOutcome::Failed(error),
        }
    }

    /// Only the listing is blocking; the secondary views degrade in place.
    pub fn status(&self) -> Status {
        self.listing.status()
    }
}

/// Runs one query on the blocking pool over a shared snapshot.
///
/// A panic inside the query becomes an `Internal` error for that query alone.
pub async fn spawn_query<T, F>(
    snapshot: &Snapshot,
    spec: &Arc<QuerySpec>,
    cancel: &CancellationToken,
    query: F,
) -> Result<T, QueryError>
where
    T: Send + 'static,
    F: FnOnce(&[VideoRecord], &QuerySpec, &CancellationToken) -> Result<T, QueryError>
        + Send
        + 'static,
{
    let snapshot = snapshot.clone();
    let spec = spec.clone();
    let cancel = cancel.clone();

    tokio::task::spawn_blocking(move || query(&snapshot, &spec, &cancel))
        .await
        .map_err(|e| QueryError::Internal(format!("query task failed: {e}")))?
}

fn outcome<T>(view: &str, result: Result<T, QueryError>) -> QueryOutcome<T> {
    if let Err(e) = &result {
        warn!("Dashboard {view} query failed: {e}");
    }
    result.into()
}

/// Reads the source once, then runs all four queries concurrently.
pub async fn run_dashboard(
    source: Arc<dyn RecordSource>,
    spec: QuerySpec,
    cancel: CancellationToken,
) -> DashboardResponse {
    let snapshot = match load_snapshot(source.as_ref(), &cancel).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            error!("Dashboard could not read record source '{}': {e}", source.name());
            return DashboardResponse::failed(e);
        }
    };
    let spec = Arc::new(spec);

    let (listing, trends, hashtags, channels) = tokio::join!(
        spawn_query(&snapshot, &spec, &cancel, list_videos),
        spawn_query(&snapshot, &spec, &cancel, query_service::trends),
        spawn_query(&snapshot, &spec, &cancel, query_service::hashtags),
        spawn_query(&snapshot, &spec, &cancel, query_service::channels),
    );

    DashboardResponse {
        listing: outcome("listing", listing),
        trends: outcome("trends", trends),
        hashtags: outcome("hashtags", hashtags),
        channels: outcome("channels", channels),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::record_source::{Row, SourceError, StaticRecordSource};

    struct FailingSource;

    #[rocket::async_trait]
    impl RecordSource for FailingSource {
        fn name(&self) -> &str {
            "failing"
        }

        async fn fetch_rows(&self) -> Result<Vec<Row>, SourceError> {
            Err(SourceError::Timeout(std::time::Duration::from_secs(30)))
        }
    }

    #[rocket::async_test]
    async fn test_dashboard_returns_all_four_views() {
        let source: Arc<dyn RecordSource> = Arc::new(StaticRecordSource::sample());
        let dashboard = run_dashboard(source, QuerySpec::default(), CancellationToken::new()).await;

        assert_eq!(dashboard.status(), Status::Ok);
        let QueryOutcome::Ready(listing) = &dashboard.listing else {
            panic!("listing failed");
        };
        assert_eq!(listing.total, 5);
        let QueryOutcome::Ready(hashtags) = &dashboard.hashtags else {
            panic!("hashtags failed");
        };
        assert_eq!(hashtags.hashtags[0].hashtag, "#ai");
        assert!(matches!(dashboard.trends, QueryOutcome::Ready(_)));
        assert!(matches!(dashboard.channels, QueryOutcome::Ready(_)));
    }

    #[rocket::async_test]
    async fn test_source_failure_fails_every_view() {
        let source: Arc<dyn RecordSource> = Arc::new(FailingSource);
        let dashboard = run_dashboard(source, QuerySpec::default(), CancellationToken::new()).await;

        assert_eq!(dashboard.status(), Status::ServiceUnavailable);
        let json = serde_json::to_value(&dashboard).unwrap();
        for view in ["listing", "trends", "hashtags", "channels"] {
            assert!(json[view]["error"].as_str().unwrap().contains("timed out"));
        }
    }

    #[rocket::async_test]
    async fn test_one_failed_query_does_not_abort_siblings() {
        let snapshot: Snapshot = StaticRecordSource::sample()
            .fetch_rows()
            .await
            .unwrap()
            .iter()
            .map(crate::services::record_source::to_video_record)
            .collect::<Vec<_>>()
            .into();
        let spec = Arc::new(QuerySpec::default());
        let cancel = CancellationToken::new();

        let (broken, listing) = tokio::join!(
            spawn_query(&snapshot, &spec, &cancel, |_, _, _| -> Result<(), QueryError> {
                panic!("trend aggregation blew up")
            }),
            spawn_query(&snapshot, &spec, &cancel, list_videos),
        );

        assert!(matches!(broken, Err(QueryError::Internal(_))));
        assert_eq!(listing.unwrap().total, 5);

        let dashboard = DashboardResponse {
            listing: outcome("listing", Ok(listing_fixture())),
            trends: outcome("trends", Err(QueryError::Internal("boom".to_string()))),
            hashtags: outcome("hashtags", Err(QueryError::Cancelled)),
            channels: outcome("channels", Err(QueryError::Internal("boom".to_string()))),
        };
        assert_eq!(dashboard.status(), Status::Ok);
    }

    fn listing_fixture() -> crate::models::VideoListResponse {
        crate::models::VideoListResponse {
            data: Vec::new(),
            total: 0,
            page: 1,
            limit: 20,
            total_pages: 0,
        }
    }

    #[rocket::async_test]
    async fn test_cancelled_dashboard_yields_no_partial_results() {
        let source: Arc<dyn RecordSource> = Arc::new(StaticRecordSource::sample());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let dashboard = run_dashboard(source, QuerySpec::default(), cancel).await;
        assert!(matches!(dashboard.listing, QueryOutcome::Failed(_)));
        assert!(matches!(dashboard.trends, QueryOutcome::Failed(_)));
        assert!(matches!(dashboard.hashtags, QueryOutcome::Failed(_)));
        assert!(matches!(dashboard.channels, QueryOutcome::Failed(_)));
    }
}
