use crate::models::{ErrorResponse, HealthResponse, QueryParams, QueryResponse};
use crate::services::query_service::{parse_request, run_query};
use crate::AppState;
use log::{error, info, warn};
use rocket::serde::json::Json;
use rocket::{get, post, State};
use tokio_util::sync::CancellationToken;

async fn answer(params: QueryParams, state: &AppState) -> Result<Json<QueryResponse>, ErrorResponse> {
    let (action, spec) = parse_request(&params).map_err(|e| {
        warn!("Rejected query: {e}");
        ErrorResponse::from(e)
    })?;

    // Cancels the blocking work if Rocket drops this future (client went away).
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    match run_query(state.record_source.clone(), action, spec, cancel).await {
        Ok(response) => {
            info!("Answered {action:?} query.");
            Ok(Json(response))
        }
        Err(e) => {
            error!("{action:?} query failed: {e}");
            Err(e.into())
        }
    }
}

#[get("/?<params..>")]
pub async fn query_videos(
    params: QueryParams,
    state: &State<AppState>,
) -> Result<Json<QueryResponse>, ErrorResponse> {
    answer(params, state).await
}

#[post("/?<params..>")]
pub async fn query_videos_post(
    params: QueryParams,
    state: &State<AppState>,
) -> Result<Json<QueryResponse>, ErrorResponse> {
    answer(params, state).await
}

#[get("/health")]
pub fn health(state: &State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        record_source: state.record_source.name().to_string(),
    })
}
