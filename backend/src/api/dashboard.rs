use crate::models::{DashboardResponse, ErrorResponse, QueryParams};
use crate::services::dashboard_service::run_dashboard;
use crate::services::query_service::parse_request;
use crate::AppState;
use log::info;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{get, State};
use tokio_util::sync::CancellationToken;

/// All four views for one filter state. The status follows the listing alone.
#[get("/dashboard?<params..>")]
pub async fn get_dashboard(
    mut params: QueryParams,
    state: &State<AppState>,
) -> Result<(Status, Json<DashboardResponse>), ErrorResponse> {
    params.action = None;
    let (_, spec) = parse_request(&params)?;

    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let response = run_dashboard(state.record_source.clone(), spec, cancel).await;
    info!("Answered dashboard query with status {}.", response.status());
    Ok((response.status(), Json(response)))
}
