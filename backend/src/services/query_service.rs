use crate::models::{
    ChannelsResponse, HashtagsResponse, QueryParams, QueryResponse, QuerySpec, TrendsResponse,
    VideoListResponse, VideoRecord, VideoType,
};
use crate::services::aggregation_service::{
    channel_ranking, hashtag_ranking, trend_rollup, TOP_CHANNELS, TOP_HASHTAGS,
};
use crate::services::filter_service::{filter_records, FilterScope};
use crate::services::pagination::{paginate, PageRequest, DEFAULT_LIMIT, DEFAULT_PAGE};
use crate::services::record_source::{load_records, RecordSource, SourceError};
use crate::services::sort_service::{sort_records, SortSpec};
use crate::utils::{coerce_date, coerce_int_str};
use log::debug;
use std::str::FromStr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Immutable record set shared by every query of one request.
pub type Snapshot = Arc<[VideoRecord]>;

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("unsupported action: {0}")]
    UnsupportedAction(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("query cancelled")]
    Cancelled,
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Listing,
    Trends,
    Hashtags,
    Channels,
}

impl FromStr for Action {
    type Err = QueryError;

    /// Also accepts the `getData`-style names older clients send.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "" | "listing" | "getData" => Ok(Action::Listing),
            "trends" | "getTrends" => Ok(Action::Trends),
            "hashtags" | "getHashtags" => Ok(Action::Hashtags),
            "channels" | "getChannels" => Ok(Action::Channels),
            other => Err(QueryError::UnsupportedAction(other.to_string())),
        }
    }
}

/// Trimmed value, or `None` when missing or blank.
fn present(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_positive(name: &str, raw: Option<&str>, default: usize) -> Result<usize, QueryError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<usize>() {
        Ok(0) => Err(QueryError::InvalidRequest(format!("{name} must be at least 1"))),
        Ok(value) => Ok(value),
        Err(_) => Err(QueryError::InvalidRequest(format!(
            "{name} must be a positive integer, got '{raw}'"
        ))),
    }
}

/// An unreadable bound leaves that side of the range open.
fn parse_bound(name: &str, raw: Option<&str>) -> Option<chrono::NaiveDate> {
    let raw = raw?;
    let date = coerce_date(raw);
    if date.is_none() {
        debug!("Ignoring unparsable {name} '{raw}'.");
    }
    date
}

/// Validates the request shape and builds the action and its spec.
pub fn parse_request(params: &QueryParams) -> Result<(Action, QuerySpec), QueryError> {
    let action = params.action.as_deref().unwrap_or_default().parse::<Action>()?;

    let spec = QuerySpec {
        start_date: parse_bound("startDate", present(&params.start_date)),
        end_date: parse_bound("endDate", present(&params.end_date)),
        region: present(&params.region).map(String::from),
        video_type: present(&params.video_type).map(VideoType::parse),
        channel: present(&params.channel).map(String::from),
        hashtag: present(&params.hashtag).map(String::from),
        min_views: present(&params.min_views).map(coerce_int_str),
        sort: SortSpec::new(present(&params.sort_by), present(&params.sort_order)),
        page: PageRequest {
            page: parse_positive("page", present(&params.page), DEFAULT_PAGE)?,
            limit: parse_positive("limit", present(&params.limit), DEFAULT_LIMIT)?,
        },
    };

    Ok((action, spec))
}

fn checkpoint(cancel: &CancellationToken, stage: &str) -> Result<(), QueryError> {
    if cancel.is_cancelled() {
        debug!("Query cancelled after {stage}.");
        return Err(QueryError::Cancelled);
    }
    Ok(())
}

pub fn list_videos(
    records: &[VideoRecord],
    spec: &QuerySpec,
    cancel: &CancellationToken,
) -> Result<VideoListResponse, QueryError> {
    let mut matched = filter_records(records, spec, FilterScope::Listing);
    debug!("Listing filter kept {} of {} records.", matched.len(), records.len());
    checkpoint(cancel, "filter")?;

    sort_records(&mut matched, &spec.sort);
    checkpoint(cancel, "sort")?;

    let page = paginate(&matched, &spec.page);
    Ok(VideoListResponse {
        data: page.items.into_iter().cloned().collect(),
        total: page.total,
        page: page.page,
        limit: page.limit,
        total_pages: page.total_pages,
    })
}

pub fn trends(
    records: &[VideoRecord],
    spec: &QuerySpec,
    cancel: &CancellationToken,
) -> Result<TrendsResponse, QueryError> {
    let matched = filter_records(records, spec, FilterScope::Aggregate);
    checkpoint(cancel, "filter")?;

    let trends = trend_rollup(matched);
    checkpoint(cancel, "group")?;
    Ok(TrendsResponse { trends })
}

pub fn hashtags(
    records: &[VideoRecord],
    spec: &QuerySpec,
    cancel: &CancellationToken,
) -> Result<HashtagsResponse, QueryError> {
    let matched = filter_records(records, spec, FilterScope::Aggregate);
    checkpoint(cancel, "filter")?;

    let hashtags = hashtag_ranking(matched, TOP_HASHTAGS);
    checkpoint(cancel, "group")?;
    Ok(HashtagsResponse { hashtags })
}

pub fn channels(
    records: &[VideoRecord],
    spec: &QuerySpec,
    cancel: &CancellationToken,
) -> Result<ChannelsResponse, QueryError> {
    let matched = filter_records(records, spec, FilterScope::Aggregate);
    checkpoint(cancel, "filter")?;

    let channels = channel_ranking(matched, TOP_CHANNELS);
    checkpoint(cancel, "group")?;
    Ok(ChannelsResponse { channels })
}

/// Routes an action to its pipeline. Holds no logic of its own.
pub fn execute(
    action: Action,
    spec: &QuerySpec,
    records: &[VideoRecord],
    cancel: &CancellationToken,
) -> Result<QueryResponse, QueryError> {
    match action {
        Action::Listing => list_videos(records, spec, cancel).map(QueryResponse::Listing),
        Action::Trends => trends(records, spec, cancel).map(QueryResponse::Trends),
        Action::Hashtags => hashtags(records, spec, cancel).map(QueryResponse::Hashtags),
        Action::Channels => channels(records, spec, cancel).map(QueryResponse::Channels),
    }
}

/// One blocking read of the source, abandoned early if the caller cancels.
pub async fn load_snapshot(
    source: &dyn RecordSource,
    cancel: &CancellationToken,
) -> Result<Snapshot, QueryError> {
    let records = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(QueryError::Cancelled),
        loaded = load_records(source) => loaded?,
    };
    Ok(records.into())
}

pub async fn run_query(
    source: Arc<dyn RecordSource>,
    action: Action,
    spec: QuerySpec,
    cancel: CancellationToken,
) -> Result<QueryResponse, QueryError> {
    let snapshot = load_snapshot(source.as_ref(), &cancel).await?;

    tokio::task::spawn_blocking(move || execute(action, &spec, &snapshot, &cancel))
        .await
        .map_err(|e| QueryError::Internal(format!("query task failed: {e}")))?
}
