use crate::services::pagination::PageRequest;
use crate::services::query_service::QueryError;
use crate::services::sort_service::SortSpec;
use chrono::NaiveDate;
use rocket::http::{ContentType, Status};
use rocket::request::Request;
use rocket::response::Responder;
use serde::{Serialize, Serializer};
use rocket::{response, FromForm, Response};
use std::io::Cursor;

/// The `type` column. Values other than `videos` / `shorts` keep their text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VideoType {
    Videos,
    Shorts,
    Other(String),
}

impl VideoType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "videos" => VideoType::Videos,
            "shorts" => VideoType::Shorts,
            other => VideoType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            VideoType::Videos => "videos",
            VideoType::Shorts => "shorts",
            VideoType::Other(raw) => raw,
        }
    }
}

impl Default for VideoType {
    fn default() -> Self {
        VideoType::Other(String::new())
    }
}

impl Serialize for VideoType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One observation of one video on one record date.
///
/// Counts are already coerced; dates keep the source text and are parsed on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub rank: u64,
    pub video_id: String,
    pub title: String,
    pub channel_title: String,
    pub published_at: String,
    pub region: String,
    #[serde(rename = "type")]
    pub video_type: VideoType,
    pub record_date: String,
    pub url: String,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub hashtags: String,
    pub duration_seconds: u64,
}

/// Raw query-string parameters, before validation.
#[derive(Debug, Clone, Default, FromForm)]
pub struct QueryParams {
    pub action: Option<String>,
    #[field(name = "startDate")]
    pub start_date: Option<String>,
    #[field(name = "endDate")]
    pub end_date: Option<String>,
    pub region: Option<String>,
    #[field(name = "type")]
    pub video_type: Option<String>,
    pub channel: Option<String>,
    pub hashtag: Option<String>,
    #[field(name = "minViews")]
    pub min_views: Option<String>,
    #[field(name = "sortBy")]
    pub sort_by: Option<String>,
    #[field(name = "sortOrder")]
    pub sort_order: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Validated, immutable input to one query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySpec {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub region: Option<String>,
    pub video_type: Option<VideoType>,
    pub channel: Option<String>,
    pub hashtag: Option<String>,
    pub min_views: Option<u64>,
    pub sort: SortSpec,
    pub page: PageRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendBucket {
    pub date: String,
    pub total_views: u64,
    pub total_likes: u64,
    pub total_comments: u64,
    pub video_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HashtagStat {
    pub hashtag: String,
    pub count: u64,
    pub total_views: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStat {
    pub channel_title: String,
    pub video_count: u64,
    pub total_views: u64,
    pub total_likes: u64,
    pub avg_views: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListResponse {
    pub data: Vec<VideoRecord>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendsResponse {
    pub trends: Vec<TrendBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HashtagsResponse {
    pub hashtags: Vec<HashtagStat>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelsResponse {
    pub channels: Vec<ChannelStat>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResponse {
    Listing(VideoListResponse),
    Trends(TrendsResponse),
    Hashtags(HashtagsResponse),
    Channels(ChannelsResponse),
}

/// Either a query's envelope or its error, so one failed view never hides the others.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum QueryOutcome<T> {
    Ready(T),
    Failed(ErrorResponse),
}

impl<T> QueryOutcome<T> {
    pub fn status(&self) -> Status {
        match self {
            QueryOutcome::Ready(_) => Status::Ok,
            QueryOutcome::Failed(e) => e.status,
        }
    }
}

impl<T> From<Result<T, QueryError>> for QueryOutcome<T> {
    fn from(result: Result<T, QueryError>) -> Self {
        match result {
            Ok(envelope) => QueryOutcome::Ready(envelope),
            Err(e) => QueryOutcome::Failed(e.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub listing: QueryOutcome<VideoListResponse>,
    pub trends: QueryOutcome<TrendsResponse>,
    pub hashtags: QueryOutcome<HashtagsResponse>,
    pub channels: QueryOutcome<ChannelsResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub record_source: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip)]
    pub status: Status,
}

impl From<QueryError> for ErrorResponse {
    fn from(e: QueryError) -> Self {
        let status = match &e {
            QueryError::UnsupportedAction(_) | QueryError::InvalidRequest(_) => Status::BadRequest,
            QueryError::Source(_) | QueryError::Cancelled => Status::ServiceUnavailable,
            QueryError::Internal(_) => Status::InternalServerError,
        };

        ErrorResponse {
            error: e.to_string(),
            status,
        }
    }
}

impl<'r> Responder<'r, 'static> for ErrorResponse {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let json = serde_json::to_string(&self).map_err(|_| Status::InternalServerError)?;
        Response::build()
            .status(self.status)
            .header(ContentType::JSON)
            .sized_body(json.len(), Cursor::new(json))
            .ok()
    }
}
