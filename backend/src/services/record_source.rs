use crate::models::{VideoRecord, VideoType};
use crate::utils::{coerce_int, coerce_text};
use elasticsearch::http::response::Response;
use elasticsearch::{ClearScrollParts, Elasticsearch, ScrollParts, SearchParts};
use log::{debug, info, warn};
use serde_json::{json, Map, Value};
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

const SCROLL_KEEP_ALIVE: &str = "1m";
const SCROLL_PAGE_SIZE: usize = 1000;

/// One raw row: column name to cell value.
pub type Row = Map<String, Value>;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("record source unavailable: {0}")]
    Unavailable(String),
    #[error("record source timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("record source returned malformed data: {0}")]
    Malformed(String),
}

/// Read-only provider of the full row set.
///
/// Implementations own their timeout; the engine reads once per query and never streams.
#[rocket::async_trait]
pub trait RecordSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_rows(&self) -> Result<Vec<Row>, SourceError>;
}

pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T, SourceError>
where
    F: Future<Output = Result<T, SourceError>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| SourceError::Timeout(limit))?
}

/// Reads every row from `source` and adapts it into records.
pub async fn load_records(source: &dyn RecordSource) -> Result<Vec<VideoRecord>, SourceError> {
    let rows = source.fetch_rows().await?;
    info!("Read {} rows from record source '{}'.", rows.len(), source.name());
    Ok(rows.iter().map(to_video_record).collect())
}

/// The only place raw rows are inspected; every cell is coerced here.
pub fn to_video_record(row: &Row) -> VideoRecord {
    let text = |key: &str| coerce_text(row.get(key));
    let int = |key: &str| coerce_int(row.get(key));

    VideoRecord {
        rank: int("rank"),
        video_id: text("videoId"),
        title: text("title"),
        channel_title: text("channelTitle"),
        published_at: text("publishedAt"),
        region: text("region"),
        video_type: VideoType::parse(&text("type")),
        record_date: text("recordDate"),
        url: text("url"),
        view_count: int("viewCount"),
        like_count: int("likeCount"),
        comment_count: int("commentCount"),
        hashtags: text("hashtags"),
        duration_seconds: int("durationSeconds"),
    }
}

fn is_blank(cell: &Value) -> bool {
    match cell {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Turns a JSON payload into rows.
///
/// Accepts an array of objects, or a sheet-style array of arrays whose first
/// row holds the column names. Either may be wrapped as `data`, `rows` or `values`.
pub fn rows_from_payload(payload: Value) -> Result<Vec<Row>, SourceError> {
    let table = match payload {
        Value::Array(table) => table,
        Value::Object(mut wrapper) => ["data", "rows", "values"]
            .iter()
            .find_map(|key| match wrapper.remove(*key) {
                Some(Value::Array(table)) => Some(table),
                _ => None,
            })
            .ok_or_else(|| {
                SourceError::Malformed("expected a row array under data, rows or values".to_string())
            })?,
        other => {
            return Err(SourceError::Malformed(format!(
                "expected an array of rows, got {}",
                kind_of(&other)
            )))
        }
    };

    match table.first() {
        None => Ok(Vec::new()),
        Some(Value::Array(_)) => rows_from_sheet(table),
        Some(_) => table
            .into_iter()
            .enumerate()
            .map(|(i, row)| match row {
                Value::Object(row) => Ok(row),
                other => Err(SourceError::Malformed(format!(
                    "row {i} is {} instead of an object",
                    kind_of(&other)
                ))),
            })
            .collect(),
    }
}

fn rows_from_sheet(table: Vec<Value>) -> Result<Vec<Row>, SourceError> {
    let mut lines = table.into_iter();
    let header: Vec<String> = match lines.next() {
        Some(Value::Array(cells)) => cells.iter().map(|c| coerce_text(Some(c))).collect(),
        _ => return Ok(Vec::new()),
    };

    let mut rows = Vec::new();
    for (i, line) in lines.enumerate() {
        let cells = match line {
            Value::Array(cells) => cells,
            other => {
                return Err(SourceError::Malformed(format!(
                    "sheet line {} is {} instead of an array",
                    i + 1,
                    kind_of(&other)
                )))
            }
        };
        if cells.iter().all(is_blank) {
            continue;
        }

        let row: Row = header
            .iter()
            .zip(cells)
            .filter(|(column, _)| !column.is_empty())
            .map(|(column, cell)| (column.clone(), cell))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Rows held in memory, e.g. the built-in sample set.
pub struct StaticRecordSource {
    name: String,
    rows: Vec<Row>,
}

impl StaticRecordSource {
    pub fn new(name: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    pub fn sample() -> Self {
        let rows = rows_from_payload(sample_rows()).unwrap_or_default();
        Self::new("sample", rows)
    }
}

#[rocket::async_trait]
impl RecordSource for StaticRecordSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_rows(&self) -> Result<Vec<Row>, SourceError> {
        Ok(self.rows.clone())
    }
}

/// Rows exported to a JSON file, re-read on every query.
pub struct JsonFileRecordSource {
    path: PathBuf,
    timeout: Duration,
}

impl JsonFileRecordSource {
    pub fn new(path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            path: path.into(),
            timeout,
        }
    }
}

#[rocket::async_trait]
impl RecordSource for JsonFileRecordSource {
    fn name(&self) -> &str {
        "json"
    }

    async fn fetch_rows(&self) -> Result<Vec<Row>, SourceError> {
        with_timeout(self.timeout, async {
            let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
                SourceError::Unavailable(format!("failed to read {}: {e}", self.path.display()))
            })?;
            let payload: Value = serde_json::from_slice(&bytes).map_err(|e| {
                SourceError::Malformed(format!("{} is not valid JSON: {e}", self.path.display()))
            })?;
            rows_from_payload(payload)
        })
        .await
    }
}


/// One decoded search or scroll page.
#[derive(Debug)]
struct ScrollPage {
    rows: Vec<Row>,
    scroll_id: Option<String>,
}

/// Checks the status and error body of a search/scroll page, then pulls out its documents.
fn scroll_page(index: &str, status: u16, mut body: Value) -> Result<ScrollPage, SourceError> {
    if !(200..300).contains(&status) || body.get("error").is_some() {
        let reason = body
            .pointer("/error/reason")
            .or_else(|| body.get("error"))
            .map(|e| e.to_string())
            .unwrap_or_default();
        return Err(SourceError::Unavailable(format!(
            "Elasticsearch read of '{index}' failed with status {status}: {reason}"
        )));
    }

    let scroll_id = body["_scroll_id"].as_str().map(String::from);
    let hits = match body.pointer_mut("/hits/hits").map(Value::take) {
        Some(Value::Array(hits)) => hits,
        _ => {
            return Err(SourceError::Malformed(format!(
                "Elasticsearch page for '{index}' has no hits array"
            )))
        }
    };

    let rows = hits
        .into_iter()
        .filter_map(|mut hit| match hit.get_mut("_source").map(Value::take) {
            Some(Value::Object(source)) => Some(source),
            _ => None,
        })
        .collect();

    Ok(ScrollPage { rows, scroll_id })
}

/// Rows stored as documents in an Elasticsearch index, read with the scroll API.
pub struct ElasticsearchRecordSource {
    client: Elasticsearch,
    index: String,
    timeout: Duration,
}

impl ElasticsearchRecordSource {
    pub fn new(client: Elasticsearch, index: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            index: index.into(),
            timeout,
        }
    }

    async fn read_page(&self, response: Response) -> Result<ScrollPage, SourceError> {
        let status = response.status_code();
        let body = match response.json::<Value>().await {
            Ok(body) => body,
            Err(e) if status.is_success() => {
                return Err(SourceError::Malformed(format!("Elasticsearch response: {e}")))
            }
            Err(_) => Value::Null,
        };
        scroll_page(&self.index, status.as_u16(), body)
    }

    async fn scroll_all(&self) -> Result<Vec<Row>, SourceError> {
        let response = self
            .client
            .search(SearchParts::Index(&[self.index.as_str()]))
            .scroll(SCROLL_KEEP_ALIVE)
            .body(json!({
                "size": SCROLL_PAGE_SIZE,
                "query": { "match_all": {} },
                "sort": ["_doc"]
            }))
            .send()
            .await
            .map_err(|e| SourceError::Unavailable(format!("Elasticsearch search failed: {e}")))?;

        let mut page = self.read_page(response).await?;
        let mut rows = Vec::new();

        loop {
            if page.rows.is_empty() {
                if let Some(id) = &page.scroll_id {
                    self.clear_scroll(id).await;
                }
                break;
            }

            rows.extend(page.rows);
            debug!("Scrolled {} rows from '{}' so far.", rows.len(), self.index);

            let Some(id) = page.scroll_id else {
                break;
            };
            page = match self.next_page(&id).await {
                Ok(next) => next,
                Err(e) => {
                    // A half-read index is a failed read, never a shorter snapshot.
                    self.clear_scroll(&id).await;
                    return Err(e);
                }
            };
        }

        Ok(rows)
    }

    async fn next_page(&self, scroll_id: &str) -> Result<ScrollPage, SourceError> {
        let response = self
            .client
            .scroll(ScrollParts::None)
            .body(json!({ "scroll": SCROLL_KEEP_ALIVE, "scroll_id": scroll_id }))
            .send()
            .await
            .map_err(|e| SourceError::Unavailable(format!("Elasticsearch scroll failed: {e}")))?;
        self.read_page(response).await
    }

    async fn clear_scroll(&self, scroll_id: &str) {
        if let Err(e) = self
            .client
            .clear_scroll(ClearScrollParts::None)
            .body(json!({ "scroll_id": [scroll_id] }))
            .send()
            .await
        {
            warn!("Failed to clear Elasticsearch scroll context: {e:?}");
        }
    }
}

#[rocket::async_trait]
impl RecordSource for ElasticsearchRecordSource {
    fn name(&self) -> &str {
        "elasticsearch"
    }

    async fn fetch_rows(&self) -> Result<Vec<Row>, SourceError> {
        with_timeout(self.timeout, self.scroll_all()).await
    }
}

/// Rows served as JSON by an HTTP endpoint, e.g. a published spreadsheet.
#[cfg(feature = "http_source")]
pub struct HttpRecordSource {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

#[cfg(feature = "http_source")]
impl HttpRecordSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
            timeout,
        })
    }
}

#[cfg(feature = "http_source")]
#[rocket::async_trait]
impl RecordSource for HttpRecordSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_rows(&self) -> Result<Vec<Row>, SourceError> {
        let response = self.client.get(&self.url).send().await.map_err(|e| {
            if e.is_timeout() {
                SourceError::Timeout(self.timeout)
            } else {
                SourceError::Unavailable(format!("request to {} failed: {e}", self.url))
            }
        })?;

        if !response.status().is_success() {
            return Err(SourceError::Unavailable(format!(
                "{} answered with status: {}",
                self.url,
                response.status()
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| SourceError::Malformed(format!("{} did not return JSON: {e}", self.url)))?;
        rows_from_payload(payload)
    }
}

fn sample_rows() -> Value {
    json!([
        {
            "rank": 1,
            "videoId": "U0FWS4Jrcbs",
            "title": "Female cat making indian rice,turns out be a fatal game#ai #cat #funny #india #animation #catsnake",
            "channelTitle": "Mystery cat",
            "publishedAt": "2025-09-10T15:27:37Z",
            "region": "TW",
            "type": "videos",
            "recordDate": "2025-09-17",
            "url": "https://www.youtube.com/watch?v=U0FWS4Jrcbs",
            "viewCount": 96079554,
            "likeCount": 953798,
            "commentCount": 1300,
            "hashtags": "#ai,#cat,#funny,#india,#animation,#catsnake",
            "durationSeconds": 65
        },
        {
            "rank": 2,
            "videoId": "_0NKbP6rl_Y",
            "title": "carelessness during meat chopping turn into life time sorrow #ai #cat #funny #animation #india",
            "channelTitle": "Mystery cat",
            "publishedAt": "2025-09-11T16:07:52Z",
            "region": "TW",
            "type": "videos",
            "recordDate": "2025-09-17",
            "url": "https://www.youtube.com/watch?v=_0NKbP6rl_Y",
            "viewCount": 81013227,
            "likeCount": 915410,
            "commentCount": 1406,
            "hashtags": "#ai,#cat,#funny,#animation,#india",
            "durationSeconds": 63
        },
        {
            "rank": 3,
            "videoId": "ABC123DEF",
            "title": "Amazing cooking tutorial with traditional methods",
            "channelTitle": "Cooking Master",
            "publishedAt": "2025-09-12T10:30:00Z",
            "region": "TW",
            "type": "videos",
            "recordDate": "2025-09-17",
            "url": "https://www.youtube.com/watch?v=ABC123DEF",
            "viewCount": 45678901,
            "likeCount": 567890,
            "commentCount": 890,
            "hashtags": "#cooking,#tutorial,#traditional,#food",
            "durationSeconds": 180
        },
        {
            "rank": 4,
            "videoId": "XYZ789GHI",
            "title": "Tech review: Latest smartphone features",
            "channelTitle": "Tech Reviewer",
            "publishedAt": "2025-09-13T14:15:30Z",
            "region": "TW",
            "type": "videos",
            "recordDate": "2025-09-17",
            "url": "https://www.youtube.com/watch?v=XYZ789GHI",
            "viewCount": 23456789,
            "likeCount": 234567,
            "commentCount": 567,
            "hashtags": "#tech,#review,#smartphone,#technology",
            "durationSeconds": 420
        },
        {
            "rank": 5,
            "videoId": "JKL456MNO",
            "title": "Beautiful travel vlog in Taiwan mountains",
            "channelTitle": "Travel Explorer",
            "publishedAt": "2025-09-14T08:45:15Z",
            "region": "TW",
            "type": "videos",
            "recordDate": "2025-09-17",
            "url": "https://www.youtube.com/watch?v=JKL456MNO",
            "viewCount": 12345678,
            "likeCount": 123456,
            "commentCount": 345,
            "hashtags": "#travel,#taiwan,#mountains,#vlog,#nature",
            "durationSeconds": 600
        }
    ])
}
