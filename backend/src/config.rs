#[cfg(feature = "http_source")]
use crate::services::record_source::HttpRecordSource;
use crate::services::record_source::{
    ElasticsearchRecordSource, JsonFileRecordSource, RecordSource, StaticRecordSource,
};
use crate::AppState;
use anyhow::{anyhow, Result};
use elasticsearch::{
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    Elasticsearch,
};
use env_logger::Builder;
use lazy_static::lazy_static;
use log::{info, LevelFilter};
use rocket::http::Method;
use rocket_cors::{AllowedHeaders, AllowedOrigins, CorsOptions};
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

lazy_static! {
    pub static ref RECORD_SOURCE: String =
        env::var("RECORD_SOURCE").unwrap_or_else(|_| "sample".to_string());
    pub static ref RECORDS_FILE: String =
        env::var("RECORDS_FILE").unwrap_or_else(|_| "data/records.json".to_string());
    pub static ref ELASTICSEARCH_URL: String =
        env::var("ELASTICSEARCH_URL").unwrap_or_else(|_| "http://localhost:9200".to_string());
    pub static ref RECORDS_INDEX: String =
        env::var("RECORDS_INDEX").unwrap_or_else(|_| "youtube_video_records".to_string());
    pub static ref SOURCE_TIMEOUT_SECS: u64 = env::var("SOURCE_TIMEOUT_SECS")
        .unwrap_or_else(|_| "30".to_string())
        .parse::<u64>()
        .unwrap_or(30);
    pub static ref ALLOWED_ORIGIN: String =
        env::var("ALLOWED_ORIGIN").unwrap_or_else(|_| "http://localhost:8080".to_string());
}

#[cfg(feature = "http_source")]
lazy_static! {
    pub static ref RECORDS_URL: Option<String> = env::var("RECORDS_URL").ok();
}

/// Which backend serves the record rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Sample,
    Json,
    Elasticsearch,
    Http,
}

impl FromStr for SourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sample" => Ok(SourceKind::Sample),
            "json" => Ok(SourceKind::Json),
            "elasticsearch" | "es" => Ok(SourceKind::Elasticsearch),
            "http" => Ok(SourceKind::Http),
            other => Err(anyhow!("Unknown RECORD_SOURCE '{other}'")),
        }
    }
}

pub fn init_logger() {
    Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();
    info!("Starting video analytics backend...");
}

pub fn load_environment() {
    dotenv::dotenv().ok();
}

pub fn source_timeout() -> Duration {
    Duration::from_secs(*SOURCE_TIMEOUT_SECS)
}

pub fn create_elasticsearch_client() -> Result<Elasticsearch> {
    let es_url = &*ELASTICSEARCH_URL;
    info!("Connecting to Elasticsearch at: {es_url}");

    let transport =
        TransportBuilder::new(SingleNodeConnectionPool::new(es_url.parse()?)).build()?;

    Ok(Elasticsearch::new(transport))
}

#[cfg(feature = "http_source")]
fn create_http_source(timeout: Duration) -> Result<Arc<dyn RecordSource>> {
    let url = RECORDS_URL
        .clone()
        .ok_or_else(|| anyhow!("RECORDS_URL must be set when RECORD_SOURCE=http"))?;
    Ok(Arc::new(HttpRecordSource::new(url, timeout)?))
}

#[cfg(not(feature = "http_source"))]
fn create_http_source(_timeout: Duration) -> Result<Arc<dyn RecordSource>> {
    Err(anyhow!(
        "RECORD_SOURCE=http needs the backend built with the `http_source` feature"
    ))
}

pub fn create_record_source(kind: SourceKind) -> Result<Arc<dyn RecordSource>> {
    let timeout = source_timeout();

    let source: Arc<dyn RecordSource> = match kind {
        SourceKind::Sample => Arc::new(StaticRecordSource::sample()),
        SourceKind::Json => Arc::new(JsonFileRecordSource::new(RECORDS_FILE.as_str(), timeout)),
        SourceKind::Elasticsearch => Arc::new(ElasticsearchRecordSource::new(
            create_elasticsearch_client()?,
            RECORDS_INDEX.as_str(),
            timeout,
        )),
        SourceKind::Http => create_http_source(timeout)?,
    };

    info!("Using record source '{}'.", source.name());
    Ok(source)
}

pub fn create_app_state() -> Result<AppState> {
    let kind = RECORD_SOURCE.parse::<SourceKind>()?;
    Ok(AppState {
        record_source: create_record_source(kind)?,
    })
}

pub fn create_cors() -> Result<rocket_cors::Cors> {
    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::some_exact(&[ALLOWED_ORIGIN.as_str()]))
        .allowed_methods(
            vec![Method::Get, Method::Post, Method::Options]
                .into_iter()
                .map(From::from)
                .collect(),
        )
        .allowed_headers(AllowedHeaders::some(&["Accept", "Content-Type"]))
        .to_cors()
        .map_err(|e| anyhow!("Failed to create CORS options: {}", e))?;

    Ok(cors)
}
