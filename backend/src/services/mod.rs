pub mod aggregation_service;
pub mod dashboard_service;
pub mod filter_service;
pub mod pagination;
pub mod query_service;
pub mod record_source;
pub mod sort_service;
