pub mod dashboard;
pub mod query;

pub use dashboard::*;
pub use query::*;
