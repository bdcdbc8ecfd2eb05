// Data source module
pub mod sqlite;

use thiserror::Error;

use crate::models::metric::{MetricKind, Observation};

// Re-export key types for easier access
pub use sqlite::Database;

#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("query failed: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("invalid row: {0}")]
    InvalidRow(String),
}

/// Supplies the raw (value, count) observations for each metric.
pub trait DataSource {
    fn fetch(&self, metric: MetricKind) -> Result<Vec<Observation>, DataSourceError>;
}

impl<D: DataSource + ?Sized> DataSource for &D {
    fn fetch(&self, metric: MetricKind) -> Result<Vec<Observation>, DataSourceError> {
        (**self).fetch(metric)
    }
}
