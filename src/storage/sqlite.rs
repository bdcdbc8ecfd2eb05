use std::path::Path;
use rusqlite::{Connection, OpenFlags};
use anyhow::{Result, Context};

use crate::config::QueryConfig;
use crate::models::metric::{MetricKind, Observation};
use crate::storage::{DataSource, DataSourceError};

/// Statistics database queried with one grouped-count statement per metric.
pub struct Database {
    connection: Connection,
    queries: QueryConfig,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("connection", &"<SQLite Connection>")
            .field("queries", &self.queries)
            .finish()
    }
}

impl Database {
    /// Opens an existing statistics database read-only.
    pub fn open(path: &Path, queries: QueryConfig) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("Statistics database not found at: {}", path.display());
        }

        let connection = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open database at: {}", path.display()))?;

        tracing::debug!(path = %path.display(), "Opened statistics database");
        Ok(Self { connection, queries })
    }

    pub fn from_connection(connection: Connection, queries: QueryConfig) -> Self {
        Self { connection, queries }
    }

    fn run_query(&self, sql: &str) -> Result<Vec<Observation>, DataSourceError> {
        let mut stmt = self.connection.prepare(sql)?;
        if stmt.column_count() < 2 {
            return Err(DataSourceError::InvalidRow(format!(
                "query must return (value, count) columns, got {}",
                stmt.column_count()
            )));
        }

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, Option<f64>>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut observations = Vec::new();
        for row in rows {
            let (value, count) = row?;
            // GROUP BY over a nullable column yields a NULL group
            let Some(value) = value else {
                tracing::debug!(count, "Skipping row with NULL value");
                continue;
            };
            let sample_count = u64::try_from(count).map_err(|_| {
                DataSourceError::InvalidRow(format!("negative sample count {} for value {}", count, value))
            })?;
            observations.push(Observation::new(value, sample_count));
        }

        Ok(observations)
    }
}

impl DataSource for Database {
    fn fetch(&self, metric: MetricKind) -> Result<Vec<Observation>, DataSourceError> {
        let sql = self.queries.get(metric);
        let observations = self.run_query(sql)?;
        tracing::debug!(metric = metric.key(), rows = observations.len(), "Fetched observations");
        Ok(observations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_test_database() -> Database {
        let connection = Connection::open_in_memory().unwrap();
        connection.execute_batch("
            CREATE TABLE sys_time_machine (cpu_usage REAL);
            CREATE TABLE sgastat (sga_alloc REAL);
            CREATE TABLE session_wait (time_waited INTEGER);

            INSERT INTO sys_time_machine VALUES (96), (96), (96), (96), (96), (96), (96), (96), (70), (70);
            INSERT INTO session_wait VALUES (4), (4), (NULL);
        ").unwrap();
        Database::from_connection(connection, QueryConfig::default())
    }

    #[test]
    fn test_fetch_grouped_counts() {
        let db = setup_test_database();
        let mut observations = db.fetch(MetricKind::CpuUtilization).unwrap();
        observations.sort_by(|a, b| a.value.total_cmp(&b.value));

        assert_eq!(observations, vec![Observation::new(70.0, 2), Observation::new(96.0, 8)]);
    }

    #[test]
    fn test_empty_table_returns_no_observations() {
        let db = setup_test_database();
        assert!(db.fetch(MetricKind::MemoryUsage).unwrap().is_empty());
    }

    #[test]
    fn test_integer_values_and_null_groups() {
        let db = setup_test_database();
        let observations = db.fetch(MetricKind::IoWaitTime).unwrap();
        assert_eq!(observations, vec![Observation::new(4.0, 2)]);
    }

    #[test]
    fn test_negative_count_rejected() {
        let connection = Connection::open_in_memory().unwrap();
        let queries = QueryConfig {
            cpu_utilization: "SELECT 50.0, -3".to_string(),
            ..QueryConfig::default()
        };
        let db = Database::from_connection(connection, queries);
        let err = db.fetch(MetricKind::CpuUtilization).unwrap_err();
        assert!(matches!(err, DataSourceError::InvalidRow(_)));
    }

    #[test]
    fn test_missing_table_is_query_error() {
        let connection = Connection::open_in_memory().unwrap();
        let db = Database::from_connection(connection, QueryConfig::default());
        let err = db.fetch(MetricKind::MemoryUsage).unwrap_err();
        assert!(matches!(err, DataSourceError::Query(_)));
    }

    #[test]
    fn test_single_column_query_rejected() {
        let connection = Connection::open_in_memory().unwrap();
        let queries = QueryConfig {
            io_wait_time: "SELECT 1".to_string(),
            ..QueryConfig::default()
        };
        let db = Database::from_connection(connection, queries);
        assert!(matches!(
            db.fetch(MetricKind::IoWaitTime),
            Err(DataSourceError::InvalidRow(_))
        ));
    }

    #[test]
    fn test_open_missing_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let result = Database::open(&temp_dir.path().join("absent.db"), QueryConfig::default());
        assert!(result.is_err());
    }
}
