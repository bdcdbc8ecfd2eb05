use std::cell::RefCell;
use std::path::Path;

use dbprobe::alerts::{Notifier, NotifyError, ThresholdEvaluator};
use dbprobe::config::Config;
use dbprobe::models::MetricKind;
use dbprobe::monitor::{Monitor, MetricStatus};
use dbprobe::storage::Database;
use rusqlite::Connection;
use tempfile::TempDir;

/// End-to-end cycle against a statistics database on disk, using the
/// default queries from the configuration.

#[derive(Default)]
struct RecordingNotifier {
    subjects: RefCell<Vec<String>>,
}

impl Notifier for RecordingNotifier {
    fn send(&self, subject: &str, _body: &str) -> Result<(), NotifyError> {
        self.subjects.borrow_mut().push(subject.to_string());
        Ok(())
    }
}

fn create_stats_db(path: &Path) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch("
        CREATE TABLE sys_time_machine (cpu_usage REAL);
        CREATE TABLE sgastat (sga_alloc REAL);
        CREATE TABLE session_wait (time_waited INTEGER);
    ").unwrap();

    for _ in 0..8 {
        conn.execute("INSERT INTO sys_time_machine VALUES (96.0)", []).unwrap();
    }
    for _ in 0..2 {
        conn.execute("INSERT INTO sys_time_machine VALUES (70.0)", []).unwrap();
    }
    for value in [12, 14, 3] {
        conn.execute("INSERT INTO session_wait VALUES (?1)", [value]).unwrap();
    }
}

#[test]
fn test_cycle_against_sqlite_file() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("stats.db");
    create_stats_db(&db_path);

    let mut config = Config::default();
    config.server.name = "db-01".to_string();
    config.server.database_path = db_path.display().to_string();

    let database = Database::open(&config.server.resolved_database_path().unwrap(), config.queries.clone()).unwrap();
    let evaluator = ThresholdEvaluator::new(config.thresholds, config.server.name.clone()).unwrap();
    let notifier = RecordingNotifier::default();

    let report = Monitor::new(database, evaluator, &notifier).run_cycle();

    // CPU: (96*8 + 70*2) / 10 = 90.8 > 90
    match &report.metrics[0].status {
        MetricStatus::Evaluated { samples, average, breached, .. } => {
            assert_eq!(*samples, 10);
            assert!((average - 90.8).abs() < 1e-9);
            assert!(*breached);
        }
        other => panic!("unexpected status: {:?}", other),
    }

    // Memory table is empty
    assert_eq!(report.metrics[1].metric, MetricKind::MemoryUsage);
    assert!(matches!(report.metrics[1].status, MetricStatus::Skipped { .. }));

    // I/O wait: (12 + 14 + 3) / 3 = 9.67 <= 10
    assert!(matches!(report.metrics[2].status, MetricStatus::Evaluated { breached: false, .. }));

    assert_eq!(*notifier.subjects.borrow(), vec!["CPU utilization is high on db-01".to_string()]);
}

#[test]
fn test_custom_queries() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("custom.db");
    let conn = Connection::open(&db_path).unwrap();
    conn.execute_batch("
        CREATE TABLE samples (metric TEXT, value REAL, hits INTEGER);
        INSERT INTO samples VALUES ('mem', 82.0, 3), ('mem', 90.0, 1);
    ").unwrap();
    drop(conn);

    let mut config = Config::default();
    config.set_value("queries.memory_usage", "SELECT value, hits FROM samples WHERE metric = 'mem'").unwrap();

    let database = Database::open(&db_path, config.queries.clone()).unwrap();
    let evaluator = ThresholdEvaluator::new(config.thresholds, "db-02").unwrap();
    let notifier = RecordingNotifier::default();
    let report = Monitor::new(database, evaluator, &notifier).run_cycle();

    // (82*3 + 90) / 4 = 84 > 80
    assert!(matches!(
        report.metrics[1].status,
        MetricStatus::Evaluated { samples: 4, breached: true, .. }
    ));
    // Default queries reference tables that don't exist here
    assert_eq!(report.skipped().count(), 2);
    assert_eq!(notifier.subjects.borrow().len(), 1);
}
