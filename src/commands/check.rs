use anyhow::{Context, Result};

use crate::alerts::thresholds::ThresholdEvaluator;
use crate::commands::build_notifier;
use crate::config::Config;
use crate::monitor::{CycleReport, Monitor};
use crate::output::OutputFormat;
use crate::storage::Database;

pub fn handle_check_command(config: &Config, dry_run: bool, json_output: bool) -> Result<CycleReport> {
    let evaluator = ThresholdEvaluator::new(config.thresholds, config.server.name.clone())
        .context("Invalid thresholds")?;
    let notifier = build_notifier(config, dry_run)?;

    let db_path = config.server.resolved_database_path()?;
    let database = Database::open(&db_path, config.queries.clone())?;

    let report = Monitor::new(database, evaluator, notifier).run_cycle();

    if json_output {
        println!("{}", report.to_json().context("Failed to serialize report to JSON")?);
    } else {
        println!("{}", report.to_table());
    }

    Ok(report)
}
