//! One monitoring cycle: fetch observations, average them, evaluate the
//! thresholds, and hand every breach to the notifier.
//!
//! Failures are contained per metric. A metric whose query fails or whose
//! observations carry no samples is logged and skipped, and the remaining
//! metrics are still evaluated.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::alerts::notifications::Notifier;
use crate::alerts::system::{AlertSystem, DeliveryOutcome};
use crate::alerts::thresholds::ThresholdEvaluator;
use crate::models::metric::{MetricAverages, MetricKind, MetricSnapshot};
use crate::storage::DataSource;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MetricStatus {
    Evaluated {
        samples: u64,
        average: f64,
        threshold: f64,
        breached: bool,
    },
    Skipped {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricOutcome {
    pub metric: MetricKind,
    #[serde(flatten)]
    pub status: MetricStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub server_name: String,
    pub checked_at: DateTime<Utc>,
    pub metrics: Vec<MetricOutcome>,
    pub deliveries: Vec<DeliveryOutcome>,
}

impl CycleReport {
    pub fn averages(&self) -> MetricAverages {
        let mut averages = MetricAverages::default();
        for outcome in &self.metrics {
            if let MetricStatus::Evaluated { average, .. } = outcome.status {
                averages.set(outcome.metric, Some(average));
            }
        }
        averages
    }

    pub fn skipped(&self) -> impl Iterator<Item = &MetricOutcome> {
        self.metrics
            .iter()
            .filter(|m| matches!(m.status, MetricStatus::Skipped { .. }))
    }

    pub fn failed_deliveries(&self) -> impl Iterator<Item = &DeliveryOutcome> {
        self.deliveries.iter().filter(|d| !d.delivered)
    }

    pub fn has_failed_deliveries(&self) -> bool {
        self.failed_deliveries().next().is_some()
    }
}

pub struct Monitor<D, N> {
    source: D,
    alerts: AlertSystem<N>,
}

impl<D: DataSource, N: Notifier> Monitor<D, N> {
    pub fn new(source: D, evaluator: ThresholdEvaluator, notifier: N) -> Self {
        Self {
            source,
            alerts: AlertSystem::new(evaluator, notifier),
        }
    }

    fn evaluate_metric(&self, metric: MetricKind) -> MetricStatus {
        let observations = match self.source.fetch(metric) {
            Ok(observations) => observations,
            Err(e) => {
                tracing::error!(metric = metric.key(), error = %e, "Failed to fetch observations, skipping metric");
                return MetricStatus::Skipped {
                    reason: e.to_string(),
                };
            }
        };

        let snapshot = MetricSnapshot::new(metric, observations);
        let stats = snapshot
            .total_samples()
            .and_then(|samples| Ok((samples, snapshot.average()?)));
        match stats {
            Ok((samples, average)) => {
                let evaluator = self.alerts.evaluator();
                tracing::debug!(metric = metric.key(), samples, average, "Computed average");
                MetricStatus::Evaluated {
                    samples,
                    average,
                    threshold: evaluator.thresholds().get(metric),
                    breached: evaluator.is_breached(metric, average),
                }
            }
            Err(e) => {
                tracing::warn!(metric = metric.key(), error = %e, "Cannot average metric, skipping");
                MetricStatus::Skipped {
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn run_cycle(&self) -> CycleReport {
        let server_name = self.alerts.evaluator().server_name().to_string();
        tracing::info!(server = %server_name, "Starting monitoring cycle");

        let metrics: Vec<MetricOutcome> = MetricKind::ALL
            .iter()
            .map(|&metric| MetricOutcome {
                metric,
                status: self.evaluate_metric(metric),
            })
            .collect();

        let mut report = CycleReport {
            server_name,
            checked_at: Utc::now(),
            metrics,
            deliveries: Vec::new(),
        };
        report.deliveries = self.alerts.process(&report.averages());

        tracing::info!(
            alerts = report.deliveries.len(),
            failed = report.failed_deliveries().count(),
            skipped = report.skipped().count(),
            "Monitoring cycle complete"
        );
        report
    }
}
