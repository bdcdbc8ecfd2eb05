use serde::Serialize;

use crate::alerts::{
    notifications::Notifier,
    thresholds::{AlertEvent, ThresholdEvaluator},
};
use crate::models::metric::MetricAverages;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryOutcome {
    pub alert: AlertEvent,
    pub delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct AlertSystem<N> {
    evaluator: ThresholdEvaluator,
    notifier: N,
}

impl<N: Notifier> AlertSystem<N> {
    pub fn new(evaluator: ThresholdEvaluator, notifier: N) -> Self {
        Self { evaluator, notifier }
    }

    pub fn evaluator(&self) -> &ThresholdEvaluator {
        &self.evaluator
    }

    pub fn check_thresholds(&self, averages: &MetricAverages) -> Vec<AlertEvent> {
        self.evaluator.evaluate(averages)
    }

    /// Attempts every alert once. A failed delivery is logged and recorded,
    /// and never stops the remaining alerts from being sent.
    pub fn send_notifications(&self, alerts: Vec<AlertEvent>) -> Vec<DeliveryOutcome> {
        alerts
            .into_iter()
            .map(|alert| match self.notifier.send(&alert.subject, &alert.body) {
                Ok(()) => DeliveryOutcome {
                    alert,
                    delivered: true,
                    error: None,
                },
                Err(e) => {
                    tracing::error!(metric = alert.metric.key(), subject = %alert.subject, error = %e, "Failed to deliver alert");
                    DeliveryOutcome {
                        alert,
                        delivered: false,
                        error: Some(e.to_string()),
                    }
                }
            })
            .collect()
    }

    pub fn process(&self, averages: &MetricAverages) -> Vec<DeliveryOutcome> {
        let alerts = self.check_thresholds(averages);
        if alerts.is_empty() {
            tracing::info!(server = self.evaluator.server_name(), "All metrics within thresholds");
        }
        self.send_notifications(alerts)
    }
}
