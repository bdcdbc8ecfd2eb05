use tabled::{Table, Tabled};
use serde::Serialize;

use crate::alerts::thresholds::{format_exceeding, format_value};
use crate::models::metric::MetricKind;
use crate::monitor::{CycleReport, MetricStatus};

/// Trait for items that can be displayed as tables or JSON
pub trait OutputFormat {
    fn to_table(&self) -> String;
    fn to_json(&self) -> Result<String, serde_json::Error>;
}

/// Row for the per-metric summary table
#[derive(Tabled, Serialize, Debug)]
pub struct MetricRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Samples")]
    pub samples: String,
    #[tabled(rename = "Average")]
    pub average: String,
    #[tabled(rename = "Threshold")]
    pub threshold: String,
    #[tabled(rename = "Status")]
    pub status: String,
}

/// Row for the alert delivery table
#[derive(Tabled, Serialize, Debug)]
pub struct DeliveryRow {
    #[tabled(rename = "Alert")]
    pub subject: String,
    #[tabled(rename = "Message")]
    pub body: String,
    #[tabled(rename = "Delivery")]
    pub delivery: String,
}

impl MetricRow {
    pub fn new(metric: MetricKind, status: &MetricStatus) -> Self {
        let suffix = metric.unit().suffix();
        match status {
            MetricStatus::Evaluated { samples, average, threshold, breached } => Self {
                metric: metric.label().to_string(),
                samples: format_number(*samples),
                average: if *breached {
                    format!("{}{}", format_exceeding(*average, *threshold), suffix)
                } else {
                    format!("{}{}", format_value(*average), suffix)
                },
                threshold: format!("{}{}", format_value(*threshold), suffix),
                status: if *breached { "ALERT".to_string() } else { "OK".to_string() },
            },
            MetricStatus::Skipped { reason } => Self {
                metric: metric.label().to_string(),
                samples: "-".to_string(),
                average: "-".to_string(),
                threshold: "-".to_string(),
                status: format!("Skipped: {}", reason),
            },
        }
    }
}

impl OutputFormat for CycleReport {
    fn to_table(&self) -> String {
        let mut output = format!(
            "{} (checked {})\n",
            self.server_name,
            self.checked_at.format("%Y-%m-%d %H:%M:%S UTC")
        );

        let rows: Vec<MetricRow> = self
            .metrics
            .iter()
            .map(|m| MetricRow::new(m.metric, &m.status))
            .collect();
        output.push_str(&Table::new(rows).to_string());

        if !self.deliveries.is_empty() {
            let rows: Vec<DeliveryRow> = self
                .deliveries
                .iter()
                .map(|d| DeliveryRow {
                    subject: d.alert.subject.clone(),
                    body: d.alert.body.clone(),
                    delivery: match &d.error {
                        None => "Sent".to_string(),
                        Some(e) => format!("Failed: {}", e),
                    },
                })
                .collect();
            output.push('\n');
            output.push_str(&Table::new(rows).to_string());
        }

        output
    }

    fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Format a number with commas for thousands separator
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::new();

    for (i, ch) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(*ch);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::system::DeliveryOutcome;
    use crate::alerts::thresholds::AlertEvent;
    use crate::monitor::MetricOutcome;
    use chrono::Utc;

    fn sample_report() -> CycleReport {
        let alert = AlertEvent::new(MetricKind::CpuUtilization, "db-01", 90.8, 90.0);
        CycleReport {
            server_name: "db-01".to_string(),
            checked_at: Utc::now(),
            metrics: vec![
                MetricOutcome {
                    metric: MetricKind::CpuUtilization,
                    status: MetricStatus::Evaluated {
                        samples: 1200,
                        average: 90.8,
                        threshold: 90.0,
                        breached: true,
                    },
                },
                MetricOutcome {
                    metric: MetricKind::MemoryUsage,
                    status: MetricStatus::Skipped {
                        reason: "dataset has no samples to average".to_string(),
                    },
                },
            ],
            deliveries: vec![DeliveryOutcome {
                alert,
                delivered: false,
                error: Some("SMTP transport error: connection refused".to_string()),
            }],
        }
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(123), "123");
        assert_eq!(format_number(1234), "1,234");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_metric_row() {
        let row = MetricRow::new(
            MetricKind::IoWaitTime,
            &MetricStatus::Evaluated { samples: 10, average: 4.5, threshold: 10.0, breached: false },
        );
        assert_eq!(row.metric, "I/O wait time");
        assert_eq!(row.average, "4.5ms");
        assert_eq!(row.threshold, "10ms");
        assert_eq!(row.status, "OK");
    }

    #[test]
    fn test_breached_row_keeps_precision() {
        let row = MetricRow::new(
            MetricKind::CpuUtilization,
            &MetricStatus::Evaluated { samples: 3, average: 90.004, threshold: 90.0, breached: true },
        );
        assert_eq!(row.average, "90.004%");
        assert_eq!(row.threshold, "90%");
        assert_eq!(row.status, "ALERT");
    }

    #[test]
    fn test_report_table() {
        let table = sample_report().to_table();
        assert!(table.contains("CPU utilization"));
        assert!(table.contains("90.8%"));
        assert!(table.contains("ALERT"));
        assert!(table.contains("Skipped: dataset has no samples to average"));
        assert!(table.contains("Failed: SMTP transport error"));
    }

    #[test]
    fn test_report_json() {
        let json = sample_report().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["server_name"], "db-01");
        assert_eq!(value["metrics"][0]["metric"], "cpu_utilization");
        assert_eq!(value["metrics"][0]["status"], "evaluated");
        assert_eq!(value["metrics"][1]["status"], "skipped");
        assert_eq!(value["deliveries"][0]["delivered"], false);
        assert_eq!(value["deliveries"][0]["alert"]["body"], "CPU utilization is at 90.8%");
    }
}
