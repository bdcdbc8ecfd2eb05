use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::models::metric::{MetricAverages, MetricKind};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub cpu_utilization_threshold: f64, // percent
    pub memory_usage_threshold: f64,    // percent
    pub io_wait_time_threshold: f64,    // milliseconds
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cpu_utilization_threshold: 90.0,
            memory_usage_threshold: 80.0,
            io_wait_time_threshold: 10.0,
        }
    }
}

impl Thresholds {
    pub fn new(cpu_utilization: f64, memory_usage: f64, io_wait_time: f64) -> Result<Self, ConfigError> {
        let thresholds = Self {
            cpu_utilization_threshold: cpu_utilization,
            memory_usage_threshold: memory_usage,
            io_wait_time_threshold: io_wait_time,
        };
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn get(&self, metric: MetricKind) -> f64 {
        match metric {
            MetricKind::CpuUtilization => self.cpu_utilization_threshold,
            MetricKind::MemoryUsage => self.memory_usage_threshold,
            MetricKind::IoWaitTime => self.io_wait_time_threshold,
        }
    }

    pub fn set(&mut self, metric: MetricKind, value: f64) -> Result<(), ConfigError> {
        check_threshold(metric, value)?;
        match metric {
            MetricKind::CpuUtilization => self.cpu_utilization_threshold = value,
            MetricKind::MemoryUsage => self.memory_usage_threshold = value,
            MetricKind::IoWaitTime => self.io_wait_time_threshold = value,
        }
        Ok(())
    }

    /// Every threshold must be a finite, non-negative number.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for metric in MetricKind::ALL {
            check_threshold(metric, self.get(metric))?;
        }
        Ok(())
    }
}

fn check_threshold(metric: MetricKind, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidThreshold {
            name: format!("{}_threshold", metric.key()),
            value: value.to_string(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertEvent {
    pub metric: MetricKind,
    pub subject: String,
    pub body: String,
}

impl AlertEvent {
    /// `threshold` is the limit `value` exceeded; the body always shows a
    /// number above it.
    pub fn new(metric: MetricKind, server_name: &str, value: f64, threshold: f64) -> Self {
        let subject = format!("{} is high on {}", metric.label(), server_name);
        let verb = match metric {
            MetricKind::IoWaitTime => "is",
            _ => "is at",
        };
        let body = format!(
            "{} {} {}{}",
            metric.label(),
            verb,
            format_exceeding(value, threshold),
            metric.unit().suffix()
        );
        Self { metric, subject, body }
    }
}

pub struct ThresholdEvaluator {
    thresholds: Thresholds,
    server_name: String,
}

impl ThresholdEvaluator {
    pub fn new(thresholds: Thresholds, server_name: impl Into<String>) -> Result<Self, ConfigError> {
        thresholds.validate()?;
        Ok(Self {
            thresholds,
            server_name: server_name.into(),
        })
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    pub fn is_breached(&self, metric: MetricKind, average: f64) -> bool {
        average > self.thresholds.get(metric)
    }

    /// One alert per metric whose average strictly exceeds its threshold,
    /// in cpu, memory, io_wait order. Skipped metrics never alert.
    pub fn evaluate(&self, averages: &MetricAverages) -> Vec<AlertEvent> {
        MetricKind::ALL
            .iter()
            .filter_map(|&metric| {
                let average = averages.get(metric)?;
                self.is_breached(metric, average)
                    .then(|| AlertEvent::new(metric, &self.server_name, average, self.thresholds.get(metric)))
            })
            .collect()
    }
}

/// Round to two decimals and drop trailing zeros: 90.80 -> "90.8", 91.00 -> "91".
pub fn format_value(value: f64) -> String {
    format_with_precision(value, 2)
}

/// Like [`format_value`], but adds decimals until the text reads above
/// `threshold`: 90.004 against 90 -> "90.004", not "90".
pub fn format_exceeding(value: f64, threshold: f64) -> String {
    for precision in 2..=17 {
        let text = format_with_precision(value, precision);
        if text.parse::<f64>().is_ok_and(|shown| shown > threshold) {
            return text;
        }
    }
    value.to_string()
}

fn format_with_precision(value: f64, precision: usize) -> String {
    let formatted = format!("{:.*}", precision, value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
