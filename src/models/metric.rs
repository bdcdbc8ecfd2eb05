use serde::{Deserialize, Serialize};
use std::fmt;

use crate::analysis::aggregate::{total_samples, weighted_average, StatsError};

/// `sample_count` occurrences measured at `value`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub value: f64,
    pub sample_count: u64,
}

impl Observation {
    pub fn new(value: f64, sample_count: u64) -> Self {
        Self { value, sample_count }
    }
}

impl From<(f64, u64)> for Observation {
    fn from((value, sample_count): (f64, u64)) -> Self {
        Self::new(value, sample_count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricUnit {
    Percent,
    Milliseconds,
}

impl MetricUnit {
    pub fn suffix(&self) -> &'static str {
        match self {
            MetricUnit::Percent => "%",
            MetricUnit::Milliseconds => "ms",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    CpuUtilization,
    MemoryUsage,
    IoWaitTime,
}

impl MetricKind {
    /// Evaluation order. Alerts are always emitted in this order.
    pub const ALL: [MetricKind; 3] = [
        MetricKind::CpuUtilization,
        MetricKind::MemoryUsage,
        MetricKind::IoWaitTime,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            MetricKind::CpuUtilization => "cpu_utilization",
            MetricKind::MemoryUsage => "memory_usage",
            MetricKind::IoWaitTime => "io_wait_time",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MetricKind::CpuUtilization => "CPU utilization",
            MetricKind::MemoryUsage => "Memory usage",
            MetricKind::IoWaitTime => "I/O wait time",
        }
    }

    pub fn unit(&self) -> MetricUnit {
        match self {
            MetricKind::CpuUtilization | MetricKind::MemoryUsage => MetricUnit::Percent,
            MetricKind::IoWaitTime => MetricUnit::Milliseconds,
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw observations for one metric, collected fresh for a single cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSnapshot {
    pub metric: MetricKind,
    pub observations: Vec<Observation>,
}

impl MetricSnapshot {
    pub fn new(metric: MetricKind, observations: Vec<Observation>) -> Self {
        Self { metric, observations }
    }

    pub fn total_samples(&self) -> Result<u64, StatsError> {
        total_samples(&self.observations)
    }

    pub fn average(&self) -> Result<f64, StatsError> {
        weighted_average(&self.observations)
    }
}

/// Per-metric averages for one cycle. `None` marks a metric skipped this cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MetricAverages {
    pub cpu_utilization: Option<f64>,
    pub memory_usage: Option<f64>,
    pub io_wait_time: Option<f64>,
}

impl MetricAverages {
    pub fn new(cpu_utilization: f64, memory_usage: f64, io_wait_time: f64) -> Self {
        Self {
            cpu_utilization: Some(cpu_utilization),
            memory_usage: Some(memory_usage),
            io_wait_time: Some(io_wait_time),
        }
    }

    pub fn get(&self, metric: MetricKind) -> Option<f64> {
        match metric {
            MetricKind::CpuUtilization => self.cpu_utilization,
            MetricKind::MemoryUsage => self.memory_usage,
            MetricKind::IoWaitTime => self.io_wait_time,
        }
    }

    pub fn set(&mut self, metric: MetricKind, average: Option<f64>) {
        match metric {
            MetricKind::CpuUtilization => self.cpu_utilization = average,
            MetricKind::MemoryUsage => self.memory_usage = average,
            MetricKind::IoWaitTime => self.io_wait_time = average,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_order() {
        assert_eq!(
            MetricKind::ALL,
            [MetricKind::CpuUtilization, MetricKind::MemoryUsage, MetricKind::IoWaitTime]
        );
    }

    #[test]
    fn test_metric_units() {
        assert_eq!(MetricKind::CpuUtilization.unit().suffix(), "%");
        assert_eq!(MetricKind::MemoryUsage.unit().suffix(), "%");
        assert_eq!(MetricKind::IoWaitTime.unit().suffix(), "ms");
    }

    #[test]
    fn test_snapshot_totals() {
        let snapshot = MetricSnapshot::new(
            MetricKind::CpuUtilization,
            vec![Observation::new(70.0, 10), Observation::new(95.0, 5)],
        );
        assert_eq!(snapshot.total_samples(), Ok(15));
        let average = snapshot.average().unwrap();
        assert!((average - 78.333_333).abs() < 1e-3);
    }

    #[test]
    fn test_snapshot_sample_overflow() {
        let huge = i64::MAX as u64;
        let snapshot = MetricSnapshot::new(
            MetricKind::MemoryUsage,
            vec![Observation::new(50.0, huge), Observation::new(50.0, huge), Observation::new(50.0, huge)],
        );
        assert_eq!(snapshot.total_samples(), Err(StatsError::SampleCountOverflow));
        assert_eq!(snapshot.average(), Err(StatsError::SampleCountOverflow));
    }

    #[test]
    fn test_averages_get_set() {
        let mut averages = MetricAverages::default();
        assert_eq!(averages.get(MetricKind::MemoryUsage), None);

        averages.set(MetricKind::MemoryUsage, Some(42.0));
        assert_eq!(averages.get(MetricKind::MemoryUsage), Some(42.0));
        assert_eq!(averages.get(MetricKind::CpuUtilization), None);
    }
}
