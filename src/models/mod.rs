// Models module
pub mod metric;

pub use metric::{MetricAverages, MetricKind, MetricSnapshot, MetricUnit, Observation};
