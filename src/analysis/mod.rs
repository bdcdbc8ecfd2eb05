// Analysis module
pub mod aggregate;

pub use aggregate::{total_samples, weighted_average, StatsError};
