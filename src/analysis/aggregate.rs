use crate::models::metric::Observation;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    /// No observations, or every observation carries a zero sample count.
    #[error("dataset has no samples to average")]
    EmptyDataset,

    #[error("observation value {0} is not a finite number")]
    NonFiniteValue(f64),

    #[error("total sample count exceeds {}", u64::MAX)]
    SampleCountOverflow,
}

/// Sum of all sample counts, failing instead of wrapping on overflow.
pub fn total_samples(observations: &[Observation]) -> Result<u64, StatsError> {
    observations.iter().try_fold(0u64, |total, observation| {
        total
            .checked_add(observation.sample_count)
            .ok_or(StatsError::SampleCountOverflow)
    })
}

/// Weighted mean of the observations: `sum(value * count) / sum(count)`.
///
/// Observations with a zero sample count contribute nothing and are not
/// checked for finiteness. When the direct sum overflows `f64`, the mean is
/// recomputed as a running convex combination, which stays within the
/// observed range.
pub fn weighted_average(observations: &[Observation]) -> Result<f64, StatsError> {
    let counted: Vec<&Observation> = observations.iter().filter(|o| o.sample_count > 0).collect();

    if let Some(bad) = counted.iter().find(|o| !o.value.is_finite()) {
        return Err(StatsError::NonFiniteValue(bad.value));
    }

    let total = total_samples(observations)?;
    if total == 0 {
        return Err(StatsError::EmptyDataset);
    }

    let weighted_sum: f64 = counted
        .iter()
        .map(|o| o.value * o.sample_count as f64)
        .sum();
    let average = weighted_sum / total as f64;
    if average.is_finite() {
        return Ok(average);
    }

    let mut mean = 0.0;
    let mut running: u64 = 0;
    for observation in counted {
        running += observation.sample_count; // bounded by `total`
        let weight = observation.sample_count as f64 / running as f64;
        mean = mean * (1.0 - weight) + observation.value * weight;
    }

    if !mean.is_finite() {
        return Err(StatsError::NonFiniteValue(mean));
    }
    Ok(mean)
}
