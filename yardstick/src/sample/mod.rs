//! Bounded reservoirs over unbounded streams of values.
use quanta::Clock;

use crate::{
    common::{validate_alpha, BuildError, DEFAULT_ALPHA},
    stats, HistogramSnapshot,
};

mod decaying;
pub use self::decaying::ExponentiallyDecayingSample;

mod uniform;
pub use self::uniform::UniformSample;

/// A statistically representative subset of a stream of values.
///
/// Implementations hold at most a fixed number of values, no matter how many values have been
/// observed, and derive their statistics from whichever values are currently retained.
pub trait Sample: Send {
    /// Observes a value.
    fn update(&mut self, value: f64);

    /// Discards all retained values and resets the observation count.
    fn clear(&mut self);

    /// Gets the number of values currently retained.
    fn size(&self) -> usize;

    /// Gets the number of values observed since creation or the last clear.
    ///
    /// This may be larger than [`size`](Sample::size).
    fn count(&self) -> u64;

    /// Gets a copy of the retained values, in no particular order.
    fn values(&self) -> Vec<f64>;

    /// Gets the value at the given quantile of the retained values.
    fn percentile(&self, quantile: f64) -> f64 {
        stats::percentile(&self.values(), quantile)
    }

    /// Computes a snapshot of the retained values.
    fn snapshot(&self) -> HistogramSnapshot {
        HistogramSnapshot::from_values(self.count(), &self.values())
    }
}

/// Sampling strategy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SampleKind {
    /// Every observed value has an equal chance of being retained.
    ///
    /// See [`UniformSample`].
    Uniform,

    /// Recent values are more likely to be retained than older ones.
    ///
    /// See [`ExponentiallyDecayingSample`].
    ExponentiallyDecaying {
        /// Decay factor.  Larger values forget older values faster.
        alpha: f64,
    },
}

impl SampleKind {
    /// Exponentially-decaying sampling with the default decay factor.
    pub const fn decaying() -> SampleKind {
        SampleKind::ExponentiallyDecaying { alpha: DEFAULT_ALPHA }
    }

    pub(crate) fn validate(self) -> Result<SampleKind, BuildError> {
        if let SampleKind::ExponentiallyDecaying { alpha } = self {
            validate_alpha(alpha)?;
        }

        Ok(self)
    }
}

impl Default for SampleKind {
    fn default() -> Self {
        SampleKind::decaying()
    }
}

/// Creates a new sample of the given kind retaining at most `reservoir_size` values.
///
/// `clock` is only consulted by time-aware samples.
///
/// # Errors
///
/// If `reservoir_size` is zero, or the decay factor is not finite and positive, an error is returned.
pub fn new_sample(
    kind: SampleKind,
    reservoir_size: usize,
    clock: Clock,
) -> Result<Box<dyn Sample>, BuildError> {
    match kind.validate()? {
        SampleKind::Uniform => Ok(Box::new(UniformSample::new(reservoir_size)?)),
        SampleKind::ExponentiallyDecaying { alpha } => {
            Ok(Box::new(ExponentiallyDecayingSample::new(reservoir_size, alpha, clock)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sample_validates() {
        let clock = Clock::new();
        assert_eq!(
            new_sample(SampleKind::Uniform, 0, clock.clone()).err(),
            Some(BuildError::InvalidReservoirSize)
        );
        assert_eq!(
            new_sample(SampleKind::ExponentiallyDecaying { alpha: -0.5 }, 10, clock.clone()).err(),
            Some(BuildError::InvalidAlpha(-0.5))
        );
        assert!(new_sample(SampleKind::decaying(), 10, clock).is_ok());
    }

    #[test]
    fn test_new_sample_kinds() {
        let clock = Clock::new();
        for kind in [SampleKind::Uniform, SampleKind::default()] {
            let mut sample = new_sample(kind, 3, clock.clone()).unwrap();
            for value in 1..=10 {
                sample.update(f64::from(value));
            }
            assert_eq!(sample.size(), 3);
            assert_eq!(sample.count(), 10);

            let snapshot = sample.snapshot();
            assert_eq!(snapshot.count, 10);
            assert!(snapshot.min >= 1.0 && snapshot.max <= 10.0);
        }
    }
}
