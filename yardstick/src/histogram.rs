use parking_lot::Mutex;
use quanta::Clock;

use crate::{
    common::BuildError,
    handles::HistogramFn,
    sample::{new_sample, Sample, SampleKind},
    HistogramSnapshot,
};

/// A histogram backed by a [`Sample`].
///
/// Every operation holds the sample's lock for its whole duration, so concurrent updates never
/// lose values and snapshots always see a consistent count and set of retained values.
pub struct SampledHistogram {
    sample: Mutex<Box<dyn Sample>>,
}

impl SampledHistogram {
    /// Creates a new `SampledHistogram` over the given sample.
    pub fn new(sample: Box<dyn Sample>) -> SampledHistogram {
        SampledHistogram { sample: Mutex::new(sample) }
    }

    /// Creates a new `SampledHistogram` over a sample of the given kind.
    ///
    /// # Errors
    ///
    /// If the sample parameters are invalid, an error is returned.
    pub fn with_kind(
        kind: SampleKind,
        reservoir_size: usize,
        clock: Clock,
    ) -> Result<SampledHistogram, BuildError> {
        Ok(SampledHistogram::new(new_sample(kind, reservoir_size, clock)?))
    }

    /// Creates a new `SampledHistogram` over a uniform sample.
    ///
    /// # Errors
    ///
    /// If `reservoir_size` is zero, an error is returned.
    pub fn uniform(reservoir_size: usize) -> Result<SampledHistogram, BuildError> {
        SampledHistogram::with_kind(SampleKind::Uniform, reservoir_size, Clock::new())
    }
}

impl HistogramFn for SampledHistogram {
    fn update(&self, value: f64) {
        self.sample.lock().update(value);
    }

    fn clear(&self) {
        self.sample.lock().clear();
    }

    fn count(&self) -> u64 {
        self.sample.lock().count()
    }

    fn values(&self) -> Vec<f64> {
        self.sample.lock().values()
    }

    fn snapshot(&self) -> HistogramSnapshot {
        self.sample.lock().snapshot()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_delegates_to_sample() {
        let histogram = SampledHistogram::uniform(1028).unwrap();
        for value in [10.0, 20.0, 30.0, 40.0, 50.0] {
            histogram.update(value);
        }

        let snapshot = histogram.snapshot();
        assert_eq!(snapshot.count, 5);
        assert_eq!(snapshot.min, 10.0);
        assert_eq!(snapshot.max, 50.0);
        assert_eq!(snapshot.mean, 30.0);
        assert_eq!(snapshot.sum, 150.0);
        assert_eq!(snapshot.percentile.median, 30.0);

        histogram.clear();
        assert_eq!(histogram.count(), 0);
        assert_eq!(histogram.snapshot(), HistogramSnapshot::default());
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        let histogram = Arc::new(SampledHistogram::uniform(64).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let histogram = Arc::clone(&histogram);
                std::thread::spawn(move || {
                    for value in 0..1000 {
                        histogram.update(f64::from(value));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(histogram.count(), 4000);
        assert_eq!(histogram.values().len(), 64);
    }
}
