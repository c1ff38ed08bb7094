use std::time::Duration;

use quanta::{Clock, Instant};

use crate::{
    common::BuildError,
    handles::{HistogramFn, MeterFn, TimerFn},
    histogram::SampledHistogram,
    meter::EwmaMeter,
    sample::{ExponentiallyDecayingSample, Sample},
    TimerSnapshot,
};

/// A timer that tracks both the distribution of durations and the rate of timed events.
///
/// Durations are recorded as milliseconds into a histogram, and every recorded duration also marks
/// one event on a meter.
pub struct StandardTimer {
    histogram: SampledHistogram,
    meter: EwmaMeter,
    clock: Clock,
}

impl StandardTimer {
    /// Creates a new `StandardTimer` with an exponentially-decaying sample of the default size and
    /// decay factor.
    pub fn new(clock: Clock) -> StandardTimer {
        let sample = ExponentiallyDecayingSample::with_defaults(clock.clone());
        StandardTimer::with_sample(Box::new(sample), clock)
    }

    /// Creates a new `StandardTimer` over the given duration sample.
    pub fn with_sample(sample: Box<dyn Sample>, clock: Clock) -> StandardTimer {
        StandardTimer {
            histogram: SampledHistogram::new(sample),
            meter: EwmaMeter::new(clock.clone()),
            clock,
        }
    }

    /// Creates a new `StandardTimer` with an exponentially-decaying sample.
    ///
    /// # Errors
    ///
    /// If `reservoir_size` is zero, or `alpha` is not finite and positive, an error is returned.
    pub fn exponentially_decaying(
        reservoir_size: usize,
        alpha: f64,
        clock: Clock,
    ) -> Result<StandardTimer, BuildError> {
        let sample = ExponentiallyDecayingSample::new(reservoir_size, alpha, clock.clone())?;
        Ok(StandardTimer::with_sample(Box::new(sample), clock))
    }
}

impl Default for StandardTimer {
    fn default() -> Self {
        StandardTimer::new(Clock::new())
    }
}

impl TimerFn for StandardTimer {
    fn update(&self, elapsed: Duration) {
        self.histogram.update(elapsed.as_secs_f64() * 1000.0);
        self.meter.mark(1);
    }

    fn now(&self) -> Instant {
        self.clock.now()
    }

    fn clear(&self) {
        self.histogram.clear();
    }

    fn count(&self) -> u64 {
        self.histogram.count()
    }

    fn values(&self) -> Vec<f64> {
        self.histogram.values()
    }

    fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot::merge(self.histogram.snapshot(), self.meter.snapshot())
    }
}
