use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use quanta::Instant;

use crate::{
    null::{NullCounter, NullGauge, NullHealthcheck, NullHistogram, NullMeter, NullTimer},
    percentile::{parse_percentiles, Percentile},
    stats, CounterSnapshot, GaugeSnapshot, HealthStatus, HealthcheckSnapshot, HistogramSnapshot,
    MeterSnapshot, MetricKind, TimerSnapshot,
};

/// A counter handler.
pub trait CounterFn: Send + Sync {
    /// Increments the counter by the given amount.
    fn increment(&self, value: i64);

    /// Decrements the counter by the given amount.
    fn decrement(&self, value: i64);

    /// Gets the current count.
    fn count(&self) -> i64;

    /// Resets the counter to zero.
    fn clear(&self);
}

/// A gauge handler.
pub trait GaugeFn: Send + Sync {
    /// Increments the gauge by the given amount.
    fn increment(&self, value: f64);

    /// Decrements the gauge by the given amount.
    fn decrement(&self, value: f64);

    /// Sets the gauge to the given amount.
    fn set(&self, value: f64);

    /// Gets the current value.
    fn value(&self) -> f64;
}

/// A histogram handler.
pub trait HistogramFn: Send + Sync {
    /// Records a value into the histogram.
    fn update(&self, value: f64);

    /// Discards all recorded values.
    fn clear(&self);

    /// Gets the number of values recorded since creation or the last clear.
    fn count(&self) -> u64;

    /// Gets a copy of the values currently retained by the histogram.
    fn values(&self) -> Vec<f64>;

    /// Computes a snapshot of the histogram.
    fn snapshot(&self) -> HistogramSnapshot {
        HistogramSnapshot::from_values(self.count(), &self.values())
    }
}

/// A meter handler.
pub trait MeterFn: Send + Sync {
    /// Marks the occurrence of `n` events.
    fn mark(&self, n: u64);

    /// Gets the number of events marked.
    fn count(&self) -> u64;

    /// Gets the one-minute moving average rate, in events per second.
    fn rate1(&self) -> f64;

    /// Gets the five-minute moving average rate, in events per second.
    fn rate5(&self) -> f64;

    /// Gets the fifteen-minute moving average rate, in events per second.
    fn rate15(&self) -> f64;

    /// Gets the mean rate since the meter was created, in events per second.
    fn rate_mean(&self) -> f64;

    /// Computes a snapshot of the meter.
    fn snapshot(&self) -> MeterSnapshot {
        MeterSnapshot {
            count: self.count(),
            rate1: self.rate1(),
            rate5: self.rate5(),
            rate15: self.rate15(),
            rate_mean: self.rate_mean(),
        }
    }
}

/// A timer handler.
pub trait TimerFn: Send + Sync {
    /// Records the duration of one timed event.
    fn update(&self, elapsed: Duration);

    /// Gets the current time according to the timer's clock.
    fn now(&self) -> Instant;

    /// Records the time elapsed since `start`, which must have come from [`now`](TimerFn::now).
    fn update_since(&self, start: Instant) {
        self.update(self.now().saturating_duration_since(start));
    }

    /// Discards all recorded durations.
    ///
    /// Occurrence rates are left untouched.
    fn clear(&self);

    /// Gets the number of timed events since creation or the last clear.
    fn count(&self) -> u64;

    /// Gets a copy of the durations, in milliseconds, currently retained by the timer.
    fn values(&self) -> Vec<f64>;

    /// Computes a snapshot of the timer.
    fn snapshot(&self) -> TimerSnapshot;
}

/// A healthcheck handler.
pub trait HealthcheckFn: Send + Sync {
    /// Runs the check.
    fn check(&self) -> HealthStatus;
}

/// A counter.
#[derive(Clone)]
pub struct Counter {
    inner: Arc<dyn CounterFn>,
}

/// A gauge.
#[derive(Clone)]
pub struct Gauge {
    inner: Arc<dyn GaugeFn>,
}

/// A histogram.
#[derive(Clone)]
pub struct Histogram {
    inner: Arc<dyn HistogramFn>,
}

/// A meter.
#[derive(Clone)]
pub struct Meter {
    inner: Arc<dyn MeterFn>,
}

/// A timer.
#[derive(Clone)]
pub struct Timer {
    inner: Arc<dyn TimerFn>,
}

/// A healthcheck.
#[derive(Clone)]
pub struct Healthcheck {
    inner: Arc<dyn HealthcheckFn>,
}

macro_rules! impl_handle {
    ($handle:ident, $handler:ident, $null:ident, $kind:ident) => {
        impl $handle {
            #[doc = concat!("Creates a no-op `", stringify!($handle), "` which does nothing.")]
            ///
            /// Suitable when a handle must be provided that does nothing i.e. a disabled registry.
            pub fn noop() -> Self {
                Self { inner: Arc::new($null) }
            }

            #[doc = concat!("Creates a `", stringify!($handle), "` based on a shared handler.")]
            pub fn from_arc<F: $handler + 'static>(a: Arc<F>) -> Self {
                Self { inner: a }
            }

            /// Gets the kind of this instrument.
            pub fn kind(&self) -> MetricKind {
                MetricKind::$kind
            }
        }

        impl fmt::Debug for $handle {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($handle)).finish_non_exhaustive()
            }
        }
    };
}

impl_handle!(Counter, CounterFn, NullCounter, Counter);
impl_handle!(Gauge, GaugeFn, NullGauge, Gauge);
impl_handle!(Histogram, HistogramFn, NullHistogram, Histogram);
impl_handle!(Meter, MeterFn, NullMeter, Meter);
impl_handle!(Timer, TimerFn, NullTimer, Timer);
impl_handle!(Healthcheck, HealthcheckFn, NullHealthcheck, Healthcheck);

impl Counter {
    /// Increments the counter.
    pub fn increment(&self, value: i64) {
        self.inner.increment(value)
    }

    /// Decrements the counter.
    pub fn decrement(&self, value: i64) {
        self.inner.decrement(value)
    }

    /// Gets the current count.
    pub fn count(&self) -> i64 {
        self.inner.count()
    }

    /// Resets the counter to zero.
    pub fn clear(&self) {
        self.inner.clear()
    }

    /// Takes a snapshot of the counter.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot { count: self.count() }
    }
}

impl Gauge {
    /// Increments the gauge.
    pub fn increment(&self, value: f64) {
        self.inner.increment(value)
    }

    /// Decrements the gauge.
    pub fn decrement(&self, value: f64) {
        self.inner.decrement(value)
    }

    /// Sets the gauge.
    pub fn set(&self, value: f64) {
        self.inner.set(value)
    }

    /// Gets the current value.
    pub fn value(&self) -> f64 {
        self.inner.value()
    }

    /// Takes a snapshot of the gauge.
    pub fn snapshot(&self) -> GaugeSnapshot {
        GaugeSnapshot { value: self.value() }
    }
}

impl Histogram {
    /// Records a value in the histogram.
    pub fn update(&self, value: f64) {
        self.inner.update(value)
    }

    /// Discards all recorded values.
    pub fn clear(&self) {
        self.inner.clear()
    }

    /// Gets the number of values recorded.
    pub fn count(&self) -> u64 {
        self.inner.count()
    }

    /// Gets the value at the given quantile of the retained values.
    pub fn percentile(&self, quantile: f64) -> f64 {
        stats::percentile(&self.inner.values(), quantile)
    }

    /// Gets the values at each of the given quantiles, labeled the way reporters label them.
    pub fn percentiles(&self, quantiles: &[f64]) -> Vec<(Percentile, f64)> {
        let values = self.inner.values();
        let percentiles = parse_percentiles(quantiles);
        let quantiles: Vec<f64> = percentiles.iter().map(Percentile::value).collect();

        percentiles.into_iter().zip(stats::percentiles(&values, &quantiles)).collect()
    }

    /// Takes a snapshot of the histogram.
    pub fn snapshot(&self) -> HistogramSnapshot {
        self.inner.snapshot()
    }
}

impl Meter {
    /// Marks the occurrence of `n` events.
    pub fn mark(&self, n: u64) {
        self.inner.mark(n)
    }

    /// Gets the number of events marked.
    pub fn count(&self) -> u64 {
        self.inner.count()
    }

    /// Gets the one-minute moving average rate.
    pub fn rate1(&self) -> f64 {
        self.inner.rate1()
    }

    /// Gets the five-minute moving average rate.
    pub fn rate5(&self) -> f64 {
        self.inner.rate5()
    }

    /// Gets the fifteen-minute moving average rate.
    pub fn rate15(&self) -> f64 {
        self.inner.rate15()
    }

    /// Gets the mean rate since the meter was created.
    pub fn rate_mean(&self) -> f64 {
        self.inner.rate_mean()
    }

    /// Takes a snapshot of the meter.
    pub fn snapshot(&self) -> MeterSnapshot {
        self.inner.snapshot()
    }
}

impl Timer {
    /// Records the duration of one timed event.
    pub fn update(&self, elapsed: Duration) {
        self.inner.update(elapsed)
    }

    /// Gets a start time for a later call to [`update_since`](Timer::update_since).
    pub fn start(&self) -> Instant {
        self.inner.now()
    }

    /// Records the time elapsed since `start`.
    pub fn update_since(&self, start: Instant) {
        self.inner.update_since(start)
    }

    /// Times a closure.
    ///
    /// The elapsed time is recorded once `f` returns.  If `f` panics, nothing is recorded.
    pub fn time<F, T>(&self, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        let start = self.start();
        let result = f();
        self.update_since(start);
        result
    }

    /// Times a fallible closure.
    ///
    /// The elapsed time is only recorded if `f` returns `Ok`.  Errors are passed through unchanged.
    pub fn try_time<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let start = self.start();
        let result = f()?;
        self.update_since(start);
        Ok(result)
    }

    /// Discards all recorded durations.
    pub fn clear(&self) {
        self.inner.clear()
    }

    /// Gets the number of timed events.
    pub fn count(&self) -> u64 {
        self.inner.count()
    }

    /// Gets the duration, in milliseconds, at the given quantile of the retained durations.
    pub fn percentile(&self, quantile: f64) -> f64 {
        stats::percentile(&self.inner.values(), quantile)
    }

    /// Takes a snapshot of the timer.
    pub fn snapshot(&self) -> TimerSnapshot {
        self.inner.snapshot()
    }
}

impl Healthcheck {
    /// Runs the check.
    pub fn check(&self) -> HealthStatus {
        self.inner.check()
    }

    /// Runs the check and takes a snapshot of the result.
    pub fn snapshot(&self) -> HealthcheckSnapshot {
        self.check().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_handles_read_as_zero() {
        let counter = Counter::noop();
        counter.increment(5);
        assert_eq!(counter.snapshot(), CounterSnapshot::default());
        assert_eq!(counter.kind(), MetricKind::Counter);

        let gauge = Gauge::noop();
        gauge.set(42.0);
        assert_eq!(gauge.snapshot(), GaugeSnapshot::default());

        let histogram = Histogram::noop();
        histogram.update(10.0);
        assert_eq!(histogram.snapshot(), HistogramSnapshot::default());
        assert_eq!(histogram.percentile(0.99), 0.0);

        let meter = Meter::noop();
        meter.mark(10);
        assert_eq!(meter.snapshot(), MeterSnapshot::default());

        let timer = Timer::noop();
        assert_eq!(timer.time(|| 7), 7);
        timer.update(Duration::from_millis(100));
        assert_eq!(timer.snapshot(), TimerSnapshot::default());
        assert_eq!(timer.kind(), MetricKind::Timer);

        let healthcheck = Healthcheck::noop();
        assert!(healthcheck.check().is_healthy());
        assert_eq!(healthcheck.snapshot(), HealthcheckSnapshot::default());
    }

    #[test]
    fn test_labeled_percentiles() {
        let histogram = Histogram::from_arc(Arc::new(
            crate::SampledHistogram::uniform(100).unwrap(),
        ));
        for value in [10.0, 20.0, 30.0, 40.0, 50.0] {
            histogram.update(value);
        }

        let percentiles = histogram.percentiles(&[0.5, 0.999]);
        assert_eq!(percentiles.len(), 2);
        assert_eq!(percentiles[0].0.label(), "median");
        assert_eq!(percentiles[0].1, 30.0);
        assert_eq!(percentiles[1].0.label(), "_99_9");
        assert_eq!(percentiles[1].1, 50.0);
    }
}
