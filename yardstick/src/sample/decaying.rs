use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

use ordered_float::OrderedFloat;
use quanta::{Clock, Instant};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

use super::Sample;
use crate::common::{
    validate_alpha, validate_reservoir_size, BuildError, DEFAULT_ALPHA, DEFAULT_RESERVOIR_SIZE,
};

/// How often retained priorities are rebased onto a new time origin.
const RESCALE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Clone, Copy, Debug)]
struct WeightedValue {
    priority: OrderedFloat<f64>,
    value: f64,
}

impl PartialEq for WeightedValue {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority
    }
}

impl Eq for WeightedValue {}

impl PartialOrd for WeightedValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WeightedValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority.cmp(&other.priority)
    }
}

/// An exponentially-decaying sampling reservoir.
///
/// Uses Cormode et al's forward-decaying priority reservoir sampling: every value is tagged with a
/// priority of `exp(alpha * t) / f`, where `t` is the number of seconds since the time origin of
/// the reservoir and `f` is drawn uniformly from `(0, count]`.  The reservoir keeps the
/// highest-priority values, so recent values are strongly favored over old ones.
///
/// Priorities grow exponentially with time, so once an hour the reservoir moves its time origin
/// forward and scales every retained priority down by the same factor.  Relative order is unchanged.
pub struct ExponentiallyDecayingSample {
    entries: BinaryHeap<Reverse<WeightedValue>>,
    count: u64,
    reservoir_size: usize,
    alpha: f64,
    clock: Clock,
    start: Instant,
    next_rescale: Instant,
    rng: Xoshiro256StarStar,
}

impl ExponentiallyDecayingSample {
    /// Creates a new `ExponentiallyDecayingSample`.
    ///
    /// # Errors
    ///
    /// If `reservoir_size` is zero, or `alpha` is not finite and positive, an error is returned.
    pub fn new(reservoir_size: usize, alpha: f64, clock: Clock) -> Result<Self, BuildError> {
        let rng = Xoshiro256StarStar::from_rng(&mut rand::rng());
        Self::with_rng(reservoir_size, alpha, clock, rng)
    }

    /// Creates a new `ExponentiallyDecayingSample` whose random divisors are driven by the given
    /// seed.
    ///
    /// # Errors
    ///
    /// If `reservoir_size` is zero, or `alpha` is not finite and positive, an error is returned.
    pub fn with_seed(
        reservoir_size: usize,
        alpha: f64,
        clock: Clock,
        seed: u64,
    ) -> Result<Self, BuildError> {
        Self::with_rng(reservoir_size, alpha, clock, Xoshiro256StarStar::seed_from_u64(seed))
    }

    fn with_rng(
        reservoir_size: usize,
        alpha: f64,
        clock: Clock,
        rng: Xoshiro256StarStar,
    ) -> Result<Self, BuildError> {
        let reservoir_size = validate_reservoir_size(reservoir_size)?;
        let alpha = validate_alpha(alpha)?;

        Ok(Self::from_parts(reservoir_size, alpha, clock, rng))
    }

    /// Creates an `ExponentiallyDecayingSample` with the default reservoir size and decay factor.
    pub fn with_defaults(clock: Clock) -> Self {
        let rng = Xoshiro256StarStar::from_rng(&mut rand::rng());
        Self::from_parts(DEFAULT_RESERVOIR_SIZE, DEFAULT_ALPHA, clock, rng)
    }

    fn from_parts(
        reservoir_size: usize,
        alpha: f64,
        clock: Clock,
        rng: Xoshiro256StarStar,
    ) -> Self {
        let start = clock.now();

        ExponentiallyDecayingSample {
            entries: BinaryHeap::with_capacity(reservoir_size.min(1024)),
            count: 0,
            reservoir_size,
            alpha,
            clock,
            start,
            next_rescale: start + RESCALE_INTERVAL,
            rng,
        }
    }

    /// Gets the maximum number of values this sample retains.
    pub fn reservoir_size(&self) -> usize {
        self.reservoir_size
    }

    /// Gets the decay factor.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    fn rescale(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.start).as_secs_f64();
        let factor = (-self.alpha * elapsed).exp();

        self.entries = std::mem::take(&mut self.entries)
            .into_iter()
            .map(|Reverse(mut entry)| {
                entry.priority = OrderedFloat(entry.priority.0 * factor);
                Reverse(entry)
            })
            .collect();

        self.start = now;
        self.next_rescale = now + RESCALE_INTERVAL;
    }
}

impl Sample for ExponentiallyDecayingSample {
    fn update(&mut self, value: f64) {
        let now = self.clock.now();
        if now > self.next_rescale {
            self.rescale(now);
        }

        self.count += 1;

        let elapsed = now.saturating_duration_since(self.start).as_secs_f64();
        // `1 - [0, 1)` keeps the divisor within `(0, count]`.
        let divisor = self.count as f64 * (1.0 - self.rng.random::<f64>());
        let priority = OrderedFloat((self.alpha * elapsed).exp() / divisor);
        let entry = WeightedValue { priority, value };

        if self.entries.len() < self.reservoir_size {
            self.entries.push(Reverse(entry));
            return;
        }

        // Full: the lowest priority among the retained values and the new one is evicted.
        if let Some(Reverse(lowest)) = self.entries.peek() {
            if lowest.priority < priority {
                self.entries.pop();
                self.entries.push(Reverse(entry));
            }
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.count = 0;
        self.start = self.clock.now();
        self.next_rescale = self.start + RESCALE_INTERVAL;
    }

    fn size(&self) -> usize {
        self.entries.len()
    }

    fn count(&self) -> u64 {
        self.count
    }

    fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|Reverse(entry)| entry.value).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HistogramSnapshot;

    #[test]
    fn test_invalid_parameters() {
        let clock = Clock::new();
        assert!(matches!(
            ExponentiallyDecayingSample::new(0, DEFAULT_ALPHA, clock.clone()),
            Err(BuildError::InvalidReservoirSize)
        ));
        assert!(matches!(
            ExponentiallyDecayingSample::new(10, 0.0, clock),
            Err(BuildError::InvalidAlpha(_))
        ));
    }

    #[test]
    fn test_bounded_size() {
        let (clock, _mock) = Clock::mock();
        let mut sample = ExponentiallyDecayingSample::with_seed(100, DEFAULT_ALPHA, clock, 42).unwrap();

        for value in 0..10 {
            sample.update(f64::from(value));
        }
        assert_eq!(sample.size(), 10);
        assert_eq!(sample.count(), 10);

        for value in 10..1000 {
            sample.update(f64::from(value));
        }
        assert_eq!(sample.size(), 100);
        assert_eq!(sample.count(), 1000);
        assert!(sample.values().iter().all(|v| (0.0..1000.0).contains(v)));
    }

    #[test]
    fn test_clear() {
        let (clock, mock) = Clock::mock();
        let mut sample = ExponentiallyDecayingSample::with_seed(10, DEFAULT_ALPHA, clock, 3).unwrap();
        for value in 0..100 {
            sample.update(f64::from(value));
        }

        mock.increment(Duration::from_secs(90));
        sample.clear();

        assert_eq!(sample.count(), 0);
        assert_eq!(sample.size(), 0);
        assert_eq!(sample.snapshot(), HistogramSnapshot::default());
        assert_eq!(sample.percentile(0.99), 0.0);
        assert_eq!(sample.start, sample.clock.now());
        assert_eq!(sample.next_rescale, sample.start + RESCALE_INTERVAL);
    }

    #[test]
    fn test_favors_recent_values() {
        let (clock, mock) = Clock::mock();
        let mut sample = ExponentiallyDecayingSample::with_seed(100, DEFAULT_ALPHA, clock, 7).unwrap();

        for _ in 0..100 {
            sample.update(1.0);
        }

        // Fifty minutes on, every new priority outweighs every old one by many orders of magnitude.
        mock.increment(Duration::from_secs(50 * 60));
        for _ in 0..100 {
            sample.update(2.0);
        }

        assert_eq!(sample.size(), 100);
        assert_eq!(sample.count(), 200);
        assert!(sample.values().iter().all(|v| *v == 2.0));
    }

    #[test]
    fn test_rescales_after_interval() {
        let (clock, mock) = Clock::mock();
        let mut sample = ExponentiallyDecayingSample::with_seed(10, DEFAULT_ALPHA, clock, 11).unwrap();
        let origin = sample.start;

        sample.update(1.0);
        mock.increment(Duration::from_secs(30 * 60));
        sample.update(2.0);
        assert_eq!(sample.start, origin);

        mock.increment(Duration::from_secs(31 * 60));
        sample.update(3.0);

        let now = sample.clock.now();
        assert_eq!(sample.start, now);
        assert_eq!(sample.next_rescale, now + RESCALE_INTERVAL);

        let mut values = sample.values();
        values.sort_by(f64::total_cmp);
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_priorities_stay_finite() {
        let (clock, mock) = Clock::mock();
        let mut sample = ExponentiallyDecayingSample::with_seed(16, DEFAULT_ALPHA, clock, 5).unwrap();

        // Five hundred hours would overflow `exp(alpha * t)` without rescaling.
        for step in 0..1000 {
            sample.update(f64::from(step));
            mock.increment(Duration::from_secs(30 * 60));
        }

        assert_eq!(sample.size(), 16);
        assert!(sample.entries.iter().all(|Reverse(e)| e.priority.0.is_finite()));
        assert!(sample.values().contains(&999.0));
    }
}
