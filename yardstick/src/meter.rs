use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use quanta::{Clock, Instant};

use crate::{ewma::Ewma, handles::MeterFn, MeterSnapshot};

struct Rates {
    m1: Ewma,
    m5: Ewma,
    m15: Ewma,
}

/// A meter that tracks event rates with one, five and fifteen minute moving averages.
///
/// The mean rate is the number of events divided by the seconds since creation, offset by one
/// second so a freshly created meter never divides by zero.
pub struct EwmaMeter {
    count: AtomicU64,
    rates: Mutex<Rates>,
    clock: Clock,
    start: Instant,
}

impl EwmaMeter {
    /// Creates a new `EwmaMeter`.
    pub fn new(clock: Clock) -> EwmaMeter {
        let rates = Rates {
            m1: Ewma::one_minute(clock.clone()),
            m5: Ewma::five_minute(clock.clone()),
            m15: Ewma::fifteen_minute(clock.clone()),
        };
        let start = clock.now();

        EwmaMeter { count: AtomicU64::new(0), rates: Mutex::new(rates), clock, start }
    }

    fn mean_rate(&self, count: u64) -> f64 {
        let elapsed = self.clock.now().saturating_duration_since(self.start).as_secs_f64();
        count as f64 / (1.0 + elapsed)
    }
}

impl Default for EwmaMeter {
    fn default() -> Self {
        EwmaMeter::new(Clock::new())
    }
}

impl MeterFn for EwmaMeter {
    fn mark(&self, n: u64) {
        let mut rates = self.rates.lock();
        let _ = self.count.fetch_add(n, Ordering::AcqRel);

        let n = n as f64;
        rates.m1.update(n);
        rates.m5.update(n);
        rates.m15.update(n);
    }

    fn count(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }

    fn rate1(&self) -> f64 {
        self.rates.lock().m1.rate()
    }

    fn rate5(&self) -> f64 {
        self.rates.lock().m5.rate()
    }

    fn rate15(&self) -> f64 {
        self.rates.lock().m15.rate()
    }

    fn rate_mean(&self) -> f64 {
        self.mean_rate(self.count())
    }

    fn snapshot(&self) -> MeterSnapshot {
        let mut rates = self.rates.lock();
        let count = self.count();

        MeterSnapshot {
            count,
            rate1: rates.m1.rate(),
            rate5: rates.m5.rate(),
            rate15: rates.m15.rate(),
            rate_mean: self.mean_rate(count),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_mean_rate_at_creation() {
        let (clock, _mock) = Clock::mock();
        let meter = EwmaMeter::new(clock);

        meter.mark(5);
        assert_eq!(meter.count(), 5);
        assert_relative_eq!(meter.rate_mean(), 5.0);
    }

    #[test]
    fn test_mean_rate_over_time() {
        let (clock, mock) = Clock::mock();
        let meter = EwmaMeter::new(clock);

        meter.mark(10);
        mock.increment(Duration::from_secs(4));
        assert_relative_eq!(meter.rate_mean(), 2.0);
    }

    #[test]
    fn test_moving_averages() {
        let (clock, mock) = Clock::mock();
        let meter = EwmaMeter::new(clock);

        meter.mark(3);
        assert_eq!(meter.rate1(), 0.0);

        mock.increment(Duration::from_secs(5));
        let snapshot = meter.snapshot();
        assert_eq!(snapshot.count, 3);
        assert_relative_eq!(snapshot.rate1, 0.6);
        assert_relative_eq!(snapshot.rate5, 0.6);
        assert_relative_eq!(snapshot.rate15, 0.6);
        assert_relative_eq!(snapshot.rate_mean, 0.5);

        // Longer windows forget more slowly.
        mock.increment(Duration::from_secs(60));
        let snapshot = meter.snapshot();
        assert!(snapshot.rate1 < snapshot.rate5);
        assert!(snapshot.rate5 < snapshot.rate15);
    }
}
