//! Exponentially-weighted moving averages.
use std::time::Duration;

use quanta::{Clock, Instant};

use crate::common::{validate_alpha, BuildError, DEFAULT_TICK_INTERVAL};

const ONE_MINUTE: Duration = Duration::from_secs(60);
const FIVE_MINUTES: Duration = Duration::from_secs(5 * 60);
const FIFTEEN_MINUTES: Duration = Duration::from_secs(15 * 60);

/// Computes the smoothing constant for averaging over `window` when ticking every `period`.
///
/// With the default five second period, this yields the classic UNIX load-average constants.
pub fn alpha_for_window(window: Duration, period: Duration) -> f64 {
    1.0 - (-period.as_secs_f64() / window.as_secs_f64()).exp()
}

/// An exponentially-weighted moving average of a per-second rate.
///
/// Events are accumulated exactly within a tick period and committed into the average only when
/// a full period has elapsed.  Advancement is lazy: both [`update`](Ewma::update) and
/// [`rate`](Ewma::rate) catch up on any periods that elapsed since the last call, so no background
/// task is required.  Periods that elapsed without any events decay the rate towards zero.
#[derive(Debug)]
pub struct Ewma {
    alpha: f64,
    period: Duration,
    clock: Clock,
    last_tick: Instant,
    uncommitted: f64,
    rate: f64,
    initialized: bool,
}

impl Ewma {
    /// Creates a new `Ewma` with the given smoothing constant and tick period.
    ///
    /// # Errors
    ///
    /// If `alpha` is not within `(0, 1]`, or `period` is zero, an error is returned.
    pub fn new(alpha: f64, period: Duration, clock: Clock) -> Result<Ewma, BuildError> {
        // Past 1, `1 - alpha` turns negative and the rate oscillates around zero.
        let alpha = validate_alpha(alpha)?;
        if alpha > 1.0 {
            return Err(BuildError::InvalidAlpha(alpha));
        }
        if period.is_zero() {
            return Err(BuildError::InvalidTickInterval);
        }

        Ok(Ewma::new_unchecked(alpha, period, clock))
    }

    fn new_unchecked(alpha: f64, period: Duration, clock: Clock) -> Ewma {
        let last_tick = clock.now();
        Ewma { alpha, period, clock, last_tick, uncommitted: 0.0, rate: 0.0, initialized: false }
    }

    fn for_window(window: Duration, clock: Clock) -> Ewma {
        let alpha = alpha_for_window(window, DEFAULT_TICK_INTERVAL);
        Ewma::new_unchecked(alpha, DEFAULT_TICK_INTERVAL, clock)
    }

    /// Creates an `Ewma` averaging over one minute.
    pub fn one_minute(clock: Clock) -> Ewma {
        Ewma::for_window(ONE_MINUTE, clock)
    }

    /// Creates an `Ewma` averaging over five minutes.
    pub fn five_minute(clock: Clock) -> Ewma {
        Ewma::for_window(FIVE_MINUTES, clock)
    }

    /// Creates an `Ewma` averaging over fifteen minutes.
    pub fn fifteen_minute(clock: Clock) -> Ewma {
        Ewma::for_window(FIFTEEN_MINUTES, clock)
    }

    /// Gets the smoothing constant.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Records `value` events.
    pub fn update(&mut self, value: f64) {
        self.tick();
        self.uncommitted += value;
    }

    /// Gets the current rate, in events per second.
    pub fn rate(&mut self) -> f64 {
        self.tick();
        self.rate
    }

    fn tick(&mut self) {
        let now = self.clock.now();
        let elapsed = now.saturating_duration_since(self.last_tick);
        let periods = elapsed.as_nanos() / self.period.as_nanos();
        if periods == 0 {
            return;
        }

        // The period that just ended carries the accumulated events.
        let instant_rate = self.uncommitted / self.period.as_secs_f64();
        if self.initialized {
            self.rate += self.alpha * (instant_rate - self.rate);
        } else {
            self.rate = instant_rate;
            self.initialized = true;
        }
        self.uncommitted = 0.0;

        // Any further periods were idle.
        let idle = periods - 1;
        if idle > 0 {
            let exponent = i32::try_from(idle).unwrap_or(i32::MAX);
            self.rate *= (1.0 - self.alpha).powi(exponent);
        }

        let advance = u64::try_from(self.period.as_nanos() * periods).unwrap_or(u64::MAX);
        self.last_tick = self.last_tick + Duration::from_nanos(advance);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn one_minute_alpha() -> f64 {
        1.0 - (-5.0f64 / 60.0).exp()
    }

    #[test]
    fn test_window_constants() {
        let clock = Clock::new();
        assert_relative_eq!(Ewma::one_minute(clock.clone()).alpha(), one_minute_alpha());
        assert_relative_eq!(
            Ewma::five_minute(clock.clone()).alpha(),
            1.0 - (-5.0f64 / 60.0 / 5.0).exp()
        );
        assert_relative_eq!(
            Ewma::fifteen_minute(clock).alpha(),
            1.0 - (-5.0f64 / 60.0 / 15.0).exp()
        );
    }

    #[test]
    fn test_invalid_parameters() {
        let clock = Clock::new();
        assert_eq!(
            Ewma::new(0.5, Duration::ZERO, clock.clone()).err(),
            Some(BuildError::InvalidTickInterval)
        );
        assert_eq!(
            Ewma::new(-0.5, DEFAULT_TICK_INTERVAL, clock.clone()).err(),
            Some(BuildError::InvalidAlpha(-0.5))
        );
        assert_eq!(
            Ewma::new(2.5, DEFAULT_TICK_INTERVAL, clock.clone()).err(),
            Some(BuildError::InvalidAlpha(2.5))
        );
        assert!(Ewma::new(f64::NAN, DEFAULT_TICK_INTERVAL, clock.clone()).is_err());
        assert!(Ewma::new(1.0, DEFAULT_TICK_INTERVAL, clock).is_ok());
    }

    #[test]
    fn test_full_smoothing_never_goes_negative() {
        let (clock, mock) = Clock::mock();
        let mut ewma = Ewma::new(1.0, DEFAULT_TICK_INTERVAL, clock).unwrap();

        ewma.update(5.0);
        mock.increment(DEFAULT_TICK_INTERVAL);
        assert_relative_eq!(ewma.rate(), 1.0);

        mock.increment(DEFAULT_TICK_INTERVAL);
        assert_eq!(ewma.rate(), 0.0);
        mock.increment(DEFAULT_TICK_INTERVAL * 3);
        assert_eq!(ewma.rate(), 0.0);
    }

    #[test]
    fn test_nothing_committed_before_first_period() {
        let (clock, mock) = Clock::mock();
        let mut ewma = Ewma::one_minute(clock);

        ewma.update(3.0);
        mock.increment(Duration::from_millis(4999));
        assert_eq!(ewma.rate(), 0.0);
    }

    #[test]
    fn test_first_period_then_idle_decay() {
        let (clock, mock) = Clock::mock();
        let mut ewma = Ewma::one_minute(clock);

        ewma.update(3.0);
        mock.increment(Duration::from_secs(5));
        assert_relative_eq!(ewma.rate(), 0.6);

        mock.increment(Duration::from_secs(5));
        assert_relative_eq!(ewma.rate(), 0.6 * (1.0 - one_minute_alpha()));
    }

    #[test]
    fn test_skipped_periods_decay_geometrically() {
        let (clock, mock) = Clock::mock();
        let mut ewma = Ewma::one_minute(clock);

        ewma.update(3.0);
        mock.increment(Duration::from_secs(5));
        assert_relative_eq!(ewma.rate(), 0.6);

        // Four periods at once: the same as four single-period reads.
        mock.increment(Duration::from_secs(20));
        assert_relative_eq!(ewma.rate(), 0.6 * (1.0 - one_minute_alpha()).powi(4), epsilon = 1e-12);
    }

    #[test]
    fn test_events_in_later_period_are_smoothed() {
        let (clock, mock) = Clock::mock();
        let alpha = one_minute_alpha();
        let mut ewma = Ewma::one_minute(clock);

        ewma.update(3.0);
        mock.increment(Duration::from_secs(5));
        ewma.update(10.0);
        mock.increment(Duration::from_secs(5));

        assert_relative_eq!(ewma.rate(), 0.6 + alpha * (2.0 - 0.6));
    }

    #[test]
    fn test_partial_period_is_kept_for_next_tick() {
        let (clock, mock) = Clock::mock();
        let mut ewma = Ewma::one_minute(clock);

        // 7.5s elapse: one period commits, and the tick boundary stays aligned to 5s.
        ewma.update(5.0);
        mock.increment(Duration::from_millis(7500));
        assert_relative_eq!(ewma.rate(), 1.0);

        ewma.update(5.0);
        mock.increment(Duration::from_millis(2500));
        assert_relative_eq!(ewma.rate(), 1.0);
    }

    #[test]
    fn test_rate_is_idempotent_without_elapsed_time() {
        let (clock, mock) = Clock::mock();
        let mut ewma = Ewma::five_minute(clock);

        ewma.update(7.0);
        mock.increment(Duration::from_secs(12));
        let first = ewma.rate();
        let second = ewma.rate();
        assert_eq!(first, second);
    }
}
