//! Instruments that ignore every write and always read as zero.
//!
//! A disabled [`Registry`](crate::Registry) hands these out in place of the standard instruments,
//! so instrumented code keeps working unchanged while paying almost nothing.
use std::time::Duration;

use quanta::Instant;

use crate::{
    handles::{CounterFn, GaugeFn, HealthcheckFn, HistogramFn, MeterFn, TimerFn},
    HealthStatus, HistogramSnapshot, MeterSnapshot, TimerSnapshot,
};

/// A counter that does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullCounter;

/// A gauge that does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullGauge;

/// A histogram that does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullHistogram;

/// A meter that does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullMeter;

/// A timer that does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullTimer;

/// A healthcheck that always passes.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullHealthcheck;

impl CounterFn for NullCounter {
    fn increment(&self, _value: i64) {}
    fn decrement(&self, _value: i64) {}
    fn count(&self) -> i64 {
        0
    }
    fn clear(&self) {}
}

impl GaugeFn for NullGauge {
    fn increment(&self, _value: f64) {}
    fn decrement(&self, _value: f64) {}
    fn set(&self, _value: f64) {}
    fn value(&self) -> f64 {
        0.0
    }
}

impl HistogramFn for NullHistogram {
    fn update(&self, _value: f64) {}
    fn clear(&self) {}
    fn count(&self) -> u64 {
        0
    }
    fn values(&self) -> Vec<f64> {
        Vec::new()
    }
    fn snapshot(&self) -> HistogramSnapshot {
        HistogramSnapshot::default()
    }
}

impl MeterFn for NullMeter {
    fn mark(&self, _n: u64) {}
    fn count(&self) -> u64 {
        0
    }
    fn rate1(&self) -> f64 {
        0.0
    }
    fn rate5(&self) -> f64 {
        0.0
    }
    fn rate15(&self) -> f64 {
        0.0
    }
    fn rate_mean(&self) -> f64 {
        0.0
    }
    fn snapshot(&self) -> MeterSnapshot {
        MeterSnapshot::default()
    }
}

impl TimerFn for NullTimer {
    fn update(&self, _elapsed: Duration) {}
    fn now(&self) -> Instant {
        Instant::now()
    }
    fn update_since(&self, _start: Instant) {}
    fn clear(&self) {}
    fn count(&self) -> u64 {
        0
    }
    fn values(&self) -> Vec<f64> {
        Vec::new()
    }
    fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot::default()
    }
}

impl HealthcheckFn for NullHealthcheck {
    fn check(&self) -> HealthStatus {
        HealthStatus::healthy()
    }
}
