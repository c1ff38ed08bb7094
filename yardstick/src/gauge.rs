use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::handles::GaugeFn;

/// A gauge holding a floating-point value in an atomic integer.
#[derive(Debug)]
pub struct AtomicGauge {
    value: AtomicU64,
}

impl AtomicGauge {
    /// Creates a new `AtomicGauge` starting at zero.
    pub fn new() -> AtomicGauge {
        AtomicGauge { value: AtomicU64::new(0.0f64.to_bits()) }
    }

    fn update<F>(&self, f: F)
    where
        F: Fn(f64) -> f64,
    {
        let _ = self.value.fetch_update(Ordering::AcqRel, Ordering::Relaxed, |curr| {
            Some(f(f64::from_bits(curr)).to_bits())
        });
    }
}

impl Default for AtomicGauge {
    fn default() -> Self {
        AtomicGauge::new()
    }
}

impl GaugeFn for AtomicGauge {
    fn increment(&self, value: f64) {
        self.update(|curr| curr + value);
    }

    fn decrement(&self, value: f64) {
        self.update(|curr| curr - value);
    }

    fn set(&self, value: f64) {
        self.value.store(value.to_bits(), Ordering::Release);
    }

    fn value(&self) -> f64 {
        f64::from_bits(self.value.load(Ordering::Acquire))
    }
}

/// A gauge whose value is computed by a callback every time it is read.
///
/// Writes are ignored.
pub struct FnGauge {
    f: Box<dyn Fn() -> f64 + Send + Sync>,
}

impl FnGauge {
    /// Creates a new `FnGauge` reading its value from `f`.
    pub fn new<F>(f: F) -> FnGauge
    where
        F: Fn() -> f64 + Send + Sync + 'static,
    {
        FnGauge { f: Box::new(f) }
    }
}

impl fmt::Debug for FnGauge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnGauge").finish_non_exhaustive()
    }
}

impl GaugeFn for FnGauge {
    fn increment(&self, _value: f64) {}

    fn decrement(&self, _value: f64) {}

    fn set(&self, _value: f64) {}

    fn value(&self) -> f64 {
        (self.f)()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;

    #[test]
    fn test_atomic_gauge() {
        let gauge = AtomicGauge::new();
        assert_eq!(gauge.value(), 0.0);

        gauge.set(42.5);
        gauge.increment(7.5);
        gauge.decrement(10.0);
        assert_eq!(gauge.value(), 40.0);

        gauge.set(-1.25);
        assert_eq!(gauge.value(), -1.25);
    }

    #[test]
    fn test_fn_gauge_reads_on_demand() {
        let calls = Arc::new(AtomicUsize::new(0));
        let gauge = {
            let calls = Arc::clone(&calls);
            FnGauge::new(move || calls.fetch_add(1, Ordering::SeqCst) as f64)
        };

        gauge.set(100.0);
        assert_eq!(gauge.value(), 0.0);
        assert_eq!(gauge.value(), 1.0);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
