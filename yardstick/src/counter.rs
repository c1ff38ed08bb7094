use std::sync::atomic::{AtomicI64, Ordering};

use crate::handles::CounterFn;

/// A signed counter backed by an atomic integer.
///
/// Overflow wraps around.
#[derive(Debug, Default)]
pub struct AtomicCounter {
    count: AtomicI64,
}

impl AtomicCounter {
    /// Creates a new `AtomicCounter` starting at zero.
    pub fn new() -> AtomicCounter {
        AtomicCounter::default()
    }
}

impl CounterFn for AtomicCounter {
    fn increment(&self, value: i64) {
        let _ = self.count.fetch_add(value, Ordering::Release);
    }

    fn decrement(&self, value: i64) {
        let _ = self.count.fetch_sub(value, Ordering::Release);
    }

    fn count(&self) -> i64 {
        self.count.load(Ordering::Acquire)
    }

    fn clear(&self) {
        self.count.store(0, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_increment_decrement() {
        let counter = AtomicCounter::new();
        counter.increment(10);
        counter.decrement(3);
        assert_eq!(counter.count(), 7);

        counter.decrement(10);
        assert_eq!(counter.count(), -3);

        counter.clear();
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn test_concurrent_increments() {
        let counter = Arc::new(AtomicCounter::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counter = Arc::clone(&counter);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        counter.increment(1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counter.count(), 8000);
    }
}
