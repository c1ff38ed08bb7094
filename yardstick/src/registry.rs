//! Named instrument storage.
use std::sync::Arc;

use indexmap::{map::Entry as MapEntry, IndexMap};
use parking_lot::RwLock;
use quanta::Clock;
use thiserror::Error;
use tracing::warn;

use crate::{
    common::{validate_reservoir_size, BuildError, DEFAULT_ALPHA, DEFAULT_RESERVOIR_SIZE},
    counter::AtomicCounter,
    gauge::{AtomicGauge, FnGauge},
    healthcheck::FnHealthcheck,
    histogram::SampledHistogram,
    meter::EwmaMeter,
    sample::{new_sample, SampleKind},
    timer::StandardTimer,
    Counter, Gauge, Healthcheck, Histogram, Meter, MetricKind, MetricKindMask, MetricSnapshot,
    Timer,
};

/// Errors that could occur while registering an instrument.
#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    /// The name is already registered to an instrument of a different kind.
    #[error("metric '{name}' is registered as a {actual}, not a {expected}")]
    KindMismatch {
        /// The contested name.
        name: String,
        /// The kind that was requested.
        expected: MetricKind,
        /// The kind already registered under the name.
        actual: MetricKind,
    },

    /// The instrument could not be built.
    #[error(transparent)]
    Build(#[from] BuildError),
}

/// An instrument of any kind.
#[derive(Clone, Debug)]
pub enum Metric {
    /// A counter.
    Counter(Counter),
    /// A gauge.
    Gauge(Gauge),
    /// A histogram.
    Histogram(Histogram),
    /// A meter.
    Meter(Meter),
    /// A timer.
    Timer(Timer),
    /// A healthcheck.
    Healthcheck(Healthcheck),
}

impl Metric {
    /// Gets the kind of this instrument.
    pub fn kind(&self) -> MetricKind {
        match self {
            Metric::Counter(_) => MetricKind::Counter,
            Metric::Gauge(_) => MetricKind::Gauge,
            Metric::Histogram(_) => MetricKind::Histogram,
            Metric::Meter(_) => MetricKind::Meter,
            Metric::Timer(_) => MetricKind::Timer,
            Metric::Healthcheck(_) => MetricKind::Healthcheck,
        }
    }

    /// Takes a snapshot of this instrument.
    ///
    /// Healthchecks run their check.
    pub fn snapshot(&self) -> MetricSnapshot {
        match self {
            Metric::Counter(c) => MetricSnapshot::Counter(c.snapshot()),
            Metric::Gauge(g) => MetricSnapshot::Gauge(g.snapshot()),
            Metric::Histogram(h) => MetricSnapshot::Histogram(h.snapshot()),
            Metric::Meter(m) => MetricSnapshot::Meter(m.snapshot()),
            Metric::Timer(t) => MetricSnapshot::Timer(t.snapshot()),
            Metric::Healthcheck(h) => MetricSnapshot::Healthcheck(h.snapshot()),
        }
    }
}

trait FromMetric: Sized {
    const KIND: MetricKind;

    fn from_metric(metric: &Metric) -> Option<Self>;
}

macro_rules! impl_from_metric {
    ($handle:ident) => {
        impl FromMetric for $handle {
            const KIND: MetricKind = MetricKind::$handle;

            fn from_metric(metric: &Metric) -> Option<Self> {
                match metric {
                    Metric::$handle(inner) => Some(inner.clone()),
                    _ => None,
                }
            }
        }
    };
}

impl_from_metric!(Counter);
impl_from_metric!(Gauge);
impl_from_metric!(Histogram);
impl_from_metric!(Meter);
impl_from_metric!(Timer);
impl_from_metric!(Healthcheck);

struct Entry {
    metric: Metric,
    description: Option<String>,
}

/// Builder for creating and configuring a [`Registry`].
#[derive(Clone, Debug)]
pub struct RegistryBuilder {
    enabled: bool,
    reservoir_size: usize,
    sample_kind: SampleKind,
    clock: Clock,
}

impl RegistryBuilder {
    /// Creates a new [`RegistryBuilder`].
    pub fn new() -> Self {
        RegistryBuilder {
            enabled: true,
            reservoir_size: DEFAULT_RESERVOIR_SIZE,
            sample_kind: SampleKind::default(),
            clock: Clock::new(),
        }
    }

    /// Sets whether or not the registry hands out working instruments.
    ///
    /// A disabled registry hands out instruments that ignore writes and read as zero.
    ///
    /// Defaults to `true`.
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the reservoir size of histograms and timers.
    ///
    /// Defaults to 1028.
    ///
    /// # Errors
    ///
    /// If `reservoir_size` is zero, an error is returned.
    pub fn with_reservoir_size(mut self, reservoir_size: usize) -> Result<Self, BuildError> {
        self.reservoir_size = validate_reservoir_size(reservoir_size)?;
        Ok(self)
    }

    /// Sets the sample kind used by [`Registry::histogram`].
    ///
    /// Defaults to exponentially-decaying sampling with a decay factor of 0.015.  Timers always use
    /// exponentially-decaying sampling, with this decay factor if one is given here.
    ///
    /// # Errors
    ///
    /// If the decay factor is not finite and positive, an error is returned.
    pub fn with_sample_kind(mut self, sample_kind: SampleKind) -> Result<Self, BuildError> {
        self.sample_kind = sample_kind.validate()?;
        Ok(self)
    }

    /// Sets the clock used by time-aware instruments.
    ///
    /// Primarily useful for testing.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Builds the registry.
    pub fn build(self) -> Registry {
        Registry {
            inner: Arc::new(Inner { config: self, metrics: RwLock::new(IndexMap::new()) }),
        }
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        RegistryBuilder::new()
    }
}

struct Inner {
    config: RegistryBuilder,
    metrics: RwLock<IndexMap<String, Entry>>,
}

/// A collection of named instruments.
///
/// Instruments are created on first request and shared afterwards: asking for the same name twice
/// returns handles to the same instrument.  Names are unique across kinds.
///
/// `Registry` is cheaply clonable, and clones share the same instruments, so a clone can be handed
/// to each reporter.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<Inner>,
}

impl Registry {
    /// Creates a new, enabled `Registry` with the default configuration.
    pub fn new() -> Registry {
        RegistryBuilder::new().build()
    }

    /// Creates a new `Registry` that only hands out no-op instruments.
    pub fn disabled() -> Registry {
        RegistryBuilder::new().enabled(false).build()
    }

    /// Creates a new [`RegistryBuilder`].
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Whether or not this registry hands out working instruments.
    pub fn is_enabled(&self) -> bool {
        self.inner.config.enabled
    }

    /// Gets or creates a counter.
    ///
    /// # Errors
    ///
    /// If `name` is registered to an instrument of another kind, an error is returned.
    pub fn counter(&self, name: &str) -> Result<Counter, RegistryError> {
        self.get_or_create(name, |config| {
            let counter = if config.enabled {
                Counter::from_arc(Arc::new(AtomicCounter::new()))
            } else {
                Counter::noop()
            };
            Ok(Metric::Counter(counter))
        })
    }

    /// Gets or creates a gauge that holds the last value set.
    ///
    /// # Errors
    ///
    /// If `name` is registered to an instrument of another kind, an error is returned.
    pub fn gauge(&self, name: &str) -> Result<Gauge, RegistryError> {
        self.get_or_create(name, |config| {
            let gauge = if config.enabled {
                Gauge::from_arc(Arc::new(AtomicGauge::new()))
            } else {
                Gauge::noop()
            };
            Ok(Metric::Gauge(gauge))
        })
    }

    /// Gets or creates a gauge whose value is computed by `f` whenever it is read.
    ///
    /// If a gauge is already registered under `name`, it is returned and `f` is dropped.
    ///
    /// # Errors
    ///
    /// If `name` is registered to an instrument of another kind, an error is returned.
    pub fn fn_gauge<F>(&self, name: &str, f: F) -> Result<Gauge, RegistryError>
    where
        F: Fn() -> f64 + Send + Sync + 'static,
    {
        self.get_or_create(name, move |config| {
            let gauge = if config.enabled {
                Gauge::from_arc(Arc::new(FnGauge::new(f)))
            } else {
                Gauge::noop()
            };
            Ok(Metric::Gauge(gauge))
        })
    }

    /// Gets or creates a histogram with the configured sample kind.
    ///
    /// # Errors
    ///
    /// If `name` is registered to an instrument of another kind, an error is returned.
    pub fn histogram(&self, name: &str) -> Result<Histogram, RegistryError> {
        let config = &self.inner.config;
        self.histogram_with_sample(name, config.sample_kind, config.reservoir_size)
    }

    /// Gets or creates a histogram with the given sample kind and reservoir size.
    ///
    /// The sample parameters only apply if the histogram does not exist yet.
    ///
    /// # Errors
    ///
    /// If `name` is registered to an instrument of another kind, or the sample parameters are
    /// invalid, an error is returned.
    pub fn histogram_with_sample(
        &self,
        name: &str,
        kind: SampleKind,
        reservoir_size: usize,
    ) -> Result<Histogram, RegistryError> {
        self.get_or_create(name, |config| {
            let histogram = if config.enabled {
                let sample = new_sample(kind, reservoir_size, config.clock.clone())?;
                Histogram::from_arc(Arc::new(SampledHistogram::new(sample)))
            } else {
                Histogram::noop()
            };
            Ok(Metric::Histogram(histogram))
        })
    }

    /// Gets or creates a meter.
    ///
    /// # Errors
    ///
    /// If `name` is registered to an instrument of another kind, an error is returned.
    pub fn meter(&self, name: &str) -> Result<Meter, RegistryError> {
        self.get_or_create(name, |config| {
            let meter = if config.enabled {
                Meter::from_arc(Arc::new(EwmaMeter::new(config.clock.clone())))
            } else {
                Meter::noop()
            };
            Ok(Metric::Meter(meter))
        })
    }

    /// Gets or creates a timer.
    ///
    /// # Errors
    ///
    /// If `name` is registered to an instrument of another kind, an error is returned.
    pub fn timer(&self, name: &str) -> Result<Timer, RegistryError> {
        self.get_or_create(name, |config| {
            let timer = if config.enabled {
                let alpha = match config.sample_kind {
                    SampleKind::ExponentiallyDecaying { alpha } => alpha,
                    SampleKind::Uniform => DEFAULT_ALPHA,
                };
                let timer = StandardTimer::exponentially_decaying(
                    config.reservoir_size,
                    alpha,
                    config.clock.clone(),
                )?;
                Timer::from_arc(Arc::new(timer))
            } else {
                Timer::noop()
            };
            Ok(Metric::Timer(timer))
        })
    }

    /// Gets or creates a healthcheck running `f`.
    ///
    /// If a healthcheck is already registered under `name`, it is returned and `f` is dropped.
    ///
    /// # Errors
    ///
    /// If `name` is registered to an instrument of another kind, an error is returned.
    pub fn healthcheck<F>(&self, name: &str, f: F) -> Result<Healthcheck, RegistryError>
    where
        F: Fn() -> Result<(), String> + Send + Sync + 'static,
    {
        self.get_or_create(name, move |config| {
            let healthcheck = if config.enabled {
                Healthcheck::from_arc(Arc::new(FnHealthcheck::new(f)))
            } else {
                Healthcheck::noop()
            };
            Ok(Metric::Healthcheck(healthcheck))
        })
    }

    fn get_or_create<H, F>(&self, name: &str, create: F) -> Result<H, RegistryError>
    where
        H: FromMetric,
        F: FnOnce(&RegistryBuilder) -> Result<Metric, RegistryError>,
    {
        // Optimistically try the read path first.
        if let Some(entry) = self.inner.metrics.read().get(name) {
            return self.extract(name, &entry.metric);
        }

        let mut metrics = self.inner.metrics.write();
        match metrics.entry(name.to_string()) {
            MapEntry::Occupied(entry) => self.extract(name, &entry.get().metric),
            MapEntry::Vacant(entry) => {
                let metric = create(&self.inner.config)?;
                let entry = entry.insert(Entry { metric, description: None });
                self.extract(name, &entry.metric)
            }
        }
    }

    fn extract<H: FromMetric>(&self, name: &str, metric: &Metric) -> Result<H, RegistryError> {
        H::from_metric(metric).ok_or_else(|| {
            let (expected, actual) = (H::KIND, metric.kind());
            warn!(metric = name, %expected, %actual, "metric kind mismatch");
            RegistryError::KindMismatch { name: name.to_string(), expected, actual }
        })
    }

    /// Attaches a human-readable description to an existing instrument.
    ///
    /// Returns `false` if no instrument is registered under `name`.
    pub fn describe<S: Into<String>>(&self, name: &str, description: S) -> bool {
        match self.inner.metrics.write().get_mut(name) {
            Some(entry) => {
                entry.description = Some(description.into());
                true
            }
            None => false,
        }
    }

    /// Gets the description of an instrument, if one was attached.
    pub fn description(&self, name: &str) -> Option<String> {
        self.inner.metrics.read().get(name).and_then(|entry| entry.description.clone())
    }

    /// Gets the instrument registered under `name`.
    pub fn get(&self, name: &str) -> Option<Metric> {
        self.inner.metrics.read().get(name).map(|entry| entry.metric.clone())
    }

    /// Removes the instrument registered under `name`.
    ///
    /// Handles to the instrument keep working, but are no longer reported.  Returns `true` if an
    /// instrument was removed.
    pub fn remove(&self, name: &str) -> bool {
        self.inner.metrics.write().shift_remove(name).is_some()
    }

    /// Removes all instruments.
    pub fn clear(&self) {
        self.inner.metrics.write().clear();
    }

    /// Gets the names of all instruments, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.inner.metrics.read().keys().cloned().collect()
    }

    /// Gets the names of all instruments of the given kind, in registration order.
    pub fn names_of(&self, kind: MetricKind) -> Vec<String> {
        self.inner
            .metrics
            .read()
            .iter()
            .filter(|(_, entry)| entry.metric.kind() == kind)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Gets the number of registered instruments.
    pub fn len(&self) -> usize {
        self.inner.metrics.read().len()
    }

    /// Whether or not any instrument is registered.
    pub fn is_empty(&self) -> bool {
        self.inner.metrics.read().is_empty()
    }

    /// Visits every instrument, in registration order.
    ///
    /// The registry is locked for reading while visiting, so `f` must not register or remove
    /// instruments.
    pub fn visit<F>(&self, mut f: F)
    where
        F: FnMut(&str, &Metric),
    {
        for (name, entry) in self.inner.metrics.read().iter() {
            f(name, &entry.metric);
        }
    }

    /// Takes a snapshot of every instrument, in registration order.
    pub fn snapshot(&self) -> Vec<(String, MetricSnapshot)> {
        self.snapshot_matching(MetricKindMask::ALL)
    }

    /// Takes a snapshot of every instrument whose kind matches `mask`, in registration order.
    pub fn snapshot_matching(&self, mask: MetricKindMask) -> Vec<(String, MetricSnapshot)> {
        // Snapshots run healthcheck callbacks, so they are taken outside of the lock.
        let metrics: Vec<(String, Metric)> = self
            .inner
            .metrics
            .read()
            .iter()
            .filter(|(_, entry)| mask.matches(entry.metric.kind()))
            .map(|(name, entry)| (name.clone(), entry.metric.clone()))
            .collect();

        metrics.into_iter().map(|(name, metric)| (name, metric.snapshot())).collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{CounterSnapshot, HistogramSnapshot, MeterSnapshot};

    #[test]
    fn test_get_or_create_shares_instruments() {
        let registry = Registry::new();

        let first = registry.counter("requests").unwrap();
        let second = registry.counter("requests").unwrap();
        first.increment(2);
        second.increment(3);

        assert_eq!(first.count(), 5);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_kind_mismatch() {
        let registry = Registry::new();
        let _ = registry.meter("jobs").unwrap();

        let err = registry.counter("jobs").unwrap_err();
        assert_eq!(
            err,
            RegistryError::KindMismatch {
                name: "jobs".to_string(),
                expected: MetricKind::Counter,
                actual: MetricKind::Meter,
            }
        );
        assert_eq!(err.to_string(), "metric 'jobs' is registered as a meter, not a counter");
    }

    #[test]
    fn test_invalid_sample_is_not_registered() {
        let registry = Registry::new();
        let err = registry.histogram_with_sample("sizes", SampleKind::Uniform, 0).unwrap_err();
        assert_eq!(err, RegistryError::Build(BuildError::InvalidReservoirSize));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_lookup_and_removal() {
        let registry = Registry::new();
        let _ = registry.counter("a").unwrap();
        let _ = registry.gauge("b").unwrap();
        let _ = registry.counter("c").unwrap();
        let _ = registry.healthcheck("d", || Ok(())).unwrap();

        assert_eq!(registry.names(), vec!["a", "b", "c", "d"]);
        assert_eq!(registry.names_of(MetricKind::Counter), vec!["a", "c"]);
        assert_eq!(registry.get("b").map(|m| m.kind()), Some(MetricKind::Gauge));
        assert!(registry.get("z").is_none());

        assert!(registry.remove("b"));
        assert!(!registry.remove("b"));
        assert_eq!(registry.names(), vec!["a", "c", "d"]);

        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_descriptions() {
        let registry = Registry::new();
        assert!(!registry.describe("latency", "request latency"));

        let _ = registry.timer("latency").unwrap();
        assert!(registry.describe("latency", "request latency"));
        assert_eq!(registry.description("latency").as_deref(), Some("request latency"));
        assert_eq!(registry.description("missing"), None);
    }

    #[test]
    fn test_snapshot_order_and_mask() {
        let (clock, mock) = Clock::mock();
        let registry = Registry::builder().with_clock(clock).build();

        registry.counter("hits").unwrap().increment(4);
        registry.histogram("sizes").unwrap().update(12.0);
        registry.meter("events").unwrap().mark(5);
        registry.timer("latency").unwrap().update(Duration::from_millis(20));
        mock.increment(Duration::from_secs(1));

        let snapshot = registry.snapshot();
        let names: Vec<_> = snapshot.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["hits", "sizes", "events", "latency"]);
        assert_eq!(snapshot[0].1, MetricSnapshot::Counter(CounterSnapshot { count: 4 }));

        let meters = registry.snapshot_matching(MetricKindMask::METER);
        assert_eq!(meters.len(), 1);
        match &meters[0].1 {
            MetricSnapshot::Meter(m) => {
                assert_eq!(m.count, 5);
                assert_eq!(m.rate_mean, 2.5);
            }
            other => panic!("unexpected snapshot {:?}", other),
        }
    }

    #[test]
    fn test_disabled_registry() {
        let registry = Registry::disabled();
        assert!(!registry.is_enabled());

        let counter = registry.counter("hits").unwrap();
        counter.increment(10);
        let histogram = registry.histogram("sizes").unwrap();
        histogram.update(3.0);
        let meter = registry.meter("events").unwrap();
        meter.mark(3);
        let gauge = registry.fn_gauge("temperature", || 21.5).unwrap();

        assert_eq!(counter.count(), 0);
        assert_eq!(histogram.snapshot(), HistogramSnapshot::default());
        assert_eq!(meter.snapshot(), MeterSnapshot::default());
        assert_eq!(gauge.value(), 0.0);

        // Names are still tracked, so kinds are still enforced.
        assert!(registry.timer("hits").is_err());
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_builder_validation() {
        assert_eq!(
            RegistryBuilder::new().with_reservoir_size(0).err(),
            Some(BuildError::InvalidReservoirSize)
        );
        assert!(RegistryBuilder::new()
            .with_sample_kind(SampleKind::ExponentiallyDecaying { alpha: f64::NAN })
            .is_err());
    }
}
