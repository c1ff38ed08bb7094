//! In-process metrics instrumentation.
//!
//! `yardstick` provides the instruments an application uses to measure itself, and the statistics
//! machinery behind them:
//!
//! - [`Counter`]: a signed count that goes up and down
//! - [`Gauge`]: a point-in-time value, either set directly or computed by a callback
//! - [`Histogram`]: the distribution of a stream of values, kept in a bounded [`Sample`]
//! - [`Meter`]: the rate at which events occur, as one, five and fifteen minute moving averages
//!   plus the mean rate
//! - [`Timer`]: a histogram of durations combined with a meter of how often they occur
//! - [`Healthcheck`]: a pass/fail check run on demand
//!
//! Instruments are usually obtained from a [`Registry`], which names them and produces the
//! [`MetricSnapshot`]s that reporters push to monitoring backends.
//!
//! # Sampling
//!
//! Histograms never hold every value they are given.  A [`UniformSample`] keeps a fixed-size,
//! uniformly random subset of all values ever seen, while an [`ExponentiallyDecayingSample`]
//! favors values seen in roughly the last five minutes.  Statistics are computed on demand over
//! whatever the sample currently holds; on an empty sample every statistic is zero.
//!
//! # Disabling
//!
//! A registry built with [`RegistryBuilder::enabled`] set to `false` hands out instruments from
//! the [`null`] module instead: they accept every call, record nothing and read as zero.
//!
//! ```rust
//! use std::time::Duration;
//! use yardstick::{MetricSnapshot, Registry};
//!
//! let registry = Registry::new();
//!
//! let requests = registry.meter("requests").unwrap();
//! let latency = registry.timer("latency").unwrap();
//!
//! requests.mark(1);
//! latency.update(Duration::from_millis(12));
//!
//! for (name, snapshot) in registry.snapshot() {
//!     if let MetricSnapshot::Timer(timer) = snapshot {
//!         assert_eq!(name, "latency");
//!         assert_eq!(timer.count, 1);
//!     }
//! }
//! ```
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg), deny(rustdoc::broken_intra_doc_links))]

mod common;
pub use self::common::{BuildError, DEFAULT_ALPHA, DEFAULT_RESERVOIR_SIZE, DEFAULT_TICK_INTERVAL};

mod counter;
pub use self::counter::AtomicCounter;

pub mod ewma;

mod gauge;
pub use self::gauge::{AtomicGauge, FnGauge};

mod handles;
pub use self::handles::{
    Counter, CounterFn, Gauge, GaugeFn, Healthcheck, HealthcheckFn, Histogram, HistogramFn, Meter,
    MeterFn, Timer, TimerFn,
};

mod healthcheck;
pub use self::healthcheck::{FnHealthcheck, HealthStatus};

mod histogram;
pub use self::histogram::SampledHistogram;

mod kind;
pub use self::kind::{MetricKind, MetricKindMask};

mod meter;
pub use self::meter::EwmaMeter;

pub mod null;

mod percentile;
pub use self::percentile::{parse_percentiles, Percentile};

pub mod registry;
pub use self::registry::{Metric, Registry, RegistryBuilder, RegistryError};

pub mod sample;
pub use self::sample::{ExponentiallyDecayingSample, Sample, SampleKind, UniformSample};

pub mod snapshot;
pub use self::snapshot::{
    CounterSnapshot, FieldValue, GaugeSnapshot, HealthcheckSnapshot, HistogramSnapshot,
    MeterSnapshot, MetricSnapshot, PercentileSnapshot, TimerSnapshot,
};

pub mod stats;

mod timer;
pub use self::timer::StandardTimer;

pub use quanta::{Clock, Instant};
