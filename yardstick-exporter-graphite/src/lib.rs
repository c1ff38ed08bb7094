//! A [`yardstick`] reporter that pushes metrics to [Graphite][graphite] over the plaintext protocol.
//!
//! [graphite]: https://graphite.readthedocs.io/en/latest/feeding-carbon.html
//!
//! # Usage
//!
//! ```no_run
//! # use std::time::Duration;
//! # use yardstick::Registry;
//! # use yardstick_exporter_graphite::GraphiteBuilder;
//! let registry = Registry::new();
//!
//! // Push everything in the registry to a Carbon listener every 30 seconds, under `myapp.`.
//! GraphiteBuilder::new()
//!     .with_remote_address("graphite.internal:2003")
//!     .expect("failed to resolve remote address")
//!     .with_flush_interval(Duration::from_secs(30))
//!     .expect("invalid flush interval")
//!     .with_prefix("myapp")
//!     .install(registry.clone())
//!     .expect("failed to install reporter");
//!
//! registry.meter("requests").unwrap().mark(1);
//! ```
//!
//! # Format
//!
//! Every field of every metric is sent as its own line: `<prefix>.<name>.<field> <value> <timestamp>`,
//! where the timestamp is in seconds since the Unix epoch.  Field names are the ones used by
//! [`yardstick::MetricSnapshot::fields`], such as `count`, `rate1`, `stdDev` or
//! `percentile._99`.  Healthchecks are sent as `1` when healthy and `0` otherwise; their messages
//! are not sent.
//!
//! Whitespace in prefixes and metric names is replaced with underscores.
//!
//! # Connection handling
//!
//! A single TCP connection is kept open between reports.  When a write fails, the batch is dropped
//! and the connection is re-established on the next report.
#![deny(missing_docs)]

mod builder;
pub use self::builder::{BuildError, GraphiteBuilder};

mod forwarder;

mod reporter;
pub use self::reporter::{GraphiteReporter, ReportError};

mod writer;
