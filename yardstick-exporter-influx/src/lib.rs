//! A [`yardstick`] reporter that pushes metrics to [InfluxDB][influxdb] using the line protocol.
//!
//! [influxdb]: https://docs.influxdata.com/influxdb/v1/write_protocols/line_protocol_reference/
//!
//! # Usage
//!
//! ```no_run
//! # use std::time::Duration;
//! # use yardstick::Registry;
//! # use yardstick_exporter_influx::InfluxBuilder;
//! let registry = Registry::new();
//!
//! // Push everything in the registry every 30 seconds, tagged with the host name.
//! let reporter = InfluxBuilder::new()
//!     .with_endpoint("http://influx.internal:8086/write?db=myapp&precision=ns")
//!     .expect("invalid endpoint")
//!     .with_push_interval(Duration::from_secs(30))
//!     .expect("invalid push interval")
//!     .with_tag("host", "web-1")
//!     .expect("invalid tag")
//!     .install(registry.clone())
//!     .expect("failed to install reporter");
//!
//! registry.counter("jobs").unwrap().increment(1);
//! ```
//!
//! # Format
//!
//! Every metric becomes one point per push: the metric name is the measurement, the configured
//! tags are attached to every point, and the fields are the ones produced by
//! [`yardstick::MetricSnapshot::fields`].  Integer fields carry the `i` suffix, healthchecks are
//! written as a boolean `healthy` field plus a string `message` field when there is one, and
//! timestamps are in nanoseconds since the Unix epoch.
//!
//! Floating-point fields that are NaN or infinite are left out, since InfluxDB cannot store them.
//!
//! # Failures
//!
//! A failed push is logged and dropped.  The next push sends a fresh snapshot.
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg), deny(rustdoc::broken_intra_doc_links))]

mod builder;
pub use self::builder::{BuildError, InfluxBuilder};

mod exporter;
pub use self::exporter::{ExporterFuture, InfluxReporter, PushError};

mod writer;
