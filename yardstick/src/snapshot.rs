//! Point-in-time views of instruments.
//!
//! Snapshots are what exporters consume.  Their serialized field names (`stdDev`, `rateMean`,
//! `percentile.median`, `percentile._99_9`, and so on) are consumed verbatim by downstream
//! dashboards, so they must not change.
use serde::Serialize;

use crate::{stats, MetricKind};

/// Quantiles reported for every histogram and timer, in field order.
pub const PERCENTILES: [f64; 5] = [0.5, 0.75, 0.95, 0.99, 0.999];

/// A typed field value.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    /// A signed integer.
    Integer(i64),
    /// An unsigned integer.
    Unsigned(u64),
    /// A floating-point number.
    Float(f64),
    /// A boolean.
    Boolean(bool),
    /// A string.
    Text(String),
}

/// Percentiles of a histogram's retained values.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PercentileSnapshot {
    /// The 50th percentile.
    pub median: f64,
    /// The 75th percentile.
    #[serde(rename = "_75")]
    pub p75: f64,
    /// The 95th percentile.
    #[serde(rename = "_95")]
    pub p95: f64,
    /// The 99th percentile.
    #[serde(rename = "_99")]
    pub p99: f64,
    /// The 99.9th percentile.
    #[serde(rename = "_99_9")]
    pub p999: f64,
}

impl PercentileSnapshot {
    /// Computes the reported percentiles over `values`.
    pub fn from_values(values: &[f64]) -> Self {
        let p = stats::percentiles(values, &PERCENTILES);
        PercentileSnapshot { median: p[0], p75: p[1], p95: p[2], p99: p[3], p999: p[4] }
    }

    fn push_fields(&self, fields: &mut Vec<(&'static str, FieldValue)>) {
        fields.push(("percentile.median", FieldValue::Float(self.median)));
        fields.push(("percentile._75", FieldValue::Float(self.p75)));
        fields.push(("percentile._95", FieldValue::Float(self.p95)));
        fields.push(("percentile._99", FieldValue::Float(self.p99)));
        fields.push(("percentile._99_9", FieldValue::Float(self.p999)));
    }
}

/// A histogram snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct HistogramSnapshot {
    /// Number of values ever recorded, including values no longer retained.
    pub count: u64,
    /// Largest retained value.
    pub max: f64,
    /// Mean of retained values.
    pub mean: f64,
    /// Smallest retained value.
    pub min: f64,
    /// Standard deviation of retained values.
    #[serde(rename = "stdDev")]
    pub std_dev: f64,
    /// Sum of retained values.
    pub sum: f64,
    /// Variance of retained values.
    pub variance: f64,
    /// Percentiles of retained values.
    pub percentile: PercentileSnapshot,
}

impl HistogramSnapshot {
    /// Computes a snapshot over the retained `values` of a sample that has seen `count` values.
    pub fn from_values(count: u64, values: &[f64]) -> Self {
        HistogramSnapshot {
            count,
            max: stats::max(values),
            mean: stats::mean(values),
            min: stats::min(values),
            std_dev: stats::std_dev(values),
            sum: stats::sum(values),
            variance: stats::variance(values),
            percentile: PercentileSnapshot::from_values(values),
        }
    }

    fn push_fields(&self, fields: &mut Vec<(&'static str, FieldValue)>) {
        fields.push(("count", FieldValue::Unsigned(self.count)));
        fields.push(("max", FieldValue::Float(self.max)));
        fields.push(("mean", FieldValue::Float(self.mean)));
        fields.push(("min", FieldValue::Float(self.min)));
        fields.push(("stdDev", FieldValue::Float(self.std_dev)));
        fields.push(("sum", FieldValue::Float(self.sum)));
        fields.push(("variance", FieldValue::Float(self.variance)));
        self.percentile.push_fields(fields);
    }
}

/// A meter snapshot.
///
/// Rates are events per second.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MeterSnapshot {
    /// Number of events marked.
    pub count: u64,
    /// One-minute moving average rate.
    pub rate1: f64,
    /// Five-minute moving average rate.
    pub rate5: f64,
    /// Fifteen-minute moving average rate.
    pub rate15: f64,
    /// Mean rate since the meter was created.
    #[serde(rename = "rateMean")]
    pub rate_mean: f64,
}

impl MeterSnapshot {
    fn push_rate_fields(&self, fields: &mut Vec<(&'static str, FieldValue)>) {
        fields.push(("rate1", FieldValue::Float(self.rate1)));
        fields.push(("rate5", FieldValue::Float(self.rate5)));
        fields.push(("rate15", FieldValue::Float(self.rate15)));
        fields.push(("rateMean", FieldValue::Float(self.rate_mean)));
    }
}

/// A timer snapshot: the duration distribution merged with the occurrence rates.
///
/// Durations are in milliseconds.  `count` and the duration statistics restart when the timer is
/// cleared, while the rates and `meter_count` keep covering every event since creation.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TimerSnapshot {
    /// Number of timed events since creation or the last clear.
    pub count: u64,
    /// Longest retained duration.
    pub max: f64,
    /// Mean of retained durations.
    pub mean: f64,
    /// Shortest retained duration.
    pub min: f64,
    /// Standard deviation of retained durations.
    #[serde(rename = "stdDev")]
    pub std_dev: f64,
    /// Sum of retained durations.
    pub sum: f64,
    /// Variance of retained durations.
    pub variance: f64,
    /// Percentiles of retained durations.
    pub percentile: PercentileSnapshot,
    /// One-minute moving average rate.
    pub rate1: f64,
    /// Five-minute moving average rate.
    pub rate5: f64,
    /// Fifteen-minute moving average rate.
    pub rate15: f64,
    /// Mean rate since the timer was created.
    #[serde(rename = "rateMean")]
    pub rate_mean: f64,
    /// Number of timed events since creation.  Not reported as a field.
    #[serde(skip)]
    pub meter_count: u64,
}

impl TimerSnapshot {
    /// Merges a duration histogram snapshot with an occurrence meter snapshot.
    pub fn merge(histogram: HistogramSnapshot, meter: MeterSnapshot) -> Self {
        TimerSnapshot {
            count: histogram.count,
            max: histogram.max,
            mean: histogram.mean,
            min: histogram.min,
            std_dev: histogram.std_dev,
            sum: histogram.sum,
            variance: histogram.variance,
            percentile: histogram.percentile,
            rate1: meter.rate1,
            rate5: meter.rate5,
            rate15: meter.rate15,
            rate_mean: meter.rate_mean,
            meter_count: meter.count,
        }
    }

    /// Gets the duration distribution part of this snapshot.
    pub fn histogram(&self) -> HistogramSnapshot {
        HistogramSnapshot {
            count: self.count,
            max: self.max,
            mean: self.mean,
            min: self.min,
            std_dev: self.std_dev,
            sum: self.sum,
            variance: self.variance,
            percentile: self.percentile.clone(),
        }
    }

    /// Gets the occurrence rate part of this snapshot.
    pub fn meter(&self) -> MeterSnapshot {
        MeterSnapshot {
            count: self.meter_count,
            rate1: self.rate1,
            rate5: self.rate5,
            rate15: self.rate15,
            rate_mean: self.rate_mean,
        }
    }
}

/// A counter snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    /// Current count.
    pub count: i64,
}

/// A gauge snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GaugeSnapshot {
    /// Current value.
    pub value: f64,
}

/// A healthcheck snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthcheckSnapshot {
    /// Whether or not the check passed.
    pub healthy: bool,
    /// Failure details, or an optional message from a passing check.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Default for HealthcheckSnapshot {
    fn default() -> Self {
        HealthcheckSnapshot { healthy: true, message: None }
    }
}

/// A snapshot of any kind of instrument.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricSnapshot {
    /// Counter snapshot.
    Counter(CounterSnapshot),
    /// Gauge snapshot.
    Gauge(GaugeSnapshot),
    /// Histogram snapshot.
    Histogram(HistogramSnapshot),
    /// Meter snapshot.
    Meter(MeterSnapshot),
    /// Timer snapshot.
    Timer(TimerSnapshot),
    /// Healthcheck snapshot.
    Healthcheck(HealthcheckSnapshot),
}

impl MetricSnapshot {
    /// Gets the kind of instrument this snapshot was taken from.
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricSnapshot::Counter(_) => MetricKind::Counter,
            MetricSnapshot::Gauge(_) => MetricKind::Gauge,
            MetricSnapshot::Histogram(_) => MetricKind::Histogram,
            MetricSnapshot::Meter(_) => MetricKind::Meter,
            MetricSnapshot::Timer(_) => MetricKind::Timer,
            MetricSnapshot::Healthcheck(_) => MetricKind::Healthcheck,
        }
    }

    /// Flattens this snapshot into named fields.
    ///
    /// Nested percentiles are flattened with a dot, e.g. `percentile._99`.
    pub fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        let mut fields = Vec::new();
        match self {
            MetricSnapshot::Counter(c) => fields.push(("count", FieldValue::Integer(c.count))),
            MetricSnapshot::Gauge(g) => fields.push(("value", FieldValue::Float(g.value))),
            MetricSnapshot::Histogram(h) => h.push_fields(&mut fields),
            MetricSnapshot::Meter(m) => {
                fields.push(("count", FieldValue::Unsigned(m.count)));
                m.push_rate_fields(&mut fields);
            }
            MetricSnapshot::Timer(t) => {
                t.histogram().push_fields(&mut fields);
                t.meter().push_rate_fields(&mut fields);
            }
            MetricSnapshot::Healthcheck(h) => {
                fields.push(("healthy", FieldValue::Boolean(h.healthy)));
                if let Some(message) = &h.message {
                    fields.push(("message", FieldValue::Text(message.clone())));
                }
            }
        }
        fields
    }
}
