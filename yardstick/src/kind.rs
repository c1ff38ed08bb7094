use std::fmt;
use std::ops::BitOr;

/// Metric kind.
///
/// Defines the kind, or type, of an instrument held by a [`Registry`](crate::Registry).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum MetricKind {
    /// Counter type.
    Counter,
    /// Gauge type.
    Gauge,
    /// Histogram type.
    Histogram,
    /// Meter type.
    Meter,
    /// Timer type.
    Timer,
    /// Healthcheck type.
    Healthcheck,
}

impl MetricKind {
    /// Gets the lowercase name of this kind.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
            MetricKind::Meter => "meter",
            MetricKind::Timer => "timer",
            MetricKind::Healthcheck => "healthcheck",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metric kind mask.
///
/// Useful for matching against a kind, or kinds, of metrics.
///
/// In order to use for defining multiple metric kinds, can be used in a bitmask fashion, as this
/// type implements bitwise OR support, and checking for inclusion of a specific kind within another
/// kind value can be checked via [`matches`](MetricKindMask::matches):
///
/// ```rust
/// # use yardstick::{MetricKind, MetricKindMask};
/// // Let's only match timers and meters:
/// let mask = MetricKindMask::TIMER | MetricKindMask::METER;
///
/// assert!(!mask.matches(MetricKind::Gauge));
/// assert!(mask.matches(MetricKind::Timer));
/// assert!(mask.matches(MetricKind::Meter));
///
/// assert!(!MetricKindMask::NONE.matches(MetricKind::Counter));
/// assert!(MetricKindMask::ALL.matches(MetricKind::Healthcheck));
/// ```
#[derive(Debug, Eq, PartialEq, Hash, Clone, Copy, Ord, PartialOrd)]
pub struct MetricKindMask(u8);

impl MetricKindMask {
    /// No metric kinds.
    pub const NONE: MetricKindMask = MetricKindMask(0);

    /// The counter kind.
    pub const COUNTER: MetricKindMask = MetricKindMask(1);

    /// The gauge kind.
    pub const GAUGE: MetricKindMask = MetricKindMask(1 << 1);

    /// The histogram kind.
    pub const HISTOGRAM: MetricKindMask = MetricKindMask(1 << 2);

    /// The meter kind.
    pub const METER: MetricKindMask = MetricKindMask(1 << 3);

    /// The timer kind.
    pub const TIMER: MetricKindMask = MetricKindMask(1 << 4);

    /// The healthcheck kind.
    pub const HEALTHCHECK: MetricKindMask = MetricKindMask(1 << 5);

    /// All metric kinds.
    pub const ALL: MetricKindMask = MetricKindMask(0b11_1111);

    #[inline]
    fn value(&self) -> u8 {
        self.0
    }

    /// Whether or not this metric kind contains the specified kind.
    pub fn matches(&self, kind: MetricKind) -> bool {
        let bit = match kind {
            MetricKind::Counter => MetricKindMask::COUNTER,
            MetricKind::Gauge => MetricKindMask::GAUGE,
            MetricKind::Histogram => MetricKindMask::HISTOGRAM,
            MetricKind::Meter => MetricKindMask::METER,
            MetricKind::Timer => MetricKindMask::TIMER,
            MetricKind::Healthcheck => MetricKindMask::HEALTHCHECK,
        };

        self.0 & bit.value() != 0
    }
}

impl BitOr for MetricKindMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl From<MetricKind> for MetricKindMask {
    fn from(kind: MetricKind) -> Self {
        match kind {
            MetricKind::Counter => MetricKindMask::COUNTER,
            MetricKind::Gauge => MetricKindMask::GAUGE,
            MetricKind::Histogram => MetricKindMask::HISTOGRAM,
            MetricKind::Meter => MetricKindMask::METER,
            MetricKind::Timer => MetricKindMask::TIMER,
            MetricKind::Healthcheck => MetricKindMask::HEALTHCHECK,
        }
    }
}
