use yardstick::{FieldValue, MetricSnapshot};

/// Writes metric snapshots as InfluxDB line protocol.
///
/// Each snapshot becomes a single point: the metric name is the measurement, the global tags are
/// attached to every point, and every field of the snapshot becomes a field of the point.
pub(crate) struct LineWriter<'a> {
    buf: Vec<u8>,
    tags: &'a [(String, String)],
    int_writer: itoa::Buffer,
    float_writer: ryu::Buffer,
}

impl<'a> LineWriter<'a> {
    /// Creates a writer that attaches `tags` to every point.  The tags must already be sorted by key.
    pub fn new(tags: &'a [(String, String)]) -> Self {
        Self {
            buf: Vec::with_capacity(8192),
            tags,
            int_writer: itoa::Buffer::new(),
            float_writer: ryu::Buffer::new(),
        }
    }

    /// Writes `snapshot` as a point, returning `false` if InfluxDB could not store it: the name is
    /// empty, or no field has a value InfluxDB can represent.
    pub fn write_snapshot(&mut self, name: &str, snapshot: &MetricSnapshot, timestamp: u64) -> bool {
        if name.is_empty() {
            return false;
        }

        let line_start = self.buf.len();

        write_escaped(&mut self.buf, name, b", ");
        for (key, value) in self.tags {
            self.buf.push(b',');
            write_escaped(&mut self.buf, key, b",= ");
            self.buf.push(b'=');
            write_escaped(&mut self.buf, value, b",= ");
        }

        let mut separator = b' ';
        for (field, value) in snapshot.fields() {
            if let FieldValue::Float(v) = value {
                // Line protocol has no representation for NaN or infinity.
                if !v.is_finite() {
                    continue;
                }
            }

            self.buf.push(separator);
            separator = b',';

            write_escaped(&mut self.buf, field, b",= ");
            self.buf.push(b'=');
            self.write_value(&value);
        }

        if separator == b' ' {
            self.buf.truncate(line_start);
            return false;
        }

        self.buf.push(b' ');
        self.buf.extend_from_slice(self.int_writer.format(timestamp).as_bytes());
        self.buf.push(b'\n');
        true
    }

    fn write_value(&mut self, value: &FieldValue) {
        match value {
            FieldValue::Integer(v) => {
                self.buf.extend_from_slice(self.int_writer.format(*v).as_bytes());
                self.buf.push(b'i');
            }
            FieldValue::Unsigned(v) => {
                let v = i64::try_from(*v).unwrap_or(i64::MAX);
                self.buf.extend_from_slice(self.int_writer.format(v).as_bytes());
                self.buf.push(b'i');
            }
            FieldValue::Float(v) => {
                self.buf.extend_from_slice(self.float_writer.format(*v).as_bytes());
            }
            FieldValue::Boolean(v) => {
                self.buf.extend_from_slice(if *v { b"true" } else { b"false" });
            }
            FieldValue::Text(s) => {
                self.buf.push(b'"');
                write_escaped(&mut self.buf, s, b"\"\\");
                self.buf.push(b'"');
            }
        }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

/// Writes `s`, prefixing every byte in `special` with a backslash.
///
/// Newlines cannot be escaped in line protocol, so they are replaced with spaces (which are then
/// escaped if spaces are special).
fn write_escaped(buf: &mut Vec<u8>, s: &str, special: &[u8]) {
    for &b in s.as_bytes() {
        let b = if b == b'\n' || b == b'\r' { b' ' } else { b };
        if special.contains(&b) {
            buf.push(b'\\');
        }
        buf.push(b);
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use yardstick::{
        CounterSnapshot, GaugeSnapshot, HealthcheckSnapshot, MeterSnapshot, MetricSnapshot,
    };

    use super::*;

    fn render(tags: &[(String, String)], name: &str, snapshot: MetricSnapshot) -> String {
        let mut writer = LineWriter::new(tags);
        writer.write_snapshot(name, &snapshot, 1_700_000_000_000_000_000);
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn test_counter_with_tags() {
        let tags = vec![
            ("host".to_string(), "web 1".to_string()),
            ("region".to_string(), "eu=west".to_string()),
        ];
        let counter = MetricSnapshot::Counter(CounterSnapshot { count: 42 });
        assert_eq!(
            render(&tags, "jobs", counter),
            "jobs,host=web\\ 1,region=eu\\=west count=42i 1700000000000000000\n"
        );
    }

    #[test]
    fn test_measurement_escaping() {
        let gauge = MetricSnapshot::Gauge(GaugeSnapshot { value: 1.5 });
        assert_eq!(
            render(&[], "queue depth,main", gauge),
            "queue\\ depth\\,main value=1.5 1700000000000000000\n"
        );
    }

    #[test]
    fn test_meter_fields() {
        let meter = MetricSnapshot::Meter(MeterSnapshot {
            count: 3,
            rate1: 0.5,
            rate5: 0.25,
            rate15: 0.125,
            rate_mean: 1.0,
        });
        assert_eq!(
            render(&[], "requests", meter),
            "requests count=3i,rate1=0.5,rate5=0.25,rate15=0.125,rateMean=1.0 1700000000000000000\n"
        );
    }

    #[test]
    fn test_healthcheck_message_is_quoted() {
        let health = MetricSnapshot::Healthcheck(HealthcheckSnapshot {
            healthy: false,
            message: Some("said \"no\"".to_string()),
        });
        assert_eq!(
            render(&[], "db", health),
            "db healthy=false,message=\"said \\\"no\\\"\" 1700000000000000000\n"
        );
    }

    #[test]
    fn test_non_finite_point_is_skipped() {
        let mut writer = LineWriter::new(&[]);
        let gauge = MetricSnapshot::Gauge(GaugeSnapshot { value: f64::NAN });
        assert!(!writer.write_snapshot("broken", &gauge, 1));

        let gauge = MetricSnapshot::Gauge(GaugeSnapshot { value: 2.0 });
        assert!(writer.write_snapshot("fine", &gauge, 1));
        assert_eq!(writer.into_inner(), b"fine value=2.0 1\n");
    }

    #[test]
    fn test_empty_name_is_skipped() {
        let mut writer = LineWriter::new(&[]);
        let counter = MetricSnapshot::Counter(CounterSnapshot { count: 1 });
        assert!(!writer.write_snapshot("", &counter, 1));
        assert!(writer.write_snapshot("jobs", &counter, 1));
        assert_eq!(writer.into_inner(), b"jobs count=1i 1\n");
    }

    proptest! {
        #[test]
        fn test_single_line_per_point(name in "\\PC*", value in any::<f64>()) {
            let gauge = MetricSnapshot::Gauge(GaugeSnapshot { value });
            let mut writer = LineWriter::new(&[]);
            let written = writer.write_snapshot(&name, &gauge, 1);
            let output = writer.into_inner();

            prop_assert_eq!(written, value.is_finite() && !name.is_empty());
            let newlines = output.iter().filter(|b| **b == b'\n').count();
            prop_assert_eq!(newlines, usize::from(written));
        }
    }
}
