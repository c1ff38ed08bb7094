use yardstick::{FieldValue, MetricSnapshot};

struct ValueFormatter {
    int_writer: itoa::Buffer,
    float_writer: ryu::Buffer,
}

impl ValueFormatter {
    fn new() -> Self {
        Self { int_writer: itoa::Buffer::new(), float_writer: ryu::Buffer::new() }
    }

    /// Formats a field value, or returns `None` if Graphite cannot represent it.
    fn format<'a>(&'a mut self, value: &FieldValue) -> Option<&'a str> {
        match value {
            FieldValue::Integer(v) => Some(self.int_writer.format(*v)),
            FieldValue::Unsigned(v) => Some(self.int_writer.format(*v)),
            FieldValue::Float(v) if v.is_finite() => Some(self.float_writer.format(*v)),
            FieldValue::Float(_) => None,
            FieldValue::Boolean(true) => Some("1"),
            FieldValue::Boolean(false) => Some("0"),
            FieldValue::Text(_) => None,
        }
    }
}

/// Writes metric snapshots as Graphite plaintext protocol lines.
///
/// Every numeric field of a snapshot becomes one line of the form
/// `<prefix>.<metric>.<field> <value> <timestamp>`.
pub(crate) struct LineWriter {
    buf: Vec<u8>,
    formatter: ValueFormatter,
}

impl LineWriter {
    pub fn new() -> Self {
        Self { buf: Vec::with_capacity(8192), formatter: ValueFormatter::new() }
    }

    /// Writes every field of `snapshot`, returning the number of lines written.
    pub fn write_snapshot(
        &mut self,
        prefix: Option<&str>,
        name: &str,
        snapshot: &MetricSnapshot,
        timestamp: u64,
    ) -> usize {
        let mut lines = 0;
        for (field, value) in snapshot.fields() {
            let Some(value) = self.formatter.format(&value) else {
                continue;
            };

            if let Some(prefix) = prefix {
                write_path_segment(&mut self.buf, prefix);
                self.buf.push(b'.');
            }
            write_path_segment(&mut self.buf, name);
            self.buf.push(b'.');
            self.buf.extend_from_slice(field.as_bytes());
            self.buf.push(b' ');
            self.buf.extend_from_slice(value.as_bytes());
            self.buf.push(b' ');

            let mut int_writer = itoa::Buffer::new();
            self.buf.extend_from_slice(int_writer.format(timestamp).as_bytes());
            self.buf.push(b'\n');

            lines += 1;
        }

        lines
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buf
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

/// Writes a path segment, replacing whitespace so that a segment never splits a line.
fn write_path_segment(buf: &mut Vec<u8>, segment: &str) {
    for c in segment.chars() {
        if c.is_whitespace() {
            buf.push(b'_');
        } else {
            let mut encoded = [0; 4];
            buf.extend_from_slice(c.encode_utf8(&mut encoded).as_bytes());
        }
    }
}
