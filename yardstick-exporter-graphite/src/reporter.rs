use std::{
    io,
    thread::{sleep, JoinHandle},
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use thiserror::Error;
use tracing::{debug, error, trace};
use yardstick::{MetricKindMask, Registry};

use crate::{
    builder::BuildError,
    forwarder::{ClientState, ForwarderConfiguration},
    writer::LineWriter,
};

/// Errors that could occur while reporting to Graphite.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Failed to connect, or to write the batch.
    #[error("failed to send metrics to Graphite: {0}")]
    Io(#[from] io::Error),
}

/// Pushes snapshots of a [`Registry`] to Graphite.
pub struct GraphiteReporter {
    registry: Registry,
    client_state: ClientState,
    writer: LineWriter,
    prefix: Option<String>,
    flush_interval: Duration,
    kind_mask: MetricKindMask,
}

impl GraphiteReporter {
    pub(crate) fn new(
        registry: Registry,
        config: ForwarderConfiguration,
        prefix: Option<String>,
        flush_interval: Duration,
        kind_mask: MetricKindMask,
    ) -> Self {
        GraphiteReporter {
            registry,
            client_state: ClientState::new(config),
            writer: LineWriter::new(),
            prefix,
            flush_interval,
            kind_mask,
        }
    }

    /// Sends one snapshot of the registry, returning the number of lines sent.
    ///
    /// Connects first if there is no open connection.  If sending fails, the connection is closed and
    /// the batch is dropped; the next call reconnects.
    ///
    /// # Errors
    ///
    /// If connecting or writing fails, an error is returned.
    pub fn report(&mut self) -> Result<usize, ReportError> {
        let timestamp =
            SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);

        self.writer.clear();
        let mut lines = 0;
        for (name, snapshot) in self.registry.snapshot_matching(self.kind_mask) {
            lines += self.writer.write_snapshot(self.prefix.as_deref(), &name, &snapshot, timestamp);
        }

        if lines == 0 {
            trace!("No metrics to report.");
            return Ok(0);
        }

        self.client_state.try_send(self.writer.buffer())?;
        Ok(lines)
    }

    /// Whether or not the reporter currently holds an open connection.
    pub fn is_connected(&self) -> bool {
        self.client_state.is_connected()
    }

    /// Runs the reporter on a background thread, reporting once per flush interval.
    ///
    /// # Errors
    ///
    /// If the background thread cannot be spawned, an error is returned.
    pub fn spawn(self) -> Result<JoinHandle<()>, BuildError> {
        std::thread::Builder::new()
            .name("yardstick-exporter-graphite".to_string())
            .spawn(move || self.run())
            .map_err(|_| BuildError::Backend)
    }

    fn run(mut self) {
        let mut next_flush = Instant::now() + self.flush_interval;
        loop {
            // If the previous report took longer than the flush interval, we won't sleep at all.
            if let Some(sleep_duration) = next_flush.checked_duration_since(Instant::now()) {
                sleep(sleep_duration);
            }
            next_flush = Instant::now() + self.flush_interval;

            match self.report() {
                Ok(lines) => debug!(lines, "Finished reporting metrics."),
                Err(e) => error!(error = %e, "Failed to report metrics."),
            }
        }
    }
}
