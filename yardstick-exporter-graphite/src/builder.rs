use std::{net::SocketAddr, thread::JoinHandle, time::Duration};

use thiserror::Error;
use yardstick::{MetricKindMask, Registry};

use crate::{
    forwarder::{ForwarderConfiguration, RemoteAddr},
    reporter::GraphiteReporter,
};

const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(1);
const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(10);
const DEFAULT_PORT: u16 = 2003;

/// Errors that could occur while building or installing a Graphite reporter.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Failed to parse the remote address.
    #[error("invalid remote address: {reason}")]
    InvalidRemoteAddress {
        /// Details about the parsing failure.
        reason: String,
    },

    /// The flush interval was zero.
    #[error("flush interval must be greater than zero")]
    InvalidFlushInterval,

    /// Failed to spawn the background thread.
    #[error("failed to spawn background thread for reporter")]
    Backend,
}

/// Builder for a Graphite reporter.
#[derive(Clone, Debug)]
pub struct GraphiteBuilder {
    remote_addr: RemoteAddr,
    prefix: Option<String>,
    write_timeout: Duration,
    flush_interval: Duration,
    kind_mask: MetricKindMask,
}

impl GraphiteBuilder {
    /// Creates a new [`GraphiteBuilder`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the address of the Graphite plaintext listener, in the format of `<host>:<port>`.
    ///
    /// Defaults to `127.0.0.1:2003`.
    ///
    /// # Errors
    ///
    /// If the given address cannot be resolved, an error will be returned indicating the reason.
    pub fn with_remote_address<A>(mut self, addr: A) -> Result<Self, BuildError>
    where
        A: AsRef<str>,
    {
        self.remote_addr = RemoteAddr::try_from(addr.as_ref())
            .map_err(|reason| BuildError::InvalidRemoteAddress { reason })?;
        Ok(self)
    }

    /// Set a prefix prepended to every metric path, such as the application or host name.
    ///
    /// Defaults to no prefix.
    #[must_use]
    pub fn with_prefix<P: Into<String>>(mut self, prefix: P) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Set the timeout for connecting to, and writing to, the Graphite listener.
    ///
    /// When the timeout is reached, the batch being sent is dropped without retrying.
    ///
    /// Defaults to 1 second.
    #[must_use]
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set how often the background reporter pushes a snapshot of the registry.
    ///
    /// Defaults to 10 seconds.
    ///
    /// # Errors
    ///
    /// If the interval is zero, an error is returned.
    pub fn with_flush_interval(mut self, flush_interval: Duration) -> Result<Self, BuildError> {
        if flush_interval.is_zero() {
            return Err(BuildError::InvalidFlushInterval);
        }

        self.flush_interval = flush_interval;
        Ok(self)
    }

    /// Set which kinds of metrics are reported.
    ///
    /// Defaults to every kind.
    #[must_use]
    pub fn with_kind_mask(mut self, kind_mask: MetricKindMask) -> Self {
        self.kind_mask = kind_mask;
        self
    }

    /// Builds a reporter for the given registry.
    ///
    /// Nothing is sent until [`GraphiteReporter::report`] is called or the reporter is spawned.
    pub fn build(self, registry: Registry) -> GraphiteReporter {
        let forwarder_config =
            ForwarderConfiguration { remote_addr: self.remote_addr, write_timeout: self.write_timeout };

        GraphiteReporter::new(
            registry,
            forwarder_config,
            self.prefix,
            self.flush_interval,
            self.kind_mask,
        )
    }

    /// Builds a reporter for the given registry and runs it on a background thread.
    ///
    /// # Errors
    ///
    /// If the background thread cannot be spawned, an error is returned.
    pub fn install(self, registry: Registry) -> Result<JoinHandle<()>, BuildError> {
        self.build(registry).spawn()
    }
}

impl Default for GraphiteBuilder {
    fn default() -> Self {
        GraphiteBuilder {
            remote_addr: RemoteAddr::from(SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT))),
            prefix: None,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            kind_mask: MetricKindMask::ALL,
        }
    }
}
