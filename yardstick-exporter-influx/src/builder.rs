use std::{thread, time::Duration};

use hyper::{header::HeaderValue, Uri};
use thiserror::Error;
use yardstick::{MetricKindMask, Registry};

use crate::exporter::{new_push_loop, ExporterFuture, InfluxReporter};

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8086/write?db=metrics";
const DEFAULT_PUSH_INTERVAL: Duration = Duration::from_secs(10);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors that could occur while building or installing an InfluxDB reporter.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The write endpoint was not a valid `http` URI.
    #[error("invalid write endpoint: {reason}")]
    InvalidEndpoint {
        /// Details about the parsing failure.
        reason: String,
    },

    /// The push interval was zero.
    #[error("push interval must be greater than zero")]
    InvalidPushInterval,

    /// A tag key or value was empty.
    #[error("tag keys and values must not be empty")]
    EmptyTag,

    /// The basic authentication credentials could not be encoded as a header.
    #[error("invalid basic authentication credentials")]
    InvalidCredentials,

    /// Failed to create the runtime, or the thread running it.
    #[error("failed to create Tokio runtime for reporter: {0}")]
    FailedToCreateRuntime(String),
}

/// Builder for an InfluxDB reporter.
#[derive(Clone, Debug)]
pub struct InfluxBuilder {
    endpoint: Uri,
    push_interval: Duration,
    username: Option<String>,
    password: Option<String>,
    tags: Vec<(String, String)>,
    request_timeout: Duration,
    kind_mask: MetricKindMask,
}

impl InfluxBuilder {
    /// Creates a new [`InfluxBuilder`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the write endpoint, including the database or bucket query parameters.
    ///
    /// Defaults to `http://127.0.0.1:8086/write?db=metrics`.
    ///
    /// # Errors
    ///
    /// If the endpoint is not a valid URI, or its scheme is not `http`, an error is returned.
    pub fn with_endpoint<T>(mut self, endpoint: T) -> Result<Self, BuildError>
    where
        T: AsRef<str>,
    {
        let endpoint = endpoint
            .as_ref()
            .parse::<Uri>()
            .map_err(|e| BuildError::InvalidEndpoint { reason: e.to_string() })?;

        if endpoint.scheme_str() != Some("http") {
            return Err(BuildError::InvalidEndpoint {
                reason: "only plain `http` endpoints are supported".to_string(),
            });
        }

        self.endpoint = endpoint;
        Ok(self)
    }

    /// Set how often the background reporter pushes a snapshot of the registry.
    ///
    /// Defaults to 10 seconds.
    ///
    /// # Errors
    ///
    /// If the interval is zero, an error is returned.
    pub fn with_push_interval(mut self, interval: Duration) -> Result<Self, BuildError> {
        if interval.is_zero() {
            return Err(BuildError::InvalidPushInterval);
        }

        self.push_interval = interval;
        Ok(self)
    }

    /// Set the username, and optionally the password, sent with every request as basic
    /// authentication.
    #[must_use]
    pub fn with_basic_auth<U: Into<String>>(mut self, username: U, password: Option<String>) -> Self {
        self.username = Some(username.into());
        self.password = password;
        self
    }

    /// Add a tag attached to every point, such as the host or service name.
    ///
    /// Setting the same key twice keeps the last value.
    ///
    /// # Errors
    ///
    /// If the key or the value is empty, an error is returned.  InfluxDB rejects the whole batch
    /// when any point carries an empty tag.
    pub fn with_tag<K, V>(mut self, key: K, value: V) -> Result<Self, BuildError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let key = key.into();
        let value = value.into();
        if key.is_empty() || value.is_empty() {
            return Err(BuildError::EmptyTag);
        }

        match self.tags.binary_search_by(|(k, _)| k.as_str().cmp(&key)) {
            Ok(idx) => self.tags[idx].1 = value,
            Err(idx) => self.tags.insert(idx, (key, value)),
        }
        Ok(self)
    }

    /// Set how long to wait for InfluxDB to answer a write request.
    ///
    /// Defaults to 5 seconds.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set which kinds of metrics are reported.
    ///
    /// Defaults to every kind.
    #[must_use]
    pub fn with_kind_mask(mut self, kind_mask: MetricKindMask) -> Self {
        self.kind_mask = kind_mask;
        self
    }

    /// Builds the reporter and the future that drives periodic pushes.
    ///
    /// The future does nothing until it is polled by a Tokio runtime.  The reporter can also be used
    /// on its own, to push on demand.
    ///
    /// # Errors
    ///
    /// If the basic authentication credentials cannot be encoded, an error is returned.
    pub fn build(self, registry: Registry) -> Result<(InfluxReporter, ExporterFuture), BuildError> {
        let auth = match &self.username {
            Some(username) => Some(basic_auth(username, self.password.as_deref())?),
            None => None,
        };

        let reporter = InfluxReporter::new(
            registry,
            self.endpoint,
            auth,
            self.tags,
            self.request_timeout,
            self.kind_mask,
        );
        let exporter = new_push_loop(reporter.clone(), self.push_interval);

        Ok((reporter, exporter))
    }

    /// Builds the reporter and starts pushing in the background.
    ///
    /// If called from within a Tokio runtime, the push loop is spawned on it.  Otherwise, a
    /// current-thread runtime is created on a dedicated thread to drive it.
    ///
    /// # Errors
    ///
    /// If the reporter cannot be built, or the runtime cannot be created, an error is returned.
    pub fn install(self, registry: Registry) -> Result<InfluxReporter, BuildError> {
        use tokio::runtime;

        let (reporter, exporter) = self.build(registry)?;

        if let Ok(handle) = runtime::Handle::try_current() {
            handle.spawn(exporter);
        } else {
            let runtime = runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| BuildError::FailedToCreateRuntime(e.to_string()))?;

            thread::Builder::new()
                .name("yardstick-exporter-influx".to_string())
                .spawn(move || runtime.block_on(exporter))
                .map_err(|e| BuildError::FailedToCreateRuntime(e.to_string()))?;
        }

        Ok(reporter)
    }
}

impl Default for InfluxBuilder {
    fn default() -> Self {
        InfluxBuilder {
            endpoint: Uri::from_static(DEFAULT_ENDPOINT),
            push_interval: DEFAULT_PUSH_INTERVAL,
            username: None,
            password: None,
            tags: Vec::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            kind_mask: MetricKindMask::ALL,
        }
    }
}

fn basic_auth(username: &str, password: Option<&str>) -> Result<HeaderValue, BuildError> {
    use base64::{prelude::BASE64_STANDARD, Engine as _};

    let credentials = format!("{username}:{}", password.unwrap_or_default());
    let encoded = BASE64_STANDARD.encode(credentials);

    let mut header = HeaderValue::from_str(&format!("Basic {encoded}"))
        .map_err(|_| BuildError::InvalidCredentials)?;
    header.set_sensitive(true);
    Ok(header)
}
