use std::time::{Duration, SystemTime, UNIX_EPOCH};

use http_body_util::{BodyExt, Collected, Full};
use hyper::{
    body::Bytes,
    header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Method, Request, Uri,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use tracing::{debug, error, trace};
use yardstick::{MetricKindMask, Registry};

use super::ExporterFuture;
use crate::writer::LineWriter;

/// Errors that could occur while pushing to InfluxDB.
#[derive(Debug, Error)]
pub enum PushError {
    /// The request could not be built.
    #[error("failed to build write request: {0}")]
    Request(String),

    /// The request could not be sent, or no response was received.
    #[error("failed to send write request: {0}")]
    Client(#[from] hyper_util::client::legacy::Error),

    /// No response was received before the request timeout.
    #[error("write request timed out")]
    Timeout,

    /// InfluxDB answered with a non-success status.
    #[error("unexpected status {status} from InfluxDB: {body}")]
    UnexpectedStatus {
        /// The HTTP status code.
        status: u16,
        /// The response body, which usually contains the reason the write was rejected.
        body: String,
    },
}

/// Pushes snapshots of a [`Registry`] to an InfluxDB write endpoint.
///
/// Cloning a reporter is cheap; clones share the same registry and connection pool.
#[derive(Clone)]
pub struct InfluxReporter {
    registry: Registry,
    client: Client<HttpConnector, Full<Bytes>>,
    endpoint: Uri,
    auth: Option<HeaderValue>,
    tags: Vec<(String, String)>,
    request_timeout: Duration,
    kind_mask: MetricKindMask,
}

impl InfluxReporter {
    pub(crate) fn new(
        registry: Registry,
        endpoint: Uri,
        auth: Option<HeaderValue>,
        tags: Vec<(String, String)>,
        request_timeout: Duration,
        kind_mask: MetricKindMask,
    ) -> Self {
        let client = Client::builder(TokioExecutor::new()).build_http();

        InfluxReporter { registry, client, endpoint, auth, tags, request_timeout, kind_mask }
    }

    /// Sends one snapshot of the registry, returning the number of points written.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// If the request fails, times out, or InfluxDB answers with a non-2xx status, an error is
    /// returned.  The points are not retried.
    pub async fn push(&self) -> Result<usize, PushError> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
            .unwrap_or(0);

        let mut writer = LineWriter::new(&self.tags);
        let mut points = 0;
        for (name, snapshot) in self.registry.snapshot_matching(self.kind_mask) {
            if writer.write_snapshot(&name, &snapshot, timestamp) {
                points += 1;
            }
        }

        if points == 0 {
            trace!("No metrics to push.");
            return Ok(0);
        }

        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(self.endpoint.clone())
            .header(CONTENT_TYPE, "text/plain; charset=utf-8");
        if let Some(auth) = &self.auth {
            builder = builder.header(AUTHORIZATION, auth.clone());
        }
        let req = builder
            .body(Full::new(Bytes::from(writer.into_inner())))
            .map_err(|e| PushError::Request(e.to_string()))?;

        let response = tokio::time::timeout(self.request_timeout, self.client.request(req))
            .await
            .map_err(|_| PushError::Timeout)??;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .into_body()
                .collect()
                .await
                .map(Collected::to_bytes)
                .map_err(|_| ())
                .and_then(|b| String::from_utf8(b[..].to_vec()).map_err(|_| ()))
                .unwrap_or_else(|()| String::from("<failed to read response body>"));

            return Err(PushError::UnexpectedStatus { status: status.as_u16(), body });
        }

        Ok(points)
    }
}

// Creates an ExporterFuture that pushes after every `interval`, forever.
pub(crate) fn new_push_loop(reporter: InfluxReporter, interval: Duration) -> ExporterFuture {
    Box::pin(async move {
        loop {
            tokio::time::sleep(interval).await;

            match reporter.push().await {
                Ok(points) => debug!(points, "Pushed metrics to InfluxDB."),
                Err(e) => error!(error = %e, "Failed to push metrics to InfluxDB."),
            }
        }
    })
}
