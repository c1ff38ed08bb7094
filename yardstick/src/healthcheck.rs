use std::fmt;

use crate::{handles::HealthcheckFn, HealthcheckSnapshot};

/// The outcome of running a healthcheck.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HealthStatus {
    healthy: bool,
    message: Option<String>,
}

impl HealthStatus {
    /// A passing result with no message.
    pub fn healthy() -> HealthStatus {
        HealthStatus { healthy: true, message: None }
    }

    /// A failing result with the given reason.
    pub fn unhealthy<S: Into<String>>(message: S) -> HealthStatus {
        HealthStatus { healthy: false, message: Some(message.into()) }
    }

    /// Whether or not the check passed.
    pub fn is_healthy(&self) -> bool {
        self.healthy
    }

    /// Gets the failure reason, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl From<Result<(), String>> for HealthStatus {
    fn from(result: Result<(), String>) -> Self {
        match result {
            Ok(()) => HealthStatus::healthy(),
            Err(message) => HealthStatus::unhealthy(message),
        }
    }
}

impl From<HealthStatus> for HealthcheckSnapshot {
    fn from(status: HealthStatus) -> Self {
        HealthcheckSnapshot { healthy: status.healthy, message: status.message }
    }
}

/// A healthcheck backed by a callback.
///
/// The callback runs every time the check is read, including by reporters.
pub struct FnHealthcheck {
    f: Box<dyn Fn() -> Result<(), String> + Send + Sync>,
}

impl FnHealthcheck {
    /// Creates a new `FnHealthcheck` running `f`.
    pub fn new<F>(f: F) -> FnHealthcheck
    where
        F: Fn() -> Result<(), String> + Send + Sync + 'static,
    {
        FnHealthcheck { f: Box::new(f) }
    }
}

impl fmt::Debug for FnHealthcheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHealthcheck").finish_non_exhaustive()
    }
}

impl HealthcheckFn for FnHealthcheck {
    fn check(&self) -> HealthStatus {
        (self.f)().into()
    }
}
