use std::time::Duration;

use thiserror::Error;

/// Default number of values retained by a sample.
pub const DEFAULT_RESERVOIR_SIZE: usize = 1028;

/// Default decay factor for exponentially-decaying samples.
///
/// Heavily biases the reservoir towards the last five minutes of values.
pub const DEFAULT_ALPHA: f64 = 0.015;

/// Default interval at which an EWMA commits its accumulated events.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(5);

/// Errors that could occur while building an instrument.
#[derive(Debug, Error, PartialEq)]
pub enum BuildError {
    /// The reservoir size was zero.
    #[error("reservoir size must be greater than zero")]
    InvalidReservoirSize,

    /// The decay factor was out of range.
    ///
    /// Sample decay factors must be finite and positive; moving average smoothing constants must
    /// also be at most 1.
    #[error("invalid decay factor {0}: out of range")]
    InvalidAlpha(f64),

    /// The tick interval for a moving average was zero.
    #[error("tick interval must be greater than zero")]
    InvalidTickInterval,
}

pub(crate) fn validate_reservoir_size(reservoir_size: usize) -> Result<usize, BuildError> {
    if reservoir_size == 0 {
        return Err(BuildError::InvalidReservoirSize);
    }

    Ok(reservoir_size)
}

pub(crate) fn validate_alpha(alpha: f64) -> Result<f64, BuildError> {
    if !alpha.is_finite() || alpha <= 0.0 {
        return Err(BuildError::InvalidAlpha(alpha));
    }

    Ok(alpha)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation() {
        assert_eq!(validate_reservoir_size(0), Err(BuildError::InvalidReservoirSize));
        assert_eq!(validate_reservoir_size(1), Ok(1));

        assert_eq!(validate_alpha(DEFAULT_ALPHA), Ok(DEFAULT_ALPHA));
        assert_eq!(validate_alpha(0.0), Err(BuildError::InvalidAlpha(0.0)));
        assert_eq!(validate_alpha(-1.0), Err(BuildError::InvalidAlpha(-1.0)));
        assert!(validate_alpha(f64::NAN).is_err());
        assert!(validate_alpha(f64::INFINITY).is_err());
    }
}
