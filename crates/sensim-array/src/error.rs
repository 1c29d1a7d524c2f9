//! Error type for sensor arrays.

use std::error::Error;
use std::fmt;

use sensim_core::ConfigError;
use sensim_spatial::SpatialError;
use sensim_uncertainty::ChainError;

/// Errors from building or evaluating a [`SensorArray`](crate::SensorArray).
#[derive(Clone, Debug, PartialEq)]
pub enum SensorArrayError {
    /// Inconsistent configuration (geometry, field, or an error chain
    /// whose shape does not match the array).
    Config(ConfigError),
    /// Sampling the truth failed.
    Truth(SpatialError),
    /// The systematic error chain failed.
    Systematic(ChainError),
    /// The random error chain failed.
    Random(ChainError),
}

impl fmt::Display for SensorArrayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Truth(e) => write!(f, "truth: {e}"),
            Self::Systematic(e) => write!(f, "systematic errors: {e}"),
            Self::Random(e) => write!(f, "random errors: {e}"),
        }
    }
}

impl Error for SensorArrayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Truth(e) => Some(e),
            Self::Systematic(e) | Self::Random(e) => Some(e),
        }
    }
}

impl From<ConfigError> for SensorArrayError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<SpatialError> for SensorArrayError {
    fn from(e: SpatialError) -> Self {
        Self::Truth(e)
    }
}
