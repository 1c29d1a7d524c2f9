//! Error types for spatial integration and sampling.

use std::error::Error;
use std::fmt;

use sensim_core::{ConfigError, FieldError, ShapeError};

/// Errors arising from footprint integration or field sampling.
#[derive(Clone, Debug, PartialEq)]
pub enum SpatialError {
    /// The field collaborator failed.
    Field(FieldError),
    /// A sampled or reduced array broke the measurement shape contract.
    Shape(ShapeError),
    /// The integrator or sensor geometry is misconfigured.
    Config(ConfigError),
}

impl fmt::Display for SpatialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(e) => write!(f, "field: {e}"),
            Self::Shape(e) => write!(f, "{e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl Error for SpatialError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Field(e) => Some(e),
            Self::Shape(e) => Some(e),
            Self::Config(e) => Some(e),
        }
    }
}

impl From<FieldError> for SpatialError {
    fn from(e: FieldError) -> Self {
        Self::Field(e)
    }
}

impl From<ShapeError> for SpatialError {
    fn from(e: ShapeError) -> Self {
        Self::Shape(e)
    }
}

impl From<ConfigError> for SpatialError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
