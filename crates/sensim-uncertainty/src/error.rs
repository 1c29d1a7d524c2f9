//! Error types for calculators and error chains.

use std::error::Error;
use std::fmt;

use sensim_core::{ConfigError, FieldError, ShapeError};
use sensim_spatial::SpatialError;

/// Failure inside a single error calculator.
#[derive(Clone, Debug, PartialEq)]
pub enum CalcError {
    /// Re-sampling the field (point or footprint) failed.
    Spatial(SpatialError),
    /// An intermediate array had the wrong shape.
    Shape(ShapeError),
    /// The calculator's parameters do not fit the geometry it was given.
    Config(ConfigError),
    /// Any other calculator-specific failure.
    Failed {
        /// Description of the failure.
        reason: String,
    },
}

impl CalcError {
    /// Shorthand for [`CalcError::Failed`].
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for CalcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spatial(e) => write!(f, "{e}"),
            Self::Shape(e) => write!(f, "{e}"),
            Self::Config(e) => write!(f, "{e}"),
            Self::Failed { reason } => write!(f, "{reason}"),
        }
    }
}

impl Error for CalcError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Spatial(e) => Some(e),
            Self::Shape(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Failed { .. } => None,
        }
    }
}

impl From<SpatialError> for CalcError {
    fn from(e: SpatialError) -> Self {
        Self::Spatial(e)
    }
}

impl From<FieldError> for CalcError {
    fn from(e: FieldError) -> Self {
        Self::Spatial(SpatialError::Field(e))
    }
}

impl From<ShapeError> for CalcError {
    fn from(e: ShapeError) -> Self {
        Self::Shape(e)
    }
}

impl From<ConfigError> for CalcError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Errors from building or running an error chain.
#[derive(Clone, Debug, PartialEq)]
pub enum ChainError {
    /// No calculators were supplied.
    EmptyChain,
    /// The chain's configuration or sensor geometry is invalid.
    Config(ConfigError),
    /// The basis handed to the chain does not have the declared shape.
    BasisShape(ShapeError),
    /// A calculator returned an error array of the wrong shape.
    ShapeMismatch {
        /// Position of the calculator in the chain.
        index: usize,
        /// Name of the calculator.
        name: String,
        /// Declared measurement shape.
        expected: Vec<usize>,
        /// Shape the calculator returned.
        actual: Vec<usize>,
    },
    /// A calculator failed.
    CalculatorFailed {
        /// Position of the calculator in the chain.
        index: usize,
        /// Name of the calculator.
        name: String,
        /// The calculator's own error.
        source: CalcError,
    },
    /// Results were requested before the chain has run.
    NotComputed,
    /// Per-source errors were requested but storing them is disabled.
    NotStored,
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyChain => write!(f, "error chain has no calculators"),
            Self::Config(e) => write!(f, "{e}"),
            Self::BasisShape(e) => write!(f, "{e}"),
            Self::ShapeMismatch {
                index,
                name,
                expected,
                actual,
            } => write!(
                f,
                "calculator #{index} '{name}' returned shape {actual:?}, expected {expected:?}"
            ),
            Self::CalculatorFailed {
                index,
                name,
                source,
            } => write!(f, "calculator #{index} '{name}' failed: {source}"),
            Self::NotComputed => write!(f, "errors have not been calculated yet"),
            Self::NotStored => write!(f, "errors by source are not stored for this chain"),
        }
    }
}

impl Error for ChainError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::BasisShape(e) => Some(e),
            Self::CalculatorFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for ChainError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
