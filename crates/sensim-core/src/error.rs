//! Error types shared across the sensim workspace.
//!
//! Three families, matching how failures surface at runtime:
//! configuration errors (raised at construction), shape-contract
//! violations (raised at first use) and field-collaborator failures.

use std::error::Error;
use std::fmt;

/// Invalid configuration detected at construction time.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// A parameter is outside its valid range.
    InvalidParameter {
        /// Which parameter (e.g. `"base"`, `"min/max"`).
        name: String,
        /// Why the value was rejected.
        reason: String,
    },
    /// A declared shape disagrees with the shape actually supplied.
    ShapeMismatch {
        /// What was being configured.
        context: String,
        /// Shape that was declared.
        declared: Vec<usize>,
        /// Shape that was supplied.
        supplied: Vec<usize>,
    },
    /// Sensor geometry failed validation.
    InvalidSensorData {
        /// Description of the validation failure.
        reason: String,
    },
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidParameter`].
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameter { name, reason } => {
                write!(f, "invalid parameter '{name}': {reason}")
            }
            Self::ShapeMismatch {
                context,
                declared,
                supplied,
            } => write!(
                f,
                "{context}: declared shape {declared:?} but supplied {supplied:?}"
            ),
            Self::InvalidSensorData { reason } => write!(f, "invalid sensor data: {reason}"),
        }
    }
}

impl Error for ConfigError {}

/// An array disagreed with the measurement shape contract at first use.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShapeError {
    /// Where the violation was detected.
    pub context: String,
    /// Shape required by the contract.
    pub expected: Vec<usize>,
    /// Shape actually produced.
    pub actual: Vec<usize>,
}

impl ShapeError {
    /// Build a shape error for `context`.
    pub fn new(context: impl Into<String>, expected: &[usize], actual: &[usize]) -> Self {
        Self {
            context: context.into(),
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "shape contract violated in {}: expected {:?}, got {:?}",
            self.context, self.expected, self.actual
        )
    }
}

impl Error for ShapeError {}

/// Failures reported by a [`Field`](crate::Field) collaborator.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldError {
    /// The collaborator could not sample the requested points or times.
    SamplingFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// The point array passed to `sample` is not `(n_points, 3)`.
    InvalidPoints {
        /// Shape that was passed.
        shape: Vec<usize>,
    },
    /// A component name is not provided by the field.
    UnknownComponent {
        /// The requested component name.
        name: String,
    },
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SamplingFailed { reason } => write!(f, "field sampling failed: {reason}"),
            Self::InvalidPoints { shape } => {
                write!(f, "sample points must have shape (n, 3), got {shape:?}")
            }
            Self::UnknownComponent { name } => write!(f, "unknown field component '{name}'"),
        }
    }
}

impl Error for FieldError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display_names_parameter() {
        let err = ConfigError::invalid("base", "must be > 0, got -1");
        let msg = format!("{err}");
        assert!(msg.contains("'base'"));
        assert!(msg.contains("must be > 0"));
    }

    #[test]
    fn shape_error_display_reports_both_shapes() {
        let err = ShapeError::new("truth", &[2, 1, 3], &[2, 1, 4]);
        let msg = format!("{err}");
        assert!(msg.contains("truth"));
        assert!(msg.contains("[2, 1, 3]"));
        assert!(msg.contains("[2, 1, 4]"));
    }

    #[test]
    fn field_error_display() {
        let err = FieldError::UnknownComponent {
            name: "disp_z".to_string(),
        };
        assert_eq!(format!("{err}"), "unknown field component 'disp_z'");
    }
}
