//! Core types and traits for the sensim measurement simulation engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! fundamental abstractions used throughout the workspace: the [`Field`]
//! collaborator trait, sensor geometry ([`SensorData`]), the measurement
//! shape contract ([`MeasShape`]), sensor orientations and error types.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod field;
pub mod rotation;
pub mod sensor_data;
pub mod shape;

pub use error::{ConfigError, FieldError, ShapeError};
pub use field::{Field, FieldKind};
pub use rotation::{euler_zyx_degrees, Rotation};
pub use sensor_data::{SensorData, SpatialAverager};
pub use shape::MeasShape;
