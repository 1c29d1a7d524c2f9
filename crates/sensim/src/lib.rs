//! sensim: synthetic sensor measurements for simulation validation.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all sensim sub-crates. For most users, adding `sensim` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use ndarray::{array, Array1, Array3, ArrayView1, ArrayView2};
//! use sensim::prelude::*;
//!
//! // A steady linear temperature field, T = 20 + 2x.
//! struct Plate {
//!     components: Vec<String>,
//! }
//!
//! impl Field for Plate {
//!     fn sample(
//!         &self,
//!         points: ArrayView2<'_, f64>,
//!         times: Option<ArrayView1<'_, f64>>,
//!     ) -> Result<Array3<f64>, FieldError> {
//!         let n_t = times.map_or(1, |t| t.len());
//!         Ok(Array3::from_shape_fn((points.nrows(), 1, n_t), |(i, _, _)| {
//!             20.0 + 2.0 * points[[i, 0]]
//!         }))
//!     }
//!     fn time_steps(&self) -> Array1<f64> {
//!         array![0.0]
//!     }
//!     fn components(&self) -> &[String] {
//!         &self.components
//!     }
//! }
//!
//! let field: Arc<dyn Field> = Arc::new(Plate { components: vec!["T".into()] });
//! let positions = sensor_grid([4, 1, 1], [0.0, 5.0], [0.0, 1.0], [0.0, 0.0]).unwrap();
//! let sensor_data = SensorData::new(positions);
//!
//! let mut array = SensorArray::new(
//!     sensor_data.clone(),
//!     field,
//!     Some(SensorDescriptor::temperature()),
//! )
//! .unwrap();
//!
//! // A 0.5 °C calibration offset, then 0.1 °C thermocouple noise.
//! let shape = array.get_measurement_shape();
//! let systematic = ErrorIntegrator::new(
//!     vec![Box::new(Offset::new(0.5).unwrap())],
//!     sensor_data.clone(),
//!     shape,
//!     ErrIntOpts::default(),
//! )
//! .unwrap();
//! let noise = RandomGenerator::normal(0.0, 0.1, Seed::Fixed(42)).unwrap();
//! let random = ErrorIntegrator::new(
//!     vec![Box::new(RandomCalculator::absolute(noise))],
//!     sensor_data,
//!     shape,
//!     ErrIntOpts::default(),
//! )
//! .unwrap();
//! array.set_systematic_error_integrator(systematic).unwrap();
//! array.set_random_error_integrator(random).unwrap();
//!
//! let measured = array.get_measurements().unwrap().clone();
//! assert_eq!(measured.dim(), (4, 1, 1));
//! let truth = array.get_truth().unwrap().clone();
//! assert!((measured[[0, 0, 0]] - truth[[0, 0, 0]] - 0.5).abs() < 1.0);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the
//! prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `sensim-core` | `Field` trait, `SensorData`, `MeasShape`, orientations, errors |
//! | [`spatial`] | `sensim-spatial` | Quadrature rules, footprint integration, field sampling |
//! | [`uncertainty`] | `sensim-uncertainty` | Error calculators, random generators, error chains |
//! | [`array`] | `sensim-array` | Sensor arrays, descriptors, layout tools |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and traits (`sensim-core`).
///
/// Contains the [`types::Field`] collaborator trait, sensor geometry
/// ([`types::SensorData`]), the measurement shape contract and the shared
/// error types.
pub use sensim_core as types;

/// Footprint quadrature and field sampling (`sensim-spatial`).
///
/// [`spatial::SpatialIntegrator`] averages a field over each sensor's
/// footprint with a [`spatial::QuadratureRule`].
pub use sensim_spatial as spatial;

/// Error calculators and chains (`sensim-uncertainty`).
///
/// Implement [`uncertainty::ErrorCalculator`] for custom error sources and
/// compose them with [`uncertainty::ErrorIntegrator`].
pub use sensim_uncertainty as uncertainty;

/// Sensor arrays (`sensim-array`).
pub use sensim_array as array;

/// Common imports for typical sensim usage.
///
/// ```rust
/// use sensim::prelude::*;
/// ```
pub mod prelude {
    // Core
    pub use sensim_core::{
        euler_zyx_degrees, ConfigError, Field, FieldError, FieldKind, MeasShape, Rotation,
        SensorData, ShapeError, SpatialAverager,
    };

    // Spatial
    pub use sensim_spatial::{sample_field_with_sensor_data, SpatialError, SpatialIntegrator};

    // Uncertainty
    pub use sensim_uncertainty::{
        AngleOffsetBias, Calibration, ChainError, ChainMode, Digitisation, ErrIntOpts, ErrType,
        ErrorCalculator, ErrorIntegrator, FieldBias, FieldErrorData, Offset, OffsetPercent,
        RandomCalculator, RandomDist, RandomGenerator, RoundMethod, RoundOff, Saturation, Seed,
        SpatialAverageBias,
    };

    // Arrays
    pub use sensim_array::{sensor_grid, SensorArray, SensorArrayError, SensorDescriptor};
}
