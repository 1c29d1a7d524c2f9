//! Footprint quadrature and field sampling for sensim sensors.
//!
//! A physical sensor integrates the field over a finite area rather than
//! at a point. This crate turns point samples into footprint averages:
//!
//! - [`QuadratureRule`]: offset points and weights on the canonical
//!   `[-1, 1]²` domain (rectangle and Gauss-Legendre rules).
//! - [`SpatialIntegrator`]: batches every footprint point of every sensor
//!   into one field call and reduces to integrals or averages.
//! - [`sample_field_with_sensor_data`]: the single entry point that turns
//!   a [`SensorData`](sensim_core::SensorData) into a measurement-shaped
//!   array, point or footprint, in each sensor's frame.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod error;
pub mod integrator;
pub mod rule;
pub mod sampler;

pub use error::SpatialError;
pub use integrator::{build_spatial_averager, SpatialIntegrator};
pub use rule::QuadratureRule;
pub use sampler::{rotate_to_sensor_frame, sample_field_with_sensor_data};
