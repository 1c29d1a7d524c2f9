//! Benchmark profiles for the sensim measurement simulation engine.
//!
//! Provides pre-built [`SensorArray`] profiles for benchmarking:
//!
//! - [`reference_profile`]: 10x10 thermocouple grid (100 sensors), 2x2
//!   Gauss footprints, systematic and random chains
//! - [`stress_profile`]: 50x20 grid (1000 sensors) with 3x3 Gauss footprints
//! - [`reference_field`]: the analytic heated plate both profiles observe

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::f64::consts::PI;
use std::sync::Arc;

use ndarray::Array1;
use sensim_array::{sensor_grid, SensorArray, SensorArrayError, SensorDescriptor};
use sensim_core::{euler_zyx_degrees, Field, SensorData, SpatialAverager};
use sensim_test_utils::AnalyticField;
use sensim_uncertainty::{
    ChainMode, Digitisation, ErrIntOpts, ErrorCalculator, ErrorIntegrator, Offset,
    RandomCalculator, RandomGenerator, RoundMethod, Saturation, Seed,
};

/// Plate extents in x and y.
pub const PLATE: [f64; 2] = [100.0, 50.0];

/// A 100x50 plate heated in the middle, warming over 11 time steps.
///
/// `T = 20 + 80 sin(πx/100) sin(πy/50) (1 - e^(-t))`.
pub fn reference_field() -> Arc<dyn Field> {
    let times = Array1::linspace(0.0, 10.0, 11);
    Arc::new(AnalyticField::scalar("temperature", times, |p, t| {
        20.0 + 80.0 * (PI * p[0] / PLATE[0]).sin() * (PI * p[1] / PLATE[1]).sin() * (1.0 - (-t).exp())
    }))
}

/// Build the reference profile: 100 sensors, Gauss 2x2 footprints.
///
/// Systematic chain (dependent): +0.5 offset, 12-bit digitisation over a
/// 256 °C range, saturation at [0, 200]. Random chain: N(0, 0.25).
pub fn reference_profile(seed: u64) -> Result<SensorArray, SensorArrayError> {
    profile([10, 10], SpatialAverager::Gauss4, seed)
}

/// Build a stress profile: 1000 sensors, Gauss 3x3 footprints.
///
/// Same chains as [`reference_profile`].
pub fn stress_profile(seed: u64) -> Result<SensorArray, SensorArrayError> {
    profile([50, 20], SpatialAverager::Gauss9, seed)
}

fn profile(
    [nx, ny]: [usize; 2],
    averager: SpatialAverager,
    seed: u64,
) -> Result<SensorArray, SensorArrayError> {
    let positions = sensor_grid([nx, ny, 1], [0.0, PLATE[0]], [0.0, PLATE[1]], [0.0, 0.0])?;
    let n = positions.nrows();
    let angles = (0..n)
        .map(|i| euler_zyx_degrees([(i % 4) as f64 * 15.0, 0.0, 0.0]))
        .collect();
    let sensor_data = SensorData::new(positions)
        .with_angles(angles)
        .with_spatial_averaging(averager, [2.0, 2.0, 0.0]);

    let mut array = SensorArray::new(
        sensor_data.clone(),
        reference_field(),
        Some(SensorDescriptor::temperature()),
    )?;
    let shape = array.get_measurement_shape();

    let systematic: Vec<Box<dyn ErrorCalculator>> = vec![
        Box::new(Offset::new(0.5)?),
        Box::new(Digitisation::new(4096.0 / 256.0, RoundMethod::Round)?),
        Box::new(Saturation::new(0.0, 200.0)?),
    ];
    let systematic = ErrorIntegrator::new(
        systematic,
        sensor_data.clone(),
        shape,
        ErrIntOpts::with_mode(ChainMode::Dependent),
    )
    .map_err(SensorArrayError::Systematic)?;

    let noise = RandomGenerator::normal(0.0, 0.25, Seed::Fixed(seed))?;
    let random: Vec<Box<dyn ErrorCalculator>> = vec![Box::new(RandomCalculator::absolute(noise))];
    let random = ErrorIntegrator::new(random, sensor_data, shape, ErrIntOpts::default())
        .map_err(SensorArrayError::Random)?;

    array.set_systematic_error_integrator(systematic)?;
    array.set_random_error_integrator(random)?;
    Ok(array)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensim_core::MeasShape;

    #[test]
    fn reference_profile_measures() {
        let mut array = reference_profile(42).unwrap();
        assert_eq!(array.get_measurement_shape(), MeasShape::new(100, 1, 11));
        let meas = array.get_measurements().unwrap();
        assert!(meas.iter().all(|&v| v > 15.0 && v < 110.0));
    }

    #[test]
    fn stress_profile_has_1000_sensors() {
        let array = stress_profile(42).unwrap();
        assert_eq!(array.get_measurement_shape().n_sensors, 1000);
    }

    #[test]
    fn profiles_are_deterministic() {
        let mut a = reference_profile(7).unwrap();
        let mut b = reference_profile(7).unwrap();
        assert_eq!(a.get_measurements().unwrap(), b.get_measurements().unwrap());
    }
}
