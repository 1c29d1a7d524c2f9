//! Sampling a field as a set of sensors sees it.

use std::sync::Arc;

use nalgebra::{Matrix2, Vector3};
use ndarray::Array3;
use sensim_core::{ConfigError, Field, FieldKind, Rotation, SensorData};

use crate::error::SpatialError;
use crate::integrator::SpatialIntegrator;

/// Sample `field` with the geometry in `sensor_data`.
///
/// Point sensors sample at their centres; sensors with a footprint take
/// the footprint average. Vector and tensor components are then rotated
/// into each sensor's frame. The result always has the shape
/// `sensor_data.meas_shape(field)`.
///
/// # Errors
///
/// Returns `Err` if the geometry fails validation, the field fails, or
/// the field returns the wrong shape.
pub fn sample_field_with_sensor_data(
    field: &Arc<dyn Field>,
    sensor_data: &SensorData,
) -> Result<Array3<f64>, SpatialError> {
    sensor_data.validate()?;
    let shape = sensor_data.meas_shape(field.as_ref());

    let mut values = match sensor_data.footprint() {
        Some(_) => SpatialIntegrator::from_sensor_data(field.clone(), sensor_data)?.into_averages(),
        None => {
            tracing::trace!(n_sensors = sensor_data.n_sensors(), "point sampling field");
            field.sample(
                sensor_data.positions.view(),
                sensor_data.sample_times.as_ref().map(|t| t.view()),
            )?
        }
    };
    shape.check(&values, "field sample")?;

    if let Some(angles) = &sensor_data.angles {
        rotate_to_sensor_frame(&mut values, angles, field.kind())?;
    }
    Ok(values)
}

/// Rotate global-frame components of `values` into each sensor's frame.
///
/// `values` has shape `(n_sensors, n_components, n_times)` with one
/// orientation per sensor. Scalars are left untouched. Vectors become
/// `Rᵀ v`; 2-D vectors use the full rotation and keep the in-plane part.
/// In-plane tensors `[xx, yy, xy]` become `Rᵀ T R` using the in-plane
/// block of `R`.
///
/// # Errors
///
/// Returns [`SpatialError::Config`] if the orientation count or the
/// component count disagrees with `values` and `kind`.
pub fn rotate_to_sensor_frame(
    values: &mut Array3<f64>,
    angles: &[Rotation],
    kind: FieldKind,
) -> Result<(), SpatialError> {
    let (n_sens, n_comps, n_t) = values.dim();
    if angles.len() != n_sens {
        return Err(ConfigError::ShapeMismatch {
            context: "sensor orientations".to_string(),
            declared: vec![n_sens],
            supplied: vec![angles.len()],
        }
        .into());
    }
    if let Some(implied) = kind.implied_components() {
        if implied != n_comps {
            return Err(ConfigError::invalid(
                "field kind",
                format!("{kind:?} implies {implied} components, field has {n_comps}"),
            )
            .into());
        }
    }

    match kind {
        FieldKind::Scalar => {}
        FieldKind::Vector { dims } => {
            let dims = dims as usize;
            for (s, rot) in angles.iter().enumerate() {
                for t in 0..n_t {
                    let mut v = Vector3::zeros();
                    for c in 0..dims {
                        v[c] = values[[s, c, t]];
                    }
                    let local = rot.inverse_transform_vector(&v);
                    for c in 0..dims {
                        values[[s, c, t]] = local[c];
                    }
                }
            }
        }
        FieldKind::Tensor2D => {
            for (s, rot) in angles.iter().enumerate() {
                let m = rot.matrix();
                let r2 = Matrix2::new(m[(0, 0)], m[(0, 1)], m[(1, 0)], m[(1, 1)]);
                for t in 0..n_t {
                    let (xx, yy, xy) = (values[[s, 0, t]], values[[s, 1, t]], values[[s, 2, t]]);
                    let global = Matrix2::new(xx, xy, xy, yy);
                    let local = r2.transpose() * global * r2;
                    values[[s, 0, t]] = local[(0, 0)];
                    values[[s, 1, t]] = local[(1, 1)];
                    values[[s, 2, t]] = local[(0, 1)];
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array1};
    use sensim_core::{euler_zyx_degrees, SpatialAverager};
    use sensim_test_utils::{constant_field, AnalyticField, CountingField};

    fn times() -> Array1<f64> {
        array![0.0, 1.0, 2.0]
    }

    fn disp_field() -> Arc<dyn Field> {
        Arc::new(AnalyticField::new(
            &["disp_x", "disp_y"],
            FieldKind::Vector { dims: 2 },
            times(),
            |_, _, out| {
                out[0] = 1.0;
                out[1] = 0.0;
            },
        ))
    }

    #[test]
    fn point_sampling_matches_field() {
        let field: Arc<dyn Field> =
            Arc::new(AnalyticField::scalar("t", times(), |p, t| p[0] + 10.0 * t));
        let sd = SensorData::new(array![[1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);
        let out = sample_field_with_sensor_data(&field, &sd).unwrap();
        assert_eq!(out.dim(), (2, 1, 3));
        assert_eq!(out[[1, 0, 2]], 22.0);
    }

    #[test]
    fn rect1_footprint_equals_point_sample() {
        let field: Arc<dyn Field> =
            Arc::new(AnalyticField::scalar("t", times(), |p, t| p[0] * p[1] + t));
        let points = SensorData::new(array![[0.3, 0.7, 0.0], [1.5, -2.0, 0.0]]);
        let footprint = points
            .clone()
            .with_spatial_averaging(SpatialAverager::Rect1, [2.0, 2.0, 0.0]);
        let a = sample_field_with_sensor_data(&field, &points).unwrap();
        let b = sample_field_with_sensor_data(&field, &footprint).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn explicit_times_change_the_time_axis() {
        let field: Arc<dyn Field> = Arc::new(constant_field(5.0, times()));
        let sd = SensorData::new(array![[0.0, 0.0, 0.0]]).with_sample_times(array![0.5, 1.5]);
        let out = sample_field_with_sensor_data(&field, &sd).unwrap();
        assert_eq!(out.dim(), (1, 1, 2));
    }

    #[test]
    fn vector_rotated_into_sensor_frame() {
        let sd = SensorData::new(array![[0.0, 0.0, 0.0]])
            .with_angles(vec![euler_zyx_degrees([90.0, 0.0, 0.0])]);
        let out = sample_field_with_sensor_data(&disp_field(), &sd).unwrap();
        // Global +x seen by a sensor yawed 90° lies along its local -y.
        assert_abs_diff_eq!(out[[0, 0, 0]], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out[[0, 1, 0]], -1.0, epsilon = 1e-12);
    }

    #[test]
    fn scalar_ignores_orientation() {
        let field: Arc<dyn Field> = Arc::new(constant_field(2.0, times()));
        let sd = SensorData::new(array![[0.0, 0.0, 0.0]])
            .with_angles(vec![euler_zyx_degrees([30.0, 10.0, 5.0])]);
        let out = sample_field_with_sensor_data(&field, &sd).unwrap();
        assert!(out.iter().all(|&v| v == 2.0));
    }

    #[test]
    fn tensor_rotation_preserves_trace() {
        let mut values = Array3::zeros((1, 3, 1));
        values[[0, 0, 0]] = 2.0;
        values[[0, 1, 0]] = -1.0;
        values[[0, 2, 0]] = 0.5;
        let angles = vec![euler_zyx_degrees([37.0, 0.0, 0.0])];
        rotate_to_sensor_frame(&mut values, &angles, FieldKind::Tensor2D).unwrap();
        assert_abs_diff_eq!(values[[0, 0, 0]] + values[[0, 1, 0]], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn tensor_rotated_ninety_degrees_swaps_normals() {
        let mut values = Array3::zeros((1, 3, 1));
        values[[0, 0, 0]] = 2.0;
        values[[0, 1, 0]] = -1.0;
        values[[0, 2, 0]] = 0.5;
        let angles = vec![euler_zyx_degrees([90.0, 0.0, 0.0])];
        rotate_to_sensor_frame(&mut values, &angles, FieldKind::Tensor2D).unwrap();
        assert_abs_diff_eq!(values[[0, 0, 0]], -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(values[[0, 1, 0]], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(values[[0, 2, 0]], -0.5, epsilon = 1e-12);
    }

    #[test]
    fn component_count_must_match_kind() {
        let mut values = Array3::zeros((1, 2, 1));
        let angles = vec![Rotation::identity()];
        assert!(rotate_to_sensor_frame(&mut values, &angles, FieldKind::Tensor2D).is_err());
    }

    #[test]
    fn invalid_geometry_is_rejected_before_sampling() {
        let counting = Arc::new(CountingField::new(constant_field(1.0, times())));
        let field: Arc<dyn Field> = counting.clone();
        let sd = SensorData::new(array![[0.0, 0.0]]);
        assert!(matches!(
            sample_field_with_sensor_data(&field, &sd),
            Err(SpatialError::Config(_))
        ));
        assert_eq!(counting.calls(), 0);
    }
}
