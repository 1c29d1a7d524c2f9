//! Footprint integration over every sensor in one batched field call.
//!
//! For `n_sensors` sensors and a rule with `n_points` offsets, the
//! integrator builds `n_points × n_sensors` global points (offset-major:
//! point `k * n_sensors + s` is offset `k` of sensor `s`), samples the
//! field once, and reduces over the offset axis.

use std::sync::Arc;

use nalgebra::Vector3;
use ndarray::{Array1, Array2, Array3, Array4, Axis};
use sensim_core::{ConfigError, Field, MeasShape, Rotation, SensorData, ShapeError};

use crate::error::SpatialError;
use crate::rule::QuadratureRule;

/// Integrates a field over the rectangular footprint of each sensor.
///
/// Construction samples the field immediately, so a constructed
/// integrator always holds integrals and averages consistent with its
/// current geometry.
pub struct SpatialIntegrator {
    rule: QuadratureRule,
    field: Arc<dyn Field>,
    centres: Array2<f64>,
    angles: Vec<Rotation>,
    dims: [f64; 3],
    sample_times: Option<Array1<f64>>,
    integrals: Array3<f64>,
    averages: Array3<f64>,
}

impl std::fmt::Debug for SpatialIntegrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIntegrator")
            .field("n_points", &self.rule.n_points())
            .field("n_sensors", &self.centres.nrows())
            .field("dims", &self.dims)
            .finish_non_exhaustive()
    }
}

impl SpatialIntegrator {
    /// Build an integrator for `rule` over footprints of full extents
    /// `dims`, placed and oriented as in `sensor_data`.
    ///
    /// `sensor_data`'s own averager and extents are ignored; `rule` and
    /// `dims` take precedence.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the geometry is invalid, the in-plane extents are
    /// not finite and positive, or the initial field sample fails.
    pub fn new(
        rule: QuadratureRule,
        field: Arc<dyn Field>,
        sensor_data: &SensorData,
        dims: [f64; 3],
    ) -> Result<Self, SpatialError> {
        if !(dims[0].is_finite() && dims[1].is_finite() && dims[0] > 0.0 && dims[1] > 0.0) {
            return Err(ConfigError::invalid(
                "spatial_dims",
                format!("x and y extents must be finite and positive, got {dims:?}"),
            )
            .into());
        }
        let mut positions_only = SensorData::new(sensor_data.positions.clone());
        positions_only.sample_times = sensor_data.sample_times.clone();
        positions_only.angles = sensor_data.angles.clone();
        positions_only.validate()?;

        let shape = positions_only.meas_shape(field.as_ref());
        let mut integrator = Self {
            rule,
            field,
            angles: positions_only.angles_or_identity(),
            centres: positions_only.positions,
            dims,
            sample_times: positions_only.sample_times,
            integrals: shape.zeros(),
            averages: shape.zeros(),
        };
        let (integrals, averages) = integrator.evaluate(
            &integrator.centres,
            &integrator.angles,
            integrator.sample_times.as_ref(),
        )?;
        integrator.integrals = integrals;
        integrator.averages = averages;
        Ok(integrator)
    }

    /// Build from the footprint carried by `sensor_data`.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::Config`] if `sensor_data` has no averager
    /// or no extents, plus everything [`SpatialIntegrator::new`] returns.
    pub fn from_sensor_data(
        field: Arc<dyn Field>,
        sensor_data: &SensorData,
    ) -> Result<Self, SpatialError> {
        let (averager, dims) = sensor_data.footprint().ok_or_else(|| {
            ConfigError::InvalidSensorData {
                reason: "spatial integration needs both spatial_averager and spatial_dims"
                    .to_string(),
            }
        })?;
        Self::new(QuadratureRule::for_averager(averager), field, sensor_data, dims)
    }

    /// Recompute integrals, optionally at new centres and times.
    ///
    /// New centres must keep the sensor count. New times replace the
    /// stored ones for this and later calls. On error the integrator
    /// keeps its previous geometry and results.
    pub fn calc_integrals(
        &mut self,
        centres: Option<&Array2<f64>>,
        sample_times: Option<&Array1<f64>>,
    ) -> Result<&Array3<f64>, SpatialError> {
        self.recompute_with(centres, sample_times)?;
        Ok(&self.integrals)
    }

    /// Recompute averages, optionally at new centres and times.
    pub fn calc_averages(
        &mut self,
        centres: Option<&Array2<f64>>,
        sample_times: Option<&Array1<f64>>,
    ) -> Result<&Array3<f64>, SpatialError> {
        self.recompute_with(centres, sample_times)?;
        Ok(&self.averages)
    }

    /// Recompute averages for the centres, orientations and times of
    /// `sensor_data`, keeping this integrator's rule and extents.
    ///
    /// All three are taken from `sensor_data`. Missing times mean the
    /// field's own time steps, not the times used before.
    pub fn calc_averages_for(
        &mut self,
        sensor_data: &SensorData,
    ) -> Result<&Array3<f64>, SpatialError> {
        let centres = self.checked_centres(&sensor_data.positions)?;
        let angles = self.checked_angles(sensor_data.angles_or_identity())?;
        self.recompute(centres, angles, sensor_data.sample_times.clone())?;
        Ok(&self.averages)
    }

    /// Replace sensor orientations and recompute.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the count differs from the sensor count or the
    /// field sample fails. The integrator is unchanged in that case.
    pub fn set_angles(&mut self, angles: Vec<Rotation>) -> Result<(), SpatialError> {
        let angles = self.checked_angles(angles)?;
        self.recompute(self.centres.clone(), angles, self.sample_times.clone())
    }

    /// Integrals from the most recent computation.
    pub fn get_integrals(&self) -> &Array3<f64> {
        &self.integrals
    }

    /// Averages from the most recent computation.
    pub fn get_averages(&self) -> &Array3<f64> {
        &self.averages
    }

    /// Consume the integrator, keeping only its averages.
    pub fn into_averages(self) -> Array3<f64> {
        self.averages
    }

    /// Footprint area, `width × height`.
    pub fn area(&self) -> f64 {
        self.dims[0] * self.dims[1]
    }

    /// The rule in use.
    pub fn rule(&self) -> &QuadratureRule {
        &self.rule
    }

    /// Shape of the integrals and averages.
    pub fn meas_shape(&self) -> MeasShape {
        MeasShape::of(&self.integrals)
    }

    /// Global coordinates of every integration point, offset-major,
    /// shape `(n_points × n_sensors, 3)`.
    pub fn int_points(&self) -> Array2<f64> {
        build_int_points(&self.rule, &self.centres, &self.angles, self.dims)
    }

    // ── Internals ───────────────────────────────────────────────

    fn checked_centres(&self, centres: &Array2<f64>) -> Result<Array2<f64>, SpatialError> {
        if centres.ncols() != 3 || centres.nrows() != self.centres.nrows() {
            return Err(ConfigError::ShapeMismatch {
                context: "integrator centres".to_string(),
                declared: self.centres.shape().to_vec(),
                supplied: centres.shape().to_vec(),
            }
            .into());
        }
        Ok(centres.clone())
    }

    fn checked_angles(&self, angles: Vec<Rotation>) -> Result<Vec<Rotation>, SpatialError> {
        if angles.len() != self.centres.nrows() {
            return Err(ConfigError::ShapeMismatch {
                context: "integrator angles".to_string(),
                declared: vec![self.centres.nrows()],
                supplied: vec![angles.len()],
            }
            .into());
        }
        Ok(angles)
    }

    fn recompute_with(
        &mut self,
        centres: Option<&Array2<f64>>,
        sample_times: Option<&Array1<f64>>,
    ) -> Result<(), SpatialError> {
        let centres = match centres {
            Some(c) => self.checked_centres(c)?,
            None => self.centres.clone(),
        };
        let sample_times = sample_times.cloned().or_else(|| self.sample_times.clone());
        self.recompute(centres, self.angles.clone(), sample_times)
    }

    /// Evaluate at the given geometry and commit it only on success.
    fn recompute(
        &mut self,
        centres: Array2<f64>,
        angles: Vec<Rotation>,
        sample_times: Option<Array1<f64>>,
    ) -> Result<(), SpatialError> {
        let (integrals, averages) = self.evaluate(&centres, &angles, sample_times.as_ref())?;
        self.centres = centres;
        self.angles = angles;
        self.sample_times = sample_times;
        self.integrals = integrals;
        self.averages = averages;
        Ok(())
    }

    fn evaluate(
        &self,
        centres: &Array2<f64>,
        angles: &[Rotation],
        sample_times: Option<&Array1<f64>>,
    ) -> Result<(Array3<f64>, Array3<f64>), SpatialError> {
        let n_off = self.rule.n_points();
        let n_sens = centres.nrows();
        let points = build_int_points(&self.rule, centres, angles, self.dims);

        tracing::trace!(n_off, n_sens, "sampling footprint points");
        let vals = self
            .field
            .sample(points.view(), sample_times.map(|t| t.view()))?;

        let n_times = match sample_times {
            Some(t) => t.len(),
            None => self.field.time_steps().len(),
        };
        let expected = [n_off * n_sens, self.field.component_count(), n_times];
        if vals.shape() != expected {
            return Err(ShapeError::new("footprint sample", &expected, vals.shape()).into());
        }

        let (_, n_comps, n_t) = vals.dim();
        let vals = Array4::from_shape_vec((n_off, n_sens, n_comps, n_t), vals.iter().copied().collect())
            .map_err(|_| ShapeError::new("footprint sample", &expected, &[n_off, n_sens, n_comps, n_t]))?;

        let weights = self
            .rule
            .weights()
            .view()
            .insert_axis(Axis(1))
            .insert_axis(Axis(2))
            .insert_axis(Axis(3));
        let weighted = (&vals * &weights).sum_axis(Axis(0));
        let integrals = &weighted * (self.area() / 4.0);

        let norm = self.rule.weight_sum();
        let normed = weights.mapv(|w| w / norm);
        let averages = (&vals * &normed).sum_axis(Axis(0));
        Ok((integrals, averages))
    }
}

/// Global integration points for every sensor, offset-major.
fn build_int_points(
    rule: &QuadratureRule,
    centres: &Array2<f64>,
    angles: &[Rotation],
    dims: [f64; 3],
) -> Array2<f64> {
    let n_sens = centres.nrows();
    let offsets = rule.offsets();
    let (half_w, half_h) = (dims[0] / 2.0, dims[1] / 2.0);
    let mut points = Array2::zeros((rule.n_points() * n_sens, 3));

    for (k, off) in offsets.rows().into_iter().enumerate() {
        let local = Vector3::new(off[0] * half_w, off[1] * half_h, 0.0);
        for s in 0..n_sens {
            let shift = angles[s] * local;
            let row = k * n_sens + s;
            points[[row, 0]] = centres[[s, 0]] + shift.x;
            points[[row, 1]] = centres[[s, 1]] + shift.y;
            points[[row, 2]] = centres[[s, 2]] + shift.z;
        }
    }
    points
}

/// Build the footprint integrator `sensor_data` asks for.
///
/// `Ok(None)` for point sensors, i.e. unless both the averager and the
/// extents are set.
pub fn build_spatial_averager(
    field: Arc<dyn Field>,
    sensor_data: &SensorData,
) -> Result<Option<SpatialIntegrator>, SpatialError> {
    match sensor_data.footprint() {
        Some(_) => SpatialIntegrator::from_sensor_data(field, sensor_data).map(Some),
        None => Ok(None),
    }
}
