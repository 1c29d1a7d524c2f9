//! Systematic errors that come from how the sensor samples the field.
//!
//! Unlike the value-space calculators, these re-sample the field. Those
//! that perturb geometry hand back the perturbed [`SensorData`] so every
//! later calculator in the chain sees the same shifted sensors.

use std::fmt;
use std::sync::Arc;

use ndarray::{Array1, Array2, Array3, ArrayView3};
use sensim_core::{
    euler_zyx_degrees, ConfigError, Field, Rotation, SensorData, ShapeError, SpatialAverager,
};
use sensim_spatial::{
    rotate_to_sensor_frame, sample_field_with_sensor_data, QuadratureRule, SpatialError,
    SpatialIntegrator,
};

use crate::calculator::{Dependence, ErrCalcOutput, ErrType, ErrorCalculator};
use crate::error::CalcError;

fn check_basis(
    values: &Array3<f64>,
    basis: &ArrayView3<'_, f64>,
    context: &str,
) -> Result<(), ShapeError> {
    if values.shape() == basis.shape() {
        Ok(())
    } else {
        Err(ShapeError::new(context, basis.shape(), values.shape()))
    }
}

// ── Geometry perturbation ──────────────────────────────────────────

/// Perturbations applied to a sensor array's geometry before sampling.
///
/// Every part is optional. Offsets are applied to the geometry the
/// calculator receives, which in a chain is the accumulated geometry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldErrorData {
    /// Per-sensor position offsets, shape `(n_sensors, 3)`.
    pub pos_offsets: Option<Array2<f64>>,
    /// Per-sensor orientation offsets, composed after the current
    /// orientation.
    pub angle_offsets: Option<Vec<Rotation>>,
    /// Offsets added to the effective sample times, one per time.
    pub time_offsets: Option<Array1<f64>>,
    /// Footprint rule and full extents that replace the sensors' own.
    pub spatial_averager: Option<(SpatialAverager, [f64; 3])>,
}

impl FieldErrorData {
    /// No perturbation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shift sensor positions.
    pub fn with_pos_offsets(mut self, offsets: Array2<f64>) -> Self {
        self.pos_offsets = Some(offsets);
        self
    }

    /// Rotate sensors further.
    pub fn with_angle_offsets(mut self, offsets: Vec<Rotation>) -> Self {
        self.angle_offsets = Some(offsets);
        self
    }

    /// Shift sample times.
    pub fn with_time_offsets(mut self, offsets: Array1<f64>) -> Self {
        self.time_offsets = Some(offsets);
        self
    }

    /// Average over a different footprint.
    pub fn with_spatial_averager(mut self, averager: SpatialAverager, dims: [f64; 3]) -> Self {
        self.spatial_averager = Some((averager, dims));
        self
    }

    /// Apply the perturbations to a copy of `sensor_data`.
    ///
    /// `field` resolves the effective sample times when time offsets are
    /// set and `sensor_data` has none of its own.
    ///
    /// # Errors
    ///
    /// Returns `Err` if an offset does not match the sensor count or the
    /// time count, or if the perturbed geometry fails validation (e.g.
    /// time offsets that reorder the sample times).
    pub fn perturb(
        &self,
        sensor_data: &SensorData,
        field: &dyn Field,
    ) -> Result<SensorData, ConfigError> {
        let mut out = sensor_data.clone();
        let n = sensor_data.n_sensors();

        if let Some(offsets) = &self.pos_offsets {
            if offsets.dim() != sensor_data.positions.dim() {
                return Err(mismatch(
                    "position offsets",
                    sensor_data.positions.shape(),
                    offsets.shape(),
                ));
            }
            out.positions = &sensor_data.positions + offsets;
        }

        if let Some(offsets) = &self.angle_offsets {
            if offsets.len() != n {
                return Err(mismatch("angle offsets", &[n], &[offsets.len()]));
            }
            let current = sensor_data.angles_or_identity();
            out.angles = Some(
                offsets
                    .iter()
                    .zip(current.iter())
                    .map(|(off, cur)| off * cur)
                    .collect(),
            );
        }

        if let Some(offsets) = &self.time_offsets {
            let base = sensor_data.sample_times_or(field);
            if offsets.len() != base.len() {
                return Err(mismatch("time offsets", &[base.len()], &[offsets.len()]));
            }
            out.sample_times = Some(&base + offsets);
        }

        if let Some((averager, dims)) = self.spatial_averager {
            out.spatial_averager = Some(averager);
            out.spatial_dims = Some(dims);
        }

        out.validate()?;
        Ok(out)
    }
}

fn mismatch(context: &str, declared: &[usize], supplied: &[usize]) -> ConfigError {
    ConfigError::ShapeMismatch {
        context: context.to_string(),
        declared: declared.to_vec(),
        supplied: supplied.to_vec(),
    }
}

// ── FieldBias ──────────────────────────────────────────────────────

/// General field-sampling error: re-sample the field with perturbed
/// geometry.
///
/// Error = perturbed sample − basis. The perturbed geometry is returned
/// to the chain.
#[derive(Clone)]
pub struct FieldBias {
    field: Arc<dyn Field>,
    data: FieldErrorData,
    dependence: Dependence,
}

impl FieldBias {
    /// Sample `field` with `data` applied to the incoming geometry.
    pub fn new(field: Arc<dyn Field>, data: FieldErrorData) -> Self {
        Self {
            field,
            data,
            dependence: Dependence::default(),
        }
    }

    /// Set the preferred chaining basis.
    pub fn with_dependence(mut self, dependence: Dependence) -> Self {
        self.dependence = dependence;
        self
    }

    /// The perturbations applied.
    pub fn data(&self) -> &FieldErrorData {
        &self.data
    }

    fn errs(
        &self,
        basis: ArrayView3<'_, f64>,
        sensor_data: &SensorData,
    ) -> Result<ErrCalcOutput, CalcError> {
        let perturbed = self.data.perturb(sensor_data, self.field.as_ref())?;
        let sample = sample_field_with_sensor_data(&self.field, &perturbed)?;
        check_basis(&sample, &basis, "perturbed field sample")?;
        Ok(ErrCalcOutput::with_sensor_data(sample - basis, perturbed))
    }
}

impl fmt::Debug for FieldBias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldBias")
            .field("data", &self.data)
            .field("dependence", &self.dependence)
            .finish_non_exhaustive()
    }
}

impl ErrorCalculator for FieldBias {
    fn name(&self) -> &str {
        "FieldBias"
    }

    fn err_type(&self) -> ErrType {
        ErrType::Systematic
    }

    fn dependence(&self) -> Dependence {
        self.dependence
    }

    fn perturbs_geometry(&self) -> bool {
        true
    }

    fn samples_field(&self) -> bool {
        true
    }

    fn calc_errs(
        &mut self,
        basis: ArrayView3<'_, f64>,
        sensor_data: &SensorData,
    ) -> Result<ErrCalcOutput, CalcError> {
        self.errs(basis, sensor_data)
    }
}

// ── AngleOffsetBias ────────────────────────────────────────────────

/// Error from sensors mounted at the wrong orientation.
///
/// Each sensor's orientation becomes `offset ∘ current`; the field is
/// re-sampled (point or footprint, as the incoming geometry says) and the
/// error is the rotated sample minus the basis.
#[derive(Clone, Debug)]
pub struct AngleOffsetBias {
    inner: FieldBias,
}

impl AngleOffsetBias {
    /// One orientation offset per sensor.
    pub fn new(field: Arc<dyn Field>, offsets: Vec<Rotation>) -> Self {
        Self {
            inner: FieldBias::new(field, FieldErrorData::new().with_angle_offsets(offsets)),
        }
    }

    /// Offsets as `[z, y, x]` angles in degrees, one triple per sensor.
    pub fn from_zyx_degrees(field: Arc<dyn Field>, offsets: &[[f64; 3]]) -> Self {
        Self::new(field, offsets.iter().map(|&zyx| euler_zyx_degrees(zyx)).collect())
    }

    /// Set the preferred chaining basis.
    pub fn with_dependence(mut self, dependence: Dependence) -> Self {
        self.inner.dependence = dependence;
        self
    }
}

impl ErrorCalculator for AngleOffsetBias {
    fn name(&self) -> &str {
        "AngleOffsetBias"
    }

    fn err_type(&self) -> ErrType {
        ErrType::Systematic
    }

    fn dependence(&self) -> Dependence {
        self.inner.dependence
    }

    fn perturbs_geometry(&self) -> bool {
        true
    }

    fn samples_field(&self) -> bool {
        true
    }

    fn calc_errs(
        &mut self,
        basis: ArrayView3<'_, f64>,
        sensor_data: &SensorData,
    ) -> Result<ErrCalcOutput, CalcError> {
        self.inner.errs(basis, sensor_data)
    }
}

// ── SpatialAverageBias ─────────────────────────────────────────────

/// Error from a sensor averaging over its footprint instead of reading
/// the field at a point.
///
/// Error = footprint average − point sample, both at the incoming
/// geometry. Independent of the basis.
pub struct SpatialAverageBias {
    field: Arc<dyn Field>,
    integrator: SpatialIntegrator,
    dependence: Dependence,
}

impl SpatialAverageBias {
    /// Average `field` with `averager` over footprints of full extents
    /// `dims`, starting from the geometry in `sensor_data`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the footprint or geometry is invalid, or the
    /// initial field sample fails.
    pub fn new(
        field: Arc<dyn Field>,
        sensor_data: &SensorData,
        averager: SpatialAverager,
        dims: [f64; 3],
    ) -> Result<Self, SpatialError> {
        let integrator = SpatialIntegrator::new(
            QuadratureRule::for_averager(averager),
            field.clone(),
            sensor_data,
            dims,
        )?;
        Ok(Self {
            field,
            integrator,
            dependence: Dependence::default(),
        })
    }

    /// Set the preferred chaining basis.
    pub fn with_dependence(mut self, dependence: Dependence) -> Self {
        self.dependence = dependence;
        self
    }
}

impl fmt::Debug for SpatialAverageBias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpatialAverageBias")
            .field("integrator", &self.integrator)
            .field("dependence", &self.dependence)
            .finish_non_exhaustive()
    }
}

impl ErrorCalculator for SpatialAverageBias {
    fn name(&self) -> &str {
        "SpatialAverageBias"
    }

    fn err_type(&self) -> ErrType {
        ErrType::Systematic
    }

    fn dependence(&self) -> Dependence {
        self.dependence
    }

    fn samples_field(&self) -> bool {
        true
    }

    fn calc_errs(
        &mut self,
        basis: ArrayView3<'_, f64>,
        sensor_data: &SensorData,
    ) -> Result<ErrCalcOutput, CalcError> {
        let averages = self.integrator.calc_averages_for(sensor_data)?;
        let points = self.field.sample(
            sensor_data.positions.view(),
            sensor_data.sample_times.as_ref().map(|t| t.view()),
        )?;
        check_basis(&points, &averages.view(), "point sample")?;

        let mut errors = averages - &points;
        if let Some(angles) = &sensor_data.angles {
            rotate_to_sensor_frame(&mut errors, angles, self.field.kind())?;
        }
        check_basis(&errors, &basis, "spatial average bias")?;
        Ok(ErrCalcOutput::errors(errors))
    }
}
