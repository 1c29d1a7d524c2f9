//! The sensor array: truth, errors and measurements for one set of
//! sensors observing one field.

use std::sync::Arc;

use indexmap::IndexMap;
use ndarray::{Array1, Array3};
use sensim_core::{ConfigError, Field, MeasShape, SensorData};
use sensim_spatial::sample_field_with_sensor_data;
use sensim_uncertainty::{ChainError, ErrType, ErrorIntegrator, SourceErrors};

use crate::cache::Cached;
use crate::descriptor::SensorDescriptor;
use crate::error::SensorArrayError;

/// Summed errors of the last evaluation, one entry per channel.
#[derive(Clone, Debug, PartialEq)]
struct ErrorArrays {
    systematic: Option<Array3<f64>>,
    random: Option<Array3<f64>>,
    total: Option<Array3<f64>>,
}

/// A set of sensors observing a field, with optional systematic and
/// random error chains.
///
/// Truth, errors and measurements are computed on first access and
/// cached. Setting an integrator, new geometry or a new field invalidates
/// all three caches. [`calc_measurements`](Self::calc_measurements)
/// reruns the error chains, drawing fresh random errors.
///
/// The array's geometry is authoritative: integrators handed to the
/// array are re-pointed at it, and follow it when it changes.
///
/// Both chains run on the truth, so each channel's errors are computed
/// against the unperturbed field values.
pub struct SensorArray {
    sensor_data: SensorData,
    field: Arc<dyn Field>,
    descriptor: SensorDescriptor,
    meas_shape: MeasShape,
    error_int_sys: Option<ErrorIntegrator>,
    error_int_rand: Option<ErrorIntegrator>,
    truth: Cached<Array3<f64>>,
    errors: Cached<ErrorArrays>,
    measurements: Cached<Array3<f64>>,
}

impl std::fmt::Debug for SensorArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorArray")
            .field("descriptor", &self.descriptor.name)
            .field("meas_shape", &self.meas_shape)
            .field("systematic", &self.error_int_sys)
            .field("random", &self.error_int_rand)
            .field("truth_computed", &self.truth.is_computed())
            .field("measurements_computed", &self.measurements.is_computed())
            .finish_non_exhaustive()
    }
}

impl SensorArray {
    /// Sensors at `sensor_data` observing `field`, described by
    /// `descriptor` (the generic default when `None`).
    ///
    /// # Errors
    ///
    /// Returns `Err` if the geometry fails validation or the field's
    /// component count contradicts its kind.
    pub fn new(
        sensor_data: SensorData,
        field: Arc<dyn Field>,
        descriptor: Option<SensorDescriptor>,
    ) -> Result<Self, SensorArrayError> {
        let meas_shape = check_inputs(&sensor_data, field.as_ref())?;
        Ok(Self {
            sensor_data,
            field,
            descriptor: descriptor.unwrap_or_default(),
            meas_shape,
            error_int_sys: None,
            error_int_rand: None,
            truth: Cached::new(),
            errors: Cached::new(),
            measurements: Cached::new(),
        })
    }

    // ── Configuration ───────────────────────────────────────────

    /// Install the systematic error chain.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the chain's shape differs from
    /// [`get_measurement_shape`](Self::get_measurement_shape). The array
    /// is unchanged in that case.
    pub fn set_systematic_error_integrator(
        &mut self,
        integrator: ErrorIntegrator,
    ) -> Result<(), SensorArrayError> {
        let integrator = self.adopt(integrator, ErrType::Systematic)?;
        self.error_int_sys = Some(integrator);
        self.invalidate();
        Ok(())
    }

    /// Install the random error chain.
    ///
    /// # Errors
    ///
    /// As [`set_systematic_error_integrator`](Self::set_systematic_error_integrator).
    pub fn set_random_error_integrator(
        &mut self,
        integrator: ErrorIntegrator,
    ) -> Result<(), SensorArrayError> {
        let integrator = self.adopt(integrator, ErrType::Random)?;
        self.error_int_rand = Some(integrator);
        self.invalidate();
        Ok(())
    }

    /// Remove the systematic error chain, returning it.
    pub fn clear_systematic_error_integrator(&mut self) -> Option<ErrorIntegrator> {
        self.invalidate();
        self.error_int_sys.take()
    }

    /// Remove the random error chain, returning it.
    pub fn clear_random_error_integrator(&mut self) -> Option<ErrorIntegrator> {
        self.invalidate();
        self.error_int_rand.take()
    }

    /// Replace the sensor geometry.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the geometry is invalid or changes the
    /// measurement shape while an error chain is installed. The array is
    /// unchanged in that case.
    pub fn set_sensor_data(&mut self, sensor_data: SensorData) -> Result<(), SensorArrayError> {
        let meas_shape = check_inputs(&sensor_data, self.field.as_ref())?;
        self.check_integrator_shapes(meas_shape)?;
        if let Some(sys) = self.error_int_sys.as_mut() {
            sys.set_sensor_data(sensor_data.clone())
                .map_err(SensorArrayError::Systematic)?;
        }
        if let Some(rand) = self.error_int_rand.as_mut() {
            rand.set_sensor_data(sensor_data.clone())
                .map_err(SensorArrayError::Random)?;
        }
        self.sensor_data = sensor_data;
        self.meas_shape = meas_shape;
        self.invalidate();
        Ok(())
    }

    /// Replace the observed field.
    ///
    /// Calculators that sample a field hold their own handle to it, so a
    /// chain containing one must be cleared before the field changes.
    ///
    /// # Errors
    ///
    /// As [`set_sensor_data`](Self::set_sensor_data). Also returns `Err`
    /// if an installed chain samples a field of its own.
    pub fn set_field(&mut self, field: Arc<dyn Field>) -> Result<(), SensorArrayError> {
        let meas_shape = check_inputs(&self.sensor_data, field.as_ref())?;
        self.check_integrator_shapes(meas_shape)?;
        for (context, integrator) in [
            ("systematic error integrator", &self.error_int_sys),
            ("random error integrator", &self.error_int_rand),
        ] {
            if integrator.as_ref().is_some_and(ErrorIntegrator::samples_field) {
                return Err(ConfigError::invalid(
                    context,
                    "holds calculators bound to the current field; clear it before set_field",
                )
                .into());
            }
        }
        self.field = field;
        self.meas_shape = meas_shape;
        self.invalidate();
        Ok(())
    }

    // ── Evaluation ──────────────────────────────────────────────

    /// The field as the sensors see it, without errors.
    ///
    /// # Errors
    ///
    /// Returns `Err` if sampling the field fails.
    pub fn get_truth(&mut self) -> Result<&Array3<f64>, SensorArrayError> {
        let Self {
            sensor_data,
            field,
            truth,
            ..
        } = self;
        truth.get_or_try_compute(|| sample_truth(field, sensor_data))
    }

    /// Rerun the error chains and return fresh measurements.
    ///
    /// The truth is reused if already computed.
    ///
    /// # Errors
    ///
    /// Returns `Err` if sampling or either error chain fails. Nothing is
    /// cached in that case.
    pub fn calc_measurements(&mut self) -> Result<&Array3<f64>, SensorArrayError> {
        self.errors.invalidate();
        self.measurements.invalidate();
        self.get_measurements()
    }

    /// Truth plus systematic plus random errors, computed on first access.
    ///
    /// With no chains installed this equals [`get_truth`](Self::get_truth)
    /// exactly.
    ///
    /// # Errors
    ///
    /// As [`calc_measurements`](Self::calc_measurements).
    pub fn get_measurements(&mut self) -> Result<&Array3<f64>, SensorArrayError> {
        let Self {
            sensor_data,
            field,
            error_int_sys,
            error_int_rand,
            truth,
            errors,
            measurements,
            ..
        } = self;
        measurements.get_or_try_compute(|| {
            let (truth, errors) = truth_and_errors(
                truth,
                errors,
                field,
                sensor_data,
                error_int_sys.as_mut(),
                error_int_rand.as_mut(),
            )?;
            tracing::debug!("measurements recomputed");
            Ok(match &errors.total {
                Some(total) => truth + total,
                None => truth.clone(),
            })
        })
    }

    /// Summed systematic errors, `None` without a systematic chain.
    ///
    /// # Errors
    ///
    /// As [`calc_measurements`](Self::calc_measurements).
    pub fn get_errors_systematic(&mut self) -> Result<Option<&Array3<f64>>, SensorArrayError> {
        Ok(self.ensure_errors()?.systematic.as_ref())
    }

    /// Summed random errors, `None` without a random chain.
    ///
    /// # Errors
    ///
    /// As [`calc_measurements`](Self::calc_measurements).
    pub fn get_errors_random(&mut self) -> Result<Option<&Array3<f64>>, SensorArrayError> {
        Ok(self.ensure_errors()?.random.as_ref())
    }

    /// Systematic plus random errors, `None` only when neither chain is
    /// installed.
    ///
    /// # Errors
    ///
    /// As [`calc_measurements`](Self::calc_measurements).
    pub fn get_errors_total(&mut self) -> Result<Option<&Array3<f64>>, SensorArrayError> {
        Ok(self.ensure_errors()?.total.as_ref())
    }

    /// Per-source errors of one channel, keyed by chain position. `None`
    /// when that channel has no chain.
    ///
    /// # Errors
    ///
    /// As [`calc_measurements`](Self::calc_measurements), or the chain's
    /// own error when it does not store per-source errors.
    pub fn get_errors_by_source(
        &mut self,
        channel: ErrType,
    ) -> Result<Option<&IndexMap<usize, SourceErrors>>, SensorArrayError> {
        self.ensure_errors()?;
        match channel {
            ErrType::Systematic => self
                .error_int_sys
                .as_ref()
                .map(ErrorIntegrator::get_errors_by_source)
                .transpose()
                .map_err(SensorArrayError::Systematic),
            ErrType::Random => self
                .error_int_rand
                .as_ref()
                .map(ErrorIntegrator::get_errors_by_source)
                .transpose()
                .map_err(SensorArrayError::Random),
        }
    }

    /// Geometry after the systematic chain's perturbations, `None`
    /// without a systematic chain.
    pub fn get_sensor_data_perturbed(&self) -> Option<&SensorData> {
        self.error_int_sys
            .as_ref()
            .map(ErrorIntegrator::get_accumulated_sensor_data)
    }

    // ── Accessors ───────────────────────────────────────────────

    /// Shape of every array this sensor array produces.
    pub fn get_measurement_shape(&self) -> MeasShape {
        self.meas_shape
    }

    /// Times the sensors sample at.
    pub fn get_sample_times(&self) -> Array1<f64> {
        self.sensor_data.sample_times_or(self.field.as_ref())
    }

    /// Unperturbed geometry.
    pub fn sensor_data(&self) -> &SensorData {
        &self.sensor_data
    }

    /// The observed field.
    pub fn field(&self) -> &Arc<dyn Field> {
        &self.field
    }

    /// What the sensors measure.
    pub fn descriptor(&self) -> &SensorDescriptor {
        &self.descriptor
    }

    /// The systematic chain, if installed.
    pub fn systematic_error_integrator(&self) -> Option<&ErrorIntegrator> {
        self.error_int_sys.as_ref()
    }

    /// The random chain, if installed.
    pub fn random_error_integrator(&self) -> Option<&ErrorIntegrator> {
        self.error_int_rand.as_ref()
    }

    // ── Internal ────────────────────────────────────────────────

    fn invalidate(&mut self) {
        self.truth.invalidate();
        self.errors.invalidate();
        self.measurements.invalidate();
    }

    fn ensure_errors(&mut self) -> Result<&ErrorArrays, SensorArrayError> {
        let Self {
            sensor_data,
            field,
            error_int_sys,
            error_int_rand,
            truth,
            errors,
            ..
        } = self;
        let (_, errors) = truth_and_errors(
            truth,
            errors,
            field,
            sensor_data,
            error_int_sys.as_mut(),
            error_int_rand.as_mut(),
        )?;
        Ok(errors)
    }

    fn adopt(
        &self,
        mut integrator: ErrorIntegrator,
        channel: ErrType,
    ) -> Result<ErrorIntegrator, SensorArrayError> {
        let context = match channel {
            ErrType::Systematic => "systematic error integrator",
            ErrType::Random => "random error integrator",
        };
        let wrap = |e: ChainError| match channel {
            ErrType::Systematic => SensorArrayError::Systematic(e),
            ErrType::Random => SensorArrayError::Random(e),
        };
        if integrator.meas_shape() != self.meas_shape {
            return Err(ConfigError::ShapeMismatch {
                context: context.to_string(),
                declared: self.meas_shape.as_array().to_vec(),
                supplied: integrator.meas_shape().as_array().to_vec(),
            }
            .into());
        }
        integrator
            .set_sensor_data(self.sensor_data.clone())
            .map_err(wrap)?;
        Ok(integrator)
    }

    fn check_integrator_shapes(&self, meas_shape: MeasShape) -> Result<(), SensorArrayError> {
        let installed = [
            ("systematic error integrator", &self.error_int_sys),
            ("random error integrator", &self.error_int_rand),
        ];
        for (context, integrator) in installed {
            if let Some(chain) = integrator {
                if chain.meas_shape() != meas_shape {
                    return Err(ConfigError::ShapeMismatch {
                        context: context.to_string(),
                        declared: meas_shape.as_array().to_vec(),
                        supplied: chain.meas_shape().as_array().to_vec(),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }
}

/// Validate `sensor_data` against `field` and return the resulting shape.
fn check_inputs(sensor_data: &SensorData, field: &dyn Field) -> Result<MeasShape, ConfigError> {
    sensor_data.validate()?;
    let n_comps = field.component_count();
    if n_comps == 0 {
        return Err(ConfigError::invalid("field", "field has no components"));
    }
    if let Some(implied) = field.kind().implied_components() {
        if implied != n_comps {
            return Err(ConfigError::invalid(
                "field kind",
                format!("{:?} implies {implied} components, field has {n_comps}", field.kind()),
            ));
        }
    }
    Ok(sensor_data.meas_shape(field))
}

fn sample_truth(
    field: &Arc<dyn Field>,
    sensor_data: &SensorData,
) -> Result<Array3<f64>, SensorArrayError> {
    tracing::debug!(n_sensors = sensor_data.n_sensors(), "truth recomputed");
    Ok(sample_field_with_sensor_data(field, sensor_data)?)
}

fn truth_and_errors<'a>(
    truth: &'a mut Cached<Array3<f64>>,
    errors: &'a mut Cached<ErrorArrays>,
    field: &Arc<dyn Field>,
    sensor_data: &SensorData,
    sys: Option<&mut ErrorIntegrator>,
    rand: Option<&mut ErrorIntegrator>,
) -> Result<(&'a Array3<f64>, &'a ErrorArrays), SensorArrayError> {
    let truth = truth.get_or_try_compute(|| sample_truth(field, sensor_data))?;
    let errors = errors.get_or_try_compute(|| run_chains(truth, sys, rand))?;
    Ok((truth, errors))
}

fn run_chains(
    truth: &Array3<f64>,
    sys: Option<&mut ErrorIntegrator>,
    rand: Option<&mut ErrorIntegrator>,
) -> Result<ErrorArrays, SensorArrayError> {
    let systematic = match sys {
        Some(chain) => Some(
            chain
                .calc_errors_from_chain(truth.view())
                .map_err(SensorArrayError::Systematic)?
                .clone(),
        ),
        None => None,
    };
    let random = match rand {
        Some(chain) => Some(
            chain
                .calc_errors_from_chain(truth.view())
                .map_err(SensorArrayError::Random)?
                .clone(),
        ),
        None => None,
    };
    let total = match (&systematic, &random) {
        (Some(s), Some(r)) => Some(s + r),
        (Some(s), None) => Some(s.clone()),
        (None, Some(r)) => Some(r.clone()),
        (None, None) => None,
    };
    tracing::debug!(
        systematic = systematic.is_some(),
        random = random.is_some(),
        "errors recomputed"
    );
    Ok(ErrorArrays {
        systematic,
        random,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1, Array2};
    use sensim_core::{FieldError, FieldKind};

    struct Linear {
        components: Vec<String>,
        kind: FieldKind,
    }

    impl Linear {
        fn scalar() -> Self {
            Self {
                components: vec!["T".to_string()],
                kind: FieldKind::Scalar,
            }
        }
    }

    impl Field for Linear {
        fn sample(
            &self,
            points: ndarray::ArrayView2<'_, f64>,
            times: Option<ndarray::ArrayView1<'_, f64>>,
        ) -> Result<Array3<f64>, FieldError> {
            let times = times.map_or_else(|| self.time_steps(), |t| t.to_owned());
            let n = self.components.len();
            Ok(Array3::from_shape_fn((points.nrows(), n, times.len()), |(i, _, k)| {
                points[[i, 0]] + times[k]
            }))
        }

        fn time_steps(&self) -> Array1<f64> {
            array![0.0, 1.0]
        }

        fn components(&self) -> &[String] {
            &self.components
        }

        fn kind(&self) -> FieldKind {
            self.kind
        }
    }

    fn array_of(n: usize) -> SensorArray {
        SensorArray::new(
            SensorData::new(Array2::zeros((n, 3))),
            Arc::new(Linear::scalar()),
            None,
        )
        .unwrap()
    }

    #[test]
    fn shape_follows_sensors_components_and_times() {
        let arr = array_of(4);
        assert_eq!(arr.get_measurement_shape(), MeasShape::new(4, 1, 2));
        assert_eq!(arr.get_sample_times(), array![0.0, 1.0]);
        assert_eq!(arr.descriptor(), &SensorDescriptor::default());
    }

    #[test]
    fn explicit_sample_times_change_shape() {
        let sd = SensorData::new(Array2::zeros((2, 3))).with_sample_times(array![0.5, 1.5, 2.5]);
        let arr = SensorArray::new(sd, Arc::new(Linear::scalar()), None).unwrap();
        assert_eq!(arr.get_measurement_shape(), MeasShape::new(2, 1, 3));
    }

    #[test]
    fn kind_must_agree_with_components() {
        let field = Linear {
            components: vec!["x".to_string(), "y".to_string()],
            kind: FieldKind::Tensor2D,
        };
        let err = SensorArray::new(SensorData::new(Array2::zeros((1, 3))), Arc::new(field), None)
            .unwrap_err();
        assert!(matches!(err, SensorArrayError::Config(_)));
    }

    #[test]
    fn invalid_geometry_is_rejected() {
        let err = SensorArray::new(
            SensorData::new(Array2::zeros((0, 3))),
            Arc::new(Linear::scalar()),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, SensorArrayError::Config(_)));
    }

    #[test]
    fn truth_is_cached_until_invalidated() {
        let mut arr = array_of(1);
        let first = arr.get_truth().unwrap().clone();
        assert!(arr.truth.is_computed());
        assert_eq!(first, array![[[0.0, 1.0]]]);

        arr.set_sensor_data(SensorData::new(array![[2.0, 0.0, 0.0]]))
            .unwrap();
        assert!(!arr.truth.is_computed());
        assert_eq!(*arr.get_truth().unwrap(), array![[[2.0, 3.0]]]);
    }

    #[test]
    fn no_channels_means_no_errors() {
        let mut arr = array_of(2);
        assert_eq!(arr.get_errors_total().unwrap(), None);
        assert_eq!(arr.get_errors_systematic().unwrap(), None);
        assert_eq!(arr.get_errors_random().unwrap(), None);
        assert_eq!(arr.get_errors_by_source(ErrType::Systematic).unwrap(), None);
        assert!(arr.get_sensor_data_perturbed().is_none());
    }
}
