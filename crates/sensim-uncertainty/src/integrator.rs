//! Ordered error chains.
//!
//! An [`ErrorIntegrator`] owns a list of calculators and runs them in
//! order against a basis array. Each run starts from the integrator's
//! original geometry; calculators that perturb geometry replace the
//! accumulated snapshot for everything after them.
//!
//! Results are committed only when the whole chain succeeds. A failing
//! or misbehaving calculator leaves the previous results untouched.

use indexmap::IndexMap;
use ndarray::{Array3, ArrayView3};
use sensim_core::{ConfigError, MeasShape, SensorData};

use crate::calculator::{Dependence, ErrType, ErrorCalculator};
use crate::error::ChainError;

/// How each calculator's basis is chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ChainMode {
    /// Every calculator perturbs the original basis. The summed error is
    /// independent of calculator order.
    #[default]
    Independent,
    /// Every calculator perturbs the basis plus all earlier errors.
    Dependent,
    /// Each calculator's own [`Dependence`] decides.
    PerCalculator,
}

/// Error chain options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ErrIntOpts {
    /// Basis selection for each calculator.
    pub mode: ChainMode,
    /// Keep each calculator's contribution after a run.
    pub store_errs_by_source: bool,
}

impl Default for ErrIntOpts {
    fn default() -> Self {
        Self {
            mode: ChainMode::Independent,
            store_errs_by_source: true,
        }
    }
}

impl ErrIntOpts {
    /// Default options with `mode`.
    pub fn with_mode(mode: ChainMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }
}

/// One calculator's contribution from the last run.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceErrors {
    /// Calculator name.
    pub name: String,
    /// Its error array.
    pub errors: Array3<f64>,
}

/// An ordered chain of error calculators.
pub struct ErrorIntegrator {
    calculators: Vec<Box<dyn ErrorCalculator>>,
    meas_shape: MeasShape,
    opts: ErrIntOpts,
    sensor_data: SensorData,
    sensor_data_accumulated: SensorData,
    errs_by_source: Option<IndexMap<usize, SourceErrors>>,
    errs_total: Option<Array3<f64>>,
}

impl std::fmt::Debug for ErrorIntegrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorIntegrator")
            .field("calculators", &self.names())
            .field("meas_shape", &self.meas_shape)
            .field("opts", &self.opts)
            .finish_non_exhaustive()
    }
}

impl ErrorIntegrator {
    /// Build a chain over `calculators`, observing with `sensor_data` and
    /// producing arrays of shape `meas_shape`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if:
    /// - `calculators` is empty
    /// - `sensor_data` fails validation
    /// - `meas_shape` has a different sensor count than `sensor_data`
    pub fn new(
        calculators: Vec<Box<dyn ErrorCalculator>>,
        sensor_data: SensorData,
        meas_shape: MeasShape,
        opts: ErrIntOpts,
    ) -> Result<Self, ChainError> {
        if calculators.is_empty() {
            return Err(ChainError::EmptyChain);
        }
        sensor_data.validate()?;
        if meas_shape.n_sensors != sensor_data.n_sensors() {
            return Err(ConfigError::ShapeMismatch {
                context: "error chain sensors".to_string(),
                declared: vec![meas_shape.n_sensors],
                supplied: vec![sensor_data.n_sensors()],
            }
            .into());
        }

        let perturbers: Vec<&str> = calculators
            .iter()
            .filter(|c| c.perturbs_geometry())
            .map(|c| c.name())
            .collect();
        if perturbers.len() > 1 {
            tracing::warn!(
                calculators = ?perturbers,
                "multiple geometry-perturbing calculators; perturbations compose in chain order"
            );
        }

        Ok(Self {
            calculators,
            meas_shape,
            opts,
            sensor_data_accumulated: sensor_data.clone(),
            sensor_data,
            errs_by_source: None,
            errs_total: None,
        })
    }

    /// Run the chain against `basis` and return the summed errors.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `basis` has the wrong shape, a calculator fails,
    /// or a calculator returns the wrong shape. Nothing is committed in
    /// any of these cases.
    pub fn calc_errors_from_chain(
        &mut self,
        basis: ArrayView3<'_, f64>,
    ) -> Result<&Array3<f64>, ChainError> {
        self.meas_shape
            .check(&basis, "error chain basis")
            .map_err(ChainError::BasisShape)?;

        let mut accumulated = self.sensor_data.clone();
        let mut running = basis.to_owned();
        let mut total = self.meas_shape.zeros();
        let mut by_source = self
            .opts
            .store_errs_by_source
            .then(|| IndexMap::with_capacity(self.calculators.len()));

        for (index, calc) in self.calculators.iter_mut().enumerate() {
            let dependent = match self.opts.mode {
                ChainMode::Independent => false,
                ChainMode::Dependent => true,
                ChainMode::PerCalculator => calc.dependence() == Dependence::Dependent,
            };
            let calc_basis = if dependent { running.view() } else { basis.view() };

            let out = calc
                .calc_errs(calc_basis, &accumulated)
                .map_err(|source| ChainError::CalculatorFailed {
                    index,
                    name: calc.name().to_string(),
                    source,
                })?;
            if out.errors.shape() != self.meas_shape.as_array() {
                return Err(ChainError::ShapeMismatch {
                    index,
                    name: calc.name().to_string(),
                    expected: self.meas_shape.as_array().to_vec(),
                    actual: out.errors.shape().to_vec(),
                });
            }

            tracing::debug!(index, name = calc.name(), dependent, "error source applied");
            if let Some(sd) = out.sensor_data {
                accumulated = sd;
            }
            running += &out.errors;
            total += &out.errors;
            if let Some(map) = by_source.as_mut() {
                map.insert(
                    index,
                    SourceErrors {
                        name: calc.name().to_string(),
                        errors: out.errors,
                    },
                );
            }
        }

        self.sensor_data_accumulated = accumulated;
        self.errs_by_source = by_source;
        Ok(&*self.errs_total.insert(total))
    }

    /// Per-source errors from the last run, keyed by chain position.
    ///
    /// # Errors
    ///
    /// [`ChainError::NotStored`] when storing is disabled,
    /// [`ChainError::NotComputed`] before the first successful run.
    pub fn get_errors_by_source(&self) -> Result<&IndexMap<usize, SourceErrors>, ChainError> {
        if !self.opts.store_errs_by_source {
            return Err(ChainError::NotStored);
        }
        self.errs_by_source.as_ref().ok_or(ChainError::NotComputed)
    }

    /// Summed errors from the last run.
    pub fn get_errors_total(&self) -> Result<&Array3<f64>, ChainError> {
        self.errs_total.as_ref().ok_or(ChainError::NotComputed)
    }

    /// Summed errors of one type from the last run.
    ///
    /// Requires per-source storage.
    pub fn get_errors_of_type(&self, err_type: ErrType) -> Result<Array3<f64>, ChainError> {
        let by_source = self.get_errors_by_source()?;
        let mut sum = self.meas_shape.zeros();
        for (index, source) in by_source {
            if self.calculators[*index].err_type() == err_type {
                sum += &source.errors;
            }
        }
        Ok(sum)
    }

    /// Replace the geometry every run starts from.
    ///
    /// Results of earlier runs are dropped.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `sensor_data` fails validation or has a different
    /// sensor count than the declared shape.
    pub fn set_sensor_data(&mut self, sensor_data: SensorData) -> Result<(), ChainError> {
        sensor_data.validate()?;
        if sensor_data.n_sensors() != self.meas_shape.n_sensors {
            return Err(ConfigError::ShapeMismatch {
                context: "error chain sensors".to_string(),
                declared: vec![self.meas_shape.n_sensors],
                supplied: vec![sensor_data.n_sensors()],
            }
            .into());
        }
        self.sensor_data_accumulated = sensor_data.clone();
        self.sensor_data = sensor_data;
        self.errs_by_source = None;
        self.errs_total = None;
        Ok(())
    }

    /// Geometry after the last run's perturbations. Before any run, the
    /// original geometry.
    pub fn get_accumulated_sensor_data(&self) -> &SensorData {
        &self.sensor_data_accumulated
    }

    /// The geometry every run starts from.
    pub fn sensor_data(&self) -> &SensorData {
        &self.sensor_data
    }

    /// Declared measurement shape.
    pub fn meas_shape(&self) -> MeasShape {
        self.meas_shape
    }

    /// Chain options.
    pub fn opts(&self) -> ErrIntOpts {
        self.opts
    }

    /// Calculator names in chain order.
    pub fn names(&self) -> Vec<&str> {
        self.calculators.iter().map(|c| c.name()).collect()
    }

    /// Whether any calculator samples a field of its own.
    pub fn samples_field(&self) -> bool {
        self.calculators.iter().any(|c| c.samples_field())
    }

    /// Number of calculators.
    pub fn len(&self) -> usize {
        self.calculators.len()
    }

    /// Always `false`; empty chains are rejected at construction.
    pub fn is_empty(&self) -> bool {
        self.calculators.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CalcError;
    use crate::generator::{RandomGenerator, Seed};
    use crate::random::RandomCalculator;
    use crate::systematic::{Offset, RoundMethod, RoundOff, Saturation};
    use crate::ErrCalcOutput;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};
    use proptest::prelude::*;

    fn sd(n: usize) -> SensorData {
        SensorData::new(Array2::zeros((n, 3)))
    }

    fn column(values: &[f64]) -> Array3<f64> {
        Array3::from_shape_fn((values.len(), 1, 1), |(i, _, _)| values[i])
    }

    fn chain(calcs: Vec<Box<dyn ErrorCalculator>>, n: usize, mode: ChainMode) -> ErrorIntegrator {
        ErrorIntegrator::new(calcs, sd(n), MeasShape::new(n, 1, 1), ErrIntOpts::with_mode(mode))
            .unwrap()
    }

    struct Broken;

    impl ErrorCalculator for Broken {
        fn name(&self) -> &str {
            "Broken"
        }
        fn err_type(&self) -> ErrType {
            ErrType::Systematic
        }
        fn calc_errs(
            &mut self,
            _basis: ArrayView3<'_, f64>,
            _sensor_data: &SensorData,
        ) -> Result<ErrCalcOutput, CalcError> {
            Err(CalcError::failed("sensor offline"))
        }
    }

    struct Shifter;

    impl ErrorCalculator for Shifter {
        fn name(&self) -> &str {
            "Shifter"
        }
        fn err_type(&self) -> ErrType {
            ErrType::Systematic
        }
        fn perturbs_geometry(&self) -> bool {
            true
        }
        fn calc_errs(
            &mut self,
            basis: ArrayView3<'_, f64>,
            sensor_data: &SensorData,
        ) -> Result<ErrCalcOutput, CalcError> {
            let mut moved = sensor_data.clone();
            moved.positions.column_mut(0).mapv_inplace(|x| x + 1.0);
            Ok(ErrCalcOutput::with_sensor_data(
                Array3::zeros(basis.raw_dim()),
                moved,
            ))
        }
    }

    #[test]
    fn empty_chain_is_rejected() {
        let err = ErrorIntegrator::new(vec![], sd(1), MeasShape::new(1, 1, 1), ErrIntOpts::default())
            .unwrap_err();
        assert_eq!(err, ChainError::EmptyChain);
    }

    #[test]
    fn sensor_count_must_match_shape() {
        let calcs: Vec<Box<dyn ErrorCalculator>> = vec![Box::new(Offset::new(1.0).unwrap())];
        let err = ErrorIntegrator::new(calcs, sd(2), MeasShape::new(3, 1, 1), ErrIntOpts::default())
            .unwrap_err();
        assert!(matches!(err, ChainError::Config(_)));
    }

    #[test]
    fn results_unavailable_before_first_run() {
        let c = chain(vec![Box::new(Offset::new(1.0).unwrap())], 1, ChainMode::Independent);
        assert_eq!(c.get_errors_total().unwrap_err(), ChainError::NotComputed);
        assert_eq!(c.get_errors_by_source().unwrap_err(), ChainError::NotComputed);
    }

    #[test]
    fn storage_can_be_disabled() {
        let calcs: Vec<Box<dyn ErrorCalculator>> = vec![Box::new(Offset::new(1.0).unwrap())];
        let opts = ErrIntOpts {
            store_errs_by_source: false,
            ..ErrIntOpts::default()
        };
        let mut c = ErrorIntegrator::new(calcs, sd(1), MeasShape::new(1, 1, 1), opts).unwrap();
        c.calc_errors_from_chain(column(&[0.0]).view()).unwrap();
        assert_eq!(c.get_errors_by_source().unwrap_err(), ChainError::NotStored);
        assert!(c.get_errors_total().is_ok());
    }

    #[test]
    fn independent_sums_contributions() {
        let mut c = chain(
            vec![
                Box::new(Offset::new(0.5).unwrap()),
                Box::new(Saturation::new(-1.0, 1.0).unwrap()),
            ],
            3,
            ChainMode::Independent,
        );
        let total = c.calc_errors_from_chain(column(&[-2.0, 0.0, 2.0]).view()).unwrap();
        assert_eq!(*total, column(&[1.5, 0.5, -0.5]));
        let by_source = c.get_errors_by_source().unwrap();
        assert_eq!(by_source.len(), 2);
        assert_eq!(by_source[&0].name, "Offset");
        assert_eq!(by_source[&1].errors, column(&[1.0, 0.0, -1.0]));
    }

    #[test]
    fn dependent_chain_feeds_forward() {
        let mut c = chain(
            vec![
                Box::new(Offset::new(0.5).unwrap()),
                Box::new(Saturation::new(-1.0, 1.0).unwrap()),
            ],
            3,
            ChainMode::Dependent,
        );
        let total = c.calc_errors_from_chain(column(&[-2.0, 0.0, 2.0]).view()).unwrap();
        // Saturation sees [-1.5, 0.5, 2.5].
        assert_eq!(*total, column(&[1.0, 0.5, -1.0]));
    }

    #[test]
    fn per_calculator_mode_follows_each_dependence() {
        let mut c = chain(
            vec![
                Box::new(Offset::new(0.3).unwrap()),
                Box::new(Saturation::new(-1.0, 1.0).unwrap()),
                Box::new(
                    RoundOff::new(1.0, RoundMethod::Round)
                        .unwrap()
                        .with_dependence(Dependence::Dependent),
                ),
            ],
            1,
            ChainMode::PerCalculator,
        );
        // Offset: 0.3; Saturation on 2.2: -1.2; RoundOff on 2.2 + 0.3 - 1.2 = 1.3: -0.3.
        let total = c.calc_errors_from_chain(column(&[2.2]).view()).unwrap();
        assert_abs_diff_eq!(total[[0, 0, 0]], -1.2, epsilon = 1e-12);
    }

    #[test]
    fn failure_is_annotated_and_nothing_committed() {
        let mut c = chain(
            vec![Box::new(Offset::new(1.0).unwrap()), Box::new(Broken)],
            1,
            ChainMode::Independent,
        );
        let err = c.calc_errors_from_chain(column(&[0.0]).view()).unwrap_err();
        assert_eq!(
            err,
            ChainError::CalculatorFailed {
                index: 1,
                name: "Broken".to_string(),
                source: CalcError::failed("sensor offline"),
            }
        );
        assert_eq!(c.get_errors_total().unwrap_err(), ChainError::NotComputed);
    }

    #[test]
    fn basis_shape_is_checked() {
        let mut c = chain(vec![Box::new(Offset::new(1.0).unwrap())], 2, ChainMode::Independent);
        let err = c.calc_errors_from_chain(column(&[0.0]).view()).unwrap_err();
        assert!(matches!(err, ChainError::BasisShape(_)));
    }

    #[test]
    fn geometry_accumulates_within_a_run_and_resets_between_runs() {
        let mut c = chain(vec![Box::new(Shifter), Box::new(Shifter)], 1, ChainMode::Independent);
        c.calc_errors_from_chain(column(&[0.0]).view()).unwrap();
        assert_eq!(c.get_accumulated_sensor_data().positions, array![[2.0, 0.0, 0.0]]);
        c.calc_errors_from_chain(column(&[0.0]).view()).unwrap();
        assert_eq!(c.get_accumulated_sensor_data().positions, array![[2.0, 0.0, 0.0]]);
        assert_eq!(c.sensor_data().positions, array![[0.0, 0.0, 0.0]]);
        assert!(!c.samples_field());
    }

    #[test]
    fn new_geometry_drops_previous_results() {
        let mut c = chain(vec![Box::new(Shifter)], 1, ChainMode::Independent);
        c.calc_errors_from_chain(column(&[0.0]).view()).unwrap();
        c.set_sensor_data(SensorData::new(array![[5.0, 0.0, 0.0]])).unwrap();
        assert_eq!(c.get_errors_total().unwrap_err(), ChainError::NotComputed);
        assert_eq!(c.get_accumulated_sensor_data().positions, array![[5.0, 0.0, 0.0]]);

        let err = c.set_sensor_data(sd(2)).unwrap_err();
        assert!(matches!(err, ChainError::Config(_)));
    }

    #[test]
    fn errors_split_by_type() {
        let rand = RandomCalculator::absolute(RandomGenerator::normal(0.0, 1.0, Seed::Fixed(0)).unwrap());
        let mut c = chain(
            vec![Box::new(Offset::new(2.0).unwrap()), Box::new(rand)],
            2,
            ChainMode::Independent,
        );
        let total = c.calc_errors_from_chain(column(&[0.0, 0.0]).view()).unwrap().clone();
        let sys = c.get_errors_of_type(ErrType::Systematic).unwrap();
        let rnd = c.get_errors_of_type(ErrType::Random).unwrap();
        assert_eq!(sys, column(&[2.0, 2.0]));
        for ((t, s), r) in total.iter().zip(sys.iter()).zip(rnd.iter()) {
            assert_abs_diff_eq!(*t, s + r, epsilon = 1e-12);
        }
    }

    proptest! {
        #[test]
        fn independent_total_is_order_invariant(
            values in prop::collection::vec(-50.0f64..50.0, 1..20),
            offset in -5.0f64..5.0,
            base in 0.1f64..3.0,
            lo in -20.0f64..0.0,
        ) {
            let make = |reverse: bool| {
                let mut calcs: Vec<Box<dyn ErrorCalculator>> = vec![
                    Box::new(Offset::new(offset).unwrap()),
                    Box::new(RoundOff::new(base, RoundMethod::Round).unwrap()),
                    Box::new(Saturation::new(lo, lo + 30.0).unwrap()),
                ];
                if reverse {
                    calcs.reverse();
                }
                chain(calcs, values.len(), ChainMode::Independent)
            };
            let basis = column(&values);
            let mut forward = make(false);
            let mut backward = make(true);
            let a = forward.calc_errors_from_chain(basis.view()).unwrap().clone();
            let b = backward.calc_errors_from_chain(basis.view()).unwrap().clone();
            for (x, y) in a.iter().zip(b.iter()) {
                prop_assert!((x - y).abs() < 1e-9);
            }
        }
    }
}
