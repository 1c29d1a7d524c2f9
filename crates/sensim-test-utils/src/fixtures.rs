//! Reusable error-calculator fixtures.
//!
//! - [`ConstCalculator`]: constant error, optionally random-typed.
//! - [`FailingCalculator`]: fails after N successful calls.
//! - [`WrongShapeCalculator`]: returns an error array one sensor short.
//! - [`GeometryShiftCalculator`]: shifts every sensor and hands the new
//!   geometry to the chain.

use ndarray::{Array3, ArrayView3};
use sensim_core::SensorData;
use sensim_uncertainty::{CalcError, Dependence, ErrCalcOutput, ErrType, ErrorCalculator};

/// Returns the same constant error on every call.
pub struct ConstCalculator {
    pub name: String,
    pub value: f64,
    pub err_type: ErrType,
    pub dependence: Dependence,
}

impl ConstCalculator {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            err_type: ErrType::Systematic,
            dependence: Dependence::Independent,
        }
    }

    /// Same calculator, reported as a random source.
    pub fn random(name: impl Into<String>, value: f64) -> Self {
        Self {
            err_type: ErrType::Random,
            ..Self::new(name, value)
        }
    }
}

impl ErrorCalculator for ConstCalculator {
    fn name(&self) -> &str {
        &self.name
    }

    fn err_type(&self) -> ErrType {
        self.err_type
    }

    fn dependence(&self) -> Dependence {
        self.dependence
    }

    fn calc_errs(
        &mut self,
        basis: ArrayView3<'_, f64>,
        _sensor_data: &SensorData,
    ) -> Result<ErrCalcOutput, CalcError> {
        Ok(ErrCalcOutput::errors(Array3::from_elem(basis.raw_dim(), self.value)))
    }
}

/// Succeeds `succeed_count` times, then fails on every call.
pub struct FailingCalculator {
    pub name: String,
    pub succeed_count: usize,
    calls: usize,
}

impl FailingCalculator {
    pub fn new(name: impl Into<String>, succeed_count: usize) -> Self {
        Self {
            name: name.into(),
            succeed_count,
            calls: 0,
        }
    }

    /// How many times `calc_errs` has been called.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl ErrorCalculator for FailingCalculator {
    fn name(&self) -> &str {
        &self.name
    }

    fn err_type(&self) -> ErrType {
        ErrType::Systematic
    }

    fn calc_errs(
        &mut self,
        basis: ArrayView3<'_, f64>,
        _sensor_data: &SensorData,
    ) -> Result<ErrCalcOutput, CalcError> {
        let n = self.calls;
        self.calls += 1;
        if n >= self.succeed_count {
            return Err(CalcError::failed(format!(
                "deliberate failure after {} successful calls",
                self.succeed_count
            )));
        }
        Ok(ErrCalcOutput::errors(Array3::zeros(basis.raw_dim())))
    }
}

/// Returns an error array with one sensor fewer than the basis.
pub struct WrongShapeCalculator {
    pub name: String,
}

impl WrongShapeCalculator {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl ErrorCalculator for WrongShapeCalculator {
    fn name(&self) -> &str {
        &self.name
    }

    fn err_type(&self) -> ErrType {
        ErrType::Systematic
    }

    fn calc_errs(
        &mut self,
        basis: ArrayView3<'_, f64>,
        _sensor_data: &SensorData,
    ) -> Result<ErrCalcOutput, CalcError> {
        let (s, c, t) = basis.dim();
        Ok(ErrCalcOutput::errors(Array3::ones((s.saturating_sub(1), c, t))))
    }
}

/// Shifts every sensor by `shift` and reports zero error.
pub struct GeometryShiftCalculator {
    pub name: String,
    pub shift: [f64; 3],
}

impl GeometryShiftCalculator {
    pub fn new(name: impl Into<String>, shift: [f64; 3]) -> Self {
        Self {
            name: name.into(),
            shift,
        }
    }
}

impl ErrorCalculator for GeometryShiftCalculator {
    fn name(&self) -> &str {
        &self.name
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
        for mut row in moved.positions.rows_mut() {
            for (v, d) in row.iter_mut().zip(self.shift.iter()) {
                *v += d;
            }
        }
        Ok(ErrCalcOutput::with_sensor_data(
            Array3::zeros(basis.raw_dim()),
            moved,
        ))
    }
}
