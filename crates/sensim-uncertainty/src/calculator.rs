//! The error calculator trait.

use ndarray::{Array3, ArrayView3};
use sensim_core::SensorData;

use crate::error::CalcError;

/// Which error channel a calculator belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrType {
    /// Repeatable bias; identical on every evaluation.
    Systematic,
    /// Fresh draw on every evaluation.
    Random,
}

/// Which basis a calculator prefers when the chain lets it choose.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Dependence {
    /// Perturb the chain's original basis.
    #[default]
    Independent,
    /// Perturb the basis plus every earlier error in the chain.
    Dependent,
}

/// What a calculator returns for one evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct ErrCalcOutput {
    /// Error array with the basis shape; `basis + errors` is the
    /// perturbed value.
    pub errors: Array3<f64>,
    /// New geometry for every later calculator in the chain, when this
    /// calculator perturbs it.
    pub sensor_data: Option<SensorData>,
}

impl ErrCalcOutput {
    /// Errors only; geometry is unchanged.
    pub fn errors(errors: Array3<f64>) -> Self {
        Self {
            errors,
            sensor_data: None,
        }
    }

    /// Errors plus a perturbed geometry snapshot.
    pub fn with_sensor_data(errors: Array3<f64>, sensor_data: SensorData) -> Self {
        Self {
            errors,
            sensor_data: Some(sensor_data),
        }
    }
}

/// A single source of measurement error.
///
/// Calculators hold only their fixed parameters (and, for random kinds,
/// their own random stream). They never keep per-call results; the
/// [`ErrorIntegrator`](crate::ErrorIntegrator) owns those.
///
/// # Contract
///
/// `calc_errs` returns an `errors` array with exactly the shape of
/// `basis`. A chain rejects any other shape before summing.
pub trait ErrorCalculator: Send {
    /// Human-readable name, used in per-source reports and errors.
    fn name(&self) -> &str;

    /// Systematic or random.
    fn err_type(&self) -> ErrType;

    /// Preferred basis under [`ChainMode::PerCalculator`](crate::ChainMode::PerCalculator).
    fn dependence(&self) -> Dependence {
        Dependence::Independent
    }

    /// Whether this calculator may return a new geometry snapshot.
    fn perturbs_geometry(&self) -> bool {
        false
    }

    /// Whether this calculator samples a field of its own.
    fn samples_field(&self) -> bool {
        false
    }

    /// Compute errors for `basis` observed with `sensor_data`.
    fn calc_errs(
        &mut self,
        basis: ArrayView3<'_, f64>,
        sensor_data: &SensorData,
    ) -> Result<ErrCalcOutput, CalcError>;
}
