//! Random error sources.

use ndarray::ArrayView3;
use sensim_core::SensorData;

use crate::calculator::{Dependence, ErrCalcOutput, ErrType, ErrorCalculator};
use crate::error::CalcError;
use crate::generator::RandomGenerator;

/// Random noise drawn fresh on every evaluation.
///
/// Absolute noise adds the generator's deviates directly. Percent noise
/// scales them by the basis: `basis · deviate / 100`.
#[derive(Clone, Debug)]
pub struct RandomCalculator {
    generator: RandomGenerator,
    percent: bool,
    dependence: Dependence,
}

impl RandomCalculator {
    /// Additive noise from `generator`.
    pub fn absolute(generator: RandomGenerator) -> Self {
        Self {
            generator,
            percent: false,
            dependence: Dependence::default(),
        }
    }

    /// Noise proportional to the basis, `generator` giving percent.
    pub fn percent(generator: RandomGenerator) -> Self {
        Self {
            generator,
            percent: true,
            dependence: Dependence::default(),
        }
    }

    /// Set the preferred chaining basis.
    pub fn with_dependence(mut self, dependence: Dependence) -> Self {
        self.dependence = dependence;
        self
    }

    /// The underlying generator.
    pub fn generator(&self) -> &RandomGenerator {
        &self.generator
    }
}

impl ErrorCalculator for RandomCalculator {
    fn name(&self) -> &str {
        if self.percent {
            "RandomPercent"
        } else {
            "Random"
        }
    }

    fn err_type(&self) -> ErrType {
        ErrType::Random
    }

    fn dependence(&self) -> Dependence {
        self.dependence
    }

    fn calc_errs(
        &mut self,
        basis: ArrayView3<'_, f64>,
        _sensor_data: &SensorData,
    ) -> Result<ErrCalcOutput, CalcError> {
        let mut errors = self.generator.generate(basis.raw_dim());
        if self.percent {
            errors.zip_mut_with(&basis, |e, &b| *e *= b / 100.0);
        }
        Ok(ErrCalcOutput::errors(errors))
    }
}
