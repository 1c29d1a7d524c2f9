//! Deterministic value-space error sources.
//!
//! Each calculator maps the basis element-wise; none of them touch the
//! field or the random stream. Invalid parameters are rejected at
//! construction.

use std::fmt;
use std::sync::Arc;

use ndarray::ArrayView3;
use sensim_core::{ConfigError, SensorData};

use crate::calculator::{Dependence, ErrCalcOutput, ErrType, ErrorCalculator};
use crate::error::CalcError;

// ── Offset ─────────────────────────────────────────────────────────

/// Constant offset added to every value.
#[derive(Clone, Debug, PartialEq)]
pub struct Offset {
    offset: f64,
    dependence: Dependence,
}

impl Offset {
    /// Offset every value by `offset`.
    pub fn new(offset: f64) -> Result<Self, ConfigError> {
        if !offset.is_finite() {
            return Err(ConfigError::invalid("offset", format!("must be finite, got {offset}")));
        }
        Ok(Self {
            offset,
            dependence: Dependence::default(),
        })
    }

    /// Set the preferred chaining basis.
    pub fn with_dependence(mut self, dependence: Dependence) -> Self {
        self.dependence = dependence;
        self
    }
}

impl ErrorCalculator for Offset {
    fn name(&self) -> &str {
        "Offset"
    }

    fn err_type(&self) -> ErrType {
        ErrType::Systematic
    }

    fn dependence(&self) -> Dependence {
        self.dependence
    }

    fn calc_errs(
        &mut self,
        basis: ArrayView3<'_, f64>,
        _sensor_data: &SensorData,
    ) -> Result<ErrCalcOutput, CalcError> {
        Ok(ErrCalcOutput::errors(basis.mapv(|_| self.offset)))
    }
}

/// Offset proportional to the basis: `basis · percent / 100`.
#[derive(Clone, Debug, PartialEq)]
pub struct OffsetPercent {
    percent: f64,
    dependence: Dependence,
}

impl OffsetPercent {
    /// Offset every value by `percent` percent of itself.
    pub fn new(percent: f64) -> Result<Self, ConfigError> {
        if !percent.is_finite() {
            return Err(ConfigError::invalid("percent", format!("must be finite, got {percent}")));
        }
        Ok(Self {
            percent,
            dependence: Dependence::default(),
        })
    }

    /// Set the preferred chaining basis.
    pub fn with_dependence(mut self, dependence: Dependence) -> Self {
        self.dependence = dependence;
        self
    }
}

impl ErrorCalculator for OffsetPercent {
    fn name(&self) -> &str {
        "OffsetPercent"
    }

    fn err_type(&self) -> ErrType {
        ErrType::Systematic
    }

    fn dependence(&self) -> Dependence {
        self.dependence
    }

    fn calc_errs(
        &mut self,
        basis: ArrayView3<'_, f64>,
        _sensor_data: &SensorData,
    ) -> Result<ErrCalcOutput, CalcError> {
        let factor = self.percent / 100.0;
        Ok(ErrCalcOutput::errors(basis.mapv(|v| v * factor)))
    }
}

// ── Rounding ───────────────────────────────────────────────────────

/// How values snap to a grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RoundMethod {
    /// Nearest grid point, ties to even.
    #[default]
    Round,
    /// Next grid point down.
    Floor,
    /// Next grid point up.
    Ceil,
}

impl RoundMethod {
    /// Apply the method to `v`.
    pub fn apply(self, v: f64) -> f64 {
        match self {
            Self::Round => v.round_ties_even(),
            Self::Floor => v.floor(),
            Self::Ceil => v.ceil(),
        }
    }
}

/// Rounds values to the nearest multiple of `base`.
///
/// Error = `base · method(basis / base) − basis`.
#[derive(Clone, Debug, PartialEq)]
pub struct RoundOff {
    base: f64,
    method: RoundMethod,
    dependence: Dependence,
}

impl RoundOff {
    /// Round to multiples of `base` with `method`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `base` is not finite and positive.
    pub fn new(base: f64, method: RoundMethod) -> Result<Self, ConfigError> {
        if !(base.is_finite() && base > 0.0) {
            return Err(ConfigError::invalid(
                "base",
                format!("must be finite and > 0, got {base}"),
            ));
        }
        Ok(Self {
            base,
            method,
            dependence: Dependence::default(),
        })
    }

    /// Set the preferred chaining basis.
    pub fn with_dependence(mut self, dependence: Dependence) -> Self {
        self.dependence = dependence;
        self
    }

    /// The rounding grid spacing.
    pub fn base(&self) -> f64 {
        self.base
    }

    fn errs(&self, basis: ArrayView3<'_, f64>) -> ErrCalcOutput {
        let (base, method) = (self.base, self.method);
        ErrCalcOutput::errors(basis.mapv(|v| base * method.apply(v / base) - v))
    }
}

impl ErrorCalculator for RoundOff {
    fn name(&self) -> &str {
        "RoundOff"
    }

    fn err_type(&self) -> ErrType {
        ErrType::Systematic
    }

    fn dependence(&self) -> Dependence {
        self.dependence
    }

    fn calc_errs(
        &mut self,
        basis: ArrayView3<'_, f64>,
        _sensor_data: &SensorData,
    ) -> Result<ErrCalcOutput, CalcError> {
        Ok(self.errs(basis))
    }
}

/// Quantisation by an analogue-to-digital converter with
/// `bits_per_unit` levels per unit of measurement.
///
/// Equivalent to [`RoundOff`] with `base = 1 / bits_per_unit`.
#[derive(Clone, Debug, PartialEq)]
pub struct Digitisation {
    inner: RoundOff,
}

impl Digitisation {
    /// Quantise at `bits_per_unit` levels per unit.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `bits_per_unit` is not finite and positive.
    pub fn new(bits_per_unit: f64, method: RoundMethod) -> Result<Self, ConfigError> {
        if !(bits_per_unit.is_finite() && bits_per_unit > 0.0) {
            return Err(ConfigError::invalid(
                "bits_per_unit",
                format!("must be finite and > 0, got {bits_per_unit}"),
            ));
        }
        Ok(Self {
            inner: RoundOff::new(1.0 / bits_per_unit, method)?,
        })
    }

    /// Set the preferred chaining basis.
    pub fn with_dependence(mut self, dependence: Dependence) -> Self {
        self.inner.dependence = dependence;
        self
    }
}

impl ErrorCalculator for Digitisation {
    fn name(&self) -> &str {
        "Digitisation"
    }

    fn err_type(&self) -> ErrType {
        ErrType::Systematic
    }

    fn dependence(&self) -> Dependence {
        self.inner.dependence
    }

    fn calc_errs(
        &mut self,
        basis: ArrayView3<'_, f64>,
        _sensor_data: &SensorData,
    ) -> Result<ErrCalcOutput, CalcError> {
        Ok(self.inner.errs(basis))
    }
}

// ── Saturation ─────────────────────────────────────────────────────

/// Clamps values to the sensor's measurement range.
///
/// Error = `clamp(basis, min, max) − basis`.
#[derive(Clone, Debug, PartialEq)]
pub struct Saturation {
    min: f64,
    max: f64,
    dependence: Dependence,
}

impl Saturation {
    /// Clamp to `[min, max]`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if either bound is NaN or `min > max`.
    pub fn new(min: f64, max: f64) -> Result<Self, ConfigError> {
        if min.is_nan() || max.is_nan() || min > max {
            return Err(ConfigError::invalid(
                "min/max",
                format!("need min <= max, got [{min}, {max}]"),
            ));
        }
        Ok(Self {
            min,
            max,
            dependence: Dependence::default(),
        })
    }

    /// Set the preferred chaining basis.
    pub fn with_dependence(mut self, dependence: Dependence) -> Self {
        self.dependence = dependence;
        self
    }
}

impl ErrorCalculator for Saturation {
    fn name(&self) -> &str {
        "Saturation"
    }

    fn err_type(&self) -> ErrType {
        ErrType::Systematic
    }

    fn dependence(&self) -> Dependence {
        self.dependence
    }

    fn calc_errs(
        &mut self,
        basis: ArrayView3<'_, f64>,
        _sensor_data: &SensorData,
    ) -> Result<ErrCalcOutput, CalcError> {
        let (min, max) = (self.min, self.max);
        Ok(ErrCalcOutput::errors(basis.mapv(|v| v.clamp(min, max) - v)))
    }
}

// ── Calibration ────────────────────────────────────────────────────

type Curve = dyn Fn(f64) -> f64 + Send + Sync;

/// Error from an imperfect calibration curve.
///
/// Error = `curve(basis) − basis`. The curve must be deterministic.
#[derive(Clone)]
pub struct Calibration {
    curve: Arc<Curve>,
    dependence: Dependence,
}

impl Calibration {
    /// Wrap `curve`.
    pub fn new(curve: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        Self {
            curve: Arc::new(curve),
            dependence: Dependence::default(),
        }
    }

    /// Set the preferred chaining basis.
    pub fn with_dependence(mut self, dependence: Dependence) -> Self {
        self.dependence = dependence;
        self
    }
}

impl fmt::Debug for Calibration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Calibration")
            .field("dependence", &self.dependence)
            .finish_non_exhaustive()
    }
}

impl ErrorCalculator for Calibration {
    fn name(&self) -> &str {
        "Calibration"
    }

    fn err_type(&self) -> ErrType {
        ErrType::Systematic
    }

    fn dependence(&self) -> Dependence {
        self.dependence
    }

    fn calc_errs(
        &mut self,
        basis: ArrayView3<'_, f64>,
        _sensor_data: &SensorData,
    ) -> Result<ErrCalcOutput, CalcError> {
        let curve = &self.curve;
        Ok(ErrCalcOutput::errors(basis.mapv(|v| curve(v) - v)))
    }
}
