//! Error calculators and error chains for sensim.
//!
//! A measurement is truth plus the sum of error sources. Each source is an
//! [`ErrorCalculator`]: given a basis array and the current sensor
//! geometry, it returns an error array of the same shape. An
//! [`ErrorIntegrator`] runs an ordered chain of calculators and sums their
//! contributions, either independently (every source sees the same basis)
//! or dependently (each source sees the basis perturbed by all earlier
//! ones).
//!
//! # Calculators
//!
//! | Kind | Types |
//! |------|-------|
//! | Systematic, value | [`Offset`], [`OffsetPercent`], [`RoundOff`], [`Digitisation`], [`Saturation`], [`Calibration`] |
//! | Systematic, field | [`SpatialAverageBias`], [`AngleOffsetBias`], [`FieldBias`] |
//! | Random | [`RandomCalculator`] driven by a [`RandomGenerator`] |
//!
//! Random streams are seeded explicitly through [`Seed`]; a fixed seed
//! reproduces the same errors run after run.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod calculator;
pub mod error;
pub mod field_bias;
pub mod generator;
pub mod integrator;
pub mod random;
pub mod systematic;

pub use calculator::{Dependence, ErrCalcOutput, ErrType, ErrorCalculator};
pub use error::{CalcError, ChainError};
pub use field_bias::{AngleOffsetBias, FieldBias, FieldErrorData, SpatialAverageBias};
pub use generator::{RandomDist, RandomGenerator, Seed};
pub use integrator::{ChainMode, ErrIntOpts, ErrorIntegrator, SourceErrors};
pub use random::RandomCalculator;
pub use systematic::{
    Calibration, Digitisation, Offset, OffsetPercent, RoundMethod, RoundOff, Saturation,
};
