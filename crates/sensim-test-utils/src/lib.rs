//! Test utilities and mock types for sensim development.
//!
//! Provides analytic implementations of the [`Field`](sensim_core::Field)
//! collaborator (closed-form fields whose footprint averages are known
//! exactly) and error-calculator fixtures for chain validation tests.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fields;
pub mod fixtures;

pub use fields::{constant_field, AnalyticField, CountingField, FailingField};
pub use fixtures::{
    ConstCalculator, FailingCalculator, GeometryShiftCalculator, WrongShapeCalculator,
};
