//! # Anthropo Composition Engine
//!
//! This crate turns a single anthropometric measurement revision into a body
//! composition report: BMI, body density, the five-component mass fractionation
//! (skin, adipose, muscle, bone, residual), ratios, an optional somatotype and
//! per-reading statistics.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of storage
//!   or concurrency. It depends only on `core-types`, `standards` and, for
//!   `CompositionEngine::from_config`, `configuration`.
//! - **Stateless Calculation:** The `CompositionEngine` holds only immutable
//!   configuration. It takes a `MeasurementSet` and produces a `CompositionResult`
//!   tagged with the measurement's version, so equal inputs give equal outputs.
//! - **Raw values in, adjusted values out:** the formulas consume raw readings;
//!   adjusted values are reported per field but never fed back into the pipeline.
//!
//! ## Public API
//!
//! - `CompositionEngine`: the main entry point.
//! - `BodyCompositionCalculator` / `Fractionation`: the fractionation pipeline on its own.
//! - `CompositionResult`: the externally consumed record.
//! - `CompositionError`: precondition failures and degenerate computations.

pub mod assembler;
pub mod calculator;
pub mod engine;
pub mod error;
pub mod result;
pub mod somatotype;

pub use assembler::ResultAssembler;
pub use calculator::{
    BodyCompositionCalculator, CompositionInputs, Fractionation, RESIDUAL_FRACTION_FEMALE,
    RESIDUAL_FRACTION_MALE, body_surface_area, is_mandatory, residual_fraction,
};
pub use engine::CompositionEngine;
pub use error::{CompositionError, DegenerateComputation, PreconditionError};
pub use result::{CompositionResult, FieldResult, MassComponent};
pub use somatotype::Somatotype;
