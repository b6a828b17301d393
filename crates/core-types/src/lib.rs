//! # Anthropo Core Types
//!
//! The foundational data structures shared by every other crate in the workspace.
//!
//! ## Architectural Principles
//!
//! - **Layer 0:** This crate depends on no other workspace crate. It holds the
//!   measurement data model and nothing else.
//! - **Field keys as the common language:** every reading is addressable by a
//!   `MeasurementField`, whose stable string key is shared by patches, reference
//!   tables and the result record.
//!
//! ## Public API
//!
//! - `MeasurementSet`: one versioned visit's worth of readings.
//! - `MeasurementPatch`: a full or partial update to a `MeasurementSet`.
//! - `MeasurementField`, `MeasurementCategory`, `Unit`, `Sex`: supporting enums.
//! - `CoreError`: validation failures.

pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{MeasurementCategory, MeasurementField, Sex, Unit};
pub use error::CoreError;
pub use structs::{
    BasicMeasurements, Diameters, INITIAL_VERSION, MeasurementPatch, MeasurementSet, Perimeters,
    Skinfolds,
};
