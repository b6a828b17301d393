//! # Anthropo Measurement Standards
//!
//! Static knowledge about measurement techniques, kept apart from the formulas
//! that consume it.
//!
//! ## Architectural Principles
//!
//! - **Injected, never global:** `ReferenceTables` and `AdjustmentPolicy` are
//!   plain values handed to the composition engine, so tests can swap in
//!   synthetic reference populations.
//! - **Total lookups:** unknown field keys resolve to documented "no data"
//!   defaults instead of failing.
//!
//! ## Public API
//!
//! - `ReferenceTables`: per-field %ETM and population mean/SD.
//! - `AdjustmentPolicy`: the instrument correction applied per category.
//! - `z_score`: standardized deviation against a reference.
//! - `StandardsError`: invalid configured statistics.

pub mod adjustment;
pub mod error;
pub mod tables;
pub mod zscore;

pub use adjustment::AdjustmentPolicy;
pub use error::StandardsError;
pub use tables::{PopulationStat, ReferenceTables, ReferenceTablesBuilder};
pub use zscore::z_score;
