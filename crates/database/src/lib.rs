//! # Anthropo Database Crate
//!
//! This crate is the storage boundary for measurements and their composition
//! results. It is the system's "permanent archive."
//!
//! ## Architectural Principles
//!
//! - **Layer 3 Adapter:** This crate encapsulates all database-specific logic behind
//!   the `MeasurementStore` trait. Callers never see SQL.
//! - **Optimistic Concurrency at the Boundary:** `compare_and_swap` is the single
//!   synchronization point for measurement updates. On PostgreSQL it is one
//!   conditional `UPDATE ... WHERE version = $expected`, so it holds across any
//!   number of server instances.
//! - **Monotonic Results:** a result is only ever replaced by one computed from a
//!   newer measurement version, and a result is only returned while it matches
//!   the measurement's current version.
//!
//! ## Public API
//!
//! - `connect`: The async function to establish the database connection pool.
//! - `run_migrations`: Applies the embedded migrations.
//! - `MeasurementStore`: The storage trait used by the coordinator.
//! - `DbRepository`: The PostgreSQL implementation.
//! - `InMemoryMeasurementStore`: A process-local implementation.
//! - `DbError`: The specific error types that can be returned from this crate.

pub mod connection;
pub mod error;
pub mod memory;
pub mod repository;
pub mod store;

pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use memory::InMemoryMeasurementStore;
pub use repository::DbRepository;
pub use store::MeasurementStore;
