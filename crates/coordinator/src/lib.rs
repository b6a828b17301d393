//! # Anthropo Coordinator
//!
//! The optimistic-concurrency update protocol for measurements. This is the only
//! stateful component: every mutation of a measurement, and every result
//! derived from one, goes through the `MeasurementVersionCoordinator`.
//!
//! ## Architectural Principles
//!
//! - **Version as lock token:** callers present the version they believe is
//!   current. A mismatch is a `Conflict`; there is no merge and no retry.
//! - **Store-level atomicity:** the version check that decides the commit is the
//!   store's compare-and-swap, not an in-process lock, so it holds across
//!   instances sharing one database.
//! - **Results follow commits:** a result is computed only from a committed
//!   revision and is tagged with that revision's version.
//!
//! ## Public API
//!
//! - `MeasurementVersionCoordinator`: register, update, recompute, read.
//! - `CoordinatorError`: the protocol's error type, with an HTTP status mapping.

pub mod error;

pub use error::CoordinatorError;

use composition::{CompositionEngine, CompositionResult};
use core_types::{INITIAL_VERSION, MeasurementPatch, MeasurementSet, Sex};
use database::MeasurementStore;
use std::sync::Arc;
use uuid::Uuid;

/// Serializes concurrent edits of a measurement through versioned updates.
///
/// Cheap to clone; clones share the same store and engine.
#[derive(Clone)]
pub struct MeasurementVersionCoordinator {
    store: Arc<dyn MeasurementStore>,
    engine: Arc<CompositionEngine>,
}

impl MeasurementVersionCoordinator {
    pub fn new(store: Arc<dyn MeasurementStore>, engine: CompositionEngine) -> Self {
        Self {
            store,
            engine: Arc::new(engine),
        }
    }

    /// Stores a new measurement. Whatever version it carries, it is stored at
    /// the initial version.
    #[tracing::instrument(skip_all, fields(measurement_id = %measurement.measurement_id))]
    pub async fn register(
        &self,
        mut measurement: MeasurementSet,
    ) -> Result<MeasurementSet, CoordinatorError> {
        measurement.validate_readings()?;
        measurement.version = INITIAL_VERSION;

        self.store.insert(&measurement).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to register measurement.");
            CoordinatorError::from(e)
        })?;

        tracing::info!(patient_id = %measurement.patient_id, "Measurement registered.");
        Ok(measurement)
    }

    pub async fn measurement(&self, measurement_id: Uuid) -> Result<MeasurementSet, CoordinatorError> {
        Ok(self.store.fetch(measurement_id).await?)
    }

    /// Applies `patch` if `expected_version` is still the measurement's current
    /// version, and returns the committed revision.
    ///
    /// A stale version yields `Conflict` and leaves the measurement untouched.
    /// The same holds when another writer commits between the read and the
    /// write: the store's compare-and-swap decides.
    #[tracing::instrument(skip(self, patch), fields(set = patch.values.len(), cleared = patch.clear.len()))]
    pub async fn update(
        &self,
        measurement_id: Uuid,
        expected_version: u64,
        patch: &MeasurementPatch,
    ) -> Result<MeasurementSet, CoordinatorError> {
        let current = self.store.fetch(measurement_id).await?;
        if current.version != expected_version {
            tracing::info!(
                current = current.version,
                "Rejected update carrying a stale version."
            );
            return Err(CoordinatorError::Conflict {
                measurement_id,
                expected: expected_version,
                current: current.version,
            });
        }

        let mut next = current;
        next.apply_patch(patch)?;

        match self.store.compare_and_swap(expected_version, &next).await {
            Ok(committed) => {
                tracing::info!(version = committed.version, "Measurement update committed.");
                Ok(committed)
            }
            Err(e) => {
                let err = CoordinatorError::from(e);
                if err.is_conflict() {
                    tracing::info!(error = %err, "Lost the commit race to a concurrent writer.");
                } else {
                    tracing::error!(error = %err, "Failed to commit measurement update.");
                }
                Err(err)
            }
        }
    }

    /// The full control flow: commit the update, then compute and store the
    /// result for the new revision.
    ///
    /// If the computation fails the update stays committed and no result is
    /// stored for the new version, so any earlier result reads as stale.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update_and_recompute(
        &self,
        measurement_id: Uuid,
        expected_version: u64,
        patch: &MeasurementPatch,
        sex: Option<Sex>,
    ) -> Result<CompositionResult, CoordinatorError> {
        let committed = self.update(measurement_id, expected_version, patch).await?;
        self.compute_and_store(&committed, sex).await
    }

    /// Computes and stores the result for the measurement's current revision,
    /// replacing any result already stored for it.
    #[tracing::instrument(skip(self))]
    pub async fn recompute(
        &self,
        measurement_id: Uuid,
        sex: Option<Sex>,
    ) -> Result<CompositionResult, CoordinatorError> {
        let current = self.store.fetch(measurement_id).await?;
        self.compute_and_store(&current, sex).await
    }

    /// The stored result, if one exists for the current version.
    pub async fn current_result(
        &self,
        measurement_id: Uuid,
    ) -> Result<Option<CompositionResult>, CoordinatorError> {
        Ok(self.store.fetch_result(measurement_id).await?)
    }

    async fn compute_and_store(
        &self,
        measurement: &MeasurementSet,
        sex: Option<Sex>,
    ) -> Result<CompositionResult, CoordinatorError> {
        let result = self.engine.compute(measurement, sex).map_err(|e| {
            tracing::warn!(
                version = measurement.version,
                error = %e,
                "Composition failed; no result stored for this revision."
            );
            CoordinatorError::from(e)
        })?;

        let stored = self.store.save_result(&result).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to store composition result.");
            CoordinatorError::from(e)
        })?;
        if !stored {
            // Another writer committed and stored a result for a later revision
            // while this one was computing.
            let current = self.store.fetch(result.measurement_id).await?;
            tracing::info!(
                version = result.version,
                current = current.version,
                "Discarded a result for a superseded revision."
            );
            return Err(CoordinatorError::Conflict {
                measurement_id: result.measurement_id,
                expected: result.version,
                current: current.version,
            });
        }
        Ok(result)
    }
}
