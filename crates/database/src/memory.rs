use crate::error::DbError;
use crate::store::MeasurementStore;
use async_trait::async_trait;
use composition::CompositionResult;
use core_types::MeasurementSet;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Default)]
struct StoreState {
    measurements: HashMap<Uuid, MeasurementSet>,
    results: HashMap<Uuid, CompositionResult>,
}

/// A process-local store for tests and one-shot CLI runs.
///
/// Every operation runs under a single mutex guard, which makes the
/// check-and-write of `compare_and_swap` atomic.
#[derive(Debug, Default)]
pub struct InMemoryMeasurementStore {
    state: Mutex<StoreState>,
}

impl InMemoryMeasurementStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.measurements.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl MeasurementStore for InMemoryMeasurementStore {
    async fn insert(&self, measurement: &MeasurementSet) -> Result<(), DbError> {
        let mut state = self.state.lock().await;
        if state.measurements.contains_key(&measurement.measurement_id) {
            return Err(DbError::AlreadyExists(measurement.measurement_id));
        }
        state
            .measurements
            .insert(measurement.measurement_id, measurement.clone());
        Ok(())
    }

    async fn fetch(&self, measurement_id: Uuid) -> Result<MeasurementSet, DbError> {
        self.state
            .lock()
            .await
            .measurements
            .get(&measurement_id)
            .cloned()
            .ok_or(DbError::NotFound(measurement_id))
    }

    async fn compare_and_swap(
        &self,
        expected_version: u64,
        updated: &MeasurementSet,
    ) -> Result<MeasurementSet, DbError> {
        let mut state = self.state.lock().await;
        let stored = state
            .measurements
            .get_mut(&updated.measurement_id)
            .ok_or(DbError::NotFound(updated.measurement_id))?;

        if stored.version != expected_version {
            return Err(DbError::VersionConflict {
                measurement_id: updated.measurement_id,
                expected: expected_version,
                current: stored.version,
            });
        }

        let mut next = updated.clone();
        next.version = expected_version + 1;
        *stored = next.clone();
        Ok(next)
    }

    async fn save_result(&self, result: &CompositionResult) -> Result<bool, DbError> {
        let mut state = self.state.lock().await;
        let newer_exists = state
            .results
            .get(&result.measurement_id)
            .is_some_and(|existing| existing.version > result.version);
        if newer_exists {
            return Ok(false);
        }
        state.results.insert(result.measurement_id, result.clone());
        Ok(true)
    }

    async fn fetch_result(
        &self,
        measurement_id: Uuid,
    ) -> Result<Option<CompositionResult>, DbError> {
        let state = self.state.lock().await;
        let current = state
            .measurements
            .get(&measurement_id)
            .ok_or(DbError::NotFound(measurement_id))?
            .version;
        Ok(state
            .results
            .get(&measurement_id)
            .filter(|result| result.version == current)
            .cloned())
    }
}
