use crate::error::DbError;
use async_trait::async_trait;
use composition::CompositionResult;
use core_types::MeasurementSet;
use uuid::Uuid;

/// The storage boundary for measurements and their composition results.
///
/// `compare_and_swap` is the only place a measurement's version changes, and it
/// must be atomic with respect to every other writer of the same measurement,
/// including writers in other processes.
#[async_trait]
pub trait MeasurementStore: Send + Sync {
    /// Stores a new measurement exactly as given, version included.
    async fn insert(&self, measurement: &MeasurementSet) -> Result<(), DbError>;

    async fn fetch(&self, measurement_id: Uuid) -> Result<MeasurementSet, DbError>;

    /// Replaces the stored readings with `updated` if, and only if, the stored
    /// version is still `expected_version`.
    ///
    /// On success the stored version becomes `expected_version + 1` and the
    /// stored measurement is returned. The `version` carried by `updated` is
    /// ignored.
    async fn compare_and_swap(
        &self,
        expected_version: u64,
        updated: &MeasurementSet,
    ) -> Result<MeasurementSet, DbError>;

    /// Stores a result unless one for a newer version is already stored. A
    /// result for the same version replaces the stored one. Returns whether
    /// the result was written.
    async fn save_result(&self, result: &CompositionResult) -> Result<bool, DbError>;

    /// The stored result, only if it was computed from the measurement's
    /// current version.
    async fn fetch_result(&self, measurement_id: Uuid)
    -> Result<Option<CompositionResult>, DbError>;
}
