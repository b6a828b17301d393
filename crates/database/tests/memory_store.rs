use chrono::Utc;
use composition::{CompositionEngine, CompositionResult};
use core_types::{MeasurementField, MeasurementSet, Sex};
use database::{DbError, InMemoryMeasurementStore, MeasurementStore};
use uuid::Uuid;

fn complete_measurement() -> MeasurementSet {
    MeasurementSet::new(Uuid::new_v4(), Utc::now())
        .with(MeasurementField::Weight, 74.6)
        .with(MeasurementField::Height, 179.5)
        .with(MeasurementField::DiameterHumeral, 7.0)
        .with(MeasurementField::DiameterFemoral, 9.9)
        .with(MeasurementField::SkinfoldTriceps, 9.8)
        .with(MeasurementField::SkinfoldSubscapular, 11.2)
        .with(MeasurementField::SkinfoldSupraspinal, 9.8)
        .with(MeasurementField::SkinfoldAbdominal, 17.5)
        .with(MeasurementField::SkinfoldThigh, 14.8)
        .with(MeasurementField::SkinfoldCalf, 11.5)
}

fn result_for(measurement: &MeasurementSet) -> CompositionResult {
    CompositionEngine::default()
        .compute(measurement, Some(Sex::Male))
        .unwrap()
}

#[tokio::test]
async fn insert_then_fetch_round_trips() {
    let store = InMemoryMeasurementStore::new();
    let measurement = complete_measurement();
    store.insert(&measurement).await.unwrap();

    assert_eq!(store.fetch(measurement.measurement_id).await.unwrap(), measurement);
    assert!(matches!(
        store.insert(&measurement).await,
        Err(DbError::AlreadyExists(_))
    ));
    assert!(matches!(
        store.fetch(Uuid::new_v4()).await,
        Err(DbError::NotFound(_))
    ));
}

#[tokio::test]
async fn compare_and_swap_increments_on_matching_version() {
    let store = InMemoryMeasurementStore::new();
    let measurement = complete_measurement();
    store.insert(&measurement).await.unwrap();

    let edited = measurement.clone().with(MeasurementField::Weight, 75.0);
    let stored = store.compare_and_swap(1, &edited).await.unwrap();
    assert_eq!(stored.version, 2);
    assert_eq!(stored.get(MeasurementField::Weight), Some(75.0));
    assert_eq!(store.fetch(measurement.measurement_id).await.unwrap(), stored);
}

#[tokio::test]
async fn compare_and_swap_rejects_stale_version_without_writing() {
    let store = InMemoryMeasurementStore::new();
    let measurement = complete_measurement();
    store.insert(&measurement).await.unwrap();
    store.compare_and_swap(1, &measurement).await.unwrap();

    let edited = measurement.clone().with(MeasurementField::Weight, 90.0);
    let err = store.compare_and_swap(1, &edited).await.unwrap_err();
    assert!(matches!(
        err,
        DbError::VersionConflict { expected: 1, current: 2, .. }
    ));

    let stored = store.fetch(measurement.measurement_id).await.unwrap();
    assert_eq!(stored.version, 2);
    assert_eq!(stored.get(MeasurementField::Weight), Some(74.6));
}

#[tokio::test]
async fn results_are_only_returned_for_the_current_version() {
    let store = InMemoryMeasurementStore::new();
    let measurement = complete_measurement();
    store.insert(&measurement).await.unwrap();

    let first = result_for(&measurement);
    assert!(store.save_result(&first).await.unwrap());
    assert_eq!(
        store.fetch_result(measurement.measurement_id).await.unwrap(),
        Some(first.clone())
    );

    let updated = store.compare_and_swap(1, &measurement).await.unwrap();
    assert_eq!(store.fetch_result(measurement.measurement_id).await.unwrap(), None);

    let second = result_for(&updated);
    assert!(store.save_result(&second).await.unwrap());
    // A late writer holding the older result cannot overwrite the newer one.
    assert!(!store.save_result(&first).await.unwrap());
    assert_eq!(
        store.fetch_result(measurement.measurement_id).await.unwrap(),
        Some(second)
    );
}

#[tokio::test]
async fn result_for_the_same_version_replaces_the_stored_one() {
    let store = InMemoryMeasurementStore::new();
    let measurement = complete_measurement();
    store.insert(&measurement).await.unwrap();

    let male = result_for(&measurement);
    assert!(store.save_result(&male).await.unwrap());

    let female = CompositionEngine::default()
        .compute(&measurement, Some(Sex::Female))
        .unwrap();
    assert!(store.save_result(&female).await.unwrap());
    assert_eq!(
        store.fetch_result(measurement.measurement_id).await.unwrap(),
        Some(female)
    );
}
