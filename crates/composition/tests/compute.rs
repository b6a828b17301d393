use approx::assert_relative_eq;
use chrono::{TimeZone, Utc};
use composition::{CompositionEngine, CompositionError, PreconditionError};
use core_types::{MeasurementField, MeasurementSet, Sex};
use proptest::prelude::*;
use uuid::Uuid;

/// A subject whose every reading equals the built-in reference mean.
fn reference_subject() -> MeasurementSet {
    let taken_at = Utc.with_ymd_and_hms(2024, 3, 14, 9, 30, 0).unwrap();
    MeasurementSet::new(Uuid::new_v4(), taken_at)
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

#[test]
fn reference_subject_scores_zero_everywhere() {
    let engine = CompositionEngine::default();
    let result = engine.compute(&reference_subject(), Some(Sex::Male)).unwrap();

    assert!((result.bmi - 23.16).abs() < 0.01);
    assert_relative_eq!(result.sum_of_6_skinfolds, 74.6, epsilon = 1e-9);
    assert_relative_eq!(result.body_density, 1.037401, epsilon = 1e-6);
    assert_relative_eq!(result.adipose.kg, 20.256858, epsilon = 1e-4);
    assert_relative_eq!(result.bone.kg, 14.356993, epsilon = 1e-4);
    assert_relative_eq!(result.muscle.kg, 17.945957, epsilon = 1e-4);
    assert_relative_eq!(result.structured_weight, 74.6, epsilon = 1e-9);

    assert_eq!(result.fields.len(), 10);
    for field in &result.fields {
        let z = field.z_score.expect("every built-in field has reference data");
        assert!(z.abs() < 0.005, "{} scored {}", field.field, z);
    }

    let weight = result.field(MeasurementField::Weight).unwrap();
    assert_eq!(weight.adjusted, weight.raw);
    let triceps = result.field(MeasurementField::SkinfoldTriceps).unwrap();
    assert_relative_eq!(triceps.adjusted, 9.8 * 0.935, epsilon = 1e-12);
}

#[test]
fn computing_twice_gives_identical_results() {
    let engine = CompositionEngine::default();
    let measurement = reference_subject()
        .with(MeasurementField::PerimeterWaist, 82.0)
        .with(MeasurementField::PerimeterHip, 98.0);

    let first = engine.compute(&measurement, Some(Sex::Female)).unwrap();
    let second = engine.compute(&measurement, Some(Sex::Female)).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn wire_format_uses_camel_case_keys() {
    let result = CompositionEngine::default()
        .compute(&reference_subject(), Some(Sex::Male))
        .unwrap();
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["version"], 1);
    assert_eq!(json["sex"], "male");
    assert!(json["sumOf6Skinfolds"].is_number());
    assert!(json["muscleToBoneRatio"].is_number());
    assert!(json["adipose"]["kg"].is_number());
    assert!(json["waistToHipRatio"].is_null());
    assert_eq!(json["fields"][0]["field"], "weight");
    assert!(json["fields"][0]["etmPct"].is_number());
    assert!(json["fields"][0]["zScore"].is_number());
}

#[test]
fn missing_sex_is_rejected_before_any_calculation() {
    let err = CompositionEngine::default()
        .compute(&reference_subject(), None)
        .unwrap_err();
    assert_eq!(err, CompositionError::Precondition(PreconditionError::MissingSex));
}

#[test]
fn missing_fields_are_all_reported_in_canonical_order() {
    let mut measurement = reference_subject();
    measurement.skinfolds.calf = None;
    measurement.diameters.humeral = None;

    let err = CompositionEngine::default()
        .compute(&measurement, Some(Sex::Male))
        .unwrap_err();
    assert_eq!(
        err.missing_fields(),
        &[MeasurementField::DiameterHumeral, MeasurementField::SkinfoldCalf]
    );
}

prop_compose! {
    fn plausible_subject()(
        weight in 40.0f64..120.0,
        height in 140.0f64..205.0,
        humeral in 5.0f64..8.5,
        femoral in 8.0f64..11.5,
        skinfolds in prop::array::uniform6(3.0f64..45.0),
    ) -> MeasurementSet {
        let mut measurement = MeasurementSet::new(Uuid::nil(), Utc::now())
            .with(MeasurementField::Weight, weight)
            .with(MeasurementField::Height, height)
            .with(MeasurementField::DiameterHumeral, humeral)
            .with(MeasurementField::DiameterFemoral, femoral);
        for (field, value) in MeasurementField::SIX_SKINFOLDS.into_iter().zip(skinfolds) {
            measurement = measurement.with(field, value);
        }
        measurement
    }
}

proptest! {
    #[test]
    fn component_percentages_sum_to_one_hundred(
        measurement in plausible_subject(),
        female in any::<bool>(),
    ) {
        let sex = if female { Sex::Female } else { Sex::Male };
        let result = CompositionEngine::default().compute(&measurement, Some(sex)).unwrap();

        let total: f64 = result.components().iter().map(|(_, c)| c.pct).sum();
        prop_assert!((total - 100.0).abs() < 1e-9, "total was {}", total);

        let mass: f64 = result.components().iter().map(|(_, c)| c.kg).sum();
        prop_assert!((mass - result.structured_weight).abs() < 1e-9);
    }
}
