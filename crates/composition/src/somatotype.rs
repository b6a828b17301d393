//! Heath–Carter anthropometric somatotype and simple girth/length indices.
//!
//! None of these are mandatory: when a reading they need is absent the rating
//! is simply not produced.

use core_types::{MeasurementField, MeasurementSet};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Somatotype {
    pub endomorphy: f64,
    pub mesomorphy: f64,
    pub ectomorphy: f64,
}

/// Rates the somatotype, or `None` if any required reading is missing.
pub fn heath_carter(measurement: &MeasurementSet) -> Option<Somatotype> {
    let get = |field| measurement.get(field);

    let weight = get(MeasurementField::Weight)?;
    let height = get(MeasurementField::Height)?;
    if weight <= 0.0 || height <= 0.0 {
        return None;
    }
    let triceps = get(MeasurementField::SkinfoldTriceps)?;
    let subscapular = get(MeasurementField::SkinfoldSubscapular)?;
    let supraspinal = get(MeasurementField::SkinfoldSupraspinal)?;
    let calf_skinfold = get(MeasurementField::SkinfoldCalf)?;
    let humeral = get(MeasurementField::DiameterHumeral)?;
    let femoral = get(MeasurementField::DiameterFemoral)?;
    let arm_flexed = get(MeasurementField::PerimeterArmFlexed)?;
    let calf_girth = get(MeasurementField::PerimeterCalf)?;

    // Height-corrected sum of three skinfolds.
    let x = (triceps + subscapular + supraspinal) * (170.18 / height);
    let endomorphy = -0.7182 + 0.1451 * x - 0.00068 * x.powi(2) + 0.0000014 * x.powi(3);

    // Girths corrected for the overlying skinfold (mm -> cm).
    let corrected_arm = arm_flexed - triceps / 10.0;
    let corrected_calf = calf_girth - calf_skinfold / 10.0;
    let mesomorphy = 0.858 * humeral + 0.601 * femoral + 0.188 * corrected_arm
        + 0.161 * corrected_calf
        - 0.131 * height
        + 4.5;

    let ectomorphy = ectomorphy(height, weight);

    let rating = Somatotype {
        endomorphy,
        mesomorphy,
        ectomorphy,
    };
    [endomorphy, mesomorphy, ectomorphy]
        .iter()
        .all(|v| v.is_finite())
        .then_some(rating)
}

/// Ectomorphy from the height-weight ratio.
fn ectomorphy(height_cm: f64, weight_kg: f64) -> f64 {
    let hwr = height_cm / weight_kg.cbrt();
    if hwr >= 40.75 {
        0.732 * hwr - 28.58
    } else if hwr > 38.25 {
        0.463 * hwr - 17.63
    } else {
        0.1
    }
}

pub fn waist_to_hip_ratio(measurement: &MeasurementSet) -> Option<f64> {
    let waist = measurement.get(MeasurementField::PerimeterWaist)?;
    let hip = measurement.get(MeasurementField::PerimeterHip)?;
    (hip > 0.0).then(|| waist / hip)
}

/// Sitting height as a percentage of stature.
pub fn cormic_index(measurement: &MeasurementSet) -> Option<f64> {
    let seated = measurement.get(MeasurementField::SeatedHeight)?;
    let height = measurement.get(MeasurementField::Height)?;
    (height > 0.0).then(|| seated / height * 100.0)
}
