use crate::error::{CompositionError, DegenerateComputation, PreconditionError};
use core_types::{MeasurementField, MeasurementSet, Sex};

/// Fraction of body weight assigned to residual mass (organs, viscera).
pub const RESIDUAL_FRACTION_MALE: f64 = 0.241;
pub const RESIDUAL_FRACTION_FEMALE: f64 = 0.209;

// Skin mass = body surface area × skin thickness (mm) × skin density (g/cm³).
const SKIN_THICKNESS: f64 = 2.0;
const SKIN_DENSITY: f64 = 1.05;

// Body density from the sum of six skinfolds.
const DENSITY_INTERCEPT: f64 = 1.0982;
const DENSITY_SLOPE: f64 = 0.000815;

// Fields that must be strictly positive, not merely non-negative.
const STRICTLY_POSITIVE: [MeasurementField; 4] = [
    MeasurementField::Weight,
    MeasurementField::Height,
    MeasurementField::DiameterHumeral,
    MeasurementField::DiameterFemoral,
];

/// The output of the five-component fractionation.
///
/// Masses are in kg, percentages are of structured weight.
#[derive(Debug, Clone, PartialEq)]
pub struct Fractionation {
    pub sex: Sex,
    pub bmi: f64,
    pub sum_of_6_skinfolds: f64,
    pub body_surface_area: f64,
    pub body_density: f64,
    pub fat_pct: f64,
    pub skin_kg: f64,
    pub adipose_kg: f64,
    pub bone_kg: f64,
    pub residual_kg: f64,
    pub muscle_kg: f64,
    pub structured_weight: f64,
    /// (structured − measured) / measured × 100.
    pub weight_difference_pct: f64,
    pub skin_pct: f64,
    pub adipose_pct: f64,
    pub muscle_pct: f64,
    pub bone_pct: f64,
    pub residual_pct: f64,
    pub muscle_to_bone_ratio: f64,
    pub adipose_to_muscle_ratio: f64,
}

/// The readings the fractionation needs, already checked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositionInputs {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub humeral_cm: f64,
    pub femoral_cm: f64,
    /// Triceps, subscapular, supraspinal, abdominal, thigh, calf (mm).
    pub skinfolds_mm: [f64; 6],
    pub sex: Sex,
}

impl CompositionInputs {
    /// Validates the measurement set and extracts the mandatory readings.
    ///
    /// Checks run in a fixed order: every missing mandatory field (reported
    /// together), then the value of every present reading, then sex.
    pub fn from_measurement(
        measurement: &MeasurementSet,
        sex: Option<Sex>,
    ) -> Result<Self, PreconditionError> {
        let missing: Vec<MeasurementField> = MeasurementField::ALL
            .into_iter()
            .filter(|field| is_mandatory(*field) && measurement.get(*field).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(PreconditionError::MissingFields(missing));
        }

        for (field, value) in measurement.present_readings() {
            if !value.is_finite() {
                return Err(PreconditionError::InvalidValue {
                    field,
                    value,
                    reason: "not a finite number",
                });
            }
            if value < 0.0 {
                return Err(PreconditionError::InvalidValue {
                    field,
                    value,
                    reason: "negative reading",
                });
            }
            if value == 0.0 && STRICTLY_POSITIVE.contains(&field) {
                return Err(PreconditionError::InvalidValue {
                    field,
                    value,
                    reason: "must be greater than zero",
                });
            }
        }

        let sex = sex.ok_or(PreconditionError::MissingSex)?;

        let mut skinfolds_mm = [0.0; 6];
        for (slot, field) in skinfolds_mm.iter_mut().zip(MeasurementField::SIX_SKINFOLDS) {
            *slot = required(measurement, field)?;
        }

        Ok(Self {
            weight_kg: required(measurement, MeasurementField::Weight)?,
            height_cm: required(measurement, MeasurementField::Height)?,
            humeral_cm: required(measurement, MeasurementField::DiameterHumeral)?,
            femoral_cm: required(measurement, MeasurementField::DiameterFemoral)?,
            skinfolds_mm,
            sex,
        })
    }
}

/// Whether a composition calculation cannot be attempted without this field.
pub fn is_mandatory(field: MeasurementField) -> bool {
    matches!(
        field,
        MeasurementField::Weight
            | MeasurementField::Height
            | MeasurementField::DiameterHumeral
            | MeasurementField::DiameterFemoral
    ) || MeasurementField::SIX_SKINFOLDS.contains(&field)
}

fn required(measurement: &MeasurementSet, field: MeasurementField) -> Result<f64, PreconditionError> {
    measurement
        .get(field)
        .ok_or_else(|| PreconditionError::MissingFields(vec![field]))
}

/// The five-component (Kerr) fractionation pipeline.
///
/// Stateless: the same inputs always produce bit-identical output.
#[derive(Debug, Clone, Copy, Default)]
pub struct BodyCompositionCalculator {}

impl BodyCompositionCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates `measurement` and runs the full pipeline.
    pub fn calculate(
        &self,
        measurement: &MeasurementSet,
        sex: Option<Sex>,
    ) -> Result<Fractionation, CompositionError> {
        let inputs = CompositionInputs::from_measurement(measurement, sex)?;
        self.calculate_from_inputs(&inputs)
    }

    /// Runs the pipeline on already-validated inputs.
    pub fn calculate_from_inputs(
        &self,
        inputs: &CompositionInputs,
    ) -> Result<Fractionation, CompositionError> {
        let weight = inputs.weight_kg;
        let height_m = inputs.height_cm / 100.0;

        // --- 1. BMI ---
        let bmi = weight / (height_m * height_m);

        // --- 2. Sum of six skinfolds ---
        let sum_of_6: f64 = inputs.skinfolds_mm.iter().sum();

        // --- 3. Skin ---
        let body_surface_area = body_surface_area(weight, inputs.height_cm);
        let skin_kg = body_surface_area * SKIN_THICKNESS * SKIN_DENSITY;

        // --- 4. Adipose ---
        let body_density = DENSITY_INTERCEPT - DENSITY_SLOPE * sum_of_6;
        if body_density <= 0.0 {
            return Err(DegenerateComputation::NonPositiveDensity {
                density: body_density,
                sum_of_6,
            }
            .into());
        }
        let fat_pct = 495.0 / body_density - 450.0;
        let adipose_kg = weight * fat_pct / 100.0;

        // --- 5. Bone ---
        let humeral_m = inputs.humeral_cm / 100.0;
        let femoral_m = inputs.femoral_cm / 100.0;
        let bone_kg = 3.02 * (height_m * height_m * humeral_m * femoral_m * 400.0).powf(0.712);

        // --- 6. Residual ---
        let residual_kg = weight * residual_fraction(inputs.sex);

        // --- 7. Muscle (remainder, deliberately unclamped) ---
        let muscle_kg = weight - (skin_kg + adipose_kg + bone_kg + residual_kg);
        if muscle_kg < 0.0 {
            tracing::warn!(
                muscle_kg,
                weight,
                sum_of_6,
                "Negative muscle mass: the measurement data is probably inconsistent."
            );
        }

        // --- 8. Structured weight ---
        let structured_weight = skin_kg + adipose_kg + muscle_kg + bone_kg + residual_kg;
        ensure_finite("structured weight", structured_weight)?;
        if structured_weight <= 0.0 {
            return Err(DegenerateComputation::NonPositiveStructuredWeight(structured_weight).into());
        }
        let weight_difference_pct = (structured_weight - weight) / weight * 100.0;

        // --- 9. Percentages of structured weight ---
        let pct = |mass: f64| mass / structured_weight * 100.0;

        // --- 10. Indices ---
        let muscle_to_bone_ratio = if bone_kg == 0.0 { 0.0 } else { muscle_kg / bone_kg };
        let adipose_to_muscle_ratio = if muscle_kg == 0.0 { 0.0 } else { adipose_kg / muscle_kg };

        let fractionation = Fractionation {
            sex: inputs.sex,
            bmi,
            sum_of_6_skinfolds: sum_of_6,
            body_surface_area,
            body_density,
            fat_pct,
            skin_kg,
            adipose_kg,
            bone_kg,
            residual_kg,
            muscle_kg,
            structured_weight,
            weight_difference_pct,
            skin_pct: pct(skin_kg),
            adipose_pct: pct(adipose_kg),
            muscle_pct: pct(muscle_kg),
            bone_pct: pct(bone_kg),
            residual_pct: pct(residual_kg),
            muscle_to_bone_ratio,
            adipose_to_muscle_ratio,
        };
        fractionation.ensure_finite()?;

        tracing::debug!(
            bmi,
            sum_of_6,
            body_density,
            skin_kg,
            adipose_kg,
            muscle_kg,
            bone_kg,
            residual_kg,
            "Fractionation complete."
        );
        Ok(fractionation)
    }
}

impl Fractionation {
    fn ensure_finite(&self) -> Result<(), DegenerateComputation> {
        ensure_finite("bmi", self.bmi)?;
        ensure_finite("body surface area", self.body_surface_area)?;
        ensure_finite("fat percentage", self.fat_pct)?;
        ensure_finite("skin mass", self.skin_kg)?;
        ensure_finite("adipose mass", self.adipose_kg)?;
        ensure_finite("bone mass", self.bone_kg)?;
        ensure_finite("residual mass", self.residual_kg)?;
        ensure_finite("muscle mass", self.muscle_kg)?;
        ensure_finite("weight difference", self.weight_difference_pct)?;
        ensure_finite("muscle to bone ratio", self.muscle_to_bone_ratio)?;
        ensure_finite("adipose to muscle ratio", self.adipose_to_muscle_ratio)?;
        Ok(())
    }

    /// The five component percentages; they sum to 100.
    pub fn percentages(&self) -> [f64; 5] {
        [
            self.skin_pct,
            self.adipose_pct,
            self.muscle_pct,
            self.bone_pct,
            self.residual_pct,
        ]
    }
}

/// Du Bois body surface area in m².
pub fn body_surface_area(weight_kg: f64, height_cm: f64) -> f64 {
    weight_kg.powf(0.425) * height_cm.powf(0.725) * 0.007184
}

pub fn residual_fraction(sex: Sex) -> f64 {
    match sex {
        Sex::Male => RESIDUAL_FRACTION_MALE,
        Sex::Female => RESIDUAL_FRACTION_FEMALE,
    }
}

fn ensure_finite(quantity: &'static str, value: f64) -> Result<(), DegenerateComputation> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(DegenerateComputation::NonFinite { quantity, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

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
    fn fractionates_reference_subject() {
        let f = BodyCompositionCalculator::new()
            .calculate(&reference_subject(), Some(Sex::Male))
            .unwrap();

        assert_relative_eq!(f.bmi, 23.1531, epsilon = 1e-4);
        assert_relative_eq!(f.sum_of_6_skinfolds, 74.6, epsilon = 1e-9);
        assert_relative_eq!(f.body_surface_area, 1.93409, epsilon = 1e-5);
        assert_relative_eq!(f.skin_kg, 4.06159, epsilon = 1e-5);
        assert_relative_eq!(f.body_density, 1.037401, epsilon = 1e-9);
        assert_relative_eq!(f.fat_pct, 27.15396, epsilon = 1e-5);
        assert_relative_eq!(f.adipose_kg, 20.25686, epsilon = 1e-5);
        assert_relative_eq!(f.bone_kg, 14.35699, epsilon = 1e-5);
        assert_relative_eq!(f.residual_kg, 17.9786, epsilon = 1e-9);
        assert_relative_eq!(f.muscle_kg, 17.94596, epsilon = 1e-5);
        assert_relative_eq!(f.muscle_to_bone_ratio, 1.24998, epsilon = 1e-5);
        assert_relative_eq!(f.adipose_to_muscle_ratio, 1.12877, epsilon = 1e-5);
    }

    #[test]
    fn structured_weight_matches_measured_weight() {
        let f = BodyCompositionCalculator::new()
            .calculate(&reference_subject(), Some(Sex::Male))
            .unwrap();
        assert_relative_eq!(f.structured_weight, 74.6, epsilon = 1e-9);
        assert!(f.weight_difference_pct.abs() < 1e-9);
    }

    #[test]
    fn female_residual_fraction_is_smaller() {
        let calc = BodyCompositionCalculator::new();
        let male = calc.calculate(&reference_subject(), Some(Sex::Male)).unwrap();
        let female = calc.calculate(&reference_subject(), Some(Sex::Female)).unwrap();

        assert_relative_eq!(female.residual_kg, 74.6 * 0.209, epsilon = 1e-9);
        assert_relative_eq!(female.muscle_kg, 20.33316, epsilon = 1e-5);
        assert!(female.muscle_kg > male.muscle_kg);
    }

    #[test]
    fn missing_sex_is_a_precondition_failure() {
        let err = BodyCompositionCalculator::new()
            .calculate(&reference_subject(), None)
            .unwrap_err();
        assert_eq!(err, CompositionError::Precondition(PreconditionError::MissingSex));
    }

    #[test]
    fn missing_fields_are_reported_together_in_field_order() {
        let mut measurement = reference_subject();
        measurement.skinfolds.calf = None;
        measurement.diameters.humeral = None;

        let err = BodyCompositionCalculator::new()
            .calculate(&measurement, Some(Sex::Male))
            .unwrap_err();
        assert_eq!(
            err.missing_fields(),
            &[MeasurementField::DiameterHumeral, MeasurementField::SkinfoldCalf]
        );
    }

    #[test]
    fn missing_fields_win_over_missing_sex() {
        let mut measurement = reference_subject();
        measurement.basic.weight = None;
        let err = BodyCompositionCalculator::new()
            .calculate(&measurement, None)
            .unwrap_err();
        assert_eq!(err.missing_fields(), &[MeasurementField::Weight]);
    }

    #[test]
    fn zero_height_is_rejected_before_any_division() {
        let measurement = reference_subject().with(MeasurementField::Height, 0.0);
        let err = BodyCompositionCalculator::new()
            .calculate(&measurement, Some(Sex::Female))
            .unwrap_err();
        assert!(matches!(
            err,
            CompositionError::Precondition(PreconditionError::InvalidValue {
                field: MeasurementField::Height,
                ..
            })
        ));
    }

    #[test]
    fn negative_optional_reading_is_rejected() {
        let measurement = reference_subject().with(MeasurementField::PerimeterWaist, -3.0);
        let err = BodyCompositionCalculator::new()
            .calculate(&measurement, Some(Sex::Male))
            .unwrap_err();
        assert!(matches!(
            err,
            CompositionError::Precondition(PreconditionError::InvalidValue {
                field: MeasurementField::PerimeterWaist,
                ..
            })
        ));
    }

    #[test]
    fn density_at_or_below_zero_is_degenerate() {
        let mut measurement = reference_subject();
        for field in MeasurementField::SIX_SKINFOLDS {
            measurement = measurement.with(field, 225.0);
        }
        let err = BodyCompositionCalculator::new()
            .calculate(&measurement, Some(Sex::Male))
            .unwrap_err();
        match err {
            CompositionError::Degenerate(DegenerateComputation::NonPositiveDensity {
                density,
                sum_of_6,
            }) => {
                assert!(density <= 0.0);
                assert_relative_eq!(sum_of_6, 1350.0);
            }
            other => panic!("expected degenerate density, got {:?}", other),
        }
    }

    #[test]
    fn implausible_input_surfaces_negative_muscle() {
        // Thick skinfolds on a light subject push adipose past the remaining mass.
        let mut measurement = reference_subject().with(MeasurementField::Weight, 40.0);
        for field in MeasurementField::SIX_SKINFOLDS {
            measurement = measurement.with(field, 180.0);
        }
        let f = BodyCompositionCalculator::new()
            .calculate(&measurement, Some(Sex::Male))
            .unwrap();
        assert!(f.muscle_kg < 0.0);
        assert!(f.adipose_to_muscle_ratio < 0.0);
        let total: f64 = f.percentages().iter().sum();
        assert_relative_eq!(total, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn mandatory_fields_are_the_documented_ten() {
        let mandatory: Vec<_> = MeasurementField::ALL
            .into_iter()
            .filter(|f| is_mandatory(*f))
            .collect();
        assert_eq!(mandatory.len(), 10);
    }
}
