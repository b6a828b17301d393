use crate::enums::MeasurementField;
use crate::error::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// The version assigned to a measurement set when it is first registered.
pub const INITIAL_VERSION: u64 = 1;

/// Weight and height readings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicMeasurements {
    /// Body mass in kg.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    /// Stature in cm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Sitting height in cm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seated_height: Option<f64>,
}

/// Bone breadths, all in cm.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biacromial: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thorax_transverse: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thorax_anteroposterior: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bi_iliocristal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humeral: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub femoral: Option<f64>,
}

/// Girths, all in cm.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Perimeters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arm_relaxed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arm_flexed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forearm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thorax: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waist: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hip: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thigh_superior: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thigh_medial: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calf: Option<f64>,
}

/// Skinfold thicknesses, all in mm.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skinfolds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triceps: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscapular: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supraspinal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abdominal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thigh: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calf: Option<f64>,
}

/// One timestamped collection of anthropometric readings for one patient.
///
/// `version` is the optimistic-lock token: every committed update increments it
/// by exactly one, and every derived result is tagged with the version it was
/// computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSet {
    pub measurement_id: Uuid,
    pub patient_id: Uuid,
    pub taken_at: DateTime<Utc>,
    #[serde(default = "initial_version")]
    pub version: u64,
    #[serde(default)]
    pub basic: BasicMeasurements,
    #[serde(default)]
    pub diameters: Diameters,
    #[serde(default)]
    pub perimeters: Perimeters,
    #[serde(default)]
    pub skinfolds: Skinfolds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

fn initial_version() -> u64 {
    INITIAL_VERSION
}

impl MeasurementSet {
    /// Creates an empty measurement set for a patient with a fresh id.
    pub fn new(patient_id: Uuid, taken_at: DateTime<Utc>) -> Self {
        Self {
            measurement_id: Uuid::new_v4(),
            patient_id,
            taken_at,
            version: INITIAL_VERSION,
            basic: BasicMeasurements::default(),
            diameters: Diameters::default(),
            perimeters: Perimeters::default(),
            skinfolds: Skinfolds::default(),
            notes: None,
        }
    }

    /// Returns the reading for `field`, if it was taken.
    pub fn get(&self, field: MeasurementField) -> Option<f64> {
        *self.slot(field)
    }

    /// Builder-style setter, handy for constructing fixtures.
    pub fn with(mut self, field: MeasurementField, value: f64) -> Self {
        *self.slot_mut(field) = Some(value);
        self
    }

    /// Iterates over the readings that are present, in canonical field order.
    pub fn present_readings(&self) -> impl Iterator<Item = (MeasurementField, f64)> + '_ {
        MeasurementField::ALL
            .into_iter()
            .filter_map(move |field| self.get(field).map(|value| (field, value)))
    }

    /// Applies a validated patch in place. The version is not touched: the
    /// storage layer owns version increments.
    ///
    /// Validation happens before any mutation, so a rejected patch leaves the
    /// set unchanged.
    pub fn apply_patch(&mut self, patch: &MeasurementPatch) -> Result<(), CoreError> {
        patch.validate()?;

        for (field, value) in &patch.values {
            *self.slot_mut(*field) = Some(*value);
        }
        for field in &patch.clear {
            *self.slot_mut(*field) = None;
        }
        if let Some(notes) = &patch.notes {
            self.notes = Some(notes.clone());
        }
        if let Some(taken_at) = patch.taken_at {
            self.taken_at = taken_at;
        }
        Ok(())
    }

    /// Checks a whole set under the same rules a patch is held to: every
    /// reading finite and non-negative, weight and height present and positive.
    pub fn validate_readings(&self) -> Result<(), CoreError> {
        let as_patch = MeasurementPatch {
            values: self.present_readings().collect(),
            ..MeasurementPatch::default()
        };
        as_patch.validate()?;

        for field in MeasurementField::ALL {
            if !field.is_removable() && self.get(field).is_none() {
                return Err(CoreError::InvalidInput(
                    field.to_string(),
                    "mandatory field is missing".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn slot(&self, field: MeasurementField) -> &Option<f64> {
        use MeasurementField::*;
        match field {
            Weight => &self.basic.weight,
            Height => &self.basic.height,
            SeatedHeight => &self.basic.seated_height,
            DiameterBiacromial => &self.diameters.biacromial,
            DiameterThoraxTransverse => &self.diameters.thorax_transverse,
            DiameterThoraxAnteroposterior => &self.diameters.thorax_anteroposterior,
            DiameterBiIliocristal => &self.diameters.bi_iliocristal,
            DiameterHumeral => &self.diameters.humeral,
            DiameterFemoral => &self.diameters.femoral,
            PerimeterHead => &self.perimeters.head,
            PerimeterArmRelaxed => &self.perimeters.arm_relaxed,
            PerimeterArmFlexed => &self.perimeters.arm_flexed,
            PerimeterForearm => &self.perimeters.forearm,
            PerimeterThorax => &self.perimeters.thorax,
            PerimeterWaist => &self.perimeters.waist,
            PerimeterHip => &self.perimeters.hip,
            PerimeterThighSuperior => &self.perimeters.thigh_superior,
            PerimeterThighMedial => &self.perimeters.thigh_medial,
            PerimeterCalf => &self.perimeters.calf,
            SkinfoldTriceps => &self.skinfolds.triceps,
            SkinfoldSubscapular => &self.skinfolds.subscapular,
            SkinfoldSupraspinal => &self.skinfolds.supraspinal,
            SkinfoldAbdominal => &self.skinfolds.abdominal,
            SkinfoldThigh => &self.skinfolds.thigh,
            SkinfoldCalf => &self.skinfolds.calf,
        }
    }

    fn slot_mut(&mut self, field: MeasurementField) -> &mut Option<f64> {
        use MeasurementField::*;
        match field {
            Weight => &mut self.basic.weight,
            Height => &mut self.basic.height,
            SeatedHeight => &mut self.basic.seated_height,
            DiameterBiacromial => &mut self.diameters.biacromial,
            DiameterThoraxTransverse => &mut self.diameters.thorax_transverse,
            DiameterThoraxAnteroposterior => &mut self.diameters.thorax_anteroposterior,
            DiameterBiIliocristal => &mut self.diameters.bi_iliocristal,
            DiameterHumeral => &mut self.diameters.humeral,
            DiameterFemoral => &mut self.diameters.femoral,
            PerimeterHead => &mut self.perimeters.head,
            PerimeterArmRelaxed => &mut self.perimeters.arm_relaxed,
            PerimeterArmFlexed => &mut self.perimeters.arm_flexed,
            PerimeterForearm => &mut self.perimeters.forearm,
            PerimeterThorax => &mut self.perimeters.thorax,
            PerimeterWaist => &mut self.perimeters.waist,
            PerimeterHip => &mut self.perimeters.hip,
            PerimeterThighSuperior => &mut self.perimeters.thigh_superior,
            PerimeterThighMedial => &mut self.perimeters.thigh_medial,
            PerimeterCalf => &mut self.perimeters.calf,
            SkinfoldTriceps => &mut self.skinfolds.triceps,
            SkinfoldSubscapular => &mut self.skinfolds.subscapular,
            SkinfoldSupraspinal => &mut self.skinfolds.supraspinal,
            SkinfoldAbdominal => &mut self.skinfolds.abdominal,
            SkinfoldThigh => &mut self.skinfolds.thigh,
            SkinfoldCalf => &mut self.skinfolds.calf,
        }
    }
}

/// A full or partial update to a measurement set.
///
/// `values` sets readings, `clear` removes optional readings. Fields not named
/// in either are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementPatch {
    #[serde(default)]
    pub values: BTreeMap<MeasurementField, f64>,
    #[serde(default)]
    pub clear: BTreeSet<MeasurementField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taken_at: Option<DateTime<Utc>>,
}

impl MeasurementPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: MeasurementField, value: f64) -> Self {
        self.values.insert(field, value);
        self
    }

    pub fn clear(mut self, field: MeasurementField) -> Self {
        self.clear.insert(field);
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
            && self.clear.is_empty()
            && self.notes.is_none()
            && self.taken_at.is_none()
    }

    /// Checks every value and removal without touching any measurement.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (field, value) in &self.values {
            if !value.is_finite() {
                return Err(CoreError::InvalidInput(
                    field.to_string(),
                    format!("value {} is not a finite number", value),
                ));
            }
            if *value < 0.0 {
                return Err(CoreError::InvalidInput(
                    field.to_string(),
                    format!("value {} must not be negative", value),
                ));
            }
            if !field.is_removable() && *value <= 0.0 {
                return Err(CoreError::InvalidInput(
                    field.to_string(),
                    format!("value {} must be greater than zero", value),
                ));
            }
            if self.clear.contains(field) {
                return Err(CoreError::InvalidInput(
                    field.to_string(),
                    "field is both set and cleared".to_string(),
                ));
            }
        }
        for field in &self.clear {
            if !field.is_removable() {
                return Err(CoreError::InvalidInput(
                    field.to_string(),
                    "mandatory field cannot be cleared".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> MeasurementSet {
        let taken_at = Utc.with_ymd_and_hms(2024, 3, 14, 9, 30, 0).unwrap();
        MeasurementSet::new(Uuid::new_v4(), taken_at)
            .with(MeasurementField::Weight, 74.6)
            .with(MeasurementField::Height, 179.5)
            .with(MeasurementField::SkinfoldCalf, 11.5)
    }

    #[test]
    fn new_set_starts_at_initial_version() {
        assert_eq!(sample().version, INITIAL_VERSION);
    }

    #[test]
    fn present_readings_are_in_canonical_order() {
        let fields: Vec<_> = sample().present_readings().map(|(f, _)| f).collect();
        assert_eq!(
            fields,
            vec![
                MeasurementField::Weight,
                MeasurementField::Height,
                MeasurementField::SkinfoldCalf
            ]
        );
    }

    #[test]
    fn patch_sets_and_clears_fields() {
        let mut set = sample();
        let patch = MeasurementPatch::new()
            .set(MeasurementField::PerimeterWaist, 81.0)
            .set(MeasurementField::Weight, 75.0)
            .clear(MeasurementField::SkinfoldCalf)
            .notes("second visit");
        set.apply_patch(&patch).unwrap();

        assert_eq!(set.get(MeasurementField::PerimeterWaist), Some(81.0));
        assert_eq!(set.get(MeasurementField::Weight), Some(75.0));
        assert_eq!(set.get(MeasurementField::SkinfoldCalf), None);
        assert_eq!(set.notes.as_deref(), Some("second visit"));
        assert_eq!(set.version, INITIAL_VERSION);
    }

    #[test]
    fn rejected_patch_leaves_set_untouched() {
        let mut set = sample();
        let before = set.clone();
        let patch = MeasurementPatch::new()
            .set(MeasurementField::PerimeterWaist, 81.0)
            .set(MeasurementField::SkinfoldTriceps, -2.0);

        let err = set.apply_patch(&patch).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(ref f, _) if f == "skinfold_triceps"));
        assert_eq!(set, before);
    }

    #[test]
    fn mandatory_fields_cannot_be_cleared_or_zeroed() {
        let clear_weight = MeasurementPatch::new().clear(MeasurementField::Weight);
        assert!(clear_weight.validate().is_err());

        let zero_height = MeasurementPatch::new().set(MeasurementField::Height, 0.0);
        assert!(zero_height.validate().is_err());

        let nan = MeasurementPatch::new().set(MeasurementField::PerimeterHip, f64::NAN);
        assert!(nan.validate().is_err());
    }

    #[test]
    fn whole_set_validation() {
        assert!(sample().validate_readings().is_ok());

        let no_height = MeasurementSet::new(Uuid::new_v4(), Utc::now())
            .with(MeasurementField::Weight, 70.0);
        let err = no_height.validate_readings().unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(ref f, _) if f == "height"));

        let negative = sample().with(MeasurementField::PerimeterHip, -1.0);
        assert!(negative.validate_readings().is_err());
    }

    #[test]
    fn patch_deserializes_from_field_keys() {
        let patch: MeasurementPatch = serde_json::from_str(
            r#"{"values": {"skinfold_triceps": 10.2, "weight": 74.9}, "clear": ["perimeter_head"]}"#,
        )
        .unwrap();
        assert_eq!(patch.values.get(&MeasurementField::SkinfoldTriceps), Some(&10.2));
        assert!(patch.clear.contains(&MeasurementField::PerimeterHead));
        assert!(!patch.is_empty());
    }

    #[test]
    fn measurement_set_json_defaults_version() {
        let json = r#"{
            "measurement_id": "7d44b88c-4199-4bad-97dc-d78268e01398",
            "patient_id": "84d7c3f5-1111-4bad-97dc-d78268e01398",
            "taken_at": "2024-03-14T09:30:00Z",
            "basic": {"weight": 70.0, "height": 172.0}
        }"#;
        let set: MeasurementSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.version, INITIAL_VERSION);
        assert_eq!(set.get(MeasurementField::Height), Some(172.0));
        assert_eq!(set.get(MeasurementField::SkinfoldCalf), None);
    }
}
