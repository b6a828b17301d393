use crate::somatotype::Somatotype;
use core_types::{MeasurementCategory, MeasurementField, Sex, Unit};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A fractionated component: its mass and its share of structured weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MassComponent {
    pub kg: f64,
    pub pct: f64,
}

/// Per-reading detail: the adjusted value and the statistics used to judge it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldResult {
    pub field: MeasurementField,
    pub category: MeasurementCategory,
    pub unit: Unit,
    pub raw: f64,
    pub adjusted: f64,
    pub etm_pct: Option<f64>,
    /// Absolute ± bound on `raw` implied by `etm_pct`.
    pub etm_bound: Option<f64>,
    pub z_score: Option<f64>,
}

/// The externally consumed composition record.
///
/// This struct is the wire contract for the report renderer. It is tied to
/// exactly one measurement revision through `version`; a consumer holding a
/// result whose version differs from the measurement's current version holds
/// a stale result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionResult {
    pub measurement_id: Uuid,
    pub patient_id: Uuid,
    pub version: u64,
    pub sex: Sex,

    // I. Basic indices
    pub bmi: f64,
    pub sum_of_6_skinfolds: f64,
    pub body_density: f64,
    pub fat_pct: f64,

    // II. Five-component fractionation
    pub skin: MassComponent,
    pub adipose: MassComponent,
    pub muscle: MassComponent,
    pub bone: MassComponent,
    pub residual: MassComponent,
    pub structured_weight: f64,
    /// Deviation of structured weight from measured weight, in %.
    pub weight_difference: f64,

    // III. Ratios
    pub muscle_to_bone_ratio: f64,
    pub adipose_to_muscle_ratio: f64,
    pub waist_to_hip_ratio: Option<f64>,
    pub cormic_index: Option<f64>,

    // IV. Somatotype
    pub somatotype: Option<Somatotype>,

    // V. Per-reading detail
    pub fields: Vec<FieldResult>,
}

impl CompositionResult {
    /// The five components with their display names, in report order.
    pub fn components(&self) -> [(&'static str, MassComponent); 5] {
        [
            ("skin", self.skin),
            ("adipose", self.adipose),
            ("muscle", self.muscle),
            ("bone", self.bone),
            ("residual", self.residual),
        ]
    }

    pub fn field(&self, field: MeasurementField) -> Option<&FieldResult> {
        self.fields.iter().find(|f| f.field == field)
    }

    /// Whether this result was computed from the given measurement revision.
    pub fn is_current_for(&self, version: u64) -> bool {
        self.version == version
    }
}
