use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Biological sex of the patient, as recorded on the external patient record.
/// It selects the residual-mass fraction in the five-component model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Male => f.write_str("male"),
            Sex::Female => f.write_str("female"),
        }
    }
}

impl FromStr for Sex {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Sex::Male),
            "female" | "f" => Ok(Sex::Female),
            other => Err(CoreError::InvalidInput(
                "sex".to_string(),
                format!("'{}' is not one of male/female", other),
            )),
        }
    }
}

/// The measurement technique family a reading belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementCategory {
    Basic,
    Diameter,
    Perimeter,
    Skinfold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Kg,
    Cm,
    Mm,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Kg => f.write_str("kg"),
            Unit::Cm => f.write_str("cm"),
            Unit::Mm => f.write_str("mm"),
        }
    }
}

/// Every anthropometric reading the system knows about.
///
/// The serialized form (`key()`) is the stable field key used by patches,
/// reference tables and the result record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementField {
    // Basic
    Weight,
    Height,
    SeatedHeight,
    // Diameters
    DiameterBiacromial,
    DiameterThoraxTransverse,
    DiameterThoraxAnteroposterior,
    DiameterBiIliocristal,
    DiameterHumeral,
    DiameterFemoral,
    // Perimeters
    PerimeterHead,
    PerimeterArmRelaxed,
    PerimeterArmFlexed,
    PerimeterForearm,
    PerimeterThorax,
    PerimeterWaist,
    PerimeterHip,
    PerimeterThighSuperior,
    PerimeterThighMedial,
    PerimeterCalf,
    // Skinfolds
    SkinfoldTriceps,
    SkinfoldSubscapular,
    SkinfoldSupraspinal,
    SkinfoldAbdominal,
    SkinfoldThigh,
    SkinfoldCalf,
}

impl MeasurementField {
    /// All fields in canonical order. Result records list fields in this order.
    pub const ALL: [MeasurementField; 25] = [
        MeasurementField::Weight,
        MeasurementField::Height,
        MeasurementField::SeatedHeight,
        MeasurementField::DiameterBiacromial,
        MeasurementField::DiameterThoraxTransverse,
        MeasurementField::DiameterThoraxAnteroposterior,
        MeasurementField::DiameterBiIliocristal,
        MeasurementField::DiameterHumeral,
        MeasurementField::DiameterFemoral,
        MeasurementField::PerimeterHead,
        MeasurementField::PerimeterArmRelaxed,
        MeasurementField::PerimeterArmFlexed,
        MeasurementField::PerimeterForearm,
        MeasurementField::PerimeterThorax,
        MeasurementField::PerimeterWaist,
        MeasurementField::PerimeterHip,
        MeasurementField::PerimeterThighSuperior,
        MeasurementField::PerimeterThighMedial,
        MeasurementField::PerimeterCalf,
        MeasurementField::SkinfoldTriceps,
        MeasurementField::SkinfoldSubscapular,
        MeasurementField::SkinfoldSupraspinal,
        MeasurementField::SkinfoldAbdominal,
        MeasurementField::SkinfoldThigh,
        MeasurementField::SkinfoldCalf,
    ];

    /// The six skinfolds whose sum drives the body-density equation.
    pub const SIX_SKINFOLDS: [MeasurementField; 6] = [
        MeasurementField::SkinfoldTriceps,
        MeasurementField::SkinfoldSubscapular,
        MeasurementField::SkinfoldSupraspinal,
        MeasurementField::SkinfoldAbdominal,
        MeasurementField::SkinfoldThigh,
        MeasurementField::SkinfoldCalf,
    ];

    /// The stable string key of this field.
    pub fn key(&self) -> &'static str {
        match self {
            MeasurementField::Weight => "weight",
            MeasurementField::Height => "height",
            MeasurementField::SeatedHeight => "seated_height",
            MeasurementField::DiameterBiacromial => "diameter_biacromial",
            MeasurementField::DiameterThoraxTransverse => "diameter_thorax_transverse",
            MeasurementField::DiameterThoraxAnteroposterior => "diameter_thorax_anteroposterior",
            MeasurementField::DiameterBiIliocristal => "diameter_bi_iliocristal",
            MeasurementField::DiameterHumeral => "diameter_humeral",
            MeasurementField::DiameterFemoral => "diameter_femoral",
            MeasurementField::PerimeterHead => "perimeter_head",
            MeasurementField::PerimeterArmRelaxed => "perimeter_arm_relaxed",
            MeasurementField::PerimeterArmFlexed => "perimeter_arm_flexed",
            MeasurementField::PerimeterForearm => "perimeter_forearm",
            MeasurementField::PerimeterThorax => "perimeter_thorax",
            MeasurementField::PerimeterWaist => "perimeter_waist",
            MeasurementField::PerimeterHip => "perimeter_hip",
            MeasurementField::PerimeterThighSuperior => "perimeter_thigh_superior",
            MeasurementField::PerimeterThighMedial => "perimeter_thigh_medial",
            MeasurementField::PerimeterCalf => "perimeter_calf",
            MeasurementField::SkinfoldTriceps => "skinfold_triceps",
            MeasurementField::SkinfoldSubscapular => "skinfold_subscapular",
            MeasurementField::SkinfoldSupraspinal => "skinfold_supraspinal",
            MeasurementField::SkinfoldAbdominal => "skinfold_abdominal",
            MeasurementField::SkinfoldThigh => "skinfold_thigh",
            MeasurementField::SkinfoldCalf => "skinfold_calf",
        }
    }

    pub fn category(&self) -> MeasurementCategory {
        use MeasurementField::*;
        match self {
            Weight | Height | SeatedHeight => MeasurementCategory::Basic,
            DiameterBiacromial
            | DiameterThoraxTransverse
            | DiameterThoraxAnteroposterior
            | DiameterBiIliocristal
            | DiameterHumeral
            | DiameterFemoral => MeasurementCategory::Diameter,
            PerimeterHead
            | PerimeterArmRelaxed
            | PerimeterArmFlexed
            | PerimeterForearm
            | PerimeterThorax
            | PerimeterWaist
            | PerimeterHip
            | PerimeterThighSuperior
            | PerimeterThighMedial
            | PerimeterCalf => MeasurementCategory::Perimeter,
            SkinfoldTriceps
            | SkinfoldSubscapular
            | SkinfoldSupraspinal
            | SkinfoldAbdominal
            | SkinfoldThigh
            | SkinfoldCalf => MeasurementCategory::Skinfold,
        }
    }

    pub fn unit(&self) -> Unit {
        match (self, self.category()) {
            (MeasurementField::Weight, _) => Unit::Kg,
            (_, MeasurementCategory::Skinfold) => Unit::Mm,
            _ => Unit::Cm,
        }
    }

    /// Weight and height can never be removed from a measurement set.
    pub fn is_removable(&self) -> bool {
        !matches!(self, MeasurementField::Weight | MeasurementField::Height)
    }
}

impl fmt::Display for MeasurementField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for MeasurementField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MeasurementField::ALL
            .iter()
            .copied()
            .find(|field| field.key() == s)
            .ok_or_else(|| {
                CoreError::InvalidInput("field".to_string(), format!("unknown field key '{}'", s))
            })
    }
}
