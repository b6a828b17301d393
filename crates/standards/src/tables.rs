//! Technical error of measurement and population reference statistics.
//!
//! The built-in tables cover every field key. Deployments override single
//! entries through `[reference.etm]` and `[reference.population.<key>]`.

use crate::error::StandardsError;
use configuration::ReferenceSettings;
use core_types::MeasurementField;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Mean and standard deviation of a reading in the reference population.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopulationStat {
    pub mean: f64,
    pub sd: f64,
}

impl PopulationStat {
    /// Returned for unknown keys. Callers must read it as "no data".
    pub const NO_DATA: PopulationStat = PopulationStat { mean: 0.0, sd: 1.0 };
}

/// One row of the embedded table.
struct ReferenceRow {
    field: MeasurementField,
    mean: f64,
    sd: f64,
    etm_pct: f64,
}

// ============================================================================
// EMBEDDED REFERENCE DATA
// ============================================================================

static BUILTIN_ROWS: &[ReferenceRow] = &[
    ReferenceRow { field: MeasurementField::Weight, mean: 74.6, sd: 10.5, etm_pct: 0.5 },
    ReferenceRow { field: MeasurementField::Height, mean: 179.5, sd: 6.8, etm_pct: 0.2 },
    ReferenceRow { field: MeasurementField::SeatedHeight, mean: 92.6, sd: 3.5, etm_pct: 0.5 },
    ReferenceRow { field: MeasurementField::DiameterBiacromial, mean: 40.6, sd: 2.1, etm_pct: 1.0 },
    ReferenceRow { field: MeasurementField::DiameterThoraxTransverse, mean: 29.4, sd: 2.0, etm_pct: 1.0 },
    ReferenceRow { field: MeasurementField::DiameterThoraxAnteroposterior, mean: 20.3, sd: 1.8, etm_pct: 1.0 },
    ReferenceRow { field: MeasurementField::DiameterBiIliocristal, mean: 28.6, sd: 1.9, etm_pct: 1.0 },
    ReferenceRow { field: MeasurementField::DiameterHumeral, mean: 7.0, sd: 0.4, etm_pct: 1.0 },
    ReferenceRow { field: MeasurementField::DiameterFemoral, mean: 9.9, sd: 0.5, etm_pct: 1.0 },
    ReferenceRow { field: MeasurementField::PerimeterHead, mean: 57.0, sd: 1.6, etm_pct: 1.0 },
    ReferenceRow { field: MeasurementField::PerimeterArmRelaxed, mean: 30.5, sd: 2.6, etm_pct: 1.0 },
    ReferenceRow { field: MeasurementField::PerimeterArmFlexed, mean: 33.0, sd: 2.7, etm_pct: 1.0 },
    ReferenceRow { field: MeasurementField::PerimeterForearm, mean: 27.5, sd: 1.6, etm_pct: 1.0 },
    ReferenceRow { field: MeasurementField::PerimeterThorax, mean: 97.0, sd: 5.8, etm_pct: 1.0 },
    ReferenceRow { field: MeasurementField::PerimeterWaist, mean: 81.5, sd: 6.0, etm_pct: 1.0 },
    ReferenceRow { field: MeasurementField::PerimeterHip, mean: 97.0, sd: 5.2, etm_pct: 1.0 },
    ReferenceRow { field: MeasurementField::PerimeterThighSuperior, mean: 57.5, sd: 4.0, etm_pct: 1.0 },
    ReferenceRow { field: MeasurementField::PerimeterThighMedial, mean: 53.0, sd: 3.7, etm_pct: 1.0 },
    ReferenceRow { field: MeasurementField::PerimeterCalf, mean: 37.5, sd: 2.4, etm_pct: 1.0 },
    ReferenceRow { field: MeasurementField::SkinfoldTriceps, mean: 9.8, sd: 3.9, etm_pct: 5.0 },
    ReferenceRow { field: MeasurementField::SkinfoldSubscapular, mean: 11.2, sd: 3.8, etm_pct: 5.0 },
    ReferenceRow { field: MeasurementField::SkinfoldSupraspinal, mean: 9.8, sd: 4.5, etm_pct: 5.0 },
    ReferenceRow { field: MeasurementField::SkinfoldAbdominal, mean: 17.5, sd: 7.6, etm_pct: 5.0 },
    ReferenceRow { field: MeasurementField::SkinfoldThigh, mean: 14.8, sd: 5.6, etm_pct: 5.0 },
    ReferenceRow { field: MeasurementField::SkinfoldCalf, mean: 11.5, sd: 4.6, etm_pct: 5.0 },
];

/// Immutable per-field %ETM and population statistics, keyed by field key.
///
/// The lookups are total: `etm_for` and `reference_for` never fail, returning
/// `0` and `PopulationStat::NO_DATA` for unknown keys. Use the `*_lookup`
/// variants when the difference between "no data" and a real statistic matters.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTables {
    etm: HashMap<String, f64>,
    population: HashMap<String, PopulationStat>,
}

impl ReferenceTables {
    /// The embedded tables.
    pub fn builtin() -> Self {
        let mut etm = HashMap::with_capacity(BUILTIN_ROWS.len());
        let mut population = HashMap::with_capacity(BUILTIN_ROWS.len());
        for row in BUILTIN_ROWS {
            etm.insert(row.field.key().to_string(), row.etm_pct);
            population.insert(
                row.field.key().to_string(),
                PopulationStat {
                    mean: row.mean,
                    sd: row.sd,
                },
            );
        }
        Self { etm, population }
    }

    /// An empty table set, for building synthetic references in tests.
    pub fn builder() -> ReferenceTablesBuilder {
        ReferenceTablesBuilder {
            tables: Self {
                etm: HashMap::new(),
                population: HashMap::new(),
            },
        }
    }

    /// The built-in tables with the configured overrides applied.
    pub fn from_settings(settings: &ReferenceSettings) -> Result<Self, StandardsError> {
        let mut builder = ReferenceTablesBuilder {
            tables: Self::builtin(),
        };

        for (key, etm) in &settings.etm {
            warn_if_unknown(key);
            builder = builder.etm(key, *etm)?;
        }
        for (key, stat) in &settings.population {
            warn_if_unknown(key);
            builder = builder.population(key, stat.mean, stat.sd)?;
        }

        tracing::debug!(
            etm_overrides = settings.etm.len(),
            population_overrides = settings.population.len(),
            "Reference tables loaded."
        );
        Ok(builder.build())
    }

    /// %ETM for `key`, or `0` when the key is unknown.
    pub fn etm_for(&self, key: &str) -> f64 {
        self.etm_lookup(key).unwrap_or(0.0)
    }

    /// Population statistics for `key`, or `PopulationStat::NO_DATA`.
    pub fn reference_for(&self, key: &str) -> PopulationStat {
        self.reference_lookup(key).unwrap_or(PopulationStat::NO_DATA)
    }

    pub fn etm_lookup(&self, key: &str) -> Option<f64> {
        self.etm.get(key).copied()
    }

    pub fn reference_lookup(&self, key: &str) -> Option<PopulationStat> {
        self.population.get(key).copied()
    }
}

impl Default for ReferenceTables {
    fn default() -> Self {
        Self::builtin()
    }
}

fn warn_if_unknown(key: &str) {
    if MeasurementField::from_str(key).is_err() {
        tracing::warn!(key, "Reference override for a field the engine never measures.");
    }
}

/// Validating builder for `ReferenceTables`.
#[derive(Debug, Clone)]
pub struct ReferenceTablesBuilder {
    tables: ReferenceTables,
}

impl ReferenceTablesBuilder {
    pub fn etm(mut self, key: &str, etm_pct: f64) -> Result<Self, StandardsError> {
        if !etm_pct.is_finite() || etm_pct < 0.0 {
            return Err(StandardsError::InvalidEtm {
                key: key.to_string(),
                value: etm_pct,
            });
        }
        self.tables.etm.insert(key.to_string(), etm_pct);
        Ok(self)
    }

    pub fn population(mut self, key: &str, mean: f64, sd: f64) -> Result<Self, StandardsError> {
        if !mean.is_finite() || !sd.is_finite() || sd < 0.0 {
            return Err(StandardsError::InvalidReference {
                key: key.to_string(),
                mean,
                sd,
            });
        }
        self.tables
            .population
            .insert(key.to_string(), PopulationStat { mean, sd });
        Ok(self)
    }

    pub fn build(self) -> ReferenceTables {
        self.tables
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use configuration::PopulationStatSettings;

    #[test]
    fn builtin_covers_every_field() {
        let tables = ReferenceTables::builtin();
        for field in MeasurementField::ALL {
            assert!(tables.etm_lookup(field.key()).is_some(), "missing etm for {}", field);
            assert!(tables.reference_lookup(field.key()).is_some(), "missing ref for {}", field);
        }
    }

    #[test]
    fn unknown_keys_return_defaults() {
        let tables = ReferenceTables::builtin();
        assert_eq!(tables.etm_for("skinfold_forehead"), 0.0);
        assert_eq!(tables.reference_for("skinfold_forehead"), PopulationStat::NO_DATA);
        assert_eq!(tables.reference_lookup("skinfold_forehead"), None);
    }

    #[test]
    fn builtin_means_match_reference_subject() {
        let tables = ReferenceTables::builtin();
        assert_eq!(tables.reference_for("weight").mean, 74.6);
        assert_eq!(tables.reference_for("height").mean, 179.5);
        assert_eq!(tables.reference_for("skinfold_abdominal").mean, 17.5);
        assert_eq!(tables.etm_for("skinfold_triceps"), 5.0);
    }

    #[test]
    fn settings_override_single_entries() {
        let mut settings = ReferenceSettings::default();
        settings.etm.insert("skinfold_triceps".to_string(), 7.5);
        settings.population.insert(
            "perimeter_waist".to_string(),
            PopulationStatSettings { mean: 79.0, sd: 5.5 },
        );

        let tables = ReferenceTables::from_settings(&settings).unwrap();
        assert_eq!(tables.etm_for("skinfold_triceps"), 7.5);
        assert_eq!(tables.reference_for("perimeter_waist"), PopulationStat { mean: 79.0, sd: 5.5 });
        // Untouched entries keep their built-in values.
        assert_eq!(tables.etm_for("skinfold_calf"), 5.0);
    }

    #[test]
    fn builder_rejects_negative_statistics() {
        let err = ReferenceTables::builder().population("weight", 70.0, -1.0).unwrap_err();
        assert!(matches!(err, StandardsError::InvalidReference { .. }));

        let err = ReferenceTables::builder().etm("weight", f64::NAN).unwrap_err();
        assert!(matches!(err, StandardsError::InvalidEtm { .. }));
    }
}
