use crate::calculator::Fractionation;
use crate::result::{CompositionResult, FieldResult, MassComponent};
use crate::somatotype::{self, Somatotype};
use core_types::MeasurementSet;
use standards::{AdjustmentPolicy, ReferenceTables, z_score};

/// Packages the fractionation, the optional indices and the per-field
/// statistics into the record consumers see.
#[derive(Debug, Clone, Default)]
pub struct ResultAssembler {
    tables: ReferenceTables,
    policy: AdjustmentPolicy,
}

impl ResultAssembler {
    pub fn new(tables: ReferenceTables, policy: AdjustmentPolicy) -> Self {
        Self { tables, policy }
    }

    pub fn tables(&self) -> &ReferenceTables {
        &self.tables
    }

    pub fn policy(&self) -> &AdjustmentPolicy {
        &self.policy
    }

    /// Builds the result, tagged with the measurement's current version.
    pub fn assemble(
        &self,
        measurement: &MeasurementSet,
        fractionation: &Fractionation,
        somatotype: Option<Somatotype>,
    ) -> CompositionResult {
        let f = fractionation;
        CompositionResult {
            measurement_id: measurement.measurement_id,
            patient_id: measurement.patient_id,
            version: measurement.version,
            sex: f.sex,
            bmi: f.bmi,
            sum_of_6_skinfolds: f.sum_of_6_skinfolds,
            body_density: f.body_density,
            fat_pct: f.fat_pct,
            skin: MassComponent { kg: f.skin_kg, pct: f.skin_pct },
            adipose: MassComponent { kg: f.adipose_kg, pct: f.adipose_pct },
            muscle: MassComponent { kg: f.muscle_kg, pct: f.muscle_pct },
            bone: MassComponent { kg: f.bone_kg, pct: f.bone_pct },
            residual: MassComponent { kg: f.residual_kg, pct: f.residual_pct },
            structured_weight: f.structured_weight,
            weight_difference: f.weight_difference_pct,
            muscle_to_bone_ratio: f.muscle_to_bone_ratio,
            adipose_to_muscle_ratio: f.adipose_to_muscle_ratio,
            waist_to_hip_ratio: somatotype::waist_to_hip_ratio(measurement),
            cormic_index: somatotype::cormic_index(measurement),
            somatotype,
            fields: self.field_results(measurement),
        }
    }

    /// One entry per present reading, in canonical field order.
    pub fn field_results(&self, measurement: &MeasurementSet) -> Vec<FieldResult> {
        measurement
            .present_readings()
            .map(|(field, raw)| {
                let key = field.key();
                let etm_pct = self.tables.etm_lookup(key);
                // Statistics are evaluated on the raw reading: the reference
                // populations are expressed in raw units.
                let z = self
                    .tables
                    .reference_lookup(key)
                    .map(|stat| z_score(raw, stat.mean, stat.sd));

                FieldResult {
                    field,
                    category: field.category(),
                    unit: field.unit(),
                    raw,
                    adjusted: self.policy.adjust(raw, field.category()),
                    etm_pct,
                    etm_bound: etm_pct.map(|pct| raw * pct / 100.0),
                    z_score: z,
                }
            })
            .collect()
    }
}
