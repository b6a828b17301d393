use crate::assembler::ResultAssembler;
use crate::calculator::BodyCompositionCalculator;
use crate::error::CompositionError;
use crate::result::CompositionResult;
use crate::somatotype;
use configuration::Config;
use core_types::{MeasurementSet, Sex};
use standards::{AdjustmentPolicy, ReferenceTables, StandardsError};

/// A stateless calculator from a measurement revision to its composition result.
///
/// The engine holds only immutable configuration (reference tables and the
/// adjustment policy), so it can be shared freely across tasks. Computing the
/// same measurement twice yields identical results.
#[derive(Debug, Clone, Default)]
pub struct CompositionEngine {
    calculator: BodyCompositionCalculator,
    assembler: ResultAssembler,
}

impl CompositionEngine {
    pub fn new(tables: ReferenceTables, policy: AdjustmentPolicy) -> Self {
        Self {
            calculator: BodyCompositionCalculator::new(),
            assembler: ResultAssembler::new(tables, policy),
        }
    }

    /// Builds an engine from the `[engine]` and `[reference]` sections.
    pub fn from_config(config: &Config) -> Result<Self, StandardsError> {
        let tables = ReferenceTables::from_settings(&config.reference)?;
        let policy = AdjustmentPolicy::from_settings(&config.engine)?;
        Ok(Self::new(tables, policy))
    }

    pub fn tables(&self) -> &ReferenceTables {
        self.assembler.tables()
    }

    pub fn policy(&self) -> &AdjustmentPolicy {
        self.assembler.policy()
    }

    /// The main entry point: validates, fractionates and assembles.
    ///
    /// # Arguments
    ///
    /// * `measurement` - The measurement revision to evaluate. The result is
    ///   tagged with its `version`.
    /// * `sex` - The patient's sex. `None` is a precondition failure.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `CompositionResult` or a `CompositionError`.
    pub fn compute(
        &self,
        measurement: &MeasurementSet,
        sex: Option<Sex>,
    ) -> Result<CompositionResult, CompositionError> {
        let fractionation = self.calculator.calculate(measurement, sex)?;
        let somatotype = somatotype::heath_carter(measurement);
        let result = self.assembler.assemble(measurement, &fractionation, somatotype);

        tracing::info!(
            measurement_id = %measurement.measurement_id,
            version = measurement.version,
            bmi = result.bmi,
            fat_pct = result.fat_pct,
            "Composition computed."
        );
        Ok(result)
    }
}
