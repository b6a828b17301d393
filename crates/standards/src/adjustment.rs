use crate::error::StandardsError;
use configuration::{DEFAULT_ADJUSTMENT_FACTOR, EngineSettings, MAX_ADJUSTMENT_FACTOR};
use core_types::MeasurementCategory;

/// Instrument calibration and tissue compressibility correction.
///
/// Skinfold, perimeter and diameter readings are multiplied by a single factor;
/// basic readings (weight, height) pass through unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdjustmentPolicy {
    factor: f64,
}

impl AdjustmentPolicy {
    /// Creates a policy with an explicit correction factor in `(0, 2]`.
    pub fn new(factor: f64) -> Result<Self, StandardsError> {
        if !factor.is_finite() || factor <= 0.0 || factor > MAX_ADJUSTMENT_FACTOR {
            return Err(StandardsError::InvalidAdjustmentFactor(factor));
        }
        Ok(Self { factor })
    }

    pub fn from_settings(settings: &EngineSettings) -> Result<Self, StandardsError> {
        Self::new(settings.adjustment_factor)
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub fn adjust(&self, raw: f64, category: MeasurementCategory) -> f64 {
        match category {
            MeasurementCategory::Basic => raw,
            MeasurementCategory::Skinfold
            | MeasurementCategory::Perimeter
            | MeasurementCategory::Diameter => raw * self.factor,
        }
    }
}

impl Default for AdjustmentPolicy {
    fn default() -> Self {
        Self {
            factor: DEFAULT_ADJUSTMENT_FACTOR,
        }
    }
}
