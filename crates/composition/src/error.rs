use core_types::MeasurementField;
use thiserror::Error;

/// The measurement set cannot be used for a composition calculation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PreconditionError {
    #[error("Insufficient measurement data for this visit: missing {}", join_fields(.0))]
    MissingFields(Vec<MeasurementField>),

    #[error("Invalid measurement data for this visit: {field} = {value} ({reason})")]
    InvalidValue {
        field: MeasurementField,
        value: f64,
        reason: &'static str,
    },

    #[error("Insufficient measurement data for this visit: patient sex was not supplied")]
    MissingSex,
}

/// The inputs passed every precondition but drove the formulas out of their domain.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DegenerateComputation {
    #[error(
        "Invalid measurement data for this visit: body density {density} is not positive (sum of six skinfolds {sum_of_6} mm)"
    )]
    NonPositiveDensity { density: f64, sum_of_6: f64 },

    #[error("Invalid measurement data for this visit: {quantity} evaluated to {value}")]
    NonFinite { quantity: &'static str, value: f64 },

    #[error("Invalid measurement data for this visit: structured weight {0} kg is not positive")]
    NonPositiveStructuredWeight(f64),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompositionError {
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error(transparent)]
    Degenerate(#[from] DegenerateComputation),
}

impl CompositionError {
    pub fn is_precondition(&self) -> bool {
        matches!(self, CompositionError::Precondition(_))
    }

    /// The missing fields, if this is a missing-field precondition failure.
    pub fn missing_fields(&self) -> &[MeasurementField] {
        match self {
            CompositionError::Precondition(PreconditionError::MissingFields(fields)) => fields,
            _ => &[],
        }
    }
}

fn join_fields(fields: &[MeasurementField]) -> String {
    fields
        .iter()
        .map(|f| f.key())
        .collect::<Vec<_>>()
        .join(", ")
}
