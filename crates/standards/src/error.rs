use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StandardsError {
    #[error("Adjustment factor must be in (0, 2], got {0}")]
    InvalidAdjustmentFactor(f64),

    #[error("Technical error of measurement for '{key}' must be a non-negative number, got {value}")]
    InvalidEtm { key: String, value: f64 },

    #[error("Reference population for '{key}' is invalid: mean {mean}, sd {sd}")]
    InvalidReference { key: String, mean: f64, sd: f64 },
}
