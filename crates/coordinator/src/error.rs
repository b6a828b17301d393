use composition::CompositionError;
use core_types::CoreError;
use database::DbError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum CoordinatorError {
    #[error(
        "Measurement {measurement_id} was modified concurrently: expected version {expected}, current version {current}"
    )]
    Conflict {
        measurement_id: Uuid,
        expected: u64,
        current: u64,
    },

    #[error("Measurement {0} was not found.")]
    NotFound(Uuid),

    #[error("Invalid measurement update: {0}")]
    InvalidPatch(#[from] CoreError),

    #[error(transparent)]
    Composition(#[from] CompositionError),

    #[error("Database error: {0}")]
    Database(DbError),
}

impl From<DbError> for CoordinatorError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::VersionConflict {
                measurement_id,
                expected,
                current,
            } => CoordinatorError::Conflict {
                measurement_id,
                expected,
                current,
            },
            DbError::NotFound(id) => CoordinatorError::NotFound(id),
            other => CoordinatorError::Database(other),
        }
    }
}

impl CoordinatorError {
    /// The status an HTTP layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            CoordinatorError::Conflict { .. } => 409,
            CoordinatorError::NotFound(_) => 404,
            CoordinatorError::InvalidPatch(_) | CoordinatorError::Composition(_) => 422,
            CoordinatorError::Database(DbError::AlreadyExists(_)) => 409,
            CoordinatorError::Database(_) => 500,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, CoordinatorError::Conflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use composition::PreconditionError;

    #[test]
    fn store_errors_map_to_protocol_errors() {
        let id = Uuid::new_v4();
        let conflict = CoordinatorError::from(DbError::VersionConflict {
            measurement_id: id,
            expected: 1,
            current: 2,
        });
        assert!(conflict.is_conflict());
        assert_eq!(conflict.http_status(), 409);

        assert_eq!(CoordinatorError::from(DbError::NotFound(id)).http_status(), 404);
        assert_eq!(
            CoordinatorError::from(DbError::CorruptRow("x".to_string())).http_status(),
            500
        );
    }

    #[test]
    fn validation_failures_are_unprocessable() {
        let invalid = CoordinatorError::from(CoreError::InvalidInput(
            "weight".to_string(),
            "negative".to_string(),
        ));
        assert_eq!(invalid.http_status(), 422);

        let precondition =
            CoordinatorError::from(CompositionError::from(PreconditionError::MissingSex));
        assert_eq!(precondition.http_status(), 422);
    }
}
