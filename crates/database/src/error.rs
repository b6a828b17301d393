use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to load environment variables for database connection: {0}")]
    ConnectionConfigError(String),

    #[error("Failed to connect to the database: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("An error occurred during JSON serialization/deserialization: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Measurement {0} was not found in the database.")]
    NotFound(Uuid),

    #[error("Measurement {0} already exists.")]
    AlreadyExists(Uuid),

    #[error("Version conflict on measurement {measurement_id}: expected {expected}, current {current}")]
    VersionConflict {
        measurement_id: Uuid,
        expected: u64,
        current: u64,
    },

    #[error("Stored row is corrupt: {0}")]
    CorruptRow(String),
}
