use crate::DbError;
use crate::store::MeasurementStore;
use async_trait::async_trait;
use composition::CompositionResult;
use core_types::{BasicMeasurements, Diameters, MeasurementSet, Perimeters, Skinfolds};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgRow};
use uuid::Uuid;

/// The `DbRepository` provides the PostgreSQL implementation of the
/// measurement store. It encapsulates all SQL queries and data access logic.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn current_version(&self, measurement_id: Uuid) -> Result<Option<u64>, DbError> {
        let version: Option<i64> =
            sqlx::query_scalar("SELECT version FROM measurements WHERE measurement_id = $1")
                .bind(measurement_id)
                .fetch_optional(&self.pool)
                .await?;
        version.map(from_db_version).transpose()
    }
}

#[async_trait]
impl MeasurementStore for DbRepository {
    async fn insert(&self, measurement: &MeasurementSet) -> Result<(), DbError> {
        let outcome = sqlx::query(
            r#"
            INSERT INTO measurements (
                measurement_id, patient_id, taken_at, version,
                basic, diameters, perimeters, skinfolds, notes
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (measurement_id) DO NOTHING
            "#,
        )
        .bind(measurement.measurement_id)
        .bind(measurement.patient_id)
        .bind(measurement.taken_at)
        .bind(to_db_version(measurement.version)?)
        .bind(serde_json::to_value(&measurement.basic)?)
        .bind(serde_json::to_value(&measurement.diameters)?)
        .bind(serde_json::to_value(&measurement.perimeters)?)
        .bind(serde_json::to_value(&measurement.skinfolds)?)
        .bind(measurement.notes.as_deref())
        .execute(&self.pool)
        .await?;

        if outcome.rows_affected() == 0 {
            return Err(DbError::AlreadyExists(measurement.measurement_id));
        }
        Ok(())
    }

    async fn fetch(&self, measurement_id: Uuid) -> Result<MeasurementSet, DbError> {
        let row = sqlx::query(
            r#"
            SELECT measurement_id, patient_id, taken_at, version,
                   basic, diameters, perimeters, skinfolds, notes
            FROM measurements
            WHERE measurement_id = $1
            "#,
        )
        .bind(measurement_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::RowNotFound = e {
                DbError::NotFound(measurement_id)
            } else {
                e.into()
            }
        })?;

        measurement_from_row(&row)
    }

    async fn compare_and_swap(
        &self,
        expected_version: u64,
        updated: &MeasurementSet,
    ) -> Result<MeasurementSet, DbError> {
        // The version check and the write are one statement, so concurrent
        // writers on any number of connections serialize on the row lock.
        let new_version: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE measurements
            SET taken_at = $3,
                basic = $4,
                diameters = $5,
                perimeters = $6,
                skinfolds = $7,
                notes = $8,
                version = version + 1,
                updated_at = now()
            WHERE measurement_id = $1 AND version = $2
            RETURNING version
            "#,
        )
        .bind(updated.measurement_id)
        .bind(to_db_version(expected_version)?)
        .bind(updated.taken_at)
        .bind(serde_json::to_value(&updated.basic)?)
        .bind(serde_json::to_value(&updated.diameters)?)
        .bind(serde_json::to_value(&updated.perimeters)?)
        .bind(serde_json::to_value(&updated.skinfolds)?)
        .bind(updated.notes.as_deref())
        .fetch_optional(&self.pool)
        .await?;

        match new_version {
            Some(version) => {
                let mut stored = updated.clone();
                stored.version = from_db_version(version)?;
                Ok(stored)
            }
            None => match self.current_version(updated.measurement_id).await? {
                Some(current) => Err(DbError::VersionConflict {
                    measurement_id: updated.measurement_id,
                    expected: expected_version,
                    current,
                }),
                None => Err(DbError::NotFound(updated.measurement_id)),
            },
        }
    }

    async fn save_result(&self, result: &CompositionResult) -> Result<bool, DbError> {
        let outcome = sqlx::query(
            r#"
            INSERT INTO composition_results (measurement_id, version, result, computed_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (measurement_id) DO UPDATE
            SET version = EXCLUDED.version,
                result = EXCLUDED.result,
                computed_at = EXCLUDED.computed_at
            WHERE composition_results.version <= EXCLUDED.version
            "#,
        )
        .bind(result.measurement_id)
        .bind(to_db_version(result.version)?)
        .bind(serde_json::to_value(result)?)
        .execute(&self.pool)
        .await?;

        Ok(outcome.rows_affected() == 1)
    }

    async fn fetch_result(
        &self,
        measurement_id: Uuid,
    ) -> Result<Option<CompositionResult>, DbError> {
        let row = sqlx::query(
            r#"
            SELECT m.version AS current_version, r.version AS result_version, r.result
            FROM measurements AS m
            LEFT JOIN composition_results AS r ON r.measurement_id = m.measurement_id
            WHERE m.measurement_id = $1
            "#,
        )
        .bind(measurement_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound(measurement_id))?;

        let current: i64 = row.try_get("current_version")?;
        let result_version: Option<i64> = row.try_get("result_version")?;
        if result_version != Some(current) {
            return Ok(None);
        }

        let value: JsonValue = row.try_get("result")?;
        Ok(Some(serde_json::from_value(value)?))
    }
}

fn measurement_from_row(row: &PgRow) -> Result<MeasurementSet, DbError> {
    Ok(MeasurementSet {
        measurement_id: row.try_get("measurement_id")?,
        patient_id: row.try_get("patient_id")?,
        taken_at: row.try_get("taken_at")?,
        version: from_db_version(row.try_get("version")?)?,
        basic: json_column::<BasicMeasurements>(row, "basic")?,
        diameters: json_column::<Diameters>(row, "diameters")?,
        perimeters: json_column::<Perimeters>(row, "perimeters")?,
        skinfolds: json_column::<Skinfolds>(row, "skinfolds")?,
        notes: row.try_get("notes")?,
    })
}

fn json_column<T: DeserializeOwned>(row: &PgRow, column: &str) -> Result<T, DbError> {
    let value: JsonValue = row.try_get(column)?;
    Ok(serde_json::from_value(value)?)
}

fn to_db_version(version: u64) -> Result<i64, DbError> {
    i64::try_from(version)
        .map_err(|_| DbError::CorruptRow(format!("version {} exceeds BIGINT", version)))
}

fn from_db_version(version: i64) -> Result<u64, DbError> {
    u64::try_from(version)
        .map_err(|_| DbError::CorruptRow(format!("negative version {}", version)))
}
