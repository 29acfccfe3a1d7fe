use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{info, instrument, warn};

use crate::shared::AppError;

/// Every collection is a table of JSONB documents keyed by id
const COLLECTIONS: [&str; 4] = ["users", "doctors", "patients", "appointments"];

const INDEXES: [&str; 5] = [
    "CREATE UNIQUE INDEX IF NOT EXISTS users_email_idx ON users ((doc->>'email'))",
    "CREATE UNIQUE INDEX IF NOT EXISTS doctors_user_idx ON doctors ((doc->>'userId'))",
    "CREATE UNIQUE INDEX IF NOT EXISTS patients_user_idx ON patients ((doc->>'userId'))",
    "CREATE INDEX IF NOT EXISTS appointments_patient_idx ON appointments ((doc->>'patientId'))",
    "CREATE INDEX IF NOT EXISTS appointments_doctor_idx ON appointments ((doc->>'doctorId'))",
];

#[instrument(skip(database_url))]
pub async fn connect(database_url: &str) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .map_err(db_error("Failed to connect to database"))?;

    info!("Connected to Postgres");
    Ok(pool)
}

/// Creates the collection tables and their lookup indexes if missing
#[instrument(skip(pool))]
pub async fn ensure_schema(pool: &PgPool) -> Result<(), AppError> {
    for collection in COLLECTIONS {
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {} (\
                id TEXT PRIMARY KEY, \
                doc JSONB NOT NULL, \
                created_at TIMESTAMPTZ NOT NULL DEFAULT now())",
            collection
        );
        sqlx::query(&ddl)
            .execute(pool)
            .await
            .map_err(db_error("Failed to create collection table"))?;
    }

    for ddl in INDEXES {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(db_error("Failed to create collection index"))?;
    }

    info!(collections = COLLECTIONS.len(), "Database schema ready");
    Ok(())
}

/// Maps a sqlx failure into `AppError::DatabaseError`, logging the context
pub fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |e| {
        warn!(error = %e, "{}", context);
        AppError::DatabaseError(e.to_string())
    }
}
