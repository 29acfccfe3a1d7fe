use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::models::PatientModel;
use crate::database::db_error;
use crate::shared::AppError;

#[async_trait]
pub trait PatientRepository {
    async fn create_patient(&self, patient: &PatientModel) -> Result<(), AppError>;
    async fn get_patient(&self, patient_id: &str) -> Result<Option<PatientModel>, AppError>;
    /// Looks up the record belonging to a patient account
    async fn find_by_user(&self, user_id: &str) -> Result<Option<PatientModel>, AppError>;
    async fn list_patients(&self) -> Result<Vec<PatientModel>, AppError>;
    async fn update_patient(&self, patient: &PatientModel) -> Result<(), AppError>;
}

pub struct InMemoryPatientRepository {
    patients: RwLock<HashMap<String, PatientModel>>,
}

impl Default for InMemoryPatientRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPatientRepository {
    pub fn new() -> Self {
        Self {
            patients: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_patients(patients: Vec<PatientModel>) -> Self {
        let patient_map = patients
            .into_iter()
            .map(|patient| (patient.id.clone(), patient))
            .collect();

        Self {
            patients: RwLock::new(patient_map),
        }
    }
}

#[async_trait]
impl PatientRepository for InMemoryPatientRepository {
    #[instrument(skip(self, patient))]
    async fn create_patient(&self, patient: &PatientModel) -> Result<(), AppError> {
        debug!(patient_id = %patient.id, "Creating patient in memory");

        let mut patients = self.patients.write().await;
        if patients.contains_key(&patient.id)
            || patients.values().any(|p| p.user_id == patient.user_id)
        {
            warn!(patient_id = %patient.id, "Patient already exists in memory");
            return Err(AppError::DatabaseError(
                "Patient already exists".to_string(),
            ));
        }
        patients.insert(patient.id.clone(), patient.clone());

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_patient(&self, patient_id: &str) -> Result<Option<PatientModel>, AppError> {
        Ok(self.patients.read().await.get(patient_id).cloned())
    }

    #[instrument(skip(self))]
    async fn find_by_user(&self, user_id: &str) -> Result<Option<PatientModel>, AppError> {
        let patients = self.patients.read().await;
        Ok(patients.values().find(|p| p.user_id == user_id).cloned())
    }

    #[instrument(skip(self))]
    async fn list_patients(&self) -> Result<Vec<PatientModel>, AppError> {
        let mut patients: Vec<PatientModel> =
            self.patients.read().await.values().cloned().collect();
        patients.sort_by_key(|p| p.created_at);
        Ok(patients)
    }

    #[instrument(skip(self, patient))]
    async fn update_patient(&self, patient: &PatientModel) -> Result<(), AppError> {
        let mut patients = self.patients.write().await;
        if !patients.contains_key(&patient.id) {
            warn!(patient_id = %patient.id, "Patient not found for update in memory");
            return Err(AppError::NotFound("Patient not found!".to_string()));
        }
        patients.insert(patient.id.clone(), patient.clone());

        Ok(())
    }
}

/// PostgreSQL implementation over the `patients` document table
pub struct PostgresPatientRepository {
    pool: PgPool,
}

impl PostgresPatientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PatientRepository for PostgresPatientRepository {
    #[instrument(skip(self, patient))]
    async fn create_patient(&self, patient: &PatientModel) -> Result<(), AppError> {
        debug!(patient_id = %patient.id, "Creating patient in database");

        sqlx::query("INSERT INTO patients (id, doc, created_at) VALUES ($1, $2, $3)")
            .bind(&patient.id)
            .bind(Json(patient))
            .bind(patient.created_at)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to create patient in database"))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_patient(&self, patient_id: &str) -> Result<Option<PatientModel>, AppError> {
        let row: Option<(Json<PatientModel>,)> =
            sqlx::query_as("SELECT doc FROM patients WHERE id = $1")
                .bind(patient_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("Failed to fetch patient from database"))?;

        Ok(row.map(|(Json(patient),)| patient))
    }

    #[instrument(skip(self))]
    async fn find_by_user(&self, user_id: &str) -> Result<Option<PatientModel>, AppError> {
        let row: Option<(Json<PatientModel>,)> =
            sqlx::query_as("SELECT doc FROM patients WHERE doc->>'userId' = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("Failed to look up patient by user"))?;

        Ok(row.map(|(Json(patient),)| patient))
    }

    #[instrument(skip(self))]
    async fn list_patients(&self) -> Result<Vec<PatientModel>, AppError> {
        let rows: Vec<(Json<PatientModel>,)> =
            sqlx::query_as("SELECT doc FROM patients ORDER BY created_at")
                .fetch_all(&self.pool)
                .await
                .map_err(db_error("Failed to list patients"))?;

        Ok(rows.into_iter().map(|(Json(patient),)| patient).collect())
    }

    #[instrument(skip(self, patient))]
    async fn update_patient(&self, patient: &PatientModel) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE patients SET doc = $2 WHERE id = $1")
            .bind(&patient.id)
            .bind(Json(patient))
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to update patient in database"))?;

        if result.rows_affected() == 0 {
            warn!(patient_id = %patient.id, "Patient not found for update");
            return Err(AppError::NotFound("Patient not found!".to_string()));
        }

        Ok(())
    }
}
