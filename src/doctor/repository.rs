use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::models::DoctorModel;
use crate::database::db_error;
use crate::shared::AppError;

#[async_trait]
pub trait DoctorRepository {
    async fn create_doctor(&self, doctor: &DoctorModel) -> Result<(), AppError>;
    async fn get_doctor(&self, doctor_id: &str) -> Result<Option<DoctorModel>, AppError>;
    /// Looks up the profile belonging to a doctor account
    async fn find_by_user(&self, user_id: &str) -> Result<Option<DoctorModel>, AppError>;
    async fn list_doctors(&self) -> Result<Vec<DoctorModel>, AppError>;
    async fn update_doctor(&self, doctor: &DoctorModel) -> Result<(), AppError>;
    async fn delete_doctor(&self, doctor_id: &str) -> Result<Option<DoctorModel>, AppError>;
}

pub struct InMemoryDoctorRepository {
    doctors: RwLock<HashMap<String, DoctorModel>>,
}

impl Default for InMemoryDoctorRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDoctorRepository {
    pub fn new() -> Self {
        Self {
            doctors: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_doctors(doctors: Vec<DoctorModel>) -> Self {
        let doctor_map = doctors
            .into_iter()
            .map(|doctor| (doctor.id.clone(), doctor))
            .collect();

        Self {
            doctors: RwLock::new(doctor_map),
        }
    }
}

#[async_trait]
impl DoctorRepository for InMemoryDoctorRepository {
    #[instrument(skip(self, doctor))]
    async fn create_doctor(&self, doctor: &DoctorModel) -> Result<(), AppError> {
        debug!(doctor_id = %doctor.id, "Creating doctor in memory");

        let mut doctors = self.doctors.write().await;
        if doctors.contains_key(&doctor.id)
            || doctors.values().any(|d| d.user_id == doctor.user_id)
        {
            warn!(doctor_id = %doctor.id, "Doctor profile already exists in memory");
            return Err(AppError::DatabaseError(
                "Doctor profile already exists".to_string(),
            ));
        }
        doctors.insert(doctor.id.clone(), doctor.clone());

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_doctor(&self, doctor_id: &str) -> Result<Option<DoctorModel>, AppError> {
        Ok(self.doctors.read().await.get(doctor_id).cloned())
    }

    #[instrument(skip(self))]
    async fn find_by_user(&self, user_id: &str) -> Result<Option<DoctorModel>, AppError> {
        let doctors = self.doctors.read().await;
        Ok(doctors.values().find(|d| d.user_id == user_id).cloned())
    }

    #[instrument(skip(self))]
    async fn list_doctors(&self) -> Result<Vec<DoctorModel>, AppError> {
        let mut doctors: Vec<DoctorModel> = self.doctors.read().await.values().cloned().collect();
        doctors.sort_by_key(|d| d.created_at);
        Ok(doctors)
    }

    #[instrument(skip(self, doctor))]
    async fn update_doctor(&self, doctor: &DoctorModel) -> Result<(), AppError> {
        let mut doctors = self.doctors.write().await;
        if !doctors.contains_key(&doctor.id) {
            warn!(doctor_id = %doctor.id, "Doctor not found for update in memory");
            return Err(AppError::NotFound("Doctor not found!".to_string()));
        }
        doctors.insert(doctor.id.clone(), doctor.clone());

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_doctor(&self, doctor_id: &str) -> Result<Option<DoctorModel>, AppError> {
        debug!(doctor_id = %doctor_id, "Deleting doctor from memory");
        Ok(self.doctors.write().await.remove(doctor_id))
    }
}

/// PostgreSQL implementation over the `doctors` document table
pub struct PostgresDoctorRepository {
    pool: PgPool,
}

impl PostgresDoctorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DoctorRepository for PostgresDoctorRepository {
    #[instrument(skip(self, doctor))]
    async fn create_doctor(&self, doctor: &DoctorModel) -> Result<(), AppError> {
        debug!(doctor_id = %doctor.id, "Creating doctor in database");

        sqlx::query("INSERT INTO doctors (id, doc, created_at) VALUES ($1, $2, $3)")
            .bind(&doctor.id)
            .bind(Json(doctor))
            .bind(doctor.created_at)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to create doctor in database"))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_doctor(&self, doctor_id: &str) -> Result<Option<DoctorModel>, AppError> {
        let row: Option<(Json<DoctorModel>,)> =
            sqlx::query_as("SELECT doc FROM doctors WHERE id = $1")
                .bind(doctor_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("Failed to fetch doctor from database"))?;

        Ok(row.map(|(Json(doctor),)| doctor))
    }

    #[instrument(skip(self))]
    async fn find_by_user(&self, user_id: &str) -> Result<Option<DoctorModel>, AppError> {
        let row: Option<(Json<DoctorModel>,)> =
            sqlx::query_as("SELECT doc FROM doctors WHERE doc->>'userId' = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("Failed to look up doctor by user"))?;

        Ok(row.map(|(Json(doctor),)| doctor))
    }

    #[instrument(skip(self))]
    async fn list_doctors(&self) -> Result<Vec<DoctorModel>, AppError> {
        let rows: Vec<(Json<DoctorModel>,)> =
            sqlx::query_as("SELECT doc FROM doctors ORDER BY created_at")
                .fetch_all(&self.pool)
                .await
                .map_err(db_error("Failed to list doctors"))?;

        Ok(rows.into_iter().map(|(Json(doctor),)| doctor).collect())
    }

    #[instrument(skip(self, doctor))]
    async fn update_doctor(&self, doctor: &DoctorModel) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE doctors SET doc = $2 WHERE id = $1")
            .bind(&doctor.id)
            .bind(Json(doctor))
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to update doctor in database"))?;

        if result.rows_affected() == 0 {
            warn!(doctor_id = %doctor.id, "Doctor not found for update");
            return Err(AppError::NotFound("Doctor not found!".to_string()));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_doctor(&self, doctor_id: &str) -> Result<Option<DoctorModel>, AppError> {
        let row: Option<(Json<DoctorModel>,)> =
            sqlx::query_as("DELETE FROM doctors WHERE id = $1 RETURNING doc")
                .bind(doctor_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("Failed to delete doctor from database"))?;

        Ok(row.map(|(Json(doctor),)| doctor))
    }
}
