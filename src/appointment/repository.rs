use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::models::AppointmentModel;
use crate::database::db_error;
use crate::shared::AppError;

#[async_trait]
pub trait AppointmentRepository {
    async fn create_appointment(&self, appointment: &AppointmentModel) -> Result<(), AppError>;
    async fn get_appointment(
        &self,
        appointment_id: &str,
    ) -> Result<Option<AppointmentModel>, AppError>;
    /// Finds a patient's appointment at an exact date and time
    async fn find_by_slot(
        &self,
        patient_id: &str,
        date: &str,
        time: &str,
    ) -> Result<Option<AppointmentModel>, AppError>;
    async fn list_by_patient(&self, patient_id: &str) -> Result<Vec<AppointmentModel>, AppError>;
    async fn list_by_doctor(&self, doctor_id: &str) -> Result<Vec<AppointmentModel>, AppError>;
    async fn update_appointment(&self, appointment: &AppointmentModel) -> Result<(), AppError>;
    async fn delete_appointment(
        &self,
        appointment_id: &str,
    ) -> Result<Option<AppointmentModel>, AppError>;
}

pub struct InMemoryAppointmentRepository {
    appointments: RwLock<HashMap<String, AppointmentModel>>,
}

impl Default for InMemoryAppointmentRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAppointmentRepository {
    pub fn new() -> Self {
        Self {
            appointments: RwLock::new(HashMap::new()),
        }
    }

    async fn filtered<F>(&self, keep: F) -> Vec<AppointmentModel>
    where
        F: Fn(&AppointmentModel) -> bool,
    {
        let mut matching: Vec<AppointmentModel> = self
            .appointments
            .read()
            .await
            .values()
            .filter(|a| keep(a))
            .cloned()
            .collect();
        matching.sort_by_key(|a| a.created_at);
        matching
    }
}

#[async_trait]
impl AppointmentRepository for InMemoryAppointmentRepository {
    #[instrument(skip(self, appointment))]
    async fn create_appointment(&self, appointment: &AppointmentModel) -> Result<(), AppError> {
        debug!(appointment_id = %appointment.id, "Creating appointment in memory");

        let mut appointments = self.appointments.write().await;
        if appointments.contains_key(&appointment.id) {
            return Err(AppError::DatabaseError(
                "Appointment already exists".to_string(),
            ));
        }
        appointments.insert(appointment.id.clone(), appointment.clone());

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_appointment(
        &self,
        appointment_id: &str,
    ) -> Result<Option<AppointmentModel>, AppError> {
        Ok(self.appointments.read().await.get(appointment_id).cloned())
    }

    #[instrument(skip(self))]
    async fn find_by_slot(
        &self,
        patient_id: &str,
        date: &str,
        time: &str,
    ) -> Result<Option<AppointmentModel>, AppError> {
        let appointments = self.appointments.read().await;
        Ok(appointments
            .values()
            .find(|a| a.patient_id == patient_id && a.date == date && a.time == time)
            .cloned())
    }

    #[instrument(skip(self))]
    async fn list_by_patient(&self, patient_id: &str) -> Result<Vec<AppointmentModel>, AppError> {
        Ok(self.filtered(|a| a.patient_id == patient_id).await)
    }

    #[instrument(skip(self))]
    async fn list_by_doctor(&self, doctor_id: &str) -> Result<Vec<AppointmentModel>, AppError> {
        Ok(self.filtered(|a| a.doctor_id == doctor_id).await)
    }

    #[instrument(skip(self, appointment))]
    async fn update_appointment(&self, appointment: &AppointmentModel) -> Result<(), AppError> {
        let mut appointments = self.appointments.write().await;
        if !appointments.contains_key(&appointment.id) {
            warn!(appointment_id = %appointment.id, "Appointment not found for update in memory");
            return Err(AppError::NotFound("Appointment not found".to_string()));
        }
        appointments.insert(appointment.id.clone(), appointment.clone());

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_appointment(
        &self,
        appointment_id: &str,
    ) -> Result<Option<AppointmentModel>, AppError> {
        debug!(appointment_id = %appointment_id, "Deleting appointment from memory");
        Ok(self.appointments.write().await.remove(appointment_id))
    }
}

/// PostgreSQL implementation over the `appointments` document table
pub struct PostgresAppointmentRepository {
    pool: PgPool,
}

impl PostgresAppointmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn list_where(
        &self,
        field_query: &'static str,
        value: &str,
    ) -> Result<Vec<AppointmentModel>, AppError> {
        let rows: Vec<(Json<AppointmentModel>,)> = sqlx::query_as(field_query)
            .bind(value)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list appointments"))?;

        Ok(rows.into_iter().map(|(Json(a),)| a).collect())
    }
}

#[async_trait]
impl AppointmentRepository for PostgresAppointmentRepository {
    #[instrument(skip(self, appointment))]
    async fn create_appointment(&self, appointment: &AppointmentModel) -> Result<(), AppError> {
        debug!(appointment_id = %appointment.id, "Creating appointment in database");

        sqlx::query("INSERT INTO appointments (id, doc, created_at) VALUES ($1, $2, $3)")
            .bind(&appointment.id)
            .bind(Json(appointment))
            .bind(appointment.created_at)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to create appointment in database"))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_appointment(
        &self,
        appointment_id: &str,
    ) -> Result<Option<AppointmentModel>, AppError> {
        let row: Option<(Json<AppointmentModel>,)> =
            sqlx::query_as("SELECT doc FROM appointments WHERE id = $1")
                .bind(appointment_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("Failed to fetch appointment from database"))?;

        Ok(row.map(|(Json(a),)| a))
    }

    #[instrument(skip(self))]
    async fn find_by_slot(
        &self,
        patient_id: &str,
        date: &str,
        time: &str,
    ) -> Result<Option<AppointmentModel>, AppError> {
        let row: Option<(Json<AppointmentModel>,)> = sqlx::query_as(
            "SELECT doc FROM appointments \
             WHERE doc->>'patientId' = $1 AND doc->>'date' = $2 AND doc->>'time' = $3",
        )
        .bind(patient_id)
        .bind(date)
        .bind(time)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to look up appointment slot"))?;

        Ok(row.map(|(Json(a),)| a))
    }

    #[instrument(skip(self))]
    async fn list_by_patient(&self, patient_id: &str) -> Result<Vec<AppointmentModel>, AppError> {
        self.list_where(
            "SELECT doc FROM appointments WHERE doc->>'patientId' = $1 ORDER BY created_at",
            patient_id,
        )
        .await
    }

    #[instrument(skip(self))]
    async fn list_by_doctor(&self, doctor_id: &str) -> Result<Vec<AppointmentModel>, AppError> {
        self.list_where(
            "SELECT doc FROM appointments WHERE doc->>'doctorId' = $1 ORDER BY created_at",
            doctor_id,
        )
        .await
    }

    #[instrument(skip(self, appointment))]
    async fn update_appointment(&self, appointment: &AppointmentModel) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE appointments SET doc = $2 WHERE id = $1")
            .bind(&appointment.id)
            .bind(Json(appointment))
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to update appointment in database"))?;

        if result.rows_affected() == 0 {
            warn!(appointment_id = %appointment.id, "Appointment not found for update");
            return Err(AppError::NotFound("Appointment not found".to_string()));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_appointment(
        &self,
        appointment_id: &str,
    ) -> Result<Option<AppointmentModel>, AppError> {
        let row: Option<(Json<AppointmentModel>,)> =
            sqlx::query_as("DELETE FROM appointments WHERE id = $1 RETURNING doc")
                .bind(appointment_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("Failed to delete appointment from database"))?;

        Ok(row.map(|(Json(a),)| a))
    }
}
