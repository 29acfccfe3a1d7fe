use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use uuid::Uuid;

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

/// Stored appointment between a patient record and a doctor profile
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentModel {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub date: String, // YYYY-MM-DD, local time
    pub time: String, // HH:mm
    pub status: AppointmentStatus,
    pub symptoms: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AppointmentModel {
    pub fn new(
        patient_id: String,
        doctor_id: String,
        date: String,
        time: String,
        symptoms: String,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            patient_id,
            doctor_id,
            date,
            time,
            status: AppointmentStatus::default(),
            symptoms,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn belongs_to_patient(&self, patient_id: &str) -> bool {
        self.patient_id == patient_id
    }

    pub fn reschedule(&mut self, date: String, time: String) {
        self.date = date;
        self.time = time;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
