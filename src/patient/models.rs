use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum BloodGroup {
    #[serde(rename = "A+")]
    #[strum(serialize = "A+")]
    APositive,
    #[serde(rename = "A-")]
    #[strum(serialize = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    #[strum(serialize = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    #[strum(serialize = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    #[strum(serialize = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    #[strum(serialize = "AB-")]
    AbNegative,
    #[serde(rename = "O+")]
    #[strum(serialize = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    #[strum(serialize = "O-")]
    ONegative,
}

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
pub enum PatientStatus {
    #[default]
    Outpatient,
    Inpatient,
    Discharged,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub name: String,
    pub relation: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsuranceDetails {
    pub provider: Option<String>,
    pub policy_number: Option<String>,
    pub valid_till: Option<NaiveDate>,
}

/// Validated data for a new patient record
#[derive(Debug, Clone)]
pub struct NewPatient {
    pub user_id: String,
    pub blood_group: BloodGroup,
    pub emergency_contact: EmergencyContact,
    pub allergies: Vec<String>,
    pub health_history: Vec<String>,
    pub current_medications: Vec<String>,
    pub doctor_id: Option<String>,
    pub nurse_id: Option<String>,
    pub room_id: Option<String>,
    pub insurance_details: InsuranceDetails,
    pub status: PatientStatus,
}

/// Stored patient record, one per patient account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientModel {
    pub id: String,
    pub user_id: String,
    pub blood_group: BloodGroup,
    pub emergency_contact: EmergencyContact,
    pub allergies: Vec<String>,
    pub health_history: Vec<String>,
    pub current_medications: Vec<String>,
    pub admitted: bool,
    pub room_id: Option<String>,
    pub doctor_id: Option<String>, // doctor profile id, not the doctor's user id
    pub nurse_id: Option<String>,
    pub registered_at: DateTime<Utc>,
    pub discharge_date: Option<DateTime<Utc>>,
    pub insurance_details: InsuranceDetails,
    pub status: PatientStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PatientModel {
    pub fn new(record: NewPatient) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            user_id: record.user_id,
            blood_group: record.blood_group,
            emergency_contact: record.emergency_contact,
            allergies: record.allergies,
            health_history: record.health_history,
            current_medications: record.current_medications,
            admitted: false,
            room_id: record.room_id,
            doctor_id: record.doctor_id,
            nurse_id: record.nurse_id,
            registered_at: now,
            discharge_date: None,
            insurance_details: record.insurance_details,
            status: record.status,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    pub fn admit(&mut self, room_id: String) {
        self.admitted = true;
        self.room_id = Some(room_id);
        self.status = PatientStatus::Inpatient;
        self.discharge_date = None;
        self.touch();
    }

    pub fn discharge(&mut self, at: DateTime<Utc>) {
        self.admitted = false;
        self.room_id = None;
        self.status = PatientStatus::Discharged;
        self.discharge_date = Some(at);
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
