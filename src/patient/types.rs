use serde::{Deserialize, Serialize};

use super::models::{InsuranceDetails, PatientModel};
use crate::doctor::models::DoctorModel;
use crate::user::types::UserResponse;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmergencyContactRequest {
    pub name: Option<String>,
    pub relation: Option<String>,
    pub phone: Option<String>,
}

/// Request payload for `POST /add-patient`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPatientRequest {
    pub blood_group: Option<String>,
    pub emergency_contact: Option<EmergencyContactRequest>,
    pub allergies: Option<Vec<String>>,
    pub health_history: Option<Vec<String>>,
    pub current_medications: Option<Vec<String>>,
    pub doctor_id: Option<String>,
    pub nurse_id: Option<String>,
    pub room_id: Option<String>,
    pub insurance_details: Option<InsuranceDetails>,
    pub status: Option<String>,
}

/// Partial update; absent fields are left untouched
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePatientRequest {
    pub blood_group: Option<String>,
    pub emergency_contact: Option<EmergencyContactRequest>,
    pub allergies: Option<Vec<String>>,
    pub health_history: Option<Vec<String>>,
    pub current_medications: Option<Vec<String>>,
    pub doctor_id: Option<String>,
    pub nurse_id: Option<String>,
    pub room_id: Option<String>,
    pub insurance_details: Option<InsuranceDetails>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmitPatientRequest {
    pub room_id: Option<String>,
}

/// Patient record with its account and assigned doctor filled in
#[derive(Debug, Clone, Serialize)]
pub struct PatientResponse {
    #[serde(flatten)]
    pub patient: PatientModel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor: Option<DoctorModel>,
}

#[derive(Debug, Serialize)]
pub struct PatientPayload {
    pub patient: PatientResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientsPayload {
    pub total_patients: usize,
    pub patients: Vec<PatientResponse>,
}
