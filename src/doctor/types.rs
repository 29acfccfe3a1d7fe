use serde::{Deserialize, Serialize};

use super::models::{DoctorModel, Slot};
use crate::user::types::UserResponse;

/// Slot as submitted by a doctor
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotRequest {
    pub date: Option<String>,
    pub time: Option<String>,
    #[serde(default)]
    pub is_booked: bool,
}

/// Request payload for `POST /create-doctor-profile`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDoctorRequest {
    pub specialization: Option<String>,
    pub qualifications: Option<Vec<String>>,
    pub experience: Option<u32>,
    pub department: Option<String>,
    pub available_slots: Option<Vec<SlotRequest>>,
}

/// Partial update; absent fields are left untouched
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDoctorRequest {
    pub specialization: Option<String>,
    pub qualifications: Option<Vec<String>>,
    pub experience: Option<u32>,
    pub department: Option<String>,
    pub available_slots: Option<Vec<SlotRequest>>,
    pub rating: Option<f64>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AddSlotRequest {
    pub date: Option<String>,
    pub time: Option<String>,
}

/// Doctor profile with its account details filled in when available
#[derive(Debug, Clone, Serialize)]
pub struct DoctorResponse {
    #[serde(flatten)]
    pub doctor: DoctorModel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
}

#[derive(Debug, Serialize)]
pub struct DoctorPayload {
    pub doctor: DoctorResponse,
}

#[derive(Debug, Serialize)]
pub struct DoctorsPayload {
    pub count: usize,
    pub doctors: Vec<DoctorResponse>,
}

#[derive(Debug, Serialize)]
pub struct SlotPayload {
    pub slot: Slot,
}

#[derive(Debug, Serialize)]
pub struct SlotsPayload {
    pub slots: Vec<Slot>,
}
