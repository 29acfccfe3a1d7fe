use serde::{Deserialize, Serialize};

use super::models::AppointmentModel;
use crate::doctor::models::DoctorModel;
use crate::patient::models::PatientModel;

#[derive(Debug, Default, Deserialize)]
pub struct BookAppointmentRequest {
    pub date: Option<String>,
    pub time: Option<String>,
    pub symptoms: Option<String>,
}

/// Reschedule request; date and time are mandatory, symptoms optional
#[derive(Debug, Default, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub date: Option<String>,
    pub time: Option<String>,
    pub symptoms: Option<String>,
}

/// Appointment with the patient record and doctor profile it references
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentResponse {
    #[serde(flatten)]
    pub appointment: AppointmentModel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient: Option<PatientModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor: Option<DoctorModel>,
}

impl From<AppointmentModel> for AppointmentResponse {
    fn from(appointment: AppointmentModel) -> Self {
        Self {
            appointment,
            patient: None,
            doctor: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AppointmentPayload {
    pub appointment: AppointmentResponse,
}

#[derive(Debug, Serialize)]
pub struct AppointmentsPayload {
    pub total: usize,
    pub appointments: Vec<AppointmentResponse>,
}
