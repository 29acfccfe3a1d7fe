use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    service::PatientService,
    types::{
        AdmitPatientRequest, PatientPayload, PatientsPayload, RegisterPatientRequest,
        UpdatePatientRequest,
    },
};
use crate::session::CurrentUser;
use crate::shared::{ApiResponse, AppError, AppState, ValidatedJson};

fn patient_service(state: &AppState) -> PatientService {
    PatientService::new(
        Arc::clone(&state.patient_repository),
        Arc::clone(&state.doctor_repository),
        Arc::clone(&state.user_repository),
    )
}

/// POST /api/v1/patients/add-patient (patient)
#[instrument(name = "register_patient", skip(state, current, request), fields(user_id = %current.id))]
pub async fn register_patient(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidatedJson(request): ValidatedJson<RegisterPatientRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PatientPayload>>), AppError> {
    let patient = patient_service(&state).register(&current, request).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok("Patient registered successfully!", PatientPayload { patient }),
    ))
}

/// GET /api/v1/patients/get-all-patients (admin)
#[instrument(name = "get_all_patients", skip(state))]
pub async fn get_all_patients(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PatientsPayload>>, AppError> {
    let patients = patient_service(&state).list_patients().await?;
    info!(patient_count = patients.len(), "Patients listed successfully");

    Ok(ApiResponse::ok(
        "Patients fetched successfully!",
        PatientsPayload {
            total_patients: patients.len(),
            patients,
        },
    ))
}

/// GET /api/v1/patients/get-patient/:id (patient)
#[instrument(name = "get_patient_by_id", skip(state, current), fields(user_id = %current.id))]
pub async fn get_patient_by_id(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<PatientPayload>>, AppError> {
    let patient = patient_service(&state).get_patient(&current, &id).await?;
    Ok(ApiResponse::ok(
        "Patient fetched successfully!",
        PatientPayload { patient },
    ))
}

/// PUT /api/v1/patients/update-patient/:id (patient)
#[instrument(name = "update_patient_profile", skip(state, current, request), fields(user_id = %current.id))]
pub async fn update_patient_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdatePatientRequest>,
) -> Result<Json<ApiResponse<PatientPayload>>, AppError> {
    let patient = patient_service(&state)
        .update_patient(&current, &id, request)
        .await?;
    Ok(ApiResponse::ok(
        "Patient profile updated successfully!",
        PatientPayload { patient },
    ))
}

/// PUT /api/v1/patients/admit/:id (admin)
#[instrument(name = "admit_patient", skip(state, request))]
pub async fn admit_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<AdmitPatientRequest>,
) -> Result<Json<ApiResponse<PatientPayload>>, AppError> {
    let patient = patient_service(&state).admit(&id, request).await?;
    Ok(ApiResponse::ok(
        "Patient admitted successfully!",
        PatientPayload { patient },
    ))
}

/// PUT /api/v1/patients/discharge/:id (admin)
#[instrument(name = "discharge_patient", skip(state))]
pub async fn discharge_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<PatientPayload>>, AppError> {
    let patient = patient_service(&state).discharge(&id).await?;
    Ok(ApiResponse::ok(
        "Patient discharged successfully!",
        PatientPayload { patient },
    ))
}
