use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    service::DoctorService,
    types::{
        AddSlotRequest, CreateDoctorRequest, DoctorPayload, DoctorsPayload, SlotPayload,
        SlotsPayload, UpdateDoctorRequest,
    },
};
use crate::session::CurrentUser;
use crate::shared::{ApiResponse, AppError, AppState, ValidatedJson};

fn doctor_service(state: &AppState) -> DoctorService {
    DoctorService::new(
        Arc::clone(&state.doctor_repository),
        Arc::clone(&state.user_repository),
    )
}

/// POST /api/v1/doctors/create-doctor-profile (doctor)
#[instrument(name = "create_doctor_profile", skip(state, current, request), fields(user_id = %current.id))]
pub async fn create_doctor_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidatedJson(request): ValidatedJson<CreateDoctorRequest>,
) -> Result<(StatusCode, Json<ApiResponse<DoctorPayload>>), AppError> {
    let doctor = doctor_service(&state)
        .create_profile(&current, request)
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(
            "Doctor profile created successfully!",
            DoctorPayload { doctor },
        ),
    ))
}

/// GET /api/v1/doctors/all-doctors (admin)
#[instrument(name = "get_all_doctors", skip(state))]
pub async fn get_all_doctors(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DoctorsPayload>>, AppError> {
    let doctors = doctor_service(&state).list_doctors().await?;
    info!(doctor_count = doctors.len(), "Doctors listed successfully");

    Ok(ApiResponse::ok(
        "Doctors fetched successfully!",
        DoctorsPayload {
            count: doctors.len(),
            doctors,
        },
    ))
}

/// GET /api/v1/doctors/doctor-profile/:doctorId (doctor)
#[instrument(name = "get_doctor_profile", skip(state, current), fields(user_id = %current.id))]
pub async fn get_doctor_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(doctor_id): Path<String>,
) -> Result<Json<ApiResponse<DoctorPayload>>, AppError> {
    let doctor = doctor_service(&state)
        .get_profile(&current, &doctor_id)
        .await?;
    Ok(ApiResponse::ok(
        "Doctor profile fetched successfully!",
        DoctorPayload { doctor },
    ))
}

/// PUT /api/v1/doctors/update-profile/:doctorId (doctor)
#[instrument(name = "update_doctor_profile", skip(state, current, request), fields(user_id = %current.id))]
pub async fn update_doctor_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(doctor_id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateDoctorRequest>,
) -> Result<Json<ApiResponse<DoctorPayload>>, AppError> {
    let doctor = doctor_service(&state)
        .update_profile(&current, &doctor_id, request)
        .await?;
    Ok(ApiResponse::ok(
        "Doctor profile updated successfully!",
        DoctorPayload { doctor },
    ))
}

/// DELETE /api/v1/doctors/delete-profile/:doctorId (admin)
#[instrument(name = "delete_doctor_profile", skip(state))]
pub async fn delete_doctor_profile(
    State(state): State<AppState>,
    Path(doctor_id): Path<String>,
) -> Result<Json<ApiResponse<DoctorPayload>>, AppError> {
    let doctor = doctor_service(&state).delete_profile(&doctor_id).await?;
    Ok(ApiResponse::ok(
        "Doctor profile deleted successfully!",
        DoctorPayload { doctor },
    ))
}

/// POST /api/v1/doctors/slots/add (doctor)
#[instrument(name = "add_available_slot", skip(state, current, request), fields(user_id = %current.id))]
pub async fn add_available_slot(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidatedJson(request): ValidatedJson<AddSlotRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SlotPayload>>), AppError> {
    let slot = doctor_service(&state).add_slot(&current, request).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok("Slot added successfully!", SlotPayload { slot }),
    ))
}

/// DELETE /api/v1/doctors/slots/remove/:slotId (doctor)
#[instrument(name = "remove_available_slot", skip(state, current), fields(user_id = %current.id))]
pub async fn remove_available_slot(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(slot_id): Path<String>,
) -> Result<Json<ApiResponse<DoctorPayload>>, AppError> {
    let doctor = doctor_service(&state)
        .remove_slot(&current, &slot_id)
        .await?;
    Ok(ApiResponse::ok(
        "Slot removed successfully!",
        DoctorPayload { doctor },
    ))
}

/// GET /api/v1/doctors/slots/:doctorId
#[instrument(name = "get_available_slots", skip(state))]
pub async fn get_available_slots(
    State(state): State<AppState>,
    Path(doctor_id): Path<String>,
) -> Result<Json<ApiResponse<SlotsPayload>>, AppError> {
    let slots = doctor_service(&state).available_slots(&doctor_id).await?;
    Ok(ApiResponse::ok(
        "Available slots fetched successfully!",
        SlotsPayload { slots },
    ))
}
