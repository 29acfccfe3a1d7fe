use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::instrument;

use super::{
    service::AppointmentService,
    types::{
        AppointmentPayload, AppointmentsPayload, BookAppointmentRequest, UpdateAppointmentRequest,
    },
};
use crate::schedule::local_now;
use crate::session::CurrentUser;
use crate::shared::{ApiResponse, AppError, AppState, NoData, ValidatedJson};

fn appointment_service(state: &AppState) -> AppointmentService {
    AppointmentService::new(
        Arc::clone(&state.appointment_repository),
        Arc::clone(&state.patient_repository),
        Arc::clone(&state.doctor_repository),
    )
}

/// POST /api/v1/appointments/book-appointment (patient)
#[instrument(name = "book_appointment", skip(state, current, request), fields(user_id = %current.id))]
pub async fn book_appointment(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidatedJson(request): ValidatedJson<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AppointmentPayload>>), AppError> {
    let appointment = appointment_service(&state)
        .book(&current, request, local_now())
        .await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(
            "Appointment booked successfully",
            AppointmentPayload { appointment },
        ),
    ))
}

/// GET /api/v1/appointments/appointment/:id (patient)
#[instrument(name = "get_appointment_by_id", skip(state, current), fields(user_id = %current.id))]
pub async fn get_appointment_by_id(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<AppointmentPayload>>, AppError> {
    let appointment = appointment_service(&state)
        .get_appointment(&current, &id)
        .await?;
    Ok(ApiResponse::ok(
        "Appointment fetched successfully",
        AppointmentPayload { appointment },
    ))
}

/// GET /api/v1/appointments/my-appointments (patient)
#[instrument(name = "get_my_appointments", skip(state, current), fields(user_id = %current.id))]
pub async fn get_my_appointments(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<ApiResponse<AppointmentsPayload>>, AppError> {
    let appointments = appointment_service(&state)
        .patient_appointments(&current)
        .await?;
    Ok(ApiResponse::ok(
        "Appointments fetched successfully",
        AppointmentsPayload {
            total: appointments.len(),
            appointments,
        },
    ))
}

/// GET /api/v1/appointments/booked-appointments (doctor)
#[instrument(name = "get_booked_appointments", skip(state, current), fields(user_id = %current.id))]
pub async fn get_booked_appointments(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<ApiResponse<AppointmentsPayload>>, AppError> {
    let appointments = appointment_service(&state)
        .doctor_appointments(&current)
        .await?;
    Ok(ApiResponse::ok(
        "Appointments fetched successfully",
        AppointmentsPayload {
            total: appointments.len(),
            appointments,
        },
    ))
}

/// PUT /api/v1/appointments/update-appointment/:id (patient)
#[instrument(name = "update_appointment", skip(state, current, request), fields(user_id = %current.id))]
pub async fn update_appointment(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateAppointmentRequest>,
) -> Result<Json<ApiResponse<AppointmentPayload>>, AppError> {
    let appointment = appointment_service(&state)
        .reschedule(&current, &id, request, local_now())
        .await?;
    Ok(ApiResponse::ok(
        "Appointment updated successfully",
        AppointmentPayload { appointment },
    ))
}

/// DELETE /api/v1/appointments/delete-appointment/:id (patient)
#[instrument(name = "delete_appointment", skip(state, current), fields(user_id = %current.id))]
pub async fn delete_appointment(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<NoData>>, AppError> {
    appointment_service(&state)
        .delete_appointment(&current, &id)
        .await?;
    Ok(ApiResponse::ok(
        "Appointment deleted successfully",
        NoData::default(),
    ))
}

#[cfg(test)]
mod tests {
    use crate::doctor::repository::{tests::create_test_doctor, InMemoryDoctorRepository};
    use crate::patient::repository::{tests::create_test_patient, InMemoryPatientRepository};
    use crate::routes::build_router;
    use crate::shared::test_utils::{body_json, empty_request, json_request, AppStateBuilder};
    use crate::shared::AppState;
    use crate::user::models::Role;
    use crate::user::repository::{tests::create_test_user, InMemoryUserRepository};
    use axum::http::StatusCode;
    use chrono::{Duration, Local};
    use serde_json::json;
    use std::sync::Arc;
    use tower::ServiceExt; // for `oneshot`

    struct Setup {
        state: AppState,
        patient_token: String,
        doctor_token: String,
    }

    fn setup() -> Setup {
        let doctor_user = create_test_user("doc@example.com", Role::Doctor);
        let patient_user = create_test_user("pat@example.com", Role::Patient);
        let doctor = create_test_doctor(&doctor_user.id);
        let patient = create_test_patient(&patient_user.id, Some(&doctor.id));

        let state = AppStateBuilder::new()
            .with_user_repository(Arc::new(InMemoryUserRepository::with_users(vec![
                doctor_user.clone(),
                patient_user.clone(),
            ])))
            .with_doctor_repository(Arc::new(InMemoryDoctorRepository::with_doctors(vec![
                doctor,
            ])))
            .with_patient_repository(Arc::new(InMemoryPatientRepository::with_patients(vec![
                patient,
            ])))
            .build();

        let patient_token = state
            .token_config
            .create_token(&patient_user.id, Role::Patient)
            .unwrap();
        let doctor_token = state
            .token_config
            .create_token(&doctor_user.id, Role::Doctor)
            .unwrap();

        Setup {
            state,
            patient_token,
            doctor_token,
        }
    }

    fn tomorrow() -> (String, String) {
        let at = Local::now().naive_local() + Duration::days(1);
        (at.format("%Y-%m-%d").to_string(), "10:00".to_string())
    }

    #[tokio::test]
    async fn test_book_and_list_from_both_sides() {
        let s = setup();
        let app = build_router(s.state);
        let (date, time) = tomorrow();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/appointments/book-appointment",
                Some(&s.patient_token),
                json!({ "date": date, "time": time, "symptoms": "Chest pain" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["appointment"]["status"], "pending");

        let response = app
            .clone()
            .oneshot(empty_request(
                "GET",
                "/api/v1/appointments/my-appointments",
                Some(&s.patient_token),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["appointments"][0]["doctor"]["department"], "Cardiology");

        let response = app
            .oneshot(empty_request(
                "GET",
                "/api/v1/appointments/booked-appointments",
                Some(&s.doctor_token),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["appointments"][0]["symptoms"], "Chest pain");
    }

    #[tokio::test]
    async fn test_booking_in_the_past_is_rejected() {
        let s = setup();
        let app = build_router(s.state);

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/v1/appointments/book-appointment",
                Some(&s.patient_token),
                json!({ "date": "2001-01-01", "time": "10:00", "symptoms": "Cough" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Appointment date/time must be in the future");
    }

    #[tokio::test]
    async fn test_doctor_cannot_book() {
        let s = setup();
        let app = build_router(s.state);
        let (date, time) = tomorrow();

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/v1/appointments/book-appointment",
                Some(&s.doctor_token),
                json!({ "date": date, "time": time, "symptoms": "None" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_delete_appointment() {
        let s = setup();
        let app = build_router(s.state);
        let (date, time) = tomorrow();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/appointments/book-appointment",
                Some(&s.patient_token),
                json!({ "date": date, "time": time, "symptoms": "Rash" }),
            ))
            .await
            .unwrap();
        let id = body_json(response).await["appointment"]["id"]
            .as_str()
            .unwrap()
            .to_string();
        let uri = format!("/api/v1/appointments/delete-appointment/{}", id);

        let response = app
            .clone()
            .oneshot(empty_request("DELETE", &uri, Some(&s.patient_token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Appointment deleted successfully");

        let response = app
            .oneshot(empty_request("DELETE", &uri, Some(&s.patient_token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
