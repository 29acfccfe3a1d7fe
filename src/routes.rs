use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::shared::{AppError, AppState};
use crate::{appointment, doctor, patient, session, user};

/// Builds the full HTTP application over the given state
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/users", user_routes(&state))
        .nest("/doctors", doctor_routes(&state))
        .nest("/patients", patient_routes(&state))
        .nest("/appointments", appointment_routes(&state));

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api)
        .fallback(route_not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn route_not_found() -> AppError {
    AppError::not_found("Route not found")
}

/// Puts every route of `router` behind the session cookie check
fn authenticated(state: &AppState, router: Router<AppState>) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(
        state.clone(),
        session::jwt_auth,
    ))
}

fn user_routes(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/register", post(user::register_user))
        .route("/login", post(user::login_user))
        .route("/reset-password", put(user::reset_password));

    let admin = Router::new()
        .route("/get-all-users", get(user::get_all_users))
        .route("/delete-user/:id", delete(user::delete_user))
        .route_layer(middleware::from_fn(session::require_admin));

    let signed_in = Router::new()
        .route("/logout", post(user::logout_user))
        .route("/get-user/:id", get(user::get_user_by_id))
        .route("/update-user-profile", put(user::update_user_profile))
        .merge(admin);

    authenticated(state, signed_in).merge(public)
}

fn doctor_routes(state: &AppState) -> Router<AppState> {
    let doctors_only = Router::new()
        .route("/create-doctor-profile", post(doctor::create_doctor_profile))
        .route("/doctor-profile/:doctorId", get(doctor::get_doctor_profile))
        .route("/update-profile/:doctorId", put(doctor::update_doctor_profile))
        .route("/slots/add", post(doctor::add_available_slot))
        .route(
            "/slots/remove/:slotId",
            delete(doctor::remove_available_slot),
        )
        .route_layer(middleware::from_fn(session::require_doctor));

    let admin = Router::new()
        .route("/all-doctors", get(doctor::get_all_doctors))
        .route(
            "/delete-profile/:doctorId",
            delete(doctor::delete_doctor_profile),
        )
        .route_layer(middleware::from_fn(session::require_admin));

    let signed_in = Router::new()
        .route("/slots/:doctorId", get(doctor::get_available_slots))
        .merge(doctors_only)
        .merge(admin);

    authenticated(state, signed_in)
}

fn patient_routes(state: &AppState) -> Router<AppState> {
    let patients_only = Router::new()
        .route("/add-patient", post(patient::register_patient))
        .route("/get-patient/:id", get(patient::get_patient_by_id))
        .route("/update-patient/:id", put(patient::update_patient_profile))
        .route_layer(middleware::from_fn(session::require_patient));

    let admin = Router::new()
        .route("/get-all-patients", get(patient::get_all_patients))
        .route("/admit/:id", put(patient::admit_patient))
        .route("/discharge/:id", put(patient::discharge_patient))
        .route_layer(middleware::from_fn(session::require_admin));

    authenticated(state, patients_only.merge(admin))
}

fn appointment_routes(state: &AppState) -> Router<AppState> {
    let patients_only = Router::new()
        .route("/book-appointment", post(appointment::book_appointment))
        .route("/appointment/:id", get(appointment::get_appointment_by_id))
        .route("/my-appointments", get(appointment::get_my_appointments))
        .route(
            "/update-appointment/:id",
            put(appointment::update_appointment),
        )
        .route(
            "/delete-appointment/:id",
            delete(appointment::delete_appointment),
        )
        .route_layer(middleware::from_fn(session::require_patient));

    let doctors_only = Router::new()
        .route(
            "/booked-appointments",
            get(appointment::get_booked_appointments),
        )
        .route_layer(middleware::from_fn(session::require_doctor));

    authenticated(state, patients_only.merge(doctors_only))
}
