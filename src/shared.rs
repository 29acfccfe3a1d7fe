use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use strum::IntoEnumIterator;
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

use crate::appointment::repository::{AppointmentRepository, InMemoryAppointmentRepository};
use crate::config::AppConfig;
use crate::doctor::repository::{DoctorRepository, InMemoryDoctorRepository};
use crate::patient::repository::{InMemoryPatientRepository, PatientRepository};
use crate::session::{CookieConfig, TokenConfig};
use crate::user::repository::{InMemoryUserRepository, UserRepository};

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub user_repository: Arc<dyn UserRepository + Send + Sync>,
    pub doctor_repository: Arc<dyn DoctorRepository + Send + Sync>,
    pub patient_repository: Arc<dyn PatientRepository + Send + Sync>,
    pub appointment_repository: Arc<dyn AppointmentRepository + Send + Sync>,
    pub token_config: TokenConfig,
    pub cookie_config: CookieConfig,
    pub bcrypt_cost: u32,
}

impl AppState {
    pub fn new(
        config: &AppConfig,
        user_repository: Arc<dyn UserRepository + Send + Sync>,
        doctor_repository: Arc<dyn DoctorRepository + Send + Sync>,
        patient_repository: Arc<dyn PatientRepository + Send + Sync>,
        appointment_repository: Arc<dyn AppointmentRepository + Send + Sync>,
    ) -> Self {
        Self {
            user_repository,
            doctor_repository,
            patient_repository,
            appointment_repository,
            token_config: TokenConfig::new(&config.jwt_secret, config.session_expiration_days),
            cookie_config: CookieConfig::new(config.session_expiration_days, config.secure_cookies),
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    /// State backed entirely by in-memory repositories (development and tests)
    pub fn in_memory(config: &AppConfig) -> Self {
        Self::new(
            config,
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemoryDoctorRepository::new()),
            Arc::new(InMemoryPatientRepository::new()),
            Arc::new(InMemoryAppointmentRepository::new()),
        )
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::DatabaseError(msg) => {
                error!(error = %msg, "Database failure while serving request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::JwtError(msg) => {
                error!(error = %msg, "Token failure while serving request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "success": false,
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Success envelope: `{ "success": true, "message": ..., <payload keys> }`
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            data,
        })
    }
}

/// Payload for envelopes that carry nothing but the message
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct NoData {}

/// Validates a path identifier and returns it in canonical form
pub fn parse_id(raw: &str, entity: &str) -> Result<String, AppError> {
    Uuid::parse_str(raw.trim())
        .map(|id| id.to_string())
        .map_err(|_| AppError::BadRequest(format!("Invalid {} ID format", entity)))
}

/// Parses a closed-set field such as a role or blood group
pub fn parse_choice<E>(raw: &str, field: &str) -> Result<E, AppError>
where
    E: FromStr + IntoEnumIterator + Display,
{
    E::from_str(raw.trim()).map_err(|_| {
        let allowed: Vec<String> = E::iter().map(|choice| choice.to_string()).collect();
        AppError::BadRequest(format!(
            "Invalid {}, expected one of: {}",
            field,
            allowed.join(", ")
        ))
    })
}

/// Treats empty and whitespace-only strings as absent
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// JSON body extractor whose rejections use the API's error envelope
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidatedJson(value)),
            Err(rejection) => {
                warn!(error = %rejection.body_text(), "Rejected request body");
                Err(AppError::BadRequest(
                    "All fields are required and must be valid!".to_string(),
                ))
            }
        }
    }
}
