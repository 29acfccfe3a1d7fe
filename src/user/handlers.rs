use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    service::UserService,
    types::{
        AuthPayload, LoginRequest, RegisterRequest, ResetPasswordRequest, UpdateProfileRequest,
        UserPayload, UsersPayload,
    },
};
use crate::session::CurrentUser;
use crate::shared::{ApiResponse, AppError, AppState, NoData, ValidatedJson};

fn user_service(state: &AppState) -> UserService {
    UserService::new(
        Arc::clone(&state.user_repository),
        state.token_config.clone(),
        state.bcrypt_cost,
    )
}

/// POST /api/v1/users/register
#[instrument(name = "register_user", skip(state, jar, request))]
pub async fn register_user(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<ApiResponse<AuthPayload>>), AppError> {
    let payload = user_service(&state).register(request).await?;
    let jar = jar.add(state.cookie_config.session_cookie(payload.token.clone()));

    Ok((
        StatusCode::CREATED,
        jar,
        ApiResponse::ok("User registered successfully!", payload),
    ))
}

/// POST /api/v1/users/login
#[instrument(name = "login_user", skip(state, jar, request))]
pub async fn login_user(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<AuthPayload>>), AppError> {
    let payload = user_service(&state).login(request).await?;
    let jar = jar.add(state.cookie_config.session_cookie(payload.token.clone()));

    Ok((jar, ApiResponse::ok("User logged in successfully!", payload)))
}

/// POST /api/v1/users/logout
#[instrument(name = "logout_user", skip(state, jar, current), fields(user_id = %current.id))]
pub async fn logout_user(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<NoData>>) {
    info!("User logged out");
    let jar = jar.remove(state.cookie_config.removal_cookie());

    (
        jar,
        ApiResponse::ok("User logged out successfully", NoData::default()),
    )
}

/// GET /api/v1/users/get-user/:id
#[instrument(name = "get_user_by_id", skip(state))]
pub async fn get_user_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserPayload>>, AppError> {
    let user = user_service(&state).get_user(&id).await?;
    Ok(ApiResponse::ok("User fetched successfully", UserPayload { user }))
}

/// PUT /api/v1/users/update-user-profile
#[instrument(name = "update_user_profile", skip(state, current, request), fields(user_id = %current.id))]
pub async fn update_user_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidatedJson(request): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserPayload>>, AppError> {
    let user = user_service(&state)
        .update_profile(&current, request)
        .await?;
    Ok(ApiResponse::ok("User updated successfully!", UserPayload { user }))
}

/// GET /api/v1/users/get-all-users (admin)
#[instrument(name = "get_all_users", skip(state))]
pub async fn get_all_users(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<UsersPayload>>, AppError> {
    let users = user_service(&state).list_users().await?;
    info!(user_count = users.len(), "Users listed successfully");
    Ok(ApiResponse::ok("Users fetched successfully", UsersPayload { users }))
}

/// DELETE /api/v1/users/delete-user/:id (admin)
#[instrument(name = "delete_user", skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserPayload>>, AppError> {
    let user = user_service(&state).delete_user(&id).await?;
    Ok(ApiResponse::ok("User deleted successfully", UserPayload { user }))
}

/// PUT /api/v1/users/reset-password
#[instrument(name = "reset_password", skip(state, request))]
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<AuthPayload>>, AppError> {
    let payload = user_service(&state).reset_password(request).await?;
    Ok(ApiResponse::ok("Password reset successful!", payload))
}
