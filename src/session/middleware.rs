use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, instrument, warn};

use super::{cookie::SESSION_COOKIE, types::CurrentUser};
use crate::shared::{AppError, AppState};
use crate::user::models::Role;

const FORBIDDEN_MESSAGE: &str = "Forbidden, you do not have permission to access this resource!";
const DOCTORS_ONLY_MESSAGE: &str = "Forbidden, Access denied. Only doctors are allowed!";

/// JWT authentication middleware - validates the session cookie and adds CurrentUser to request.
/// Usage: .route_layer(middleware::from_fn_with_state(app_state.clone(), session::jwt_auth))
/// Handlers can then extract `current: CurrentUser`.
#[instrument(skip(state, req, next))]
pub async fn jwt_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    debug!(uri = %req.uri(), "JWT authentication middleware triggered");

    let jar = CookieJar::from_headers(req.headers());
    let token = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            warn!("Missing session cookie in request");
            AppError::Unauthorized("Unauthorized, token not found!".to_string())
        })?;

    let claims = match state.token_config.validate_token(&token) {
        Ok(claims) => claims,
        Err(e) => {
            warn!("JWT authentication failed: {}", e);
            return Err(e);
        }
    };

    // The account may have been deleted since the token was issued
    let user = state
        .user_repository
        .get_user(&claims.sub)
        .await?
        .ok_or_else(|| {
            warn!(user_id = %claims.sub, "Session refers to a missing user");
            AppError::Unauthorized("Unauthorized, user not found!".to_string())
        })?;

    debug!(user_id = %user.id, role = %user.role, "Authentication successful");

    req.extensions_mut().insert(CurrentUser::from(&user));

    Ok(next.run(req).await)
}

pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    require_role(req, next, Role::Admin, FORBIDDEN_MESSAGE).await
}

pub async fn require_doctor(req: Request, next: Next) -> Result<Response, AppError> {
    require_role(req, next, Role::Doctor, DOCTORS_ONLY_MESSAGE).await
}

pub async fn require_patient(req: Request, next: Next) -> Result<Response, AppError> {
    require_role(req, next, Role::Patient, FORBIDDEN_MESSAGE).await
}

/// Role gate; must run after `jwt_auth`
async fn require_role(
    req: Request,
    next: Next,
    role: Role,
    message: &str,
) -> Result<Response, AppError> {
    let allowed = req
        .extensions()
        .get::<CurrentUser>()
        .is_some_and(|user| user.role == role);

    if !allowed {
        warn!(required_role = %role, uri = %req.uri(), "Role gate rejected request");
        return Err(AppError::Forbidden(message.to_string()));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_utils::{body_json, empty_request, AppStateBuilder};
    use crate::user::repository::{tests::create_test_user, InMemoryUserRepository};
    use axum::{http::StatusCode, middleware, routing::get, Router};
    use std::sync::Arc;
    use tower::ServiceExt; // for `oneshot`

    async fn whoami(current: CurrentUser) -> String {
        current.email
    }

    fn app(state: AppState) -> Router {
        let admin = Router::new()
            .route("/admin", get(whoami))
            .route_layer(middleware::from_fn(require_admin));
        let doctor = Router::new()
            .route("/doctor", get(whoami))
            .route_layer(middleware::from_fn(require_doctor));

        Router::new()
            .route("/me", get(whoami))
            .merge(admin)
            .merge(doctor)
            .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth))
            .with_state(state)
    }

    fn setup(role: Role) -> (AppState, String) {
        let user = create_test_user("session@example.com", role);
        let state = AppStateBuilder::new()
            .with_user_repository(Arc::new(InMemoryUserRepository::with_users(vec![
                user.clone()
            ])))
            .build();
        let token = state.token_config.create_token(&user.id, role).unwrap();
        (state, token)
    }

    #[tokio::test]
    async fn test_missing_cookie_is_unauthorized() {
        let (state, _) = setup(Role::Patient);

        let response = app(state)
            .oneshot(empty_request("GET", "/me", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Unauthorized, token not found!");
    }

    #[tokio::test]
    async fn test_garbage_token_is_unauthorized() {
        let (state, _) = setup(Role::Patient);

        let response = app(state)
            .oneshot(empty_request("GET", "/me", Some("not-a-jwt")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_cookie_resolves_current_user() {
        let (state, token) = setup(Role::Patient);

        let response = app(state)
            .oneshot(empty_request("GET", "/me", Some(&token)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"session@example.com");
    }

    #[tokio::test]
    async fn test_deleted_user_is_unauthorized() {
        let (state, token) = setup(Role::Patient);
        let claims = state.token_config.validate_token(&token).unwrap();
        state.user_repository.delete_user(&claims.sub).await.unwrap();

        let response = app(state)
            .oneshot(empty_request("GET", "/me", Some(&token)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Unauthorized, user not found!");
    }

    #[tokio::test]
    async fn test_role_gate_rejects_other_roles() {
        let (state, token) = setup(Role::Patient);

        let response = app(state.clone())
            .oneshot(empty_request("GET", "/admin", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_json(response).await;
        assert_eq!(body["message"], FORBIDDEN_MESSAGE);

        let response = app(state)
            .oneshot(empty_request("GET", "/doctor", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_json(response).await;
        assert_eq!(body["message"], DOCTORS_ONLY_MESSAGE);
    }

    #[tokio::test]
    async fn test_role_gate_admits_matching_role() {
        let (state, token) = setup(Role::Admin);

        let response = app(state)
            .oneshot(empty_request("GET", "/admin", Some(&token)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_role_is_read_from_stored_user_not_token() {
        // A token minted with an elevated role must not outrank the stored account
        let (state, _) = setup(Role::Patient);
        let user = state
            .user_repository
            .find_by_email("session@example.com")
            .await
            .unwrap()
            .unwrap();
        let forged = state.token_config.create_token(&user.id, Role::Admin).unwrap();

        let response = app(state)
            .oneshot(empty_request("GET", "/admin", Some(&forged)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
