use tracing::error;

use crate::shared::AppError;

pub const MIN_PASSWORD_LENGTH: usize = 6;

pub fn check_length(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::bad_request(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Hashes on the blocking pool; bcrypt is deliberately slow
pub async fn hash_password(password: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| {
            error!(error = %e, "Password hashing task failed");
            AppError::Internal
        })?
        .map_err(|e| {
            error!(error = %e, "Failed to hash password");
            AppError::Internal
        })
}

pub async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| {
            error!(error = %e, "Password verification task failed");
            AppError::Internal
        })?
        .map_err(|e| {
            error!(error = %e, "Failed to verify password");
            AppError::Internal
        })
}
