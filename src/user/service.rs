use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    models::{is_valid_email, Gender, NewUser, Role, UserModel},
    password::{check_length, hash_password, verify_password},
    repository::UserRepository,
    types::{
        AuthPayload, LoginRequest, RegisterRequest, ResetPasswordRequest, UpdateProfileRequest,
        UserResponse,
    },
};
use crate::session::{CurrentUser, TokenConfig};
use crate::shared::{non_blank, parse_choice, parse_id, AppError};

/// Service for account registration, login and profile management
pub struct UserService {
    repository: Arc<dyn UserRepository + Send + Sync>,
    token_config: TokenConfig,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(
        repository: Arc<dyn UserRepository + Send + Sync>,
        token_config: TokenConfig,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            repository,
            token_config,
            bcrypt_cost,
        }
    }

    /// Creates an account and issues its first session token
    #[instrument(skip(self, request))]
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthPayload, AppError> {
        let (
            Some(name),
            Some(email),
            Some(password),
            Some(phone),
            Some(gender),
            Some(dob),
            Some(role),
        ) = (
            non_blank(request.name),
            non_blank(request.email),
            request.password.filter(|p| !p.is_empty()),
            non_blank(request.phone),
            non_blank(request.gender),
            non_blank(request.dob),
            non_blank(request.role),
        )
        else {
            return Err(AppError::bad_request("All fields are required"));
        };

        check_length(&password)?;

        if !is_valid_email(&email) {
            return Err(AppError::bad_request("Invalid email format"));
        }

        let profile = NewUser {
            name,
            email,
            phone,
            gender: parse_choice::<Gender>(&gender, "gender")?,
            dob: parse_dob(&dob)?,
            role: parse_choice::<Role>(&role, "role")?,
        };

        if self.repository.find_by_email(&profile.email).await?.is_some() {
            warn!("Registration attempted with an existing email");
            return Err(AppError::bad_request("User already exists, please login"));
        }

        let password_hash = hash_password(password, self.bcrypt_cost).await?;
        let user = UserModel::new(profile, password_hash);
        self.repository.create_user(&user).await?;

        let token = self.token_config.create_token(&user.id, user.role)?;
        info!(user_id = %user.id, role = %user.role, "User registered");

        Ok(AuthPayload {
            user: user.into(),
            token,
        })
    }

    #[instrument(skip(self, request))]
    pub async fn login(&self, request: LoginRequest) -> Result<AuthPayload, AppError> {
        let (Some(email), Some(password)) = (
            non_blank(request.email),
            request.password.filter(|p| !p.is_empty()),
        ) else {
            return Err(AppError::bad_request("All fields are required"));
        };

        check_length(&password)?;

        let user = self
            .repository
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::bad_request("User does not exist, please register"))?;

        if !verify_password(password, user.password_hash.clone()).await? {
            warn!(user_id = %user.id, "Login failed: password mismatch");
            return Err(AppError::bad_request("Invalid email or password!"));
        }

        let token = self.token_config.create_token(&user.id, user.role)?;
        info!(user_id = %user.id, "User logged in");

        Ok(AuthPayload {
            user: user.into(),
            token,
        })
    }

    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<UserResponse>, AppError> {
        let users = self.repository.list_users().await?;
        debug!(user_count = users.len(), "Users listed");
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, raw_id: &str) -> Result<UserResponse, AppError> {
        let user_id = parse_id(raw_id, "User")?;
        self.repository
            .get_user(&user_id)
            .await?
            .map(UserResponse::from)
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Applies the non-blank fields of the request to the caller's own account
    #[instrument(skip(self, current, request), fields(user_id = %current.id))]
    pub async fn update_profile(
        &self,
        current: &CurrentUser,
        request: UpdateProfileRequest,
    ) -> Result<UserResponse, AppError> {
        if request.is_empty() {
            return Err(AppError::bad_request("No fields provided to update!"));
        }

        let mut user = self
            .repository
            .get_user(&current.id)
            .await?
            .ok_or_else(|| AppError::bad_request("profile not updated, try again!"))?;

        if let Some(role) = non_blank(request.role) {
            let role = parse_choice::<Role>(&role, "role")?;
            if role != user.role && !current.is_admin() {
                warn!(requested_role = %role, "Non-admin attempted to change role");
                return Err(AppError::forbidden("Only admins can change roles"));
            }
            user.role = role;
        }
        if let Some(dob) = non_blank(request.dob) {
            user.dob = parse_dob(&dob)?;
        }
        if let Some(name) = non_blank(request.name) {
            user.name = name;
        }
        if let Some(phone) = non_blank(request.phone) {
            user.phone = phone;
        }
        if let Some(address) = non_blank(request.address) {
            user.address = Some(address);
        }

        user.touch();
        self.repository.update_user(&user).await?;

        info!(user_id = %user.id, "User profile updated");
        Ok(user.into())
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, raw_id: &str) -> Result<UserResponse, AppError> {
        let user_id = parse_id(raw_id, "User")?;
        let deleted = self
            .repository
            .delete_user(&user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        info!(user_id = %user_id, "User deleted");
        Ok(deleted.into())
    }

    /// Replaces the password of the account registered under `email`
    #[instrument(skip(self, request))]
    pub async fn reset_password(
        &self,
        request: ResetPasswordRequest,
    ) -> Result<AuthPayload, AppError> {
        let (Some(email), Some(new_password)) = (
            non_blank(request.email),
            request.new_password.filter(|p| !p.is_empty()),
        ) else {
            return Err(AppError::bad_request("New Password is required"));
        };

        let mut user = self
            .repository
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::bad_request("User does not exist, please register"))?;

        check_length(&new_password)?;

        user.password_hash = hash_password(new_password, self.bcrypt_cost).await?;
        user.touch();
        self.repository.update_user(&user).await?;

        let token = self.token_config.create_token(&user.id, user.role)?;
        info!(user_id = %user.id, "Password reset");

        Ok(AuthPayload {
            user: user.into(),
            token,
        })
    }
}

fn parse_dob(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::bad_request("Invalid date of birth format (YYYY-MM-DD expected)"))
}
