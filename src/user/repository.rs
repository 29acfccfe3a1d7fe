use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::models::{normalize_email, UserModel};
use crate::database::db_error;
use crate::shared::AppError;

/// Trait for user repository operations
#[async_trait]
pub trait UserRepository {
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError>;
    async fn get_user(&self, user_id: &str) -> Result<Option<UserModel>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError>;
    async fn list_users(&self) -> Result<Vec<UserModel>, AppError>;
    async fn update_user(&self, user: &UserModel) -> Result<(), AppError>;
    /// Removes the user and returns the deleted document, if it existed
    async fn delete_user(&self, user_id: &str) -> Result<Option<UserModel>, AppError>;
}

/// In-memory implementation of UserRepository for development and testing
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, UserModel>>,
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Creates an in-memory repository with pre-populated users
    pub fn with_users(users: Vec<UserModel>) -> Self {
        let user_map = users
            .into_iter()
            .map(|user| (user.id.clone(), user))
            .collect();

        Self {
            users: RwLock::new(user_map),
        }
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self, user))]
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError> {
        debug!(user_id = %user.id, "Creating user in memory");

        let mut users = self.users.write().await;
        if users.contains_key(&user.id) || users.values().any(|u| u.email == user.email) {
            warn!(user_id = %user.id, "User already exists in memory");
            return Err(AppError::DatabaseError("User already exists".to_string()));
        }
        users.insert(user.id.clone(), user.clone());

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_user(&self, user_id: &str) -> Result<Option<UserModel>, AppError> {
        debug!(user_id = %user_id, "Fetching user from memory");
        Ok(self.users.read().await.get(user_id).cloned())
    }

    #[instrument(skip(self, email))]
    async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError> {
        let email = normalize_email(email);
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<UserModel>, AppError> {
        let mut users: Vec<UserModel> = self.users.read().await.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    #[instrument(skip(self, user))]
    async fn update_user(&self, user: &UserModel) -> Result<(), AppError> {
        debug!(user_id = %user.id, "Updating user in memory");

        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            warn!(user_id = %user.id, "User not found for update in memory");
            return Err(AppError::NotFound("User not found".to_string()));
        }
        users.insert(user.id.clone(), user.clone());

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, user_id: &str) -> Result<Option<UserModel>, AppError> {
        debug!(user_id = %user_id, "Deleting user from memory");
        Ok(self.users.write().await.remove(user_id))
    }
}

/// PostgreSQL implementation; users are JSONB documents in the `users` table
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip(self, user))]
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError> {
        debug!(user_id = %user.id, "Creating user in database");

        sqlx::query("INSERT INTO users (id, doc, created_at) VALUES ($1, $2, $3)")
            .bind(&user.id)
            .bind(Json(user))
            .bind(user.created_at)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to create user in database"))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_user(&self, user_id: &str) -> Result<Option<UserModel>, AppError> {
        let row: Option<(Json<UserModel>,)> = sqlx::query_as("SELECT doc FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to fetch user from database"))?;

        Ok(row.map(|(Json(user),)| user))
    }

    #[instrument(skip(self, email))]
    async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError> {
        let row: Option<(Json<UserModel>,)> =
            sqlx::query_as("SELECT doc FROM users WHERE doc->>'email' = $1")
                .bind(normalize_email(email))
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("Failed to look up user by email"))?;

        Ok(row.map(|(Json(user),)| user))
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<UserModel>, AppError> {
        let rows: Vec<(Json<UserModel>,)> =
            sqlx::query_as("SELECT doc FROM users ORDER BY created_at")
                .fetch_all(&self.pool)
                .await
                .map_err(db_error("Failed to list users"))?;

        Ok(rows.into_iter().map(|(Json(user),)| user).collect())
    }

    #[instrument(skip(self, user))]
    async fn update_user(&self, user: &UserModel) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET doc = $2 WHERE id = $1")
            .bind(&user.id)
            .bind(Json(user))
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to update user in database"))?;

        if result.rows_affected() == 0 {
            warn!(user_id = %user.id, "User not found for update");
            return Err(AppError::NotFound("User not found".to_string()));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, user_id: &str) -> Result<Option<UserModel>, AppError> {
        let row: Option<(Json<UserModel>,)> =
            sqlx::query_as("DELETE FROM users WHERE id = $1 RETURNING doc")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("Failed to delete user from database"))?;

        Ok(row.map(|(Json(user),)| user))
    }
}
