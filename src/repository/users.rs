use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::auth::session::UserLookup;
use crate::error::{AppError, ResourceError};

/// A user row. Never serialized directly; responses go through the
/// profile shapes in the route layer so `password_hash` cannot leak.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub is_active: bool,
    pub role_id: i32,
    pub created_at: DateTime<Utc>,
}

/// Insert payload; the caller has already validated and hashed.
#[derive(Debug)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub role_id: i32,
}

const USER_COLUMNS: &str =
    "id, email, password_hash, first_name, last_name, phone_number, is_active, role_id, created_at";

#[derive(Clone)]
pub struct UserStore {
    pool: PgPool,
}

impl UserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new user. A duplicate email surfaces as the unique
    /// constraint violation from `users_email_key`.
    pub async fn insert(&self, new_user: &NewUser) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password_hash, first_name, last_name, phone_number, role_id) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.phone_number)
        .bind(new_user.role_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Reassign a user's role. The target not existing is a resource
    /// error here, not an authentication one; this is an admin operation
    /// acting on somebody else.
    pub async fn update_role(&self, user_id: i64, role_id: i32) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET role_id = $1 WHERE id = $2 RETURNING {USER_COLUMNS}"
        ))
        .bind(role_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        user.ok_or_else(|| ResourceError::UserNotFound(user_id).into())
    }

    pub async fn update_password(&self, user_id: i64, password_hash: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ResourceError::UserNotFound(user_id).into());
        }
        Ok(())
    }

    pub async fn delete(&self, user_id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ResourceError::UserNotFound(user_id).into());
        }
        Ok(())
    }
}

#[async_trait]
impl UserLookup for UserStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        UserStore::find_by_id(self, id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        UserStore::find_by_email(self, email).await
    }
}
