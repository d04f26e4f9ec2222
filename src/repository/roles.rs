use async_trait::async_trait;
use serde::Serialize;
use sqlx::PgPool;

use crate::auth::session::RoleLookup;
use crate::error::{AppError, ResourceError};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Role {
    pub id: i32,
    pub role_type: String,
}

#[derive(Clone)]
pub struct RoleStore {
    pool: PgPool,
}

impl RoleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Role>, AppError> {
        let role = sqlx::query_as::<_, Role>("SELECT id, role_type FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(role)
    }

    pub async fn find_by_type(&self, role_type: &str) -> Result<Option<Role>, AppError> {
        let role =
            sqlx::query_as::<_, Role>("SELECT id, role_type FROM roles WHERE role_type = $1")
                .bind(role_type)
                .fetch_optional(&self.pool)
                .await?;

        Ok(role)
    }

    pub async fn list(&self) -> Result<Vec<Role>, AppError> {
        let roles = sqlx::query_as::<_, Role>("SELECT id, role_type FROM roles ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(roles)
    }

    /// Duplicate names surface as the unique violation from
    /// `roles_role_type_key`.
    pub async fn insert(&self, role_type: &str) -> Result<Role, AppError> {
        let role = sqlx::query_as::<_, Role>(
            "INSERT INTO roles (role_type) VALUES ($1) RETURNING id, role_type",
        )
        .bind(role_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(role)
    }

    pub async fn update(&self, id: i32, role_type: &str) -> Result<Role, AppError> {
        let role = sqlx::query_as::<_, Role>(
            "UPDATE roles SET role_type = $1 WHERE id = $2 RETURNING id, role_type",
        )
        .bind(role_type)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        role.ok_or_else(|| ResourceError::RoleNotFound(id.to_string()).into())
    }

    pub async fn delete(&self, id: i32) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ResourceError::RoleNotFound(id.to_string()).into());
        }
        Ok(())
    }
}

#[async_trait]
impl RoleLookup for RoleStore {
    async fn find_by_id(&self, role_id: i32) -> Result<Option<Role>, AppError> {
        RoleStore::find_by_id(self, role_id).await
    }
}
