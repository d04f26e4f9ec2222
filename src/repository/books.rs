use serde::Serialize;
use sqlx::PgPool;

use crate::error::{AppError, ResourceError};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Book {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct BookStore {
    pool: PgPool,
}

impl BookStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Book>, AppError> {
        let books = sqlx::query_as::<_, Book>("SELECT id, name, description FROM books ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(books)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Book>, AppError> {
        let book = sqlx::query_as::<_, Book>("SELECT id, name, description FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(book)
    }

    pub async fn insert(&self, name: &str, description: Option<&str>) -> Result<Book, AppError> {
        let book = sqlx::query_as::<_, Book>(
            "INSERT INTO books (name, description) VALUES ($1, $2) RETURNING id, name, description",
        )
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;

        Ok(book)
    }

    pub async fn update(
        &self,
        id: i64,
        name: &str,
        description: Option<&str>,
    ) -> Result<Book, AppError> {
        let book = sqlx::query_as::<_, Book>(
            "UPDATE books SET name = $1, description = $2 WHERE id = $3 \
             RETURNING id, name, description",
        )
        .bind(name)
        .bind(description)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        book.ok_or_else(|| ResourceError::BookNotFound(id).into())
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ResourceError::BookNotFound(id).into());
        }
        Ok(())
    }
}
