/// Book Routes
///
/// Plain CRUD over the books table. Every route here sits inside the
/// authenticated scope; any active user may read and write books.

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::error::{AppError, ErrorContext, ResourceError};
use crate::repository::books::BookStore;
use crate::validators::is_valid_name;

#[derive(Deserialize)]
pub struct BookPayload {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// GET /books
pub async fn list_books(books: web::Data<BookStore>) -> Result<HttpResponse, AppError> {
    let all = books.list().await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "books": all })))
}

/// POST /books
///
/// # Errors
/// - 400: Empty or oversized name
/// - 500: Internal server error
pub async fn create_book(
    form: web::Json<BookPayload>,
    books: web::Data<BookStore>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("book_create");

    let name = is_valid_name("name", &form.name)?;
    let book = books.insert(&name, form.description.as_deref()).await?;

    tracing::info!(
        request_id = %context.request_id,
        book_id = book.id,
        "Book created"
    );

    Ok(HttpResponse::Created().json(serde_json::json!({ "book_id": book.id })))
}

/// GET /books/{id}
///
/// # Errors
/// - 404: No book with this id
pub async fn get_book(
    path: web::Path<i64>,
    books: web::Data<BookStore>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let book = books
        .find_by_id(id)
        .await?
        .ok_or(ResourceError::BookNotFound(id))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "book": book })))
}

/// PUT /books/{id}
///
/// # Errors
/// - 400: Empty or oversized name
/// - 404: No book with this id
pub async fn update_book(
    path: web::Path<i64>,
    form: web::Json<BookPayload>,
    books: web::Data<BookStore>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("book_update");
    let id = path.into_inner();

    let name = is_valid_name("name", &form.name)?;
    let book = books.update(id, &name, form.description.as_deref()).await?;

    tracing::info!(
        request_id = %context.request_id,
        book_id = book.id,
        "Book updated"
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({ "book": book })))
}

/// DELETE /books/{id}
///
/// # Errors
/// - 404: No book with this id
pub async fn delete_book(
    path: web::Path<i64>,
    books: web::Data<BookStore>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("book_delete");
    let id = path.into_inner();

    books.delete(id).await?;

    tracing::info!(request_id = %context.request_id, book_id = id, "Book deleted");

    Ok(HttpResponse::NoContent().finish())
}
