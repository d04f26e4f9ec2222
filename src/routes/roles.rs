/// Role Routes
///
/// CRUD over the roles table, admin only. Deleting a role that users
/// still reference fails on the foreign key and surfaces as a database
/// error; reassign those users first.

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::auth::roles::{require_role, CurrentUser};
use crate::error::{AppError, ErrorContext};
use crate::repository::roles::RoleStore;
use crate::validators::is_valid_name;

#[derive(Deserialize)]
pub struct RolePayload {
    pub role_type: String,
}

/// GET /roles
///
/// # Errors
/// - 403: Caller is not an admin
pub async fn list_roles(
    current_user: web::ReqData<CurrentUser>,
    roles: web::Data<RoleStore>,
) -> Result<HttpResponse, AppError> {
    require_role(current_user.into_inner(), "admin")?;

    let all = roles.list().await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "roles": all })))
}

/// POST /roles
///
/// # Errors
/// - 400: Empty or oversized role name
/// - 403: Caller is not an admin
/// - 409: Role name already exists
pub async fn create_role(
    current_user: web::ReqData<CurrentUser>,
    form: web::Json<RolePayload>,
    roles: web::Data<RoleStore>,
) -> Result<HttpResponse, AppError> {
    require_role(current_user.into_inner(), "admin")?;
    let context = ErrorContext::new("role_create");

    let role_type = is_valid_name("role_type", &form.role_type)?;
    let role = roles.insert(&role_type).await?;

    tracing::info!(
        request_id = %context.request_id,
        role_id = role.id,
        role = %role.role_type,
        "Role created"
    );

    Ok(HttpResponse::Created().json(role))
}

/// PUT /roles/{id}
///
/// # Errors
/// - 400: Empty or oversized role name
/// - 403: Caller is not an admin
/// - 404: No role with this id
/// - 409: New name already taken
pub async fn update_role_name(
    current_user: web::ReqData<CurrentUser>,
    path: web::Path<i32>,
    form: web::Json<RolePayload>,
    roles: web::Data<RoleStore>,
) -> Result<HttpResponse, AppError> {
    require_role(current_user.into_inner(), "admin")?;
    let context = ErrorContext::new("role_update");
    let role_id = path.into_inner();

    let role_type = is_valid_name("role_type", &form.role_type)?;
    let role = roles.update(role_id, &role_type).await?;

    tracing::info!(
        request_id = %context.request_id,
        role_id = role.id,
        role = %role.role_type,
        "Role renamed"
    );

    Ok(HttpResponse::Ok().json(role))
}

/// DELETE /roles/{id}
///
/// # Errors
/// - 403: Caller is not an admin
/// - 404: No role with this id
pub async fn delete_role(
    current_user: web::ReqData<CurrentUser>,
    path: web::Path<i32>,
    roles: web::Data<RoleStore>,
) -> Result<HttpResponse, AppError> {
    require_role(current_user.into_inner(), "admin")?;
    let context = ErrorContext::new("role_delete");
    let role_id = path.into_inner();

    roles.delete(role_id).await?;

    tracing::info!(request_id = %context.request_id, role_id = role_id, "Role deleted");

    Ok(HttpResponse::NoContent().finish())
}
