/// Admin Routes
///
/// User management for administrators. Every handler re-checks the role
/// through `require_role`; the middleware only proves the caller is
/// authenticated, not that it is an admin.

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::auth::roles::{require_role, CurrentUser};
use crate::error::{AppError, ErrorContext, ResourceError};
use crate::repository::roles::RoleStore;
use crate::repository::users::UserStore;
use crate::routes::auth::UserProfile;

#[derive(Deserialize)]
pub struct RoleAssignment {
    pub role_type: String,
}

/// GET /admin/users
///
/// # Errors
/// - 403: Caller is not an admin
pub async fn list_users(
    current_user: web::ReqData<CurrentUser>,
    users: web::Data<UserStore>,
) -> Result<HttpResponse, AppError> {
    require_role(current_user.into_inner(), "admin")?;

    let all: Vec<UserProfile> = users
        .list()
        .await?
        .into_iter()
        .map(UserProfile::from)
        .collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({ "users": all })))
}

/// PUT /admin/users/{id}/role
///
/// Assign a role to a user by role-type name.
///
/// # Errors
/// - 403: Caller is not an admin
/// - 404: Target user or role does not exist
pub async fn update_user_role(
    current_user: web::ReqData<CurrentUser>,
    path: web::Path<i64>,
    form: web::Json<RoleAssignment>,
    users: web::Data<UserStore>,
    roles: web::Data<RoleStore>,
) -> Result<HttpResponse, AppError> {
    let admin = require_role(current_user.into_inner(), "admin")?;
    let context = ErrorContext::new("admin_update_user_role");
    let user_id = path.into_inner();

    let role = roles
        .find_by_type(&form.role_type)
        .await?
        .ok_or_else(|| ResourceError::RoleNotFound(form.role_type.clone()))?;

    let updated = users.update_role(user_id, role.id).await?;

    tracing::info!(
        request_id = %context.request_id,
        admin_id = admin.user.id,
        user_id = updated.id,
        role = %role.role_type,
        "User role updated"
    );

    Ok(HttpResponse::Ok().json(UserProfile::from(updated)))
}

/// DELETE /admin/users/{id}
///
/// # Errors
/// - 403: Caller is not an admin
/// - 404: Target user does not exist
pub async fn delete_user(
    current_user: web::ReqData<CurrentUser>,
    path: web::Path<i64>,
    users: web::Data<UserStore>,
) -> Result<HttpResponse, AppError> {
    let admin = require_role(current_user.into_inner(), "admin")?;
    let context = ErrorContext::new("admin_delete_user");
    let user_id = path.into_inner();

    users.delete(user_id).await?;

    tracing::info!(
        request_id = %context.request_id,
        admin_id = admin.user.id,
        user_id = user_id,
        "User deleted"
    );

    Ok(HttpResponse::NoContent().finish())
}
