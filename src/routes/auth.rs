/// Authentication Routes
///
/// User registration, login, token refresh, logout, and current user
/// information. The refresh token never appears in a response body; it
/// travels in a secure HTTP-only cookie scoped to the whole site.

use actix_web::{
    cookie::{time::Duration as CookieDuration, Cookie, SameSite},
    web, HttpRequest, HttpResponse,
};
use serde::{Deserialize, Serialize};

use crate::auth::roles::CurrentUser;
use crate::auth::session::SessionManager;
use crate::auth::{hash_password, verify_password};
use crate::cache::RedisCache;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, ErrorContext};
use crate::repository::roles::RoleStore;
use crate::repository::users::{NewUser, User, UserStore};
use crate::validators::{is_valid_email, is_valid_name, is_valid_phone};

/// Name of the cookie carrying the refresh token.
pub const REFRESH_COOKIE: &str = "refresh_token";

/// User registration request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
}

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Access-token response. The refresh token rides in the cookie, never
/// in the body.
#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Public view of a user record
#[derive(Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub is_active: bool,
    pub role_id: i32,
    pub created_at: String,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            phone_number: user.phone_number,
            is_active: user.is_active,
            role_id: user.role_id,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

fn refresh_cookie(token: String, max_age_seconds: i64) -> Cookie<'static> {
    Cookie::build(REFRESH_COOKIE, token)
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .max_age(CookieDuration::seconds(max_age_seconds))
        .finish()
}

fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(REFRESH_COOKIE, "")
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .finish();
    cookie.make_removal();
    cookie
}

/// POST /auth/register
///
/// Register a new user. New accounts get the default "user" role and
/// start active.
///
/// # Validation
/// - Email must be valid format and not already registered
/// - Password must be 8+ chars with digit, lowercase, and uppercase
/// - Names must be non-empty and free of suspicious content
///
/// # Errors
/// - 400: Validation errors (invalid email/password/name/phone)
/// - 409: Email already registered (duplicate)
/// - 500: Internal server error
pub async fn register(
    form: web::Json<RegisterRequest>,
    users: web::Data<UserStore>,
    roles: web::Data<RoleStore>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_registration");

    // Validate inputs
    let email = is_valid_email(&form.email)?;
    let first_name = is_valid_name("first_name", &form.first_name)?;
    let last_name = is_valid_name("last_name", &form.last_name)?;
    let phone_number = is_valid_phone(form.phone_number.as_deref())?;
    let password_hash = hash_password(&form.password)?;

    let default_role = roles
        .find_by_type("user")
        .await?
        .ok_or_else(|| AppError::Internal("Default role \"user\" is missing".to_string()))?;

    let user = users
        .insert(&NewUser {
            email,
            password_hash,
            first_name,
            last_name,
            phone_number,
            role_id: default_role.id,
        })
        .await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = user.id,
        "User registered successfully"
    );

    Ok(HttpResponse::Created().json(UserProfile::from(user)))
}

/// POST /auth/login
///
/// Authenticate with email and password. On success returns the access
/// token in the body and sets the refresh token as an HTTP-only cookie.
///
/// # Errors
/// - 400: Validation error (invalid email format)
/// - 401: Invalid credentials (email not found or wrong password)
/// - 403: Account is inactive
/// - 500: Internal server error
///
/// # Security Notes
/// - Same error for "not found" and "wrong password"; no enumeration
/// - The password is checked before the active flag, so a wrong password
///   against a disabled account reveals nothing about the account
pub async fn login(
    form: web::Json<LoginRequest>,
    users: web::Data<UserStore>,
    session: web::Data<SessionManager>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login");

    let email = is_valid_email(&form.email)?;

    let user = users
        .find_by_email(&email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(&form.password, &user.password_hash)? {
        return Err(AuthError::InvalidCredentials.into());
    }

    if !user.is_active {
        return Err(AuthError::AccountInactive.into());
    }

    let pair = session.issue_pair(user.id)?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = user.id,
        "User logged in successfully"
    );

    Ok(HttpResponse::Ok()
        .cookie(refresh_cookie(
            pair.refresh_token,
            jwt_config.refresh_token_ttl_seconds(),
        ))
        .json(TokenResponse {
            access_token: pair.access_token,
            token_type: "Bearer".to_string(),
            expires_in: pair.expires_in,
        }))
}

/// POST /auth/refresh
///
/// Mint a new access token from the refresh-token cookie. The refresh
/// token is not rotated; the cookie stays as issued at login.
///
/// # Errors
/// - 401: Cookie missing, token expired/invalid/revoked, or subject gone
/// - 403: Associated account is inactive
/// - 500: Internal server error
pub async fn refresh(
    request: HttpRequest,
    users: web::Data<UserStore>,
    session: web::Data<SessionManager>,
    cache: web::Data<RedisCache>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_refresh");

    let cookie = request
        .cookie(REFRESH_COOKIE)
        .ok_or(AuthError::MissingToken)?;

    let renewed = session
        .refresh(cookie.value(), users.get_ref(), cache.get_ref())
        .await?;

    tracing::info!(request_id = %context.request_id, "Access token refreshed");

    Ok(HttpResponse::Ok().json(TokenResponse {
        access_token: renewed.token,
        token_type: "Bearer".to_string(),
        expires_in: renewed.expires_in,
    }))
}

/// POST /auth/logout
///
/// Revoke the refresh token from the cookie and clear the cookie. A
/// request without the cookie still succeeds; there is nothing left to
/// revoke.
///
/// # Errors
/// - 500: Revocation marker could not be written
pub async fn logout(
    request: HttpRequest,
    session: web::Data<SessionManager>,
    cache: web::Data<RedisCache>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_logout");

    if let Some(cookie) = request.cookie(REFRESH_COOKIE) {
        session
            .revoke_refresh_token(cookie.value(), cache.get_ref())
            .await?;
    }

    tracing::info!(request_id = %context.request_id, "User logged out");

    Ok(HttpResponse::Ok()
        .cookie(removal_cookie())
        .json(serde_json::json!({ "message": "Logged out" })))
}

/// GET /auth/me
///
/// Current authenticated user's profile and role.
/// **Requires valid JWT access token** in the Authorization header; the
/// middleware has already resolved it to a `CurrentUser`.
pub async fn get_current_user(
    current_user: web::ReqData<CurrentUser>,
) -> Result<HttpResponse, AppError> {
    let current = current_user.into_inner();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "user": UserProfile::from(current.user),
        "role": current.role_type,
    })))
}
