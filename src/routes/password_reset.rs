/// Password Recovery Routes
///
/// Two-step reset: request a short-lived numeric code by email, then
/// trade the code for a new password. Codes live in Redis under
/// `recovery:{email}` and expire on their own.

use actix_web::{web, HttpResponse};
use rand::Rng;
use serde::Deserialize;

use crate::auth::hash_password;
use crate::cache::{RedisCache, RECOVERY_CODE_TTL_SECONDS};
use crate::email_client::EmailClient;
use crate::error::{AppError, AuthError, ErrorContext, ResourceError};
use crate::repository::users::UserStore;
use crate::validators::is_valid_email;

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

fn generate_recovery_code() -> String {
    let code: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:06}", code)
}

/// POST /auth/password/forgot
///
/// Store a six-digit recovery code for the account and email it out.
/// The code replaces any previous one and expires after fifteen minutes.
///
/// # Errors
/// - 400: Invalid email format, or no account for the email
/// - 500: Code could not be stored
/// - 503: Email service unreachable
pub async fn forgot_password(
    form: web::Json<ForgotPasswordRequest>,
    users: web::Data<UserStore>,
    cache: web::Data<RedisCache>,
    email_client: web::Data<EmailClient>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("password_forgot");

    let email = is_valid_email(&form.email)?;

    let user = users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| ResourceError::EmailNotFound(email.clone()))?;

    let code = generate_recovery_code();
    cache
        .set_with_ttl(
            &RedisCache::recovery_key(&email),
            &code,
            RECOVERY_CODE_TTL_SECONDS,
        )
        .await?;

    email_client.send_recovery_code(&email, &code).await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = user.id,
        "Password recovery code issued"
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Recovery code sent"
    })))
}

/// POST /auth/password/reset
///
/// Trade a recovery code for a new password. The stored code is deleted
/// once the password is updated, so a code is good for one reset.
///
/// # Errors
/// - 400: Invalid email, code absent/expired, code mismatch, or weak
///   new password
/// - 500: Internal server error
pub async fn reset_password(
    form: web::Json<ResetPasswordRequest>,
    users: web::Data<UserStore>,
    cache: web::Data<RedisCache>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("password_reset");

    let email = is_valid_email(&form.email)?;
    let key = RedisCache::recovery_key(&email);

    let stored = cache
        .get(&key)
        .await?
        .ok_or(AuthError::RecoveryCodeExpired)?;

    if stored != form.code {
        return Err(AuthError::RecoveryCodeMismatch.into());
    }

    let password_hash = hash_password(&form.new_password)?;

    let user = users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| ResourceError::EmailNotFound(email.clone()))?;

    users.update_password(user.id, &password_hash).await?;
    cache.delete(&key).await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = user.id,
        "Password reset completed"
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Password updated"
    })))
}
