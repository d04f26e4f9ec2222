/// JWT encoding and decoding
///
/// Access and refresh tokens share the same claim layout and signing key;
/// the only differences are the lifetime baked into the expiry claim and
/// the transport used by the HTTP layer.

use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::Claims;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

/// Generate a new access token (short-lived) for a user.
pub fn generate_access_token(user_id: i64, config: &JwtSettings) -> Result<String, AppError> {
    let claims = Claims::new(user_id, config.access_token_ttl_seconds(), &config.issuer);
    encode_token(&claims, config)
}

/// Generate a new refresh token (long-lived) bound to the same subject
/// layout as the access token.
pub fn generate_refresh_token(user_id: i64, config: &JwtSettings) -> Result<String, AppError> {
    let claims = Claims::new(user_id, config.refresh_token_ttl_seconds(), &config.issuer);
    encode_token(&claims, config)
}

fn encode_token(claims: &Claims, config: &JwtSettings) -> Result<String, AppError> {
    let algorithm = config.signing_algorithm()?;

    encode(
        &Header::new(algorithm),
        claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

/// Validate a token and extract its claims.
///
/// # Errors
/// * `AuthError::TokenExpired` - the embedded expiry lies in the past
/// * `AuthError::TokenInvalid` - bad signature, malformed structure,
///   wrong issuer, or wrong algorithm
pub fn decode_token(token: &str, config: &JwtSettings) -> Result<Claims, AuthError> {
    // Settings are validated at startup; an unparsable algorithm cannot
    // reach this point through `run`.
    let algorithm = config
        .signing_algorithm()
        .map_err(|_| AuthError::TokenInvalid)?;

    let mut validation = Validation::new(algorithm);
    validation.set_issuer(&[&config.issuer]);
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => {
            tracing::warn!("JWT validation error: {}", e);
            AuthError::TokenInvalid
        }
    })
}
