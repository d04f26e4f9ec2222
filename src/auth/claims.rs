/// JWT Claims structure
///
/// Payload of both access and refresh tokens: the subject (stringified
/// numeric user id), expiry, issue time, and issuer (RFC 7519).

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject (user id as a decimal string)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Issuer
    pub iss: String,
}

impl Claims {
    /// Create new claims for a user.
    ///
    /// # Arguments
    /// * `user_id` - the subject
    /// * `expiry_seconds` - token lifetime in seconds from now
    /// * `issuer` - issuer identifier
    pub fn new(user_id: i64, expiry_seconds: i64, issuer: &str) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            exp: now + expiry_seconds,
            iat: now,
            iss: issuer.to_string(),
        }
    }

    /// Extract the user id from the subject claim.
    ///
    /// A non-numeric subject means the token was not issued by this
    /// service, so it is reported as an invalid token.
    pub fn user_id(&self) -> Result<i64, AuthError> {
        self.sub.parse::<i64>().map_err(|_| AuthError::TokenInvalid)
    }

    /// Check whether the embedded expiry lies in the past.
    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        self.exp < now
    }
}
