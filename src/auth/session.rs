/// Token lifecycle management
///
/// The session manager owns the full life of a token pair: issuance at
/// login, validation on every authenticated request, access-token renewal
/// from a refresh token, and revocation at logout. Tokens themselves are
/// stateless; the only stored state is the revocation marker.
///
/// Persistence and the marker store are reached through the `UserLookup`,
/// `RoleLookup` and `RevocationStore` traits so the lifecycle logic does
/// not depend on a concrete database or cache.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::auth::claims::Claims;
use crate::auth::jwt::{decode_token, generate_access_token, generate_refresh_token};
use crate::auth::roles::CurrentUser;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};
use crate::repository::roles::Role;
use crate::repository::users::User;

/// Resolves token subjects and login emails to user records.
#[async_trait]
pub trait UserLookup: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
}

/// Resolves a user's role reference to a role record.
#[async_trait]
pub trait RoleLookup: Send + Sync {
    async fn find_by_id(&self, role_id: i32) -> Result<Option<Role>, AppError>;
}

/// TTL'd key-value store for revocation markers and recovery codes.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), AppError>;
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn delete(&self, key: &str) -> Result<(), AppError>;
}

/// An issued access/refresh token pair. The HTTP layer returns the access
/// token in the body and moves the refresh token into an HTTP-only cookie.
#[derive(Debug)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

/// A freshly minted access token from the refresh path.
#[derive(Debug)]
pub struct AccessToken {
    pub token: String,
    pub expires_in: i64,
}

/// Markers are keyed by token digest so the store never holds a live
/// credential.
fn revocation_key(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("revoked:{:x}", hasher.finalize())
}

pub struct SessionManager {
    jwt: JwtSettings,
}

impl SessionManager {
    pub fn new(jwt: JwtSettings) -> Self {
        Self { jwt }
    }

    /// Issue an access/refresh pair bound to the same subject.
    pub fn issue_pair(&self, user_id: i64) -> Result<TokenPair, AppError> {
        let access_token = generate_access_token(user_id, &self.jwt)?;
        let refresh_token = generate_refresh_token(user_id, &self.jwt)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.jwt.access_token_ttl_seconds(),
        })
    }

    /// Validate an access token and resolve it to an active user.
    ///
    /// Every protected endpoint passes through here (via the JWT
    /// middleware); there is no second path into the authenticated state.
    ///
    /// # Errors
    /// * `TokenExpired` / `TokenInvalid` - decode failures
    /// * `UserNotFound` - the subject no longer exists
    /// * `AccountInactive` - the subject exists but is disabled
    pub async fn authenticate(
        &self,
        access_token: &str,
        users: &dyn UserLookup,
    ) -> Result<User, AppError> {
        let claims = decode_token(access_token, &self.jwt)?;
        self.resolve_active_user(&claims, users).await
    }

    /// `authenticate` plus role resolution; what the JWT middleware runs
    /// for every protected request.
    pub async fn authenticate_with_role(
        &self,
        access_token: &str,
        users: &dyn UserLookup,
        roles: &dyn RoleLookup,
    ) -> Result<CurrentUser, AppError> {
        let user = self.authenticate(access_token, users).await?;

        // The foreign key makes this lookup infallible in practice; a
        // miss means the database is in a state we cannot interpret
        let role = roles.find_by_id(user.role_id).await?.ok_or_else(|| {
            AppError::Internal(format!(
                "User {} references missing role {}",
                user.id, user.role_id
            ))
        })?;

        Ok(CurrentUser {
            user,
            role_type: role.role_type,
        })
    }

    /// Mint a new access token from a refresh token.
    ///
    /// Runs the same decode/resolve/active checks as `authenticate`, plus
    /// a revocation-marker lookup. The refresh token itself is not
    /// rotated; it stays valid until its own expiry or a logout.
    pub async fn refresh(
        &self,
        refresh_token: &str,
        users: &dyn UserLookup,
        revocations: &dyn RevocationStore,
    ) -> Result<AccessToken, AppError> {
        let claims = decode_token(refresh_token, &self.jwt)?;

        if revocations
            .get(&revocation_key(refresh_token))
            .await?
            .is_some()
        {
            tracing::warn!(subject = %claims.sub, "Attempt to use revoked refresh token");
            return Err(AuthError::TokenRevoked.into());
        }

        let user = self.resolve_active_user(&claims, users).await?;
        let token = generate_access_token(user.id, &self.jwt)?;

        Ok(AccessToken {
            token,
            expires_in: self.jwt.access_token_ttl_seconds(),
        })
    }

    /// Write a revocation marker for a refresh token, valid for the
    /// token's remaining lifetime. Expired or malformed tokens cannot be
    /// replayed, so they are a no-op rather than an error.
    pub async fn revoke_refresh_token(
        &self,
        refresh_token: &str,
        revocations: &dyn RevocationStore,
    ) -> Result<(), AppError> {
        let claims = match decode_token(refresh_token, &self.jwt) {
            Ok(claims) => claims,
            Err(_) => return Ok(()),
        };

        let remaining = claims.exp - chrono::Utc::now().timestamp();
        if remaining <= 0 {
            return Ok(());
        }

        revocations
            .set(
                &revocation_key(refresh_token),
                &chrono::Utc::now().to_rfc3339(),
                remaining as u64,
            )
            .await
    }

    async fn resolve_active_user(
        &self,
        claims: &Claims,
        users: &dyn UserLookup,
    ) -> Result<User, AppError> {
        let user_id = claims.user_id()?;

        let user = users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !user.is_active {
            return Err(AuthError::AccountInactive.into());
        }

        Ok(user)
    }
}
