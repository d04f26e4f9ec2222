/// Application Error Handling
///
/// Unified error handling for the whole service:
/// 1. Domain-specific error types (validation, database, auth, cache, email)
/// 2. A central `AppError` used for control flow
/// 3. HTTP mapping with stable machine-readable codes
/// 4. Structured error logging with request context

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

/// Validation errors for input data
#[derive(Debug, Clone)]
pub enum ValidationError {
    EmptyField(String),
    TooShort(String, usize),
    TooLong(String, usize),
    InvalidFormat(String),
    SuspiciousContent(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is empty", field),
            ValidationError::TooShort(field, min) => {
                write!(f, "{} is too short (minimum {} characters)", field, min)
            }
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {} characters)", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "{} has invalid format", field),
            ValidationError::SuspiciousContent(field) => {
                write!(f, "{} contains suspicious content", field)
            }
        }
    }
}

impl StdError for ValidationError {}

/// Database operation errors
#[derive(Debug)]
pub enum DatabaseError {
    UniqueConstraintViolation(String),
    NotFound(String),
    QueryExecution(String),
    ConnectionPool(String),
    UnexpectedError(String),
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseError::UniqueConstraintViolation(msg) => {
                write!(f, "Duplicate entry: {}", msg)
            }
            DatabaseError::NotFound(msg) => write!(f, "Not found: {}", msg),
            DatabaseError::QueryExecution(msg) => write!(f, "Query error: {}", msg),
            DatabaseError::ConnectionPool(msg) => write!(f, "Database connection error: {}", msg),
            DatabaseError::UnexpectedError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl StdError for DatabaseError {}

/// A named resource that a request addressed but that does not exist
#[derive(Debug, Clone)]
pub enum ResourceError {
    UserNotFound(i64),
    RoleNotFound(String),
    BookNotFound(i64),
    EmailNotFound(String),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::UserNotFound(id) => write!(f, "User {} not found", id),
            ResourceError::RoleNotFound(role) => write!(f, "Role {} not found", role),
            ResourceError::BookNotFound(id) => write!(f, "Book {} not found", id),
            ResourceError::EmailNotFound(email) => {
                write!(f, "No account registered for {}", email)
            }
        }
    }
}

impl StdError for ResourceError {}

/// Cache (Redis) errors
#[derive(Debug, Clone)]
pub enum CacheError {
    Connection(String),
    Command(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Connection(msg) => write!(f, "Cache connection error: {}", msg),
            CacheError::Command(msg) => write!(f, "Cache command failed: {}", msg),
        }
    }
}

impl StdError for CacheError {}

/// Email service errors
#[derive(Debug, Clone)]
pub enum EmailError {
    SendFailed(String),
    ServiceUnavailable(String),
}

impl fmt::Display for EmailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmailError::SendFailed(msg) => write!(f, "Failed to send email: {}", msg),
            EmailError::ServiceUnavailable(msg) => {
                write!(f, "Email service unavailable: {}", msg)
            }
        }
    }
}

impl StdError for EmailError {}

/// Configuration errors surfaced at runtime
#[derive(Debug)]
pub enum ConfigError {
    MissingRequired(String),
    InvalidValue(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRequired(msg) => write!(f, "Missing required config: {}", msg),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config value: {}", msg),
        }
    }
}

impl StdError for ConfigError {}

/// Authentication and authorization errors
///
/// Each variant is terminal for the current request: the caller re-submits
/// (re-login, re-refresh) rather than this service retrying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    InvalidCredentials,
    TokenExpired,
    TokenInvalid,
    MissingToken,
    TokenRevoked,
    UserNotFound,
    AccountInactive,
    Forbidden,
    RecoveryCodeExpired,
    RecoveryCodeMismatch,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Invalid email or password"),
            AuthError::TokenExpired => write!(f, "Token has expired"),
            AuthError::TokenInvalid => write!(f, "Invalid token"),
            AuthError::MissingToken => write!(f, "Missing authentication token"),
            AuthError::TokenRevoked => write!(f, "Token has been revoked"),
            AuthError::UserNotFound => write!(f, "Token subject no longer exists"),
            AuthError::AccountInactive => write!(f, "Account is inactive"),
            AuthError::Forbidden => write!(f, "Insufficient access rights"),
            AuthError::RecoveryCodeExpired => {
                write!(f, "Recovery code is missing or has expired")
            }
            AuthError::RecoveryCodeMismatch => write!(f, "Recovery code does not match"),
        }
    }
}

impl StdError for AuthError {}

/// Central error type that all application errors map to
#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    Database(DatabaseError),
    Resource(ResourceError),
    Auth(AuthError),
    Cache(CacheError),
    Email(EmailError),
    Config(ConfigError),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Database(e) => write!(f, "{}", e),
            AppError::Resource(e) => write!(f, "{}", e),
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Cache(e) => write!(f, "{}", e),
            AppError::Email(e) => write!(f, "{}", e),
            AppError::Config(e) => write!(f, "{}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        AppError::Database(err)
    }
}

impl From<ResourceError> for AppError {
    fn from(err: ResourceError) -> Self {
        AppError::Resource(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<CacheError> for AppError {
    fn from(err: CacheError) -> Self {
        AppError::Cache(err)
    }
}

impl From<EmailError> for AppError {
    fn from(err: EmailError) -> Self {
        AppError::Email(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        let error_msg = err.to_string();

        if error_msg.contains("duplicate key") || error_msg.contains("unique constraint") {
            // Keep the original message: the HTTP mapping picks the code
            // (EMAIL_ALREADY_EXISTS vs ROLE_ALREADY_EXISTS) off the
            // constraint name inside it.
            AppError::Database(DatabaseError::UniqueConstraintViolation(error_msg))
        } else if error_msg.contains("no rows") {
            AppError::Database(DatabaseError::NotFound("Record not found".to_string()))
        } else if error_msg.contains("pool") || error_msg.contains("connect") {
            AppError::Database(DatabaseError::ConnectionPool(error_msg))
        } else {
            AppError::Database(DatabaseError::UnexpectedError(error_msg))
        }
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_refusal() || err.is_connection_dropped() || err.is_timeout() {
            AppError::Cache(CacheError::Connection(err.to_string()))
        } else {
            AppError::Cache(CacheError::Command(err.to_string()))
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        let msg = err.to_string();
        if msg.contains("not set") {
            AppError::Config(ConfigError::MissingRequired(msg))
        } else {
            AppError::Config(ConfigError::InvalidValue(msg))
        }
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Internal(msg)
    }
}

/// Error response body for HTTP responses
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Unique error ID for tracking (request ID or trace ID)
    pub error_id: String,
    /// Human-readable error message
    pub message: String,
    /// Stable code for client-side handling
    pub code: String,
    /// HTTP status code
    pub status: u16,
    /// Timestamp when the error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Trait for converting errors to HTTP responses with proper logging
pub trait ErrorHandler {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse);
    fn log_error(&self, request_id: &str);
}

fn unique_violation_code(msg: &str) -> (&'static str, String) {
    if msg.contains("users_email") {
        ("EMAIL_ALREADY_EXISTS", "Email already registered".to_string())
    } else if msg.contains("roles_role_type") {
        ("ROLE_ALREADY_EXISTS", "Role already exists".to_string())
    } else {
        ("CONFLICT", "Duplicate entry".to_string())
    }
}

impl ErrorHandler for AppError {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse) {
        let (status, code, message) = match self {
            AppError::Validation(e) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR".to_string(),
                e.to_string(),
            ),

            AppError::Database(e) => match e {
                DatabaseError::UniqueConstraintViolation(msg) => {
                    let (code, message) = unique_violation_code(msg);
                    (StatusCode::CONFLICT, code.to_string(), message)
                }
                DatabaseError::NotFound(_) => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND".to_string(),
                    e.to_string(),
                ),
                DatabaseError::ConnectionPool(_) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE".to_string(),
                    "Database service temporarily unavailable".to_string(),
                ),
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR".to_string(),
                    "Database error occurred".to_string(),
                ),
            },

            AppError::Resource(e) => {
                let (status, code) = match e {
                    ResourceError::UserNotFound(_) => (StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
                    ResourceError::RoleNotFound(_) => (StatusCode::NOT_FOUND, "ROLE_NOT_FOUND"),
                    ResourceError::BookNotFound(_) => (StatusCode::NOT_FOUND, "BOOK_NOT_FOUND"),
                    ResourceError::EmailNotFound(_) => {
                        (StatusCode::BAD_REQUEST, "EMAIL_NOT_FOUND")
                    }
                };
                (status, code.to_string(), e.to_string())
            }

            AppError::Auth(e) => {
                let (status, code) = match e {
                    AuthError::InvalidCredentials => {
                        (StatusCode::UNAUTHORIZED, "BAD_CREDENTIALS")
                    }
                    AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
                    AuthError::TokenInvalid => (StatusCode::UNAUTHORIZED, "TOKEN_INVALID"),
                    AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
                    AuthError::TokenRevoked => (StatusCode::UNAUTHORIZED, "TOKEN_REVOKED"),
                    AuthError::UserNotFound => (StatusCode::UNAUTHORIZED, "USER_NOT_FOUND"),
                    AuthError::AccountInactive => (StatusCode::FORBIDDEN, "USER_NOT_ACTIVE"),
                    AuthError::Forbidden => (StatusCode::FORBIDDEN, "NO_ACCESS_RIGHTS"),
                    AuthError::RecoveryCodeExpired => {
                        (StatusCode::BAD_REQUEST, "RECOVERY_CODE_EXPIRED")
                    }
                    AuthError::RecoveryCodeMismatch => {
                        (StatusCode::BAD_REQUEST, "RECOVERY_CODE_MISMATCH")
                    }
                };
                (status, code.to_string(), e.to_string())
            }

            AppError::Cache(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CACHE_ERROR".to_string(),
                "Cache operation failed".to_string(),
            ),

            AppError::Email(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "EMAIL_SERVICE_ERROR".to_string(),
                "Email service temporarily unavailable".to_string(),
            ),

            AppError::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIG_ERROR".to_string(),
                "Server configuration error".to_string(),
            ),

            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR".to_string(),
                "Internal server error".to_string(),
            ),
        };

        let error_response =
            ErrorResponse::new(request_id.to_string(), message, code, status.as_u16());

        (status, error_response)
    }

    fn log_error(&self, request_id: &str) {
        match self {
            AppError::Validation(e) => {
                tracing::warn!(request_id = request_id, error = %e, "Validation error");
            }
            AppError::Database(DatabaseError::UniqueConstraintViolation(_)) => {
                tracing::warn!(request_id = request_id, error = %self, "Duplicate entry attempt");
            }
            AppError::Database(e) => {
                tracing::error!(request_id = request_id, error = %e, "Database error");
            }
            AppError::Resource(e) => {
                tracing::info!(request_id = request_id, error = %e, "Resource not found");
            }
            AppError::Auth(AuthError::InvalidCredentials) => {
                tracing::warn!(request_id = request_id, "Invalid credentials attempt");
            }
            AppError::Auth(e) => {
                tracing::warn!(request_id = request_id, error = %e, "Authentication error");
            }
            AppError::Cache(e) => {
                tracing::error!(request_id = request_id, error = %e, "Cache error");
            }
            AppError::Email(e) => {
                tracing::error!(request_id = request_id, error = %e, "Email service error");
            }
            AppError::Config(e) => {
                tracing::error!(request_id = request_id, error = %e, "Configuration error");
            }
            AppError::Internal(msg) => {
                tracing::error!(request_id = request_id, error = %msg, "Internal error");
            }
        }
    }
}

/// Actix-web integration
impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let request_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&request_id);

        let (status, error_response) = <Self as ErrorHandler>::error_response(self, &request_id);

        HttpResponse::build(status).json(error_response)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(e) => match e {
                DatabaseError::UniqueConstraintViolation(_) => StatusCode::CONFLICT,
                DatabaseError::NotFound(_) => StatusCode::NOT_FOUND,
                DatabaseError::ConnectionPool(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Resource(ResourceError::EmailNotFound(_)) => StatusCode::BAD_REQUEST,
            AppError::Resource(_) => StatusCode::NOT_FOUND,
            AppError::Auth(e) => match e {
                AuthError::AccountInactive | AuthError::Forbidden => StatusCode::FORBIDDEN,
                AuthError::RecoveryCodeExpired | AuthError::RecoveryCodeMismatch => {
                    StatusCode::BAD_REQUEST
                }
                _ => StatusCode::UNAUTHORIZED,
            },
            AppError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Email(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Request context for error logging
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub request_id: String,
    pub user_id: Option<String>,
    pub operation: String,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            user_id: None,
            operation: operation.into(),
        }
    }

    pub fn with_user_id(mut self, user_id: String) -> Self {
        self.user_id = Some(user_id);
        self
    }
}
