// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    Validation(String),
    AuthenticationFailed(String),
    EmailNotVerified(String),

    // 401 Unauthorized
    Unauthorized(String),
    InvalidCredential(String),
    AccountBlocked(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    InternalServerError(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Validation(_) => 400,
            ApiError::AuthenticationFailed(_) => 400,
            ApiError::EmailNotVerified(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::InvalidCredential(_) => 401,
            ApiError::AccountBlocked(_) => 401,
            ApiError::NotFound(_) => 404,
            ApiError::InternalServerError(_) => 500,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Validation(msg)
            | ApiError::AuthenticationFailed(msg)
            | ApiError::EmailNotVerified(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::InvalidCredential(msg)
            | ApiError::AccountBlocked(msg)
            | ApiError::NotFound(msg)
            | ApiError::InternalServerError(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::AuthenticationFailed(_) => "AUTHENTICATION_FAILED",
            ApiError::EmailNotVerified(_) => "EMAIL_NOT_VERIFIED",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::InvalidCredential(_) => "INVALID_CREDENTIAL",
            ApiError::AccountBlocked(_) => "ACCOUNT_BLOCKED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "success": false,
            "message": self.message(),
            "code": self.error_code()
        })
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn authentication_failed(message: impl Into<String>) -> Self {
        ApiError::AuthenticationFailed(message.into())
    }

    pub fn email_not_verified(message: impl Into<String>) -> Self {
        ApiError::EmailNotVerified(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn invalid_credential(message: impl Into<String>) -> Self {
        ApiError::InvalidCredential(message.into())
    }

    pub fn account_blocked(message: impl Into<String>) -> Self {
        ApiError::AccountBlocked(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }
}

// Convert other error types to ApiError
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::not_found("not found"),
            other => {
                // Log the real error but return a generic message
                tracing::error!("database error: {}", other);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<crate::auth::JwtError> for ApiError {
    fn from(err: crate::auth::JwtError) -> Self {
        tracing::error!("token generation failed: {}", err);
        ApiError::internal_server_error("Failed to issue session token")
    }
}

impl From<crate::storage::StorageError> for ApiError {
    fn from(err: crate::storage::StorageError) -> Self {
        tracing::error!("object storage error: {}", err);
        ApiError::internal_server_error("An error occurred while storing the file")
    }
}

impl From<crate::media::MediaError> for ApiError {
    fn from(err: crate::media::MediaError) -> Self {
        match err {
            crate::media::MediaError::InvalidFileType { .. }
            | crate::media::MediaError::Required { .. } => ApiError::bad_request(err.to_string()),
            crate::media::MediaError::Image(_) | crate::media::MediaError::Audio(_) => {
                tracing::error!("media processing error: {}", err);
                ApiError::internal_server_error("Failed to process the uploaded file")
            }
        }
    }
}

impl From<crate::providers::ProviderError> for ApiError {
    fn from(err: crate::providers::ProviderError) -> Self {
        match err {
            crate::providers::ProviderError::Unauthorized(msg) => ApiError::invalid_credential(msg),
            crate::providers::ProviderError::Exchange { provider, source } => {
                tracing::warn!("{} exchange failed: {}", provider, source);
                ApiError::authentication_failed(format!("Failed to authenticate with {}", provider))
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
