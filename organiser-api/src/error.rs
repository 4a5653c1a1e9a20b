/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>`; component errors convert into
/// it with `?`.
///
/// # Response Body
///
/// ```json
/// { "code": "forbidden", "message": "Not a member of this project" }
/// ```
///
/// Validation failures add a `details` array of `{field, message}`.
/// Internal errors are logged and replaced with a generic message, so hash
/// values, keys and store errors never reach a client.
///
/// # Example
///
/// ```
/// use organiser_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::json;
///
/// async fn handler() -> ApiResult<Json<serde_json::Value>> {
///     Err(ApiError::NotFound("Project not found".to_string()))
/// }
/// ```

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use organiser_shared::{
    auth::{
        authorization::AuthzError,
        middleware::AuthRejection,
        password::PasswordError,
        service::{AuthError, FieldError},
        token::TokenError,
    },
    blob::BlobError,
    store::StoreError,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Unauthenticated (401) - missing or rejected token
    Unauthenticated(AuthRejection),

    /// Unauthenticated (401) - login failed
    InvalidCredentials,

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (422) - e.g., duplicate email
    Conflict(String),

    /// Unprocessable entity (422) - validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Payload too large (413)
    PayloadTooLarge(String),

    /// Unsupported media type (415)
    UnsupportedMediaType(String),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

impl From<FieldError> for ValidationErrorDetail {
    fn from(err: FieldError) -> Self {
        Self {
            field: err.field,
            message: err.message,
        }
    }
}

impl ApiError {
    /// Single-field validation failure
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: field.to_string(),
            message: message.into(),
        }])
    }

    /// Maps a `validator` failure on a request body
    pub fn from_validation(errors: &validator::ValidationErrors) -> Self {
        ApiError::ValidationError(
            organiser_shared::auth::service::field_errors(errors)
                .into_iter()
                .map(ValidationErrorDetail::from)
                .collect(),
        )
    }
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "forbidden", "token_expired")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthenticated(rejection) => write!(f, "Unauthenticated: {}", rejection),
            ApiError::InvalidCredentials => write!(f, "Invalid credentials"),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            ApiError::UnsupportedMediaType(msg) => write!(f, "Unsupported media type: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match self {
            ApiError::Unauthenticated(rejection) => (
                StatusCode::UNAUTHORIZED,
                rejection.code(),
                rejection.to_string(),
                None,
            ),
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "Invalid email or password".to_string(),
                None,
            ),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "conflict", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", msg, None)
            }
            ApiError::UnsupportedMediaType(msg) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "unsupported_media_type",
                msg,
                None,
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            code: code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert store errors to API errors
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => ApiError::Conflict("Email already registered".to_string()),
            StoreError::MissingReference(what) => {
                ApiError::NotFound(format!("Referenced record not found: {}", what))
            }
            StoreError::Database(err) => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert signup/login errors to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(errors) => {
                ApiError::ValidationError(errors.into_iter().map(ValidationErrorDetail::from).collect())
            }
            AuthError::Conflict => ApiError::Conflict("Email already registered".to_string()),
            AuthError::InvalidCredentials => ApiError::InvalidCredentials,
            AuthError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

/// Convert request authentication failures to API errors
impl From<AuthRejection> for ApiError {
    fn from(err: AuthRejection) -> Self {
        ApiError::Unauthenticated(err)
    }
}

/// Convert authorization errors to API errors
impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotMember(_) => ApiError::Forbidden("Not a member of this project".to_string()),
            AuthzError::InsufficientRole { .. } => {
                ApiError::Forbidden("Only the project owner can do this".to_string())
            }
        }
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Convert token errors to API errors
impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(msg) => ApiError::InternalError(format!("Token signing failed: {}", msg)),
            other => ApiError::Unauthenticated(AuthRejection::Token(other)),
        }
    }
}

/// Convert image storage errors to API errors
impl From<BlobError> for ApiError {
    fn from(err: BlobError) -> Self {
        match err {
            BlobError::UnsupportedType(_) => {
                ApiError::UnsupportedMediaType("Only PNG and JPEG images are accepted".to_string())
            }
            BlobError::TooLarge { max, .. } => {
                ApiError::PayloadTooLarge(format!("Image exceeds {} bytes", max))
            }
            BlobError::Empty => ApiError::invalid("image", "Image is empty"),
            BlobError::Io(err) => ApiError::InternalError(format!("Image storage failed: {}", err)),
        }
    }
}

/// Convert JSON body rejections to API errors
impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        ApiError::invalid("body", err.body_text())
    }
}

/// Convert path parameter rejections (e.g. a malformed UUID) to API errors
impl From<PathRejection> for ApiError {
    fn from(err: PathRejection) -> Self {
        ApiError::invalid("path", err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::Forbidden("Not a member".to_string());
        assert_eq!(err.to_string(), "Forbidden: Not a member");

        let err = ApiError::NotFound("User not found".to_string());
        assert_eq!(err.to_string(), "Not found: User not found");
    }

    #[test]
    fn test_validation_error() {
        let errors = vec![
            ValidationErrorDetail {
                field: "email".to_string(),
                message: "Invalid email format".to_string(),
            },
            ValidationErrorDetail {
                field: "password".to_string(),
                message: "Password too short".to_string(),
            },
        ];

        let err = ApiError::ValidationError(errors);
        assert_eq!(err.to_string(), "Validation failed: 2 errors");
    }

    #[tokio::test]
    async fn test_token_rejections_map_to_401_codes() {
        let (status, body) = body_of(ApiError::from(TokenError::Expired)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "token_expired");

        let (_, body) = body_of(ApiError::from(AuthRejection::Token(TokenError::BadSignature))).await;
        assert_eq!(body["code"], "bad_signature");

        let (status, body) = body_of(ApiError::from(AuthRejection::Unauthenticated)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "unauthenticated");
    }

    #[tokio::test]
    async fn test_forbidden_is_distinct_from_unauthenticated() {
        let (status, body) = body_of(ApiError::from(AuthzError::NotMember(uuid::Uuid::nil()))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "forbidden");
    }

    #[tokio::test]
    async fn test_conflict_is_422() {
        let (status, body) = body_of(ApiError::from(AuthError::Conflict)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "conflict");
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let (status, body) = body_of(ApiError::InternalError("connection refused at 10.0.0.5".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.to_string().contains("10.0.0.5"));
        assert!(body.get("details").is_none());
    }
}
