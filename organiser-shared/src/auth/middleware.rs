/// Request authentication for Axum
///
/// Turns the `Authorization: Bearer <token>` header into an [`Identity`].
/// The check is purely cryptographic: the credential store is never
/// consulted, so a token for a user who no longer exists keeps working until
/// it expires.
///
/// # Request Extensions
///
/// After successful authentication the API server's middleware inserts the
/// `Identity` into request extensions. Handlers take it as an extractor.
///
/// # Example
///
/// ```no_run
/// use organiser_shared::auth::middleware::Identity;
///
/// async fn protected_handler(identity: Identity) -> String {
///     format!("Hello, {}!", identity.email)
/// }
/// ```

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::token::{Claims, TokenError, TokenIssuer};

/// Authenticated caller attached to a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Email the token was issued for
    pub email: String,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
        }
    }
}

/// Why a request could not be authenticated
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthRejection {
    /// No credentials were presented
    #[error("Missing credentials")]
    Unauthenticated,

    /// Credentials were presented but rejected
    #[error(transparent)]
    Token(#[from] TokenError),
}

impl AuthRejection {
    /// Stable machine-readable code for response bodies
    pub fn code(&self) -> &'static str {
        match self {
            AuthRejection::Unauthenticated => "unauthenticated",
            AuthRejection::Token(TokenError::Expired) => "token_expired",
            AuthRejection::Token(TokenError::BadSignature) => "bad_signature",
            AuthRejection::Token(TokenError::Malformed | TokenError::Signing(_)) => "malformed_token",
        }
    }
}

/// Always `401 Unauthorized` with a `{code, message}` body
impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "code": self.code(),
            "message": self.to_string(),
        }));

        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

/// Extracts the bearer token from request headers
///
/// - no `Authorization` header → `Ok(None)`
/// - anything other than `Bearer <non-empty token>` → `TokenError::Malformed`
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AuthRejection> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let token = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthRejection::Token(TokenError::Malformed))?;

    Ok(Some(token))
}

/// Authenticates a request from its headers
///
/// # Errors
///
/// - `AuthRejection::Unauthenticated` if no token is present
/// - `AuthRejection::Token(_)` with the verifier's rejection otherwise
pub fn authenticate(headers: &HeaderMap, issuer: &TokenIssuer) -> Result<Identity, AuthRejection> {
    let token = bearer_token(headers)?.ok_or(AuthRejection::Unauthenticated)?;
    let claims = issuer.verify(token)?;

    Ok(Identity::from(claims))
}

/// Reads the identity placed in extensions by the authentication layer
///
/// A handler mounted without that layer rejects every request as
/// unauthenticated instead of running anonymously.
#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or(AuthRejection::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::TokenSubject;
    use axum::http::HeaderValue;
    use chrono::Duration;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(
            "test-secret-key-at-least-32-bytes-long",
            "project-organiser",
            Duration::hours(1),
        )
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_missing_header_is_unauthenticated() {
        let result = authenticate(&HeaderMap::new(), &issuer());
        assert_eq!(result, Err(AuthRejection::Unauthenticated));
    }

    #[test]
    fn test_non_bearer_scheme_is_malformed() {
        let result = authenticate(&headers_with("Basic dXNlcjpwYXNz"), &issuer());
        assert_eq!(result, Err(AuthRejection::Token(TokenError::Malformed)));

        let result = authenticate(&headers_with("Bearer "), &issuer());
        assert_eq!(result, Err(AuthRejection::Token(TokenError::Malformed)));
    }

    #[test]
    fn test_rejection_codes() {
        assert_eq!(AuthRejection::Unauthenticated.code(), "unauthenticated");
        assert_eq!(AuthRejection::Token(TokenError::Expired).code(), "token_expired");
        assert_eq!(AuthRejection::Token(TokenError::BadSignature).code(), "bad_signature");
        assert_eq!(
            AuthRejection::Unauthenticated.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_valid_token_yields_identity() {
        let issuer = issuer();
        let subject = TokenSubject {
            user_id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
        };
        let token = issuer.issue(&subject).unwrap();

        let identity = authenticate(&headers_with(&format!("Bearer {}", token)), &issuer).unwrap();
        assert_eq!(identity.user_id, subject.user_id);
        assert_eq!(identity.email, "a@x.com");
    }

    #[test]
    fn test_expired_token_propagates_kind() {
        let issuer = issuer();
        let subject = TokenSubject {
            user_id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
        };
        let token = issuer.issue_with_ttl(&subject, Duration::seconds(-5)).unwrap();

        let result = authenticate(&headers_with(&format!("Bearer {}", token)), &issuer);
        assert_eq!(result, Err(AuthRejection::Token(TokenError::Expired)));
    }
}
