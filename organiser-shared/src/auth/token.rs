/// Session token issuing and verification
///
/// Session tokens are HS256-signed JWTs carrying the user's id and email.
/// They are stateless: nothing is stored server-side, so a token stays valid
/// until it expires. There is no revocation list; shortening `JWT_TTL_SECONDS`
/// is the only lever for limiting exposure of a leaked token.
///
/// # Verification order
///
/// 1. Structure (three dot-separated segments) → `Malformed`
/// 2. HMAC over `header.payload` → `BadSignature`
/// 3. Header and claims decoding → `Malformed`
/// 4. Issuer → `BadSignature`
/// 5. Expiry, with zero leeway → `Expired`
///
/// The signature is checked before anything is decoded, so changing any
/// byte of a valid token (header included) is reported as `BadSignature`.
///
/// A rejection never carries claims.
///
/// # Example
///
/// ```
/// use organiser_shared::auth::token::{TokenIssuer, TokenSubject};
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let issuer = TokenIssuer::new(
///     "test-secret-key-at-least-32-bytes-long",
///     "project-organiser",
///     Duration::hours(1),
/// );
///
/// let subject = TokenSubject { user_id: Uuid::new_v4(), email: "a@x.com".to_string() };
/// let token = issuer.issue(&subject)?;
///
/// let claims = issuer.verify(&token)?;
/// assert_eq!(claims.email, "a@x.com");
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{
    crypto, decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Error type for token operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Token is not a structurally valid JWT
    #[error("Malformed token")]
    Malformed,

    /// Signature does not match, or the token was not minted by this issuer
    #[error("Invalid token signature")]
    BadSignature,

    /// Token was valid but its expiry has passed
    #[error("Token has expired")]
    Expired,

    /// Failed to sign a new token
    #[error("Failed to create token: {0}")]
    Signing(String),
}

/// Who a token is issued to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    /// User ID
    pub user_id: Uuid,

    /// Normalised email address
    pub email: String,
}

/// JWT claims
///
/// - `sub`: user ID
/// - `email`: user email at issue time
/// - `iss`: issuer name from configuration
/// - `iat` / `exp`: Unix timestamps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: Uuid,

    /// Email address
    pub email: String,

    /// Issuer
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// User ID carried by the token
    pub fn user_id(&self) -> Uuid {
        self.sub
    }
}

/// Signs and verifies session tokens with a process-wide secret
///
/// Built once at startup from configuration and shared through application
/// state. Keys are derived once here rather than on every request.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("issuer", &self.issuer)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Creates an issuer from the signing secret
    ///
    /// The secret should be at least 32 bytes; `Config::from_env` enforces
    /// that before this is called.
    pub fn new(secret: &str, issuer: impl Into<String>, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            ttl,
        }
    }

    /// Issues a token with the configured lifetime
    pub fn issue(&self, subject: &TokenSubject) -> Result<String, TokenError> {
        self.issue_with_ttl(subject, self.ttl)
    }

    /// Issues a token with an explicit lifetime
    ///
    /// A negative `ttl` produces an already-expired token, which is useful
    /// in tests.
    pub fn issue_with_ttl(&self, subject: &TokenSubject, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.user_id,
            email: subject.email.clone(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: now
                .checked_add_signed(ttl)
                .ok_or_else(|| TokenError::Signing("token lifetime out of range".to_string()))?
                .timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verifies a token and returns its claims
    ///
    /// # Errors
    ///
    /// - `TokenError::Malformed` if the token cannot be parsed
    /// - `TokenError::BadSignature` if the signature or issuer does not match
    /// - `TokenError::Expired` if the signature is valid but `exp` has passed
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let (message, signature) = token.rsplit_once('.').ok_or(TokenError::Malformed)?;
        if message.split('.').count() != 2 {
            return Err(TokenError::Malformed);
        }

        // An undecodable signature segment counts as a mismatch
        match crypto::verify(signature, message.as_bytes(), &self.decoding, Algorithm::HS256) {
            Ok(true) => {}
            Ok(false) | Err(_) => return Err(TokenError::BadSignature),
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.validate_exp = true;
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidIssuer
                | ErrorKind::InvalidAlgorithm => TokenError::BadSignature,
                _ => TokenError::Malformed,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(SECRET, "project-organiser", Duration::hours(1))
    }

    fn subject() -> TokenSubject {
        TokenSubject {
            user_id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
        }
    }

    /// Replaces one character in the middle of the given segment with a
    /// different base64url character.
    fn tamper(token: &str, segment: usize) -> String {
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let target = &mut parts[segment];
        let idx = target.len() / 2;
        let original = target.as_bytes()[idx];
        let replacement = if original == b'A' { 'B' } else { 'A' };
        target.replace_range(idx..idx + 1, &replacement.to_string());
        parts.join(".")
    }

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let issuer = issuer();
        let subject = subject();

        let token = issuer.issue(&subject).expect("Should issue token");
        let claims = issuer.verify(&token).expect("Should verify token");

        assert_eq!(claims.user_id(), subject.user_id);
        assert_eq!(claims.email, subject.email);
        assert_eq!(claims.iss, "project-organiser");
    }

    #[test]
    fn test_expiry_matches_ttl() {
        let issuer = issuer();
        let token = issuer.issue(&subject()).unwrap();
        let claims = issuer.verify(&token).unwrap();

        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = issuer();
        let token = issuer
            .issue_with_ttl(&subject(), Duration::seconds(-5))
            .unwrap();

        assert_eq!(issuer.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_wrong_secret_is_bad_signature() {
        let token = issuer().issue(&subject()).unwrap();
        let other = TokenIssuer::new(
            "another-secret-key-at-least-32-bytes",
            "project-organiser",
            Duration::hours(1),
        );

        assert_eq!(other.verify(&token), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_signature_checked_before_expiry() {
        let token = issuer()
            .issue_with_ttl(&subject(), Duration::seconds(-5))
            .unwrap();
        let other = TokenIssuer::new(
            "another-secret-key-at-least-32-bytes",
            "project-organiser",
            Duration::hours(1),
        );

        assert_eq!(other.verify(&token), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_tampered_payload_is_bad_signature() {
        let issuer = issuer();
        let token = issuer.issue(&subject()).unwrap();

        assert_eq!(issuer.verify(&tamper(&token, 1)), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_tampered_signature_is_bad_signature() {
        let issuer = issuer();
        let token = issuer.issue(&subject()).unwrap();

        assert_eq!(issuer.verify(&tamper(&token, 2)), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_any_changed_byte_is_bad_signature() {
        let issuer = issuer();
        let token = issuer.issue(&subject()).unwrap();

        for (idx, byte) in token.bytes().enumerate() {
            if byte == b'.' {
                continue;
            }
            let mut bytes = token.clone().into_bytes();
            bytes[idx] = if byte == b'A' { b'B' } else { b'A' };
            let altered = String::from_utf8(bytes).unwrap();

            assert_eq!(
                issuer.verify(&altered),
                Err(TokenError::BadSignature),
                "byte {} of {:?}",
                idx,
                token
            );
        }
    }

    #[test]
    fn test_wrong_segment_count_is_malformed() {
        let issuer = issuer();
        let token = issuer.issue(&subject()).unwrap();

        assert_eq!(issuer.verify(&format!("{}.x", token)), Err(TokenError::Malformed));
    }

    #[test]
    fn test_lifetime_overflow_is_signing_error() {
        let issuer = issuer();

        assert!(matches!(
            issuer.issue_with_ttl(&subject(), Duration::MAX),
            Err(TokenError::Signing(_))
        ));
    }

    #[test]
    fn test_foreign_issuer_rejected() {
        let token = TokenIssuer::new(SECRET, "someone-else", Duration::hours(1))
            .issue(&subject())
            .unwrap();

        assert_eq!(issuer().verify(&token), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let issuer = issuer();

        assert_eq!(issuer.verify(""), Err(TokenError::Malformed));
        assert_eq!(issuer.verify("not-a-token"), Err(TokenError::Malformed));
        assert_eq!(issuer.verify("a.b"), Err(TokenError::Malformed));
    }

    #[test]
    fn test_debug_hides_keys() {
        let rendered = format!("{:?}", issuer());
        assert!(!rendered.contains(SECRET));
    }
}
