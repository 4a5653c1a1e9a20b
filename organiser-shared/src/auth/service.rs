/// Signup and login orchestration
///
/// [`AuthService`] ties the credential store, the password hasher and the
/// token issuer together. Each call is a short pipeline that stops at the
/// first failure:
///
/// - **signup**: validate → email uniqueness → hash → persist → issue token
/// - **login**: look up by email → verify password → issue token
///
/// Signup performs exactly one store write; login performs none. Every
/// credential-check failure on login is reported as
/// [`AuthError::InvalidCredentials`], whether the email is unknown or the
/// password is wrong.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use uuid::Uuid;
use validator::Validate;

use super::password::{PasswordError, PasswordHasher};
use super::token::{TokenError, TokenIssuer, TokenSubject};
use crate::models::user::{normalize_email, NewUser};
use crate::store::{StoreError, UserStore};

/// Signup payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignupInput {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 100, message = "Surname must be 1-100 characters"))]
    pub surname: String,

    #[validate(range(min = 1, max = 150, message = "Age must be between 1 and 150"))]
    pub age: i32,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 3, max = 128, message = "Password must be 3-128 characters"))]
    pub password: String,

    /// Reference previously returned by the image upload endpoint
    #[validate(length(max = 2048, message = "Image reference too long"))]
    pub image: Option<String>,
}

/// Login payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Successful signup or login
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub user_id: Uuid,
    pub email: String,
    pub token: String,
}

/// One failed validation rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Flattens `validator` output into field/message pairs
pub fn field_errors(errors: &validator::ValidationErrors) -> Vec<FieldError> {
    let mut out: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| FieldError {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Validation failed".to_string()),
            })
        })
        .collect();

    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}

/// Error type for authentication operations
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Input failed shape validation
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Email already registered
    #[error("Email already registered")]
    Conflict,

    /// Unknown email or wrong password
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Store, hashing or signing failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => AuthError::Conflict,
            other => AuthError::Internal(other.to_string()),
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

/// Authentication service
///
/// Cheap to clone; all members are shared.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    tokens: Arc<TokenIssuer>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, hasher: PasswordHasher, tokens: Arc<TokenIssuer>) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    /// Token issuer shared with the authentication layer
    pub fn tokens(&self) -> &Arc<TokenIssuer> {
        &self.tokens
    }

    /// Registers a user and returns a session for them
    ///
    /// # Errors
    ///
    /// - `AuthError::Validation` if the input is malformed
    /// - `AuthError::Conflict` if the email (case-insensitive) is taken
    /// - `AuthError::Internal` on store, hashing or signing failure
    pub async fn signup(&self, mut input: SignupInput) -> Result<AuthSession, AuthError> {
        input.email = normalize_email(&input.email);
        input
            .validate()
            .map_err(|e| AuthError::Validation(field_errors(&e)))?;

        let email = input.email;

        if self.users.email_exists(&email).await? {
            debug!("Signup rejected: email already registered");
            return Err(AuthError::Conflict);
        }

        let password_hash = self.hasher.hash_async(&input.password).await.map_err(|e| {
            error!(error = %e, "Password hashing failed");
            AuthError::from(e)
        })?;

        let user = self
            .users
            .insert_user(NewUser {
                name: input.name.trim().to_string(),
                surname: input.surname.trim().to_string(),
                age: input.age,
                email,
                password_hash,
                image: input.image,
            })
            .await?;

        info!(user_id = %user.id, "User registered");

        self.session_for(user.id, user.email)
    }

    /// Verifies credentials and returns a fresh session
    ///
    /// # Errors
    ///
    /// - `AuthError::Validation` if the input is malformed
    /// - `AuthError::InvalidCredentials` if the email is unknown or the
    ///   password does not match
    /// - `AuthError::Internal` on store failure, an unreadable stored hash,
    ///   or a signing failure
    pub async fn login(&self, mut input: LoginInput) -> Result<AuthSession, AuthError> {
        input.email = normalize_email(&input.email);
        input
            .validate()
            .map_err(|e| AuthError::Validation(field_errors(&e)))?;

        let email = input.email.as_str();

        let Some(user) = self.users.find_user_by_email(email).await? else {
            debug!("Login rejected: unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        let matches = self
            .hasher
            .verify_async(&input.password, &user.password_hash)
            .await
            .map_err(|e| {
                error!(user_id = %user.id, error = %e, "Stored password hash unusable");
                AuthError::from(e)
            })?;

        if !matches {
            debug!(user_id = %user.id, "Login rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        info!(user_id = %user.id, "User logged in");

        self.session_for(user.id, user.email)
    }

    fn session_for(&self, user_id: Uuid, email: String) -> Result<AuthSession, AuthError> {
        let token = self.tokens.issue(&TokenSubject {
            user_id,
            email: email.clone(),
        })?;

        Ok(AuthSession {
            user_id,
            email,
            token,
        })
    }
}
