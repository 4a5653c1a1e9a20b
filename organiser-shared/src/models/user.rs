/// User model
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY,
///     name VARCHAR(100) NOT NULL,
///     surname VARCHAR(100) NOT NULL,
///     age INTEGER NOT NULL,
///     email TEXT NOT NULL,
///     password_hash TEXT NOT NULL,
///     image TEXT,
///     projects UUID[] NOT NULL DEFAULT '{}',
///     chats UUID[] NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// CREATE UNIQUE INDEX users_email_key ON users (email);
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored user record
///
/// `password_hash` is skipped by serde, so a `User` can never leak it into a
/// response body even if serialised directly. API responses use
/// [`UserProfile`] anyway.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Given name
    pub name: String,

    /// Family name
    pub surname: String,

    /// Age in years
    pub age: i32,

    /// Email address, trimmed and lowercased
    pub email: String,

    /// Argon2id PHC string
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Profile image reference (URL returned by the blob store)
    pub image: Option<String>,

    /// Projects the user owns or participates in, in the order joined
    pub projects: Vec<Uuid>,

    /// Chat references
    pub chats: Vec<Uuid>,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a user
///
/// Built by the authentication service after validation and hashing; never
/// deserialised from a request.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub surname: String,
    pub age: i32,
    /// Already normalised with [`normalize_email`]
    pub email: String,
    pub password_hash: String,
    pub image: Option<String>,
}

/// Public view of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub age: i32,
    pub email: String,
    pub image: Option<String>,
    pub projects: Vec<Uuid>,
    pub chats: Vec<Uuid>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            surname: user.surname,
            age: user.age,
            email: user.email,
            image: user.image,
            projects: user.projects,
            chats: user.chats,
        }
    }
}

/// Canonical form of an email address for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
