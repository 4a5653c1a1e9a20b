/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`token`]: signed, expiring bearer session tokens (HS256)
/// - [`service`]: signup and login
/// - [`middleware`]: bearer token extraction and the [`Identity`](middleware::Identity) extractor
/// - [`authorization`]: project owner/participant checks
///
/// # Security Properties
///
/// - **Password Hashing**: Argon2id with a random salt per hash and a tunable work factor
/// - **Tokens**: HS256 with issuer check and zero expiry leeway; signature checked before expiry
/// - **Non-enumerable login**: unknown email and wrong password fail identically
/// - **Stateless**: request authentication never reads the credential store, so
///   tokens cannot be revoked before they expire
///
/// # Example
///
/// ```no_run
/// use organiser_shared::auth::password::{HashingParams, PasswordHasher};
/// use organiser_shared::auth::token::{TokenIssuer, TokenSubject};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hasher = PasswordHasher::new(HashingParams::default())?;
/// let hash = hasher.hash("user_password")?;
/// assert!(hasher.verify("user_password", &hash)?);
///
/// let issuer = TokenIssuer::new("secret-key-at-least-32-bytes-long!!", "project-organiser", chrono::Duration::hours(1));
/// let token = issuer.issue(&TokenSubject { user_id: uuid::Uuid::new_v4(), email: "a@x.com".into() })?;
/// assert_eq!(issuer.verify(&token)?.email, "a@x.com");
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod middleware;
pub mod password;
pub mod service;
pub mod token;
