/// Configuration management for the API server
///
/// Configuration is read once at startup and passed into the application
/// state; nothing below `main` reads the environment.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 5000)
/// - `STORE_BACKEND`: `postgres` or `memory` (default: postgres)
/// - `DATABASE_URL`: PostgreSQL connection string (required for postgres)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Secret key for token signing (required, 32+ characters)
/// - `JWT_TTL_SECONDS`: Token lifetime (default: 3600)
/// - `JWT_ISSUER`: Token issuer claim (default: project-organiser)
/// - `PASSWORD_MEMORY_KIB`, `PASSWORD_ITERATIONS`, `PASSWORD_PARALLELISM`:
///   Argon2id work factor (default: 19456, 2, 1)
/// - `UPLOAD_DIR`: Directory for uploaded images (default: uploads/images)
/// - `UPLOAD_PUBLIC_BASE_URL`: Base of returned image references
///   (default: http://localhost:5000)
/// - `UPLOAD_MAX_BYTES`: Largest accepted image (default: 500000)
/// - `LOG_FORMAT`: `pretty` or `json` (default: pretty)
/// - `RUST_LOG`: Log filter (default: organiser_api=debug,tower_http=debug)
///
/// # Example
///
/// ```no_run
/// use organiser_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use organiser_shared::auth::password::HashingParams;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Persistence backend
    pub store: StoreConfig,

    /// Token configuration
    pub jwt: JwtConfig,

    /// Password hashing work factor
    pub password: HashingParams,

    /// Image uploads
    pub uploads: UploadConfig,

    /// Log output format
    pub log_format: LogFormat,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,
}

/// Which store backend to run against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StoreConfig {
    /// PostgreSQL via sqlx
    Postgres {
        url: String,
        max_connections: u32,
    },

    /// Process-local maps; data is lost on restart
    Memory,
}

/// Token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for token signing
    ///
    /// IMPORTANT: This must be kept secret and should be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    #[serde(skip_serializing)]
    pub secret: String,

    /// Token lifetime in seconds
    pub ttl_seconds: i64,

    /// Issuer claim written into and required from every token
    pub issuer: String,
}

/// Image upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub dir: String,
    pub public_base_url: String,
    pub max_bytes: usize,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => anyhow::bail!("LOG_FORMAT must be 'pretty' or 'json', got '{}'", other),
        }
    }
}

/// Reads `key`, falling back to `default`, and parses it
fn parse_var<T>(key: &str, default: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse::<T>()
        .with_context(|| format!("{} has an invalid value: '{}'", key, raw))
}

/// Longest accepted token lifetime (one year)
pub const MAX_TOKEN_TTL_SECONDS: i64 = 31_536_000;

fn check_token_ttl(ttl_seconds: i64) -> anyhow::Result<i64> {
    if !(1..=MAX_TOKEN_TTL_SECONDS).contains(&ttl_seconds) {
        anyhow::bail!(
            "JWT_TTL_SECONDS must be between 1 and {}, got {}",
            MAX_TOKEN_TTL_SECONDS,
            ttl_seconds
        );
    }
    Ok(ttl_seconds)
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `JWT_SECRET` is missing or shorter than 32 characters
    /// - `JWT_TTL_SECONDS` is outside `1..=MAX_TOKEN_TTL_SECONDS`
    /// - `DATABASE_URL` is missing while the postgres backend is selected
    /// - Environment variables have invalid values
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = parse_var::<u16>("API_PORT", "5000")?;

        let backend = env::var("STORE_BACKEND").unwrap_or_else(|_| "postgres".to_string());
        let store = match backend.to_ascii_lowercase().as_str() {
            "postgres" => {
                let url = env::var("DATABASE_URL")
                    .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
                let max_connections = parse_var::<u32>("DATABASE_MAX_CONNECTIONS", "10")?;
                StoreConfig::Postgres {
                    url,
                    max_connections,
                }
            }
            "memory" => StoreConfig::Memory,
            other => anyhow::bail!("STORE_BACKEND must be 'postgres' or 'memory', got '{}'", other),
        };

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let ttl_seconds = check_token_ttl(parse_var::<i64>("JWT_TTL_SECONDS", "3600")?)?;

        let issuer = env::var("JWT_ISSUER").unwrap_or_else(|_| "project-organiser".to_string());

        let password = HashingParams {
            memory_kib: parse_var("PASSWORD_MEMORY_KIB", "19456")?,
            iterations: parse_var("PASSWORD_ITERATIONS", "2")?,
            parallelism: parse_var("PASSWORD_PARALLELISM", "1")?,
        };

        let uploads = UploadConfig {
            dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads/images".to_string()),
            public_base_url: env::var("UPLOAD_PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:5000".to_string()),
            max_bytes: parse_var("UPLOAD_MAX_BYTES", "500000")?,
        };

        let log_format = env::var("LOG_FORMAT")
            .unwrap_or_else(|_| "pretty".to_string())
            .parse::<LogFormat>()?;

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
            },
            store,
            jwt: JwtConfig {
                secret: jwt_secret,
                ttl_seconds,
                issuer,
            },
            password,
            uploads,
            log_format,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Token lifetime as a duration
    ///
    /// Values `from_env` would reject saturate instead of panicking; issuing
    /// then fails with a signing error.
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::try_seconds(self.jwt.ttl_seconds).unwrap_or(chrono::Duration::MAX)
    }
}
