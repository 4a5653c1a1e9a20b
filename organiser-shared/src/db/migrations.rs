/// Embedded schema migrations
///
/// SQL files in `organiser-shared/migrations/` are compiled into the binary
/// by `sqlx::migrate!` and applied at server startup when the Postgres
/// backend is selected. Applied versions are tracked in `_sqlx_migrations`.

use sqlx::postgres::PgPool;
use tracing::{info, warn};

/// Applies all pending migrations
///
/// # Errors
///
/// Returns an error if a migration fails or an already-applied migration
/// has been modified.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Starting database migrations");

    match sqlx::migrate!("./migrations").run(pool).await {
        Ok(()) => {
            info!("Database migrations applied");
            Ok(())
        }
        Err(e) => {
            warn!("Migration failed: {}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_migrations_are_embedded() {
        assert!(sqlx::migrate!("./migrations").iter().count() >= 1);
    }
}
