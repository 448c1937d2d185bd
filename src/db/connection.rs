use std::time::Duration;

use diesel::pg::PgConnection;
use diesel::r2d2::ConnectionManager;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use r2d2::Pool;

use crate::db::gateway::DbError;
use crate::settings::Settings;

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Builds the pool eagerly: `build` fails if the initial connections cannot
/// be established, so a dead database is reported before the server binds.
pub fn init_pool(settings: &Settings) -> Result<PgPool, DbError> {
    let manager = ConnectionManager::<PgConnection>::new(settings.database_url());
    let pool = Pool::builder()
        .max_size(settings.db_pool_size)
        .connection_timeout(Duration::from_secs(settings.db_timeout_seconds))
        .build(manager)?;
    Ok(pool)
}

pub fn run_migrations(pool: &PgPool) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
    let mut pooled = pool.get()?;
    let conn: &mut PgConnection = &mut pooled;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    Ok(applied.len())
}
