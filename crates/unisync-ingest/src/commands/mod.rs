//! Command implementations

pub mod run;
pub mod status;

use anyhow::Result;
use sqlx::PgPool;
use unisync_server::config::DatabaseConfig;
use unisync_server::db::{self, DbConfig};

/// Connect with `DATABASE_*` settings and apply migrations
pub async fn connect() -> Result<PgPool> {
    let database = DatabaseConfig::from_env();
    database.validate()?;

    let pool = db::create_pool(&DbConfig::from(&database)).await?;
    db::run_migrations(&pool).await?;

    Ok(pool)
}
