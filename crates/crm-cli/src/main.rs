//! Schema bootstrap: opens a pool from `DATABASE_URL`, creates every
//! registered model's table, then applies the foreign keys DDL deferred
//! until all tables exist. No migration versioning or rollback — run this
//! once against an empty database, or again to pick up newly added models
//! (table creation is `CREATE TABLE IF NOT EXISTS`).

mod config;
mod verify;

use anyhow::Context;
use config::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = Config::load()?;
    if !config.extension_packages.is_empty() {
        tracing::info!(packages = ?config.extension_packages, "extension packages configured");
    }

    let pool = crm_orm::create_pool(&config.database_url, config.pool_size).context("failed to create connection pool")?;

    let registries = demo_crm::field_registries();
    tracing::info!(models = registries.len(), "applying schema");
    let foreign_keys = crm_orm::apply_schema(&pool, &registries).await.context("failed to apply schema")?;

    tracing::info!(foreign_keys = foreign_keys.len(), "applying deferred foreign keys");
    crm_orm::apply_foreign_keys(&pool, &foreign_keys).await.context("failed to apply foreign keys")?;

    let expected: Vec<&str> = registries.iter().map(|r| r.table.as_str()).collect();
    let confirmed = verify::existing_tables(&pool, &expected)
        .await
        .context("failed to verify created tables")?;
    tracing::info!(confirmed = confirmed.len(), expected = expected.len(), "verified table presence");

    println!("schema bootstrap complete: {} table(s), {} foreign key(s)", registries.len(), foreign_keys.len());
    Ok(())
}
