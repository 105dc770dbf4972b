//! Process configuration, loaded from the environment (`.env` via
//! `dotenvy`, then `std::env`) rather than a TOML file — there's no
//! per-project file to point at, just a `DATABASE_URL` the way every other
//! consumer of this pool expects it.

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub pool_size: usize,
    /// Names of extension packages expected to have registered their
    /// fields (via `crm_orm::extension::register`) before this binary
    /// builds any model's registry. Registration itself happens in each
    /// package's own startup code; this list is informational only — there
    /// is no dynamic loader that turns a name here into a `register` call.
    pub extension_packages: Vec<String>,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let pool_size = match std::env::var("POOL_SIZE") {
            Ok(v) => v.parse().context("POOL_SIZE must be a positive integer")?,
            Err(_) => 10,
        };
        let extension_packages = std::env::var("EXTENSION_PACKAGES")
            .ok()
            .map(|v| v.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect())
            .unwrap_or_default();

        Ok(Self { database_url, pool_size, extension_packages })
    }
}
