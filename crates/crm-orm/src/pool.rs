//! Connection pool helpers (feature `pool`).

use crate::error::{OrmError, OrmResult};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::NoTls;

/// Create a connection pool from a database URL using `NoTls` and a caller-
/// chosen pool size. Callers own their own `Config` type (`crm-cli`'s, for
/// instance, sources both `database_url` and `max_size` from the
/// environment) — this crate has no opinion on where those values come
/// from.
pub fn create_pool(database_url: &str, max_size: usize) -> OrmResult<Pool> {
    let pg_config: tokio_postgres::Config = database_url
        .parse()
        .map_err(|e: tokio_postgres::Error| OrmError::configuration(format!("invalid database url: {e}")))?;

    let manager_config = ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    };
    let manager = Manager::from_config(pg_config, NoTls, manager_config);
    Pool::builder(manager)
        .max_size(max_size)
        .build()
        .map_err(|e| OrmError::Pool(e.to_string()))
}
