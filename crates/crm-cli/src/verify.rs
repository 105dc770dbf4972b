//! Post-bootstrap introspection: confirms the tables DDL just created (or
//! found already present) actually exist, rather than trusting the DDL
//! step blindly.

use crm_orm::{Cursor, FromRow, Session};
use deadpool_postgres::Pool;

#[derive(FromRow)]
struct ExistingTable {
    table_name: String,
}

/// Queries `information_schema.tables` for the given table names, decoding
/// rows through `#[derive(FromRow)]` rather than hand-indexing columns.
/// Returns the subset that actually exist in `public`.
pub async fn existing_tables(pool: &Pool, expected: &[&str]) -> anyhow::Result<Vec<String>> {
    let session = Session::new(pool.clone());
    let sql = "SELECT table_name FROM information_schema.tables \
               WHERE table_schema = 'public' AND table_name = ANY($1) ORDER BY table_name";
    let owned: Vec<String> = expected.iter().map(|s| s.to_string()).collect();
    let rows = session.execute(sql, &[&owned], Cursor::Fetch).await?.into_rows()?;
    rows.iter()
        .map(|r| ExistingTable::from_row(r).map(|t| t.table_name))
        .collect::<crm_orm::OrmResult<Vec<_>>>()
        .map_err(Into::into)
}
