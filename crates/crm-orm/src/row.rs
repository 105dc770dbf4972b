//! Row mapping traits.

use crate::error::OrmResult;
use tokio_postgres::Row;

/// Converts a database row into a Rust struct. Normally derived by
/// `#[derive(Model)]` alongside the field registry.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> OrmResult<Self>;
}

/// Typed, decode-error-wrapped column access.
pub trait RowExt {
    fn try_get_column<T>(&self, column: &str) -> OrmResult<T>
    where
        T: for<'a> tokio_postgres::types::FromSql<'a>;
}

impl RowExt for Row {
    fn try_get_column<T>(&self, column: &str) -> OrmResult<T>
    where
        T: for<'a> tokio_postgres::types::FromSql<'a>,
    {
        self.try_get(column)
            .map_err(|e| crate::error::OrmError::decode(column, e.to_string()))
    }
}
