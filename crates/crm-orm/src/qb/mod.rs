//! Query builder.
//!
//! A pure, stateless SQL generator: every method takes the ingredients it
//! needs and returns `(sql, params)`. It never touches a connection — that's
//! `Session`'s job. Keeping it side-effect free makes every operation here
//! trivially unit-testable without a database.

mod delete;
mod insert;
mod relation;
mod select;
mod update;

pub use delete::*;
pub use insert::*;
pub use relation::*;
pub use select::*;
pub use update::*;

use crate::dialect::Dialect;
use crate::params::ParamList;
use crate::value::Value;

/// Sort order for `search`, validated against a closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    pub fn parse(raw: &str) -> Order {
        if raw.eq_ignore_ascii_case("asc") {
            Order::Asc
        } else {
            Order::Desc
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

pub struct QueryBuilder {
    pub table: String,
    pub dialect: Dialect,
}

impl QueryBuilder {
    pub fn new(table: impl Into<String>, dialect: Dialect) -> Self {
        Self {
            table: table.into(),
            dialect,
        }
    }

    fn qtable(&self) -> String {
        self.dialect.escape_identifier(&self.table)
    }

    fn qcol(&self, name: &str) -> String {
        self.dialect.escape_identifier(name)
    }

    fn select_list(&self, columns: &[&str]) -> String {
        columns.iter().map(|c| self.qcol(c)).collect::<Vec<_>>().join(", ")
    }

    /// Unconditional `COUNT(*)`.
    pub fn table_len(&self) -> (String, ParamList) {
        (format!("SELECT COUNT(*) AS count FROM {}", self.qtable()), ParamList::new())
    }

    /// `SELECT 1 … LIMIT 1` with an optional WHERE.
    pub fn exists(&self, where_clause: Option<&str>, mut params: ParamList) -> (String, ParamList) {
        let mut sql = format!("SELECT 1 FROM {}", self.qtable());
        if let Some(w) = where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(w);
        }
        sql.push_str(" LIMIT 1");
        if where_clause.is_none() {
            params = ParamList::new();
        }
        (sql, params)
    }

    /// `SELECT COUNT(*)` with an optional WHERE.
    pub fn count(&self, where_clause: Option<&str>, params: ParamList) -> (String, ParamList) {
        let mut sql = format!("SELECT COUNT(*) AS count FROM {}", self.qtable());
        if let Some(w) = where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(w);
        }
        (sql, params)
    }
}

/// Convert a column→value map into the ordered lists a VALUES/SET clause
/// needs, with a stable column order (insertion order of the map).
pub(crate) fn ordered_entries(payload: &[(String, Value)]) -> (Vec<&str>, Vec<&Value>) {
    let columns = payload.iter().map(|(c, _)| c.as_str()).collect();
    let values = payload.iter().map(|(_, v)| v).collect();
    (columns, values)
}
