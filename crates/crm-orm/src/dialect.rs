//! Database dialects.
//!
//! Centralizes identifier escaping, placeholder style and `RETURNING`
//! support so the query builder never special-cases a database by name.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    MySql,
    Clickhouse,
}

impl Dialect {
    /// Wrap an identifier in the dialect's quoting style.
    pub fn escape_identifier(self, name: &str) -> String {
        match self {
            Dialect::Postgres => format!("\"{name}\""),
            Dialect::MySql | Dialect::Clickhouse => format!("`{name}`"),
        }
    }

    /// Build a comma-separated placeholder list starting at `start`.
    pub fn make_placeholders(self, n: usize, start: usize) -> String {
        match self {
            Dialect::Postgres => (start..start + n)
                .map(|i| format!("${i}"))
                .collect::<Vec<_>>()
                .join(", "),
            Dialect::MySql | Dialect::Clickhouse => vec!["%s"; n].join(", "),
        }
    }

    /// A single placeholder at the given 1-based index.
    pub fn make_placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::MySql | Dialect::Clickhouse => "%s".to_string(),
        }
    }

    pub fn supports_returning(self) -> bool {
        matches!(self, Dialect::Postgres)
    }

    /// `id = ANY($1::int[])` on Postgres, `IN (...)` elsewhere.
    pub fn in_list_clause(self, column: &str, placeholder: &str) -> String {
        match self {
            Dialect::Postgres => format!("{column} = ANY({placeholder}::int[])"),
            Dialect::MySql | Dialect::Clickhouse => format!("{column} IN ({placeholder})"),
        }
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Dialect::Postgres
    }
}
