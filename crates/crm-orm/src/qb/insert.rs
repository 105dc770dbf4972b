use super::QueryBuilder;
use crate::params::ParamList;
use crate::value::Value;

impl QueryBuilder {
    /// Single-row INSERT. Appends `RETURNING id` when the dialect supports
    /// it; otherwise the caller obtains the id from the driver's
    /// last-insert hook.
    pub fn insert(&self, payload: &[(String, Value)]) -> (String, ParamList) {
        let mut params = ParamList::new();
        let columns: Vec<String> = payload.iter().map(|(c, _)| self.qcol(c)).collect();
        let placeholders: Vec<String> = payload
            .iter()
            .map(|(_, v)| {
                let idx = params.push(v.clone());
                self.dialect.make_placeholder(idx)
            })
            .collect();

        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.qtable(),
            columns.join(", "),
            placeholders.join(", ")
        );
        if self.dialect.supports_returning() {
            sql.push_str(&format!(" RETURNING {}", self.qcol("id")));
        }
        (sql, params)
    }

    /// Bulk INSERT, one `VALUES (…)` group per row, same column set for
    /// every row. Params are flattened row-major.
    pub fn insert_bulk(&self, columns: &[&str], rows: &[Vec<Value>]) -> (String, ParamList) {
        let mut params = ParamList::new();
        let qcolumns: Vec<String> = columns.iter().map(|c| self.qcol(c)).collect();

        let mut groups = Vec::with_capacity(rows.len());
        for row in rows {
            let placeholders: Vec<String> = row
                .iter()
                .map(|v| {
                    let idx = params.push(v.clone());
                    self.dialect.make_placeholder(idx)
                })
                .collect();
            groups.push(format!("({})", placeholders.join(", ")));
        }

        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES {}",
            self.qtable(),
            qcolumns.join(", "),
            groups.join(", ")
        );
        if self.dialect.supports_returning() {
            sql.push_str(&format!(" RETURNING {}", self.qcol("id")));
        }
        (sql, params)
    }
}
