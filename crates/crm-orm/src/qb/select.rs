use super::{Order, QueryBuilder};
use crate::params::ParamList;
use crate::value::Value;

pub struct SearchSpec<'a> {
    pub fields: &'a [&'a str],
    pub where_clause: Option<&'a str>,
    pub sort: &'a str,
    pub order: Order,
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub limit: i64,
}

impl QueryBuilder {
    /// `SELECT fields FROM table WHERE id = $1 LIMIT 1`.
    pub fn get_by_id(&self, fields: &[&str], id: impl Into<Value>) -> (String, ParamList) {
        let mut params = ParamList::new();
        let idx = params.push(id);
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = {} LIMIT 1",
            self.select_list(fields),
            self.qtable(),
            self.qcol("id"),
            self.dialect.make_placeholder(idx)
        );
        (sql, params)
    }

    /// Search with filter, sort (validated by the caller against the
    /// stored-column set — silently substituted with the first stored
    /// column when invalid), order and pagination. Filter params are
    /// prepended to pagination params in the returned list.
    pub fn search(&self, spec: &SearchSpec<'_>, mut params: ParamList) -> (String, ParamList) {
        let mut sql = format!(
            "SELECT {} FROM {}",
            self.select_list(spec.fields),
            self.qtable()
        );
        if let Some(w) = spec.where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(w);
        }
        sql.push_str(&format!(
            " ORDER BY {} {}",
            self.qcol(spec.sort),
            spec.order.as_sql()
        ));

        match (spec.start, spec.end) {
            (Some(start), Some(end)) => {
                let limit = (end - start).max(0);
                let limit_idx = params.push(limit);
                let offset_idx = params.push(start);
                sql.push_str(&format!(
                    " LIMIT {} OFFSET {}",
                    self.dialect.make_placeholder(limit_idx),
                    self.dialect.make_placeholder(offset_idx)
                ));
            }
            _ => {
                let limit_idx = params.push(spec.limit);
                sql.push_str(&format!(" LIMIT {}", self.dialect.make_placeholder(limit_idx)));
            }
        }

        (sql, params)
    }
}
