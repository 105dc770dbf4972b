use super::QueryBuilder;
use crate::params::ParamList;
use crate::value::Value;

impl QueryBuilder {
    /// Delete one row by id.
    pub fn delete_by_id(&self, id: impl Into<Value>) -> (String, ParamList) {
        let mut params = ParamList::new();
        let idx = params.push(id);
        let sql = format!(
            "DELETE FROM {} WHERE {} = {}",
            self.qtable(),
            self.qcol("id"),
            self.dialect.make_placeholder(idx)
        );
        (sql, params)
    }

    /// Bulk delete by id list — `id = ANY($1::int[])` on PostgreSQL,
    /// `IN (…)` elsewhere.
    pub fn delete_bulk(&self, ids: &[i64]) -> (String, ParamList) {
        let mut params = ParamList::new();
        let idx = params.push(Value::List(ids.iter().map(|i| Value::Int(*i)).collect()));
        let placeholder = self.dialect.make_placeholder(idx);
        let sql = format!(
            "DELETE FROM {} WHERE {}",
            self.qtable(),
            self.dialect.in_list_clause(&self.qcol("id"), &placeholder)
        );
        (sql, params)
    }
}
