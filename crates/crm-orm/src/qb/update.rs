use super::QueryBuilder;
use crate::error::{OrmError, OrmResult};
use crate::params::ParamList;
use crate::value::Value;

impl QueryBuilder {
    /// Single-row UPDATE by id. Errors with `UpdateEmpty` if `payload` is
    /// empty — an UPDATE with no SET clause is always a caller bug, never a
    /// silent no-op.
    pub fn update_by_id(&self, payload: &[(String, Value)], id: impl Into<Value>) -> OrmResult<(String, ParamList)> {
        if payload.is_empty() {
            return Err(OrmError::UpdateEmpty);
        }
        let mut params = ParamList::new();
        let assignments: Vec<String> = payload
            .iter()
            .map(|(col, v)| {
                let idx = params.push(v.clone());
                format!("{} = {}", self.qcol(col), self.dialect.make_placeholder(idx))
            })
            .collect();
        let id_idx = params.push(id);
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = {}",
            self.qtable(),
            assignments.join(", "),
            self.qcol("id"),
            self.dialect.make_placeholder(id_idx)
        );
        Ok((sql, params))
    }

    /// Same SET clause applied to every row whose id is in `ids`.
    pub fn update_bulk(&self, payload: &[(String, Value)], ids: &[i64]) -> OrmResult<(String, ParamList)> {
        if payload.is_empty() {
            return Err(OrmError::UpdateEmpty);
        }
        let mut params = ParamList::new();
        let assignments: Vec<String> = payload
            .iter()
            .map(|(col, v)| {
                let idx = params.push(v.clone());
                format!("{} = {}", self.qcol(col), self.dialect.make_placeholder(idx))
            })
            .collect();
        let ids_idx = params.push(Value::List(ids.iter().map(|i| Value::Int(*i)).collect()));
        let placeholder = self.dialect.make_placeholder(ids_idx);
        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            self.qtable(),
            assignments.join(", "),
            self.dialect.in_list_clause(&self.qcol("id"), &placeholder)
        );
        Ok((sql, params))
    }
}
