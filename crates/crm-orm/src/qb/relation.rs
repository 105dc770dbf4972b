use super::{Order, QueryBuilder};
use crate::dialect::Dialect;
use crate::params::ParamList;
use crate::value::Value;

impl QueryBuilder {
    /// Many2many rows for one parent: join the link table with the target
    /// table.
    pub fn get_many2many(
        &self,
        link_table: &str,
        col_self: &str,
        col_other: &str,
        target_fields: &[&str],
        parent_id: impl Into<Value>,
    ) -> (String, ParamList) {
        let mut params = ParamList::new();
        let idx = params.push(parent_id);
        let target_cols: Vec<String> = target_fields
            .iter()
            .map(|c| format!("t.{}", self.qcol(c)))
            .collect();
        let sql = format!(
            "SELECT {} FROM {} l JOIN {} t ON l.{} = t.{} WHERE l.{} = {}",
            target_cols.join(", "),
            self.dialect.escape_identifier(link_table),
            self.qtable(),
            self.qcol(col_other),
            self.qcol("id"),
            self.qcol(col_self),
            self.dialect.make_placeholder(idx)
        );
        (sql, params)
    }

    /// Many2many rows for many parents at once: same join with
    /// `col_self IN (…)`, projecting an extra `m2m_id` column equal to the
    /// owning parent's id so the caller can bucket rows back to owners.
    pub fn get_many2many_batch(
        &self,
        link_table: &str,
        col_self: &str,
        col_other: &str,
        target_fields: &[&str],
        parent_ids: &[i64],
    ) -> (String, ParamList) {
        let mut params = ParamList::new();
        let idx = params.push(Value::List(parent_ids.iter().map(|i| Value::Int(*i)).collect()));
        let target_cols: Vec<String> = target_fields
            .iter()
            .map(|c| format!("t.{}", self.qcol(c)))
            .collect();
        let placeholder = self.dialect.make_placeholder(idx);
        let sql = format!(
            "SELECT {}, l.{} AS m2m_id FROM {} l JOIN {} t ON l.{} = t.{} WHERE {}",
            target_cols.join(", "),
            self.qcol(col_self),
            self.dialect.escape_identifier(link_table),
            self.qtable(),
            self.qcol(col_other),
            self.qcol("id"),
            self.dialect
                .in_list_clause(&format!("l.{}", self.qcol(col_self)), &placeholder)
        );
        (sql, params)
    }

    /// Many2many rows for one parent, sorted and paginated — backs the
    /// `/search_many2many` route, which needs client-chosen fields, sort
    /// column and a window instead of the fixed `(id, name)` projection
    /// `get_many2many` returns for relation hydration.
    pub fn get_many2many_page(
        &self,
        link_table: &str,
        col_self: &str,
        col_other: &str,
        target_fields: &[&str],
        parent_id: impl Into<Value>,
        sort: &str,
        order: Order,
        start: Option<i64>,
        end: Option<i64>,
        limit: i64,
    ) -> (String, ParamList) {
        let mut params = ParamList::new();
        let idx = params.push(parent_id);
        let target_cols: Vec<String> = target_fields
            .iter()
            .map(|c| format!("t.{}", self.qcol(c)))
            .collect();
        let mut sql = format!(
            "SELECT {} FROM {} l JOIN {} t ON l.{} = t.{} WHERE l.{} = {} ORDER BY t.{} {}",
            target_cols.join(", "),
            self.dialect.escape_identifier(link_table),
            self.qtable(),
            self.qcol(col_other),
            self.qcol("id"),
            self.qcol(col_self),
            self.dialect.make_placeholder(idx),
            self.qcol(sort),
            order.as_sql(),
        );
        if let Some(start) = start {
            let start_idx = params.push(Value::Int(start));
            sql.push_str(&format!(" OFFSET {}", self.dialect.make_placeholder(start_idx)));
        }
        let window = end.map(|end| (end - start.unwrap_or(0)).max(0)).unwrap_or(limit);
        let limit_idx = params.push(Value::Int(window));
        sql.push_str(&format!(" LIMIT {}", self.dialect.make_placeholder(limit_idx)));
        (sql, params)
    }

    /// Total row count for one parent's many2many relation, ignoring
    /// pagination — used alongside [`Self::get_many2many_page`] to answer
    /// `{data, total}`.
    pub fn count_many2many(&self, link_table: &str, col_self: &str, parent_id: impl Into<Value>) -> (String, ParamList) {
        let mut params = ParamList::new();
        let idx = params.push(parent_id);
        let sql = format!(
            "SELECT COUNT(*) AS count FROM {} WHERE {} = {}",
            self.dialect.escape_identifier(link_table),
            self.qcol(col_self),
            self.dialect.make_placeholder(idx)
        );
        (sql, params)
    }

    /// `INSERT INTO link_table (col_other, col_self) VALUES (?,?), …` — one
    /// row per pair.
    pub fn link_many2many(
        &self,
        link_table: &str,
        col_self: &str,
        col_other: &str,
        pairs: &[(i64, i64)],
    ) -> (String, ParamList) {
        let mut params = ParamList::new();
        let mut groups = Vec::with_capacity(pairs.len());
        for &(self_id, other_id) in pairs {
            let a = params.push(Value::Int(self_id));
            let b = params.push(Value::Int(other_id));
            groups.push(format!(
                "({}, {})",
                self.dialect.make_placeholder(a),
                self.dialect.make_placeholder(b)
            ));
        }
        let sql = format!(
            "INSERT INTO {} ({}, {}) VALUES {}",
            self.dialect.escape_identifier(link_table),
            self.qcol(col_self),
            self.qcol(col_other),
            groups.join(", ")
        );
        (sql, params)
    }

    /// `DELETE FROM link_table WHERE col_self = ? AND col_other IN (ids)`.
    pub fn unlink_many2many(
        &self,
        link_table: &str,
        col_self: &str,
        col_other: &str,
        self_id: i64,
        other_ids: &[i64],
    ) -> (String, ParamList) {
        let mut params = ParamList::new();
        let self_idx = params.push(Value::Int(self_id));
        let others_idx = params.push(Value::List(other_ids.iter().map(|i| Value::Int(*i)).collect()));
        let placeholder = self.dialect.make_placeholder(others_idx);
        let sql = format!(
            "DELETE FROM {} WHERE {} = {} AND {}",
            self.dialect.escape_identifier(link_table),
            self.qcol(col_self),
            self.dialect.make_placeholder(self_idx),
            self.dialect.in_list_clause(&self.qcol(col_other), &placeholder)
        );
        (sql, params)
    }

    /// Many2one / PolymorphicMany2one batch load: `SELECT … WHERE id IN (…)`
    /// over the *target* table, one query for the distinct, non-null FK
    /// values collected across all loaded parents.
    pub fn batch_many2one(dialect: Dialect, target_table: &str, target_fields: &[&str], ids: &[i64]) -> (String, ParamList) {
        let qb = QueryBuilder::new(target_table, dialect);
        let mut params = ParamList::new();
        let idx = params.push(Value::List(ids.iter().map(|i| Value::Int(*i)).collect()));
        let placeholder = qb.dialect.make_placeholder(idx);
        let sql = format!(
            "SELECT {} FROM {} WHERE {}",
            qb.select_list(target_fields),
            qb.qtable(),
            qb.dialect.in_list_clause(&qb.qcol("id"), &placeholder)
        );
        (sql, params)
    }

    /// One2many / PolymorphicOne2many batch load: `SELECT … WHERE back_field
    /// IN (parent_ids)`, optionally filtered to a single `res_model` for the
    /// polymorphic case.
    pub fn batch_one2many(
        dialect: Dialect,
        target_table: &str,
        target_fields: &[&str],
        back_field: &str,
        parent_ids: &[i64],
        res_model: Option<&str>,
    ) -> (String, ParamList) {
        let qb = QueryBuilder::new(target_table, dialect);
        let mut params = ParamList::new();
        let idx = params.push(Value::List(parent_ids.iter().map(|i| Value::Int(*i)).collect()));
        let placeholder = qb.dialect.make_placeholder(idx);
        let mut sql = format!(
            "SELECT {} FROM {} WHERE {}",
            qb.select_list(target_fields),
            qb.qtable(),
            qb.dialect.in_list_clause(&qb.qcol(back_field), &placeholder)
        );
        if let Some(model) = res_model {
            let model_idx = params.push(Value::Text(model.to_string()));
            sql.push_str(&format!(
                " AND {} = {}",
                qb.qcol("res_model"),
                qb.dialect.make_placeholder(model_idx)
            ));
        }
        (sql, params)
    }
}
