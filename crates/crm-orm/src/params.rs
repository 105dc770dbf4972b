//! Parameter collection shared by the filter parser and the query builder.
//!
//! Both need to accumulate SQL parameters while recursively building a
//! clause, then hand tokio-postgres a `&[&(dyn ToSql + Sync)]` slice at
//! execution time. `ParamList` owns the values so nested builders can each
//! push onto the same list without fighting the borrow checker.

use crate::value::Value;
use std::sync::Arc;
use tokio_postgres::types::ToSql;

#[derive(Clone, Default)]
pub struct ParamList {
    values: Vec<Arc<Value>>,
}

impl ParamList {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Push a value, returning its 1-based position (Postgres placeholder
    /// index).
    pub fn push(&mut self, value: impl Into<Value>) -> usize {
        self.values.push(Arc::new(value.into()));
        self.values.len()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn extend(&mut self, other: ParamList) {
        self.values.extend(other.values);
    }

    /// Borrow the collected values as a `tokio_postgres` parameter slice.
    pub fn as_sql_params(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.values
            .iter()
            .map(|v| v.as_ref() as &(dyn ToSql + Sync))
            .collect()
    }

    pub fn values(&self) -> &[Arc<Value>] {
        &self.values
    }
}

impl std::fmt::Debug for ParamList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.values.iter()).finish()
    }
}
