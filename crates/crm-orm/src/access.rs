//! Access checker.
//!
//! A pluggable row/table access hook consulted at every CRUD entry point.
//! The checker itself is installed once at startup; the *session* it
//! checks against (the current caller identity) is task-local, matching
//! the ambient-context pattern used for transactions in `session.rs`.

use crate::error::{OrmError, OrmResult};
use async_trait::async_trait;
use serde_json::Value as Json;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
}

/// Opaque caller identity consulted by the access checker. `demo-crm` and
/// other consumers define what actually lives in here (user id, roles,
/// tenant) — the core only needs to move it around.
pub type CallerContext = Arc<dyn std::any::Any + Send + Sync>;

tokio::task_local! {
    static CURRENT_CALLER: Option<CallerContext>;
}

/// Run `body` with `caller` installed as the current access-checker
/// context for this task.
pub async fn with_caller<F, Fut, T>(caller: CallerContext, body: F) -> T
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = T>,
{
    CURRENT_CALLER.scope(Some(caller), body()).await
}

pub fn current_caller() -> Option<CallerContext> {
    CURRENT_CALLER.try_with(|c| c.clone()).unwrap_or(None)
}

#[async_trait]
pub trait AccessChecker: Send + Sync {
    async fn check_table_access(&self, table: &str, op: Operation) -> OrmResult<bool>;

    async fn check_row_access(&self, table: &str, op: Operation, ids: &[i64]) -> OrmResult<bool>;

    /// An additional filter expression (same JSON grammar as C2) to prepend
    /// to the caller's own filter on `search`.
    async fn get_domain_filter(&self, table: &str, op: Operation) -> OrmResult<Json>;

    /// Combined fast path: table check, then (if ids given) row check, then
    /// domain filter. Returns `(allowed, domain_expr)`.
    async fn check_access(
        &self,
        table: &str,
        op: Operation,
        ids: Option<&[i64]>,
    ) -> OrmResult<(bool, Json)> {
        if !self.check_table_access(table, op).await? {
            return Ok((false, Json::Array(vec![])));
        }
        if let Some(ids) = ids {
            if !ids.is_empty() && !self.check_row_access(table, op, ids).await? {
                return Ok((false, Json::Array(vec![])));
            }
        }
        let domain = self.get_domain_filter(table, op).await?;
        Ok((true, domain))
    }
}

/// No checker installed: unrestricted access, empty domain filter.
pub struct Unrestricted;

#[async_trait]
impl AccessChecker for Unrestricted {
    async fn check_table_access(&self, _table: &str, _op: Operation) -> OrmResult<bool> {
        Ok(true)
    }

    async fn check_row_access(&self, _table: &str, _op: Operation, _ids: &[i64]) -> OrmResult<bool> {
        Ok(true)
    }

    async fn get_domain_filter(&self, _table: &str, _op: Operation) -> OrmResult<Json> {
        Ok(Json::Array(vec![]))
    }
}

/// Enforce `check_access`, converting a denial into `OrmError::AccessDenied`
/// instead of letting callers silently treat "not allowed" as "no rows".
pub async fn enforce(
    checker: &dyn AccessChecker,
    table: &str,
    op: Operation,
    ids: Option<&[i64]>,
) -> OrmResult<Json> {
    let (allowed, domain) = checker.check_access(table, op, ids).await?;
    if !allowed {
        return Err(OrmError::access_denied(format!(
            "{op:?} denied on '{table}'"
        )));
    }
    Ok(domain)
}

/// Merge a domain filter (from the access checker) with the caller's own
/// filter: `domain AND caller_filter`, short-circuiting when either side is
/// empty.
pub fn prepend_domain(domain: Json, caller_filter: Option<Json>) -> Json {
    let domain_items = match &domain {
        Json::Array(items) => items.clone(),
        _ => vec![],
    };
    let caller_items = match caller_filter {
        Some(Json::Array(items)) => items,
        _ => vec![],
    };
    if domain_items.is_empty() {
        return Json::Array(caller_items);
    }
    if caller_items.is_empty() {
        return Json::Array(domain_items);
    }
    let mut combined = domain_items;
    combined.push(Json::String("and".to_string()));
    combined.push(Json::Array(caller_items));
    Json::Array(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn unrestricted_allows_everything() {
        let checker = Unrestricted;
        let (allowed, domain) = checker.check_access("users", Operation::Delete, None).await.unwrap();
        assert!(allowed);
        assert_eq!(domain, json!([]));
    }

    #[test]
    fn prepend_domain_ands_both_sides() {
        let domain = json!([["active", "=", true]]);
        let caller = json!([["name", "=", "x"]]);
        let combined = prepend_domain(domain, Some(caller));
        assert_eq!(
            combined,
            json!([["active", "=", true], "and", [["name", "=", "x"]]])
        );
    }

    #[test]
    fn prepend_domain_with_empty_caller_filter_is_just_domain() {
        let domain = json!([["active", "=", true]]);
        assert_eq!(prepend_domain(domain, None), json!([["active", "=", true]]));
    }
}
