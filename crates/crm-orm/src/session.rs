//! Session & transaction handling.
//!
//! Some ORMs pass a borrowed `&tokio_postgres::Transaction<'_>` explicitly
//! through every call. This system instead propagates the
//! active transaction ambiently through a `tokio::task_local!`, so a CRUD
//! method doesn't need a session parameter threaded through every layer —
//! it just asks "is there a current transaction on this task?". Because a
//! task-local value must be `'static`, the transaction itself is not a
//! borrowed `tokio_postgres::Transaction<'_>`; instead `BEGIN`/`COMMIT`/
//! `ROLLBACK` are issued as plain statements over a pooled connection that
//! the handle owns for the scope's lifetime.

use crate::error::{OrmError, OrmResult};
use crate::row::RowExt;
use deadpool_postgres::Pool;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_postgres::types::ToSql;
use tokio_postgres::Row;

/// What to do with the rows returned by `execute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    Fetch,
    FetchOne,
    LastRowId,
    Void,
    ExecuteMany,
}

/// An in-flight transaction pinned to one pooled connection. Rolls back on
/// drop unless `commit` was called, so an abandoned task can't leave a
/// transaction open.
pub struct TransactionHandle {
    client: deadpool_postgres::Object,
    finished: AtomicBool,
}

impl TransactionHandle {
    async fn begin(pool: &Pool) -> OrmResult<Arc<Self>> {
        let client = pool.get().await?;
        client.batch_execute("BEGIN").await.map_err(OrmError::from_db_error)?;
        Ok(Arc::new(Self {
            client,
            finished: AtomicBool::new(false),
        }))
    }

    async fn commit(&self) -> OrmResult<()> {
        self.client.batch_execute("COMMIT").await.map_err(OrmError::from_db_error)?;
        self.finished.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(&self) -> OrmResult<()> {
        self.client.batch_execute("ROLLBACK").await.map_err(OrmError::from_db_error)?;
        self.finished.store(true, Ordering::SeqCst);
        Ok(())
    }
}

tokio::task_local! {
    static CURRENT_TRANSACTION: Option<Arc<TransactionHandle>>;
}

/// A database access point: either borrows a connection from the pool per
/// call, or reuses the task's pinned transactional connection.
#[derive(Clone)]
pub enum Session {
    NoTransaction(Pool),
    Transactional(Arc<TransactionHandle>),
}

impl Session {
    pub fn new(pool: Pool) -> Self {
        Session::NoTransaction(pool)
    }

    /// Resolve the session to use for the current task: the ambient
    /// transaction if one is active, otherwise a fresh pool-backed session.
    pub fn current(pool: &Pool) -> Self {
        let ambient = CURRENT_TRANSACTION
            .try_with(|tx| tx.clone())
            .unwrap_or(None);
        match ambient {
            Some(handle) => Session::Transactional(handle),
            None => Session::NoTransaction(pool.clone()),
        }
    }

    pub fn is_in_transaction(&self) -> bool {
        matches!(self, Session::Transactional(_))
    }

    /// Run `body` with a transaction pinned to the current task. Commits on
    /// `Ok`, rolls back on `Err`. Nested calls reuse the outer transaction
    /// instead of opening a second one (no true savepoints — documented
    /// limitation).
    pub async fn with_transaction<F, Fut, T>(pool: &Pool, body: F) -> OrmResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = OrmResult<T>>,
    {
        if let Some(handle) = CURRENT_TRANSACTION.try_with(|tx| tx.clone()).unwrap_or(None) {
            let _ = &handle;
            return body().await;
        }

        let handle = TransactionHandle::begin(pool).await?;
        let result = CURRENT_TRANSACTION
            .scope(Some(handle.clone()), body())
            .await;
        match result {
            Ok(value) => {
                handle.commit().await?;
                Ok(value)
            }
            Err(err) => {
                let _ = handle.rollback().await;
                Err(err)
            }
        }
    }

    async fn raw_query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<Vec<Row>> {
        match self {
            Session::NoTransaction(pool) => {
                let client = pool.get().await?;
                client.query(sql, params).await.map_err(OrmError::from_db_error)
            }
            Session::Transactional(handle) => {
                handle.client.query(sql, params).await.map_err(OrmError::from_db_error)
            }
        }
    }

    async fn raw_execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<u64> {
        match self {
            Session::NoTransaction(pool) => {
                let client = pool.get().await?;
                client.execute(sql, params).await.map_err(OrmError::from_db_error)
            }
            Session::Transactional(handle) => {
                handle.client.execute(sql, params).await.map_err(OrmError::from_db_error)
            }
        }
    }

    /// Execute `sql` with `params` and interpret the result per `cursor`.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, params), fields(cursor = ?cursor)))]
    pub async fn execute(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
        cursor: Cursor,
    ) -> OrmResult<QueryOutcome> {
        #[cfg(feature = "tracing")]
        tracing::debug!(sql, in_transaction = self.is_in_transaction(), "executing");

        match cursor {
            Cursor::Fetch => {
                let rows = self.raw_query(sql, params).await?;
                Ok(QueryOutcome::Rows(rows))
            }
            Cursor::FetchOne => {
                let rows = self.raw_query(sql, params).await?;
                let row = rows
                    .into_iter()
                    .next()
                    .ok_or_else(|| OrmError::not_found("expected exactly one row"))?;
                Ok(QueryOutcome::Row(row))
            }
            Cursor::LastRowId => {
                let rows = self.raw_query(sql, params).await?;
                let row = rows
                    .into_iter()
                    .next()
                    .ok_or_else(|| OrmError::invariant("insert did not return an id"))?;
                let id: i32 = row.try_get_column("id")?;
                Ok(QueryOutcome::Id(id))
            }
            Cursor::Void | Cursor::ExecuteMany => {
                let affected = self.raw_execute(sql, params).await?;
                Ok(QueryOutcome::Affected(affected))
            }
        }
    }
}

pub enum QueryOutcome {
    Rows(Vec<Row>),
    Row(Row),
    Id(i32),
    Affected(u64),
}

impl QueryOutcome {
    pub fn into_rows(self) -> OrmResult<Vec<Row>> {
        match self {
            QueryOutcome::Rows(rows) => Ok(rows),
            QueryOutcome::Row(row) => Ok(vec![row]),
            other => Err(OrmError::invariant(format!(
                "expected rows, got {other:?}"
            ))),
        }
    }

    pub fn into_row(self) -> OrmResult<Row> {
        match self {
            QueryOutcome::Row(row) => Ok(row),
            QueryOutcome::Rows(rows) => rows
                .into_iter()
                .next()
                .ok_or_else(|| OrmError::not_found("expected one row")),
            other => Err(OrmError::invariant(format!(
                "expected a single row, got {other:?}"
            ))),
        }
    }

    pub fn into_id(self) -> OrmResult<i32> {
        match self {
            QueryOutcome::Id(id) => Ok(id),
            other => Err(OrmError::invariant(format!("expected an id, got {other:?}"))),
        }
    }

    pub fn into_affected(self) -> OrmResult<u64> {
        match self {
            QueryOutcome::Affected(n) => Ok(n),
            other => Err(OrmError::invariant(format!(
                "expected an affected-row count, got {other:?}"
            ))),
        }
    }
}

impl std::fmt::Debug for QueryOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryOutcome::Rows(rows) => write!(f, "Rows({})", rows.len()),
            QueryOutcome::Row(_) => write!(f, "Row(..)"),
            QueryOutcome::Id(id) => write!(f, "Id({id})"),
            QueryOutcome::Affected(n) => write!(f, "Affected({n})"),
        }
    }
}

/// Run a set of independent futures concurrently outside a transaction, or
/// sequentially when a transaction is active on this task (a pinned
/// connection cannot serve two statements at once). This is the mechanism
/// behind the parallel/sequential batch relation hydration rule.
pub async fn execute_maybe_parallel<T, F, Fut>(in_transaction: bool, tasks: Vec<F>) -> Vec<OrmResult<T>>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = OrmResult<T>>,
{
    if in_transaction {
        let mut out = Vec::with_capacity(tasks.len());
        for task in tasks {
            out.push(task().await);
        }
        out
    } else {
        let futures: Vec<_> = tasks.into_iter().map(|task| task()).collect();
        futures_util::future::join_all(futures).await
    }
}
