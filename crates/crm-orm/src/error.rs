//! Error taxonomy for the ORM core.
//!
//! Mirrors the kinds called out in the design doc: configuration errors are
//! fatal at model-definition time, the rest are raised to the caller and
//! mapped onto HTTP status codes one layer up (in `crm-api`).

use thiserror::Error;

pub type OrmResult<T> = Result<T, OrmError>;

#[derive(Debug, Error)]
pub enum OrmError {
    /// Invalid field combination caught at model-definition time.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// `update` called with no effective fields.
    #[error("update called with no fields to set")]
    UpdateEmpty,

    /// Malformed filter expression or unsupported operator.
    #[error("invalid filter: {0}")]
    Filter(String),

    /// `get` on a missing id.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Raised by the access checker.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// A violated model/runtime invariant — indicates a programming error.
    #[error("invariant violated: {0}")]
    Invariant(String),

    /// Unique constraint violation (SQLSTATE 23505).
    #[error("unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation (SQLSTATE 23503).
    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation (SQLSTATE 23514).
    #[error("check constraint violation: {0}")]
    CheckViolation(String),

    /// Row decode/mapping error.
    #[error("decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// JSON (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Propagated from the driver as-is.
    #[error("driver error: {0}")]
    Driver(#[from] tokio_postgres::Error),

    #[cfg(feature = "pool")]
    #[error("pool error: {0}")]
    Pool(String),

    #[error("{0}")]
    Other(String),
}

impl OrmError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn filter(message: impl Into<String>) -> Self {
        Self::Filter(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::AccessDenied(message.into())
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant(message.into())
    }

    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied(_))
    }

    /// Inspect a driver error's SQLSTATE and upgrade it to a specific
    /// constraint-violation variant when possible.
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let message = db_err.message();
            match db_err.code().code() {
                "23505" => return Self::UniqueViolation(format!("{constraint}: {message}")),
                "23503" => return Self::ForeignKeyViolation(format!("{constraint}: {message}")),
                "23514" => return Self::CheckViolation(format!("{constraint}: {message}")),
                _ => {}
            }
        }
        Self::Driver(err)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for OrmError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

impl From<serde_json::Error> for OrmError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
