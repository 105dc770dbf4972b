//! Maps [`OrmError`] and this layer's own request-shape errors onto a
//! `{"error": "#CODE"}` wire shape, matching the original system's
//! short, stable error codes instead of free-text messages.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use crm_orm::OrmError;
use serde_json::json;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    /// A requested field name isn't declared on the model.
    FieldsNotFound,
    /// `get`/`update`/`delete` on a missing id.
    NotFound,
    /// Rejected by the access checker.
    AccessDenied,
    /// Malformed filter expression.
    BadFilter(String),
    /// Anything else the ORM raised; never surfaced verbatim to the client.
    Internal(OrmError),
}

impl ApiError {
    fn code_and_status(&self) -> (&'static str, StatusCode) {
        match self {
            ApiError::FieldsNotFound => ("#FIELDS_NOT_FOUND", StatusCode::BAD_REQUEST),
            ApiError::NotFound => ("#NOT_FOUND", StatusCode::NOT_FOUND),
            ApiError::AccessDenied => ("#ACCESS_DENIED", StatusCode::FORBIDDEN),
            ApiError::BadFilter(_) => ("#FILTER", StatusCode::BAD_REQUEST),
            ApiError::Internal(_) => ("#INTERNAL", StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(err) = &self {
            tracing::error!(error = %err, "unhandled ORM error in CRUD route");
        }
        let (code, status) = self.code_and_status();
        (status, Json(json!({ "error": code }))).into_response()
    }
}

impl From<OrmError> for ApiError {
    fn from(err: OrmError) -> Self {
        match err {
            OrmError::NotFound(_) => ApiError::NotFound,
            OrmError::AccessDenied(_) => ApiError::AccessDenied,
            OrmError::Filter(msg) => ApiError::BadFilter(msg),
            other => ApiError::Internal(other),
        }
    }
}
