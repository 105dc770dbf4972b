//! CRUD router generator.
//!
//! Builds the nine-route `axum` surface for any [`Model`] once a
//! [`crm_schema::SchemaRegistry`] and [`crm_schema::ModelCatalog`] exist for
//! it — no per-model boilerplate router, the same way
//! `crud_routers_v2.py::CRUDRouterGenerator` mounts every model off one
//! shared `SchemaRegistry`.

pub mod error;
mod fields_info;
pub mod handlers;
pub mod nested_fields;
pub mod router;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use nested_fields::NestedFieldsRequest;
pub use router::crud_router;
pub use state::CrudState;
