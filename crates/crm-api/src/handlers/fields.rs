//! `GET /fields` — grounded on `crud_routers_v2.py::_get_fields`.
//!
//! Registered ahead of `/{id}` in `router.rs`; axum's router matches static
//! segments before dynamic params regardless of registration order, so
//! unlike the original this ordering is a matter of taste, not correctness.

use crate::state::CrudState;
use axum::extract::State;
use axum::Json;
use crm_orm::Model;
use serde_json::Value as Json_;

pub async fn fields<M: Model>(State(state): State<CrudState<M>>) -> Json<Json_> {
    Json(crate::fields_info::all_descriptors(state.schema_set()))
}
