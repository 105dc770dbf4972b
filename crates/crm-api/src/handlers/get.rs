//! `POST /{id}` — grounded on `crud_routers_v2.py::_get`.
//!
//! A nested-fields request body rather than a bare GET, since selecting
//! which relations to hydrate needs a body the original carried too.

use crate::error::{ApiError, ApiResult};
use crate::nested_fields::NestedFieldsRequest;
use crate::state::CrudState;
use axum::extract::{Path, State};
use axum::Json;
use crm_orm::{Model, NestedFields, SerializationMode};
use serde_json::json;
use serde_json::Value as Json_;

pub async fn get<M: Model>(
    State(state): State<CrudState<M>>,
    Path(id): Path<i64>,
    Json(req): Json<NestedFieldsRequest>,
) -> ApiResult<Json<Json_>> {
    let schema = state.schema_set();
    if !schema.fields_subset_of_allowed(&req.fields) {
        return Err(ApiError::FieldsNotFound);
    }

    let orm = state.orm();
    let nested = NestedFields { names: req.fields.clone() };
    let record = orm
        .get_or_none(id, Some(&req.fields), &nested)
        .await?
        .ok_or(ApiError::NotFound)?;
    let record = orm.serialize(record, SerializationMode::Form);

    let fields_info = crate::fields_info::descriptors_for(schema, &req.fields);
    Ok(Json(json!({ "data": record, "fields": fields_info })))
}
