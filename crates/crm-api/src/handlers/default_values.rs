//! `POST /default_values` — grounded on
//! `crud_routers_v2.py::_create_default_values`.

use crate::error::{ApiError, ApiResult};
use crate::nested_fields::NestedFieldsRequest;
use crate::state::CrudState;
use axum::extract::State;
use axum::Json;
use crm_orm::{JsonMap, Model};
use serde_json::{json, Value as Json_};

pub async fn default_values<M: Model>(
    State(state): State<CrudState<M>>,
    Json(req): Json<NestedFieldsRequest>,
) -> ApiResult<Json<Json_>> {
    let schema = state.schema_set();
    if !schema.fields_subset_of_allowed(&req.fields) {
        return Err(ApiError::FieldsNotFound);
    }

    let registry = M::registry();
    let mut data = JsonMap::new();
    for name in &req.fields {
        if let Some(field) = registry.field(name) {
            data.insert(name.clone(), field.default.as_ref().map(|v| v.to_json()).unwrap_or(Json_::Null));
        } else if let Some(relation) = registry.relation(name) {
            let empty = if relation.kind.is_plural() { Json_::Array(vec![]) } else { Json_::Null };
            data.insert(name.clone(), empty);
        }
    }

    let fields_info = crate::fields_info::descriptors_for(schema, &req.fields);
    Ok(Json(json!({ "data": data, "fields": fields_info })))
}
