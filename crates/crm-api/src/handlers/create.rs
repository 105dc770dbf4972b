//! `POST /` — grounded on `crud_routers_v2.py::_create`.

use crate::error::{ApiError, ApiResult};
use crate::state::CrudState;
use axum::extract::State;
use axum::Json;
use crm_orm::{JsonMap, Model};
use serde_json::json;
use serde_json::Value as Json_;

pub async fn create<M: Model>(State(state): State<CrudState<M>>, Json(payload): Json<JsonMap>) -> ApiResult<Json<Json_>> {
    let schema = state.schema_set();
    let names: Vec<String> = payload.keys().cloned().collect();
    if !schema.fields_subset_of_allowed(&names) {
        return Err(ApiError::FieldsNotFound);
    }

    let orm = state.orm();
    let id = orm.create_with_relations(payload).await?;
    Ok(Json(json!({ "id": id })))
}
