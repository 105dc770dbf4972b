//! `PUT /{id}` — grounded on `crud_routers_v2.py::_update`.

use crate::error::{ApiError, ApiResult};
use crate::state::CrudState;
use axum::extract::{Path, State};
use axum::Json;
use crm_orm::{JsonMap, Model, NestedFields};

pub async fn update<M: Model>(
    State(state): State<CrudState<M>>,
    Path(id): Path<i64>,
    Json(payload): Json<JsonMap>,
) -> ApiResult<Json<JsonMap>> {
    let schema = state.schema_set();
    let names: Vec<String> = payload.keys().cloned().collect();
    if !schema.fields_subset_of_allowed(&names) {
        return Err(ApiError::FieldsNotFound);
    }

    let orm = state.orm();
    if orm.get_or_none(id, Some(&["id".to_string()]), &NestedFields::none()).await?.is_none() {
        return Err(ApiError::NotFound);
    }

    let updated = orm.update(id, payload).await?;
    Ok(Json(updated))
}
