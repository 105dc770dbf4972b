//! `DELETE /{id}` and `DELETE /bulk` — grounded on
//! `crud_routers_v2.py::_delete`/`_delete_bulk`.

use crate::error::{ApiError, ApiResult};
use crate::state::CrudState;
use axum::extract::{Path, State};
use axum::Json;
use crm_orm::{Model, NestedFields};

pub async fn delete<M: Model>(State(state): State<CrudState<M>>, Path(id): Path<i64>) -> ApiResult<Json<bool>> {
    let orm = state.orm();
    if orm.get_or_none(id, Some(&["id".to_string()]), &NestedFields::none()).await?.is_none() {
        return Err(ApiError::NotFound);
    }
    orm.delete(id).await?;
    Ok(Json(true))
}

/// Body is a bare JSON array of ids, matching the original route's
/// unwrapped `list[int]` parameter.
pub async fn delete_bulk<M: Model>(State(state): State<CrudState<M>>, Json(ids): Json<Vec<i64>>) -> ApiResult<Json<bool>> {
    let orm = state.orm();
    orm.delete_bulk(&ids).await?;
    Ok(Json(true))
}
