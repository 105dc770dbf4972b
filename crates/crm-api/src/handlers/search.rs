//! `POST /search` — grounded on `crud_routers_v2.py::_search`.

use crate::error::{ApiError, ApiResult};
use crate::fields_info;
use crate::state::CrudState;
use axum::extract::State;
use axum::Json;
use crm_orm::{Model, NestedFields, SearchParams, SerializationMode};
use serde::Deserialize;
use serde_json::{json, Value as Json_};

fn default_filter() -> Json_ {
    Json_::Array(vec![])
}
fn default_limit() -> i64 {
    1000
}
fn default_sort() -> String {
    "id".to_string()
}
fn default_order() -> String {
    "DESC".to_string()
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub fields: Vec<String>,
    #[serde(default = "default_filter")]
    pub filter: Json_,
    pub start: Option<i64>,
    pub end: Option<i64>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default = "default_sort")]
    pub sort: String,
    #[serde(default = "default_order")]
    pub order: String,
    #[serde(default)]
    pub raw: bool,
}

pub async fn search<M: Model>(State(state): State<CrudState<M>>, Json(req): Json<SearchRequest>) -> ApiResult<Json<Json_>> {
    let schema = state.schema_set();
    if !schema.fields_subset_of_allowed(&req.fields) {
        return Err(ApiError::FieldsNotFound);
    }

    let orm = state.orm();
    let params = SearchParams {
        fields: Some(req.fields.clone()),
        filter: req.filter,
        start: req.start,
        end: req.end,
        limit: req.limit,
        sort: req.sort,
        order: req.order,
        nested: NestedFields::none(),
    };
    let (records, total) = tokio::try_join!(orm.search(&params), orm.table_len())?;

    let data: Vec<Json_> = if req.raw {
        records.into_iter().map(Json_::Object).collect()
    } else {
        records
            .into_iter()
            .map(|record| Json_::Object(orm.serialize(record, SerializationMode::List)))
            .collect()
    };

    let fields_info = fields_info::descriptors_for(schema, &req.fields);
    Ok(Json(json!({
        "data": data,
        "total": total.to_string(),
        "fields": fields_info,
    })))
}
