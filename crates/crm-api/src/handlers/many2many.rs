//! `GET /search_many2many` — grounded on
//! `crud_routers_v2.py::_search_many2many`.
//!
//! `fields` travels as a single comma-separated query parameter rather than
//! a repeated `fields=a&fields=b` list — `axum`'s built-in `Query`
//! extractor (backed by `serde_urlencoded`) can't collect repeated keys
//! into a `Vec`, and pulling in a second query-parsing crate for one route
//! isn't worth it.

use crate::error::{ApiError, ApiResult};
use crate::fields_info;
use crate::state::CrudState;
use axum::extract::{Query, State};
use axum::Json;
use crm_orm::{Model, OrmError, RelationKind};
use serde::Deserialize;
use serde_json::{json, Value as Json_};

fn default_sort() -> String {
    "id".to_string()
}
fn default_order() -> String {
    "DESC".to_string()
}
fn default_limit() -> i64 {
    40
}

#[derive(Debug, Deserialize)]
pub struct SearchM2MQuery {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub fields: String,
    #[serde(default = "default_order")]
    pub order: String,
    pub start: Option<i64>,
    pub end: Option<i64>,
    #[serde(default = "default_sort")]
    pub sort: String,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

pub async fn search_many2many<M: Model>(
    State(state): State<CrudState<M>>,
    Query(q): Query<SearchM2MQuery>,
) -> ApiResult<Json<Json_>> {
    let registry = M::registry();
    let relation = registry.relation(&q.name).ok_or(ApiError::FieldsNotFound)?;
    let RelationKind::Many2many { target_table, .. } = &relation.kind else {
        return Err(ApiError::FieldsNotFound);
    };

    let target_registry = state
        .catalog
        .get(target_table)
        .ok_or_else(|| ApiError::Internal(OrmError::invariant(format!("'{}' missing from model catalog", *target_table))))?;

    let fields: Vec<String> = q.fields.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect();

    let orm = state.orm();
    let (records, total) = orm
        .search_many2many(&q.name, q.id, target_registry, &fields, &q.sort, &q.order, q.start, q.end, q.limit)
        .await?;

    let fields_info = state
        .schemas
        .get(target_table)
        .map(|schema| fields_info::descriptors_for(schema, &fields))
        .unwrap_or_else(|| Json_::Object(Default::default()));

    Ok(Json(json!({
        "data": records.into_iter().map(Json_::Object).collect::<Vec<_>>(),
        "total": total.to_string(),
        "fields": fields_info,
    })))
}
