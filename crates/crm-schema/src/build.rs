//! The six schema-kind builders (`triplets` lives in `triplet.rs`).
//!
//! Mirrors `schema_registry.py`'s `_build_*` methods one for one, but
//! produces plain `serde_json::Value` documents from a `FieldRegistry`
//! instead of dynamically creating Pydantic model classes.

use crate::catalog::ModelCatalog;
use crate::descriptor::{field_property, relation_property_create, relation_property_summary, summary_schema};
use crm_orm::FieldRegistry;
use serde_json::{json, Map, Value as Json};

fn is_required(field: &crm_orm::FieldDef) -> bool {
    field.schema_required.unwrap_or(!field.null) && !field.primary_key
}

pub fn build_base(registry: &FieldRegistry) -> Json {
    let mut properties = Map::new();
    for field in &registry.fields {
        properties.insert(field.name.clone(), field_property(field));
    }
    for relation in &registry.relations {
        properties.insert(relation.name.clone(), relation_property_summary(relation));
    }
    json!({
        "title": format!("{}Base", registry.table),
        "type": "object",
        "properties": properties,
    })
}

/// `create`: no `id`; relations as described in `descriptor::relation_property_create`.
pub fn build_create(registry: &FieldRegistry, catalog: &ModelCatalog) -> Json {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for field in registry.fields.iter().filter(|f| f.store && !f.primary_key) {
        properties.insert(field.name.clone(), field_property(field));
        if is_required(field) {
            required.push(json!(field.name));
        }
    }
    for relation in &registry.relations {
        let target = relation.kind.target_table().and_then(|t| catalog.get(t));
        let doc = relation_property_create(relation, || nested_create_schema(target));
        properties.insert(relation.name.clone(), doc);
    }

    json!({
        "title": format!("{}Create", registry.table),
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// `update`: same field set as `create`, nothing required — a PATCH body.
pub fn build_update(registry: &FieldRegistry, catalog: &ModelCatalog) -> Json {
    let mut doc = build_create(registry, catalog);
    if let Json::Object(map) = &mut doc {
        map.insert("title".to_string(), json!(format!("{}Update", registry.table)));
        map.insert("required".to_string(), json!([]));
    }
    doc
}

/// `search_output`: every field optional, relations summarized to `{id,name}`.
pub fn build_search_output(registry: &FieldRegistry) -> Json {
    let mut properties = Map::new();
    for field in &registry.fields {
        properties.insert(field.name.clone(), field_property(field));
    }
    for relation in &registry.relations {
        properties.insert(relation.name.clone(), relation_property_summary(relation));
    }
    json!({
        "title": format!("{}SearchOutput", registry.table),
        "type": "object",
        "properties": properties,
    })
}

/// `read_output`: relations nest one extra level before collapsing to
/// `{id, name}` — the nested level's *own* relations are always summarized,
/// regardless of kind, so mutually-referencing models still terminate.
pub fn build_read_output(registry: &FieldRegistry, catalog: &ModelCatalog) -> Json {
    let mut properties = Map::new();
    for field in &registry.fields {
        properties.insert(field.name.clone(), field_property(field));
    }
    for relation in &registry.relations {
        let target = relation.kind.target_table().and_then(|t| catalog.get(t));
        let nested = match target {
            Some(target_registry) => nested_read_schema(target_registry),
            None => summary_schema(),
        };
        let wrapped = if relation.kind.is_plural() {
            json!({"type": "array", "items": nested})
        } else {
            nested
        };
        properties.insert(relation.name.clone(), wrapped);
    }
    json!({
        "title": format!("{}ReadOutput", registry.table),
        "type": "object",
        "properties": properties,
    })
}

/// `search_input`: `fields` (any stored field or relation name), `sort`
/// restricted to stored scalar columns (the only thing `Orm::search` can
/// actually order by), pagination, `filter`, `raw`.
pub fn build_search_input(registry: &FieldRegistry) -> Json {
    let mut allowed_fields: Vec<Json> = registry.fields.iter().map(|f| json!(f.name)).collect();
    allowed_fields.extend(registry.relations.iter().map(|r| json!(r.name)));
    if allowed_fields.is_empty() {
        allowed_fields.push(json!("id"));
    }

    let mut sortable: Vec<Json> = registry.store_columns().into_iter().map(|c| json!(c)).collect();
    if sortable.is_empty() {
        sortable.push(json!("id"));
    }

    json!({
        "title": format!("{}SearchInput", registry.table),
        "type": "object",
        "properties": {
            "fields": {"type": "array", "items": {"enum": allowed_fields}},
            "start": {"type": ["integer", "null"]},
            "end": {"type": ["integer", "null"]},
            "limit": {"type": ["integer", "null"]},
            "sort": {"enum": sortable, "default": "id"},
            "order": {"enum": ["ASC", "asc", "DESC", "desc"], "default": "DESC"},
            "filter": {
                "type": ["array", "null"],
                "description": "flat list alternating [field, op, value] triplets and \"and\"/\"or\" tokens",
            },
            "raw": {"type": "boolean", "default": false},
        },
        "required": ["fields"],
    })
}

/// Simplified nested object used inside create/update command sets: scalar
/// fields as-is, Many2one kept as id-or-VirtualId, Many2many/One2many
/// dropped entirely — the recursion stops one level deep rather than
/// describing a relation's own relations.
fn nested_create_schema(target: Option<&'static FieldRegistry>) -> Json {
    let Some(registry) = target else {
        return json!({"type": "object"});
    };
    let mut properties = Map::new();
    for field in registry.fields.iter().filter(|f| f.store && !f.primary_key) {
        properties.insert(field.name.clone(), field_property(field));
    }
    for relation in &registry.relations {
        if relation.kind.is_plural() {
            continue;
        }
        properties.insert(relation.name.clone(), crate::descriptor::relation_property_create(relation, || json!({"type": "object"})));
    }
    json!({
        "title": format!("{}SimpleNested", registry.table),
        "type": "object",
        "properties": properties,
    })
}

/// Second-level read schema: this target's own scalar fields plus its
/// relations, but every relation here — single or plural — is reduced to
/// `{id, name}`. Never recurses past this level.
fn nested_read_schema(registry: &FieldRegistry) -> Json {
    let mut properties = Map::new();
    for field in &registry.fields {
        properties.insert(field.name.clone(), field_property(field));
    }
    for relation in &registry.relations {
        properties.insert(relation.name.clone(), relation_property_summary(relation));
    }
    json!({
        "title": format!("{}Nested", registry.table),
        "type": "object",
        "properties": properties,
    })
}
