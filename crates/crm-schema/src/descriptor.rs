//! Per-field JSON-Schema-shaped property builders shared by every schema
//! kind in `build.rs`.

use crm_orm::{FieldDef, FieldKind, RelationDef, RelationKind};
use serde_json::{json, Map, Value as Json};

/// The JSON-Schema `"type"` a field's `FieldKind` decodes to — matches
/// `orm.rs::decode_column`'s actual wire representation exactly (e.g.
/// `Decimal` travels as a string, not a number).
fn json_type(kind: &FieldKind) -> &'static str {
    match kind {
        FieldKind::Integer | FieldKind::BigInteger | FieldKind::SmallInteger => "integer",
        FieldKind::Char { .. } | FieldKind::Selection { .. } | FieldKind::Text => "string",
        FieldKind::Boolean => "boolean",
        FieldKind::Decimal { .. } => "string",
        FieldKind::Datetime => "string",
        FieldKind::Date => "string",
        FieldKind::Time => "string",
        FieldKind::Float => "number",
        FieldKind::Json => "object",
        FieldKind::Binary => "array",
    }
}

/// Property document for one scalar field, used as-is in `base` and (with
/// `required` tracked separately by the caller) in every other schema kind.
pub fn field_property(field: &FieldDef) -> Json {
    let mut doc = Map::new();
    doc.insert("type".to_string(), json!(json_type(&field.kind)));
    doc.insert("nullable".to_string(), json!(field.null));
    if let Some(description) = &field.description {
        doc.insert("description".to_string(), json!(description));
    }
    match &field.kind {
        FieldKind::Char { max_length: Some(n) } => {
            doc.insert("max_length".to_string(), json!(n));
        }
        FieldKind::Selection { options } => {
            doc.insert(
                "enum".to_string(),
                Json::Array(options.iter().map(|(value, _)| json!(value)).collect()),
            );
            doc.insert(
                "enum_labels".to_string(),
                Json::Object(options.iter().map(|(value, label)| (value.clone(), json!(label))).collect()),
            );
        }
        FieldKind::Decimal { max_digits, decimal_places } => {
            doc.insert("max_digits".to_string(), json!(max_digits));
            doc.insert("decimal_places".to_string(), json!(decimal_places));
        }
        FieldKind::Datetime => {
            doc.insert("format".to_string(), json!("date-time"));
        }
        FieldKind::Date => {
            doc.insert("format".to_string(), json!("date"));
        }
        FieldKind::Time => {
            doc.insert("format".to_string(), json!("time"));
        }
        _ => {}
    }
    Json::Object(doc)
}

/// `{id, name}` shape used for every summarized relation (search_output,
/// and the second level of read_output).
fn id_name_schema() -> Json {
    json!({
        "type": "object",
        "properties": {
            "id": {"type": "integer"},
            "name": {"type": "string", "nullable": true},
        },
    })
}

/// Wraps a schema as a list when the relation is plural, as-is otherwise.
fn one_or_many(kind: &RelationKind, item: Json) -> Json {
    if kind.is_plural() {
        json!({"type": "array", "items": item})
    } else {
        item
    }
}

/// Relation property for `base`/`search_output`/the second level of
/// `read_output`: always the `{id, name}` summary shape, single or plural.
pub fn relation_property_summary(relation: &RelationDef) -> Json {
    let mut doc = one_or_many(&relation.kind, id_name_schema());
    if let Json::Object(map) = &mut doc {
        map.insert(
            "relation".to_string(),
            json!({
                "target": relation.kind.target_table(),
                "many": relation.kind.is_plural(),
            }),
        );
    }
    doc
}

/// Relation property for `create`/`update`.
///
/// Many2one / PolymorphicMany2one become an id-or-`"VirtualId"` union;
/// One2many / Many2many become a command object whose accepted keys mirror
/// exactly what `Orm::apply_relation_commands` understands — One2many takes
/// only `created`/`deleted`, Many2many additionally takes
/// `selected`/`unselected`.
pub fn relation_property_create(relation: &RelationDef, nested_create: impl FnOnce() -> Json) -> Json {
    match &relation.kind {
        RelationKind::Many2one { .. } | RelationKind::PolymorphicMany2one { .. } => id_or_virtual_id(),
        RelationKind::One2many { .. } | RelationKind::PolymorphicOne2many { .. } => {
            let nested = nested_create();
            json!({
                "type": "object",
                "properties": {
                    "created": {"type": "array", "items": nested},
                    "deleted": {"type": "array", "items": {"type": "integer"}},
                },
            })
        }
        RelationKind::Many2many { .. } => {
            let nested = nested_create();
            json!({
                "type": "object",
                "properties": {
                    "created": {"type": "array", "items": nested},
                    "deleted": {"type": "array", "items": {"type": "integer"}},
                    "selected": {"type": "array", "items": {"type": "integer"}},
                    "unselected": {"type": "array", "items": {"type": "integer"}},
                },
            })
        }
        RelationKind::One2one { .. } => id_or_virtual_id(),
    }
}

fn id_or_virtual_id() -> Json {
    json!({"oneOf": [{"type": "integer"}, {"const": "VirtualId"}]})
}

pub fn summary_schema() -> Json {
    id_name_schema()
}
