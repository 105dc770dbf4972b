//! Filter triplet shapes (the `triplets` schema kind).
//!
//! Describes, per field, which operators and value shape a `[field, op,
//! value]` filter element may carry. This is a descriptive artifact for
//! clients (what can I filter on, and how) — the filter grammar itself is
//! already enforced at parse time by `crm_orm::FilterParser`, so nothing
//! here re-validates a filter before it reaches the query builder.

use crm_orm::{FieldKind, FieldRegistry};
use serde_json::{json, Value as Json};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Id,
    IdList,
    Text,
    Bool,
    Number,
}

impl ValueType {
    fn as_str(self) -> &'static str {
        match self {
            ValueType::Id => "id",
            ValueType::IdList => "id[]",
            ValueType::Text => "string",
            ValueType::Bool => "boolean",
            ValueType::Number => "number",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Triplet {
    pub field: String,
    pub ops: &'static [&'static str],
    pub value_type: ValueType,
}

impl Triplet {
    pub fn as_json(&self) -> Json {
        json!({
            "field": self.field,
            "ops": self.ops,
            "value_type": self.value_type.as_str(),
        })
    }
}

const ORDER_OPS: &[&str] = &["=", ">", "<", "!=", ">=", "<="];
const TEXT_OPS: &[&str] = &["=", "like", "ilike", "=like", "=ilike", "not ilike", "not like"];
const BOOL_OPS: &[&str] = &["=", "!="];
const MEMBERSHIP_OPS: &[&str] = &["in", "not in"];

/// Builds the full triplet set for a model: one entry per stored field plus
/// one per relation, mirroring `schema_registry.py::_build_search_triplets`.
pub fn build_triplets(registry: &FieldRegistry) -> Vec<Triplet> {
    let mut out = Vec::with_capacity(registry.fields.len() + registry.relations.len());

    for field in registry.store_fields() {
        let (ops, value_type) = match &field.kind {
            FieldKind::Char { .. } | FieldKind::Text | FieldKind::Selection { .. } => (TEXT_OPS, ValueType::Text),
            FieldKind::Boolean => (BOOL_OPS, ValueType::Bool),
            _ => (ORDER_OPS, ValueType::Number),
        };
        out.push(Triplet {
            field: field.name.clone(),
            ops,
            value_type,
        });
    }

    for relation in &registry.relations {
        let (ops, value_type) = if relation.kind.is_plural() {
            (MEMBERSHIP_OPS, ValueType::IdList)
        } else {
            (ORDER_OPS, ValueType::Id)
        };
        out.push(Triplet {
            field: relation.name.clone(),
            ops,
            value_type,
        });
    }

    out
}
