//! Helpers that pick field-descriptor documents out of a [`SchemaSet`]'s
//! `base` schema for the `fields` key search/get responses carry, and for
//! the standalone `/fields` route.

use crm_schema::SchemaSet;
use serde_json::{Map, Value as Json};

/// Every field/relation descriptor, keyed by name — the `/fields` route's
/// whole response body.
pub fn all_descriptors(schema: &SchemaSet) -> Json {
    schema.field_descriptors().clone()
}

/// Descriptors for just the requested names, in the shape `get`/`search`
/// embed under their `"fields"` key.
pub fn descriptors_for(schema: &SchemaSet, names: &[String]) -> Json {
    let mut out = Map::new();
    if let Json::Object(all) = schema.field_descriptors() {
        for name in names {
            if let Some(doc) = all.get(name) {
                out.insert(name.clone(), doc.clone());
            }
        }
    }
    Json::Object(out)
}
