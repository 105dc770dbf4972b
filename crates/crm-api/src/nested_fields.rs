//! Request body shared by `/default_values` and the `POST /{id}` get route.
//!
//! The original system let a relation entry carry its own nested field
//! selection (`{"role": ["id", "name"]}`) recursively. `crm-orm`'s
//! `NestedFields` only tracks *which* relations to hydrate, not a
//! per-relation projection — hydration is always the batched `{id, name}`
//! (or full row, for Many2one/PolymorphicMany2one) shape. So this
//! request's `fields` is a flat name list; any entry that is also a
//! relation name triggers hydration for it, matching `Orm::split_fields`'s
//! own field/relation split.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct NestedFieldsRequest {
    pub fields: Vec<String>,
}
