//! Catalog of every model the schema registry knows about.
//!
//! Cross-model schema generation needs a way to resolve a relation's
//! `target_table` back into that target's own `FieldRegistry` (to build the
//! read_output second-level flatten and the create-schema's nested object).
//! A single model's own registry can't do that — it only knows the table
//! name string — so callers assemble a catalog once at startup, mirroring
//! `SchemaRegistry::build_all(models)` taking the full model list up front.

use crm_orm::{FieldRegistry, Model};
use std::collections::HashMap;

#[derive(Default)]
pub struct ModelCatalog {
    registries: HashMap<&'static str, &'static FieldRegistry>,
}

impl ModelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<M: Model>(&mut self) -> &mut Self {
        self.registries.insert(M::table_name(), M::registry());
        self
    }

    pub fn get(&self, table: &str) -> Option<&'static FieldRegistry> {
        self.registries.get(table).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static FieldRegistry)> + '_ {
        self.registries.iter().map(|(&t, &r)| (t, r))
    }
}
