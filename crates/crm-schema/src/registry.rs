//! `SchemaSet` and `SchemaRegistry` — the cached, one-pass schema builder,
//! modeled on `schema_registry.py::SchemaRegistry`.
//!
//! Schemas are built in a single pass over every model in a
//! [`ModelCatalog`] and cached for the registry's lifetime — there is no
//! per-request rebuilding, matching the original `build_all` design.

use crate::build;
use crate::catalog::ModelCatalog;
use crate::triplet::{build_triplets, Triplet};
use serde_json::Value as Json;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct SchemaSet {
    pub base: Json,
    pub create: Json,
    pub update: Json,
    pub search_output: Json,
    pub read_output: Json,
    pub search_input: Json,
    pub triplets: Vec<Triplet>,
}

impl SchemaSet {
    fn build(registry: &crm_orm::FieldRegistry, catalog: &ModelCatalog) -> Self {
        Self {
            base: build::build_base(registry),
            create: build::build_create(registry, catalog),
            update: build::build_update(registry, catalog),
            search_output: build::build_search_output(registry),
            read_output: build::build_read_output(registry, catalog),
            search_input: build::build_search_input(registry),
            triplets: build_triplets(registry),
        }
    }

    /// Field descriptors for the `GET /fields` route — every stored field
    /// and relation name this model exposes, each paired with its `base`
    /// schema property document.
    pub fn field_descriptors(&self) -> &Json {
        self.base.get("properties").unwrap_or(&Json::Null)
    }

    pub fn allowed_field_names(&self) -> Vec<&str> {
        match self.field_descriptors() {
            Json::Object(map) => map.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// `true` if every name in `requested` is a field or relation this
    /// model actually declares — backs the `#FIELDS_NOT_FOUND` check.
    pub fn fields_subset_of_allowed(&self, requested: &[String]) -> bool {
        let allowed = self.allowed_field_names();
        requested.iter().all(|f| allowed.contains(&f.as_str()))
    }
}

/// Holds one [`SchemaSet`] per table, built once from a [`ModelCatalog`].
pub struct SchemaRegistry {
    sets: HashMap<&'static str, SchemaSet>,
}

impl SchemaRegistry {
    pub fn build_all(catalog: &ModelCatalog) -> Self {
        let sets = catalog
            .iter()
            .map(|(table, registry)| (table, SchemaSet::build(registry, catalog)))
            .collect();
        Self { sets }
    }

    pub fn get(&self, table: &str) -> Option<&SchemaSet> {
        self.sets.get(table)
    }

    pub fn get_base_schema(&self, table: &str) -> Option<&Json> {
        self.get(table).map(|s| &s.base)
    }

    pub fn get_create_schema(&self, table: &str) -> Option<&Json> {
        self.get(table).map(|s| &s.create)
    }

    pub fn get_update_schema(&self, table: &str) -> Option<&Json> {
        self.get(table).map(|s| &s.update)
    }

    pub fn get_search_output_schema(&self, table: &str) -> Option<&Json> {
        self.get(table).map(|s| &s.search_output)
    }

    pub fn get_read_output_schema(&self, table: &str) -> Option<&Json> {
        self.get(table).map(|s| &s.read_output)
    }

    pub fn get_search_input_schema(&self, table: &str) -> Option<&Json> {
        self.get(table).map(|s| &s.search_input)
    }

    pub fn get_triplets(&self, table: &str) -> &[Triplet] {
        self.sets.get(table).map(|s| s.triplets.as_slice()).unwrap_or(&[])
    }
}
