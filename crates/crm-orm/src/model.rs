//! Model trait and field registry.
//!
//! Where the original system discovers fields by scanning class attributes
//! at import time, a statically typed rewrite declares them once, up front:
//! `Model::fields()` returns a `&'static FieldRegistry` built on first access
//! and cached for the lifetime of the process (mirrors the source's "frozen
//! after first use" field cache, but computed eagerly behind a `OnceLock`
//! instead of lazily racing on a mutable class dict).

use crate::field::{FieldDef, OnDelete};
use std::collections::HashMap;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub enum RelationKind {
    /// Stored FK column on this table.
    Many2one { target_table: &'static str, column: String },
    /// Virtual: `target.back_field = self.id`.
    One2many { target_table: &'static str, back_field: String },
    /// Virtual + link table.
    Many2many {
        target_table: &'static str,
        link_table: String,
        col_self: String,
        col_other: String,
    },
    /// Single-record variant of One2many.
    One2one { target_table: &'static str, back_field: String },
    /// Stored FK, target carries `(res_model, res_id)`.
    PolymorphicMany2one { target_table: &'static str, column: String },
    /// Virtual, inverse of PolymorphicMany2one.
    PolymorphicOne2many { target_table: &'static str, back_field: String },
}

impl RelationKind {
    pub fn is_virtual(&self) -> bool {
        !matches!(
            self,
            RelationKind::Many2one { .. } | RelationKind::PolymorphicMany2one { .. }
        )
    }

    pub fn is_plural(&self) -> bool {
        matches!(
            self,
            RelationKind::One2many { .. }
                | RelationKind::Many2many { .. }
                | RelationKind::PolymorphicOne2many { .. }
        )
    }

    pub fn target_table(&self) -> Option<&str> {
        match self {
            RelationKind::Many2one { target_table, .. }
            | RelationKind::One2many { target_table, .. }
            | RelationKind::Many2many { target_table, .. }
            | RelationKind::One2one { target_table, .. }
            | RelationKind::PolymorphicOne2many { target_table, .. }
            | RelationKind::PolymorphicMany2one { target_table, .. } => Some(target_table),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelationDef {
    pub name: String,
    pub kind: RelationKind,
    pub ondelete: OnDelete,
}

/// Partitioned, cached view over a model's fields — built once and never
/// recomputed, mirroring the "frozen after first use" field-cache lifecycle
/// of the original system this ORM generalizes.
#[derive(Debug, Default)]
pub struct FieldRegistry {
    pub table: String,
    pub fields: Vec<FieldDef>,
    pub relations: Vec<RelationDef>,
    pub primary_key: Option<String>,
    by_name: HashMap<String, usize>,
    relation_by_name: HashMap<String, usize>,
}

impl FieldRegistry {
    pub fn new(table: impl Into<String>, fields: Vec<FieldDef>, relations: Vec<RelationDef>) -> Self {
        let mut by_name = HashMap::new();
        let mut primary_key = None;
        for (i, f) in fields.iter().enumerate() {
            by_name.insert(f.name.clone(), i);
            if f.primary_key {
                primary_key = Some(f.name.clone());
            }
        }
        let mut relation_by_name = HashMap::new();
        for (i, r) in relations.iter().enumerate() {
            relation_by_name.insert(r.name.clone(), i);
        }
        Self {
            table: table.into(),
            fields,
            relations,
            primary_key,
            by_name,
            relation_by_name,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.by_name.get(name).map(|&i| &self.fields[i])
    }

    pub fn relation(&self, name: &str) -> Option<&RelationDef> {
        self.relation_by_name.get(name).map(|&i| &self.relations[i])
    }

    /// Stored scalar columns, i.e. everything that participates in
    /// INSERT/UPDATE payloads and plain SELECT lists — scalars plus
    /// Many2one/PolymorphicMany2one FK columns.
    pub fn store_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.store)
    }

    pub fn store_columns(&self) -> Vec<&str> {
        self.store_fields().map(|f| f.column.as_str()).collect()
    }

    /// Plural relations (One2many / Many2many / PolymorphicOne2many).
    pub fn m2m_o2m(&self) -> impl Iterator<Item = &RelationDef> {
        self.relations.iter().filter(|r| r.kind.is_plural())
    }

    pub fn json_field_names(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| matches!(f.kind, crate::field::FieldKind::Json))
            .map(|f| f.name.as_str())
            .collect()
    }

    pub fn primary_key_column(&self) -> &str {
        self.field(self.primary_key.as_deref().unwrap_or("id"))
            .map(|f| f.column.as_str())
            .unwrap_or("id")
    }
}

/// Implemented once per record type, usually by `#[derive(Model)]`.
pub trait Model: Sized + Send + Sync + 'static {
    /// Database table name.
    fn table_name() -> &'static str;

    /// Whether the DDL engine should create this table at boot.
    fn auto_create() -> bool {
        true
    }

    /// Build the field/relation registry. Called exactly once per type;
    /// cache it with `registry()`.
    fn build_registry() -> FieldRegistry;

    /// Cached accessor — never recomputes after the first call. Types
    /// produced by `#[derive(Model)]` override this with
    /// `model_registry_cache!()`, which backs it with a per-type
    /// `OnceLock` instead of leaking on every call.
    fn registry() -> &'static FieldRegistry {
        Box::leak(Box::new(Self::build_registry()))
    }
}

/// Declares the per-type `OnceLock<FieldRegistry>` a generated `Model` impl
/// should use for `registry()`, avoiding the leak in the trait's default
/// body. `#[derive(Model)]` expands to a call of this macro.
#[macro_export]
macro_rules! model_registry_cache {
    () => {
        fn registry() -> &'static $crate::model::FieldRegistry {
            static CACHE: std::sync::OnceLock<$crate::model::FieldRegistry> = std::sync::OnceLock::new();
            CACHE.get_or_init(Self::build_registry)
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldBuilder, FieldKind};

    #[test]
    fn store_fields_excludes_virtual_relations() {
        let fields = vec![
            FieldBuilder::new("id", FieldKind::Integer)
                .primary_key(true)
                .build()
                .unwrap(),
            FieldBuilder::new("name", FieldKind::char(Some(255)).unwrap())
                .build()
                .unwrap(),
        ];
        let relations = vec![RelationDef {
            name: "roles".into(),
            kind: RelationKind::Many2many {
                target_table: "role",
                link_table: "user_roles".into(),
                col_self: "user_id".into(),
                col_other: "role_id".into(),
            },
            ondelete: OnDelete::Cascade,
        }];
        let registry = FieldRegistry::new("user", fields, relations);
        assert_eq!(registry.store_columns(), vec!["id", "name"]);
        assert_eq!(registry.m2m_o2m().count(), 1);
        assert_eq!(registry.primary_key_column(), "id");
    }
}
