//! Extension registry.
//!
//! Lets a module attach new fields to an already-declared model without
//! subclassing it, keyed by table name. The source system mutates a live
//! class dictionary; here, extensions are plain data appended to a registry
//! before a model's field registry is built, and `FieldRegistry::new`
//! already sees the merged set — there's no live mutation after the fact.
//!
//! Same-name field conflicts: last registration wins (see DESIGN.md's Open
//! Question log for why this matches the source instead of rejecting the
//! conflict outright).

use crate::field::{FieldDef, SelectionOptions};
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

pub enum ExtensionField {
    /// A brand-new field on the table.
    New(FieldDef),
    /// Additional options merged into an existing `Selection` field.
    SelectionAdd { field_name: String, options: Vec<(String, String)> },
}

#[derive(Default)]
struct Registry {
    by_table: HashMap<&'static str, Vec<ExtensionField>>,
}

fn registry() -> &'static Mutex<Registry> {
    static REGISTRY: OnceLock<Mutex<Registry>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(Registry::default()))
}

/// Register an extension field for `table`. Must be called before the
/// model's `registry()` is first accessed — extensions registered after a
/// model has already built its `FieldRegistry` are not retroactively
/// applied (the registry is frozen after first use).
pub fn register(table: &'static str, field: ExtensionField) {
    let mut reg = registry().lock().expect("extension registry poisoned");
    reg.by_table.entry(table).or_default().push(field);
}

/// Fold all registered extension fields for `table` into `base_fields`,
/// applying them in registration order. A `New` field with the same name
/// as an existing one replaces it (last registration wins); a
/// `SelectionAdd` merges into the named `Selection` field's option set.
pub fn apply(table: &str, mut base_fields: Vec<FieldDef>) -> Vec<FieldDef> {
    let reg = registry().lock().expect("extension registry poisoned");
    let Some(extensions) = reg.by_table.get(table) else {
        return base_fields;
    };

    for ext in extensions {
        match ext {
            ExtensionField::New(field) => {
                if let Some(existing) = base_fields.iter_mut().find(|f| f.name == field.name) {
                    *existing = field.clone();
                } else {
                    base_fields.push(field.clone());
                }
            }
            ExtensionField::SelectionAdd { field_name, options } => {
                if let Some(existing) = base_fields.iter_mut().find(|f| &f.name == field_name) {
                    let mut merged = SelectionOptions::new(selection_options_of(existing));
                    merged.add_options(options.clone());
                    set_selection_options(existing, merged.all());
                }
            }
        }
    }

    base_fields
}

fn selection_options_of(field: &FieldDef) -> Vec<(String, String)> {
    match &field.kind {
        crate::field::FieldKind::Selection { options } => options.clone(),
        _ => Vec::new(),
    }
}

fn set_selection_options(field: &mut FieldDef, options: Vec<(String, String)>) {
    if let crate::field::FieldKind::Selection { options: slot } = &mut field.kind {
        *slot = options;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldBuilder, FieldKind};

    #[test]
    fn selection_add_merges_into_existing_field() {
        let table: &'static str = "ext_test_chat_connector";
        register(
            table,
            ExtensionField::SelectionAdd {
                field_name: "type".into(),
                options: vec![("telegram".into(), "Telegram".into())],
            },
        );

        let base = vec![FieldBuilder::new(
            "type",
            FieldKind::Selection {
                options: vec![("internal".into(), "Internal".into())],
            },
        )
        .build()
        .unwrap()];

        let merged = apply(table, base);
        let FieldKind::Selection { options } = &merged[0].kind else {
            panic!("expected selection field");
        };
        assert_eq!(
            options,
            &vec![
                ("internal".to_string(), "Internal".to_string()),
                ("telegram".to_string(), "Telegram".to_string())
            ]
        );
    }

    #[test]
    fn new_field_with_same_name_last_wins() {
        let table: &'static str = "ext_test_last_wins";
        register(
            table,
            ExtensionField::New(
                FieldBuilder::new("note", FieldKind::Text).description("first").build().unwrap(),
            ),
        );
        register(
            table,
            ExtensionField::New(
                FieldBuilder::new("note", FieldKind::Text).description("second").build().unwrap(),
            ),
        );

        let merged = apply(table, vec![]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].description.as_deref(), Some("second"));
    }
}
