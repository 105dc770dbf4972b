//! `Model` derive macro implementation.
//!
//! Builds a `FieldRegistry` from attribute-annotated struct fields instead
//! of requiring callers to assemble `FieldBuilder`/`RelationDef` values by
//! hand. A field carries either a scalar declaration or a relation
//! declaration, never both; relation fields exist only to hang an
//! attribute and a name off of — their Rust type is never inspected.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Result};

mod parse;

use parse::{FieldSpec, RelationKindSpec, RelationSpec};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let table_name = parse::table_name(&input)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Model can only be derived for structs with named fields",
                ))
            }
        },
        _ => return Err(syn::Error::new_spanned(&input, "Model can only be derived for structs")),
    };

    let mut field_exprs = Vec::new();
    let mut relation_exprs = Vec::new();

    for field in fields.iter() {
        let field_name = field.ident.as_ref().unwrap().to_string();
        let spec = FieldSpec::from_field(field)?;

        match &spec.relation {
            Some(relation) => {
                // Many2one/PolymorphicMany2one carry a real stored FK column
                // on this same field, in addition to the virtual relation —
                // the field's own Rust type (not a dummy `()`) is what gets
                // inferred into that column's FieldKind.
                if relation_has_stored_column(&relation.kind) {
                    field_exprs.push(field_builder_expr(&field_name, field, &spec)?);
                }
                relation_exprs.push(relation_def_expr(&field_name, relation)?);
            }
            None => field_exprs.push(field_builder_expr(&field_name, field, &spec)?),
        }
    }

    Ok(quote! {
        impl crm_orm::model::Model for #name {
            fn table_name() -> &'static str {
                #table_name
            }

            fn build_registry() -> crm_orm::model::FieldRegistry {
                let fields: Vec<crm_orm::field::FieldDef> = vec![#(#field_exprs),*]
                    .into_iter()
                    .map(|b| b.build().expect("invalid field definition"))
                    .collect();
                let fields = crm_orm::extension::apply(#table_name, fields);
                let relations: Vec<crm_orm::model::RelationDef> = vec![#(#relation_exprs),*];
                crm_orm::model::FieldRegistry::new(#table_name, fields, relations)
            }

            crm_orm::model_registry_cache!();
        }
    })
}

fn field_kind_expr(spec: &FieldSpec, ty: &syn::Type) -> Result<TokenStream> {
    if let Some(kind) = &spec.kind_override {
        return kind_from_name(kind, spec);
    }
    infer_kind_from_type(ty, spec)
}

fn kind_from_name(kind: &str, spec: &FieldSpec) -> Result<TokenStream> {
    Ok(match kind {
        "integer" => quote! { crm_orm::field::FieldKind::Integer },
        "big_integer" => quote! { crm_orm::field::FieldKind::BigInteger },
        "small_integer" => quote! { crm_orm::field::FieldKind::SmallInteger },
        "text" => quote! { crm_orm::field::FieldKind::Text },
        "boolean" => quote! { crm_orm::field::FieldKind::Boolean },
        "datetime" => quote! { crm_orm::field::FieldKind::Datetime },
        "date" => quote! { crm_orm::field::FieldKind::Date },
        "time" => quote! { crm_orm::field::FieldKind::Time },
        "float" => quote! { crm_orm::field::FieldKind::Float },
        "json" => quote! { crm_orm::field::FieldKind::Json },
        "binary" => quote! { crm_orm::field::FieldKind::Binary },
        "char" => char_kind_expr(spec),
        "decimal" => decimal_kind_expr(spec),
        "selection" => selection_kind_expr(spec),
        other => {
            return Err(syn::Error::new_spanned(
                proc_macro2::Ident::new("kind", proc_macro2::Span::call_site()),
                format!("unknown field kind '{other}'"),
            ))
        }
    })
}

fn char_kind_expr(spec: &FieldSpec) -> TokenStream {
    match spec.char_max_length {
        Some(n) => quote! { crm_orm::field::FieldKind::char(Some(#n)).expect("invalid char field") },
        None => quote! { crm_orm::field::FieldKind::char(None).expect("invalid char field") },
    }
}

fn decimal_kind_expr(spec: &FieldSpec) -> TokenStream {
    let (digits, places) = spec.decimal.unwrap_or((18, 2));
    quote! { crm_orm::field::FieldKind::decimal(#digits, #places).expect("invalid decimal field") }
}

fn selection_kind_expr(spec: &FieldSpec) -> TokenStream {
    let pairs = spec.selection.iter().map(|(value, label)| quote! { (#value.to_string(), #label.to_string()) });
    quote! { crm_orm::field::FieldKind::Selection { options: vec![#(#pairs),*] } }
}

/// Infers a `FieldKind` from the field's own Rust type when no explicit
/// `kind` override is given. `Option<T>` is unwrapped first; nullability
/// is tracked separately via `FieldBuilder::null`/`required`.
fn infer_kind_from_type(ty: &syn::Type, spec: &FieldSpec) -> Result<TokenStream> {
    if !spec.selection.is_empty() {
        return Ok(selection_kind_expr(spec));
    }
    if spec.decimal.is_some() {
        return Ok(decimal_kind_expr(spec));
    }
    if spec.char_max_length.is_some() {
        return Ok(char_kind_expr(spec));
    }

    let inner = common::syn_types::option_inner(ty).unwrap_or(ty);
    let syn::Type::Path(type_path) = inner else {
        return Err(syn::Error::new_spanned(ty, "can't infer a FieldKind from this type, add #[orm(kind = \"...\")]"));
    };
    let ident = &type_path.path.segments.last().unwrap().ident;

    Ok(match ident.to_string().as_str() {
        "i32" => quote! { crm_orm::field::FieldKind::Integer },
        "i64" => quote! { crm_orm::field::FieldKind::BigInteger },
        "i16" => quote! { crm_orm::field::FieldKind::SmallInteger },
        "String" => quote! { crm_orm::field::FieldKind::Text },
        "bool" => quote! { crm_orm::field::FieldKind::Boolean },
        "f64" | "f32" => quote! { crm_orm::field::FieldKind::Float },
        "Decimal" => quote! { crm_orm::field::FieldKind::decimal(18, 2).expect("invalid decimal field") },
        "DateTime" => quote! { crm_orm::field::FieldKind::Datetime },
        "NaiveDate" => quote! { crm_orm::field::FieldKind::Date },
        "NaiveTime" => quote! { crm_orm::field::FieldKind::Time },
        "Value" => quote! { crm_orm::field::FieldKind::Json },
        other => {
            return Err(syn::Error::new_spanned(
                ty,
                format!("can't infer a FieldKind from type '{other}', add #[orm(kind = \"...\")]"),
            ))
        }
    })
}

fn field_builder_expr(field_name: &str, field: &syn::Field, spec: &FieldSpec) -> Result<TokenStream> {
    let kind_expr = field_kind_expr(spec, &field.ty)?;
    let column = spec.column.clone().unwrap_or_else(|| field_name.to_string());

    let mut chain = quote! {
        crm_orm::field::FieldBuilder::new(#field_name, #kind_expr).column(#column)
    };
    if let Some(v) = spec.index {
        chain = quote! { #chain.index(#v) };
    }
    if spec.primary_key {
        chain = quote! { #chain.primary_key(true) };
    }
    if let Some(v) = spec.nullable {
        chain = quote! { #chain.null(#v) };
    }
    if let Some(v) = spec.unique {
        chain = quote! { #chain.unique(#v) };
    }
    if let Some(d) = &spec.description {
        chain = quote! { #chain.description(#d) };
    }
    if let Some(ondelete) = &spec.ondelete {
        let variant = ondelete_variant(ondelete)?;
        chain = quote! { #chain.ondelete(#variant) };
    }
    if spec.required {
        chain = quote! { #chain.required(true) };
    }
    if let Some(v) = spec.schema_required {
        chain = quote! { #chain.schema_required(#v) };
    }
    if let Some(v) = spec.store {
        chain = quote! { #chain.store(#v) };
    }
    if let Some(default) = &spec.default {
        chain = quote! { #chain.default(#default) };
    }
    Ok(chain)
}

fn ondelete_variant(raw: &str) -> Result<TokenStream> {
    Ok(match raw.to_ascii_lowercase().as_str() {
        "restrict" => quote! { crm_orm::field::OnDelete::Restrict },
        "no_action" | "no action" => quote! { crm_orm::field::OnDelete::NoAction },
        "cascade" => quote! { crm_orm::field::OnDelete::Cascade },
        "set_null" | "set null" => quote! { crm_orm::field::OnDelete::SetNull },
        other => {
            return Err(syn::Error::new_spanned(
                proc_macro2::Ident::new("ondelete", proc_macro2::Span::call_site()),
                format!("unknown ondelete value '{other}'"),
            ))
        }
    })
}

/// Many2one and PolymorphicMany2one hold their foreign key on this table;
/// every other relation kind is purely virtual (resolved by a query against
/// the *other* table).
fn relation_has_stored_column(kind: &RelationKindSpec) -> bool {
    matches!(kind, RelationKindSpec::Many2one { .. } | RelationKindSpec::PolymorphicMany2one { .. })
}

fn relation_def_expr(field_name: &str, relation: &RelationSpec) -> Result<TokenStream> {
    let name = relation.as_name.clone().unwrap_or_else(|| default_relation_name(field_name));
    let ondelete = relation
        .ondelete
        .as_deref()
        .map(ondelete_variant)
        .transpose()?
        .unwrap_or_else(|| quote! { crm_orm::field::OnDelete::Restrict });

    // `column` here is the JSON key the FK value lives under in a decoded
    // record (`orm.rs::hydrate` looks it up via `record.get(&column)`), so
    // it's always this field's own name — never the `#[orm(column = ...)]`
    // override, which only renames the underlying SQL column.
    let kind = match &relation.kind {
        RelationKindSpec::Many2one { target } => {
            quote! { crm_orm::model::RelationKind::Many2one { target_table: #target, column: #field_name.to_string() } }
        }
        RelationKindSpec::One2many { target, back_field } => {
            quote! { crm_orm::model::RelationKind::One2many { target_table: #target, back_field: #back_field.to_string() } }
        }
        RelationKindSpec::Many2many { target, link_table, col_self, col_other } => {
            quote! {
                crm_orm::model::RelationKind::Many2many {
                    target_table: #target,
                    link_table: #link_table.to_string(),
                    col_self: #col_self.to_string(),
                    col_other: #col_other.to_string(),
                }
            }
        }
        RelationKindSpec::One2one { target, back_field } => {
            quote! { crm_orm::model::RelationKind::One2one { target_table: #target, back_field: #back_field.to_string() } }
        }
        RelationKindSpec::PolymorphicMany2one { target } => {
            quote! { crm_orm::model::RelationKind::PolymorphicMany2one { target_table: #target, column: #field_name.to_string() } }
        }
        RelationKindSpec::PolymorphicOne2many { target, back_field } => {
            quote! { crm_orm::model::RelationKind::PolymorphicOne2many { target_table: #target, back_field: #back_field.to_string() } }
        }
    };

    Ok(quote! {
        crm_orm::model::RelationDef {
            name: #name.to_string(),
            kind: #kind,
            ondelete: #ondelete,
        }
    })
}

/// `role_id` -> `role`, `role_ids` -> `role`, anything else passes through
/// unchanged — callers with an unconventional field name should set
/// `as_name` explicitly.
fn default_relation_name(field_name: &str) -> String {
    field_name
        .strip_suffix("_ids")
        .or_else(|| field_name.strip_suffix("_id"))
        .unwrap_or(field_name)
        .to_string()
}

use crate::common;
