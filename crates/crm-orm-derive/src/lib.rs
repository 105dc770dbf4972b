//! Derive macros for crm-orm.
//!
//! Provides `#[derive(Model)]`, which builds a model's [`FieldRegistry`]
//! from struct field declarations instead of requiring it to be assembled
//! by hand, and `#[derive(FromRow)]` for callers who want a typed view on
//! top of the same rows the JSON-native runtime decodes.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod common;
mod from_row;
mod model;

/// Derive [`crm_orm::row::FromRow`] for a struct with named fields.
///
/// # Example
///
/// ```ignore
/// use crm_orm::FromRow;
///
/// #[derive(FromRow)]
/// struct UserRow {
///     id: i64,
///     username: String,
///     #[orm(column = "email_address")]
///     email: Option<String>,
/// }
/// ```
///
/// # Attributes
///
/// - `#[orm(column = "name")]` — map the field to a different column name
#[proc_macro_derive(FromRow, attributes(orm))]
pub fn derive_from_row(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    from_row::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derive [`crm_orm::model::Model`] for a struct, building its field/relation
/// registry from attribute-annotated fields.
///
/// # Example
///
/// ```ignore
/// use crm_orm::Model;
///
/// #[derive(Model)]
/// #[orm(table = "users")]
/// struct User {
///     #[orm(primary_key)]
///     id: i32,
///     #[orm(char(max_length = 255), unique)]
///     email: String,
///     #[orm(many2many(target = "role", link_table = "user_roles", col_self = "user_id", col_other = "role_id"), as_name = "roles")]
///     role_ids: (),
/// }
/// ```
///
/// # Attributes
///
/// Struct-level:
///
/// - `#[orm(table = "name")]` — table name (required)
///
/// Field-level (scalar):
///
/// - `#[orm(primary_key)]`
/// - `#[orm(column = "name")]` — override the DB column name
/// - `#[orm(kind = "...")]` — override the inferred `FieldKind`
/// - `#[orm(char(max_length = N))]` / `#[orm(decimal(max_digits = N, decimal_places = M))]`
/// - `#[orm(selection(a = "A", b = "B"))]`
/// - `#[orm(index)]` / `#[orm(unique)]` / `#[orm(required)]`
/// - `#[orm(default = ...)]`, `#[orm(ondelete = "cascade")]`, `#[orm(description = "...")]`
/// - `#[orm(schema_required = true)]`, `#[orm(store = false)]`
///
/// Field-level (relation — the field's own Rust type is never read):
///
/// - `#[orm(many2one(target = "role"))]` — field holds the FK column
/// - `#[orm(one2many(target = "message", back_field = "user_id"))]`
/// - `#[orm(many2many(target = "role", link_table = "user_roles", col_self = "...", col_other = "..."))]`
/// - `#[orm(one2one(target = "profile", back_field = "user_id"))]`
/// - `#[orm(polymorphic_many2one(target = "attachment"))]` — field holds the `res_id` column
/// - `#[orm(polymorphic_one2many(target = "attachment", back_field = "res_id"))]`
/// - `#[orm(as_name = "name")]` — the relation's JSON-facing name, when it
///   should differ from the field's own name (defaults to the field name
///   with a trailing `_id`/`_ids` stripped)
#[proc_macro_derive(Model, attributes(orm))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    model::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
