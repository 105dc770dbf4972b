//! Attribute parsing for the `Model` derive macro.
//!
//! Every directive lives inside a single `#[orm(...)]` list per field (or
//! per struct, for `table`), parsed with `syn`'s nested-meta walker rather
//! than a hand-rolled token muncher.

use proc_macro2::TokenStream;
use syn::{DeriveInput, Expr, ExprLit, Field, Lit, LitInt, LitStr, Result};

#[derive(Default)]
pub struct FieldSpec {
    pub column: Option<String>,
    pub primary_key: bool,
    pub kind_override: Option<String>,
    pub char_max_length: Option<u32>,
    pub decimal: Option<(u32, u32)>,
    pub selection: Vec<(String, String)>,
    pub index: Option<bool>,
    pub unique: Option<bool>,
    pub nullable: Option<bool>,
    pub required: bool,
    pub description: Option<String>,
    pub ondelete: Option<String>,
    pub schema_required: Option<bool>,
    pub store: Option<bool>,
    pub default: Option<TokenStream>,
    pub relation: Option<RelationSpec>,
}

pub struct RelationSpec {
    pub kind: RelationKindSpec,
    pub as_name: Option<String>,
    pub ondelete: Option<String>,
}

pub enum RelationKindSpec {
    Many2one { target: String },
    One2many { target: String, back_field: String },
    Many2many { target: String, link_table: String, col_self: String, col_other: String },
    One2one { target: String, back_field: String },
    PolymorphicMany2one { target: String },
    PolymorphicOne2many { target: String, back_field: String },
}

pub fn table_name(input: &DeriveInput) -> Result<String> {
    let mut table = None;
    for attr in &input.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                table = Some(meta.value()?.parse::<LitStr>()?.value());
                Ok(())
            } else {
                Err(meta.error("unknown struct-level orm attribute"))
            }
        })?;
    }
    table.ok_or_else(|| syn::Error::new_spanned(input, "Model requires #[orm(table = \"table_name\")]"))
}

impl FieldSpec {
    pub fn from_field(field: &Field) -> Result<Self> {
        let mut spec = FieldSpec::default();
        let mut as_name = None;
        let mut relation_ondelete = None;

        for attr in &field.attrs {
            if !attr.path().is_ident("orm") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                let path = meta.path.clone();
                if path.is_ident("column") {
                    spec.column = Some(meta.value()?.parse::<LitStr>()?.value());
                } else if path.is_ident("primary_key") {
                    spec.primary_key = true;
                } else if path.is_ident("kind") {
                    spec.kind_override = Some(meta.value()?.parse::<LitStr>()?.value());
                } else if path.is_ident("index") {
                    spec.index = Some(true);
                } else if path.is_ident("unique") {
                    spec.unique = Some(true);
                } else if path.is_ident("null") {
                    spec.nullable = Some(meta.value()?.parse::<syn::LitBool>()?.value());
                } else if path.is_ident("required") {
                    spec.required = true;
                } else if path.is_ident("description") {
                    spec.description = Some(meta.value()?.parse::<LitStr>()?.value());
                } else if path.is_ident("ondelete") {
                    let v = meta.value()?.parse::<LitStr>()?.value();
                    spec.ondelete = Some(v.clone());
                    relation_ondelete = Some(v);
                } else if path.is_ident("schema_required") {
                    spec.schema_required = Some(meta.value()?.parse::<syn::LitBool>()?.value());
                } else if path.is_ident("store") {
                    spec.store = Some(meta.value()?.parse::<syn::LitBool>()?.value());
                } else if path.is_ident("as_name") {
                    as_name = Some(meta.value()?.parse::<LitStr>()?.value());
                } else if path.is_ident("default") {
                    spec.default = Some(default_expr_tokens(&meta.value()?.parse::<Expr>()?));
                } else if path.is_ident("char") {
                    meta.parse_nested_meta(|inner| {
                        if inner.path.is_ident("max_length") {
                            spec.char_max_length = Some(inner.value()?.parse::<LitInt>()?.base10_parse()?);
                            Ok(())
                        } else {
                            Err(inner.error("unknown char() option"))
                        }
                    })?;
                } else if path.is_ident("decimal") {
                    let mut max_digits = 18u32;
                    let mut decimal_places = 2u32;
                    meta.parse_nested_meta(|inner| {
                        if inner.path.is_ident("max_digits") {
                            max_digits = inner.value()?.parse::<LitInt>()?.base10_parse()?;
                        } else if inner.path.is_ident("decimal_places") {
                            decimal_places = inner.value()?.parse::<LitInt>()?.base10_parse()?;
                        } else {
                            return Err(inner.error("unknown decimal() option"));
                        }
                        Ok(())
                    })?;
                    spec.decimal = Some((max_digits, decimal_places));
                } else if path.is_ident("selection") {
                    meta.parse_nested_meta(|inner| {
                        let value = inner.path.get_ident().map(|i| i.to_string()).unwrap_or_default();
                        let label = inner.value()?.parse::<LitStr>()?.value();
                        spec.selection.push((value, label));
                        Ok(())
                    })?;
                } else if path.is_ident("many2one") {
                    let target = parse_target_only(&meta)?;
                    spec.relation = Some(RelationSpec {
                        kind: RelationKindSpec::Many2one { target },
                        as_name: None,
                        ondelete: None,
                    });
                } else if path.is_ident("polymorphic_many2one") {
                    let target = parse_target_only(&meta)?;
                    spec.relation = Some(RelationSpec {
                        kind: RelationKindSpec::PolymorphicMany2one { target },
                        as_name: None,
                        ondelete: None,
                    });
                } else if path.is_ident("one2many") {
                    let (target, back_field) = parse_target_and_back_field(&meta)?;
                    spec.relation = Some(RelationSpec {
                        kind: RelationKindSpec::One2many { target, back_field },
                        as_name: None,
                        ondelete: None,
                    });
                } else if path.is_ident("polymorphic_one2many") {
                    let (target, back_field) = parse_target_and_back_field(&meta)?;
                    spec.relation = Some(RelationSpec {
                        kind: RelationKindSpec::PolymorphicOne2many { target, back_field },
                        as_name: None,
                        ondelete: None,
                    });
                } else if path.is_ident("one2one") {
                    let (target, back_field) = parse_target_and_back_field(&meta)?;
                    spec.relation = Some(RelationSpec {
                        kind: RelationKindSpec::One2one { target, back_field },
                        as_name: None,
                        ondelete: None,
                    });
                } else if path.is_ident("many2many") {
                    let mut target = None;
                    let mut link_table = None;
                    let mut col_self = None;
                    let mut col_other = None;
                    meta.parse_nested_meta(|inner| {
                        if inner.path.is_ident("target") {
                            target = Some(inner.value()?.parse::<LitStr>()?.value());
                        } else if inner.path.is_ident("link_table") {
                            link_table = Some(inner.value()?.parse::<LitStr>()?.value());
                        } else if inner.path.is_ident("col_self") {
                            col_self = Some(inner.value()?.parse::<LitStr>()?.value());
                        } else if inner.path.is_ident("col_other") {
                            col_other = Some(inner.value()?.parse::<LitStr>()?.value());
                        } else {
                            return Err(inner.error("unknown many2many() option"));
                        }
                        Ok(())
                    })?;
                    let err = || syn::Error::new_spanned(&field.ident, "many2many requires target, link_table, col_self and col_other");
                    spec.relation = Some(RelationSpec {
                        kind: RelationKindSpec::Many2many {
                            target: target.ok_or_else(err)?,
                            link_table: link_table.ok_or_else(err)?,
                            col_self: col_self.ok_or_else(err)?,
                            col_other: col_other.ok_or_else(err)?,
                        },
                        as_name: None,
                        ondelete: None,
                    });
                } else {
                    return Err(meta.error("unknown field-level orm attribute"));
                }
                Ok(())
            })?;
        }

        if let Some(relation) = &mut spec.relation {
            relation.as_name = as_name;
            relation.ondelete = relation_ondelete;
        }

        Ok(spec)
    }
}

fn parse_target_only(meta: &syn::meta::ParseNestedMeta) -> Result<String> {
    let mut target = None;
    meta.parse_nested_meta(|inner| {
        if inner.path.is_ident("target") {
            target = Some(inner.value()?.parse::<LitStr>()?.value());
            Ok(())
        } else {
            Err(inner.error("unknown option, expected target"))
        }
    })?;
    target.ok_or_else(|| meta.error("requires target = \"...\""))
}

fn parse_target_and_back_field(meta: &syn::meta::ParseNestedMeta) -> Result<(String, String)> {
    let mut target = None;
    let mut back_field = None;
    meta.parse_nested_meta(|inner| {
        if inner.path.is_ident("target") {
            target = Some(inner.value()?.parse::<LitStr>()?.value());
        } else if inner.path.is_ident("back_field") {
            back_field = Some(inner.value()?.parse::<LitStr>()?.value());
        } else {
            return Err(inner.error("unknown option, expected target/back_field"));
        }
        Ok(())
    })?;
    let err = || meta.error("requires target = \"...\" and back_field = \"...\"");
    Ok((target.ok_or_else(err)?, back_field.ok_or_else(err)?))
}

/// Builds the token stream passed to `FieldBuilder::default(...)`. Supports
/// bool/int/string literals directly; anything else is passed through
/// verbatim so a caller can write a constant expression.
fn default_expr_tokens(expr: &Expr) -> TokenStream {
    use quote::quote;
    if let Expr::Lit(ExprLit { lit, .. }) = expr {
        return match lit {
            Lit::Bool(b) => quote! { #b },
            Lit::Int(i) => quote! { #i as i64 },
            Lit::Float(f) => quote! { #f },
            Lit::Str(s) => quote! { #s.to_string() },
            other => quote! { #other },
        };
    }
    quote::quote! { #expr }
}
