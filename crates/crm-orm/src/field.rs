//! Scalar field definitions and the invariants they enforce at
//! model-definition time (relation descriptors live in `model.rs`).
//!
//! Every rule here is load-bearing: a field that fails `validate()` never
//! reaches the DDL engine or the query builder, so a bad model definition
//! fails fast at startup instead of producing a broken schema.

use crate::error::{OrmError, OrmResult};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    Restrict,
    NoAction,
    Cascade,
    SetNull,
}

impl OnDelete {
    pub fn as_sql(self) -> &'static str {
        match self {
            OnDelete::Restrict => "RESTRICT",
            OnDelete::NoAction => "NO ACTION",
            OnDelete::Cascade => "CASCADE",
            OnDelete::SetNull => "SET NULL",
        }
    }

    /// A field with no explicit `ondelete` defaults to `SET NULL` when
    /// nullable, `RESTRICT` otherwise.
    pub fn default_for(nullable: bool) -> Self {
        if nullable {
            OnDelete::SetNull
        } else {
            OnDelete::Restrict
        }
    }

    pub fn parse(raw: &str) -> OrmResult<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "restrict" => Ok(OnDelete::Restrict),
            "no action" => Ok(OnDelete::NoAction),
            "cascade" => Ok(OnDelete::Cascade),
            "set null" => Ok(OnDelete::SetNull),
            other => Err(OrmError::configuration(format!(
                "invalid ondelete value: '{other}'. must be one of: restrict, no action, cascade, set null"
            ))),
        }
    }
}

/// The scalar SQL type a field materializes as. `Selection` is layered on
/// top of `Char` the way the original system stores an option set in a
/// plain `VARCHAR` column and validates membership only in application
/// code.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Integer,
    BigInteger,
    SmallInteger,
    Char { max_length: Option<u32> },
    Selection { options: Vec<(String, String)> },
    Text,
    Boolean,
    Decimal { max_digits: u32, decimal_places: u32 },
    Datetime,
    Date,
    Time,
    Float,
    Json,
    Binary,
}

impl FieldKind {
    pub fn sql_type(&self, primary_key: bool) -> String {
        match self {
            FieldKind::Integer => {
                if primary_key {
                    "SERIAL".to_string()
                } else {
                    "INTEGER".to_string()
                }
            }
            FieldKind::BigInteger => {
                if primary_key {
                    "BIGSERIAL".to_string()
                } else {
                    "BIGINT".to_string()
                }
            }
            FieldKind::SmallInteger => {
                if primary_key {
                    "SMALLSERIAL".to_string()
                } else {
                    "SMALLINT".to_string()
                }
            }
            FieldKind::Char { max_length: Some(n) } => format!("VARCHAR({n})"),
            FieldKind::Char { max_length: None } => "VARCHAR".to_string(),
            FieldKind::Selection { .. } => "VARCHAR(64)".to_string(),
            FieldKind::Text => "TEXT".to_string(),
            FieldKind::Boolean => "BOOL".to_string(),
            FieldKind::Decimal { max_digits, decimal_places } => {
                format!("DECIMAL({max_digits},{decimal_places})")
            }
            FieldKind::Datetime => "TIMESTAMPTZ".to_string(),
            FieldKind::Date => "DATE".to_string(),
            FieldKind::Time => "TIMETZ".to_string(),
            FieldKind::Float => "DOUBLE PRECISION".to_string(),
            FieldKind::Json => "JSONB".to_string(),
            FieldKind::Binary => "BYTEA".to_string(),
        }
    }

    /// Whether this kind can be the target of `SERIAL`/`BIGSERIAL` style
    /// primary keys.
    fn is_integer_family(&self) -> bool {
        matches!(
            self,
            FieldKind::Integer | FieldKind::BigInteger | FieldKind::SmallInteger
        )
    }

    /// Fields the original system excludes from indexing: large text blobs,
    /// JSON documents and binary payloads.
    fn is_indexable_by_default(&self) -> bool {
        !matches!(self, FieldKind::Text | FieldKind::Json | FieldKind::Binary)
    }
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
    pub column: String,
    pub index: bool,
    pub primary_key: bool,
    pub null: bool,
    pub unique: bool,
    pub description: Option<String>,
    pub default: Option<Value>,
    pub ondelete: OnDelete,
    pub required: Option<bool>,
    pub schema_required: Option<bool>,
    pub indexable: bool,
    pub store: bool,
}

pub struct FieldBuilder {
    name: String,
    kind: FieldKind,
    column: Option<String>,
    index: bool,
    primary_key: bool,
    null: bool,
    unique: bool,
    description: Option<String>,
    default: Option<Value>,
    ondelete: Option<OnDelete>,
    required: Option<bool>,
    schema_required: Option<bool>,
    indexable: Option<bool>,
    store: bool,
}

impl FieldBuilder {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            column: None,
            index: false,
            primary_key: false,
            null: true,
            unique: false,
            description: None,
            default: None,
            ondelete: None,
            required: None,
            schema_required: None,
            indexable: None,
            store: true,
        }
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn index(mut self, v: bool) -> Self {
        self.index = v;
        self
    }

    pub fn primary_key(mut self, v: bool) -> Self {
        self.primary_key = v;
        self
    }

    pub fn null(mut self, v: bool) -> Self {
        self.null = v;
        self
    }

    pub fn unique(mut self, v: bool) -> Self {
        self.unique = v;
        self
    }

    pub fn description(mut self, v: impl Into<String>) -> Self {
        self.description = Some(v.into());
        self
    }

    pub fn default(mut self, v: impl Into<Value>) -> Self {
        self.default = Some(v.into());
        self
    }

    pub fn ondelete(mut self, v: OnDelete) -> Self {
        self.ondelete = Some(v);
        self
    }

    pub fn required(mut self, v: bool) -> Self {
        self.required = Some(v);
        self.null = !v;
        self
    }

    pub fn schema_required(mut self, v: bool) -> Self {
        self.schema_required = Some(v);
        self
    }

    pub fn store(mut self, v: bool) -> Self {
        self.store = v;
        self
    }

    pub fn build(mut self) -> OrmResult<FieldDef> {
        let indexable = self
            .indexable
            .unwrap_or_else(|| self.kind.is_indexable_by_default());

        if !indexable && (self.unique || self.index) {
            return Err(OrmError::configuration(format!(
                "field '{}' can't be indexed",
                self.name
            )));
        }

        if self.primary_key {
            self.unique = true;
            if !self.kind.is_integer_family() {
                return Err(OrmError::configuration(format!(
                    "field '{}': primary_key is supported only for integer, bigint, smallint fields",
                    self.name
                )));
            }
            if !self.store {
                return Err(OrmError::configuration(format!(
                    "field '{}': primary_key requires store = true",
                    self.name
                )));
            }
            self.null = false;
            if self.index {
                return Err(OrmError::configuration(format!(
                    "field '{}': primary key already has an index, index = true is redundant",
                    self.name
                )));
            }
            if self.default.is_some() {
                return Err(OrmError::configuration(format!(
                    "field '{}': primary key already autoincrements, default is redundant",
                    self.name
                )));
            }
        }

        if self.unique && self.index {
            return Err(OrmError::configuration(format!(
                "field '{}': unique already implies an index, index = true is redundant",
                self.name
            )));
        }

        if matches!(self.kind, FieldKind::Text) && (self.unique || self.index) {
            return Err(OrmError::configuration(format!(
                "field '{}': text fields can't carry a unique constraint or index, use char instead",
                self.name
            )));
        }

        let ondelete = self
            .ondelete
            .unwrap_or_else(|| OnDelete::default_for(self.null));

        Ok(FieldDef {
            column: self.column.unwrap_or_else(|| self.name.clone()),
            name: self.name,
            kind: self.kind,
            index: self.index,
            primary_key: self.primary_key,
            null: self.null,
            unique: self.unique,
            description: self.description,
            default: self.default,
            ondelete,
            required: self.required,
            schema_required: self.schema_required,
            indexable,
            store: self.store,
        })
    }
}

impl FieldKind {
    pub fn char(max_length: Option<u32>) -> OrmResult<FieldKind> {
        if let Some(n) = max_length {
            if n < 1 {
                return Err(OrmError::configuration("max_length must be >= 1"));
            }
        }
        Ok(FieldKind::Char { max_length })
    }

    pub fn decimal(max_digits: u32, decimal_places: u32) -> OrmResult<FieldKind> {
        if max_digits < 1 {
            return Err(OrmError::configuration("max_digits must be >= 1"));
        }
        Ok(FieldKind::Decimal {
            max_digits,
            decimal_places,
        })
    }
}

/// Selection options for a `Selection` field, additive through the
/// extension registry via `add_options` — later registrations append,
/// duplicates (by value) are dropped.
#[derive(Debug, Clone, Default)]
pub struct SelectionOptions {
    base: Vec<(String, String)>,
    added: Vec<(String, String)>,
}

impl SelectionOptions {
    pub fn new(base: Vec<(String, String)>) -> Self {
        Self {
            base,
            added: Vec::new(),
        }
    }

    pub fn add_options(&mut self, new_options: Vec<(String, String)>) {
        for opt in new_options {
            if !self.base.contains(&opt) && !self.added.contains(&opt) {
                self.added.push(opt);
            }
        }
    }

    pub fn all(&self) -> Vec<(String, String)> {
        self.base.iter().chain(self.added.iter()).cloned().collect()
    }

    pub fn values(&self) -> Vec<String> {
        self.all().into_iter().map(|(v, _)| v).collect()
    }

    pub fn label(&self, value: &str) -> Option<String> {
        self.all().into_iter().find(|(v, _)| v == value).map(|(_, l)| l)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_key_widens_integer_to_serial() {
        let f = FieldBuilder::new("id", FieldKind::Integer)
            .primary_key(true)
            .build()
            .unwrap();
        assert_eq!(f.kind.sql_type(true), "SERIAL");
        assert!(!f.null);
        assert!(f.unique);
    }

    #[test]
    fn primary_key_rejects_non_integer_kind() {
        let err = FieldBuilder::new("id", FieldKind::Text)
            .primary_key(true)
            .build()
            .unwrap_err();
        assert!(matches!(err, OrmError::Configuration(_)));
    }

    #[test]
    fn primary_key_rejects_explicit_default() {
        let err = FieldBuilder::new("id", FieldKind::Integer)
            .primary_key(true)
            .default(1i64)
            .build()
            .unwrap_err();
        assert!(matches!(err, OrmError::Configuration(_)));
    }

    #[test]
    fn unique_and_index_are_mutually_exclusive() {
        let err = FieldBuilder::new("email", FieldKind::char(Some(255)).unwrap())
            .unique(true)
            .index(true)
            .build()
            .unwrap_err();
        assert!(matches!(err, OrmError::Configuration(_)));
    }

    #[test]
    fn text_field_cannot_be_unique() {
        let err = FieldBuilder::new("bio", FieldKind::Text)
            .unique(true)
            .build()
            .unwrap_err();
        assert!(matches!(err, OrmError::Configuration(_)));
    }

    #[test]
    fn ondelete_defaults_from_nullability() {
        let nullable = FieldBuilder::new("owner_id", FieldKind::Integer)
            .null(true)
            .build()
            .unwrap();
        assert_eq!(nullable.ondelete, OnDelete::SetNull);

        let required = FieldBuilder::new("owner_id", FieldKind::Integer)
            .required(true)
            .build()
            .unwrap();
        assert_eq!(required.ondelete, OnDelete::Restrict);
    }

    #[test]
    fn selection_add_options_dedupes() {
        let mut sel = SelectionOptions::new(vec![("internal".into(), "Internal".into())]);
        sel.add_options(vec![("telegram".into(), "Telegram".into())]);
        sel.add_options(vec![("internal".into(), "Internal".into())]);
        assert_eq!(sel.values(), vec!["internal", "telegram"]);
    }
}
