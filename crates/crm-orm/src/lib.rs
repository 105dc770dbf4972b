//! # crm-orm
//!
//! A generic asynchronous relational ORM for PostgreSQL: a model/field
//! system, a JSON filter grammar, a query builder, session/transaction
//! handling, pluggable access control, a DDL bootstrap engine and an
//! extension registry for attaching fields to a model from elsewhere.
//!
//! ## Features
//!
//! - **JSON-native runtime**: records move through the ORM as
//!   `serde_json::Map`, matching the wire format the CRUD layer speaks
//! - **Declarative fields**: a closed field-kind set with validated
//!   invariants (primary keys, uniqueness, indexing) enforced at
//!   model-definition time, not at query time
//! - **Ambient transactions**: `Session::with_transaction` pins a
//!   connection to the current task instead of threading one through
//!   every call
//! - **Pluggable access control**: row/table access checks and a
//!   caller-supplied domain filter consulted on every CRUD entry point

pub mod access;
pub mod dialect;
pub mod error;
pub mod extension;
pub mod field;
pub mod filter;
pub mod model;
pub mod params;
pub mod qb;
pub mod row;
pub mod value;

#[cfg(feature = "pool")]
pub mod ddl;
#[cfg(feature = "pool")]
pub mod orm;
#[cfg(feature = "pool")]
pub mod pool;
#[cfg(feature = "pool")]
pub mod session;
#[cfg(feature = "pool")]
pub mod settings_cache;
#[cfg(feature = "validate")]
pub mod validate;

pub use access::{AccessChecker, CallerContext, Operation, Unrestricted};
pub use dialect::Dialect;
pub use error::{OrmError, OrmResult};
pub use field::{FieldBuilder, FieldDef, FieldKind, OnDelete, SelectionOptions};
pub use filter::FilterParser;
pub use model::{model_registry_cache, FieldRegistry, Model, RelationDef, RelationKind};
pub use params::ParamList;
pub use qb::{Order, QueryBuilder, SearchSpec};
pub use row::{FromRow, RowExt};
pub use value::Value;

#[cfg(feature = "pool")]
pub use ddl::{apply_foreign_keys, apply_schema, ForeignKey};
#[cfg(feature = "pool")]
pub use orm::{decode_column, JsonMap, NestedFields, Orm, SearchParams, SerializationMode};
#[cfg(feature = "pool")]
pub use pool::create_pool;
#[cfg(feature = "pool")]
pub use session::{execute_maybe_parallel, Cursor, QueryOutcome, Session};
#[cfg(feature = "pool")]
pub use settings_cache::SettingsCache;

#[cfg(feature = "derive")]
pub use crm_orm_derive::{FromRow, Model};
