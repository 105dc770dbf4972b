//! # crm-schema
//!
//! Schema registry: builds the six JSON-Schema-shaped validation documents
//! and the filter triplet set for every registered model, in one pass, and
//! caches them for the process lifetime.
//!
//! Relation fields are rewritten differently per schema kind:
//!
//! - `create`/`update`: a to-one relation becomes an id-or-`"VirtualId"`
//!   union, a to-many relation becomes an add/remove/set command object
//! - `search_output`: any relation becomes `{id, name}`
//! - `read_output`: relations nest one extra level, and that nested level's
//!   own relations are always `{id, name}` — a recursion cap that
//!   terminates on mutually-referencing models
//!
//! `crm-api` consumes a built [`SchemaRegistry`] to validate request bodies
//! and answer the `GET /fields` route without touching the database.

mod build;
mod catalog;
mod descriptor;
mod registry;
mod triplet;

pub use catalog::ModelCatalog;
pub use registry::{SchemaRegistry, SchemaSet};
pub use triplet::{Triplet, ValueType};
