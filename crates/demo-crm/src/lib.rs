//! Sample models exercising every relation kind the ORM supports, wired
//! through the schema registry and CRUD router generator end to end:
//! `User` <-M2M-> `Role`, `ChatMessage` -M2O-> `User`, and
//! `ChatMessage` <-polymorphic O2M-> `Attachment`.

mod attachment;
mod chat_message;
mod role;
mod user;

pub use attachment::Attachment;
pub use chat_message::ChatMessage;
pub use role::Role;
pub use user::User;

use crm_orm::{FieldRegistry, Model};
use crm_schema::{ModelCatalog, SchemaRegistry};

/// Every model this demo declares, in the order tables must be created (no
/// ordering is actually required — `apply_schema` defers FKs — but a stable
/// order keeps `crm-cli`'s log output predictable).
pub fn model_catalog() -> ModelCatalog {
    let mut catalog = ModelCatalog::new();
    catalog.register::<User>();
    catalog.register::<Role>();
    catalog.register::<ChatMessage>();
    catalog.register::<Attachment>();
    catalog
}

pub fn schema_registry(catalog: &ModelCatalog) -> SchemaRegistry {
    SchemaRegistry::build_all(catalog)
}

/// Field registries for every model, in `model_catalog`'s order — what
/// `crm-cli` feeds into `crm_orm::apply_schema`.
pub fn field_registries() -> Vec<&'static FieldRegistry> {
    vec![User::registry(), Role::registry(), ChatMessage::registry(), Attachment::registry()]
}
