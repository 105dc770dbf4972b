//! Per-model router state: a pool, the installed access checker, and the
//! pre-built schema registry/model catalog shared across every model's
//! router.

use crm_orm::{AccessChecker, Model};
use crm_schema::{ModelCatalog, SchemaRegistry};
use deadpool_postgres::Pool;
use std::marker::PhantomData;
use std::sync::Arc;

pub struct CrudState<M: Model> {
    pub pool: Pool,
    pub access: Arc<dyn AccessChecker>,
    pub schemas: Arc<SchemaRegistry>,
    pub catalog: Arc<ModelCatalog>,
    _marker: PhantomData<M>,
}

impl<M: Model> CrudState<M> {
    pub fn new(pool: Pool, access: Arc<dyn AccessChecker>, schemas: Arc<SchemaRegistry>, catalog: Arc<ModelCatalog>) -> Self {
        Self {
            pool,
            access,
            schemas,
            catalog,
            _marker: PhantomData,
        }
    }

    pub fn orm(&self) -> crm_orm::Orm<M> {
        crm_orm::Orm::new(self.pool.clone(), self.access.clone())
    }

    pub fn schema_set(&self) -> &crm_schema::SchemaSet {
        self.schemas
            .get(M::table_name())
            .unwrap_or_else(|| panic!("no schema built for table '{}' — register it in the ModelCatalog", M::table_name()))
    }
}

impl<M: Model> Clone for CrudState<M> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            access: self.access.clone(),
            schemas: self.schemas.clone(),
            catalog: self.catalog.clone(),
            _marker: PhantomData,
        }
    }
}
