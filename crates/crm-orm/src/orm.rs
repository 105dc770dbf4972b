//! ORM runtime.
//!
//! Ties the field registry, query builder, session and access checker
//! together into the CRUD surface the REST layer actually calls.
//! Records travel as a generic JSON map rather than a typed struct: the
//! automatic CRUD layer is JSON-native end to end (HTTP body in, HTTP body
//! out), so forcing a compile-time row type onto every operation here would
//! just mean converting back to JSON one layer up. Callers who want a typed
//! view can still implement [`crate::row::FromRow`] on top of the same rows.

use crate::access::{self, AccessChecker, Operation};
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::field::FieldKind;
use crate::filter::FilterParser;
use crate::model::{FieldRegistry, Model, RelationKind};
use crate::params::ParamList;
use crate::qb::{Order, QueryBuilder, SearchSpec};
use crate::row::RowExt;
use crate::session::{execute_maybe_parallel, Cursor, Session};
use crate::value::Value;
use deadpool_postgres::Pool;
use serde_json::{Map, Value as Json};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio_postgres::Row;

pub type JsonMap = Map<String, Json>;

const DEFAULT_SEARCH_LIMIT: i64 = 1000;

/// How a record is shaped for the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializationMode {
    List,
    Form,
    NestedList,
    Create,
    Update,
}

/// Which relation fields to hydrate on a `get`/`search`, and how deep.
#[derive(Debug, Clone, Default)]
pub struct NestedFields {
    pub names: Vec<String>,
}

impl NestedFields {
    pub fn none() -> Self {
        Self { names: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Search parameters accepted by `Orm::search`, mirroring the REST query
/// parameters one-to-one.
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub fields: Option<Vec<String>>,
    pub filter: Json,
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub limit: i64,
    pub sort: String,
    pub order: String,
    pub nested: NestedFields,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            fields: None,
            filter: Json::Array(vec![]),
            start: None,
            end: None,
            limit: DEFAULT_SEARCH_LIMIT,
            sort: "id".to_string(),
            order: "DESC".to_string(),
            nested: NestedFields::none(),
        }
    }
}

/// The per-model CRUD entry point. Cheap to construct — clones a pool handle
/// and an `Arc`-wrapped access checker — so handlers build one per request.
pub struct Orm<M: Model> {
    pool: Pool,
    access: Arc<dyn AccessChecker>,
    _marker: PhantomData<M>,
}

impl<M: Model> Orm<M> {
    pub fn new(pool: Pool, access: Arc<dyn AccessChecker>) -> Self {
        Self {
            pool,
            access,
            _marker: PhantomData,
        }
    }

    fn registry(&self) -> &'static FieldRegistry {
        M::registry()
    }

    fn qb(&self) -> QueryBuilder {
        QueryBuilder::new(M::table_name(), Dialect::Postgres)
    }

    fn session(&self) -> Session {
        Session::current(&self.pool)
    }

    fn table(&self) -> &'static str {
        M::table_name()
    }

    /// Stored-column names to select when the caller didn't ask for a
    /// specific projection.
    fn default_store_columns(&self) -> Vec<&str> {
        self.registry().store_columns()
    }

    /// Split a requested field list into stored scalar columns (sent to the
    /// builder) and relation names (hydrated separately).
    fn split_fields<'a>(&self, fields: Option<&'a [String]>) -> (Vec<&'a str>, Vec<&'a str>) {
        let registry = self.registry();
        match fields {
            None => (self.default_store_columns(), Vec::new()),
            Some(names) => {
                let mut columns = Vec::new();
                let mut relations = Vec::new();
                for name in names {
                    if registry.relation(name).is_some() {
                        relations.push(name.as_str());
                    } else if let Some(field) = registry.field(name) {
                        columns.push(field.column.as_str());
                    }
                }
                (columns, relations)
            }
        }
    }

    // -- create ----------------------------------------------------------

    /// Serializes only the stored fields the caller actually set; zero
    /// fields are never synthesized here (a `not null` column without a
    /// caller-supplied value is a DDL-level default, not an ORM concern).
    fn payload_to_row(&self, payload: &JsonMap) -> OrmResult<Vec<(String, Value)>> {
        let registry = self.registry();
        let mut row = Vec::new();
        for field in registry.store_fields() {
            if let Some(v) = payload.get(&field.name) {
                row.push((field.column.clone(), Value::from_json_typed(v, &field.kind)?));
            }
        }
        Ok(row)
    }

    pub async fn create(&self, payload: JsonMap) -> OrmResult<i32> {
        access::enforce(&*self.access, self.table(), Operation::Create, None).await?;
        let row = self.payload_to_row(&payload)?;
        let (sql, params) = self.qb().insert(&row);
        let outcome = self
            .session()
            .execute(&sql, &params.as_sql_params(), Cursor::LastRowId)
            .await?;
        let id = outcome.into_id()?;
        access::enforce(&*self.access, self.table(), Operation::Read, Some(&[id as i64])).await?;
        Ok(id)
    }

    pub async fn create_bulk(&self, payloads: Vec<JsonMap>) -> OrmResult<Vec<i32>> {
        access::enforce(&*self.access, self.table(), Operation::Create, None).await?;
        let mut ids = Vec::with_capacity(payloads.len());
        for payload in payloads {
            let row = self.payload_to_row(&payload)?;
            let (sql, params) = self.qb().insert(&row);
            let outcome = self
                .session()
                .execute(&sql, &params.as_sql_params(), Cursor::LastRowId)
                .await?;
            ids.push(outcome.into_id()?);
        }
        Ok(ids)
    }

    /// `create`, then replay any O2M/M2M command objects embedded in
    /// `payload` against the freshly assigned id — the create-time
    /// counterpart of `update`'s relation-command handling.
    pub async fn create_with_relations(&self, mut payload: JsonMap) -> OrmResult<i32> {
        let registry = self.registry();
        let relation_commands: Vec<(String, JsonMap)> = registry
            .m2m_o2m()
            .filter_map(|relation| {
                payload
                    .remove(&relation.name)
                    .and_then(|v| v.as_object().cloned())
                    .map(|cmd| (relation.name.clone(), cmd))
            })
            .collect();

        let id = self.create(payload).await?;
        for (relation_name, commands) in relation_commands {
            self.apply_relation_commands(id as i64, &relation_name, commands).await?;
        }
        Ok(id)
    }

    // -- read --------------------------------------------------------------

    pub async fn get(&self, id: i64, fields: Option<&[String]>, nested: &NestedFields) -> OrmResult<JsonMap> {
        self.get_or_none(id, fields, nested)
            .await?
            .ok_or_else(|| OrmError::not_found(format!("{}#{id}", self.table())))
    }

    /// The access checker's row-level check above has already vetted this
    /// specific id, so a `get` never needs to re-apply its domain filter in
    /// SQL — unlike `search`, where the domain is ANDed into the WHERE
    /// clause because there's no single id to check ahead of time.
    pub async fn get_or_none(
        &self,
        id: i64,
        fields: Option<&[String]>,
        nested: &NestedFields,
    ) -> OrmResult<Option<JsonMap>> {
        access::enforce(&*self.access, self.table(), Operation::Read, Some(&[id])).await?;
        let (mut columns, relation_names) = self.split_fields(fields);
        let requested_relations = self.relations_for(&relation_names, nested);
        if !columns.contains(&"id") {
            columns.push("id");
        }

        let (sql, params) = self.qb().get_by_id(&columns, id);
        let outcome = self
            .session()
            .execute(&sql, &params.as_sql_params(), Cursor::Fetch)
            .await?;
        let rows = outcome.into_rows()?;
        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };
        let mut record = self.row_to_json(&row, &columns)?;
        self.hydrate(&mut [&mut record], &requested_relations).await?;
        Ok(Some(record))
    }

    fn filter_params(&self, filter: &Json, params: &mut ParamList) -> OrmResult<String> {
        FilterParser::new(Dialect::Postgres).parse(filter, params)
    }

    // -- search --------------------------------------------------------------

    pub async fn search(&self, params: &SearchParams) -> OrmResult<Vec<JsonMap>> {
        let domain = access::enforce(&*self.access, self.table(), Operation::Read, None).await?;
        let filter = access::prepend_domain(domain, Some(params.filter.clone()));

        let (mut columns, relation_names) = self.split_fields(params.fields.as_deref());
        let requested_relations = self.relations_for(&relation_names, &params.nested);
        if !columns.contains(&"id") {
            columns.push("id");
        }

        let registry = self.registry();
        // An invalid sort column is silently substituted with the first
        // stored column rather than rejected — search is a read path and
        // shouldn't 400 over a cosmetic mistake.
        let first_stored_column = registry.store_columns().into_iter().next().unwrap_or("id");
        let sort_column = registry
            .field(&params.sort)
            .map(|f| f.column.as_str())
            .unwrap_or(first_stored_column);
        let order = Order::parse(&params.order);

        let mut bound = ParamList::new();
        let where_sql = self.filter_params(&filter, &mut bound)?;
        let spec = SearchSpec {
            fields: &columns,
            where_clause: Some(&where_sql),
            sort: sort_column,
            order,
            start: params.start,
            end: params.end,
            limit: params.limit.max(0),
        };
        let (sql, query_params) = self.qb().search(&spec, bound);

        let outcome = self
            .session()
            .execute(&sql, &query_params.as_sql_params(), Cursor::Fetch)
            .await?;
        let rows = outcome.into_rows()?;

        let mut records: Vec<JsonMap> = rows
            .iter()
            .map(|row| self.row_to_json(row, &columns))
            .collect::<OrmResult<_>>()?;

        let mut refs: Vec<&mut JsonMap> = records.iter_mut().collect();
        self.hydrate(&mut refs, &requested_relations).await?;
        Ok(records)
    }

    pub async fn search_count(&self, filter: &Json) -> OrmResult<i64> {
        access::enforce(&*self.access, self.table(), Operation::Read, None).await?;
        let mut params = ParamList::new();
        let where_sql = self.filter_params(filter, &mut params)?;
        let (sql, params) = self.qb().count(Some(&where_sql), params);
        let outcome = self.session().execute(&sql, &params.as_sql_params(), Cursor::FetchOne).await?;
        let row = outcome.into_row()?;
        row.try_get_column::<i64>("count")
    }

    pub async fn exists(&self, filter: &Json) -> OrmResult<bool> {
        access::enforce(&*self.access, self.table(), Operation::Read, None).await?;
        let mut params = ParamList::new();
        let where_sql = self.filter_params(filter, &mut params)?;
        let (sql, params) = self.qb().exists(Some(&where_sql), params);
        let rows = self
            .session()
            .execute(&sql, &params.as_sql_params(), Cursor::Fetch)
            .await?
            .into_rows()?;
        Ok(!rows.is_empty())
    }

    pub async fn table_len(&self) -> OrmResult<i64> {
        access::enforce(&*self.access, self.table(), Operation::Read, None).await?;
        let (sql, params) = self.qb().table_len();
        let row = self
            .session()
            .execute(&sql, &params.as_sql_params(), Cursor::FetchOne)
            .await?
            .into_row()?;
        row.try_get_column::<i64>("count")
    }

    // -- update / delete ------------------------------------------------

    /// Applies store-field updates plus any relation command sets embedded
    /// in `payload`. Relation fields are intentionally not echoed
    /// back in the returned map — they're stale the moment a command set
    /// runs, and re-reading is the caller's job.
    pub async fn update(&self, id: i64, mut payload: JsonMap) -> OrmResult<JsonMap> {
        access::enforce(&*self.access, self.table(), Operation::Update, Some(&[id])).await?;

        let registry = self.registry();
        let relation_commands: Vec<(String, JsonMap)> = registry
            .m2m_o2m()
            .filter_map(|relation| {
                payload
                    .remove(&relation.name)
                    .and_then(|v| v.as_object().cloned())
                    .map(|cmd| (relation.name.clone(), cmd))
            })
            .collect();

        let row = self.payload_to_row(&payload)?;
        if !row.is_empty() {
            let (sql, params) = self.qb().update_by_id(&row, id)?;
            self.session()
                .execute(&sql, &params.as_sql_params(), Cursor::Void)
                .await?;
        }

        for (relation_name, commands) in relation_commands {
            self.apply_relation_commands(id, &relation_name, commands).await?;
        }

        payload.insert("id".to_string(), Json::Number(id.into()));
        Ok(payload)
    }

    pub async fn update_bulk(&self, ids: &[i64], payload: JsonMap) -> OrmResult<u64> {
        access::enforce(&*self.access, self.table(), Operation::Update, Some(ids)).await?;
        let row = self.payload_to_row(&payload)?;
        let (sql, params) = self.qb().update_bulk(&row, ids)?;
        self.session()
            .execute(&sql, &params.as_sql_params(), Cursor::ExecuteMany)
            .await?
            .into_affected()
    }

    pub async fn delete(&self, id: i64) -> OrmResult<()> {
        access::enforce(&*self.access, self.table(), Operation::Delete, Some(&[id])).await?;
        let (sql, params) = self.qb().delete_by_id(id);
        self.session().execute(&sql, &params.as_sql_params(), Cursor::Void).await?;
        Ok(())
    }

    pub async fn delete_bulk(&self, ids: &[i64]) -> OrmResult<u64> {
        access::enforce(&*self.access, self.table(), Operation::Delete, Some(ids)).await?;
        let (sql, params) = self.qb().delete_bulk(ids);
        self.session()
            .execute(&sql, &params.as_sql_params(), Cursor::ExecuteMany)
            .await?
            .into_affected()
    }

    // -- many2many link operations ---------------------------------------

    pub async fn link_many2many(&self, field: &str, pairs: &[(i64, i64)]) -> OrmResult<()> {
        let RelationKind::Many2many { link_table, col_self, col_other, .. } = self.relation_kind(field)? else {
            return Err(OrmError::invariant(format!("'{field}' is not a many2many relation")));
        };
        let (sql, params) = self.qb().link_many2many(link_table, col_self, col_other, pairs);
        self.session().execute(&sql, &params.as_sql_params(), Cursor::ExecuteMany).await?;
        Ok(())
    }

    pub async fn unlink_many2many(&self, field: &str, self_id: i64, other_ids: &[i64]) -> OrmResult<()> {
        let RelationKind::Many2many { link_table, col_self, col_other, .. } = self.relation_kind(field)? else {
            return Err(OrmError::invariant(format!("'{field}' is not a many2many relation")));
        };
        let (sql, params) = self.qb().unlink_many2many(link_table, col_self, col_other, self_id, other_ids);
        self.session().execute(&sql, &params.as_sql_params(), Cursor::ExecuteMany).await?;
        Ok(())
    }

    /// Backs the `/search_many2many` route: a sorted, paginated read of one
    /// many2many relation's target rows for a single parent, decoded with
    /// the *target* table's own field registry (passed in by the caller —
    /// `Orm<M>` only ever knows `M`'s registry, not the relation target's).
    pub async fn search_many2many(
        &self,
        field: &str,
        parent_id: i64,
        target_registry: &FieldRegistry,
        fields: &[String],
        sort: &str,
        order: &str,
        start: Option<i64>,
        end: Option<i64>,
        limit: i64,
    ) -> OrmResult<(Vec<JsonMap>, i64)> {
        access::enforce(&*self.access, self.table(), Operation::Read, Some(&[parent_id])).await?;
        let RelationKind::Many2many { target_table, link_table, col_self, col_other } = self.relation_kind(field)? else {
            return Err(OrmError::invariant(format!("'{field}' is not a many2many relation")));
        };
        let target_qb = QueryBuilder::new(*target_table, Dialect::Postgres);

        let mut columns: Vec<&str> = fields
            .iter()
            .filter_map(|name| target_registry.field(name))
            .map(|f| f.column.as_str())
            .collect();
        if columns.is_empty() {
            columns = target_registry.store_columns();
        }
        if !columns.contains(&"id") {
            columns.push("id");
        }
        let sort_column = target_registry.field(sort).map(|f| f.column.as_str()).unwrap_or("id");

        let (sql, params) = target_qb.get_many2many_page(
            link_table,
            col_self,
            col_other,
            &columns,
            parent_id,
            sort_column,
            Order::parse(order),
            start,
            end,
            limit,
        );
        let rows = self
            .session()
            .execute(&sql, &params.as_sql_params(), Cursor::Fetch)
            .await?
            .into_rows()?;
        let records = rows
            .iter()
            .map(|row| row_to_json_with_registry(row, &columns, target_registry))
            .collect::<OrmResult<Vec<_>>>()?;

        let (count_sql, count_params) = target_qb.count_many2many(link_table, col_self, parent_id);
        let count_row = self
            .session()
            .execute(&count_sql, &count_params.as_sql_params(), Cursor::FetchOne)
            .await?
            .into_row()?;
        let total = count_row.try_get_column::<i64>("count")?;

        Ok((records, total))
    }

    fn relation_kind(&self, field: &str) -> OrmResult<&'static RelationKind> {
        self.registry()
            .relation(field)
            .map(|r| &r.kind)
            .ok_or_else(|| OrmError::invariant(format!("no such relation: '{field}'")))
    }

    /// Replays a relation command object against one O2M/M2M relation: replace
    /// `"VirtualId"` placeholders, create, delete, then (M2M only) link and
    /// unlink — in that exact order, since created ids feed `selected`.
    async fn apply_relation_commands(&self, parent_id: i64, relation_name: &str, mut commands: JsonMap) -> OrmResult<()> {
        let relation = self
            .registry()
            .relation(relation_name)
            .ok_or_else(|| OrmError::invariant(format!("no such relation: '{relation_name}'")))?
            .kind
            .clone();

        let created = commands
            .remove("created")
            .and_then(|v| v.as_array().cloned())
            .unwrap_or_default();
        let deleted: Vec<i64> = commands
            .remove("deleted")
            .and_then(|v| v.as_array().cloned())
            .unwrap_or_default()
            .into_iter()
            .filter_map(|v| v.as_i64())
            .collect();
        let mut selected: Vec<i64> = commands
            .remove("selected")
            .and_then(|v| v.as_array().cloned())
            .unwrap_or_default()
            .into_iter()
            .filter_map(|v| v.as_i64())
            .collect();
        let unselected: Vec<i64> = commands
            .remove("unselected")
            .and_then(|v| v.as_array().cloned())
            .unwrap_or_default()
            .into_iter()
            .filter_map(|v| v.as_i64())
            .collect();

        match relation {
            RelationKind::Many2many { target_table, link_table, col_self, col_other } => {
                let mut created_ids = Vec::with_capacity(created.len());
                for child in created {
                    let Some(mut child_obj) = child.as_object().cloned() else {
                        return Err(OrmError::invariant("created entry must be an object"));
                    };
                    substitute_virtual_id(&mut child_obj, parent_id);
                    let child_id = self.create_into_table(target_table, child_obj).await?;
                    created_ids.push(child_id as i64);
                }
                selected.extend(created_ids);

                if !deleted.is_empty() {
                    let (sql, params) = self.qb().unlink_many2many(&link_table, &col_self, &col_other, parent_id, &deleted);
                    self.session().execute(&sql, &params.as_sql_params(), Cursor::ExecuteMany).await?;
                }
                if !selected.is_empty() {
                    let pairs: Vec<(i64, i64)> = selected.iter().map(|&other| (parent_id, other)).collect();
                    let (sql, params) = self.qb().link_many2many(&link_table, &col_self, &col_other, &pairs);
                    self.session().execute(&sql, &params.as_sql_params(), Cursor::ExecuteMany).await?;
                }
                if !unselected.is_empty() {
                    let (sql, params) = self.qb().unlink_many2many(&link_table, &col_self, &col_other, parent_id, &unselected);
                    self.session().execute(&sql, &params.as_sql_params(), Cursor::ExecuteMany).await?;
                }
            }
            RelationKind::One2many { target_table, back_field } => {
                for child in created {
                    let Some(mut child_obj) = child.as_object().cloned() else {
                        return Err(OrmError::invariant("created entry must be an object"));
                    };
                    substitute_virtual_id(&mut child_obj, parent_id);
                    child_obj.insert(back_field.clone(), Json::Number(parent_id.into()));
                    self.create_into_table(target_table, child_obj).await?;
                }
                for child_id in deleted {
                    let qb = QueryBuilder::new(target_table, Dialect::Postgres);
                    let (sql, params) = qb.delete_by_id(child_id);
                    self.session().execute(&sql, &params.as_sql_params(), Cursor::Void).await?;
                }
            }
            // Same as One2many, plus the fixed `res_model` discriminator so
            // the child row is only ever matched back by this owning table
            // (see `hydrate_one`'s polymorphic filter).
            RelationKind::PolymorphicOne2many { target_table, back_field } => {
                let owner_table = self.registry().table.clone();
                for child in created {
                    let Some(mut child_obj) = child.as_object().cloned() else {
                        return Err(OrmError::invariant("created entry must be an object"));
                    };
                    substitute_virtual_id(&mut child_obj, parent_id);
                    child_obj.insert(back_field.clone(), Json::Number(parent_id.into()));
                    child_obj.insert("res_model".to_string(), Json::String(owner_table.clone()));
                    self.create_into_table(target_table, child_obj).await?;
                }
                for child_id in deleted {
                    let qb = QueryBuilder::new(target_table, Dialect::Postgres);
                    let (sql, params) = qb.delete_by_id(child_id);
                    self.session().execute(&sql, &params.as_sql_params(), Cursor::Void).await?;
                }
            }
            other => {
                return Err(OrmError::invariant(format!(
                    "'{relation_name}' ({other:?}) does not accept update commands"
                )))
            }
        }
        Ok(())
    }

    /// Inserts a nested-record payload into an arbitrary table by name —
    /// used for relation commands, which don't carry a `Model` type for the
    /// child at compile time. Only stored scalar columns survive; the child
    /// row's own relation fields (if any) aren't recursed into further.
    async fn create_into_table(&self, table: &str, payload: JsonMap) -> OrmResult<i32> {
        let qb = QueryBuilder::new(table, Dialect::Postgres);
        let row: Vec<(String, Value)> = payload
            .into_iter()
            .map(|(k, v)| (k, Value::from_json(&v)))
            .collect();
        let (sql, params) = qb.insert(&row);
        self.session()
            .execute(&sql, &params.as_sql_params(), Cursor::LastRowId)
            .await?
            .into_id()
    }

    // -- relation hydration -----------------------------------------------

    fn relations_for(&self, names: &[&str], nested: &NestedFields) -> Vec<String> {
        let mut set: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        for n in &nested.names {
            if !set.contains(n) {
                set.push(n.clone());
            }
        }
        set
    }

    /// Initializes every relation slot to its empty value, then hydrates
    /// each requested relation with one batched query shared across every
    /// record in `records` (never one query per row).
    async fn hydrate(&self, records: &mut [&mut JsonMap], relation_names: &[String]) -> OrmResult<()> {
        if relation_names.is_empty() || records.is_empty() {
            return Ok(());
        }
        let registry = self.registry();
        let in_transaction = self.session().is_in_transaction();

        for name in relation_names {
            let Some(relation) = registry.relation(name) else {
                continue;
            };
            let kind = relation.kind.clone();
            let empty = if kind.is_plural() { Json::Array(vec![]) } else { Json::Null };
            for record in records.iter_mut() {
                record.insert(name.clone(), empty.clone());
            }
        }

        // Batched hydration runs one relation at a time; within a
        // transaction these execute sequentially (a pinned connection
        // can't serve two statements at once), otherwise concurrently.
        let parent_ids: Vec<i64> = records
            .iter()
            .filter_map(|r| r.get("id").and_then(Json::as_i64))
            .collect();

        let mut hydrations: Vec<(String, RelationKind)> = Vec::new();
        for name in relation_names {
            if let Some(relation) = registry.relation(name) {
                hydrations.push((name.clone(), relation.kind.clone()));
            }
        }

        let owner_table = registry.table.clone();
        let results = execute_maybe_parallel(
            in_transaction,
            hydrations
                .into_iter()
                .map(|(name, kind)| {
                    let parent_ids = parent_ids.clone();
                    let session = self.session();
                    let owner_table = owner_table.clone();
                    move || async move { Self::hydrate_one(&session, &owner_table, &name, &kind, &parent_ids).await }
                })
                .collect(),
        )
        .await;

        let mut by_relation: HashMap<String, Vec<(i64, JsonMap)>> = HashMap::new();
        for result in results {
            let (name, rows) = result?;
            by_relation.insert(name, rows);
        }

        for (name, rows) in by_relation {
            let Some(relation) = registry.relation(&name) else { continue };
            match &relation.kind {
                RelationKind::Many2one { .. } | RelationKind::PolymorphicMany2one { .. } => {
                    let column_name = match &relation.kind {
                        RelationKind::Many2one { column, .. } => column.clone(),
                        RelationKind::PolymorphicMany2one { column, .. } => column.clone(),
                        _ => unreachable!(),
                    };
                    let by_id: HashMap<i64, &JsonMap> = rows.iter().map(|(id, obj)| (*id, obj)).collect();
                    for record in records.iter_mut() {
                        let Some(fk) = record.get(&column_name).and_then(Json::as_i64) else {
                            continue;
                        };
                        if let Some(target) = by_id.get(&fk) {
                            record.insert(name.clone(), Json::Object((*target).clone()));
                        }
                    }
                }
                RelationKind::One2many { back_field, .. } | RelationKind::PolymorphicOne2many { back_field, .. } => {
                    for record in records.iter_mut() {
                        let Some(parent_id) = record.get("id").and_then(Json::as_i64) else {
                            continue;
                        };
                        let matches: Vec<Json> = rows
                            .iter()
                            .filter(|(_, obj)| obj.get(back_field).and_then(Json::as_i64) == Some(parent_id))
                            .map(|(_, obj)| Json::Object(obj.clone()))
                            .collect();
                        record.insert(name.clone(), Json::Array(matches));
                    }
                }
                RelationKind::Many2many { .. } => {
                    for record in records.iter_mut() {
                        let Some(parent_id) = record.get("id").and_then(Json::as_i64) else {
                            continue;
                        };
                        let matches: Vec<Json> = rows
                            .iter()
                            .filter(|(owner, _)| *owner == parent_id)
                            .map(|(_, obj)| Json::Object(obj.clone()))
                            .collect();
                        record.insert(name.clone(), Json::Array(matches));
                    }
                }
                RelationKind::One2one { back_field, .. } => {
                    for record in records.iter_mut() {
                        let Some(parent_id) = record.get("id").and_then(Json::as_i64) else {
                            continue;
                        };
                        if let Some((_, obj)) = rows
                            .iter()
                            .find(|(_, obj)| obj.get(back_field).and_then(Json::as_i64) == Some(parent_id))
                        {
                            record.insert(name.clone(), Json::Object(obj.clone()));
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Runs the single batched query for one relation and returns
    /// `(relation_name, [(discriminator_id, row_json), ...])`. The
    /// discriminator is the target's own id for M2O/O2M/O2O, and the
    /// `m2m_id` (owning parent id) for M2M — `hydrate` distributes rows
    /// back to parents differently depending on which it got.
    async fn hydrate_one(
        session: &Session,
        owner_table: &str,
        name: &str,
        kind: &RelationKind,
        parent_ids: &[i64],
    ) -> OrmResult<(String, Vec<(i64, JsonMap)>)> {
        if parent_ids.is_empty() {
            return Ok((name.to_string(), Vec::new()));
        }
        match kind {
            RelationKind::Many2one { target_table, .. } | RelationKind::PolymorphicMany2one { target_table, .. } => {
                let (sql, params) =
                    QueryBuilder::batch_many2one(Dialect::Postgres, target_table, &["id", "name"], parent_ids);
                let rows = session
                    .execute(&sql, &params.as_sql_params(), Cursor::Fetch)
                    .await?
                    .into_rows()?;
                let out = rows
                    .iter()
                    .map(|r| {
                        let id: i32 = r.try_get_column("id")?;
                        Ok((id as i64, row_to_json_generic(r, &["id", "name"])?))
                    })
                    .collect::<OrmResult<Vec<_>>>()?;
                Ok((name.to_string(), out))
            }
            RelationKind::One2many { target_table, back_field } => {
                let (sql, params) = QueryBuilder::batch_one2many(
                    Dialect::Postgres,
                    target_table,
                    &["id", "name", back_field.as_str()],
                    back_field,
                    parent_ids,
                    None,
                );
                let rows = session
                    .execute(&sql, &params.as_sql_params(), Cursor::Fetch)
                    .await?
                    .into_rows()?;
                let out = rows
                    .iter()
                    .map(|r| {
                        let id: i32 = r.try_get_column("id")?;
                        Ok((id as i64, row_to_json_generic(r, &["id", "name", back_field.as_str()])?))
                    })
                    .collect::<OrmResult<Vec<_>>>()?;
                Ok((name.to_string(), out))
            }
            RelationKind::PolymorphicOne2many { target_table, back_field } => {
                let (sql, params) = QueryBuilder::batch_one2many(
                    Dialect::Postgres,
                    target_table,
                    &["id", "name", back_field.as_str()],
                    back_field,
                    parent_ids,
                    Some(owner_table),
                );
                let rows = session
                    .execute(&sql, &params.as_sql_params(), Cursor::Fetch)
                    .await?
                    .into_rows()?;
                let out = rows
                    .iter()
                    .map(|r| {
                        let id: i32 = r.try_get_column("id")?;
                        Ok((id as i64, row_to_json_generic(r, &["id", "name", back_field.as_str()])?))
                    })
                    .collect::<OrmResult<Vec<_>>>()?;
                Ok((name.to_string(), out))
            }
            RelationKind::One2one { target_table, back_field } => {
                let (sql, params) = QueryBuilder::batch_one2many(
                    Dialect::Postgres,
                    target_table,
                    &["id", "name", back_field.as_str()],
                    back_field,
                    parent_ids,
                    None,
                );
                let rows = session
                    .execute(&sql, &params.as_sql_params(), Cursor::Fetch)
                    .await?
                    .into_rows()?;
                let out = rows
                    .iter()
                    .map(|r| {
                        let id: i32 = r.try_get_column("id")?;
                        Ok((id as i64, row_to_json_generic(r, &["id", "name", back_field.as_str()])?))
                    })
                    .collect::<OrmResult<Vec<_>>>()?;
                Ok((name.to_string(), out))
            }
            RelationKind::Many2many { target_table, link_table, col_self, col_other } => {
                let (sql, params) = crate::qb::QueryBuilder::new(target_table.to_string(), Dialect::Postgres)
                    .get_many2many_batch(link_table, col_self, col_other, &["id", "name"], parent_ids);
                let rows = session
                    .execute(&sql, &params.as_sql_params(), Cursor::Fetch)
                    .await?
                    .into_rows()?;
                let out = rows
                    .iter()
                    .map(|r| {
                        let owner: i32 = r.try_get_column("m2m_id")?;
                        Ok((owner as i64, row_to_json_generic(r, &["id", "name"])?))
                    })
                    .collect::<OrmResult<Vec<_>>>()?;
                Ok((name.to_string(), out))
            }
        }
    }

    /// Decode one row into JSON using the field registry to pick the right
    /// Rust type per column — `id`/relation back-field columns that aren't
    /// in the registry (e.g. a join projection) fall back to the generic
    /// decoder.
    fn row_to_json(&self, row: &Row, columns: &[&str]) -> OrmResult<JsonMap> {
        row_to_json_with_registry(row, columns, self.registry())
    }

    /// Apply a [`SerializationMode`] to an already-materialized record,
    /// reshaping relation values. Scalar fields pass through untouched in
    /// every mode.
    pub fn serialize(&self, mut record: JsonMap, mode: SerializationMode) -> JsonMap {
        let registry = self.registry();
        for relation in &registry.relations {
            let Some(value) = record.get(&relation.name).cloned() else {
                continue;
            };
            let reshaped = match mode {
                SerializationMode::List | SerializationMode::NestedList => summarize(&value),
                SerializationMode::Form => value,
                SerializationMode::Create | SerializationMode::Update => match &relation.kind {
                    RelationKind::Many2one { .. } | RelationKind::PolymorphicMany2one { .. } => {
                        id_only(&value)
                    }
                    _ => value,
                },
            };
            record.insert(relation.name.clone(), reshaped);
        }
        record
    }
}

/// Replace any field whose value is the literal string `"VirtualId"` with
/// the parent's freshly created id.
fn substitute_virtual_id(payload: &mut JsonMap, parent_id: i64) {
    for value in payload.values_mut() {
        if value.as_str() == Some("VirtualId") {
            *value = Json::Number(parent_id.into());
        }
    }
}

/// LIST-mode reshape: an object becomes `{id, name}`; an array of objects
/// becomes a list of `{id, name}`.
fn summarize(value: &Json) -> Json {
    match value {
        Json::Object(obj) => Json::Object(pick_id_name(obj)),
        Json::Array(items) => Json::Array(
            items
                .iter()
                .map(|v| match v {
                    Json::Object(obj) => Json::Object(pick_id_name(obj)),
                    other => other.clone(),
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

fn pick_id_name(obj: &JsonMap) -> JsonMap {
    let mut out = JsonMap::new();
    if let Some(id) = obj.get("id") {
        out.insert("id".to_string(), id.clone());
    }
    if let Some(name) = obj.get("name") {
        out.insert("name".to_string(), name.clone());
    }
    out
}

fn id_only(value: &Json) -> Json {
    match value {
        Json::Object(obj) => obj.get("id").cloned().unwrap_or(Json::Null),
        other => other.clone(),
    }
}

/// Decode a single column from `row` per its declared [`FieldKind`] into a
/// JSON value. `Decimal` and timestamp kinds route through their native
/// Rust types rather than relying on `tokio_postgres`'s generic
/// `FromSql for serde_json::Value`, which only understands JSON/JSONB
/// columns.
pub fn decode_column(row: &Row, column: &str, kind: &FieldKind) -> OrmResult<Json> {
    match kind {
        FieldKind::Integer => match row.try_get_column::<Option<i32>>(column)? {
            Some(v) => Ok(Json::Number(v.into())),
            None => Ok(Json::Null),
        },
        FieldKind::BigInteger => match row.try_get_column::<Option<i64>>(column)? {
            Some(v) => Ok(Json::Number(v.into())),
            None => Ok(Json::Null),
        },
        FieldKind::SmallInteger => match row.try_get_column::<Option<i16>>(column)? {
            Some(v) => Ok(Json::Number(v.into())),
            None => Ok(Json::Null),
        },
        FieldKind::Char { .. } | FieldKind::Selection { .. } | FieldKind::Text => {
            match row.try_get_column::<Option<String>>(column)? {
                Some(v) => Ok(Json::String(v)),
                None => Ok(Json::Null),
            }
        }
        FieldKind::Boolean => match row.try_get_column::<Option<bool>>(column)? {
            Some(v) => Ok(Json::Bool(v)),
            None => Ok(Json::Null),
        },
        FieldKind::Decimal { .. } => match row.try_get_column::<Option<rust_decimal::Decimal>>(column)? {
            Some(v) => Ok(Json::String(v.to_string())),
            None => Ok(Json::Null),
        },
        FieldKind::Datetime => match row.try_get_column::<Option<chrono::DateTime<chrono::Utc>>>(column)? {
            Some(v) => Ok(Json::String(v.to_rfc3339())),
            None => Ok(Json::Null),
        },
        FieldKind::Date => match row.try_get_column::<Option<chrono::NaiveDate>>(column)? {
            Some(v) => Ok(Json::String(v.to_string())),
            None => Ok(Json::Null),
        },
        FieldKind::Time => match row.try_get_column::<Option<chrono::NaiveTime>>(column)? {
            Some(v) => Ok(Json::String(v.to_string())),
            None => Ok(Json::Null),
        },
        FieldKind::Float => match row.try_get_column::<Option<f64>>(column)? {
            Some(v) => Ok(Json::from(v)),
            None => Ok(Json::Null),
        },
        FieldKind::Json => match row.try_get_column::<Option<serde_json::Value>>(column)? {
            Some(v) => Ok(v),
            None => Ok(Json::Null),
        },
        FieldKind::Binary => match row.try_get_column::<Option<Vec<u8>>>(column)? {
            Some(v) => Ok(Json::Array(v.into_iter().map(|b| Json::Number(b.into())).collect())),
            None => Ok(Json::Null),
        },
    }
}

/// Decode a join-projection row (`id`, `name`, optional back-field column)
/// that doesn't carry its own `FieldRegistry` — used for relation targets
/// hydrated generically.
/// Decode one row against an explicit registry rather than `self`'s own —
/// used for `search_many2many`, where the row belongs to the relation's
/// *target* table.
fn row_to_json_with_registry(row: &Row, columns: &[&str], registry: &FieldRegistry) -> OrmResult<JsonMap> {
    let mut map = JsonMap::new();
    for &column in columns {
        let field = registry.fields.iter().find(|f| f.column == column);
        let value = match field {
            Some(f) => decode_column(row, column, &f.kind)?,
            None => decode_column(row, column, &FieldKind::Integer)?,
        };
        let key = field.map(|f| f.name.as_str()).unwrap_or(column);
        map.insert(key.to_string(), value);
    }
    Ok(map)
}

fn row_to_json_generic(row: &Row, columns: &[&str]) -> OrmResult<JsonMap> {
    let mut map = JsonMap::new();
    for &column in columns {
        let value = match column {
            "id" => match row.try_get_column::<Option<i32>>(column)? {
                Some(v) => Json::Number(v.into()),
                None => Json::Null,
            },
            "name" => match row.try_get_column::<Option<String>>(column)? {
                Some(v) => Json::String(v),
                None => Json::Null,
            },
            _ => match row.try_get_column::<Option<i32>>(column)? {
                Some(v) => Json::Number(v.into()),
                None => Json::Null,
            },
        };
        map.insert(column.to_string(), value);
    }
    Ok(map)
}
