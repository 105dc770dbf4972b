//! DDL engine.
//!
//! Boots every `auto_create` model's table, brings existing tables up to
//! date with any newly declared columns, and returns the foreign keys the
//! caller must apply once every table exists. Purely additive: a column
//! that disappears from a model is never dropped, and an existing column's
//! type is never altered — only `CREATE TABLE IF NOT EXISTS` and
//! `ALTER TABLE ADD COLUMN` are ever emitted.

use crate::error::{OrmError, OrmResult};
use crate::field::FieldDef;
use crate::model::{FieldRegistry, RelationKind};
use crate::row::RowExt;
use crate::validate::escape_ddl_string_literal;
use crate::value::Value;
use deadpool_postgres::Pool;
use std::collections::HashSet;

/// A deferred foreign key to apply once all tables exist.
pub struct ForeignKey {
    pub name: String,
    pub sql: String,
}

fn fk_name(table: &str, field: &str) -> String {
    format!("fk_{table}_{field}")
}

fn idx_name(table: &str, field: &str) -> String {
    format!("idx_{table}_{field}")
}

fn column_declaration(field: &FieldDef) -> String {
    let mut decl = format!("\"{}\" {}", field.column, field.kind.sql_type(field.primary_key));
    if !field.null && !field.primary_key {
        decl.push_str(" NOT NULL");
    }
    if field.unique && !field.primary_key {
        decl.push_str(" UNIQUE");
    }
    if field.primary_key {
        decl.push_str(" PRIMARY KEY");
    }
    if let Some(default) = &field.default {
        if let Some(literal) = default_literal(default) {
            decl.push_str(&format!(" DEFAULT {literal}"));
        }
    }
    decl
}

/// Default literals are only ever emitted for bool/int/str — anything else
/// is applied at the application layer instead of in DDL.
fn default_literal(value: &Value) -> Option<String> {
    match value {
        Value::Bool(b) => Some(if *b { "TRUE".to_string() } else { "FALSE".to_string() }),
        Value::Int(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Text(s) => escape_ddl_string_literal(s).ok().map(|escaped| format!("'{escaped}'")),
        _ => None,
    }
}

/// Create every `auto_create` model's table (and its Many2many link
/// tables), add any missing columns to tables that already exist, and
/// return the foreign keys to apply afterward.
pub async fn apply_schema(pool: &Pool, registries: &[&FieldRegistry]) -> OrmResult<Vec<ForeignKey>> {
    let client = pool.get().await?;
    let mut foreign_keys = Vec::new();

    for registry in registries {
        create_table_if_not_exists(&client, registry).await?;
    }

    for registry in registries {
        add_missing_columns(&client, registry).await?;
    }

    for registry in registries {
        for field in registry.store_fields() {
            if field.index && !field.unique && !field.primary_key {
                let sql = format!(
                    "CREATE INDEX IF NOT EXISTS \"{}\" ON \"{}\" (\"{}\")",
                    idx_name(&registry.table, &field.name),
                    registry.table,
                    field.column
                );
                client.batch_execute(&sql).await.map_err(OrmError::from_db_error)?;
            }
        }

        for relation in &registry.relations {
            match &relation.kind {
                RelationKind::Many2one { target_table, column } => {
                    foreign_keys.push(ForeignKey {
                        name: fk_name(&registry.table, &relation.name),
                        sql: format!(
                            "ALTER TABLE \"{}\" ADD CONSTRAINT \"{}\" FOREIGN KEY (\"{}\") REFERENCES \"{}\" (\"id\") ON DELETE {}",
                            registry.table,
                            fk_name(&registry.table, &relation.name),
                            column,
                            target_table,
                            relation.ondelete.as_sql()
                        ),
                    });
                }
                RelationKind::Many2many {
                    target_table,
                    link_table,
                    col_self,
                    col_other,
                } => {
                    create_link_table(&client, link_table, col_self, col_other).await?;
                    foreign_keys.push(ForeignKey {
                        name: fk_name(link_table, col_self),
                        sql: format!(
                            "ALTER TABLE \"{link_table}\" ADD CONSTRAINT \"{}\" FOREIGN KEY (\"{col_self}\") REFERENCES \"{}\" (\"id\") ON DELETE CASCADE",
                            fk_name(link_table, col_self),
                            registry.table
                        ),
                    });
                    foreign_keys.push(ForeignKey {
                        name: fk_name(link_table, col_other),
                        sql: format!(
                            "ALTER TABLE \"{link_table}\" ADD CONSTRAINT \"{}\" FOREIGN KEY (\"{col_other}\") REFERENCES \"{target_table}\" (\"id\") ON DELETE CASCADE",
                            fk_name(link_table, col_other)
                        ),
                    });
                }
                _ => {}
            }
        }
    }

    Ok(foreign_keys)
}

async fn create_table_if_not_exists(client: &deadpool_postgres::Object, registry: &FieldRegistry) -> OrmResult<()> {
    let columns: Vec<String> = registry.store_fields().map(column_declaration).collect();
    let sql = format!(
        "CREATE TABLE IF NOT EXISTS \"{}\" ({})",
        registry.table,
        columns.join(", ")
    );
    client.batch_execute(&sql).await.map_err(OrmError::from_db_error)
}

async fn create_link_table(
    client: &deadpool_postgres::Object,
    link_table: &str,
    col_self: &str,
    col_other: &str,
) -> OrmResult<()> {
    let sql = format!(
        "CREATE TABLE IF NOT EXISTS \"{link_table}\" (\"{col_self}\" INTEGER NOT NULL, \"{col_other}\" INTEGER NOT NULL)"
    );
    client.batch_execute(&sql).await.map_err(OrmError::from_db_error)?;

    let idx_sql = format!(
        "CREATE INDEX IF NOT EXISTS \"{}\" ON \"{link_table}\" (\"{col_self}\", \"{col_other}\")",
        format!("idx_{link_table}_{col_self}_{col_other}")
    );
    client.batch_execute(&idx_sql).await.map_err(OrmError::from_db_error)
}

/// One `information_schema.columns` query per table, then `ADD COLUMN` for
/// whatever the model declares that the catalog doesn't have yet.
async fn add_missing_columns(client: &deadpool_postgres::Object, registry: &FieldRegistry) -> OrmResult<()> {
    let rows = client
        .query(
            "SELECT column_name FROM information_schema.columns WHERE table_name = $1",
            &[&registry.table],
        )
        .await
        .map_err(OrmError::from_db_error)?;

    let existing: HashSet<String> = rows
        .iter()
        .map(|r| r.try_get_column::<String>("column_name"))
        .collect::<OrmResult<_>>()?;

    for field in registry.store_fields() {
        if existing.contains(&field.column) {
            continue;
        }
        let sql = format!(
            "ALTER TABLE \"{}\" ADD COLUMN {}",
            registry.table,
            column_declaration(field)
        );
        client.batch_execute(&sql).await.map_err(OrmError::from_db_error)?;
    }
    Ok(())
}

/// Apply a batch of previously-deferred foreign keys. Call after
/// `apply_schema` has run for every model so every target table exists.
pub async fn apply_foreign_keys(pool: &Pool, foreign_keys: &[ForeignKey]) -> OrmResult<()> {
    let client = pool.get().await?;
    for fk in foreign_keys {
        // ALTER TABLE ... ADD CONSTRAINT has no IF NOT EXISTS in PostgreSQL;
        // a duplicate-name error (42710) means it's already applied.
        if let Err(e) = client.batch_execute(&fk.sql).await {
            if e.code().map(|c| c.code()) != Some("42710") {
                return Err(OrmError::from_db_error(e));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn fk_and_index_names_follow_convention() {
        assert_eq!(fk_name("chat_message", "author"), "fk_chat_message_author");
        assert_eq!(idx_name("chat_message", "author"), "idx_chat_message_author");
    }

    #[test]
    fn default_literal_escapes_strings() {
        assert_eq!(default_literal(&Value::Text("ok".into())), Some("'ok'".to_string()));
        assert_eq!(default_literal(&Value::Bool(true)), Some("TRUE".to_string()));
        assert_eq!(default_literal(&Value::Text("bad; drop".into())), None);
    }
}
