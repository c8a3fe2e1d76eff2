//! Catalog introspection. The generator only sees [`SchemaSource`]; [`MySqlStore`] reads INFORMATION_SCHEMA.

use crate::error::GenError;
use crate::schema::{Column, IGNORED_COLUMNS};
use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use std::time::Duration;

/// Which tables to introspect.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TableSelection {
    #[default]
    All,
    Only(Vec<String>),
}

impl TableSelection {
    /// Comma-separated list; empty or `*` selects every table.
    pub fn parse(s: &str) -> Self {
        let names: Vec<String> = s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect();
        if names.is_empty() || names.iter().any(|t| t == "*") {
            TableSelection::All
        } else {
            TableSelection::Only(names)
        }
    }
}

/// Primary key column of a table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrimaryKeyColumn {
    pub column_name: String,
    pub data_type: String,
}

#[async_trait]
pub trait SchemaSource: Send + Sync {
    /// Columns ordered by table name then ordinal position, bookkeeping columns excluded.
    async fn columns(&self, selection: &TableSelection) -> Result<Vec<Column>, GenError>;

    /// Primary key of `table`, `None` when the table or its key does not exist.
    async fn primary_key(&self, table: &str) -> Result<Option<PrimaryKeyColumn>, GenError>;
}

/// MySQL catalog reader. Built once by the caller and passed to the generator.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

type ColumnRow = (
    String,
    String,
    String,
    String,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    String,
    String,
    Option<String>,
);

impl MySqlStore {
    pub async fn connect(database_url: &str) -> Result<Self, GenError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;
        Ok(MySqlStore { pool })
    }

    /// Schema (database) selected by the connection URL.
    pub async fn current_schema(&self) -> Result<String, GenError> {
        let (schema,): (Option<String>,) = sqlx::query_as("SELECT DATABASE()").fetch_one(&self.pool).await?;
        Ok(schema.unwrap_or_default())
    }
}

/// Source used when no database is reachable. Has no columns and no primary keys, so logic
/// generation falls back to `Id`/`0` for every model.
#[derive(Clone, Copy, Debug, Default)]
pub struct Offline;

#[async_trait]
impl SchemaSource for Offline {
    async fn columns(&self, _: &TableSelection) -> Result<Vec<Column>, GenError> {
        Err(GenError::NoColumns)
    }

    async fn primary_key(&self, _: &str) -> Result<Option<PrimaryKeyColumn>, GenError> {
        Ok(None)
    }
}

/// Source for primary-key lookups. A missing URL or a failed connection degrades to [`Offline`].
pub async fn key_source(database_url: Option<&str>) -> Box<dyn SchemaSource> {
    let Some(url) = database_url.filter(|u| !u.trim().is_empty()) else {
        tracing::warn!("no database url, primary keys default to Id");
        return Box::new(Offline);
    };
    match MySqlStore::connect(url).await {
        Ok(store) => Box::new(store),
        Err(e) => {
            tracing::warn!(error = %e, "database unreachable, primary keys default to Id");
            Box::new(Offline)
        }
    }
}

fn columns_sql(selection: &TableSelection) -> String {
    let mut sql = String::from(
        "SELECT c.TABLE_NAME, c.COLUMN_NAME, c.IS_NULLABLE, c.DATA_TYPE, \
         CAST(c.CHARACTER_MAXIMUM_LENGTH AS SIGNED), CAST(c.NUMERIC_PRECISION AS SIGNED), CAST(c.NUMERIC_SCALE AS SIGNED), \
         CAST(c.COLUMN_TYPE AS CHAR), CAST(c.COLUMN_COMMENT AS CHAR), CAST(t.TABLE_COMMENT AS CHAR) \
         FROM INFORMATION_SCHEMA.COLUMNS AS c \
         LEFT JOIN INFORMATION_SCHEMA.TABLES AS t ON c.TABLE_NAME = t.TABLE_NAME AND c.TABLE_SCHEMA = t.TABLE_SCHEMA \
         WHERE c.TABLE_SCHEMA = ?",
    );
    if let TableSelection::Only(tables) = selection {
        let marks = vec!["?"; tables.len()].join(", ");
        sql.push_str(&format!(" AND c.TABLE_NAME IN ({})", marks));
    }
    let ignored = vec!["?"; IGNORED_COLUMNS.len()].join(", ");
    sql.push_str(&format!(" AND c.COLUMN_NAME NOT IN ({})", ignored));
    sql.push_str(" ORDER BY c.TABLE_NAME, c.ORDINAL_POSITION");
    sql
}

#[async_trait]
impl SchemaSource for MySqlStore {
    async fn columns(&self, selection: &TableSelection) -> Result<Vec<Column>, GenError> {
        let schema = self.current_schema().await?;
        let sql = columns_sql(selection);
        tracing::debug!(sql = %sql, schema = %schema, "query");

        let mut query = sqlx::query_as::<_, ColumnRow>(&sql).bind(schema);
        if let TableSelection::Only(tables) = selection {
            for t in tables {
                query = query.bind(t.clone());
            }
        }
        for c in IGNORED_COLUMNS {
            query = query.bind(*c);
        }
        let rows = query.fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(
                |(table_name, column_name, nullable, data_type, char_len, precision, scale, column_type, column_comment, table_comment)| Column {
                    table_name,
                    column_name,
                    is_nullable: nullable.eq_ignore_ascii_case("YES"),
                    data_type,
                    character_maximum_length: char_len,
                    numeric_precision: precision,
                    numeric_scale: scale,
                    column_type,
                    column_comment,
                    table_comment: table_comment.unwrap_or_default(),
                },
            )
            .collect())
    }

    async fn primary_key(&self, table: &str) -> Result<Option<PrimaryKeyColumn>, GenError> {
        let sql = "SELECT c.COLUMN_NAME, c.DATA_TYPE FROM INFORMATION_SCHEMA.COLUMNS AS c \
                   WHERE c.TABLE_SCHEMA = DATABASE() AND c.TABLE_NAME = ? AND c.COLUMN_KEY = 'PRI' \
                   ORDER BY c.ORDINAL_POSITION LIMIT 1";
        tracing::debug!(sql = %sql, table = %table, "query");
        let row: Option<(String, String)> = sqlx::query_as(sql).bind(table).fetch_optional(&self.pool).await?;
        Ok(row.map(|(column_name, data_type)| PrimaryKeyColumn { column_name, data_type }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_selection_parsing() {
        assert_eq!(TableSelection::parse(""), TableSelection::All);
        assert_eq!(TableSelection::parse("*"), TableSelection::All);
        assert_eq!(
            TableSelection::parse("user, shop_order,"),
            TableSelection::Only(vec!["user".into(), "shop_order".into()])
        );
    }

    #[test]
    fn columns_sql_binds_one_mark_per_table() {
        let sql = columns_sql(&TableSelection::Only(vec!["a".into(), "b".into()]));
        assert!(sql.contains("c.TABLE_NAME IN (?, ?)"));
        assert!(sql.contains("c.COLUMN_NAME NOT IN (?, ?)"));
        assert!(sql.ends_with("ORDER BY c.TABLE_NAME, c.ORDINAL_POSITION"));
        assert!(!columns_sql(&TableSelection::All).contains("TABLE_NAME IN"));
    }

    #[tokio::test]
    async fn key_source_degrades_without_a_database() {
        let none = key_source(None).await;
        assert_eq!(none.primary_key("order").await.unwrap(), None);

        let bad = key_source(Some("not a url")).await;
        assert_eq!(bad.primary_key("order").await.unwrap(), None);
        assert!(matches!(bad.columns(&TableSelection::All).await, Err(GenError::NoColumns)));
    }
}
