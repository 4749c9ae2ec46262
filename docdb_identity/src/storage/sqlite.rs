use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tokio::sync::OnceCell;

use super::config::{StoreType, table_prefix};
use super::errors::DocumentError;
use super::filter::Filter;
use super::types::{CollectionLink, DocumentStore};

/// Document store persisted in SQLite, one JSON `TEXT` body per row.
#[derive(Debug)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
    schema: OnceCell<()>,
}

struct Tables {
    databases: String,
    collections: String,
    documents: String,
}

impl Tables {
    fn new() -> Result<Self, DocumentError> {
        let prefix = table_prefix()?;
        Ok(Self {
            databases: format!("{prefix}databases"),
            collections: format!("{prefix}collections"),
            documents: format!("{prefix}documents"),
        })
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

impl SqliteDocumentStore {
    /// Build a lazily connecting pool for `url`.
    ///
    /// In-memory databases live and die with their connection, so they get a
    /// single connection that is never expired.
    pub fn connect_lazy(url: &str) -> Result<Self, DocumentError> {
        let opts = SqliteConnectOptions::from_str(url)
            .map_err(|e| DocumentError::Config(format!("Invalid SQLite URL: {e}")))?
            .create_if_missing(true);

        let pool_opts = if is_in_memory(url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };

        Ok(Self::from_pool(pool_opts.connect_lazy_with(opts)))
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            schema: OnceCell::new(),
        }
    }

    /// Create the bookkeeping tables once, on first use.
    async fn tables(&self) -> Result<Tables, DocumentError> {
        self.schema
            .get_or_try_init(|| create_tables_sqlite(&self.pool))
            .await?;
        Tables::new()
    }
}

async fn create_tables_sqlite(pool: &SqlitePool) -> Result<(), DocumentError> {
    let Tables {
        databases,
        collections,
        documents,
    } = Tables::new()?;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {databases} (
            id TEXT PRIMARY KEY NOT NULL,
            created_at TIMESTAMP NOT NULL
        )
        "#
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {collections} (
            database_id TEXT NOT NULL,
            id TEXT NOT NULL,
            throughput INTEGER NOT NULL,
            created_at TIMESTAMP NOT NULL,
            PRIMARY KEY (database_id, id)
        )
        "#
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {documents} (
            database_id TEXT NOT NULL,
            collection_id TEXT NOT NULL,
            id TEXT NOT NULL,
            body TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NOT NULL,
            PRIMARY KEY (database_id, collection_id, id)
        )
        "#
    ))
    .execute(pool)
    .await?;

    tracing::debug!("SQLite document tables ready");
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
enum SqliteBind {
    Text(String),
    Integer(i64),
    Real(f64),
}

fn number_bind(value: &serde_json::Number) -> Result<SqliteBind, DocumentError> {
    if let Some(n) = value.as_i64() {
        return Ok(SqliteBind::Integer(n));
    }
    value
        .as_f64()
        .map(SqliteBind::Real)
        .ok_or_else(|| DocumentError::InvalidQuery(format!("Unsupported number {value}")))
}

/// Compile a validated filter into a `WHERE` fragment over the `body` column.
fn compile_filter_sqlite(
    filter: &Filter,
    binds: &mut Vec<SqliteBind>,
) -> Result<String, DocumentError> {
    match filter {
        Filter::All => Ok("1 = 1".to_string()),
        Filter::Eq(field, value) => {
            let path = format!("'$.{field}'");
            match value {
                Value::Null => Ok(format!("json_extract(body, {path}) IS NULL")),
                Value::Bool(b) => Ok(format!("json_type(body, {path}) = '{b}'")),
                Value::String(s) => {
                    binds.push(SqliteBind::Text(s.clone()));
                    Ok(format!(
                        "(json_type(body, {path}) = 'text' AND json_extract(body, {path}) = ?)"
                    ))
                }
                Value::Number(n) => {
                    binds.push(number_bind(n)?);
                    Ok(format!(
                        "(json_type(body, {path}) IN ('integer', 'real') AND json_extract(body, {path}) = ?)"
                    ))
                }
                _ => Err(DocumentError::InvalidQuery(format!(
                    "Filter on '{field}' must compare against a scalar value"
                ))),
            }
        }
        Filter::Contains(field, value) => {
            let path = format!("'$.{field}'");
            let item = match value {
                Value::Bool(b) => format!("item.type = '{b}'"),
                Value::String(s) => {
                    binds.push(SqliteBind::Text(s.clone()));
                    "item.type = 'text' AND item.value = ?".to_string()
                }
                Value::Number(n) => {
                    binds.push(number_bind(n)?);
                    "item.type IN ('integer', 'real') AND item.value = ?".to_string()
                }
                _ => {
                    return Err(DocumentError::InvalidQuery(format!(
                        "Contains filter on '{field}' must compare against a non-null scalar"
                    )));
                }
            };
            Ok(format!(
                "(json_type(body, {path}) = 'array' AND EXISTS (SELECT 1 FROM json_each(body, {path}) AS item WHERE {item}))"
            ))
        }
        Filter::And(filters) => {
            if filters.is_empty() {
                return Ok("1 = 1".to_string());
            }
            let parts = filters
                .iter()
                .map(|f| compile_filter_sqlite(f, binds))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(format!("({})", parts.join(" AND ")))
        }
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    fn store_type(&self) -> StoreType {
        StoreType::Sqlite
    }

    async fn init(&self) -> Result<(), DocumentError> {
        self.tables().await.map(|_| ())
    }

    async fn read_database(&self, database: &str) -> Result<(), DocumentError> {
        let tables = self.tables().await?;

        let found = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT 1 FROM {} WHERE id = ?",
            tables.databases
        ))
        .bind(database)
        .fetch_optional(&self.pool)
        .await?;

        found
            .map(|_| ())
            .ok_or_else(|| DocumentError::NotFound(format!("dbs/{database}")))
    }

    async fn create_database(&self, database: &str) -> Result<(), DocumentError> {
        let tables = self.tables().await?;

        let result = sqlx::query(&format!(
            r#"
            INSERT INTO {} (id, created_at)
            VALUES (?, ?)
            ON CONFLICT (id) DO NOTHING
            "#,
            tables.databases
        ))
        .bind(database)
        .bind(chrono::Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DocumentError::Conflict(format!("dbs/{database}")));
        }
        Ok(())
    }

    async fn read_collection(&self, link: &CollectionLink) -> Result<(), DocumentError> {
        let tables = self.tables().await?;

        let found = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT 1 FROM {} WHERE database_id = ? AND id = ?",
            tables.collections
        ))
        .bind(&link.database)
        .bind(&link.collection)
        .fetch_optional(&self.pool)
        .await?;

        found
            .map(|_| ())
            .ok_or_else(|| DocumentError::NotFound(link.to_string()))
    }

    async fn create_collection(
        &self,
        link: &CollectionLink,
        throughput: u32,
    ) -> Result<(), DocumentError> {
        self.read_database(&link.database).await?;
        let tables = self.tables().await?;

        let result = sqlx::query(&format!(
            r#"
            INSERT INTO {} (database_id, id, throughput, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (database_id, id) DO NOTHING
            "#,
            tables.collections
        ))
        .bind(&link.database)
        .bind(&link.collection)
        .bind(i64::from(throughput))
        .bind(chrono::Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DocumentError::Conflict(link.to_string()));
        }
        Ok(())
    }

    async fn create_document(
        &self,
        link: &CollectionLink,
        id: &str,
        body: &Value,
    ) -> Result<(), DocumentError> {
        self.read_collection(link).await?;
        let tables = self.tables().await?;
        let now = chrono::Utc::now();

        let result = sqlx::query(&format!(
            r#"
            INSERT INTO {} (database_id, collection_id, id, body, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (database_id, collection_id, id) DO NOTHING
            "#,
            tables.documents
        ))
        .bind(&link.database)
        .bind(&link.collection)
        .bind(id)
        .bind(serde_json::to_string(body)?)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DocumentError::Conflict(link.document(id)));
        }
        Ok(())
    }

    async fn read_document(
        &self,
        link: &CollectionLink,
        id: &str,
    ) -> Result<Value, DocumentError> {
        let tables = self.tables().await?;

        let body = sqlx::query_scalar::<_, String>(&format!(
            "SELECT body FROM {} WHERE database_id = ? AND collection_id = ? AND id = ?",
            tables.documents
        ))
        .bind(&link.database)
        .bind(&link.collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DocumentError::NotFound(link.document(id)))?;

        Ok(serde_json::from_str(&body)?)
    }

    async fn replace_document(
        &self,
        link: &CollectionLink,
        id: &str,
        body: &Value,
    ) -> Result<(), DocumentError> {
        let tables = self.tables().await?;

        let result = sqlx::query(&format!(
            r#"
            UPDATE {} SET body = ?, updated_at = ?
            WHERE database_id = ? AND collection_id = ? AND id = ?
            "#,
            tables.documents
        ))
        .bind(serde_json::to_string(body)?)
        .bind(chrono::Utc::now())
        .bind(&link.database)
        .bind(&link.collection)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DocumentError::NotFound(link.document(id)));
        }
        Ok(())
    }

    async fn delete_document(&self, link: &CollectionLink, id: &str) -> Result<(), DocumentError> {
        let tables = self.tables().await?;

        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE database_id = ? AND collection_id = ? AND id = ?",
            tables.documents
        ))
        .bind(&link.database)
        .bind(&link.collection)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DocumentError::NotFound(link.document(id)));
        }
        Ok(())
    }

    async fn query_documents(
        &self,
        link: &CollectionLink,
        filter: &Filter,
    ) -> Result<Vec<Value>, DocumentError> {
        filter.validate()?;
        self.read_collection(link).await?;
        let tables = self.tables().await?;

        let mut binds = Vec::new();
        let predicate = compile_filter_sqlite(filter, &mut binds)?;
        let sql = format!(
            "SELECT body FROM {} WHERE database_id = ? AND collection_id = ? AND {predicate} ORDER BY id",
            tables.documents
        );

        let mut query = sqlx::query_scalar::<_, String>(&sql)
            .bind(&link.database)
            .bind(&link.collection);
        for bind in binds {
            query = match bind {
                SqliteBind::Text(v) => query.bind(v),
                SqliteBind::Integer(v) => query.bind(v),
                SqliteBind::Real(v) => query.bind(v),
            };
        }

        query
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(|body| serde_json::from_str(body).map_err(DocumentError::from))
            .collect()
    }
}
