use async_trait::async_trait;
use serde_json::{Value, json};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;
use tokio::sync::OnceCell;

use super::config::{StoreType, table_prefix};
use super::errors::DocumentError;
use super::filter::Filter;
use super::types::{CollectionLink, DocumentStore};

/// Document store persisted in PostgreSQL, one `JSONB` body per row.
#[derive(Debug)]
pub struct PostgresDocumentStore {
    pool: PgPool,
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

impl PostgresDocumentStore {
    /// Build a lazily connecting pool for `url`, using `access_key` as the
    /// password when the URL carries none.
    pub fn connect_lazy(url: &str, access_key: Option<&str>) -> Result<Self, DocumentError> {
        let mut opts = PgConnectOptions::from_str(url)
            .map_err(|e| DocumentError::Config(format!("Invalid Postgres URL: {e}")))?;

        if let Some(key) = access_key {
            let has_password = url::Url::parse(url)
                .map(|u| u.password().is_some())
                .unwrap_or(false);
            if !has_password {
                opts = opts.password(key);
            }
        }

        Ok(Self::from_pool(PgPoolOptions::new().connect_lazy_with(opts)))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            schema: OnceCell::new(),
        }
    }

    async fn tables(&self) -> Result<Tables, DocumentError> {
        self.schema
            .get_or_try_init(|| create_tables_postgres(&self.pool))
            .await?;
        Tables::new()
    }
}

async fn create_tables_postgres(pool: &PgPool) -> Result<(), DocumentError> {
    let Tables {
        databases,
        collections,
        documents,
    } = Tables::new()?;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {databases} (
            id TEXT PRIMARY KEY NOT NULL,
            created_at TIMESTAMPTZ NOT NULL
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
            created_at TIMESTAMPTZ NOT NULL,
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
            body JSONB NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL,
            PRIMARY KEY (database_id, collection_id, id)
        )
        "#
    ))
    .execute(pool)
    .await?;

    tracing::debug!("Postgres document tables ready");
    Ok(())
}

/// Compile a validated filter into a `WHERE` fragment over the `body`
/// column. Placeholders are numbered from `next_param`; every bind is a
/// `JSONB` value.
fn compile_filter_postgres(
    filter: &Filter,
    next_param: &mut usize,
    binds: &mut Vec<Value>,
) -> Result<String, DocumentError> {
    match filter {
        Filter::All => Ok("TRUE".to_string()),
        Filter::Eq(field, Value::Null) => Ok(format!(
            "(body -> '{field}' IS NULL OR body -> '{field}' = 'null'::jsonb)"
        )),
        Filter::Eq(field, value) => {
            let n = *next_param;
            *next_param += 1;
            binds.push(value.clone());
            Ok(format!("body -> '{field}' = ${n}"))
        }
        Filter::Contains(field, value) => {
            let n = *next_param;
            *next_param += 1;
            binds.push(json!([value]));
            Ok(format!(
                "(jsonb_typeof(body -> '{field}') = 'array' AND body -> '{field}' @> ${n})"
            ))
        }
        Filter::And(filters) => {
            if filters.is_empty() {
                return Ok("TRUE".to_string());
            }
            let parts = filters
                .iter()
                .map(|f| compile_filter_postgres(f, next_param, binds))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(format!("({})", parts.join(" AND ")))
        }
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    fn store_type(&self) -> StoreType {
        StoreType::Postgres
    }

    async fn init(&self) -> Result<(), DocumentError> {
        self.tables().await.map(|_| ())
    }

    async fn read_database(&self, database: &str) -> Result<(), DocumentError> {
        let tables = self.tables().await?;

        let found = sqlx::query_scalar::<_, i32>(&format!(
            "SELECT 1 FROM {} WHERE id = $1",
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
            VALUES ($1, $2)
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

        let found = sqlx::query_scalar::<_, i32>(&format!(
            "SELECT 1 FROM {} WHERE database_id = $1 AND id = $2",
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

        let throughput = i32::try_from(throughput)
            .map_err(|_| DocumentError::InvalidQuery(format!("Throughput {throughput} too large")))?;

        let result = sqlx::query(&format!(
            r#"
            INSERT INTO {} (database_id, id, throughput, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (database_id, id) DO NOTHING
            "#,
            tables.collections
        ))
        .bind(&link.database)
        .bind(&link.collection)
        .bind(throughput)
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
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (database_id, collection_id, id) DO NOTHING
            "#,
            tables.documents
        ))
        .bind(&link.database)
        .bind(&link.collection)
        .bind(id)
        .bind(body)
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

        sqlx::query_scalar::<_, Value>(&format!(
            "SELECT body FROM {} WHERE database_id = $1 AND collection_id = $2 AND id = $3",
            tables.documents
        ))
        .bind(&link.database)
        .bind(&link.collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DocumentError::NotFound(link.document(id)))
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
            UPDATE {} SET body = $1, updated_at = $2
            WHERE database_id = $3 AND collection_id = $4 AND id = $5
            "#,
            tables.documents
        ))
        .bind(body)
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
            "DELETE FROM {} WHERE database_id = $1 AND collection_id = $2 AND id = $3",
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

        let mut next_param = 3;
        let mut binds = Vec::new();
        let predicate = compile_filter_postgres(filter, &mut next_param, &mut binds)?;
        let sql = format!(
            "SELECT body FROM {} WHERE database_id = $1 AND collection_id = $2 AND {predicate} ORDER BY id",
            tables.documents
        );

        let mut query = sqlx::query_scalar::<_, Value>(&sql)
            .bind(&link.database)
            .bind(&link.collection);
        for bind in binds {
            query = query.bind(bind);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }
}
