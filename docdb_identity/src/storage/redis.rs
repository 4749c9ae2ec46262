use async_trait::async_trait;
use redis::{self, AsyncCommands};
use serde_json::Value;
use std::collections::HashMap;

use super::config::{StoreType, apply_access_key};
use super::errors::DocumentError;
use super::filter::Filter;
use super::types::{CollectionLink, DocumentStore};

const DOCDB_PREFIX: &str = "docdb";

/// Replace a hash field only when it already exists, in one round trip
const REPLACE_IF_EXISTS: &str = r"
if redis.call('HEXISTS', KEYS[1], ARGV[1]) == 1 then
    redis.call('HSET', KEYS[1], ARGV[1], ARGV[2])
    return 1
end
return 0
";

/// Escape `\` and `:` so names never run into the key separator.
fn key_segment(name: &str) -> String {
    name.replace('\\', "\\\\").replace(':', "\\:")
}

/// Document store kept in Redis hashes.
///
/// Databases live in one set, each database has a hash of collection
/// throughputs, and each collection is a hash of id to JSON text. Queries
/// load the whole collection and filter client side.
#[derive(Clone)]
pub struct RedisDocumentStore {
    client: redis::Client,
}

impl RedisDocumentStore {
    /// Open a client for `endpoint`; no connection is made until [`init`](DocumentStore::init).
    pub fn open(endpoint: &str, access_key: Option<&str>) -> Result<Self, DocumentError> {
        let endpoint = apply_access_key(endpoint, access_key)?;
        let client = redis::Client::open(endpoint)
            .map_err(|e| DocumentError::Config(format!("Invalid Redis URL: {e}")))?;
        Ok(Self { client })
    }

    fn databases_key() -> String {
        format!("{DOCDB_PREFIX}:databases")
    }

    fn collections_key(database: &str) -> String {
        format!("{DOCDB_PREFIX}:{}:collections", key_segment(database))
    }

    fn documents_key(link: &CollectionLink) -> String {
        format!(
            "{DOCDB_PREFIX}:{}:{}:docs",
            key_segment(&link.database),
            key_segment(&link.collection)
        )
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, DocumentError> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }
}

#[async_trait]
impl DocumentStore for RedisDocumentStore {
    fn store_type(&self) -> StoreType {
        StoreType::Redis
    }

    async fn init(&self) -> Result<(), DocumentError> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn read_database(&self, database: &str) -> Result<(), DocumentError> {
        let mut conn = self.connection().await?;

        let exists: bool = conn.sismember(Self::databases_key(), database).await?;
        if !exists {
            return Err(DocumentError::NotFound(format!("dbs/{database}")));
        }
        Ok(())
    }

    async fn create_database(&self, database: &str) -> Result<(), DocumentError> {
        let mut conn = self.connection().await?;

        let added: i64 = conn.sadd(Self::databases_key(), database).await?;
        if added == 0 {
            return Err(DocumentError::Conflict(format!("dbs/{database}")));
        }
        Ok(())
    }

    async fn read_collection(&self, link: &CollectionLink) -> Result<(), DocumentError> {
        let mut conn = self.connection().await?;

        let exists: bool = conn
            .hexists(Self::collections_key(&link.database), &link.collection)
            .await?;
        if !exists {
            return Err(DocumentError::NotFound(link.to_string()));
        }
        Ok(())
    }

    async fn create_collection(
        &self,
        link: &CollectionLink,
        throughput: u32,
    ) -> Result<(), DocumentError> {
        self.read_database(&link.database).await?;
        let mut conn = self.connection().await?;

        let created: bool = conn
            .hset_nx(
                Self::collections_key(&link.database),
                &link.collection,
                throughput,
            )
            .await?;
        if !created {
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
        let mut conn = self.connection().await?;

        let value = serde_json::to_string(body)?;
        let created: bool = conn.hset_nx(Self::documents_key(link), id, value).await?;
        if !created {
            return Err(DocumentError::Conflict(link.document(id)));
        }
        Ok(())
    }

    async fn read_document(
        &self,
        link: &CollectionLink,
        id: &str,
    ) -> Result<Value, DocumentError> {
        let mut conn = self.connection().await?;

        let value: Option<String> = conn.hget(Self::documents_key(link), id).await?;
        match value {
            Some(v) => Ok(serde_json::from_str(&v)?),
            None => Err(DocumentError::NotFound(link.document(id))),
        }
    }

    async fn replace_document(
        &self,
        link: &CollectionLink,
        id: &str,
        body: &Value,
    ) -> Result<(), DocumentError> {
        let mut conn = self.connection().await?;
        let value = serde_json::to_string(body)?;

        let replaced: i64 = redis::Script::new(REPLACE_IF_EXISTS)
            .key(Self::documents_key(link))
            .arg(id)
            .arg(value)
            .invoke_async(&mut conn)
            .await?;
        if replaced == 0 {
            return Err(DocumentError::NotFound(link.document(id)));
        }
        Ok(())
    }

    async fn delete_document(&self, link: &CollectionLink, id: &str) -> Result<(), DocumentError> {
        let mut conn = self.connection().await?;

        let removed: i64 = conn.hdel(Self::documents_key(link), id).await?;
        if removed == 0 {
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
        let mut conn = self.connection().await?;

        let raw: HashMap<String, String> = conn.hgetall(Self::documents_key(link)).await?;
        let mut entries: Vec<(String, String)> = raw.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut documents = Vec::new();
        for (_, text) in entries {
            let document: Value = serde_json::from_str(&text)?;
            if filter.matches(&document) {
                documents.push(document);
            }
        }

        tracing::trace!(
            collection = %link,
            matched = documents.len(),
            "Filtered Redis collection"
        );

        Ok(documents)
    }
}
