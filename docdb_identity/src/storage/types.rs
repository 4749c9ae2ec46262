use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

use super::config::StoreType;
use super::errors::DocumentError;
use super::filter::Filter;

/// Address of one collection inside one database.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionLink {
    pub database: String,
    pub collection: String,
}

impl CollectionLink {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }

    /// Link of a single document inside this collection
    pub fn document(&self, id: &str) -> String {
        format!("{self}/docs/{id}")
    }
}

impl fmt::Display for CollectionLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dbs/{}/colls/{}", self.database, self.collection)
    }
}

/// Document-CRUD and query API of the backing document database.
///
/// Documents are JSON objects keyed by `id`, one collection per
/// [`CollectionLink`]. Every method maps to exactly one database round trip
/// (or a small fixed number for backends without native collections).
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Backend kind, for logging
    fn store_type(&self) -> StoreType;

    /// Check connectivity and prepare backend bookkeeping.
    async fn init(&self) -> Result<(), DocumentError>;

    /// `Ok` when the database exists, `NotFound` otherwise.
    async fn read_database(&self, database: &str) -> Result<(), DocumentError>;

    /// Create a database. `Conflict` when it already exists.
    async fn create_database(&self, database: &str) -> Result<(), DocumentError>;

    /// `Ok` when the collection exists, `NotFound` otherwise.
    async fn read_collection(&self, link: &CollectionLink) -> Result<(), DocumentError>;

    /// Create a collection inside an existing database.
    ///
    /// `NotFound` when the database is missing, `Conflict` when the
    /// collection already exists.
    async fn create_collection(
        &self,
        link: &CollectionLink,
        throughput: u32,
    ) -> Result<(), DocumentError>;

    /// Insert a new document. `Conflict` when the id is taken.
    async fn create_document(
        &self,
        link: &CollectionLink,
        id: &str,
        body: &Value,
    ) -> Result<(), DocumentError>;

    /// Point read by id. `NotFound` when absent.
    async fn read_document(&self, link: &CollectionLink, id: &str)
    -> Result<Value, DocumentError>;

    /// Replace an existing document. `NotFound` when absent.
    async fn replace_document(
        &self,
        link: &CollectionLink,
        id: &str,
        body: &Value,
    ) -> Result<(), DocumentError>;

    /// Delete an existing document. `NotFound` when absent.
    async fn delete_document(&self, link: &CollectionLink, id: &str) -> Result<(), DocumentError>;

    /// All documents matching `filter`, ordered by id.
    async fn query_documents(
        &self,
        link: &CollectionLink,
        filter: &Filter,
    ) -> Result<Vec<Value>, DocumentError>;
}
