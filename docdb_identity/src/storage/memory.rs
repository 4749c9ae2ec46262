use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use super::config::StoreType;
use super::errors::DocumentError;
use super::filter::Filter;
use super::types::{CollectionLink, DocumentStore};

#[derive(Debug, Default)]
struct MemoryCollection {
    throughput: u32,
    documents: BTreeMap<String, Value>,
}

type MemoryDatabase = HashMap<String, MemoryCollection>;

/// Process-local document store, used for tests and demos.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    databases: RwLock<HashMap<String, MemoryDatabase>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        tracing::info!("Creating new in-memory document store");
        Self::default()
    }
}

fn collection_not_found(link: &CollectionLink) -> DocumentError {
    DocumentError::NotFound(link.to_string())
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    fn store_type(&self) -> StoreType {
        StoreType::Memory
    }

    async fn init(&self) -> Result<(), DocumentError> {
        Ok(()) // Nothing to initialize for in-memory store
    }

    async fn read_database(&self, database: &str) -> Result<(), DocumentError> {
        let databases = self.databases.read().await;
        if databases.contains_key(database) {
            Ok(())
        } else {
            Err(DocumentError::NotFound(format!("dbs/{database}")))
        }
    }

    async fn create_database(&self, database: &str) -> Result<(), DocumentError> {
        let mut databases = self.databases.write().await;
        if databases.contains_key(database) {
            return Err(DocumentError::Conflict(format!("dbs/{database}")));
        }
        databases.insert(database.to_string(), MemoryDatabase::new());
        Ok(())
    }

    async fn read_collection(&self, link: &CollectionLink) -> Result<(), DocumentError> {
        let databases = self.databases.read().await;
        databases
            .get(&link.database)
            .and_then(|db| db.get(&link.collection))
            .map(|_| ())
            .ok_or_else(|| collection_not_found(link))
    }

    async fn create_collection(
        &self,
        link: &CollectionLink,
        throughput: u32,
    ) -> Result<(), DocumentError> {
        let mut databases = self.databases.write().await;
        let db = databases
            .get_mut(&link.database)
            .ok_or_else(|| DocumentError::NotFound(format!("dbs/{}", link.database)))?;

        if db.contains_key(&link.collection) {
            return Err(DocumentError::Conflict(link.to_string()));
        }

        db.insert(
            link.collection.clone(),
            MemoryCollection {
                throughput,
                documents: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn create_document(
        &self,
        link: &CollectionLink,
        id: &str,
        body: &Value,
    ) -> Result<(), DocumentError> {
        let mut databases = self.databases.write().await;
        let collection = databases
            .get_mut(&link.database)
            .and_then(|db| db.get_mut(&link.collection))
            .ok_or_else(|| collection_not_found(link))?;

        if collection.documents.contains_key(id) {
            return Err(DocumentError::Conflict(link.document(id)));
        }

        collection.documents.insert(id.to_string(), body.clone());
        Ok(())
    }

    async fn read_document(
        &self,
        link: &CollectionLink,
        id: &str,
    ) -> Result<Value, DocumentError> {
        let databases = self.databases.read().await;
        databases
            .get(&link.database)
            .and_then(|db| db.get(&link.collection))
            .and_then(|collection| collection.documents.get(id))
            .cloned()
            .ok_or_else(|| DocumentError::NotFound(link.document(id)))
    }

    async fn replace_document(
        &self,
        link: &CollectionLink,
        id: &str,
        body: &Value,
    ) -> Result<(), DocumentError> {
        let mut databases = self.databases.write().await;
        let document = databases
            .get_mut(&link.database)
            .and_then(|db| db.get_mut(&link.collection))
            .and_then(|collection| collection.documents.get_mut(id))
            .ok_or_else(|| DocumentError::NotFound(link.document(id)))?;

        *document = body.clone();
        Ok(())
    }

    async fn delete_document(&self, link: &CollectionLink, id: &str) -> Result<(), DocumentError> {
        let mut databases = self.databases.write().await;
        databases
            .get_mut(&link.database)
            .and_then(|db| db.get_mut(&link.collection))
            .and_then(|collection| collection.documents.remove(id))
            .map(|_| ())
            .ok_or_else(|| DocumentError::NotFound(link.document(id)))
    }

    async fn query_documents(
        &self,
        link: &CollectionLink,
        filter: &Filter,
    ) -> Result<Vec<Value>, DocumentError> {
        filter.validate()?;

        let databases = self.databases.read().await;
        let collection = databases
            .get(&link.database)
            .and_then(|db| db.get(&link.collection))
            .ok_or_else(|| collection_not_found(link))?;

        tracing::trace!(
            collection = %link,
            throughput = collection.throughput,
            "Scanning in-memory collection"
        );

        Ok(collection
            .documents
            .values()
            .filter(|document| filter.matches(document))
            .cloned()
            .collect())
    }
}
