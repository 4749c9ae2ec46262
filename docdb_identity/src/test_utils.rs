//! Shared fixtures for unit tests across the crate
//!
//! Every helper builds a fresh, isolated backend so tests need no ordering
//! or cleanup between them.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::storage::{
    CollectionLink, DocumentError, DocumentStore, Filter, InMemoryDocumentStore,
    SqliteDocumentStore, StoreType,
};
use crate::userdb::{DocumentUserStore, UserDocument, UserStoreOptions};

/// Options that provision the default `identity`/`users` collection
pub(crate) fn provisioning_options() -> UserStoreOptions {
    UserStoreOptions::default().ensure_created(true)
}

/// User store over a new in-memory backend, collection already created
pub(crate) async fn memory_user_store<U: UserDocument>() -> DocumentUserStore<U> {
    let client: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
    DocumentUserStore::open(client, &provisioning_options())
        .await
        .expect("Failed to open in-memory user store")
}

/// User store over a private `sqlite::memory:` database
pub(crate) async fn sqlite_user_store<U: UserDocument>() -> DocumentUserStore<U> {
    let client: Arc<dyn DocumentStore> = Arc::new(
        SqliteDocumentStore::connect_lazy("sqlite::memory:")
            .expect("Failed to create SQLite pool"),
    );
    DocumentUserStore::open(client, &provisioning_options())
        .await
        .expect("Failed to open SQLite user store")
}

/// In-memory backend whose next `failures` replaces fail with a storage error
pub(crate) struct FailingReplaceStore {
    inner: InMemoryDocumentStore,
    failures: AtomicUsize,
}

impl FailingReplaceStore {
    pub(crate) fn new(failures: usize) -> Self {
        Self {
            inner: InMemoryDocumentStore::new(),
            failures: AtomicUsize::new(failures),
        }
    }
}

#[async_trait]
impl DocumentStore for FailingReplaceStore {
    fn store_type(&self) -> StoreType {
        self.inner.store_type()
    }

    async fn init(&self) -> Result<(), DocumentError> {
        self.inner.init().await
    }

    async fn read_database(&self, database: &str) -> Result<(), DocumentError> {
        self.inner.read_database(database).await
    }

    async fn create_database(&self, database: &str) -> Result<(), DocumentError> {
        self.inner.create_database(database).await
    }

    async fn read_collection(&self, link: &CollectionLink) -> Result<(), DocumentError> {
        self.inner.read_collection(link).await
    }

    async fn create_collection(
        &self,
        link: &CollectionLink,
        throughput: u32,
    ) -> Result<(), DocumentError> {
        self.inner.create_collection(link, throughput).await
    }

    async fn create_document(
        &self,
        link: &CollectionLink,
        id: &str,
        body: &Value,
    ) -> Result<(), DocumentError> {
        self.inner.create_document(link, id, body).await
    }

    async fn read_document(
        &self,
        link: &CollectionLink,
        id: &str,
    ) -> Result<Value, DocumentError> {
        self.inner.read_document(link, id).await
    }

    async fn replace_document(
        &self,
        link: &CollectionLink,
        id: &str,
        body: &Value,
    ) -> Result<(), DocumentError> {
        let remaining = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if remaining.is_ok() {
            return Err(DocumentError::Storage("transient".to_string()));
        }
        self.inner.replace_document(link, id, body).await
    }

    async fn delete_document(&self, link: &CollectionLink, id: &str) -> Result<(), DocumentError> {
        self.inner.delete_document(link, id).await
    }

    async fn query_documents(
        &self,
        link: &CollectionLink,
        filter: &Filter,
    ) -> Result<Vec<Value>, DocumentError> {
        self.inner.query_documents(link, filter).await
    }
}

/// User store whose first `failures` writes through `update` fail
pub(crate) async fn failing_replace_user_store<U: UserDocument>(
    failures: usize,
) -> DocumentUserStore<U> {
    let client: Arc<dyn DocumentStore> = Arc::new(FailingReplaceStore::new(failures));
    DocumentUserStore::open(client, &provisioning_options())
        .await
        .expect("Failed to open user store")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::userdb::{IdentityUser, UserStore};

    #[tokio::test]
    async fn test_fixtures_are_isolated() {
        // Given two memory stores
        let first = memory_user_store::<IdentityUser>().await;
        let second = memory_user_store::<IdentityUser>().await;

        // When a user is created in one
        let mut user = IdentityUser::new("alice");
        first.create(&mut user).await.unwrap();

        // Then the other does not see it
        assert!(second.find_by_id(&user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sqlite_fixture_round_trip() {
        let store = sqlite_user_store::<IdentityUser>().await;
        let mut user = IdentityUser::new("bob");
        user.email = Some("bob@example.com".to_string());

        store.create(&mut user).await.unwrap();

        let found = store.find_by_name("bob").await.unwrap();
        assert_eq!(found, Some(user));
    }
}
