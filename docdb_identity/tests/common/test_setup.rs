use std::sync::Arc;

use docdb_identity::{
    DocumentStore, DocumentStoreConfig, DocumentUserStore, StoreType, UserDocument,
    UserStoreOptions, connect,
};

/// Backends that run without external services
#[derive(Debug, Clone, Copy)]
pub enum Backend {
    Memory,
    Sqlite,
}

impl Backend {
    pub const ALL: [Backend; 2] = [Backend::Memory, Backend::Sqlite];

    fn config(self) -> DocumentStoreConfig {
        match self {
            Backend::Memory => DocumentStoreConfig::memory(),
            Backend::Sqlite => DocumentStoreConfig::new(StoreType::Sqlite, "sqlite::memory:"),
        }
    }

    /// A fresh, empty backend
    pub async fn client(self) -> Arc<dyn DocumentStore> {
        connect(&self.config())
            .await
            .unwrap_or_else(|e| panic!("Failed to connect {self:?} backend: {e}"))
    }

    /// A user store over a fresh backend, with the collection provisioned
    pub async fn open<U: UserDocument>(self) -> DocumentUserStore<U> {
        let options = UserStoreOptions::default().ensure_created(true);
        DocumentUserStore::open(self.client().await, &options)
            .await
            .unwrap_or_else(|e| panic!("Failed to open {self:?} user store: {e}"))
    }
}
