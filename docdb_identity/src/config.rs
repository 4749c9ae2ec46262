//! Environment-driven configuration for the whole crate

use crate::storage::{self, DocumentError, DocumentStoreConfig};
use crate::userdb::{DocumentUserStore, UserDocument, UserStoreError, UserStoreOptions};

/// Backend connection plus user collection settings
#[derive(Debug, Clone)]
pub struct IdentityStoreConfig {
    pub store: DocumentStoreConfig,
    pub options: UserStoreOptions,
}

impl IdentityStoreConfig {
    /// Load every `DOCDB_*` variable
    pub fn from_env() -> Result<Self, DocumentError> {
        Ok(Self {
            store: DocumentStoreConfig::from_env()?,
            options: UserStoreOptions::from_env()?,
        })
    }

    /// Connect the backend and open a user store on it.
    pub async fn open<U: UserDocument>(&self) -> Result<DocumentUserStore<U>, UserStoreError> {
        let client = storage::connect(&self.store).await?;
        DocumentUserStore::open(client, &self.options).await
    }
}

/// Open a user store configured entirely from the environment.
///
/// Reads the `DOCDB_*` variables, connects the backend and provisions the
/// collection when `DOCDB_ENSURE_CREATED` is set.
pub async fn open_user_store<U: UserDocument>() -> Result<DocumentUserStore<U>, UserStoreError> {
    let config = IdentityStoreConfig::from_env()?;
    tracing::debug!(?config, "Loaded identity store configuration");
    config.open().await
}
