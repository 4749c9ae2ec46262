//! Document database configuration

use std::{
    env, fmt,
    str::FromStr,
    sync::{Arc, LazyLock},
};

use super::errors::DocumentError;
use super::memory::InMemoryDocumentStore;
use super::postgres::PostgresDocumentStore;
use super::redis::RedisDocumentStore;
use super::sqlite::SqliteDocumentStore;
use super::types::DocumentStore;

/// Table prefix for the SQL backends, from environment variable
pub(crate) static DOCDB_TABLE_PREFIX: LazyLock<String> =
    LazyLock::new(|| env::var("DOCDB_TABLE_PREFIX").unwrap_or_else(|_| "docdb_".to_string()));

/// Validated table prefix. The prefix is interpolated into DDL, so it is held
/// to the same character set as filter field names.
pub(crate) fn table_prefix() -> Result<&'static str, DocumentError> {
    let prefix = DOCDB_TABLE_PREFIX.as_str();
    if prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Ok(prefix)
    } else {
        Err(DocumentError::Config(format!(
            "DOCDB_TABLE_PREFIX '{prefix}' contains unsupported characters"
        )))
    }
}

/// Supported document database backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreType {
    Memory,
    Sqlite,
    Postgres,
    Redis,
}

impl StoreType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
            Self::Redis => "redis",
        }
    }
}

impl fmt::Display for StoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreType {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "redis" => Ok(Self::Redis),
            t => Err(DocumentError::Config(format!(
                "Unsupported store type: {t}. Supported types are 'memory', 'sqlite', 'postgres' and 'redis'"
            ))),
        }
    }
}

/// Where the document database lives and how to authenticate to it.
#[derive(Clone)]
pub struct DocumentStoreConfig {
    pub store_type: StoreType,
    /// Endpoint URI (database URL for SQL backends, `redis://` URL for Redis,
    /// ignored for memory)
    pub endpoint: String,
    /// Access key, applied as the connection password when the endpoint
    /// carries none
    pub access_key: Option<String>,
}

impl fmt::Debug for DocumentStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentStoreConfig")
            .field("store_type", &self.store_type)
            .field("endpoint", &redact_endpoint(&self.endpoint))
            .field("access_key", &self.access_key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl DocumentStoreConfig {
    pub fn new(store_type: StoreType, endpoint: impl Into<String>) -> Self {
        Self {
            store_type,
            endpoint: endpoint.into(),
            access_key: None,
        }
    }

    pub fn memory() -> Self {
        Self::new(StoreType::Memory, "")
    }

    pub fn with_access_key(mut self, access_key: impl Into<String>) -> Self {
        self.access_key = Some(access_key.into());
        self
    }

    /// Read `DOCDB_STORE_TYPE`, `DOCDB_ENDPOINT` and `DOCDB_ACCESS_KEY`.
    pub fn from_env() -> Result<Self, DocumentError> {
        let store_type: StoreType = env::var("DOCDB_STORE_TYPE")
            .map_err(|_| DocumentError::Config("DOCDB_STORE_TYPE must be set".to_string()))?
            .parse()?;

        let endpoint = match env::var("DOCDB_ENDPOINT") {
            Ok(endpoint) => endpoint,
            Err(_) if store_type == StoreType::Memory => String::new(),
            Err(_) => {
                return Err(DocumentError::Config(
                    "DOCDB_ENDPOINT must be set".to_string(),
                ));
            }
        };

        let access_key = env::var("DOCDB_ACCESS_KEY")
            .ok()
            .filter(|key| !key.is_empty());

        Ok(Self {
            store_type,
            endpoint,
            access_key,
        })
    }
}

/// Build the backend described by `config`.
///
/// SQL pools connect lazily on first use. Redis is pinged up front so a bad
/// endpoint fails here rather than on the first user lookup.
pub async fn connect(config: &DocumentStoreConfig) -> Result<Arc<dyn DocumentStore>, DocumentError> {
    let endpoint = redact_endpoint(&config.endpoint);

    tracing::info!(
        store_type = %config.store_type,
        endpoint = %endpoint,
        "Initializing document store"
    );

    let access_key = config.access_key.as_deref();
    let store: Arc<dyn DocumentStore> = match config.store_type {
        StoreType::Memory => Arc::new(InMemoryDocumentStore::new()),
        StoreType::Sqlite => Arc::new(SqliteDocumentStore::connect_lazy(&config.endpoint)?),
        StoreType::Postgres => Arc::new(PostgresDocumentStore::connect_lazy(
            &config.endpoint,
            access_key,
        )?),
        StoreType::Redis => {
            let store = RedisDocumentStore::open(&config.endpoint, access_key)?;
            if let Err(e) = store.init().await {
                tracing::error!(error = %e, "Failed to connect to Redis");
                return Err(e);
            }
            Arc::new(store)
        }
    };

    tracing::info!(
        store_type = %config.store_type,
        endpoint = %endpoint,
        "Connected to document store"
    );

    Ok(store)
}

/// Endpoint with any embedded password masked, for logs.
pub(crate) fn redact_endpoint(endpoint: &str) -> String {
    match url::Url::parse(endpoint) {
        Ok(mut url) if url.password().is_some() => {
            if url.set_password(Some("***")).is_err() {
                return "<redacted>".to_string();
            }
            url.to_string()
        }
        _ => endpoint.to_string(),
    }
}

/// Endpoint with `access_key` filled in as the password when it has none.
pub(crate) fn apply_access_key(
    endpoint: &str,
    access_key: Option<&str>,
) -> Result<String, DocumentError> {
    let Some(key) = access_key else {
        return Ok(endpoint.to_string());
    };

    let mut url = url::Url::parse(endpoint)
        .map_err(|e| DocumentError::Config(format!("Invalid endpoint URI: {e}")))?;

    if url.password().is_none() {
        url.set_password(Some(key)).map_err(|_| {
            DocumentError::Config("Endpoint URI cannot carry an access key".to_string())
        })?;
    }

    Ok(url.to_string())
}
