use std::env;

use crate::storage::DocumentError;

pub(crate) const DEFAULT_DATABASE: &str = "identity";
pub(crate) const DEFAULT_COLLECTION: &str = "users";
pub(crate) const DEFAULT_THROUGHPUT: u32 = 400;

/// Where a [`DocumentUserStore`](super::DocumentUserStore) keeps its users
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStoreOptions {
    pub database: String,
    pub collection: String,
    /// Create the database and collection when they do not exist yet
    pub ensure_created: bool,
    /// Throughput requested for a newly created collection
    pub throughput: u32,
}

impl Default for UserStoreOptions {
    fn default() -> Self {
        Self {
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            ensure_created: false,
            throughput: DEFAULT_THROUGHPUT,
        }
    }
}

impl UserStoreOptions {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
            ..Default::default()
        }
    }

    pub fn ensure_created(mut self, ensure_created: bool) -> Self {
        self.ensure_created = ensure_created;
        self
    }

    pub fn throughput(mut self, throughput: u32) -> Self {
        self.throughput = throughput;
        self
    }

    /// Read `DOCDB_DATABASE`, `DOCDB_COLLECTION`, `DOCDB_ENSURE_CREATED` and
    /// `DOCDB_COLLECTION_THROUGHPUT`, falling back to the defaults.
    pub fn from_env() -> Result<Self, DocumentError> {
        let database = env::var("DOCDB_DATABASE").unwrap_or_else(|_| DEFAULT_DATABASE.to_string());
        let collection =
            env::var("DOCDB_COLLECTION").unwrap_or_else(|_| DEFAULT_COLLECTION.to_string());

        let ensure_created = match env::var("DOCDB_ENSURE_CREATED") {
            Ok(value) => parse_flag(&value).ok_or_else(|| {
                DocumentError::Config(format!(
                    "DOCDB_ENSURE_CREATED must be true or false, got '{value}'"
                ))
            })?,
            Err(_) => false,
        };

        let throughput = match env::var("DOCDB_COLLECTION_THROUGHPUT") {
            Ok(value) => value.trim().parse::<u32>().map_err(|e| {
                DocumentError::Config(format!(
                    "DOCDB_COLLECTION_THROUGHPUT '{value}' is not a valid number: {e}"
                ))
            })?,
            Err(_) => DEFAULT_THROUGHPUT,
        };

        Ok(Self {
            database,
            collection,
            ensure_created,
            throughput,
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" | "" => Some(false),
        _ => None,
    }
}
