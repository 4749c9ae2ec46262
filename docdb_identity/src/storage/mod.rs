//! Document database access: the [`DocumentStore`] trait, its query
//! [`Filter`], and the memory, SQLite, PostgreSQL and Redis backends.

mod config;
mod errors;
mod filter;
mod memory;
mod postgres;
mod redis;
mod sqlite;
mod types;

pub use config::{DocumentStoreConfig, StoreType, connect};
pub use errors::DocumentError;
pub use filter::Filter;
pub use memory::InMemoryDocumentStore;
pub use postgres::PostgresDocumentStore;
pub use redis::RedisDocumentStore;
pub use sqlite::SqliteDocumentStore;
pub use types::{CollectionLink, DocumentStore};
