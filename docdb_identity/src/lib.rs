//! docdb-identity - Identity user store backed by a document database
//!
//! This crate maps the user-management contract of an authentication layer
//! (user CRUD, external logins, claims, roles, password, security stamp,
//! email and phone confirmation, lockout, two-factor) onto one collection of a
//! document database. Each user is a single JSON document keyed by `id`.
//!
//! The database is reached through the [`DocumentStore`] trait, with memory,
//! SQLite, PostgreSQL and Redis backends included.
//!
//! ```no_run
//! use docdb_identity::{IdentityUser, UserEmailStore, UserStore, open_user_store};
//!
//! # async fn example() -> Result<(), docdb_identity::UserStoreError> {
//! let store = open_user_store::<IdentityUser>().await?;
//!
//! let mut user = IdentityUser::new("alice");
//! store.set_email(&mut user, "alice@example.com").await?;
//! store.create(&mut user).await?;
//!
//! let found = store.find_by_email("alice@example.com").await?;
//! assert_eq!(found.map(|u| u.id), Some(user.id));
//! # Ok(())
//! # }
//! ```

mod config;
mod storage;
mod userdb;

#[cfg(test)]
mod test_utils;

pub use config::{IdentityStoreConfig, open_user_store};

pub use storage::{
    CollectionLink, DocumentError, DocumentStore, DocumentStoreConfig, Filter,
    InMemoryDocumentStore, PostgresDocumentStore, RedisDocumentStore, SqliteDocumentStore,
    StoreType, connect,
};

pub use userdb::{
    DocumentUserStore, IdentityUser, UserClaim, UserClaimStore, UserDocument, UserEmailStore,
    UserLockoutStore, UserLoginInfo, UserLoginStore, UserPasswordStore, UserPhoneNumberStore,
    UserRoleStore, UserSecurityStampStore, UserStore, UserStoreError, UserStoreOptions,
    UserTwoFactorStore,
};
