use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use crate::storage::{CollectionLink, DocumentError, DocumentStore, Filter};
use crate::userdb::{
    errors::UserStoreError,
    traits::UserStore,
    types::{IdentityUser, UserDocument},
};

use super::config::UserStoreOptions;

/// Document field holding the flattened `provider:key` login index
pub(crate) const LOGIN_KEYS_FIELD: &str = "loginKeys";

/// User store over one collection of a document database.
///
/// Cloning is cheap; clones share the database handle and the disposal flag,
/// so disposing any clone disposes them all.
pub struct DocumentUserStore<U = IdentityUser> {
    client: Arc<dyn DocumentStore>,
    link: CollectionLink,
    disposed: Arc<AtomicBool>,
    _user: PhantomData<fn() -> U>,
}

impl<U> Clone for DocumentUserStore<U> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            link: self.link.clone(),
            disposed: Arc::clone(&self.disposed),
            _user: PhantomData,
        }
    }
}

impl<U> fmt::Debug for DocumentUserStore<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentUserStore")
            .field("store_type", &self.client.store_type())
            .field("collection", &self.link.to_string())
            .field("disposed", &self.disposed.load(Ordering::SeqCst))
            .finish()
    }
}

impl<U: UserDocument> DocumentUserStore<U> {
    /// Bind a store to `database`/`collection` without touching the database.
    pub fn new(
        client: Arc<dyn DocumentStore>,
        database: &str,
        collection: &str,
    ) -> Result<Self, UserStoreError> {
        require(database, "database")?;
        require(collection, "collection")?;

        Ok(Self {
            client,
            link: CollectionLink::new(database, collection),
            disposed: Arc::new(AtomicBool::new(false)),
            _user: PhantomData,
        })
    }

    /// Bind a store as described by `options`, provisioning the database and
    /// collection first when `ensure_created` is set.
    #[tracing::instrument(skip(client), fields(store_type = %client.store_type()))]
    pub async fn open(
        client: Arc<dyn DocumentStore>,
        options: &UserStoreOptions,
    ) -> Result<Self, UserStoreError> {
        let store = Self::new(client, &options.database, &options.collection)?;

        if options.ensure_created {
            store.create_database_if_not_exists().await?;
            store
                .create_collection_if_not_exists(options.throughput)
                .await?;
        }

        tracing::info!(collection = %store.link, "User store ready");
        Ok(store)
    }

    pub fn collection_link(&self) -> &CollectionLink {
        &self.link
    }

    /// Release the store. Every later call on this store or any clone of it
    /// fails with `ObjectDisposed`.
    pub fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::SeqCst) {
            tracing::debug!(collection = %self.link, "User store disposed");
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    pub(crate) fn ensure_active(&self) -> Result<(), UserStoreError> {
        if self.is_disposed() {
            return Err(UserStoreError::ObjectDisposed(
                "DocumentUserStore".to_string(),
            ));
        }
        Ok(())
    }

    async fn create_database_if_not_exists(&self) -> Result<(), UserStoreError> {
        let database = &self.link.database;
        match self.client.read_database(database).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                tracing::info!(database = %database, "Creating database");
                ignore_conflict(self.client.create_database(database).await)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn create_collection_if_not_exists(&self, throughput: u32) -> Result<(), UserStoreError> {
        match self.client.read_collection(&self.link).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                tracing::info!(collection = %self.link, throughput, "Creating collection");
                ignore_conflict(self.client.create_collection(&self.link, throughput).await)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Every stored user matching `filter`, ordered by id.
    #[tracing::instrument(skip(self))]
    pub async fn users(&self, filter: &Filter) -> Result<Vec<U>, UserStoreError> {
        self.ensure_active()?;

        let documents = self.client.query_documents(&self.link, filter).await?;
        let users = documents
            .into_iter()
            .map(from_document)
            .collect::<Result<Vec<U>, _>>()?;

        tracing::debug!(count = users.len(), "Listed users");
        Ok(users)
    }

    /// Documents matching `filter`, deserialized
    pub(crate) async fn query(&self, filter: &Filter) -> Result<Vec<U>, UserStoreError> {
        self.client
            .query_documents(&self.link, filter)
            .await?
            .into_iter()
            .map(from_document)
            .collect()
    }

    pub(crate) async fn find_one(&self, filter: &Filter) -> Result<Option<U>, UserStoreError> {
        let result = self.query(filter).await.map(|users| users.into_iter().next());

        match &result {
            Ok(Some(_)) => tracing::info!(found = true, "User lookup completed"),
            Ok(None) => tracing::info!(found = false, "User lookup completed - not found"),
            Err(e) => tracing::error!(error = %e, "User lookup failed"),
        }

        result
    }
}

/// Serialize a user into its stored form, adding the login index.
pub(crate) fn to_document<U: UserDocument>(user: &U) -> Result<Value, UserStoreError> {
    let mut value = serde_json::to_value(user)?;

    let login_keys: Vec<Value> = user
        .identity()
        .logins
        .iter()
        .map(|login| Value::String(login.index_key()))
        .collect();

    let Some(object) = value.as_object_mut() else {
        return Err(UserStoreError::InvalidData(
            "User must serialize to a JSON object".to_string(),
        ));
    };
    object.insert(LOGIN_KEYS_FIELD.to_string(), Value::Array(login_keys));

    Ok(value)
}

pub(crate) fn from_document<U: UserDocument>(mut value: Value) -> Result<U, UserStoreError> {
    if let Some(object) = value.as_object_mut() {
        object.remove(LOGIN_KEYS_FIELD);
    }
    Ok(serde_json::from_value(value)?)
}

pub(crate) fn require(value: &str, name: &str) -> Result<(), UserStoreError> {
    if value.is_empty() {
        return Err(UserStoreError::missing(name));
    }
    Ok(())
}

fn ignore_conflict(result: Result<(), DocumentError>) -> Result<(), UserStoreError> {
    match result {
        Err(e) if e.is_conflict() => {
            tracing::debug!("Resource created concurrently, continuing");
            Ok(())
        }
        other => Ok(other?),
    }
}

#[async_trait]
impl<U: UserDocument> UserStore<U> for DocumentUserStore<U> {
    #[tracing::instrument(skip(self, user), fields(user_name = %user.identity().user_name))]
    async fn create(&self, user: &mut U) -> Result<(), UserStoreError> {
        self.ensure_active()?;

        let identity = user.identity_mut();
        if identity.id.is_empty() {
            identity.id = Uuid::new_v4().to_string();
        }
        let id = identity.id.clone();

        let document = to_document(user)?;
        match self.client.create_document(&self.link, &id, &document).await {
            Ok(()) => {
                tracing::debug!(user_id = %id, "User created");
                Ok(())
            }
            Err(e) => {
                tracing::error!(user_id = %id, error = %e, "User create failed");
                Err(e.into())
            }
        }
    }

    #[tracing::instrument(skip(self, user), fields(user_id = %user.identity().id))]
    async fn update(&self, user: &U) -> Result<(), UserStoreError> {
        self.ensure_active()?;

        let id = &user.identity().id;
        if id.is_empty() {
            return Err(UserStoreError::InvalidOperation(
                "Cannot update a user that was never created".to_string(),
            ));
        }

        let document = to_document(user)?;
        match self.client.replace_document(&self.link, id, &document).await {
            Ok(()) => {
                tracing::debug!("User updated");
                Ok(())
            }
            Err(e) if e.is_not_found() => Err(UserStoreError::InvalidOperation(format!(
                "Cannot update user {id}: it was never created"
            ))),
            Err(e) => {
                tracing::error!(error = %e, "User update failed");
                Err(e.into())
            }
        }
    }

    #[tracing::instrument(skip(self, user), fields(user_id = %user.identity().id))]
    async fn delete(&self, user: &U) -> Result<(), UserStoreError> {
        self.ensure_active()?;

        let id = &user.identity().id;
        if id.is_empty() {
            return Ok(());
        }

        match self.client.read_document(&self.link, id).await {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!("User not stored, nothing to delete");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }

        match self.client.delete_document(&self.link, id).await {
            Ok(()) => {
                tracing::debug!("User deleted");
                Ok(())
            }
            // Removed by someone else in between
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    #[tracing::instrument(skip(self), fields(user_id = %user_id))]
    async fn find_by_id(&self, user_id: &str) -> Result<Option<U>, UserStoreError> {
        self.ensure_active()?;
        require(user_id, "user_id")?;

        self.find_one(&Filter::eq("id", user_id)).await
    }

    #[tracing::instrument(skip(self), fields(user_name = %user_name))]
    async fn find_by_name(&self, user_name: &str) -> Result<Option<U>, UserStoreError> {
        self.ensure_active()?;
        require(user_name, "user_name")?;

        self.find_one(&Filter::eq("userName", user_name)).await
    }
}
