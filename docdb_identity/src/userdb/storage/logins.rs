use async_trait::async_trait;

use crate::storage::Filter;
use crate::userdb::{
    errors::UserStoreError,
    traits::{UserLoginStore, UserStore},
    types::{UserDocument, UserLoginInfo},
};

use super::store_type::{DocumentUserStore, LOGIN_KEYS_FIELD, require};

fn validate_login(login: &UserLoginInfo) -> Result<(), UserStoreError> {
    require(&login.login_provider, "login_provider")?;
    require(&login.provider_key, "provider_key")
}

#[async_trait]
impl<U: UserDocument> UserLoginStore<U> for DocumentUserStore<U> {
    #[tracing::instrument(skip(self, user), fields(user_id = %user.identity().id, provider = %login.login_provider))]
    async fn add_login(&self, user: &mut U, login: UserLoginInfo) -> Result<(), UserStoreError> {
        self.ensure_active()?;
        validate_login(&login)?;

        // Written even when the pair is already present, so a retry after a
        // failed write still reaches the database
        let logins = &mut user.identity_mut().logins;
        let added = !logins.contains(&login);
        if added {
            logins.push(login);
        }

        let result = self.update(&*user).await;
        if result.is_err() && added {
            user.identity_mut().logins.pop();
        }
        result
    }

    #[tracing::instrument(skip(self, user), fields(user_id = %user.identity().id, provider = %login.login_provider))]
    async fn remove_login(
        &self,
        user: &mut U,
        login: &UserLoginInfo,
    ) -> Result<(), UserStoreError> {
        self.ensure_active()?;
        validate_login(login)?;

        let logins = &mut user.identity_mut().logins;
        if !logins.contains(login) {
            return Ok(());
        }
        let previous = logins.clone();
        logins.retain(|existing| existing != login);

        let result = self.update(&*user).await;
        if result.is_err() {
            user.identity_mut().logins = previous;
        }
        result
    }

    async fn get_logins(&self, user: &U) -> Result<Vec<UserLoginInfo>, UserStoreError> {
        self.ensure_active()?;
        Ok(user.identity().logins.clone())
    }

    #[tracing::instrument(skip(self), fields(provider = %login.login_provider))]
    async fn find_by_login(&self, login: &UserLoginInfo) -> Result<Option<U>, UserStoreError> {
        self.ensure_active()?;
        validate_login(login)?;

        // The index key is ambiguous when a provider name contains ':', so
        // candidates are confirmed against the exact pair
        let candidates = self
            .query(&Filter::contains(LOGIN_KEYS_FIELD, login.index_key()))
            .await?;
        let found = candidates
            .into_iter()
            .find(|user| user.identity().logins.contains(login));

        tracing::info!(found = found.is_some(), "Login lookup completed");
        Ok(found)
    }
}
