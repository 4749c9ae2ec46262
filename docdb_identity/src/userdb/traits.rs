//! Capability traits of the user-management contract.
//!
//! Each trait is one capability group an authentication layer may depend on.
//! All of them are implemented by [`DocumentUserStore`](super::DocumentUserStore).
//! Only [`UserStore`] writes and the login add/remove operations persist;
//! every other mutator changes the record in memory and the caller saves it
//! with [`UserStore::update`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::errors::UserStoreError;
use super::types::{UserClaim, UserDocument, UserLoginInfo};

/// User CRUD and lookup by id or name
#[async_trait]
pub trait UserStore<U: UserDocument>: Send + Sync {
    /// Insert a new user. An empty id is replaced by a fresh UUID first.
    async fn create(&self, user: &mut U) -> Result<(), UserStoreError>;

    /// Replace the stored document with the user's current fields.
    ///
    /// Fails with `InvalidOperation` when no user with this id was created.
    async fn update(&self, user: &U) -> Result<(), UserStoreError>;

    /// Remove the user. Deleting a user that is not stored is a no-op.
    async fn delete(&self, user: &U) -> Result<(), UserStoreError>;

    async fn find_by_id(&self, user_id: &str) -> Result<Option<U>, UserStoreError>;

    async fn find_by_name(&self, user_name: &str) -> Result<Option<U>, UserStoreError>;
}

/// External login bindings
#[async_trait]
pub trait UserLoginStore<U: UserDocument>: UserStore<U> {
    async fn add_login(&self, user: &mut U, login: UserLoginInfo) -> Result<(), UserStoreError>;

    async fn remove_login(&self, user: &mut U, login: &UserLoginInfo)
    -> Result<(), UserStoreError>;

    async fn get_logins(&self, user: &U) -> Result<Vec<UserLoginInfo>, UserStoreError>;

    async fn find_by_login(&self, login: &UserLoginInfo) -> Result<Option<U>, UserStoreError>;
}

#[async_trait]
pub trait UserClaimStore<U: UserDocument>: UserStore<U> {
    async fn get_claims(&self, user: &U) -> Result<Vec<UserClaim>, UserStoreError>;

    async fn add_claim(&self, user: &mut U, claim: UserClaim) -> Result<(), UserStoreError>;

    async fn remove_claim(&self, user: &mut U, claim: &UserClaim) -> Result<(), UserStoreError>;
}

/// Role membership, by exact case-sensitive role name
#[async_trait]
pub trait UserRoleStore<U: UserDocument>: UserStore<U> {
    async fn add_to_role(&self, user: &mut U, role_name: &str) -> Result<(), UserStoreError>;

    async fn remove_from_role(&self, user: &mut U, role_name: &str)
    -> Result<(), UserStoreError>;

    async fn get_roles(&self, user: &U) -> Result<Vec<String>, UserStoreError>;

    async fn is_in_role(&self, user: &U, role_name: &str) -> Result<bool, UserStoreError>;
}

#[async_trait]
pub trait UserPasswordStore<U: UserDocument>: UserStore<U> {
    async fn set_password_hash(
        &self,
        user: &mut U,
        password_hash: Option<String>,
    ) -> Result<(), UserStoreError>;

    async fn get_password_hash(&self, user: &U) -> Result<Option<String>, UserStoreError>;

    async fn has_password(&self, user: &U) -> Result<bool, UserStoreError>;
}

#[async_trait]
pub trait UserSecurityStampStore<U: UserDocument>: UserStore<U> {
    async fn set_security_stamp(
        &self,
        user: &mut U,
        stamp: Option<String>,
    ) -> Result<(), UserStoreError>;

    async fn get_security_stamp(&self, user: &U) -> Result<Option<String>, UserStoreError>;
}

#[async_trait]
pub trait UserEmailStore<U: UserDocument>: UserStore<U> {
    async fn set_email(&self, user: &mut U, email: &str) -> Result<(), UserStoreError>;

    async fn get_email(&self, user: &U) -> Result<Option<String>, UserStoreError>;

    async fn get_email_confirmed(&self, user: &U) -> Result<bool, UserStoreError>;

    async fn set_email_confirmed(&self, user: &mut U, confirmed: bool)
    -> Result<(), UserStoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<U>, UserStoreError>;
}

/// Failed-access counting and lockout window
#[async_trait]
pub trait UserLockoutStore<U: UserDocument>: UserStore<U> {
    async fn get_lockout_end_date(
        &self,
        user: &U,
    ) -> Result<Option<DateTime<Utc>>, UserStoreError>;

    async fn set_lockout_end_date(
        &self,
        user: &mut U,
        lockout_end: Option<DateTime<Utc>>,
    ) -> Result<(), UserStoreError>;

    /// Bump the failure counter and return the new count
    async fn increment_access_failed_count(&self, user: &mut U) -> Result<i32, UserStoreError>;

    async fn reset_access_failed_count(&self, user: &mut U) -> Result<(), UserStoreError>;

    async fn get_access_failed_count(&self, user: &U) -> Result<i32, UserStoreError>;

    async fn get_lockout_enabled(&self, user: &U) -> Result<bool, UserStoreError>;

    async fn set_lockout_enabled(&self, user: &mut U, enabled: bool)
    -> Result<(), UserStoreError>;
}

#[async_trait]
pub trait UserTwoFactorStore<U: UserDocument>: UserStore<U> {
    async fn set_two_factor_enabled(
        &self,
        user: &mut U,
        enabled: bool,
    ) -> Result<(), UserStoreError>;

    async fn get_two_factor_enabled(&self, user: &U) -> Result<bool, UserStoreError>;
}

#[async_trait]
pub trait UserPhoneNumberStore<U: UserDocument>: UserStore<U> {
    async fn set_phone_number(&self, user: &mut U, phone_number: &str)
    -> Result<(), UserStoreError>;

    async fn get_phone_number(&self, user: &U) -> Result<Option<String>, UserStoreError>;

    async fn get_phone_number_confirmed(&self, user: &U) -> Result<bool, UserStoreError>;

    async fn set_phone_number_confirmed(
        &self,
        user: &mut U,
        confirmed: bool,
    ) -> Result<(), UserStoreError>;
}
