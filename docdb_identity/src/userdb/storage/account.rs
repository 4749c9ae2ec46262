//! Credential, contact and lockout field accessors.
//!
//! These only touch the in-memory record; callers persist with `update`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::storage::Filter;
use crate::userdb::{
    errors::UserStoreError,
    traits::{
        UserEmailStore, UserLockoutStore, UserPasswordStore, UserPhoneNumberStore,
        UserSecurityStampStore, UserTwoFactorStore,
    },
    types::UserDocument,
};

use super::store_type::{DocumentUserStore, require};

#[async_trait]
impl<U: UserDocument> UserPasswordStore<U> for DocumentUserStore<U> {
    async fn set_password_hash(
        &self,
        user: &mut U,
        password_hash: Option<String>,
    ) -> Result<(), UserStoreError> {
        self.ensure_active()?;
        user.identity_mut().password_hash = password_hash;
        Ok(())
    }

    async fn get_password_hash(&self, user: &U) -> Result<Option<String>, UserStoreError> {
        self.ensure_active()?;
        Ok(user.identity().password_hash.clone())
    }

    async fn has_password(&self, user: &U) -> Result<bool, UserStoreError> {
        self.ensure_active()?;
        Ok(user.identity().password_hash.is_some())
    }
}

#[async_trait]
impl<U: UserDocument> UserSecurityStampStore<U> for DocumentUserStore<U> {
    async fn set_security_stamp(
        &self,
        user: &mut U,
        stamp: Option<String>,
    ) -> Result<(), UserStoreError> {
        self.ensure_active()?;
        user.identity_mut().security_stamp = stamp;
        Ok(())
    }

    async fn get_security_stamp(&self, user: &U) -> Result<Option<String>, UserStoreError> {
        self.ensure_active()?;
        Ok(user.identity().security_stamp.clone())
    }
}

#[async_trait]
impl<U: UserDocument> UserEmailStore<U> for DocumentUserStore<U> {
    async fn set_email(&self, user: &mut U, email: &str) -> Result<(), UserStoreError> {
        self.ensure_active()?;
        require(email, "email")?;
        user.identity_mut().email = Some(email.to_string());
        Ok(())
    }

    async fn get_email(&self, user: &U) -> Result<Option<String>, UserStoreError> {
        self.ensure_active()?;
        Ok(user.identity().email.clone())
    }

    async fn get_email_confirmed(&self, user: &U) -> Result<bool, UserStoreError> {
        self.ensure_active()?;
        Ok(user.identity().email_confirmed)
    }

    async fn set_email_confirmed(
        &self,
        user: &mut U,
        confirmed: bool,
    ) -> Result<(), UserStoreError> {
        self.ensure_active()?;
        user.identity_mut().email_confirmed = confirmed;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(email = %email))]
    async fn find_by_email(&self, email: &str) -> Result<Option<U>, UserStoreError> {
        self.ensure_active()?;
        require(email, "email")?;

        self.find_one(&Filter::eq("email", email)).await
    }
}

#[async_trait]
impl<U: UserDocument> UserLockoutStore<U> for DocumentUserStore<U> {
    async fn get_lockout_end_date(
        &self,
        user: &U,
    ) -> Result<Option<DateTime<Utc>>, UserStoreError> {
        self.ensure_active()?;
        Ok(user.identity().lockout_end)
    }

    async fn set_lockout_end_date(
        &self,
        user: &mut U,
        lockout_end: Option<DateTime<Utc>>,
    ) -> Result<(), UserStoreError> {
        self.ensure_active()?;
        user.identity_mut().lockout_end = lockout_end;
        Ok(())
    }

    async fn increment_access_failed_count(&self, user: &mut U) -> Result<i32, UserStoreError> {
        self.ensure_active()?;
        let identity = user.identity_mut();
        identity.access_failed_count = identity.access_failed_count.saturating_add(1);
        Ok(identity.access_failed_count)
    }

    async fn reset_access_failed_count(&self, user: &mut U) -> Result<(), UserStoreError> {
        self.ensure_active()?;
        user.identity_mut().access_failed_count = 0;
        Ok(())
    }

    async fn get_access_failed_count(&self, user: &U) -> Result<i32, UserStoreError> {
        self.ensure_active()?;
        Ok(user.identity().access_failed_count)
    }

    async fn get_lockout_enabled(&self, user: &U) -> Result<bool, UserStoreError> {
        self.ensure_active()?;
        Ok(user.identity().lockout_enabled)
    }

    async fn set_lockout_enabled(&self, user: &mut U, enabled: bool) -> Result<(), UserStoreError> {
        self.ensure_active()?;
        user.identity_mut().lockout_enabled = enabled;
        Ok(())
    }
}

#[async_trait]
impl<U: UserDocument> UserTwoFactorStore<U> for DocumentUserStore<U> {
    async fn set_two_factor_enabled(
        &self,
        user: &mut U,
        enabled: bool,
    ) -> Result<(), UserStoreError> {
        self.ensure_active()?;
        user.identity_mut().two_factor_enabled = enabled;
        Ok(())
    }

    async fn get_two_factor_enabled(&self, user: &U) -> Result<bool, UserStoreError> {
        self.ensure_active()?;
        Ok(user.identity().two_factor_enabled)
    }
}

#[async_trait]
impl<U: UserDocument> UserPhoneNumberStore<U> for DocumentUserStore<U> {
    async fn set_phone_number(&self, user: &mut U, phone_number: &str) -> Result<(), UserStoreError> {
        self.ensure_active()?;
        require(phone_number, "phone_number")?;
        user.identity_mut().phone_number = Some(phone_number.to_string());
        Ok(())
    }

    async fn get_phone_number(&self, user: &U) -> Result<Option<String>, UserStoreError> {
        self.ensure_active()?;
        Ok(user.identity().phone_number.clone())
    }

    async fn get_phone_number_confirmed(&self, user: &U) -> Result<bool, UserStoreError> {
        self.ensure_active()?;
        Ok(user.identity().phone_number_confirmed)
    }

    async fn set_phone_number_confirmed(
        &self,
        user: &mut U,
        confirmed: bool,
    ) -> Result<(), UserStoreError> {
        self.ensure_active()?;
        user.identity_mut().phone_number_confirmed = confirmed;
        Ok(())
    }
}
