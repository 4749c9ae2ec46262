use async_trait::async_trait;

use crate::userdb::{errors::UserStoreError, traits::UserRoleStore, types::UserDocument};

use super::store_type::{DocumentUserStore, require};

#[async_trait]
impl<U: UserDocument> UserRoleStore<U> for DocumentUserStore<U> {
    async fn add_to_role(&self, user: &mut U, role_name: &str) -> Result<(), UserStoreError> {
        self.ensure_active()?;
        require(role_name, "role_name")?;

        let roles = &mut user.identity_mut().roles;
        if !roles.iter().any(|role| role == role_name) {
            roles.push(role_name.to_string());
        }
        Ok(())
    }

    async fn remove_from_role(&self, user: &mut U, role_name: &str) -> Result<(), UserStoreError> {
        self.ensure_active()?;
        require(role_name, "role_name")?;

        user.identity_mut().roles.retain(|role| role != role_name);
        Ok(())
    }

    async fn get_roles(&self, user: &U) -> Result<Vec<String>, UserStoreError> {
        self.ensure_active()?;
        Ok(user.identity().roles.clone())
    }

    async fn is_in_role(&self, user: &U, role_name: &str) -> Result<bool, UserStoreError> {
        self.ensure_active()?;
        require(role_name, "role_name")?;

        Ok(user.identity().roles.iter().any(|role| role == role_name))
    }
}
