use async_trait::async_trait;

use crate::userdb::{
    errors::UserStoreError,
    traits::UserClaimStore,
    types::{UserClaim, UserDocument},
};

use super::store_type::{DocumentUserStore, require};

#[async_trait]
impl<U: UserDocument> UserClaimStore<U> for DocumentUserStore<U> {
    async fn get_claims(&self, user: &U) -> Result<Vec<UserClaim>, UserStoreError> {
        self.ensure_active()?;
        Ok(user.identity().claims.clone())
    }

    async fn add_claim(&self, user: &mut U, claim: UserClaim) -> Result<(), UserStoreError> {
        self.ensure_active()?;
        require(&claim.claim_type, "claim_type")?;

        let claims = &mut user.identity_mut().claims;
        if !claims.contains(&claim) {
            claims.push(claim);
        }
        Ok(())
    }

    async fn remove_claim(&self, user: &mut U, claim: &UserClaim) -> Result<(), UserStoreError> {
        self.ensure_active()?;
        require(&claim.claim_type, "claim_type")?;

        user.identity_mut()
            .claims
            .retain(|existing| existing != claim);
        Ok(())
    }
}
