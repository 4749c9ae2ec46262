use std::env;

use chrono::{Duration, Utc};
use docdb_identity::{
    DocumentStoreConfig, IdentityStoreConfig, IdentityUser, UserClaim, UserClaimStore,
    UserDocument, UserEmailStore, UserLockoutStore, UserLoginInfo, UserLoginStore, UserRoleStore,
    UserStore, UserStoreOptions,
};
use serde::{Deserialize, Serialize};

mod logging;

/// Application user with one extra property stored next to the identity fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppUser {
    #[serde(flatten)]
    identity: IdentityUser,
    display_name: String,
}

impl UserDocument for AppUser {
    fn identity(&self) -> &IdentityUser {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut IdentityUser {
        &mut self.identity
    }
}

/// Environment config, or a provisioned in-memory store when no backend is set
fn load_config() -> Result<IdentityStoreConfig, Box<dyn std::error::Error>> {
    if env::var("DOCDB_STORE_TYPE").is_ok() {
        return Ok(IdentityStoreConfig::from_env()?);
    }

    tracing::info!("DOCDB_STORE_TYPE not set, using an in-memory store");
    Ok(IdentityStoreConfig {
        store: DocumentStoreConfig::memory(),
        options: UserStoreOptions::default().ensure_created(true),
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    logging::init_tracing("demo_identity");

    let config = load_config()?;
    let store = config.open::<AppUser>().await?;

    // Register a user
    let mut user = AppUser {
        identity: IdentityUser::new("alice"),
        display_name: "Alice Example".to_string(),
    };
    store.set_email(&mut user, "alice@example.com").await?;
    store.create(&mut user).await?;
    tracing::info!(user_id = %user.identity.id, "Registered user");

    // Bind an external login; this is saved immediately
    let login = UserLoginInfo::new("github", "alice-gh-1001");
    store.add_login(&mut user, login.clone()).await?;

    // Roles, claims and confirmation are saved with an explicit update
    store.add_to_role(&mut user, "admin").await?;
    store
        .add_claim(&mut user, UserClaim::new("department", "engineering"))
        .await?;
    store.set_email_confirmed(&mut user, true).await?;
    store.update(&user).await?;

    if let Some(found) = store.find_by_login(&login).await? {
        tracing::info!(
            user_name = %found.identity.user_name,
            display_name = %found.display_name,
            roles = ?found.identity.roles,
            email_confirmed = found.identity.email_confirmed,
            "Signed in through external login"
        );
    }

    // Three failed password attempts lock the account for five minutes
    store.set_lockout_enabled(&mut user, true).await?;
    for _ in 0..3 {
        let failures = store.increment_access_failed_count(&mut user).await?;
        tracing::warn!(failures, "Failed sign-in attempt");
    }
    store
        .set_lockout_end_date(&mut user, Some(Utc::now() + Duration::minutes(5)))
        .await?;
    store.update(&user).await?;

    if let Some(found) = store.find_by_email("alice@example.com").await? {
        tracing::info!(
            locked_out = found.identity.is_locked_out(Utc::now()),
            "Checked lockout"
        );
    }

    store.delete(&user).await?;
    let remaining = store.find_by_id(&user.identity.id).await?;
    tracing::info!(deleted = remaining.is_none(), "Removed user");

    store.dispose();
    Ok(())
}
