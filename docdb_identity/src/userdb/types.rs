use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// An account as stored in the user collection, one document per user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct IdentityUser {
    /// Unique user identifier, assigned on create when empty
    pub id: String,
    pub user_name: String,
    pub email: Option<String>,
    pub email_confirmed: bool,
    pub password_hash: Option<String>,
    /// Random value that changes whenever the user's credentials change
    pub security_stamp: Option<String>,
    pub phone_number: Option<String>,
    pub phone_number_confirmed: bool,
    pub two_factor_enabled: bool,
    /// End of the current lockout window, in UTC
    pub lockout_end: Option<DateTime<Utc>>,
    pub lockout_enabled: bool,
    pub access_failed_count: i32,
    /// External sign-in bindings
    pub logins: Vec<UserLoginInfo>,
    pub claims: Vec<UserClaim>,
    pub roles: Vec<String>,
}

impl IdentityUser {
    /// Create a user with the given name and no id yet
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            ..Default::default()
        }
    }

    /// Whether the lockout window is still open at `now`.
    ///
    /// Users with lockout disabled are never locked out.
    pub fn is_locked_out(&self, now: DateTime<Utc>) -> bool {
        self.lockout_enabled && self.lockout_end.is_some_and(|end| end > now)
    }
}

/// One external login binding
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct UserLoginInfo {
    pub login_provider: String,
    pub provider_key: String,
}

impl UserLoginInfo {
    pub fn new(login_provider: impl Into<String>, provider_key: impl Into<String>) -> Self {
        Self {
            login_provider: login_provider.into(),
            provider_key: provider_key.into(),
        }
    }

    /// Flattened `provider:key` form used for login lookups
    pub(crate) fn index_key(&self) -> String {
        format!("{}:{}", self.login_provider, self.provider_key)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct UserClaim {
    pub claim_type: String,
    pub claim_value: String,
}

impl UserClaim {
    pub fn new(claim_type: impl Into<String>, claim_value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            claim_value: claim_value.into(),
        }
    }
}

/// A storable user record.
///
/// Implemented by [`IdentityUser`] and by application types that embed one,
/// usually through `#[serde(flatten)]`, to persist extra properties next to
/// the identity fields.
///
/// ```
/// use docdb_identity::{IdentityUser, UserDocument};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// #[serde(rename_all = "camelCase")]
/// struct AppUser {
///     #[serde(flatten)]
///     identity: IdentityUser,
///     display_name: String,
/// }
///
/// impl UserDocument for AppUser {
///     fn identity(&self) -> &IdentityUser {
///         &self.identity
///     }
///
///     fn identity_mut(&mut self) -> &mut IdentityUser {
///         &mut self.identity
///     }
/// }
/// ```
pub trait UserDocument: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn identity(&self) -> &IdentityUser;
    fn identity_mut(&mut self) -> &mut IdentityUser;
}

impl UserDocument for IdentityUser {
    fn identity(&self) -> &IdentityUser {
        self
    }

    fn identity_mut(&mut self) -> &mut IdentityUser {
        self
    }
}
