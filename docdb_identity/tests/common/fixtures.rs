use docdb_identity::{IdentityUser, UserDocument, UserLoginInfo};
use serde::{Deserialize, Serialize};

/// Test user fixtures for integration testing
pub struct TestUsers;

impl TestUsers {
    /// A user with a name and email, no id yet
    pub fn with_email(user_name: &str, email: &str) -> IdentityUser {
        let mut user = IdentityUser::new(user_name);
        user.email = Some(email.to_string());
        user
    }

    /// A user carrying a caller-chosen id
    pub fn with_id(id: &str) -> IdentityUser {
        let mut user = IdentityUser::new(format!("user-{id}"));
        user.id = id.to_string();
        user
    }

    pub fn google_login(key: &str) -> UserLoginInfo {
        UserLoginInfo::new("Google", key)
    }

    pub fn github_login(key: &str) -> UserLoginInfo {
        UserLoginInfo::new("GitHub", key)
    }
}

/// Application user type with its own properties next to the identity fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomUser {
    #[serde(flatten)]
    pub identity: IdentityUser,
    pub is_awesome: bool,
    pub nickname: Option<String>,
}

impl CustomUser {
    pub fn new(user_name: &str) -> Self {
        Self {
            identity: IdentityUser::new(user_name),
            ..Default::default()
        }
    }
}

impl UserDocument for CustomUser {
    fn identity(&self) -> &IdentityUser {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut IdentityUser {
        &mut self.identity
    }
}
