mod errors;
mod storage;
mod traits;
mod types;

pub use errors::UserStoreError;
pub use storage::{DocumentUserStore, UserStoreOptions};
pub use traits::{
    UserClaimStore, UserEmailStore, UserLockoutStore, UserLoginStore, UserPasswordStore,
    UserPhoneNumberStore, UserRoleStore, UserSecurityStampStore, UserStore, UserTwoFactorStore,
};
pub use types::{IdentityUser, UserClaim, UserDocument, UserLoginInfo};
