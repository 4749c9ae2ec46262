mod account;
mod claims;
mod config;
mod logins;
mod roles;
mod store_type;

pub use config::UserStoreOptions;
pub use store_type::DocumentUserStore;
