use thiserror::Error;

use crate::storage::DocumentError;

#[derive(Clone, Error, Debug, PartialEq)]
pub enum UserStoreError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Cannot access a disposed object: {0}")]
    ObjectDisposed(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

impl UserStoreError {
    /// True for operations the store cannot perform in its current state,
    /// disposal included.
    pub fn is_invalid_operation(&self) -> bool {
        matches!(self, Self::InvalidOperation(_) | Self::ObjectDisposed(_))
    }

    pub(crate) fn missing(name: &str) -> Self {
        Self::InvalidArgument(format!("{name} must not be empty"))
    }
}

impl From<serde_json::Error> for UserStoreError {
    fn from(err: serde_json::Error) -> Self {
        UserStoreError::InvalidData(err.to_string())
    }
}
