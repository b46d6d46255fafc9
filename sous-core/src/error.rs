use thiserror::Error;

use crate::store::StoreError;

/// A request that is malformed before any generation is attempted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: u32,
        max: u32,
    },

    #[error("{field} allows at most {max} entries")]
    TooMany { field: &'static str, max: usize },
}

#[derive(Error, Debug)]
pub enum KitchenError {
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("Recipe not found")]
    NotFoundOrForbidden,

    #[error("Storage error: {0}")]
    Store(String),
}

impl From<StoreError> for KitchenError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFoundOrForbidden => KitchenError::NotFoundOrForbidden,
            StoreError::Backend(message) => KitchenError::Store(message),
        }
    }
}
