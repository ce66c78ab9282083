//! Error taxonomy for the persistence gateway (component A), shared by both
//! the Postgres-backed implementation and the in-memory test fake.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("login already exists")]
    LoginTaken,

    #[error("unauthorized")]
    Unauthorized,

    #[error("order already uploaded by this user")]
    AlreadyOwnedBySame,

    #[error("order already uploaded by another user")]
    AlreadyOwnedByOther,

    #[error("insufficient funds")]
    InsufficientFunds,

    #[error("internal storage error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Internal(err.to_string())
    }
}
