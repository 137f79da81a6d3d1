use thiserror::Error;

use crate::validate::ValidationError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate key: a hive with hiveId \"{0}\" already exists")]
    DuplicateHiveId(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("stored record is invalid: {0}")]
    InvalidRecord(#[from] ValidationError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    /// Whether the caller can fix this by changing the input.
    pub fn is_rejection(&self) -> bool {
        matches!(self, StoreError::DuplicateHiveId(_) | StoreError::Constraint(_))
    }
}
