//! Store error types.

/// Errors produced by note and task store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Row missing, or owned by a different user. Lookups never reveal
    /// which, so cross-user probing cannot confirm existence.
    #[error("not found")]
    NotFound,

    /// A supplied date or datetime string could not be parsed.
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Attachment encryption failed.
    #[error(transparent)]
    Vault(#[from] notarium_vault::VaultError),
}
