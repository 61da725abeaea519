//! Auth error types.

/// Minimum accepted password length at registration.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Errors produced by user and session operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The requested username already exists.
    #[error("username is already taken")]
    UsernameTaken,

    /// The username is empty, too long, or contains invalid characters.
    #[error("invalid username: {0}")]
    InvalidUsername(&'static str),

    /// The password does not meet the minimum length.
    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,

    /// Password hashing failed.
    #[error("failed to hash password: {0}")]
    Hash(String),

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
