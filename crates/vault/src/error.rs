//! Vault error types.

/// Errors produced by cipher operations.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// The configured key is not a valid base64url-encoded 32-byte key.
    #[error("invalid cipher key: {0}")]
    InvalidKey(String),

    /// The blob is not a token this version can parse.
    #[error("malformed token: {0}")]
    Malformed(&'static str),

    /// Encryption or decryption failed (tampered data, wrong key).
    #[error("cipher error: {0}")]
    CipherError(String),
}
