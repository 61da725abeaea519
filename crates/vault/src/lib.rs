//! Encryption-at-rest for note content and attachments.
//!
//! A single XChaCha20-Poly1305 key is loaded from configuration at startup
//! and wrapped in a [`NoteCipher`] that every encrypted field goes through.
//! Text bodies become base64url tokens for text columns; attachment bytes
//! become raw blobs. Text decryption is infallible by contract (failures
//! surface as a tagged [`TextPayload`]); byte decryption returns a `Result`
//! so the serving path can fail closed.

pub mod cipher;
pub mod error;
pub mod key;
pub mod payload;

pub use {
    cipher::{NoteCipher, TOKEN_VERSION},
    error::VaultError,
    key::{CipherKey, KEY_LEN},
    payload::{DecryptFailure, SENTINEL_FAILED, SENTINEL_INVALID_DATA, TextPayload},
};
