//! Tagged outcome of text decryption.
//!
//! Stored notes distinguish "nothing was ever written" from "the token no
//! longer authenticates", so the decrypt path returns a three-way payload
//! instead of collapsing both into one string. How each case renders is the
//! caller's choice; [`TextPayload::into_display_string`] produces the
//! historical user-facing strings.

/// Sentinel shown for a token that failed authentication or parsing.
pub const SENTINEL_INVALID_DATA: &str = "Decryption Failed: Invalid data.";

/// Sentinel shown for a decryption failure of any other kind.
pub const SENTINEL_FAILED: &str = "Decryption Failed.";

/// Why a text token could not be decrypted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecryptFailure {
    /// Tampered, produced under a different key, or not a token at all.
    InvalidData,
    /// The token authenticated but the plaintext was not valid UTF-8.
    Other,
}

/// Result of decrypting a stored text token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextPayload {
    /// The stored token was empty (no content was ever written).
    Empty,
    /// Decryption succeeded.
    Ok(String),
    /// The token could not be decrypted.
    Failed(DecryptFailure),
}

impl TextPayload {
    /// Plaintext on success, `None` otherwise.
    pub fn as_ok(&self) -> Option<&str> {
        match self {
            Self::Ok(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Render for display: plaintext as-is, absence as the empty string,
    /// failures as fixed sentinel strings.
    pub fn into_display_string(self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Ok(text) => text,
            Self::Failed(DecryptFailure::InvalidData) => SENTINEL_INVALID_DATA.to_string(),
            Self::Failed(DecryptFailure::Other) => SENTINEL_FAILED.to_string(),
        }
    }
}
