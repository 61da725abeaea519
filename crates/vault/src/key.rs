//! Process-wide cipher key: parsing, generation, encoding.

use {base64::Engine, rand::RngCore, zeroize::Zeroizing};

use crate::error::VaultError;

/// Raw key length in bytes.
pub const KEY_LEN: usize = 32;

/// The symmetric key protecting note content and attachments.
///
/// Decoded once at startup from its base64url text form and handed to
/// [`NoteCipher`](crate::NoteCipher). The raw bytes are zeroized on drop;
/// `Debug` prints a placeholder so the key can never leak into logs.
#[derive(Clone)]
pub struct CipherKey(Zeroizing<[u8; KEY_LEN]>);

impl CipherKey {
    /// Parse a key from its base64url text encoding (padded or unpadded).
    pub fn from_base64(encoded: &str) -> Result<Self, VaultError> {
        let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(encoded.trim().trim_end_matches('='))
            .map_err(|e| VaultError::InvalidKey(e.to_string()))?;
        let bytes: [u8; KEY_LEN] = decoded
            .try_into()
            .map_err(|_| VaultError::InvalidKey(format!("key must decode to {KEY_LEN} bytes")))?;
        Ok(Self(Zeroizing::new(bytes)))
    }

    /// Generate a fresh random key.
    pub fn generate() -> Self {
        let mut bytes = Zeroizing::new([0u8; KEY_LEN]);
        rand::rng().fill_bytes(bytes.as_mut());
        Self(bytes)
    }

    /// Encode the key for storage in configuration.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(self.0.as_ref())
    }

    pub(crate) fn bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CipherKey(..)")
    }
}
