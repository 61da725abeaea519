//! XChaCha20-Poly1305 cipher for note content and attachments.

use std::time::{SystemTime, UNIX_EPOCH};

#[allow(deprecated)] // upstream generic-array 0.x deprecation
use chacha20poly1305::{
    XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit, Payload},
};
use {base64::Engine, rand::RngCore};

use crate::{
    error::VaultError,
    key::CipherKey,
    payload::{DecryptFailure, TextPayload},
};

/// Version tag, the first byte of every token.
pub const TOKEN_VERSION: u8 = 0x01;

/// Header size: version byte plus big-endian seconds-since-epoch timestamp.
const HEADER_LEN: usize = 1 + 8;

/// Nonce size for XChaCha20-Poly1305 (24 bytes).
const NONCE_LEN: usize = 24;

/// Poly1305 tag size.
const TAG_LEN: usize = 16;

const MIN_BLOB_LEN: usize = HEADER_LEN + NONCE_LEN + TAG_LEN;

/// Symmetric cipher for the two sensitive note fields.
///
/// Token layout: `[version: 1 byte][timestamp: 8 bytes][nonce: 24 bytes]
/// [ciphertext + Poly1305 tag]`, with the header authenticated as AAD.
/// Text tokens are this blob base64url-encoded (unpadded) so they fit a
/// text column; attachment blobs are stored raw.
///
/// Constructed once at startup and shared; holds no mutable state.
pub struct NoteCipher {
    key: CipherKey,
}

impl NoteCipher {
    pub fn new(key: CipherKey) -> Self {
        Self { key }
    }

    /// Encrypt a text body into a storable token.
    ///
    /// Empty input yields an empty token. An internal encryption failure
    /// (not expected under a valid key) also yields an empty token after
    /// logging a warning, so a page render can never trip over it; callers
    /// treat an empty token as "no content".
    pub fn encrypt_text(&self, plaintext: &str) -> String {
        if plaintext.is_empty() {
            return String::new();
        }
        match self.seal(plaintext.as_bytes()) {
            Ok(blob) => base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(blob),
            Err(err) => {
                tracing::warn!(error = %err, "text encryption failed, storing empty token");
                String::new()
            },
        }
    }

    /// Decrypt a stored text token into a [`TextPayload`].
    ///
    /// Never returns an error: an empty token is [`TextPayload::Empty`] and
    /// anything that fails to parse or authenticate is [`TextPayload::Failed`].
    pub fn decrypt_text(&self, token: &str) -> TextPayload {
        if token.is_empty() {
            return TextPayload::Empty;
        }
        let Ok(blob) = base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(token) else {
            return TextPayload::Failed(DecryptFailure::InvalidData);
        };
        match self.open(&blob) {
            Ok(plaintext) => match String::from_utf8(plaintext) {
                Ok(text) => TextPayload::Ok(text),
                Err(_) => TextPayload::Failed(DecryptFailure::Other),
            },
            Err(_) => TextPayload::Failed(DecryptFailure::InvalidData),
        }
    }

    /// Encrypt raw attachment bytes into a storable blob.
    pub fn encrypt_bytes(&self, plaintext: &[u8]) -> Result<Vec<u8>, VaultError> {
        self.seal(plaintext)
    }

    /// Decrypt a stored attachment blob.
    ///
    /// Unlike the text path this propagates failure: the serving path must
    /// turn a bad blob into an HTTP error, never into corrupt bytes.
    pub fn decrypt_bytes(&self, blob: &[u8]) -> Result<Vec<u8>, VaultError> {
        self.open(blob)
    }

    #[allow(deprecated)]
    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, VaultError> {
        let cipher = XChaCha20Poly1305::new(self.key.bytes().into());

        let mut header = [0u8; HEADER_LEN];
        header[0] = TOKEN_VERSION;
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        header[1..].copy_from_slice(&now.to_be_bytes());

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = XNonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, Payload {
                msg: plaintext,
                aad: &header,
            })
            .map_err(|e| VaultError::CipherError(e.to_string()))?;

        let mut blob = Vec::with_capacity(HEADER_LEN + NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&header);
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);
        Ok(blob)
    }

    #[allow(deprecated)]
    fn open(&self, blob: &[u8]) -> Result<Vec<u8>, VaultError> {
        if blob.len() < MIN_BLOB_LEN {
            return Err(VaultError::Malformed("token too short"));
        }
        if blob[0] != TOKEN_VERSION {
            return Err(VaultError::Malformed("unsupported token version"));
        }

        let (header, rest) = blob.split_at(HEADER_LEN);
        let (nonce_bytes, ct) = rest.split_at(NONCE_LEN);
        let nonce = XNonce::from_slice(nonce_bytes);
        let cipher = XChaCha20Poly1305::new(self.key.bytes().into());

        cipher
            .decrypt(nonce, Payload {
                msg: ct,
                aad: header,
            })
            .map_err(|e| VaultError::CipherError(e.to_string()))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::payload::SENTINEL_INVALID_DATA};

    fn cipher() -> NoteCipher {
        NoteCipher::new(CipherKey::generate())
    }

    #[test]
    fn text_round_trip() {
        let c = cipher();
        let token = c.encrypt_text("hello notes");
        assert!(!token.is_empty());
        assert_eq!(c.decrypt_text(&token), TextPayload::Ok("hello notes".into()));
    }

    #[test]
    fn text_round_trip_unicode() {
        let c = cipher();
        let body = "unicode: \u{1F49C} ça marche приві\u{0301}т 日本語";
        let token = c.encrypt_text(body);
        assert_eq!(c.decrypt_text(&token), TextPayload::Ok(body.into()));
    }

    #[test]
    fn text_round_trip_multi_kilobyte() {
        let c = cipher();
        let body = "lorem ipsum ".repeat(1000);
        let token = c.encrypt_text(&body);
        assert_eq!(c.decrypt_text(&token), TextPayload::Ok(body));
    }

    #[test]
    fn empty_text_short_circuits() {
        let c = cipher();
        assert_eq!(c.encrypt_text(""), "");
        assert_eq!(c.decrypt_text(""), TextPayload::Empty);
    }

    #[test]
    fn token_is_url_safe() {
        let c = cipher();
        let token = c.encrypt_text("some body with / and + characters inside");
        assert!(
            token
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
        );
    }

    #[test]
    fn tampered_token_fails() {
        let c = cipher();
        let token = c.encrypt_text("secret");
        let mut blob = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(&token)
            .unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0x01;
        let tampered = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(blob);
        assert_eq!(
            c.decrypt_text(&tampered),
            TextPayload::Failed(DecryptFailure::InvalidData)
        );
    }

    #[test]
    fn every_tampered_byte_position_fails() {
        let c = cipher();
        let token = c.encrypt_text("ab");
        let blob = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(&token)
            .unwrap();
        for i in 0..blob.len() {
            let mut copy = blob.clone();
            copy[i] ^= 0xFF;
            let tampered = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(copy);
            assert!(
                c.decrypt_text(&tampered).is_failed(),
                "flip at byte {i} was not detected"
            );
        }
    }

    #[test]
    fn wrong_key_fails() {
        let c1 = cipher();
        let c2 = cipher();
        let token = c1.encrypt_text("secret");
        assert_eq!(
            c2.decrypt_text(&token),
            TextPayload::Failed(DecryptFailure::InvalidData)
        );
    }

    #[test]
    fn garbage_token_fails_not_panics() {
        let c = cipher();
        assert!(c.decrypt_text("not-a-token").is_failed());
        assert!(c.decrypt_text("%%%not base64%%%").is_failed());
        // Short but valid base64 must also fail.
        assert!(c.decrypt_text("AAAA").is_failed());
    }

    #[test]
    fn failed_text_renders_sentinel() {
        let c = cipher();
        let rendered = c.decrypt_text("AAAA").into_display_string();
        assert_eq!(rendered, SENTINEL_INVALID_DATA);
    }

    #[test]
    fn bytes_round_trip() {
        let c = cipher();
        let data = vec![0u8, 1, 2, 255, 254, 100];
        let blob = c.encrypt_bytes(&data).unwrap();
        assert_eq!(c.decrypt_bytes(&blob).unwrap(), data);
    }

    #[test]
    fn empty_bytes_round_trip() {
        let c = cipher();
        let blob = c.encrypt_bytes(b"").unwrap();
        assert!(c.decrypt_bytes(&blob).unwrap().is_empty());
    }

    #[test]
    fn large_bytes_round_trip() {
        let c = cipher();
        let data = vec![0xAB; 100_000];
        let blob = c.encrypt_bytes(&data).unwrap();
        assert_eq!(c.decrypt_bytes(&blob).unwrap(), data);
    }

    #[test]
    fn tampered_bytes_fail() {
        let c = cipher();
        let mut blob = c.encrypt_bytes(b"attachment bytes").unwrap();
        blob[HEADER_LEN + NONCE_LEN] ^= 0x01;
        assert!(c.decrypt_bytes(&blob).is_err());
    }

    #[test]
    fn wrong_key_bytes_fail() {
        let c1 = cipher();
        let c2 = cipher();
        let blob = c1.encrypt_bytes(b"attachment").unwrap();
        assert!(matches!(
            c2.decrypt_bytes(&blob),
            Err(VaultError::CipherError(_))
        ));
    }

    #[test]
    fn too_short_blob_fails() {
        let c = cipher();
        assert!(matches!(
            c.decrypt_bytes(&[0u8; MIN_BLOB_LEN - 1]),
            Err(VaultError::Malformed(_))
        ));
    }

    #[test]
    fn unknown_version_fails() {
        let c = cipher();
        let mut blob = c.encrypt_bytes(b"data").unwrap();
        blob[0] = 0x7F;
        assert!(matches!(
            c.decrypt_bytes(&blob),
            Err(VaultError::Malformed(_))
        ));
    }

    #[test]
    fn tampered_timestamp_fails_authentication() {
        let c = cipher();
        let mut blob = c.encrypt_bytes(b"data").unwrap();
        blob[5] ^= 0x01;
        assert!(c.decrypt_bytes(&blob).is_err());
    }

    #[test]
    fn different_nonces_produce_different_tokens() {
        let c = cipher();
        let t1 = c.encrypt_text("same input");
        let t2 = c.encrypt_text("same input");
        assert_ne!(t1, t2);
    }

    #[test]
    fn token_starts_with_version_and_recent_timestamp() {
        let c = cipher();
        let blob = c.encrypt_bytes(b"x").unwrap();
        assert_eq!(blob[0], TOKEN_VERSION);
        let mut ts = [0u8; 8];
        ts.copy_from_slice(&blob[1..9]);
        let ts = u64::from_be_bytes(ts);
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        assert!(ts <= now && ts + 60 > now);
    }
}
