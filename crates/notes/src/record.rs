//! The encrypted note record.
//!
//! The two sensitive fields hold ciphertext only and are private to this
//! crate; plaintext moves exclusively through the accessor pairs below, each
//! taking the [`NoteCipher`] explicitly so the crypto call is visible at the
//! call site. The store persists the fields as opaque values and never
//! decrypts anything itself.

use notarium_vault::{NoteCipher, TextPayload, VaultError};

/// One user-owned note. `title` and `attachment_name` are clear metadata
/// (title is the searchable field); the body and attachment bytes are
/// ciphertext at rest.
#[derive(Debug, Clone)]
pub struct Note {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub(crate) encrypted_content: String,
    pub(crate) encrypted_attachment: Option<Vec<u8>>,
    pub(crate) attachment_name: Option<String>,
    pub created_at: String,
}

/// Outcome of reading a note's attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentPayload {
    /// No attachment is stored.
    Missing,
    /// An attachment is stored but its blob no longer decrypts.
    Failed,
    /// Decrypted bytes plus the stored filename.
    File { name: String, bytes: Vec<u8> },
}

impl Note {
    /// Compose a new unsaved note (id and created_at are assigned on
    /// insert), encrypting the body on the way in.
    pub fn compose(cipher: &NoteCipher, user_id: i64, title: impl Into<String>, content: &str) -> Self {
        let mut note = Self {
            id: 0,
            user_id,
            title: title.into(),
            encrypted_content: String::new(),
            encrypted_attachment: None,
            attachment_name: None,
            created_at: String::new(),
        };
        note.set_content(cipher, content);
        note
    }

    /// Decrypt the body. Empty and failed outcomes stay distinguishable;
    /// rendering is the caller's concern.
    pub fn content(&self, cipher: &NoteCipher) -> TextPayload {
        cipher.decrypt_text(&self.encrypted_content)
    }

    /// Replace the body, storing only ciphertext.
    pub fn set_content(&mut self, cipher: &NoteCipher, plaintext: &str) {
        self.encrypted_content = cipher.encrypt_text(plaintext);
    }

    /// Decrypt the attachment, if any.
    pub fn attachment(&self, cipher: &NoteCipher) -> AttachmentPayload {
        let Some(blob) = self.encrypted_attachment.as_deref() else {
            return AttachmentPayload::Missing;
        };
        // Invariant: blob and name are set together.
        let Some(name) = self.attachment_name.clone() else {
            return AttachmentPayload::Failed;
        };
        match cipher.decrypt_bytes(blob) {
            Ok(bytes) => AttachmentPayload::File { name, bytes },
            Err(_) => AttachmentPayload::Failed,
        }
    }

    /// Set or clear the attachment. `Some((name, bytes))` encrypts and sets
    /// both fields; `None` clears both. Leaving the attachment untouched is
    /// expressed by not calling this at all.
    pub fn set_attachment(
        &mut self,
        cipher: &NoteCipher,
        file: Option<(&str, &[u8])>,
    ) -> Result<(), VaultError> {
        match file {
            Some((name, bytes)) => {
                self.encrypted_attachment = Some(cipher.encrypt_bytes(bytes)?);
                self.attachment_name = Some(name.to_string());
            },
            None => {
                self.encrypted_attachment = None;
                self.attachment_name = None;
            },
        }
        Ok(())
    }

    pub fn has_attachment(&self) -> bool {
        self.encrypted_attachment.is_some()
    }

    pub fn attachment_name(&self) -> Option<&str> {
        self.attachment_name.as_deref()
    }
}

/// Listing row: everything a list view needs, nothing that requires the key.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NoteSummary {
    pub id: i64,
    pub title: String,
    pub has_attachment: bool,
    pub attachment_name: Option<String>,
    pub created_at: String,
}
