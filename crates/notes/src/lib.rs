//! Notes and tasks for notarium.
//!
//! A note's body and attachment are encrypted at rest; the stores in this
//! crate persist ciphertext without ever holding the key. Decryption happens
//! only through the [`Note`] accessors, which take the cipher explicitly.
//! Tasks are plain rows with due dates and a per-session alert ledger.

pub mod error;
pub mod note_store;
pub mod record;
pub mod task;

pub use {
    error::StoreError,
    note_store::{NOTES_PER_PAGE, NotePage, SqliteNoteStore},
    record::{AttachmentPayload, Note, NoteSummary},
    task::{SqliteTaskStore, Task},
};
