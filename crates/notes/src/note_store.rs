//! SQLite-backed note store. Owner-scoped: every query filters by user id,
//! and a miss (absent row or someone else's row) is the same `NotFound`.

use sqlx::SqlitePool;

use crate::{
    error::StoreError,
    record::{Note, NoteSummary},
};

/// Notes shown per list page.
pub const NOTES_PER_PAGE: i64 = 10;

/// One page of a user's notes plus the numbers the pager needs.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NotePage {
    pub notes: Vec<NoteSummary>,
    pub page: u32,
    pub total_pages: u32,
    pub total: i64,
}

/// Stores notes in a SQLite database.
pub struct SqliteNoteStore {
    pool: SqlitePool,
}

impl SqliteNoteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the notes table schema.
    pub async fn init(pool: &SqlitePool) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS notes (
                id                   INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id              INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                title                TEXT    NOT NULL,
                encrypted_content    TEXT    NOT NULL DEFAULT '',
                encrypted_attachment BLOB,
                attachment_name      TEXT,
                created_at           TEXT    NOT NULL DEFAULT (datetime('now')),
                CHECK ((encrypted_attachment IS NULL) = (attachment_name IS NULL))
            )",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_notes_user_created ON notes(user_id, created_at)",
        )
        .execute(pool)
        .await
        .ok();

        Ok(())
    }

    /// Persist a freshly composed note. Returns the stored row with its
    /// assigned id and creation time.
    pub async fn insert(&self, note: &Note) -> Result<Note, StoreError> {
        let result = sqlx::query(
            "INSERT INTO notes (user_id, title, encrypted_content, encrypted_attachment, attachment_name)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(note.user_id)
        .bind(&note.title)
        .bind(&note.encrypted_content)
        .bind(note.encrypted_attachment.as_deref())
        .bind(&note.attachment_name)
        .execute(&self.pool)
        .await?;

        self.get(note.user_id, result.last_insert_rowid()).await
    }

    /// Fetch one note, scoped to its owner.
    pub async fn get(&self, user_id: i64, id: i64) -> Result<Note, StoreError> {
        let row: Option<NoteRow> = sqlx::query_as(
            "SELECT id, user_id, title, encrypted_content, encrypted_attachment, attachment_name,
                    strftime('%Y-%m-%dT%H:%M:%SZ', created_at) AS created_at
             FROM notes WHERE id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Into::into).ok_or(StoreError::NotFound)
    }

    /// Write back a note's mutable fields. Ownership and creation time are
    /// immutable; a row that isn't the caller's is a `NotFound`.
    pub async fn update(&self, note: &Note) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE notes
             SET title = ?, encrypted_content = ?, encrypted_attachment = ?, attachment_name = ?
             WHERE id = ? AND user_id = ?",
        )
        .bind(&note.title)
        .bind(&note.encrypted_content)
        .bind(note.encrypted_attachment.as_deref())
        .bind(&note.attachment_name)
        .bind(note.id)
        .bind(note.user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Delete a note and its ciphertext outright.
    pub async fn delete(&self, user_id: i64, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM notes WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// One page of the user's notes, newest first, optionally filtered by a
    /// case-insensitive title match.
    ///
    /// Pages are 1-based; out-of-range page numbers clamp to the nearest
    /// valid page, and an empty result set still has one (empty) page.
    pub async fn page(
        &self,
        user_id: i64,
        q: Option<&str>,
        page: u32,
    ) -> Result<NotePage, StoreError> {
        let pattern = q
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{}%", escape_like(q)));

        let total: i64 = match &pattern {
            Some(p) => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM notes WHERE user_id = ? AND title LIKE ? ESCAPE '\\'",
                )
                .bind(user_id)
                .bind(p)
                .fetch_one(&self.pool)
                .await?
            },
            None => sqlx::query_scalar("SELECT COUNT(*) FROM notes WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?,
        };

        let total_pages = ((total + NOTES_PER_PAGE - 1) / NOTES_PER_PAGE).max(1);
        let page = i64::from(page).clamp(1, total_pages);
        let offset = (page - 1) * NOTES_PER_PAGE;

        let rows: Vec<(i64, String, Option<String>, String)> = match &pattern {
            Some(p) => {
                sqlx::query_as(
                    "SELECT id, title, attachment_name,
                            strftime('%Y-%m-%dT%H:%M:%SZ', created_at) AS created_at
                     FROM notes WHERE user_id = ? AND title LIKE ? ESCAPE '\\'
                     ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                )
                .bind(user_id)
                .bind(p)
                .bind(NOTES_PER_PAGE)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            },
            None => {
                sqlx::query_as(
                    "SELECT id, title, attachment_name,
                            strftime('%Y-%m-%dT%H:%M:%SZ', created_at) AS created_at
                     FROM notes WHERE user_id = ?
                     ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                )
                .bind(user_id)
                .bind(NOTES_PER_PAGE)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            },
        };

        Ok(NotePage {
            notes: rows.into_iter().map(summary_from_row).collect(),
            page: page as u32,
            total_pages: total_pages as u32,
            total,
        })
    }

    /// Notes that carry an attachment, newest first.
    pub async fn with_attachments(&self, user_id: i64) -> Result<Vec<NoteSummary>, StoreError> {
        let rows: Vec<(i64, String, Option<String>, String)> = sqlx::query_as(
            "SELECT id, title, attachment_name,
                    strftime('%Y-%m-%dT%H:%M:%SZ', created_at) AS created_at
             FROM notes WHERE user_id = ? AND attachment_name IS NOT NULL
             ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(summary_from_row).collect())
    }
}

fn summary_from_row(
    (id, title, attachment_name, created_at): (i64, String, Option<String>, String),
) -> NoteSummary {
    NoteSummary {
        id,
        title,
        has_attachment: attachment_name.is_some(),
        attachment_name,
        created_at,
    }
}

/// Escape SQL LIKE wildcards in user input (pattern uses `ESCAPE '\'`).
fn escape_like(q: &str) -> String {
    q.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Internal row type for sqlx mapping.
#[derive(sqlx::FromRow)]
struct NoteRow {
    id: i64,
    user_id: i64,
    title: String,
    encrypted_content: String,
    encrypted_attachment: Option<Vec<u8>>,
    attachment_name: Option<String>,
    created_at: String,
}

impl From<NoteRow> for Note {
    fn from(r: NoteRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            title: r.title,
            encrypted_content: r.encrypted_content,
            encrypted_attachment: r.encrypted_attachment,
            attachment_name: r.attachment_name,
            created_at: r.created_at,
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use notarium_vault::{CipherKey, NoteCipher, TextPayload};

    use super::*;

    const ALICE: i64 = 1;
    const BOB: i64 = 2;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::query(
            "CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, username TEXT NOT NULL)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query("INSERT INTO users (username) VALUES ('alice'), ('bob')")
            .execute(&pool)
            .await
            .unwrap();
        SqliteNoteStore::init(&pool).await.unwrap();
        pool
    }

    fn cipher() -> NoteCipher {
        NoteCipher::new(CipherKey::generate())
    }

    #[tokio::test]
    async fn crud_round_trip() {
        let store = SqliteNoteStore::new(test_pool().await);
        let c = cipher();

        let note = Note::compose(&c, ALICE, "first", "the body");
        let saved = store.insert(&note).await.unwrap();
        assert!(saved.id > 0);
        assert!(!saved.created_at.is_empty());
        assert_eq!(saved.content(&c), TextPayload::Ok("the body".into()));

        let mut fetched = store.get(ALICE, saved.id).await.unwrap();
        fetched.title = "renamed".into();
        fetched.set_content(&c, "new body");
        store.update(&fetched).await.unwrap();

        let again = store.get(ALICE, saved.id).await.unwrap();
        assert_eq!(again.title, "renamed");
        assert_eq!(again.content(&c), TextPayload::Ok("new body".into()));

        store.delete(ALICE, saved.id).await.unwrap();
        assert!(matches!(
            store.get(ALICE, saved.id).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn stored_field_is_ciphertext() {
        let pool = test_pool().await;
        let store = SqliteNoteStore::new(pool.clone());
        let c = cipher();

        let saved = store
            .insert(&Note::compose(&c, ALICE, "t", "plaintext body"))
            .await
            .unwrap();

        let raw: String = sqlx::query_scalar("SELECT encrypted_content FROM notes WHERE id = ?")
            .bind(saved.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert!(!raw.is_empty());
        assert!(!raw.contains("plaintext"));
    }

    #[tokio::test]
    async fn cross_user_access_is_not_found() {
        let store = SqliteNoteStore::new(test_pool().await);
        let c = cipher();

        let saved = store
            .insert(&Note::compose(&c, ALICE, "mine", "secret"))
            .await
            .unwrap();

        assert!(matches!(
            store.get(BOB, saved.id).await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            store.delete(BOB, saved.id).await,
            Err(StoreError::NotFound)
        ));

        let mut stolen = store.get(ALICE, saved.id).await.unwrap();
        stolen.user_id = BOB;
        stolen.title = "hijacked".into();
        assert!(matches!(
            store.update(&stolen).await,
            Err(StoreError::NotFound)
        ));

        // Still intact for the owner.
        assert_eq!(store.get(ALICE, saved.id).await.unwrap().title, "mine");
    }

    #[tokio::test]
    async fn pagination_clamps_and_splits() {
        let store = SqliteNoteStore::new(test_pool().await);
        let c = cipher();

        for i in 0..15 {
            store
                .insert(&Note::compose(&c, ALICE, format!("note {i:02}"), "x"))
                .await
                .unwrap();
        }

        let first = store.page(ALICE, None, 1).await.unwrap();
        assert_eq!(first.notes.len(), 10);
        assert_eq!(first.total, 15);
        assert_eq!(first.total_pages, 2);
        // Newest first.
        assert_eq!(first.notes[0].title, "note 14");

        let second = store.page(ALICE, None, 2).await.unwrap();
        assert_eq!(second.notes.len(), 5);
        assert_eq!(second.notes[4].title, "note 00");

        // Past-the-end clamps to the last page, zero clamps to the first.
        let past = store.page(ALICE, None, 99).await.unwrap();
        assert_eq!(past.page, 2);
        assert_eq!(past.notes.len(), 5);
        let zero = store.page(ALICE, None, 0).await.unwrap();
        assert_eq!(zero.page, 1);

        // Another user sees an empty first page, not Alice's notes.
        let empty = store.page(BOB, None, 1).await.unwrap();
        assert!(empty.notes.is_empty());
        assert_eq!(empty.total_pages, 1);
    }

    #[tokio::test]
    async fn title_search_is_case_insensitive_and_escaped() {
        let store = SqliteNoteStore::new(test_pool().await);
        let c = cipher();

        for title in ["Shopping List", "shopping notes", "Work 100% done", "misc"] {
            store
                .insert(&Note::compose(&c, ALICE, title, "body"))
                .await
                .unwrap();
        }

        let hits = store.page(ALICE, Some("SHOPPING"), 1).await.unwrap();
        assert_eq!(hits.total, 2);

        // Wildcards in the query are literal characters, not patterns.
        let pct = store.page(ALICE, Some("100%"), 1).await.unwrap();
        assert_eq!(pct.total, 1);
        let none = store.page(ALICE, Some("100_"), 1).await.unwrap();
        assert_eq!(none.total, 0);

        // Blank query behaves like no query.
        let all = store.page(ALICE, Some("   "), 1).await.unwrap();
        assert_eq!(all.total, 4);
    }

    #[tokio::test]
    async fn with_attachments_lists_only_attached() {
        let store = SqliteNoteStore::new(test_pool().await);
        let c = cipher();

        store
            .insert(&Note::compose(&c, ALICE, "plain", "no file"))
            .await
            .unwrap();
        let mut with_file = Note::compose(&c, ALICE, "report", "see attached");
        with_file
            .set_attachment(&c, Some(("q3.pdf", &[1u8, 2, 3][..])))
            .unwrap();
        store.insert(&with_file).await.unwrap();

        let files = store.with_attachments(ALICE).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].title, "report");
        assert_eq!(files[0].attachment_name.as_deref(), Some("q3.pdf"));

        assert!(store.with_attachments(BOB).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn attachment_survives_storage_round_trip() {
        use crate::record::AttachmentPayload;

        let store = SqliteNoteStore::new(test_pool().await);
        let c = cipher();

        let mut note = Note::compose(&c, ALICE, "cat", "");
        let body = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        note.set_attachment(&c, Some(("cat.jpg", &body[..])))
            .unwrap();
        let saved = store.insert(&note).await.unwrap();

        let fetched = store.get(ALICE, saved.id).await.unwrap();
        assert_eq!(
            fetched.attachment(&c),
            AttachmentPayload::File {
                name: "cat.jpg".into(),
                bytes: body,
            }
        );
    }
}
