//! Shared application state.

use std::sync::Arc;

use sqlx::SqlitePool;

use {
    notarium_auth::UserStore,
    notarium_chat::AssistantClient,
    notarium_notes::{SqliteNoteStore, SqliteTaskStore},
    notarium_vault::NoteCipher,
};

/// Everything the handlers need, cloned per request. The cipher is built
/// once at startup and never changes afterwards.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserStore>,
    pub notes: Arc<SqliteNoteStore>,
    pub tasks: Arc<SqliteTaskStore>,
    pub cipher: Arc<NoteCipher>,
    pub assistant: Arc<AssistantClient>,
}

impl AppState {
    /// Initialize all stores on the given pool and assemble the state.
    ///
    /// The users table must exist before the note and task tables, which
    /// reference it.
    pub async fn init(
        pool: SqlitePool,
        cipher: NoteCipher,
        assistant: AssistantClient,
    ) -> anyhow::Result<Self> {
        let users = UserStore::new(pool.clone()).await?;
        SqliteNoteStore::init(&pool).await?;
        SqliteTaskStore::init(&pool).await?;

        Ok(Self {
            users: Arc::new(users),
            notes: Arc::new(SqliteNoteStore::new(pool.clone())),
            tasks: Arc::new(SqliteTaskStore::new(pool)),
            cipher: Arc::new(cipher),
            assistant: Arc::new(assistant),
        })
    }
}
