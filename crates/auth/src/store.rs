//! User accounts and cookie sessions backed by SQLite.

use {
    argon2::{
        Argon2,
        password_hash::{
            PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
        },
    },
    serde::Serialize,
    sqlx::SqlitePool,
};

use crate::error::{AuthError, MIN_PASSWORD_LEN};

/// Sessions expire this many days after login.
pub const SESSION_TTL_DAYS: u32 = 30;

const MAX_USERNAME_LEN: usize = 150;

/// A registered account. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub created_at: String,
}

/// Multi-user credential and session store.
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    /// Create a new store and initialize tables.
    pub async fn new(pool: SqlitePool) -> Result<Self, AuthError> {
        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    async fn init(&self) -> Result<(), AuthError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS sessions (
                token TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                expires_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ── Accounts ─────────────────────────────────────────────────────────

    /// Register a new user. The username must be unique.
    pub async fn create_user(&self, username: &str, password: &str) -> Result<User, AuthError> {
        validate_username(username)?;
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::PasswordTooShort);
        }

        let hash = hash_password(password)?;
        let result = sqlx::query("INSERT INTO users (username, password_hash) VALUES (?, ?)")
            .bind(username)
            .bind(&hash)
            .execute(&self.pool)
            .await;

        let result = match result {
            Err(sqlx::Error::Database(db))
                if db.kind() == sqlx::error::ErrorKind::UniqueViolation =>
            {
                return Err(AuthError::UsernameTaken);
            },
            other => other?,
        };

        let id = result.last_insert_rowid();
        tracing::info!(user_id = id, "user registered");
        self.user_by_id(id)
            .await?
            .ok_or_else(|| AuthError::Database(sqlx::Error::RowNotFound))
    }

    /// Verify a username/password pair. Returns the user on success,
    /// `None` for an unknown username or wrong password.
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, AuthError> {
        let row: Option<(i64, String)> =
            sqlx::query_as("SELECT id, password_hash FROM users WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
        let Some((id, hash)) = row else {
            return Ok(None);
        };
        if !verify_password(password, &hash) {
            return Ok(None);
        }
        self.user_by_id(id).await
    }

    pub async fn user_by_id(&self, id: i64) -> Result<Option<User>, AuthError> {
        let row: Option<(i64, String, String)> = sqlx::query_as(
            "SELECT id, username, strftime('%Y-%m-%dT%H:%M:%SZ', created_at)
             FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(id, username, created_at)| User {
            id,
            username,
            created_at,
        }))
    }

    // ── Sessions ─────────────────────────────────────────────────────────

    /// Create a new session token for a user (30-day expiry).
    pub async fn create_session(&self, user_id: i64) -> Result<String, AuthError> {
        let token = generate_token();
        sqlx::query(
            "INSERT INTO sessions (token, user_id, expires_at)
             VALUES (?, ?, datetime('now', '+30 days'))",
        )
        .bind(&token)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(token)
    }

    /// Resolve a session token to its user. Returns `None` if the token is
    /// unknown or expired.
    pub async fn session_user(&self, token: &str) -> Result<Option<User>, AuthError> {
        let row: Option<(i64, String, String)> = sqlx::query_as(
            "SELECT u.id, u.username, strftime('%Y-%m-%dT%H:%M:%SZ', u.created_at)
             FROM sessions s JOIN users u ON u.id = s.user_id
             WHERE s.token = ? AND s.expires_at > datetime('now')",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(id, username, created_at)| User {
            id,
            username,
            created_at,
        }))
    }

    /// Delete a session (logout).
    pub async fn delete_session(&self, token: &str) -> Result<(), AuthError> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Clean up expired sessions. Returns the number removed.
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= datetime('now')")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn validate_username(username: &str) -> Result<(), AuthError> {
    if username.is_empty() {
        return Err(AuthError::InvalidUsername("must not be empty"));
    }
    if username.len() > MAX_USERNAME_LEN {
        return Err(AuthError::InvalidUsername("too long"));
    }
    let valid = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));
    if !valid {
        return Err(AuthError::InvalidUsername(
            "only letters, digits and @.+-_ are allowed",
        ));
    }
    Ok(())
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, hash_str: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash_str) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

fn generate_token() -> String {
    use {base64::Engine, rand::RngCore};

    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}
