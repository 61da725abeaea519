//! Tasks with due dates, plus the per-session ledger of which due-soon
//! alerts have already been delivered.

use {
    chrono::{DateTime, NaiveDate, NaiveDateTime, Utc},
    sqlx::SqlitePool,
};

use crate::error::StoreError;

/// Storage format for due dates. Matches SQLite's `datetime('now')` output
/// so range queries compare lexicographically.
const DUE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One user-owned task. Tasks are plain metadata, nothing here is encrypted.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Task {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub due_date: DateTime<Utc>,
    pub created_at: String,
}

/// Stores tasks in a SQLite database.
pub struct SqliteTaskStore {
    pool: SqlitePool,
}

impl SqliteTaskStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the tasks and alert-ledger schema.
    pub async fn init(pool: &SqlitePool) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS tasks (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                title      TEXT    NOT NULL,
                due_date   TEXT    NOT NULL,
                created_at TEXT    NOT NULL DEFAULT (datetime('now'))
            )",
        )
        .execute(pool)
        .await?;

        // Keyed by session so a fresh login re-alerts, while polling within
        // one session stays quiet after the first delivery.
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS task_alerts (
                session_token TEXT    NOT NULL,
                task_id       INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
                alerted_at    TEXT    NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (session_token, task_id)
            )",
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_tasks_user_due ON tasks(user_id, due_date)")
            .execute(pool)
            .await
            .ok();

        Ok(())
    }

    pub async fn create(
        &self,
        user_id: i64,
        title: &str,
        due: DateTime<Utc>,
    ) -> Result<Task, StoreError> {
        let result = sqlx::query("INSERT INTO tasks (user_id, title, due_date) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(title)
            .bind(due.format(DUE_FORMAT).to_string())
            .execute(&self.pool)
            .await?;
        self.get(user_id, result.last_insert_rowid()).await
    }

    pub async fn get(&self, user_id: i64, id: i64) -> Result<Task, StoreError> {
        let row: Option<TaskRow> = sqlx::query_as(
            "SELECT id, user_id, title, due_date,
                    strftime('%Y-%m-%dT%H:%M:%SZ', created_at) AS created_at
             FROM tasks WHERE id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or(StoreError::NotFound)?.try_into()
    }

    pub async fn update(
        &self,
        user_id: i64,
        id: i64,
        title: &str,
        due: DateTime<Utc>,
    ) -> Result<Task, StoreError> {
        let result = sqlx::query("UPDATE tasks SET title = ?, due_date = ? WHERE id = ? AND user_id = ?")
            .bind(title)
            .bind(due.format(DUE_FORMAT).to_string())
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        self.get(user_id, id).await
    }

    pub async fn delete(&self, user_id: i64, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// All of the user's tasks, soonest due first.
    pub async fn list(&self, user_id: i64) -> Result<Vec<Task>, StoreError> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            "SELECT id, user_id, title, due_date,
                    strftime('%Y-%m-%dT%H:%M:%SZ', created_at) AS created_at
             FROM tasks WHERE user_id = ?
             ORDER BY due_date ASC, id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        collect_tasks(rows)
    }

    /// Tasks due in the given calendar month (UTC).
    pub async fn due_in_month(
        &self,
        user_id: i64,
        year: i32,
        month: u32,
    ) -> Result<Vec<Task>, StoreError> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            "SELECT id, user_id, title, due_date,
                    strftime('%Y-%m-%dT%H:%M:%SZ', created_at) AS created_at
             FROM tasks WHERE user_id = ? AND strftime('%Y-%m', due_date) = ?
             ORDER BY due_date ASC, id ASC",
        )
        .bind(user_id)
        .bind(format!("{year:04}-{month:02}"))
        .fetch_all(&self.pool)
        .await?;
        collect_tasks(rows)
    }

    /// Tasks due on one calendar day (UTC).
    pub async fn due_on_day(&self, user_id: i64, day: NaiveDate) -> Result<Vec<Task>, StoreError> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            "SELECT id, user_id, title, due_date,
                    strftime('%Y-%m-%dT%H:%M:%SZ', created_at) AS created_at
             FROM tasks WHERE user_id = ? AND date(due_date) = ?
             ORDER BY due_date ASC, id ASC",
        )
        .bind(user_id)
        .bind(day.format("%Y-%m-%d").to_string())
        .fetch_all(&self.pool)
        .await?;
        collect_tasks(rows)
    }

    /// Tasks due between now and `hours` from now.
    pub async fn due_within(&self, user_id: i64, hours: u32) -> Result<Vec<Task>, StoreError> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            "SELECT id, user_id, title, due_date,
                    strftime('%Y-%m-%dT%H:%M:%SZ', created_at) AS created_at
             FROM tasks
             WHERE user_id = ? AND due_date >= datetime('now') AND due_date <= datetime('now', ?)
             ORDER BY due_date ASC, id ASC",
        )
        .bind(user_id)
        .bind(format!("+{hours} hours"))
        .fetch_all(&self.pool)
        .await?;
        collect_tasks(rows)
    }

    /// Tasks due within the window that this session has not been alerted
    /// about yet. Returned tasks are marked immediately, so a second poll
    /// from the same session comes back empty.
    pub async fn unalerted_due_within(
        &self,
        user_id: i64,
        session_token: &str,
        hours: u32,
    ) -> Result<Vec<Task>, StoreError> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            "SELECT t.id, t.user_id, t.title, t.due_date,
                    strftime('%Y-%m-%dT%H:%M:%SZ', t.created_at) AS created_at
             FROM tasks t
             WHERE t.user_id = ?
               AND t.due_date >= datetime('now')
               AND t.due_date <= datetime('now', ?)
               AND NOT EXISTS (
                   SELECT 1 FROM task_alerts a
                   WHERE a.task_id = t.id AND a.session_token = ?
               )
             ORDER BY t.due_date ASC, t.id ASC",
        )
        .bind(user_id)
        .bind(format!("+{hours} hours"))
        .bind(session_token)
        .fetch_all(&self.pool)
        .await?;

        let tasks = collect_tasks(rows)?;
        for task in &tasks {
            sqlx::query(
                "INSERT OR IGNORE INTO task_alerts (session_token, task_id) VALUES (?, ?)",
            )
            .bind(session_token)
            .bind(task.id)
            .execute(&self.pool)
            .await?;
        }
        Ok(tasks)
    }
}

fn collect_tasks(rows: Vec<TaskRow>) -> Result<Vec<Task>, StoreError> {
    rows.into_iter().map(Task::try_from).collect()
}

fn parse_due(s: &str) -> Result<DateTime<Utc>, StoreError> {
    NaiveDateTime::parse_from_str(s, DUE_FORMAT)
        .map(|dt| dt.and_utc())
        .map_err(|err| StoreError::InvalidDate(err.to_string()))
}

/// Internal row type for sqlx mapping.
#[derive(sqlx::FromRow)]
struct TaskRow {
    id: i64,
    user_id: i64,
    title: String,
    due_date: String,
    created_at: String,
}

impl TryFrom<TaskRow> for Task {
    type Error = StoreError;

    fn try_from(r: TaskRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            title: r.title,
            due_date: parse_due(&r.due_date)?,
            created_at: r.created_at,
        })
    }
}
