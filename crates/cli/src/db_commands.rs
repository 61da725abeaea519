use {clap::Subcommand, std::path::PathBuf};

use {
    notarium_auth::UserStore,
    notarium_notes::{SqliteNoteStore, SqliteTaskStore},
};

#[derive(Subcommand)]
pub enum DbAction {
    /// Delete the database file completely.
    Reset,
    /// Clear all data from tables but keep the schema intact.
    Clear,
    /// Create any missing tables and indexes.
    Migrate,
}

/// Path to the SQLite database, honoring the configured override.
fn db_path() -> PathBuf {
    let config = notarium_config::discover_and_load();
    match config.server.database {
        Some(path) => path,
        None => notarium_config::data_dir().join("notarium.db"),
    }
}

pub async fn handle_db(action: DbAction) -> anyhow::Result<()> {
    match action {
        DbAction::Reset => reset_database().await,
        DbAction::Clear => clear_database().await,
        DbAction::Migrate => run_migrations().await,
    }
}

/// Delete the database file completely.
async fn reset_database() -> anyhow::Result<()> {
    let db = db_path();

    let mut deleted = false;

    // Also delete WAL and SHM files that SQLite may have created.
    for suffix in ["", "-wal", "-shm"] {
        let path = if suffix.is_empty() {
            db.clone()
        } else {
            db.with_extension(format!("db{suffix}"))
        };
        if path.exists() {
            std::fs::remove_file(&path)?;
            println!("Deleted: {}", path.display());
            deleted = true;
        }
    }

    if deleted {
        println!("Database deleted. Run `notarium db migrate` to recreate it.");
    } else {
        println!("No database file found.");
    }

    Ok(())
}

/// Clear all data from tables but keep the schema intact.
async fn clear_database() -> anyhow::Result<()> {
    let db = db_path();
    if !db.exists() {
        println!("Database not found: {}", db.display());
        return Ok(());
    }

    let db_url = format!("sqlite:{}?mode=rwc", db.display());
    let pool = sqlx::SqlitePool::connect(&db_url).await?;

    // Order matters due to foreign key constraints.
    // Delete from child tables first.
    let tables = ["task_alerts", "tasks", "sessions", "notes", "users"];

    for table in tables {
        // Use raw query to avoid compile-time checks
        let query = format!("DELETE FROM {table}");
        if let Err(e) = sqlx::query(&query).execute(&pool).await {
            // Table might not exist if migrations haven't run
            eprintln!("Warning: could not clear {table}: {e}");
        } else {
            println!("Cleared table: {table}");
        }
    }

    pool.close().await;
    println!("Database cleared.");
    Ok(())
}

/// Create any missing tables and indexes.
async fn run_migrations() -> anyhow::Result<()> {
    let db = db_path();

    // Ensure data directory exists
    if let Some(parent) = db.parent() {
        std::fs::create_dir_all(parent)?;
    }

    println!("Running migrations...");
    let db_url = format!("sqlite:{}?mode=rwc", db.display());
    let pool = sqlx::SqlitePool::connect(&db_url).await?;

    // Users first: the note and task tables reference it.
    UserStore::new(pool.clone())
        .await
        .map_err(|e| anyhow::anyhow!("user migrations failed: {e}"))?;
    println!("  - users and sessions complete");

    SqliteNoteStore::init(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("notes migrations failed: {e}"))?;
    println!("  - notes complete");

    SqliteTaskStore::init(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("tasks migrations failed: {e}"))?;
    println!("  - tasks complete");

    pool.close().await;

    println!("All migrations complete.");
    Ok(())
}
