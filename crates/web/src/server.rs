//! Router assembly and server startup.

use {
    anyhow::Context,
    axum::{Router, response::Json, routing::get},
    secrecy::ExposeSecret,
    tower_http::{
        cors::{Any, CorsLayer},
        limit::RequestBodyLimitLayer,
        trace::TraceLayer,
    },
    tracing::info,
};

use {
    notarium_chat::AssistantClient,
    notarium_config::NotariumConfig,
    notarium_vault::{CipherKey, NoteCipher},
};

use crate::{
    attachment_routes::{MAX_ATTACHMENT_SIZE, attachment_router},
    auth_routes::auth_router,
    calendar_routes::calendar_router,
    chat_routes::chat_router,
    note_routes::note_router,
    state::AppState,
    task_routes::task_router,
};

/// Build the full router (shared between production startup and tests).
pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api/auth", auth_router())
        .nest("/api/notes", note_router().merge(attachment_router()))
        .nest("/api/tasks", task_router())
        .nest("/api/calendar", calendar_router())
        .nest("/api/chat", chat_router())
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(MAX_ATTACHMENT_SIZE + 1024))
        .layer(cors)
        .with_state(state)
}

/// Build state from config: vault key, database, stores, assistant.
///
/// A missing or malformed vault key is fatal here, before anything binds
/// or touches the database.
pub async fn bootstrap(config: &NotariumConfig) -> anyhow::Result<AppState> {
    let key = match &config.vault.key {
        Some(secret) => CipherKey::from_base64(secret.expose_secret())
            .context("invalid vault key (expected 32 bytes, base64url)")?,
        None => anyhow::bail!(
            "vault key is not configured; run `notarium keygen` and set NOTARIUM_VAULT_KEY \
             or the [vault] key in notarium.toml"
        ),
    };
    let cipher = NoteCipher::new(key);
    let assistant = AssistantClient::from_config(&config.assistant);

    let db_path = match &config.server.database {
        Some(path) => path.clone(),
        None => {
            let dir = notarium_config::data_dir();
            std::fs::create_dir_all(&dir).ok();
            dir.join("notarium.db")
        },
    };
    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
    let pool = sqlx::SqlitePool::connect(&db_url)
        .await
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;

    AppState::init(pool, cipher, assistant).await
}

/// Start the HTTP server. Blocks until shutdown.
pub async fn start_server(bind: &str, port: u16) -> anyhow::Result<()> {
    let config = notarium_config::discover_and_load();
    let state = bootstrap(&config).await?;
    let app = build_app(state);

    let addr = format!("{bind}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "notarium listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
