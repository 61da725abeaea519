//! `/api/tasks` CRUD and due-soon notifications.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
};

use {
    chrono::{DateTime, Utc},
    notarium_notes::Task,
};

use crate::{error::ApiError, extract::CurrentUser, state::AppState};

/// Tasks due within this many hours show up in notifications.
const NOTIFY_WINDOW_HOURS: u32 = 24;

pub fn task_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_handler).post(create_handler))
        .route("/notifications", get(notifications_handler))
        .route("/{id}", put(update_handler).delete(delete_handler))
}

#[derive(serde::Deserialize)]
struct TaskBody {
    title: String,
    due_date: DateTime<Utc>,
}

async fn list_handler(
    current: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(state.tasks.list(current.user.id).await?))
}

async fn create_handler(
    current: CurrentUser,
    State(state): State<AppState>,
    Json(body): Json<TaskBody>,
) -> Result<Response, ApiError> {
    let title = validated_title(&body.title)?;
    let task = state
        .tasks
        .create(current.user.id, title, body.due_date)
        .await?;
    Ok((StatusCode::CREATED, Json(task)).into_response())
}

async fn update_handler(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<TaskBody>,
) -> Result<Json<Task>, ApiError> {
    let title = validated_title(&body.title)?;
    let task = state
        .tasks
        .update(current.user.id, id, title, body.due_date)
        .await?;
    Ok(Json(task))
}

async fn delete_handler(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.tasks.delete(current.user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Due-soon tasks this session has not been told about yet. Returned
/// tasks are marked, so polling is quiet until a new session starts.
async fn notifications_handler(
    current: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let tasks = state
        .tasks
        .unalerted_due_within(current.user.id, &current.session_token, NOTIFY_WINDOW_HOURS)
        .await?;
    Ok(Json(tasks))
}

fn validated_title(title: &str) -> Result<&str, ApiError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ApiError::BadRequest("title is required".into()));
    }
    Ok(title)
}
