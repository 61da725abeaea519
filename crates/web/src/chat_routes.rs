//! `/api/chat`: assistant conversations, optionally grounded in one note,
//! and saving an exchange back as an encrypted note.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};

use notarium_notes::Note;

use crate::{error::ApiError, extract::CurrentUser, state::AppState};

pub fn chat_router() -> Router<AppState> {
    Router::new()
        .route("/", post(chat_handler))
        .route("/save", post(save_handler))
}

#[derive(serde::Deserialize)]
struct ChatRequest {
    prompt: String,
    note_id: Option<i64>,
}

async fn chat_handler(
    current: CurrentUser,
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let prompt = body.prompt.trim();
    if prompt.is_empty() {
        return Err(ApiError::BadRequest("prompt is required".into()));
    }

    // Resolving the note before the upstream call keeps the 404 ahead of
    // any assistant traffic.
    let note_context = match body.note_id {
        Some(id) => {
            let note = state.notes.get(current.user.id, id).await?;
            Some(note.content(&state.cipher).into_display_string())
        },
        None => None,
    };

    let reply = state
        .assistant
        .reply(prompt, note_context.as_deref())
        .await?;
    Ok(Json(serde_json::json!({ "reply": reply })))
}

#[derive(serde::Deserialize)]
struct SaveChatRequest {
    prompt: String,
    reply: String,
}

/// Persist a chat exchange as a new note. The body goes through the same
/// encrypted-write path as any other note.
async fn save_handler(
    current: CurrentUser,
    State(state): State<AppState>,
    Json(body): Json<SaveChatRequest>,
) -> Result<Response, ApiError> {
    let content = format!("**You:** {}\n\n**Assistant:** {}", body.prompt, body.reply);
    let note = Note::compose(
        &state.cipher,
        current.user.id,
        title_from_prompt(&body.prompt),
        &content,
    );
    let saved = state.notes.insert(&note).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": saved.id, "title": saved.title })),
    )
        .into_response())
}

/// Title a saved exchange from the prompt's first words.
fn title_from_prompt(prompt: &str) -> String {
    let title: Vec<&str> = prompt.split_whitespace().take(6).collect();
    if title.is_empty() {
        "Chat note".to_string()
    } else {
        title.join(" ")
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_come_from_leading_words() {
        assert_eq!(
            title_from_prompt("what should I cook tonight with leftover rice"),
            "what should I cook tonight with"
        );
        assert_eq!(title_from_prompt("hello"), "hello");
        assert_eq!(title_from_prompt("   "), "Chat note");
        assert_eq!(title_from_prompt(""), "Chat note");
    }
}
