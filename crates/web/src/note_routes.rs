//! `/api/notes` CRUD and listing routes.
//!
//! Bodies are decrypted only in the single-note view; list views return
//! clear metadata and never touch the cipher.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use notarium_notes::{Note, NotePage, NoteSummary};

use crate::{error::ApiError, extract::CurrentUser, state::AppState};

pub fn note_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_handler).post(create_handler))
        .route("/files", get(files_handler))
        .route(
            "/{id}",
            get(get_handler).put(update_handler).delete(delete_handler),
        )
}

#[derive(serde::Deserialize)]
struct ListQuery {
    page: Option<u32>,
    q: Option<String>,
}

#[derive(serde::Deserialize)]
struct NoteBody {
    title: String,
    content: String,
}

/// Full single-note view. `content` is the decrypted body (or the failure
/// sentinel); `content_html` is its Markdown rendering.
#[derive(serde::Serialize)]
struct NoteResponse {
    id: i64,
    title: String,
    content: String,
    content_html: String,
    has_attachment: bool,
    attachment_name: Option<String>,
    created_at: String,
}

fn note_response(note: &Note, state: &AppState) -> NoteResponse {
    let content = note.content(&state.cipher).into_display_string();
    let content_html = markdown_to_html(&content);
    NoteResponse {
        id: note.id,
        title: note.title.clone(),
        content,
        content_html,
        has_attachment: note.has_attachment(),
        attachment_name: note.attachment_name().map(str::to_string),
        created_at: note.created_at.clone(),
    }
}

async fn list_handler(
    current: CurrentUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<NotePage>, ApiError> {
    let page = state
        .notes
        .page(
            current.user.id,
            query.q.as_deref(),
            query.page.unwrap_or(1),
        )
        .await?;
    Ok(Json(page))
}

async fn create_handler(
    current: CurrentUser,
    State(state): State<AppState>,
    Json(body): Json<NoteBody>,
) -> Result<Response, ApiError> {
    let title = validated_title(&body.title)?;
    let note = Note::compose(&state.cipher, current.user.id, title, &body.content);
    let saved = state.notes.insert(&note).await?;
    Ok((StatusCode::CREATED, Json(note_response(&saved, &state))).into_response())
}

async fn get_handler(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<NoteResponse>, ApiError> {
    let note = state.notes.get(current.user.id, id).await?;
    Ok(Json(note_response(&note, &state)))
}

async fn update_handler(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<NoteBody>,
) -> Result<Json<NoteResponse>, ApiError> {
    let title = validated_title(&body.title)?;
    let mut note = state.notes.get(current.user.id, id).await?;
    note.title = title.to_string();
    note.set_content(&state.cipher, &body.content);
    state.notes.update(&note).await?;
    Ok(Json(note_response(&note, &state)))
}

async fn delete_handler(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.notes.delete(current.user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn files_handler(
    current: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<NoteSummary>>, ApiError> {
    Ok(Json(state.notes.with_attachments(current.user.id).await?))
}

fn validated_title(title: &str) -> Result<&str, ApiError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ApiError::BadRequest("title is required".into()));
    }
    Ok(title)
}

/// Convert Markdown to HTML using pulldown-cmark.
pub(crate) fn markdown_to_html(md: &str) -> String {
    use pulldown_cmark::{Options, Parser, html};
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts.insert(Options::ENABLE_TABLES);
    opts.insert(Options::ENABLE_TASKLISTS);
    let parser = Parser::new_ext(md, opts);
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);
    html_output
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_renders_basic_structure() {
        let html = markdown_to_html("# Title\n\nsome *emphasis* and ~~strike~~");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<em>emphasis</em>"));
        assert!(html.contains("<del>strike</del>"));
    }

    #[test]
    fn markdown_of_empty_string_is_empty() {
        assert_eq!(markdown_to_html(""), "");
    }
}
