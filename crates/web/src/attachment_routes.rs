//! Attachment upload, download, and removal.
//!
//! Downloads never stream a blob that failed authentication: a corrupt
//! attachment is logged and collapsed into the same 404 as a missing one,
//! so the response never distinguishes "gone" from "undecryptable".

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};

use {notarium_notes::AttachmentPayload, tracing::warn};

use crate::{error::ApiError, extract::CurrentUser, state::AppState};

/// Maximum attachment size: 10 MB.
pub const MAX_ATTACHMENT_SIZE: usize = 10 * 1024 * 1024;

pub fn attachment_router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}/attachment",
            get(download_handler)
                .put(upload_handler)
                .delete(remove_handler),
        )
        .layer(DefaultBodyLimit::max(MAX_ATTACHMENT_SIZE))
}

async fn download_handler(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let note = state.notes.get(current.user.id, id).await?;

    match note.attachment(&state.cipher) {
        AttachmentPayload::Missing => Err(ApiError::NotFound),
        AttachmentPayload::Failed => {
            warn!(note_id = id, "attachment failed to decrypt");
            Err(ApiError::NotFound)
        },
        AttachmentPayload::File { name, bytes } => {
            let headers = [
                (header::CONTENT_TYPE, content_type_for(&name).to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("inline; filename=\"{name}\""),
                ),
            ];
            Ok((headers, bytes).into_response())
        },
    }
}

async fn upload_handler(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("empty body".into()));
    }
    if body.len() > MAX_ATTACHMENT_SIZE {
        return Err(ApiError::PayloadTooLarge);
    }

    let Some(name) = headers.get("x-filename").and_then(|v| v.to_str().ok()) else {
        return Err(ApiError::BadRequest("missing X-Filename header".into()));
    };
    let name = sanitize_filename(name);

    let mut note = state.notes.get(current.user.id, id).await?;
    note.set_attachment(&state.cipher, Some((&name, &body)))?;
    state.notes.update(&note).await?;

    Ok(Json(serde_json::json!({
        "ok": true,
        "attachment_name": name,
        "size": body.len(),
    })))
}

async fn remove_handler(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let mut note = state.notes.get(current.user.id, id).await?;
    note.set_attachment(&state.cipher, None)?;
    state.notes.update(&note).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Sanitize a user-provided filename: keep only safe characters.
fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_' || *c == '.')
        .collect();
    // Strip leading dots to prevent hidden files / path traversal remnants.
    let sanitized = sanitized.trim_start_matches('.');
    if sanitized.is_empty() {
        "upload".to_string()
    } else {
        sanitized.to_string()
    }
}

/// Content type from the filename extension.
fn content_type_for(filename: &str) -> &'static str {
    let ext = filename.rsplit('.').next().unwrap_or("");
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "txt" => "text/plain; charset=utf-8",
        "md" => "text/markdown; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_unsafe_characters() {
        assert_eq!(sanitize_filename("cat.jpg"), "cat.jpg");
        assert_eq!(sanitize_filename("my file (1).pdf"), "myfile1.pdf");
        assert_eq!(sanitize_filename("../../../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_filename(""), "upload");
        assert_eq!(sanitize_filename("hello-world_2.png"), "hello-world_2.png");
    }

    #[test]
    fn content_type_from_extension() {
        assert_eq!(content_type_for("cat.jpg"), "image/jpeg");
        assert_eq!(content_type_for("cat.JPEG"), "image/jpeg");
        assert_eq!(content_type_for("chart.png"), "image/png");
        assert_eq!(content_type_for("report.pdf"), "application/pdf");
        assert_eq!(content_type_for("readme"), "application/octet-stream");
        assert_eq!(content_type_for("archive.zip"), "application/octet-stream");
    }
}
