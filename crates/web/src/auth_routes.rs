//! `/api/auth/*` routes: register, login, logout, whoami.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};

use notarium_auth::User;

use crate::{
    error::ApiError,
    extract::{CurrentUser, SESSION_COOKIE, parse_cookie},
    state::AppState,
};

/// Session cookie lifetime in seconds (30 days, matching the stored expiry).
const COOKIE_MAX_AGE_SECS: u64 = 30 * 24 * 60 * 60;

pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
        .route("/me", get(me_handler))
}

#[derive(serde::Deserialize)]
struct CredentialsRequest {
    username: String,
    password: String,
}

async fn register_handler(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> Result<Response, ApiError> {
    let user = state
        .users
        .create_user(body.username.trim(), &body.password)
        .await?;
    let token = state.users.create_session(user.id).await?;
    Ok(session_response(StatusCode::CREATED, &user, &token))
}

async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> Result<Response, ApiError> {
    let Some(user) = state
        .users
        .verify_credentials(body.username.trim(), &body.password)
        .await?
    else {
        return Err(ApiError::Unauthorized);
    };
    let token = state.users.create_session(user.id).await?;
    Ok(session_response(StatusCode::OK, &user, &token))
}

/// Logout is best-effort: an absent or stale cookie still gets the
/// clearing response.
async fn logout_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let cookie_header = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if let Some(token) = parse_cookie(cookie_header, SESSION_COOKIE) {
        let _ = state.users.delete_session(token).await;
    }
    clear_session_response()
}

async fn me_handler(current: CurrentUser) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "id": current.user.id,
        "username": current.user.username,
    }))
}

fn session_response(status: StatusCode, user: &User, token: &str) -> Response {
    let cookie = format!(
        "{SESSION_COOKIE}={token}; HttpOnly; SameSite=Strict; Path=/; Max-Age={COOKIE_MAX_AGE_SECS}"
    );
    (
        status,
        [(header::SET_COOKIE, cookie)],
        Json(serde_json::json!({ "id": user.id, "username": user.username })),
    )
        .into_response()
}

fn clear_session_response() -> Response {
    let cookie = format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0");
    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(serde_json::json!({ "ok": true })),
    )
        .into_response()
}
