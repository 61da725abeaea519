//! Session extraction.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use notarium_auth::User;

use crate::{error::ApiError, state::AppState};

/// Session cookie name.
pub const SESSION_COOKIE: &str = "notarium_session";

/// Axum extractor that validates the session cookie and resolves the
/// requesting user. Missing, unknown, or expired sessions are 401.
pub struct CurrentUser {
    pub user: User,
    /// The raw session token, used as the notification de-dup key.
    pub session_token: String,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookie_header = parts
            .headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        let Some(token) = parse_cookie(cookie_header, SESSION_COOKIE) else {
            return Err(ApiError::Unauthorized);
        };

        match state.users.session_user(token).await {
            Ok(Some(user)) => Ok(CurrentUser {
                user,
                session_token: token.to_string(),
            }),
            Ok(None) => Err(ApiError::Unauthorized),
            Err(err) => {
                tracing::error!(error = %err, "session lookup failed");
                Err(ApiError::Unauthorized)
            },
        }
    }
}

/// Parse a specific cookie value from a Cookie header string.
pub fn parse_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    for part in header.split(';') {
        let part = part.trim();
        if let Some(value) = part.strip_prefix(name)
            && let Some(value) = value.strip_prefix('=')
        {
            return Some(value);
        }
    }
    None
}
