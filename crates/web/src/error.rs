//! HTTP error mapping.
//!
//! Domain errors from the stores, auth, and the assistant all funnel into
//! one [`ApiError`] so every handler returns the same JSON error shape.
//! Ownership misses stay 404 here; nothing maps to 403.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use {notarium_auth::AuthError, notarium_chat::ChatError, notarium_notes::StoreError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found")]
    NotFound,

    #[error("not authenticated")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("request body too large")]
    PayloadTooLarge,

    #[error("assistant is not configured")]
    AssistantUnavailable,

    #[error("assistant request failed")]
    AssistantFailed,

    #[error("internal error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::AssistantUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::AssistantFailed => StatusCode::BAD_GATEWAY,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(serde_json::json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound,
            StoreError::InvalidDate(msg) => Self::BadRequest(format!("invalid date: {msg}")),
            StoreError::Database(err) => {
                tracing::error!(error = %err, "database error");
                Self::Internal
            },
            StoreError::Vault(err) => {
                tracing::error!(error = %err, "vault error");
                Self::Internal
            },
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::UsernameTaken
            | AuthError::InvalidUsername(_)
            | AuthError::PasswordTooShort => Self::BadRequest(err.to_string()),
            AuthError::Hash(msg) => {
                tracing::error!(error = %msg, "password hashing error");
                Self::Internal
            },
            AuthError::Database(err) => {
                tracing::error!(error = %err, "database error");
                Self::Internal
            },
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::NotConfigured => Self::AssistantUnavailable,
            ChatError::Upstream(msg) => {
                tracing::warn!(error = %msg, "assistant upstream failure");
                Self::AssistantFailed
            },
            ChatError::InvalidResponse => Self::AssistantFailed,
        }
    }
}

impl From<notarium_vault::VaultError> for ApiError {
    fn from(err: notarium_vault::VaultError) -> Self {
        tracing::error!(error = %err, "vault error");
        Self::Internal
    }
}
