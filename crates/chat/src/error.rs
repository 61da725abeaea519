//! Assistant error types.

/// Errors produced by assistant requests.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// No API key is configured.
    #[error("assistant is not configured")]
    NotConfigured,

    /// The upstream API was unreachable or answered with an error status.
    #[error("assistant request failed: {0}")]
    Upstream(String),

    /// The upstream answered 2xx but without usable completion text.
    #[error("assistant returned an unusable response")]
    InvalidResponse,
}
