//! User accounts and session tokens.
//!
//! Passwords are hashed with Argon2id. Sessions are 32 random bytes,
//! base64url-encoded, stored server-side with a 30-day expiry; the HTTP
//! layer carries them in a cookie. Every note and task row is scoped to a
//! user id resolved through [`UserStore::session_user`].

pub mod error;
pub mod store;

pub use {
    error::{AuthError, MIN_PASSWORD_LEN},
    store::{SESSION_TTL_DAYS, User, UserStore},
};
