//! HTTP API for notes, tasks, calendar views and the assistant proxy.
//!
//! Routes are assembled in [`server::build_app`] so tests can drive the
//! exact router that production serves. All note and task routes require
//! a session cookie and scope every query to the authenticated user.

pub mod attachment_routes;
pub mod auth_routes;
pub mod calendar_routes;
pub mod chat_routes;
pub mod error;
pub mod extract;
pub mod note_routes;
pub mod server;
pub mod state;
pub mod task_routes;

pub use {
    error::ApiError,
    extract::{CurrentUser, SESSION_COOKIE},
    server::{bootstrap, build_app, start_server},
    state::AppState,
};
