//! Sage API crate - axum HTTP server for the chat page and session API.
//!
//! Serves the single-page chat UI, session lifecycle endpoints, turn
//! submission, and a health check.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod ui;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
