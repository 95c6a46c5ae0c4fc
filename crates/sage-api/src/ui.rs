//! The chat page.
//!
//! A single self-contained HTML file with inline CSS and JavaScript,
//! embedded at compile time via `include_str!`. It talks to the session
//! endpoints on the same origin: it opens a session when a key is entered,
//! posts each question, and re-renders the transcript from the response.

/// The complete self-contained chat page.
pub const INDEX_HTML: &str = include_str!("../assets/index.html");
