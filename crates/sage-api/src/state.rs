//! Application state shared across all route handlers.
//!
//! AppState is passed to handlers via axum's State extractor.

use std::sync::Arc;
use std::time::Instant;

use sage_chat::ChatOrchestrator;
use sage_core::config::SageConfig;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration, read-only after startup.
    pub config: Arc<SageConfig>,
    /// Session registry and turn runner.
    pub orchestrator: Arc<ChatOrchestrator>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: SageConfig, orchestrator: ChatOrchestrator) -> Self {
        Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            start_time: Instant::now(),
        }
    }
}
