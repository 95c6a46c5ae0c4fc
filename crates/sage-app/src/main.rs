//! Sage application binary - composition root.
//!
//! 1. Parse CLI flags and load configuration from TOML
//! 2. Build the completion provider and encyclopedia client
//! 3. Build the chat orchestrator
//! 4. Start the axum server for the chat page and session API

mod cli;

use std::sync::Arc;

use clap::Parser;

use sage_api::routes;
use sage_api::state::AppState;
use sage_chat::{ChatOrchestrator, GroqProvider, WikipediaClient};

use cli::CliArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let (config_file, mut config) = args.load_config()?;
    config.general.port = args.resolve_port(config.general.port);
    config.general.log_level = args.resolve_log_level(&config.general.log_level);

    // Tracing. RUST_LOG takes precedence over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting Sage v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // Services.
    let completion = Arc::new(GroqProvider::new(config.llm.clone()));
    let search = Arc::new(WikipediaClient::new(&config.search));
    tracing::info!(
        model = %config.llm.model,
        search = %config.search.endpoint(),
        "External services configured"
    );

    let default_key = args.resolve_api_key(&config.llm.api_key_env);
    if default_key.is_none() {
        tracing::info!(
            env = %config.llm.api_key_env,
            "No default API key; the page will ask for one"
        );
    }

    let orchestrator = ChatOrchestrator::new(config.chat.clone(), completion, search)
        .with_default_api_key(default_key);

    // === API server ===

    let state = AppState::new(config.clone(), orchestrator);
    tracing::info!("Chat page at http://127.0.0.1:{}/", config.general.port);

    if let Err(e) = routes::start_server(&config, state).await {
        tracing::error!(port = config.general.port, error = %e, "Server stopped");
        return Err(e.into());
    }

    Ok(())
}
