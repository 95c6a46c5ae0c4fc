//! Traits for the hosted services the handlers delegate to.
//!
//! The handlers only see these traits, so tests swap in stubs and the
//! binary wires in the HTTP clients from [`crate::providers`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ChatError;

/// A hosted text-completion model.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Send one prompt and return the completion text.
    ///
    /// Fails with [`ChatError::ExternalService`] on network, auth, quota, or
    /// response-shape problems.
    async fn complete(&self, prompt: &str) -> Result<String, ChatError>;
}

/// A hosted encyclopedia search.
#[async_trait]
pub trait SearchService: Send + Sync {
    /// Search and return a best-effort text summary.
    async fn search(&self, query: &str) -> Result<String, ChatError>;
}

/// Binds a caller-supplied credential into a ready completion client.
///
/// Each session gets its own bound client; credentials are never shared
/// across sessions.
pub trait CompletionProvider: Send + Sync {
    fn bind(&self, api_key: &str) -> Result<Arc<dyn CompletionService>, ChatError>;
}
