//! HTTP clients for the hosted services.
//!
//! - `GroqClient` talks to an OpenAI-compatible chat-completions endpoint.
//! - `WikipediaClient` searches the MediaWiki action API and summarizes the
//!   top pages.

pub mod groq;
pub mod wikipedia;

pub use groq::{GroqClient, GroqProvider};
pub use wikipedia::WikipediaClient;
