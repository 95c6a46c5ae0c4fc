//! Conversational core for Sage.
//!
//! Routes a question to the math, lookup, or reasoning handler, keeps the
//! per-session transcript, and owns the adapters for the hosted completion
//! and encyclopedia services.

pub mod capability;
pub mod classifier;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod orchestrator;
pub mod providers;
pub mod transcript;

pub use capability::{CompletionProvider, CompletionService, SearchService};
pub use classifier::QueryClassifier;
pub use dispatcher::{Dispatcher, Reply};
pub use error::ChatError;
pub use handlers::{FactLookup, HandlerSet, MathSolver, ReasoningSolver};
pub use orchestrator::{ChatOrchestrator, SessionSummary};
pub use providers::{GroqClient, GroqProvider, WikipediaClient};
pub use transcript::{ConversationLog, TranscriptEntry};
