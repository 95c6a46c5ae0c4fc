//! One question/answer turn: classify, solve, record.

use serde::Serialize;
use tracing::{info, warn};

use sage_core::types::Category;

use crate::classifier::QueryClassifier;
use crate::error::ChatError;
use crate::handlers::HandlerSet;
use crate::transcript::{ConversationLog, TranscriptEntry};

/// Outcome of a successful turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    /// Route the question took.
    pub category: Category,
    /// Handler output, unmodified.
    pub answer: String,
}

/// Routes questions to handlers and records the exchange in a caller-owned log.
///
/// The dispatcher holds no session state; the [`ConversationLog`] is passed in
/// for each turn.
#[derive(Clone)]
pub struct Dispatcher {
    classifier: QueryClassifier,
    handlers: HandlerSet,
}

impl Dispatcher {
    pub fn new(classifier: QueryClassifier, handlers: HandlerSet) -> Self {
        Self {
            classifier,
            handlers,
        }
    }

    pub fn classifier(&self) -> &QueryClassifier {
        &self.classifier
    }

    /// Handle one turn.
    ///
    /// A blank question is rejected before the log is touched. Otherwise the
    /// user entry is appended first; the assistant entry is appended only once
    /// the handler succeeds, so a failed turn leaves exactly one new entry.
    pub async fn handle_turn(
        &self,
        question: &str,
        log: &mut ConversationLog,
    ) -> Result<Reply, ChatError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ChatError::InvalidInput(
                "question must not be empty".to_string(),
            ));
        }

        log.append(TranscriptEntry::user(question));

        let category = self.classifier.classify(question);
        info!(%category, question_len = question.len(), "Routing question");

        let answer = match self.handlers.solve(category, question).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(%category, error = %e, "Handler failed");
                return Err(e);
            }
        };

        log.append(TranscriptEntry::assistant(answer.clone()));

        Ok(Reply { category, answer })
    }
}
