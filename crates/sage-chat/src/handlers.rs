//! The three question handlers.
//!
//! Each handler makes exactly one outbound call per question and returns the
//! service's text untouched. Failures come back as
//! [`ChatError::ExternalService`] and are not retried or reworded here.

use std::sync::Arc;

use sage_core::types::Category;

use crate::capability::{CompletionService, SearchService};
use crate::error::ChatError;

/// Prompt for math questions. `{question}` is replaced verbatim.
pub const MATH_TEMPLATE: &str = "
Solve the following math problem step by step and return only the final answer.

Question:
{question}

Answer:
";

/// Prompt for open-ended questions. `{question}` is replaced verbatim.
pub const REASONING_TEMPLATE: &str = "
You are an expert reasoning assistant.

Solve the user's question step by step and provide a clear,
point-wise explanation.

Question:
{question}

Answer:
";

/// Fill a template's `{question}` slot.
pub fn render(template: &str, question: &str) -> String {
    template.replace("{question}", question)
}

// =============================================================================
// Handlers
// =============================================================================

/// Answers math questions through the completion model.
///
/// No arithmetic happens locally; the answer is whatever the model returns.
#[derive(Clone)]
pub struct MathSolver {
    completion: Arc<dyn CompletionService>,
}

impl MathSolver {
    pub fn new(completion: Arc<dyn CompletionService>) -> Self {
        Self { completion }
    }

    pub async fn solve(&self, question: &str) -> Result<String, ChatError> {
        self.completion
            .complete(&render(MATH_TEMPLATE, question))
            .await
    }
}

/// Answers open-ended questions with a point-wise explanation.
#[derive(Clone)]
pub struct ReasoningSolver {
    completion: Arc<dyn CompletionService>,
}

impl ReasoningSolver {
    pub fn new(completion: Arc<dyn CompletionService>) -> Self {
        Self { completion }
    }

    pub async fn solve(&self, question: &str) -> Result<String, ChatError> {
        self.completion
            .complete(&render(REASONING_TEMPLATE, question))
            .await
    }
}

/// Answers factual questions from the encyclopedia.
#[derive(Clone)]
pub struct FactLookup {
    search: Arc<dyn SearchService>,
}

impl FactLookup {
    pub fn new(search: Arc<dyn SearchService>) -> Self {
        Self { search }
    }

    /// Forwards the question as the search query, unmodified.
    pub async fn solve(&self, question: &str) -> Result<String, ChatError> {
        self.search.search(question).await
    }
}

// =============================================================================
// HandlerSet
// =============================================================================

/// One handler per [`Category`].
#[derive(Clone)]
pub struct HandlerSet {
    pub math: MathSolver,
    pub lookup: FactLookup,
    pub reasoning: ReasoningSolver,
}

impl HandlerSet {
    pub fn new(math: MathSolver, lookup: FactLookup, reasoning: ReasoningSolver) -> Self {
        Self {
            math,
            lookup,
            reasoning,
        }
    }

    /// Wire all three handlers from one completion and one search service.
    pub fn from_services(
        completion: Arc<dyn CompletionService>,
        search: Arc<dyn SearchService>,
    ) -> Self {
        Self::new(
            MathSolver::new(Arc::clone(&completion)),
            FactLookup::new(search),
            ReasoningSolver::new(completion),
        )
    }

    /// Run the handler for `category`. Exactly one handler is invoked.
    pub async fn solve(&self, category: Category, question: &str) -> Result<String, ChatError> {
        match category {
            Category::Math => self.math.solve(question).await,
            Category::Lookup => self.lookup.solve(question).await,
            Category::Reasoning => self.reasoning.solve(question).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every prompt and replies with a fixed string.
    struct RecordingCompletion {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl RecordingCompletion {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionService for RecordingCompletion {
        async fn complete(&self, prompt: &str) -> Result<String, ChatError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    struct RecordingSearch {
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SearchService for RecordingSearch {
        async fn search(&self, query: &str) -> Result<String, ChatError> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(format!("Page: {}\nSummary: stub", query))
        }
    }

    struct FailingCompletion;

    #[async_trait]
    impl CompletionService for FailingCompletion {
        async fn complete(&self, _prompt: &str) -> Result<String, ChatError> {
            Err(ChatError::external("completion", "rate limited"))
        }
    }

    fn recording_search() -> Arc<RecordingSearch> {
        Arc::new(RecordingSearch {
            queries: Mutex::new(Vec::new()),
        })
    }

    #[test]
    fn test_render_substitutes_question() {
        let prompt = render(MATH_TEMPLATE, "2+2");
        assert!(prompt.contains("Question:\n2+2\n"));
        assert!(!prompt.contains("{question}"));
    }

    #[tokio::test]
    async fn test_math_solver_uses_math_template() {
        let completion = RecordingCompletion::new("4");
        let solver = MathSolver::new(completion.clone());
        let answer = solver.solve("Calculate 2+2").await.unwrap();

        assert_eq!(answer, "4");
        let prompts = completion.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("return only the final answer"));
        assert!(prompts[0].contains("Calculate 2+2"));
    }

    #[tokio::test]
    async fn test_reasoning_solver_uses_reasoning_template() {
        let completion = RecordingCompletion::new("1. Mass bends spacetime");
        let solver = ReasoningSolver::new(completion.clone());
        let answer = solver.solve("Explain how gravity works").await.unwrap();

        assert_eq!(answer, "1. Mass bends spacetime");
        let prompts = completion.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("expert reasoning assistant"));
        assert!(prompts[0].contains("point-wise explanation"));
        assert!(!prompts[0].contains("return only the final answer"));
    }

    #[tokio::test]
    async fn test_fact_lookup_forwards_question_verbatim() {
        let search = recording_search();
        let lookup = FactLookup::new(search.clone());
        let answer = lookup.solve("Who wrote Dune?").await.unwrap();

        assert_eq!(answer, "Page: Who wrote Dune?\nSummary: stub");
        assert_eq!(*search.queries.lock().unwrap(), vec!["Who wrote Dune?"]);
    }

    #[tokio::test]
    async fn test_solver_propagates_external_error() {
        let solver = MathSolver::new(Arc::new(FailingCompletion));
        let err = solver.solve("1+1").await.unwrap_err();
        assert!(matches!(err, ChatError::ExternalService { .. }));
    }

    #[tokio::test]
    async fn test_handler_set_invokes_exactly_one_handler() {
        let completion = RecordingCompletion::new("done");
        let search = recording_search();
        let set = HandlerSet::from_services(completion.clone(), search.clone());

        set.solve(Category::Lookup, "When was Rust released?")
            .await
            .unwrap();
        assert!(completion.prompts().is_empty());
        assert_eq!(search.queries.lock().unwrap().len(), 1);

        set.solve(Category::Math, "3*3").await.unwrap();
        set.solve(Category::Reasoning, "Why?").await.unwrap();
        let prompts = completion.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("math problem"));
        assert!(prompts[1].contains("reasoning assistant"));
        assert_eq!(search.queries.lock().unwrap().len(), 1);
    }
}
