//! Keyword router.
//!
//! Assigns every question exactly one [`Category`] by walking an ordered
//! table of [`KeywordRule`]s. The first rule with a keyword contained in the
//! case-folded question wins; if none match the question is
//! [`Category::Reasoning`].

use sage_core::types::{fold_case, Category, KeywordRule};

/// Keywords that send a question to the math prompt.
pub const MATH_KEYWORDS: &[&str] = &["calculate", "+", "-", "*", "/", "how many", "total"];

/// Keywords that send a question to the encyclopedia.
pub const LOOKUP_KEYWORDS: &[&str] = &["who", "what", "when", "where", "wikipedia"];

/// Category returned when no rule matches.
pub const FALLBACK: Category = Category::Reasoning;

/// The built-in routing table: math before lookup.
pub fn default_rules() -> Vec<KeywordRule> {
    vec![
        KeywordRule::new(Category::Math, MATH_KEYWORDS),
        KeywordRule::new(Category::Lookup, LOOKUP_KEYWORDS),
    ]
}

/// Rule-based question classifier.
#[derive(Debug, Clone)]
pub struct QueryClassifier {
    rules: Vec<KeywordRule>,
}

impl QueryClassifier {
    /// Build a classifier over a custom rule table, evaluated in order.
    pub fn new(rules: Vec<KeywordRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|rule| KeywordRule {
                category: rule.category,
                keywords: rule.keywords.iter().map(|k| fold_case(k)).collect(),
            })
            .collect();
        Self { rules }
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    /// Classify a question. Total over all inputs, including `""`.
    pub fn classify(&self, question: &str) -> Category {
        let folded = fold_case(question);
        self.rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| folded.contains(k.as_str())))
            .map(|rule| rule.category)
            .unwrap_or(FALLBACK)
    }
}

impl Default for QueryClassifier {
    fn default() -> Self {
        Self::new(default_rules())
    }
}
