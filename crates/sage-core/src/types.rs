use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Enums
// =============================================================================

/// The route a question takes through the assistant.
///
/// Closed on purpose: adding a route means adding a variant and a handler,
/// and every `match` over this enum must be updated with it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Arithmetic or word problems, answered by the math prompt.
    Math,
    /// Factual questions, answered from the encyclopedia.
    Lookup,
    /// Everything else, answered by the reasoning prompt.
    Reasoning,
}

impl Category {
    /// All categories, in routing priority order.
    pub const ALL: [Category; 3] = [Category::Math, Category::Lookup, Category::Reasoning];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Math => "math",
            Category::Lookup => "lookup",
            Category::Reasoning => "reasoning",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who authored a transcript entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Routing rules
// =============================================================================

/// One row of the routing table: any keyword hit selects `category`.
///
/// Rules are evaluated in list order and the first hit wins, so the order of
/// a rule table is its priority.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub category: Category,
    /// Lower-case substrings. Matched by containment, not whole words.
    pub keywords: Vec<String>,
}

impl KeywordRule {
    pub fn new(category: Category, keywords: &[&str]) -> Self {
        Self {
            category,
            keywords: keywords.iter().map(|k| fold_case(k)).collect(),
        }
    }
}

/// Case-fold for keyword matching.
///
/// Upper-casing first makes the fold agree for a string and its upper-case
/// form, which plain `to_lowercase` does not (`ı` upper-cases to `I`).
pub fn fold_case(text: &str) -> String {
    text.to_uppercase().to_lowercase()
}
