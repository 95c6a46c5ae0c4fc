use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, SageError};
use crate::types::KeywordRule;

/// Top-level configuration for the Sage assistant.
///
/// Loaded from `~/.sage/config.toml` by default. Every section is optional
/// and falls back to its defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SageConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl SageConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SageConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject values that would leave the assistant unable to answer.
    pub fn validate(&self) -> Result<()> {
        if self.llm.model.trim().is_empty() {
            return Err(SageError::Config("llm.model must not be empty".into()));
        }
        if self.llm.base_url.trim().is_empty() {
            return Err(SageError::Config("llm.base_url must not be empty".into()));
        }
        if self.search.top_k_results == 0 {
            return Err(SageError::Config(
                "search.top_k_results must be at least 1".into(),
            ));
        }
        if let Some(rules) = &self.chat.rules {
            if let Some(rule) = rules.iter().find(|r| r.keywords.is_empty()) {
                return Err(SageError::Config(format!(
                    "chat.rules entry for '{}' has no keywords",
                    rule.category
                )));
            }
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// HTTP port for the chat UI and API.
    pub port: u16,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            port: 3030,
            log_level: "info".to_string(),
        }
    }
}

/// Hosted text-completion service (OpenAI-compatible endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL, without the `/chat/completions` suffix.
    pub base_url: String,
    pub model: String,
    /// Environment variable consulted when a session supplies no key.
    pub api_key_env: String,
    pub temperature: f32,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            temperature: 0.7,
            request_timeout_secs: 60,
            connect_timeout_secs: 10,
        }
    }
}

/// Hosted encyclopedia search (MediaWiki action API).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Endpoint template; `{lang}` is replaced with `lang`.
    pub base_url: String,
    pub lang: String,
    /// Number of pages summarized per lookup.
    pub top_k_results: usize,
    /// Queries are cut to this many characters before searching.
    pub max_query_chars: usize,
    /// The joined summary is cut to this many characters.
    pub doc_content_chars_max: usize,
    pub request_timeout_secs: u64,
}

impl SearchConfig {
    /// The endpoint with the language substituted.
    pub fn endpoint(&self) -> String {
        self.base_url.replace("{lang}", &self.lang)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://{lang}.wikipedia.org/w/api.php".to_string(),
            lang: "en".to_string(),
            top_k_results: 3,
            max_query_chars: 300,
            doc_content_chars_max: 4000,
            request_timeout_secs: 30,
        }
    }
}

/// Chat session behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Assistant entry every new transcript starts with.
    pub greeting: String,
    /// Maximum question length in characters.
    pub max_question_length: usize,
    /// Idle minutes before a session is dropped. 0 keeps sessions forever.
    pub session_timeout_minutes: u32,
    /// Routing table override. `None` uses the built-in keyword table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<KeywordRule>>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            greeting: "Hi! I'm a math and reasoning assistant. Ask me anything \u{1f60a}"
                .to_string(),
            max_question_length: 4000,
            session_timeout_minutes: 60,
            rules: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = SageConfig::default();
        assert_eq!(config.general.port, 3030);
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.llm.model, "llama-3.1-8b-instant");
        assert_eq!(config.llm.api_key_env, "GROQ_API_KEY");
        assert_eq!(config.search.top_k_results, 3);
        assert_eq!(config.search.doc_content_chars_max, 4000);
        assert!(config.chat.greeting.starts_with("Hi! I'm a math"));
        assert!(config.chat.rules.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
port = 8080
log_level = "debug"

[llm]
model = "llama-3.3-70b-versatile"
temperature = 0.0

[search]
lang = "de"
top_k_results = 1
"#;
        let file = create_temp_config(content);
        let config = SageConfig::load(file.path()).unwrap();
        assert_eq!(config.general.port, 8080);
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.llm.model, "llama-3.3-70b-versatile");
        assert_eq!(config.llm.temperature, 0.0);
        assert_eq!(config.search.endpoint(), "https://de.wikipedia.org/w/api.php");
        assert_eq!(config.search.top_k_results, 1);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let content = r#"
[general]
log_level = "warn"
"#;
        let file = create_temp_config(content);
        let config = SageConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.general.port, 3030);
        assert_eq!(config.llm.base_url, "https://api.groq.com/openai/v1");
    }

    #[test]
    fn test_load_rules_override() {
        let content = r#"
[[chat.rules]]
category = "lookup"
keywords = ["who"]

[[chat.rules]]
category = "math"
keywords = ["sum"]
"#;
        let file = create_temp_config(content);
        let config = SageConfig::load(file.path()).unwrap();
        let rules = config.chat.rules.unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].category, Category::Lookup);
        assert_eq!(rules[1].keywords, vec!["sum"]);
    }

    #[test]
    fn test_load_rejects_rule_without_keywords() {
        let content = r#"
[[chat.rules]]
category = "math"
keywords = []
"#;
        let file = create_temp_config(content);
        let err = SageConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, SageError::Config(_)));
        assert!(err.to_string().contains("math"));
    }

    #[test]
    fn test_validate_rejects_empty_model() {
        let mut config = SageConfig::default();
        config.llm.model = "  ".to_string();
        assert!(matches!(config.validate(), Err(SageError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_top_k() {
        let mut config = SageConfig::default();
        config.search.top_k_results = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("this is not [valid toml");
        let err = SageConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, SageError::Config(_)));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = SageConfig::load_or_default(Path::new("/nonexistent/sage.toml"));
        assert_eq!(config.general.port, 3030);
    }

    #[test]
    fn test_save_creates_parent_dirs_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = SageConfig::default();
        config.general.port = 4040;
        config.save(&path).unwrap();

        let reloaded = SageConfig::load(&path).unwrap();
        assert_eq!(reloaded.general.port, 4040);
        assert_eq!(reloaded.chat.greeting, config.chat.greeting);
        assert!(reloaded.chat.rules.is_none());
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let file = create_temp_config("");
        let config = SageConfig::load(file.path()).unwrap();
        assert_eq!(config.search.lang, "en");
        assert_eq!(config.chat.session_timeout_minutes, 60);
    }
}
