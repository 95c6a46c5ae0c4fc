use thiserror::Error;

/// Top-level error type for the Sage workspace.
///
/// Crates that talk to the outside world keep their own error enums and
/// convert into this one where they meet the composition root, so `?` works
/// across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SageError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for SageError {
    fn from(err: toml::de::Error) -> Self {
        SageError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SageError {
    fn from(err: toml::ser::Error) -> Self {
        SageError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for SageError {
    fn from(err: serde_json::Error) -> Self {
        SageError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Sage operations.
pub type Result<T> = std::result::Result<T, SageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let cases: Vec<(SageError, &str)> = vec![
            (
                SageError::Config("bad key".to_string()),
                "Configuration error: bad key",
            ),
            (
                SageError::Api("bind failed".to_string()),
                "API error: bind failed",
            ),
            (
                SageError::Serialization("invalid json".to_string()),
                "Serialization error: invalid json",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let sage_err: SageError = io_err.into();
        match &sage_err {
            SageError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            _ => panic!("Expected Io variant"),
        }
        assert!(sage_err.to_string().starts_with("I/O error:"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let err: std::result::Result<toml::Value, _> = toml::from_str("invalid = [[[");
        let sage_err: SageError = err.unwrap_err().into();
        assert!(matches!(sage_err, SageError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let err: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope }");
        let sage_err: SageError = err.unwrap_err().into();
        assert!(matches!(sage_err, SageError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let value = io_result?;
            Ok(value.to_string())
        }

        assert_eq!(inner().unwrap(), "42");
    }
}
