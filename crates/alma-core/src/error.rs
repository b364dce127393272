use thiserror::Error;

/// Top-level error type for the Alma system.
///
/// Each variant wraps a subsystem-specific error. Subsystem crates define
/// their own error types and implement `From<SubsystemError> for AlmaError`
/// so that the `?` operator works seamlessly across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AlmaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for AlmaError {
    fn from(err: toml::de::Error) -> Self {
        AlmaError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for AlmaError {
    fn from(err: toml::ser::Error) -> Self {
        AlmaError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for AlmaError {
    fn from(err: serde_json::Error) -> Self {
        AlmaError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Alma operations.
pub type Result<T> = std::result::Result<T, AlmaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AlmaError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");
    }

    #[test]
    fn test_error_display_all_variants() {
        let cases: Vec<(AlmaError, &str)> = vec![
            (
                AlmaError::Config("bad key".to_string()),
                "Configuration error: bad key",
            ),
            (
                AlmaError::Storage("disk full".to_string()),
                "Storage error: disk full",
            ),
            (
                AlmaError::Api("bind failed".to_string()),
                "API error: bind failed",
            ),
            (
                AlmaError::Serialization("invalid json".to_string()),
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
        let alma_err: AlmaError = io_err.into();
        assert!(matches!(alma_err, AlmaError::Io(_)));
        assert!(alma_err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let bad_toml = "invalid = [[[";
        let err: std::result::Result<toml::Value, _> = toml::from_str(bad_toml);
        assert!(err.is_err());
        let alma_err: AlmaError = err.unwrap_err().into();
        assert!(matches!(alma_err, AlmaError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let bad_json = "{ invalid json }";
        let err: std::result::Result<serde_json::Value, _> = serde_json::from_str(bad_json);
        assert!(err.is_err());
        let alma_err: AlmaError = err.unwrap_err().into();
        assert!(matches!(alma_err, AlmaError::Serialization(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(AlmaError::Config("fail".to_string()))
        }

        assert_eq!(returns_ok().unwrap(), 42);
        assert!(returns_err().is_err());
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let _value = io_result?;
            Ok("success".to_string())
        }

        assert_eq!(inner().unwrap(), "success");
    }

    #[test]
    fn test_error_debug_impl() {
        let err = AlmaError::Storage("test debug".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("Storage"));
        assert!(debug_str.contains("test debug"));
    }
}
