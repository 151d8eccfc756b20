use thiserror::Error;

/// Core error type for the tokenflow runtime
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Node not found in the process graph
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// Token not found in the instance data
    #[error("Token not found: {0}")]
    TokenNotFound(String),

    /// Process instance not found
    #[error("Process instance not found: {0}")]
    InstanceNotFound(String),

    /// Data type not known to the type registry
    #[error("Unknown data type: {0}")]
    UnknownDataType(String),

    /// Structural validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Instance data store error
    #[error("State store error: {0}")]
    StateStore(String),

    /// Guard evaluation error, returned by guard predicates
    #[error("Guard evaluation error: {0}")]
    GuardEvaluation(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let errors = vec![
            (CoreError::NodeNotFound("n1".to_string()), "Node not found: n1"),
            (CoreError::TokenNotFound("tok".to_string()), "Token not found: tok"),
            (CoreError::InstanceNotFound("i1".to_string()), "Process instance not found: i1"),
            (CoreError::UnknownDataType("decimal".to_string()), "Unknown data type: decimal"),
            (CoreError::Validation("bad".to_string()), "Validation error: bad"),
            (CoreError::StateStore("poisoned".to_string()), "State store error: poisoned"),
            (CoreError::GuardEvaluation("boom".to_string()), "Guard evaluation error: boom"),
            (CoreError::Serialization("eof".to_string()), "Serialization error: eof"),
            (CoreError::Other("other".to_string()), "other"),
        ];

        for (error, expected) in errors {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_error = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let error: CoreError = json_error.into();

        match error {
            CoreError::Serialization(msg) => assert!(msg.contains("expected")),
            _ => panic!("Expected Serialization variant"),
        }
    }
}
