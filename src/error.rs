//! Error taxonomy for triage, refinement and dispatch
//!
//! Model- and network-boundary failures are caught by the console session and
//! shown to the operator; only `Configuration` and `Template` are fatal.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TriageError {
    /// A required setting (API key, ...) is missing. Raised before any model call.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The model call itself failed (network, HTTP status, timeout, empty reply).
    #[error("model gateway error: {0}")]
    Gateway(String),

    /// The model reply holds no parseable JSON at all.
    #[error("model returned malformed output: {0}")]
    MalformedOutput(String),

    /// The model reply is JSON but does not match the declared schema.
    #[error("model output violates schema: {0}")]
    SchemaViolation(String),

    /// Invalid menu selection or an input the current state cannot accept.
    #[error("{0}")]
    OperatorInput(String),

    /// A prompt template references a placeholder that has no value.
    #[error("prompt template error: {0}")]
    Template(String),

    /// The mail transport failed to deliver a reply.
    #[error("mail transport error: {0}")]
    Transport(String),

    /// A web page could not be loaded.
    #[error("could not load page: {0}")]
    Fetch(String),
}

impl TriageError {
    /// Whether the process should stop rather than re-prompt the operator.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Template(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_kinds() {
        assert!(TriageError::Configuration("MODEL_API_KEY".into()).is_fatal());
        assert!(TriageError::Template("missing {x}".into()).is_fatal());
        assert!(!TriageError::Gateway("timeout".into()).is_fatal());
        assert!(!TriageError::OperatorInput("bad".into()).is_fatal());
    }

    #[test]
    fn test_display_includes_detail() {
        let err = TriageError::SchemaViolation("analyses[0].priority".into());
        assert_eq!(
            err.to_string(),
            "model output violates schema: analyses[0].priority"
        );
    }
}
