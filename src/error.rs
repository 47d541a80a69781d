//! Error types for vendaval
//!
//! Every fallible operation in the crate returns [`Result`]. Errors are raised
//! to the caller immediately; nothing in the library retries or recovers.

use thiserror::Error;

/// Result type alias for vendaval operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while preparing data or configuring a training run.
#[derive(Debug, Error)]
pub enum Error {
    /// A required column or configuration field is missing or inconsistent.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Loss name is neither registered nor part of the standard namespace.
    #[error("Unknown loss: {0} isn't a registered loss, nor is it a standard loss")]
    UnknownLoss(String),

    /// Optimizer name is not in the optimizer registry.
    #[error("Unknown optimizer: {0}")]
    UnknownOptimizer(String),

    /// Scheduler name is not in the scheduler registry.
    #[error("Unknown scheduler: {0}")]
    UnknownScheduler(String),

    /// A registry already holds an entry under this name.
    #[error("An object named '{name}' was already registered in '{registry}'")]
    DuplicateName { registry: String, name: String },

    /// A label in the data is absent from the supplied label index.
    #[error("Label not found in index: {0}")]
    LabelNotFound(String),

    /// Input shapes do not satisfy the operation's contract.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Reduction string is not one of none, mean, sum.
    #[error("Invalid reduction mode: {0}")]
    UnsupportedReduction(String),

    /// Constructor arguments did not match the target's parameters.
    #[error("Invalid arguments for {target}: {message}")]
    InvalidArgument { target: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Shorthand for a [`Error::Configuration`] error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Shorthand for an [`Error::InvalidArgument`] error.
    pub fn invalid_argument(target: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidArgument { target: target.into(), message: message.to_string() }
    }

    /// Check whether the error was caused by user-supplied configuration.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_)
                | Self::UnknownLoss(_)
                | Self::UnknownOptimizer(_)
                | Self::UnknownScheduler(_)
                | Self::UnsupportedReduction(_)
                | Self::InvalidArgument { .. }
                | Self::Yaml(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_name_message() {
        let err = Error::DuplicateName { registry: "Loss Registry".into(), name: "focal".into() };
        let msg = err.to_string();
        assert!(msg.contains("focal"));
        assert!(msg.contains("Loss Registry"));
    }

    #[test]
    fn test_config_error_classification() {
        assert!(Error::config("missing column").is_config_error());
        assert!(Error::UnsupportedReduction("avg".into()).is_config_error());
        assert!(!Error::ShapeMismatch("rank".into()).is_config_error());
        assert!(!Error::LabelNotFound("cat".into()).is_config_error());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
