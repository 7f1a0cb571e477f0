//! Error types for the analysis pipeline.
//!
//! Only loader-stage failures are fatal to a request. Every downstream stage
//! expresses "rule did not fire" as an empty or `None` result, so the variants
//! below are raised either while turning bytes into a table or by the ambient
//! layers (configuration, output, text completion) around the pipeline.

use thiserror::Error;

/// Main error type for InsightForge operations.
#[derive(Debug, Error)]
pub enum InsightError {
    /// The uploaded file's extension is not one of the supported types
    #[error("Unsupported file type for '{filename}'. Supported types: {}", .supported.join(", "))]
    UnsupportedFileType {
        filename: String,
        supported: Vec<String>,
    },

    /// Content could not be decoded or is malformed for its claimed format
    #[error("Could not parse file: {context}")]
    Parse {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// No rows or no columns remain after cleaning
    #[error("No data found in the uploaded file: {reason}")]
    EmptyTable { reason: String },

    /// Configuration or validation error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// I/O operation failed
    #[error("I/O operation failed: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization or deserialization failed
    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A serialized report failed schema or invariant validation
    #[error("Report validation failed: {context}")]
    ReportValidation {
        context: String,
        #[source]
        source: crate::validation::ValidationError,
    },

    /// The caller-imposed time budget elapsed before the analysis finished
    #[error("Analysis did not finish within {seconds} seconds")]
    Timeout { seconds: u64 },

    /// A worker task could not be driven to completion
    #[error("Analysis execution failed: {context}")]
    Execution { context: String },

    /// The text-completion collaborator failed or returned unusable output
    #[error("Text completion failed: {context}")]
    Completion { context: String },
}

/// Convenience type alias for Results with InsightError
pub type Result<T> = std::result::Result<T, InsightError>;

impl InsightError {
    /// Creates an unsupported file type error
    pub fn unsupported_file_type(filename: impl Into<String>, supported: &[&str]) -> Self {
        Self::UnsupportedFileType {
            filename: filename.into(),
            supported: supported.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Creates a parse error wrapping the underlying decoder error
    pub fn parse_failed<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Parse {
            context: context.into(),
            source: Some(Box::new(error)),
        }
    }

    /// Creates a parse error for structurally malformed content
    pub fn malformed(context: impl Into<String>) -> Self {
        Self::Parse {
            context: context.into(),
            source: None,
        }
    }

    /// Creates an empty table error
    pub fn empty_table(reason: impl Into<String>) -> Self {
        Self::EmptyTable {
            reason: reason.into(),
        }
    }

    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a serialization error with context
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    /// Creates a report validation error
    pub fn report_validation(
        context: impl Into<String>,
        source: crate::validation::ValidationError,
    ) -> Self {
        Self::ReportValidation {
            context: context.into(),
            source,
        }
    }

    /// Creates an execution error
    pub fn execution(context: impl Into<String>) -> Self {
        Self::Execution {
            context: context.into(),
        }
    }

    /// Creates a text completion error
    pub fn completion(context: impl Into<String>) -> Self {
        Self::Completion {
            context: context.into(),
        }
    }

    /// Returns true for errors raised by the loader stage.
    ///
    /// The transport layer maps these to client errors (bad upload) and
    /// everything else to server errors.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFileType { .. } | Self::Parse { .. } | Self::EmptyTable { .. }
        )
    }
}
