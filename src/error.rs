//! Error types for Kisaan Saathi.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited")]
    RateLimited { provider: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures raised by the farm backend collaborators.
///
/// Any of these ends the active intake flow; the display text is shown to the
/// farmer verbatim.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("{message}")]
    Rejected { operation: String, message: String },

    #[error("Could not reach the {operation} service: {reason}")]
    Unreachable { operation: String, reason: String },

    #[error("Unexpected response from {operation}: {reason}")]
    MalformedResponse { operation: String, reason: String },

    #[error("{0}")]
    MissingInput(String),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

impl BackendError {
    pub fn rejected(operation: &str, message: impl Into<String>) -> Self {
        Self::Rejected {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    pub fn unreachable(operation: &str, reason: impl std::fmt::Display) -> Self {
        Self::Unreachable {
            operation: operation.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed(operation: &str, reason: impl std::fmt::Display) -> Self {
        Self::MalformedResponse {
            operation: operation.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
