use thiserror::Error;

use crate::stages::Stage;

/// Failures raised by the model-inference collaborator.
#[derive(Debug, Error)]
pub enum ModelError {
    /// No credential was available when the client was constructed.
    #[error("model client not configured: {0}")]
    NotConfigured(String),

    /// The provider answered 429 (rate limit or exhausted quota).
    #[error("model provider rate limit or quota exceeded: {0}")]
    RateLimited(String),

    /// The provider answered with any other non-2xx status.
    #[error("model API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider envelope could not be read as JSON.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures surfaced by stage functions and the pipeline orchestrator.
///
/// Soft schema violations never appear here; the normalizer resolves them
/// with defaults.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Model text could not be turned into JSON by any repair pass. Carries
    /// the strict-parse error of the cleaned text.
    #[error("model returned invalid JSON during {stage}: {source}")]
    Parse {
        stage: Stage,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("invalid image payload: {0}")]
    InvalidImage(String),
}
