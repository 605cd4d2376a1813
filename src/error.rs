use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, CometError>;

/// Errors from REST calls and response reshaping.
#[derive(Debug, Error)]
pub enum CometError {
    /// The service answered with a non-2xx status. Carries the full
    /// response body, which usually holds the service's own error message.
    #[error("http error {status}: {body}")]
    Http { status: u16, body: String },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("response decode failed: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("non-numeric value for metric '{name}': {value}")]
    NonNumericMetric { name: String, value: String },
}

impl CometError {
    /// HTTP status of the failed request, if this is an HTTP error.
    pub fn status(&self) -> Option<u16> {
        match self {
            CometError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
