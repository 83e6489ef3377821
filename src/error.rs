//! Error taxonomy shared by the gateways and pipeline drivers.

use thiserror::Error;

/// Failures surfaced by every stage of the embed/search pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or unusable credential/endpoint configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A vector whose length does not match the configured dimensionality.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    Dimension {
        /// Dimensionality required by the vector field.
        expected: usize,
        /// Length of the rejected vector.
        actual: usize,
    },

    /// Query parameters or vector contents that cannot be encoded.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The embedding provider call failed or answered with garbage.
    #[error("embedding provider error: {0}")]
    Provider(String),

    /// The search backend call failed or answered with garbage.
    #[error("search backend error: {0}")]
    Backend(String),

    /// Reading or writing a corpus snapshot failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Name of the pipeline stage that produced the error.
    pub fn stage(&self) -> &'static str {
        match self {
            Error::Configuration(_) => "configuration",
            Error::Dimension { .. } | Error::InvalidQuery(_) => "validation",
            Error::Provider(_) => "embedding",
            Error::Backend(_) => "search",
            Error::Storage(_) => "storage",
        }
    }
}

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_message_names_both_lengths() {
        let err = Error::Dimension {
            expected: 1536,
            actual: 42,
        };
        assert!(err.to_string().contains("expected 1536, got 42"));
        assert_eq!(err.stage(), "validation");
    }

    #[test]
    fn stages_are_distinct_for_network_failures() {
        assert_eq!(Error::Provider("down".into()).stage(), "embedding");
        assert_eq!(Error::Backend("down".into()).stage(), "search");
    }
}
