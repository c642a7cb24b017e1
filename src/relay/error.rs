//! Relay error types
//!
//! Error types for frame publication.

/// Error type for publish operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// Frame payload was empty
    EmptyFrame,
}

impl std::fmt::Display for PublishError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublishError::EmptyFrame => write!(f, "Empty frame data"),
        }
    }
}

impl std::error::Error for PublishError {}
