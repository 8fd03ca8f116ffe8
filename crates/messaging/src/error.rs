use thiserror::Error;

/// Errors surfaced by a publish attempt.
///
/// Only immediate send-time failures appear here; broker-side outcomes
/// (confirms and returns) are reported asynchronously through the broker's
/// tracking records.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The event payload could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The broker connection was unavailable at send time.
    #[error("Broker unavailable: {0}")]
    Disconnected(String),
}

/// Result type for messaging operations.
pub type Result<T> = std::result::Result<T, PublishError>;
