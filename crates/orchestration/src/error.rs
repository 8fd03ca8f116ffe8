//! Error types for the orchestration layer.

use order_store::StoreError;
use thiserror::Error;

/// Errors surfaced by orchestrator operations.
///
/// Each variant maps to one failure category a caller can act on:
/// missing resources, rejected reservations, bad input, rejected
/// webhook signatures, and upstream services that failed or timed out.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("dependency failure: {0}")]
    DependencyFailure(String),

    #[error(transparent)]
    Validation(#[from] domain::OrderError),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for OrchestrationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::OrderNotFound(id) => {
                OrchestrationError::NotFound(format!("Order not found with id: {id}"))
            }
            other => OrchestrationError::Store(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, OrchestrationError>;
