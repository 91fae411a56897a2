use thiserror::Error;

use super::pricing::PricingError;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found")]
    NotFound,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error("Internal error: {0}")]
    Internal(String),
}
