//! Domain rule violations
//!
//! Every variant is recoverable at the call boundary: the caller surfaces
//! the message and leaves persistent state untouched.

use thiserror::Error;
use uuid::Uuid;

/// Errors raised by the pure domain rules
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Insufficient stock for {part_name}. Available: {available}")]
    InsufficientStock { part_name: String, available: i64 },

    #[error(
        "Receipt for {part_name} exceeds outstanding quantity \
         (ordered {ordered}, received {received}, requested {requested})"
    )]
    OverReceipt {
        part_name: String,
        ordered: i64,
        received: i64,
        requested: i64,
    },

    #[error("At least one positive receipt quantity is required")]
    EmptyReceipt,

    #[error("Quantity must be positive, got {0}")]
    NonPositiveQuantity(i64),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Unknown inventory item: {0}")]
    UnknownItem(Uuid),
}

/// Result type alias for domain rules
pub type DomainResult<T> = Result<T, DomainError>;
