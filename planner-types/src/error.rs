//! Validation errors raised at the write boundary.

use crate::record::Collection;
use thiserror::Error;

/// Errors rejecting a record or patch before it reaches the queue or gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("required field is empty: {0}")]
    EmptyField(&'static str),

    #[error("{collection} patch must be a non-empty JSON object")]
    InvalidPatch { collection: Collection },

    #[error("field cannot be changed after creation: {0}")]
    ImmutableField(String),

    #[error("patch does not match the {collection} schema: {reason}")]
    SchemaMismatch { collection: Collection, reason: String },

    #[error("event ends before it starts")]
    InvalidDateRange,
}
