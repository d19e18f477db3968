use std::collections::TryReserveError;

use thiserror::Error;

/// A payload (or one record in it) that cannot be turned into a typed value.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a top-level array")]
    NotAnArray,

    #[error("entry {index}: expected an object")]
    NotAnObject { index: usize },

    #[error("entry {index}: missing field `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("entry {index}: field `{field}` is not {expected}")]
    InvalidField {
        index: usize,
        field: &'static str,
        expected: &'static str,
    },

    #[error("entry {index}: field `{field}` is empty")]
    EmptyField { index: usize, field: &'static str },

    #[error("symbol list is empty")]
    EmptyList,
}

#[derive(Error, Debug)]
pub enum MarketError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("allocation failed: {0}")]
    Allocation(#[from] TryReserveError),
}
