use thiserror::Error;

/// Errors raised by the list data processor.
///
/// These are structured, untranslated errors; callers decide how to
/// present them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ListError {
    /// An input item could not be reconstructed as the expected entity type
    #[error("Item at index {index} is not a {expected}")]
    ItemShapeMismatch { index: usize, expected: &'static str },

    /// A continuation token could not be decoded
    #[error("Invalid cursor '{token}': {reason}")]
    InvalidCursor { token: String, reason: String },

    /// Pagination parameters that cannot be resolved to a valid offset
    #[error("Invalid pagination parameter {field}={value}")]
    InvalidPagination { field: &'static str, value: String },
}

pub type ListResult<T> = Result<T, ListError>;
