use thiserror::Error;

/// Errors surfaced at the checked boundary of the persistent containers.
///
/// Unchecked accessors (`get_unchecked`, `front`, `back`, `pop_back` on an
/// empty container) do not return this type: they are documented
/// precondition violations, not recoverable conditions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfluentError {
    /// A positional or keyed access fell outside the container's bounds.
    #[error("index {index} out of range for length {length}")]
    OutOfRange {
        /// The offending index.
        index: usize,
        /// The length of the container at the time of the access.
        length: usize,
    },

    /// An internal consistency check failed. Seeing this indicates a bug
    /// in the library rather than caller misuse.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

pub type Result<T> = std::result::Result<T, ConfluentError>;
