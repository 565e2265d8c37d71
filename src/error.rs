use thiserror::Error;

/// Enum with all errors in this crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KDIndexError {
    /// A key's coordinate count does not match the dimensionality of the tree.
    #[error(
        "Invalid key. The number of elements (dimensions) in the key must match the dimensionality of the tree. Expected length: {expected}. Actual length: {actual}"
    )]
    BadKeyLength { expected: usize, actual: usize },

    /// The addressed point is not present in the tree.
    #[error("Could not find any data on the point {0}")]
    KeyNotFound(String),

    /// The operation is not valid given the current state of the tree.
    #[error("Bad operation: {0}")]
    BadOperation(String),

    /// The point being inserted is already present in the tree.
    #[error("Duplicate keys not allowed")]
    DuplicateKey,
}

pub type Result<T> = std::result::Result<T, KDIndexError>;
