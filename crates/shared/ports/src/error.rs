use thiserror::Error;

/// Domain-level errors for matching operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchingError {
    #[error("Orders cannot match: {0}")]
    CannotMatch(String),

    #[error("No quantity to match")]
    NoQuantity,

    #[error("Book contains orders for more than one asset: {0}")]
    MixedBook(String),
}

pub type MatchingResult<T> = std::result::Result<T, MatchingError>;

/// Persistence-layer failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Contention or a failed write. Safe to retry.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Record already exists: {0}")]
    Duplicate(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
