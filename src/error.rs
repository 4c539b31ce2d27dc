//! Error handling and result types for BPlusTreeMap operations.
//!
//! This module provides the error type for all B+ tree operations and the
//! result type aliases built on top of it.

/// Error type for B+ tree operations.
#[derive(Debug, Clone, PartialEq)]
pub enum BPlusTreeError {
    /// Construction-time rejection of a capacity below the minimum.
    InvalidCapacity(String),
    /// `get`, `remove`, or similar lookup found no entry for the key.
    KeyNotFound,
    /// `pop_first`/`pop_last` called on an empty tree.
    Empty,
    /// An iterator was resumed after the tree it was created from mutated.
    ConcurrentModification,
    /// The invariant checker found a structural violation.
    InvariantViolation(crate::validation::Violation),
    /// An internal assertion failed: an impossible state was reached.
    ///
    /// This indicates an implementation bug, not a caller error, and is not
    /// meant to be recovered from.
    Bug(String),
}

impl BPlusTreeError {
    /// Create an InvalidCapacity error with context.
    pub fn invalid_capacity(capacity: usize, min_required: usize) -> Self {
        Self::InvalidCapacity(format!(
            "capacity {} is invalid (minimum required: {})",
            capacity, min_required
        ))
    }

    /// Create a Bug error with context, for states the implementation
    /// asserts can never happen.
    pub fn bug(context: &str, details: &str) -> Self {
        Self::Bug(format!("{}: {}", context, details))
    }

    /// Returns true if this is a capacity-validation error.
    pub fn is_capacity_error(&self) -> bool {
        matches!(self, Self::InvalidCapacity(_))
    }
}

impl std::fmt::Display for BPlusTreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BPlusTreeError::InvalidCapacity(msg) => write!(f, "invalid capacity: {}", msg),
            BPlusTreeError::KeyNotFound => write!(f, "key not found in tree"),
            BPlusTreeError::Empty => write!(f, "tree is empty"),
            BPlusTreeError::ConcurrentModification => {
                write!(f, "tree was modified during iteration")
            }
            BPlusTreeError::InvariantViolation(v) => write!(f, "invariant violation: {}", v),
            BPlusTreeError::Bug(msg) => write!(f, "internal invariant broken: {}", msg),
        }
    }
}

impl std::error::Error for BPlusTreeError {}

/// Result type for tree construction and bulk-load.
pub type InitResult<T> = Result<T, BPlusTreeError>;

/// Result type for key lookup operations.
pub type KeyResult<T> = Result<T, BPlusTreeError>;

/// Result type for tree modification operations.
pub type ModifyResult<T> = Result<T, BPlusTreeError>;

/// General-purpose result alias used across the public API.
pub type BTreeResult<T> = Result<T, BPlusTreeError>;
