#![forbid(unsafe_code)]

//! Error types for sequence mutations.
//!
//! Every failure is synchronous and leaves the sequence untouched: no item
//! is moved and no observer is notified.

use std::fmt;

/// Mutations that are permanently disabled on an observable sequence.
///
/// A partial bulk removal has no single notification that describes it, so
/// these are rejected instead of being approximated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnsupportedOperation {
    /// Removing a contiguous index range.
    RemoveRange,
    /// Removing every element contained in another collection.
    RemoveAll,
}

impl UnsupportedOperation {
    /// Name of the rejected operation.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::RemoveRange => "remove_range",
            Self::RemoveAll => "remove_all",
        }
    }
}

impl fmt::Display for UnsupportedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RemoveRange => write!(f, "cannot remove a range from an observable sequence"),
            Self::RemoveAll => write!(f, "remove_all is not supported, use clear() instead"),
        }
    }
}

/// Errors from [`ObservableSequence`](crate::ObservableSequence) mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceError {
    /// The index lies outside the valid range for the operation.
    ///
    /// For insertion the valid range is `0..=len`, for removal `0..len`.
    IndexOutOfBounds { index: usize, len: usize },
    /// The operation is disabled for every argument and every state.
    Unsupported(UnsupportedOperation),
}

impl SequenceError {
    /// Short stable label (snake_case) for logs.
    #[must_use]
    pub const fn as_label(&self) -> &'static str {
        match self {
            Self::IndexOutOfBounds { .. } => "index_out_of_bounds",
            Self::Unsupported(_) => "unsupported_operation",
        }
    }

    /// Whether this error reports a disabled operation.
    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }
}

impl fmt::Display for SequenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for length {len}")
            }
            Self::Unsupported(op) => write!(f, "unsupported operation: {op}"),
        }
    }
}

impl std::error::Error for SequenceError {}

impl From<UnsupportedOperation> for SequenceError {
    fn from(op: UnsupportedOperation) -> Self {
        Self::Unsupported(op)
    }
}
