#![forbid(unsafe_code)]

//! Error type shared by the reactive primitives.

use std::fmt;

/// Errors surfaced by cell and sequence operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    /// An index argument fell outside the valid bounds for the operation.
    ///
    /// `len` is the sequence length at the time of the call. Reads, writes
    /// and removals accept `[0, len)`; inserts accept `[0, len]`.
    IndexOutOfRange { index: usize, len: usize },
    /// An untyped write received a value that is not the cell's type.
    TypeMismatch { expected: &'static str },
}

impl fmt::Display for BindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for length {len}")
            }
            Self::TypeMismatch { expected } => {
                write!(f, "type mismatch: expected a value of type {expected}")
            }
        }
    }
}

impl std::error::Error for BindingError {}

/// Convenience alias for results carrying a [`BindingError`].
pub type Result<T, E = BindingError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_index_out_of_range() {
        let err = BindingError::IndexOutOfRange { index: 5, len: 3 };
        assert_eq!(err.to_string(), "index 5 out of range for length 3");
    }

    #[test]
    fn display_type_mismatch() {
        let err = BindingError::TypeMismatch { expected: "i32" };
        assert!(err.to_string().contains("i32"));
    }

    #[test]
    fn is_std_error() {
        let err: Box<dyn std::error::Error> =
            Box::new(BindingError::IndexOutOfRange { index: 0, len: 0 });
        assert!(err.source().is_none());
    }
}
