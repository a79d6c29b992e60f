//! Error types for symbol interning operations.
//!
//! Both variants are caller-input errors, detected synchronously before any
//! allocation or locking takes place. There are no transient failure modes:
//! arena exhaustion is fatal (see [`crate::arena`]).

use thiserror::Error;

/// Error type for symbol interning operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InternError {
    /// The requested name (including any generated prefix/suffix) exceeds
    /// the maximum representable symbol length.
    #[error("symbol name too long: {len} bytes exceeds maximum of {max}")]
    NameTooLong { len: usize, max: usize },

    /// A NUL terminator byte occurred inside the declared length on an API
    /// that forbids it.
    #[error("symbol name may not contain NUL (found at byte offset {offset})")]
    EmbeddedNul { offset: usize },
}

/// Result type alias for interning operations
pub type Result<T> = std::result::Result<T, InternError>;
