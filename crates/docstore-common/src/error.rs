//! Error types for the shared value model.

use thiserror::Error;

/// Why a table or field name was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// The name is empty.
    #[error("identifier is empty")]
    Empty,

    /// The name exceeds the engine's identifier length.
    #[error("identifier `{name}` is {len} bytes long (max {max})")]
    TooLong {
        /// The rejected name.
        name: String,
        /// Its length in bytes.
        len: usize,
        /// The maximum accepted length.
        max: usize,
    },

    /// The name contains a character outside `[A-Za-z0-9_]` or starts with a digit.
    #[error("identifier `{name}` contains invalid character {ch:?} at byte {position}")]
    InvalidCharacter {
        /// The rejected name.
        name: String,
        /// The offending character.
        ch: char,
        /// Byte offset of the character.
        position: usize,
    },

    /// The name is an SQL reserved word.
    #[error("identifier `{0}` is a reserved word")]
    Reserved(String),

    /// The name uses the prefix reserved for internal columns.
    #[error("identifier `{0}` uses the reserved `__` prefix")]
    ReservedPrefix(String),
}

/// A value could not be represented.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    /// A floating point value is NaN or infinite.
    #[error("non-finite number {0} cannot be stored")]
    NonFinite(f64),

    /// A number is outside the range of the decimal representation.
    #[error("number {0} is out of range")]
    OutOfRange(String),
}
