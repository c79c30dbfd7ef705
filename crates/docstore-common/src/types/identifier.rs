//! Validated SQL identifiers.
//!
//! Table and field names are embedded into generated statements, so every
//! name passes through [`Identifier::parse`] before any SQL text is built.
//! Values are always bound as parameters and never need this treatment.

use std::fmt;

use crate::constants::{MAX_IDENTIFIER_LEN, RESERVED_PREFIX, RESERVED_WORDS};
use crate::error::IdentifierError;

/// A table or column name restricted to `[A-Za-z_][A-Za-z0-9_]*`.
///
/// Reserved SQL words and the internal `__` prefix are rejected. The
/// original case is preserved; [`Identifier::quoted`] renders the name as
/// a quoted identifier so the engine does not fold it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier(String);

impl Identifier {
    /// Validates a name.
    pub fn parse(name: impl AsRef<str>) -> Result<Self, IdentifierError> {
        let name = name.as_ref();
        if name.is_empty() {
            return Err(IdentifierError::Empty);
        }
        if name.len() > MAX_IDENTIFIER_LEN {
            return Err(IdentifierError::TooLong {
                name: name.to_string(),
                len: name.len(),
                max: MAX_IDENTIFIER_LEN,
            });
        }

        for (position, ch) in name.char_indices() {
            let valid = if position == 0 {
                ch.is_ascii_alphabetic() || ch == '_'
            } else {
                ch.is_ascii_alphanumeric() || ch == '_'
            };
            if !valid {
                return Err(IdentifierError::InvalidCharacter {
                    name: name.to_string(),
                    ch,
                    position,
                });
            }
        }

        if name.starts_with(RESERVED_PREFIX) {
            return Err(IdentifierError::ReservedPrefix(name.to_string()));
        }
        let lower = name.to_ascii_lowercase();
        if RESERVED_WORDS.contains(&lower.as_str()) {
            return Err(IdentifierError::Reserved(name.to_string()));
        }

        Ok(Self(name.to_string()))
    }

    /// Wraps a name that is known to be safe without checking it.
    ///
    /// Used for internal columns and names read back from the catalog.
    pub fn internal(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the raw name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Renders the name as a double-quoted SQL identifier.
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0.replace('"', "\"\""))
    }

    /// Consumes the identifier, returning the raw name.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Identifier {
    type Error = IdentifierError;

    fn try_from(name: &str) -> Result<Self, Self::Error> {
        Self::parse(name)
    }
}

impl TryFrom<String> for Identifier {
    type Error = IdentifierError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Self::parse(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_names() {
        for name in ["integer", "floating_point", "string", "list", "_private", "Col9"] {
            let ident = Identifier::parse(name).unwrap();
            assert_eq!(ident.as_str(), name);
        }
    }

    #[test]
    fn test_rejects_empty_and_long() {
        assert_eq!(Identifier::parse(""), Err(IdentifierError::Empty));
        let long = "a".repeat(MAX_IDENTIFIER_LEN + 1);
        assert!(matches!(
            Identifier::parse(&long),
            Err(IdentifierError::TooLong { len, .. }) if len == MAX_IDENTIFIER_LEN + 1
        ));
        assert!(Identifier::parse("a".repeat(MAX_IDENTIFIER_LEN)).is_ok());
    }

    #[test]
    fn test_rejects_injection_attempts() {
        let attempts = [
            "name; DROP TABLE users",
            "a\"b",
            "x'--",
            "1abc",
            "white space",
            "naïve",
        ];
        for name in attempts {
            assert!(
                matches!(Identifier::parse(name), Err(IdentifierError::InvalidCharacter { .. })),
                "accepted {name:?}"
            );
        }
    }

    #[test]
    fn test_rejects_reserved() {
        assert_eq!(
            Identifier::parse("SELECT"),
            Err(IdentifierError::Reserved("SELECT".to_string()))
        );
        assert!(matches!(Identifier::parse("user"), Err(IdentifierError::Reserved(_))));
        assert!(matches!(
            Identifier::parse("__docstore_slot"),
            Err(IdentifierError::ReservedPrefix(_))
        ));
    }

    #[test]
    fn test_quoted() {
        let ident = Identifier::parse("MixedCase").unwrap();
        assert_eq!(ident.quoted(), "\"MixedCase\"");
        assert_eq!(ident.to_string(), "MixedCase");
    }
}
