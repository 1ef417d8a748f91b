//! Parse errors for the core identity types.

use thiserror::Error;

/// Errors produced when parsing versions, queries, names, and ids.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The version string was empty.
    #[error("empty version string")]
    EmptyVersion,

    /// A version string began or ended with a separator, or contained two
    /// adjacent separators.
    #[error("dangling separator in version: {input:?}")]
    DanglingSeparator {
        /// The offending input.
        input: String,
    },

    /// A version string contained a character outside the accepted set
    /// (ASCII alphanumerics and `.`, `_`, `-`, `+`).
    #[error("invalid character {character:?} in version: {input:?}")]
    InvalidVersionCharacter {
        /// The offending input.
        input: String,
        /// The first invalid character.
        character: char,
    },

    /// A numeric version component exceeded the representable range.
    #[error("numeric component out of range in version: {input:?}")]
    NumberOverflow {
        /// The offending input.
        input: String,
    },

    /// The version query string was empty.
    #[error("empty version query")]
    EmptyVersionQuery,

    /// A version query consisted of a bare operator with no version.
    #[error("version query has operator but no version: {input:?}")]
    MissingQueryVersion {
        /// The offending input.
        input: String,
    },

    /// The module name was empty.
    #[error("empty module name")]
    EmptyModuleName,

    /// The module name was not a dot-separated sequence of identifiers.
    #[error("invalid module name: {input:?}")]
    InvalidModuleName {
        /// The offending input.
        input: String,
    },

    /// A module id had an `@` with nothing after it.
    #[error("module id has '@' but no version: {input:?}")]
    DanglingVersion {
        /// The offending input.
        input: String,
    },
}
