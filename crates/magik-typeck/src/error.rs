//! Error types for the semantic model.
//!
//! Unresolved names are never errors here: they are answered with
//! `TypeString::Undefined` or empty collections. These types only cover
//! structurally malformed input.

use thiserror::Error;

use crate::type_string::TypeString;

/// A type string in a doc comment or type literal that cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeStringError {
    #[error("empty type name at offset {offset} in `{text}`")]
    EmptyIdentifier { offset: usize, text: String },

    #[error("unbalanced `<` in `{text}`")]
    UnbalancedGenerics { text: String },

    #[error("expected `{expected}` at offset {offset} in `{text}`")]
    Expected {
        expected: char,
        offset: usize,
        text: String,
    },

    #[error("unexpected `{found}` at offset {offset} in `{text}`")]
    Unexpected {
        found: char,
        offset: usize,
        text: String,
    },
}

/// A definition record that violates its construction invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    /// Exemplar identities are templates; bindings belong at use sites.
    #[error("exemplar identity `{0}` must not carry generic bindings")]
    GenericIdentity(TypeString),

    /// Only simple type strings name an exemplar.
    #[error("`{0}` cannot name an exemplar")]
    NotAnExemplarName(TypeString),
}
