//! Rowan-based concrete syntax tree types for Magik.
//!
//! Defines the `MagikLanguage` marker type that connects [`SyntaxKind`] to
//! rowan's generic tree infrastructure, plus type aliases for convenience.

use crate::syntax_kind::SyntaxKind;

/// Marker type for Magik in rowan's generic tree system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MagikLanguage {}

impl rowan::Language for MagikLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        assert!(raw.0 <= SyntaxKind::PROTECTION_CLAUSE as u16);
        // Safety: SyntaxKind is #[repr(u16)] with contiguous discriminants
        // and the bound is checked above. Rowan only stores kinds that we
        // previously gave it via kind_to_raw.
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        rowan::SyntaxKind(kind as u16)
    }
}

/// A CST node (interior node with children).
pub type SyntaxNode = rowan::SyntaxNode<MagikLanguage>;

/// A CST token (leaf node with text).
pub type SyntaxToken = rowan::SyntaxToken<MagikLanguage>;

/// Either a node or a token in the CST.
pub type SyntaxElement = rowan::SyntaxElement<MagikLanguage>;
