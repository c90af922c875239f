//! Types of the values an expression or method produces.
//!
//! Magik expressions and methods can produce several values. An
//! [`ExpressionResultString`] lists the type of each position; positions
//! past the end are answered with a caller-chosen default (usually
//! `sw:unset`, since extra requested values are unset at run time).

use std::fmt;

use crate::type_string::TypeString;

/// Ordered types of consecutive result slots.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExpressionResultString {
    types: Vec<TypeString>,
    /// Unknown and unbounded: every position is `Undefined`.
    undefined: bool,
}

impl ExpressionResultString {
    /// Nothing is known about any position.
    pub const UNDEFINED: ExpressionResultString = ExpressionResultString {
        types: Vec::new(),
        undefined: true,
    };

    /// No values at all.
    pub const EMPTY: ExpressionResultString = ExpressionResultString {
        types: Vec::new(),
        undefined: false,
    };

    pub fn new(types: Vec<TypeString>) -> Self {
        Self {
            types,
            undefined: false,
        }
    }

    pub fn single(ts: TypeString) -> Self {
        Self::new(vec![ts])
    }

    pub fn is_undefined(&self) -> bool {
        self.undefined
    }

    pub fn is_empty(&self) -> bool {
        !self.undefined && self.types.is_empty()
    }

    /// Number of explicit positions.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn types(&self) -> &[TypeString] {
        &self.types
    }

    /// The type at `index`, or `default` past the explicit entries.
    /// `UNDEFINED` answers `Undefined` everywhere.
    pub fn get(&self, index: usize, default: TypeString) -> TypeString {
        if self.undefined {
            return TypeString::Undefined;
        }
        self.types.get(index).cloned().unwrap_or(default)
    }

    /// The first value's type, unset when there are no values.
    pub fn first(&self) -> TypeString {
        self.get(0, TypeString::Unset)
    }

    /// Position-wise union. Missing positions count as `sw:unset`; any
    /// position of `UNDEFINED` counts as `_undefined`.
    pub fn combine(&self, other: &ExpressionResultString) -> ExpressionResultString {
        if self.undefined && other.undefined {
            return Self::UNDEFINED;
        }
        let width = self.types.len().max(other.types.len());
        let types = (0..width)
            .map(|i| {
                TypeString::combine([
                    self.get(i, TypeString::Unset),
                    other.get(i, TypeString::Unset),
                ])
            })
            .collect();
        Self::new(types)
    }

    pub fn substitute(&self, from: &TypeString, to: &TypeString) -> ExpressionResultString {
        self.map(|ts| ts.substitute(from, to))
    }

    pub fn substitute_generics(&self, bindings: &[TypeString]) -> ExpressionResultString {
        self.map(|ts| ts.substitute_generics(bindings))
    }

    /// Apply `f` to every explicit position.
    pub fn map(&self, f: impl Fn(&TypeString) -> TypeString) -> ExpressionResultString {
        if self.undefined {
            return Self::UNDEFINED;
        }
        Self::new(self.types.iter().map(f).collect())
    }
}

impl Default for ExpressionResultString {
    fn default() -> Self {
        Self::UNDEFINED
    }
}

impl From<TypeString> for ExpressionResultString {
    fn from(ts: TypeString) -> Self {
        Self::single(ts)
    }
}

impl fmt::Display for ExpressionResultString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.undefined {
            return write!(f, "UNDEFINED");
        }
        for (i, ts) in self.types.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{ts}")?;
        }
        Ok(())
    }
}
