//! Type references for the Magik semantic model.
//!
//! A [`TypeString`] names a type the way type-doc comments write it:
//! `sw:rope`, `sw:property_list<K=sw:symbol, E=sw:integer>`,
//! `sw:integer|sw:float`, `_self`, `_undefined`. Values are plain data:
//! equality and hashing are structural, and every cross reference between
//! definitions goes through a `TypeString` key rather than a pointer.

use std::fmt;

use crate::error::TypeStringError;

/// The package every built-in exemplar lives in.
pub const SW_PACKAGE: &str = "sw";
/// The default package for user code.
pub const USER_PACKAGE: &str = "user";

/// A reference to a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeString {
    /// Nothing is known about the type.
    Undefined,
    /// The exemplar the expression is evaluated against (`_self`/`_clone`).
    SelfType,
    /// The type of `_unset`, rendered `sw:unset`.
    Unset,
    /// A named exemplar with generic bindings, e.g. `sw:simple_vector<E=sw:integer>`.
    Simple {
        package: String,
        identifier: String,
        generics: Vec<TypeString>,
    },
    /// An unbound generic parameter, `<E>`.
    GenericReference(String),
    /// A generic parameter bound to a type at an instantiation site, `E=sw:integer`.
    GenericDefinition(String, Box<TypeString>),
    /// The type of the argument passed for parameter `p`, `_parameter(p)`.
    ParameterReference(String),
    /// A union, `sw:integer|sw:float`.
    Combination(Vec<TypeString>),
}

impl TypeString {
    // ── Constructors ───────────────────────────────────────────────────

    /// A simple type without generic bindings. `sw:unset` normalizes to
    /// [`TypeString::Unset`].
    pub fn simple(package: impl Into<String>, identifier: impl Into<String>) -> TypeString {
        let package = package.into();
        let identifier = identifier.into();
        if package == SW_PACKAGE && identifier == "unset" {
            return TypeString::Unset;
        }
        TypeString::Simple {
            package,
            identifier,
            generics: Vec::new(),
        }
    }

    /// A simple type from a possibly qualified name; bare names get
    /// `current_package`.
    pub fn qualified(name: &str, current_package: &str) -> TypeString {
        match name.split_once(':') {
            Some((package, identifier)) => TypeString::simple(package, identifier),
            None => TypeString::simple(current_package, name),
        }
    }

    /// A type in the `sw` package.
    pub fn sw(identifier: &str) -> TypeString {
        TypeString::simple(SW_PACKAGE, identifier)
    }

    /// The same type with `generics` as its bindings. Non-simple types are
    /// returned unchanged.
    pub fn with_generics(self, generics: Vec<TypeString>) -> TypeString {
        match self {
            TypeString::Simple {
                package,
                identifier,
                ..
            } => TypeString::Simple {
                package,
                identifier,
                generics,
            },
            other => other,
        }
    }

    pub fn generic_definition(name: impl Into<String>, bound: TypeString) -> TypeString {
        TypeString::GenericDefinition(name.into(), Box::new(bound))
    }

    pub fn object() -> TypeString {
        TypeString::sw("object")
    }

    pub fn unset() -> TypeString {
        TypeString::Unset
    }

    /// The exemplar of `_true` and `_false`.
    pub fn boolean() -> TypeString {
        TypeString::sw("false")
    }

    pub fn maybe() -> TypeString {
        TypeString::sw("maybe")
    }

    pub fn integer() -> TypeString {
        TypeString::sw("integer")
    }

    pub fn bignum() -> TypeString {
        TypeString::sw("bignum")
    }

    pub fn float() -> TypeString {
        TypeString::sw("float")
    }

    pub fn character() -> TypeString {
        TypeString::sw("character")
    }

    pub fn char16_vector() -> TypeString {
        TypeString::sw("char16_vector")
    }

    pub fn symbol() -> TypeString {
        TypeString::sw("symbol")
    }

    pub fn simple_vector() -> TypeString {
        TypeString::sw("simple_vector")
    }

    pub fn procedure() -> TypeString {
        TypeString::sw("procedure")
    }

    pub fn condition() -> TypeString {
        TypeString::sw("condition")
    }

    pub fn sw_regexp() -> TypeString {
        TypeString::sw("sw_regexp")
    }

    pub fn indexed_format_mixin() -> TypeString {
        TypeString::sw("indexed_format_mixin")
    }

    pub fn slotted_format_mixin() -> TypeString {
        TypeString::sw("slotted_format_mixin")
    }

    pub fn global_variable() -> TypeString {
        TypeString::sw("global_variable")
    }

    pub fn enumeration_value() -> TypeString {
        TypeString::sw("enumeration_value")
    }

    // ── Combination ────────────────────────────────────────────────────

    /// Union of `types`: nested combinations are flattened, duplicates
    /// dropped keeping the first occurrence, a single member is returned
    /// as itself and an empty input yields `Undefined`.
    pub fn combine<I>(types: I) -> TypeString
    where
        I: IntoIterator<Item = TypeString>,
    {
        let mut members: Vec<TypeString> = Vec::new();
        for ts in types {
            match ts {
                TypeString::Combination(parts) => {
                    for part in parts {
                        if !members.contains(&part) {
                            members.push(part);
                        }
                    }
                }
                other => {
                    if !members.contains(&other) {
                        members.push(other);
                    }
                }
            }
        }
        match members.len() {
            0 => TypeString::Undefined,
            1 => members.pop().unwrap_or(TypeString::Undefined),
            _ => TypeString::Combination(members),
        }
    }

    /// Members of a combination, or the type itself.
    pub fn parts(&self) -> &[TypeString] {
        match self {
            TypeString::Combination(parts) => parts,
            other => std::slice::from_ref(other),
        }
    }

    // ── Predicates / accessors ─────────────────────────────────────────

    pub fn is_undefined(&self) -> bool {
        matches!(self, TypeString::Undefined)
    }

    pub fn is_self(&self) -> bool {
        matches!(self, TypeString::SelfType)
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, TypeString::Unset)
    }

    pub fn is_simple(&self) -> bool {
        matches!(self, TypeString::Simple { .. })
    }

    pub fn is_combined(&self) -> bool {
        matches!(self, TypeString::Combination(_))
    }

    pub fn is_generic_reference(&self) -> bool {
        matches!(self, TypeString::GenericReference(_))
    }

    pub fn is_generic_definition(&self) -> bool {
        matches!(self, TypeString::GenericDefinition(..))
    }

    pub fn is_parameter_reference(&self) -> bool {
        matches!(self, TypeString::ParameterReference(_))
    }

    pub fn package(&self) -> Option<&str> {
        match self {
            TypeString::Simple { package, .. } => Some(package),
            TypeString::Unset => Some(SW_PACKAGE),
            _ => None,
        }
    }

    pub fn identifier(&self) -> Option<&str> {
        match self {
            TypeString::Simple { identifier, .. } => Some(identifier),
            TypeString::Unset => Some("unset"),
            _ => None,
        }
    }

    /// `package:identifier` for simple types.
    pub fn full_name(&self) -> Option<String> {
        Some(format!("{}:{}", self.package()?, self.identifier()?))
    }

    /// Generic bindings of a simple type.
    pub fn generics(&self) -> &[TypeString] {
        match self {
            TypeString::Simple { generics, .. } => generics,
            _ => &[],
        }
    }

    /// `(name, bound)` for each `NAME=bound` binding.
    pub fn generic_definitions(&self) -> impl Iterator<Item = (&str, &TypeString)> + '_ {
        self.generics().iter().filter_map(|g| match g {
            TypeString::GenericDefinition(name, bound) => Some((name.as_str(), bound.as_ref())),
            _ => None,
        })
    }

    /// The same type with its bindings removed.
    pub fn without_generics(&self) -> TypeString {
        match self {
            TypeString::Simple {
                package,
                identifier,
                ..
            } => TypeString::simple(package.clone(), identifier.clone()),
            other => other.clone(),
        }
    }

    // ── Substitution ───────────────────────────────────────────────────

    /// Replace every occurrence of `from` with `to`, recursing into
    /// combinations, bindings and bounds. Combinations are renormalized.
    pub fn substitute(&self, from: &TypeString, to: &TypeString) -> TypeString {
        if self == from {
            return to.clone();
        }
        match self {
            TypeString::Simple {
                package,
                identifier,
                generics,
            } => TypeString::Simple {
                package: package.clone(),
                identifier: identifier.clone(),
                generics: generics.iter().map(|g| g.substitute(from, to)).collect(),
            },
            TypeString::GenericDefinition(name, bound) => {
                TypeString::generic_definition(name.clone(), bound.substitute(from, to))
            }
            TypeString::Combination(parts) => {
                TypeString::combine(parts.iter().map(|p| p.substitute(from, to)))
            }
            other => other.clone(),
        }
    }

    /// Replace generic references with the bound from `bindings`
    /// (`NAME=bound` entries). References without a binding become
    /// `Undefined`.
    pub fn substitute_generics(&self, bindings: &[TypeString]) -> TypeString {
        match self {
            TypeString::GenericReference(name) => bindings
                .iter()
                .find_map(|b| match b {
                    TypeString::GenericDefinition(bound_name, bound) if bound_name == name => {
                        Some(bound.as_ref().clone())
                    }
                    _ => None,
                })
                .unwrap_or(TypeString::Undefined),
            TypeString::Simple {
                package,
                identifier,
                generics,
            } => TypeString::Simple {
                package: package.clone(),
                identifier: identifier.clone(),
                generics: generics
                    .iter()
                    .map(|g| match g {
                        // A bare reference in a binding list keeps its name.
                        TypeString::GenericReference(name) => {
                            match g.substitute_generics(bindings) {
                                TypeString::Undefined => g.clone(),
                                bound => TypeString::generic_definition(name.clone(), bound),
                            }
                        }
                        other => other.substitute_generics(bindings),
                    })
                    .collect(),
            },
            TypeString::GenericDefinition(name, bound) => {
                TypeString::generic_definition(name.clone(), bound.substitute_generics(bindings))
            }
            TypeString::Combination(parts) => {
                TypeString::combine(parts.iter().map(|p| p.substitute_generics(bindings)))
            }
            other => other.clone(),
        }
    }

    // ── Parsing ────────────────────────────────────────────────────────

    /// Parse the type-doc syntax. Bare identifiers get `current_package`.
    ///
    /// ```text
    /// sw:property_list<K=sw:symbol, E=sw:integer>|_unset
    /// ```
    pub fn parse(text: &str, current_package: &str) -> Result<TypeString, TypeStringError> {
        let mut parser = TypeParser {
            text,
            pos: 0,
            package: current_package,
        };
        let ts = parser.parse_type(false)?;
        parser.skip_ws();
        if let Some(c) = parser.peek() {
            return Err(TypeStringError::Unexpected {
                found: c,
                offset: parser.pos,
                text: text.to_string(),
            });
        }
        Ok(ts)
    }
}

impl fmt::Display for TypeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeString::Undefined => write!(f, "_undefined"),
            TypeString::SelfType => write!(f, "_self"),
            TypeString::Unset => write!(f, "sw:unset"),
            TypeString::Simple {
                package,
                identifier,
                generics,
            } => {
                write!(f, "{package}:{identifier}")?;
                if !generics.is_empty() {
                    write!(f, "<")?;
                    for (i, g) in generics.iter().enumerate() {
                        if i > 0 {
                            write!(f, ",")?;
                        }
                        match g {
                            TypeString::GenericReference(name) => write!(f, "{name}")?,
                            other => write!(f, "{other}")?,
                        }
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            TypeString::GenericReference(name) => write!(f, "<{name}>"),
            TypeString::GenericDefinition(name, bound) => write!(f, "{name}={bound}"),
            TypeString::ParameterReference(name) => write!(f, "_parameter({name})"),
            TypeString::Combination(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, "|")?;
                    }
                    write!(f, "{part}")?;
                }
                Ok(())
            }
        }
    }
}

// ── Type text parser ───────────────────────────────────────────────────

struct TypeParser<'a> {
    text: &'a str,
    pos: usize,
    package: &'a str,
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '?' | '!' | ':')
}

impl<'a> TypeParser<'a> {
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), TypeStringError> {
        if self.eat(c) {
            Ok(())
        } else if self.peek().is_none() && c == '>' {
            Err(TypeStringError::UnbalancedGenerics {
                text: self.text.to_string(),
            })
        } else {
            Err(TypeStringError::Expected {
                expected: c,
                offset: self.pos,
                text: self.text.to_string(),
            })
        }
    }

    fn name(&mut self) -> Result<&'a str, TypeStringError> {
        self.skip_ws();
        let start = self.pos;
        while self.peek().is_some_and(is_name_char) {
            self.bump();
        }
        if start == self.pos {
            return Err(match self.peek() {
                Some(c) if c != '|' && c != ',' && c != '>' => TypeStringError::Unexpected {
                    found: c,
                    offset: self.pos,
                    text: self.text.to_string(),
                },
                _ => TypeStringError::EmptyIdentifier {
                    offset: self.pos,
                    text: self.text.to_string(),
                },
            });
        }
        Ok(&self.text[start..self.pos])
    }

    /// `part ('|' part)*`
    fn parse_type(&mut self, in_bindings: bool) -> Result<TypeString, TypeStringError> {
        let mut parts = vec![self.parse_part(in_bindings)?];
        while self.eat('|') {
            parts.push(self.parse_part(in_bindings)?);
        }
        Ok(TypeString::combine(parts))
    }

    fn parse_part(&mut self, in_bindings: bool) -> Result<TypeString, TypeStringError> {
        self.skip_ws();
        if self.eat('<') {
            let name = self.name()?;
            self.expect('>')?;
            return Ok(TypeString::GenericReference(name.to_string()));
        }

        let name = self.name()?;
        match name.to_ascii_lowercase().as_str() {
            "_undefined" => return Ok(TypeString::Undefined),
            "_self" | "_clone" => return Ok(TypeString::SelfType),
            "_unset" => return Ok(TypeString::Unset),
            "_parameter" => {
                self.expect('(')?;
                let param = self.name()?;
                self.expect(')')?;
                return Ok(TypeString::ParameterReference(param.to_string()));
            }
            _ => {}
        }

        let qualified = name.contains(':');
        if !qualified && self.eat('=') {
            let bound = self.parse_type(in_bindings)?;
            return Ok(TypeString::generic_definition(name, bound));
        }

        let mut generics = Vec::new();
        if self.eat('<') {
            loop {
                generics.push(self.parse_type(true)?);
                if !self.eat(',') {
                    break;
                }
            }
            self.expect('>')?;
        } else if in_bindings && !qualified {
            return Ok(TypeString::GenericReference(name.to_string()));
        }

        Ok(TypeString::qualified(name, self.package).with_generics(generics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> TypeString {
        TypeString::parse(text, USER_PACKAGE).unwrap()
    }

    #[test]
    fn structural_equality_through_bindings() {
        let a = parse("sw:property_list<K=sw:symbol,E=sw:list<E=sw:integer>>");
        let b = parse("sw:property_list<K=sw:symbol, E=sw:list<E=sw:integer>>");
        let c = parse("sw:property_list<K=sw:symbol,E=sw:list<E=sw:float>>");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, a.without_generics());
    }

    #[test]
    fn display_round_trips() {
        for text in [
            "sw:integer",
            "sw:integer|sw:float",
            "sw:simple_vector<E=sw:integer>",
            "sw:simple_vector<K,E>",
            "_undefined",
            "_self",
            "sw:unset",
            "_parameter(p)",
            "<E>",
            "sw:property_list<K=sw:symbol,E=sw:integer|sw:unset>",
        ] {
            let ts = parse(text);
            assert_eq!(ts.to_string(), text);
            assert_eq!(parse(&ts.to_string()), ts);
        }
    }

    #[test]
    fn keywords_and_bare_names() {
        assert_eq!(parse("_unset"), TypeString::Unset);
        assert_eq!(parse("_clone"), TypeString::SelfType);
        assert_eq!(parse("rope"), TypeString::simple("user", "rope"));
        assert_eq!(
            TypeString::parse("rope", "sw").unwrap(),
            TypeString::simple("sw", "rope")
        );
        assert_eq!(parse("sw:unset|_unset"), TypeString::Unset);
    }

    #[test]
    fn malformed_text_is_an_error() {
        assert!(matches!(
            TypeString::parse("sw:list<E=sw:integer", "sw"),
            Err(TypeStringError::UnbalancedGenerics { .. })
        ));
        assert!(matches!(
            TypeString::parse("sw:a|", "sw"),
            Err(TypeStringError::EmptyIdentifier { .. })
        ));
        assert!(matches!(
            TypeString::parse("_parameter(p", "sw"),
            Err(TypeStringError::Expected { expected: ')', .. })
        ));
        assert!(TypeString::parse("sw:a sw:b", "sw").is_err());
    }

    #[test]
    fn combine_flattens_and_dedups_in_order() {
        let a = TypeString::integer();
        let b = TypeString::char16_vector();
        let combined = TypeString::combine([
            a.clone(),
            TypeString::Combination(vec![b.clone(), a.clone()]),
            b.clone(),
        ]);
        assert_eq!(combined, TypeString::Combination(vec![a.clone(), b]));
        assert_eq!(TypeString::combine([a.clone(), a.clone()]), a);
        assert_eq!(TypeString::combine(Vec::new()), TypeString::Undefined);
    }

    #[test]
    fn direct_combination_is_not_normalized() {
        let single = TypeString::Combination(vec![TypeString::integer()]);
        assert_ne!(single, TypeString::integer());
        assert_eq!(single.parts(), &[TypeString::integer()]);
    }

    #[test]
    fn substitute_generics_binds_and_undefines() {
        let bindings = vec![TypeString::generic_definition("K", TypeString::symbol())];
        assert_eq!(
            TypeString::GenericReference("K".into()).substitute_generics(&bindings),
            TypeString::symbol()
        );
        assert_eq!(
            TypeString::GenericReference("E".into()).substitute_generics(&bindings),
            TypeString::Undefined
        );
        let list = parse("sw:list<K>|<K>");
        assert_eq!(
            list.substitute_generics(&bindings).to_string(),
            "sw:list<K=sw:symbol>|sw:symbol"
        );
    }

    #[test]
    fn substitute_self() {
        let ts = parse("_self|sw:unset");
        let rope = TypeString::sw("rope");
        assert_eq!(
            ts.substitute(&TypeString::SelfType, &rope),
            TypeString::Combination(vec![rope, TypeString::Unset])
        );
    }
}
