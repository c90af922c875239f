use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Half-open byte range `start..end` into one source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "span {start}..{end} is reversed");
        Self { start, end }
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Where a definition came from. Provenance only: definitions refer to
/// each other by name, never by location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Location {
    pub path: PathBuf,
    pub span: Span,
}

impl Location {
    pub fn new(path: impl Into<PathBuf>, span: Span) -> Self {
        Self {
            path: path.into(),
            span,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}..{}", self.path.display(), self.span.start, self.span.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_span_at_end_of_input() {
        let span = Span::new(12, 12);
        assert!(span.is_empty());
        assert_eq!(Span::new(3, 9).len(), 6);
    }

    #[test]
    fn spans_order_by_start_then_end() {
        let mut spans = vec![Span::new(4, 6), Span::new(0, 9), Span::new(0, 2)];
        spans.sort();
        assert_eq!(spans, vec![Span::new(0, 2), Span::new(0, 9), Span::new(4, 6)]);
    }

    #[test]
    fn location_display() {
        let location = Location::new("src/a.magik", Span::new(3, 9));
        assert_eq!(location.to_string(), "src/a.magik@3..9");
        assert_eq!(location.path(), Path::new("src/a.magik"));
    }
}
