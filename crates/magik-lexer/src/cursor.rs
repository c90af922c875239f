//! Read position over Magik source text.

/// A forward-only position in the source. Offsets are UTF-8 byte offsets
/// and always sit on a character boundary.
pub(crate) struct Cursor<'src> {
    source: &'src str,
    offset: usize,
}

impl<'src> Cursor<'src> {
    pub(crate) fn new(source: &'src str) -> Self {
        Self { source, offset: 0 }
    }

    fn rest(&self) -> &'src str {
        self.source.get(self.offset..).unwrap_or_default()
    }

    pub(crate) fn offset(&self) -> u32 {
        self.offset as u32
    }

    /// The unconsumed character `n` places ahead; `lookahead(0)` is the
    /// next one.
    pub(crate) fn lookahead(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    pub(crate) fn first(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub(crate) fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    pub(crate) fn bump(&mut self) -> Option<char> {
        let c = self.first()?;
        self.offset += c.len_utf8();
        Some(c)
    }

    /// Consume `c` if it is next.
    pub(crate) fn bump_if(&mut self, c: char) -> bool {
        if self.first() == Some(c) {
            self.offset += c.len_utf8();
            true
        } else {
            false
        }
    }

    /// Consume `prefix` if the input continues with it, e.g. the `<<` of
    /// an augmented assignment.
    pub(crate) fn eat(&mut self, prefix: &str) -> bool {
        if self.starts_with(prefix) {
            self.offset += prefix.len();
            true
        } else {
            false
        }
    }

    pub(crate) fn bump_while(&mut self, predicate: impl Fn(char) -> bool) {
        let rest = self.rest();
        let taken = rest.find(|c| !predicate(c)).unwrap_or(rest.len());
        self.offset += taken;
    }

    /// Source text from `start` up to the current offset.
    pub(crate) fn since(&self, start: u32) -> &'src str {
        self.source.get(start as usize..self.offset).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookahead_leaves_the_offset() {
        let cursor = Cursor::new("_self");
        assert_eq!(cursor.first(), Some('_'));
        assert_eq!(cursor.lookahead(1), Some('s'));
        assert_eq!(cursor.lookahead(5), None);
        assert_eq!(cursor.offset(), 0);
    }

    #[test]
    fn eat_takes_whole_operators_only() {
        let mut cursor = Cursor::new("^<< b");
        assert!(!cursor.eat("^<<<"));
        assert_eq!(cursor.offset(), 0);
        assert!(cursor.eat("^<<"));
        assert_eq!(cursor.offset(), 3);
        assert!(cursor.bump_if(' '));
        assert!(!cursor.bump_if(' '));
    }

    #[test]
    fn offsets_count_bytes() {
        let mut cursor = Cursor::new("\u{00E9}t\u{00E9}:x");
        cursor.bump_while(|c| c != ':');
        assert_eq!(cursor.offset(), 5);
        assert_eq!(cursor.since(0), "\u{00E9}t\u{00E9}");
        assert_eq!(cursor.bump(), Some(':'));
        assert_eq!(cursor.bump(), Some('x'));
        assert_eq!(cursor.bump(), None);
        assert_eq!(cursor.offset(), 7);
    }

    #[test]
    fn predicates_run_to_the_end() {
        let mut cursor = Cursor::new("empty?");
        cursor.bump_while(|c| c.is_alphanumeric() || c == '?');
        assert_eq!(cursor.since(0), "empty?");
        assert_eq!(cursor.first(), None);
    }
}
