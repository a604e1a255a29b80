/// Position-tracking view over template source.
///
/// Template text is mostly literal, so the lexer never walks it a char at a
/// time: it searches for the next delimiter with [`Cursor::find`] and jumps
/// there with [`Cursor::advance_bytes`], which keeps line and column current.
pub struct Cursor<'src> {
    rest: &'src str,
    offset: u32,
    line: u32,
    /// Byte column, 1-based.
    column: u32,
}

impl<'src> Cursor<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            rest: source,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// Bytes consumed so far.
    #[inline]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    #[inline]
    pub fn line(&self) -> u32 {
        self.line
    }

    #[inline]
    pub fn column(&self) -> u32 {
        self.column
    }

    /// The unconsumed source.
    #[inline]
    pub fn rest(&self) -> &'src str {
        self.rest
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.rest.is_empty()
    }

    #[inline]
    pub fn check_str(&self, prefix: &str) -> bool {
        self.rest.starts_with(prefix)
    }

    /// Bytes between the cursor and the next `needle`.
    #[inline]
    pub fn find(&self, needle: &str) -> Option<usize> {
        self.rest.find(needle)
    }

    /// Consume `prefix` if the source continues with it.
    #[inline]
    pub fn eat_str(&mut self, prefix: &str) -> bool {
        let matched = self.check_str(prefix);
        if matched {
            self.advance_bytes(prefix.len());
        }
        matched
    }

    /// Consume `n` bytes and return them.
    ///
    /// `n` must fall on a char boundary, which any offset from
    /// [`Cursor::find`] does.
    pub fn advance_bytes(&mut self, n: usize) -> &'src str {
        debug_assert!(self.rest.is_char_boundary(n));

        let (consumed, rest) = self.rest.split_at(n);
        match consumed.rfind('\n') {
            Some(last_newline) => {
                self.line += consumed.matches('\n').count() as u32;
                self.column = (consumed.len() - last_newline) as u32;
            }
            None => self.column += n as u32,
        }

        self.rest = rest;
        self.offset += n as u32;
        consumed
    }

    pub fn advance_to_end(&mut self) -> &'src str {
        self.advance_bytes(self.rest.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eat_str_consumes_only_on_match() {
        let mut cursor = Cursor::new("{{~name}}");

        assert!(cursor.eat_str("{{"));
        assert!(!cursor.eat_str("{{"));
        assert!(cursor.eat_str("~"));
        assert_eq!(cursor.rest(), "name}}");
        assert_eq!(cursor.offset(), 3);
    }

    #[test]
    fn find_then_jump() {
        let mut cursor = Cursor::new("Hello {{name}}");

        let n = cursor.find("{{").unwrap();
        assert_eq!(cursor.advance_bytes(n), "Hello ");
        assert!(cursor.check_str("{{name"));
        assert_eq!(cursor.column(), 7);
    }

    #[test]
    fn columns_count_bytes() {
        let mut cursor = Cursor::new("héllo{{");
        cursor.advance_bytes(cursor.find("{{").unwrap());

        assert_eq!(cursor.offset(), 6);
        assert_eq!(cursor.column(), 7);
    }

    #[test]
    fn newlines_reset_the_column() {
        let mut cursor = Cursor::new("ab\ncd\n\nxyz");

        cursor.advance_bytes(2);
        assert_eq!((cursor.line(), cursor.column()), (1, 3));

        cursor.advance_bytes(1);
        assert_eq!((cursor.line(), cursor.column()), (2, 1));

        cursor.advance_bytes(5);
        assert_eq!((cursor.line(), cursor.column()), (4, 2));
    }

    #[test]
    fn advance_to_end_drains() {
        let mut cursor = Cursor::new("tail\ntext");
        assert_eq!(cursor.advance_to_end(), "tail\ntext");
        assert!(cursor.is_eof());
        assert_eq!((cursor.line(), cursor.column()), (2, 5));
    }
}
