//! Source locations.

use std::fmt;

/// Where a piece of template source starts, and how many bytes it covers.
///
/// Renders as `line:col`: the location prefix of every diagnostic line.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// 1-based line.
    pub line: u32,
    /// 1-based byte column within the line.
    pub col: u32,
    pub len: u32,
}

impl Span {
    #[inline]
    pub fn new(line: u32, col: u32, len: u32) -> Self {
        Self { line, col, len }
    }

    /// An empty span, used for end-of-input positions.
    #[inline]
    pub fn at(line: u32, col: u32) -> Self {
        Self::new(line, col, 0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Column just past the covered bytes, assuming they stay on one line.
    #[inline]
    pub fn end_col(&self) -> u32 {
        self.col + self.len
    }

    /// A `^~~~` marker as wide as the span, at least one caret.
    pub fn underline(&self) -> String {
        let tail = self.len.saturating_sub(1) as usize;
        let mut marker = String::with_capacity(tail + 1);
        marker.push('^');
        marker.extend(std::iter::repeat_n('~', tail));
        marker
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}+{}", self.line, self.col, self.len)
    }
}
