//! # Input File Ranges
//!
//! A `Span` is a half open byte range `start..end` of the input file. Unlike
//! a slice it does not borrow the file, so it can be copied into every node
//! of the syntax tree and into diagnostics that outlive the source buffer.
//!
//! Nodes synthesized by the compiler carry the span of the construct that
//! caused them, or `Span::default()` when there is none.
use crate::AsciiFile;
use std::{
    cmp::{max, min},
    fmt,
};

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Span {
    start: usize,
    end: usize,
}

impl Span {
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            start: min(a, b),
            end: max(a, b),
        }
    }

    /// A span covering the single character at `offset`.
    pub fn at(offset: usize) -> Self {
        Self::new(offset, offset + 1)
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn combine(a: Span, b: Span) -> Span {
        Span {
            start: min(a.start, b.start),
            end: max(a.end, b.end),
        }
    }

    pub fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn is_multiline(&self, file: &AsciiFile<'_>) -> bool {
        file.position(self.start).row() != file.position(self.last()).row()
    }

    /// Offset of the last character inside the span.
    pub fn last(&self) -> usize {
        if self.is_empty() {
            self.start
        } else {
            self.end - 1
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_orders_bounds() {
        assert_eq!(Span::new(3, 7), Span::new(7, 3));
    }

    #[test]
    fn combine_covers_both() {
        let span = Span::combine(Span::new(2, 4), Span::new(8, 9));
        assert_eq!((2, 9), (span.start(), span.end()));
        assert!(span.contains(Span::at(5)));
    }

    #[test]
    fn multiline_detection() {
        let file = AsciiFile::new(b"ab\ncd").unwrap();
        assert!(!Span::new(0, 2).is_multiline(&file));
        assert!(Span::new(1, 4).is_multiline(&file));
        // a trailing newline does not make a span multiline
        assert!(!Span::new(0, 3).is_multiline(&file));
    }
}
