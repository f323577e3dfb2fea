//! Row/column view of a byte offset.
//!
//! Rows and columns are zero indexed. This means that the first character of
//! a file is positioned at column 0 in row 0. `Display` prints the one based
//! line number, which is what users expect to see.
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    byte_offset: usize,
    row: usize,
    column: usize,
}

impl Position {
    pub(crate) fn new(byte_offset: usize, row: usize, column: usize) -> Self {
        Self {
            byte_offset,
            row,
            column,
        }
    }

    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    pub fn row(&self) -> usize {
        self.row
    }

    /// Identical to `row() + 1`
    pub fn line_number(&self) -> usize {
        self.row + 1
    }

    pub fn column(&self) -> usize {
        self.column
    }
}

impl fmt::Display for Position {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{}:{}", self.line_number(), self.column + 1)
    }
}
