use crate::{Position, Span};
use failure::Fail;
use std::ops::Deref;

#[derive(Debug)]
pub struct AsciiFile<'m> {
    mapping: &'m [u8],
    /// byte offset of the first character of every line
    line_starts: Vec<usize>,
}

#[derive(Debug, Fail)]
pub enum EncodingError {
    #[fail(
        display = "input contains non-ascii character at byte offset {}: {}<?>",
        position, prev
    )]
    NotAscii { position: usize, prev: String },
}

const ENCODING_ERROR_MAX_CONTEXT_LENGTH: usize = 80;

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum LineTruncation {
    Truncated,
    NotTruncated,
}

impl<'m> AsciiFile<'m> {
    // cost: O(fileLen) since we need to check if all chars are ASCII
    pub fn new(mapping: &'m [u8]) -> Result<AsciiFile<'m>, EncodingError> {
        if let Some(position) = mapping.iter().position(|c| !c.is_ascii()) {
            let region_start = position.saturating_sub(ENCODING_ERROR_MAX_CONTEXT_LENGTH);
            let line_start = mapping[region_start..position]
                .iter()
                .rposition(|&chr| chr == b'\n')
                .map(|pos| pos + region_start + 1);
            let (dots, start) = match line_start {
                Some(start) => ("", start),
                None if region_start > 0 => ("...", region_start),
                None => ("", 0),
            };
            // everything before `position` is ASCII
            let prev = String::from_utf8_lossy(&mapping[start..position]);
            return Err(EncodingError::NotAscii {
                position,
                prev: format!("{}{}", dots, prev),
            });
        }

        let line_starts = std::iter::once(0)
            .chain(
                mapping
                    .iter()
                    .enumerate()
                    .filter(|(_, &chr)| chr == b'\n')
                    .map(|(idx, _)| idx + 1),
            )
            .collect();

        Ok(AsciiFile {
            mapping,
            line_starts,
        })
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Row/column view of `byte_offset`. Offsets past the end are clamped
    /// to the end of the file.
    pub fn position(&self, byte_offset: usize) -> Position {
        let byte_offset = byte_offset.min(self.mapping.len());
        let row = match self.line_starts.binary_search(&byte_offset) {
            Ok(row) => row,
            Err(next_row) => next_row - 1,
        };
        Position::new(byte_offset, row, byte_offset - self.line_starts[row])
    }

    /// The text of the given (zero based) row without its trailing newline.
    pub fn line(&self, row: usize) -> Option<&str> {
        let start = *self.line_starts.get(row)?;
        let end = self
            .line_starts
            .get(row + 1)
            .map(|next| next - 1)
            .unwrap_or_else(|| self.mapping.len());
        Some(&self[start..end])
    }

    /// Like `line`, but at most `max_len` characters wide starting at
    /// column `from`.
    pub fn line_excerpt(
        &self,
        row: usize,
        from: usize,
        max_len: usize,
    ) -> Option<(LineTruncation, &str, LineTruncation)> {
        let line = self.line(row)?;
        let from = from.min(line.len());
        let to = (from + max_len).min(line.len());
        let before = if from > 0 {
            LineTruncation::Truncated
        } else {
            LineTruncation::NotTruncated
        };
        let after = if to < line.len() {
            LineTruncation::Truncated
        } else {
            LineTruncation::NotTruncated
        };
        Some((before, &line[from..to], after))
    }

    pub fn slice(&self, span: Span) -> &str {
        let end = span.end().min(self.mapping.len());
        let start = span.start().min(end);
        &self[start..end]
    }
}

impl<'m> Deref for AsciiFile<'m> {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        // checked in `new`: ASCII is valid UTF-8
        std::str::from_utf8(self.mapping).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_ascii() {
        let err = AsciiFile::new("ab\ncd\u{e4}".as_bytes()).unwrap_err();
        match err {
            EncodingError::NotAscii { position, prev } => {
                assert_eq!(5, position);
                assert_eq!("cd", prev);
            }
        }
    }

    #[test]
    fn positions_know_their_row_and_column() {
        let file = AsciiFile::new(b"class A {\n  int x;\n}").unwrap();
        let pos = file.position(12);
        assert_eq!((1, 2), (pos.row(), pos.column()));
        assert_eq!("2:3", pos.to_string());
        assert_eq!(0, file.position(0).row());
        assert_eq!(2, file.position(19).row());
    }

    #[test]
    fn lines_exclude_newlines() {
        let file = AsciiFile::new(b"banana\napple\n\nkiwi").unwrap();
        let lines = (0..5).map(|row| file.line(row)).collect::<Vec<_>>();
        assert_eq!(
            vec![Some("banana"), Some("apple"), Some(""), Some("kiwi"), None],
            lines
        );
    }

    #[test]
    fn slices_by_span() {
        let file = AsciiFile::new(b"int x = 5;").unwrap();
        assert_eq!("x", file.slice(Span::new(4, 5)));
        assert_eq!("", file.slice(Span::new(40, 50)));
    }
}
