//! The diagnostics object collects the warnings and errors generated by the
//! semantic analysis of a compilation unit. Messages are accumulated while the
//! unit is analysed and rendered in one go when the unit is done, so that a
//! single run reports as many problems as possible.
//!
//! This implementation is NOT thread-safe.
pub mod lint;

use crate::lint::{Lint, LintId, LintLevel};
use asciifile::{AsciiFile, LineTruncation, MaybeSpanned, Span};
use failure::Fail;
use std::{
    ascii::escape_default,
    cell::{Cell, Ref, RefCell},
    collections::HashMap,
    fmt,
    io::Write,
};
use termcolor::{Color, WriteColor};
use utils::{color::ColorOutput, pad_left};

/// Instead of writing errors, warnings and lints generated in the different
/// compiler stages directly to stderr, they are collected in this object.
///
/// This has several advantages:
/// - the output level can be adapted by users.
/// - we have a single source responsible for formatting compiler messages.
/// - tests can inspect the structured messages instead of parsing text.
pub struct Diagnostics {
    messages: RefCell<Vec<Message>>,
    message_count: RefCell<HashMap<MessageLevel, usize>>,
    lint_levels: RefCell<HashMap<LintId, LintLevel>>,
    /// number of messages already written by `flush`
    flushed: Cell<usize>,
    max_errors: Cell<Option<usize>>,
    writer: RefCell<Box<dyn WriteColor>>,
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("messages", &self.messages.borrow().len())
            .field("errors", &self.count(MessageLevel::Error))
            .field("warnings", &self.count(MessageLevel::Warning))
            .finish()
    }
}

impl Diagnostics {
    pub fn new(writer: Box<dyn WriteColor>) -> Self {
        Self {
            messages: RefCell::new(Vec::new()),
            message_count: RefCell::new(HashMap::new()),
            lint_levels: RefCell::new(HashMap::new()),
            flushed: Cell::new(0),
            max_errors: Cell::new(None),
            writer: RefCell::new(writer),
        }
    }

    /// True when an error message was emitted, false
    /// if only warnings were emitted.
    pub fn errored(&self) -> bool {
        self.count(MessageLevel::Error) > 0
    }

    pub fn count(&self, level: MessageLevel) -> usize {
        self.message_count
            .borrow()
            .get(&level)
            .cloned()
            .unwrap_or(0)
    }

    /// All messages emitted so far, in emission order.
    pub fn messages(&self) -> Ref<'_, [Message]> {
        Ref::map(self.messages.borrow(), |messages| messages.as_slice())
    }

    /// Only the first `max` errors are written by `flush`. All errors are
    /// still counted.
    pub fn set_max_errors(&self, max: Option<usize>) {
        self.max_errors.set(max);
    }

    pub fn set_lint_level(&self, lint: &'static Lint, level: LintLevel) {
        self.lint_levels.borrow_mut().insert(LintId::of(lint), level);
    }

    pub fn lint_level(&self, lint: &'static Lint) -> LintLevel {
        self.lint_levels
            .borrow()
            .get(&LintId::of(lint))
            .cloned()
            .unwrap_or(lint.level)
    }

    /// Record an error or a warning. Nothing is written until `flush`.
    pub fn emit(&self, level: MessageLevel, msg: MaybeSpanned<failure::Error>) {
        let (span, kind) = msg.into_parts();
        self.messages.borrow_mut().push(Message {
            level,
            span,
            kind,
            lint: None,
        });
        self.increment_level_count(level);
    }

    pub fn error<F: Fail>(&self, span: Option<Span>, kind: F) {
        self.emit(MessageLevel::Error, maybe_spanned(span, kind))
    }

    pub fn warning<F: Fail>(&self, span: Option<Span>, kind: F) {
        self.emit(MessageLevel::Warning, maybe_spanned(span, kind))
    }

    /// Record a lint at its configured level. Allowed lints are dropped.
    pub fn lint<F: Fail>(&self, lint: &'static Lint, span: Option<Span>, kind: F) {
        if let Some(level) = self.lint_level(lint).message_level() {
            let (span, kind) = maybe_spanned(span, kind).into_parts();
            self.messages.borrow_mut().push(Message {
                level,
                span,
                kind,
                lint: Some(LintId::of(lint)),
            });
            self.increment_level_count(level);
        }
    }

    fn increment_level_count(&self, level: MessageLevel) {
        let mut message_count = self.message_count.borrow_mut();
        let counter = message_count.entry(level).or_insert(0);
        *counter += 1;
    }

    /// Write all messages that have not been written yet. Messages with a
    /// span get a source snippet when the file is known.
    pub fn flush(&self, file: Option<&AsciiFile<'_>>) {
        let messages = self.messages.borrow();
        let mut writer = self.writer.borrow_mut();
        let mut errors_written = messages[..self.flushed.get()]
            .iter()
            .filter(|msg| msg.level == MessageLevel::Error)
            .count();

        for msg in &messages[self.flushed.get()..] {
            if msg.level == MessageLevel::Error {
                if let Some(max) = self.max_errors.get() {
                    if errors_written >= max {
                        continue;
                    }
                }
                errors_written += 1;
            }

            match (msg.span, file) {
                (Some(span), Some(file)) => msg.write_colored_with_code(&mut **writer, file, span),
                _ => msg.write_colored(&mut **writer),
            }
        }
        self.flushed.set(messages.len());
    }

    pub fn write_statistics(&self) {
        let mut writer = self.writer.borrow_mut();
        let mut output = ColorOutput::new(&mut **writer);

        if self.errored() {
            output.paint(MessageLevel::Error.color(), true);
            writeln!(
                output.writer(),
                "Compilation aborted due to {}",
                match self.count(MessageLevel::Error) {
                    1 => "an error".to_string(),
                    n => format!("{} errors", n),
                }
            )
            .ok();
        } else {
            output.paint(Some(Color::Green), true);
            writeln!(
                output.writer(),
                "Compilation finished successfully {}",
                match self.count(MessageLevel::Warning) {
                    0 => "without warnings".to_string(),
                    1 => "with a warning".to_string(),
                    n => format!("with {} warnings", n),
                }
            )
            .ok();
        }
    }
}

fn maybe_spanned<F: Fail>(span: Option<Span>, kind: F) -> MaybeSpanned<failure::Error> {
    let kind = failure::Error::from(kind);
    match span {
        Some(span) => MaybeSpanned::WithSpan(asciifile::Spanned::new(span, kind)),
        None => MaybeSpanned::WithoutSpan(kind),
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MessageLevel {
    Error,
    Warning,
}

impl MessageLevel {
    fn color(self) -> Option<Color> {
        // Don't be confused by the return type. `None` means default color!
        match self {
            MessageLevel::Error => Some(Color::Red),
            MessageLevel::Warning => Some(Color::Yellow),
        }
    }

    fn name(self) -> &'static str {
        match self {
            MessageLevel::Error => "error",
            MessageLevel::Warning => "warning",
        }
    }
}

/// A (severity, source location, message) triple.
#[derive(Debug)]
pub struct Message {
    pub level: MessageLevel,
    pub span: Option<Span>,
    pub kind: failure::Error,
    pub lint: Option<LintId>,
}

impl Message {
    /// The structured error, if it is of type `F`.
    pub fn downcast_ref<F: Fail>(&self) -> Option<&F> {
        self.kind.downcast_ref::<F>()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.level.name(), self.kind)
    }
}

const MAX_CONTEXT_LENGTH: usize = 80;
const TAB_WIDTH: usize = 4;
const HIGHLIGHT: Option<Color> = Some(Color::Cyan);

impl Message {
    fn write_colored(&self, writer: &mut dyn WriteColor) {
        self.write_colored_header(writer);
        writeln!(writer).ok();
    }

    fn write_colored_header(&self, writer: &mut dyn WriteColor) {
        let mut output = ColorOutput::new(writer);
        output.paint(self.level.color(), true);
        write!(output.writer(), "{}: ", self.level.name()).ok();

        output.set_color(None);
        match self.lint {
            Some(lint) => writeln!(output.writer(), "{} [{}]", self.kind, lint).ok(),
            None => writeln!(output.writer(), "{}", self.kind).ok(),
        };
    }

    fn write_colored_with_code(&self, writer: &mut dyn WriteColor, file: &AsciiFile<'_>, span: Span) {
        self.write_colored_header(writer);

        let mut output = ColorOutput::new(writer);
        let start = file.position(span.start());
        let end = file.position(span.last());

        let line_number_width = end.line_number().to_string().len();

        // NOTE: this has to be the same width as the line_marker with
        // line numbers, otherwise the indicators are misaligned.
        let empty_line_marker = format!(" {} | ", " ".repeat(line_number_width));
        let truncation_str = "...";

        output.paint(HIGHLIGHT, true);
        writeln!(output.writer(), "{}", empty_line_marker).ok();

        // Multiline spans only show their first line, the marker extends to
        // its end.
        let from = start.column().saturating_sub(MAX_CONTEXT_LENGTH / 2);
        let (truncation_before, src_line, truncation_after) =
            match file.line_excerpt(start.row(), from, MAX_CONTEXT_LENGTH) {
                Some(excerpt) => excerpt,
                None => return,
            };

        write!(
            output.writer(),
            " {} | ",
            pad_left(&start.line_number().to_string(), line_number_width)
        )
        .ok();

        if truncation_before == LineTruncation::Truncated {
            write!(output.writer(), "{}", truncation_str).ok();
        }

        output.plain();

        let formatter = LineFormatter::new(src_line);
        formatter.render(output.writer());

        if truncation_after == LineTruncation::Truncated {
            output.paint(HIGHLIGHT, true);
            write!(output.writer(), "{}", truncation_str).ok();
        }
        writeln!(output.writer()).ok();

        // add positional indicators.
        output.paint(HIGHLIGHT, true);
        write!(output.writer(), "{}", empty_line_marker).ok();

        let offset = if truncation_before == LineTruncation::Truncated {
            truncation_str.len()
        } else {
            0
        };
        let marker_start = start.column() - from;
        let marker_end = if start.row() == end.row() {
            (end.column() - from + 1).min(src_line.len())
        } else {
            src_line.len()
        };
        let first = formatter.get_actual_column(marker_start.min(src_line.len()));
        let last = formatter.get_actual_column(marker_end.max(marker_start).min(src_line.len()));

        output.set_color(self.level.color());
        writeln!(
            output.writer(),
            "{spaces}{markers}",
            spaces = " ".repeat(offset + first),
            markers = "^".repeat((last - first).max(1))
        )
        .ok();

        writeln!(output.writer()).ok();
    }
}

pub fn u8_to_printable_representation(byte: u8) -> String {
    escape_default(byte).map(char::from).collect()
}

struct LineFormatter<'a> {
    line: &'a str,
}

impl<'a> LineFormatter<'a> {
    fn new(line: &'a str) -> Self {
        Self { line }
    }

    fn render(&self, writer: &mut dyn WriteColor) {
        let mut output = ColorOutput::new(writer);

        for chr in self.line.chars() {
            let (text, color) = self.render_char(chr);
            output.set_color(color);
            write!(output.writer(), "{}", text).ok();
        }
    }

    /// Each printed character does not actually take up monospace grid cell,
    /// for example a TAB character may be represented by 4 spaces. This
    /// function will return the actual number of monospace grid cells
    /// rendered before the given position.
    fn get_actual_column(&self, col: usize) -> usize {
        self.line[0..col.min(self.line.len())]
            .chars()
            .map(|chr| self.render_char(chr).0.len())
            .sum()
    }

    fn render_char(&self, chr: char) -> (String, Option<Color>) {
        match chr {
            '\t' => (" ".repeat(TAB_WIDTH), None),
            '\r' => ("".to_string(), None),
            chr if chr.is_control() => (
                format!("{{{}}}", u8_to_printable_representation(chr as u8)),
                HIGHLIGHT,
            ),
            _ => (chr.to_string(), None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use termcolor::Buffer;

    #[derive(Debug, Fail)]
    #[fail(display = "cannot find symbol `{}`", _0)]
    struct Unresolved(String);

    /// A writer whose content can be read after the diagnostics took
    /// ownership of it.
    #[derive(Clone, Default)]
    struct SharedBuffer(std::rc::Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl WriteColor for SharedBuffer {
        fn supports_color(&self) -> bool {
            false
        }

        fn set_color(&mut self, _spec: &termcolor::ColorSpec) -> std::io::Result<()> {
            Ok(())
        }

        fn reset(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    static TEST_LINT: &Lint = &Lint {
        name: "TEST_LINT",
        level: LintLevel::Warn,
        desc: "a lint used by the tests of this crate",
    };

    #[test]
    fn counts_levels() {
        let diagnostics = Diagnostics::new(Box::new(Buffer::no_color()));
        assert!(!diagnostics.errored());
        diagnostics.warning(None, Unresolved("a".to_string()));
        assert!(!diagnostics.errored());
        diagnostics.error(Some(Span::new(0, 1)), Unresolved("b".to_string()));
        assert!(diagnostics.errored());
        assert_eq!(1, diagnostics.count(MessageLevel::Error));
        assert_eq!(1, diagnostics.count(MessageLevel::Warning));

        let messages = diagnostics.messages();
        assert_eq!(2, messages.len());
        assert_eq!(Some(Span::new(0, 1)), messages[1].span);
        assert_eq!(
            "b",
            messages[1].downcast_ref::<Unresolved>().unwrap().0.as_str()
        );
    }

    #[test]
    fn renders_snippet_at_end_of_unit() {
        let buffer = SharedBuffer::default();
        let diagnostics = Diagnostics::new(Box::new(buffer.clone()));
        let file = AsciiFile::new(b"class A {\n  Foo x;\n}\n").unwrap();

        diagnostics.error(Some(Span::new(12, 15)), Unresolved("Foo".to_string()));
        assert!(buffer.0.borrow().is_empty());

        diagnostics.flush(Some(&file));
        let text = String::from_utf8(buffer.0.borrow().clone()).unwrap();
        assert!(text.contains("error: cannot find symbol `Foo`"));
        assert!(text.contains(" 2 |   Foo x;"));
        assert!(text.contains("   |   ^^^"));

        // nothing is written twice
        diagnostics.flush(Some(&file));
        let again = String::from_utf8(buffer.0.borrow().clone()).unwrap();
        assert_eq!(text, again);
    }

    #[test]
    fn max_errors_limits_output_but_not_counting() {
        let buffer = SharedBuffer::default();
        let diagnostics = Diagnostics::new(Box::new(buffer.clone()));
        diagnostics.set_max_errors(Some(1));
        diagnostics.error(None, Unresolved("a".to_string()));
        diagnostics.error(None, Unresolved("b".to_string()));
        diagnostics.flush(None);

        let text = String::from_utf8(buffer.0.borrow().clone()).unwrap();
        assert!(text.contains("`a`"));
        assert!(!text.contains("`b`"));
        assert_eq!(2, diagnostics.count(MessageLevel::Error));
    }

    #[test]
    fn lint_levels_can_be_overridden() {
        let diagnostics = Diagnostics::new(Box::new(Buffer::no_color()));
        diagnostics.lint(TEST_LINT, None, Unresolved("x".to_string()));
        assert_eq!(1, diagnostics.count(MessageLevel::Warning));

        diagnostics.set_lint_level(TEST_LINT, LintLevel::Allow);
        diagnostics.lint(TEST_LINT, None, Unresolved("x".to_string()));
        assert_eq!(1, diagnostics.messages().len());

        diagnostics.set_lint_level(TEST_LINT, LintLevel::Deny);
        diagnostics.lint(TEST_LINT, None, Unresolved("x".to_string()));
        assert!(diagnostics.errored());
        assert_eq!("test_lint", diagnostics.messages()[1].lint.unwrap().to_string());
    }

    #[test]
    fn statistics_summarise_the_unit() {
        let buffer = SharedBuffer::default();
        let diagnostics = Diagnostics::new(Box::new(buffer.clone()));
        diagnostics.warning(None, Unresolved("a".to_string()));
        diagnostics.write_statistics();
        diagnostics.error(None, Unresolved("b".to_string()));
        diagnostics.error(None, Unresolved("c".to_string()));
        diagnostics.write_statistics();

        let text = String::from_utf8(buffer.0.borrow().clone()).unwrap();
        assert!(text.contains("Compilation finished successfully with a warning"));
        assert!(text.contains("Compilation aborted due to 2 errors"));
    }
}
