//! Styled terminal output for diagnostics.
//!
//! A `ColorOutput` borrows the raw writer for one rendering step and resets
//! the terminal style when it is dropped, so a message that stops halfway
//! never leaves the terminal colored. Styling errors are ignored: output
//! without colors is still output.
use termcolor::{Color, ColorSpec, WriteColor};

pub struct ColorOutput<'a> {
    writer: &'a mut dyn WriteColor,
    spec: ColorSpec,
}

impl<'a> ColorOutput<'a> {
    pub fn new(writer: &'a mut dyn WriteColor) -> Self {
        writer.reset().ok();
        ColorOutput {
            writer,
            spec: ColorSpec::new(),
        }
    }

    /// Foreground color and weight in one step.
    pub fn paint(&mut self, color: Option<Color>, bold: bool) {
        self.spec.set_fg(color).set_bold(bold);
        self.apply();
    }

    /// Keeps the weight, changes the foreground.
    pub fn set_color(&mut self, color: Option<Color>) {
        self.spec.set_fg(color);
        self.apply();
    }

    pub fn set_bold(&mut self, bold: bool) {
        self.spec.set_bold(bold);
        self.apply();
    }

    pub fn plain(&mut self) {
        self.spec.clear();
        self.writer.reset().ok();
    }

    pub fn writer(&mut self) -> &mut dyn WriteColor {
        self.writer
    }

    fn apply(&mut self) {
        self.writer.set_color(&self.spec).ok();
    }
}

impl Drop for ColorOutput<'_> {
    fn drop(&mut self) {
        self.writer.reset().ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use termcolor::Buffer;

    #[test]
    fn uncolored_buffers_receive_plain_text() {
        let mut buffer = Buffer::no_color();
        {
            let mut output = ColorOutput::new(&mut buffer);
            output.paint(Some(Color::Red), true);
            write!(output.writer(), "error").ok();
            output.plain();
            write!(output.writer(), ": oops").ok();
        }
        assert_eq!(b"error: oops", buffer.as_slice());
    }

    #[test]
    fn ansi_output_is_reset_on_drop() {
        let mut buffer = Buffer::ansi();
        {
            let mut output = ColorOutput::new(&mut buffer);
            output.set_color(Some(Color::Green));
            write!(output.writer(), "ok").ok();
        }
        let text = String::from_utf8_lossy(buffer.as_slice()).to_string();
        assert!(text.contains("ok"));
        assert!(text.ends_with("\x1b[0m"));
    }
}
