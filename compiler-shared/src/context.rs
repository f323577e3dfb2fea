//! State shared by the phases of the semantic analysis of one unit.
use asciifile::AsciiFile;
use diagnostics::Diagnostics;
use termcolor::WriteColor;

pub struct Context<'m> {
    /// Source text of the unit, if the tree was parsed from one. Trees
    /// assembled in memory have no file; their diagnostics are rendered
    /// without snippets.
    pub file: Option<&'m AsciiFile<'m>>,
    pub diagnostics: Diagnostics,
}

impl<'m> Context<'m> {
    pub fn new(file: Option<&'m AsciiFile<'m>>, writer: Box<dyn WriteColor>) -> Self {
        Self {
            file,
            diagnostics: Diagnostics::new(writer),
        }
    }

    pub fn dummy() -> Self {
        Self::new(None, Box::new(dummy_writer()))
    }

    /// Write every pending diagnostic of the unit.
    pub fn report(&self) {
        self.diagnostics.flush(self.file);
    }
}

// dummy_writer returns a WriteColor meant for use in tests.
pub fn dummy_writer() -> impl termcolor::WriteColor {
    termcolor::Buffer::no_color()
}
