use super::MessageLevel;
use serde_derive::{Deserialize, Serialize};
use std::{
    fmt,
    hash::{Hash, Hasher},
};

pub type LintArray = Vec<&'static Lint>;

/// How a lint is reported. `Allow` silences it, `Deny` turns it into an
/// error that fails the compilation unit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LintLevel {
    Allow,
    Warn,
    Deny,
}

impl LintLevel {
    pub fn message_level(self) -> Option<MessageLevel> {
        match self {
            LintLevel::Allow => None,
            LintLevel::Warn => Some(MessageLevel::Warning),
            LintLevel::Deny => Some(MessageLevel::Error),
        }
    }
}

#[derive(Debug, Copy, Clone)]
pub struct Lint {
    pub name: &'static str,
    pub level: LintLevel,
    pub desc: &'static str,
}

#[macro_export]
macro_rules! declare_lint {
    ($vis:vis $NAME:ident, $Level:ident, $desc:expr) => {
        $vis static $NAME: &::diagnostics::lint::Lint = &::diagnostics::lint::Lint {
            name: stringify!($NAME),
            level: ::diagnostics::lint::LintLevel::$Level,
            desc: $desc,
        };
    }
}

/// Declare a static `LintArray` and return it as an expression.
#[macro_export]
macro_rules! lint_array {
    ($( $lint:expr ),* ,) => { lint_array!( $($lint),* ) };
    ($( $lint:expr ),*) => {{
        vec![$($lint),*]
    }}
}

#[derive(Debug, Copy, Clone)]
pub struct LintId {
    lint: &'static Lint,
}

impl PartialEq for LintId {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.lint, other.lint)
    }
}

impl Eq for LintId {}

impl Hash for LintId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let ptr = self.lint as *const Lint;
        ptr.hash(state);
    }
}

impl LintId {
    pub fn of(lint: &'static Lint) -> Self {
        Self { lint }
    }

    pub fn lint(self) -> &'static Lint {
        self.lint
    }
}

/// Lints are configured by their lower case name, e.g. `deprecated`.
impl fmt::Display for LintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lint.name.to_ascii_lowercase())
    }
}
