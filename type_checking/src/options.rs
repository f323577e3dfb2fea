//! Configuration of one analyzer, usually read from JSON.
use crate::lints::all_lints;
use diagnostics::{
    lint::{Lint, LintLevel},
    Diagnostics,
};
use failure::Fail;
use serde_derive::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckOptions {
    /// level overrides keyed by lowercase lint name, e.g. `"deprecated"`
    pub lints: HashMap<String, LintLevel>,
    /// packages every unit imports on demand
    pub implicit_imports: Vec<String>,
    /// stop writing (not detecting) errors after this many
    pub max_errors: Option<usize>,
}

impl Default for CheckOptions {
    fn default() -> Self {
        CheckOptions {
            lints: HashMap::new(),
            implicit_imports: vec!["java.lang".to_string()],
            max_errors: None,
        }
    }
}

#[derive(Debug, Fail)]
pub enum OptionsError {
    #[fail(display = "invalid options: {}", _0)]
    Json(#[cause] serde_json::Error),
    #[fail(display = "unknown lint '{}'", name)]
    UnknownLint { name: String },
}

impl CheckOptions {
    pub fn from_json(text: &str) -> Result<Self, OptionsError> {
        let options: CheckOptions = serde_json::from_str(text).map_err(OptionsError::Json)?;
        options.lint_levels()?;
        Ok(options)
    }

    pub fn lint_levels(&self) -> Result<Vec<(&'static Lint, LintLevel)>, OptionsError> {
        let known = all_lints();
        self.lints
            .iter()
            .map(|(name, level)| {
                known
                    .iter()
                    .find(|lint| lint.name.eq_ignore_ascii_case(name))
                    .map(|lint| (*lint, *level))
                    .ok_or_else(|| OptionsError::UnknownLint { name: name.clone() })
            })
            .collect()
    }

    /// Installs level overrides and the error limit in `diagnostics`.
    pub fn apply(&self, diagnostics: &Diagnostics) -> Result<(), OptionsError> {
        for (lint, level) in self.lint_levels()? {
            diagnostics.set_lint_level(lint, level);
        }
        diagnostics.set_max_errors(self.max_errors);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lints::{CONSTANT_NARROWING, DEPRECATED};
    use utils::assert_matches;

    #[test]
    fn defaults_import_java_lang() {
        let options = CheckOptions::from_json("{}").expect("valid");
        assert_eq!(vec!["java.lang".to_string()], options.implicit_imports);
        assert!(options.lints.is_empty());
    }

    #[test]
    fn lint_levels_are_applied() {
        let options =
            CheckOptions::from_json(r#"{"lints": {"deprecated": "deny", "CONSTANT_NARROWING": "warn"}, "max_errors": 3}"#)
                .expect("valid");
        let diagnostics = Diagnostics::new(Box::new(compiler_shared::context::dummy_writer()));
        options.apply(&diagnostics).expect("known lints");
        assert_eq!(LintLevel::Deny, diagnostics.lint_level(DEPRECATED));
        assert_eq!(LintLevel::Warn, diagnostics.lint_level(CONSTANT_NARROWING));
    }

    #[test]
    fn unknown_lints_are_rejected() {
        assert_matches!(
            CheckOptions::from_json(r#"{"lints": {"nope": "allow"}}"#),
            Err(OptionsError::UnknownLint { .. })
        );
        assert_matches!(
            CheckOptions::from_json(r#"{"bogus": 1}"#),
            Err(OptionsError::Json(_))
        );
    }
}
