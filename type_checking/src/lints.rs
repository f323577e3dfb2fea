use diagnostics::{declare_lint, lint::LintArray, lint_array};

declare_lint!(
    pub DEPRECATED,
    Warn,
    "use of a deprecated class, field or method"
);

declare_lint!(
    pub CONSTANT_NARROWING,
    Allow,
    "a constant initializer is implicitly narrowed to a smaller integral type"
);

pub fn all_lints() -> LintArray {
    lint_array![DEPRECATED, CONSTANT_NARROWING]
}
