//! Driver of the analysis: runs the phases over one compilation unit.
use crate::{
    class_loader::ClassLoader,
    deferred::{ImportScope, Ledger},
    flow::FlowChecker,
    layout::Layout,
    method_body_type_checker::BodyChecker,
    nesting::{self, NestingState},
    options::{CheckOptions, OptionsError},
    registration::Registrar,
    semantics::SemanticError,
    type_system::ClassTable,
};
use asciifile::{Span, Spanned};
use compiler_shared::{context::Context, timed_scope};
use diagnostics::{lint::Lint, MessageLevel};
use failure::Fail;
use log::debug;
use syntax::{ClassId, CompilationUnit, Expr, ExprKind, Type};

pub struct SemanticContext<'ctx, 'm> {
    pub context: &'ctx Context<'m>,
}

impl<'ctx, 'm> SemanticContext<'ctx, 'm> {
    pub fn new(context: &'ctx Context<'m>) -> Self {
        SemanticContext { context }
    }

    pub fn report_error(&self, span: Span, error: SemanticError) {
        self.context.diagnostics.error(Some(span), error);
    }

    pub fn report_lint(&self, lint: &'static Lint, span: Span, error: SemanticError) {
        self.context.diagnostics.lint(lint, Some(span), error);
    }
}

/// Code generation decides casts between interfaces and non-final classes
/// that the analysis cannot decide.
pub trait CastEmitter {
    fn runtime_checked_cast(&self, expr: Spanned<Expr>, target: &Type) -> Spanned<Expr>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultCastEmitter;

impl CastEmitter for DefaultCastEmitter {
    fn runtime_checked_cast(&self, expr: Spanned<Expr>, target: &Type) -> Spanned<Expr> {
        let span = expr.span;
        Spanned::new(
            span,
            Expr::typed(
                ExprKind::RuntimeCheckedCast(Box::new(expr), target.clone()),
                target.clone(),
            ),
        )
    }
}

#[derive(Debug, Fail)]
pub enum CheckError {
    #[fail(display = "{}", _0)]
    Fatal(#[cause] SemanticError),
    #[fail(display = "analysis failed with {} errors", errors)]
    Failed { errors: usize },
    #[fail(display = "{}", _0)]
    Options(#[cause] OptionsError),
}

/// Checks compilation units one after another. Classes of earlier units and
/// loaded classes stay in the class table for later units.
pub struct Analyzer {
    table: ClassTable,
    options: CheckOptions,
    cast_emitter: Box<dyn CastEmitter>,
}

impl Analyzer {
    pub fn new(loader: Box<dyn ClassLoader>, options: CheckOptions) -> Result<Self, OptionsError> {
        options.lint_levels()?;
        Ok(Analyzer {
            table: ClassTable::new(loader),
            options,
            cast_emitter: Box::new(DefaultCastEmitter),
        })
    }

    pub fn with_cast_emitter(mut self, cast_emitter: Box<dyn CastEmitter>) -> Self {
        self.cast_emitter = cast_emitter;
        self
    }

    pub fn table(&self) -> &ClassTable {
        &self.table
    }

    /// Resolves and checks `unit` in place. Diagnostics go to `context`; the
    /// tree is only complete if this returns `Ok`.
    pub fn check(&mut self, unit: &mut CompilationUnit, context: &Context<'_>) -> Result<(), CheckError> {
        self.options
            .apply(&context.diagnostics)
            .map_err(CheckError::Options)?;
        let semantic = SemanticContext::new(context);
        let mut ledger = Ledger::new(ImportScope::of(unit, &self.options.implicit_imports));
        let first = self.table.len();

        {
            timed_scope!("registration");
            Registrar::new(&self.table, &mut ledger, &semantic)
                .register_unit(unit)
                .map_err(CheckError::Fatal)?;
        }
        let classes: Vec<ClassId> = (first..self.table.len())
            .map(ClassId)
            .filter(|id| !self.table.class(*id).external)
            .collect();
        debug!("registered {} classes, {} deferred types", classes.len(), ledger.len());

        {
            timed_scope!("layout");
            for error in ledger.resolve_all(&mut self.table) {
                semantic.report_error(error.span, error.data);
            }
            Layout::new(&mut self.table, &semantic).lay_out_unit(&ledger, unit, &classes);
        }

        {
            timed_scope!("bodies");
            let mut state = NestingState::default();
            BodyChecker::new(&self.table, &ledger, &semantic, &*self.cast_emitter).check_unit(unit);
            nesting::lower_private_access(&self.table, &mut state, unit);
            nesting::thread_constructors(&self.table, unit);
            state.flush(unit);
        }

        {
            timed_scope!("exception flow");
            FlowChecker::new(&self.table, &semantic).check_unit(unit);
        }

        let errors = context.diagnostics.count(MessageLevel::Error);
        debug!("unit checked with {} errors", errors);
        if errors > 0 {
            Err(CheckError::Failed { errors })
        } else {
            Ok(())
        }
    }
}
