//! Exception flow and reachability of checked bodies.
//!
//! A checked exception raised by a `throw`, a call or an instance creation
//! must be caught by an enclosing `try` or declared by the body. Code in
//! `finit$` runs inside every constructor that calls the superclass
//! constructor, so its exceptions must be declared by each of those.
//! Anonymous classes declare them on their synthesized constructor instead.
use crate::{
    checker::SemanticContext,
    conversion::is_subclass_of,
    semantics::SemanticError,
    type_system::{ClassTable, MethodKind, NestingKind},
};
use asciifile::{Span, Spanned};
use log::trace;
use strtab::Symbol;
use syntax::{
    visitor::NodeKindMut, Block, ClassDeclaration, ClassId, ClassMemberKind, CompilationUnit,
    ConstructorCallKind, Expr, ExprKind, Literal, MethodDecl, Modifier, Stmt, StmtKind, SwitchLabel,
    Type, TypeRef,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum TargetKind {
    Loop,
    Switch,
    Labeled,
    LabeledLoop,
}

#[derive(Debug)]
struct Target {
    label: Option<Symbol>,
    kind: TargetKind,
    broken: bool,
    continued: bool,
}

impl Target {
    fn new(label: Option<Symbol>, kind: TargetKind) -> Self {
        Target {
            label,
            kind,
            broken: false,
            continued: false,
        }
    }
}

pub struct FlowChecker<'a, 'ctx, 'm> {
    table: &'a ClassTable,
    context: &'a SemanticContext<'ctx, 'm>,
    /// one frame per enclosing `try`, the first holds the declared exceptions
    frames: Vec<Vec<Type>>,
    targets: Vec<Target>,
    /// exceptions of an instance initializer, checked against constructors
    collected: Option<Vec<(Type, Span)>>,
    unchecked: Vec<ClassId>,
}

impl<'a, 'ctx, 'm> FlowChecker<'a, 'ctx, 'm> {
    pub fn new(table: &'a ClassTable, context: &'a SemanticContext<'ctx, 'm>) -> Self {
        let unchecked = ["java.lang.RuntimeException", "java.lang.Error"]
            .iter()
            .filter_map(|name| table.lookup_or_load(name))
            .collect();
        FlowChecker {
            table,
            context,
            frames: vec![],
            targets: vec![],
            collected: None,
            unchecked,
        }
    }

    pub fn check_unit(&mut self, unit: &mut CompilationUnit) {
        for class in &mut unit.classes {
            self.check_class(&mut class.data);
        }
    }

    fn report(&self, span: Span, error: SemanticError) {
        self.context.report_error(span, error);
    }

    /// Runs `f` with fresh state, as bodies of nested classes do not see the
    /// handlers and jump targets around their declaration.
    fn isolated<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let frames = std::mem::replace(&mut self.frames, vec![]);
        let targets = std::mem::replace(&mut self.targets, vec![]);
        let collected = self.collected.take();
        let result = f(self);
        self.frames = frames;
        self.targets = targets;
        self.collected = collected;
        result
    }

    fn check_class(&mut self, decl: &mut ClassDeclaration) {
        let id = match decl.id {
            Some(id) => id,
            None => return,
        };
        let mut initializer_exceptions = vec![];
        for member in &mut decl.members {
            let span = member.span;
            let name = member.name.clone();
            let is_finit = name.as_str() == "finit$" && member.modifiers.has(Modifier::Synthetic);
            match &mut member.data.kind {
                ClassMemberKind::Class(nested) => self.isolated(|this| this.check_class(nested)),
                ClassMemberKind::Method(method) if is_finit => {
                    if let Some(body) = &mut method.body {
                        let collected = self.isolated(|this| {
                            this.collected = Some(vec![]);
                            this.check_sequence(&mut body.statements);
                            this.collected.take()
                        });
                        initializer_exceptions.extend(collected.unwrap_or_default());
                    }
                }
                ClassMemberKind::Method(method) | ClassMemberKind::Constructor(method) => {
                    self.isolated(|this| this.check_method(&name, method, span))
                }
                ClassMemberKind::Initializer(block) => {
                    self.isolated(|this| this.check_sequence(&mut block.statements));
                }
                ClassMemberKind::Field(field) => {
                    if let Some(init) = &mut field.initializer {
                        self.isolated(|this| this.check_expr(init));
                    }
                }
            }
        }
        if !initializer_exceptions.is_empty() {
            self.check_initializer_exceptions(id, decl, initializer_exceptions);
        }
    }

    fn check_method(&mut self, name: &Symbol, decl: &mut MethodDecl, span: Span) {
        let def = decl.method.map(|method| self.table.method(method));
        let body = match &mut decl.body {
            Some(body) => body,
            None => return,
        };
        self.frames = vec![def.as_ref().map(|def| def.throws.clone()).unwrap_or_default()];
        let completes = self.check_sequence(&mut body.statements);
        let returns_value = def.map_or(false, |def| {
            def.kind == MethodKind::Method && def.return_ty != Type::Void && !def.return_ty.is_error()
        });
        if completes && returns_value {
            self.report(
                span,
                SemanticError::MightNotReturn {
                    method_name: name.to_string(),
                },
            );
        }
    }

    fn check_initializer_exceptions(&mut self, id: ClassId, decl: &mut ClassDeclaration, raised: Vec<(Type, Span)>) {
        let def = self.table.class(id);
        if def.nesting == NestingKind::Anonymous {
            let mut declared = vec![];
            for (ty, _) in raised {
                if !declared.contains(&ty) {
                    declared.push(ty);
                }
            }
            trace!("anonymous {} declares {} initializer exceptions", def.binary_name, declared.len());
            self.table.update_class(id, |def| {
                for method in def.methods.iter_mut().filter(|m| m.kind == MethodKind::Constructor) {
                    for ty in &declared {
                        if !method.throws.contains(ty) {
                            method.throws.push(ty.clone());
                        }
                    }
                }
            });
            for member in &mut decl.members {
                if let ClassMemberKind::Constructor(ctor) = &mut member.data.kind {
                    let span = ctor.return_ty.span;
                    for ty in &declared {
                        ctor.throws.push(Spanned::new(span, TypeRef::resolved(ty.clone(), span)));
                    }
                }
            }
            return;
        }

        let constructors: Vec<Vec<Type>> = decl
            .members
            .iter()
            .filter_map(|member| match &member.kind {
                ClassMemberKind::Constructor(ctor) if runs_initializer(ctor) => ctor.method,
                _ => None,
            })
            .map(|ctor| self.table.method(ctor).throws)
            .collect();
        let mut reported: Vec<Type> = vec![];
        for (ty, span) in raised {
            if reported.contains(&ty) {
                continue;
            }
            let class = match ty.class_id() {
                Some(class) => class,
                None => continue,
            };
            if !constructors.iter().all(|throws| self.handled_by(class, throws)) {
                self.report(
                    span,
                    SemanticError::InitializerException {
                        ty: ty.to_string(),
                        class: def.qualified_name.to_string(),
                    },
                );
                reported.push(ty);
            }
        }
    }

    fn is_checked(&self, class: ClassId) -> bool {
        !self
            .unchecked
            .iter()
            .any(|unchecked| is_subclass_of(self.table, class, *unchecked))
    }

    fn handled_by(&self, class: ClassId, handlers: &[Type]) -> bool {
        handlers.iter().any(|handler| match handler {
            Type::Error => true,
            Type::Class(handler) => is_subclass_of(self.table, class, handler.id),
            _ => false,
        })
    }

    fn raise(&mut self, ty: &Type, span: Span) {
        let class = match ty {
            Type::Class(class) => class.id,
            _ => return,
        };
        if !self.is_checked(class) || self.frames.iter().any(|frame| self.handled_by(class, frame)) {
            return;
        }
        match &mut self.collected {
            Some(collected) => collected.push((ty.clone(), span)),
            None => self.report(span, SemanticError::UnreportedException { ty: ty.to_string() }),
        }
    }

    /// Returns whether the sequence can complete normally. Only the first
    /// unreachable statement of a sequence is reported.
    fn check_sequence(&mut self, statements: &mut [Spanned<Stmt>]) -> bool {
        let mut live = true;
        let mut reported = false;
        for stmt in statements {
            if !live && !reported {
                self.report(stmt.span, SemanticError::UnreachableStatement);
                reported = true;
            }
            let completes = self.statement(stmt, live);
            live = live && completes;
        }
        live
    }

    fn check_block(&mut self, block: &mut Block) -> bool {
        self.check_sequence(&mut block.statements)
    }

    fn statement(&mut self, stmt: &mut Spanned<Stmt>, reachable: bool) -> bool {
        let completes = self.check_stmt(stmt);
        stmt.facts.reachable = Some(reachable);
        stmt.facts.completes_normally = Some(reachable && completes);
        completes
    }

    fn check_stmt(&mut self, stmt: &mut Spanned<Stmt>) -> bool {
        let span = stmt.span;
        match &mut stmt.data.kind {
            StmtKind::Block(block) => self.check_block(block),
            StmtKind::Empty => true,
            StmtKind::LocalVariableDeclaration(local) => {
                if let Some(init) = &mut local.init {
                    self.check_expr(init);
                }
                true
            }
            StmtKind::LocalClass(decl) => {
                self.isolated(|this| this.check_class(decl));
                true
            }
            StmtKind::Expression(expr) => {
                self.check_expr(expr);
                true
            }
            StmtKind::If(cond, then_stmt, else_stmt) => {
                self.check_expr(cond);
                let then_completes = self.statement(then_stmt, true);
                let else_completes = match else_stmt {
                    Some(else_stmt) => self.statement(else_stmt, true),
                    None => true,
                };
                then_completes || else_completes
            }
            StmtKind::While(cond, body) => {
                self.check_expr(cond);
                let constant = constant_condition(cond);
                if constant == Some(false) {
                    self.report(body.span, SemanticError::UnreachableStatement);
                }
                let (_, target) = self.in_loop(|this| this.statement(body, constant != Some(false)));
                constant != Some(true) || target.broken
            }
            StmtKind::DoWhile(body, cond) => {
                let (body_completes, target) = self.in_loop(|this| this.statement(body, true));
                self.check_expr(cond);
                let repeats = constant_condition(cond) == Some(true);
                ((body_completes || target.continued) && !repeats) || target.broken
            }
            StmtKind::For(for_loop) => {
                for init in &mut for_loop.init {
                    self.statement(init, true);
                }
                let constant = match &mut for_loop.cond {
                    Some(cond) => {
                        self.check_expr(cond);
                        constant_condition(cond)
                    }
                    None => Some(true),
                };
                for update in &mut for_loop.update {
                    self.check_expr(update);
                }
                if constant == Some(false) {
                    self.report(for_loop.body.span, SemanticError::UnreachableStatement);
                }
                let body = &mut for_loop.body;
                let (_, target) = self.in_loop(|this| this.statement(body, constant != Some(false)));
                constant != Some(true) || target.broken
            }
            StmtKind::Labeled(label, body) => {
                let kind = match body.kind {
                    StmtKind::While(..) | StmtKind::DoWhile(..) | StmtKind::For(..) => TargetKind::LabeledLoop,
                    _ => TargetKind::Labeled,
                };
                self.targets.push(Target::new(Some(label.data.clone()), kind));
                let completes = self.statement(body, true);
                let broken = self.targets.pop().map_or(false, |target| target.broken);
                completes || broken
            }
            StmtKind::Break(label) => {
                self.jump(label.as_ref(), span, false);
                false
            }
            StmtKind::Continue(label) => {
                self.jump(label.as_ref(), span, true);
                false
            }
            StmtKind::Return(value) => {
                if let Some(value) = value {
                    self.check_expr(value);
                }
                false
            }
            StmtKind::Throw(value) => {
                self.check_expr(value);
                if let Some(ty) = value.ty.clone() {
                    self.raise(&ty, value.span);
                }
                false
            }
            StmtKind::Try(try_stmt) => {
                let handlers = try_stmt
                    .catches
                    .iter()
                    .map(|catch| catch.param.ty.resolved.clone().unwrap_or(Type::Error))
                    .collect();
                self.frames.push(handlers);
                let mut completes = self.check_block(&mut try_stmt.body);
                self.frames.pop();
                for catch in &mut try_stmt.catches {
                    completes |= self.check_block(&mut catch.data.body);
                }
                if let Some(finally) = &mut try_stmt.finally {
                    if !self.check_block(finally) {
                        completes = false;
                    }
                }
                completes
            }
            StmtKind::Switch(scrutinee, groups) => {
                self.check_expr(scrutinee);
                self.targets.push(Target::new(None, TargetKind::Switch));
                let mut has_default = false;
                let mut last_completes = true;
                for group in groups.iter_mut() {
                    for label in &mut group.labels {
                        match &mut label.data {
                            SwitchLabel::Case(value) => self.check_expr(value),
                            SwitchLabel::Default => has_default = true,
                        }
                    }
                    last_completes = self.check_sequence(&mut group.statements);
                }
                let broken = self.targets.pop().map_or(false, |target| target.broken);
                last_completes || broken || !has_default
            }
            StmtKind::Synchronized(lock, block) => {
                self.check_expr(lock);
                self.check_block(block)
            }
            StmtKind::ConstructorCall(call) => {
                if let Some(outer) = &mut call.outer {
                    self.check_expr(outer);
                }
                for arg in call.args.iter_mut().chain(call.captured_args.iter_mut()) {
                    self.check_expr(arg);
                }
                if let Some(ctor) = call.ctor {
                    for ty in self.table.method(ctor).throws {
                        self.raise(&ty, span);
                    }
                }
                true
            }
        }
    }

    /// Runs a loop body with a fresh loop target and hands that target back.
    fn in_loop<R>(&mut self, body: impl FnOnce(&mut Self) -> R) -> (R, Target) {
        self.targets.push(Target::new(None, TargetKind::Loop));
        let result = body(self);
        let target = self
            .targets
            .pop()
            .unwrap_or_else(|| Target::new(None, TargetKind::Loop));
        (result, target)
    }

    fn jump(&mut self, label: Option<&Spanned<Symbol>>, span: Span, is_continue: bool) {
        let index = match label {
            None => self.targets.iter().rposition(|target| match target.kind {
                TargetKind::Loop => true,
                TargetKind::Switch => !is_continue,
                _ => false,
            }),
            Some(label) => {
                let found = self
                    .targets
                    .iter()
                    .rposition(|target| target.label.as_ref() == Some(&label.data));
                if found.is_none() {
                    self.report(
                        label.span,
                        SemanticError::UndefinedLabel {
                            label: label.data.to_string(),
                        },
                    );
                    return;
                }
                match (found, is_continue) {
                    (Some(index), true) if self.targets[index].kind == TargetKind::LabeledLoop => {
                        Some(index + 1).filter(|loop_index| *loop_index < self.targets.len())
                    }
                    (_, true) => None,
                    (found, false) => found,
                }
            }
        };
        match (index, is_continue) {
            (Some(index), true) => self.targets[index].continued = true,
            (Some(index), false) => self.targets[index].broken = true,
            (None, true) => self.report(span, SemanticError::ContinueOutsideLoop),
            (None, false) => self.report(span, SemanticError::BreakOutsideLoop),
        }
    }

    fn check_expr(&mut self, expr: &mut Spanned<Expr>) {
        self.visit(NodeKindMut::Expr(expr));
    }

    fn visit(&mut self, node: NodeKindMut<'_>) {
        match node {
            NodeKindMut::ClassDeclaration(decl) => self.isolated(|this| this.check_class(decl)),
            NodeKindMut::Expr(expr) => {
                NodeKindMut::Expr(&mut *expr).for_each_child(&mut |child| self.visit(child));
                // anonymous constructors learn their exceptions from the body
                let invoked = match &expr.kind {
                    ExprKind::MethodCall(call) => call.method,
                    ExprKind::NewObject(new) => new.ctor,
                    _ => None,
                };
                if let Some(method) = invoked {
                    for ty in self.table.method(method).throws {
                        self.raise(&ty, expr.span);
                    }
                }
            }
            other => {
                other.for_each_child(&mut |child| self.visit(child));
            }
        }
    }
}

fn constant_condition(cond: &Spanned<Expr>) -> Option<bool> {
    match cond.kind {
        ExprKind::Literal(Literal::Boolean(value)) => Some(value),
        _ => None,
    }
}

/// Constructors delegating with `this(..)` leave initialization to the
/// constructor they call.
fn runs_initializer(ctor: &MethodDecl) -> bool {
    let first = ctor.body.as_ref().and_then(|body| body.statements.first());
    match first.map(|stmt| &stmt.kind) {
        Some(StmtKind::ConstructorCall(call)) => call.kind != ConstructorCallKind::This,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syntax::build::{boolean, int, super_call, this_call};

    fn ctor_with(statements: Vec<Spanned<Stmt>>) -> MethodDecl {
        MethodDecl {
            return_ty: syntax::build::ty("void"),
            params: vec![],
            throws: vec![],
            body: Some(syntax::build::block(statements)),
            method: None,
        }
    }

    #[test]
    fn delegating_constructors_skip_the_initializer() {
        assert!(runs_initializer(&ctor_with(vec![super_call(vec![])])));
        assert!(runs_initializer(&ctor_with(vec![])));
        assert!(!runs_initializer(&ctor_with(vec![this_call(vec![int(1)])])));
    }

    #[test]
    fn only_boolean_literals_are_constant_conditions() {
        assert_eq!(Some(true), constant_condition(&boolean(true)));
        assert_eq!(Some(false), constant_condition(&boolean(false)));
        assert_eq!(None, constant_condition(&int(1)));
    }
}
