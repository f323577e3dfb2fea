//! Checks method, constructor and initializer bodies.
//!
//! The checker walks every class of a unit with one `Frame` per lexically
//! enclosing class. Statements are handled here, expressions in
//! `expr_typechecker` and identifier chains in `name_resolution`. The tree
//! is rewritten on the way: name chains become concrete accesses, implicit
//! conversions become explicit casts and every expression gets its type.
use crate::{
    access::{is_class_accessible, top_level},
    checker::{CastEmitter, SemanticContext},
    conversion::{is_subclass_of, Constant},
    deferred::{find_member_type, Ledger},
    expr_typechecker::ExprInfo,
    layout::fit_constant,
    lints,
    members::Site,
    semantics::{ReferenceKind, SemanticError},
    type_system::{ClassTable, MethodDef},
};
use asciifile::{Span, Spanned};
use log::{debug, trace};
use strtab::Symbol;
use symtab::Scoped;
use syntax::{
    build, BasicType, Block, ClassDeclaration, ClassId, ClassMember, ClassMemberKind,
    ConstructorCall, ConstructorCallKind, ExprKind, FieldDecl, Literal, LocalVariable,
    MethodDecl, Modifier, Modifiers, Parameter, QualifiedName, Stmt, StmtKind,
    SwitchGroup, SwitchLabel, Type, TypeRef,
};

#[derive(Debug, Clone)]
pub(crate) struct LocalVar {
    pub ty: Type,
    pub is_final: bool,
    /// blank finals may be assigned exactly once
    pub initialized: bool,
    pub constant: Option<Constant>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum BodyKind {
    Method,
    Constructor,
    Initializer,
    FieldInitializer,
}

#[derive(Debug, Clone)]
pub(crate) struct MethodCtx {
    pub kind: BodyKind,
    pub is_static: bool,
    /// checking the arguments of `this(..)`/`super(..)`
    pub in_prologue: bool,
    pub return_ty: Type,
}

/// State of one lexically enclosing class.
#[derive(Debug)]
pub(crate) struct Frame {
    pub class: ClassId,
    /// `None` between members
    pub ctx: Option<MethodCtx>,
    pub locals: Scoped<Symbol, LocalVar>,
    pub local_classes: Scoped<Symbol, ClassId>,
}

impl Frame {
    fn new(class: ClassId) -> Self {
        Frame {
            class,
            ctx: None,
            locals: Scoped::new(),
            local_classes: Scoped::new(),
        }
    }
}

pub struct BodyChecker<'a, 'ctx, 'm> {
    pub(crate) table: &'a ClassTable,
    pub(crate) ledger: &'a Ledger,
    pub(crate) context: &'a SemanticContext<'ctx, 'm>,
    pub(crate) cast_emitter: &'a dyn CastEmitter,
    /// innermost class
    pub(crate) frame: Frame,
    /// enclosing classes, outermost first
    pub(crate) enclosing: Vec<Frame>,
}

impl<'a, 'ctx, 'm> BodyChecker<'a, 'ctx, 'm> {
    pub fn new(
        table: &'a ClassTable,
        ledger: &'a Ledger,
        context: &'a SemanticContext<'ctx, 'm>,
        cast_emitter: &'a dyn CastEmitter,
    ) -> Self {
        BodyChecker {
            table,
            ledger,
            context,
            cast_emitter,
            frame: Frame::new(ClassId(0)),
            enclosing: vec![],
        }
    }

    pub fn check_unit(&mut self, unit: &mut syntax::CompilationUnit) {
        for class in &mut unit.classes {
            self.check_class(&mut class.data);
        }
    }

    pub(crate) fn report(&self, span: Span, error: SemanticError) {
        self.context.report_error(span, error);
    }

    /// Frames from the innermost class outwards.
    pub(crate) fn frames_outward(&self) -> impl Iterator<Item = &Frame> + '_ {
        std::iter::once(&self.frame).chain(self.enclosing.iter().rev())
    }

    pub(crate) fn current_class(&self) -> ClassId {
        self.frame.class
    }

    pub(crate) fn class_name(&self, class: ClassId) -> String {
        self.table.class(class).qualified_name.to_string()
    }

    pub(crate) fn is_static_context(&self) -> bool {
        self.frame.ctx.as_ref().map_or(false, |ctx| ctx.is_static)
    }

    pub(crate) fn in_prologue(&self) -> bool {
        self.frame.ctx.as_ref().map_or(false, |ctx| ctx.in_prologue)
    }

    fn set_prologue(&mut self, in_prologue: bool) {
        if let Some(ctx) = &mut self.frame.ctx {
            ctx.in_prologue = in_prologue;
        }
    }

    pub(crate) fn body_kind(&self) -> Option<BodyKind> {
        self.frame.ctx.as_ref().map(|ctx| ctx.kind)
    }

    /// Innermost visible local variable with its frame depth, `0` being the
    /// current class.
    pub(crate) fn find_local(&self, name: &Symbol) -> Option<(usize, LocalVar)> {
        self.frames_outward()
            .enumerate()
            .find_map(|(depth, frame)| {
                frame
                    .locals
                    .visible_definition(name)
                    .map(|var| (depth, var.clone()))
            })
    }

    pub(crate) fn local_class(&self, name: &Symbol) -> Option<ClassId> {
        self.frames_outward()
            .find_map(|frame| frame.local_classes.visible_definition(name).cloned())
    }

    fn enter_body(&mut self, kind: BodyKind, is_static: bool, return_ty: Type) {
        self.frame.ctx = Some(MethodCtx {
            kind,
            is_static,
            in_prologue: false,
            return_ty,
        });
        self.frame.locals = Scoped::new();
        self.frame.local_classes = Scoped::new();
    }

    fn leave_body(&mut self) {
        self.frame.ctx = None;
        self.frame.locals = Scoped::new();
        self.frame.local_classes = Scoped::new();
    }

    pub(crate) fn enter_scope(&mut self) {
        self.frame.locals.enter_scope();
        self.frame.local_classes.enter_scope();
    }

    pub(crate) fn leave_scope(&mut self) {
        if self.frame.locals.leave_scope().is_err() {
            debug!("left the root scope of the locals");
        }
        if self.frame.local_classes.leave_scope().is_err() {
            debug!("left the root scope of the local classes");
        }
    }

    /// Checks the members of `decl` with a new innermost frame.
    pub(crate) fn check_class(&mut self, decl: &mut ClassDeclaration) {
        let id = match decl.id {
            Some(id) => id,
            None => return,
        };
        trace!("checking bodies of {}", self.class_name(id));
        let outer = std::mem::replace(&mut self.frame, Frame::new(id));
        self.enclosing.push(outer);

        self.fill_supertypes(decl, id);
        for member in &mut decl.members {
            self.check_member(member);
        }

        if let Some(outer) = self.enclosing.pop() {
            self.frame = outer;
        }
    }

    fn fill_supertypes(&self, decl: &mut ClassDeclaration, id: ClassId) {
        let def = self.table.class(id);
        if let (Some(slot), Some(ty)) = (&mut decl.superclass, &def.superclass) {
            slot.resolved = Some(ty.clone());
        }
        for (slot, ty) in decl.interfaces.iter_mut().zip(&def.interfaces) {
            slot.resolved = Some(ty.clone());
        }
    }

    fn check_member(&mut self, member: &mut Spanned<ClassMember>) {
        let modifiers = member.modifiers;
        match &mut member.data.kind {
            ClassMemberKind::Field(field) => self.check_field(field, modifiers),
            ClassMemberKind::Method(method) => self.check_method(method, modifiers),
            ClassMemberKind::Constructor(ctor) => self.check_constructor(ctor),
            ClassMemberKind::Initializer(block) => {
                self.enter_body(BodyKind::Initializer, modifiers.is_static(), Type::Void);
                self.check_block(block);
                self.leave_body();
            }
            ClassMemberKind::Class(class) => self.check_class(class),
        }
    }

    fn check_field(&mut self, field: &mut FieldDecl, modifiers: Modifiers) {
        let field_ref = match field.field {
            Some(field_ref) => field_ref,
            None => return,
        };
        let ty = self.table.field(field_ref).ty;
        field.ty.resolved = Some(ty.clone());
        if let Some(init) = &mut field.initializer {
            self.enter_body(BodyKind::FieldInitializer, modifiers.is_static(), Type::Void);
            self.check_initializer(init, &ty);
            self.leave_body();
        }
    }

    /// Copies the resolved signature into the type slots of the tree.
    fn fill_signature(&self, method: &mut MethodDecl, def: &MethodDef) {
        method.return_ty.resolved = Some(def.return_ty.clone());
        for (param, ty) in method.params.iter_mut().zip(&def.params) {
            param.ty.resolved = Some(ty.ty.clone());
        }
        for (slot, ty) in method.throws.iter_mut().zip(&def.throws) {
            slot.resolved = Some(ty.clone());
            self.require_throwable(ty, slot.span);
        }
    }

    fn define_params(&mut self, params: &[Spanned<Parameter>], def: &MethodDef) {
        for (param, ty) in params.iter().zip(&def.params) {
            let var = LocalVar {
                ty: ty.ty.clone(),
                is_final: param.is_final,
                initialized: true,
                constant: None,
            };
            if self.frame.locals.define(param.name.data.clone(), var).is_err() {
                debug!("parameter {} declared twice", param.name.data);
            }
        }
    }

    fn check_method(&mut self, method: &mut MethodDecl, modifiers: Modifiers) {
        let def = match method.method {
            Some(method_ref) => self.table.method(method_ref),
            None => return,
        };
        self.fill_signature(method, &def);
        let MethodDecl { params, body, .. } = method;
        if let Some(body) = body {
            self.enter_body(BodyKind::Method, modifiers.is_static(), def.return_ty.clone());
            self.define_params(params, &def);
            self.check_block(body);
            self.leave_body();
        }
    }

    /// Checks a constructor body. Without an explicit `this(..)`/`super(..)`
    /// a call of the superclass' default constructor is inserted.
    fn check_constructor(&mut self, ctor: &mut MethodDecl) {
        let def = match ctor.method {
            Some(method_ref) => self.table.method(method_ref),
            None => return,
        };
        self.fill_signature(ctor, &def);
        let has_superclass = self.table.class(self.current_class()).superclass.is_some();
        let MethodDecl { params, body, .. } = ctor;
        let body = match body {
            Some(body) => body,
            None => return,
        };

        self.enter_body(BodyKind::Constructor, false, Type::Void);
        self.define_params(params, &def);

        let explicit = match body.statements.first() {
            Some(stmt) => match stmt.kind {
                StmtKind::ConstructorCall(_) => true,
                _ => false,
            },
            None => false,
        };
        if !explicit && has_superclass {
            let mut call = build::super_call(vec![]);
            call.span = body.span;
            body.statements.insert(0, call);
        }

        self.enter_scope();
        let mut statements = body.statements.iter_mut();
        if has_superclass || explicit {
            if let Some(first) = statements.next() {
                let span = first.span;
                if let StmtKind::ConstructorCall(call) = &mut first.data.kind {
                    self.set_prologue(true);
                    self.check_constructor_call(call, span);
                    self.set_prologue(false);
                }
            }
        }
        for stmt in statements {
            self.check_stmt(stmt);
        }
        self.leave_scope();
        self.leave_body();
    }

    fn check_constructor_call(&mut self, call: &mut ConstructorCall, span: Span) {
        let class = self.current_class();
        let target = match call.kind {
            ConstructorCallKind::This => class,
            ConstructorCallKind::Super => {
                match self.table.class(class).superclass.as_ref().and_then(Type::class_id) {
                    Some(superclass) => superclass,
                    None => return,
                }
            }
        };
        let target_def = self.table.class(target);

        if call.kind == ConstructorCallKind::Super {
            match call.outer.take() {
                Some(mut outer) => {
                    let info = self.check_expr(&mut outer);
                    match target_def.enclosing.filter(|_| target_def.has_outer_instance()) {
                        Some(enclosing) => {
                            let enclosing_ty = self.table.class(enclosing).ty();
                            self.convert_to(&mut outer, info, &enclosing_ty);
                            call.outer = Some(outer);
                        }
                        None => self.report(
                            outer.span,
                            SemanticError::QualifiedNewOfStaticClass {
                                ty: target_def.qualified_name.to_string(),
                            },
                        ),
                    }
                }
                None => {
                    if let Some(enclosing) = target_def.enclosing.filter(|_| target_def.has_outer_instance()) {
                        match self.outer_instance(enclosing, span) {
                            Ok(outer) => call.outer = Some(Box::new(outer)),
                            Err(_) => self.report(
                                span,
                                SemanticError::NoEnclosingInstance {
                                    ty: self.class_name(enclosing),
                                },
                            ),
                        }
                    }
                }
            }
        }

        let args = self.check_args(&mut call.args);
        let site = Site {
            from: class,
            qualifier: None,
            via_super: call.kind == ConstructorCallKind::Super,
        };
        let name = target_def.name.to_string();
        if let Some(ctor) = self.select_method(target, &name, &args, true, site, span) {
            self.convert_args(&mut call.args, &args, ctor);
            // a deprecated superclass was already reported at the extends clause
            if self.table.method(ctor).modifiers.has(Modifier::Deprecated) {
                self.note_method_use(ctor, span);
            }
            call.ctor = Some(ctor);
        }
        if call.kind == ConstructorCallKind::Super {
            call.captured_args = self.captured_values(target, span);
        }
    }

    pub(crate) fn check_block(&mut self, block: &mut Spanned<Block>) {
        self.enter_scope();
        for stmt in &mut block.statements {
            self.check_stmt(stmt);
        }
        self.leave_scope();
    }

    /// Body of an `if` or a loop, which gets a scope of its own.
    fn check_branch(&mut self, stmt: &mut Spanned<Stmt>) {
        self.enter_scope();
        self.check_stmt(stmt);
        self.leave_scope();
    }

    pub(crate) fn check_stmt(&mut self, stmt: &mut Spanned<Stmt>) {
        let span = stmt.span;
        match &mut stmt.data.kind {
            StmtKind::Block(block) => {
                self.enter_scope();
                for stmt in &mut block.statements {
                    self.check_stmt(stmt);
                }
                self.leave_scope();
            }
            StmtKind::Empty | StmtKind::Break(_) | StmtKind::Continue(_) => {}
            StmtKind::LocalVariableDeclaration(local) => self.check_local(local),
            StmtKind::LocalClass(decl) => self.check_local_class(decl),
            StmtKind::Expression(expr) => {
                if !is_statement_expression(&expr.kind) {
                    self.report(expr.span, SemanticError::NotAStatement);
                }
                self.check_expr(expr);
            }
            StmtKind::If(cond, then_stmt, else_stmt) => {
                self.check_condition(cond);
                self.check_branch(then_stmt);
                if let Some(else_stmt) = else_stmt {
                    self.check_branch(else_stmt);
                }
            }
            StmtKind::While(cond, body) => {
                self.check_loop_condition(cond);
                self.check_branch(body);
            }
            StmtKind::DoWhile(body, cond) => {
                self.check_branch(body);
                self.check_loop_condition(cond);
            }
            StmtKind::For(for_loop) => {
                self.enter_scope();
                for init in &mut for_loop.init {
                    self.check_stmt(init);
                }
                if let Some(cond) = &mut for_loop.cond {
                    self.check_loop_condition(cond);
                }
                for update in &mut for_loop.update {
                    if !is_statement_expression(&update.kind) {
                        self.report(update.span, SemanticError::NotAStatement);
                    }
                    self.check_expr(update);
                }
                self.check_branch(&mut for_loop.body);
                self.leave_scope();
            }
            StmtKind::Labeled(_, body) => self.check_stmt(body),
            StmtKind::Return(value) => self.check_return(value, span),
            StmtKind::Throw(value) => {
                let info = self.check_expr(value);
                self.require_throwable(&info.ty, value.span);
            }
            StmtKind::Try(try_stmt) => {
                self.check_block(&mut try_stmt.body);
                for catch in &mut try_stmt.catches {
                    self.enter_scope();
                    let param = &mut catch.data.param;
                    let ty = self.resolve_type(&mut param.ty, ReferenceKind::TypeUse);
                    self.require_throwable(&ty, param.ty.span);
                    let var = LocalVar {
                        ty,
                        is_final: param.is_final,
                        initialized: true,
                        constant: None,
                    };
                    if self.frame.locals.define(param.name.data.clone(), var).is_err() {
                        self.report(
                            param.name.span,
                            SemanticError::RedefinitionError {
                                kind: "local variable".to_string(),
                                name: param.name.data.to_string(),
                            },
                        );
                    }
                    self.check_block(&mut catch.data.body);
                    self.leave_scope();
                }
                if let Some(finally) = &mut try_stmt.finally {
                    self.check_block(finally);
                }
            }
            StmtKind::Switch(scrutinee, groups) => self.check_switch(scrutinee, groups),
            StmtKind::Synchronized(lock, body) => {
                let info = self.check_expr(lock);
                if !info.ty.is_reference() && !info.ty.is_error() {
                    self.report(
                        lock.span,
                        SemanticError::IncompatibleTypes {
                            from: info.ty.to_string(),
                            to: self.table.object().to_string(),
                        },
                    );
                }
                self.check_block(body);
            }
            StmtKind::ConstructorCall(call) => {
                let kind = match call.kind {
                    ConstructorCallKind::This => "this",
                    ConstructorCallKind::Super => "super",
                };
                self.report(
                    span,
                    SemanticError::ConstructorCallNotFirst {
                        kind: kind.to_string(),
                    },
                );
            }
        }
    }

    fn check_local(&mut self, local: &mut LocalVariable) {
        let ty = self.resolve_type(&mut local.ty, ReferenceKind::LocalVariableType);
        let constant = match &mut local.init {
            Some(init) => self.check_initializer(init, &ty).constant,
            None => None,
        };
        let constant = if local.is_final {
            constant.and_then(|value| fit_constant(value, &ty))
        } else {
            None
        };
        let var = LocalVar {
            ty,
            is_final: local.is_final,
            initialized: local.init.is_some(),
            constant,
        };
        if self.frame.locals.define(local.name.data.clone(), var).is_err() {
            self.report(
                local.name.span,
                SemanticError::RedefinitionError {
                    kind: "local variable".to_string(),
                    name: local.name.data.to_string(),
                },
            );
        }
    }

    fn check_local_class(&mut self, decl: &mut ClassDeclaration) {
        let id = match decl.id {
            Some(id) => id,
            None => return,
        };
        if self.frame.local_classes.define(decl.name.data.clone(), id).is_err() {
            debug!("local class {} shadows a visible local class", decl.name.data);
        }
        self.compute_captures(decl, id);
        self.check_class(decl);
    }

    pub(crate) fn check_condition(&mut self, cond: &mut Spanned<syntax::Expr>) -> ExprInfo {
        let info = self.check_expr(cond);
        if !info.ty.is_boolean() && !info.ty.is_error() {
            self.report(
                cond.span,
                SemanticError::ConditionMustBeBoolean {
                    ty: info.ty.to_string(),
                },
            );
        }
        info
    }

    /// Constant loop conditions are folded into a literal, which the flow
    /// checker relies on.
    fn check_loop_condition(&mut self, cond: &mut Spanned<syntax::Expr>) {
        let info = self.check_condition(cond);
        if let Some(Constant::Boolean(value)) = info.constant {
            cond.kind = ExprKind::Literal(Literal::Boolean(value));
        }
    }

    fn check_return(&mut self, value: &mut Option<Box<Spanned<syntax::Expr>>>, span: Span) {
        let ctx = match &self.frame.ctx {
            Some(ctx) => ctx.clone(),
            None => return,
        };
        match ctx.kind {
            BodyKind::Initializer | BodyKind::FieldInitializer => {
                self.report(span, SemanticError::ReturnInInitializer);
                if let Some(value) = value {
                    self.check_expr(value);
                }
            }
            BodyKind::Method | BodyKind::Constructor => match (value, &ctx.return_ty) {
                (None, Type::Void) => {}
                (None, _) => self.report(span, SemanticError::MissingReturnValue),
                (Some(value), Type::Void) => {
                    self.check_expr(value);
                    self.report(span, SemanticError::ReturnValueInVoid);
                }
                (Some(value), return_ty) => {
                    self.assign_to(value, return_ty);
                }
            },
        }
    }

    fn check_switch(&mut self, scrutinee: &mut Spanned<syntax::Expr>, groups: &mut [Spanned<SwitchGroup>]) {
        use syntax::PrimitiveKind::*;

        let info = self.check_expr(scrutinee);
        let switch_ty = info.ty;
        let valid = match switch_ty.primitive() {
            Some(Char) | Some(Byte) | Some(Short) | Some(Int) => true,
            _ => switch_ty.is_error(),
        };
        if !valid {
            self.report(
                scrutinee.span,
                SemanticError::InvalidSwitchType {
                    ty: switch_ty.to_string(),
                },
            );
        }

        self.enter_scope();
        let mut seen: Vec<i64> = vec![];
        let mut has_default = false;
        for group in groups.iter_mut() {
            for label in &mut group.data.labels {
                let label_span = label.span;
                match &mut label.data {
                    SwitchLabel::Default => {
                        if has_default {
                            self.report(label_span, SemanticError::DuplicateDefaultLabel);
                        }
                        has_default = true;
                    }
                    SwitchLabel::Case(value) => {
                        let info = self.check_expr(value);
                        let constant = match &info.constant {
                            Some(constant) => constant.clone(),
                            None => {
                                if !info.ty.is_error() {
                                    self.report(value.span, SemanticError::CaseNotConstant);
                                }
                                continue;
                            }
                        };
                        if valid && !switch_ty.is_error() {
                            self.convert_to(value, info, &switch_ty);
                        }
                        if let Some(Constant::Long(key)) = constant.cast(Long) {
                            if seen.contains(&key) {
                                self.report(
                                    value.span,
                                    SemanticError::DuplicateCaseLabel {
                                        label: constant.to_string(),
                                    },
                                );
                            } else {
                                seen.push(key);
                            }
                        }
                    }
                }
            }
            for stmt in &mut group.data.statements {
                self.check_stmt(stmt);
            }
        }
        self.leave_scope();
    }

    pub(crate) fn require_throwable(&self, ty: &Type, span: Span) {
        let throwable = match ty {
            Type::Error => return,
            Type::Class(class) => self
                .table
                .lookup_or_load("java.lang.Throwable")
                .map_or(false, |throwable| is_subclass_of(self.table, class.id, throwable)),
            Type::Null => true,
            _ => false,
        };
        if !throwable {
            self.report(span, SemanticError::NotThrowable { ty: ty.to_string() });
        }
    }

    /// Resolves a type written in a body and fills its slot.
    pub(crate) fn resolve_type(&mut self, ty: &mut Spanned<TypeRef>, kind: ReferenceKind) -> Type {
        let span = ty.span;
        let resolved = match &ty.basic.data {
            BasicType::Primitive(primitive) => Type::array_of(Type::Primitive(*primitive), ty.array_depth),
            BasicType::Void => {
                self.report(span, SemanticError::VoidNotAllowed);
                Type::Error
            }
            BasicType::Named(name) => match self.resolve_class_name(name, kind) {
                Some(id) => {
                    self.check_class_use(id, span);
                    Type::array_of(self.table.class(id).ty(), ty.array_depth)
                }
                None => Type::Error,
            },
            BasicType::Resolved => ty.resolved.clone().unwrap_or(Type::Error),
        };
        ty.resolved = Some(resolved.clone());
        resolved
    }

    /// Local classes of the enclosing bodies come first, then the ledger's
    /// lookup through the lexically enclosing classes and the imports.
    pub(crate) fn resolve_class_name(&self, name: &QualifiedName, kind: ReferenceKind) -> Option<ClassId> {
        let first = name.segments.first()?;
        if let Some(mut id) = self.local_class(&first.data) {
            for segment in &name.segments[1..] {
                match find_member_type(self.table, id, segment.as_str()) {
                    Some(member) => id = member,
                    None => {
                        self.report(
                            name.span(),
                            SemanticError::UnresolvedType {
                                kind,
                                name: name.to_string(),
                                hint: String::new(),
                            },
                        );
                        return None;
                    }
                }
            }
            return Some(id);
        }
        match self
            .ledger
            .resolve_now(self.table, name, 0, Some(self.current_class()), kind)
        {
            Ok(ty) => ty.class_id(),
            Err(err) => {
                self.report(name.span(), err);
                None
            }
        }
    }

    /// Accessibility and deprecation of a class named in a body.
    pub(crate) fn check_class_use(&self, class: ClassId, span: Span) {
        let from = self.current_class();
        let def = self.table.class(class);
        if !is_class_accessible(self.table, from, class) {
            self.report(
                span,
                SemanticError::NotAccessible {
                    kind: "class".to_string(),
                    name: def.qualified_name.to_string(),
                    from: self.class_name(from),
                },
            );
        }
        if def.is_deprecated() && top_level(self.table, class) != top_level(self.table, from) {
            self.context.report_lint(
                lints::DEPRECATED,
                span,
                SemanticError::DeprecatedUse {
                    kind: "class".to_string(),
                    name: def.qualified_name.to_string(),
                },
            );
        }
    }
}

/// Expressions allowed as statements.
pub(crate) fn is_statement_expression(kind: &ExprKind) -> bool {
    match kind {
        ExprKind::Assign(..) | ExprKind::MethodCall(_) | ExprKind::NewObject(_) => true,
        ExprKind::Unary(op, _) => op.is_increment(),
        ExprKind::Error => true,
        _ => false,
    }
}
