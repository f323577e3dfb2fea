//! Lowering of nested classes after type checking.
//!
//! Two rewrites run over a checked unit:
//!
//! * Private members used from another class of the same top level class go
//!   through static synthetic `access$NNN` methods on the declaring class.
//! * Constructors receive the enclosing instance and captured locals as
//!   hidden parameters. Instance field initializers and initializer blocks
//!   move into a private `finit$` method called right after the superclass
//!   constructor.
//!
//! Generated accessors are collected in a `NestingState` and appended to
//! their classes by `flush`, so a walk never sees members it just created.
use crate::{
    conversion::binary_operation_type,
    expr_typechecker::{take_expr, typed},
    name_resolution::field_access,
    type_system::{ClassTable, FieldDef, MethodDef, MethodKind, ParamDef},
};
use asciifile::{Span, Spanned};
use log::debug;
use std::collections::HashMap;
use strtab::Symbol;
use syntax::{
    visitor::NodeKindMut, BinaryOp, Block, ClassDeclaration, ClassId, ClassMember,
    ClassMemberKind, CompilationUnit, ConstructorCallKind, Expr, ExprKind, FieldRef, Literal,
    MethodCall, MethodDecl, MethodRef, Modifier, Modifiers, Parameter, PrimitiveKind, Stmt,
    StmtKind, Type, TypeRef, UnaryOp,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Accessor {
    Get(FieldRef),
    Set(FieldRef),
    /// `instance.field op= value` for a value of the given type
    Update(FieldRef, BinaryOp, Type),
    Step(FieldRef, UnaryOp),
    Call(MethodRef),
}

impl Accessor {
    fn field(&self) -> Option<FieldRef> {
        match self {
            Accessor::Get(field) | Accessor::Set(field) => Some(*field),
            Accessor::Update(field, ..) | Accessor::Step(field, _) => Some(*field),
            Accessor::Call(_) => None,
        }
    }

    fn owner(&self) -> ClassId {
        match self {
            Accessor::Get(field) | Accessor::Set(field) => field.class,
            Accessor::Update(field, ..) | Accessor::Step(field, _) => field.class,
            Accessor::Call(method) => method.class,
        }
    }
}

#[derive(Debug, Default)]
pub struct NestingState {
    accessors: HashMap<Accessor, MethodRef>,
    counters: HashMap<ClassId, usize>,
    pending: HashMap<ClassId, Vec<Spanned<ClassMember>>>,
}

impl NestingState {
    pub fn accessor_count(&self) -> usize {
        self.accessors.len()
    }

    /// Appends the generated accessors to the declarations of their classes.
    pub fn flush(&mut self, unit: &mut CompilationUnit) {
        for class in &mut unit.classes {
            self.flush_node(NodeKindMut::ClassDeclaration(&mut class.data));
        }
        if !self.pending.is_empty() {
            debug!("{} classes with accessors outside of the unit", self.pending.len());
        }
    }

    fn flush_node(&mut self, node: NodeKindMut<'_>) {
        match node {
            NodeKindMut::ClassDeclaration(decl) => {
                NodeKindMut::ClassDeclaration(&mut *decl)
                    .for_each_child(&mut |child| self.flush_node(child));
                if let Some(members) = decl.id.and_then(|id| self.pending.remove(&id)) {
                    decl.members.extend(members);
                }
            }
            other => {
                other.for_each_child(&mut |child| self.flush_node(child));
            }
        }
    }
}

/// Routes uses of private members across class boundaries through
/// accessor methods.
pub fn lower_private_access(table: &ClassTable, state: &mut NestingState, unit: &mut CompilationUnit) {
    let mut lowering = Lowering { table, state };
    for class in &mut unit.classes {
        lowering.node(NodeKindMut::ClassDeclaration(&mut class.data), None);
    }
    debug!("{} private accessors", lowering.state.accessor_count());
}

struct Lowering<'a> {
    table: &'a ClassTable,
    state: &'a mut NestingState,
}

enum Rewrite {
    Read(FieldRef),
    Write(FieldRef),
    Step(FieldRef, UnaryOp),
    Call(MethodRef),
}

impl Lowering<'_> {
    fn node(&mut self, node: NodeKindMut<'_>, class: Option<ClassId>) {
        match node {
            NodeKindMut::ClassDeclaration(decl) => {
                let class = decl.id.or(class);
                NodeKindMut::ClassDeclaration(decl).for_each_child(&mut |child| self.node(child, class));
            }
            NodeKindMut::Expr(expr) => self.expr(expr, class),
            other => {
                other.for_each_child(&mut |child| self.node(child, class));
            }
        }
    }

    fn expr(&mut self, expr: &mut Spanned<Expr>, class: Option<ClassId>) {
        let writes = match &expr.kind {
            ExprKind::Assign(..) => true,
            ExprKind::Unary(op, _) => op.is_increment(),
            _ => false,
        };
        if writes {
            match &mut expr.kind {
                ExprKind::Assign(_, lhs, rhs) => {
                    self.lvalue(lhs, class);
                    self.expr(rhs, class);
                }
                ExprKind::Unary(_, operand) => self.lvalue(operand, class),
                _ => {}
            }
        } else {
            NodeKindMut::Expr(&mut *expr).for_each_child(&mut |child| self.node(child, class));
        }
        if let Some(class) = class {
            self.rewrite(expr, class);
        }
    }

    /// The assigned field itself is rewritten together with its assignment.
    fn lvalue(&mut self, target: &mut Spanned<Expr>, class: Option<ClassId>) {
        if let ExprKind::FieldAccess(holder, ..) = &mut target.kind {
            self.expr(holder, class);
            return;
        }
        self.expr(target, class);
    }

    fn needs_accessor(&self, declaring: ClassId, modifiers: Modifiers, from: ClassId) -> bool {
        modifiers.is_private() && !modifiers.has(Modifier::Synthetic) && declaring != from
    }

    fn private_field(&self, expr: &Spanned<Expr>, from: ClassId) -> Option<FieldRef> {
        match &expr.kind {
            ExprKind::FieldAccess(_, _, Some(field))
                if self.needs_accessor(field.class, self.table.field(*field).modifiers, from) =>
            {
                Some(*field)
            }
            _ => None,
        }
    }

    fn rewrite(&mut self, expr: &mut Spanned<Expr>, from: ClassId) {
        let rewrite = match &expr.kind {
            ExprKind::FieldAccess(..) => self.private_field(expr, from).map(Rewrite::Read),
            ExprKind::Assign(_, lhs, _) => self.private_field(lhs, from).map(Rewrite::Write),
            ExprKind::Unary(op, operand) if op.is_increment() => {
                self.private_field(operand, from).map(|field| Rewrite::Step(field, *op))
            }
            ExprKind::MethodCall(call) => match (call.method, &call.target) {
                (_, Some(Spanned { data: Expr { kind: ExprKind::Super(_), .. }, .. })) => None,
                (Some(method), _) => {
                    let def = self.table.method(method);
                    if def.kind == MethodKind::Method && self.needs_accessor(method.class, def.modifiers, from) {
                        Some(Rewrite::Call(method))
                    } else {
                        None
                    }
                }
                _ => None,
            },
            _ => None,
        };
        let rewrite = match rewrite {
            Some(rewrite) => rewrite,
            None => return,
        };

        let Spanned { span, data: Expr { kind, ty } } = take_expr(expr);
        *expr = match (rewrite, kind) {
            (Rewrite::Read(field), ExprKind::FieldAccess(holder, ..)) => self.read(*holder, field, span),
            (Rewrite::Write(field), ExprKind::Assign(op, lhs, rhs)) => match into_holder(*lhs) {
                Ok(holder) => self.write(holder, field, op, *rhs, span),
                Err(lhs) => restore(span, ExprKind::Assign(op, Box::new(lhs), rhs), ty),
            },
            (Rewrite::Step(field, op), ExprKind::Unary(_, operand)) => match into_holder(*operand) {
                Ok(holder) => self.step(holder, field, op, span),
                Err(operand) => restore(span, ExprKind::Unary(op, Box::new(operand)), ty),
            },
            (Rewrite::Call(method), ExprKind::MethodCall(call)) => self.forward(*call, method, span),
            (_, kind) => restore(span, kind, ty),
        };
    }

    fn read(&mut self, holder: Spanned<Expr>, field: FieldRef, span: Span) -> Spanned<Expr> {
        let def = self.table.field(field);
        let getter = self.accessor(Accessor::Get(field));
        let args = if def.modifiers.is_static() { vec![] } else { vec![holder] };
        self.call_accessor(getter, field.class, args, def.ty, span)
    }

    fn write(
        &mut self,
        holder: Spanned<Expr>,
        field: FieldRef,
        op: Option<BinaryOp>,
        value: Spanned<Expr>,
        span: Span,
    ) -> Spanned<Expr> {
        let def = self.table.field(field);
        let value = match op {
            None => value,
            Some(op) if def.modifiers.is_static() || is_pure(&holder) => {
                let current = self.read(holder.clone(), field, span);
                self.combine(op, current, value, &def.ty, span)
            }
            Some(op) => {
                // the qualifier is evaluated once, inside the accessor
                let operand = value.ty.clone().unwrap_or(Type::Error);
                let update = self.accessor(Accessor::Update(field, op, operand));
                return self.call_accessor(update, field.class, vec![holder, value], def.ty, span);
            }
        };
        self.store(holder, field, &def, value, span)
    }

    fn step(&mut self, holder: Spanned<Expr>, field: FieldRef, op: UnaryOp, span: Span) -> Spanned<Expr> {
        let def = self.table.field(field);
        if !def.modifiers.is_static() && !is_pure(&holder) {
            let step = self.accessor(Accessor::Step(field, op));
            return self.call_accessor(step, field.class, vec![holder], def.ty, span);
        }
        let (step, undo) = match op {
            UnaryOp::PreIncrement | UnaryOp::PostIncrement => (BinaryOp::Add, BinaryOp::Sub),
            _ => (BinaryOp::Sub, BinaryOp::Add),
        };
        let current = self.read(holder.clone(), field, span);
        let updated = self.combine(step, current, one(span), &def.ty, span);
        let stored = self.store(holder, field, &def, updated, span);
        match op {
            UnaryOp::PostIncrement | UnaryOp::PostDecrement => {
                self.combine(undo, stored, one(span), &def.ty, span)
            }
            _ => stored,
        }
    }

    fn store(
        &mut self,
        holder: Spanned<Expr>,
        field: FieldRef,
        def: &FieldDef,
        value: Spanned<Expr>,
        span: Span,
    ) -> Spanned<Expr> {
        let setter = self.accessor(Accessor::Set(field));
        let mut args = if def.modifiers.is_static() { vec![] } else { vec![holder] };
        args.push(value);
        self.call_accessor(setter, field.class, args, def.ty.clone(), span)
    }

    /// `current op value`, cast back to `ty` where promotion widened it.
    fn combine(
        &self,
        op: BinaryOp,
        current: Spanned<Expr>,
        value: Spanned<Expr>,
        ty: &Type,
        span: Span,
    ) -> Spanned<Expr> {
        let value_ty = value.ty.clone().unwrap_or(Type::Error);
        let result = binary_operation_type(self.table, op, ty, &value_ty).unwrap_or_else(|| ty.clone());
        let binary = typed(span, ExprKind::Binary(op, Box::new(current), Box::new(value)), result.clone());
        if result == *ty {
            binary
        } else {
            let target = Spanned::new(span, TypeRef::resolved(ty.clone(), span));
            typed(span, ExprKind::Cast(target, Box::new(binary)), ty.clone())
        }
    }

    fn forward(&mut self, call: MethodCall, method: MethodRef, span: Span) -> Spanned<Expr> {
        let def = self.table.method(method);
        let forwarder = self.accessor(Accessor::Call(method));
        let mut args = vec![];
        if !def.modifiers.is_static() {
            match call.target {
                Some(target) => args.push(target),
                None => return rebuild_call(call, method, def.return_ty, span),
            }
        }
        args.extend(call.args);
        self.call_accessor(forwarder, method.class, args, def.return_ty, span)
    }

    fn call_accessor(
        &self,
        accessor: MethodRef,
        owner: ClassId,
        args: Vec<Spanned<Expr>>,
        ty: Type,
        span: Span,
    ) -> Spanned<Expr> {
        let owner_ty = self.table.class(owner).ty();
        let name = self.table.method(accessor).name;
        let call = MethodCall {
            target: Some(typed(span, ExprKind::TypeName(owner_ty.clone()), owner_ty)),
            name: Spanned::new(span, name),
            args,
            method: Some(accessor),
        };
        typed(span, ExprKind::MethodCall(Box::new(call)), ty)
    }

    /// Returns the accessor for `kind`. The first use of a field generates
    /// its getter, and its setter too unless the field is final.
    fn accessor(&mut self, kind: Accessor) -> MethodRef {
        let field = match kind.field() {
            Some(field) => field,
            None => return self.synthesize(kind),
        };
        let getter = self.synthesize(Accessor::Get(field));
        let setter = if self.table.field(field).modifiers.is_final() {
            None
        } else {
            Some(self.synthesize(Accessor::Set(field)))
        };
        match (kind, setter) {
            (Accessor::Get(_), _) => getter,
            (Accessor::Set(_), Some(setter)) => setter,
            (kind, _) => self.synthesize(kind),
        }
    }

    /// Generates the accessor for `kind` unless it already exists.
    fn synthesize(&mut self, kind: Accessor) -> MethodRef {
        if let Some(method) = self.state.accessors.get(&kind) {
            return *method;
        }
        let owner = kind.owner();
        let counter = self.state.counters.entry(owner).or_insert(0);
        let name = Symbol::from(format!("access${:03}", *counter));
        *counter += 1;

        let owner_def = self.table.class(owner);
        let span = owner_def.span;
        let owner_ty = owner_def.ty();
        let mut params = vec![];
        let holder = |params: &mut Vec<ParamDef>, is_static: bool| {
            if is_static {
                typed(span, ExprKind::TypeName(owner_ty.clone()), owner_ty.clone())
            } else {
                params.push(ParamDef { name: Symbol::from("instance"), ty: owner_ty.clone() });
                local(span, "instance", owner_ty.clone())
            }
        };

        let (return_ty, throws, body) = match &kind {
            Accessor::Get(field) => {
                let field = *field;
                let def = self.table.field(field);
                let target = holder(&mut params, def.modifiers.is_static());
                let read = field_access(span, target, &def, field);
                (def.ty, vec![], return_stmt(span, Some(read)))
            }
            Accessor::Set(field) => {
                let field = *field;
                let def = self.table.field(field);
                let target = holder(&mut params, def.modifiers.is_static());
                params.push(ParamDef { name: Symbol::from("value"), ty: def.ty.clone() });
                let assign = ExprKind::Assign(
                    None,
                    Box::new(field_access(span, target, &def, field)),
                    Box::new(local(span, "value", def.ty.clone())),
                );
                (def.ty.clone(), vec![], return_stmt(span, Some(typed(span, assign, def.ty))))
            }
            Accessor::Update(field, op, operand) => {
                let def = self.table.field(*field);
                let target = holder(&mut params, false);
                params.push(ParamDef { name: Symbol::from("value"), ty: operand.clone() });
                let update = ExprKind::Assign(
                    Some(*op),
                    Box::new(field_access(span, target, &def, *field)),
                    Box::new(local(span, "value", operand.clone())),
                );
                (def.ty.clone(), vec![], return_stmt(span, Some(typed(span, update, def.ty))))
            }
            Accessor::Step(field, op) => {
                let def = self.table.field(*field);
                let target = holder(&mut params, false);
                let step = ExprKind::Unary(*op, Box::new(field_access(span, target, &def, *field)));
                (def.ty.clone(), vec![], return_stmt(span, Some(typed(span, step, def.ty))))
            }
            Accessor::Call(method) => {
                let method = *method;
                let def = self.table.method(method);
                let target = holder(&mut params, def.modifiers.is_static());
                let mut args = vec![];
                for (i, param) in def.params.iter().enumerate() {
                    let name = format!("p{}", i);
                    args.push(local(span, &name, param.ty.clone()));
                    params.push(ParamDef { name: Symbol::from(name), ty: param.ty.clone() });
                }
                let call = MethodCall {
                    target: Some(target),
                    name: Spanned::new(span, def.name.clone()),
                    args,
                    method: Some(method),
                };
                let call = typed(span, ExprKind::MethodCall(Box::new(call)), def.return_ty.clone());
                let body = if def.return_ty == Type::Void {
                    expr_stmt(call)
                } else {
                    return_stmt(span, Some(call))
                };
                (def.return_ty, def.throws, body)
            }
        };

        let modifiers = Modifiers::new(&[Modifier::Static, Modifier::Synthetic]);
        let method = self.table.add_method(
            owner,
            MethodDef {
                name: name.clone(),
                kind: MethodKind::Method,
                params: params.clone(),
                return_ty: return_ty.clone(),
                throws: throws.clone(),
                modifiers,
                span,
            },
        );
        let member = method_member(
            span,
            name,
            modifiers,
            MethodKind::Method,
            &params,
            &return_ty,
            &throws,
            vec![body],
            method,
        );
        self.state.pending.entry(owner).or_default().push(member);
        self.state.accessors.insert(kind, method);
        method
    }
}

/// Unqualified calls to an outer instance method keep their resolved target.
fn rebuild_call(call: MethodCall, method: MethodRef, ty: Type, span: Span) -> Spanned<Expr> {
    let call = MethodCall { method: Some(method), ..call };
    typed(span, ExprKind::MethodCall(Box::new(call)), ty)
}

/// Adds hidden constructor parameters and moves instance initialization
/// into `finit$`, innermost classes first.
pub fn thread_constructors(table: &ClassTable, unit: &mut CompilationUnit) {
    for class in &mut unit.classes {
        thread_node(table, NodeKindMut::ClassDeclaration(&mut class.data));
    }
}

fn thread_node(table: &ClassTable, node: NodeKindMut<'_>) {
    match node {
        NodeKindMut::ClassDeclaration(decl) => {
            NodeKindMut::ClassDeclaration(&mut *decl).for_each_child(&mut |child| thread_node(table, child));
            thread_class(table, decl);
        }
        other => {
            other.for_each_child(&mut |child| thread_node(table, child));
        }
    }
}

fn thread_class(table: &ClassTable, decl: &mut ClassDeclaration) {
    let id = match decl.id {
        Some(id) => id,
        None => return,
    };
    let def = table.class(id);
    if def.is_interface() {
        return;
    }
    let span = def.span;
    let class_ty = def.ty();
    let this = || typed(span, ExprKind::This(None), class_ty.clone());
    let outer = def.outer_field.map(|field| (field, table.field(field)));
    let captures: Vec<(FieldRef, FieldDef)> =
        def.captures.iter().map(|c| (c.field, table.field(c.field))).collect();

    let mut init = vec![];
    for (field, field_def) in &captures {
        let value = local(span, field_def.name.as_str(), field_def.ty.clone());
        init.push(assign_stmt(span, field_access(span, this(), field_def, *field), value));
    }
    let mut kept = Vec::with_capacity(decl.members.len());
    for mut member in decl.members.drain(..) {
        let is_static = member.modifiers.is_static();
        match &mut member.kind {
            ClassMemberKind::Initializer(block) if !is_static => {
                let block_span = block.span;
                let block = std::mem::replace(block, Spanned::new(block_span, Block::default()));
                init.push(Spanned::new(block_span, Stmt::from(StmtKind::Block(block.data))));
                continue;
            }
            ClassMemberKind::Field(field) if !is_static => {
                if let Some(field_ref) = field.field {
                    let field_def = table.field(field_ref);
                    if field_def.constant.is_none() {
                        if let Some(value) = field.initializer.take() {
                            let target = field_access(value.span, this(), &field_def, field_ref);
                            init.push(assign_stmt(value.span, target, *value));
                        }
                    }
                }
            }
            _ => {}
        }
        kept.push(member);
    }
    decl.members = kept;

    let params: Vec<ParamDef> = captures
        .iter()
        .map(|(_, field_def)| ParamDef { name: field_def.name.clone(), ty: field_def.ty.clone() })
        .collect();
    let finit = if init.is_empty() {
        None
    } else {
        let name = Symbol::from("finit$");
        let modifiers = Modifiers::new(&[Modifier::Private, Modifier::Synthetic]);
        let method = table.add_method(
            id,
            MethodDef {
                name: name.clone(),
                kind: MethodKind::Method,
                params: params.clone(),
                return_ty: Type::Void,
                throws: vec![],
                modifiers,
                span,
            },
        );
        decl.members.push(method_member(
            span,
            name,
            modifiers,
            MethodKind::Method,
            &params,
            &Type::Void,
            &[],
            init,
            method,
        ));
        Some(method)
    };

    let captured_args = || {
        params
            .iter()
            .map(|param| local(span, param.name.as_str(), param.ty.clone()))
            .collect::<Vec<_>>()
    };
    for member in &mut decl.members {
        let ctor = match &mut member.kind {
            ClassMemberKind::Constructor(ctor) => ctor,
            _ => continue,
        };
        if let Some((_, outer_def)) = &outer {
            ctor.params.insert(0, parameter(span, &outer_def.name, &outer_def.ty));
        }
        for param in &params {
            ctor.params.push(parameter(span, &param.name, &param.ty));
        }
        let body = match &mut ctor.body {
            Some(body) => body,
            None => continue,
        };
        let call_kind = match body.statements.first_mut().map(|stmt| &mut stmt.data.kind) {
            Some(StmtKind::ConstructorCall(call)) => {
                if let ConstructorCallKind::This = call.kind {
                    if let Some((_, outer_def)) = &outer {
                        let outer = local(span, outer_def.name.as_str(), outer_def.ty.clone());
                        call.outer = Some(Box::new(outer));
                    }
                    call.captured_args = captured_args();
                }
                Some(call.kind)
            }
            _ => None,
        };
        if let Some(ConstructorCallKind::This) = call_kind {
            continue;
        }

        let mut prologue = vec![];
        if let Some((field, outer_def)) = &outer {
            let value = local(span, outer_def.name.as_str(), outer_def.ty.clone());
            prologue.push(assign_stmt(span, field_access(span, this(), outer_def, *field), value));
        }
        if let Some(finit) = finit {
            let call = MethodCall {
                target: Some(this()),
                name: Spanned::new(span, Symbol::from("finit$")),
                args: captured_args(),
                method: Some(finit),
            };
            prologue.push(expr_stmt(typed(span, ExprKind::MethodCall(Box::new(call)), Type::Void)));
        }
        let at = if call_kind.is_some() { 1 } else { 0 };
        for (offset, stmt) in prologue.into_iter().enumerate() {
            body.statements.insert(at + offset, stmt);
        }
    }
}

fn into_holder(expr: Spanned<Expr>) -> Result<Spanned<Expr>, Spanned<Expr>> {
    match expr.data.kind {
        ExprKind::FieldAccess(holder, ..) => Ok(*holder),
        kind => Err(Spanned::new(expr.span, Expr { kind, ty: expr.data.ty })),
    }
}

/// Holders that evaluate to the same instance without side effects when
/// evaluated twice.
fn is_pure(expr: &Spanned<Expr>) -> bool {
    match &expr.kind {
        ExprKind::This(_) | ExprKind::Local(_) | ExprKind::TypeName(_) => true,
        ExprKind::FieldAccess(holder, ..) => is_pure(holder),
        _ => false,
    }
}

fn restore(span: Span, kind: ExprKind, ty: Option<Type>) -> Spanned<Expr> {
    Spanned::new(span, Expr { kind, ty })
}

fn one(span: Span) -> Spanned<Expr> {
    typed(span, ExprKind::Literal(Literal::Int(1)), Type::Primitive(PrimitiveKind::Int))
}

fn local(span: Span, name: &str, ty: Type) -> Spanned<Expr> {
    typed(span, ExprKind::Local(Symbol::from(name)), ty)
}

fn expr_stmt(expr: Spanned<Expr>) -> Spanned<Stmt> {
    Spanned::new(expr.span, Stmt::from(StmtKind::Expression(Box::new(expr))))
}

fn assign_stmt(span: Span, target: Spanned<Expr>, value: Spanned<Expr>) -> Spanned<Stmt> {
    let ty = target.ty.clone().unwrap_or(Type::Error);
    expr_stmt(typed(span, ExprKind::Assign(None, Box::new(target), Box::new(value)), ty))
}

fn return_stmt(span: Span, value: Option<Spanned<Expr>>) -> Spanned<Stmt> {
    Spanned::new(span, Stmt::from(StmtKind::Return(value.map(Box::new))))
}

fn parameter(span: Span, name: &Symbol, ty: &Type) -> Spanned<Parameter> {
    Spanned::new(
        span,
        Parameter {
            ty: Spanned::new(span, TypeRef::resolved(ty.clone(), span)),
            name: Spanned::new(span, name.clone()),
            is_final: true,
        },
    )
}

#[allow(clippy::too_many_arguments)]
fn method_member(
    span: Span,
    name: Symbol,
    modifiers: Modifiers,
    kind: MethodKind,
    params: &[ParamDef],
    return_ty: &Type,
    throws: &[Type],
    statements: Vec<Spanned<Stmt>>,
    method: MethodRef,
) -> Spanned<ClassMember> {
    let decl = MethodDecl {
        return_ty: Spanned::new(span, TypeRef::resolved(return_ty.clone(), span)),
        params: params.iter().map(|p| parameter(span, &p.name, &p.ty)).collect(),
        throws: throws
            .iter()
            .map(|ty| Spanned::new(span, TypeRef::resolved(ty.clone(), span)))
            .collect(),
        body: Some(Spanned::new(span, Block { statements })),
        method: Some(method),
    };
    let kind = match kind {
        MethodKind::Method => ClassMemberKind::Method(decl),
        MethodKind::Constructor => ClassMemberKind::Constructor(decl),
    };
    Spanned::new(span, ClassMember { kind, name, modifiers })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class_loader::StubLoader;
    use syntax::build::{class, unit};

    #[test]
    fn combine_casts_promoted_results_back() {
        let table = ClassTable::new(Box::new(StubLoader::builtin()));
        let mut state = NestingState::default();
        let lowering = Lowering { table: &table, state: &mut state };
        let span = Span::default();
        let byte = Type::Primitive(PrimitiveKind::Byte);
        let current = typed(span, ExprKind::Local(Symbol::from("b")), byte.clone());
        let combined = lowering.combine(BinaryOp::Add, current, one(span), &byte, span);
        assert_eq!(Some(byte), combined.ty);
        match combined.data.kind {
            ExprKind::Cast(_, inner) => assert_eq!(Some(Type::Primitive(PrimitiveKind::Int)), inner.ty),
            other => panic!("expected a cast, got {:?}", other),
        }
    }

    #[test]
    fn flush_without_pending_members_leaves_unit_alone() {
        let mut unit = unit(None, vec![class("A", vec![])]);
        let mut state = NestingState::default();
        state.flush(&mut unit);
        assert!(unit.classes[0].members.is_empty());
        assert_eq!(0, state.accessor_count());
    }
}
