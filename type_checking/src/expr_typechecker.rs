//! Typing of expressions.
use crate::{
    access::top_level,
    conversion::{
        assignment_conversion, binary_operation_type, binary_promotion, cast_conversion, convert,
        is_reference_assignable, unary_promotion, widening_primitive, CastCheck, Constant,
        Conversion, ConversionError,
    },
    deferred::find_member_type,
    layout::fit_constant,
    lints,
    members::{
        describe, find_applicable, find_enclosing_method_owner, find_field, member_class,
        most_specific, search_order, Selection, Site,
    },
    method_body_type_checker::{BodyChecker, BodyKind},
    name_resolution::{Classified, NoInstance},
    semantics::{hint, ReferenceKind, SemanticError},
    type_system::{MethodDef, MethodKind, ParamDef},
};
use asciifile::{Span, Spanned};
use itertools::Itertools;
use log::trace;
use strtab::{most_related, Symbol};
use syntax::{
    BasicType, BinaryOp, ClassDeclaration, ClassId, ClassMember, ClassMemberKind,
    ConstructorCall, ConstructorCallKind, Expr, ExprKind, FieldRef, Literal, MethodCall,
    MethodDecl, MethodRef, Modifier, Modifiers, NewArray, NewObject, Parameter, PrimitiveKind,
    QualifiedName, Stmt, StmtKind, Type, TypeRef, UnaryOp,
};

/// What the checker knows about an expression besides the tree.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ExprInfo {
    pub ty: Type,
    pub constant: Option<Constant>,
}

impl ExprInfo {
    pub fn of(ty: Type) -> Self {
        ExprInfo { ty, constant: None }
    }

    pub fn error() -> Self {
        ExprInfo::of(Type::Error)
    }
}

type Checked = (ExprKind, ExprInfo);

fn failed() -> Checked {
    (ExprKind::Error, ExprInfo::error())
}

pub(crate) fn typed(span: Span, kind: ExprKind, ty: Type) -> Spanned<Expr> {
    Spanned::new(span, Expr::typed(kind, ty))
}

/// Moves the expression out, leaving an error node behind.
pub(crate) fn take_expr(expr: &mut Spanned<Expr>) -> Spanned<Expr> {
    let span = expr.span;
    std::mem::replace(expr, Spanned::new(span, Expr::from(ExprKind::Error)))
}

fn primitive(kind: PrimitiveKind) -> Type {
    Type::Primitive(kind)
}

pub(crate) fn unary_symbol(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Plus => "+",
        UnaryOp::Neg => "-",
        UnaryOp::BitNot => "~",
        UnaryOp::Not => "!",
        UnaryOp::PreIncrement | UnaryOp::PostIncrement => "++",
        UnaryOp::PreDecrement | UnaryOp::PostDecrement => "--",
    }
}

impl<'a, 'ctx, 'm> BodyChecker<'a, 'ctx, 'm> {
    /// Types `expr`, rewriting it in place, and records the type on the node.
    pub(crate) fn check_expr(&mut self, expr: &mut Spanned<Expr>) -> ExprInfo {
        let span = expr.span;
        let kind = std::mem::replace(&mut expr.data.kind, ExprKind::Error);
        let (kind, info) = self.check_kind(kind, span);
        expr.data.kind = kind;
        expr.data.ty = Some(info.ty.clone());
        info
    }

    fn check_kind(&mut self, kind: ExprKind, span: Span) -> Checked {
        match kind {
            ExprKind::Literal(literal) => self.check_literal(literal),
            ExprKind::Name(chain) => self.check_name(chain),
            ExprKind::Local(name) => match self.frame.locals.visible_definition(&name) {
                Some(var) => {
                    let info = ExprInfo {
                        ty: var.ty.clone(),
                        constant: var.constant.clone(),
                    };
                    (ExprKind::Local(name), info)
                }
                None => {
                    trace!("synthesized local {} is not defined", name);
                    failed()
                }
            },
            ExprKind::This(qualifier) => self.check_this(qualifier, span),
            ExprKind::Super(_) => {
                self.report(span, SemanticError::SuperAsValue);
                failed()
            }
            ExprKind::TypeName(ty) => (ExprKind::TypeName(ty.clone()), ExprInfo::of(ty)),
            ExprKind::FieldAccess(target, name, field) => self.check_field_access(*target, name, field, span),
            ExprKind::ArrayLength(mut array) => {
                self.check_expr(&mut array);
                (ExprKind::ArrayLength(array), ExprInfo::of(primitive(PrimitiveKind::Int)))
            }
            ExprKind::MethodCall(call) => self
                .check_call(call, span)
                .unwrap_or_else(failed),
            ExprKind::NewObject(new) => {
                if new.body.is_some() {
                    self.check_anonymous(new, span).unwrap_or_else(failed)
                } else {
                    self.check_new(new, span).unwrap_or_else(failed)
                }
            }
            ExprKind::NewArray(new) => self.check_new_array(new),
            ExprKind::ArrayInitializer(elements) => {
                self.report(
                    span,
                    SemanticError::MalformedDeclaration {
                        reason: "array initializer outside of a declaration".to_string(),
                    },
                );
                (ExprKind::ArrayInitializer(elements), ExprInfo::error())
            }
            ExprKind::ArrayAccess(mut array, mut index) => {
                let array_info = self.check_expr(&mut array);
                let index_info = self.check_expr(&mut index);
                self.check_index(&mut index, index_info);
                let ty = match array_info.ty {
                    Type::Array(element) => *element,
                    Type::Error => Type::Error,
                    other => {
                        self.report(
                            array.span,
                            SemanticError::CannotIndexNonArray { ty: other.to_string() },
                        );
                        Type::Error
                    }
                };
                (ExprKind::ArrayAccess(array, index), ExprInfo::of(ty))
            }
            ExprKind::Unary(op, operand) => self.check_unary(op, operand, span),
            ExprKind::Binary(op, lhs, rhs) => self.check_binary(op, lhs, rhs, span),
            ExprKind::Assign(op, lhs, rhs) => self.check_assign(op, lhs, rhs, span),
            ExprKind::Conditional(cond, then_expr, else_expr) => {
                self.check_conditional(cond, then_expr, else_expr, span)
            }
            ExprKind::Cast(ty, operand) => self.check_cast(ty, operand),
            ExprKind::InstanceOf(mut operand, mut ty) => {
                let info = self.check_expr(&mut operand);
                let target = self.resolve_type(&mut ty, ReferenceKind::TypeUse);
                let ok = (info.ty.is_reference() || info.ty.is_error())
                    && (target.is_reference() || target.is_error())
                    && cast_conversion(self.table, &info.ty, &target).is_ok();
                if !ok {
                    self.report(
                        span,
                        SemanticError::InvalidCast {
                            from: info.ty.to_string(),
                            to: target.to_string(),
                        },
                    );
                }
                (
                    ExprKind::InstanceOf(operand, ty),
                    ExprInfo::of(primitive(PrimitiveKind::Boolean)),
                )
            }
            ExprKind::RuntimeCheckedCast(operand, ty) => (
                ExprKind::RuntimeCheckedCast(operand, ty.clone()),
                ExprInfo::of(ty),
            ),
            ExprKind::Error => failed(),
        }
    }

    fn check_literal(&mut self, literal: Literal) -> Checked {
        use syntax::PrimitiveKind::*;
        let ty = match &literal {
            Literal::Int(_) => primitive(Int),
            Literal::Long(_) => primitive(Long),
            Literal::Float(_) => primitive(Float),
            Literal::Double(_) => primitive(Double),
            Literal::Char(_) => primitive(Char),
            Literal::Boolean(_) => primitive(Boolean),
            Literal::String(_) => self.table.string(),
            Literal::Null => Type::Null,
        };
        let constant = Constant::from_literal(&literal);
        (ExprKind::Literal(literal), ExprInfo { ty, constant })
    }

    fn check_name(&mut self, chain: QualifiedName) -> Checked {
        match self.classify(&chain) {
            Classified::Value(expr, info) => (expr.data.kind, info),
            Classified::Type(_) => {
                self.report(
                    chain.span(),
                    SemanticError::TypeUsedAsValue {
                        name: chain.to_string(),
                    },
                );
                failed()
            }
            Classified::Package(package) => {
                self.report(chain.span(), SemanticError::PackageUsedAsValue { name: package });
                failed()
            }
            Classified::Failed => failed(),
        }
    }

    fn check_this(&mut self, qualifier: Option<QualifiedName>, span: Span) -> Checked {
        let current = self.current_class();
        let target = match &qualifier {
            None => current,
            Some(name) => match self.resolve_class_name(name, ReferenceKind::TypeUse) {
                Some(id) => id,
                None => return failed(),
            },
        };
        if !crate::access::enclosing_chain(self.table, current).contains(&target) {
            let name = qualifier.map(|q| q.to_string()).unwrap_or_default();
            self.report(span, SemanticError::NotAnEnclosingClass { name });
            return failed();
        }
        match self.outer_instance(target, span) {
            Ok(expr) => (expr.data.kind, ExprInfo::of(self.table.class(target).ty())),
            Err(reason) => {
                self.report_no_instance(reason, target, span, None);
                failed()
            }
        }
    }

    /// Reports why no instance of `target` is available. `member` names the
    /// member that needed it.
    pub(crate) fn report_no_instance(
        &self,
        reason: NoInstance,
        target: ClassId,
        span: Span,
        member: Option<(&str, &str)>,
    ) {
        let error = match (reason, member) {
            (NoInstance::Static, Some((kind, name))) => SemanticError::StaticContext {
                kind: kind.to_string(),
                name: name.to_string(),
            },
            (NoInstance::Static, None) => SemanticError::ThisInStaticContext,
            (NoInstance::BeforeSuper, Some((_, name))) => SemanticError::BeforeSuperCall {
                what: format!("'{}'", name),
            },
            (NoInstance::BeforeSuper, None) => SemanticError::BeforeSuperCall {
                what: "'this'".to_string(),
            },
            (NoInstance::Missing, _) => SemanticError::NoEnclosingInstance {
                ty: self.class_name(target),
            },
        };
        self.report(span, error);
    }

    /// Creation sites name the class whose instance is missing.
    fn report_no_enclosing(&self, reason: NoInstance, target: ClassId, span: Span) {
        match reason {
            NoInstance::BeforeSuper => self.report_no_instance(reason, target, span, None),
            NoInstance::Static | NoInstance::Missing => self.report(
                span,
                SemanticError::NoEnclosingInstance {
                    ty: self.class_name(target),
                },
            ),
        }
    }

    /// `super` or `Outer.super` as qualifier: the class whose superclass is
    /// searched and the instance the member is accessed on.
    fn super_base(&mut self, qualifier: &Option<QualifiedName>, span: Span) -> Option<(ClassId, Spanned<Expr>)> {
        let current = self.current_class();
        let class = match qualifier {
            None => current,
            Some(name) => {
                let id = self.resolve_class_name(name, ReferenceKind::TypeUse)?;
                if !crate::access::enclosing_chain(self.table, current).contains(&id) {
                    self.report(span, SemanticError::NotAnEnclosingClass { name: name.to_string() });
                    return None;
                }
                id
            }
        };
        let instance = match self.outer_instance(class, span) {
            Ok(instance) => instance,
            Err(reason) => {
                match reason {
                    NoInstance::BeforeSuper => self.report(
                        span,
                        SemanticError::BeforeSuperCall {
                            what: "'super'".to_string(),
                        },
                    ),
                    reason => self.report_no_instance(reason, class, span, None),
                }
                return None;
            }
        };
        let superclass = self.table.class(class).superclass.as_ref().and_then(Type::class_id)?;
        Some((superclass, instance))
    }

    fn check_field_access(
        &mut self,
        mut target: Spanned<Expr>,
        name: Spanned<Symbol>,
        field: Option<FieldRef>,
        span: Span,
    ) -> Checked {
        if let Some(field) = field {
            // generated by an earlier rewrite
            let def = self.table.field(field);
            return (
                ExprKind::FieldAccess(Box::new(target), name, Some(field)),
                ExprInfo::of(def.ty),
            );
        }
        match target.data.kind {
            ExprKind::Name(ref chain) => {
                let mut chain = chain.clone();
                chain.segments.push(name);
                return self.check_name(chain);
            }
            ExprKind::Super(ref qualifier) => {
                let qualifier = qualifier.clone();
                let (superclass, instance) = match self.super_base(&qualifier, span) {
                    Some(base) => base,
                    None => return failed(),
                };
                let site = Site {
                    from: self.current_class(),
                    qualifier: None,
                    via_super: true,
                };
                return match self.lookup_field(superclass, &name, site) {
                    Some(field) => {
                        let def = self.table.field(field);
                        self.note_field_use(field, name.span);
                        (
                            ExprKind::FieldAccess(Box::new(instance), name, Some(field)),
                            ExprInfo::of(def.ty),
                        )
                    }
                    None => failed(),
                };
            }
            _ => {}
        }
        let info = self.check_expr(&mut target);
        self.field_of_value(target, info, name)
    }

    /// `target.name` for a checked value `target`.
    pub(crate) fn field_of_value(&mut self, target: Spanned<Expr>, info: ExprInfo, name: Spanned<Symbol>) -> Checked {
        if info.ty.is_error() {
            return failed();
        }
        if let Type::Array(_) = info.ty {
            if name.as_str() == "length" {
                return (
                    ExprKind::ArrayLength(Box::new(target)),
                    ExprInfo::of(primitive(PrimitiveKind::Int)),
                );
            }
        }
        let class = match member_class(self.table, &info.ty) {
            Some(class) => class,
            None => {
                self.report(
                    name.span,
                    SemanticError::FieldDoesNotExist {
                        field: name.data.to_string(),
                        ty: info.ty.to_string(),
                        hint: String::new(),
                    },
                );
                return failed();
            }
        };
        let site = Site {
            from: self.current_class(),
            qualifier: Some(&info.ty),
            via_super: false,
        };
        match self.lookup_field(class, &name, site) {
            Some(field) => {
                let def = self.table.field(field);
                self.note_field_use(field, name.span);
                let constant = match target.kind {
                    ExprKind::TypeName(_) if def.modifiers.is_final() => def.constant.clone(),
                    _ => None,
                };
                (
                    ExprKind::FieldAccess(Box::new(target), name, Some(field)),
                    ExprInfo { ty: def.ty, constant },
                )
            }
            None => failed(),
        }
    }

    /// Field `name` of `class` as seen from `site`; reports missing and
    /// inaccessible fields.
    pub(crate) fn lookup_field(&self, class: ClassId, name: &Spanned<Symbol>, site: Site<'_>) -> Option<FieldRef> {
        let found = find_field(self.table, class, name.as_str(), site);
        if let Some(field) = found.applicable.first() {
            return Some(*field);
        }
        if !found.inaccessible.is_empty() {
            self.report(
                name.span,
                SemanticError::NotAccessible {
                    kind: "field".to_string(),
                    name: name.data.to_string(),
                    from: self.class_name(site.from),
                },
            );
            return None;
        }
        let names: Vec<Symbol> = search_order(self.table, class)
            .into_iter()
            .flat_map(|c| {
                self.table
                    .class(c)
                    .fields
                    .iter()
                    .filter(|f| !f.modifiers.has(Modifier::Synthetic))
                    .map(|f| f.name.clone())
                    .collect::<Vec<_>>()
            })
            .collect();
        self.report(
            name.span,
            SemanticError::FieldDoesNotExist {
                field: name.data.to_string(),
                ty: self.class_name(class),
                hint: hint(most_related(&name.data, names.iter()).map(Symbol::as_str)),
            },
        );
        None
    }

    pub(crate) fn note_field_use(&self, field: FieldRef, span: Span) {
        let def = self.table.field(field);
        let deprecated = def.modifiers.has(Modifier::Deprecated) || self.table.class(field.class).is_deprecated();
        if deprecated && !self.same_top_level(field.class) {
            self.context.report_lint(
                lints::DEPRECATED,
                span,
                SemanticError::DeprecatedUse {
                    kind: "field".to_string(),
                    name: format!("{}.{}", self.class_name(field.class), def.name),
                },
            );
        }
    }

    pub(crate) fn note_method_use(&self, method: MethodRef, span: Span) {
        let def = self.table.method(method);
        let deprecated = def.modifiers.has(Modifier::Deprecated) || self.table.class(method.class).is_deprecated();
        if deprecated && !self.same_top_level(method.class) {
            let kind = if def.is_constructor() { "constructor" } else { "method" };
            self.context.report_lint(
                lints::DEPRECATED,
                span,
                SemanticError::DeprecatedUse {
                    kind: kind.to_string(),
                    name: format!("{}.{}", self.class_name(method.class), def.signature()),
                },
            );
        }
    }

    fn same_top_level(&self, class: ClassId) -> bool {
        top_level(self.table, class) == top_level(self.table, self.current_class())
    }

    pub(crate) fn check_args(&mut self, args: &mut [Spanned<Expr>]) -> Vec<ExprInfo> {
        args.iter_mut()
            .map(|arg| {
                let info = self.check_expr(arg);
                if info.ty == Type::Void {
                    self.report(arg.span, SemanticError::VoidValue);
                    return ExprInfo::error();
                }
                info
            })
            .collect()
    }

    /// Overload resolution. Errors are reported unless an argument is
    /// already erroneous.
    pub(crate) fn select_method(
        &self,
        class: ClassId,
        name: &str,
        args: &[ExprInfo],
        is_constructor: bool,
        site: Site<'_>,
        span: Span,
    ) -> Option<MethodRef> {
        let types: Vec<Type> = args.iter().map(|arg| arg.ty.clone()).collect();
        let erroneous = types.iter().any(Type::is_error);
        let kind = if is_constructor { "constructor" } else { "method" };
        let candidates = find_applicable(self.table, class, name, &types, is_constructor, site);
        if candidates.applicable.is_empty() {
            if erroneous {
                return None;
            }
            let error = if candidates.inaccessible.is_empty() {
                let described = if candidates.named.is_empty() {
                    String::new()
                } else {
                    format!("; candidates are: {}", describe(self.table, &candidates.named))
                };
                SemanticError::NoMatchingMember {
                    kind: kind.to_string(),
                    name: name.to_string(),
                    args: types.iter().join(", "),
                    candidates: described,
                }
            } else {
                SemanticError::NotAccessible {
                    kind: kind.to_string(),
                    name: describe(self.table, &candidates.inaccessible[..1]),
                    from: self.class_name(site.from),
                }
            };
            self.report(span, error);
            return None;
        }
        match most_specific(self.table, &candidates.applicable) {
            Selection::Found(method) => Some(method),
            Selection::Ambiguous(methods) => {
                if erroneous {
                    return methods.first().cloned();
                }
                self.report(
                    span,
                    SemanticError::AmbiguousCall {
                        name: name.to_string(),
                        candidates: describe(self.table, &methods),
                    },
                );
                None
            }
            Selection::NoneApplicable => None,
        }
    }

    /// Converts the checked arguments to the parameter types of `method`.
    pub(crate) fn convert_args(&mut self, args: &mut [Spanned<Expr>], infos: &[ExprInfo], method: MethodRef) {
        let def = self.table.method(method);
        for ((arg, info), param) in args.iter_mut().zip(infos).zip(&def.params) {
            if let Ok(conversion) = assignment_conversion(self.table, &info.ty, None, &param.ty) {
                let old = take_expr(arg);
                *arg = convert(old, &param.ty, conversion);
            }
        }
    }

    fn check_call(&mut self, mut call: Box<MethodCall>, span: Span) -> Option<Checked> {
        let args = self.check_args(&mut call.args);
        let name = call.name.data.clone();
        let current = self.current_class();

        let (method, target) = match call.target.take() {
            None => self.unqualified_call(&name, &args, span)?,
            Some(mut target) => match std::mem::replace(&mut target.data.kind, ExprKind::Error) {
                ExprKind::Super(qualifier) => {
                    let (superclass, _) = self.super_base(&qualifier, target.span)?;
                    let site = Site {
                        from: current,
                        qualifier: None,
                        via_super: true,
                    };
                    let method = self.select_method(superclass, name.as_str(), &args, false, site, span)?;
                    let super_ty = self.table.class(superclass).ty();
                    (method, typed(target.span, ExprKind::Super(qualifier), super_ty))
                }
                ExprKind::Name(chain) => match self.classify(&chain) {
                    Classified::Type(class) => {
                        let method = self.select_method(class, name.as_str(), &args, false, Site::unqualified(current), span)?;
                        let def = self.table.method(method);
                        if !def.modifiers.is_static() {
                            self.report(
                                span,
                                SemanticError::StaticContext {
                                    kind: "method".to_string(),
                                    name: def.signature(),
                                },
                            );
                            return None;
                        }
                        let ty = self.table.class(class).ty();
                        (method, typed(target.span, ExprKind::TypeName(ty.clone()), ty))
                    }
                    Classified::Value(value, info) => self.instance_call(value, info, &name, &args, span)?,
                    Classified::Package(package) => {
                        self.report(target.span, SemanticError::PackageUsedAsValue { name: package });
                        return None;
                    }
                    Classified::Failed => return None,
                },
                other => {
                    target.data.kind = other;
                    let info = self.check_expr(&mut target);
                    self.instance_call(target, info, &name, &args, span)?
                }
            },
        };

        self.convert_args(&mut call.args, &args, method);
        self.note_method_use(method, call.name.span);
        let return_ty = self.table.method(method).return_ty;
        call.target = Some(target);
        call.method = Some(method);
        Some((ExprKind::MethodCall(call), ExprInfo::of(return_ty)))
    }

    fn instance_call(
        &mut self,
        target: Spanned<Expr>,
        info: ExprInfo,
        name: &Symbol,
        args: &[ExprInfo],
        span: Span,
    ) -> Option<(MethodRef, Spanned<Expr>)> {
        if info.ty.is_error() {
            return None;
        }
        let class = match member_class(self.table, &info.ty) {
            Some(class) => class,
            None => {
                self.report(target.span, SemanticError::NotAClassType { ty: info.ty.to_string() });
                return None;
            }
        };
        let site = Site {
            from: self.current_class(),
            qualifier: Some(&info.ty),
            via_super: false,
        };
        let method = self.select_method(class, name.as_str(), args, false, site, span)?;
        Some((method, target))
    }

    /// An unqualified call targets the innermost enclosing class declaring a
    /// method of that name.
    fn unqualified_call(&mut self, name: &Symbol, args: &[ExprInfo], span: Span) -> Option<(MethodRef, Spanned<Expr>)> {
        let current = self.current_class();
        let owner = match find_enclosing_method_owner(self.table, current, name.as_str()) {
            Some(owner) => owner,
            None => {
                let types = args.iter().map(|arg| &arg.ty).join(", ");
                self.report(
                    span,
                    SemanticError::NoMatchingMember {
                        kind: "method".to_string(),
                        name: name.to_string(),
                        args: types,
                        candidates: String::new(),
                    },
                );
                return None;
            }
        };
        let method = self.select_method(owner, name.as_str(), args, false, Site::unqualified(current), span)?;
        let def = self.table.method(method);
        let target = if def.modifiers.is_static() {
            let ty = self.table.class(method.class).ty();
            typed(span, ExprKind::TypeName(ty.clone()), ty)
        } else {
            match self.outer_instance(owner, span) {
                Ok(target) => target,
                Err(reason) => {
                    self.report_no_instance(reason, owner, span, Some(("method", &def.signature())));
                    return None;
                }
            }
        };
        Some((method, target))
    }

    fn check_new(&mut self, mut new: Box<NewObject>, span: Span) -> Option<Checked> {
        let current = self.current_class();
        let class = match new.outer.take() {
            Some(mut outer) => {
                let info = self.check_expr(&mut outer);
                let class = self.qualified_new_class(&info.ty, &mut new.class, outer.span)?;
                if !self.table.class(class).has_outer_instance() {
                    self.report(
                        span,
                        SemanticError::QualifiedNewOfStaticClass {
                            ty: self.class_name(class),
                        },
                    );
                    return None;
                }
                new.outer = Some(outer);
                class
            }
            None => match self.resolve_type(&mut new.class, ReferenceKind::TypeUse) {
                Type::Class(class) => class.id,
                Type::Error => return None,
                other => {
                    self.report(new.class.span, SemanticError::NotAClassType { ty: other.to_string() });
                    return None;
                }
            },
        };
        let def = self.table.class(class);
        if def.is_abstract() || def.is_interface() {
            self.report(
                span,
                SemanticError::InstantiateAbstract {
                    class: def.qualified_name.to_string(),
                },
            );
            return None;
        }
        if new.outer.is_none() && def.has_outer_instance() {
            if let Some(enclosing) = def.enclosing {
                match self.outer_instance(enclosing, span) {
                    Ok(outer) => new.outer = Some(outer),
                    Err(reason) => {
                        self.report_no_enclosing(reason, enclosing, span);
                        return None;
                    }
                }
            }
        }

        let args = self.check_args(&mut new.args);
        let site = Site::unqualified(current);
        let ctor = self.select_method(class, def.name.as_str(), &args, true, site, span)?;
        self.convert_args(&mut new.args, &args, ctor);
        self.note_method_use(ctor, span);
        new.ctor = Some(ctor);
        new.captured_args = self.captured_values(class, span);
        Some((ExprKind::NewObject(new), ExprInfo::of(def.ty())))
    }

    /// `outer.new Inner()`: `Inner` is a member type of the class of `outer`.
    fn qualified_new_class(&mut self, outer: &Type, class: &mut Spanned<TypeRef>, span: Span) -> Option<ClassId> {
        if outer.is_error() {
            return None;
        }
        let outer_class = match member_class(self.table, outer) {
            Some(outer_class) => outer_class,
            None => {
                self.report(span, SemanticError::NotAClassType { ty: outer.to_string() });
                return None;
            }
        };
        let name = match &class.basic.data {
            BasicType::Named(name) if name.is_simple() && class.array_depth == 0 => name.to_string(),
            _ => {
                self.report(
                    class.span,
                    SemanticError::MalformedDeclaration {
                        reason: "qualified class instance creation requires a simple class name".to_string(),
                    },
                );
                return None;
            }
        };
        match find_member_type(self.table, outer_class, &name) {
            Some(id) => {
                self.check_class_use(id, class.span);
                class.resolved = Some(self.table.class(id).ty());
                Some(id)
            }
            None => {
                self.report(
                    class.span,
                    SemanticError::UnresolvedType {
                        kind: ReferenceKind::TypeUse,
                        name: format!("{}.{}", outer, name),
                        hint: String::new(),
                    },
                );
                None
            }
        }
    }

    /// Checks an anonymous class creation. The class gets a constructor
    /// forwarding its arguments to the selected superclass constructor:
    /// `outer$` for the enclosing instance of the superclass, then `x0..xn`.
    fn check_anonymous(&mut self, mut new: Box<NewObject>, span: Span) -> Option<Checked> {
        let mut body = new.body.take()?;
        let anonymous = body.id?;
        let anonymous_def = self.table.class(anonymous);
        let superclass = anonymous_def.superclass.as_ref().and_then(Type::class_id)?;
        let base_ty = match anonymous_def.interfaces.first() {
            Some(interface) => interface.clone(),
            None => self.table.class(superclass).ty(),
        };
        new.class.resolved = Some(base_ty);

        if self.in_prologue() {
            self.report(
                span,
                SemanticError::BeforeSuperCall {
                    what: "'this'".to_string(),
                },
            );
            return None;
        }

        let super_def = self.table.class(superclass);
        let base_outer = match new.outer.take() {
            Some(mut outer) => {
                self.check_expr(&mut outer);
                if !super_def.has_outer_instance() {
                    self.report(
                        outer.span,
                        SemanticError::QualifiedNewOfStaticClass {
                            ty: super_def.qualified_name.to_string(),
                        },
                    );
                    return None;
                }
                Some(outer)
            }
            None => match super_def.enclosing.filter(|_| super_def.has_outer_instance()) {
                Some(enclosing) => match self.outer_instance(enclosing, span) {
                    Ok(outer) => Some(outer),
                    Err(reason) => {
                        self.report_no_enclosing(reason, enclosing, span);
                        return None;
                    }
                },
                None => None,
            },
        };

        let args = self.check_args(&mut new.args);
        let site = Site {
            from: anonymous,
            qualifier: None,
            via_super: true,
        };
        let super_ctor = self.select_method(superclass, super_def.name.as_str(), &args, true, site, span)?;
        self.convert_args(&mut new.args, &args, super_ctor);
        self.note_method_use(super_ctor, span);

        let ctor = self.synthesize_anonymous_ctor(&mut body, anonymous, super_ctor, base_outer.as_ref(), span);
        if let Some(outer) = base_outer {
            new.args.insert(0, outer);
        }
        new.ctor = Some(ctor);

        self.compute_captures(&body, anonymous);
        if anonymous_def.has_outer_instance() {
            match self.outer_instance(self.current_class(), span) {
                Ok(outer) => new.outer = Some(outer),
                Err(reason) => {
                    self.report_no_enclosing(reason, self.current_class(), span);
                    return None;
                }
            }
        }
        self.check_class(&mut body);
        new.captured_args = self.captured_values(anonymous, span);
        new.body = Some(body);
        Some((ExprKind::NewObject(new), ExprInfo::of(anonymous_def.ty())))
    }

    fn synthesize_anonymous_ctor(
        &mut self,
        body: &mut ClassDeclaration,
        anonymous: ClassId,
        super_ctor: MethodRef,
        base_outer: Option<&Spanned<Expr>>,
        span: Span,
    ) -> MethodRef {
        let super_def = self.table.method(super_ctor);
        let mut params: Vec<(Symbol, Type)> = vec![];
        let mut forwarded = vec![];
        let outer_arg = base_outer.map(|outer| {
            let ty = outer.ty.clone().unwrap_or(Type::Error);
            params.push((Symbol::from("outer$"), ty));
            Box::new(Spanned::new(span, Expr::from(ExprKind::Local(Symbol::from("outer$")))))
        });
        for (i, param) in super_def.params.iter().enumerate() {
            let name = Symbol::from(format!("x{}", i));
            forwarded.push(Spanned::new(span, Expr::from(ExprKind::Local(name.clone()))));
            params.push((name, param.ty.clone()));
        }

        let modifiers = Modifiers::new(&[Modifier::Synthetic]);
        let ctor = self.table.add_method(
            anonymous,
            MethodDef {
                name: Symbol::from("<init>"),
                kind: MethodKind::Constructor,
                params: params
                    .iter()
                    .map(|(name, ty)| ParamDef {
                        name: name.clone(),
                        ty: ty.clone(),
                    })
                    .collect(),
                return_ty: Type::Void,
                throws: super_def.throws.clone(),
                modifiers,
                span,
            },
        );

        let call = ConstructorCall {
            kind: ConstructorCallKind::Super,
            outer: outer_arg,
            args: forwarded,
            captured_args: vec![],
            ctor: None,
        };
        let decl = MethodDecl {
            return_ty: Spanned::new(span, TypeRef::resolved(Type::Void, span)),
            params: params
                .into_iter()
                .map(|(name, ty)| {
                    Spanned::new(
                        span,
                        Parameter {
                            ty: Spanned::new(span, TypeRef::resolved(ty, span)),
                            name: Spanned::new(span, name),
                            is_final: true,
                        },
                    )
                })
                .collect(),
            throws: super_def
                .throws
                .iter()
                .map(|ty| Spanned::new(span, TypeRef::resolved(ty.clone(), span)))
                .collect(),
            body: Some(Spanned::new(
                span,
                syntax::Block {
                    statements: vec![Spanned::new(
                        span,
                        Stmt::from(StmtKind::ConstructorCall(Box::new(call))),
                    )],
                },
            )),
            method: Some(ctor),
        };
        body.members.push(Spanned::new(
            span,
            ClassMember {
                kind: ClassMemberKind::Constructor(decl),
                name: body.name.data.clone(),
                modifiers,
            },
        ));
        ctor
    }

    fn check_new_array(&mut self, mut new: Box<NewArray>) -> Checked {
        let element = self.resolve_type(&mut new.element, ReferenceKind::TypeUse);
        for dim in &mut new.dims {
            let info = self.check_expr(dim);
            self.check_index(dim, info);
        }
        let ty = if element.is_error() {
            Type::Error
        } else {
            Type::array_of(element, new.dims.len() + new.extra_dims)
        };
        if let Some(init) = &mut new.init {
            let element = ty.element_type().cloned().unwrap_or(Type::Error);
            for value in init {
                self.check_initializer(value, &element);
            }
        }
        (ExprKind::NewArray(new), ExprInfo::of(ty))
    }

    /// Array indices and dimensions are promoted to `int`.
    fn check_index(&mut self, index: &mut Spanned<Expr>, info: ExprInfo) {
        let int = primitive(PrimitiveKind::Int);
        match info.ty.primitive() {
            Some(kind) if kind.is_integral() && unary_promotion(kind) == PrimitiveKind::Int => {
                self.promote(index, &info.ty, PrimitiveKind::Int);
            }
            _ => {
                self.convert_to(index, info, &int);
            }
        }
    }

    fn promote(&self, expr: &mut Spanned<Expr>, from: &Type, to: PrimitiveKind) {
        if let Some(kind) = from.primitive() {
            if kind != to && widening_primitive(kind, to) {
                let old = take_expr(expr);
                *expr = convert(old, &primitive(to), Conversion::WideningPrimitive);
            }
        }
    }

    fn check_unary(&mut self, op: UnaryOp, mut operand: Box<Spanned<Expr>>, span: Span) -> Checked {
        let info = self.check_expr(&mut operand);
        let ty = &info.ty;
        let numeric = ty.primitive().filter(|kind| kind.is_numeric());
        let result = match op {
            _ if ty.is_error() => Some(Type::Error),
            UnaryOp::Plus | UnaryOp::Neg => numeric.map(|kind| primitive(unary_promotion(kind))),
            UnaryOp::BitNot => ty
                .primitive()
                .filter(|kind| kind.is_integral())
                .map(|kind| primitive(unary_promotion(kind))),
            UnaryOp::Not => Some(ty.clone()).filter(Type::is_boolean),
            _ => {
                self.check_lvalue(&operand, false);
                numeric.map(|_| ty.clone())
            }
        };
        match result {
            Some(result) => {
                if let (Some(from), Some(to)) = (ty.primitive(), result.primitive()) {
                    if !op.is_increment() {
                        self.promote(&mut operand, &primitive(from), to);
                    }
                }
                let constant = if op.is_increment() {
                    None
                } else {
                    info.constant.as_ref().and_then(|c| Constant::unary(op, c))
                };
                (ExprKind::Unary(op, operand), ExprInfo { ty: result, constant })
            }
            None => {
                self.report(
                    span,
                    SemanticError::InvalidOperandType {
                        op: unary_symbol(op).to_string(),
                        ty: info.ty.to_string(),
                    },
                );
                failed()
            }
        }
    }

    fn check_binary(
        &mut self,
        op: BinaryOp,
        mut lhs: Box<Spanned<Expr>>,
        mut rhs: Box<Spanned<Expr>>,
        span: Span,
    ) -> Checked {
        let left = self.check_expr(&mut lhs);
        let right = self.check_expr(&mut rhs);
        if left.ty == Type::Void || right.ty == Type::Void {
            self.report(span, SemanticError::VoidValue);
            return failed();
        }
        let result = match binary_operation_type(self.table, op, &left.ty, &right.ty) {
            Some(result) => result,
            None => {
                self.report(
                    span,
                    SemanticError::InvalidOperandTypes {
                        op: op.symbol().to_string(),
                        lhs: left.ty.to_string(),
                        rhs: right.ty.to_string(),
                    },
                );
                return failed();
            }
        };
        self.promote_operands(op, &mut lhs, &left.ty, &mut rhs, &right.ty);
        let constant = match (&left.constant, &right.constant) {
            (Some(a), Some(b)) => Constant::binary(op, a, b),
            _ => None,
        };
        (ExprKind::Binary(op, lhs, rhs), ExprInfo { ty: result, constant })
    }

    fn promote_operands(&self, op: BinaryOp, lhs: &mut Spanned<Expr>, left: &Type, rhs: &mut Spanned<Expr>, right: &Type) {
        let (l, r) = match (left.primitive(), right.primitive()) {
            (Some(l), Some(r)) if l.is_numeric() && r.is_numeric() => (l, r),
            _ => return,
        };
        match op {
            BinaryOp::Shl | BinaryOp::Shr | BinaryOp::UShr => {
                self.promote(lhs, left, unary_promotion(l));
                self.promote(rhs, right, unary_promotion(r));
            }
            _ => {
                let target = binary_promotion(l, r);
                self.promote(lhs, left, target);
                self.promote(rhs, right, target);
            }
        }
    }

    fn check_assign(
        &mut self,
        op: Option<BinaryOp>,
        mut lhs: Box<Spanned<Expr>>,
        mut rhs: Box<Spanned<Expr>>,
        span: Span,
    ) -> Checked {
        let target = self.check_expr(&mut lhs);
        self.check_lvalue(&lhs, op.is_none());
        match op {
            None => {
                self.assign_to(&mut rhs, &target.ty);
            }
            Some(op) => {
                let value = self.check_expr(&mut rhs);
                if value.ty == Type::Void {
                    self.report(rhs.span, SemanticError::VoidValue);
                } else {
                    match binary_operation_type(self.table, op, &target.ty, &value.ty) {
                        None => self.report(
                            span,
                            SemanticError::InvalidOperandTypes {
                                op: format!("{}=", op.symbol()),
                                lhs: target.ty.to_string(),
                                rhs: value.ty.to_string(),
                            },
                        ),
                        Some(result) => {
                            if cast_conversion(self.table, &result, &target.ty).is_err() {
                                self.report(
                                    span,
                                    SemanticError::IncompatibleTypes {
                                        from: result.to_string(),
                                        to: target.ty.to_string(),
                                    },
                                );
                            }
                        }
                    }
                }
            }
        }
        (ExprKind::Assign(op, lhs, rhs), ExprInfo::of(target.ty))
    }

    /// Reports assignments to non-variables and to final variables. `plain`
    /// is set for `=`, which may initialize a blank final.
    fn check_lvalue(&mut self, target: &Spanned<Expr>, plain: bool) {
        match &target.kind {
            ExprKind::Local(name) => {
                let assignable = match self.frame.locals.visible_definition_mut(name) {
                    Some(var) if var.is_final => {
                        if plain && !var.initialized {
                            var.initialized = true;
                            true
                        } else {
                            false
                        }
                    }
                    _ => true,
                };
                if !assignable {
                    self.report(target.span, SemanticError::AssignToFinal { name: name.to_string() });
                }
            }
            ExprKind::FieldAccess(_, name, Some(field)) => {
                let def = self.table.field(*field);
                if def.modifiers.is_final() && !self.may_assign_blank_final(*field, def.has_initializer, def.modifiers) {
                    let shown = if def.modifiers.has(Modifier::Synthetic) {
                        name.as_str().trim_start_matches("val$").to_string()
                    } else {
                        name.data.to_string()
                    };
                    self.report(target.span, SemanticError::AssignToFinal { name: shown });
                }
            }
            ExprKind::ArrayLength(_) => self.report(
                target.span,
                SemanticError::AssignToFinal {
                    name: "length".to_string(),
                },
            ),
            ExprKind::ArrayAccess(..) | ExprKind::Error => {}
            _ => self.report(target.span, SemanticError::NotAnLvalue),
        }
    }

    /// Blank final fields are assigned in constructors and initializers of
    /// their own class.
    fn may_assign_blank_final(&self, field: FieldRef, has_initializer: bool, modifiers: Modifiers) -> bool {
        if has_initializer || modifiers.has(Modifier::Synthetic) || field.class != self.current_class() {
            return false;
        }
        match self.body_kind() {
            Some(BodyKind::Constructor) => !modifiers.is_static(),
            Some(BodyKind::Initializer) | Some(BodyKind::FieldInitializer) => {
                modifiers.is_static() == self.is_static_context()
            }
            _ => false,
        }
    }

    fn check_conditional(
        &mut self,
        mut cond: Box<Spanned<Expr>>,
        mut then_expr: Box<Spanned<Expr>>,
        mut else_expr: Box<Spanned<Expr>>,
        span: Span,
    ) -> Checked {
        let condition = self.check_condition(&mut cond);
        let then_info = self.check_expr(&mut then_expr);
        let else_info = self.check_expr(&mut else_expr);
        let ty = match self.conditional_type(&then_info, &else_info) {
            Some(ty) => ty,
            None => {
                self.report(
                    span,
                    SemanticError::IncompatibleTypes {
                        from: else_info.ty.to_string(),
                        to: then_info.ty.to_string(),
                    },
                );
                return failed();
            }
        };
        if let Some(kind) = ty.primitive() {
            self.promote(&mut then_expr, &then_info.ty, kind);
            self.promote(&mut else_expr, &else_info.ty, kind);
        }
        let constant = match (condition.constant.as_ref().and_then(Constant::as_bool), then_info.constant, else_info.constant) {
            (Some(true), Some(value), Some(_)) | (Some(false), Some(_), Some(value)) => fit_constant(value, &ty),
            _ => None,
        };
        (
            ExprKind::Conditional(cond, then_expr, else_expr),
            ExprInfo { ty, constant },
        )
    }

    fn conditional_type(&self, a: &ExprInfo, b: &ExprInfo) -> Option<Type> {
        use syntax::PrimitiveKind::*;
        if a.ty == b.ty {
            return Some(a.ty.clone());
        }
        match (&a.ty, &b.ty) {
            (Type::Error, _) | (_, Type::Error) => return Some(Type::Error),
            (Type::Null, other) | (other, Type::Null) if other.is_reference() => return Some(other.clone()),
            _ => {}
        }
        if let (Some(l), Some(r)) = (a.ty.primitive(), b.ty.primitive()) {
            if !l.is_numeric() || !r.is_numeric() {
                return None;
            }
            let narrow = |small: PrimitiveKind, other: &ExprInfo| match (&other.constant, other.ty.primitive()) {
                (Some(c), Some(Int)) => c.representable_in(small),
                _ => false,
            };
            return Some(primitive(match (l, r) {
                (Byte, Short) | (Short, Byte) => Short,
                (small @ Byte, _) | (small @ Short, _) | (small @ Char, _) if narrow(small, b) => small,
                (_, small @ Byte) | (_, small @ Short) | (_, small @ Char) if narrow(small, a) => small,
                _ => binary_promotion(l, r),
            }));
        }
        if is_reference_assignable(self.table, &a.ty, &b.ty) {
            Some(b.ty.clone())
        } else if is_reference_assignable(self.table, &b.ty, &a.ty) {
            Some(a.ty.clone())
        } else {
            None
        }
    }

    fn check_cast(&mut self, mut ty: Spanned<TypeRef>, mut operand: Box<Spanned<Expr>>) -> Checked {
        let target = self.resolve_type(&mut ty, ReferenceKind::TypeUse);
        let info = self.check_expr(&mut operand);
        match cast_conversion(self.table, &info.ty, &target) {
            Err(()) => {
                self.report(
                    ty.span,
                    SemanticError::InvalidCast {
                        from: info.ty.to_string(),
                        to: target.to_string(),
                    },
                );
                failed()
            }
            Ok(CastCheck::Runtime) => {
                let emitted = self.cast_emitter.runtime_checked_cast(*operand, &target);
                (emitted.data.kind, ExprInfo::of(target))
            }
            Ok(_) => {
                let constant = match (&info.constant, &target) {
                    (Some(value), Type::Primitive(kind)) => value.cast(*kind),
                    (Some(value @ Constant::String(_)), to) if self.table.is_string(to) => Some(value.clone()),
                    _ => None,
                };
                (ExprKind::Cast(ty, operand), ExprInfo { ty: target, constant })
            }
        }
    }

    /// Checks a variable initializer, which may be an array initializer.
    pub(crate) fn check_initializer(&mut self, expr: &mut Spanned<Expr>, expected: &Type) -> ExprInfo {
        let is_array_initializer = match expr.kind {
            ExprKind::ArrayInitializer(_) => true,
            _ => false,
        };
        if !is_array_initializer {
            return self.assign_to(expr, expected);
        }
        let element = match expected {
            Type::Array(element) => (**element).clone(),
            Type::Error => Type::Error,
            other => {
                self.report(
                    expr.span,
                    SemanticError::ArrayInitializerForNonArray { ty: other.to_string() },
                );
                Type::Error
            }
        };
        if let ExprKind::ArrayInitializer(elements) = &mut expr.data.kind {
            for element_expr in elements {
                self.check_initializer(element_expr, &element);
            }
        }
        expr.data.ty = Some(expected.clone());
        ExprInfo::of(expected.clone())
    }

    pub(crate) fn assign_to(&mut self, expr: &mut Spanned<Expr>, target: &Type) -> ExprInfo {
        let info = self.check_expr(expr);
        self.convert_to(expr, info, target)
    }

    /// Applies assignment conversion to a checked expression.
    pub(crate) fn convert_to(&mut self, expr: &mut Spanned<Expr>, info: ExprInfo, target: &Type) -> ExprInfo {
        if info.ty == Type::Void {
            self.report(expr.span, SemanticError::VoidValue);
            return ExprInfo::error();
        }
        match assignment_conversion(self.table, &info.ty, info.constant.as_ref(), target) {
            Ok(conversion) => {
                if conversion == Conversion::NarrowingConstant {
                    if let Some(value) = &info.constant {
                        self.context.report_lint(
                            lints::CONSTANT_NARROWING,
                            expr.span,
                            SemanticError::ConstantNarrowing {
                                value: value.to_string(),
                                to: target.to_string(),
                            },
                        );
                    }
                }
                let old = take_expr(expr);
                *expr = convert(old, target, conversion);
                ExprInfo {
                    ty: target.clone(),
                    constant: info.constant.and_then(|value| fit_constant(value, target)),
                }
            }
            Err(ConversionError::Lossy) => {
                self.report(
                    expr.span,
                    SemanticError::LossyConversion {
                        from: info.ty.to_string(),
                        to: target.to_string(),
                    },
                );
                ExprInfo::error()
            }
            Err(ConversionError::Incompatible) => {
                self.report(
                    expr.span,
                    SemanticError::IncompatibleTypes {
                        from: info.ty.to_string(),
                        to: target.to_string(),
                    },
                );
                ExprInfo::error()
            }
        }
    }
}
