//! Phase 2: once the ledger has resolved every signature, classes are laid
//! out superclass first. Laying out checks the hierarchy, adds the
//! enclosing-instance field of inner classes, synthesizes default
//! constructors and evaluates constant fields.
use crate::{
    access::{is_class_accessible, top_level},
    checker::SemanticContext,
    conversion::{widening_primitive, Constant},
    deferred::{lookup_type, Ledger},
    lints,
    members::{find_enclosing_field_owner, find_field, search_order, Site},
    semantics::SemanticError,
    type_system::{ClassTable, FieldDef, MethodDef, MethodKind, NestingKind},
};
use asciifile::Spanned;
use log::debug;
use strtab::Symbol;
use syntax::{
    build::{block, ctor},
    visitor::{NodeKind, NodeKindMut},
    BasicType, ClassId, ClassKind, ClassMemberKind, CompilationUnit, Expr, ExprKind, FieldRef,
    Modifier, Modifiers, Type,
};

pub struct Layout<'a, 'ctx, 'm> {
    table: &'a mut ClassTable,
    context: &'a SemanticContext<'ctx, 'm>,
    /// classes whose layout is in progress, to detect cycles
    visiting: Vec<ClassId>,
}

impl<'a, 'ctx, 'm> Layout<'a, 'ctx, 'm> {
    pub fn new(table: &'a mut ClassTable, context: &'a SemanticContext<'ctx, 'm>) -> Self {
        Layout {
            table,
            context,
            visiting: vec![],
        }
    }

    pub fn lay_out_unit(&mut self, ledger: &Ledger, unit: &mut CompilationUnit, classes: &[ClassId]) {
        for &class in classes {
            self.lay_out(class);
        }
        self.synthesize_default_constructors(unit);
        evaluate_constants(self.table, ledger, unit);
    }

    fn report(&self, class: ClassId, error: SemanticError) {
        self.context.report_error(self.table.class(class).span, error);
    }

    /// Lays out `class` after its supertypes. Cycles are broken at the class
    /// that closes them, which is reported once.
    pub fn lay_out(&mut self, class: ClassId) {
        let def = self.table.class(class);
        if def.laid_out || self.visiting.contains(&class) {
            return;
        }
        self.visiting.push(class);
        debug!("laying out {}", def.qualified_name);

        if let Some(superclass) = def.superclass.as_ref().and_then(Type::class_id) {
            if self.visiting.contains(&superclass) {
                self.report(
                    class,
                    SemanticError::CyclicInheritance {
                        class: def.qualified_name.to_string(),
                    },
                );
                let object = self.table.object();
                self.table.class_mut(class).superclass = Some(object);
            } else {
                self.lay_out(superclass);
            }
        }
        for (idx, interface) in def.interfaces.iter().enumerate() {
            if let Some(interface) = interface.class_id() {
                if self.visiting.contains(&interface) {
                    self.report(
                        class,
                        SemanticError::CyclicInheritance {
                            class: def.qualified_name.to_string(),
                        },
                    );
                    self.table.class_mut(class).interfaces[idx] = Type::Error;
                } else {
                    self.lay_out(interface);
                }
            }
        }

        self.check_supertypes(class);
        self.add_outer_field(class);
        self.check_methods(class);

        self.table.class_mut(class).laid_out = true;
        self.visiting.pop();
    }

    fn check_supertypes(&mut self, class: ClassId) {
        let def = self.table.class(class);
        let name = def.qualified_name.to_string();

        match def.superclass.clone() {
            Some(Type::Class(superclass)) => {
                let super_def = self.table.class(superclass.id);
                if def.kind == ClassKind::Class && super_def.is_interface() {
                    self.report(
                        class,
                        SemanticError::ExtendsInterface {
                            class: name.clone(),
                            name: super_def.qualified_name.to_string(),
                        },
                    );
                    let object = self.table.object();
                    self.table.class_mut(class).superclass = Some(object);
                } else if super_def.modifiers.is_final() {
                    self.report(
                        class,
                        SemanticError::ExtendsFinalClass {
                            superclass: super_def.qualified_name.to_string(),
                        },
                    );
                }
                self.check_supertype_use(class, superclass.id);
            }
            Some(Type::Error) | None => {}
            Some(other) => {
                self.report(class, SemanticError::NotAClassType { ty: other.to_string() });
                let object = self.table.object();
                self.table.class_mut(class).superclass = Some(object);
            }
        }

        for (idx, interface) in def.interfaces.iter().enumerate() {
            match interface {
                Type::Class(interface) => {
                    let interface_def = self.table.class(interface.id);
                    if !interface_def.is_interface() {
                        self.report(
                            class,
                            SemanticError::NotAnInterface {
                                name: interface_def.qualified_name.to_string(),
                            },
                        );
                        self.table.class_mut(class).interfaces[idx] = Type::Error;
                    } else {
                        self.check_supertype_use(class, interface.id);
                    }
                }
                Type::Error => {}
                other => {
                    self.report(class, SemanticError::NotAnInterface { name: other.to_string() });
                    self.table.class_mut(class).interfaces[idx] = Type::Error;
                }
            }
        }
    }

    fn check_supertype_use(&self, class: ClassId, supertype: ClassId) {
        let super_def = self.table.class(supertype);
        if !is_class_accessible(self.table, class, supertype) {
            self.report(
                class,
                SemanticError::NotAccessible {
                    kind: "class".to_string(),
                    name: super_def.qualified_name.to_string(),
                    from: self.table.class(class).qualified_name.to_string(),
                },
            );
        }
        if super_def.is_deprecated() && top_level(self.table, class) != top_level(self.table, supertype) {
            self.context.report_lint(
                lints::DEPRECATED,
                self.table.class(class).span,
                SemanticError::DeprecatedUse {
                    kind: "class".to_string(),
                    name: super_def.qualified_name.to_string(),
                },
            );
        }
    }

    /// Inner classes keep their enclosing instance in `this$N`, N being the
    /// nesting depth of the enclosing class.
    fn add_outer_field(&mut self, class: ClassId) {
        let def = self.table.class(class);
        let enclosing = match def.enclosing {
            Some(enclosing) if def.has_outer_instance() && def.outer_field.is_none() => enclosing,
            _ => return,
        };
        let ty = self.table.class(enclosing).ty();
        let def = self.table.class_mut(class);
        def.fields.push(FieldDef {
            name: Symbol::from(format!("this${}", def.depth - 1)),
            ty,
            modifiers: Modifiers::new(&[Modifier::Final, Modifier::Synthetic]),
            constant: None,
            has_initializer: false,
            span: def.span,
        });
        def.outer_field = Some(FieldRef {
            class,
            index: def.fields.len() - 1,
        });
    }

    fn check_methods(&mut self, class: ClassId) {
        let def = self.table.class(class);

        for (idx, method) in def.methods.iter().enumerate() {
            let duplicate = def.methods[..idx].iter().any(|other| {
                other.kind == method.kind
                    && other.name == method.name
                    && other.param_types() == method.param_types()
            });
            if duplicate {
                self.context.report_error(
                    method.span,
                    SemanticError::RedefinitionError {
                        kind: match method.kind {
                            MethodKind::Method => "method",
                            MethodKind::Constructor => "constructor",
                        }
                        .to_string(),
                        name: method.signature(),
                    },
                );
            }
        }

        if def.is_abstract() {
            return;
        }
        // abstract methods anywhere above must be implemented in the
        // superclass chain
        let chain = superclass_chain(self.table, class);
        let mut reported: Vec<String> = vec![];
        for owner in search_order(self.table, class) {
            for method in &self.table.class(owner).methods {
                if method.kind != MethodKind::Method || !method.modifiers.is_abstract() {
                    continue;
                }
                let implemented = chain.iter().any(|c| {
                    self.table.class(*c).methods.iter().any(|m| {
                        !m.modifiers.is_abstract()
                            && m.name == method.name
                            && m.param_types() == method.param_types()
                    })
                });
                let signature = method.signature();
                if !implemented && !reported.contains(&signature) {
                    self.report(
                        class,
                        SemanticError::AbstractMethodInConcreteClass {
                            class: def.qualified_name.to_string(),
                            method: signature.clone(),
                        },
                    );
                    reported.push(signature);
                }
            }
        }
    }

    /// Every class without a constructor gets a public (or package private,
    /// like its class) constructor without parameters. Anonymous classes get
    /// theirs when their creation site is checked.
    fn synthesize_default_constructors(&mut self, unit: &mut CompilationUnit) {
        let table = &*self.table;
        for decl in &mut unit.classes {
            add_default_constructors(table, NodeKindMut::ClassDeclaration(&mut decl.data));
        }
    }
}

fn add_default_constructors(table: &ClassTable, node: NodeKindMut<'_>) {
    if let NodeKindMut::ClassDeclaration(decl) = node {
        if let Some(id) = decl.id {
            let def = table.class(id);
            let needs_ctor = def.kind == ClassKind::Class
                && def.nesting != NestingKind::Anonymous
                && def.constructors().next().is_none();
            if needs_ctor {
                let mut modifiers = Modifiers::new(&[Modifier::Synthetic]);
                if def.modifiers.is_public() {
                    modifiers = modifiers.with(Modifier::Public);
                }
                let method = table.add_method(
                    id,
                    MethodDef {
                        name: Symbol::from("<init>"),
                        kind: MethodKind::Constructor,
                        params: vec![],
                        return_ty: Type::Void,
                        throws: vec![],
                        modifiers,
                        span: def.span,
                    },
                );
                let mut member = ctor(modifiers, decl.name.data.as_str(), vec![], block(vec![]));
                member.span = def.span;
                if let ClassMemberKind::Constructor(ctor) = &mut member.data.kind {
                    ctor.method = Some(method);
                }
                debug!("synthesized default constructor of {}", def.qualified_name);
                decl.members.push(member);
            }
        }
        NodeKindMut::ClassDeclaration(decl).for_each_child(&mut |child| add_default_constructors(table, child));
    } else {
        node.for_each_child(&mut |child| add_default_constructors(table, child));
    }
}

/// `class`, its superclass, its superclass' superclass and so on.
pub fn superclass_chain(table: &ClassTable, class: ClassId) -> Vec<ClassId> {
    let mut chain = vec![class];
    let mut current = class;
    while let Some(superclass) = table.class(current).superclass.as_ref().and_then(Type::class_id) {
        if chain.contains(&superclass) {
            break;
        }
        chain.push(superclass);
        current = superclass;
    }
    chain
}

/// A constant field initializer waiting for the constants it refers to.
struct PendingConstant<'u> {
    field: FieldRef,
    init: &'u Spanned<Expr>,
}

fn collect_constant_fields<'u>(table: &ClassTable, node: NodeKind<'u>, out: &mut Vec<PendingConstant<'u>>) {
    if let NodeKind::ClassMember(member) = node {
        if let ClassMemberKind::Field(field) = &member.data.kind {
            if let (Some(field_ref), Some(init)) = (field.field, &field.initializer) {
                let def = table.field(field_ref);
                let constant_type = def.ty.is_primitive() || table.is_string(&def.ty);
                if def.modifiers.is_final() && constant_type {
                    out.push(PendingConstant {
                        field: field_ref,
                        init: &**init,
                    });
                }
            }
        }
    }
    node.for_each_child(&mut |child| collect_constant_fields(table, child, out));
}

/// Evaluates initializers of final fields of primitive or `String` type
/// until no more constants can be found, so constants may refer to each
/// other in any order.
pub fn evaluate_constants(table: &mut ClassTable, ledger: &Ledger, unit: &CompilationUnit) {
    let mut pending = vec![];
    for decl in &unit.classes {
        collect_constant_fields(table, NodeKind::ClassDeclaration(&decl.data), &mut pending);
    }

    loop {
        let mut progress = false;
        pending.retain(|p| {
            let value = fold_constant(table, ledger, p.field.class, p.init);
            let field_ty = table.field(p.field).ty;
            match value.and_then(|value| fit_constant(value, &field_ty)) {
                Some(value) => {
                    debug!("constant {:?} = {}", p.field, value);
                    table.class_mut(p.field.class).fields[p.field.index].constant = Some(value);
                    progress = true;
                    false
                }
                None => true,
            }
        });
        if !progress {
            break;
        }
    }
}

/// The value as stored in a variable of type `ty`, if assignable.
pub fn fit_constant(value: Constant, ty: &Type) -> Option<Constant> {
    match (value.kind(), ty) {
        (None, Type::Class(_)) => Some(value),
        (Some(from), Type::Primitive(to)) => {
            if from == *to || widening_primitive(from, *to) || value.representable_in(*to) {
                value.cast(*to)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Folds an initializer that has not been type checked yet.
fn fold_constant(table: &ClassTable, ledger: &Ledger, class: ClassId, expr: &Spanned<Expr>) -> Option<Constant> {
    let fold = |e: &Spanned<Expr>| fold_constant(table, ledger, class, e);
    match &expr.data.kind {
        ExprKind::Literal(literal) => Constant::from_literal(literal),
        ExprKind::Unary(op, operand) => Constant::unary(*op, &fold(operand)?),
        ExprKind::Binary(op, lhs, rhs) => Constant::binary(*op, &fold(lhs)?, &fold(rhs)?),
        ExprKind::Conditional(cond, then_expr, else_expr) => {
            if fold(cond)?.as_bool()? {
                fold(then_expr)
            } else {
                fold(else_expr)
            }
        }
        ExprKind::Cast(ty, operand) => match &ty.basic.data {
            BasicType::Primitive(kind) if ty.array_depth == 0 => fold(operand)?.cast(*kind),
            _ => match fold(operand)? {
                value @ Constant::String(_) => Some(value),
                _ => None,
            },
        },
        ExprKind::Name(chain) => {
            let field = match chain.segments.len() {
                0 => return None,
                1 => {
                    let name = chain.segments[0].as_str();
                    let owner = find_enclosing_field_owner(table, class, name)?;
                    find_field(table, owner, name, Site::unqualified(class))
                        .applicable
                        .first()
                        .cloned()?
                }
                _ => {
                    let owner = lookup_type(table, ledger.scope(), Some(class), &chain.prefix()).ok()?;
                    let name = chain.last()?.as_str();
                    find_field(table, owner, name, Site::unqualified(class))
                        .applicable
                        .first()
                        .cloned()?
                }
            };
            let def = table.field(field);
            if def.modifiers.is_final() {
                def.constant
            } else {
                None
            }
        }
        _ => None,
    }
}
