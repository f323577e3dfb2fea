//! Phase 1: every class of the unit, nested, local and anonymous ones
//! included, is entered into the class table with its member signatures.
//! Type names in signatures become ledger placeholders.
use crate::{
    access::top_level,
    checker::SemanticContext,
    deferred::{Ledger, PatchSlot},
    semantics::SemanticError,
    type_system::{ClassDef, ClassTable, FieldDef, MethodDef, MethodKind, NestingKind, ParamDef},
};
use asciifile::{Span, Spanned};
use log::debug;
use std::collections::HashMap;
use strtab::Symbol;
use symtab::Scoped;
use syntax::{
    visitor::NodeKindMut, BasicType, ClassDeclaration, ClassId, ClassKind, ClassMemberKind,
    CompilationUnit, ExprKind, FieldRef, MethodDecl, MethodRef, Modifier, Modifiers, StmtKind, Type,
    TypeRef,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VoidIs {
    Allowed,
    Forbidden,
}

/// Where a class declaration appears.
enum Placement<'a> {
    TopLevel,
    Member(ClassId),
    Local {
        enclosing: ClassId,
        static_context: bool,
        visible: Vec<(Symbol, ClassId)>,
    },
    Anonymous {
        enclosing: ClassId,
        static_context: bool,
        visible: Vec<(Symbol, ClassId)>,
        base: &'a Spanned<TypeRef>,
    },
}

/// Local classes in scope while walking a body.
struct BodyScope {
    class: ClassId,
    static_context: bool,
    local_classes: Scoped<Symbol, ClassId>,
}

impl BodyScope {
    fn new(class: ClassId, static_context: bool) -> Self {
        BodyScope {
            class,
            static_context,
            local_classes: Scoped::new(),
        }
    }

    fn visible(&self) -> Vec<(Symbol, ClassId)> {
        self.local_classes
            .visible_symbols()
            .filter_map(|name| {
                self.local_classes
                    .visible_definition(name)
                    .map(|id| (name.clone(), *id))
            })
            .collect()
    }
}

pub struct Registrar<'a, 'ctx, 'm> {
    table: &'a ClassTable,
    ledger: &'a mut Ledger,
    context: &'a SemanticContext<'ctx, 'm>,
    /// numbers of anonymous and local classes per top-level class
    counters: HashMap<(ClassId, Symbol), usize>,
}

impl<'a, 'ctx, 'm> Registrar<'a, 'ctx, 'm> {
    pub fn new(
        table: &'a ClassTable,
        ledger: &'a mut Ledger,
        context: &'a SemanticContext<'ctx, 'm>,
    ) -> Self {
        Registrar {
            table,
            ledger,
            context,
            counters: HashMap::new(),
        }
    }

    /// Registers all classes of `unit`, returning the top-level ones. An
    /// `Err` is a malformed tree and ends the analysis of the unit.
    pub fn register_unit(
        &mut self,
        unit: &mut CompilationUnit,
    ) -> Result<Vec<ClassId>, SemanticError> {
        let package = self.ledger.scope().package.clone();
        if !package.is_empty() {
            self.table.add_package(&package);
        }

        let mut top_level = vec![];
        for decl in &mut unit.classes {
            let span = decl.span;
            let name = decl.data.name.data.clone();
            let already_declared = self
                .ledger
                .scope()
                .unit_classes
                .iter()
                .any(|(other, _)| *other == name);
            let id = self.register_class(&mut decl.data, span, Placement::TopLevel)?;
            if !already_declared {
                self.ledger.scope_mut().unit_classes.push((name, id));
            }
            top_level.push(id);
        }
        Ok(top_level)
    }

    fn next_number(&mut self, top: ClassId, name: &Symbol) -> usize {
        let counter = self.counters.entry((top, name.clone())).or_insert(0);
        *counter += 1;
        *counter
    }

    fn register_class(
        &mut self,
        decl: &mut ClassDeclaration,
        span: Span,
        placement: Placement<'_>,
    ) -> Result<ClassId, SemanticError> {
        let name = decl.name.data.clone();
        let is_anonymous = match placement {
            Placement::Anonymous { .. } => true,
            _ => false,
        };
        if name.as_str().is_empty() && !is_anonymous {
            return Err(SemanticError::MalformedDeclaration {
                reason: "class declaration without a name".to_string(),
            });
        }

        let package = self.ledger.scope().package.clone();
        let mut modifiers = decl.modifiers;
        if decl.kind == ClassKind::Interface {
            modifiers = modifiers.with(Modifier::Abstract);
        }

        let (nesting, enclosing, static_context, local_types) = match &placement {
            Placement::TopLevel => (NestingKind::TopLevel, None, false, vec![]),
            Placement::Member(outer) => {
                if decl.kind == ClassKind::Interface {
                    modifiers = modifiers.with(Modifier::Static);
                }
                if self.table.class(*outer).is_interface() {
                    modifiers = modifiers.with(Modifier::Public).with(Modifier::Static);
                }
                (NestingKind::Member, Some(*outer), false, vec![])
            }
            Placement::Local {
                enclosing,
                static_context,
                visible,
            } => (NestingKind::Local, Some(*enclosing), *static_context, visible.clone()),
            Placement::Anonymous {
                enclosing,
                static_context,
                visible,
                ..
            } => (
                NestingKind::Anonymous,
                Some(*enclosing),
                *static_context,
                visible.clone(),
            ),
        };

        let (qualified_name, binary_name, depth) = match enclosing {
            None => {
                let qualified = self.ledger.scope().qualify(name.as_str());
                (qualified.clone(), qualified, 0)
            }
            Some(outer) => {
                let outer_def = self.table.class(outer);
                match nesting {
                    NestingKind::Member => (
                        format!("{}.{}", outer_def.qualified_name, name),
                        format!("{}${}", outer_def.binary_name, name),
                        outer_def.depth + 1,
                    ),
                    _ => {
                        let top = top_level(self.table, outer);
                        let number = self.next_number(top, &name);
                        let binary = format!("{}${}{}", self.table.class(top).binary_name, number, name);
                        (binary.clone(), binary, outer_def.depth + 1)
                    }
                }
            }
        };

        let mut def = ClassDef::new(
            name.clone(),
            Symbol::from(qualified_name.as_str()),
            &package,
            decl.kind,
        );
        def.binary_name = binary_name;
        def.nesting = nesting;
        def.modifiers = modifiers;
        def.enclosing = enclosing;
        def.depth = depth;
        def.static_context = static_context;
        def.local_types = local_types;
        def.span = span;
        let id = self.table.add_class(def);
        decl.id = Some(id);
        decl.modifiers = modifiers;
        debug!("registered {:?} class {} as {:?}", nesting, qualified_name, id);

        match nesting {
            NestingKind::TopLevel | NestingKind::Member => {
                if self.table.bind_name(&qualified_name, id).is_err() {
                    self.context.report_error(
                        decl.name.span,
                        SemanticError::RedefinitionError {
                            kind: "class".to_string(),
                            name: qualified_name.clone(),
                        },
                    );
                }
            }
            NestingKind::Local | NestingKind::Anonymous => {}
        }

        let (superclass, interfaces) = self.register_supertypes(decl, id, &qualified_name, &placement);
        let member_types = self.register_member_classes(decl, id)?;
        let (fields, methods) = self.register_members(decl, id)?;

        self.table.update_class(id, |def| {
            def.superclass = superclass;
            def.interfaces = interfaces;
            def.member_types = member_types;
            def.fields = fields;
            def.methods = methods;
        });

        self.register_bodies(decl, id)?;
        Ok(id)
    }

    fn register_supertypes(
        &mut self,
        decl: &ClassDeclaration,
        id: ClassId,
        qualified_name: &str,
        placement: &Placement<'_>,
    ) -> (Option<Type>, Vec<Type>) {
        let interfaces = decl
            .interfaces
            .iter()
            .enumerate()
            .map(|(idx, ty)| self.declared_type(ty, id, PatchSlot::Interface(id, idx), VoidIs::Forbidden))
            .collect();

        let superclass = match (placement, &decl.superclass) {
            (Placement::Anonymous { base, .. }, _) => {
                Some(self.declared_type(base, id, PatchSlot::AnonymousBase(id), VoidIs::Forbidden))
            }
            (_, Some(superclass)) => {
                Some(self.declared_type(superclass, id, PatchSlot::Superclass(id), VoidIs::Forbidden))
            }
            (_, None) if decl.kind == ClassKind::Class && qualified_name != "java.lang.Object" => {
                Some(self.table.object())
            }
            (_, None) => None,
        };
        (superclass, interfaces)
    }

    /// The type of a declaration. Names are handed to the ledger and come
    /// back as placeholders that `slot` receives once resolved.
    pub fn declared_type(
        &mut self,
        ty: &Spanned<TypeRef>,
        lexical: ClassId,
        slot: PatchSlot,
        void: VoidIs,
    ) -> Type {
        match &ty.basic.data {
            BasicType::Primitive(kind) => Type::array_of(Type::Primitive(*kind), ty.array_depth),
            BasicType::Void if void == VoidIs::Allowed && ty.array_depth == 0 => Type::Void,
            BasicType::Void => {
                self.context.report_error(ty.span, SemanticError::VoidNotAllowed);
                Type::Error
            }
            BasicType::Named(name) => {
                self.ledger
                    .register(name, ty.array_depth, ty.span, Some(lexical), slot)
            }
            BasicType::Resolved => ty.resolved.clone().unwrap_or(Type::Error),
        }
    }

    fn register_member_classes(
        &mut self,
        decl: &mut ClassDeclaration,
        id: ClassId,
    ) -> Result<Vec<(Symbol, ClassId)>, SemanticError> {
        let mut member_types = vec![];
        for member in &mut decl.members {
            let span = member.span;
            if let ClassMemberKind::Class(class) = &mut member.data.kind {
                let name = class.name.data.clone();
                let member_id = self.register_class(class, span, Placement::Member(id))?;
                member_types.push((name, member_id));
            }
        }
        Ok(member_types)
    }

    fn register_members(
        &mut self,
        decl: &mut ClassDeclaration,
        id: ClassId,
    ) -> Result<(Vec<FieldDef>, Vec<MethodDef>), SemanticError> {
        let is_interface = decl.kind == ClassKind::Interface;
        let class_name = decl.name.data.clone();
        let mut fields: Vec<FieldDef> = vec![];
        let mut methods: Vec<MethodDef> = vec![];

        for member in &mut decl.members {
            let span = member.span;
            let name = member.data.name.clone();
            let mut modifiers = member.data.modifiers;

            match &mut member.data.kind {
                ClassMemberKind::Field(field) => {
                    if is_interface {
                        modifiers = modifiers
                            .with(Modifier::Public)
                            .with(Modifier::Static)
                            .with(Modifier::Final);
                    }
                    if fields.iter().any(|f| f.name == name) {
                        self.context.report_error(
                            span,
                            SemanticError::RedefinitionError {
                                kind: "field".to_string(),
                                name: name.to_string(),
                            },
                        );
                        continue;
                    }
                    let field_ref = FieldRef {
                        class: id,
                        index: fields.len(),
                    };
                    let ty = self.declared_type(&field.ty, id, PatchSlot::FieldType(field_ref), VoidIs::Forbidden);
                    fields.push(FieldDef {
                        name,
                        ty,
                        modifiers,
                        constant: None,
                        has_initializer: field.initializer.is_some(),
                        span,
                    });
                    field.field = Some(field_ref);
                }
                ClassMemberKind::Method(method) => {
                    if is_interface {
                        modifiers = modifiers.with(Modifier::Public).with(Modifier::Abstract);
                        if method.body.is_some() {
                            self.context.report_error(
                                span,
                                SemanticError::AbstractMethodWithBody {
                                    name: name.to_string(),
                                },
                            );
                        }
                    } else if modifiers.is_abstract() && method.body.is_some() {
                        self.context.report_error(
                            span,
                            SemanticError::AbstractMethodWithBody {
                                name: name.to_string(),
                            },
                        );
                    } else if !modifiers.is_abstract()
                        && !modifiers.has(Modifier::Native)
                        && method.body.is_none()
                    {
                        self.context.report_error(
                            span,
                            SemanticError::MissingMethodBody {
                                name: name.to_string(),
                            },
                        );
                    }
                    let method_ref = MethodRef {
                        class: id,
                        index: methods.len(),
                    };
                    let def = self.method_signature(method, id, method_ref, name, modifiers, MethodKind::Method, span);
                    methods.push(def);
                    method.method = Some(method_ref);
                }
                ClassMemberKind::Constructor(ctor) => {
                    if is_interface {
                        return Err(SemanticError::MalformedDeclaration {
                            reason: format!("interface '{}' declares a constructor", class_name),
                        });
                    }
                    if name != class_name {
                        return Err(SemanticError::MalformedDeclaration {
                            reason: format!(
                                "constructor '{}' is not named like its class '{}'",
                                name, class_name
                            ),
                        });
                    }
                    let method_ref = MethodRef {
                        class: id,
                        index: methods.len(),
                    };
                    let def = self.method_signature(
                        ctor,
                        id,
                        method_ref,
                        Symbol::from("<init>"),
                        modifiers,
                        MethodKind::Constructor,
                        span,
                    );
                    methods.push(def);
                    ctor.method = Some(method_ref);
                }
                ClassMemberKind::Initializer(_) => {
                    if is_interface {
                        return Err(SemanticError::MalformedDeclaration {
                            reason: format!("interface '{}' declares an initializer", class_name),
                        });
                    }
                }
                ClassMemberKind::Class(_) => {}
            }
            member.data.modifiers = modifiers;
        }
        Ok((fields, methods))
    }

    #[allow(clippy::too_many_arguments)]
    fn method_signature(
        &mut self,
        method: &MethodDecl,
        class: ClassId,
        method_ref: MethodRef,
        name: Symbol,
        modifiers: Modifiers,
        kind: MethodKind,
        span: Span,
    ) -> MethodDef {
        let mut params: Vec<ParamDef> = vec![];
        for (idx, param) in method.params.iter().enumerate() {
            let param_name = param.name.data.clone();
            if params.iter().any(|p| p.name == param_name) {
                self.context.report_error(
                    param.name.span,
                    SemanticError::RedefinitionError {
                        kind: "parameter".to_string(),
                        name: param_name.to_string(),
                    },
                );
            }
            let ty = self.declared_type(&param.ty, class, PatchSlot::ParamType(method_ref, idx), VoidIs::Forbidden);
            params.push(ParamDef {
                name: param_name,
                ty,
            });
        }
        let return_ty = match kind {
            MethodKind::Constructor => Type::Void,
            MethodKind::Method => {
                self.declared_type(&method.return_ty, class, PatchSlot::ReturnType(method_ref), VoidIs::Allowed)
            }
        };
        let throws = method
            .throws
            .iter()
            .enumerate()
            .map(|(idx, ty)| self.declared_type(ty, class, PatchSlot::Throws(method_ref, idx), VoidIs::Forbidden))
            .collect();
        MethodDef {
            name,
            kind,
            params,
            return_ty,
            throws,
            modifiers,
            span,
        }
    }

    /// Finds local and anonymous classes in field initializers, methods and
    /// initializer blocks.
    fn register_bodies(&mut self, decl: &mut ClassDeclaration, id: ClassId) -> Result<(), SemanticError> {
        for member in &mut decl.members {
            let is_static = member.data.modifiers.is_static();
            let mut scope = BodyScope::new(id, is_static);
            match &mut member.data.kind {
                ClassMemberKind::Field(field) => {
                    if let Some(init) = &mut field.initializer {
                        self.register_nested(NodeKindMut::Expr(init), &mut scope)?;
                    }
                }
                ClassMemberKind::Method(method) | ClassMemberKind::Constructor(method) => {
                    if let Some(body) = &mut method.body {
                        self.register_nested(NodeKindMut::Block(body), &mut scope)?;
                    }
                }
                ClassMemberKind::Initializer(block) => {
                    self.register_nested(NodeKindMut::Block(block), &mut scope)?;
                }
                ClassMemberKind::Class(_) => {}
            }
        }
        Ok(())
    }

    fn register_nested(&mut self, node: NodeKindMut<'_>, scope: &mut BodyScope) -> Result<(), SemanticError> {
        match node {
            NodeKindMut::Block(block) => {
                scope.local_classes.enter_scope();
                let res = walk(NodeKindMut::Block(block), self, scope);
                leave(scope);
                res
            }
            NodeKindMut::Stmt(stmt) => {
                let span = stmt.span;
                if let StmtKind::LocalClass(class) = &mut stmt.data.kind {
                    let name = class.name.data.clone();
                    let placement = Placement::Local {
                        enclosing: scope.class,
                        static_context: scope.static_context,
                        visible: scope.visible(),
                    };
                    let id = self.register_class(class, span, placement)?;
                    if scope.local_classes.define(name.clone(), id).is_err() {
                        self.context.report_error(
                            class.name.span,
                            SemanticError::RedefinitionError {
                                kind: "class".to_string(),
                                name: name.to_string(),
                            },
                        );
                    }
                    return Ok(());
                }
                let is_block = match stmt.data.kind {
                    StmtKind::Block(_) => true,
                    _ => false,
                };
                if is_block {
                    scope.local_classes.enter_scope();
                    let res = walk(NodeKindMut::Stmt(stmt), self, scope);
                    leave(scope);
                    res
                } else {
                    walk(NodeKindMut::Stmt(stmt), self, scope)
                }
            }
            NodeKindMut::Expr(expr) => {
                let span = expr.span;
                if let ExprKind::NewObject(new) = &mut expr.data.kind {
                    if let Some(outer) = &mut new.outer {
                        self.register_nested(NodeKindMut::Expr(outer), scope)?;
                    }
                    for arg in &mut new.args {
                        self.register_nested(NodeKindMut::Expr(arg), scope)?;
                    }
                    if let Some(body) = &mut new.body {
                        let placement = Placement::Anonymous {
                            enclosing: scope.class,
                            static_context: scope.static_context,
                            visible: scope.visible(),
                            base: &new.class,
                        };
                        self.register_class(body, span, placement)?;
                    }
                    return Ok(());
                }
                walk(NodeKindMut::Expr(expr), self, scope)
            }
            other => walk(other, self, scope),
        }
    }
}

fn walk(
    node: NodeKindMut<'_>,
    registrar: &mut Registrar<'_, '_, '_>,
    scope: &mut BodyScope,
) -> Result<(), SemanticError> {
    node.for_each_child(&mut |child| registrar.register_nested(child, scope))
        .unwrap_or(Ok(()))
}

fn leave(scope: &mut BodyScope) {
    if scope.local_classes.leave_scope().is_err() {
        debug!("unbalanced local class scopes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{checker::SemanticContext, class_loader::StubLoader, deferred::ImportScope};
    use compiler_shared::context::Context;
    use syntax::build::*;
    use utils::assert_matches;

    fn register(unit: &mut CompilationUnit) -> (ClassTable, Ledger, Context<'static>, Result<Vec<ClassId>, SemanticError>) {
        let table = ClassTable::new(Box::new(StubLoader::builtin()));
        let mut ledger = Ledger::new(ImportScope::of(unit, &["java.lang".to_string()]));
        let context = Context::dummy();
        let result = {
            let semantic = SemanticContext::new(&context);
            Registrar::new(&table, &mut ledger, &semantic).register_unit(unit)
        };
        (table, ledger, context, result)
    }

    #[test]
    fn nested_classes_get_binary_names() {
        let mut unit = unit(
            Some("p"),
            vec![class(
                "Outer",
                vec![
                    member_class(class("Inner", vec![])),
                    method(
                        mods(&[]),
                        ty("void"),
                        "run",
                        vec![],
                        Some(block(vec![
                            local_class(class("Helper", vec![])),
                            expr_stmt(new_anonymous("Runnable", vec![], vec![])),
                        ])),
                    ),
                ],
            )],
        );
        let (table, _, _, result) = register(&mut unit);
        assert_eq!(1, result.expect("well formed").len());
        let names: Vec<String> = table.ids().into_iter().map(|id| table.class(id).binary_name.clone()).collect();
        assert!(names.contains(&"p.Outer$Inner".to_string()));
        assert!(names.contains(&"p.Outer$1Helper".to_string()));
        assert!(names.contains(&"p.Outer$1".to_string()));
        assert!(table.lookup("p.Outer.Inner").is_some());
    }

    #[test]
    fn signatures_wait_in_the_ledger() {
        let mut unit = unit(
            None,
            vec![class(
                "A",
                vec![
                    field_decl(mods(&[]), ty("B"), "b", None),
                    method(mods(&[]), ty("B[]"), "get", vec![param(ty("int"), "i")], Some(block(vec![]))),
                ],
            )],
        );
        let (table, ledger, _, result) = register(&mut unit);
        let a = result.expect("well formed")[0];
        assert_eq!(2, ledger.pending());
        assert_matches!(&table.class(a).fields[0].ty, Type::Deferred(_));
        assert_matches!(&table.class(a).methods[0].params[0].ty, Type::Primitive(_));
    }

    #[test]
    fn duplicates_are_reported() {
        let mut unit = unit(
            None,
            vec![class(
                "A",
                vec![
                    field_decl(mods(&[]), ty("int"), "x", None),
                    field_decl(mods(&[]), ty("int"), "x", None),
                    method(
                        mods(&[]),
                        ty("void"),
                        "m",
                        vec![param(ty("int"), "a"), param(ty("int"), "a")],
                        Some(block(vec![])),
                    ),
                ],
            )],
        );
        let (_, _, context, result) = register(&mut unit);
        assert!(result.is_ok());
        let messages = context.diagnostics.messages();
        assert_eq!(2, messages.len());
        assert!(messages
            .iter()
            .all(|m| m.downcast_ref::<SemanticError>().map_or(false, |e| match e {
                SemanticError::RedefinitionError { .. } => true,
                _ => false,
            })));
    }

    #[test]
    fn misnamed_constructors_are_fatal() {
        let mut unit = unit(None, vec![class("A", vec![ctor(mods(&[]), "B", vec![], block(vec![]))])]);
        let (_, _, _, result) = register(&mut unit);
        assert_matches!(result, Err(SemanticError::MalformedDeclaration { .. }));
    }

    #[test]
    fn interface_members_are_implicitly_public() {
        let mut unit = unit(
            None,
            vec![interface(
                "I",
                vec![
                    field_decl(mods(&[]), ty("int"), "X", Some(int(1))),
                    method(mods(&[]), ty("void"), "run", vec![], None),
                ],
            )],
        );
        let (table, _, context, result) = register(&mut unit);
        let i = table.class(result.expect("well formed")[0]);
        assert!(i.fields[0].modifiers.is_static() && i.fields[0].modifiers.is_final());
        assert!(i.methods[0].modifiers.is_abstract() && i.methods[0].modifiers.is_public());
        assert!(!context.diagnostics.errored());
    }
}
