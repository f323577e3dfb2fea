//! Classification of identifier chains and access to enclosing instances.
//!
//! A chain `a.b.c` is classified segment by segment. The first segment is a
//! local variable, a field of an enclosing class, a type or a package, in
//! that order. Every further segment is looked up in what its prefix
//! denotes.
use crate::{
    conversion::is_subclass_of,
    deferred::{find_member_type, lookup_simple, LookupError},
    expr_typechecker::{typed, ExprInfo},
    members::{find_enclosing_field_owner, find_field, search_order, Site},
    method_body_type_checker::BodyChecker,
    semantics::{hint, SemanticError},
    type_system::{Capture, FieldDef, NestingKind},
};
use asciifile::{Span, Spanned};
use log::{trace, warn};
use strtab::{most_related, Symbol};
use strum_macros::EnumDiscriminants;
use syntax::{
    visitor::NodeKind, BasicType, ClassDeclaration, ClassId, Expr, ExprKind, FieldRef, Modifier,
    Modifiers, QualifiedName, Type,
};

/// What an identifier chain denotes.
#[derive(EnumDiscriminants, Debug)]
#[strum_discriminants(derive(Display))]
pub(crate) enum Classified {
    Value(Spanned<Expr>, ExprInfo),
    Type(ClassId),
    Package(String),
    /// an error has been reported
    Failed,
}

/// Why no instance of an enclosing class is available.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum NoInstance {
    Static,
    BeforeSuper,
    Missing,
}

impl<'a, 'ctx, 'm> BodyChecker<'a, 'ctx, 'm> {
    pub(crate) fn classify(&mut self, chain: &QualifiedName) -> Classified {
        let first = match chain.segments.first() {
            Some(first) => first,
            None => return Classified::Failed,
        };
        let mut current = self.classify_first(chain, first);
        for segment in &chain.segments[1..] {
            let span = Span::combine(first.span, segment.span);
            current = match current {
                Classified::Failed => return Classified::Failed,
                Classified::Value(value, info) => {
                    let (kind, info) = self.field_of_value(value, info, segment.clone());
                    match kind {
                        ExprKind::Error => return Classified::Failed,
                        kind => Classified::Value(typed(span, kind, info.ty.clone()), info),
                    }
                }
                Classified::Type(class) => self.member_of_type(class, chain, segment, span),
                Classified::Package(package) => {
                    let qualified = format!("{}.{}", package, segment.data);
                    if let Some(class) = self.table.lookup_or_load(&qualified) {
                        self.check_class_use(class, span);
                        Classified::Type(class)
                    } else if self.table.package_exists(&qualified) {
                        Classified::Package(qualified)
                    } else {
                        self.report(
                            segment.span,
                            SemanticError::UnresolvedName {
                                chain: chain.to_string(),
                                segment: segment.data.to_string(),
                                hint: String::new(),
                            },
                        );
                        return Classified::Failed;
                    }
                }
            };
        }
        trace!("{} classified as {}", chain, ClassifiedDiscriminants::from(&current));
        current
    }

    fn classify_first(&mut self, chain: &QualifiedName, first: &Spanned<Symbol>) -> Classified {
        let name = &first.data;
        let span = first.span;

        let local = self
            .find_local(name)
            .filter(|(depth, _)| !self.field_shadows_local(name, *depth));
        if let Some((depth, var)) = local {
            let info = ExprInfo {
                ty: var.ty.clone(),
                constant: var.constant.clone(),
            };
            if depth == 0 {
                return Classified::Value(typed(span, ExprKind::Local(name.clone()), var.ty), info);
            }
            if !var.is_final {
                self.report(span, SemanticError::CaptureOfNonFinal { name: name.to_string() });
                return Classified::Failed;
            }
            return match self.capture_access(name, depth, span) {
                Some(access) => Classified::Value(access, info),
                None => Classified::Failed,
            };
        }

        let current = self.current_class();
        if let Some(owner) = find_enclosing_field_owner(self.table, current, name.as_str()) {
            return match self.simple_field(owner, first) {
                Some((access, info)) => Classified::Value(access, info),
                None => Classified::Failed,
            };
        }

        if let Some(class) = self.local_class(name) {
            return Classified::Type(class);
        }
        match lookup_simple(self.table, self.ledger.scope(), Some(current), name.as_str()) {
            Ok(class) => {
                self.check_class_use(class, span);
                return Classified::Type(class);
            }
            Err(LookupError::Ambiguous(candidates)) => {
                self.report(
                    span,
                    SemanticError::AmbiguousType {
                        name: name.to_string(),
                        candidates: candidates.join(" and "),
                    },
                );
                return Classified::Failed;
            }
            Err(LookupError::NotFound) => {}
        }
        if self.table.package_exists(name.as_str()) {
            return Classified::Package(name.to_string());
        }

        let mut candidates: Vec<Symbol> = vec![];
        for frame in self.frames_outward() {
            candidates.extend(frame.locals.visible_symbols().cloned());
        }
        for class in crate::access::enclosing_chain(self.table, current) {
            candidates.extend(self.visible_field_names(class));
        }
        self.report(
            span,
            SemanticError::UnresolvedName {
                chain: chain.to_string(),
                segment: name.to_string(),
                hint: hint(most_related(name, candidates.iter()).map(Symbol::as_str)),
            },
        );
        Classified::Failed
    }

    /// A field of a class declared inside the body owning the local hides
    /// the local.
    fn field_shadows_local(&self, name: &Symbol, depth: usize) -> bool {
        self.frames_outward().take(depth).any(|frame| {
            search_order(self.table, frame.class)
                .into_iter()
                .any(|class| self.table.class(class).field_index(name.as_str()).is_some())
        })
    }

    fn visible_field_names(&self, class: ClassId) -> Vec<Symbol> {
        search_order(self.table, class)
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
            .collect()
    }

    /// A field named by its simple name, declared in (a supertype of) the
    /// enclosing class `owner`.
    fn simple_field(&mut self, owner: ClassId, name: &Spanned<Symbol>) -> Option<(Spanned<Expr>, ExprInfo)> {
        let span = name.span;
        let field = self.lookup_field(owner, name, Site::unqualified(self.current_class()))?;
        let def = self.table.field(field);
        let target = if def.modifiers.is_static() {
            let ty = self.table.class(field.class).ty();
            typed(span, ExprKind::TypeName(ty.clone()), ty)
        } else {
            match self.outer_instance(owner, span) {
                Ok(target) => target,
                Err(reason) => {
                    self.report_no_instance(reason, owner, span, Some(("variable", name.as_str())));
                    return None;
                }
            }
        };
        self.note_field_use(field, span);
        let constant = if def.modifiers.is_final() {
            def.constant.clone()
        } else {
            None
        };
        let access = typed(
            span,
            ExprKind::FieldAccess(Box::new(target), name.clone(), Some(field)),
            def.ty.clone(),
        );
        Some((access, ExprInfo { ty: def.ty, constant }))
    }

    /// `Type.segment`: a static field or a member type.
    fn member_of_type(&mut self, class: ClassId, chain: &QualifiedName, segment: &Spanned<Symbol>, span: Span) -> Classified {
        let current = self.current_class();
        let found = find_field(self.table, class, segment.as_str(), Site::unqualified(current));
        if let Some(field) = found.applicable.first().cloned() {
            let def = self.table.field(field);
            if !def.modifiers.is_static() {
                self.report(
                    segment.span,
                    SemanticError::StaticContext {
                        kind: "variable".to_string(),
                        name: segment.data.to_string(),
                    },
                );
                return Classified::Failed;
            }
            self.note_field_use(field, segment.span);
            let ty = self.table.class(class).ty();
            let prefix_span = chain.segments.first().map_or(span, |first| first.span);
            let qualifier = typed(prefix_span, ExprKind::TypeName(ty.clone()), ty);
            let constant = if def.modifiers.is_final() {
                def.constant.clone()
            } else {
                None
            };
            let access = typed(
                span,
                ExprKind::FieldAccess(Box::new(qualifier), segment.clone(), Some(field)),
                def.ty.clone(),
            );
            return Classified::Value(access, ExprInfo { ty: def.ty, constant });
        }
        if let Some(member) = find_member_type(self.table, class, segment.as_str()) {
            self.check_class_use(member, span);
            return Classified::Type(member);
        }
        if !found.inaccessible.is_empty() {
            self.report(
                segment.span,
                SemanticError::NotAccessible {
                    kind: "field".to_string(),
                    name: segment.data.to_string(),
                    from: self.class_name(current),
                },
            );
            return Classified::Failed;
        }
        let mut candidates = self.visible_field_names(class);
        candidates.extend(
            self.table
                .class(class)
                .member_types
                .iter()
                .map(|(name, _)| name.clone()),
        );
        self.report(
            segment.span,
            SemanticError::UnresolvedName {
                chain: chain.to_string(),
                segment: segment.data.to_string(),
                hint: hint(most_related(&segment.data, candidates.iter()).map(Symbol::as_str)),
            },
        );
        Classified::Failed
    }

    /// An expression evaluating to the innermost instance of `target` (or a
    /// subclass) reachable from the current class, following the `this$N`
    /// fields outwards.
    pub(crate) fn outer_instance(&self, target: ClassId, span: Span) -> Result<Spanned<Expr>, NoInstance> {
        let current = self.current_class();
        let mut class = current;
        let mut access: Option<Spanned<Expr>> = None;
        loop {
            if is_subclass_of(self.table, class, target) {
                return match access {
                    Some(access) => Ok(access),
                    None if self.is_static_context() => Err(NoInstance::Static),
                    None if self.in_prologue() => Err(NoInstance::BeforeSuper),
                    None => Ok(typed(span, ExprKind::This(None), self.table.class(current).ty())),
                };
            }
            let def = self.table.class(class);
            let (field, enclosing) = match (def.outer_field, def.enclosing) {
                (Some(field), Some(enclosing)) => (field, enclosing),
                _ if access.is_none() && self.is_static_context() => return Err(NoInstance::Static),
                _ => return Err(NoInstance::Missing),
            };
            let field_def = self.table.field(field);
            access = Some(match access {
                None if self.in_prologue() => typed(span, ExprKind::Local(field_def.name.clone()), field_def.ty),
                None if self.is_static_context() => return Err(NoInstance::Static),
                None => {
                    let this = typed(span, ExprKind::This(None), def.ty());
                    field_access(span, this, &field_def, field)
                }
                Some(inner) => field_access(span, inner, &field_def, field),
            });
            class = enclosing;
        }
    }

    /// Reads the captured local `name` declared `depth` frames outwards
    /// through the `val$name` field of the innermost class capturing it.
    fn capture_access(&self, name: &Symbol, depth: usize, span: Span) -> Option<Spanned<Expr>> {
        let classes: Vec<ClassId> = self.frames_outward().take(depth).map(|frame| frame.class).collect();
        for (hop, class) in classes.iter().enumerate() {
            let def = self.table.class(*class);
            let capture = match def.captures.iter().find(|capture| &capture.name == name) {
                Some(capture) => capture,
                None => continue,
            };
            let field_def = self.table.field(capture.field);
            let holder = if hop == 0 {
                if self.in_prologue() {
                    return Some(typed(span, ExprKind::Local(field_def.name.clone()), capture.ty.clone()));
                }
                typed(span, ExprKind::This(None), def.ty())
            } else {
                match self.outer_instance(*class, span) {
                    Ok(holder) => holder,
                    Err(reason) => {
                        self.report_no_instance(reason, *class, span, Some(("variable", name.as_str())));
                        return None;
                    }
                }
            };
            return Some(field_access(span, holder, &field_def, capture.field));
        }
        warn!("local {} is used in a class that does not capture it", name);
        self.report(
            span,
            SemanticError::CaptureOfNonFinal {
                name: name.to_string(),
            },
        );
        None
    }

    /// Value of a local variable as seen from the current class.
    fn local_value(&self, name: &Symbol, span: Span) -> Option<Spanned<Expr>> {
        let (depth, var) = self.find_local(name)?;
        if depth == 0 {
            Some(typed(span, ExprKind::Local(name.clone()), var.ty))
        } else {
            self.capture_access(name, depth, span)
        }
    }

    /// Values passed for the captured locals of `class` when it is created
    /// or its constructor is called from the current class.
    pub(crate) fn captured_values(&self, class: ClassId, span: Span) -> Vec<Spanned<Expr>> {
        let captures = self.table.class(class).captures.clone();
        captures
            .iter()
            .filter_map(|capture| self.local_value(&capture.name, span))
            .collect()
    }

    /// Determines the final locals of the enclosing bodies that the local or
    /// anonymous class `decl` uses and adds a `val$name` field for each.
    pub(crate) fn compute_captures(&mut self, decl: &ClassDeclaration, class: ClassId) {
        let mut names = vec![];
        let mut created = vec![];
        collect_names(NodeKind::ClassDeclaration(decl), &mut names, &mut created);

        fn add(name: Symbol, ty: Type, captured: &mut Vec<(Symbol, Type)>) {
            if !captured.iter().any(|(other, _)| *other == name) {
                captured.push((name, ty));
            }
        }

        let mut captured: Vec<(Symbol, Type)> = vec![];
        for name in names {
            if let Some((_, var)) = self.find_local(&name) {
                if var.is_final {
                    add(name, var.ty, &mut captured);
                }
            }
        }
        let mut inherited: Vec<Capture> = vec![];
        for name in created {
            if let Some(local) = self.local_class(&name) {
                if local != class {
                    inherited.extend(self.table.class(local).captures.iter().cloned());
                }
            }
        }
        if let Some(superclass) = self.table.class(class).superclass.as_ref().and_then(Type::class_id) {
            let super_def = self.table.class(superclass);
            if super_def.nesting == NestingKind::Local {
                inherited.extend(super_def.captures.iter().cloned());
            }
        }
        for capture in inherited {
            add(capture.name, capture.ty, &mut captured);
        }

        let modifiers = Modifiers::new(&[Modifier::Private, Modifier::Final, Modifier::Synthetic]);
        for (name, ty) in captured {
            trace!("{} captures {}", self.class_name(class), name);
            let field = self.table.add_field(
                class,
                FieldDef {
                    name: Symbol::from(format!("val${}", name)),
                    ty: ty.clone(),
                    modifiers,
                    constant: None,
                    has_initializer: false,
                    span: decl.name.span,
                },
            );
            self.table
                .update_class(class, |def| def.captures.push(Capture { name, ty, field }));
        }
    }
}

pub(crate) fn field_access(span: Span, target: Spanned<Expr>, def: &FieldDef, field: FieldRef) -> Spanned<Expr> {
    typed(
        span,
        ExprKind::FieldAccess(Box::new(target), Spanned::new(span, def.name.clone()), Some(field)),
        def.ty.clone(),
    )
}

/// First segments of all name chains and the simple class names created
/// with `new` below `node`.
fn collect_names(node: NodeKind<'_>, names: &mut Vec<Symbol>, created: &mut Vec<Symbol>) {
    if let NodeKind::Expr(expr) = node {
        match &expr.kind {
            ExprKind::Name(chain) => {
                if let Some(first) = chain.segments.first() {
                    names.push(first.data.clone());
                }
            }
            ExprKind::NewObject(new) => {
                if let BasicType::Named(name) = &new.class.basic.data {
                    if name.is_simple() {
                        created.push(name.segments[0].data.clone());
                    }
                }
            }
            _ => {}
        }
    }
    node.for_each_child(&mut |child| collect_names(child, names, created));
}

#[cfg(test)]
mod tests {
    use super::*;
    use syntax::{build::*, visitor::NodeKind};

    #[test]
    fn collects_first_segments_and_created_classes() {
        let synthesized = Spanned::new(Span::default(), Expr::from(ExprKind::Local(Symbol::from("outer$"))));
        let decl = class(
            "",
            vec![method(
                mods(&[]),
                ty("void"),
                "run",
                vec![],
                Some(block(vec![
                    expr_stmt(call_on(name("out.err"), "println", vec![name("count")])),
                    expr_stmt(new_object("Helper", vec![synthesized, name("total$")])),
                ])),
            )],
        );
        let mut names = vec![];
        let mut created = vec![];
        collect_names(NodeKind::ClassDeclaration(&decl), &mut names, &mut created);
        let names: Vec<&str> = names.iter().map(Symbol::as_str).collect();
        assert_eq!(vec!["out", "count", "total$"], names);
        assert_eq!(vec![Symbol::from("Helper")], created);
    }
}
