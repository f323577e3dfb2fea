//! The deferred resolution ledger.
//!
//! Declarations are registered class by class, so a type name may refer to
//! a class that is declared further down in the unit or not loaded yet.
//! Such names are recorded here together with the slot of the class table
//! that waits for them, and resolved in one go once every declaration of the
//! unit is known.
use crate::{
    semantics::{hint, ReferenceKind, SemanticError},
    type_system::ClassTable,
};
use asciifile::{Span, Spanned};
use log::debug;
use std::collections::HashSet;
use strtab::{most_related, Symbol};
use syntax::{ClassId, CompilationUnit, DeferredId, FieldRef, MethodRef, QualifiedName, Type};

/// Names visible in a compilation unit through its package and imports.
#[derive(Debug, Clone, Default)]
pub struct ImportScope {
    pub package: String,
    /// top-level classes of the unit
    pub unit_classes: Vec<(Symbol, ClassId)>,
    /// `import a.b.C;` as (simple name, qualified name)
    pub single: Vec<(Symbol, String)>,
    /// `import a.b.*;` and the implicit imports
    pub on_demand: Vec<String>,
}

impl ImportScope {
    pub fn of(unit: &CompilationUnit, implicit_imports: &[String]) -> Self {
        let mut scope = ImportScope {
            package: unit
                .package
                .as_ref()
                .map(|p| p.data.to_string())
                .unwrap_or_default(),
            ..ImportScope::default()
        };
        for import in &unit.imports {
            let name = import.name.to_string();
            if import.on_demand {
                scope.on_demand.push(name);
            } else if let Some(last) = import.name.last() {
                scope.single.push((last.data.clone(), name));
            }
        }
        for package in implicit_imports {
            if !scope.on_demand.contains(package) {
                scope.on_demand.push(package.clone());
            }
        }
        scope
    }

    pub fn qualify(&self, simple: &str) -> String {
        if self.package.is_empty() {
            simple.to_string()
        } else {
            format!("{}.{}", self.package, simple)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    NotFound,
    Ambiguous(Vec<String>),
}

/// A member type of `class` or of one of its supertypes.
pub fn find_member_type(table: &ClassTable, class: ClassId, name: &str) -> Option<ClassId> {
    let mut seen = HashSet::new();
    let mut todo = vec![class];
    while let Some(id) = todo.pop() {
        if !seen.insert(id) {
            continue;
        }
        let def = table.class(id);
        if let Some(found) = def.member_type(name) {
            return Some(found);
        }
        todo.extend(def.interfaces.iter().rev().filter_map(Type::class_id));
        todo.extend(def.superclass.iter().filter_map(Type::class_id));
    }
    None
}

/// The class a simple type name denotes inside `lexical`: member and local
/// types of the enclosing classes, then the unit, single-type imports, the
/// current package and finally on-demand imports.
pub fn lookup_simple(
    table: &ClassTable,
    scope: &ImportScope,
    lexical: Option<ClassId>,
    name: &str,
) -> Result<ClassId, LookupError> {
    let mut current = lexical;
    while let Some(id) = current {
        let class = table.class(id);
        if class.name == name {
            return Ok(id);
        }
        if let Some(found) = class.local_type(name) {
            return Ok(found);
        }
        if let Some(found) = find_member_type(table, id, name) {
            return Ok(found);
        }
        current = class.enclosing;
    }

    if let Some((_, id)) = scope.unit_classes.iter().find(|(n, _)| n == name) {
        return Ok(*id);
    }
    if let Some((_, qualified)) = scope.single.iter().find(|(n, _)| n == name) {
        return lookup_qualified(table, qualified).ok_or(LookupError::NotFound);
    }
    if let Some(id) = table.lookup_or_load(&scope.qualify(name)) {
        return Ok(id);
    }

    let mut found: Vec<(ClassId, String)> = vec![];
    for package in &scope.on_demand {
        let qualified = format!("{}.{}", package, name);
        if let Some(id) = table.lookup_or_load(&qualified) {
            if found.iter().all(|(other, _)| *other != id) {
                found.push((id, qualified));
            }
        }
    }
    match found.len() {
        0 => Err(LookupError::NotFound),
        1 => Ok(found[0].0),
        _ => Err(LookupError::Ambiguous(
            found.into_iter().map(|(_, name)| name).collect(),
        )),
    }
}

/// A fully qualified name like `p.Outer.Inner`. The longest prefix naming a
/// package is tried first; the remaining segments are member types.
pub fn lookup_qualified(table: &ClassTable, qualified: &str) -> Option<ClassId> {
    if let Some(id) = table.lookup_or_load(qualified) {
        return Some(id);
    }
    let segments: Vec<&str> = qualified.split('.').collect();
    for split in (1..segments.len()).rev() {
        let outer = segments[..split].join(".");
        if let Some(mut id) = table.lookup_or_load(&outer) {
            for segment in &segments[split..] {
                id = find_member_type(table, id, segment)?;
            }
            return Some(id);
        }
    }
    None
}

/// Resolves a possibly qualified type name as written in the source.
pub fn lookup_type(
    table: &ClassTable,
    scope: &ImportScope,
    lexical: Option<ClassId>,
    name: &QualifiedName,
) -> Result<ClassId, LookupError> {
    let first = match name.segments.first() {
        Some(first) => first,
        None => return Err(LookupError::NotFound),
    };
    let rest = &name.segments[1..];
    match lookup_simple(table, scope, lexical, first.as_str()) {
        Ok(mut id) => {
            for segment in rest {
                id = find_member_type(table, id, segment.as_str()).ok_or(LookupError::NotFound)?;
            }
            Ok(id)
        }
        Err(LookupError::NotFound) if !rest.is_empty() => {
            lookup_qualified(table, &name.to_string()).ok_or(LookupError::NotFound)
        }
        Err(err) => Err(err),
    }
}

/// Simple names a misspelled type name might have meant.
pub fn type_name_candidates(
    table: &ClassTable,
    scope: &ImportScope,
    lexical: Option<ClassId>,
) -> Vec<Symbol> {
    let mut candidates: Vec<Symbol> = scope
        .unit_classes
        .iter()
        .map(|(name, _)| name.clone())
        .chain(scope.single.iter().map(|(name, _)| name.clone()))
        .collect();
    let mut current = lexical;
    while let Some(id) = current {
        let class = table.class(id);
        candidates.extend(class.member_types.iter().map(|(name, _)| name.clone()));
        candidates.extend(class.local_types.iter().map(|(name, _)| name.clone()));
        current = class.enclosing;
    }
    candidates
}

/// The table slot waiting for a deferred type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchSlot {
    Superclass(ClassId),
    Interface(ClassId, usize),
    FieldType(FieldRef),
    ParamType(MethodRef, usize),
    ReturnType(MethodRef),
    Throws(MethodRef, usize),
    /// superclass or sole interface of an anonymous class
    AnonymousBase(ClassId),
}

impl PatchSlot {
    pub fn kind(self) -> ReferenceKind {
        match self {
            PatchSlot::Superclass(_) => ReferenceKind::Superclass,
            PatchSlot::Interface(..) => ReferenceKind::Interface,
            PatchSlot::FieldType(_) => ReferenceKind::FieldType,
            PatchSlot::ParamType(..) => ReferenceKind::ParameterType,
            PatchSlot::ReturnType(_) => ReferenceKind::ReturnType,
            PatchSlot::Throws(..) => ReferenceKind::ThrownType,
            PatchSlot::AnonymousBase(_) => ReferenceKind::AnonymousClassBase,
        }
    }

    fn patch(self, table: &mut ClassTable, ty: Type) {
        match self {
            PatchSlot::Superclass(class) => table.class_mut(class).superclass = Some(ty),
            PatchSlot::Interface(class, idx) => table.class_mut(class).interfaces[idx] = ty,
            PatchSlot::FieldType(field) => {
                table.class_mut(field.class).fields[field.index].ty = ty
            }
            PatchSlot::ParamType(method, idx) => {
                table.class_mut(method.class).methods[method.index].params[idx].ty = ty
            }
            PatchSlot::ReturnType(method) => {
                table.class_mut(method.class).methods[method.index].return_ty = ty
            }
            PatchSlot::Throws(method, idx) => {
                table.class_mut(method.class).methods[method.index].throws[idx] = ty
            }
            PatchSlot::AnonymousBase(class) => {
                let is_interface = ty
                    .class_id()
                    .map(|id| table.class(id).is_interface())
                    .unwrap_or(false);
                let object = table.object();
                let def = table.class_mut(class);
                if is_interface {
                    def.superclass = Some(object);
                    def.interfaces = vec![ty];
                } else {
                    def.superclass = Some(ty);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum EntryState {
    Pending,
    Resolved(Type),
    Failed,
}

#[derive(Debug, Clone)]
struct Entry {
    name: QualifiedName,
    dimensions: usize,
    span: Span,
    lexical: Option<ClassId>,
    slot: PatchSlot,
    state: EntryState,
}

#[derive(Debug, Default)]
pub struct Ledger {
    scope: ImportScope,
    entries: Vec<Entry>,
}

impl Ledger {
    pub fn new(scope: ImportScope) -> Self {
        Ledger {
            scope,
            entries: Vec::new(),
        }
    }

    pub fn scope(&self) -> &ImportScope {
        &self.scope
    }

    pub fn scope_mut(&mut self) -> &mut ImportScope {
        &mut self.scope
    }

    /// Records a type name (with `dimensions` array dimensions around it)
    /// seen inside `lexical`. The returned placeholder is overwritten in
    /// `slot` by `resolve_all`.
    pub fn register(
        &mut self,
        name: &QualifiedName,
        dimensions: usize,
        span: Span,
        lexical: Option<ClassId>,
        slot: PatchSlot,
    ) -> Type {
        let id = DeferredId(self.entries.len());
        self.entries.push(Entry {
            name: name.clone(),
            dimensions,
            span,
            lexical,
            slot,
            state: EntryState::Pending,
        });
        Type::Deferred(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pending(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.state == EntryState::Pending)
            .count()
    }

    pub fn resolved(&self, id: DeferredId) -> Option<&Type> {
        match &self.entries.get(id.0)?.state {
            EntryState::Resolved(ty) => Some(ty),
            _ => None,
        }
    }

    /// Resolves every pending entry in registration order and patches its
    /// slot. Failed entries are patched with the error type and reported
    /// once. Entries handled by an earlier call are skipped.
    pub fn resolve_all(&mut self, table: &mut ClassTable) -> Vec<Spanned<SemanticError>> {
        let mut errors = vec![];
        for idx in 0..self.entries.len() {
            if self.entries[idx].state != EntryState::Pending {
                continue;
            }
            let entry = self.entries[idx].clone();
            let (state, ty) = match self.lookup(table, &entry.name, entry.dimensions, entry.lexical, entry.slot.kind()) {
                Ok(ty) => {
                    debug!("resolved {} for {:?} to {}", entry.name, entry.slot, ty);
                    (EntryState::Resolved(ty.clone()), ty)
                }
                Err(err) => {
                    errors.push(Spanned::new(entry.span, err));
                    (EntryState::Failed, Type::Error)
                }
            };
            entry.slot.patch(table, ty);
            self.entries[idx].state = state;
        }
        errors
    }

    /// Resolution of names met while checking bodies: local variable types,
    /// casts, `new` and catch parameters.
    pub fn resolve_now(
        &self,
        table: &ClassTable,
        name: &QualifiedName,
        dimensions: usize,
        lexical: Option<ClassId>,
        kind: ReferenceKind,
    ) -> Result<Type, SemanticError> {
        self.lookup(table, name, dimensions, lexical, kind)
    }

    fn lookup(
        &self,
        table: &ClassTable,
        name: &QualifiedName,
        dimensions: usize,
        lexical: Option<ClassId>,
        kind: ReferenceKind,
    ) -> Result<Type, SemanticError> {
        match lookup_type(table, &self.scope, lexical, name) {
            Ok(id) => Ok(Type::array_of(table.class(id).ty(), dimensions)),
            Err(LookupError::Ambiguous(candidates)) => Err(SemanticError::AmbiguousType {
                name: name.to_string(),
                candidates: candidates.join(" and "),
            }),
            Err(LookupError::NotFound) => {
                let candidates = type_name_candidates(table, &self.scope, lexical);
                let needle = Symbol::from(name.to_string());
                Err(SemanticError::UnresolvedType {
                    kind,
                    name: name.to_string(),
                    hint: hint(most_related(&needle, candidates.iter()).map(Symbol::as_str)),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        class_loader::{ExternalClass, StubLoader},
        type_system::ClassDef,
    };
    use syntax::{build::qname, ClassKind};
    use utils::assert_matches;

    fn table_with(loader: StubLoader) -> ClassTable {
        ClassTable::new(Box::new(loader))
    }

    fn class(table: &ClassTable, scope: &mut ImportScope, name: &str) -> ClassId {
        let qualified = scope.qualify(name);
        let def = ClassDef::new(
            Symbol::from(name),
            Symbol::from(qualified.as_str()),
            &scope.package,
            ClassKind::Class,
        );
        let id = table.add_class(def);
        table.bind_name(&qualified, id).expect("fresh");
        scope.unit_classes.push((Symbol::from(name), id));
        id
    }

    fn scope() -> ImportScope {
        ImportScope {
            package: "p".to_string(),
            on_demand: vec!["java.lang".to_string()],
            ..ImportScope::default()
        }
    }

    #[test]
    fn forward_references_are_patched() {
        let mut table = table_with(StubLoader::builtin());
        let mut scope = scope();
        let a = class(&table, &mut scope, "A");
        let mut ledger = Ledger::new(scope);
        let placeholder = ledger.register(&qname("B"), 0, Span::default(), Some(a), PatchSlot::Superclass(a));
        table.class_mut(a).superclass = Some(placeholder);
        // declared after A was registered
        let b = class(&table, ledger.scope_mut(), "B");

        let errors = ledger.resolve_all(&mut table);
        assert!(errors.is_empty());
        assert_eq!(Some(b), table.class(a).superclass.as_ref().and_then(Type::class_id));
        assert_eq!(0, ledger.pending());
    }

    #[test]
    fn resolving_twice_does_not_repatch() {
        let mut table = table_with(StubLoader::builtin());
        let mut scope = scope();
        let a = class(&table, &mut scope, "A");
        let mut ledger = Ledger::new(scope);
        ledger.register(&qname("String"), 1, Span::default(), Some(a), PatchSlot::Superclass(a));
        assert!(ledger.resolve_all(&mut table).is_empty());
        assert_eq!("java.lang.String[]", ledger.resolved(DeferredId(0)).expect("resolved").to_string());

        table.class_mut(a).superclass = None;
        assert!(ledger.resolve_all(&mut table).is_empty());
        assert!(table.class(a).superclass.is_none());
    }

    #[test]
    fn failures_are_reported_once_with_their_kind() {
        let mut table = table_with(StubLoader::builtin());
        let mut scope = scope();
        let a = class(&table, &mut scope, "A");
        let mut ledger = Ledger::new(scope);
        ledger.register(&qname("Strin"), 0, Span::new(3, 8), Some(a), PatchSlot::Superclass(a));
        let errors = ledger.resolve_all(&mut table);
        assert_eq!(1, errors.len());
        assert_eq!(Span::new(3, 8), errors[0].span);
        assert_matches!(
            &errors[0].data,
            SemanticError::UnresolvedType { kind: ReferenceKind::Superclass, .. }
        );
        assert_eq!(Some(Type::Error), table.class(a).superclass);
        assert!(ledger.resolve_all(&mut table).is_empty());
    }

    #[test]
    fn on_demand_imports_can_be_ambiguous() {
        let loader = StubLoader::builtin()
            .with_class(ExternalClass::class("a.List"))
            .with_class(ExternalClass::class("b.List"));
        let table = table_with(loader);
        let mut scope = scope();
        scope.on_demand.push("a".to_string());
        scope.on_demand.push("b".to_string());
        assert_matches!(
            lookup_type(&table, &scope, None, &qname("List")),
            Err(LookupError::Ambiguous(ref names)) if names.len() == 2
        );
        scope.single.push((Symbol::from("List"), "b.List".to_string()));
        let id = lookup_type(&table, &scope, None, &qname("List")).expect("single import wins");
        assert_eq!("b.List", table.class(id).qualified_name.as_str());
    }

    #[test]
    fn qualified_names_reach_nested_classes() {
        let table = table_with(StubLoader::builtin());
        let mut scope = scope();
        let outer = class(&table, &mut scope, "Outer");
        let mut inner = ClassDef::new(
            Symbol::from("Inner"),
            Symbol::from("p.Outer.Inner"),
            "p",
            ClassKind::Class,
        );
        inner.enclosing = Some(outer);
        let inner = table.add_class(inner);
        table.bind_name("p.Outer.Inner", inner).expect("fresh");
        // the member list is filled by registration
        assert_eq!(Some(inner), lookup_qualified(&table, "p.Outer.Inner"));
        assert_eq!(Ok(outer), lookup_type(&table, &scope, None, &qname("p.Outer")));
    }
}
