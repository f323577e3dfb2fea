//! Field lookup and overload resolution.
use crate::{
    access::{enclosing_chain, is_accessible},
    conversion::{is_subclass_of, method_invocation_conversion},
    type_system::{ClassTable, MethodDef},
};
use itertools::Itertools;
use log::trace;
use std::collections::HashSet;
use syntax::{ClassId, FieldRef, MethodRef, Type};

/// Where a member is used from.
#[derive(Debug, Clone, Copy)]
pub struct Site<'a> {
    pub from: ClassId,
    /// static type of the qualifying expression, `None` when unqualified
    pub qualifier: Option<&'a Type>,
    pub via_super: bool,
}

impl<'a> Site<'a> {
    pub fn unqualified(from: ClassId) -> Self {
        Site {
            from,
            qualifier: None,
            via_super: false,
        }
    }
}

/// Result of a member search. Inaccessible matches are only kept to give
/// better error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidates<T> {
    pub applicable: Vec<T>,
    pub inaccessible: Vec<T>,
    /// every member with the requested name, applicable or not
    pub named: Vec<T>,
}

impl<T> Default for Candidates<T> {
    fn default() -> Self {
        Candidates {
            applicable: vec![],
            inaccessible: vec![],
            named: vec![],
        }
    }
}

/// Classes searched for members of `start`: the class itself, its
/// interfaces (transitively), then the superclass chain. Interfaces end with
/// `Object`. Each class is visited once.
pub fn search_order(table: &ClassTable, start: ClassId) -> Vec<ClassId> {
    fn visit(table: &ClassTable, id: ClassId, order: &mut Vec<ClassId>, seen: &mut HashSet<ClassId>) {
        if !seen.insert(id) {
            return;
        }
        order.push(id);
        let class = table.class(id);
        for interface in class.interfaces.iter().filter_map(Type::class_id) {
            visit(table, interface, order, seen);
        }
        if let Some(superclass) = class.superclass.as_ref().and_then(Type::class_id) {
            visit(table, superclass, order, seen);
        }
    }

    let mut order = vec![];
    let mut seen = HashSet::new();
    visit(table, start, &mut order, &mut seen);
    if table.class(start).is_interface() {
        if let Some(object) = table.object().class_id() {
            visit(table, object, &mut order, &mut seen);
        }
    }
    order
}

/// The class whose members a value of type `ty` has. Arrays have the
/// members of `Object`.
pub fn member_class(table: &ClassTable, ty: &Type) -> Option<ClassId> {
    match ty {
        Type::Class(class) => Some(class.id),
        Type::Array(_) => table.object().class_id(),
        _ => None,
    }
}

/// Fields named `name` visible in `containing`, nearest declaration first.
pub fn find_field(
    table: &ClassTable,
    containing: ClassId,
    name: &str,
    site: Site<'_>,
) -> Candidates<FieldRef> {
    let mut found = Candidates::default();
    for class in search_order(table, containing) {
        let def = table.class(class);
        if let Some(field) = def.field_ref(name) {
            found.named.push(field);
            let modifiers = def.fields[field.index].modifiers;
            if is_accessible(table, site.from, modifiers, class, site.qualifier, site.via_super) {
                found.applicable.push(field);
                // hides the fields further up
                break;
            } else {
                found.inaccessible.push(field);
            }
        }
    }
    found
}

fn is_applicable(table: &ClassTable, method: &MethodDef, args: &[Type]) -> bool {
    method.params.len() == args.len()
        && method
            .params
            .iter()
            .zip(args)
            .all(|(param, arg)| method_invocation_conversion(table, arg, &param.ty))
}

/// Methods (or, with `is_constructor`, constructors) of `containing` that
/// accept `args`. Constructors are not inherited; methods overridden in a
/// subclass are only reported once.
pub fn find_applicable(
    table: &ClassTable,
    containing: ClassId,
    name: &str,
    args: &[Type],
    is_constructor: bool,
    site: Site<'_>,
) -> Candidates<MethodRef> {
    let classes = if is_constructor {
        vec![containing]
    } else {
        search_order(table, containing)
    };

    let mut found = Candidates::default();
    let mut signatures: HashSet<(String, Vec<Type>)> = HashSet::new();
    for class in classes {
        let def = table.class(class);
        let refs: Vec<MethodRef> = if is_constructor {
            def.constructors().collect()
        } else {
            def.methods_named(name).collect()
        };
        for method_ref in refs {
            let method = &def.methods[method_ref.index];
            if !signatures.insert((method.name.to_string(), method.param_types())) {
                continue;
            }
            found.named.push(method_ref);
            if !is_applicable(table, method, args) {
                continue;
            }
            if is_accessible(table, site.from, method.modifiers, class, site.qualifier, site.via_super) {
                found.applicable.push(method_ref);
            } else {
                found.inaccessible.push(method_ref);
            }
        }
    }
    found
}

/// Outcome of picking among applicable methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Found(MethodRef),
    NoneApplicable,
    Ambiguous(Vec<MethodRef>),
}

/// `a` is at least as specific as `b`: every parameter of `a` converts to
/// the parameter of `b`.
fn params_at_least_as_specific(table: &ClassTable, a: &MethodDef, b: &MethodDef) -> bool {
    a.params
        .iter()
        .zip(&b.params)
        .all(|(pa, pb)| method_invocation_conversion(table, &pa.ty, &pb.ty))
}

/// The declaring class of `a` beats the one of `b`: a subclass overrides its
/// superclass, a directly nested class beats its enclosing class.
fn declared_more_specifically(table: &ClassTable, a: ClassId, b: ClassId) -> bool {
    if a == b {
        return false;
    }
    is_subclass_of(table, a, b) || table.class(a).enclosing == Some(b)
}

fn more_specific(table: &ClassTable, a: MethodRef, b: MethodRef) -> bool {
    let (ma, mb) = (table.method(a), table.method(b));
    let a_fits = params_at_least_as_specific(table, &ma, &mb);
    let b_fits = params_at_least_as_specific(table, &mb, &ma);
    match (a_fits, b_fits) {
        (true, false) => true,
        (true, true) => declared_more_specifically(table, a.class, b.class),
        _ => false,
    }
}

/// Picks the most specific of `candidates`. Ties between abstract methods
/// go to the first one in search order.
pub fn most_specific(table: &ClassTable, candidates: &[MethodRef]) -> Selection {
    if candidates.is_empty() {
        return Selection::NoneApplicable;
    }

    let maximal: Vec<MethodRef> = candidates
        .iter()
        .cloned()
        .filter(|&c| !candidates.iter().any(|&o| o != c && more_specific(table, o, c)))
        .collect();

    let selection = match maximal.len() {
        0 => Selection::Ambiguous(candidates.to_vec()),
        1 => Selection::Found(maximal[0]),
        _ => {
            let concrete: Vec<MethodRef> = maximal
                .iter()
                .cloned()
                .filter(|m| !table.method(*m).modifiers.is_abstract())
                .collect();
            match concrete.len() {
                0 => Selection::Found(maximal[0]),
                1 => Selection::Found(concrete[0]),
                _ => Selection::Ambiguous(maximal),
            }
        }
    };
    trace!("overload selection among {} candidates: {:?}", candidates.len(), selection);
    selection
}

/// Searches unqualified method names outwards through the enclosing
/// classes. The innermost class declaring a method of that name is the one
/// searched, as in `find_applicable`.
pub fn find_enclosing_method_owner(table: &ClassTable, from: ClassId, name: &str) -> Option<ClassId> {
    enclosing_chain(table, from).into_iter().find(|&class| {
        search_order(table, class)
            .into_iter()
            .any(|c| table.class(c).methods_named(name).next().is_some())
    })
}

/// Innermost class in the enclosing chain of `from` with a field `name`.
pub fn find_enclosing_field_owner(table: &ClassTable, from: ClassId, name: &str) -> Option<ClassId> {
    enclosing_chain(table, from).into_iter().find(|&class| {
        search_order(table, class)
            .into_iter()
            .any(|c| table.class(c).field_index(name).is_some())
    })
}

/// `name(T1, T2)` lines for diagnostics.
pub fn describe(table: &ClassTable, methods: &[MethodRef]) -> String {
    methods
        .iter()
        .map(|m| format!("{}.{}", table.class(m.class).name, table.method(*m).signature()))
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        class_loader::StubLoader,
        type_system::{ClassDef, MethodKind, ParamDef},
    };
    use asciifile::Span;
    use strtab::Symbol;
    use syntax::{build::mods, ClassKind, Modifier, Modifiers, PrimitiveKind};

    fn table() -> ClassTable {
        ClassTable::new(Box::new(StubLoader::builtin()))
    }

    fn class(table: &ClassTable, name: &str, superclass: Option<ClassId>) -> ClassId {
        let mut def = ClassDef::new(Symbol::from(name), Symbol::from(name), "", ClassKind::Class);
        def.superclass = Some(match superclass {
            Some(id) => table.class(id).ty(),
            None => table.object(),
        });
        table.add_class(def)
    }

    fn method(table: &ClassTable, class: ClassId, modifiers: Modifiers, name: &str, params: &[Type]) -> MethodRef {
        table.add_method(
            class,
            MethodDef {
                name: Symbol::from(name),
                kind: MethodKind::Method,
                params: params
                    .iter()
                    .enumerate()
                    .map(|(i, ty)| ParamDef {
                        name: Symbol::from(format!("p{}", i)),
                        ty: ty.clone(),
                    })
                    .collect(),
                return_ty: Type::Void,
                throws: vec![],
                modifiers,
                span: Span::default(),
            },
        )
    }

    fn int() -> Type {
        Type::Primitive(PrimitiveKind::Int)
    }

    fn long() -> Type {
        Type::Primitive(PrimitiveKind::Long)
    }

    fn select(table: &ClassTable, class: ClassId, name: &str, args: &[Type]) -> Selection {
        let found = find_applicable(table, class, name, args, false, Site::unqualified(class));
        most_specific(table, &found.applicable)
    }

    #[test]
    fn identity_beats_widening() {
        let table = table();
        let a = class(&table, "A", None);
        let by_int = method(&table, a, Modifiers::default(), "foo", &[int()]);
        method(&table, a, Modifiers::default(), "foo", &[long()]);
        assert_eq!(Selection::Found(by_int), select(&table, a, "foo", &[int()]));
        // idempotent
        assert_eq!(Selection::Found(by_int), select(&table, a, "foo", &[int()]));
    }

    #[test]
    fn subclass_parameters_are_more_specific() {
        let table = table();
        let a = class(&table, "A", None);
        let string = table.string();
        method(&table, a, Modifiers::default(), "foo", &[table.object()]);
        let by_string = method(&table, a, Modifiers::default(), "foo", &[string.clone()]);
        assert_eq!(Selection::Found(by_string), select(&table, a, "foo", &[string]));
    }

    #[test]
    fn crossing_parameters_are_ambiguous() {
        let table = table();
        let a = class(&table, "A", None);
        method(&table, a, Modifiers::default(), "foo", &[int(), long()]);
        method(&table, a, Modifiers::default(), "foo", &[long(), int()]);
        assert!(match select(&table, a, "foo", &[int(), int()]) {
            Selection::Ambiguous(candidates) => candidates.len() == 2,
            _ => false,
        });
        assert_eq!(Selection::NoneApplicable, select(&table, a, "foo", &[long(), long()]));
    }

    #[test]
    fn overridden_methods_are_found_once() {
        let table = table();
        let base = class(&table, "Base", None);
        let derived = class(&table, "Derived", Some(base));
        method(&table, base, Modifiers::default(), "run", &[]);
        let overriding = method(&table, derived, Modifiers::default(), "run", &[]);
        let found = find_applicable(&table, derived, "run", &[], false, Site::unqualified(derived));
        assert_eq!(vec![overriding], found.applicable);
    }

    #[test]
    fn abstract_ties_go_to_the_concrete_or_first_candidate() {
        let table = table();
        let a = class(&table, "A", None);
        let b = class(&table, "B", None);
        let abstract_ = mods(&[Modifier::Abstract, Modifier::Public]);
        let first = method(&table, a, abstract_, "m", &[]);
        let second = method(&table, b, abstract_, "m", &[]);
        assert_eq!(Selection::Found(first), most_specific(&table, &[first, second]));
        let concrete = method(&table, b, mods(&[Modifier::Public]), "n", &[]);
        let other = method(&table, a, abstract_, "n", &[]);
        assert_eq!(Selection::Found(concrete), most_specific(&table, &[other, concrete]));
    }

    #[test]
    fn private_members_of_unrelated_classes_are_inaccessible() {
        let table = table();
        let a = class(&table, "A", None);
        let b = class(&table, "B", None);
        let hidden = method(&table, a, mods(&[Modifier::Private]), "secret", &[]);
        let found = find_applicable(&table, a, "secret", &[], false, Site::unqualified(b));
        assert!(found.applicable.is_empty());
        assert_eq!(vec![hidden], found.inaccessible);
    }

    #[test]
    fn interfaces_search_object_last() {
        let table = table();
        let object = table.object().class_id().expect("builtin");
        let runnable = table.lookup_or_load("java.lang.Runnable").expect("builtin");
        assert_eq!(Some(&object), search_order(&table, runnable).last());
    }
}
