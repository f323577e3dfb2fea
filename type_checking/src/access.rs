//! Visibility of classes and members.
use crate::{conversion::is_subclass_of, type_system::ClassTable};
use syntax::{ClassId, Modifiers, Type};

/// The top-level class lexically containing `class`.
pub fn top_level(table: &ClassTable, class: ClassId) -> ClassId {
    let mut current = class;
    while let Some(enclosing) = table.class(current).enclosing {
        current = enclosing;
    }
    current
}

/// `class` and its lexically enclosing classes, innermost first.
pub fn enclosing_chain(table: &ClassTable, class: ClassId) -> Vec<ClassId> {
    let mut chain = vec![class];
    let mut current = class;
    while let Some(enclosing) = table.class(current).enclosing {
        chain.push(enclosing);
        current = enclosing;
    }
    chain
}

fn same_package(table: &ClassTable, a: ClassId, b: ClassId) -> bool {
    table.class(a).package == table.class(b).package
}

/// Whether code in `from` may use a member with `modifiers` declared in
/// `declaring`. `qualifier` is the static type of the expression the member
/// is accessed through, `None` for unqualified access.
pub fn is_accessible(
    table: &ClassTable,
    from: ClassId,
    modifiers: Modifiers,
    declaring: ClassId,
    qualifier: Option<&Type>,
    via_super: bool,
) -> bool {
    if modifiers.is_public() {
        return true;
    }
    if top_level(table, from) == top_level(table, declaring) {
        return true;
    }
    if modifiers.is_private() {
        return false;
    }
    if same_package(table, from, declaring) {
        return true;
    }
    if !modifiers.is_protected() {
        return false;
    }

    enclosing_chain(table, from).into_iter().any(|class| {
        if !is_subclass_of(table, class, declaring) {
            return false;
        }
        if qualifier.is_none() || via_super || modifiers.is_static() {
            return true;
        }
        match qualifier {
            Some(Type::Class(qualifier)) => is_subclass_of(table, qualifier.id, class),
            _ => false,
        }
    })
}

/// Whether the class `target` may be named from `from`.
pub fn is_class_accessible(table: &ClassTable, from: ClassId, target: ClassId) -> bool {
    let class = table.class(target);
    match class.enclosing {
        Some(enclosing) => {
            is_class_accessible(table, from, enclosing)
                && is_accessible(table, from, class.modifiers, enclosing, None, false)
        }
        None => class.modifiers.is_public() || same_package(table, from, target),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        class_loader::StubLoader,
        type_system::ClassDef,
    };
    use strtab::Symbol;
    use syntax::{build::mods, ClassKind, Modifier};

    struct Fixture {
        table: ClassTable,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture {
                table: ClassTable::new(Box::new(StubLoader::builtin())),
            }
        }

        fn class(&self, package: &str, name: &str, superclass: Option<ClassId>, enclosing: Option<ClassId>) -> ClassId {
            let mut def = ClassDef::new(
                Symbol::from(name),
                Symbol::from(format!("{}.{}", package, name)),
                package,
                ClassKind::Class,
            );
            def.modifiers = mods(&[Modifier::Public]);
            def.superclass = match superclass {
                Some(id) => Some(self.table.class(id).ty()),
                None => Some(self.table.object()),
            };
            def.enclosing = enclosing;
            self.table.add_class(def)
        }
    }

    #[test]
    fn private_members_are_visible_in_the_whole_nest() {
        let f = Fixture::new();
        let outer = f.class("p", "Outer", None, None);
        let inner = f.class("p", "Inner", None, Some(outer));
        let deeper = f.class("p", "Deeper", None, Some(inner));
        let other = f.class("p", "Other", None, None);
        let private = mods(&[Modifier::Private]);
        assert!(is_accessible(&f.table, deeper, private, outer, None, false));
        assert!(is_accessible(&f.table, outer, private, deeper, None, false));
        assert!(!is_accessible(&f.table, other, private, outer, None, false));
    }

    #[test]
    fn package_private_stops_at_the_package() {
        let f = Fixture::new();
        let a = f.class("p", "A", None, None);
        let b = f.class("p", "B", None, None);
        let c = f.class("q", "C", Some(a), None);
        let none = Modifiers::default();
        assert!(is_accessible(&f.table, b, none, a, None, false));
        assert!(!is_accessible(&f.table, c, none, a, None, false));
    }

    #[test]
    fn protected_checks_the_qualifier() {
        let f = Fixture::new();
        let base = f.class("p", "Base", None, None);
        let derived = f.class("q", "Derived", Some(base), None);
        let sibling = f.class("q", "Sibling", Some(base), None);
        let inner = f.class("q", "Inner", None, Some(derived));
        let protected = mods(&[Modifier::Protected]);

        let derived_ty = f.table.class(derived).ty();
        let base_ty = f.table.class(base).ty();
        assert!(is_accessible(&f.table, derived, protected, base, None, false));
        assert!(is_accessible(&f.table, derived, protected, base, Some(&derived_ty), false));
        assert!(!is_accessible(&f.table, derived, protected, base, Some(&base_ty), false));
        assert!(is_accessible(&f.table, derived, protected, base, Some(&base_ty), true));
        assert!(!is_accessible(&f.table, sibling, protected, base, Some(&derived_ty), false));
        // nested classes of a subclass
        assert!(is_accessible(&f.table, inner, protected, base, None, false));
    }

    #[test]
    fn classes_from_other_packages_must_be_public() {
        let f = Fixture::new();
        let a = f.class("p", "A", None, None);
        let hidden = f.class("q", "Hidden", None, None);
        f.table.update_class(hidden, |def| def.modifiers = Modifiers::default());
        assert!(!is_class_accessible(&f.table, a, hidden));
        let public = f.class("q", "Public", None, None);
        assert!(is_class_accessible(&f.table, a, public));
    }
}
