//! Classes from outside the compilation unit.
//!
//! The analysis asks a `ClassLoader` for every qualified name it cannot find
//! in its class table. A loader describes the class with plain strings; the
//! class table turns them into resolved types, loading referenced classes on
//! the way.
use crate::{conversion::Constant, type_system::MethodKind};
use std::collections::HashMap;
use syntax::{ClassKind, Modifier, Modifiers};

pub trait ClassLoader {
    fn load(&self, qualified_name: &str) -> Option<ExternalClass>;

    /// True if at least one class of the package is known.
    fn package_exists(&self, package: &str) -> bool;
}

#[derive(Debug, Clone)]
pub struct ExternalField {
    pub name: String,
    pub ty: String,
    pub modifiers: Modifiers,
    pub constant: Option<Constant>,
}

#[derive(Debug, Clone)]
pub struct ExternalMethod {
    pub name: String,
    pub kind: MethodKind,
    pub params: Vec<String>,
    pub return_ty: String,
    pub throws: Vec<String>,
    pub modifiers: Modifiers,
}

/// A pre-compiled class. Types are written as in source, fully qualified:
/// `int`, `java.lang.String[]`.
#[derive(Debug, Clone)]
pub struct ExternalClass {
    pub name: String,
    pub kind: ClassKind,
    pub modifiers: Modifiers,
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<ExternalField>,
    pub methods: Vec<ExternalMethod>,
}

const OBJECT: &str = "java.lang.Object";

impl ExternalClass {
    pub fn class(name: &str) -> Self {
        ExternalClass {
            name: name.to_string(),
            kind: ClassKind::Class,
            modifiers: Modifiers::new(&[Modifier::Public]),
            superclass: if name == OBJECT {
                None
            } else {
                Some(OBJECT.to_string())
            },
            interfaces: vec![],
            fields: vec![],
            methods: vec![],
        }
    }

    pub fn interface(name: &str) -> Self {
        ExternalClass {
            kind: ClassKind::Interface,
            modifiers: Modifiers::new(&[Modifier::Public, Modifier::Abstract]),
            superclass: None,
            ..ExternalClass::class(name)
        }
    }

    pub fn package(&self) -> &str {
        match self.name.rfind('.') {
            Some(idx) => &self.name[..idx],
            None => "",
        }
    }

    pub fn with_modifiers(mut self, modifiers: &[Modifier]) -> Self {
        self.modifiers = Modifiers::new(modifiers);
        self
    }

    pub fn extends(mut self, superclass: &str) -> Self {
        self.superclass = Some(superclass.to_string());
        self
    }

    pub fn implements(mut self, interface: &str) -> Self {
        self.interfaces.push(interface.to_string());
        self
    }

    pub fn field(mut self, modifiers: &[Modifier], ty: &str, name: &str) -> Self {
        self.fields.push(ExternalField {
            name: name.to_string(),
            ty: ty.to_string(),
            modifiers: Modifiers::new(modifiers),
            constant: None,
        });
        self
    }

    pub fn constant(mut self, ty: &str, name: &str, value: Constant) -> Self {
        self.fields.push(ExternalField {
            name: name.to_string(),
            ty: ty.to_string(),
            modifiers: Modifiers::new(&[Modifier::Public, Modifier::Static, Modifier::Final]),
            constant: Some(value),
        });
        self
    }

    pub fn method_throws(
        mut self,
        modifiers: &[Modifier],
        return_ty: &str,
        name: &str,
        params: &[&str],
        throws: &[&str],
    ) -> Self {
        let mut modifiers = Modifiers::new(modifiers);
        if self.kind == ClassKind::Interface {
            modifiers = modifiers.with(Modifier::Public).with(Modifier::Abstract);
        }
        self.methods.push(ExternalMethod {
            name: name.to_string(),
            kind: MethodKind::Method,
            params: params.iter().map(|p| p.to_string()).collect(),
            return_ty: return_ty.to_string(),
            throws: throws.iter().map(|t| t.to_string()).collect(),
            modifiers,
        });
        self
    }

    pub fn method(self, modifiers: &[Modifier], return_ty: &str, name: &str, params: &[&str]) -> Self {
        self.method_throws(modifiers, return_ty, name, params, &[])
    }

    pub fn ctor_throws(mut self, modifiers: &[Modifier], params: &[&str], throws: &[&str]) -> Self {
        self.methods.push(ExternalMethod {
            name: "<init>".to_string(),
            kind: MethodKind::Constructor,
            params: params.iter().map(|p| p.to_string()).collect(),
            return_ty: "void".to_string(),
            throws: throws.iter().map(|t| t.to_string()).collect(),
            modifiers: Modifiers::new(modifiers),
        });
        self
    }

    pub fn ctor(self, modifiers: &[Modifier], params: &[&str]) -> Self {
        self.ctor_throws(modifiers, params, &[])
    }
}

/// Loader over a fixed set of class descriptions.
#[derive(Debug, Clone, Default)]
pub struct StubLoader {
    classes: HashMap<String, ExternalClass>,
}

impl StubLoader {
    pub fn empty() -> Self {
        StubLoader::default()
    }

    /// The parts of `java.lang` and `java.io` every unit may rely on.
    pub fn builtin() -> Self {
        use self::Modifier::*;
        let p = &[Public];
        let ps = &[Public, Static];
        let string = "java.lang.String";

        let mut loader = StubLoader::empty()
            .with_class(
                ExternalClass::class(OBJECT)
                    .ctor(p, &[])
                    .method(p, "boolean", "equals", &[OBJECT])
                    .method(p, "int", "hashCode", &[])
                    .method(p, string, "toString", &[])
                    .method(p, "void", "notify", &[])
                    .method_throws(&[Protected], OBJECT, "clone", &[], &["java.lang.CloneNotSupportedException"])
                    .method_throws(p, "void", "wait", &[], &["java.lang.InterruptedException"]),
            )
            .with_class(
                ExternalClass::class(string)
                    .with_modifiers(&[Public, Final])
                    .implements("java.lang.CharSequence")
                    .implements("java.lang.Comparable")
                    .ctor(p, &[])
                    .ctor(p, &[string])
                    .ctor(p, &["char[]"])
                    .method(p, "int", "length", &[])
                    .method(p, "char", "charAt", &["int"])
                    .method(p, "boolean", "equals", &[OBJECT])
                    .method(p, "int", "compareTo", &[OBJECT])
                    .method(p, string, "concat", &[string])
                    .method(p, string, "substring", &["int"])
                    .method(p, string, "substring", &["int", "int"])
                    .method(p, "int", "indexOf", &["int"])
                    .method(p, "int", "indexOf", &[string])
                    .method(p, "char[]", "toCharArray", &[])
                    .method(ps, string, "valueOf", &[OBJECT])
                    .method(ps, string, "valueOf", &["int"])
                    .method(ps, string, "valueOf", &["long"])
                    .method(ps, string, "valueOf", &["char"])
                    .method(ps, string, "valueOf", &["boolean"])
                    .method(ps, string, "valueOf", &["double"]),
            )
            .with_class(
                ExternalClass::interface("java.lang.CharSequence")
                    .method(p, "int", "length", &[])
                    .method(p, "char", "charAt", &["int"]),
            )
            .with_class(ExternalClass::interface("java.lang.Comparable").method(p, "int", "compareTo", &[OBJECT]))
            .with_class(ExternalClass::interface("java.lang.Runnable").method(p, "void", "run", &[]))
            .with_class(ExternalClass::interface("java.lang.Cloneable"))
            .with_class(ExternalClass::interface("java.io.Serializable"))
            .with_class(
                ExternalClass::class("java.lang.Math")
                    .with_modifiers(&[Public, Final])
                    .ctor(&[Private], &[])
                    .method(ps, "int", "abs", &["int"])
                    .method(ps, "long", "abs", &["long"])
                    .method(ps, "double", "abs", &["double"])
                    .method(ps, "int", "max", &["int", "int"])
                    .method(ps, "long", "max", &["long", "long"])
                    .method(ps, "double", "max", &["double", "double"])
                    .method(ps, "int", "min", &["int", "int"])
                    .method(ps, "long", "min", &["long", "long"])
                    .method(ps, "double", "sqrt", &["double"])
                    .constant("double", "PI", Constant::Double(std::f64::consts::PI)),
            )
            .with_class(
                ExternalClass::class("java.lang.Integer")
                    .with_modifiers(&[Public, Final])
                    .ctor(p, &["int"])
                    .method(p, "int", "intValue", &[])
                    .method(ps, "int", "parseInt", &[string])
                    .method(ps, string, "toString", &["int"])
                    .constant("int", "MAX_VALUE", Constant::Int(i32::max_value()))
                    .constant("int", "MIN_VALUE", Constant::Int(i32::min_value())),
            )
            .with_class(
                ExternalClass::class("java.lang.System")
                    .with_modifiers(&[Public, Final])
                    .ctor(&[Private], &[])
                    .field(&[Public, Static, Final], "java.io.PrintStream", "out")
                    .field(&[Public, Static, Final], "java.io.PrintStream", "err")
                    .field(&[Public, Static, Final], "java.io.InputStream", "in")
                    .method(ps, "long", "currentTimeMillis", &[])
                    .method(ps, "void", "exit", &["int"])
                    .method(ps, "void", "arraycopy", &[OBJECT, "int", OBJECT, "int", "int"]),
            )
            .with_class(
                ExternalClass::class("java.io.InputStream")
                    .with_modifiers(&[Public, Abstract])
                    .ctor(p, &[])
                    .method_throws(&[Public, Abstract], "int", "read", &[], &["java.io.IOException"])
                    .method_throws(p, "void", "close", &[], &["java.io.IOException"]),
            )
            .with_class(
                ExternalClass::class("java.io.PrintStream")
                    .ctor_throws(p, &[string], &["java.io.FileNotFoundException"])
                    .method(p, "void", "println", &[])
                    .method(p, "void", "println", &[string])
                    .method(p, "void", "println", &["int"])
                    .method(p, "void", "println", &["long"])
                    .method(p, "void", "println", &["char"])
                    .method(p, "void", "println", &["boolean"])
                    .method(p, "void", "println", &["double"])
                    .method(p, "void", "println", &[OBJECT])
                    .method(p, "void", "print", &[string])
                    .method(p, "void", "print", &["int"])
                    .method(p, "void", "print", &[OBJECT])
                    .method(p, "void", "write", &["int"])
                    .method(p, "void", "flush", &[]),
            );

        let throwables: &[(&str, &str)] = &[
            ("java.lang.Throwable", OBJECT),
            ("java.lang.Exception", "java.lang.Throwable"),
            ("java.lang.Error", "java.lang.Throwable"),
            ("java.lang.RuntimeException", "java.lang.Exception"),
            ("java.lang.IllegalArgumentException", "java.lang.RuntimeException"),
            ("java.lang.IllegalStateException", "java.lang.RuntimeException"),
            ("java.lang.NullPointerException", "java.lang.RuntimeException"),
            ("java.lang.ArithmeticException", "java.lang.RuntimeException"),
            ("java.lang.ClassCastException", "java.lang.RuntimeException"),
            ("java.lang.IndexOutOfBoundsException", "java.lang.RuntimeException"),
            ("java.lang.ArrayIndexOutOfBoundsException", "java.lang.IndexOutOfBoundsException"),
            ("java.lang.UnsupportedOperationException", "java.lang.RuntimeException"),
            ("java.lang.CloneNotSupportedException", "java.lang.Exception"),
            ("java.lang.InterruptedException", "java.lang.Exception"),
            ("java.lang.AssertionError", "java.lang.Error"),
            ("java.lang.OutOfMemoryError", "java.lang.Error"),
            ("java.io.IOException", "java.lang.Exception"),
            ("java.io.FileNotFoundException", "java.io.IOException"),
            ("java.io.EOFException", "java.io.IOException"),
        ];
        for (name, superclass) in throwables {
            let mut class = ExternalClass::class(name)
                .extends(superclass)
                .ctor(p, &[])
                .ctor(p, &[string]);
            if *name == "java.lang.Throwable" {
                class = class
                    .implements("java.io.Serializable")
                    .method(p, string, "getMessage", &[])
                    .method(p, "void", "printStackTrace", &[]);
            }
            loader = loader.with_class(class);
        }
        loader
    }

    pub fn with_class(mut self, class: ExternalClass) -> Self {
        self.classes.insert(class.name.clone(), class);
        self
    }
}

impl ClassLoader for StubLoader {
    fn load(&self, qualified_name: &str) -> Option<ExternalClass> {
        self.classes.get(qualified_name).cloned()
    }

    fn package_exists(&self, package: &str) -> bool {
        self.classes.values().any(|class| {
            let class_package = class.package();
            class_package == package || class_package.starts_with(&format!("{}.", package))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_exceptions_form_a_hierarchy() {
        let loader = StubLoader::builtin();
        let ioe = loader.load("java.io.IOException").expect("builtin");
        assert_eq!(Some("java.lang.Exception"), ioe.superclass.as_ref().map(String::as_str));
        assert!(loader.load("java.lang.Nope").is_none());
    }

    #[test]
    fn packages_are_known_through_their_classes() {
        let loader = StubLoader::builtin();
        assert!(loader.package_exists("java.lang"));
        assert!(loader.package_exists("java"));
        assert!(!loader.package_exists("jav"));
    }

    #[test]
    fn interface_methods_are_abstract() {
        let runnable = StubLoader::builtin().load("java.lang.Runnable").expect("builtin");
        assert!(runnable.methods[0].modifiers.is_abstract());
        assert!(runnable.superclass.is_none());
    }
}
