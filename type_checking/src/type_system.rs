//! The class table: one entry per class or interface known to the analysis,
//! declared in a unit or loaded from outside.
//!
//! Entries are only ever appended. Types inside an entry start out as
//! ledger placeholders and are overwritten once, when the ledger resolves
//! them.
use crate::{
    class_loader::{ClassLoader, ExternalClass},
    conversion::Constant,
};
use asciifile::Span;
use log::{debug, warn};
use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    fmt,
    rc::Rc,
};
use strtab::Symbol;
use syntax::{
    build::primitive_kind, ClassId, ClassKind, FieldRef, MethodRef, Modifier, Modifiers, Type,
};

#[derive(Debug)]
pub struct ClassAlreadyDeclared;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NestingKind {
    TopLevel,
    Member,
    Local,
    Anonymous,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MethodKind {
    Method,
    Constructor,
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: Symbol,
    pub ty: Type,
    pub modifiers: Modifiers,
    /// value of a `final` field with a constant initializer
    pub constant: Option<Constant>,
    pub has_initializer: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ParamDef {
    pub name: Symbol,
    pub ty: Type,
}

#[derive(Debug, Clone)]
pub struct MethodDef {
    pub name: Symbol,
    pub kind: MethodKind,
    pub params: Vec<ParamDef>,
    pub return_ty: Type,
    pub throws: Vec<Type>,
    pub modifiers: Modifiers,
    pub span: Span,
}

impl MethodDef {
    pub fn is_constructor(&self) -> bool {
        self.kind == MethodKind::Constructor
    }

    pub fn param_types(&self) -> Vec<Type> {
        self.params.iter().map(|p| p.ty.clone()).collect()
    }

    /// `name(int, java.lang.String)`
    pub fn signature(&self) -> String {
        let params = self
            .params
            .iter()
            .map(|p| p.ty.to_string())
            .collect::<Vec<_>>();
        format!("{}({})", self.name, params.join(", "))
    }
}

/// A final local of an enclosing method that a local or anonymous class
/// reads. It lives on in the field `val$name`.
#[derive(Debug, Clone)]
pub struct Capture {
    pub name: Symbol,
    pub ty: Type,
    pub field: FieldRef,
}

#[derive(Debug, Clone)]
pub struct ClassDef {
    pub id: ClassId,
    /// simple name, empty for anonymous classes
    pub name: Symbol,
    /// source name used in messages: `p.Outer.Inner`
    pub qualified_name: Symbol,
    /// `p.Outer$Inner`, `p.Outer$1`, `p.Outer$1Local`
    pub binary_name: String,
    pub package: String,
    pub kind: ClassKind,
    pub nesting: NestingKind,
    pub modifiers: Modifiers,
    pub superclass: Option<Type>,
    pub interfaces: Vec<Type>,
    pub fields: Vec<FieldDef>,
    pub methods: Vec<MethodDef>,
    pub member_types: Vec<(Symbol, ClassId)>,
    /// local classes visible where this class is declared, itself included
    pub local_types: Vec<(Symbol, ClassId)>,
    pub enclosing: Option<ClassId>,
    /// number of lexically enclosing classes
    pub depth: usize,
    /// local or anonymous class declared in a static method or initializer
    pub static_context: bool,
    /// synthesized `this$N` field referring to the enclosing instance
    pub outer_field: Option<FieldRef>,
    pub captures: Vec<Capture>,
    pub span: Span,
    pub laid_out: bool,
    pub external: bool,
}

impl ClassDef {
    pub fn new(name: Symbol, qualified_name: Symbol, package: &str, kind: ClassKind) -> Self {
        ClassDef {
            id: ClassId(0),
            binary_name: qualified_name.to_string(),
            name,
            qualified_name,
            package: package.to_string(),
            kind,
            nesting: NestingKind::TopLevel,
            modifiers: Modifiers::default(),
            superclass: None,
            interfaces: vec![],
            fields: vec![],
            methods: vec![],
            member_types: vec![],
            local_types: vec![],
            enclosing: None,
            depth: 0,
            static_context: false,
            outer_field: None,
            captures: vec![],
            span: Span::default(),
            laid_out: false,
            external: false,
        }
    }

    pub fn ty(&self) -> Type {
        Type::class(self.id, self.qualified_name.clone())
    }

    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    pub fn is_abstract(&self) -> bool {
        self.is_interface() || self.modifiers.is_abstract()
    }

    pub fn is_deprecated(&self) -> bool {
        self.modifiers.has(Modifier::Deprecated)
    }

    /// Instances carry a reference to an instance of the enclosing class.
    pub fn has_outer_instance(&self) -> bool {
        self.enclosing.is_some()
            && self.kind == ClassKind::Class
            && !self.modifiers.is_static()
            && !self.static_context
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field_ref(&self, name: &str) -> Option<FieldRef> {
        self.field_index(name).map(|index| FieldRef {
            class: self.id,
            index,
        })
    }

    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = MethodRef> + 'a {
        let class = self.id;
        self.methods
            .iter()
            .enumerate()
            .filter(move |(_, m)| m.kind == MethodKind::Method && m.name == name)
            .map(move |(index, _)| MethodRef { class, index })
    }

    pub fn constructors<'a>(&'a self) -> impl Iterator<Item = MethodRef> + 'a {
        let class = self.id;
        self.methods
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_constructor())
            .map(move |(index, _)| MethodRef { class, index })
    }

    pub fn member_type(&self, name: &str) -> Option<ClassId> {
        self.member_types
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| *id)
    }

    pub fn local_type(&self, name: &str) -> Option<ClassId> {
        self.local_types
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| *id)
    }
}

impl fmt::Display for ClassDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified_name)
    }
}

pub struct ClassTable {
    classes: RefCell<Vec<Rc<ClassDef>>>,
    by_name: RefCell<HashMap<String, ClassId>>,
    packages: RefCell<HashSet<String>>,
    loader: Box<dyn ClassLoader>,
}

impl fmt::Debug for ClassTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassTable")
            .field("classes", &self.classes.borrow().len())
            .finish()
    }
}

impl ClassTable {
    pub fn new(loader: Box<dyn ClassLoader>) -> Self {
        ClassTable {
            classes: RefCell::new(Vec::new()),
            by_name: RefCell::new(HashMap::new()),
            packages: RefCell::new(HashSet::new()),
            loader,
        }
    }

    pub fn len(&self) -> usize {
        self.classes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a class and assigns its id. Only named, non-local classes
    /// should be bound to their qualified name with `bind_name`.
    pub fn add_class(&self, mut class: ClassDef) -> ClassId {
        let mut classes = self.classes.borrow_mut();
        let id = ClassId(classes.len());
        class.id = id;
        classes.push(Rc::new(class));
        id
    }

    pub fn bind_name(&self, qualified_name: &str, id: ClassId) -> Result<(), ClassAlreadyDeclared> {
        let mut by_name = self.by_name.borrow_mut();
        if by_name.contains_key(qualified_name) {
            return Err(ClassAlreadyDeclared);
        }
        by_name.insert(qualified_name.to_string(), id);
        Ok(())
    }

    pub fn add_package(&self, package: &str) {
        let mut packages = self.packages.borrow_mut();
        let mut prefix = String::new();
        for segment in package.split('.').filter(|s| !s.is_empty()) {
            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(segment);
            packages.insert(prefix.clone());
        }
    }

    pub fn class(&self, id: ClassId) -> Rc<ClassDef> {
        Rc::clone(&self.classes.borrow()[id.0])
    }

    /// Mutable access, only used before method bodies are checked.
    pub fn class_mut(&mut self, id: ClassId) -> &mut ClassDef {
        Rc::make_mut(&mut self.classes.get_mut()[id.0])
    }

    /// Appends a synthesized field. Snapshots handed out by `class` keep
    /// their old member list.
    pub fn add_field(&self, class: ClassId, field: FieldDef) -> FieldRef {
        let mut classes = self.classes.borrow_mut();
        let def = Rc::make_mut(&mut classes[class.0]);
        def.fields.push(field);
        FieldRef {
            class,
            index: def.fields.len() - 1,
        }
    }

    pub fn add_method(&self, class: ClassId, method: MethodDef) -> MethodRef {
        let mut classes = self.classes.borrow_mut();
        let def = Rc::make_mut(&mut classes[class.0]);
        def.methods.push(method);
        MethodRef {
            class,
            index: def.methods.len() - 1,
        }
    }

    /// Replaces a class entry as a whole, for updates during body checking.
    pub fn update_class<F>(&self, class: ClassId, update: F)
    where
        F: FnOnce(&mut ClassDef),
    {
        let mut classes = self.classes.borrow_mut();
        update(Rc::make_mut(&mut classes[class.0]));
    }

    pub fn ids(&self) -> Vec<ClassId> {
        (0..self.len()).map(ClassId).collect()
    }

    pub fn field(&self, field: FieldRef) -> FieldDef {
        self.class(field.class).fields[field.index].clone()
    }

    pub fn method(&self, method: MethodRef) -> MethodDef {
        self.class(method.class).methods[method.index].clone()
    }

    /// Classes of the table only, no loading.
    pub fn lookup(&self, qualified_name: &str) -> Option<ClassId> {
        self.by_name.borrow().get(qualified_name).cloned()
    }

    pub fn lookup_or_load(&self, qualified_name: &str) -> Option<ClassId> {
        match self.lookup(qualified_name) {
            Some(id) => Some(id),
            None => self.load(qualified_name),
        }
    }

    pub fn package_exists(&self, package: &str) -> bool {
        self.packages.borrow().contains(package) || self.loader.package_exists(package)
    }

    /// Type of a well-known class like `java.lang.String`, the error type if
    /// the loader does not know it.
    pub fn well_known(&self, qualified_name: &str) -> Type {
        match self.lookup_or_load(qualified_name) {
            Some(id) => self.class(id).ty(),
            None => {
                warn!("well-known class {} is not available", qualified_name);
                Type::Error
            }
        }
    }

    pub fn object(&self) -> Type {
        self.well_known("java.lang.Object")
    }

    pub fn string(&self) -> Type {
        self.well_known("java.lang.String")
    }

    pub fn is_string(&self, ty: &Type) -> bool {
        match ty {
            Type::Class(class) => class.name == "java.lang.String",
            _ => false,
        }
    }

    fn load(&self, qualified_name: &str) -> Option<ClassId> {
        let external = self.loader.load(qualified_name)?;
        debug!("loading external class {}", qualified_name);

        let simple = qualified_name.rsplit('.').next().unwrap_or(qualified_name);
        let mut placeholder = ClassDef::new(
            Symbol::from(simple),
            Symbol::from(qualified_name),
            external.package(),
            external.kind,
        );
        placeholder.external = true;
        placeholder.laid_out = true;
        placeholder.modifiers = external.modifiers;
        let id = self.add_class(placeholder);
        // bound before the members are resolved so self references terminate
        self.by_name
            .borrow_mut()
            .insert(qualified_name.to_string(), id);

        let class = self.define_external(id, &external);
        self.classes.borrow_mut()[id.0] = Rc::new(class);
        Some(id)
    }

    fn define_external(&self, id: ClassId, external: &ExternalClass) -> ClassDef {
        let mut class = (*self.class(id)).clone();
        class.superclass = external.superclass.as_ref().map(|s| self.external_type(s));
        class.interfaces = external
            .interfaces
            .iter()
            .map(|i| self.external_type(i))
            .collect();
        class.fields = external
            .fields
            .iter()
            .map(|f| FieldDef {
                name: Symbol::from(f.name.as_str()),
                ty: self.external_type(&f.ty),
                modifiers: f.modifiers,
                constant: f.constant.clone(),
                has_initializer: f.constant.is_some(),
                span: Span::default(),
            })
            .collect();
        class.methods = external
            .methods
            .iter()
            .map(|m| MethodDef {
                name: Symbol::from(m.name.as_str()),
                kind: m.kind,
                params: m
                    .params
                    .iter()
                    .enumerate()
                    .map(|(i, p)| ParamDef {
                        name: Symbol::from(format!("arg{}", i)),
                        ty: self.external_type(p),
                    })
                    .collect(),
                return_ty: self.external_type(&m.return_ty),
                throws: m.throws.iter().map(|t| self.external_type(t)).collect(),
                modifiers: m.modifiers,
                span: Span::default(),
            })
            .collect();
        class
    }

    /// Parses a type written by a class loader.
    pub fn external_type(&self, text: &str) -> Type {
        let text = text.trim();
        let dimensions = text.matches("[]").count();
        let base = text.trim_end_matches("[]").trim_end();
        let element = match (base, primitive_kind(base)) {
            ("void", _) => Type::Void,
            (_, Some(kind)) => Type::Primitive(kind),
            (name, None) => match self.lookup_or_load(name) {
                Some(id) => self.class(id).ty(),
                None => {
                    warn!("external type {} cannot be loaded", name);
                    Type::Error
                }
            },
        };
        Type::array_of(element, dimensions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class_loader::StubLoader;
    use syntax::PrimitiveKind;

    fn table() -> ClassTable {
        ClassTable::new(Box::new(StubLoader::builtin()))
    }

    #[test]
    fn loads_classes_on_demand() {
        let table = table();
        assert!(table.lookup("java.io.IOException").is_none());
        let ioe = table.lookup_or_load("java.io.IOException").expect("builtin");
        let exception = table.class(ioe).superclass.clone().expect("has superclass");
        assert_eq!("java.lang.Exception", exception.to_string());
        assert_eq!(Some(ioe), table.lookup("java.io.IOException"));
    }

    #[test]
    fn self_referencing_classes_terminate() {
        let table = table();
        let string = table.lookup_or_load("java.lang.String").expect("builtin");
        let concat = table
            .class(string)
            .methods_named("concat")
            .next()
            .expect("concat");
        assert_eq!("java.lang.String", table.method(concat).return_ty.to_string());
    }

    #[test]
    fn external_types_keep_dimensions() {
        let table = table();
        assert_eq!(
            Type::array_of(Type::Primitive(PrimitiveKind::Char), 2),
            table.external_type("char[][]")
        );
        assert_eq!(Type::Error, table.external_type("does.not.Exist"));
    }

    #[test]
    fn names_are_bound_once() {
        let table = table();
        let def = ClassDef::new(Symbol::from("A"), Symbol::from("p.A"), "p", ClassKind::Class);
        let id = table.add_class(def);
        assert!(table.bind_name("p.A", id).is_ok());
        assert!(table.bind_name("p.A", id).is_err());
    }

    #[test]
    fn packages_include_their_prefixes() {
        let table = table();
        table.add_package("a.b.c");
        assert!(table.package_exists("a.b"));
        assert!(table.package_exists("java.io"));
        assert!(!table.package_exists("b"));
    }
}
