//! Resolved types.
//!
//! Class types do not own the class they refer to: `ClassRef` is an index
//! into the class table of the analysis plus the qualified name for
//! messages.
use std::{fmt, hash::{Hash, Hasher}};
use strtab::Symbol;

/// Index of a class in the class table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub usize);

/// The `index`-th field of a class.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub class: ClassId,
    pub index: usize,
}

/// The `index`-th method (or constructor) of a class.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct MethodRef {
    pub class: ClassId,
    pub index: usize,
}

/// Entry of the deferred resolution ledger.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct DeferredId(pub usize);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKind {
    pub fn is_numeric(self) -> bool {
        self != PrimitiveKind::Boolean
    }

    pub fn is_integral(self) -> bool {
        use self::PrimitiveKind::*;
        match self {
            Byte | Short | Char | Int | Long => true,
            Boolean | Float | Double => false,
        }
    }

    pub fn name(self) -> &'static str {
        use self::PrimitiveKind::*;
        match self {
            Boolean => "boolean",
            Byte => "byte",
            Short => "short",
            Char => "char",
            Int => "int",
            Long => "long",
            Float => "float",
            Double => "double",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone)]
pub struct ClassRef {
    pub id: ClassId,
    /// qualified source name, e.g. `java.lang.String` or `p.Outer.Inner`
    pub name: Symbol,
}

impl PartialEq for ClassRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ClassRef {}

impl Hash for ClassRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Primitive(PrimitiveKind),
    Class(ClassRef),
    Array(Box<Type>),
    /// type of the `null` literal
    Null,
    Void,
    /// placeholder until the ledger resolved the name
    Deferred(DeferredId),
    /// Result of an erroneous expression or declaration. Convertible from
    /// and to every other type so a single mistake is reported once.
    Error,
}

impl Type {
    pub fn class(id: ClassId, name: Symbol) -> Self {
        Type::Class(ClassRef { id, name })
    }

    pub fn array_of(element: Type, dimensions: usize) -> Self {
        (0..dimensions).fold(element, |ty, _| Type::Array(Box::new(ty)))
    }

    pub fn is_error(&self) -> bool {
        match self {
            Type::Error => true,
            _ => false,
        }
    }

    pub fn is_primitive(&self) -> bool {
        match self {
            Type::Primitive(_) => true,
            _ => false,
        }
    }

    pub fn primitive(&self) -> Option<PrimitiveKind> {
        match self {
            Type::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.primitive().map(PrimitiveKind::is_numeric).unwrap_or(false)
    }

    pub fn is_integral(&self) -> bool {
        self.primitive().map(PrimitiveKind::is_integral).unwrap_or(false)
    }

    pub fn is_boolean(&self) -> bool {
        self.primitive() == Some(PrimitiveKind::Boolean)
    }

    /// Class, array and null types.
    pub fn is_reference(&self) -> bool {
        match self {
            Type::Class(_) | Type::Array(_) | Type::Null => true,
            _ => false,
        }
    }

    pub fn class_id(&self) -> Option<ClassId> {
        match self {
            Type::Class(class) => Some(class.id),
            _ => None,
        }
    }

    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Type::Array(element) => Some(element),
            _ => None,
        }
    }

    /// Strips all array dimensions: `(int, 2)` for `int[][]`.
    pub fn innermost(&self) -> (&Type, usize) {
        let mut ty = self;
        let mut dimensions = 0;
        while let Type::Array(element) = ty {
            ty = element;
            dimensions += 1;
        }
        (ty, dimensions)
    }

    pub fn is_resolved(&self) -> bool {
        match self.innermost().0 {
            Type::Deferred(_) => false,
            _ => true,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(kind) => write!(f, "{}", kind),
            Type::Class(class) => write!(f, "{}", class.name),
            Type::Array(element) => write!(f, "{}[]", element),
            Type::Null => write!(f, "null"),
            Type::Void => write!(f, "void"),
            Type::Deferred(_) => write!(f, "<unresolved>"),
            Type::Error => write!(f, "<error>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrays_nest_and_unwrap() {
        let ty = Type::array_of(Type::Primitive(PrimitiveKind::Int), 2);
        assert_eq!("int[][]", ty.to_string());
        assert_eq!((&Type::Primitive(PrimitiveKind::Int), 2), ty.innermost());
        assert!(ty.is_reference());
    }

    #[test]
    fn class_types_compare_by_id() {
        let a = Type::class(ClassId(3), Symbol::from("p.A"));
        let b = Type::class(ClassId(3), Symbol::from("A"));
        assert_eq!(a, b);
        assert_ne!(a, Type::class(ClassId(4), Symbol::from("p.A")));
    }

    #[test]
    fn deferred_types_are_unresolved() {
        assert!(!Type::array_of(Type::Deferred(DeferredId(0)), 1).is_resolved());
        assert!(Type::Error.is_resolved());
    }
}
