use crate::types::{ClassId, FieldRef, MethodRef, PrimitiveKind, Type};
use asciifile::{Span, Spanned};
use std::fmt;
use strtab::Symbol;
use strum_macros::EnumDiscriminants;

/// One source file: package, imports and top-level type declarations.
#[derive(Debug, Clone, Default)]
pub struct CompilationUnit {
    pub package: Option<Spanned<QualifiedName>>,
    pub imports: Vec<Spanned<Import>>,
    pub classes: Vec<Spanned<ClassDeclaration>>,
}

/// A dotted identifier chain like `java.lang.String` or `a.b.c`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QualifiedName {
    pub segments: Vec<Spanned<Symbol>>,
}

impl QualifiedName {
    pub fn simple(name: Spanned<Symbol>) -> Self {
        QualifiedName {
            segments: vec![name],
        }
    }

    pub fn span(&self) -> Span {
        match (self.segments.first(), self.segments.last()) {
            (Some(first), Some(last)) => Span::combine(first.span, last.span),
            _ => Span::default(),
        }
    }

    pub fn last(&self) -> Option<&Spanned<Symbol>> {
        self.segments.last()
    }

    pub fn is_simple(&self) -> bool {
        self.segments.len() == 1
    }

    /// The name without its last segment.
    pub fn prefix(&self) -> QualifiedName {
        let len = self.segments.len().saturating_sub(1);
        QualifiedName {
            segments: self.segments[..len].to_vec(),
        }
    }

    pub fn join(&self, count: usize) -> String {
        self.segments
            .iter()
            .take(count)
            .map(|segment| segment.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.join(self.segments.len()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub name: QualifiedName,
    /// `import a.b.*;`
    pub on_demand: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Static,
    Final,
    Abstract,
    Native,
    Synchronized,
    Transient,
    Volatile,
    Strictfp,
    /// `@Deprecated` or a `@deprecated` doc tag
    Deprecated,
    /// generated by the compiler
    Synthetic,
}

impl Modifier {
    fn bit(self) -> u16 {
        1 << (self as u16)
    }

    pub fn keyword(self) -> &'static str {
        use self::Modifier::*;
        match self {
            Public => "public",
            Protected => "protected",
            Private => "private",
            Static => "static",
            Final => "final",
            Abstract => "abstract",
            Native => "native",
            Synchronized => "synchronized",
            Transient => "transient",
            Volatile => "volatile",
            Strictfp => "strictfp",
            Deprecated => "@Deprecated",
            Synthetic => "synthetic",
        }
    }
}

const ALL_MODIFIERS: [Modifier; 13] = [
    Modifier::Public,
    Modifier::Protected,
    Modifier::Private,
    Modifier::Static,
    Modifier::Final,
    Modifier::Abstract,
    Modifier::Native,
    Modifier::Synchronized,
    Modifier::Transient,
    Modifier::Volatile,
    Modifier::Strictfp,
    Modifier::Deprecated,
    Modifier::Synthetic,
];

#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    bits: u16,
}

impl Modifiers {
    pub fn new(modifiers: &[Modifier]) -> Self {
        modifiers
            .iter()
            .fold(Modifiers::default(), |acc, modifier| acc.with(*modifier))
    }

    pub fn with(self, modifier: Modifier) -> Self {
        Modifiers {
            bits: self.bits | modifier.bit(),
        }
    }

    pub fn without(self, modifier: Modifier) -> Self {
        Modifiers {
            bits: self.bits & !modifier.bit(),
        }
    }

    pub fn has(self, modifier: Modifier) -> bool {
        self.bits & modifier.bit() != 0
    }

    pub fn is_public(self) -> bool {
        self.has(Modifier::Public)
    }

    pub fn is_protected(self) -> bool {
        self.has(Modifier::Protected)
    }

    pub fn is_private(self) -> bool {
        self.has(Modifier::Private)
    }

    pub fn is_static(self) -> bool {
        self.has(Modifier::Static)
    }

    pub fn is_final(self) -> bool {
        self.has(Modifier::Final)
    }

    pub fn is_abstract(self) -> bool {
        self.has(Modifier::Abstract)
    }

    pub fn iter(self) -> impl Iterator<Item = Modifier> {
        ALL_MODIFIERS
            .iter()
            .cloned()
            .filter(move |modifier| self.has(*modifier))
    }
}

impl fmt::Debug for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keywords = self.iter().map(Modifier::keyword).collect::<Vec<_>>();
        write!(f, "{}", keywords.join(" "))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Display)]
pub enum ClassKind {
    Class,
    Interface,
}

/// A class or interface declaration. Nested member classes, local classes
/// and anonymous class bodies use the same node.
#[derive(Debug, Clone)]
pub struct ClassDeclaration {
    pub kind: ClassKind,
    /// empty for anonymous classes
    pub name: Spanned<Symbol>,
    pub modifiers: Modifiers,
    pub superclass: Option<Spanned<TypeRef>>,
    pub interfaces: Vec<Spanned<TypeRef>>,
    pub members: Vec<Spanned<ClassMember>>,
    /// set when the class is registered in the class table
    pub id: Option<ClassId>,
}

/// A class member. Constructors are named like their class, initializer
/// blocks have an empty name.
#[derive(Debug, Clone)]
pub struct ClassMember {
    pub kind: ClassMemberKind,
    pub name: Symbol,
    pub modifiers: Modifiers,
}

#[derive(EnumDiscriminants, Debug, Clone)]
#[strum_discriminants(derive(Display, Hash))]
pub enum ClassMemberKind {
    Field(FieldDecl),
    Method(MethodDecl),
    Constructor(MethodDecl),
    /// instance or (with the `static` modifier) static initializer block
    Initializer(Spanned<Block>),
    Class(Box<ClassDeclaration>),
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub ty: Spanned<TypeRef>,
    pub initializer: Option<Box<Spanned<Expr>>>,
    pub field: Option<FieldRef>,
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    /// `void` for constructors
    pub return_ty: Spanned<TypeRef>,
    pub params: Vec<Spanned<Parameter>>,
    pub throws: Vec<Spanned<TypeRef>>,
    /// `None` for abstract and native methods
    pub body: Option<Spanned<Block>>,
    pub method: Option<MethodRef>,
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub ty: Spanned<TypeRef>,
    pub name: Spanned<Symbol>,
    pub is_final: bool,
}

/// A type as written in the source. `resolved` is filled by the analysis.
#[derive(Debug, Clone)]
pub struct TypeRef {
    pub basic: Spanned<BasicType>,
    /// Depth of the array type (number of `[]`)
    pub array_depth: usize,
    pub resolved: Option<Type>,
}

impl TypeRef {
    pub fn new(basic: Spanned<BasicType>, array_depth: usize) -> Self {
        TypeRef {
            basic,
            array_depth,
            resolved: None,
        }
    }

    /// A type slot that is already resolved, for compiler generated code.
    pub fn resolved(ty: Type, span: Span) -> Self {
        let (_, array_depth) = ty.innermost();
        TypeRef {
            basic: Spanned::new(span, BasicType::Resolved),
            array_depth,
            resolved: Some(ty),
        }
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.basic == other.basic && self.array_depth == other.array_depth
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.resolved, &self.basic.data) {
            (Some(ty), _) if ty.is_resolved() => write!(f, "{}", ty),
            (_, basic) => write!(f, "{}{}", basic, "[]".repeat(self.array_depth)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BasicType {
    Primitive(PrimitiveKind),
    Void,
    Named(QualifiedName),
    /// generated by the compiler, `TypeRef::resolved` holds the type
    Resolved,
}

impl fmt::Display for BasicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BasicType::Primitive(kind) => write!(f, "{}", kind),
            BasicType::Void => write!(f, "void"),
            BasicType::Named(name) => write!(f, "{}", name),
            BasicType::Resolved => write!(f, "<synthetic>"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Block {
    pub statements: Vec<Spanned<Stmt>>,
}

/// Reachability facts computed by the exception flow checker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlowFacts {
    pub reachable: Option<bool>,
    pub completes_normally: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub facts: FlowFacts,
}

impl From<StmtKind> for Stmt {
    fn from(kind: StmtKind) -> Self {
        Stmt {
            kind,
            facts: FlowFacts::default(),
        }
    }
}

#[derive(EnumDiscriminants, Debug, Clone)]
#[strum_discriminants(derive(Display))]
pub enum StmtKind {
    Block(Block),
    Empty,
    LocalVariableDeclaration(Box<LocalVariable>),
    LocalClass(Box<ClassDeclaration>),
    Expression(Box<Spanned<Expr>>),
    If(
        Box<Spanned<Expr>>,
        Box<Spanned<Stmt>>,
        Option<Box<Spanned<Stmt>>>,
    ),
    While(Box<Spanned<Expr>>, Box<Spanned<Stmt>>),
    DoWhile(Box<Spanned<Stmt>>, Box<Spanned<Expr>>),
    For(Box<ForLoop>),
    Labeled(Spanned<Symbol>, Box<Spanned<Stmt>>),
    Break(Option<Spanned<Symbol>>),
    Continue(Option<Spanned<Symbol>>),
    Return(Option<Box<Spanned<Expr>>>),
    Throw(Box<Spanned<Expr>>),
    Try(Box<TryStmt>),
    Switch(Box<Spanned<Expr>>, Vec<Spanned<SwitchGroup>>),
    Synchronized(Box<Spanned<Expr>>, Spanned<Block>),
    /// `this(..)` or `super(..)` as first statement of a constructor
    ConstructorCall(Box<ConstructorCall>),
}

#[derive(Debug, Clone)]
pub struct LocalVariable {
    pub ty: Spanned<TypeRef>,
    pub name: Spanned<Symbol>,
    pub init: Option<Spanned<Expr>>,
    pub is_final: bool,
}

#[derive(Debug, Clone)]
pub struct ForLoop {
    pub init: Vec<Spanned<Stmt>>,
    pub cond: Option<Spanned<Expr>>,
    pub update: Vec<Spanned<Expr>>,
    pub body: Spanned<Stmt>,
}

#[derive(Debug, Clone)]
pub struct TryStmt {
    pub body: Spanned<Block>,
    pub catches: Vec<Spanned<CatchClause>>,
    pub finally: Option<Spanned<Block>>,
}

#[derive(Debug, Clone)]
pub struct CatchClause {
    pub param: Spanned<Parameter>,
    pub body: Spanned<Block>,
}

/// Statements following one or more `case`/`default` labels.
#[derive(Debug, Clone)]
pub struct SwitchGroup {
    pub labels: Vec<Spanned<SwitchLabel>>,
    pub statements: Vec<Spanned<Stmt>>,
}

#[derive(Debug, Clone)]
pub enum SwitchLabel {
    Case(Spanned<Expr>),
    Default,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Display)]
pub enum ConstructorCallKind {
    This,
    Super,
}

#[derive(Debug, Clone)]
pub struct ConstructorCall {
    pub kind: ConstructorCallKind,
    /// `outer.super(..)` as written, or the enclosing instance passed on by
    /// the analysis
    pub outer: Option<Box<Spanned<Expr>>>,
    pub args: Vec<Spanned<Expr>>,
    /// values of captured locals, appended by the analysis
    pub captured_args: Vec<Spanned<Expr>>,
    pub ctor: Option<MethodRef>,
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    /// filled by the analysis
    pub ty: Option<Type>,
}

impl From<ExprKind> for Expr {
    fn from(kind: ExprKind) -> Self {
        Expr { kind, ty: None }
    }
}

impl Expr {
    pub fn typed(kind: ExprKind, ty: Type) -> Self {
        Expr { kind, ty: Some(ty) }
    }
}

#[derive(EnumDiscriminants, Debug, Clone)]
#[strum_discriminants(derive(Display))]
pub enum ExprKind {
    Literal(Literal),
    /// Unresolved identifier chain `a.b.c`; the analysis replaces it by one
    /// of the concrete variants below.
    Name(QualifiedName),
    /// local variable or parameter
    Local(Symbol),
    /// `this`, or `Outer.this` before resolution
    This(Option<QualifiedName>),
    /// `super` or `Outer.super`, only valid as target of a field access or
    /// method call
    Super(Option<QualifiedName>),
    /// a type used as qualifier of a static member access
    TypeName(Type),
    FieldAccess(Box<Spanned<Expr>>, Spanned<Symbol>, Option<FieldRef>),
    /// `array.length`
    ArrayLength(Box<Spanned<Expr>>),
    MethodCall(Box<MethodCall>),
    NewObject(Box<NewObject>),
    NewArray(Box<NewArray>),
    /// `{ a, b }` in a variable initializer, typed by its context
    ArrayInitializer(Vec<Spanned<Expr>>),
    ArrayAccess(Box<Spanned<Expr>>, Box<Spanned<Expr>>),
    Unary(UnaryOp, Box<Spanned<Expr>>),
    Binary(BinaryOp, Box<Spanned<Expr>>, Box<Spanned<Expr>>),
    /// `lhs = rhs`, or `lhs op= rhs`
    Assign(Option<BinaryOp>, Box<Spanned<Expr>>, Box<Spanned<Expr>>),
    Conditional(Box<Spanned<Expr>>, Box<Spanned<Expr>>, Box<Spanned<Expr>>),
    Cast(Spanned<TypeRef>, Box<Spanned<Expr>>),
    InstanceOf(Box<Spanned<Expr>>, Spanned<TypeRef>),
    /// a cast that code generation checks at runtime
    RuntimeCheckedCast(Box<Spanned<Expr>>, Type),
    /// replaces an erroneous expression
    Error,
}

#[derive(Debug, Clone)]
pub struct MethodCall {
    /// `None` for unqualified calls
    pub target: Option<Spanned<Expr>>,
    pub name: Spanned<Symbol>,
    pub args: Vec<Spanned<Expr>>,
    pub method: Option<MethodRef>,
}

#[derive(Debug, Clone)]
pub struct NewObject {
    pub class: Spanned<TypeRef>,
    /// `outer.new Inner()` as written, or the enclosing instance supplied by
    /// the analysis
    pub outer: Option<Spanned<Expr>>,
    pub args: Vec<Spanned<Expr>>,
    /// body of an anonymous class
    pub body: Option<ClassDeclaration>,
    pub ctor: Option<MethodRef>,
    /// values of captured locals, appended by the analysis
    pub captured_args: Vec<Spanned<Expr>>,
}

#[derive(Debug, Clone)]
pub struct NewArray {
    pub element: Spanned<TypeRef>,
    /// sized dimensions `new int[a][b]`
    pub dims: Vec<Spanned<Expr>>,
    /// unsized trailing dimensions `new int[a][]`
    pub extra_dims: usize,
    pub init: Option<Vec<Spanned<Expr>>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(u16),
    Boolean(bool),
    String(String),
    Null,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Display)]
pub enum UnaryOp {
    Plus,
    Neg,
    BitNot,
    Not,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

impl UnaryOp {
    pub fn is_increment(self) -> bool {
        use self::UnaryOp::*;
        match self {
            PreIncrement | PreDecrement | PostIncrement | PostDecrement => true,
            Plus | Neg | BitNot | Not => false,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Display)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    UShr,
    LessThan,
    GreaterThan,
    LessEquals,
    GreaterEquals,
    Equals,
    NotEquals,
    BitAnd,
    BitOr,
    BitXor,
    LogicalAnd,
    LogicalOr,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        use self::BinaryOp::*;
        match self {
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Mod => "%",
            Shl => "<<",
            Shr => ">>",
            UShr => ">>>",
            LessThan => "<",
            GreaterThan => ">",
            LessEquals => "<=",
            GreaterEquals => ">=",
            Equals => "==",
            NotEquals => "!=",
            BitAnd => "&",
            BitOr => "|",
            BitXor => "^",
            LogicalAnd => "&&",
            LogicalOr => "||",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifiers_are_a_set() {
        let mods = Modifiers::new(&[Modifier::Private, Modifier::Final, Modifier::Private]);
        assert!(mods.is_private());
        assert!(mods.is_final());
        assert!(!mods.is_static());
        assert_eq!("private final", mods.to_string());
        assert!(!mods.without(Modifier::Final).is_final());
    }

    #[test]
    fn qualified_names_print_dotted() {
        let name = QualifiedName {
            segments: ["a", "b", "C"]
                .iter()
                .map(|s| Spanned::new(Span::default(), Symbol::from(*s)))
                .collect(),
        };
        assert_eq!("a.b.C", name.to_string());
        assert_eq!("a.b", name.prefix().to_string());
        assert_eq!("a.b", name.join(2));
        assert!(!name.is_simple());
    }
}
