use failure::Fail;

/// The kind of declaration that requested a type, used to name the offending
/// declaration when the type cannot be resolved.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Display)]
pub enum ReferenceKind {
    #[display(fmt = "superclass")]
    Superclass,
    #[display(fmt = "interface")]
    Interface,
    #[display(fmt = "field type")]
    FieldType,
    #[display(fmt = "parameter type")]
    ParameterType,
    #[display(fmt = "return type")]
    ReturnType,
    #[display(fmt = "thrown type")]
    ThrownType,
    #[display(fmt = "local variable type")]
    LocalVariableType,
    #[display(fmt = "anonymous class base")]
    AnonymousClassBase,
    /// casts, `instanceof`, `new`, catch parameters and qualifiers
    #[display(fmt = "type")]
    TypeUse,
}

/// Formats the "did you mean" suffix of a resolution error.
pub fn hint(candidate: Option<&str>) -> String {
    match candidate {
        Some(candidate) => format!(", did you mean '{}'?", candidate),
        None => String::new(),
    }
}

#[derive(Debug, Fail)]
pub enum SemanticError {
    // declarations
    #[fail(display = "redefinition of {} '{}'", kind, name)]
    RedefinitionError {
        kind: String, // "class", "parameter", ...
        name: String,
    },
    #[fail(display = "malformed declaration: {}", reason)]
    MalformedDeclaration { reason: String },
    #[fail(display = "cyclic inheritance involving '{}'", class)]
    CyclicInheritance { class: String },
    #[fail(display = "cannot inherit from final class '{}'", superclass)]
    ExtendsFinalClass { superclass: String },
    #[fail(display = "class '{}' cannot extend interface '{}'", class, name)]
    ExtendsInterface { class: String, name: String },
    #[fail(display = "'{}' is not an interface", name)]
    NotAnInterface { name: String },
    #[fail(
        display = "class '{}' is not abstract and declares abstract method '{}'",
        class, method
    )]
    AbstractMethodInConcreteClass { class: String, method: String },
    #[fail(display = "method '{}' is missing a body", name)]
    MissingMethodBody { name: String },
    #[fail(display = "abstract method '{}' cannot have a body", name)]
    AbstractMethodWithBody { name: String },
    #[fail(display = "'{}' is abstract; cannot be instantiated", class)]
    InstantiateAbstract { class: String },
    #[fail(display = "'void' is not allowed here")]
    VoidNotAllowed,

    // resolution
    #[fail(display = "cannot resolve {} '{}'{}", kind, name, hint)]
    UnresolvedType {
        kind: ReferenceKind,
        name: String,
        hint: String,
    },
    #[fail(
        display = "reference to '{}' is ambiguous, both {} match",
        name, candidates
    )]
    AmbiguousType { name: String, candidates: String },
    #[fail(display = "cannot resolve '{}' in '{}'{}", segment, chain, hint)]
    UnresolvedName {
        chain: String,
        segment: String,
        hint: String,
    },
    #[fail(display = "package '{}' cannot be used as a value", name)]
    PackageUsedAsValue { name: String },
    #[fail(display = "type '{}' cannot be used as a value", name)]
    TypeUsedAsValue { name: String },
    #[fail(display = "'{}' is not an enclosing class", name)]
    NotAnEnclosingClass { name: String },
    #[fail(display = "field '{}' does not exist on type '{}'{}", field, ty, hint)]
    FieldDoesNotExist {
        field: String,
        ty: String,
        hint: String,
    },
    #[fail(display = "cannot index a non-array type '{}'", ty)]
    CannotIndexNonArray { ty: String },
    #[fail(display = "'{}' is not a class type", ty)]
    NotAClassType { ty: String },

    // conversions
    #[fail(display = "incompatible types: '{}' cannot be converted to '{}'", from, to)]
    IncompatibleTypes { from: String, to: String },
    #[fail(display = "possible lossy conversion from '{}' to '{}'", from, to)]
    LossyConversion { from: String, to: String },
    #[fail(display = "'{}' cannot be cast to '{}'", from, to)]
    InvalidCast { from: String, to: String },
    #[fail(
        display = "operator '{}' cannot be applied to '{}' and '{}'",
        op, lhs, rhs
    )]
    InvalidOperandTypes { op: String, lhs: String, rhs: String },
    #[fail(display = "operator '{}' cannot be applied to '{}'", op, ty)]
    InvalidOperandType { op: String, ty: String },
    #[fail(display = "condition must be of type boolean, found '{}'", ty)]
    ConditionMustBeBoolean { ty: String },
    #[fail(display = "a void expression cannot be used as a value")]
    VoidValue,
    #[fail(display = "the left-hand side of an assignment must be a variable")]
    NotAnLvalue,
    #[fail(display = "cannot assign a value to final variable '{}'", name)]
    AssignToFinal { name: String },
    #[fail(display = "not a statement")]
    NotAStatement,
    #[fail(display = "array initializer used for non-array type '{}'", ty)]
    ArrayInitializerForNonArray { ty: String },
    #[fail(display = "switch on type '{}' is not supported", ty)]
    InvalidSwitchType { ty: String },
    #[fail(display = "case label must be a constant expression")]
    CaseNotConstant,
    #[fail(display = "duplicate case label '{}'", label)]
    DuplicateCaseLabel { label: String },
    #[fail(display = "duplicate default label")]
    DuplicateDefaultLabel,
    #[fail(display = "'{}' is not a subclass of Throwable", ty)]
    NotThrowable { ty: String },

    // overloads
    #[fail(
        display = "no matching {} '{}' for arguments ({}){}",
        kind, name, args, candidates
    )]
    NoMatchingMember {
        kind: String,
        name: String,
        args: String,
        candidates: String,
    },
    #[fail(display = "call to '{}' is ambiguous, candidates: {}", name, candidates)]
    AmbiguousCall { name: String, candidates: String },

    // access
    #[fail(display = "{} '{}' is not accessible from '{}'", kind, name, from)]
    NotAccessible {
        kind: String,
        name: String,
        from: String,
    },

    // static context and constructors
    #[fail(
        display = "non-static {} '{}' cannot be referenced from a static context",
        kind, name
    )]
    StaticContext { kind: String, name: String },
    #[fail(display = "non-static variable 'this' cannot be referenced from a static context")]
    ThisInStaticContext,
    #[fail(display = "cannot reference {} before supertype constructor has been called", what)]
    BeforeSuperCall { what: String },
    #[fail(display = "call to {} must be first statement in constructor", kind)]
    ConstructorCallNotFirst { kind: String },
    #[fail(display = "'super' can only be used to access members")]
    SuperAsValue,

    // exception flow
    #[fail(
        display = "unreported exception '{}'; must be caught or declared to be thrown",
        ty
    )]
    UnreportedException { ty: String },
    #[fail(
        display = "initializer may throw '{}' which is not declared by every constructor of '{}'",
        ty, class
    )]
    InitializerException { ty: String, class: String },
    #[fail(display = "unreachable statement")]
    UnreachableStatement,
    #[fail(display = "method '{}' might not return", method_name)]
    MightNotReturn { method_name: String },
    #[fail(display = "break outside switch or loop")]
    BreakOutsideLoop,
    #[fail(display = "continue outside of loop")]
    ContinueOutsideLoop,
    #[fail(display = "undefined label '{}'", label)]
    UndefinedLabel { label: String },
    #[fail(display = "cannot return a value from a method with void result type")]
    ReturnValueInVoid,
    #[fail(display = "missing return value")]
    MissingReturnValue,
    #[fail(display = "return outside of a method body")]
    ReturnInInitializer,

    // nesting
    #[fail(display = "no enclosing instance of type '{}' is in scope", ty)]
    NoEnclosingInstance { ty: String },
    #[fail(
        display = "local variable '{}' is accessed from an inner class; needs to be declared final",
        name
    )]
    CaptureOfNonFinal { name: String },
    #[fail(display = "qualified new of static class '{}'", ty)]
    QualifiedNewOfStaticClass { ty: String },

    // lints
    #[fail(display = "{} '{}' is deprecated", kind, name)]
    DeprecatedUse { kind: String, name: String },
    #[fail(display = "constant {} narrowed to '{}'", value, to)]
    ConstantNarrowing { value: String, to: String },
}
