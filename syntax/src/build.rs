//! Constructors for syntax trees.
//!
//! The analysis uses these to synthesize code (accessors, constructors),
//! tests use them in place of a parser. Nodes get an empty span unless one is
//! set with `at`.
use crate::{ast::*, types::PrimitiveKind};
use asciifile::{Span, Spanned};
use strtab::Symbol;

fn spanned<T>(data: T) -> Spanned<T> {
    Spanned::new(Span::default(), data)
}

/// Moves a node to the given byte range.
pub fn at<T>(mut node: Spanned<T>, start: usize, end: usize) -> Spanned<T> {
    node.span = Span::new(start, end);
    node
}

pub fn sym(name: &str) -> Spanned<Symbol> {
    spanned(Symbol::from(name))
}

pub fn qname(name: &str) -> QualifiedName {
    QualifiedName {
        segments: name.split('.').map(sym).collect(),
    }
}

pub fn mods(modifiers: &[Modifier]) -> Modifiers {
    Modifiers::new(modifiers)
}

pub fn primitive_kind(name: &str) -> Option<PrimitiveKind> {
    use crate::types::PrimitiveKind::*;
    Some(match name {
        "boolean" => Boolean,
        "byte" => Byte,
        "short" => Short,
        "char" => Char,
        "int" => Int,
        "long" => Long,
        "float" => Float,
        "double" => Double,
        _ => return None,
    })
}

/// Parses a type as written in source, e.g. `int`, `String[]`, `java.io.File`.
pub fn ty(text: &str) -> Spanned<TypeRef> {
    let text = text.trim();
    let array_depth = text.matches("[]").count();
    let base = text.trim_end_matches("[]").trim_end();
    let basic = match (base, primitive_kind(base)) {
        ("void", _) => BasicType::Void,
        (_, Some(kind)) => BasicType::Primitive(kind),
        (name, None) => BasicType::Named(qname(name)),
    };
    spanned(TypeRef::new(spanned(basic), array_depth))
}

fn expr(kind: ExprKind) -> Spanned<Expr> {
    spanned(Expr::from(kind))
}

pub fn int(value: i32) -> Spanned<Expr> {
    expr(ExprKind::Literal(Literal::Int(value)))
}

pub fn long(value: i64) -> Spanned<Expr> {
    expr(ExprKind::Literal(Literal::Long(value)))
}

pub fn double(value: f64) -> Spanned<Expr> {
    expr(ExprKind::Literal(Literal::Double(value)))
}

pub fn char_lit(value: char) -> Spanned<Expr> {
    expr(ExprKind::Literal(Literal::Char(value as u16)))
}

pub fn boolean(value: bool) -> Spanned<Expr> {
    expr(ExprKind::Literal(Literal::Boolean(value)))
}

pub fn string(value: &str) -> Spanned<Expr> {
    expr(ExprKind::Literal(Literal::String(value.to_string())))
}

pub fn null() -> Spanned<Expr> {
    expr(ExprKind::Literal(Literal::Null))
}

/// An unresolved (possibly dotted) name.
pub fn name(chain: &str) -> Spanned<Expr> {
    expr(ExprKind::Name(qname(chain)))
}

pub fn this() -> Spanned<Expr> {
    expr(ExprKind::This(None))
}

/// `Outer.this`
pub fn qualified_this(class: &str) -> Spanned<Expr> {
    expr(ExprKind::This(Some(qname(class))))
}

pub fn super_() -> Spanned<Expr> {
    expr(ExprKind::Super(None))
}

pub fn field(target: Spanned<Expr>, name: &str) -> Spanned<Expr> {
    expr(ExprKind::FieldAccess(Box::new(target), sym(name), None))
}

/// Unqualified call `name(args)`.
pub fn call(name: &str, args: Vec<Spanned<Expr>>) -> Spanned<Expr> {
    expr(ExprKind::MethodCall(Box::new(MethodCall {
        target: None,
        name: sym(name),
        args,
        method: None,
    })))
}

/// Qualified call `target.name(args)`.
pub fn call_on(target: Spanned<Expr>, name: &str, args: Vec<Spanned<Expr>>) -> Spanned<Expr> {
    expr(ExprKind::MethodCall(Box::new(MethodCall {
        target: Some(target),
        name: sym(name),
        args,
        method: None,
    })))
}

fn new_object_with(
    class: &str,
    outer: Option<Spanned<Expr>>,
    args: Vec<Spanned<Expr>>,
    body: Option<ClassDeclaration>,
) -> Spanned<Expr> {
    expr(ExprKind::NewObject(Box::new(NewObject {
        class: ty(class),
        outer,
        args,
        body,
        ctor: None,
        captured_args: vec![],
    })))
}

pub fn new_object(class: &str, args: Vec<Spanned<Expr>>) -> Spanned<Expr> {
    new_object_with(class, None, args, None)
}

/// `outer.new Inner(args)`
pub fn qualified_new(outer: Spanned<Expr>, class: &str, args: Vec<Spanned<Expr>>) -> Spanned<Expr> {
    new_object_with(class, Some(outer), args, None)
}

/// `new Base(args) { members }`
pub fn new_anonymous(
    base: &str,
    args: Vec<Spanned<Expr>>,
    members: Vec<Spanned<ClassMember>>,
) -> Spanned<Expr> {
    let body = ClassDeclaration {
        kind: ClassKind::Class,
        name: sym(""),
        modifiers: Modifiers::default(),
        superclass: None,
        interfaces: vec![],
        members,
        id: None,
    };
    new_object_with(base, None, args, Some(body))
}

/// `new element[d1][d2]` followed by `extra_dims` times `[]`
pub fn new_array(element: &str, dims: Vec<Spanned<Expr>>, extra_dims: usize) -> Spanned<Expr> {
    expr(ExprKind::NewArray(Box::new(NewArray {
        element: ty(element),
        dims,
        extra_dims,
        init: None,
    })))
}

/// `{ a, b, c }` in a variable initializer
pub fn array_init(elements: Vec<Spanned<Expr>>) -> Spanned<Expr> {
    expr(ExprKind::ArrayInitializer(elements))
}

pub fn index(array: Spanned<Expr>, index: Spanned<Expr>) -> Spanned<Expr> {
    expr(ExprKind::ArrayAccess(Box::new(array), Box::new(index)))
}

pub fn unary(op: UnaryOp, operand: Spanned<Expr>) -> Spanned<Expr> {
    expr(ExprKind::Unary(op, Box::new(operand)))
}

pub fn binary(op: BinaryOp, lhs: Spanned<Expr>, rhs: Spanned<Expr>) -> Spanned<Expr> {
    expr(ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)))
}

pub fn assign(lhs: Spanned<Expr>, rhs: Spanned<Expr>) -> Spanned<Expr> {
    expr(ExprKind::Assign(None, Box::new(lhs), Box::new(rhs)))
}

pub fn compound_assign(op: BinaryOp, lhs: Spanned<Expr>, rhs: Spanned<Expr>) -> Spanned<Expr> {
    expr(ExprKind::Assign(Some(op), Box::new(lhs), Box::new(rhs)))
}

pub fn conditional(
    cond: Spanned<Expr>,
    then_expr: Spanned<Expr>,
    else_expr: Spanned<Expr>,
) -> Spanned<Expr> {
    expr(ExprKind::Conditional(
        Box::new(cond),
        Box::new(then_expr),
        Box::new(else_expr),
    ))
}

pub fn cast(target: &str, operand: Spanned<Expr>) -> Spanned<Expr> {
    expr(ExprKind::Cast(ty(target), Box::new(operand)))
}

pub fn instance_of(operand: Spanned<Expr>, target: &str) -> Spanned<Expr> {
    expr(ExprKind::InstanceOf(Box::new(operand), ty(target)))
}

fn stmt(kind: StmtKind) -> Spanned<Stmt> {
    spanned(Stmt::from(kind))
}

pub fn block(statements: Vec<Spanned<Stmt>>) -> Spanned<Block> {
    spanned(Block { statements })
}

pub fn block_stmt(statements: Vec<Spanned<Stmt>>) -> Spanned<Stmt> {
    stmt(StmtKind::Block(Block { statements }))
}

pub fn empty() -> Spanned<Stmt> {
    stmt(StmtKind::Empty)
}

fn local(
    ty: Spanned<TypeRef>,
    name: &str,
    init: Option<Spanned<Expr>>,
    is_final: bool,
) -> Spanned<Stmt> {
    stmt(StmtKind::LocalVariableDeclaration(Box::new(LocalVariable {
        ty,
        name: sym(name),
        init,
        is_final,
    })))
}

pub fn local_var(ty: Spanned<TypeRef>, name: &str, init: Option<Spanned<Expr>>) -> Spanned<Stmt> {
    local(ty, name, init, false)
}

pub fn final_local(ty: Spanned<TypeRef>, name: &str, init: Option<Spanned<Expr>>) -> Spanned<Stmt> {
    local(ty, name, init, true)
}

pub fn local_class(decl: ClassDeclaration) -> Spanned<Stmt> {
    stmt(StmtKind::LocalClass(Box::new(decl)))
}

pub fn expr_stmt(expr: Spanned<Expr>) -> Spanned<Stmt> {
    let span = expr.span;
    Spanned::new(span, Stmt::from(StmtKind::Expression(Box::new(expr))))
}

pub fn if_stmt(
    cond: Spanned<Expr>,
    then_branch: Spanned<Stmt>,
    else_branch: Option<Spanned<Stmt>>,
) -> Spanned<Stmt> {
    stmt(StmtKind::If(
        Box::new(cond),
        Box::new(then_branch),
        else_branch.map(Box::new),
    ))
}

pub fn while_stmt(cond: Spanned<Expr>, body: Spanned<Stmt>) -> Spanned<Stmt> {
    stmt(StmtKind::While(Box::new(cond), Box::new(body)))
}

pub fn do_while(body: Spanned<Stmt>, cond: Spanned<Expr>) -> Spanned<Stmt> {
    stmt(StmtKind::DoWhile(Box::new(body), Box::new(cond)))
}

pub fn for_stmt(
    init: Vec<Spanned<Stmt>>,
    cond: Option<Spanned<Expr>>,
    update: Vec<Spanned<Expr>>,
    body: Spanned<Stmt>,
) -> Spanned<Stmt> {
    stmt(StmtKind::For(Box::new(ForLoop {
        init,
        cond,
        update,
        body,
    })))
}

pub fn labeled(label: &str, body: Spanned<Stmt>) -> Spanned<Stmt> {
    stmt(StmtKind::Labeled(sym(label), Box::new(body)))
}

pub fn break_stmt(label: Option<&str>) -> Spanned<Stmt> {
    stmt(StmtKind::Break(label.map(sym)))
}

pub fn continue_stmt(label: Option<&str>) -> Spanned<Stmt> {
    stmt(StmtKind::Continue(label.map(sym)))
}

pub fn return_stmt(value: Option<Spanned<Expr>>) -> Spanned<Stmt> {
    stmt(StmtKind::Return(value.map(Box::new)))
}

pub fn throw_stmt(value: Spanned<Expr>) -> Spanned<Stmt> {
    stmt(StmtKind::Throw(Box::new(value)))
}

/// A catch clause `catch (ty name) body`
pub fn catch(ty: Spanned<TypeRef>, name: &str, body: Spanned<Block>) -> Spanned<CatchClause> {
    spanned(CatchClause {
        param: param(ty, name),
        body,
    })
}

pub fn try_stmt(
    body: Spanned<Block>,
    catches: Vec<Spanned<CatchClause>>,
    finally: Option<Spanned<Block>>,
) -> Spanned<Stmt> {
    stmt(StmtKind::Try(Box::new(TryStmt {
        body,
        catches,
        finally,
    })))
}

/// A switch group; `None` labels stand for `default`.
pub fn switch_group(
    labels: Vec<Option<Spanned<Expr>>>,
    statements: Vec<Spanned<Stmt>>,
) -> Spanned<SwitchGroup> {
    spanned(SwitchGroup {
        labels: labels
            .into_iter()
            .map(|label| {
                spanned(match label {
                    Some(value) => SwitchLabel::Case(value),
                    None => SwitchLabel::Default,
                })
            })
            .collect(),
        statements,
    })
}

pub fn switch_stmt(scrutinee: Spanned<Expr>, groups: Vec<Spanned<SwitchGroup>>) -> Spanned<Stmt> {
    stmt(StmtKind::Switch(Box::new(scrutinee), groups))
}

fn ctor_call(kind: ConstructorCallKind, outer: Option<Spanned<Expr>>, args: Vec<Spanned<Expr>>) -> Spanned<Stmt> {
    stmt(StmtKind::ConstructorCall(Box::new(ConstructorCall {
        kind,
        outer: outer.map(Box::new),
        args,
        captured_args: vec![],
        ctor: None,
    })))
}

pub fn super_call(args: Vec<Spanned<Expr>>) -> Spanned<Stmt> {
    ctor_call(ConstructorCallKind::Super, None, args)
}

/// `outer.super(args)`
pub fn qualified_super_call(outer: Spanned<Expr>, args: Vec<Spanned<Expr>>) -> Spanned<Stmt> {
    ctor_call(ConstructorCallKind::Super, Some(outer), args)
}

pub fn this_call(args: Vec<Spanned<Expr>>) -> Spanned<Stmt> {
    ctor_call(ConstructorCallKind::This, None, args)
}

pub fn param(ty: Spanned<TypeRef>, name: &str) -> Spanned<Parameter> {
    spanned(Parameter {
        ty,
        name: sym(name),
        is_final: false,
    })
}

pub fn final_param(ty: Spanned<TypeRef>, name: &str) -> Spanned<Parameter> {
    spanned(Parameter {
        ty,
        name: sym(name),
        is_final: true,
    })
}

fn member(kind: ClassMemberKind, name: &str, modifiers: Modifiers) -> Spanned<ClassMember> {
    spanned(ClassMember {
        kind,
        name: Symbol::from(name),
        modifiers,
    })
}

pub fn field_decl(
    modifiers: Modifiers,
    ty: Spanned<TypeRef>,
    name: &str,
    initializer: Option<Spanned<Expr>>,
) -> Spanned<ClassMember> {
    member(
        ClassMemberKind::Field(FieldDecl {
            ty,
            initializer: initializer.map(Box::new),
            field: None,
        }),
        name,
        modifiers,
    )
}

pub fn method_throws(
    modifiers: Modifiers,
    return_ty: Spanned<TypeRef>,
    name: &str,
    params: Vec<Spanned<Parameter>>,
    throws: Vec<Spanned<TypeRef>>,
    body: Option<Spanned<Block>>,
) -> Spanned<ClassMember> {
    member(
        ClassMemberKind::Method(MethodDecl {
            return_ty,
            params,
            throws,
            body,
            method: None,
        }),
        name,
        modifiers,
    )
}

pub fn method(
    modifiers: Modifiers,
    return_ty: Spanned<TypeRef>,
    name: &str,
    params: Vec<Spanned<Parameter>>,
    body: Option<Spanned<Block>>,
) -> Spanned<ClassMember> {
    method_throws(modifiers, return_ty, name, params, vec![], body)
}

pub fn ctor_throws(
    modifiers: Modifiers,
    class: &str,
    params: Vec<Spanned<Parameter>>,
    throws: Vec<Spanned<TypeRef>>,
    body: Spanned<Block>,
) -> Spanned<ClassMember> {
    member(
        ClassMemberKind::Constructor(MethodDecl {
            return_ty: ty("void"),
            params,
            throws,
            body: Some(body),
            method: None,
        }),
        class,
        modifiers,
    )
}

pub fn ctor(
    modifiers: Modifiers,
    class: &str,
    params: Vec<Spanned<Parameter>>,
    body: Spanned<Block>,
) -> Spanned<ClassMember> {
    ctor_throws(modifiers, class, params, vec![], body)
}

pub fn initializer(is_static: bool, body: Spanned<Block>) -> Spanned<ClassMember> {
    let modifiers = if is_static {
        mods(&[Modifier::Static])
    } else {
        Modifiers::default()
    };
    member(ClassMemberKind::Initializer(body), "", modifiers)
}

pub fn member_class(decl: ClassDeclaration) -> Spanned<ClassMember> {
    let name = decl.name.data.clone();
    let modifiers = decl.modifiers;
    spanned(ClassMember {
        kind: ClassMemberKind::Class(Box::new(decl)),
        name,
        modifiers,
    })
}

pub fn class(name: &str, members: Vec<Spanned<ClassMember>>) -> ClassDeclaration {
    ClassDeclaration {
        kind: ClassKind::Class,
        name: sym(name),
        modifiers: Modifiers::default(),
        superclass: None,
        interfaces: vec![],
        members,
        id: None,
    }
}

pub fn interface(name: &str, members: Vec<Spanned<ClassMember>>) -> ClassDeclaration {
    ClassDeclaration {
        kind: ClassKind::Interface,
        ..class(name, members)
    }
}

impl ClassDeclaration {
    pub fn with_modifiers(mut self, modifiers: &[Modifier]) -> Self {
        self.modifiers = Modifiers::new(modifiers);
        self
    }

    pub fn extends(mut self, superclass: &str) -> Self {
        self.superclass = Some(ty(superclass));
        self
    }

    pub fn implements(mut self, interface: &str) -> Self {
        self.interfaces.push(ty(interface));
        self
    }

    pub fn spanned(self) -> Spanned<ClassDeclaration> {
        spanned(self)
    }
}

pub fn unit(package: Option<&str>, classes: Vec<ClassDeclaration>) -> CompilationUnit {
    CompilationUnit {
        package: package.map(|package| spanned(qname(package))),
        imports: vec![],
        classes: classes.into_iter().map(spanned).collect(),
    }
}

impl CompilationUnit {
    /// `import a.b.C;`
    pub fn import(mut self, name: &str) -> Self {
        self.imports.push(spanned(Import {
            name: qname(name),
            on_demand: false,
        }));
        self
    }

    /// `import a.b.*;`
    pub fn import_on_demand(mut self, package: &str) -> Self {
        self.imports.push(spanned(Import {
            name: qname(package),
            on_demand: true,
        }));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use utils::assert_matches;

    #[test]
    fn parses_type_text() {
        let t = ty("java.lang.String[][]");
        assert_eq!(2, t.array_depth);
        assert_eq!("java.lang.String[][]", t.to_string());
        assert_matches!(&ty("int").basic.data, BasicType::Primitive(PrimitiveKind::Int));
        assert_matches!(&ty("void").basic.data, BasicType::Void);
    }

    #[test]
    fn member_classes_keep_their_modifiers() {
        let inner = class("Inner", vec![]).with_modifiers(&[Modifier::Private, Modifier::Static]);
        let member = member_class(inner);
        assert!(member.modifiers.is_static());
        assert_eq!("Inner", member.name.as_str());
    }

    #[test]
    fn at_moves_nodes() {
        let node = at(int(3), 10, 11);
        assert_eq!(Span::new(10, 11), node.span);
    }
}
