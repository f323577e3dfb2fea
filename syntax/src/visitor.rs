//! The visitor module for the syntax tree.
//!
//! The visitor is based on an enum over the node categories. `NodeKind`
//! borrows immutably, `NodeKindMut` mutably; both enumerate the direct
//! children of a node in source order.
//!
//! Example usage:
//! ```rust
//! use syntax::{visitor::NodeKind, ExprKind, build::*};
//!
//! fn count_literals(node: NodeKind<'_>, count: &mut usize) {
//!     if let NodeKind::Expr(expr) = node {
//!         if let ExprKind::Literal(_) = expr.kind {
//!             *count += 1;
//!         }
//!     }
//!     node.for_each_child(&mut |child| count_literals(child, count));
//! }
//!
//! let expr = binary(syntax::BinaryOp::Add, int(1), int(2));
//! let mut count = 0;
//! count_literals(NodeKind::Expr(&expr), &mut count);
//! assert_eq!(2, count);
//! ```
use crate::ast::*;
use asciifile::Spanned;
use strum_macros::EnumDiscriminants;

#[derive(EnumDiscriminants, Debug, Clone, Copy)]
#[strum_discriminants(derive(Display))]
pub enum NodeKind<'a> {
    ClassDeclaration(&'a ClassDeclaration),
    ClassMember(&'a Spanned<ClassMember>),
    Block(&'a Spanned<Block>),
    Stmt(&'a Spanned<Stmt>),
    Expr(&'a Spanned<Expr>),
    TypeRef(&'a Spanned<TypeRef>),
}

#[derive(Debug)]
pub enum NodeKindMut<'a> {
    ClassDeclaration(&'a mut ClassDeclaration),
    ClassMember(&'a mut Spanned<ClassMember>),
    Block(&'a mut Spanned<Block>),
    Stmt(&'a mut Spanned<Stmt>),
    Expr(&'a mut Spanned<Expr>),
    TypeRef(&'a mut Spanned<TypeRef>),
}

pub trait VisitResult {
    fn stop_visit(&self) -> bool;
}

impl VisitResult for () {
    fn stop_visit(&self) -> bool {
        false
    }
}

impl<X, E> VisitResult for Result<X, E> {
    fn stop_visit(&self) -> bool {
        self.is_err()
    }
}

/// Invoke the callback on a single child, returning early if asked to.
macro_rules! ccb {
    ($cb:ident, $child:expr) => {{
        let res = $cb($child);
        if res.stop_visit() {
            return Some(res);
        }
        Some(res)
    }};
}

/// Invoke the callback on every element of `$iter`, wrapped with `$wrap`.
macro_rules! ccb_each {
    ($cb:ident, $wrap:path, $iter:expr) => {{
        let mut ret = None;
        for n in $iter {
            let res = $cb($wrap(n));
            if res.stop_visit() {
                return Some(res);
            }
            ret = Some(res);
        }
        ret
    }};
}

/// Generates the child enumeration for both node kinds. `$r` is the
/// reference kind (`&` / `&mut`), `$node` the enum.
macro_rules! gen_for_each_child {
    ($self:ident, $cb:ident, $node:ident, $($r:tt)+) => {{
        match $self {
            $node::ClassDeclaration(decl) => {
                let mut ret = None;
                if let Some(superclass) = $($r)+ decl.superclass {
                    ret = ccb!($cb, $node::TypeRef(superclass));
                }
                ret = ccb_each!($cb, $node::TypeRef, $($r)+ decl.interfaces).or(ret);
                ccb_each!($cb, $node::ClassMember, $($r)+ decl.members).or(ret)
            }
            $node::ClassMember(member) => match $($r)+ member.data.kind {
                ClassMemberKind::Field(field) => {
                    let ret = ccb!($cb, $node::TypeRef($($r)+ field.ty));
                    match $($r)+ field.initializer {
                        Some(init) => ccb!($cb, $node::Expr(init)),
                        None => ret,
                    }
                }
                ClassMemberKind::Method(method) | ClassMemberKind::Constructor(method) => {
                    let mut ret = ccb!($cb, $node::TypeRef($($r)+ method.return_ty));
                    for param in $($r)+ method.params {
                        ret = ccb!($cb, $node::TypeRef($($r)+ param.data.ty));
                    }
                    ret = ccb_each!($cb, $node::TypeRef, $($r)+ method.throws).or(ret);
                    match $($r)+ method.body {
                        Some(body) => ccb!($cb, $node::Block(body)),
                        None => ret,
                    }
                }
                ClassMemberKind::Initializer(block) => ccb!($cb, $node::Block(block)),
                ClassMemberKind::Class(class) => ccb!($cb, $node::ClassDeclaration($($r)+ **class)),
            },
            $node::Block(block) => ccb_each!($cb, $node::Stmt, $($r)+ block.data.statements),
            $node::Stmt(stmt) => match $($r)+ stmt.data.kind {
                StmtKind::Block(block) => ccb_each!($cb, $node::Stmt, $($r)+ block.statements),
                StmtKind::Empty | StmtKind::Break(_) | StmtKind::Continue(_) => None,
                StmtKind::LocalVariableDeclaration(local) => {
                    let ret = ccb!($cb, $node::TypeRef($($r)+ local.ty));
                    match $($r)+ local.init {
                        Some(init) => ccb!($cb, $node::Expr(init)),
                        None => ret,
                    }
                }
                StmtKind::LocalClass(class) => ccb!($cb, $node::ClassDeclaration($($r)+ **class)),
                StmtKind::Expression(expr) | StmtKind::Throw(expr) => ccb!($cb, $node::Expr($($r)+ **expr)),
                StmtKind::If(cond, then_branch, else_branch) => {
                    ccb!($cb, $node::Expr($($r)+ **cond));
                    let ret = ccb!($cb, $node::Stmt($($r)+ **then_branch));
                    match else_branch {
                        Some(else_branch) => ccb!($cb, $node::Stmt($($r)+ **else_branch)),
                        None => ret,
                    }
                }
                StmtKind::While(cond, body) => {
                    ccb!($cb, $node::Expr($($r)+ **cond));
                    ccb!($cb, $node::Stmt($($r)+ **body))
                }
                StmtKind::DoWhile(body, cond) => {
                    ccb!($cb, $node::Stmt($($r)+ **body));
                    ccb!($cb, $node::Expr($($r)+ **cond))
                }
                StmtKind::For(for_loop) => {
                    ccb_each!($cb, $node::Stmt, $($r)+ for_loop.init);
                    if let Some(cond) = $($r)+ for_loop.cond {
                        ccb!($cb, $node::Expr(cond));
                    }
                    ccb_each!($cb, $node::Expr, $($r)+ for_loop.update);
                    ccb!($cb, $node::Stmt($($r)+ for_loop.body))
                }
                StmtKind::Labeled(_, body) => ccb!($cb, $node::Stmt($($r)+ **body)),
                StmtKind::Return(expr) => match expr {
                    Some(expr) => ccb!($cb, $node::Expr($($r)+ **expr)),
                    None => None,
                },
                StmtKind::Try(try_stmt) => {
                    let mut ret = ccb!($cb, $node::Block($($r)+ try_stmt.body));
                    for catch in $($r)+ try_stmt.catches {
                        ccb!($cb, $node::TypeRef($($r)+ catch.data.param.data.ty));
                        ret = ccb!($cb, $node::Block($($r)+ catch.data.body));
                    }
                    match $($r)+ try_stmt.finally {
                        Some(finally) => ccb!($cb, $node::Block(finally)),
                        None => ret,
                    }
                }
                StmtKind::Switch(scrutinee, groups) => {
                    let mut ret = ccb!($cb, $node::Expr($($r)+ **scrutinee));
                    for group in groups {
                        for label in $($r)+ group.data.labels {
                            if let SwitchLabel::Case(value) = $($r)+ label.data {
                                ccb!($cb, $node::Expr(value));
                            }
                        }
                        ret = ccb_each!($cb, $node::Stmt, $($r)+ group.data.statements).or(ret);
                    }
                    ret
                }
                StmtKind::Synchronized(lock, body) => {
                    ccb!($cb, $node::Expr($($r)+ **lock));
                    ccb!($cb, $node::Block(body))
                }
                StmtKind::ConstructorCall(call) => {
                    let mut ret = None;
                    if let Some(outer) = $($r)+ call.outer {
                        ret = ccb!($cb, $node::Expr($($r)+ **outer));
                    }
                    ret = ccb_each!($cb, $node::Expr, $($r)+ call.args).or(ret);
                    ccb_each!($cb, $node::Expr, $($r)+ call.captured_args).or(ret)
                }
            },
            $node::Expr(expr) => match $($r)+ expr.data.kind {
                ExprKind::Literal(_)
                | ExprKind::Name(_)
                | ExprKind::Local(_)
                | ExprKind::This(_)
                | ExprKind::Super(_)
                | ExprKind::TypeName(_)
                | ExprKind::Error => None,
                ExprKind::FieldAccess(target, _, _) => ccb!($cb, $node::Expr($($r)+ **target)),
                ExprKind::ArrayLength(target) => ccb!($cb, $node::Expr($($r)+ **target)),
                ExprKind::MethodCall(call) => {
                    let mut ret = None;
                    if let Some(target) = $($r)+ call.target {
                        ret = ccb!($cb, $node::Expr(target));
                    }
                    ccb_each!($cb, $node::Expr, $($r)+ call.args).or(ret)
                }
                ExprKind::NewObject(new) => {
                    let mut ret = ccb!($cb, $node::TypeRef($($r)+ new.class));
                    if let Some(outer) = $($r)+ new.outer {
                        ret = ccb!($cb, $node::Expr(outer));
                    }
                    ret = ccb_each!($cb, $node::Expr, $($r)+ new.args).or(ret);
                    ret = ccb_each!($cb, $node::Expr, $($r)+ new.captured_args).or(ret);
                    match $($r)+ new.body {
                        Some(body) => ccb!($cb, $node::ClassDeclaration(body)),
                        None => ret,
                    }
                }
                ExprKind::NewArray(new) => {
                    let mut ret = ccb!($cb, $node::TypeRef($($r)+ new.element));
                    ret = ccb_each!($cb, $node::Expr, $($r)+ new.dims).or(ret);
                    match $($r)+ new.init {
                        Some(init) => ccb_each!($cb, $node::Expr, init).or(ret),
                        None => ret,
                    }
                }
                ExprKind::ArrayInitializer(elements) => ccb_each!($cb, $node::Expr, elements),
                ExprKind::ArrayAccess(array, index) => {
                    ccb!($cb, $node::Expr($($r)+ **array));
                    ccb!($cb, $node::Expr($($r)+ **index))
                }
                ExprKind::Unary(_, operand) => ccb!($cb, $node::Expr($($r)+ **operand)),
                ExprKind::Binary(_, lhs, rhs) | ExprKind::Assign(_, lhs, rhs) => {
                    ccb!($cb, $node::Expr($($r)+ **lhs));
                    ccb!($cb, $node::Expr($($r)+ **rhs))
                }
                ExprKind::Conditional(cond, then_expr, else_expr) => {
                    ccb!($cb, $node::Expr($($r)+ **cond));
                    ccb!($cb, $node::Expr($($r)+ **then_expr));
                    ccb!($cb, $node::Expr($($r)+ **else_expr))
                }
                ExprKind::Cast(ty, expr) => {
                    ccb!($cb, $node::TypeRef(ty));
                    ccb!($cb, $node::Expr($($r)+ **expr))
                }
                ExprKind::InstanceOf(expr, ty) => {
                    ccb!($cb, $node::Expr($($r)+ **expr));
                    ccb!($cb, $node::TypeRef(ty))
                }
                ExprKind::RuntimeCheckedCast(expr, _) => ccb!($cb, $node::Expr($($r)+ **expr)),
            },
            $node::TypeRef(_) => None,
        }
    }};
}

impl<'a> NodeKind<'a> {
    /// Visit the children of `self`, invoking `cb` on each.
    /// If `self` has no children, this method returns `None`, otherwise
    /// `Some(res)` where `res` is the return value of the last `cb`.
    /// Visiting stops early once a callback result asks for it.
    #[allow(clippy::cyclomatic_complexity)]
    pub fn for_each_child<R>(self, cb: &mut dyn FnMut(NodeKind<'a>) -> R) -> Option<R>
    where
        R: VisitResult,
    {
        gen_for_each_child!(self, cb, NodeKind, &)
    }
}

impl<'a> NodeKindMut<'a> {
    /// Like `NodeKind::for_each_child`, but hands out mutable borrows.
    #[allow(clippy::cyclomatic_complexity)]
    pub fn for_each_child<R>(self, cb: &mut dyn FnMut(NodeKindMut<'a>) -> R) -> Option<R>
    where
        R: VisitResult,
    {
        gen_for_each_child!(self, cb, NodeKindMut, &mut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::*;

    fn count_exprs(node: NodeKind<'_>) -> usize {
        let own = match node {
            NodeKind::Expr(_) => 1,
            _ => 0,
        };
        let mut children = 0;
        node.for_each_child(&mut |child| children += count_exprs(child));
        own + children
    }

    #[test]
    fn visits_nested_statements() {
        let body = block(vec![
            local_var(ty("int"), "x", Some(int(1))),
            if_stmt(
                binary(BinaryOp::LessThan, name("x"), int(2)),
                expr_stmt(assign(name("x"), int(3))),
                None,
            ),
        ]);
        // 1, x < 2 (x, 2), x = 3 (x, 3)
        assert_eq!(7, count_exprs(NodeKind::Block(&body)));
    }

    #[test]
    fn stops_on_error() {
        let body = block(vec![expr_stmt(int(1)), expr_stmt(int(2))]);
        let mut seen = 0;
        let res = NodeKind::Block(&body).for_each_child(&mut |_| {
            seen += 1;
            Err::<(), ()>(())
        });
        assert_eq!(Some(Err(())), res);
        assert_eq!(1, seen);
    }

    #[test]
    fn mutable_visitor_rewrites_in_place() {
        fn retype(node: NodeKindMut<'_>) {
            match node {
                NodeKindMut::Expr(expr) => {
                    expr.data.ty = Some(crate::Type::Error);
                    NodeKindMut::Expr(expr).for_each_child(&mut |child| retype(child));
                }
                other => {
                    other.for_each_child(&mut |child| retype(child));
                }
            }
        }

        let mut body = block(vec![expr_stmt(binary(BinaryOp::Add, int(1), int(2)))]);
        retype(NodeKindMut::Block(&mut body));
        match &body.data.statements[0].data.kind {
            StmtKind::Expression(expr) => {
                assert_eq!(Some(crate::Type::Error), expr.data.ty);
                match &expr.data.kind {
                    ExprKind::Binary(_, lhs, _) => assert_eq!(Some(crate::Type::Error), lhs.data.ty),
                    other => panic!("unexpected {:?}", other),
                }
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
