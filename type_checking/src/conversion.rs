//! Conversion and promotion rules, and compile-time constants.
//!
//! Every check answers for a pair of resolved types. The error type converts
//! from and to everything so that one mistake is reported once.
use crate::type_system::ClassTable;
use asciifile::Spanned;
use std::{collections::HashSet, fmt};
use syntax::{
    BinaryOp, ClassId, Expr, ExprKind, Literal, PrimitiveKind, TypeRef, UnaryOp, Type,
};

/// Value of a compile-time constant expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Char(u16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
}

impl Constant {
    pub fn from_literal(literal: &Literal) -> Option<Constant> {
        Some(match literal {
            Literal::Int(v) => Constant::Int(*v),
            Literal::Long(v) => Constant::Long(*v),
            Literal::Float(v) => Constant::Float(*v),
            Literal::Double(v) => Constant::Double(*v),
            Literal::Char(v) => Constant::Char(*v),
            Literal::Boolean(v) => Constant::Boolean(*v),
            Literal::String(v) => Constant::String(v.clone()),
            Literal::Null => return None,
        })
    }

    /// `None` for strings.
    pub fn kind(&self) -> Option<PrimitiveKind> {
        use self::PrimitiveKind::*;
        Some(match self {
            Constant::Boolean(_) => Boolean,
            Constant::Byte(_) => Byte,
            Constant::Short(_) => Short,
            Constant::Char(_) => Char,
            Constant::Int(_) => Int,
            Constant::Long(_) => Long,
            Constant::Float(_) => Float,
            Constant::Double(_) => Double,
            Constant::String(_) => return None,
        })
    }

    fn as_i64(&self) -> Option<i64> {
        Some(match self {
            Constant::Byte(v) => i64::from(*v),
            Constant::Short(v) => i64::from(*v),
            Constant::Char(v) => i64::from(*v),
            Constant::Int(v) => i64::from(*v),
            Constant::Long(v) => *v,
            Constant::Float(v) => *v as i64,
            Constant::Double(v) => *v as i64,
            Constant::Boolean(_) | Constant::String(_) => return None,
        })
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Constant::Float(v) => Some(f64::from(*v)),
            Constant::Double(v) => Some(*v),
            Constant::Long(v) => Some(*v as f64),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Constant::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Primitive cast of a numeric constant, wrapping like the target
    /// machine does. Booleans only cast to boolean.
    pub fn cast(&self, kind: PrimitiveKind) -> Option<Constant> {
        use self::PrimitiveKind::*;
        if kind == Boolean || self.kind() == Some(Boolean) {
            return if self.kind() == Some(kind) {
                Some(self.clone())
            } else {
                None
            };
        }
        let floating = match self {
            Constant::Float(_) | Constant::Double(_) => true,
            _ => false,
        };
        Some(match kind {
            Float => Constant::Float(self.as_f64()? as f32),
            Double => Constant::Double(self.as_f64()?),
            Long if floating => Constant::Long(self.as_f64()? as i64),
            Long => Constant::Long(self.as_i64()?),
            _ => {
                let int = if floating {
                    self.as_f64()? as i32
                } else {
                    self.as_i64()? as i32
                };
                match kind {
                    Byte => Constant::Byte(int as i8),
                    Short => Constant::Short(int as i16),
                    Char => Constant::Char(int as u16),
                    _ => Constant::Int(int),
                }
            }
        })
    }

    /// The value survives a cast to `kind` unchanged.
    pub fn representable_in(&self, kind: PrimitiveKind) -> bool {
        match (self.as_i64(), self.cast(kind).and_then(|c| c.as_i64())) {
            (Some(before), Some(after)) => before == after,
            _ => false,
        }
    }

    pub fn unary(op: UnaryOp, operand: &Constant) -> Option<Constant> {
        match op {
            UnaryOp::Not => operand.as_bool().map(|v| Constant::Boolean(!v)),
            UnaryOp::Plus => {
                let kind = unary_promotion(operand.kind()?);
                operand.cast(kind)
            }
            UnaryOp::Neg => match operand.cast(unary_promotion(operand.kind()?))? {
                Constant::Int(v) => Some(Constant::Int(v.wrapping_neg())),
                Constant::Long(v) => Some(Constant::Long(v.wrapping_neg())),
                Constant::Float(v) => Some(Constant::Float(-v)),
                Constant::Double(v) => Some(Constant::Double(-v)),
                _ => None,
            },
            UnaryOp::BitNot => match operand.cast(unary_promotion(operand.kind()?))? {
                Constant::Int(v) => Some(Constant::Int(!v)),
                Constant::Long(v) => Some(Constant::Long(!v)),
                _ => None,
            },
            UnaryOp::PreIncrement
            | UnaryOp::PreDecrement
            | UnaryOp::PostIncrement
            | UnaryOp::PostDecrement => None,
        }
    }

    pub fn binary(op: BinaryOp, lhs: &Constant, rhs: &Constant) -> Option<Constant> {
        use self::BinaryOp::*;
        if let (Constant::String(_), _) | (_, Constant::String(_)) = (lhs, rhs) {
            return match op {
                Add => Some(Constant::String(format!("{}{}", lhs, rhs))),
                _ => None,
            };
        }
        if let (Some(l), Some(r)) = (lhs.as_bool(), rhs.as_bool()) {
            return Some(Constant::Boolean(match op {
                LogicalAnd | BitAnd => l && r,
                LogicalOr | BitOr => l || r,
                BitXor => l != r,
                Equals => l == r,
                NotEquals => l != r,
                _ => return None,
            }));
        }
        if let Shl | Shr | UShr = op {
            let distance = rhs.as_i64()?;
            return match lhs.cast(unary_promotion(lhs.kind()?))? {
                Constant::Int(v) => Some(Constant::Int(match op {
                    Shl => v.wrapping_shl(distance as u32),
                    Shr => v.wrapping_shr(distance as u32),
                    _ => (v as u32).wrapping_shr(distance as u32) as i32,
                })),
                Constant::Long(v) => Some(Constant::Long(match op {
                    Shl => v.wrapping_shl(distance as u32),
                    Shr => v.wrapping_shr(distance as u32),
                    _ => (v as u64).wrapping_shr(distance as u32) as i64,
                })),
                _ => None,
            };
        }

        let kind = binary_promotion(lhs.kind()?, rhs.kind()?);
        match (lhs.cast(kind)?, rhs.cast(kind)?) {
            (Constant::Int(l), Constant::Int(r)) => integral_op(op, i64::from(l), i64::from(r), true),
            (Constant::Long(l), Constant::Long(r)) => integral_op(op, l, r, false),
            (l, r) => {
                let (l, r) = (l.as_f64()?, r.as_f64()?);
                let value = match op {
                    Add => l + r,
                    Sub => l - r,
                    Mul => l * r,
                    Div => l / r,
                    Mod => l % r,
                    _ => return compare(op, l.partial_cmp(&r)),
                };
                Constant::Double(value).cast(kind)
            }
        }
    }
}

fn integral_op(op: BinaryOp, l: i64, r: i64, int: bool) -> Option<Constant> {
    use self::BinaryOp::*;
    let wrap = |v: i64| {
        if int {
            Constant::Int(v as i32)
        } else {
            Constant::Long(v)
        }
    };
    let (li, ri) = (l as i32, r as i32);
    Some(match op {
        Add if int => Constant::Int(li.wrapping_add(ri)),
        Sub if int => Constant::Int(li.wrapping_sub(ri)),
        Mul if int => Constant::Int(li.wrapping_mul(ri)),
        Div | Mod if int && ri == 0 => return None,
        Div if int => Constant::Int(li.wrapping_div(ri)),
        Mod if int => Constant::Int(li.wrapping_rem(ri)),
        Add => wrap(l.wrapping_add(r)),
        Sub => wrap(l.wrapping_sub(r)),
        Mul => wrap(l.wrapping_mul(r)),
        Div if r == 0 => return None,
        Div => wrap(l.wrapping_div(r)),
        Mod if r == 0 => return None,
        Mod => wrap(l.wrapping_rem(r)),
        BitAnd => wrap(l & r),
        BitOr => wrap(l | r),
        BitXor => wrap(l ^ r),
        _ => return compare(op, Some(l.cmp(&r))),
    })
}

fn compare(op: BinaryOp, ordering: Option<std::cmp::Ordering>) -> Option<Constant> {
    use self::BinaryOp::*;
    use std::cmp::Ordering::*;
    let result = match (op, ordering) {
        (NotEquals, None) => true,
        (_, None) => false,
        (LessThan, Some(o)) => o == Less,
        (GreaterThan, Some(o)) => o == Greater,
        (LessEquals, Some(o)) => o != Greater,
        (GreaterEquals, Some(o)) => o != Less,
        (Equals, Some(o)) => o == Equal,
        (NotEquals, Some(o)) => o != Equal,
        _ => return None,
    };
    Some(Constant::Boolean(result))
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Boolean(v) => write!(f, "{}", v),
            Constant::Byte(v) => write!(f, "{}", v),
            Constant::Short(v) => write!(f, "{}", v),
            Constant::Char(v) => match std::char::from_u32(u32::from(*v)) {
                Some(c) => write!(f, "{}", c),
                None => write!(f, "\\u{:04x}", v),
            },
            Constant::Int(v) => write!(f, "{}", v),
            Constant::Long(v) => write!(f, "{}", v),
            Constant::Float(v) => write!(f, "{:?}", v),
            Constant::Double(v) => write!(f, "{:?}", v),
            Constant::String(v) => write!(f, "{}", v),
        }
    }
}

/// `byte -> short -> int -> long -> float -> double`, `char -> int`.
pub fn widening_primitive(from: PrimitiveKind, to: PrimitiveKind) -> bool {
    use self::PrimitiveKind::*;
    let rank = |kind: PrimitiveKind| match kind {
        Byte => Some(0),
        Short => Some(1),
        Int => Some(2),
        Long => Some(3),
        Float => Some(4),
        Double => Some(5),
        Char | Boolean => None,
    };
    match (from, to) {
        (Char, to) => rank(to).map(|r| r >= 2).unwrap_or(false),
        (from, to) => match (rank(from), rank(to)) {
            (Some(f), Some(t)) => f < t,
            _ => false,
        },
    }
}

/// Numeric conversions that may lose information. `byte -> char` is one of
/// them.
pub fn narrowing_primitive(from: PrimitiveKind, to: PrimitiveKind) -> bool {
    from.is_numeric() && to.is_numeric() && from != to && !widening_primitive(from, to)
}

pub fn unary_promotion(kind: PrimitiveKind) -> PrimitiveKind {
    use self::PrimitiveKind::*;
    match kind {
        Byte | Short | Char => Int,
        other => other,
    }
}

pub fn binary_promotion(lhs: PrimitiveKind, rhs: PrimitiveKind) -> PrimitiveKind {
    use self::PrimitiveKind::*;
    if lhs == Double || rhs == Double {
        Double
    } else if lhs == Float || rhs == Float {
        Float
    } else if lhs == Long || rhs == Long {
        Long
    } else {
        Int
    }
}

/// Reflexive and transitive over superclasses and interfaces.
pub fn is_subclass_of(table: &ClassTable, sub: ClassId, sup: ClassId) -> bool {
    let mut seen = HashSet::new();
    let mut todo = vec![sub];
    while let Some(id) = todo.pop() {
        if id == sup {
            return true;
        }
        if !seen.insert(id) {
            continue;
        }
        let class = table.class(id);
        todo.extend(class.superclass.iter().filter_map(Type::class_id));
        todo.extend(class.interfaces.iter().filter_map(Type::class_id));
    }
    false
}

fn is_named(ty: &Type, names: &[&str]) -> bool {
    match ty {
        Type::Class(class) => names.iter().any(|n| class.name == *n),
        _ => false,
    }
}

/// Reference widening: subclass to superclass or interface, array
/// covariance, arrays to `Object`/`Cloneable`/`Serializable` and `null` to
/// any reference type.
pub fn is_reference_assignable(table: &ClassTable, from: &Type, to: &Type) -> bool {
    match (from, to) {
        (Type::Error, _) | (_, Type::Error) => true,
        (Type::Null, to) => to.is_reference(),
        (Type::Class(_), to) if is_named(to, &["java.lang.Object"]) => true,
        (Type::Class(sub), Type::Class(sup)) => is_subclass_of(table, sub.id, sup.id),
        (Type::Array(_), to) if is_named(to, &["java.lang.Object", "java.lang.Cloneable", "java.io.Serializable"]) => true,
        (Type::Array(from), Type::Array(to)) => match (&**from, &**to) {
            (Type::Primitive(f), Type::Primitive(t)) => f == t,
            (from, to) if from.is_reference() && to.is_reference() => {
                is_reference_assignable(table, from, to)
            }
            _ => false,
        },
        _ => false,
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Conversion {
    Identity,
    WideningPrimitive,
    /// a constant that fits the narrower type
    NarrowingConstant,
    WideningReference,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// numeric conversion that would need a cast
    Lossy,
    Incompatible,
}

/// Identity, widening primitive and reference widening, without constants.
pub fn valid_assignment_conversion(table: &ClassTable, from: &Type, to: &Type) -> bool {
    assignment_conversion(table, from, None, to).is_ok()
}

/// Conversion of a value of type `from` (and value `constant`, if it is a
/// compile-time constant) on assignment to `to`.
pub fn assignment_conversion(
    table: &ClassTable,
    from: &Type,
    constant: Option<&Constant>,
    to: &Type,
) -> Result<Conversion, ConversionError> {
    use self::PrimitiveKind::*;
    match (from, to) {
        (Type::Error, _) | (_, Type::Error) => Ok(Conversion::Identity),
        (Type::Void, _) | (_, Type::Void) => Err(ConversionError::Incompatible),
        _ if from == to => Ok(Conversion::Identity),
        (Type::Primitive(f), Type::Primitive(t)) => {
            if widening_primitive(*f, *t) {
                return Ok(Conversion::WideningPrimitive);
            }
            let narrowable_source = match f {
                Byte | Short | Char | Int => true,
                _ => false,
            };
            let narrowable_target = match t {
                Byte | Short | Char => true,
                _ => false,
            };
            match constant {
                Some(value) if narrowable_source && narrowable_target && value.representable_in(*t) => {
                    Ok(Conversion::NarrowingConstant)
                }
                _ if narrowing_primitive(*f, *t) => Err(ConversionError::Lossy),
                _ => Err(ConversionError::Incompatible),
            }
        }
        (from, to) if from.is_reference() && to.is_reference() => {
            if is_reference_assignable(table, from, to) {
                Ok(Conversion::WideningReference)
            } else {
                Err(ConversionError::Incompatible)
            }
        }
        _ => Err(ConversionError::Incompatible),
    }
}

/// Identity and widening only. Used to decide applicability of methods.
pub fn method_invocation_conversion(table: &ClassTable, from: &Type, to: &Type) -> bool {
    match assignment_conversion(table, from, None, to) {
        Ok(Conversion::NarrowingConstant) | Err(_) => false,
        Ok(_) => true,
    }
}

/// How a legal cast is carried out.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CastCheck {
    /// always succeeds, possibly changing the representation
    Static,
    /// downcast checked by the generated code
    Checked,
    /// cannot be decided statically, handed to the cast emitter
    Runtime,
}

pub fn cast_conversion(table: &ClassTable, from: &Type, to: &Type) -> Result<CastCheck, ()> {
    match (from, to) {
        (Type::Error, _) | (_, Type::Error) => Ok(CastCheck::Static),
        _ if from == to => Ok(CastCheck::Static),
        (Type::Primitive(f), Type::Primitive(t)) => {
            if f.is_numeric() && t.is_numeric() {
                Ok(CastCheck::Static)
            } else {
                Err(())
            }
        }
        (from, to) if !from.is_reference() || !to.is_reference() => Err(()),
        (Type::Null, _) => Ok(CastCheck::Static),
        _ if is_reference_assignable(table, from, to) => Ok(CastCheck::Static),
        _ if is_reference_assignable(table, to, from) => Ok(CastCheck::Checked),
        (Type::Class(f), Type::Class(t)) => {
            let (f, t) = (table.class(f.id), table.class(t.id));
            match (f.is_interface(), t.is_interface()) {
                (false, false) => Err(()),
                (false, true) | (true, false) => {
                    let class = if f.is_interface() { &t } else { &f };
                    if class.modifiers.is_final() {
                        Err(())
                    } else {
                        Ok(CastCheck::Runtime)
                    }
                }
                (true, true) => {
                    if interfaces_conflict(table, f.id, t.id) {
                        Err(())
                    } else {
                        Ok(CastCheck::Runtime)
                    }
                }
            }
        }
        (Type::Array(f), Type::Array(t)) => match (&**f, &**t) {
            (Type::Primitive(_), _) | (_, Type::Primitive(_)) => Err(()),
            (f, t) => cast_conversion(table, f, t),
        },
        _ => Err(()),
    }
}

/// Two interfaces declaring a method with the same parameters but different
/// return types can never be implemented by one class.
fn interfaces_conflict(table: &ClassTable, a: ClassId, b: ClassId) -> bool {
    let (a, b) = (table.class(a), table.class(b));
    a.methods.iter().any(|ma| {
        b.methods.iter().any(|mb| {
            ma.name == mb.name
                && ma.param_types() == mb.param_types()
                && ma.return_ty != mb.return_ty
        })
    })
}

/// Type of `lhs op rhs`, `None` if the operator does not apply to the
/// operands.
pub fn binary_operation_type(table: &ClassTable, op: BinaryOp, lhs: &Type, rhs: &Type) -> Option<Type> {
    use self::BinaryOp::*;
    if lhs.is_error() || rhs.is_error() {
        return Some(Type::Error);
    }
    let boolean = Type::Primitive(PrimitiveKind::Boolean);
    let both_numeric = lhs.is_numeric() && rhs.is_numeric();
    let promoted = match (lhs.primitive(), rhs.primitive()) {
        (Some(l), Some(r)) => Some(Type::Primitive(binary_promotion(l, r))),
        _ => None,
    };
    match op {
        Add if table.is_string(lhs) || table.is_string(rhs) => {
            if *lhs == Type::Void || *rhs == Type::Void {
                None
            } else {
                Some(table.string())
            }
        }
        Add | Sub | Mul | Div | Mod if both_numeric => promoted,
        Shl | Shr | UShr if lhs.is_integral() && rhs.is_integral() => {
            lhs.primitive().map(|kind| Type::Primitive(unary_promotion(kind)))
        }
        LessThan | GreaterThan | LessEquals | GreaterEquals if both_numeric => Some(boolean),
        Equals | NotEquals => {
            let comparable = both_numeric
                || (lhs.is_boolean() && rhs.is_boolean())
                || (lhs.is_reference() && rhs.is_reference() && cast_conversion(table, lhs, rhs).is_ok());
            if comparable {
                Some(boolean)
            } else {
                None
            }
        }
        BitAnd | BitOr | BitXor if lhs.is_boolean() && rhs.is_boolean() => Some(boolean),
        BitAnd | BitOr | BitXor if lhs.is_integral() && rhs.is_integral() => promoted,
        LogicalAnd | LogicalOr if lhs.is_boolean() && rhs.is_boolean() => Some(boolean),
        _ => None,
    }
}

/// Makes a representation change explicit by wrapping the expression in a
/// cast node. Reference conversions leave the expression as it is.
pub fn convert(expr: Spanned<Expr>, target: &Type, conversion: Conversion) -> Spanned<Expr> {
    match conversion {
        Conversion::WideningPrimitive | Conversion::NarrowingConstant => {
            let span = expr.span;
            let ty = Spanned::new(span, TypeRef::resolved(target.clone(), span));
            Spanned::new(
                span,
                Expr::typed(ExprKind::Cast(ty, Box::new(expr)), target.clone()),
            )
        }
        Conversion::Identity | Conversion::WideningReference => expr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class_loader::StubLoader;
    use syntax::PrimitiveKind::*;

    const ALL: [PrimitiveKind; 8] = [Boolean, Byte, Short, Char, Int, Long, Float, Double];

    fn table() -> ClassTable {
        ClassTable::new(Box::new(StubLoader::builtin()))
    }

    fn prim(kind: PrimitiveKind) -> Type {
        Type::Primitive(kind)
    }

    #[test]
    fn assignment_conversion_is_reflexive() {
        let table = table();
        for kind in ALL.iter() {
            assert!(valid_assignment_conversion(&table, &prim(*kind), &prim(*kind)));
        }
        let string = table.string();
        assert!(valid_assignment_conversion(&table, &string, &string));
    }

    #[test]
    fn widening_table() {
        let table = table();
        let ok = |f, t| valid_assignment_conversion(&table, &prim(f), &prim(t));
        assert!(ok(Int, Long));
        assert!(!ok(Long, Int));
        assert!(!ok(Short, Char));
        assert!(!ok(Char, Short));
        assert!(ok(Char, Int));
        assert!(ok(Byte, Double));
        assert!(!ok(Boolean, Int));
        assert!(!ok(Double, Float));
    }

    #[test]
    fn constant_narrowing_needs_a_representable_value() {
        let table = table();
        let int = prim(Int);
        let byte = prim(Byte);
        assert_eq!(
            Ok(Conversion::NarrowingConstant),
            assignment_conversion(&table, &int, Some(&Constant::Int(100)), &byte)
        );
        assert_eq!(
            Err(ConversionError::Lossy),
            assignment_conversion(&table, &int, Some(&Constant::Int(200)), &byte)
        );
        assert_eq!(
            Err(ConversionError::Lossy),
            assignment_conversion(&table, &prim(Long), Some(&Constant::Long(1)), &byte)
        );
        assert!(!method_invocation_conversion(&table, &int, &byte));
    }

    #[test]
    fn reference_widening() {
        let table = table();
        let object = table.object();
        let ioe = table.well_known("java.io.IOException");
        let exception = table.well_known("java.lang.Exception");
        assert!(is_reference_assignable(&table, &ioe, &exception));
        assert!(!is_reference_assignable(&table, &exception, &ioe));
        assert!(is_reference_assignable(&table, &Type::Null, &ioe));
        let ioes = Type::array_of(ioe.clone(), 1);
        let objects = Type::array_of(object.clone(), 1);
        assert!(is_reference_assignable(&table, &ioes, &objects));
        assert!(is_reference_assignable(&table, &Type::array_of(prim(Int), 1), &object));
        assert!(!is_reference_assignable(
            &table,
            &Type::array_of(prim(Int), 1),
            &Type::array_of(prim(Long), 1)
        ));
    }

    #[test]
    fn casts() {
        let table = table();
        let object = table.object();
        let string = table.string();
        let runnable = table.well_known("java.lang.Runnable");
        let exception = table.well_known("java.lang.Exception");
        assert_eq!(Ok(CastCheck::Static), cast_conversion(&table, &prim(Long), &prim(Byte)));
        assert_eq!(Err(()), cast_conversion(&table, &prim(Boolean), &prim(Int)));
        assert_eq!(Ok(CastCheck::Checked), cast_conversion(&table, &object, &string));
        assert_eq!(Err(()), cast_conversion(&table, &string, &exception));
        // String is final and does not implement Runnable
        assert_eq!(Err(()), cast_conversion(&table, &string, &runnable));
        assert_eq!(Ok(CastCheck::Runtime), cast_conversion(&table, &exception, &runnable));
        assert_eq!(Err(()), cast_conversion(&table, &prim(Int), &object));
    }

    #[test]
    fn promotions() {
        assert_eq!(Int, unary_promotion(Char));
        assert_eq!(Long, unary_promotion(Long));
        assert_eq!(Int, binary_promotion(Byte, Short));
        assert_eq!(Float, binary_promotion(Long, Float));
        assert_eq!(Double, binary_promotion(Double, Int));
    }

    #[test]
    fn constant_folding_wraps() {
        assert_eq!(
            Some(Constant::Int(i32::min_value())),
            Constant::binary(BinaryOp::Add, &Constant::Int(i32::max_value()), &Constant::Int(1))
        );
        assert_eq!(None, Constant::binary(BinaryOp::Div, &Constant::Int(1), &Constant::Int(0)));
        assert_eq!(
            Some(Constant::Boolean(true)),
            Constant::binary(BinaryOp::LessThan, &Constant::Char(97), &Constant::Int(98))
        );
        assert_eq!(
            Some(Constant::String("a1".to_string())),
            Constant::binary(BinaryOp::Add, &Constant::String("a".to_string()), &Constant::Int(1))
        );
        assert_eq!(Some(Constant::Int(-8)), Constant::unary(UnaryOp::Neg, &Constant::Byte(8)));
        assert_eq!(Some(Constant::Byte(-56)), Constant::Int(200).cast(Byte));
    }
    #[test]
    fn operator_types() {
        let table = table();
        let string = table.string();
        let op = |op, l: &Type, r: &Type| binary_operation_type(&table, op, l, r);
        assert_eq!(Some(prim(Long)), op(BinaryOp::Add, &prim(Int), &prim(Long)));
        assert_eq!(Some(string.clone()), op(BinaryOp::Add, &prim(Int), &string));
        assert_eq!(Some(prim(Int)), op(BinaryOp::Shl, &prim(Byte), &prim(Long)));
        assert_eq!(Some(prim(Boolean)), op(BinaryOp::Equals, &string, &Type::Null));
        assert_eq!(None, op(BinaryOp::Sub, &string, &prim(Int)));
        assert_eq!(None, op(BinaryOp::LogicalAnd, &prim(Int), &prim(Boolean)));
        assert_eq!(Some(prim(Boolean)), op(BinaryOp::BitXor, &prim(Boolean), &prim(Boolean)));
    }
}
