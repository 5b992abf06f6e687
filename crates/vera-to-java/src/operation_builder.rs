// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Operator implementations per value representation
//!
//! The strategy is chosen from the translated operand types. The same source type can
//! end up in different representations (an enum is an `int` in arithmetic, a narrowed
//! `integer` is an `int`, a wide one an `Integer`), so choosing from source types would
//! pick implementations that do not match the operands.

use crate::error::ConversionError;
use crate::expression_converter::{self as conv, bit_vector_literal};
use java_schema::runtime::{INT_OP, OBJECTS};
use java_schema::{BinaryOp as JBinaryOp, Expr, JavaType, Literal, UnaryOp as JUnaryOp};
use vera_model::{BinaryOp, UnaryOp};

type Result<T> = std::result::Result<T, ConversionError>;

/// A translated operand and the signedness of its source type
#[derive(Debug, Clone)]
pub struct Operand {
    pub expr: Expr,
    pub signed: bool,
}

impl Operand {
    pub fn new(expr: Expr, signed: bool) -> Self {
        Self { expr, signed }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationBuilder {
    Int,
    Long,
    Boolean,
    Bit,
    /// Four-valued vectors; carries the width required by the enclosing context
    BitVector(Option<u32>),
    /// Boxed `Integer` with `null` for X
    WrappedInteger,
    StringEquality,
}

/// Enums and chars take part in arithmetic as `int`
fn representation(ty: &JavaType) -> JavaType {
    match ty {
        JavaType::Enum(_) | JavaType::Char => JavaType::Int,
        JavaType::Signal { width, .. } => JavaType::bit_vector(*width),
        other => other.clone(),
    }
}

fn is_arithmetic(op: BinaryOp) -> bool {
    matches!(
        op,
        BinaryOp::Add
            | BinaryOp::Subtract
            | BinaryOp::Multiply
            | BinaryOp::Divide
            | BinaryOp::Modulo
            | BinaryOp::ShiftLeft
            | BinaryOp::ShiftRight
    )
}

fn max_width(widths: impl IntoIterator<Item = Option<u32>>) -> Option<u32> {
    let mut result = 0;
    for w in widths {
        result = result.max(w?);
    }
    Some(result)
}

impl OperationBuilder {
    /// Strategy for `lhs op rhs`, or `None` when no representation supports the pair
    pub fn select(op: BinaryOp, lhs: &JavaType, rhs: &JavaType, context_width: Option<u32>) -> Option<Self> {
        use JavaType::*;
        let (l, r) = (representation(lhs), representation(rhs));
        if (l.is_string_like() || r.is_string_like())
            && (l.is_string_like() || l == Null)
            && (r.is_string_like() || r == Null)
        {
            return (op.is_equality() || op.is_relational()).then_some(OperationBuilder::StringEquality);
        }
        if !l.is_dv_integral() || !r.is_dv_integral() {
            return None;
        }
        let builder = match (&l, &r) {
            (BitVector(_), _) | (_, BitVector(_)) => OperationBuilder::BitVector(context_width),
            (Int, Int) => OperationBuilder::Int,
            (Int | Long, Int | Long) => OperationBuilder::Long,
            (Boolean, Boolean) => {
                let carries = matches!(
                    op,
                    BinaryOp::Divide | BinaryOp::Modulo | BinaryOp::ShiftLeft | BinaryOp::ShiftRight
                ) || (is_arithmetic(op) && context_width.map_or(false, |w| w > 1));
                if carries {
                    OperationBuilder::BitVector(context_width)
                } else {
                    OperationBuilder::Boolean
                }
            }
            (Bit | Boolean, Bit | Boolean) => {
                if is_arithmetic(op) || op.is_relational() {
                    OperationBuilder::BitVector(context_width)
                } else {
                    OperationBuilder::Bit
                }
            }
            (Boolean, Int) | (Int, Boolean) => OperationBuilder::Int,
            (Boolean, Long) | (Long, Boolean) => OperationBuilder::Long,
            _ => OperationBuilder::WrappedInteger,
        };
        Some(builder)
    }

    /// Strategy for a unary operator over `operand`
    pub fn select_unary(operand: &JavaType, context_width: Option<u32>) -> Option<Self> {
        match representation(operand) {
            JavaType::Int => Some(OperationBuilder::Int),
            JavaType::Long => Some(OperationBuilder::Long),
            JavaType::Boolean => Some(OperationBuilder::Boolean),
            JavaType::Bit => Some(OperationBuilder::Bit),
            JavaType::BitVector(_) => Some(OperationBuilder::BitVector(context_width)),
            JavaType::Integer => Some(OperationBuilder::WrappedInteger),
            _ => None,
        }
    }

    /// Convert an operand into this strategy's representation
    fn prepare(self, operand: Operand, width: Option<u32>) -> Result<Expr> {
        let Operand { expr, signed } = operand;
        match self {
            OperationBuilder::Int => conv::to_int(expr),
            OperationBuilder::Long => conv::to_long(expr),
            OperationBuilder::Boolean => conv::to_boolean(expr, false),
            OperationBuilder::Bit => conv::to_bit(expr),
            OperationBuilder::BitVector(_) => {
                let natural = conv::to_bit_vector(expr, None, signed)?;
                Ok(match width {
                    Some(w) => conv::promote_width(natural, w, signed),
                    None => natural,
                })
            }
            OperationBuilder::WrappedInteger => conv::to_integer(expr),
            OperationBuilder::StringEquality => conv::to_string_value(expr),
        }
    }

    /// Width both operands are brought to before the operator runs
    fn operand_width(self, op: BinaryOp, lhs: &Operand, rhs: &Operand) -> Option<u32> {
        let OperationBuilder::BitVector(context) = self else {
            return None;
        };
        let lw = bit_width_of(&lhs.expr.ty);
        let rw = bit_width_of(&rhs.expr.ty);
        if op.is_shift() {
            max_width([context.or(lw), lw])
        } else if op.is_width_preserving() {
            match context {
                Some(c) => max_width([Some(c), lw, rw]),
                None => max_width([lw, rw]),
            }
        } else {
            max_width([lw, rw])
        }
    }

    pub fn binary(self, op: BinaryOp, lhs: Operand, rhs: Operand) -> Result<Expr> {
        let width = self.operand_width(op, &lhs, &rhs);
        let both_signed = lhs.signed && rhs.signed;
        let l = self.prepare(lhs, width)?;
        let r = if op.is_shift() {
            match self {
                // The shift amount keeps its own width
                OperationBuilder::BitVector(_) => self.prepare(rhs, None)?,
                OperationBuilder::Long => conv::to_int(rhs.expr)?,
                _ => self.prepare(rhs, None)?,
            }
        } else {
            self.prepare(rhs, width)?
        };
        Ok(match self {
            OperationBuilder::Int | OperationBuilder::Long => native_binary(op, l, r, self == OperationBuilder::Long),
            OperationBuilder::Boolean => boolean_binary(op, l, r),
            OperationBuilder::Bit => bit_binary(op, l, r),
            OperationBuilder::BitVector(_) => bit_vector_binary(op, l, r, width, both_signed),
            OperationBuilder::WrappedInteger => wrapped_binary(op, l, r),
            OperationBuilder::StringEquality => string_binary(op, l, r),
        })
    }

    pub fn unary(self, op: UnaryOp, operand: Operand) -> Result<Expr> {
        let width = match self {
            OperationBuilder::BitVector(context) if !op.is_reduction() => {
                max_width([context.or(bit_width_of(&operand.expr.ty)), bit_width_of(&operand.expr.ty)])
            }
            _ => None,
        };
        let value = self.prepare(operand, width)?;
        Ok(match self {
            OperationBuilder::Int | OperationBuilder::Long => {
                native_unary(op, value, self == OperationBuilder::Long)
            }
            OperationBuilder::Boolean => match op {
                UnaryOp::Negate | UnaryOp::ReduceAnd | UnaryOp::ReduceOr | UnaryOp::ReduceXor => value,
                _ => value.not(),
            },
            OperationBuilder::Bit => match op {
                UnaryOp::Negate | UnaryOp::ReduceAnd | UnaryOp::ReduceOr | UnaryOp::ReduceXor => value,
                _ => call(value, "not", vec![], JavaType::Bit),
            },
            OperationBuilder::BitVector(_) => {
                let ty = value.ty.clone();
                match op {
                    UnaryOp::Negate => call(value, "negate", vec![], ty),
                    UnaryOp::BitNot | UnaryOp::LogicalNot => call(value, "not", vec![], ty),
                    reduction => call(value, reduction_method(reduction), vec![], JavaType::Bit),
                }
            }
            OperationBuilder::WrappedInteger => match op {
                UnaryOp::Negate => Expr::static_call(INT_OP, "negate", vec![value], JavaType::Integer),
                UnaryOp::BitNot | UnaryOp::LogicalNot => {
                    Expr::static_call(INT_OP, "not", vec![value], JavaType::Integer)
                }
                reduction => Expr::static_call(INT_OP, reduction_method(reduction), vec![value], JavaType::Bit),
            },
            OperationBuilder::StringEquality => {
                panic!("BUG: unary {} on strings", op.symbol())
            }
        })
    }
}

fn bit_width_of(ty: &JavaType) -> Option<u32> {
    representation(ty).bit_width()
}

fn call(target: Expr, name: &str, args: Vec<Expr>, ty: JavaType) -> Expr {
    Expr::call(target, name, args, ty)
}

fn java_binary(op: JBinaryOp, l: Expr, r: Expr) -> Expr {
    let ty = if op.is_comparison() || matches!(op, JBinaryOp::And | JBinaryOp::Or) {
        JavaType::Boolean
    } else {
        l.ty.clone()
    };
    Expr::binary(op, l, r, ty)
}

fn reduction_method(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::ReduceAnd => "reductiveAnd",
        UnaryOp::ReduceNand => "reductiveNand",
        UnaryOp::ReduceOr => "reductiveOr",
        UnaryOp::ReduceNor => "reductiveNor",
        UnaryOp::ReduceXor => "reductiveXor",
        UnaryOp::ReduceXnor => "reductiveXnor",
        other => panic!("BUG: {} is not a reduction", other.symbol()),
    }
}

/// Java operator for a two-valued integral operator, if there is a direct one
pub fn native_operator(op: BinaryOp) -> Option<JBinaryOp> {
    Some(match op {
        BinaryOp::Add => JBinaryOp::Add,
        BinaryOp::Subtract => JBinaryOp::Sub,
        BinaryOp::Multiply => JBinaryOp::Mul,
        BinaryOp::Divide => JBinaryOp::Div,
        BinaryOp::Modulo => JBinaryOp::Rem,
        BinaryOp::ShiftLeft => JBinaryOp::Shl,
        // Vera `>>` shifts in zeros
        BinaryOp::ShiftRight => JBinaryOp::UShr,
        BinaryOp::BitAnd => JBinaryOp::BitAnd,
        BinaryOp::BitOr => JBinaryOp::BitOr,
        BinaryOp::BitXor => JBinaryOp::BitXor,
        BinaryOp::Less => JBinaryOp::Lt,
        BinaryOp::LessEq => JBinaryOp::Le,
        BinaryOp::Greater => JBinaryOp::Gt,
        BinaryOp::GreaterEq => JBinaryOp::Ge,
        BinaryOp::Equal | BinaryOp::ExactEqual | BinaryOp::WildEqual => JBinaryOp::Eq,
        BinaryOp::NotEqual | BinaryOp::ExactNotEqual | BinaryOp::WildNotEqual => JBinaryOp::Ne,
        BinaryOp::LogicalAnd => JBinaryOp::And,
        BinaryOp::LogicalOr => JBinaryOp::Or,
        BinaryOp::BitNand | BinaryOp::BitNor | BinaryOp::BitXnor => return None,
    })
}

fn native_binary(op: BinaryOp, l: Expr, r: Expr, long: bool) -> Expr {
    let negated = match op {
        BinaryOp::BitNand => Some(JBinaryOp::BitAnd),
        BinaryOp::BitNor => Some(JBinaryOp::BitOr),
        BinaryOp::BitXnor => Some(JBinaryOp::BitXor),
        _ => None,
    };
    if let Some(inner) = negated {
        let value = java_binary(inner, l, r);
        return Expr::unary(JUnaryOp::BitNot, value);
    }
    if op.is_shift() {
        return native_shift(op, l, r, long);
    }
    match native_operator(op) {
        Some(jop) => {
            let result = java_binary(jop, l, r);
            if long && !jop.is_comparison() {
                Expr { ty: JavaType::Long, ..result }
            } else {
                result
            }
        }
        None => panic!("BUG: no native operator for {}", op),
    }
}

/// Java masks the shift amount to the operand width, Vera shifts everything out. Only a
/// constant amount below the width maps onto the Java operator.
fn native_shift(op: BinaryOp, l: Expr, r: Expr, long: bool) -> Expr {
    let (width, ty) = if long { (64, JavaType::Long) } else { (32, JavaType::Int) };
    match r.int_value() {
        Some(amount) if (0..width).contains(&amount) => {
            let jop = if op == BinaryOp::ShiftLeft { JBinaryOp::Shl } else { JBinaryOp::UShr };
            Expr { ty, ..java_binary(jop, l, r) }
        }
        Some(amount) if amount >= width && !l.has_side_effects() => {
            if long {
                Expr::long(0)
            } else {
                Expr::int(0)
            }
        }
        _ => {
            let name = if op == BinaryOp::ShiftLeft { "shiftLeft" } else { "shiftRight" };
            Expr::static_call(INT_OP, name, vec![l, r], ty)
        }
    }
}

fn native_unary(op: UnaryOp, value: Expr, long: bool) -> Expr {
    let (all_ones, zero) = if long {
        (Expr::long(-1), Expr::long(0))
    } else {
        (Expr::int(-1), Expr::int(0))
    };
    let parity = || {
        let class = if long { "Long" } else { "Integer" };
        let count = Expr::static_call(class, "bitCount", vec![value.clone()], JavaType::Int);
        Expr::binary(JBinaryOp::BitAnd, count, Expr::int(1), JavaType::Int)
    };
    match op {
        UnaryOp::Negate => Expr::unary(JUnaryOp::Neg, value),
        UnaryOp::BitNot => Expr::unary(JUnaryOp::BitNot, value),
        UnaryOp::LogicalNot => java_binary(JBinaryOp::Eq, value, zero),
        UnaryOp::ReduceAnd => java_binary(JBinaryOp::Eq, value, all_ones),
        UnaryOp::ReduceNand => java_binary(JBinaryOp::Ne, value, all_ones),
        UnaryOp::ReduceOr => java_binary(JBinaryOp::Ne, value, zero),
        UnaryOp::ReduceNor => java_binary(JBinaryOp::Eq, value, zero),
        UnaryOp::ReduceXor => java_binary(JBinaryOp::Ne, parity(), Expr::int(0)),
        UnaryOp::ReduceXnor => java_binary(JBinaryOp::Eq, parity(), Expr::int(0)),
    }
}

fn boolean_binary(op: BinaryOp, l: Expr, r: Expr) -> Expr {
    match op {
        // One-bit arithmetic without carry
        BinaryOp::Add | BinaryOp::Subtract | BinaryOp::BitXor => java_binary(JBinaryOp::BitXor, l, r),
        BinaryOp::Multiply | BinaryOp::BitAnd => java_binary(JBinaryOp::BitAnd, l, r),
        BinaryOp::BitOr => java_binary(JBinaryOp::BitOr, l, r),
        BinaryOp::BitNand => java_binary(JBinaryOp::BitAnd, l, r).not(),
        BinaryOp::BitNor => java_binary(JBinaryOp::BitOr, l, r).not(),
        BinaryOp::BitXnor => java_binary(JBinaryOp::Eq, l, r),
        BinaryOp::Less => java_binary(JBinaryOp::BitAnd, l.not(), r),
        BinaryOp::LessEq => java_binary(JBinaryOp::BitOr, l.not(), r),
        BinaryOp::Greater => java_binary(JBinaryOp::BitAnd, l, r.not()),
        BinaryOp::GreaterEq => java_binary(JBinaryOp::BitOr, l, r.not()),
        BinaryOp::Equal | BinaryOp::ExactEqual | BinaryOp::WildEqual => java_binary(JBinaryOp::Eq, l, r),
        BinaryOp::NotEqual | BinaryOp::ExactNotEqual | BinaryOp::WildNotEqual => {
            java_binary(JBinaryOp::Ne, l, r)
        }
        BinaryOp::LogicalAnd => java_binary(JBinaryOp::And, l, r),
        BinaryOp::LogicalOr => java_binary(JBinaryOp::Or, l, r),
        BinaryOp::Divide | BinaryOp::Modulo | BinaryOp::ShiftLeft | BinaryOp::ShiftRight => {
            panic!("BUG: boolean strategy selected for {}", op)
        }
    }
}

fn bit_binary(op: BinaryOp, l: Expr, r: Expr) -> Expr {
    let bit = |name: &str, l: Expr, r: Expr| call(l, name, vec![r], JavaType::Bit);
    match op {
        BinaryOp::BitAnd => bit("and", l, r),
        BinaryOp::BitOr => bit("or", l, r),
        BinaryOp::BitXor => bit("xor", l, r),
        BinaryOp::BitNand => bit("nand", l, r),
        BinaryOp::BitNor => bit("nor", l, r),
        BinaryOp::BitXnor => bit("xnor", l, r),
        BinaryOp::Equal => bit("eq", l, r),
        BinaryOp::NotEqual => call(bit("eq", l, r), "not", vec![], JavaType::Bit),
        BinaryOp::ExactEqual => call(l, "equals", vec![r], JavaType::Boolean),
        BinaryOp::ExactNotEqual => call(l, "equals", vec![r], JavaType::Boolean).not(),
        BinaryOp::WildEqual => call(l, "equalsWild", vec![r], JavaType::Boolean),
        BinaryOp::WildNotEqual => call(l, "equalsWild", vec![r], JavaType::Boolean).not(),
        BinaryOp::LogicalAnd => bit("and", l, r),
        BinaryOp::LogicalOr => bit("or", l, r),
        other => panic!("BUG: bit strategy selected for {}", other),
    }
}

fn bit_vector_method(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "add",
        BinaryOp::Subtract => "subtract",
        BinaryOp::Multiply => "multiply",
        BinaryOp::Divide => "divide",
        BinaryOp::Modulo => "mod",
        BinaryOp::ShiftLeft => "shiftLeft",
        BinaryOp::ShiftRight => "shiftRight",
        BinaryOp::BitAnd => "and",
        BinaryOp::BitOr => "or",
        BinaryOp::BitXor => "xor",
        BinaryOp::BitNand => "nand",
        BinaryOp::BitNor => "nor",
        BinaryOp::BitXnor => "xnor",
        BinaryOp::Less => "lessThan",
        BinaryOp::LessEq => "lessOrEqual",
        BinaryOp::Greater => "greaterThan",
        BinaryOp::GreaterEq => "greaterOrEqual",
        BinaryOp::Equal => "eq",
        BinaryOp::NotEqual => "ne",
        BinaryOp::ExactEqual | BinaryOp::ExactNotEqual => "equals",
        BinaryOp::WildEqual | BinaryOp::WildNotEqual => "equalsWild",
        BinaryOp::LogicalAnd | BinaryOp::LogicalOr => {
            panic!("BUG: logical {} reached the vector strategy", op)
        }
    }
}

fn bit_vector_binary(op: BinaryOp, l: Expr, r: Expr, width: Option<u32>, signed: bool) -> Expr {
    let name = bit_vector_method(op);
    if op.is_relational() {
        let name = if signed { format!("{}Signed", name) } else { name.to_string() };
        return call(l, &name, vec![r], JavaType::Bit);
    }
    match op {
        BinaryOp::Equal | BinaryOp::NotEqual => call(l, name, vec![r], JavaType::Bit),
        BinaryOp::ExactEqual | BinaryOp::WildEqual => call(l, name, vec![r], JavaType::Boolean),
        BinaryOp::ExactNotEqual | BinaryOp::WildNotEqual => {
            call(l, name, vec![r], JavaType::Boolean).not()
        }
        _ => {
            let ty = JavaType::BitVector(width.or_else(|| l.ty.bit_width()));
            call(l, name, vec![r], ty)
        }
    }
}

fn wrapped_binary(op: BinaryOp, l: Expr, r: Expr) -> Expr {
    let int_op = |name: &str, ty: JavaType| Expr::static_call(INT_OP, name, vec![l.clone(), r.clone()], ty);
    match op {
        _ if op.is_relational() => int_op(bit_vector_method(op), JavaType::Bit),
        BinaryOp::Equal | BinaryOp::NotEqual => int_op(bit_vector_method(op), JavaType::Bit),
        BinaryOp::ExactEqual | BinaryOp::WildEqual => int_op(bit_vector_method(op), JavaType::Boolean),
        BinaryOp::ExactNotEqual | BinaryOp::WildNotEqual => {
            int_op(bit_vector_method(op), JavaType::Boolean).not()
        }
        _ => int_op(bit_vector_method(op), JavaType::Integer),
    }
}

fn string_binary(op: BinaryOp, l: Expr, r: Expr) -> Expr {
    let equal = match (l.as_literal(), r.as_literal()) {
        (Some(Literal::String(_)), _) => call(l.clone(), "equals", vec![r.clone()], JavaType::Boolean),
        (_, Some(Literal::String(_))) => call(r.clone(), "equals", vec![l.clone()], JavaType::Boolean),
        _ => Expr::static_call(OBJECTS, "equals", vec![l.clone(), r.clone()], JavaType::Boolean),
    };
    if op.is_relational() {
        let jop = native_operator(op).unwrap_or_else(|| panic!("BUG: {} is relational", op));
        let order = call(l, "compareTo", vec![r], JavaType::Int);
        return java_binary(jop, order, Expr::int(0));
    }
    match op {
        BinaryOp::Equal | BinaryOp::ExactEqual | BinaryOp::WildEqual => equal,
        BinaryOp::NotEqual | BinaryOp::ExactNotEqual | BinaryOp::WildNotEqual => equal.not(),
        other => panic!("BUG: string strategy selected for {}", other),
    }
}

/// Fold a comparison of a boolean against the literal 0 or 1. Java cannot compare a
/// boolean with a number, and the result is known for any other literal. Returns the
/// operands back when no fold applies.
pub fn fold_boolean_literal_compare(op: BinaryOp, lhs: Expr, rhs: Expr) -> std::result::Result<Expr, (Expr, Expr)> {
    let equal = matches!(op, BinaryOp::Equal | BinaryOp::ExactEqual | BinaryOp::WildEqual);
    let not_equal = matches!(op, BinaryOp::NotEqual | BinaryOp::ExactNotEqual | BinaryOp::WildNotEqual);
    if !(equal || not_equal) {
        return Err((lhs, rhs));
    }
    let literal = |e: &Expr| match e.ty {
        JavaType::Int | JavaType::Long => e.int_value(),
        JavaType::BitVector(_) => bit_vector_literal(e).map(|(_, v)| v),
        _ => None,
    };
    let (flag, value) = match (&lhs.ty, &rhs.ty) {
        (JavaType::Boolean, _) => match literal(&rhs) {
            Some(value) => (lhs, value),
            None => return Err((lhs, rhs)),
        },
        (_, JavaType::Boolean) => match literal(&lhs) {
            Some(value) => (rhs, value),
            None => return Err((lhs, rhs)),
        },
        _ => return Err((lhs, rhs)),
    };
    let folded = match value {
        1 => flag,
        0 => flag.not(),
        // Keep the evaluation, drop the value
        _ if flag.has_side_effects() => {
            Expr::binary(JBinaryOp::And, flag, Expr::bool(false), JavaType::Boolean)
        }
        _ => Expr::bool(false),
    };
    Ok(if not_equal { folded.not() } else { folded })
}
