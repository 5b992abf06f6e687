// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Representation conversions between target types
//!
//! Every `to_*` function has a matching `has_*_conversion` predicate so overload
//! resolution can score candidates without building expressions. Conversions that can
//! lose X/Z information go through checked runtime calls that throw on X/Z.
//!
//! Assignability between classes is a schema question and is answered by the caller
//! before reaching this module; here class types convert only to themselves.

use crate::error::ConversionError;
use java_schema::runtime::{BIT, BIT_OP, BIT_VECTOR, INT_OP, UNDEFINED};
use java_schema::{BinaryOp, Expr, ExprKind, JavaType, Literal};

type Result<T> = std::result::Result<T, ConversionError>;

fn fail<T>(expr: &Expr, to: &JavaType) -> Result<T> {
    Err(ConversionError::new(&expr.ty, to))
}

// ============================================================================
// Literal folding helpers

/// `Bit.ZERO` / `Bit.ONE` / `Bit.X` / `Bit.Z`
pub fn bit_constant(name: &str) -> Expr {
    Expr::static_field(BIT, name, JavaType::Bit)
}

fn bit_constant_name(expr: &Expr) -> Option<&str> {
    match &expr.kind {
        ExprKind::StaticField { class, name } if class == BIT => Some(name.as_str()),
        _ => None,
    }
}

/// Width and value of `new BitVector(w, v)`
pub fn bit_vector_literal(expr: &Expr) -> Option<(u32, i64)> {
    match (&expr.kind, &expr.ty) {
        (ExprKind::New { args }, JavaType::BitVector(_)) if args.len() == 2 => {
            let width = args[0].int_value()?;
            let value = args[1].int_value()?;
            Some((u32::try_from(width).ok()?, value))
        }
        _ => None,
    }
}

/// Integral literal of the given Java type, `long` when the value does not fit `int`
pub fn int_literal(value: i64) -> Expr {
    match i32::try_from(value) {
        Ok(v) => Expr::int(v),
        Err(_) => Expr::long(value),
    }
}

/// `new BitVector(width, value)`
pub fn new_bit_vector(width: u32, value: Expr) -> Expr {
    Expr::new_object(JavaType::bit_vector(width), vec![Expr::int(width as i32), value])
}

fn truncate(value: i64, width: u32) -> i64 {
    if width >= 64 {
        value
    } else {
        value & ((1i64 << width) - 1)
    }
}

fn retype(mut expr: Expr, ty: JavaType) -> Expr {
    expr.ty = ty;
    expr
}

fn method(target: Expr, name: &str, args: Vec<Expr>, ty: JavaType) -> Expr {
    Expr::call(target, name, args, ty)
}

// ============================================================================
// Boolean

pub fn has_boolean_conversion(from: &JavaType) -> bool {
    matches!(
        from,
        JavaType::Boolean
            | JavaType::Char
            | JavaType::Int
            | JavaType::Long
            | JavaType::Bit
            | JavaType::BitVector(_)
            | JavaType::Integer
            | JavaType::Enum(_)
            | JavaType::Class(_)
            | JavaType::Null
    )
}

/// Truthiness of a value. `xz_true` selects whether X/Z count as true, which logical
/// negation needs so that `!x` stays false for an unknown `x`.
pub fn to_boolean(expr: Expr, xz_true: bool) -> Result<Expr> {
    let test = if xz_true { "isNotFalse" } else { "isTrue" };
    match &expr.ty {
        JavaType::Boolean => Ok(expr),
        JavaType::Char | JavaType::Int | JavaType::Long => match expr.int_value() {
            Some(v) => Ok(Expr::bool(v != 0)),
            None => {
                let zero = if expr.ty == JavaType::Long { Expr::long(0) } else { Expr::int(0) };
                Ok(Expr::binary(BinaryOp::Ne, expr, zero, JavaType::Boolean))
            }
        },
        JavaType::Bit => match bit_constant_name(&expr) {
            Some("ONE") => Ok(Expr::bool(true)),
            Some("ZERO") => Ok(Expr::bool(false)),
            Some(_) => Ok(Expr::bool(xz_true)),
            None => Ok(method(expr, test, vec![], JavaType::Boolean)),
        },
        JavaType::BitVector(_) => match bit_vector_literal(&expr) {
            Some((w, v)) => Ok(Expr::bool(truncate(v, w) != 0)),
            None => Ok(method(expr, test, vec![], JavaType::Boolean)),
        },
        JavaType::Integer => Ok(Expr::static_call(INT_OP, test, vec![expr], JavaType::Boolean)),
        JavaType::Enum(_) => {
            let value = to_int(expr)?;
            Ok(Expr::binary(BinaryOp::Ne, value, Expr::int(0), JavaType::Boolean))
        }
        JavaType::Class(_) | JavaType::Null => {
            Ok(Expr::binary(BinaryOp::Ne, expr, Expr::null(JavaType::Null), JavaType::Boolean))
        }
        _ => fail(&expr, &JavaType::Boolean),
    }
}

// ============================================================================
// Bit

pub fn has_bit_conversion(from: &JavaType) -> bool {
    matches!(
        from,
        JavaType::Bit
            | JavaType::Boolean
            | JavaType::BitVector(_)
            | JavaType::Int
            | JavaType::Long
            | JavaType::Integer
            | JavaType::Enum(_)
    )
}

pub fn to_bit(expr: Expr) -> Result<Expr> {
    match &expr.ty {
        JavaType::Bit => Ok(expr),
        JavaType::Boolean => match expr.as_literal() {
            Some(Literal::Boolean(b)) => Ok(bit_constant(if *b { "ONE" } else { "ZERO" })),
            _ => Ok(Expr::static_call(BIT, "valueOf", vec![expr], JavaType::Bit)),
        },
        JavaType::BitVector(_) => match bit_vector_literal(&expr) {
            Some((_, v)) => Ok(bit_constant(if v & 1 == 1 { "ONE" } else { "ZERO" })),
            None => Ok(method(expr, "getBit", vec![Expr::int(0)], JavaType::Bit)),
        },
        JavaType::Int | JavaType::Long => match expr.int_value() {
            Some(v) => Ok(bit_constant(if v & 1 == 1 { "ONE" } else { "ZERO" })),
            None => {
                let one = if expr.ty == JavaType::Long { Expr::long(1) } else { Expr::int(1) };
                let zero = if expr.ty == JavaType::Long { Expr::long(0) } else { Expr::int(0) };
                let ty = expr.ty.clone();
                let low = Expr::binary(BinaryOp::BitAnd, expr, one, ty);
                let set = Expr::binary(BinaryOp::Ne, low, zero, JavaType::Boolean);
                Ok(Expr::static_call(BIT, "valueOf", vec![set], JavaType::Bit))
            }
        },
        JavaType::Integer => Ok(Expr::static_call(INT_OP, "toBit", vec![expr], JavaType::Bit)),
        JavaType::Enum(_) => to_bit(to_int(expr)?),
        _ => fail(&expr, &JavaType::Bit),
    }
}

// ============================================================================
// BitVector

pub fn has_bit_vector_conversion(from: &JavaType) -> bool {
    matches!(
        from,
        JavaType::BitVector(_)
            | JavaType::Bit
            | JavaType::Boolean
            | JavaType::Char
            | JavaType::Int
            | JavaType::Long
            | JavaType::Integer
            | JavaType::Enum(_)
            | JavaType::Signal { .. }
    )
}

/// Convert to a bit vector of exactly `width` bits, truncating or extending as
/// needed. With no width the natural width of the source is kept.
pub fn to_bit_vector(expr: Expr, width: Option<u32>, signed: bool) -> Result<Expr> {
    let natural = match &expr.ty {
        JavaType::BitVector(_) => expr,
        JavaType::Bit => match bit_constant_name(&expr) {
            Some("ONE") => new_bit_vector(1, Expr::int(1)),
            Some("ZERO") => new_bit_vector(1, Expr::int(0)),
            _ => Expr::static_call(BIT_VECTOR, "fromBit", vec![expr], JavaType::bit_vector(1)),
        },
        JavaType::Boolean => match expr.as_literal() {
            Some(Literal::Boolean(b)) => new_bit_vector(1, Expr::int(*b as i32)),
            _ => {
                let bit = to_bit(expr)?;
                Expr::static_call(BIT_VECTOR, "fromBit", vec![bit], JavaType::bit_vector(1))
            }
        },
        JavaType::Char | JavaType::Int | JavaType::Long => {
            // Java widening sign-extends, which matches Vera integer semantics
            let w = width.unwrap_or(if expr.ty == JavaType::Long { 64 } else { 32 });
            return Ok(match expr.int_value() {
                Some(v) => new_bit_vector(w, int_literal(truncate(v, w))),
                None => new_bit_vector(w, expr),
            });
        }
        JavaType::Integer => {
            let w = width.unwrap_or(32);
            return Ok(Expr::static_call(
                INT_OP,
                "toBitVector",
                vec![expr, Expr::int(w as i32)],
                JavaType::bit_vector(w),
            ));
        }
        JavaType::Enum(_) => {
            let w = width.unwrap_or(32);
            return to_bit_vector(to_int(expr)?, Some(w), true);
        }
        JavaType::Signal { width: sw, .. } => {
            let sw = *sw;
            method(expr, "sample", vec![], JavaType::bit_vector(sw))
        }
        _ => return fail(&expr, &JavaType::BitVector(width)),
    };
    Ok(resize(natural, width, signed))
}

fn resize(expr: Expr, width: Option<u32>, signed: bool) -> Expr {
    let Some(w) = width else {
        return expr;
    };
    let current = expr.ty.bit_width();
    if current == Some(w) {
        return expr;
    }
    if let Some((cw, v)) = bit_vector_literal(&expr) {
        if cw <= 64 && w <= 64 && !(signed && w > cw) {
            return new_bit_vector(w, int_literal(truncate(v, w.min(cw))));
        }
    }
    let name = match current {
        Some(c) if signed && w > c => "signExtend",
        _ => "resize",
    };
    method(expr, name, vec![Expr::int(w as i32)], JavaType::bit_vector(w))
}

/// Widen a bit vector operand to `width` for context-determined evaluation. Never
/// truncates; unknown source widths go through a checked runtime extension.
pub fn promote_width(expr: Expr, width: u32, signed: bool) -> Expr {
    match expr.ty.bit_width() {
        Some(current) if current >= width => expr,
        Some(_) => resize(expr, Some(width), signed),
        None => Expr::static_call(
            BIT_OP,
            "extendTo",
            vec![expr, Expr::int(width as i32), Expr::bool(signed)],
            JavaType::bit_vector(width),
        ),
    }
}

// ============================================================================
// int / long

pub fn has_int_conversion(from: &JavaType) -> bool {
    matches!(
        from,
        JavaType::Int
            | JavaType::Char
            | JavaType::Long
            | JavaType::Boolean
            | JavaType::Bit
            | JavaType::BitVector(_)
            | JavaType::Integer
            | JavaType::Enum(_)
    )
}

/// Convert to `int`. X/Z sources use checked runtime calls that throw on X/Z.
pub fn to_int(expr: Expr) -> Result<Expr> {
    match &expr.ty {
        JavaType::Int => Ok(expr),
        JavaType::Char => Ok(match expr.int_value() {
            Some(v) => int_literal(v),
            None => expr.cast(JavaType::Int),
        }),
        JavaType::Long => Ok(match expr.int_value() {
            Some(v) => Expr::int(v as i32),
            None => expr.cast(JavaType::Int),
        }),
        JavaType::Boolean => Ok(match expr.as_literal() {
            Some(Literal::Boolean(b)) => Expr::int(*b as i32),
            _ => Expr::conditional(expr, Expr::int(1), Expr::int(0)),
        }),
        JavaType::Bit => match bit_constant_name(&expr) {
            Some("ONE") => Ok(Expr::int(1)),
            Some("ZERO") => Ok(Expr::int(0)),
            _ => Ok(method(expr, "toInt", vec![], JavaType::Int)),
        },
        JavaType::BitVector(_) => match bit_vector_literal(&expr) {
            Some((w, v)) => Ok(Expr::int(truncate(v, w) as i32)),
            None => Ok(method(expr, "toInt", vec![], JavaType::Int)),
        },
        JavaType::Integer => Ok(Expr::static_call(INT_OP, "toInt", vec![expr], JavaType::Int)),
        JavaType::Enum(_) => Ok(method(expr, "getValue", vec![], JavaType::Int)),
        _ => fail(&expr, &JavaType::Int),
    }
}

pub fn has_long_conversion(from: &JavaType) -> bool {
    has_int_conversion(from)
}

pub fn to_long(expr: Expr) -> Result<Expr> {
    match &expr.ty {
        JavaType::Long => Ok(expr),
        JavaType::BitVector(_) => match bit_vector_literal(&expr) {
            Some((w, v)) => Ok(Expr::long(truncate(v, w))),
            None => Ok(method(expr, "toLong", vec![], JavaType::Long)),
        },
        _ => {
            let value = to_int(expr)?;
            Ok(match value.int_value() {
                Some(v) => Expr::long(v),
                None => value.cast(JavaType::Long),
            })
        }
    }
}

// ============================================================================
// Integer

pub fn has_integer_conversion(from: &JavaType) -> bool {
    has_int_conversion(from) || matches!(from, JavaType::Null)
}

/// Convert to boxed `Integer`, mapping X/Z to `null`
pub fn to_integer(expr: Expr) -> Result<Expr> {
    match &expr.ty {
        JavaType::Integer => Ok(expr),
        JavaType::Null => Ok(Expr::null(JavaType::Integer)),
        // Autoboxing covers primitive sources
        JavaType::Int | JavaType::Char | JavaType::Long | JavaType::Boolean | JavaType::Enum(_) => {
            Ok(retype(to_int(expr)?, JavaType::Integer))
        }
        JavaType::Bit | JavaType::BitVector(_) => {
            if bit_constant_name(&expr).map_or(false, |n| n == "X" || n == "Z") {
                return Ok(Expr::null(JavaType::Integer));
            }
            if let Some((w, v)) = bit_vector_literal(&expr) {
                return Ok(retype(Expr::int(truncate(v, w) as i32), JavaType::Integer));
            }
            Ok(method(expr, "toInteger", vec![], JavaType::Integer))
        }
        _ => fail(&expr, &JavaType::Integer),
    }
}

// ============================================================================
// Enums

pub fn has_enum_conversion(from: &JavaType) -> bool {
    match from {
        JavaType::Enum(_) | JavaType::Null => true,
        other => has_int_conversion(other),
    }
}

/// Convert to enum `name`. Checked conversions throw on values with no enumerator;
/// unchecked ones yield the `UNDEFINED` sentinel.
pub fn to_enum(expr: Expr, name: &str, checked: bool) -> Result<Expr> {
    let ty = JavaType::Enum(name.to_string());
    if expr.ty == ty {
        return Ok(expr);
    }
    match &expr.ty {
        JavaType::Null => Ok(Expr::static_field(name, UNDEFINED, ty)),
        _ => {
            let value = to_int(expr)?;
            let factory = if checked { "forValue" } else { "forValueOrUndefined" };
            Ok(Expr::static_call(name, factory, vec![value], ty))
        }
    }
}

// ============================================================================
// Strings

pub fn has_string_conversion(from: &JavaType) -> bool {
    matches!(from, JavaType::String | JavaType::JunoString | JavaType::Null)
}

pub fn to_string_value(expr: Expr) -> Result<Expr> {
    match &expr.ty {
        JavaType::String => Ok(expr),
        JavaType::Null => Ok(Expr::null(JavaType::String)),
        JavaType::JunoString => Ok(method(expr, "toString", vec![], JavaType::String)),
        _ => fail(&expr, &JavaType::String),
    }
}

pub fn has_juno_string_conversion(from: &JavaType) -> bool {
    has_string_conversion(from)
}

pub fn to_juno_string(expr: Expr) -> Result<Expr> {
    match &expr.ty {
        JavaType::JunoString => Ok(expr),
        JavaType::String | JavaType::Null => Ok(Expr::new_object(JavaType::JunoString, vec![expr])),
        _ => fail(&expr, &JavaType::JunoString),
    }
}

/// Fresh copy of a mutable string, used when a snapshot must not alias the original
pub fn copy_juno_string(expr: Expr) -> Expr {
    let text = method(expr, "toString", vec![], JavaType::String);
    Expr::new_object(JavaType::JunoString, vec![text])
}

// ============================================================================
// Object

pub fn has_object_conversion(from: &JavaType) -> bool {
    !matches!(from, JavaType::Void)
}

/// Boxing is implicit in Java, so any value is already an `Object`
pub fn to_object(expr: Expr) -> Expr {
    match &expr.ty {
        JavaType::JunoString => method(expr, "toString", vec![], JavaType::String),
        _ => expr,
    }
}

// ============================================================================
// Dispatch

/// Whether a conversion rule exists from `from` to `to`
pub fn has_conversion(from: &JavaType, to: &JavaType) -> bool {
    if from == to {
        return true;
    }
    match to {
        JavaType::Boolean => has_boolean_conversion(from),
        JavaType::Bit => has_bit_conversion(from),
        JavaType::BitVector(_) => has_bit_vector_conversion(from),
        JavaType::Int | JavaType::Char => has_int_conversion(from),
        JavaType::Long => has_long_conversion(from),
        JavaType::Integer => has_integer_conversion(from),
        JavaType::Enum(_) => has_enum_conversion(from),
        JavaType::String => has_string_conversion(from),
        JavaType::JunoString => has_juno_string_conversion(from),
        JavaType::Object => has_object_conversion(from),
        t if t.is_reference() => matches!(from, JavaType::Null),
        _ => false,
    }
}

/// Convert `expr` to `to` by representation rules alone
pub fn convert(expr: Expr, to: &JavaType, signed: bool) -> Result<Expr> {
    if &expr.ty == to && !matches!(to, JavaType::BitVector(Some(_))) {
        return Ok(expr);
    }
    match to {
        JavaType::Boolean => to_boolean(expr, false),
        JavaType::Bit => to_bit(expr),
        JavaType::BitVector(width) => to_bit_vector(expr, *width, signed),
        JavaType::Int => to_int(expr),
        JavaType::Char => Ok(to_int(expr)?.cast(JavaType::Char)),
        JavaType::Long => to_long(expr),
        JavaType::Integer => to_integer(expr),
        JavaType::Enum(name) => to_enum(expr, name, true),
        JavaType::String => to_string_value(expr),
        JavaType::JunoString => to_juno_string(expr),
        JavaType::Object => Ok(to_object(expr)),
        t if t.is_reference() && expr.ty == JavaType::Null => Ok(Expr::null(t.clone())),
        _ => fail(&expr, to),
    }
}

/// Number of non-trivial conversions needed, or `None` when there is no rule
pub fn conversion_cost(from: &JavaType, to: &JavaType) -> Option<u32> {
    if from == to {
        Some(0)
    } else if has_conversion(from, to) {
        Some(1)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use java_schema::render_expr_to_string;

    fn render(expr: Result<Expr>) -> String {
        render_expr_to_string(&expr.unwrap())
    }

    fn local(name: &str, ty: JavaType) -> Expr {
        Expr::local(name, ty)
    }

    #[test]
    fn test_truthiness_policies() {
        let b = local("b", JavaType::Bit);
        assert_snapshot!(render(to_boolean(b.clone(), false)), @"b.isTrue()");
        assert_snapshot!(render(to_boolean(b, true)), @"b.isNotFalse()");
        assert_snapshot!(render(to_boolean(local("i", JavaType::Integer), false)), @"IntOp.isTrue(i)");
        assert_snapshot!(render(to_boolean(local("n", JavaType::Int), false)), @"n != 0");
        assert_eq!(to_boolean(bit_constant("X"), true).unwrap(), Expr::bool(true));
    }

    #[test]
    fn test_checked_int_conversion() {
        let v = local("v", JavaType::bit_vector(8));
        assert_snapshot!(render(to_int(v)), @"v.toInt()");
        assert_snapshot!(render(to_int(local("i", JavaType::Integer))), @"IntOp.toInt(i)");
        assert_snapshot!(render(to_int(local("f", JavaType::Boolean))), @"f ? 1 : 0");
        assert_eq!(to_int(new_bit_vector(4, Expr::int(0x1f))).unwrap(), Expr::int(0xf));
    }

    #[test]
    fn test_bit_vector_width_changes() {
        let v = local("v", JavaType::bit_vector(8));
        assert_snapshot!(render(to_bit_vector(v.clone(), Some(16), false)), @"v.resize(16)");
        assert_snapshot!(render(to_bit_vector(v.clone(), Some(16), true)), @"v.signExtend(16)");
        assert_snapshot!(render(to_bit_vector(v.clone(), Some(4), true)), @"v.resize(4)");
        assert_eq!(to_bit_vector(v.clone(), Some(8), false).unwrap(), v);
        assert_snapshot!(render(to_bit_vector(local("n", JavaType::Int), Some(12), true)), @"new BitVector(12, n)");
        assert_snapshot!(render(to_bit_vector(Expr::int(-1), Some(4), true)), @"new BitVector(4, 15)");
    }

    #[test]
    fn test_promotion_never_truncates() {
        let v = local("v", JavaType::bit_vector(16));
        assert_eq!(promote_width(v.clone(), 8, false), v);
        let unknown = local("u", JavaType::BitVector(None));
        assert_snapshot!(render_expr_to_string(&promote_width(unknown, 8, false)), @"BitOp.extendTo(u, 8, false)");
    }

    #[test]
    fn test_integer_maps_xz_to_null() {
        assert_eq!(to_integer(bit_constant("X")).unwrap(), Expr::null(JavaType::Integer));
        let v = local("v", JavaType::bit_vector(8));
        assert_snapshot!(render(to_integer(v)), @"v.toInteger()");
        assert_snapshot!(render(to_integer(local("n", JavaType::Int))), @"n");
    }

    #[test]
    fn test_enum_conversions() {
        let n = local("n", JavaType::Int);
        assert_snapshot!(render(to_enum(n.clone(), "Color", true)), @"Color.forValue(n)");
        assert_snapshot!(render(to_enum(n, "Color", false)), @"Color.forValueOrUndefined(n)");
        assert_snapshot!(render(to_int(local("c", JavaType::Enum("Color".into())))), @"c.getValue()");
    }

    #[test]
    fn test_strings() {
        let s = local("s", JavaType::JunoString);
        assert_snapshot!(render(to_string_value(s)), @"s.toString()");
        assert_snapshot!(render(to_juno_string(local("t", JavaType::String))), @"new JunoString(t)");
        assert!(to_int(local("t", JavaType::String)).is_err());
    }

    #[test]
    fn test_predicates_match_conversions() {
        let samples = [
            JavaType::Boolean,
            JavaType::Int,
            JavaType::Long,
            JavaType::Bit,
            JavaType::bit_vector(8),
            JavaType::Integer,
            JavaType::String,
            JavaType::JunoString,
            JavaType::Enum("Color".into()),
        ];
        for from in &samples {
            for to in &samples {
                let converted = convert(local("x", from.clone()), to, false);
                assert_eq!(
                    has_conversion(from, to),
                    converted.is_ok(),
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
    }
}
