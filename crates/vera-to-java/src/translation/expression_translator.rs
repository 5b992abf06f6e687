// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Expression translation from Vera expressions to Java expressions
//!
//! Every expression produces a `ConvertedExpression`: the Java value plus the statements
//! that must run before and after it. Operand evaluation order is kept left to right:
//! when a later operand needs statements, earlier operand values are captured first.

use super::utilities::{convert_to, default_value, fill_array, needs_fill};
use super::{assignment_translator, call_translator};
use crate::builtins;
use crate::context::TranslationContext;
use crate::converted_expression::ConvertedExpression;
use crate::error::{Result, TranslationError};
use crate::expression_converter::{self as conv, bit_constant, int_literal, new_bit_vector};
use crate::lhs::{self, translate_lhs, Access, Lhs};
use crate::operation_builder::{fold_boolean_literal_compare, OperationBuilder, Operand};
use java_schema::runtime::JUNO;
use java_schema::{BinaryOp as JBinaryOp, Expr, JavaType, Stmt};
use log::trace;
use vera_model::literal::BitState;
use vera_model::{BinaryOp, BitLiteral, Expr as VeraExpr, ExprKind, UnaryOp};

/// What the consumer of an expression wants, used to size context-determined
/// operations and to type `null`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expected {
    pub ty: Option<JavaType>,
    pub width: Option<u32>,
}

impl Expected {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn of(ty: &JavaType) -> Self {
        Self {
            ty: Some(ty.clone()),
            width: match ty {
                JavaType::BitVector(width) => *width,
                _ => None,
            },
        }
    }

    pub fn width(width: Option<u32>) -> Self {
        Self { ty: None, width }
    }
}

pub fn translate(ctx: &mut TranslationContext<'_, '_>, expr: &VeraExpr) -> Result<ConvertedExpression> {
    translate_with(ctx, expr, &Expected::none())
}

pub fn translate_with(
    ctx: &mut TranslationContext<'_, '_>,
    expr: &VeraExpr,
    expected: &Expected,
) -> Result<ConvertedExpression> {
    trace!("translating {} at {}", expr.kind.describe(), expr.loc);
    translate_kind(ctx, expr, expected).map_err(|e| e.or_loc(expr.loc))
}

/// Translate `expr`, moving its statements into `conv` and returning the value
pub fn translate_value(
    ctx: &mut TranslationContext<'_, '_>,
    expr: &VeraExpr,
    conv: &mut ConvertedExpression,
) -> Result<Expr> {
    translate_value_with(ctx, expr, &Expected::none(), conv)
}

pub fn translate_value_with(
    ctx: &mut TranslationContext<'_, '_>,
    expr: &VeraExpr,
    expected: &Expected,
    conv: &mut ConvertedExpression,
) -> Result<Expr> {
    let translated = translate_with(ctx, expr, expected)?;
    match conv.merge(translated) {
        Some(value) => Ok(value),
        None => Err(TranslationError::unsupported(
            format!("{} without a value used as a value", expr.kind.describe()),
            expr.loc,
        )),
    }
}

/// Translate `expr` and convert the value to `ty`
pub fn translate_as(
    ctx: &mut TranslationContext<'_, '_>,
    expr: &VeraExpr,
    ty: &JavaType,
    conv: &mut ConvertedExpression,
) -> Result<Expr> {
    let value = translate_value_with(ctx, expr, &Expected::of(ty), conv)?;
    convert_to(ctx, value, ty, expr.ty.is_signed(), expr.kind.describe(), expr.loc)
}

/// Translate a condition; X and Z count as false
pub fn translate_condition(
    ctx: &mut TranslationContext<'_, '_>,
    expr: &VeraExpr,
    conv: &mut ConvertedExpression,
) -> Result<Expr> {
    let value = translate_value(ctx, expr, conv)?;
    conv::to_boolean(value, false).map_err(|e| e.at("condition", expr.loc))
}

/// Merge translated operands in order. Values of earlier operands are captured when a
/// later operand needs statements that could observe or change them.
pub fn sequence(
    ctx: &mut TranslationContext<'_, '_>,
    operands: Vec<ConvertedExpression>,
    conv: &mut ConvertedExpression,
) -> Vec<Expr> {
    let mut values: Vec<Expr> = vec![];
    for operand in operands {
        if operand.has_init() {
            for value in values.iter_mut() {
                if !value.is_simple() {
                    let mut init = vec![];
                    *value = ctx.capture("tmp", value.clone(), &mut init);
                    conv.add_inits(init);
                }
            }
        }
        if let Some(value) = conv.merge(operand) {
            values.push(value);
        }
    }
    values
}

fn translate_kind(
    ctx: &mut TranslationContext<'_, '_>,
    expr: &VeraExpr,
    expected: &Expected,
) -> Result<ConvertedExpression> {
    let value = match &expr.kind {
        // === Literals ===
        ExprKind::IntegerLiteral(v) => int_literal(*v),
        ExprKind::BitLiteral(lit) => translate_bit_literal(lit),
        ExprKind::StringLiteral(s) => Expr::string(s.clone()),
        ExprKind::NullLiteral => match &expected.ty {
            Some(ty) if ty.is_reference() => Expr::null(ty.clone()),
            _ => Expr::null(JavaType::Null),
        },
        ExprKind::EnumValue { enum_id, index } => {
            let name = ctx.session.enum_name(*enum_id);
            let decl = ctx.session.symbols.enum_decl(*enum_id);
            let Some(value) = decl.values.get(*index) else {
                panic!("BUG: enum {} has no value #{}", decl.name, index);
            };
            let constant = java_schema::naming::escape_identifier(&value.name);
            Expr::static_field(name.clone(), constant, JavaType::Enum(name))
        }

        // === References ===
        ExprKind::This => match ctx.this_type() {
            Some(ty) if !ctx.is_static => Expr::this(ty),
            _ => return Err(TranslationError::unsupported("`this` outside of an instance method", expr.loc)),
        },
        ExprKind::Var(id) => ctx.var_info(*id).reference(),
        ExprKind::Member { .. } => {
            let mut conv = ConvertedExpression::empty();
            let lhs = translate_lhs(ctx, expr, Access::READ, &mut conv)?;
            let value = match lhs {
                // Signals stay objects so they can be passed on
                Lhs::Simple(simple) => simple.target,
                other => other.read(),
            };
            return Ok(conv.with_value(value));
        }
        ExprKind::Index { .. } | ExprKind::BitSlice { .. } | ExprKind::RangeSlice { .. } => {
            let mut conv = ConvertedExpression::empty();
            let lhs = translate_lhs(ctx, expr, Access::READ, &mut conv)?;
            let value = lhs.read();
            return Ok(conv.with_value(value));
        }
        ExprKind::Concat(parts) => return translate_concat(ctx, parts, expr),
        ExprKind::Replicate { count, elements } => {
            let mut conv = translate_concat(ctx, elements, expr)?;
            let count = translate_as(ctx, count, &JavaType::Int, &mut conv)?;
            let inner = conv
                .take_value()
                .unwrap_or_else(|| panic!("BUG: concatenation without a value"));
            let width = match (inner.ty.bit_width(), count.int_value()) {
                (Some(w), Some(n)) => u32::try_from(n).ok().map(|n| w * n),
                _ => None,
            };
            let value = Expr::call(inner, "replicate", vec![count], JavaType::BitVector(width));
            return Ok(conv.with_value(value));
        }

        // === Operators ===
        ExprKind::Unary { op, operand } => return translate_unary(ctx, *op, operand, expected, expr),
        ExprKind::Binary { op, lhs, rhs } if op.is_logical() => {
            return translate_logical(ctx, *op, lhs, rhs);
        }
        ExprKind::Binary { op, lhs, rhs } => return translate_binary(ctx, *op, lhs, rhs, expected, expr),
        ExprKind::IncDec { op, target } => return assignment_translator::translate_inc_dec(ctx, *op, target),
        ExprKind::Assign { target, value } => return assignment_translator::translate_assign(ctx, target, value),
        ExprKind::CompoundAssign { op, target, value } => {
            return assignment_translator::translate_compound(ctx, *op, target, value);
        }
        ExprKind::Conditional {
            cond,
            then_expr,
            else_expr,
        } => return translate_conditional(ctx, cond, then_expr, else_expr, expected),

        // === Calls and allocation ===
        ExprKind::Call { .. } | ExprKind::MethodCall { .. } | ExprKind::SuperCall { .. } | ExprKind::New { .. } => {
            return call_translator::translate_call(ctx, expr);
        }
        ExprKind::BuiltinCall { name, receiver, args } => {
            return builtins::translate_builtin(ctx, name, receiver.as_deref(), args, expr);
        }
        ExprKind::NewArray { size, source } => return translate_new_array(ctx, size, source.as_deref(), expr),

        // === Signals ===
        ExprKind::Sample { signal, depth } => {
            let mut conv = ConvertedExpression::empty();
            let signal_value = translate_value(ctx, signal, &mut conv)?;
            let JavaType::Signal { width, .. } = signal_value.ty else {
                return Err(TranslationError::unsupported(
                    format!("sampling a value of type {}", signal_value.ty),
                    expr.loc,
                ));
            };
            let args = match depth {
                Some(depth) => vec![translate_as(ctx, depth, &JavaType::Int, &mut conv)?],
                None => vec![],
            };
            let value = Expr::call(signal_value, "sample", args, JavaType::bit_vector(width));
            return Ok(conv.with_value(value));
        }

        ExprKind::VoidLiteral
        | ExprKind::Super
        | ExprKind::InSet { .. }
        | ExprKind::Dist { .. }
        | ExprKind::HdlTaskCall { .. } => {
            return Err(TranslationError::unsupported(expr.kind.describe(), expr.loc));
        }
    };
    Ok(ConvertedExpression::of(value))
}

// ============================================================================
// Literals

fn translate_bit_literal(lit: &BitLiteral) -> Expr {
    if lit.width() == 1 {
        return bit_constant(match lit.bit(0) {
            BitState::Zero => "ZERO",
            BitState::One => "ONE",
            BitState::X => "X",
            BitState::Z => "Z",
        });
    }
    match lit.to_u64() {
        Some(v) if lit.width() <= 64 => new_bit_vector(lit.width(), int_literal(v as i64)),
        _ => Expr::new_object(JavaType::bit_vector(lit.width()), vec![Expr::string(lit.to_string())]),
    }
}

// ============================================================================
// Concatenation

fn translate_concat(
    ctx: &mut TranslationContext<'_, '_>,
    parts: &[VeraExpr],
    expr: &VeraExpr,
) -> Result<ConvertedExpression> {
    let mut conv = ConvertedExpression::empty();
    let mut translated = vec![];
    for part in parts {
        translated.push(translate(ctx, part)?);
    }
    let values = sequence(ctx, translated, &mut conv);
    let mut bits = vec![];
    for value in values {
        bits.push(lhs::bit_view(value).map_err(|e| e.at("concatenation", expr.loc))?);
    }
    let width: Option<u32> = bits.iter().map(|b| b.ty.bit_width()).sum();
    let mut bits = bits.into_iter();
    let Some(first) = bits.next() else {
        return Err(TranslationError::unsupported("empty concatenation", expr.loc));
    };
    let value = bits.fold(first, |high, low| {
        Expr::call(high, "concat", vec![low], JavaType::BitVector(width))
    });
    Ok(conv.with_value(value))
}

// ============================================================================
// Operators

fn operand(value: Expr, source: &VeraExpr) -> Operand {
    Operand::new(value, source.ty.is_signed())
}

fn translate_unary(
    ctx: &mut TranslationContext<'_, '_>,
    op: UnaryOp,
    operand_expr: &VeraExpr,
    expected: &Expected,
    expr: &VeraExpr,
) -> Result<ConvertedExpression> {
    let mut conv = ConvertedExpression::empty();
    if op == UnaryOp::LogicalNot {
        let value = translate_value(ctx, operand_expr, &mut conv)?;
        // An unknown operand stays unknown, which is not true
        let value = conv::to_boolean(value, true).map_err(|e| e.at("logical negation", expr.loc))?;
        return Ok(conv.with_value(value.not()));
    }
    let operand_expected = if op.is_reduction() {
        Expected::none()
    } else {
        Expected::width(expected.width)
    };
    let value = translate_value_with(ctx, operand_expr, &operand_expected, &mut conv)?;
    let Some(builder) = OperationBuilder::select_unary(&value.ty, expected.width) else {
        return Err(TranslationError::unsupported(
            format!("operator {} on a value of type {}", op.symbol(), value.ty),
            expr.loc,
        ));
    };
    let result = builder
        .unary(op, operand(value, operand_expr))
        .map_err(|e| e.at(format!("operator {}", op.symbol()), expr.loc))?;
    Ok(conv.with_value(result))
}

fn translate_binary(
    ctx: &mut TranslationContext<'_, '_>,
    op: BinaryOp,
    lhs: &VeraExpr,
    rhs: &VeraExpr,
    expected: &Expected,
    expr: &VeraExpr,
) -> Result<ConvertedExpression> {
    let (lhs_expected, rhs_expected) = if op.is_shift() {
        (Expected::width(expected.width), Expected::none())
    } else if op.is_width_preserving() {
        (Expected::width(expected.width), Expected::width(expected.width))
    } else {
        (Expected::none(), Expected::none())
    };
    let mut conv = ConvertedExpression::empty();
    let translated = vec![
        translate_with(ctx, lhs, &lhs_expected)?,
        translate_with(ctx, rhs, &rhs_expected)?,
    ];
    let mut values = sequence(ctx, translated, &mut conv).into_iter();
    let (Some(l), Some(r)) = (values.next(), values.next()) else {
        return Err(TranslationError::unsupported(
            format!("operator {} on a void operand", op),
            expr.loc,
        ));
    };
    let (l, r) = match fold_boolean_literal_compare(op, l, r) {
        Ok(folded) => return Ok(conv.with_value(folded)),
        Err(operands) => operands,
    };
    let Some(builder) = OperationBuilder::select(op, &l.ty, &r.ty, expected.width) else {
        return Err(TranslationError::conversion(&r.ty, &l.ty, format!("operator {}", op), expr.loc));
    };
    trace!("operator {} uses {:?}", op, builder);
    let value = builder
        .binary(op, operand(l, lhs), operand(r, rhs))
        .map_err(|e| e.at(format!("operator {}", op), expr.loc))?;
    Ok(conv.with_value(value))
}

/// `&&` and `||`. The right operand only runs when needed; if it carries statements the
/// operator becomes a flag variable and an `if`.
fn translate_logical(
    ctx: &mut TranslationContext<'_, '_>,
    op: BinaryOp,
    lhs: &VeraExpr,
    rhs: &VeraExpr,
) -> Result<ConvertedExpression> {
    let mut conv = ConvertedExpression::empty();
    let left = translate_condition(ctx, lhs, &mut conv)?;
    let mut right_conv = ConvertedExpression::empty();
    let right = translate_condition(ctx, rhs, &mut right_conv)?;
    let jop = if op == BinaryOp::LogicalAnd {
        JBinaryOp::And
    } else {
        JBinaryOp::Or
    };
    if !right_conv.has_statements() {
        return Ok(conv.with_value(Expr::binary(jop, left, right, JavaType::Boolean)));
    }
    let (decl, flag) = ctx.declare_var("cond", JavaType::Boolean, Some(left));
    conv.add_init(decl);
    let (init, _, update) = right_conv.into_parts();
    let mut branch = init;
    branch.push(Stmt::expr(Expr::assign(flag.clone(), right)));
    branch.extend(update);
    let guard = if op == BinaryOp::LogicalAnd {
        flag.clone()
    } else {
        flag.clone().not()
    };
    conv.add_init(Stmt::if_then(guard, Stmt::from_stmts(branch)));
    Ok(conv.with_value(flag))
}

/// Type both branches of a conditional are converted to. Bit vectors widen, mixed
/// strings become `JunoString`, numerics take the wider rank, and only then do
/// reference types fall back to schema assignability.
fn common_type(ctx: &TranslationContext<'_, '_>, a: &JavaType, b: &JavaType) -> Option<JavaType> {
    use JavaType::*;
    if a == b {
        return Some(match (a, b) {
            (BitVector(x), BitVector(y)) => BitVector(x.zip(*y).map(|(x, y)| x.max(y))),
            _ => a.clone(),
        });
    }
    let integral = a.is_dv_integral() && b.is_dv_integral();
    if integral && (matches!(a, BitVector(_)) || matches!(b, BitVector(_))) {
        let width = crate::lhs::part_width(a).zip(crate::lhs::part_width(b)).map(|(x, y)| x.max(y));
        return Some(BitVector(width));
    }
    if a.is_string_like() && b.is_string_like() {
        return Some(JunoString);
    }
    if integral {
        let rank = |t: &JavaType| match t {
            Boolean => 0,
            Bit => 1,
            Enum(_) | Int => 2,
            Long => 3,
            Integer => 4,
            _ => 5,
        };
        let wider = if rank(a) >= rank(b) { a } else { b };
        return Some(match wider {
            Enum(_) => Int,
            other => other.clone(),
        });
    }
    let schema = &ctx.session.schema;
    if schema.is_assignable_from(a, b) {
        return Some(a.clone());
    }
    if schema.is_assignable_from(b, a) {
        return Some(b.clone());
    }
    None
}

fn translate_conditional(
    ctx: &mut TranslationContext<'_, '_>,
    cond: &VeraExpr,
    then_expr: &VeraExpr,
    else_expr: &VeraExpr,
    expected: &Expected,
) -> Result<ConvertedExpression> {
    let mut conv = ConvertedExpression::empty();
    let condition = translate_condition(ctx, cond, &mut conv)?;
    let mut then_conv = translate_with(ctx, then_expr, expected)?;
    let mut else_conv = translate_with(ctx, else_expr, expected)?;
    let (Some(then_value), Some(else_value)) = (then_conv.take_value(), else_conv.take_value()) else {
        return Err(TranslationError::unsupported("conditional with a void branch", then_expr.loc));
    };
    let ty = match &expected.ty {
        Some(ty) => ty.clone(),
        None => common_type(ctx, &then_value.ty, &else_value.ty).ok_or_else(|| {
            TranslationError::conversion(&else_value.ty, &then_value.ty, "conditional expression", else_expr.loc)
        })?,
    };
    let then_value = convert_to(ctx, then_value, &ty, then_expr.ty.is_signed(), "conditional branch", then_expr.loc)?;
    let else_value = convert_to(ctx, else_value, &ty, else_expr.ty.is_signed(), "conditional branch", else_expr.loc)?;
    if !then_conv.has_statements() && !else_conv.has_statements() {
        return Ok(conv.with_value(Expr::conditional(condition, then_value, else_value)));
    }
    // Branch statements must only run on their own branch
    let (decl, result) = ctx.declare_var("sel", ty, None);
    conv.add_init(decl);
    let branch = |value_conv: ConvertedExpression, value: Expr| {
        let (init, _, update) = value_conv.into_parts();
        let mut stmts = init;
        stmts.push(Stmt::expr(Expr::assign(result.clone(), value)));
        stmts.extend(update);
        Stmt::from_stmts(stmts)
    };
    let then_stmt = branch(then_conv, then_value);
    let else_stmt = branch(else_conv, else_value);
    conv.add_init(Stmt::if_else(condition, then_stmt, else_stmt));
    Ok(conv.with_value(result))
}

// ============================================================================
// Allocation

fn translate_new_array(
    ctx: &mut TranslationContext<'_, '_>,
    size: &VeraExpr,
    source: Option<&VeraExpr>,
    expr: &VeraExpr,
) -> Result<ConvertedExpression> {
    let ty = ctx.session.translate_type(&expr.ty);
    let JavaType::Array(element) = &ty else {
        return Err(TranslationError::unsupported(
            format!("dynamic allocation of type {}", ty),
            expr.loc,
        ));
    };
    let element = (**element).clone();
    let mut conv = ConvertedExpression::empty();
    let mut translated = vec![];
    let mut size_conv = ConvertedExpression::empty();
    let size_value = translate_as(ctx, size, &JavaType::Int, &mut size_conv)?;
    translated.push(size_conv.with_value(size_value));
    if let Some(source) = source {
        let mut source_conv = ConvertedExpression::empty();
        let source_value = translate_as(ctx, source, &ty, &mut source_conv)?;
        translated.push(source_conv.with_value(source_value));
    }
    let mut values = sequence(ctx, translated, &mut conv).into_iter();
    let Some(size) = values.next() else {
        panic!("BUG: array size vanished");
    };
    let value = match values.next() {
        Some(source) => Expr::static_call(JUNO, "resize", vec![source, size], ty.clone()),
        None if needs_fill(&element) => fill_array(Expr::new_array(element.clone(), size), default_value(&element)),
        None => Expr::new_array(element, size),
    };
    Ok(conv.with_value(value))
}
