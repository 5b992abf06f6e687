// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Assignment translation
//!
//! Plain assignments, compound assignments and increment/decrement. Targets are
//! translated through the `lhs` family. Compound forms use the native Java operator
//! when the target is a plain `int`/`long` location without change notification, and
//! otherwise expand to `x = x op y` through the target's read/write pair.

use super::expression_translator::{sequence, translate_value_with, translate_with, Expected};
use super::utilities::convert_to;
use crate::context::TranslationContext;
use crate::converted_expression::{discard_value, ConvertedExpression};
use crate::error::{Result, TranslationError};
use crate::expression_converter as conv;
use crate::lhs::{translate_lhs, Access, Lhs};
use crate::operation_builder::{native_operator, OperationBuilder, Operand};
use java_schema::{BinaryOp as JBinaryOp, Expr, ExprKind, JavaType, UnaryOp as JUnaryOp};
use vera_model::{BinaryOp, Expr as VeraExpr, ExprKind as VeraExprKind, IncDecOp, Loc};

/// Convert a value for storage in a location of type `ty`. Mutable strings are copied
/// so the stored value does not alias its source.
pub fn store_conversion(
    ctx: &TranslationContext<'_, '_>,
    value: Expr,
    ty: &JavaType,
    signed: bool,
    loc: Loc,
) -> Result<Expr> {
    let converted = convert_to(ctx, value, ty, signed, "assignment", loc)?;
    Ok(match (&converted.ty, &converted.kind) {
        (JavaType::JunoString, ExprKind::New { .. }) => converted,
        (JavaType::JunoString, _) => conv::copy_juno_string(converted),
        _ => converted,
    })
}

/// The target is a plain native numeric location a Java operator can update in place
fn native_target(lhs: &Lhs) -> Option<&Expr> {
    match lhs {
        Lhs::Simple(simple) if simple.event.is_none() && !simple.is_signal() && simple.target.ty.is_numeric() => {
            Some(&simple.target)
        }
        _ => None,
    }
}

/// Merge the store into `conv`; the stored value becomes the expression's value
fn finish(mut conv: ConvertedExpression, write: ConvertedExpression) -> ConvertedExpression {
    if let Some(value) = conv.merge(write) {
        conv.set_value(value);
    }
    conv.set_optional_result(true);
    conv
}

pub fn translate_assign(
    ctx: &mut TranslationContext<'_, '_>,
    target: &VeraExpr,
    value: &VeraExpr,
) -> Result<ConvertedExpression> {
    let mut conv = ConvertedExpression::empty();
    let lhs = translate_lhs(ctx, target, Access::WRITE, &mut conv)?;
    let ty = lhs.result_type();
    let stored = translate_value_with(ctx, value, &Expected::of(&ty), &mut conv)?;
    let stored = store_conversion(ctx, stored, &ty, value.ty.is_signed(), value.loc)?;
    let write = lhs.write(ctx, stored)?;
    Ok(finish(conv, write))
}

pub fn translate_compound(
    ctx: &mut TranslationContext<'_, '_>,
    op: BinaryOp,
    target: &VeraExpr,
    value: &VeraExpr,
) -> Result<ConvertedExpression> {
    let mut conv = ConvertedExpression::empty();
    let lhs = translate_lhs(ctx, target, Access::READ_WRITE, &mut conv)?;
    let ty = lhs.result_type();

    if let (Some(location), Some(jop)) = (native_target(&lhs), native_operator(op)) {
        if has_native_compound(op) && (!op.is_shift() || shift_fits(value, &ty)) {
            let rhs_ty = if op.is_shift() { JavaType::Int } else { ty.clone() };
            let rhs = translate_value_with(ctx, value, &Expected::of(&rhs_ty), &mut conv)?;
            let rhs = convert_to(ctx, rhs, &rhs_ty, value.ty.is_signed(), op.symbol(), value.loc)?;
            let updated = Expr::compound_assign(jop, location.clone(), rhs);
            conv.set_value(updated);
            conv.set_optional_result(true);
            return Ok(conv);
        }
    }

    let width = lhs.static_width();
    let rhs_expected = if op.is_shift() {
        Expected::none()
    } else {
        Expected::width(width)
    };
    let translated = vec![
        ConvertedExpression::of(lhs.read()),
        translate_with(ctx, value, &rhs_expected)?,
    ];
    let mut values = sequence(ctx, translated, &mut conv).into_iter();
    let (Some(current), Some(rhs)) = (values.next(), values.next()) else {
        return Err(TranslationError::unsupported(
            format!("operator {}= with a void operand", op),
            value.loc,
        ));
    };
    let Some(builder) = OperationBuilder::select(op, &current.ty, &rhs.ty, width) else {
        return Err(TranslationError::conversion(&rhs.ty, &current.ty, format!("operator {}=", op), value.loc));
    };
    let result = builder
        .binary(op, Operand::new(current, target.ty.is_signed()), Operand::new(rhs, value.ty.is_signed()))
        .map_err(|e| e.at(format!("operator {}=", op), value.loc))?;
    let stored = store_conversion(ctx, result, &ty, target.ty.is_signed(), target.loc)?;
    let write = lhs.write(ctx, stored)?;
    Ok(finish(conv, write))
}

pub fn translate_inc_dec(
    ctx: &mut TranslationContext<'_, '_>,
    op: IncDecOp,
    target: &VeraExpr,
) -> Result<ConvertedExpression> {
    let mut conv = ConvertedExpression::empty();
    let lhs = translate_lhs(ctx, target, Access::READ_WRITE, &mut conv)?;

    if let Some(location) = native_target(&lhs) {
        let jop = match op {
            IncDecOp::PreIncrement => JUnaryOp::PreInc,
            IncDecOp::PreDecrement => JUnaryOp::PreDec,
            IncDecOp::PostIncrement => JUnaryOp::PostInc,
            IncDecOp::PostDecrement => JUnaryOp::PostDec,
        };
        conv.set_value(Expr::unary(jop, location.clone()));
        conv.set_optional_result(true);
        return Ok(conv);
    }

    let ty = lhs.result_type();
    let current = lhs.read();
    let operand = if op.is_prefix() {
        current
    } else {
        let (decl, old) = ctx.declare_temp("old", current);
        conv.add_init(decl);
        old
    };
    let arith = if op.is_increment() {
        BinaryOp::Add
    } else {
        BinaryOp::Subtract
    };
    let width = lhs.static_width();
    let Some(builder) = OperationBuilder::select(arith, &operand.ty, &JavaType::Int, width) else {
        return Err(TranslationError::unsupported(
            format!("increment of a value of type {}", operand.ty),
            target.loc,
        ));
    };
    let signed = target.ty.is_signed();
    let result = builder
        .binary(arith, Operand::new(operand.clone(), signed), Operand::new(Expr::int(1), true))
        .map_err(|e| e.at(format!("operator {}", arith), target.loc))?;
    let stored = store_conversion(ctx, result, &ty, signed, target.loc)?;
    let write = lhs.write(ctx, stored)?;
    if op.is_prefix() {
        return Ok(finish(conv, write));
    }
    // Postfix: the store runs as a statement and the saved value is the result
    let (init, stored, update) = write.into_parts();
    conv.add_inits(init);
    if let Some(stored) = stored {
        conv.add_inits(discard_value(stored));
    }
    conv.add_updates(update);
    conv.set_value(operand);
    conv.set_optional_result(true);
    Ok(conv)
}

/// Whether a compound shift by `amount` behaves the same in Java, which masks the
/// amount to the operand width
fn shift_fits(amount: &VeraExpr, ty: &JavaType) -> bool {
    let width = if *ty == JavaType::Long { 64 } else { 32 };
    matches!(amount.kind, VeraExprKind::IntegerLiteral(n) if (0..width).contains(&n))
}

/// Whether `op` has a compound form in Java
pub fn has_native_compound(op: BinaryOp) -> bool {
    native_operator(op).map_or(false, |jop| {
        !jop.is_comparison() && !matches!(jop, JBinaryOp::And | JBinaryOp::Or)
    }) && !matches!(op, BinaryOp::BitNand | BinaryOp::BitNor | BinaryOp::BitXnor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::TranslatorOptions;
    use crate::session::TranslationSession;
    use insta::assert_snapshot;
    use java_schema::{render_stmts_to_string, Block};
    use vera_model::{
        AnalysisResults, CompilationUnit, ExprKind as VeraExprKind, FuncId, FunctionDecl, NodeId, VarDecl, VarId,
        VeraType,
    };

    fn e(kind: VeraExprKind, ty: VeraType) -> VeraExpr {
        VeraExpr::new(NodeId(0), kind, ty)
    }

    fn var(id: u32, ty: VeraType) -> VeraExpr {
        e(VeraExprKind::Var(VarId(id)), ty)
    }

    fn int(v: i64) -> VeraExpr {
        e(VeraExprKind::IntegerLiteral(v), VeraType::Integer)
    }

    fn unit() -> CompilationUnit {
        let assoc = VeraType::AssocArray {
            element: Box::new(VeraType::Integer),
            key: vera_model::AssocKey::BitVector,
        };
        CompilationUnit {
            name: "top".into(),
            globals: vec![
                VarDecl::new(VarId(1), "count", VeraType::Integer),
                VarDecl::new(VarId(2), "table", assoc),
                VarDecl::new(VarId(3), "word", VeraType::bit(8)),
                VarDecl::new(VarId(4), "watched", VeraType::Integer),
            ],
            functions: vec![FunctionDecl::function(FuncId(0), "next", VeraType::Integer)],
            ..Default::default()
        }
    }

    fn facts() -> AnalysisResults {
        let mut facts = AnalysisResults::new();
        facts
            .mark_not_assigned_xz(VarId(1))
            .mark_not_assigned_xz(VarId(4))
            .mark_wait_var(VarId(4));
        facts.xz_free_returns.insert(FuncId(0));
        facts
    }

    fn render(conv: ConvertedExpression) -> String {
        render_stmts_to_string(&Block::new(conv.flatten()))
    }

    fn next() -> VeraExpr {
        e(
            VeraExprKind::Call {
                func: FuncId(0),
                args: vec![],
            },
            VeraType::Integer,
        )
    }

    #[test]
    fn test_native_compound_on_int() {
        let unit = unit();
        let facts = facts();
        let mut session = TranslationSession::new(&unit, &facts, TranslatorOptions::default());
        let mut ctx = TranslationContext::new(&mut session, None, true);
        let result = translate_compound(&mut ctx, BinaryOp::Add, &var(1, VeraType::Integer), &int(2)).unwrap();
        assert_snapshot!(render(result), @"Top.count += 2;\n");
        let result = translate_inc_dec(&mut ctx, IncDecOp::PostIncrement, &var(1, VeraType::Integer)).unwrap();
        assert_snapshot!(render(result), @"Top.count++;\n");
    }

    #[test]
    fn test_compound_on_assoc_element_evaluates_key_once() {
        let unit = unit();
        let facts = facts();
        let mut session = TranslationSession::new(&unit, &facts, TranslatorOptions::default());
        let mut ctx = TranslationContext::new(&mut session, None, true);
        let element = e(
            VeraExprKind::Index {
                array: Box::new(var(2, VeraType::Integer)),
                indices: vec![next()],
            },
            VeraType::Integer,
        );
        let result = translate_compound(&mut ctx, BinaryOp::Add, &element, &int(1)).unwrap();
        let text = render(result);
        assert_eq!(text.matches("Top.next()").count(), 1, "{}", text);
        assert!(text.contains("Top.table.put("), "{}", text);
    }

    #[test]
    fn test_wait_var_increment_notifies_on_change() {
        let unit = unit();
        let facts = facts();
        let mut session = TranslationSession::new(&unit, &facts, TranslatorOptions::default());
        let mut ctx = TranslationContext::new(&mut session, None, true);
        let result = translate_inc_dec(&mut ctx, IncDecOp::PreIncrement, &var(4, VeraType::Integer)).unwrap();
        assert_snapshot!(render(result), @r"
        final int old = Top.watched;
        Top.watched = Top.watched + 1;
        if (old != Top.watched) {
            Top.watched_event.trigger();
        }
        ");
    }

    #[test]
    fn test_assignment_to_bit_slice_keeps_value() {
        let unit = unit();
        let facts = facts();
        let mut session = TranslationSession::new(&unit, &facts, TranslatorOptions::default());
        let mut ctx = TranslationContext::new(&mut session, None, true);
        let slice = e(
            VeraExprKind::BitSlice {
                target: Box::new(var(3, VeraType::bit(8))),
                high: Box::new(int(3)),
                low: Box::new(int(0)),
            },
            VeraType::bit(4),
        );
        let result = translate_assign(&mut ctx, &slice, &var(1, VeraType::Integer)).unwrap();
        assert!(result.is_optional_result());
        let (init, value, _) = result.into_parts();
        assert!(value.is_some());
        let text = render_stmts_to_string(&Block::new(init));
        assert!(text.contains("Top.word = Top.word.setBits(3, 0, "), "{}", text);
    }

    #[test]
    fn test_compound_shift_by_variable_amount_is_not_masked() {
        let unit = unit();
        let facts = facts();
        let mut session = TranslationSession::new(&unit, &facts, TranslatorOptions::default());
        let mut ctx = TranslationContext::new(&mut session, None, true);
        let count = var(1, VeraType::Integer);
        let result = translate_compound(&mut ctx, BinaryOp::ShiftLeft, &count, &int(4)).unwrap();
        assert_snapshot!(render(result), @"Top.count <<= 4;\n");
        let result = translate_compound(&mut ctx, BinaryOp::ShiftLeft, &count, &next()).unwrap();
        assert_snapshot!(render(result), @"Top.count = IntOp.shiftLeft(Top.count, Top.next());\n");
        let result = translate_compound(&mut ctx, BinaryOp::ShiftRight, &count, &int(33)).unwrap();
        assert_snapshot!(render(result), @"Top.count = 0;\n");
    }

    #[test]
    fn test_native_compound_table() {
        assert!(has_native_compound(BinaryOp::Add));
        assert!(has_native_compound(BinaryOp::ShiftRight));
        assert!(!has_native_compound(BinaryOp::BitNand));
        assert!(!has_native_compound(BinaryOp::Less));
    }
}
