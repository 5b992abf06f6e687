// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Bit ranges `x[h:l]` and named ranges

use super::{bit_view, from_bit_view, store_as_statement, translate_lhs, Access, Lhs};
use crate::context::TranslationContext;
use crate::converted_expression::ConvertedExpression;
use crate::error::{Result, TranslationError};
use crate::translation::expression_translator::translate_as;
use java_schema::{BinaryOp, Expr, JavaType, Stmt};
use vera_model::Expr as VeraExpr;

#[derive(Debug, Clone)]
pub struct BitSliceLhs {
    pub base: Box<Lhs>,
    pub high: Expr,
    pub low: Expr,
    pub width: Option<u32>,
}

impl BitSliceLhs {
    pub fn new(base: Lhs, high: Expr, low: Expr, width: Option<u32>) -> Self {
        Self {
            base: Box::new(base),
            high,
            low,
            width,
        }
    }

    pub fn result_type(&self) -> JavaType {
        JavaType::BitVector(self.width)
    }

    /// `high - low + 1`
    pub fn width_expr(&self) -> Expr {
        let span = Expr::binary(BinaryOp::Sub, self.high.clone(), self.low.clone(), JavaType::Int);
        Expr::binary(BinaryOp::Add, span, Expr::int(1), JavaType::Int)
    }

    fn bounds(&self) -> Vec<Expr> {
        vec![self.high.clone(), self.low.clone()]
    }

    pub fn read(&self) -> Expr {
        let bits = bit_view(self.base.read())
            .unwrap_or_else(|e| panic!("BUG: slice base checked at translation: {}", e));
        Expr::call(bits, "getBits", self.bounds(), self.result_type())
    }

    pub fn write(&self, ctx: &mut TranslationContext<'_, '_>, value: Expr) -> Result<ConvertedExpression> {
        let mut init = vec![];
        let value = ctx.capture("bits", value, &mut init);
        let mut result = ConvertedExpression::from_stmts(init);
        if let Lhs::Simple(signal) = &*self.base {
            if signal.is_signal() {
                let mut args = self.bounds();
                args.push(value.clone());
                let drive = Expr::call(signal.target.clone(), "driveRange", args, JavaType::Void);
                result.add_init(Stmt::expr(drive));
                result.set_value(value);
                result.set_optional_result(true);
                return Ok(result);
            }
        }
        let base_ty = self.base.result_type();
        let bits = bit_view(self.base.read())?;
        let mut args = self.bounds();
        args.push(value.clone());
        let updated = Expr::call(bits.clone(), "setBits", args, bits.ty.clone());
        let store = self.base.write(ctx, from_bit_view(updated, &base_ty)?)?;
        result.merge(store_as_statement(store, value.clone()));
        result.set_value(value);
        result.set_optional_result(true);
        Ok(result)
    }
}

fn bound(
    ctx: &mut TranslationContext<'_, '_>,
    expr: &VeraExpr,
    capture: bool,
    conv: &mut ConvertedExpression,
) -> Result<Expr> {
    let value = translate_as(ctx, expr, &JavaType::Int, conv)?;
    if !capture {
        return Ok(value);
    }
    let mut init = vec![];
    let value = ctx.capture("bound", value, &mut init);
    conv.add_inits(init);
    Ok(value)
}

fn check_base(base: &Lhs, target: &VeraExpr) -> Result<()> {
    let ty = base.result_type();
    if !ty.is_dv_integral() {
        return Err(TranslationError::unsupported(
            format!("bit slice of a value of type {}", ty),
            target.loc,
        ));
    }
    Ok(())
}

pub(super) fn translate(
    ctx: &mut TranslationContext<'_, '_>,
    target: &VeraExpr,
    high: &VeraExpr,
    low: &VeraExpr,
    access: Access,
    conv: &mut ConvertedExpression,
) -> Result<BitSliceLhs> {
    let base_access = Access {
        read: true,
        write: access.write,
    };
    let base = translate_lhs(ctx, target, base_access, conv)?;
    check_base(&base, target)?;
    let high = bound(ctx, high, access.write, conv)?;
    let low = bound(ctx, low, access.write, conv)?;
    let width = match (high.int_value(), low.int_value()) {
        (Some(h), Some(l)) if h >= l => u32::try_from(h - l + 1).ok(),
        _ => None,
    };
    Ok(BitSliceLhs::new(base, high, low, width))
}

/// Slice with bounds known up front, as for named ranges
pub(super) fn translate_constant(
    ctx: &mut TranslationContext<'_, '_>,
    target: &VeraExpr,
    high: u32,
    low: u32,
    access: Access,
    conv: &mut ConvertedExpression,
) -> Result<BitSliceLhs> {
    let base_access = Access {
        read: true,
        write: access.write,
    };
    let base = translate_lhs(ctx, target, base_access, conv)?;
    check_base(&base, target)?;
    Ok(BitSliceLhs::new(
        base,
        Expr::int(high as i32),
        Expr::int(low as i32),
        Some(high.saturating_sub(low) + 1),
    ))
}
