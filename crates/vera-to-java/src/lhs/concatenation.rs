// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Concatenation targets `{a, b, c} = value`
//!
//! The value is stored once in a temporary and distributed from the least significant
//! end: the last part receives the low bits. When every part width is known the slice
//! positions are constants, otherwise a running `pos` is kept at runtime. Enum parts
//! take no bits and are set to `UNDEFINED`.

use super::{bit_view, translate_lhs, Access, Lhs};
use crate::context::TranslationContext;
use crate::converted_expression::ConvertedExpression;
use crate::error::{Result, TranslationError, WarningKind};
use crate::expression_converter as conv;
use java_schema::runtime::UNDEFINED;
use java_schema::{BinaryOp, Expr, JavaType, Stmt};
use vera_model::{Expr as VeraExpr, Loc};

#[derive(Debug, Clone)]
pub struct ConcatLhs {
    /// Most significant part first
    pub parts: Vec<Lhs>,
    loc: Loc,
}

/// Bits a part consumes from the assigned value
fn consumed_width(part: &Lhs) -> Option<u32> {
    match part.result_type() {
        JavaType::Enum(_) => Some(0),
        _ => part.static_width(),
    }
}

fn consumed_width_expr(part: &Lhs) -> Expr {
    match consumed_width(part) {
        Some(w) => Expr::int(w as i32),
        None => part.width_expr(),
    }
}

impl ConcatLhs {
    pub fn width(&self) -> Option<u32> {
        self.parts.iter().map(consumed_width).sum()
    }

    pub fn width_expr(&self) -> Expr {
        let mut widths = self.parts.iter().map(consumed_width_expr);
        let first = widths
            .next()
            .unwrap_or_else(|| panic!("BUG: empty concatenation target"));
        widths.fold(first, |acc, w| Expr::binary(BinaryOp::Add, acc, w, JavaType::Int))
    }

    pub fn result_type(&self) -> JavaType {
        JavaType::BitVector(self.width())
    }

    pub fn read(&self) -> Expr {
        let mut reads = self.parts.iter().filter(|p| consumed_width(p) != Some(0)).map(|p| {
            bit_view(p.read()).unwrap_or_else(|e| panic!("BUG: concatenation part checked at translation: {}", e))
        });
        let first = reads
            .next()
            .unwrap_or_else(|| panic!("BUG: empty concatenation target"));
        let ty = self.result_type();
        reads.fold(first, |high, low| Expr::call(high, "concat", vec![low], ty.clone()))
    }

    /// Convert the slice destined for `part` to its representation
    fn part_value(&self, part: &Lhs, slice: Expr) -> Result<Expr> {
        conv::convert(slice, &part.result_type(), false).map_err(|e| e.at("concatenation target", self.loc))
    }

    fn write_undefined(
        &self,
        ctx: &mut TranslationContext<'_, '_>,
        part: &Lhs,
        name: &str,
    ) -> Result<Vec<Stmt>> {
        ctx.session.warn(
            WarningKind::UndefinedEnumInConcat,
            format!("enum `{}` in a concatenation target is set to {}", name, UNDEFINED),
            self.loc,
        );
        let undefined = Expr::static_field(name, UNDEFINED, JavaType::Enum(name.to_string()));
        Ok(part.write(ctx, undefined)?.flatten())
    }

    pub fn write(&self, ctx: &mut TranslationContext<'_, '_>, value: Expr) -> Result<ConvertedExpression> {
        let (decl, bits) = ctx.declare_temp("bits", value);
        let mut result = ConvertedExpression::from_stmts(vec![decl]);
        let slice = |high: Expr, low: Expr, width: Option<u32>| {
            Expr::call(bits.clone(), "getBits", vec![high, low], JavaType::BitVector(width))
        };
        if self.width().is_some() {
            let mut pos = 0u32;
            for part in self.parts.iter().rev() {
                if let JavaType::Enum(name) = part.result_type() {
                    result.add_inits(self.write_undefined(ctx, part, &name)?);
                    continue;
                }
                let width = part
                    .static_width()
                    .unwrap_or_else(|| panic!("BUG: part width vanished"));
                let bits = slice(Expr::int((pos + width - 1) as i32), Expr::int(pos as i32), Some(width));
                let value = self.part_value(part, bits)?;
                result.add_inits(part.write(ctx, value)?.flatten());
                pos += width;
            }
        } else {
            let (decl, pos) = ctx.declare_var("pos", JavaType::Int, Some(Expr::int(0)));
            result.add_init(decl);
            for part in self.parts.iter().rev() {
                if let JavaType::Enum(name) = part.result_type() {
                    result.add_inits(self.write_undefined(ctx, part, &name)?);
                    continue;
                }
                let width = part.width_expr();
                let end = Expr::binary(BinaryOp::Add, pos.clone(), width.clone(), JavaType::Int);
                let high = Expr::binary(BinaryOp::Sub, end, Expr::int(1), JavaType::Int);
                let bits = slice(high, pos.clone(), part.static_width());
                let value = self.part_value(part, bits)?;
                result.add_inits(part.write(ctx, value)?.flatten());
                result.add_init(Stmt::expr(Expr::compound_assign(BinaryOp::Add, pos.clone(), width)));
            }
        }
        result.set_value(bits);
        result.set_optional_result(true);
        Ok(result)
    }
}

pub(super) fn translate(
    ctx: &mut TranslationContext<'_, '_>,
    parts: &[VeraExpr],
    access: Access,
    conv: &mut ConvertedExpression,
) -> Result<ConcatLhs> {
    let mut translated = vec![];
    for part in parts {
        let lhs = translate_lhs(ctx, part, access, conv)?;
        let ty = lhs.result_type();
        // Signals and enums come back as integral views; anything else was rejected by
        // the type checker
        if !ty.is_dv_integral() {
            panic!("BUG: concatenation part of type {} reached the translator", ty);
        }
        translated.push(lhs);
    }
    let loc = parts.first().map(|p| p.loc).unwrap_or_default();
    if translated.is_empty() {
        return Err(TranslationError::unsupported("empty concatenation target", loc));
    }
    let lhs = ConcatLhs { parts: translated, loc };
    if lhs.width() == Some(0) {
        return Err(TranslationError::unsupported("concatenation target without bits", loc));
    }
    Ok(lhs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::TranslatorOptions;
    use crate::session::TranslationSession;
    use vera_model::{AnalysisResults, CompilationUnit, ExprKind, NodeId, VarDecl, VarId, VeraType};

    fn unit() -> CompilationUnit {
        CompilationUnit {
            name: "top".into(),
            globals: vec![
                VarDecl::new(VarId(1), "high", VeraType::bit(4)),
                VarDecl::new(VarId(2), "name", VeraType::String),
            ],
            ..Default::default()
        }
    }

    fn var(id: u32, ty: VeraType) -> VeraExpr {
        VeraExpr::new(NodeId(0), ExprKind::Var(VarId(id)), ty)
    }

    #[test]
    fn test_parts_keep_their_widths() {
        let unit = unit();
        let facts = AnalysisResults::new();
        let mut session = TranslationSession::new(&unit, &facts, TranslatorOptions::default());
        let mut ctx = TranslationContext::new(&mut session, None, true);
        let mut conv = ConvertedExpression::empty();
        let parts = [var(1, VeraType::bit(4)), var(1, VeraType::bit(4))];
        let lhs = translate(&mut ctx, &parts, Access::WRITE, &mut conv).unwrap();
        assert_eq!(lhs.width(), Some(8));
    }

    #[test]
    #[should_panic(expected = "BUG: concatenation part of type")]
    fn test_string_part_is_an_internal_error() {
        let unit = unit();
        let facts = AnalysisResults::new();
        let mut session = TranslationSession::new(&unit, &facts, TranslatorOptions::default());
        let mut ctx = TranslationContext::new(&mut session, None, true);
        let mut conv = ConvertedExpression::empty();
        let parts = [var(1, VeraType::bit(4)), var(2, VeraType::String)];
        let _ = translate(&mut ctx, &parts, Access::WRITE, &mut conv);
    }
}
