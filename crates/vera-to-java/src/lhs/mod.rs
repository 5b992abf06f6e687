// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Assignable locations
//!
//! An `Lhs` is a translated assignment target. It knows how to read the current value,
//! how to store a new one, and which change-notification event (if any) must fire when
//! the stored value changes. Sub-expressions of the target (objects, indices, slice
//! bounds) are captured into temporaries when the location is both read and written,
//! so they are evaluated exactly once.

mod bit_slice;
mod concatenation;
mod indexed;
mod simple;

pub use bit_slice::BitSliceLhs;
pub use concatenation::ConcatLhs;
pub use indexed::{IndexSpace, IndexedLhs};
pub use simple::SimpleLhs;

use crate::context::TranslationContext;
use crate::converted_expression::{discard_value, ConvertedExpression};
use crate::error::{ConversionError, Result, TranslationError};
use crate::expression_converter as conv;
use java_schema::runtime::OBJECTS;
use java_schema::{BinaryOp, Expr, JavaType, Stmt};
use vera_model::{Expr as VeraExpr, ExprKind as VeraExprKind};

/// How the location will be used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    pub read: bool,
    pub write: bool,
}

impl Access {
    pub const READ: Access = Access {
        read: true,
        write: false,
    };
    pub const WRITE: Access = Access {
        read: false,
        write: true,
    };
    pub const READ_WRITE: Access = Access {
        read: true,
        write: true,
    };

    /// Sub-expressions are evaluated more than once and must be captured
    pub fn is_shared(self) -> bool {
        self.read && self.write
    }
}

#[derive(Debug, Clone)]
pub enum Lhs {
    Simple(SimpleLhs),
    Indexed(IndexedLhs),
    BitSlice(BitSliceLhs),
    Concat(ConcatLhs),
}

impl Lhs {
    /// Type of the value stored at this location
    pub fn result_type(&self) -> JavaType {
        match self {
            Lhs::Simple(lhs) => lhs.result_type(),
            Lhs::Indexed(lhs) => lhs.result_type(),
            Lhs::BitSlice(lhs) => lhs.result_type(),
            Lhs::Concat(lhs) => lhs.result_type(),
        }
    }

    /// Event that fires when a write changes the stored value
    pub fn update_event(&self) -> Option<&Expr> {
        match self {
            Lhs::Simple(lhs) => lhs.event.as_ref(),
            Lhs::Indexed(lhs) => lhs.event.as_ref(),
            // Slices notify through the location they modify
            Lhs::BitSlice(_) | Lhs::Concat(_) => None,
        }
    }

    /// Width of the stored value, if it is known statically
    pub fn static_width(&self) -> Option<u32> {
        match self {
            Lhs::Simple(_) | Lhs::Indexed(_) => part_width(&self.result_type()),
            Lhs::BitSlice(lhs) => lhs.width,
            Lhs::Concat(lhs) => lhs.width(),
        }
    }

    /// Width of the stored value as a Java `int` expression
    pub fn width_expr(&self) -> Expr {
        match (self, self.static_width()) {
            (_, Some(w)) => Expr::int(w as i32),
            (Lhs::BitSlice(lhs), None) => lhs.width_expr(),
            (Lhs::Concat(lhs), None) => lhs.width_expr(),
            (lhs, None) => Expr::call(lhs.read(), "length", vec![], JavaType::Int),
        }
    }

    /// Expression producing the current value
    pub fn read(&self) -> Expr {
        match self {
            Lhs::Simple(lhs) => lhs.read(),
            Lhs::Indexed(lhs) => lhs.read(),
            Lhs::BitSlice(lhs) => lhs.read(),
            Lhs::Concat(lhs) => lhs.read(),
        }
    }

    /// Store `value`, which already has the location's result type. The returned
    /// expression evaluates to the stored value.
    pub fn write(&self, ctx: &mut TranslationContext<'_, '_>, value: Expr) -> Result<ConvertedExpression> {
        match self {
            Lhs::Simple(lhs) => lhs.write(ctx, value),
            Lhs::Indexed(lhs) => lhs.write(ctx, value),
            Lhs::BitSlice(lhs) => lhs.write(ctx, value),
            Lhs::Concat(lhs) => lhs.write(ctx, value),
        }
    }

    /// The signal and optional bit range a drive statement targets
    pub fn signal_target(&self) -> Option<(Expr, Option<(Expr, Expr)>)> {
        match self {
            Lhs::Simple(lhs) if lhs.is_signal() => Some((lhs.target.clone(), None)),
            Lhs::BitSlice(slice) => match &*slice.base {
                Lhs::Simple(lhs) if lhs.is_signal() => {
                    Some((lhs.target.clone(), Some((slice.high.clone(), slice.low.clone()))))
                }
                _ => None,
            },
            _ => None,
        }
    }
}

/// Translate an assignment target
pub fn translate_lhs(
    ctx: &mut TranslationContext<'_, '_>,
    expr: &VeraExpr,
    access: Access,
    conv: &mut ConvertedExpression,
) -> Result<Lhs> {
    match &expr.kind {
        VeraExprKind::Var(_) | VeraExprKind::Member { .. } => {
            Ok(Lhs::Simple(simple::translate(ctx, expr, access, conv)?))
        }
        VeraExprKind::Index { array, indices } => indexed::translate(ctx, array, indices, access, expr, conv),
        VeraExprKind::BitSlice { target, high, low } => Ok(Lhs::BitSlice(bit_slice::translate(
            ctx, target, high, low, access, conv,
        )?)),
        VeraExprKind::RangeSlice { target, range } => {
            let Some(named) = ctx.session.symbols.range(range).cloned() else {
                return Err(TranslationError::unsupported(
                    format!("unknown named range `{}`", range),
                    expr.loc,
                ));
            };
            Ok(Lhs::BitSlice(bit_slice::translate_constant(
                ctx,
                target,
                named.high,
                named.low,
                access,
                conv,
            )?))
        }
        VeraExprKind::Concat(parts) => Ok(Lhs::Concat(concatenation::translate(ctx, parts, access, conv)?)),
        other => Err(TranslationError::unsupported(
            format!("{} as an assignment target", other.describe()),
            expr.loc,
        )),
    }
}

// ============================================================================
// Shared helpers

/// Bit width of a value of `ty` when it takes part in bit operations
pub(crate) fn part_width(ty: &JavaType) -> Option<u32> {
    match ty {
        JavaType::Enum(_) => Some(32),
        other => other.bit_width(),
    }
}

/// View an integral value as a bit vector for bit and slice access
pub(crate) fn bit_view(value: Expr) -> std::result::Result<Expr, ConversionError> {
    match &value.ty {
        JavaType::BitVector(_) => Ok(value),
        ty => {
            let width = part_width(ty);
            conv::to_bit_vector(value, width, false)
        }
    }
}

/// Convert a modified bit vector back to the representation of the location
pub(crate) fn from_bit_view(bits: Expr, ty: &JavaType) -> std::result::Result<Expr, ConversionError> {
    match ty {
        JavaType::Enum(name) => conv::to_enum(bits, name, false),
        other => conv::convert(bits, other, false),
    }
}

/// Turn a store into a statement and make `value` the result of the expression
pub(crate) fn store_as_statement(write: ConvertedExpression, value: Expr) -> ConvertedExpression {
    let (init, stored, update) = write.into_parts();
    let mut result = ConvertedExpression::from_stmts(init);
    if let Some(stored) = stored {
        for stmt in discard_value(stored) {
            result.add_init(stmt);
        }
    }
    result.add_updates(update);
    result.set_value(value);
    result.set_optional_result(true);
    result
}

/// Value stored for comparison; mutable strings are copied out since the location keeps
/// changing after the snapshot
fn snapshot(value: Expr) -> Expr {
    match value.ty {
        JavaType::JunoString => Expr::call(value, "toString", vec![], JavaType::String),
        _ => value,
    }
}

/// Whether `old` and `new` differ
pub(crate) fn changed(old: Expr, new: Expr) -> Expr {
    let by_identity = old.ty.is_primitive() || matches!(old.ty, JavaType::Enum(_) | JavaType::Class(_));
    if by_identity {
        Expr::binary(BinaryOp::Ne, old, new, JavaType::Boolean)
    } else {
        Expr::static_call(OBJECTS, "equals", vec![old, new], JavaType::Boolean).not()
    }
}

/// Wrap `write` so that `event` fires after the store when the value at `current`
/// actually changed
pub(crate) fn with_change_notification(
    ctx: &mut TranslationContext<'_, '_>,
    event: Option<&Expr>,
    current: Expr,
    write: ConvertedExpression,
) -> ConvertedExpression {
    let Some(event) = event else {
        return write;
    };
    let optional = write.is_optional_result();
    let (decl, old) = ctx.declare_temp("old", snapshot(current.clone()));
    let mut result = ConvertedExpression::from_stmts(vec![decl]);
    if let Some(value) = result.merge(write) {
        result.set_value(value);
    }
    result.set_optional_result(optional);
    let trigger = Expr::call(event.clone(), "trigger", vec![], JavaType::Void);
    result.add_update(Stmt::if_then(changed(old, snapshot(current)), Stmt::expr(trigger)));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use java_schema::{render_expr_to_string, render_stmts_to_string, Block};

    #[test]
    fn test_change_comparison_by_type() {
        let a = Expr::local("a", JavaType::Int);
        let b = Expr::local("b", JavaType::Int);
        assert_snapshot!(render_expr_to_string(&changed(a, b)), @"a != b");
        let v = Expr::local("v", JavaType::bit_vector(4));
        let w = Expr::local("w", JavaType::bit_vector(4));
        assert_snapshot!(render_expr_to_string(&changed(v, w)), @"!Objects.equals(v, w)");
    }

    #[test]
    fn test_store_as_statement_keeps_value() {
        let put = Expr::call(
            Expr::local("m", JavaType::Object),
            "put",
            vec![Expr::local("k", JavaType::String), Expr::int(1)],
            JavaType::Void,
        );
        let result = store_as_statement(ConvertedExpression::of(put), Expr::int(1));
        assert_eq!(result.value(), Some(&Expr::int(1)));
        assert!(result.is_optional_result());
        let stmts = result.flatten();
        assert_snapshot!(render_stmts_to_string(&Block::new(stmts)), @"m.put(k, 1);\n");
    }
}
