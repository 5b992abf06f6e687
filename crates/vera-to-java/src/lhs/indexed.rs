// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Array elements, associative array entries and single bits

use super::{
    bit_slice::BitSliceLhs, bit_view, from_bit_view, store_as_statement, translate_lhs,
    with_change_notification, Access, Lhs,
};
use crate::context::TranslationContext;
use crate::converted_expression::ConvertedExpression;
use crate::error::{Result, TranslationError};
use crate::translation::expression_translator::translate_as;
use java_schema::{Expr, JavaType, Stmt};
use vera_model::Expr as VeraExpr;

/// What the index selects from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexSpace {
    /// Element of a Java array
    Native,
    /// Entry of an `AssocArray`
    Assoc,
    /// Single bit of an integral value
    Bits,
}

#[derive(Debug, Clone)]
pub struct IndexedLhs {
    pub space: IndexSpace,
    /// Array or map holding the element; unused for bit selects
    container: Option<Expr>,
    /// Location holding the vector a bit is selected from
    base: Option<Box<Lhs>>,
    pub index: Expr,
    ty: JavaType,
    pub event: Option<Expr>,
}

impl IndexedLhs {
    pub fn result_type(&self) -> JavaType {
        self.ty.clone()
    }

    fn container(&self) -> Expr {
        match &self.container {
            Some(container) => container.clone(),
            None => panic!("BUG: {:?} index without a container", self.space),
        }
    }

    fn base(&self) -> &Lhs {
        match &self.base {
            Some(base) => base,
            None => panic!("BUG: bit select without a base location"),
        }
    }

    pub fn read(&self) -> Expr {
        match self.space {
            IndexSpace::Native => Expr::array_access(self.container(), self.index.clone()),
            IndexSpace::Assoc => Expr::call(self.container(), "get", vec![self.index.clone()], self.ty.clone()),
            IndexSpace::Bits => {
                let bits = bit_view(self.base().read())
                    .unwrap_or_else(|e| panic!("BUG: bit select base checked at translation: {}", e));
                Expr::call(bits, "getBit", vec![self.index.clone()], JavaType::Bit)
            }
        }
    }

    pub fn write(&self, ctx: &mut TranslationContext<'_, '_>, value: Expr) -> Result<ConvertedExpression> {
        match self.space {
            IndexSpace::Native => {
                let store = ConvertedExpression::of(Expr::assign(self.read(), value));
                Ok(with_change_notification(ctx, self.event.as_ref(), self.read(), store))
            }
            IndexSpace::Assoc => {
                let mut init = vec![];
                let value = ctx.capture("val", value, &mut init);
                let put = Expr::call(
                    self.container(),
                    "put",
                    vec![self.index.clone(), value.clone()],
                    JavaType::Void,
                );
                init.push(Stmt::expr(put));
                let mut store = ConvertedExpression::from_stmts(init);
                store.set_value(value);
                store.set_optional_result(true);
                Ok(with_change_notification(ctx, self.event.as_ref(), self.read(), store))
            }
            IndexSpace::Bits => {
                let mut init = vec![];
                let value = ctx.capture("bit", value, &mut init);
                let base = self.base();
                let base_ty = base.result_type();
                let bits = bit_view(base.read())?;
                let updated = Expr::call(
                    bits.clone(),
                    "setBit",
                    vec![self.index.clone(), value.clone()],
                    bits.ty.clone(),
                );
                let store = base.write(ctx, from_bit_view(updated, &base_ty)?)?;
                let mut result = ConvertedExpression::from_stmts(init);
                let store = store_as_statement(store, value);
                let value = result.merge_value(store);
                result.set_value(value);
                result.set_optional_result(true);
                Ok(result)
            }
        }
    }
}

fn capture_if(
    ctx: &mut TranslationContext<'_, '_>,
    needed: bool,
    base: &str,
    value: Expr,
    conv: &mut ConvertedExpression,
) -> Expr {
    if !needed {
        return value;
    }
    let mut init = vec![];
    let value = ctx.capture(base, value, &mut init);
    conv.add_inits(init);
    value
}

/// Whether one of the `remaining` indices after the one applied to `ty` selects a bit
fn bit_select_follows(ty: &JavaType, remaining: usize) -> bool {
    let mut ty = ty;
    for _ in 0..remaining {
        ty = match ty {
            JavaType::Array(element) => element.as_ref(),
            JavaType::AssocArray { value, .. } => value.as_ref(),
            _ => return false,
        };
        if ty.is_dv_integral() {
            return true;
        }
    }
    false
}

pub(super) fn translate(
    ctx: &mut TranslationContext<'_, '_>,
    array: &VeraExpr,
    indices: &[VeraExpr],
    access: Access,
    expr: &VeraExpr,
    conv: &mut ConvertedExpression,
) -> Result<Lhs> {
    let base_access = Access {
        read: true,
        write: access.write,
    };
    let mut current = translate_lhs(ctx, array, base_access, conv)?;
    for (n, index) in indices.iter().enumerate() {
        let event = current.update_event().cloned();
        let ty = current.result_type();
        // A later bit select writes by reading the element back first
        let rewritten = bit_select_follows(&ty, indices.len() - n - 1);
        let shared = access.is_shared() || (access.write && (event.is_some() || rewritten));
        current = match ty {
            JavaType::Array(element) => {
                let container = capture_if(ctx, shared, "arr", current.read(), conv);
                let index = translate_as(ctx, index, &JavaType::Int, conv)?;
                let index = capture_if(ctx, shared, "idx", index, conv);
                Lhs::Indexed(IndexedLhs {
                    space: IndexSpace::Native,
                    container: Some(container),
                    base: None,
                    index,
                    ty: *element,
                    event,
                })
            }
            JavaType::AssocArray { key, value } => {
                let container = capture_if(ctx, shared, "map", current.read(), conv);
                let key = translate_as(ctx, index, &key, conv)?;
                let key = capture_if(ctx, shared, "key", key, conv);
                Lhs::Indexed(IndexedLhs {
                    space: IndexSpace::Assoc,
                    container: Some(container),
                    base: None,
                    index: key,
                    ty: *value,
                    event,
                })
            }
            ty if ty.is_dv_integral() => {
                let position = translate_as(ctx, index, &JavaType::Int, conv)?;
                let position = capture_if(ctx, access.write, "pos", position, conv);
                let is_signal = current.signal_target().map_or(false, |(_, range)| range.is_none());
                if is_signal {
                    // Signals are written through ranged drives
                    Lhs::BitSlice(BitSliceLhs::new(current, position.clone(), position, Some(1)))
                } else {
                    bit_view(current.read()).map_err(|e| e.at("bit select", expr.loc))?;
                    Lhs::Indexed(IndexedLhs {
                        space: IndexSpace::Bits,
                        container: None,
                        base: Some(Box::new(current)),
                        index: position,
                        ty: JavaType::Bit,
                        event: None,
                    })
                }
            }
            other => {
                return Err(TranslationError::unsupported(
                    format!("indexing a value of type {}", other),
                    expr.loc,
                ))
            }
        };
    }
    Ok(current)
}
