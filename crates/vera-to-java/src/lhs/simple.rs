// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Variables, fields and signals

use super::{store_as_statement, with_change_notification, Access};
use crate::context::TranslationContext;
use crate::converted_expression::ConvertedExpression;
use crate::error::Result;
use crate::translation::expression_translator;
use java_schema::{Expr, JavaType, Stmt};
use vera_model::{Expr as VeraExpr, ExprKind as VeraExprKind};

#[derive(Debug, Clone)]
pub struct SimpleLhs {
    /// Java lvalue, or the signal object for signal targets
    pub target: Expr,
    pub event: Option<Expr>,
}

impl SimpleLhs {
    pub fn is_signal(&self) -> bool {
        matches!(self.target.ty, JavaType::Signal { .. })
    }

    pub fn result_type(&self) -> JavaType {
        match &self.target.ty {
            JavaType::Signal { width, .. } => JavaType::bit_vector(*width),
            other => other.clone(),
        }
    }

    pub fn read(&self) -> Expr {
        if self.is_signal() {
            Expr::call(self.target.clone(), "sample", vec![], self.result_type())
        } else {
            self.target.clone()
        }
    }

    pub fn write(&self, ctx: &mut TranslationContext<'_, '_>, value: Expr) -> Result<ConvertedExpression> {
        if self.is_signal() {
            let mut init = vec![];
            let value = ctx.capture("drive", value, &mut init);
            let drive = Expr::call(self.target.clone(), "drive", vec![value.clone()], JavaType::Void);
            init.push(Stmt::expr(drive));
            let mut result = ConvertedExpression::from_stmts(init);
            result.set_value(value);
            result.set_optional_result(true);
            return Ok(result);
        }
        let store = ConvertedExpression::of(Expr::assign(self.target.clone(), value));
        Ok(with_change_notification(
            ctx,
            self.event.as_ref(),
            self.target.clone(),
            store,
        ))
    }
}

pub(super) fn translate(
    ctx: &mut TranslationContext<'_, '_>,
    expr: &VeraExpr,
    access: Access,
    conv: &mut ConvertedExpression,
) -> Result<SimpleLhs> {
    match &expr.kind {
        VeraExprKind::Var(id) => {
            let info = ctx.var_info(*id);
            Ok(SimpleLhs {
                target: info.reference(),
                event: info.event,
            })
        }
        VeraExprKind::Member { object, field } => {
            let ty = ctx.session.var_type(*field);
            let name = ctx.session.var_name(*field);
            let owner = ctx.session.symbols.field_owner(*field);
            if ctx.session.symbols.var(*field).is_static {
                // The object is only evaluated for its effects
                let mut object_conv = expression_translator::translate(ctx, object)?;
                object_conv.set_optional_result(true);
                conv.add_inits(object_conv.flatten());
                let class = match owner {
                    Some(owner) => ctx.session.class_name(owner),
                    None => ctx.session.unit_class.clone(),
                };
                return Ok(SimpleLhs {
                    target: Expr::static_field(class, name, ty),
                    event: ctx.member_event(*field, None),
                });
            }
            let object = expression_translator::translate_value(ctx, object, conv)?;
            let notifies = ctx.session.facts.is_wait_var(*field);
            let object = if access.is_shared() || (access.write && notifies) {
                let mut init = vec![];
                let object = ctx.capture("obj", object, &mut init);
                conv.add_inits(init);
                object
            } else {
                object
            };
            let event = ctx.member_event(*field, Some(object.clone()));
            let target = match object.kind {
                java_schema::ExprKind::This => Expr::field(None, name, ty),
                _ => Expr::field(Some(object), name, ty),
            };
            Ok(SimpleLhs { target, event })
        }
        _ => panic!("BUG: {} is not a simple location", expr.kind.describe()),
    }
}
