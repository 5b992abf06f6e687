// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! The result of translating one source expression
//!
//! A source expression can need statements before its value is computed (temporaries,
//! holder setup) and after it is consumed (write-backs, change notifications). The two
//! lists are kept apart because loops that re-evaluate a guard insert them at different
//! points. Temporaries are declared in the innermost open name scope of the context
//! that produced the expression, so flattening must happen inside that scope.

use java_schema::{Expr, ExprKind, JavaType, Stmt};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConvertedExpression {
    init: Vec<Stmt>,
    value: Option<Expr>,
    /// The value may be dropped when the expression is used as a statement
    optional_result: bool,
    update: Vec<Stmt>,
}

impl ConvertedExpression {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn of(value: Expr) -> Self {
        Self {
            value: Some(value),
            ..Self::default()
        }
    }

    pub fn from_stmts(init: Vec<Stmt>) -> Self {
        Self {
            init,
            ..Self::default()
        }
    }

    pub fn add_init(&mut self, stmt: Stmt) {
        self.init.push(stmt);
    }

    pub fn add_inits(&mut self, stmts: impl IntoIterator<Item = Stmt>) {
        self.init.extend(stmts);
    }

    pub fn add_update(&mut self, stmt: Stmt) {
        self.update.push(stmt);
    }

    pub fn add_updates(&mut self, stmts: impl IntoIterator<Item = Stmt>) {
        self.update.extend(stmts);
    }

    pub fn set_value(&mut self, value: Expr) {
        self.value = Some(value);
    }

    pub fn set_optional_result(&mut self, optional: bool) {
        self.optional_result = optional;
    }

    pub fn with_value(mut self, value: Expr) -> Self {
        self.value = Some(value);
        self
    }

    pub fn value(&self) -> Option<&Expr> {
        self.value.as_ref()
    }

    pub fn take_value(&mut self) -> Option<Expr> {
        self.value.take()
    }

    /// Type of the value, `void` when there is none
    pub fn ty(&self) -> JavaType {
        self.value.as_ref().map_or(JavaType::Void, |v| v.ty.clone())
    }

    pub fn is_optional_result(&self) -> bool {
        self.optional_result
    }

    pub fn has_init(&self) -> bool {
        !self.init.is_empty()
    }

    pub fn has_update(&self) -> bool {
        !self.update.is_empty()
    }

    pub fn has_statements(&self) -> bool {
        self.has_init() || self.has_update()
    }

    /// Plain value with no surrounding statements
    pub fn is_pure_value(&self) -> bool {
        !self.has_statements() && self.value.is_some()
    }

    pub fn init(&self) -> &[Stmt] {
        &self.init
    }

    pub fn update(&self) -> &[Stmt] {
        &self.update
    }

    /// Absorb `other`'s statements and return its value. Init statements of `other`
    /// run after ours; its updates run before ours.
    pub fn merge(&mut self, other: ConvertedExpression) -> Option<Expr> {
        self.init.extend(other.init);
        let mut update = other.update;
        update.append(&mut self.update);
        self.update = update;
        other.value
    }

    /// Like `merge`, but the value is required
    pub fn merge_value(&mut self, other: ConvertedExpression) -> Expr {
        match self.merge(other) {
            Some(value) => value,
            None => panic!("BUG: merged expression has no value"),
        }
    }

    /// Split into init statements, value and update statements
    pub fn into_parts(self) -> (Vec<Stmt>, Option<Expr>, Vec<Stmt>) {
        (self.init, self.value, self.update)
    }

    /// Evaluate for effect only: init, then the value as a statement if it does
    /// anything, then updates
    pub fn flatten(self) -> Vec<Stmt> {
        let mut stmts = self.init;
        if let Some(value) = self.value {
            if !(self.optional_result && !value.has_side_effects()) {
                stmts.extend(discard_value(value));
            }
        }
        stmts.extend(self.update);
        stmts
    }
}

/// Statements evaluating the side effects of `expr` and dropping its value. Java only
/// accepts calls, assignments and increments as expression statements, so other forms
/// are broken down into their effectful parts.
pub fn discard_value(expr: Expr) -> Vec<Stmt> {
    if expr.is_statement_expression() {
        return vec![Stmt::expr(expr)];
    }
    if !expr.has_side_effects() {
        return vec![];
    }
    match expr.kind {
        ExprKind::Conditional {
            cond,
            then_expr,
            else_expr,
        } => {
            let then_stmts = discard_value(*then_expr);
            let else_stmts = discard_value(*else_expr);
            match (then_stmts.is_empty(), else_stmts.is_empty()) {
                (true, true) => discard_value(*cond),
                (false, true) => vec![Stmt::if_then(*cond, Stmt::from_stmts(then_stmts))],
                (true, false) => vec![Stmt::if_then(cond.not(), Stmt::from_stmts(else_stmts))],
                (false, false) => vec![Stmt::if_else(
                    *cond,
                    Stmt::from_stmts(then_stmts),
                    Stmt::from_stmts(else_stmts),
                )],
            }
        }
        ExprKind::Binary { op, lhs, rhs } if op == java_schema::BinaryOp::And => {
            let rest = discard_value(*rhs);
            if rest.is_empty() {
                discard_value(*lhs)
            } else {
                vec![Stmt::if_then(*lhs, Stmt::from_stmts(rest))]
            }
        }
        ExprKind::Binary { op, lhs, rhs } if op == java_schema::BinaryOp::Or => {
            let rest = discard_value(*rhs);
            if rest.is_empty() {
                discard_value(*lhs)
            } else {
                vec![Stmt::if_then(lhs.not(), Stmt::from_stmts(rest))]
            }
        }
        ExprKind::Binary { lhs, rhs, .. } => {
            let mut stmts = discard_value(*lhs);
            stmts.extend(discard_value(*rhs));
            stmts
        }
        ExprKind::Unary { operand, .. }
        | ExprKind::Cast(operand)
        | ExprKind::InstanceOf { expr: operand, .. } => discard_value(*operand),
        ExprKind::Field {
            target: Some(target),
            ..
        } => discard_value(*target),
        ExprKind::ArrayAccess { array, index } => {
            let mut stmts = discard_value(*array);
            stmts.extend(discard_value(*index));
            stmts
        }
        ExprKind::NewArray { dims, init, .. } => {
            dims.into_iter().chain(init).flat_map(discard_value).collect()
        }
        kind => panic!("BUG: no way to discard {:?}", kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use java_schema::{render_stmts_to_string, BinaryOp, Block};

    fn call(name: &str) -> Expr {
        Expr::unqualified_call(name, vec![], JavaType::Int)
    }

    fn render(stmts: Vec<Stmt>) -> String {
        render_stmts_to_string(&Block::new(stmts))
    }

    #[test]
    fn test_merge_orders_statements() {
        let mut outer = ConvertedExpression::of(Expr::int(0));
        outer.add_init(Stmt::expr(call("a")));
        outer.add_update(Stmt::expr(call("z")));
        let mut inner = ConvertedExpression::of(Expr::local("t", JavaType::Int));
        inner.add_init(Stmt::expr(call("b")));
        inner.add_update(Stmt::expr(call("y")));

        let value = outer.merge(inner);
        assert_eq!(value, Some(Expr::local("t", JavaType::Int)));
        assert_eq!(render(outer.flatten()), "a();\nb();\ny();\nz();\n");
    }

    #[test]
    fn test_flatten_drops_pure_optional_value() {
        let mut conv = ConvertedExpression::of(Expr::local("x", JavaType::Int));
        conv.set_optional_result(true);
        assert!(conv.flatten().is_empty());
    }

    #[test]
    fn test_discard_keeps_short_circuit() {
        let guarded = Expr::binary(
            BinaryOp::And,
            Expr::local("ok", JavaType::Boolean),
            Expr::binary(BinaryOp::Ne, call("next"), Expr::int(0), JavaType::Boolean),
            JavaType::Boolean,
        );
        assert_eq!(render(discard_value(guarded)), "if (ok) {\n    next();\n}\n");

        let sum = Expr::binary(BinaryOp::Add, call("f"), call("g"), JavaType::Int);
        assert_eq!(render(discard_value(sum)), "f();\ng();\n");
    }
}
