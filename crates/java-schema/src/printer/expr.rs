// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Expression rendering - writes target expressions with minimal parentheses

use super::stmt::render_block_body;
use super::writer::JavaWriter;
use crate::expr::{Expr, ExprKind, Literal, UnaryOp};
use crate::types::JavaType;

const PREC_LAMBDA: u8 = 0;
const PREC_ASSIGN: u8 = 1;
const PREC_CONDITIONAL: u8 = 2;
const PREC_INSTANCEOF: u8 = 9;
const PREC_PREFIX: u8 = 14;
const PREC_POSTFIX: u8 = 15;
const PREC_PRIMARY: u8 = 16;

fn precedence(expr: &Expr) -> u8 {
    match &expr.kind {
        ExprKind::Lambda(_) => PREC_LAMBDA,
        ExprKind::Assign { .. } => PREC_ASSIGN,
        ExprKind::Conditional { .. } => PREC_CONDITIONAL,
        ExprKind::Binary { op, .. } => op.precedence(),
        ExprKind::InstanceOf { .. } => PREC_INSTANCEOF,
        ExprKind::Cast(_) => PREC_PREFIX,
        ExprKind::Unary { op, .. } if op.is_postfix() => PREC_POSTFIX,
        ExprKind::Unary { .. } => PREC_PREFIX,
        ExprKind::Literal(Literal::Int(v)) if *v < 0 => PREC_PREFIX,
        ExprKind::Literal(Literal::Long(v)) if *v < 0 => PREC_PREFIX,
        _ => PREC_PRIMARY,
    }
}

/// Render `expr` as a top-level expression
pub fn render_expr(expr: &Expr, w: &mut JavaWriter) {
    render_prec(expr, PREC_LAMBDA, w);
}

/// Render `expr`, parenthesizing it if it binds looser than `min_prec`
pub fn render_prec(expr: &Expr, min_prec: u8, w: &mut JavaWriter) {
    if precedence(expr) < min_prec {
        w.write("(");
        render_kind(expr, w);
        w.write(")");
    } else {
        render_kind(expr, w);
    }
}

fn render_kind(expr: &Expr, w: &mut JavaWriter) {
    match &expr.kind {
        ExprKind::Literal(lit) => render_literal(lit, w),
        ExprKind::Local(name) => w.write(name),
        ExprKind::This => w.write("this"),
        ExprKind::Field { target, name } => {
            if let Some(target) = target {
                render_prec(target, PREC_PRIMARY, w);
                w.write(".");
            }
            w.write(name);
        }
        ExprKind::StaticField { class, name } => write!(w, "{}.{}", class, name),
        ExprKind::ArrayAccess { array, index } => {
            render_prec(array, PREC_PRIMARY, w);
            w.write("[");
            render_expr(index, w);
            w.write("]");
        }
        ExprKind::MethodCall { target, name, args } => {
            if let Some(target) = target {
                render_prec(target, PREC_PRIMARY, w);
                w.write(".");
            }
            w.write(name);
            render_args(args, w);
        }
        ExprKind::StaticCall { class, name, args } => {
            write!(w, "{}.{}", class, name);
            render_args(args, w);
        }
        ExprKind::SuperCall { name, args } => {
            write!(w, "super.{}", name);
            render_args(args, w);
        }
        ExprKind::New { args } => {
            w.write("new ");
            match &expr.ty {
                JavaType::AssocArray { .. } => w.write("AssocArray<>"),
                ty => write!(w, "{}", ty),
            }
            render_args(args, w);
        }
        ExprKind::NewArray { element, dims, init } => render_new_array(element, dims, init, w),
        ExprKind::Cast(inner) => {
            write!(w, "({}) ", expr.ty);
            render_prec(inner, PREC_PREFIX, w);
        }
        ExprKind::InstanceOf { expr: inner, class } => {
            render_prec(inner, PREC_INSTANCEOF, w);
            write!(w, " instanceof {}", class);
        }
        ExprKind::Unary { op, operand } => render_unary(*op, operand, w),
        ExprKind::Binary { op, lhs, rhs } => {
            let prec = op.precedence();
            render_prec(lhs, prec, w);
            write!(w, " {} ", op.symbol());
            render_prec(rhs, prec + 1, w);
        }
        ExprKind::Assign { op, target, value } => {
            render_prec(target, PREC_POSTFIX, w);
            match op {
                Some(op) => write!(w, " {}= ", op.symbol()),
                None => w.write(" = "),
            }
            render_prec(value, PREC_ASSIGN, w);
        }
        ExprKind::Conditional {
            cond,
            then_expr,
            else_expr,
        } => {
            render_prec(cond, PREC_CONDITIONAL + 1, w);
            w.write(" ? ");
            render_prec(then_expr, PREC_CONDITIONAL + 1, w);
            w.write(" : ");
            render_prec(else_expr, PREC_CONDITIONAL, w);
        }
        ExprKind::Lambda(body) => {
            w.write("() ->");
            render_block_body(body, w);
        }
    }
}

fn render_unary(op: UnaryOp, operand: &Expr, w: &mut JavaWriter) {
    if op.is_postfix() {
        render_prec(operand, PREC_POSTFIX, w);
        w.write(op.symbol());
        return;
    }
    w.write(op.symbol());
    // `- -x` and `- -1` must not fuse into a decrement
    let fuses = matches!(op, UnaryOp::Neg | UnaryOp::PreDec)
        && match &operand.kind {
            ExprKind::Unary { op: inner, .. } => matches!(inner, UnaryOp::Neg | UnaryOp::PreDec),
            ExprKind::Literal(Literal::Int(v)) => *v < 0,
            ExprKind::Literal(Literal::Long(v)) => *v < 0,
            _ => false,
        };
    if fuses {
        w.write("(");
        render_expr(operand, w);
        w.write(")");
    } else {
        render_prec(operand, PREC_PREFIX, w);
    }
}

fn render_args(args: &[Expr], w: &mut JavaWriter) {
    w.write("(");
    w.sep_with(", ", args, |w, arg| render_prec(arg, PREC_ASSIGN, w));
    w.write(")");
}

fn render_new_array(element: &JavaType, dims: &[Expr], init: &[Expr], w: &mut JavaWriter) {
    // `new int[n][]` for an element type of `int[]`
    let mut base = element;
    let mut depth = 1;
    while let JavaType::Array(inner) = base {
        base = inner;
        depth += 1;
    }
    write!(w, "new {}", base);
    for dim in dims {
        w.write("[");
        render_expr(dim, w);
        w.write("]");
    }
    for _ in dims.len()..depth {
        w.write("[]");
    }
    if dims.is_empty() {
        w.write(" { ");
        w.sep_with(", ", init, |w, e| render_prec(e, PREC_ASSIGN, w));
        w.write(" }");
    }
}

fn render_literal(lit: &Literal, w: &mut JavaWriter) {
    match lit {
        Literal::Boolean(b) => write!(w, "{}", b),
        Literal::Int(v) => write!(w, "{}", v),
        Literal::Long(v) => write!(w, "{}L", v),
        Literal::Char(c) => write!(w, "'{}'", escape_char(*c, '\'')),
        Literal::String(s) => {
            w.write("\"");
            for c in s.chars() {
                w.write(&escape_char(c, '"'));
            }
            w.write("\"");
        }
        Literal::Null => w.write("null"),
    }
}

fn escape_char(c: char, quote: char) -> String {
    match c {
        '\\' => "\\\\".to_string(),
        '\n' => "\\n".to_string(),
        '\t' => "\\t".to_string(),
        '\r' => "\\r".to_string(),
        c if c == quote => format!("\\{}", c),
        c if c.is_control() => format!("\\u{:04x}", c as u32),
        c => c.to_string(),
    }
}
