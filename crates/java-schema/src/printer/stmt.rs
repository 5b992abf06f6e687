// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Statement rendering - renders target statements with proper indentation

use super::expr::render_expr;
use super::writer::JavaWriter;
use crate::stmt::{Block, Stmt, SwitchCase};

/// Render a statement followed by a newline
pub fn render_stmt(stmt: &Stmt, w: &mut JavaWriter) {
    match stmt {
        Stmt::LocalVar {
            ty,
            name,
            init,
            is_final,
        } => {
            if *is_final {
                w.write("final ");
            }
            write!(w, "{} {}", ty, name);
            if let Some(init) = init {
                w.write(" = ");
                render_expr(init, w);
            }
            w.line(";");
        }
        Stmt::Block(block) => {
            w.write("{");
            w.newline();
            w.indent();
            render_stmts(&block.stmts, w);
            w.close_brace();
            w.newline();
        }
        Stmt::If { .. } => {
            render_if(stmt, w);
            w.newline();
        }
        Stmt::While { cond, body } => {
            w.write("while (");
            render_expr(cond, w);
            w.write(")");
            render_body(body, w);
            w.newline();
        }
        Stmt::DoWhile { body, cond } => {
            w.write("do");
            render_body(body, w);
            w.write(" while (");
            render_expr(cond, w);
            w.line(");");
        }
        Stmt::For {
            init,
            cond,
            update,
            body,
        } => {
            w.write("for (");
            w.sep_with(", ", init, |w, e| render_expr(e, w));
            w.write(";");
            if let Some(cond) = cond {
                w.space();
                render_expr(cond, w);
            }
            w.write(";");
            if !update.is_empty() {
                w.space();
                w.sep_with(", ", update, |w, e| render_expr(e, w));
            }
            w.write(")");
            render_body(body, w);
            w.newline();
        }
        Stmt::Switch {
            selector,
            cases,
            default,
        } => render_switch(selector, cases, default.as_deref(), w),
        Stmt::Labeled { label, body } => {
            write!(w, "{}: ", label);
            render_stmt(body, w);
        }
        Stmt::Break(label) => match label {
            Some(label) => w.line_fmt(format_args!("break {};", label)),
            None => w.line("break;"),
        },
        Stmt::Continue(label) => match label {
            Some(label) => w.line_fmt(format_args!("continue {};", label)),
            None => w.line("continue;"),
        },
        Stmt::Return(value) => {
            w.write("return");
            if let Some(value) = value {
                w.space();
                render_expr(value, w);
            }
            w.line(";");
        }
        Stmt::Throw(value) => {
            w.write("throw ");
            render_expr(value, w);
            w.line(";");
        }
        Stmt::Assert { cond, message } => {
            w.write("assert ");
            render_expr(cond, w);
            if let Some(message) = message {
                w.write(" : ");
                render_expr(message, w);
            }
            w.line(";");
        }
        Stmt::Expr(expr) => {
            render_expr(expr, w);
            w.line(";");
        }
        Stmt::Empty => w.line(";"),
    }
}

pub fn render_stmts(stmts: &[Stmt], w: &mut JavaWriter) {
    for stmt in stmts {
        render_stmt(stmt, w);
    }
}

/// Render ` { ... }` without a trailing newline
pub fn render_block_body(block: &Block, w: &mut JavaWriter) {
    w.open_brace();
    render_stmts(&block.stmts, w);
    w.close_brace();
}

/// Bodies of control statements are always braced
fn render_body(body: &Stmt, w: &mut JavaWriter) {
    match body {
        Stmt::Block(block) => render_block_body(block, w),
        Stmt::Empty => {
            w.write(" {");
            w.write("}");
        }
        other => {
            w.open_brace();
            render_stmt(other, w);
            w.close_brace();
        }
    }
}

fn render_if(stmt: &Stmt, w: &mut JavaWriter) {
    let Stmt::If {
        cond,
        then_stmt,
        else_stmt,
    } = stmt
    else {
        panic!("BUG: render_if called on a non-if statement");
    };
    w.write("if (");
    render_expr(cond, w);
    w.write(")");
    render_body(then_stmt, w);
    match else_stmt.as_deref() {
        Some(nested @ Stmt::If { .. }) => {
            w.write(" else ");
            render_if(nested, w);
        }
        Some(other) => {
            w.write(" else");
            render_body(other, w);
        }
        None => {}
    }
}

fn render_switch(selector: &crate::expr::Expr, cases: &[SwitchCase], default: Option<&[Stmt]>, w: &mut JavaWriter) {
    w.write("switch (");
    render_expr(selector, w);
    w.write(")");
    w.open_brace();
    for case in cases {
        for label in &case.labels {
            w.write("case ");
            render_expr(label, w);
            w.line(":");
        }
        w.indent();
        render_stmts(&case.body, w);
        w.dedent();
    }
    if let Some(default) = default {
        w.line("default:");
        w.indent();
        render_stmts(default, w);
        w.dedent();
    }
    w.close_brace();
    w.newline();
}
