// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Java target model
//!
//! Target-side contract of the translator: a typed Java AST, the class schema used for
//! assignability and overload lookup, local name scopes, and a source printer.

pub mod decl;
pub mod expr;
pub mod naming;
pub mod printer;
pub mod runtime;
pub mod schema;
pub mod stmt;
pub mod types;

pub use decl::{
    ClassDecl, ClassKind, CompilationUnit, EnumConstant, FieldDecl, MethodDecl, Modifiers, Param,
    Visibility,
};
pub use expr::{BinaryOp, Expr, ExprKind, Literal, UnaryOp};
pub use naming::NameScopes;
pub use printer::{render_expr_to_string, render_stmt_to_string, render_stmts_to_string, render_unit};
pub use schema::{ClassInfo, MethodSig, Schema};
pub use stmt::{Block, Stmt, SwitchCase};
pub use types::{JavaType, SignalKind};
