// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Typed OpenVera source model
//!
//! This crate is the read-only contract between the Vera front-end and the translator.
//! It carries the typed AST of one compilation unit, its symbol table, and the facts the
//! semantic analyzer precomputed about variables, functions and blocks.

pub mod analysis;
pub mod decl;
pub mod expr;
mod ids;
pub mod literal;
mod loc;
pub mod stmt;
pub mod symbols;
pub mod types;

pub use analysis::{AnalysisFacts, AnalysisResults};
pub use decl::{
    ClassDecl, CompilationUnit, EnumDecl, EnumValueDecl, FunctionDecl, FunctionKind,
    NamedRange, ParamDecl, VarDecl, Visibility,
};
pub use expr::{BinaryOp, Expr, ExprKind, IncDecOp, UnaryOp};
pub use ids::{ClassId, EnumId, FuncId, NodeId, VarId};
pub use literal::{BitLiteral, LiteralError};
pub use loc::Loc;
pub use stmt::{
    Block, CaseItem, CaseKind, DriveStmt, Edge, JoinKind, RandCaseItem, Stmt, StmtKind,
    SyncTerm,
};
pub use symbols::SymbolTable;
pub use types::{AssocKey, SignalDirection, VeraType};
