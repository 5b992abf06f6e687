// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Source statements

use crate::decl::VarDecl;
use crate::expr::Expr;
use crate::ids::NodeId;
use crate::loc::Loc;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Self { stmts }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub id: NodeId,
    pub kind: StmtKind,
    pub loc: Loc,
}

impl Stmt {
    pub fn new(id: NodeId, kind: StmtKind) -> Self {
        Self {
            id,
            kind,
            loc: Loc::default(),
        }
    }

    pub fn with_loc(mut self, loc: Loc) -> Self {
        self.loc = loc;
        self
    }
}

/// Equality semantics applied by a case statement to its items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseKind {
    /// `case`: exact four-state match
    Case,
    /// `casex`: X and Z are don't-care
    CaseX,
    /// `casez`: Z is don't-care
    CaseZ,
}

impl CaseKind {
    pub fn is_wildcard(self) -> bool {
        !matches!(self, CaseKind::Case)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseItem {
    pub values: Vec<Expr>,
    pub body: Stmt,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RandCaseItem {
    pub weight: Expr,
    pub body: Stmt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// `join all`: wait for every branch
    All,
    /// `join any`: wait for the first branch
    Any,
    /// `join none`: continue immediately
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Posedge,
    Negedge,
    AnyEdge,
    /// Plain `@(sig)` waits for the next sample
    Sample,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncTerm {
    pub signal: Expr,
    pub edge: Edge,
}

/// `@delay target = value [soft] [async]` or `target <= value`
#[derive(Debug, Clone, PartialEq)]
pub struct DriveStmt {
    /// A signal, or a bit slice of a signal
    pub target: Expr,
    /// `VoidLiteral` releases the drive
    pub value: Expr,
    pub delay: Option<Expr>,
    pub is_async: bool,
    pub soft: bool,
    pub non_blocking: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Block(Block),
    VarDecl(VarDecl),
    Expr(Expr),
    If {
        cond: Expr,
        then_stmt: Box<Stmt>,
        else_stmt: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        cond: Expr,
    },
    For {
        init: Vec<Expr>,
        cond: Option<Expr>,
        update: Vec<Expr>,
        body: Box<Stmt>,
    },
    Repeat {
        count: Expr,
        body: Box<Stmt>,
    },
    Case {
        kind: CaseKind,
        selector: Expr,
        items: Vec<CaseItem>,
        default: Option<Box<Stmt>>,
    },
    RandCase(Vec<RandCaseItem>),
    Break,
    Continue,
    Return(Option<Expr>),
    Fork {
        branches: Vec<Stmt>,
        join: JoinKind,
    },
    /// Kill all child threads of the current thread
    Terminate,
    Sync(Vec<SyncTerm>),
    /// `@cycles clock`; the default clock is used when `clock` is absent
    Delay {
        cycles: Expr,
        clock: Option<Expr>,
    },
    Drive(DriveStmt),
    /// Deferred: expect expressions
    Expect(Expr),
    Empty,
}

impl StmtKind {
    pub fn describe(&self) -> &'static str {
        match self {
            StmtKind::Block(_) => "block",
            StmtKind::VarDecl(_) => "variable declaration",
            StmtKind::Expr(_) => "expression statement",
            StmtKind::If { .. } => "if",
            StmtKind::While { .. } => "while",
            StmtKind::DoWhile { .. } => "do-while",
            StmtKind::For { .. } => "for",
            StmtKind::Repeat { .. } => "repeat",
            StmtKind::Case { .. } => "case",
            StmtKind::RandCase(_) => "randcase",
            StmtKind::Break => "break",
            StmtKind::Continue => "continue",
            StmtKind::Return(_) => "return",
            StmtKind::Fork { .. } => "fork",
            StmtKind::Terminate => "terminate",
            StmtKind::Sync(_) => "sync",
            StmtKind::Delay { .. } => "cycle delay",
            StmtKind::Drive(_) => "drive",
            StmtKind::Expect(_) => "expect",
            StmtKind::Empty => "empty statement",
        }
    }
}
