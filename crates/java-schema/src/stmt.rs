// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Target statements

use crate::expr::Expr;
use crate::types::JavaType;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Self { stmts }
    }

    pub fn push(&mut self, stmt: Stmt) {
        self.stmts.push(stmt);
    }

    pub fn extend(&mut self, stmts: impl IntoIterator<Item = Stmt>) {
        self.stmts.extend(stmts);
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    /// Whether control can fall off the end of the block
    pub fn can_complete_normally(&self) -> bool {
        self.stmts.last().map_or(true, |s| s.can_complete_normally())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub labels: Vec<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    LocalVar {
        ty: JavaType,
        name: String,
        init: Option<Expr>,
        is_final: bool,
    },
    Block(Block),
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
    Switch {
        selector: Expr,
        cases: Vec<SwitchCase>,
        default: Option<Vec<Stmt>>,
    },
    Labeled {
        label: String,
        body: Box<Stmt>,
    },
    Break(Option<String>),
    Continue(Option<String>),
    Return(Option<Expr>),
    Throw(Expr),
    Assert {
        cond: Expr,
        message: Option<Expr>,
    },
    Expr(Expr),
    Empty,
}

impl Stmt {
    pub fn expr(expr: Expr) -> Self {
        Stmt::Expr(expr)
    }

    pub fn local(ty: JavaType, name: impl Into<String>, init: Option<Expr>) -> Self {
        Stmt::LocalVar {
            ty,
            name: name.into(),
            init,
            is_final: false,
        }
    }

    pub fn final_local(ty: JavaType, name: impl Into<String>, init: Expr) -> Self {
        Stmt::LocalVar {
            ty,
            name: name.into(),
            init: Some(init),
            is_final: true,
        }
    }

    pub fn if_then(cond: Expr, then_stmt: Stmt) -> Self {
        Stmt::If {
            cond,
            then_stmt: Box::new(then_stmt),
            else_stmt: None,
        }
    }

    pub fn if_else(cond: Expr, then_stmt: Stmt, else_stmt: Stmt) -> Self {
        Stmt::If {
            cond,
            then_stmt: Box::new(then_stmt),
            else_stmt: Some(Box::new(else_stmt)),
        }
    }

    /// Wrap a statement list, avoiding a block around a single statement
    pub fn from_stmts(mut stmts: Vec<Stmt>) -> Self {
        if stmts.len() == 1 && !matches!(stmts[0], Stmt::LocalVar { .. }) {
            stmts.remove(0)
        } else {
            Stmt::Block(Block::new(stmts))
        }
    }

    pub fn into_block(self) -> Block {
        match self {
            Stmt::Block(block) => block,
            Stmt::Empty => Block::default(),
            other => Block::new(vec![other]),
        }
    }

    pub fn can_complete_normally(&self) -> bool {
        match self {
            Stmt::Break(_) | Stmt::Continue(_) | Stmt::Return(_) | Stmt::Throw(_) => false,
            Stmt::Block(block) => block.can_complete_normally(),
            Stmt::If {
                then_stmt,
                else_stmt: Some(else_stmt),
                ..
            } => then_stmt.can_complete_normally() || else_stmt.can_complete_normally(),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_stmts_keeps_locals_scoped() {
        let single = Stmt::from_stmts(vec![Stmt::Break(None)]);
        assert!(matches!(single, Stmt::Break(None)));
        let local = Stmt::from_stmts(vec![Stmt::local(JavaType::Int, "x", None)]);
        assert!(matches!(local, Stmt::Block(_)));
    }

    #[test]
    fn test_completion() {
        let block = Block::new(vec![Stmt::Empty, Stmt::Return(None)]);
        assert!(!block.can_complete_normally());
        let branch = Stmt::if_else(Expr::bool(true), Stmt::Break(None), Stmt::Empty);
        assert!(branch.can_complete_normally());
    }
}
