// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Source expressions
//!
//! Every node carries its front-end type and a `NodeId` so analysis facts can be
//! queried by identity. The set of kinds is closed; the translator matches on it
//! exhaustively.

use crate::ids::{ClassId, EnumId, FuncId, NodeId, VarId};
use crate::literal::BitLiteral;
use crate::loc::Loc;
use crate::types::VeraType;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Negate,
    BitNot,
    LogicalNot,
    ReduceAnd,
    ReduceNand,
    ReduceOr,
    ReduceNor,
    ReduceXor,
    ReduceXnor,
}

impl UnaryOp {
    pub fn is_reduction(self) -> bool {
        !matches!(self, UnaryOp::Negate | UnaryOp::BitNot | UnaryOp::LogicalNot)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Negate => "-",
            UnaryOp::BitNot => "~",
            UnaryOp::LogicalNot => "!",
            UnaryOp::ReduceAnd => "&",
            UnaryOp::ReduceNand => "~&",
            UnaryOp::ReduceOr => "|",
            UnaryOp::ReduceNor => "~|",
            UnaryOp::ReduceXor => "^",
            UnaryOp::ReduceXnor => "~^",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    ShiftLeft,
    ShiftRight,
    BitAnd,
    BitOr,
    BitXor,
    BitNand,
    BitNor,
    BitXnor,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Equal,
    NotEqual,
    /// `===`
    ExactEqual,
    /// `!==`
    ExactNotEqual,
    /// `=?=`
    WildEqual,
    /// `!?=`
    WildNotEqual,
    LogicalAnd,
    LogicalOr,
}

impl BinaryOp {
    pub fn is_relational(self) -> bool {
        matches!(
            self,
            BinaryOp::Less | BinaryOp::LessEq | BinaryOp::Greater | BinaryOp::GreaterEq
        )
    }

    pub fn is_equality(self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::ExactEqual
                | BinaryOp::ExactNotEqual
                | BinaryOp::WildEqual
                | BinaryOp::WildNotEqual
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::LogicalAnd | BinaryOp::LogicalOr)
    }

    pub fn is_shift(self) -> bool {
        matches!(self, BinaryOp::ShiftLeft | BinaryOp::ShiftRight)
    }

    /// Operators whose result width is the wider operand width
    pub fn is_width_preserving(self) -> bool {
        !(self.is_relational() || self.is_equality() || self.is_logical())
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::ShiftLeft => "<<",
            BinaryOp::ShiftRight => ">>",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::BitNand => "~&",
            BinaryOp::BitNor => "~|",
            BinaryOp::BitXnor => "~^",
            BinaryOp::Less => "<",
            BinaryOp::LessEq => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEq => ">=",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::ExactEqual => "===",
            BinaryOp::ExactNotEqual => "!==",
            BinaryOp::WildEqual => "=?=",
            BinaryOp::WildNotEqual => "!?=",
            BinaryOp::LogicalAnd => "&&",
            BinaryOp::LogicalOr => "||",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncDecOp {
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

impl IncDecOp {
    pub fn is_increment(self) -> bool {
        matches!(self, IncDecOp::PreIncrement | IncDecOp::PostIncrement)
    }

    pub fn is_prefix(self) -> bool {
        matches!(self, IncDecOp::PreIncrement | IncDecOp::PreDecrement)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
    pub ty: VeraType,
    pub loc: Loc,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    // === Literals ===
    IntegerLiteral(i64),
    BitLiteral(BitLiteral),
    StringLiteral(String),
    NullLiteral,
    /// `void`: releases a drive, or discards a value
    VoidLiteral,
    EnumValue { enum_id: EnumId, index: usize },

    // === References ===
    This,
    Super,
    Var(VarId),
    Member { object: Box<Expr>, field: VarId },
    Index { array: Box<Expr>, indices: Vec<Expr> },
    BitSlice { target: Box<Expr>, high: Box<Expr>, low: Box<Expr> },
    /// `target[range_name]` using a declared named range
    RangeSlice { target: Box<Expr>, range: String },
    Concat(Vec<Expr>),
    Replicate { count: Box<Expr>, elements: Vec<Expr> },

    // === Operators ===
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr> },
    IncDec { op: IncDecOp, target: Box<Expr> },
    Assign { target: Box<Expr>, value: Box<Expr> },
    CompoundAssign { op: BinaryOp, target: Box<Expr>, value: Box<Expr> },
    Conditional { cond: Box<Expr>, then_expr: Box<Expr>, else_expr: Box<Expr> },

    // === Calls and allocation ===
    Call { func: FuncId, args: Vec<Expr> },
    MethodCall { object: Box<Expr>, func: FuncId, args: Vec<Expr> },
    SuperCall { func: FuncId, args: Vec<Expr> },
    /// Library intrinsic, optionally invoked on a receiver (`s.len()`)
    BuiltinCall { name: String, receiver: Option<Box<Expr>>, args: Vec<Expr> },
    New { class: ClassId, args: Vec<Expr> },
    /// `new[size]` or `new[size](source)` for dynamic arrays
    NewArray { size: Box<Expr>, source: Option<Box<Expr>> },

    // === Signals ===
    /// `signal.0` or `signal.N` sampled value
    Sample { signal: Box<Expr>, depth: Option<Box<Expr>> },

    // === Deferred ===
    InSet { expr: Box<Expr>, set: Vec<Expr> },
    Dist { expr: Box<Expr>, weights: Vec<(Expr, Expr)> },
    HdlTaskCall { name: String, args: Vec<Expr> },
}

impl ExprKind {
    /// Short description used in diagnostics
    pub fn describe(&self) -> &'static str {
        match self {
            ExprKind::IntegerLiteral(_) => "integer literal",
            ExprKind::BitLiteral(_) => "bit literal",
            ExprKind::StringLiteral(_) => "string literal",
            ExprKind::NullLiteral => "null",
            ExprKind::VoidLiteral => "void",
            ExprKind::EnumValue { .. } => "enum value",
            ExprKind::This => "this",
            ExprKind::Super => "super",
            ExprKind::Var(_) => "variable reference",
            ExprKind::Member { .. } => "member access",
            ExprKind::Index { .. } => "array index",
            ExprKind::BitSlice { .. } => "bit slice",
            ExprKind::RangeSlice { .. } => "named range slice",
            ExprKind::Concat(_) => "concatenation",
            ExprKind::Replicate { .. } => "replication",
            ExprKind::Unary { .. } => "unary operator",
            ExprKind::Binary { .. } => "binary operator",
            ExprKind::IncDec { .. } => "increment/decrement",
            ExprKind::Assign { .. } => "assignment",
            ExprKind::CompoundAssign { .. } => "compound assignment",
            ExprKind::Conditional { .. } => "conditional expression",
            ExprKind::Call { .. } => "function call",
            ExprKind::MethodCall { .. } => "method call",
            ExprKind::SuperCall { .. } => "super call",
            ExprKind::BuiltinCall { .. } => "built-in call",
            ExprKind::New { .. } => "new",
            ExprKind::NewArray { .. } => "dynamic array new",
            ExprKind::Sample { .. } => "signal sample",
            ExprKind::InSet { .. } => "set membership",
            ExprKind::Dist { .. } => "distribution",
            ExprKind::HdlTaskCall { .. } => "HDL task call",
        }
    }
}

impl Expr {
    pub fn new(id: NodeId, kind: ExprKind, ty: VeraType) -> Self {
        Self {
            id,
            kind,
            ty,
            loc: Loc::default(),
        }
    }

    pub fn with_loc(mut self, loc: Loc) -> Self {
        self.loc = loc;
        self
    }

    /// Whether the expression can appear on the left of an assignment
    pub fn is_assignable(&self) -> bool {
        match &self.kind {
            ExprKind::Var(_) | ExprKind::Member { .. } => true,
            ExprKind::Index { array, .. } => array.is_assignable(),
            ExprKind::BitSlice { target, .. } | ExprKind::RangeSlice { target, .. } => {
                target.is_assignable()
            }
            ExprKind::Concat(elements) => {
                !elements.is_empty() && elements.iter().all(|e| e.is_assignable())
            }
            _ => false,
        }
    }

    /// Integer value of a literal operand, if any
    pub fn constant_int(&self) -> Option<i64> {
        match &self.kind {
            ExprKind::IntegerLiteral(v) => Some(*v),
            ExprKind::BitLiteral(lit) => lit.to_i64(),
            _ => None,
        }
    }

    /// Direct children in evaluation order
    pub fn children(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::IntegerLiteral(_)
            | ExprKind::BitLiteral(_)
            | ExprKind::StringLiteral(_)
            | ExprKind::NullLiteral
            | ExprKind::VoidLiteral
            | ExprKind::EnumValue { .. }
            | ExprKind::This
            | ExprKind::Super
            | ExprKind::Var(_) => vec![],
            ExprKind::Member { object, .. } => vec![object.as_ref()],
            ExprKind::Index { array, indices } => {
                std::iter::once(array.as_ref()).chain(indices.iter()).collect()
            }
            ExprKind::BitSlice { target, high, low } => vec![target.as_ref(), high.as_ref(), low.as_ref()],
            ExprKind::RangeSlice { target, .. } => vec![target.as_ref()],
            ExprKind::Concat(elements) => elements.iter().collect(),
            ExprKind::Replicate { count, elements } => {
                std::iter::once(count.as_ref()).chain(elements.iter()).collect()
            }
            ExprKind::Unary { operand, .. } => vec![operand.as_ref()],
            ExprKind::Binary { lhs, rhs, .. } => vec![lhs.as_ref(), rhs.as_ref()],
            ExprKind::IncDec { target, .. } => vec![target.as_ref()],
            ExprKind::Assign { target, value } | ExprKind::CompoundAssign { target, value, .. } => {
                vec![target.as_ref(), value.as_ref()]
            }
            ExprKind::Conditional {
                cond,
                then_expr,
                else_expr,
            } => vec![cond.as_ref(), then_expr.as_ref(), else_expr.as_ref()],
            ExprKind::Call { args, .. }
            | ExprKind::SuperCall { args, .. }
            | ExprKind::New { args, .. }
            | ExprKind::HdlTaskCall { args, .. } => args.iter().collect(),
            ExprKind::MethodCall { object, args, .. } => {
                std::iter::once(object.as_ref()).chain(args.iter()).collect()
            }
            ExprKind::BuiltinCall { receiver, args, .. } => {
                receiver.iter().map(|r| r.as_ref()).chain(args.iter()).collect()
            }
            ExprKind::NewArray { size, source } => {
                std::iter::once(size.as_ref()).chain(source.iter().map(|s| s.as_ref())).collect()
            }
            ExprKind::Sample { signal, depth } => {
                std::iter::once(signal.as_ref()).chain(depth.iter().map(|d| d.as_ref())).collect()
            }
            ExprKind::InSet { expr, set } => std::iter::once(expr.as_ref()).chain(set.iter()).collect(),
            ExprKind::Dist { expr, weights } => std::iter::once(expr.as_ref())
                .chain(weights.iter().flat_map(|(v, w)| [v, w]))
                .collect(),
        }
    }

    /// Conservative check for side effects: calls, assignments, allocation
    pub fn has_side_effects(&self) -> bool {
        match &self.kind {
            ExprKind::IncDec { .. }
            | ExprKind::Assign { .. }
            | ExprKind::CompoundAssign { .. }
            | ExprKind::Call { .. }
            | ExprKind::MethodCall { .. }
            | ExprKind::SuperCall { .. }
            | ExprKind::BuiltinCall { .. }
            | ExprKind::New { .. }
            | ExprKind::NewArray { .. }
            | ExprKind::HdlTaskCall { .. } => true,
            _ => self.children().into_iter().any(|c| c.has_side_effects()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(id: u32) -> Expr {
        Expr::new(NodeId(id), ExprKind::Var(VarId(id)), VeraType::Integer)
    }

    #[test]
    fn test_assignability() {
        let slice = Expr::new(
            NodeId(10),
            ExprKind::BitSlice {
                target: Box::new(var(1)),
                high: Box::new(Expr::new(NodeId(11), ExprKind::IntegerLiteral(3), VeraType::Integer)),
                low: Box::new(Expr::new(NodeId(12), ExprKind::IntegerLiteral(0), VeraType::Integer)),
            },
            VeraType::bit(4),
        );
        assert!(slice.is_assignable());

        let concat = Expr::new(NodeId(13), ExprKind::Concat(vec![var(2), slice]), VeraType::bit(36));
        assert!(concat.is_assignable());

        let sum = Expr::new(
            NodeId(14),
            ExprKind::Binary {
                op: BinaryOp::Add,
                lhs: Box::new(var(1)),
                rhs: Box::new(var(2)),
            },
            VeraType::Integer,
        );
        assert!(!sum.is_assignable());
        assert!(!sum.has_side_effects());
    }

    #[test]
    fn test_side_effects_are_found_in_children() {
        let call = Expr::new(
            NodeId(20),
            ExprKind::Call {
                func: FuncId(0),
                args: vec![],
            },
            VeraType::Integer,
        );
        let index = Expr::new(
            NodeId(21),
            ExprKind::Index {
                array: Box::new(var(3)),
                indices: vec![call],
            },
            VeraType::Integer,
        );
        assert!(index.has_side_effects());
        assert_eq!(index.children().len(), 2);
    }
}
