// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Target expressions
//!
//! Every expression carries its result type so later passes can select operator
//! implementations from translated operands.

use crate::stmt::Block;
use crate::types::JavaType;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Boolean(bool),
    Char(char),
    Int(i32),
    Long(i64),
    String(String),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

impl UnaryOp {
    pub fn is_postfix(self) -> bool {
        matches!(self, UnaryOp::PostInc | UnaryOp::PostDec)
    }

    pub fn is_inc_dec(self) -> bool {
        matches!(
            self,
            UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec
        )
    }

    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::PreInc | UnaryOp::PostInc => "++",
            UnaryOp::PreDec | UnaryOp::PostDec => "--",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Shl,
    Shr,
    UShr,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => ">>>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitXor => "^",
            BinaryOp::BitOr => "|",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    /// Java precedence level, higher binds tighter
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 12,
            BinaryOp::Add | BinaryOp::Sub => 11,
            BinaryOp::Shl | BinaryOp::Shr | BinaryOp::UShr => 10,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 9,
            BinaryOp::Eq | BinaryOp::Ne => 8,
            BinaryOp::BitAnd => 7,
            BinaryOp::BitXor => 6,
            BinaryOp::BitOr => 5,
            BinaryOp::And => 4,
            BinaryOp::Or => 3,
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Eq | BinaryOp::Ne
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: JavaType,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    /// Local variable or parameter
    Local(String),
    /// Instance field; `None` target means the implicit `this`
    Field {
        target: Option<Box<Expr>>,
        name: String,
    },
    StaticField {
        class: String,
        name: String,
    },
    ArrayAccess {
        array: Box<Expr>,
        index: Box<Expr>,
    },
    /// Instance call; `None` target is an unqualified call
    MethodCall {
        target: Option<Box<Expr>>,
        name: String,
        args: Vec<Expr>,
    },
    StaticCall {
        class: String,
        name: String,
        args: Vec<Expr>,
    },
    SuperCall {
        name: String,
        args: Vec<Expr>,
    },
    /// `new T(args)`; the class is the expression type
    New {
        args: Vec<Expr>,
    },
    /// `new T[n][m]` or `new T[] { ... }`; `dims` is empty for the initializer form
    NewArray {
        element: JavaType,
        dims: Vec<Expr>,
        init: Vec<Expr>,
    },
    /// Cast to the expression type
    Cast(Box<Expr>),
    InstanceOf {
        expr: Box<Expr>,
        class: JavaType,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `target = value` or `target op= value`
    Assign {
        op: Option<BinaryOp>,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Conditional {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    /// `() -> { body }`
    Lambda(Block),
    This,
}

impl Expr {
    pub fn new(kind: ExprKind, ty: JavaType) -> Self {
        Self { kind, ty }
    }

    // === Literals ===

    pub fn bool(value: bool) -> Self {
        Self::new(ExprKind::Literal(Literal::Boolean(value)), JavaType::Boolean)
    }

    pub fn int(value: i32) -> Self {
        Self::new(ExprKind::Literal(Literal::Int(value)), JavaType::Int)
    }

    pub fn long(value: i64) -> Self {
        Self::new(ExprKind::Literal(Literal::Long(value)), JavaType::Long)
    }

    pub fn char(value: char) -> Self {
        Self::new(ExprKind::Literal(Literal::Char(value)), JavaType::Char)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(ExprKind::Literal(Literal::String(value.into())), JavaType::String)
    }

    /// `null` typed as `ty`
    pub fn null(ty: JavaType) -> Self {
        Self::new(ExprKind::Literal(Literal::Null), ty)
    }

    // === References ===

    pub fn local(name: impl Into<String>, ty: JavaType) -> Self {
        Self::new(ExprKind::Local(name.into()), ty)
    }

    pub fn this(ty: JavaType) -> Self {
        Self::new(ExprKind::This, ty)
    }

    pub fn field(target: Option<Expr>, name: impl Into<String>, ty: JavaType) -> Self {
        Self::new(
            ExprKind::Field {
                target: target.map(Box::new),
                name: name.into(),
            },
            ty,
        )
    }

    pub fn static_field(class: impl Into<String>, name: impl Into<String>, ty: JavaType) -> Self {
        Self::new(
            ExprKind::StaticField {
                class: class.into(),
                name: name.into(),
            },
            ty,
        )
    }

    pub fn array_access(array: Expr, index: Expr) -> Self {
        let ty = array
            .ty
            .element_type()
            .cloned()
            .unwrap_or_else(|| panic!("BUG: indexing non-array type {}", array.ty));
        Self::new(
            ExprKind::ArrayAccess {
                array: Box::new(array),
                index: Box::new(index),
            },
            ty,
        )
    }

    // === Calls ===

    pub fn call(target: Expr, name: impl Into<String>, args: Vec<Expr>, ty: JavaType) -> Self {
        Self::new(
            ExprKind::MethodCall {
                target: Some(Box::new(target)),
                name: name.into(),
                args,
            },
            ty,
        )
    }

    pub fn unqualified_call(name: impl Into<String>, args: Vec<Expr>, ty: JavaType) -> Self {
        Self::new(
            ExprKind::MethodCall {
                target: None,
                name: name.into(),
                args,
            },
            ty,
        )
    }

    pub fn static_call(
        class: impl Into<String>,
        name: impl Into<String>,
        args: Vec<Expr>,
        ty: JavaType,
    ) -> Self {
        Self::new(
            ExprKind::StaticCall {
                class: class.into(),
                name: name.into(),
                args,
            },
            ty,
        )
    }

    pub fn new_object(ty: JavaType, args: Vec<Expr>) -> Self {
        Self::new(ExprKind::New { args }, ty)
    }

    pub fn new_array(element: JavaType, size: Expr) -> Self {
        Self::new(
            ExprKind::NewArray {
                element: element.clone(),
                dims: vec![size],
                init: vec![],
            },
            JavaType::array_of(element),
        )
    }

    /// `new T[d0][d1]...` where `ty` is the full array type
    pub fn new_multi_array(ty: JavaType, dims: Vec<Expr>) -> Self {
        let element = match &ty {
            JavaType::Array(element) => (**element).clone(),
            other => panic!("BUG: array allocation of non-array type {}", other),
        };
        if dims.is_empty() {
            panic!("BUG: array allocation without dimensions");
        }
        Self::new(ExprKind::NewArray { element, dims, init: vec![] }, ty)
    }

    pub fn array_init(element: JavaType, init: Vec<Expr>) -> Self {
        Self::new(
            ExprKind::NewArray {
                element: element.clone(),
                dims: vec![],
                init,
            },
            JavaType::array_of(element),
        )
    }

    // === Operators ===

    pub fn cast(self, ty: JavaType) -> Self {
        Self::new(ExprKind::Cast(Box::new(self)), ty)
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        let ty = if op == UnaryOp::Not {
            JavaType::Boolean
        } else {
            operand.ty.clone()
        };
        Self::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            ty,
        )
    }

    /// `!e`, folding literals and double negation
    pub fn not(self) -> Self {
        match self.kind {
            ExprKind::Literal(Literal::Boolean(b)) => Expr::bool(!b),
            ExprKind::Unary {
                op: UnaryOp::Not,
                operand,
            } => *operand,
            kind => Expr::unary(UnaryOp::Not, Expr::new(kind, JavaType::Boolean)),
        }
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr, ty: JavaType) -> Self {
        Self::new(
            ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            ty,
        )
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        let ty = target.ty.clone();
        Self::new(
            ExprKind::Assign {
                op: None,
                target: Box::new(target),
                value: Box::new(value),
            },
            ty,
        )
    }

    pub fn compound_assign(op: BinaryOp, target: Expr, value: Expr) -> Self {
        let ty = target.ty.clone();
        Self::new(
            ExprKind::Assign {
                op: Some(op),
                target: Box::new(target),
                value: Box::new(value),
            },
            ty,
        )
    }

    pub fn conditional(cond: Expr, then_expr: Expr, else_expr: Expr) -> Self {
        let ty = then_expr.ty.clone();
        Self::new(
            ExprKind::Conditional {
                cond: Box::new(cond),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
            ty,
        )
    }

    pub fn lambda(body: Block) -> Self {
        Self::new(ExprKind::Lambda(body), JavaType::Class("Runnable".into()))
    }

    // === Queries ===

    pub fn as_literal(&self) -> Option<&Literal> {
        match &self.kind {
            ExprKind::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    /// Integral literal value, if this is one
    pub fn int_value(&self) -> Option<i64> {
        match &self.kind {
            ExprKind::Literal(Literal::Int(v)) => Some(*v as i64),
            ExprKind::Literal(Literal::Long(v)) => Some(*v),
            ExprKind::Literal(Literal::Char(c)) => Some(*c as i64),
            ExprKind::Unary {
                op: UnaryOp::Neg,
                operand,
            } => operand.int_value().map(|v| -v),
            _ => None,
        }
    }

    /// Compile-time constant usable as a switch label
    pub fn is_switch_constant(&self) -> bool {
        match &self.kind {
            ExprKind::Literal(Literal::Int(_)) | ExprKind::Literal(Literal::Char(_)) => true,
            ExprKind::Unary {
                op: UnaryOp::Neg,
                operand,
            } => operand.is_switch_constant(),
            _ => false,
        }
    }

    /// Re-evaluating the expression is free and has no effect
    pub fn is_simple(&self) -> bool {
        match &self.kind {
            ExprKind::Literal(_) | ExprKind::Local(_) | ExprKind::This => true,
            ExprKind::StaticField { .. } => true,
            ExprKind::Field { target, .. } => target.as_ref().map_or(true, |t| t.is_simple()),
            _ => false,
        }
    }

    /// Valid on the left of a Java assignment
    pub fn is_lvalue(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Local(_)
                | ExprKind::Field { .. }
                | ExprKind::StaticField { .. }
                | ExprKind::ArrayAccess { .. }
        )
    }

    /// Whether this is a plain method or constructor call, legal as a statement
    pub fn is_statement_expression(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::MethodCall { .. }
                | ExprKind::StaticCall { .. }
                | ExprKind::SuperCall { .. }
                | ExprKind::New { .. }
                | ExprKind::Assign { .. }
        ) || matches!(&self.kind, ExprKind::Unary { op, .. } if op.is_inc_dec())
    }

    /// Conservative side-effect check
    pub fn has_side_effects(&self) -> bool {
        match &self.kind {
            ExprKind::Literal(_)
            | ExprKind::Local(_)
            | ExprKind::This
            | ExprKind::StaticField { .. }
            | ExprKind::Lambda(_) => false,
            ExprKind::Field { target, .. } => target.as_ref().map_or(false, |t| t.has_side_effects()),
            ExprKind::ArrayAccess { array, index } => array.has_side_effects() || index.has_side_effects(),
            ExprKind::Cast(e) | ExprKind::InstanceOf { expr: e, .. } => e.has_side_effects(),
            ExprKind::Unary { op, operand } => op.is_inc_dec() || operand.has_side_effects(),
            ExprKind::Binary { lhs, rhs, .. } => lhs.has_side_effects() || rhs.has_side_effects(),
            ExprKind::Conditional {
                cond,
                then_expr,
                else_expr,
            } => cond.has_side_effects() || then_expr.has_side_effects() || else_expr.has_side_effects(),
            ExprKind::NewArray { dims, init, .. } => {
                dims.iter().chain(init).any(|e| e.has_side_effects())
            }
            ExprKind::MethodCall { .. }
            | ExprKind::StaticCall { .. }
            | ExprKind::SuperCall { .. }
            | ExprKind::New { .. }
            | ExprKind::Assign { .. } => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_folds() {
        assert_eq!(Expr::bool(true).not(), Expr::bool(false));
        let a = Expr::local("a", JavaType::Boolean);
        assert_eq!(a.clone().not().not(), a);
    }

    #[test]
    fn test_switch_constants() {
        assert!(Expr::int(3).is_switch_constant());
        assert!(Expr::unary(UnaryOp::Neg, Expr::int(3)).is_switch_constant());
        assert_eq!(Expr::unary(UnaryOp::Neg, Expr::int(3)).int_value(), Some(-3));
        assert!(!Expr::local("x", JavaType::Int).is_switch_constant());
        assert!(!Expr::string("s").is_switch_constant());
    }

    #[test]
    fn test_side_effects() {
        let arr = Expr::local("arr", JavaType::array_of(JavaType::Int));
        let call = Expr::unqualified_call("next", vec![], JavaType::Int);
        assert!(Expr::array_access(arr.clone(), call).has_side_effects());
        assert!(!Expr::array_access(arr, Expr::int(0)).has_side_effects());
    }
}
