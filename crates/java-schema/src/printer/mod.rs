// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Java source printer
//!
//! The printer is intentionally "dumb": it pattern matches target nodes and emits the
//! corresponding Java text. All semantic decisions are made by the translator.

mod decl;
mod expr;
mod stmt;
mod writer;

use crate::decl::{ClassDecl, CompilationUnit};
use crate::expr::Expr;
use crate::stmt::{Block, Stmt};

pub use writer::{render_to_string, JavaWriter};

/// Render a complete Java source file
pub fn render_unit(unit: &CompilationUnit) -> String {
    render_to_string(|w| decl::render_compilation_unit(unit, w))
}

pub fn render_class_to_string(class: &ClassDecl) -> String {
    render_to_string(|w| decl::render_class(class, w))
}

pub fn render_expr_to_string(expr: &Expr) -> String {
    render_to_string(|w| expr::render_expr(expr, w))
}

pub fn render_stmt_to_string(stmt: &Stmt) -> String {
    render_to_string(|w| stmt::render_stmt(stmt, w))
}

/// Render the statements of a block without the enclosing braces
pub fn render_stmts_to_string(block: &Block) -> String {
    render_to_string(|w| stmt::render_stmts(&block.stmts, w))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::{ClassKind, EnumConstant, FieldDecl, MethodDecl, Modifiers, Param};
    use crate::expr::{BinaryOp, UnaryOp};
    use crate::stmt::SwitchCase;
    use crate::types::JavaType;
    use insta::assert_snapshot;

    fn local(name: &str) -> Expr {
        Expr::local(name, JavaType::Int)
    }

    #[test]
    fn test_precedence_parentheses() {
        let sum = Expr::binary(BinaryOp::Add, local("a"), local("b"), JavaType::Int);
        let product = Expr::binary(BinaryOp::Mul, sum.clone(), local("c"), JavaType::Int);
        assert_snapshot!(render_expr_to_string(&product), @"(a + b) * c");

        let nested = Expr::binary(BinaryOp::Sub, local("a"), sum, JavaType::Int);
        assert_snapshot!(render_expr_to_string(&nested), @"a - (a + b)");
    }

    #[test]
    fn test_cast_receiver_is_parenthesized() {
        let cast = Expr::local("o", JavaType::Object).cast(JavaType::Class("Foo".into()));
        let call = Expr::call(cast, "run", vec![], JavaType::Void);
        assert_snapshot!(render_expr_to_string(&call), @"((Foo) o).run()");
    }

    #[test]
    fn test_negation_does_not_fuse() {
        let neg = Expr::unary(UnaryOp::Neg, Expr::int(-1));
        assert_snapshot!(render_expr_to_string(&neg), @"-(-1)");
    }

    #[test]
    fn test_string_escapes() {
        let s = Expr::string("a\"b\n");
        assert_snapshot!(render_expr_to_string(&s), @r#""a\"b\n""#);
    }

    #[test]
    fn test_array_creation() {
        let sized = Expr::new_array(JavaType::array_of(JavaType::Int), Expr::int(4));
        assert_snapshot!(render_expr_to_string(&sized), @"new int[4][]");
        let init = Expr::array_init(JavaType::Int, vec![Expr::int(1), Expr::int(2)]);
        assert_snapshot!(render_expr_to_string(&init), @"new int[] { 1, 2 }");
        let grid = Expr::new_multi_array(
            JavaType::array_of(JavaType::array_of(JavaType::Bit)),
            vec![Expr::int(2), Expr::int(3)],
        );
        assert_snapshot!(render_expr_to_string(&grid), @"new Bit[2][3]");
    }

    #[test]
    fn test_else_if_chain() {
        let chain = Stmt::if_else(
            Expr::local("a", JavaType::Boolean),
            Stmt::Break(None),
            Stmt::if_else(Expr::local("b", JavaType::Boolean), Stmt::Continue(None), Stmt::Empty),
        );
        let text = render_stmt_to_string(&chain);
        assert_eq!(
            text,
            "if (a) {\n    break;\n} else if (b) {\n    continue;\n} else {}\n"
        );
    }

    #[test]
    fn test_switch_layout() {
        let switch = Stmt::Switch {
            selector: local("x"),
            cases: vec![SwitchCase {
                labels: vec![Expr::int(1), Expr::int(2)],
                body: vec![Stmt::Break(None)],
            }],
            default: Some(vec![Stmt::Break(None)]),
        };
        let text = render_stmt_to_string(&switch);
        assert_eq!(
            text,
            "switch (x) {\n    case 1:\n    case 2:\n        break;\n    default:\n        break;\n}\n"
        );
    }

    #[test]
    fn test_render_unit() {
        let mut color = ClassDecl::new("Color");
        color.kind = ClassKind::Enum(vec![
            EnumConstant {
                name: "RED".into(),
                args: vec![Expr::int(0)],
            },
            EnumConstant {
                name: "UNDEFINED".into(),
                args: vec![Expr::int(-1)],
            },
        ]);
        color.modifiers = Modifiers::public().with_static();

        let mut main = ClassDecl::new("Top");
        main.fields.push(FieldDecl {
            modifiers: Modifiers::private().with_static(),
            ty: JavaType::Int,
            name: "count".into(),
            init: Some(Expr::int(0)),
        });
        main.methods.push(MethodDecl::new(
            "log",
            JavaType::Void,
            vec![
                Param::new(JavaType::String, "fmt"),
                Param::new(JavaType::array_of(JavaType::Object), "args"),
            ],
            Block::default(),
        ));
        main.methods[0].is_varargs = true;
        main.nested.push(color);

        let unit = CompilationUnit {
            package: Some("tb".into()),
            imports: vec!["juno.runtime.*".into()],
            classes: vec![main],
        };
        let text = render_unit(&unit);
        assert!(text.starts_with("package tb;\n\nimport juno.runtime.*;\n\npublic class Top {\n"));
        assert!(text.contains("    private static int count = 0;\n"));
        assert!(text.contains("    public void log(String fmt, Object... args) {\n    }\n"));
        assert!(text.contains("    public static enum Color {\n        RED(0),\n        UNDEFINED(-1);\n    }\n"));
    }
}
