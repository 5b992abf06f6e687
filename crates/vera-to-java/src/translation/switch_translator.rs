// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! `case` and `randcase`
//!
//! A `case` becomes a Java `switch` when the selector is a two-valued integral or an
//! enum and every item value is a distinct constant. Anything else, four-state
//! selectors included, becomes an `if`/`else if` chain over a selector evaluated once,
//! comparing with exact equality for `case` and wildcard equality for `casex`/`casez`.

use super::expression_translator::{translate_value, translate_with, Expected};
use super::statement_translator::{settle, translate_body};
use crate::context::{FrameKind, TranslationContext};
use crate::converted_expression::{discard_value, ConvertedExpression};
use crate::error::{Result, TranslationError};
use crate::expression_converter::{self as conv, bit_vector_literal};
use crate::operation_builder::{fold_boolean_literal_compare, OperationBuilder, Operand};
use java_schema::runtime::JUNO;
use java_schema::{BinaryOp as JBinaryOp, Block, Expr, ExprKind, JavaType, Stmt, SwitchCase};
use log::debug;
use std::collections::BTreeSet;
use vera_model::{
    BinaryOp, CaseItem, CaseKind, Expr as VeraExpr, ExprKind as VeraExprKind, Loc, RandCaseItem, Stmt as VeraStmt,
};

pub fn translate_case(
    ctx: &mut TranslationContext<'_, '_>,
    kind: CaseKind,
    selector: &VeraExpr,
    items: &[CaseItem],
    default: Option<&VeraStmt>,
    loc: Loc,
) -> Result<Vec<Stmt>> {
    let mut conv = ConvertedExpression::empty();
    let value = translate_value(ctx, selector, &mut conv)?;
    conv.set_value(value);
    let (mut stmts, value) = settle(ctx, conv, "sel");

    if items.is_empty() && default.is_none() {
        stmts.extend(discard_value(value));
        return Ok(stmts);
    }
    if let Some(labels) = switch_labels(ctx, &value, items)? {
        stmts.push(native_switch(ctx, value, labels, items, default)?);
        return Ok(stmts);
    }

    debug!("case at {}: item values are not distinct constants, using an if-else chain", loc);
    let value = match &value.kind {
        ExprKind::Literal(_) | ExprKind::Local(_) => value,
        _ => {
            let (decl, reference) = ctx.declare_temp("sel", value);
            stmts.push(decl);
            reference
        }
    };
    let op = if kind.is_wildcard() {
        BinaryOp::WildEqual
    } else {
        BinaryOp::ExactEqual
    };
    let chain = if_chain(ctx, op, selector, &value, items, default)?;
    stmts.extend(chain);
    Ok(stmts)
}

// ============================================================================
// Native switch

/// Labels for every item when all of them are distinct switch constants
fn switch_labels(
    ctx: &mut TranslationContext<'_, '_>,
    selector: &Expr,
    items: &[CaseItem],
) -> Result<Option<Vec<Vec<Expr>>>> {
    let enum_name = match &selector.ty {
        JavaType::Int | JavaType::Char => None,
        JavaType::Enum(name) => Some(name.clone()),
        _ => return Ok(None),
    };
    let mut seen = BTreeSet::new();
    let mut result = vec![];
    for item in items {
        let mut labels = vec![];
        for value in &item.values {
            let label = match &enum_name {
                Some(name) => enum_label(ctx, name, value),
                None => int_label(ctx, value)?,
            };
            let Some((key, label)) = label else {
                return Ok(None);
            };
            if !seen.insert(key) {
                return Ok(None);
            }
            labels.push(label);
        }
        result.push(labels);
    }
    Ok(Some(result))
}

/// Constant integral label; bit literals without X or Z count
fn int_label(ctx: &mut TranslationContext<'_, '_>, value: &VeraExpr) -> Result<Option<(i64, Expr)>> {
    let translated = translate_with(ctx, value, &Expected::none())?;
    if translated.has_statements() {
        return Ok(None);
    }
    let Some(expr) = translated.value() else {
        return Ok(None);
    };
    if expr.is_switch_constant() {
        return Ok(expr.int_value().map(|v| (v, expr.clone())));
    }
    Ok(bit_vector_literal(expr)
        .and_then(|(_, v)| i32::try_from(v).ok())
        .map(|v| (v as i64, Expr::int(v))))
}

/// Enum switch labels are the bare constant names
fn enum_label(ctx: &mut TranslationContext<'_, '_>, name: &str, value: &VeraExpr) -> Option<(i64, Expr)> {
    let VeraExprKind::EnumValue { enum_id, index } = &value.kind else {
        return None;
    };
    if ctx.session.enum_name(*enum_id) != name {
        return None;
    }
    let decl = ctx.session.symbols.enum_decl(*enum_id);
    let constant = java_schema::naming::escape_identifier(&decl.values.get(*index)?.name);
    Some((*index as i64, Expr::local(constant, JavaType::Enum(name.to_string()))))
}

/// Statements of a switch case: the body, then `break` when control can fall out of it
fn case_body(body: Stmt, last: bool) -> Vec<Stmt> {
    let completes = body.can_complete_normally();
    let mut stmts = match body {
        Stmt::Empty => vec![],
        Stmt::Block(block) if block.is_empty() => vec![],
        other => vec![other],
    };
    if completes && !last {
        stmts.push(Stmt::Break(None));
    }
    stmts
}

fn native_switch(
    ctx: &mut TranslationContext<'_, '_>,
    selector: Expr,
    labels: Vec<Vec<Expr>>,
    items: &[CaseItem],
    default: Option<&VeraStmt>,
) -> Result<Stmt> {
    ctx.push_frame(FrameKind::Switch, false);
    let result = (|| -> Result<Stmt> {
        let mut cases = vec![];
        for (index, (item, labels)) in items.iter().zip(labels).enumerate() {
            let last = default.is_none() && index + 1 == items.len();
            let body = translate_body(ctx, &item.body)?;
            cases.push(SwitchCase {
                labels,
                body: case_body(body, last),
            });
        }
        let default = match default {
            Some(stmt) => Some(case_body(translate_body(ctx, stmt)?, true)),
            None => None,
        };
        Ok(Stmt::Switch {
            selector,
            cases,
            default,
        })
    })();
    ctx.pop_frame();
    result
}

// ============================================================================
// If-else chain

/// Test of one item against the captured selector, with the statements computing
/// the item's values
fn item_test(
    ctx: &mut TranslationContext<'_, '_>,
    op: BinaryOp,
    source: &VeraExpr,
    selector: &Expr,
    item: &CaseItem,
) -> Result<(Vec<Stmt>, Expr)> {
    let mut stmts = vec![];
    let mut test: Option<Expr> = None;
    for value in &item.values {
        let mut conv = ConvertedExpression::empty();
        let v = translate_value(ctx, value, &mut conv)?;
        conv.set_value(v);
        let (init, v) = settle(ctx, conv, "item");
        stmts.extend(init);
        let matched = compare(op, source, selector.clone(), value, v)?;
        test = Some(match test {
            Some(prev) => Expr::binary(JBinaryOp::Or, prev, matched, JavaType::Boolean),
            None => matched,
        });
    }
    let Some(test) = test else {
        panic!("BUG: case item without values");
    };
    Ok((stmts, test))
}

fn compare(op: BinaryOp, source: &VeraExpr, selector: Expr, value_source: &VeraExpr, value: Expr) -> Result<Expr> {
    let (l, r) = match fold_boolean_literal_compare(op, selector, value) {
        Ok(folded) => return Ok(folded),
        Err(operands) => operands,
    };
    let Some(builder) = OperationBuilder::select(op, &l.ty, &r.ty, None) else {
        return Err(TranslationError::conversion(&r.ty, &l.ty, "case item", value_source.loc));
    };
    let matched = builder
        .binary(
            op,
            Operand::new(l, source.ty.is_signed()),
            Operand::new(r, value_source.ty.is_signed()),
        )
        .map_err(|e| e.at("case item", value_source.loc))?;
    conv::to_boolean(matched, false).map_err(|e| e.at("case item", value_source.loc))
}

/// Build the chain from the last item up, so each item's value statements can sit in
/// the `else` of the previous item and only run when it did not match
fn if_chain(
    ctx: &mut TranslationContext<'_, '_>,
    op: BinaryOp,
    source: &VeraExpr,
    selector: &Expr,
    items: &[CaseItem],
    default: Option<&VeraStmt>,
) -> Result<Vec<Stmt>> {
    let mut tests = vec![];
    for item in items {
        let (init, test) = item_test(ctx, op, source, selector, item)?;
        let body = translate_body(ctx, &item.body)?;
        tests.push((init, test, body));
    }
    let mut rest: Vec<Stmt> = match default {
        Some(stmt) => vec![translate_body(ctx, stmt)?],
        None => vec![],
    };
    for (init, test, body) in tests.into_iter().rev() {
        let stmt = match rest.len() {
            0 => Stmt::if_then(test, body),
            _ => Stmt::if_else(test, body, Stmt::from_stmts(rest)),
        };
        rest = init;
        rest.push(stmt);
    }
    Ok(rest)
}

// ============================================================================
// randcase

/// `randcase` picks an item with probability proportional to its weight:
/// `switch (Juno.randomIndex(weights))`
pub fn translate_randcase(
    ctx: &mut TranslationContext<'_, '_>,
    items: &[RandCaseItem],
    loc: Loc,
) -> Result<Vec<Stmt>> {
    if items.is_empty() {
        return Err(TranslationError::unsupported("randcase without items", loc));
    }
    let mut conv = ConvertedExpression::empty();
    let mut weights = vec![];
    for item in items {
        let translated = translate_with(ctx, &item.weight, &Expected::of(&JavaType::Int))?;
        if translated.has_init() {
            // Earlier weights are already computed; keep them ahead of these statements
            for weight in weights.iter_mut() {
                let mut init = vec![];
                *weight = ctx.capture("weight", std::mem::replace(weight, Expr::int(0)), &mut init);
                conv.add_inits(init);
            }
        }
        let weight = conv.merge_value(translated);
        weights.push(conv::to_int(weight).map_err(|e| e.at("randcase weight", item.weight.loc))?);
    }
    let array = Expr::array_init(JavaType::Int, weights);
    conv.set_value(array);
    let (mut stmts, array) = settle(ctx, conv, "weights");
    let (decl, array) = ctx.declare_temp("weights", array);
    stmts.push(decl);
    let index = Expr::static_call(JUNO, "randomIndex", vec![array], JavaType::Int);

    ctx.push_frame(FrameKind::Switch, false);
    let cases = (|| -> Result<Vec<SwitchCase>> {
        let mut cases = vec![];
        for (index, item) in items.iter().enumerate() {
            let body = translate_body(ctx, &item.body)?;
            cases.push(SwitchCase {
                labels: vec![Expr::int(index as i32)],
                body: case_body(body, index + 1 == items.len()),
            });
        }
        Ok(cases)
    })();
    ctx.pop_frame();
    stmts.push(Stmt::Switch {
        selector: index,
        cases: cases?,
        default: None,
    });
    Ok(vec![Stmt::Block(Block::new(stmts))])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::TranslatorOptions;
    use crate::session::TranslationSession;
    use crate::translation::statement_translator::translate_stmt;
    use insta::assert_snapshot;
    use java_schema::render_stmts_to_string;
    use vera_model::{
        AnalysisResults, BitLiteral, CompilationUnit, EnumDecl, EnumId, FuncId, FunctionDecl, NodeId, StmtKind,
        VarDecl, VarId, VeraType,
    };

    fn e(kind: VeraExprKind, ty: VeraType) -> VeraExpr {
        VeraExpr::new(NodeId(0), kind, ty)
    }

    fn s(kind: StmtKind) -> VeraStmt {
        VeraStmt::new(NodeId(0), kind)
    }

    fn var(id: u32, ty: VeraType) -> VeraExpr {
        e(VeraExprKind::Var(VarId(id)), ty)
    }

    fn int(v: i64) -> VeraExpr {
        e(VeraExprKind::IntegerLiteral(v), VeraType::Integer)
    }

    fn bits(text: &str, width: u32) -> VeraExpr {
        e(VeraExprKind::BitLiteral(BitLiteral::parse(text).unwrap()), VeraType::bit(width))
    }

    fn next() -> VeraExpr {
        e(
            VeraExprKind::Call {
                func: FuncId(0),
                args: vec![],
            },
            VeraType::Integer,
        )
    }

    /// `Top.hits++` as a recognisable body
    fn hit() -> VeraStmt {
        s(StmtKind::Expr(e(
            VeraExprKind::IncDec {
                op: vera_model::IncDecOp::PostIncrement,
                target: Box::new(var(2, VeraType::Integer)),
            },
            VeraType::Integer,
        )))
    }

    fn item(values: Vec<VeraExpr>, body: VeraStmt) -> CaseItem {
        CaseItem { values, body }
    }

    fn unit() -> CompilationUnit {
        CompilationUnit {
            name: "top".into(),
            enums: vec![EnumDecl::new(EnumId(0), "state", &["idle", "busy"])],
            globals: vec![
                VarDecl::new(VarId(1), "op", VeraType::Integer),
                VarDecl::new(VarId(2), "hits", VeraType::Integer),
                VarDecl::new(VarId(3), "limit", VeraType::Integer),
                VarDecl::new(VarId(4), "bus", VeraType::bit(4)),
                VarDecl::new(VarId(5), "st", VeraType::Enum(EnumId(0))),
            ],
            functions: vec![FunctionDecl::function(FuncId(0), "next", VeraType::Integer)],
            ..Default::default()
        }
    }

    fn facts() -> AnalysisResults {
        let mut facts = AnalysisResults::new();
        for id in 1..=3 {
            facts.mark_not_assigned_xz(VarId(id));
        }
        facts.xz_free_returns.insert(FuncId(0));
        facts
    }

    fn with_ctx<T>(f: impl FnOnce(&mut TranslationContext<'_, '_>) -> T) -> T {
        let unit = unit();
        let facts = facts();
        let mut session = TranslationSession::new(&unit, &facts, TranslatorOptions::default());
        let mut ctx = TranslationContext::new(&mut session, None, true);
        f(&mut ctx)
    }

    fn render(stmts: Vec<Stmt>) -> String {
        render_stmts_to_string(&Block::new(stmts))
    }

    #[test]
    fn test_constant_items_become_switch() {
        let text = with_ctx(|ctx| {
            let items = vec![item(vec![int(1), int(2)], hit()), item(vec![bits("4'h3", 4)], hit())];
            let default = s(StmtKind::Empty);
            let stmt = s(StmtKind::Case {
                kind: CaseKind::Case,
                selector: var(1, VeraType::Integer),
                items,
                default: Some(Box::new(default)),
            });
            render(translate_stmt(ctx, &stmt).unwrap())
        });
        assert_snapshot!(text, @r"
        switch (Top.op) {
            case 1:
            case 2:
                Top.hits++;
                break;
            case 3:
                Top.hits++;
                break;
            default:
        }
        ");
    }

    #[test]
    fn test_enum_selector_uses_constant_names() {
        let text = with_ctx(|ctx| {
            let value = |index| {
                e(
                    VeraExprKind::EnumValue {
                        enum_id: EnumId(0),
                        index,
                    },
                    VeraType::Enum(EnumId(0)),
                )
            };
            let stmt = s(StmtKind::Case {
                kind: CaseKind::Case,
                selector: var(5, VeraType::Enum(EnumId(0))),
                items: vec![item(vec![value(0)], hit()), item(vec![value(1)], s(StmtKind::Empty))],
                default: None,
            });
            render(translate_stmt(ctx, &stmt).unwrap())
        });
        assert!(text.starts_with("switch (Top.st) {\n    case idle:\n"), "{}", text);
        assert!(text.contains("    case busy:\n"), "{}", text);
    }

    #[test]
    fn test_non_constant_item_falls_back_to_if_chain() {
        let text = with_ctx(|ctx| {
            let stmt = s(StmtKind::Case {
                kind: CaseKind::Case,
                selector: next(),
                items: vec![
                    item(vec![int(1)], hit()),
                    item(vec![var(3, VeraType::Integer)], s(StmtKind::Empty)),
                    item(vec![int(7)], hit()),
                ],
                default: Some(Box::new(hit())),
            });
            render(translate_stmt(ctx, &stmt).unwrap())
        });
        // The selector is called once, ahead of every comparison
        assert_eq!(text.matches("Top.next()").count(), 1, "{}", text);
        assert_snapshot!(text, @r"
        final int sel = Top.next();
        if (sel == 1) {
            Top.hits++;
        } else if (sel == Top.limit) {
        } else if (sel == 7) {
            Top.hits++;
        } else {
            Top.hits++;
        }
        ");
    }

    #[test]
    fn test_duplicate_labels_fall_back_to_first_match() {
        let text = with_ctx(|ctx| {
            let stmt = s(StmtKind::Case {
                kind: CaseKind::Case,
                selector: var(1, VeraType::Integer),
                items: vec![item(vec![int(1)], hit()), item(vec![int(1)], s(StmtKind::Break))],
                default: None,
            });
            ctx.push_frame(FrameKind::Loop, false);
            let stmts = translate_stmt(ctx, &stmt).unwrap();
            ctx.pop_frame();
            render(stmts)
        });
        assert!(text.starts_with("final int sel = Top.op;\nif (sel == 1) {"), "{}", text);
        assert!(!text.contains("switch"), "{}", text);
    }

    #[test]
    fn test_casex_on_bit_vector_uses_wildcard_equality() {
        let text = with_ctx(|ctx| {
            let stmt = s(StmtKind::Case {
                kind: CaseKind::CaseX,
                selector: var(4, VeraType::bit(4)),
                items: vec![item(vec![bits("4'b1x0x", 4)], hit())],
                default: None,
            });
            render(translate_stmt(ctx, &stmt).unwrap())
        });
        assert!(
            text.starts_with("final BitVector sel = Top.bus;\nif (sel.equalsWild(new BitVector(\"4'b1x0x\"))) {"),
            "{}",
            text
        );
    }

    #[test]
    fn test_break_in_switch_labels_the_loop() {
        let text = with_ctx(|ctx| {
            let case = s(StmtKind::Case {
                kind: CaseKind::Case,
                selector: var(1, VeraType::Integer),
                items: vec![item(vec![int(0)], s(StmtKind::Break))],
                default: None,
            });
            let stmt = s(StmtKind::While {
                cond: e(VeraExprKind::IntegerLiteral(1), VeraType::Integer),
                body: Box::new(case),
            });
            render(translate_stmt(ctx, &stmt).unwrap())
        });
        assert!(text.starts_with("loop1: while ("), "{}", text);
        assert!(text.contains("break loop1;"), "{}", text);
    }

    #[test]
    fn test_randcase_switches_on_weighted_index() {
        let text = with_ctx(|ctx| {
            let stmt = s(StmtKind::RandCase(vec![
                RandCaseItem {
                    weight: int(3),
                    body: hit(),
                },
                RandCaseItem {
                    weight: var(3, VeraType::Integer),
                    body: s(StmtKind::Empty),
                },
            ]));
            render(translate_stmt(ctx, &stmt).unwrap())
        });
        assert_snapshot!(text, @r"
        {
            final int[] weights = new int[] { 3, Top.limit };
            switch (Juno.randomIndex(weights)) {
                case 0:
                    Top.hits++;
                    break;
                case 1:
            }
        }
        ");
    }
}
