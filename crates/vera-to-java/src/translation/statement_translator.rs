// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Statement translation from Vera statements to Java statements
//!
//! One source statement becomes a list of Java statements: the statements hoisted out
//! of its expressions followed by the statement itself. Loops whose guard needs hoisted
//! statements are rewritten to `while (true)` with the guard at the top of the body (or
//! the bottom, for `do`/`while`), so the guard's statements run on every iteration.

use super::assignment_translator::store_conversion;
use super::expression_translator::{self, translate_as, translate_condition, translate_value, translate_value_with, Expected};
use super::utilities::initial_value;
use super::{fork_translator, switch_translator};
use crate::context::{Frame, FrameKind, TranslationContext};
use crate::converted_expression::ConvertedExpression;
use crate::error::{Result, TranslationError, WarningKind};
use crate::lhs::{translate_lhs, Access};
use crate::var_info::VarInfo;
use java_schema::runtime::JUNO;
use java_schema::{BinaryOp, Block, Expr, JavaType, Stmt, UnaryOp};
use log::debug;
use vera_model::{
    DriveStmt, Edge, Expr as VeraExpr, ExprKind as VeraExprKind, Loc, Stmt as VeraStmt, StmtKind, SyncTerm,
    VarDecl,
};

/// Translate statements in the current scope
pub fn translate_stmts(ctx: &mut TranslationContext<'_, '_>, stmts: &[VeraStmt]) -> Result<Vec<Stmt>> {
    let mut result = vec![];
    for stmt in stmts {
        result.extend(translate_stmt(ctx, stmt)?);
    }
    Ok(result)
}

/// Translate a nested statement (a branch or loop body) in its own scope
pub fn translate_body(ctx: &mut TranslationContext<'_, '_>, stmt: &VeraStmt) -> Result<Stmt> {
    ctx.scoped(|ctx| Ok(Stmt::from_stmts(translate_stmt(ctx, stmt)?)))
}

pub fn translate_stmt(ctx: &mut TranslationContext<'_, '_>, stmt: &VeraStmt) -> Result<Vec<Stmt>> {
    translate_kind(ctx, stmt).map_err(|e| e.or_loc(stmt.loc))
}

fn translate_kind(ctx: &mut TranslationContext<'_, '_>, stmt: &VeraStmt) -> Result<Vec<Stmt>> {
    let loc = stmt.loc;
    match &stmt.kind {
        StmtKind::Block(block) => {
            let stmts = ctx.scoped(|ctx| translate_stmts(ctx, &block.stmts))?;
            Ok(vec![Stmt::Block(Block::new(stmts))])
        }
        StmtKind::VarDecl(decl) => translate_var_decl(ctx, decl),
        StmtKind::Expr(expr) => Ok(expression_translator::translate(ctx, expr)?.flatten()),
        StmtKind::If {
            cond,
            then_stmt,
            else_stmt,
        } => {
            let (mut stmts, test) = condition(ctx, cond)?;
            let then_stmt = translate_body(ctx, then_stmt)?;
            stmts.push(match else_stmt {
                Some(else_stmt) => Stmt::if_else(test, then_stmt, translate_body(ctx, else_stmt)?),
                None => Stmt::if_then(test, then_stmt),
            });
            Ok(stmts)
        }
        StmtKind::While { cond, body } => translate_while(ctx, cond, body, loc),
        StmtKind::DoWhile { body, cond } => translate_do_while(ctx, body, cond, loc),
        StmtKind::For {
            init,
            cond,
            update,
            body,
        } => translate_for(ctx, init, cond.as_ref(), update, body, loc),
        StmtKind::Repeat { count, body } => translate_repeat(ctx, count, body),
        StmtKind::Case {
            kind,
            selector,
            items,
            default,
        } => switch_translator::translate_case(ctx, *kind, selector, items, default.as_deref(), loc),
        StmtKind::RandCase(items) => switch_translator::translate_randcase(ctx, items, loc),
        StmtKind::Break => Ok(vec![ctx.break_stmt(loc)?]),
        StmtKind::Continue => Ok(vec![ctx.continue_stmt(loc)?]),
        StmtKind::Return(value) => translate_return(ctx, value.as_ref(), loc),
        StmtKind::Fork { branches, join } => fork_translator::translate_fork(ctx, stmt.id, branches, *join, loc),
        StmtKind::Terminate => Ok(vec![Stmt::expr(Expr::static_call(
            JUNO,
            "terminate",
            vec![],
            JavaType::Void,
        ))]),
        StmtKind::Sync(terms) => translate_sync(ctx, terms, loc),
        StmtKind::Delay { cycles, clock } => {
            let mut conv = ConvertedExpression::empty();
            let mut args = vec![translate_as(ctx, cycles, &JavaType::Int, &mut conv)?];
            if let Some(clock) = clock {
                args.push(translate_value(ctx, clock, &mut conv)?);
            }
            conv.add_init(Stmt::expr(Expr::static_call(JUNO, "delay", args, JavaType::Void)));
            Ok(conv.flatten())
        }
        StmtKind::Drive(drive) => translate_drive(ctx, drive, loc),
        StmtKind::Expect(_) => Err(TranslationError::unsupported("expect", loc)),
        StmtKind::Empty => Ok(vec![]),
    }
}

// ============================================================================
// Helpers shared with the other statement translators

/// Split a translated expression into the statements computing it and a value that
/// can be used afterwards. Update statements have to run before the value is used, so
/// the value is captured first when there are any.
pub(crate) fn settle(ctx: &mut TranslationContext<'_, '_>, conv: ConvertedExpression, base: &str) -> (Vec<Stmt>, Expr) {
    let (mut stmts, value, update) = conv.into_parts();
    let Some(value) = value else {
        panic!("BUG: settling an expression without a value");
    };
    if update.is_empty() {
        return (stmts, value);
    }
    let value = ctx.capture(base, value, &mut stmts);
    stmts.extend(update);
    (stmts, value)
}

/// Statements computing a condition, and the boolean to test
pub(crate) fn condition(ctx: &mut TranslationContext<'_, '_>, cond: &VeraExpr) -> Result<(Vec<Stmt>, Expr)> {
    let mut conv = ConvertedExpression::empty();
    let test = translate_condition(ctx, cond, &mut conv)?;
    conv.set_value(test);
    Ok(settle(ctx, conv, "cond"))
}

/// `if (!test) break;`
fn exit_unless(test: Expr) -> Stmt {
    Stmt::if_then(test.not(), Stmt::Break(None))
}

/// Give the loop body the label `continue` jumps out of, when a jump used it
fn continue_target(frame: &Frame, body: Stmt) -> Stmt {
    match &frame.continue_label {
        Some(label) => Stmt::Labeled {
            label: label.clone(),
            body: Box::new(Stmt::Block(body.into_block())),
        },
        None => body,
    }
}

/// Label the loop itself when a `break` had to cross a switch to reach it
fn labeled(frame: &Frame, stmt: Stmt) -> Stmt {
    match &frame.label {
        Some(label) => Stmt::Labeled {
            label: label.clone(),
            body: Box::new(stmt),
        },
        None => stmt,
    }
}

fn loop_body(ctx: &mut TranslationContext<'_, '_>, body: &VeraStmt, rewritten: bool) -> Result<(Frame, Stmt)> {
    ctx.push_frame(FrameKind::Loop, rewritten);
    let body = translate_body(ctx, body);
    let frame = ctx.pop_frame();
    Ok((frame, body?))
}

fn forever(stmts: Vec<Stmt>) -> Stmt {
    Stmt::While {
        cond: Expr::bool(true),
        body: Box::new(Stmt::Block(Block::new(stmts))),
    }
}

// ============================================================================
// Loops

fn translate_while(ctx: &mut TranslationContext<'_, '_>, cond: &VeraExpr, body: &VeraStmt, loc: Loc) -> Result<Vec<Stmt>> {
    ctx.scoped(|ctx| {
        let (guard, test) = condition(ctx, cond)?;
        let rewritten = !guard.is_empty();
        if rewritten {
            debug!("while at {}: guard needs statements, rewriting to while (true)", loc);
        }
        let (frame, body) = loop_body(ctx, body, rewritten)?;
        let stmt = if rewritten {
            let mut stmts = guard;
            stmts.push(exit_unless(test));
            stmts.push(continue_target(&frame, body));
            forever(stmts)
        } else {
            Stmt::While {
                cond: test,
                body: Box::new(body),
            }
        };
        Ok(vec![labeled(&frame, stmt)])
    })
}

fn translate_do_while(
    ctx: &mut TranslationContext<'_, '_>,
    body: &VeraStmt,
    cond: &VeraExpr,
    loc: Loc,
) -> Result<Vec<Stmt>> {
    ctx.scoped(|ctx| {
        let (guard, test) = condition(ctx, cond)?;
        let rewritten = !guard.is_empty();
        if rewritten {
            debug!("do-while at {}: guard needs statements, rewriting to while (true)", loc);
        }
        let (frame, body) = loop_body(ctx, body, rewritten)?;
        let stmt = if rewritten {
            let mut stmts = vec![continue_target(&frame, body)];
            stmts.extend(guard);
            stmts.push(exit_unless(test));
            forever(stmts)
        } else {
            Stmt::DoWhile {
                body: Box::new(body),
                cond: test,
            }
        };
        Ok(vec![labeled(&frame, stmt)])
    })
}

/// Expressions usable directly in a `for` header; the translations are handed back
/// when one of them needs statements
fn header_exprs(convs: Vec<ConvertedExpression>) -> std::result::Result<Vec<Expr>, Vec<ConvertedExpression>> {
    let native = convs.iter().all(|c| {
        !c.has_statements() && c.value().map_or(true, |v| v.is_statement_expression() || !v.has_side_effects())
    });
    if !native {
        return Err(convs);
    }
    Ok(convs
        .into_iter()
        .filter_map(|mut c| c.take_value())
        .filter(|v| v.is_statement_expression())
        .collect())
}

fn translate_for(
    ctx: &mut TranslationContext<'_, '_>,
    init: &[VeraExpr],
    cond: Option<&VeraExpr>,
    update: &[VeraExpr],
    body: &VeraStmt,
    loc: Loc,
) -> Result<Vec<Stmt>> {
    ctx.scoped(|ctx| {
        let init = init
            .iter()
            .map(|e| expression_translator::translate(ctx, e))
            .collect::<Result<Vec<_>>>()?;
        let (guard, test) = match cond {
            Some(cond) => {
                let (guard, test) = condition(ctx, cond)?;
                (guard, Some(test))
            }
            None => (vec![], None),
        };
        let updates = update
            .iter()
            .map(|e| expression_translator::translate(ctx, e))
            .collect::<Result<Vec<_>>>()?;
        let updates = match (guard.is_empty(), header_exprs(updates)) {
            (true, Ok(exprs)) => Ok(exprs),
            (_, Ok(exprs)) => Err(exprs.into_iter().map(Stmt::expr).collect::<Vec<_>>()),
            (_, Err(convs)) => Err(convs.into_iter().flat_map(|c| c.flatten()).collect()),
        };
        let rewritten = updates.is_err();
        if rewritten {
            debug!("for at {}: header needs statements, rewriting to while (true)", loc);
        }

        let mut stmts = vec![];
        let init = match header_exprs(init) {
            Ok(exprs) if !rewritten => exprs,
            Ok(exprs) => {
                stmts.extend(exprs.into_iter().map(Stmt::expr));
                vec![]
            }
            Err(convs) => {
                stmts.extend(convs.into_iter().flat_map(|c| c.flatten()));
                vec![]
            }
        };
        let (frame, body) = loop_body(ctx, body, rewritten)?;
        let stmt = match updates {
            Ok(update) => Stmt::For {
                init,
                cond: test,
                update,
                body: Box::new(body),
            },
            Err(update) => {
                let mut inner = guard;
                if let Some(test) = test {
                    inner.push(exit_unless(test));
                }
                inner.push(continue_target(&frame, body));
                inner.extend(update);
                forever(inner)
            }
        };
        stmts.push(labeled(&frame, stmt));
        // Statements hoisted out of the header get their own block to keep their temporaries local
        Ok(if stmts.len() == 1 { stmts } else { vec![Stmt::Block(Block::new(stmts))] })
    })
}

/// `repeat (n)` counts a private copy of `n` down to zero
fn translate_repeat(ctx: &mut TranslationContext<'_, '_>, count: &VeraExpr, body: &VeraStmt) -> Result<Vec<Stmt>> {
    ctx.scoped(|ctx| {
        let mut conv = ConvertedExpression::empty();
        let value = translate_as(ctx, count, &JavaType::Int, &mut conv)?;
        conv.set_value(value);
        let (mut stmts, value) = settle(ctx, conv, "n");
        let (decl, counter) = ctx.declare_var("count", JavaType::Int, Some(value));
        stmts.push(decl);
        let test = Expr::binary(
            BinaryOp::Gt,
            Expr::unary(UnaryOp::PostDec, counter),
            Expr::int(0),
            JavaType::Boolean,
        );
        let (frame, body) = loop_body(ctx, body, false)?;
        stmts.push(labeled(
            &frame,
            Stmt::While {
                cond: test,
                body: Box::new(body),
            },
        ));
        Ok(vec![Stmt::Block(Block::new(stmts))])
    })
}

// ============================================================================
// Declarations and returns

pub fn translate_var_decl(ctx: &mut TranslationContext<'_, '_>, decl: &VarDecl) -> Result<Vec<Stmt>> {
    if decl.is_static {
        return Err(TranslationError::unsupported("static local variable", decl.loc));
    }
    let ty = ctx.session.var_type(decl.id);
    let mut conv = ConvertedExpression::empty();
    let value = match &decl.init {
        Some(init) => {
            let value = translate_value_with(ctx, init, &Expected::of(&ty), &mut conv)?;
            store_conversion(ctx, value, &ty, init.ty.is_signed(), init.loc)?
        }
        None => initial_value(&decl.ty, &ty),
    };
    let (mut stmts, _, update) = conv.into_parts();

    let name = ctx.names.fresh(&decl.name);
    let event = if ctx.session.facts.is_wait_var(decl.id) {
        let event_name = ctx.names.fresh(&format!("{}_event", decl.name));
        stmts.push(Stmt::final_local(
            JavaType::Event,
            event_name.clone(),
            Expr::new_object(JavaType::Event, vec![]),
        ));
        Some(Expr::local(event_name, JavaType::Event))
    } else {
        None
    };
    if ctx.session.needs_holder(decl.id) {
        let holder = Expr::array_init(ty.clone(), vec![value]);
        stmts.push(Stmt::final_local(JavaType::array_of(ty.clone()), name.clone(), holder));
        ctx.bind(decl.id, VarInfo::holder(name, ty).with_event(event));
    } else {
        let is_final = ctx.session.options.mark_final && !ctx.session.facts.is_write_access(decl.id);
        if is_final {
            ctx.session.warn(
                WarningKind::MarkedFinal,
                format!("local `{}` is never reassigned and was declared final", decl.name),
                decl.loc,
            );
        }
        stmts.push(Stmt::LocalVar {
            ty: ty.clone(),
            name: name.clone(),
            init: Some(value),
            is_final,
        });
        ctx.bind(decl.id, VarInfo::local(name, ty).with_event(event));
    }
    stmts.extend(update);
    Ok(stmts)
}

fn translate_return(ctx: &mut TranslationContext<'_, '_>, value: Option<&VeraExpr>, loc: Loc) -> Result<Vec<Stmt>> {
    let Some(value) = value else {
        return Ok(vec![Stmt::Return(None)]);
    };
    let ty = ctx.return_type.clone();
    if ty.is_void() {
        return Err(TranslationError::unsupported("return with a value from a task", loc));
    }
    let mut conv = ConvertedExpression::empty();
    let result = translate_as(ctx, value, &ty, &mut conv)?;
    conv.set_value(result);
    let (mut stmts, result) = settle(ctx, conv, "ret");
    stmts.push(Stmt::Return(Some(result)));
    Ok(stmts)
}

// ============================================================================
// Signals

/// Event fired by `term`'s edge of its signal
fn edge_event(ctx: &mut TranslationContext<'_, '_>, term: &SyncTerm, conv: &mut ConvertedExpression) -> Result<Expr> {
    let signal = translate_value(ctx, &term.signal, conv)?;
    if !matches!(signal.ty, JavaType::Signal { .. }) {
        return Err(TranslationError::unsupported(
            format!("sync on {}", signal.ty),
            term.signal.loc,
        ));
    }
    let method = match term.edge {
        Edge::Posedge => "posedge",
        Edge::Negedge => "negedge",
        Edge::AnyEdge => "anyedge",
        Edge::Sample => "sampled",
    };
    Ok(Expr::call(signal, method, vec![], JavaType::Event))
}

fn translate_sync(ctx: &mut TranslationContext<'_, '_>, terms: &[SyncTerm], loc: Loc) -> Result<Vec<Stmt>> {
    let mut conv = ConvertedExpression::empty();
    let mut events = vec![];
    for term in terms {
        events.push(edge_event(ctx, term, &mut conv)?);
    }
    let wait = match events.len() {
        0 => return Err(TranslationError::unsupported("sync without a signal", loc)),
        1 => Expr::static_call(JUNO, "waitFor", events, JavaType::Void),
        _ => Expr::static_call(
            JUNO,
            "waitForAny",
            vec![Expr::array_init(JavaType::Event, events)],
            JavaType::Void,
        ),
    };
    conv.add_init(Stmt::expr(wait));
    Ok(conv.flatten())
}

/// Signal drives. The method name spells out the variant: `drive`, then `Range` for a
/// bit range, `Async`, `Soft` and `NB` (non-blocking) as they apply. Driving `void`
/// releases the signal.
fn translate_drive(ctx: &mut TranslationContext<'_, '_>, drive: &DriveStmt, loc: Loc) -> Result<Vec<Stmt>> {
    let mut conv = ConvertedExpression::empty();
    let lhs = translate_lhs(ctx, &drive.target, Access::WRITE, &mut conv)?;
    let Some((signal, range)) = lhs.signal_target() else {
        return Err(TranslationError::unsupported("drive of a target that is not a signal", loc));
    };
    let mut args = vec![];
    if let Some((high, low)) = &range {
        args.push(high.clone());
        args.push(low.clone());
    }
    let method = if matches!(drive.value.kind, VeraExprKind::VoidLiteral) {
        if range.is_some() { "releaseRange" } else { "release" }.to_string()
    } else {
        args.push(translate_as(ctx, &drive.value, &lhs.result_type(), &mut conv)?);
        let mut method = String::from("drive");
        for (applies, part) in [
            (range.is_some(), "Range"),
            (drive.is_async, "Async"),
            (drive.soft, "Soft"),
            (drive.non_blocking, "NB"),
        ] {
            if applies {
                method.push_str(part);
            }
        }
        method
    };
    if let Some(delay) = &drive.delay {
        args.push(translate_as(ctx, delay, &JavaType::Int, &mut conv)?);
    }
    conv.add_init(Stmt::expr(Expr::call(signal, method, args, JavaType::Void)));
    Ok(conv.flatten())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::TranslatorOptions;
    use crate::session::TranslationSession;
    use insta::assert_snapshot;
    use java_schema::render_stmts_to_string;
    use vera_model::{
        AnalysisResults, BinaryOp as VeraBinaryOp, BitLiteral, CompilationUnit, IncDecOp, NodeId, SignalDirection,
        VarId, VeraType,
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

    fn less(lhs: VeraExpr, rhs: VeraExpr) -> VeraExpr {
        e(
            VeraExprKind::Binary {
                op: VeraBinaryOp::Less,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            VeraType::bit(1),
        )
    }

    fn bus_type() -> VeraType {
        VeraType::Signal {
            width: 4,
            direction: SignalDirection::Output,
        }
    }

    fn unit() -> CompilationUnit {
        CompilationUnit {
            name: "top".into(),
            globals: vec![
                VarDecl::new(VarId(1), "i", VeraType::Integer),
                VarDecl::new(VarId(2), "w", VeraType::Integer),
                VarDecl::new(VarId(3), "bus", bus_type()),
            ],
            program: Some(vera_model::Block::new(vec![s(StmtKind::VarDecl(VarDecl::new(
                VarId(20),
                "acc",
                VeraType::bit(8),
            )))])),
            ..Default::default()
        }
    }

    fn facts() -> AnalysisResults {
        let mut facts = AnalysisResults::new();
        facts.mark_not_assigned_xz(VarId(1)).mark_not_assigned_xz(VarId(2));
        facts.mark_wait_var(VarId(2));
        facts
    }

    fn render(stmts: Vec<Stmt>) -> String {
        render_stmts_to_string(&Block::new(stmts))
    }

    fn with_ctx<T>(f: impl FnOnce(&mut TranslationContext<'_, '_>) -> T) -> T {
        let unit = unit();
        let facts = facts();
        let mut session = TranslationSession::new(&unit, &facts, TranslatorOptions::default());
        let mut ctx = TranslationContext::new(&mut session, None, true);
        f(&mut ctx)
    }

    #[test]
    fn test_while_with_plain_guard_stays_native() {
        let text = with_ctx(|ctx| {
            let body = s(StmtKind::Expr(e(
                VeraExprKind::IncDec {
                    op: IncDecOp::PostIncrement,
                    target: Box::new(var(1, VeraType::Integer)),
                },
                VeraType::Integer,
            )));
            let stmt = s(StmtKind::While {
                cond: less(var(1, VeraType::Integer), int(10)),
                body: Box::new(body),
            });
            render(translate_stmt(ctx, &stmt).unwrap())
        });
        assert_snapshot!(text, @r"
        while (Top.i < 10) {
            Top.i++;
        }
        ");
    }

    #[test]
    fn test_guard_with_statements_is_evaluated_every_iteration() {
        let text = with_ctx(|ctx| {
            // `w` notifies waiters, so `w++` needs statements around the store
            let bump = e(
                VeraExprKind::IncDec {
                    op: IncDecOp::PostIncrement,
                    target: Box::new(var(2, VeraType::Integer)),
                },
                VeraType::Integer,
            );
            let stmt = s(StmtKind::While {
                cond: less(bump, int(5)),
                body: Box::new(s(StmtKind::Continue)),
            });
            render(translate_stmt(ctx, &stmt).unwrap())
        });
        assert!(text.starts_with("while (true) {\n    final int old = Top.w;\n"), "{}", text);
        assert!(text.contains("Top.w_event.trigger();"), "{}", text);
        assert!(text.contains("        break;\n"), "{}", text);
        // `continue` leaves the labelled body so the guard runs again
        assert!(text.contains("next1: {\n        break next1;\n    }"), "{}", text);
    }

    #[test]
    fn test_repeat_counts_down_a_copy() {
        let text = with_ctx(|ctx| {
            let stmt = s(StmtKind::Repeat {
                count: var(1, VeraType::Integer),
                body: Box::new(s(StmtKind::Break)),
            });
            render(translate_stmt(ctx, &stmt).unwrap())
        });
        assert_snapshot!(text, @r"
        {
            int count = Top.i;
            while (count-- > 0) {
                break;
            }
        }
        ");
    }

    #[test]
    fn test_drive_and_release() {
        let text = with_ctx(|ctx| {
            let value = e(
                VeraExprKind::BitLiteral(BitLiteral::parse("4'b1010").unwrap()),
                VeraType::bit(4),
            );
            let drive = DriveStmt {
                target: var(3, bus_type()),
                value,
                delay: None,
                is_async: false,
                soft: true,
                non_blocking: false,
            };
            let release = DriveStmt {
                value: e(VeraExprKind::VoidLiteral, VeraType::Void),
                soft: false,
                ..drive.clone()
            };
            let mut stmts = translate_stmt(ctx, &s(StmtKind::Drive(drive))).unwrap();
            stmts.extend(translate_stmt(ctx, &s(StmtKind::Drive(release))).unwrap());
            render(stmts)
        });
        assert_snapshot!(text, @r"
        Top.bus.driveSoft(new BitVector(4, 10));
        Top.bus.release();
        ");
    }

    #[test]
    fn test_sync_on_several_edges_waits_for_any() {
        let text = with_ctx(|ctx| {
            let stmt = s(StmtKind::Sync(vec![
                SyncTerm {
                    signal: var(3, bus_type()),
                    edge: Edge::Posedge,
                },
                SyncTerm {
                    signal: var(3, bus_type()),
                    edge: Edge::Negedge,
                },
            ]));
            render(translate_stmt(ctx, &stmt).unwrap())
        });
        assert_snapshot!(text, @"Juno.waitForAny(new JunoEvent[] { Top.bus.posedge(), Top.bus.negedge() });");
    }

    #[test]
    fn test_local_declaration_binds_variable() {
        let text = with_ctx(|ctx| {
            // Declared in the unit's program so the symbol table knows it
            let decl = VarDecl::new(VarId(20), "acc", VeraType::bit(8));
            let use_it = s(StmtKind::Expr(e(
                VeraExprKind::Assign {
                    target: Box::new(var(20, VeraType::bit(8))),
                    value: Box::new(var(20, VeraType::bit(8))),
                },
                VeraType::bit(8),
            )));
            let block = s(StmtKind::Block(vera_model::Block::new(vec![s(StmtKind::VarDecl(decl)), use_it])));
            render(translate_stmt(ctx, &block).unwrap())
        });
        assert_snapshot!(text, @r"
        {
            BitVector acc = BitVector.allX(8);
            acc = acc;
        }
        ");
    }

    #[test]
    fn test_expect_is_unsupported() {
        let err = with_ctx(|ctx| translate_stmt(ctx, &s(StmtKind::Expect(int(1)))).unwrap_err());
        assert!(matches!(err, TranslationError::Unsupported { .. }));
    }
}
