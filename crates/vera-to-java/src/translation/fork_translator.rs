// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! `fork`/`join`
//!
//! Each branch runs as a lambda handed to `Juno.fork`. Shadow locals the fork captures
//! are copied once into final snapshots before any branch starts; a branch that writes
//! one gets its own alias initialised from the snapshot, so branches never see each
//! other's writes and the forking thread keeps its value.

use super::statement_translator::translate_stmt;
use crate::context::TranslationContext;
use crate::error::Result;
use crate::expression_converter::copy_juno_string;
use crate::var_info::{VarAccess, VarInfo};
use java_schema::runtime::{JUNO, JUNO_THREAD};
use java_schema::{Block, Expr, JavaType, Stmt};
use log::{debug, trace};
use vera_model::{JoinKind, Loc, NodeId, Stmt as VeraStmt, VarId};

struct Snapshot {
    var: VarId,
    name: String,
    info: VarInfo,
}

fn thread_type() -> JavaType {
    JavaType::Class(JUNO_THREAD.to_string())
}

/// Copy of a value that does not alias it
fn detached(value: Expr) -> Expr {
    match value.ty {
        JavaType::JunoString => copy_juno_string(value),
        _ => value,
    }
}

pub fn translate_fork(
    ctx: &mut TranslationContext<'_, '_>,
    id: NodeId,
    branches: &[VeraStmt],
    join: JoinKind,
    loc: Loc,
) -> Result<Vec<Stmt>> {
    debug!("fork at {}: {} branches, join {:?}", loc, branches.len(), join);
    let mut stmts = vec![];
    let snapshots = take_snapshots(ctx, id, &mut stmts);

    let mut runnables = vec![];
    for branch in branches {
        let body = translate_branch(ctx, branch, &snapshots)?;
        let mut runnable = Expr::lambda(body);
        if ctx.session.facts.needs_thread_context(id) {
            let ty = runnable.ty.clone();
            runnable = Expr::static_call(JUNO, "inheritContext", vec![runnable], ty);
        }
        runnables.push(runnable);
    }

    let spawn = |runnable| Expr::static_call(JUNO, "fork", vec![runnable], thread_type());
    let wait = match join {
        JoinKind::None => {
            stmts.extend(runnables.into_iter().map(|r| Stmt::expr(spawn(r))));
            return Ok(stmts);
        }
        JoinKind::All => "joinAll",
        JoinKind::Any => "joinAny",
    };
    let mut threads = vec![];
    for runnable in runnables {
        let (decl, thread) = ctx.declare_temp("thread", spawn(runnable));
        stmts.push(decl);
        threads.push(thread);
    }
    stmts.push(Stmt::expr(Expr::static_call(
        JUNO,
        wait,
        vec![Expr::array_init(thread_type(), threads)],
        JavaType::Void,
    )));
    Ok(stmts)
}

/// `final T name_snapshot = name;` for every shadow local the fork captures
fn take_snapshots(ctx: &mut TranslationContext<'_, '_>, id: NodeId, stmts: &mut Vec<Stmt>) -> Vec<Snapshot> {
    let mut snapshots = vec![];
    for var in ctx.session.facts.captured_locals(id) {
        let Some(info) = ctx.vars.get(&var).cloned() else {
            continue;
        };
        // Holders are shared with the branches on purpose
        let (VarAccess::Local(local) | VarAccess::Remapped(local)) = &info.access else {
            continue;
        };
        trace!("fork snapshot of {}", local);
        let name = ctx.names.fresh(&format!("{}_snapshot", local));
        stmts.push(Stmt::final_local(info.ty.clone(), name.clone(), detached(info.reference())));
        snapshots.push(Snapshot { var, name, info });
    }
    snapshots
}

fn translate_branch(
    ctx: &mut TranslationContext<'_, '_>,
    branch: &VeraStmt,
    snapshots: &[Snapshot],
) -> Result<Block> {
    // Jumps cannot leave the thread, and `return` ends only the branch
    let frames = ctx.take_frames();
    let return_type = std::mem::replace(&mut ctx.return_type, JavaType::Void);
    let result = ctx.scoped(|ctx| {
        let mut stmts = vec![];
        for snapshot in snapshots {
            let reference = Expr::local(snapshot.name.clone(), snapshot.info.ty.clone());
            let binding = if ctx.session.facts.is_written_in(snapshot.var, branch.id) {
                let name = ctx.names.fresh(snapshot.info.local_name().unwrap_or("alias"));
                stmts.push(Stmt::local(snapshot.info.ty.clone(), name.clone(), Some(detached(reference))));
                VarInfo::remapped(name, snapshot.info.ty.clone())
            } else {
                VarInfo::remapped(snapshot.name.clone(), snapshot.info.ty.clone())
            };
            ctx.bind(snapshot.var, binding.with_event(snapshot.info.event.clone()));
        }
        stmts.extend(translate_stmt(ctx, branch)?);
        Ok(Block::new(stmts))
    });
    ctx.return_type = return_type;
    ctx.restore_frames(frames);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::TranslatorOptions;
    use crate::session::TranslationSession;
    use insta::assert_snapshot;
    use java_schema::render_stmts_to_string;
    use vera_model::{
        AnalysisResults, CompilationUnit, Expr as VeraExpr, ExprKind, IncDecOp, StmtKind, VarDecl, VeraType,
    };

    const FORK: NodeId = NodeId(50);

    fn e(kind: ExprKind, ty: VeraType) -> VeraExpr {
        VeraExpr::new(NodeId(0), kind, ty)
    }

    fn counter() -> VeraExpr {
        e(ExprKind::Var(VarId(20)), VeraType::Integer)
    }

    fn bump(id: u32) -> VeraStmt {
        VeraStmt::new(
            NodeId(id),
            StmtKind::Expr(e(
                ExprKind::IncDec {
                    op: IncDecOp::PostIncrement,
                    target: Box::new(counter()),
                },
                VeraType::Integer,
            )),
        )
    }

    /// `total = i;` reads the counter without writing it
    fn publish(id: u32) -> VeraStmt {
        VeraStmt::new(
            NodeId(id),
            StmtKind::Expr(e(
                ExprKind::Assign {
                    target: Box::new(e(ExprKind::Var(VarId(1)), VeraType::Integer)),
                    value: Box::new(counter()),
                },
                VeraType::Integer,
            )),
        )
    }

    fn counter_decl() -> VarDecl {
        VarDecl::new(VarId(20), "i", VeraType::Integer).shadow()
    }

    fn unit() -> CompilationUnit {
        CompilationUnit {
            name: "top".into(),
            globals: vec![VarDecl::new(VarId(1), "total", VeraType::Integer)],
            program: Some(vera_model::Block::new(vec![VeraStmt::new(
                NodeId(0),
                StmtKind::VarDecl(counter_decl()),
            )])),
            ..Default::default()
        }
    }

    fn facts() -> AnalysisResults {
        let mut facts = AnalysisResults::new();
        facts.mark_not_assigned_xz(VarId(1)).mark_not_assigned_xz(VarId(20));
        facts.add_capture(FORK, vec![VarId(20)]);
        facts.add_write(VarId(20), NodeId(51)).add_write(VarId(20), NodeId(52));
        facts
    }

    fn translate(facts: &AnalysisResults, branches: Vec<VeraStmt>, join: JoinKind) -> String {
        let unit = unit();
        let mut session = TranslationSession::new(&unit, facts, TranslatorOptions::default());
        let mut ctx = TranslationContext::new(&mut session, None, true);
        let decl = VeraStmt::new(NodeId(0), StmtKind::VarDecl(counter_decl()));
        let fork = VeraStmt::new(FORK, StmtKind::Fork { branches, join });
        let mut stmts = translate_stmt(&mut ctx, &decl).unwrap();
        stmts.extend(translate_stmt(&mut ctx, &fork).unwrap());
        stmts.extend(translate_stmt(&mut ctx, &publish(60)).unwrap());
        render_stmts_to_string(&Block::new(stmts))
    }

    #[test]
    fn test_writing_branches_get_private_copies() {
        let text = translate(&facts(), vec![bump(51), bump(52)], JoinKind::All);
        assert_snapshot!(text, @r"
        int i = 0;
        final int i_snapshot = i;
        final JunoThread thread = Juno.fork(() -> {
            int i_1 = i_snapshot;
            i_1++;
        });
        final JunoThread thread_1 = Juno.fork(() -> {
            int i_1 = i_snapshot;
            i_1++;
        });
        Juno.joinAll(new JunoThread[] { thread, thread_1 });
        Top.total = i;
        ");
    }

    #[test]
    fn test_reading_branch_uses_snapshot() {
        let text = translate(&facts(), vec![publish(53)], JoinKind::None);
        assert!(text.contains("Juno.fork(() -> {\n    Top.total = i_snapshot;\n});"), "{}", text);
        assert!(!text.contains("thread"), "{}", text);
    }

    #[test]
    fn test_thread_context_wraps_branches() {
        let mut facts = facts();
        facts.thread_context_blocks.insert(FORK);
        let text = translate(&facts, vec![bump(51)], JoinKind::Any);
        assert!(text.contains("Juno.fork(Juno.inheritContext(() -> {"), "{}", text);
        assert!(text.contains("Juno.joinAny(new JunoThread[] { thread });"), "{}", text);
    }

    #[test]
    fn test_branches_cannot_break_out() {
        let unit = unit();
        let facts = facts();
        let mut session = TranslationSession::new(&unit, &facts, TranslatorOptions::default());
        let mut ctx = TranslationContext::new(&mut session, None, true);
        ctx.push_frame(crate::context::FrameKind::Loop, false);
        let fork = VeraStmt::new(
            FORK,
            StmtKind::Fork {
                branches: vec![VeraStmt::new(NodeId(51), StmtKind::Break)],
                join: JoinKind::All,
            },
        );
        assert!(translate_stmt(&mut ctx, &fork).is_err());
        // The enclosing loop is still there afterwards
        assert!(ctx.break_stmt(Loc::default()).is_ok());
    }
}
