// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Functions, tasks and the `program` block as Java methods
//!
//! Parameters are bound before the body is translated: `var` parameters arrive as
//! holder arrays, by-value parameters that closures or callees write are copied into a
//! holder of their own, and `wait_var` parameters get a companion event. A function
//! whose body can fall off the end returns the default value of its type.

use super::statement_translator::translate_stmts;
use super::utilities::default_value;
use crate::context::TranslationContext;
use crate::error::{Result, WarningKind};
use crate::session::TranslationSession;
use crate::var_info::VarInfo;
use java_schema::{Block, Expr, JavaType, MethodDecl, Modifiers, Param, Stmt, Visibility as JavaVisibility};
use log::debug;
use vera_model::{Block as VeraBlock, FunctionDecl, FunctionKind, Loc, Visibility};

/// Java visibility of a member. `local` becomes `private` when so configured, which
/// hides the member from subclasses; that narrowing is reported.
pub fn member_visibility(
    session: &mut TranslationSession<'_>,
    visibility: Visibility,
    member: &str,
    loc: Loc,
) -> JavaVisibility {
    match visibility {
        Visibility::Public => JavaVisibility::Public,
        Visibility::Protected => JavaVisibility::Protected,
        Visibility::Local if session.options.local_as_private => {
            session.warn(
                WarningKind::VisibilityNarrowed,
                format!("local member `{}` is private in Java and hidden from subclasses", member),
                loc,
            );
            JavaVisibility::Private
        }
        Visibility::Local => JavaVisibility::Package,
    }
}

/// Declare the parameters of `func` and bind them in `ctx`. Returns the Java
/// parameters and the statements that must open the body.
fn bind_params(ctx: &mut TranslationContext<'_, '_>, func: &FunctionDecl) -> (Vec<Param>, Vec<Stmt>) {
    let mut params = vec![];
    let mut prologue = vec![];
    for (index, param) in func.params.iter().enumerate() {
        let id = param.var.id;
        let param_ty = ctx.session.param_type(func.id, index);
        let value_ty = ctx.session.var_type(id);
        let info = if ctx.session.is_holder_param(func.id, index) {
            let name = ctx.names.fresh(&param.var.name);
            params.push(Param::new(param_ty, name.clone()));
            VarInfo::holder(name, value_ty)
        } else if ctx.session.needs_holder(id) {
            let incoming = ctx.names.fresh(&format!("{}_in", param.var.name));
            let name = ctx.names.fresh(&param.var.name);
            let value = Expr::local(incoming.clone(), value_ty.clone());
            params.push(Param::new(param_ty, incoming));
            prologue.push(Stmt::final_local(
                JavaType::array_of(value_ty.clone()),
                name.clone(),
                Expr::array_init(value_ty.clone(), vec![value]),
            ));
            VarInfo::holder(name, value_ty)
        } else {
            let name = ctx.names.fresh(&param.var.name);
            params.push(Param::new(param_ty, name.clone()));
            VarInfo::local(name, value_ty)
        };
        let event = if ctx.session.facts.is_wait_var(id) {
            let name = ctx.names.fresh(&format!("{}_event", param.var.name));
            prologue.push(Stmt::final_local(
                JavaType::Event,
                name.clone(),
                Expr::new_object(JavaType::Event, vec![]),
            ));
            Some(Expr::local(name, JavaType::Event))
        } else {
            None
        };
        ctx.bind(id, info.with_event(event));
    }
    (params, prologue)
}

/// `throw new UnsupportedOperationException("...")` for a declaration without a body
fn stub_body(session: &mut TranslationSession<'_>, func: &FunctionDecl) -> Block {
    session.warn(
        WarningKind::StubGenerated,
        format!("`{}` has no body; generated a stub that throws", func.name),
        func.loc,
    );
    let message = Expr::string(format!("{} is not implemented", func.name));
    let exception = JavaType::Class("UnsupportedOperationException".into());
    Block::new(vec![Stmt::Throw(Expr::new_object(exception, vec![message]))])
}

pub fn translate_function(session: &mut TranslationSession<'_>, func: &FunctionDecl) -> Result<MethodDecl> {
    let kind = match func.kind {
        FunctionKind::Function => "function",
        FunctionKind::Task => "task",
    };
    debug!("translating {} `{}`", kind, func.name);
    let is_static = func.class.is_none() || func.is_static;
    let name = session.method_name(func.id);
    let return_type = if func.is_constructor() {
        JavaType::Void
    } else {
        session.return_type(func.id)
    };
    let visibility = member_visibility(session, func.visibility, &func.name, func.loc);

    let mut ctx = TranslationContext::new(session, func.class, is_static);
    ctx.return_type = return_type.clone();
    let (params, prologue) = bind_params(&mut ctx, func);
    let body = match &func.body {
        Some(block) => {
            let mut body = Block::new(prologue);
            body.extend(translate_stmts(&mut ctx, &block.stmts).map_err(|e| e.or_loc(func.loc))?);
            if !return_type.is_void() && body.can_complete_normally() {
                body.push(Stmt::Return(Some(default_value(&return_type))));
            }
            body
        }
        None => stub_body(ctx.session, func),
    };

    let mut method = match func.class {
        Some(class) if func.is_constructor() => MethodDecl::constructor(ctx.session.class_name(class), params, body),
        _ => MethodDecl::new(name, return_type, params, body),
    };
    method.modifiers = Modifiers {
        visibility,
        is_static,
        ..Modifiers::default()
    };
    Ok(method)
}

/// The `program` block becomes `public static void run()`
pub fn translate_program(session: &mut TranslationSession<'_>, program: &VeraBlock) -> Result<MethodDecl> {
    debug!("translating program block");
    let mut ctx = TranslationContext::new(session, None, true);
    let stmts = translate_stmts(&mut ctx, &program.stmts)?;
    let mut method = MethodDecl::new("run", JavaType::Void, vec![], Block::new(stmts));
    method.modifiers = Modifiers::public().with_static();
    Ok(method)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::TranslatorOptions;
    use insta::assert_snapshot;
    use java_schema::render_stmts_to_string;
    use vera_model::{
        AnalysisResults, BinaryOp, ClassDecl, ClassId, CompilationUnit, Expr as VeraExpr, ExprKind, FuncId, NodeId,
        ParamDecl, Stmt as VeraStmt, StmtKind, VarDecl, VarId, VeraType,
    };

    fn e(kind: ExprKind, ty: VeraType) -> VeraExpr {
        VeraExpr::new(NodeId(0), kind, ty)
    }

    fn var(id: u32) -> VeraExpr {
        e(ExprKind::Var(VarId(id)), VeraType::Integer)
    }

    fn s(kind: StmtKind) -> VeraStmt {
        VeraStmt::new(NodeId(0), kind)
    }

    /// `acc = acc + step;`
    fn accumulate() -> VeraStmt {
        let sum = e(
            ExprKind::Binary {
                op: BinaryOp::Add,
                lhs: Box::new(var(10)),
                rhs: Box::new(var(11)),
            },
            VeraType::Integer,
        );
        s(StmtKind::Expr(e(
            ExprKind::Assign {
                target: Box::new(var(10)),
                value: Box::new(sum),
            },
            VeraType::Integer,
        )))
    }

    fn unit() -> CompilationUnit {
        let params = vec![
            ParamDecl::new(VarDecl::new(VarId(10), "acc", VeraType::Integer)).by_ref(),
            ParamDecl::new(VarDecl::new(VarId(11), "step", VeraType::Integer)),
        ];
        let add = FunctionDecl::function(FuncId(0), "add", VeraType::Integer)
            .with_params(params)
            .with_body(vera_model::Block::new(vec![accumulate()]));
        let mut hidden = FunctionDecl::task(FuncId(1), "reset").in_class(ClassId(0));
        hidden.visibility = Visibility::Local;
        let ctor = FunctionDecl::task(FuncId(2), "new")
            .in_class(ClassId(0))
            .with_body(vera_model::Block::new(vec![]));
        let mut counter = ClassDecl::new(ClassId(0), "counter");
        counter.methods = vec![hidden, ctor];
        CompilationUnit {
            name: "top".into(),
            classes: vec![counter],
            functions: vec![add],
            ..Default::default()
        }
    }

    fn facts() -> AnalysisResults {
        let mut facts = AnalysisResults::new();
        facts.mark_not_assigned_xz(VarId(10)).mark_not_assigned_xz(VarId(11));
        facts.xz_free_returns.insert(FuncId(0));
        facts
    }

    #[test]
    fn test_by_ref_param_is_a_holder_and_falls_back_to_default_return() {
        let unit = unit();
        let facts = facts();
        let mut session = TranslationSession::new(&unit, &facts, TranslatorOptions::default());
        let method = translate_function(&mut session, &unit.functions[0]).unwrap();
        assert!(method.modifiers.is_static);
        assert_eq!(method.return_type, JavaType::Int);
        assert_eq!(method.params[0].ty, JavaType::array_of(JavaType::Int));
        assert_eq!(method.params[1].ty, JavaType::Int);
        let body = method.body.unwrap();
        assert_snapshot!(render_stmts_to_string(&body), @r"
        acc[0] = acc[0] + step;
        return 0;
        ");
    }

    #[test]
    fn test_forked_by_value_param_is_copied_into_a_holder() {
        let unit = unit();
        let mut facts = facts();
        facts.mark_fork_write(VarId(11));
        let mut session = TranslationSession::new(&unit, &facts, TranslatorOptions::default());
        let method = translate_function(&mut session, &unit.functions[0]).unwrap();
        assert_eq!(method.params[1].name, "step_in");
        assert_eq!(method.params[1].ty, JavaType::Int);
        let text = render_stmts_to_string(&method.body.unwrap());
        assert!(text.starts_with("final int[] step = new int[] { step_in };\n"), "{}", text);
        assert!(text.contains("acc[0] = acc[0] + step[0];"), "{}", text);
    }

    #[test]
    fn test_missing_body_becomes_stub_with_warning() {
        let unit = unit();
        let facts = facts();
        let mut session = TranslationSession::new(&unit, &facts, TranslatorOptions::default());
        let method = translate_function(&mut session, &unit.classes[0].methods[0]).unwrap();
        assert_eq!(method.modifiers.visibility, JavaVisibility::Private);
        assert!(!method.modifiers.is_static);
        let text = render_stmts_to_string(&method.body.unwrap());
        assert_snapshot!(text, @r#"throw new UnsupportedOperationException("reset is not implemented");"#);
        let kinds: Vec<_> = session.warnings().iter().map(|w| w.kind).collect();
        assert_eq!(kinds, vec![WarningKind::VisibilityNarrowed, WarningKind::StubGenerated]);
    }

    #[test]
    fn test_new_task_becomes_constructor() {
        let unit = unit();
        let facts = facts();
        let mut session = TranslationSession::new(&unit, &facts, TranslatorOptions::default());
        let method = translate_function(&mut session, &unit.classes[0].methods[1]).unwrap();
        assert!(method.is_constructor);
        assert_eq!(method.name, "Counter");
        assert!(method.body.unwrap().is_empty());
    }
}
