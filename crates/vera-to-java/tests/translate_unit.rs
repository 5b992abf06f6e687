// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use std::io::Write;
use vera_model::{
    AnalysisResults, CaseItem, CaseKind, CompilationUnit, EnumDecl, EnumId, Expr, ExprKind, FuncId, FunctionDecl,
    IncDecOp, JoinKind, Loc, NodeId, Stmt, StmtKind, VarDecl, VarId, VeraType,
};
use vera_to_java::{
    render_diagnostics, translate_unit, SourceFiles, TranslationError, TranslationOutput, TranslatorOptions,
};

const COUNT: VarId = VarId(1);
const WATCHED: VarId = VarId(2);
const MODE: VarId = VarId(3);
const HIGH: VarId = VarId(4);
const LOW: VarId = VarId(5);
const WORD: VarId = VarId(6);
const LOCAL: VarId = VarId(10);
const NEXT: FuncId = FuncId(0);
const FORK: NodeId = NodeId(100);

fn e(kind: ExprKind, ty: VeraType) -> Expr {
    Expr::new(NodeId(0), kind, ty)
}

fn var(id: VarId) -> Expr {
    e(ExprKind::Var(id), VeraType::Integer)
}

fn int(v: i64) -> Expr {
    e(ExprKind::IntegerLiteral(v), VeraType::Integer)
}

fn next() -> Expr {
    e(ExprKind::Call { func: NEXT, args: vec![] }, VeraType::Integer)
}

fn stmt(id: u32, kind: StmtKind) -> Stmt {
    Stmt::new(NodeId(id), kind)
}

fn assign(target: VarId, value: Expr) -> Stmt {
    stmt(
        0,
        StmtKind::Expr(e(
            ExprKind::Assign {
                target: Box::new(var(target)),
                value: Box::new(value),
            },
            VeraType::Integer,
        )),
    )
}

fn increment(id: u32, target: VarId) -> Stmt {
    stmt(
        id,
        StmtKind::Expr(e(
            ExprKind::IncDec {
                op: IncDecOp::PostIncrement,
                target: Box::new(var(target)),
            },
            VeraType::Integer,
        )),
    )
}

/// Unit with a few globals, one function and the given program statements
fn unit(program: Vec<Stmt>) -> CompilationUnit {
    let next = FunctionDecl::function(NEXT, "next", VeraType::Integer)
        .with_body(vera_model::Block::new(vec![stmt(0, StmtKind::Return(Some(int(7))))]));
    CompilationUnit {
        name: "top".into(),
        enums: vec![EnumDecl::new(EnumId(0), "mode", &["idle", "busy"])],
        globals: vec![
            VarDecl::new(COUNT, "count", VeraType::Integer),
            VarDecl::new(WATCHED, "watched", VeraType::Integer),
            VarDecl::new(MODE, "mode", VeraType::Enum(EnumId(0))),
            VarDecl::new(HIGH, "high", VeraType::bit(4)),
            VarDecl::new(LOW, "low", VeraType::bit(4)),
            VarDecl::new(WORD, "word", VeraType::bit(8)),
        ],
        functions: vec![next],
        program: Some(vera_model::Block::new(program)),
        ..Default::default()
    }
}

fn facts() -> AnalysisResults {
    let mut facts = AnalysisResults::new();
    facts
        .mark_not_assigned_xz(COUNT)
        .mark_not_assigned_xz(WATCHED)
        .mark_not_assigned_xz(LOCAL)
        .mark_wait_var(WATCHED);
    facts.xz_free_returns.insert(NEXT);
    facts
}

fn translate(program: Vec<Stmt>, facts: &AnalysisResults) -> TranslationOutput {
    translate_unit(&unit(program), facts, TranslatorOptions::default()).unwrap()
}

#[test]
fn test_unit_members() {
    let output = translate(vec![assign(COUNT, next())], &facts());
    let text = output.render();
    assert!(text.contains("public class Top {\n"), "{}", text);
    assert!(text.contains("    public static int count = 0;\n"), "{}", text);
    assert!(text.contains("    public static final JunoEvent watched_event = new JunoEvent();\n"), "{}", text);
    assert!(text.contains("    public static Mode mode = Mode.UNDEFINED;\n"), "{}", text);
    assert!(text.contains("    public static int next() {\n        return 7;\n    }\n"), "{}", text);
    assert!(text.contains("    public static void run() {\n        Top.count = Top.next();\n    }\n"), "{}", text);
    assert!(text.contains("    public static enum Mode {\n"), "{}", text);
    assert!(output.warnings.is_empty(), "{:?}", output.warnings);
}

#[test]
fn test_wait_var_write_triggers_event() {
    let text = translate(vec![increment(1, WATCHED)], &facts()).render();
    assert!(text.contains("final int old = Top.watched;"), "{}", text);
    assert!(text.contains("if (old != Top.watched) {"), "{}", text);
    assert!(text.contains("Top.watched_event.trigger();"), "{}", text);
}

#[test]
fn test_case_selector_is_evaluated_once() {
    let case = stmt(
        1,
        StmtKind::Case {
            kind: CaseKind::Case,
            selector: next(),
            items: vec![
                CaseItem {
                    values: vec![int(1)],
                    body: assign(COUNT, int(10)),
                },
                CaseItem {
                    values: vec![next()],
                    body: assign(COUNT, int(20)),
                },
            ],
            default: None,
        },
    );
    let text = translate(vec![case], &facts()).render();
    // One call for the selector, one for the second item
    assert_eq!(text.matches("Top.next()").count(), 2, "{}", text);
    assert!(text.contains("final int sel = Top.next();"), "{}", text);
}

#[test]
fn test_concatenation_target_fills_from_the_right() {
    let bits = |id| e(ExprKind::Var(id), VeraType::bit(4));
    let target = e(ExprKind::Concat(vec![bits(HIGH), bits(LOW)]), VeraType::bit(8));
    let store = stmt(
        1,
        StmtKind::Expr(e(
            ExprKind::Assign {
                target: Box::new(target),
                value: Box::new(e(ExprKind::Var(WORD), VeraType::bit(8))),
            },
            VeraType::bit(8),
        )),
    );
    let text = translate(vec![store], &facts()).render();
    assert!(text.contains("    public static BitVector word = BitVector.allX(8);\n"), "{}", text);
    let low = text.find("bits.getBits(3, 0)").unwrap();
    let high = text.find("bits.getBits(7, 4)").unwrap();
    assert!(low < high, "{}", text);
    assert_eq!(text.matches("Top.word").count(), 1, "{}", text);
}

#[test]
fn test_fork_branches_write_private_copies() {
    let mut facts = facts();
    facts.add_capture(FORK, vec![LOCAL]);
    facts.add_write(LOCAL, NodeId(101));
    let decl = stmt(0, StmtKind::VarDecl(VarDecl::new(LOCAL, "i", VeraType::Integer).shadow()));
    let fork = stmt(
        FORK.0,
        StmtKind::Fork {
            branches: vec![increment(101, LOCAL), assign(COUNT, var(LOCAL))],
            join: JoinKind::All,
        },
    );
    let text = translate(vec![decl, fork, assign(COUNT, var(LOCAL))], &facts).render();
    assert!(text.contains("final int i_snapshot = i;"), "{}", text);
    assert!(text.contains("int i_1 = i_snapshot;\n            i_1++;"), "{}", text);
    assert!(text.contains("Top.count = i_snapshot;"), "{}", text);
    assert!(text.contains("Juno.joinAll(new JunoThread[] { thread, thread_1 });"), "{}", text);
    // The forking thread keeps reading its own variable
    assert!(text.contains("Top.count = i;"), "{}", text);
}

#[test]
fn test_options_file_sets_package_and_class() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "package = \"gen.bench\"\nunit_class = \"Bench\"").unwrap();
    let options = TranslatorOptions::from_file(file.path()).unwrap();
    let output = translate_unit(&unit(vec![]), &facts(), options).unwrap();
    let text = output.render();
    assert!(text.starts_with("package gen.bench;\n\nimport juno.runtime.*;\n"), "{}", text);
    assert!(text.contains("public class Bench {\n"), "{}", text);
}

#[test]
fn test_unsupported_statement_aborts_with_diagnostic() {
    let mut files = SourceFiles::new();
    let source = "program top {\n  expect(@1 count == 1);\n}\n";
    let file = files.add("top.vr".to_string(), source.to_string());
    let loc = Loc::new(file, 16, 37);
    let expect = stmt(1, StmtKind::Expect(var(COUNT))).with_loc(loc);
    let err = translate_unit(&unit(vec![expect]), &facts(), TranslatorOptions::default()).unwrap_err();
    assert!(matches!(err, TranslationError::Unsupported { .. }), "{}", err);
    assert_eq!(err.loc(), loc);
    let text = render_diagnostics(&files, &[err], &[]).unwrap();
    assert!(text.contains("error[E0001]"), "{}", text);
    assert!(text.contains("top.vr:2:3"), "{}", text);
}
