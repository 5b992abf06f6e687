// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Call translation
//!
//! Resolves function, method, super and constructor calls against the target schema
//! and translates the arguments. Missing trailing arguments take the parameter's default
//! value. By-reference parameters receive a single-element holder array; the caller
//! writes the holder's final value back to the argument location after the call.

use super::expression_translator::{sequence, translate_value, translate_with, Expected};
use super::utilities::convert_to;
use crate::context::TranslationContext;
use crate::converted_expression::{discard_value, ConvertedExpression};
use crate::error::{RejectedCandidate, Result, TranslationError};
use crate::expression_converter as conv;
use crate::lhs::{translate_lhs, Access};
use crate::translation::assignment_translator::store_conversion;
use itertools::Itertools;
use java_schema::{Expr, ExprKind, JavaType, MethodSig, Stmt};
use log::trace;
use vera_model::{ClassId, Expr as VeraExpr, ExprKind as VeraExprKind, FuncId, Loc};

/// Receiver of a resolved call
#[derive(Debug, Clone)]
enum CallTarget {
    Static(String),
    /// Unqualified call on the implicit `this`
    Implicit,
    Object(Expr),
    Super,
}

pub fn translate_call(ctx: &mut TranslationContext<'_, '_>, expr: &VeraExpr) -> Result<ConvertedExpression> {
    match &expr.kind {
        VeraExprKind::Call { func, args } => {
            let decl = ctx.session.symbols.function(*func);
            let (class, is_static) = (decl.class, decl.is_static);
            let (class_name, target) = match class {
                None => {
                    let unit = ctx.session.unit_class.clone();
                    (unit.clone(), CallTarget::Static(unit))
                }
                Some(owner) if is_static => {
                    let name = ctx.session.class_name(owner);
                    (name.clone(), CallTarget::Static(name))
                }
                Some(owner) => {
                    if ctx.is_static {
                        return Err(TranslationError::unsupported(
                            "instance method call without an object in a static context",
                            expr.loc,
                        ));
                    }
                    let this_class = ctx.class.unwrap_or(owner);
                    (ctx.session.class_name(this_class), CallTarget::Implicit)
                }
            };
            translate_invocation(ctx, *func, &class_name, target, args, expr.loc)
        }
        VeraExprKind::MethodCall { object, func, args } => {
            let mut conv = ConvertedExpression::empty();
            let receiver = translate_value(ctx, object, &mut conv)?;
            let Some(class_name) = receiver.ty.class_name().map(str::to_string) else {
                return Err(TranslationError::unsupported(
                    format!("method call on a value of type {}", receiver.ty),
                    object.loc,
                ));
            };
            let target = if ctx.session.symbols.function(*func).is_static {
                // The object only matters for its side effects
                conv.add_inits(discard_value(receiver));
                CallTarget::Static(class_name.clone())
            } else {
                let mut init = vec![];
                let receiver = ctx.capture("obj", receiver, &mut init);
                conv.add_inits(init);
                CallTarget::Object(receiver)
            };
            let call = translate_invocation(ctx, *func, &class_name, target, args, expr.loc)?;
            Ok(merge_call(conv, call))
        }
        VeraExprKind::SuperCall { func, args } => {
            let Some(class) = ctx.class else {
                return Err(TranslationError::unsupported("super call outside of a class", expr.loc));
            };
            let Some(superclass) = ctx.session.symbols.class(class).extends else {
                return Err(TranslationError::unsupported("super call in a class without a superclass", expr.loc));
            };
            let super_name = ctx.session.class_name(superclass);
            if ctx.session.symbols.function(*func).is_constructor() {
                return translate_construction(ctx, superclass, args, expr.loc, true);
            }
            translate_invocation(ctx, *func, &super_name, CallTarget::Super, args, expr.loc)
        }
        VeraExprKind::New { class, args } => translate_construction(ctx, *class, args, expr.loc, false),
        other => panic!("BUG: {} routed to the call translator", other.describe()),
    }
}

fn merge_call(mut conv: ConvertedExpression, call: ConvertedExpression) -> ConvertedExpression {
    if let Some(value) = conv.merge(call) {
        conv.set_value(value);
    }
    conv
}

/// Declared signature of a source function, used when the schema has no entry for it
fn declared_signature(ctx: &mut TranslationContext<'_, '_>, func: FuncId, name: &str) -> MethodSig {
    let count = ctx.session.symbols.function(func).params.len();
    let params = (0..count).map(|i| ctx.session.param_type(func, i)).collect();
    let return_type = if ctx.session.symbols.function(func).is_constructor() {
        JavaType::Void
    } else {
        ctx.session.return_type(func)
    };
    let mut sig = MethodSig::new(name, params, return_type);
    sig.is_static = ctx.session.symbols.function(func).is_static;
    sig
}

fn translate_invocation(
    ctx: &mut TranslationContext<'_, '_>,
    func: FuncId,
    class_name: &str,
    target: CallTarget,
    args: &[VeraExpr],
    loc: Loc,
) -> Result<ConvertedExpression> {
    let name = ctx.session.method_name(func);
    let mut candidates: Vec<MethodSig> = ctx
        .session
        .schema
        .find_methods(class_name, &name)
        .into_iter()
        .cloned()
        .collect();
    if candidates.is_empty() {
        candidates.push(declared_signature(ctx, func, &name));
    }
    let mut conv = ConvertedExpression::empty();
    let values = translate_arguments(ctx, Some(func), args, &name, loc, &mut conv)?;
    let sig = resolve(ctx, &name, &candidates, &values, loc)?;
    trace!("call {} resolved to {}", name, sig);
    let args = convert_arguments(ctx, &sig, values, loc)?;
    let ret = sig.return_type.clone();
    let call = match target {
        CallTarget::Static(class) => Expr::static_call(class, &name, args, ret),
        CallTarget::Implicit => Expr::unqualified_call(&name, args, ret),
        CallTarget::Object(object) => Expr::call(object, &name, args, ret),
        CallTarget::Super => Expr::new(ExprKind::SuperCall { name: name.clone(), args }, ret),
    };
    Ok(finish_call(conv, call))
}

/// A void call becomes an init statement so write-backs in the update list follow it
fn finish_call(mut conv: ConvertedExpression, call: Expr) -> ConvertedExpression {
    if call.ty.is_void() {
        conv.add_init(Stmt::expr(call));
    } else {
        conv.set_value(call);
    }
    conv
}

fn translate_construction(
    ctx: &mut TranslationContext<'_, '_>,
    class: ClassId,
    args: &[VeraExpr],
    loc: Loc,
    is_super: bool,
) -> Result<ConvertedExpression> {
    let class_name = ctx.session.class_name(class);
    let constructor = ctx.session.symbols.class(class).constructor().map(|c| c.id);
    let mut candidates = ctx.session.schema.constructors(&class_name).to_vec();
    if candidates.is_empty() {
        candidates.push(match constructor {
            Some(id) => {
                let mut sig = declared_signature(ctx, id, &class_name);
                sig.return_type = JavaType::Void;
                sig
            }
            None => MethodSig::new(&class_name, vec![], JavaType::Void),
        });
    }
    let mut conv = ConvertedExpression::empty();
    let values = translate_arguments(ctx, constructor, args, &class_name, loc, &mut conv)?;
    let sig = resolve(ctx, &class_name, &candidates, &values, loc)?;
    let args = convert_arguments(ctx, &sig, values, loc)?;
    let call = if is_super {
        Expr::unqualified_call("super", args, JavaType::Void)
    } else {
        Expr::new_object(JavaType::Class(class_name), args)
    };
    Ok(finish_call(conv, call))
}

// ============================================================================
// Arguments

/// A translated argument and the source expression it came from, if any
struct Argument<'e> {
    value: Expr,
    source: Option<&'e VeraExpr>,
}

fn translate_arguments<'e>(
    ctx: &mut TranslationContext<'_, '_>,
    func: Option<FuncId>,
    args: &'e [VeraExpr],
    name: &str,
    loc: Loc,
    conv: &mut ConvertedExpression,
) -> Result<Vec<Argument<'e>>> {
    let params = match func {
        Some(func) => ctx.session.symbols.function(func).params.clone(),
        None => vec![],
    };
    if func.is_some() && args.len() > params.len() {
        return Err(arity_error(name, params.len(), args.len(), loc));
    }
    let mut defaults = vec![];
    for param in params.iter().skip(args.len()) {
        match &param.default {
            Some(default) => defaults.push(default.clone()),
            None => return Err(arity_error(name, params.len(), args.len(), loc)),
        }
    }

    let mut translated = vec![];
    for (i, arg) in args.iter().enumerate() {
        translated.push(translate_argument(ctx, func, i, arg)?);
    }
    for (offset, default) in defaults.iter().enumerate() {
        let index = args.len() + offset;
        translated.push(translate_argument(ctx, func, index, default)?);
    }
    let values = sequence(ctx, translated, conv);
    if values.len() != args.len() + defaults.len() {
        return Err(TranslationError::unsupported(format!("void argument in call to {}", name), loc));
    }
    Ok(values
        .into_iter()
        .enumerate()
        .map(|(i, value)| Argument {
            value,
            source: args.get(i),
        })
        .collect())
}

fn arity_error(name: &str, expected: usize, got: usize, loc: Loc) -> TranslationError {
    TranslationError::resolution(
        name,
        vec![RejectedCandidate {
            signature: name.to_string(),
            reason: format!("expects {} arguments, got {}", expected, got),
        }],
        loc,
    )
}

fn translate_argument(
    ctx: &mut TranslationContext<'_, '_>,
    func: Option<FuncId>,
    index: usize,
    arg: &VeraExpr,
) -> Result<ConvertedExpression> {
    let Some(func) = func else {
        return translate_with(ctx, arg, &Expected::none());
    };
    let param_ty = ctx.session.param_type(func, index);
    if !ctx.session.is_holder_param(func, index) {
        return translate_with(ctx, arg, &Expected::of(&param_ty));
    }
    translate_by_reference(ctx, param_ty, arg)
}

/// Holder array for a by-reference argument, with the write-back after the call
fn translate_by_reference(
    ctx: &mut TranslationContext<'_, '_>,
    holder_ty: JavaType,
    arg: &VeraExpr,
) -> Result<ConvertedExpression> {
    let Some(element) = holder_ty.element_type().cloned() else {
        panic!("BUG: holder parameter of type {}", holder_ty);
    };
    // A holder local can be handed over as it is
    if let VeraExprKind::Var(id) = &arg.kind {
        let info = ctx.var_info(*id);
        if let Some(array) = info.holder_array() {
            if info.ty == element && info.event.is_none() {
                return Ok(ConvertedExpression::of(array));
            }
        }
    }
    let mut conv = ConvertedExpression::empty();
    if !arg.is_assignable() {
        let value = translate_value(ctx, arg, &mut conv)?;
        let value = convert_to(ctx, value, &element, arg.ty.is_signed(), "by-reference argument", arg.loc)?;
        return Ok(conv.with_value(Expr::array_init(element, vec![value])));
    }
    let lhs = translate_lhs(ctx, arg, Access::READ_WRITE, &mut conv)?;
    let current = convert_to(ctx, lhs.read(), &element, arg.ty.is_signed(), "by-reference argument", arg.loc)?;
    let (decl, holder) = ctx.declare_temp("ref", Expr::array_init(element, vec![current]));
    conv.add_init(decl);
    let returned = Expr::array_access(holder.clone(), Expr::int(0));
    let stored = store_conversion(ctx, returned, &lhs.result_type(), arg.ty.is_signed(), arg.loc)?;
    let write_back = lhs.write(ctx, stored)?;
    conv.add_updates(write_back.flatten());
    Ok(conv.with_value(holder))
}

fn convert_arguments(
    ctx: &TranslationContext<'_, '_>,
    sig: &MethodSig,
    values: Vec<Argument<'_>>,
    loc: Loc,
) -> Result<Vec<Expr>> {
    let mut converted = vec![];
    for (i, arg) in values.into_iter().enumerate() {
        let Some(param) = sig.param_type(i) else {
            panic!("BUG: resolved {} cannot take argument {}", sig, i);
        };
        let (signed, arg_loc) = match arg.source {
            Some(source) => (source.ty.is_signed(), source.loc),
            None => (false, loc),
        };
        let site = format!("argument {} of {}", i + 1, sig.name);
        let value = match param {
            // Mutable strings passed by value must not alias the caller's copy
            JavaType::JunoString if arg.value.ty == JavaType::JunoString && !arg.value.is_lvalue() => arg.value,
            _ => convert_to(ctx, arg.value, param, signed, &site, arg_loc)?,
        };
        converted.push(value);
    }
    Ok(converted)
}

// ============================================================================
// Overload resolution

/// Cost of passing a `from` value to a `to` parameter, `None` when impossible
fn argument_cost(ctx: &TranslationContext<'_, '_>, from: &JavaType, to: &JavaType) -> Option<u32> {
    if from == to {
        return Some(0);
    }
    match to {
        JavaType::Class(_) | JavaType::Array(_) | JavaType::AssocArray { .. } | JavaType::Event | JavaType::Signal { .. } => {
            ctx.session.schema.is_assignable_from(to, from).then_some(1)
        }
        _ => conv::conversion_cost(from, to),
    }
}

/// Score every candidate by the number of arguments needing a conversion and pick the
/// cheapest. A unique candidate of the right arity is taken without scoring.
fn resolve(
    ctx: &TranslationContext<'_, '_>,
    name: &str,
    candidates: &[MethodSig],
    args: &[Argument<'_>],
    loc: Loc,
) -> Result<MethodSig> {
    let fitting = candidates
        .iter()
        .filter(|c| c.accepts_arity(args.len()))
        .collect_vec();
    if let [only] = fitting.as_slice() {
        return Ok((*only).clone());
    }

    let mut rejected = vec![];
    let mut scored: Vec<(u32, &MethodSig)> = vec![];
    for candidate in candidates {
        if !candidate.accepts_arity(args.len()) {
            rejected.push(RejectedCandidate {
                signature: candidate.to_string(),
                reason: format!("cannot take {} arguments", args.len()),
            });
            continue;
        }
        let mut score = 0;
        let mut failure = None;
        for (i, arg) in args.iter().enumerate() {
            let param = candidate.param_type(i).unwrap_or(&JavaType::Void);
            match argument_cost(ctx, &arg.value.ty, param) {
                Some(cost) => score += cost,
                None => {
                    failure = Some(format!("argument {}: cannot convert {} to {}", i + 1, arg.value.ty, param));
                    break;
                }
            }
        }
        match failure {
            Some(reason) => rejected.push(RejectedCandidate {
                signature: candidate.to_string(),
                reason,
            }),
            None => scored.push((score, candidate)),
        }
    }

    let Some(best) = scored.iter().map(|(score, _)| *score).min() else {
        return Err(TranslationError::resolution(name, rejected, loc));
    };
    let winners = scored.iter().filter(|(score, _)| *score == best).collect_vec();
    match winners.as_slice() {
        [(_, winner)] => Ok((*winner).clone()),
        tied => {
            let candidates = tied
                .iter()
                .map(|(score, sig)| RejectedCandidate {
                    signature: sig.to_string(),
                    reason: format!("ambiguous, {} conversions", score),
                })
                .collect();
            Err(TranslationError::resolution(name, candidates, loc))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::TranslatorOptions;
    use crate::session::TranslationSession;
    use insta::assert_snapshot;
    use java_schema::{render_stmts_to_string, Block, ClassInfo};
    use vera_model::{
        AnalysisResults, ClassDecl, CompilationUnit, FunctionDecl, NodeId, ParamDecl, VarDecl, VarId, VeraType,
    };

    fn e(kind: VeraExprKind, ty: VeraType) -> VeraExpr {
        VeraExpr::new(NodeId(0), kind, ty)
    }

    fn var(id: u32, ty: VeraType) -> VeraExpr {
        e(VeraExprKind::Var(VarId(id)), ty)
    }

    fn int(v: i64) -> VeraExpr {
        e(VeraExprKind::IntegerLiteral(v), VeraType::Integer)
    }

    fn unit() -> CompilationUnit {
        let bump_params = vec![
            ParamDecl::new(VarDecl::new(VarId(10), "slot", VeraType::Integer)).by_ref(),
            ParamDecl::new(VarDecl::new(VarId(11), "step", VeraType::Integer)).with_default(int(1)),
        ];
        let mut packet = ClassDecl::new(ClassId(0), "packet");
        packet.methods.push(
            FunctionDecl::task(FuncId(5), "new")
                .in_class(ClassId(0))
                .with_params(vec![ParamDecl::new(VarDecl::new(VarId(20), "len", VeraType::Integer))]),
        );
        CompilationUnit {
            name: "top".into(),
            globals: vec![
                VarDecl::new(VarId(1), "total", VeraType::Integer),
                VarDecl::new(VarId(2), "word", VeraType::bit(8)),
            ],
            functions: vec![FunctionDecl::task(FuncId(0), "bump").with_params(bump_params)],
            classes: vec![packet],
            ..Default::default()
        }
    }

    fn call(func: u32, args: Vec<VeraExpr>) -> VeraExpr {
        e(
            VeraExprKind::Call {
                func: FuncId(func),
                args,
            },
            VeraType::Void,
        )
    }

    fn render(conv: ConvertedExpression) -> String {
        render_stmts_to_string(&Block::new(conv.flatten()))
    }

    #[test]
    fn test_by_ref_argument_is_written_back() {
        let unit = unit();
        let facts = AnalysisResults::new();
        let mut session = TranslationSession::new(&unit, &facts, TranslatorOptions::default());
        let mut ctx = TranslationContext::new(&mut session, None, true);
        let result = translate_call(&mut ctx, &call(0, vec![var(1, VeraType::Integer)])).unwrap();
        assert!(result.value().is_none());
        assert_snapshot!(render(result), @r"
        final Integer[] ref = new Integer[] { Top.total };
        Top.bump(ref, 1);
        Top.total = ref[0];
        ");
    }

    #[test]
    fn test_by_ref_slice_argument_writes_slice_back() {
        let unit = unit();
        let facts = AnalysisResults::new();
        let mut session = TranslationSession::new(&unit, &facts, TranslatorOptions::default());
        let mut ctx = TranslationContext::new(&mut session, None, true);
        let slice = e(
            VeraExprKind::BitSlice {
                target: Box::new(var(2, VeraType::bit(8))),
                high: Box::new(int(7)),
                low: Box::new(int(4)),
            },
            VeraType::bit(4),
        );
        let text = render(translate_call(&mut ctx, &call(0, vec![slice, int(3)])).unwrap());
        assert!(text.contains("Top.bump(ref, 3);\n"), "{}", text);
        assert!(text.contains("Top.word = Top.word.setBits(7, 4, "), "{}", text);
    }

    #[test]
    fn test_missing_argument_without_default_is_rejected() {
        let unit = unit();
        let facts = AnalysisResults::new();
        let mut session = TranslationSession::new(&unit, &facts, TranslatorOptions::default());
        let mut ctx = TranslationContext::new(&mut session, None, true);
        let err = translate_call(&mut ctx, &call(0, vec![])).unwrap_err();
        assert!(matches!(err, TranslationError::Resolution { .. }), "{}", err);
    }

    #[test]
    fn test_constructor_call() {
        let unit = unit();
        let facts = AnalysisResults::new();
        let mut session = TranslationSession::new(&unit, &facts, TranslatorOptions::default());
        let mut ctx = TranslationContext::new(&mut session, None, true);
        let new = e(
            VeraExprKind::New {
                class: ClassId(0),
                args: vec![int(64)],
            },
            VeraType::Class(ClassId(0)),
        );
        let result = translate_call(&mut ctx, &new).unwrap();
        assert_snapshot!(
            java_schema::render_expr_to_string(result.value().unwrap()),
            @"new Packet(64)"
        );
    }

    #[test]
    fn test_rejected_overloads_are_reported() {
        let unit = unit();
        let facts = AnalysisResults::new();
        let mut session = TranslationSession::new(&unit, &facts, TranslatorOptions::default());
        session.schema.add_class(
            ClassInfo::new("Top")
                .with_method(MethodSig::new("bump", vec![JavaType::Long, JavaType::Int], JavaType::Void).with_static())
                .with_method(MethodSig::new("bump", vec![JavaType::Boolean, JavaType::Int], JavaType::Void).with_static()),
        );
        let mut ctx = TranslationContext::new(&mut session, None, true);
        // `bump` takes its first argument by reference, so it arrives as an Integer[]
        // holder that neither overload accepts
        let err = translate_call(&mut ctx, &call(0, vec![var(1, VeraType::Integer), int(2)])).unwrap_err();
        let TranslationError::Resolution { candidates, .. } = err else {
            panic!("expected a resolution error");
        };
        assert_eq!(candidates.len(), 2);
        assert!(candidates[0].reason.starts_with("argument 1"));
    }
}
