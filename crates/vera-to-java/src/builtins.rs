// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Library intrinsics
//!
//! A fixed table maps each intrinsic name to a translation strategy. Most intrinsics are
//! a call of the same-named static method of the runtime's `Juno` class; a handful need
//! statements of their own (`assert`, `assoc_index`, `cast_assign`, `wait_var`,
//! `trigger`, `sprintf`). Intrinsics invoked on a receiver (`s.len()`, `a.size()`) are
//! dispatched on the receiver's translated type instead.

use crate::context::TranslationContext;
use crate::converted_expression::{discard_value, ConvertedExpression};
use crate::error::{Result, TranslationError};
use crate::expression_converter as conv;
use crate::lhs::{translate_lhs, Access, Lhs};
use crate::translation::assignment_translator::store_conversion;
use crate::translation::convert_to;
use crate::translation::default_value;
use crate::translation::expression_translator::{
    sequence, translate_as, translate_value, translate_value_with, Expected,
};
use java_schema::runtime::{JUNO, STRING_OP, UNDEFINED};
use java_schema::{BinaryOp, Expr, ExprKind, JavaType, Stmt};
use log::trace;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use vera_model::{Expr as VeraExpr, ExprKind as VeraExprKind, Loc};

/// Same-named static runtime call
#[derive(Debug, Clone)]
struct StaticCall {
    method: &'static str,
    params: Vec<JavaType>,
    /// Number of leading parameters that must be supplied
    required: usize,
    /// Element type of trailing varargs
    rest: Option<JavaType>,
    ret: JavaType,
}

impl StaticCall {
    fn new(method: &'static str, params: Vec<JavaType>, ret: JavaType) -> Self {
        Self {
            method,
            required: params.len(),
            params,
            rest: None,
            ret,
        }
    }

    fn optional(mut self, count: usize) -> Self {
        self.required -= count;
        self
    }

    fn varargs(mut self, element: JavaType) -> Self {
        self.rest = Some(element);
        self
    }

    fn accepts(&self, count: usize) -> bool {
        count >= self.required && (count <= self.params.len() || self.rest.is_some())
    }

    fn param(&self, index: usize) -> &JavaType {
        match (self.params.get(index), &self.rest) {
            (Some(ty), _) => ty,
            (None, Some(rest)) => rest,
            (None, None) => panic!("BUG: argument {} of {} past arity check", index, self.method),
        }
    }
}

#[derive(Debug, Clone)]
enum Strategy {
    Static(StaticCall),
    /// Java `assert`; X and Z count as failure
    Assert,
    /// `assoc_index(CHECK|DELETE|FIRST|NEXT, array [, index])`
    AssocIndex,
    /// `cast_assign(dest, src [, CHECK])`
    CastAssign,
    WaitVar,
    Trigger,
    /// `sprintf(dest, fmt, ...)` formats into a string location
    Sprintf,
}

static BUILTINS: Lazy<BTreeMap<&'static str, Strategy>> = Lazy::new(|| {
    use JavaType::*;
    let direct = |call: StaticCall| Strategy::Static(call);
    BTreeMap::from([
        ("printf", direct(StaticCall::new("printf", vec![String], Void).varargs(Object))),
        ("psprintf", direct(StaticCall::new("format", vec![String], String).varargs(Object))),
        ("error", direct(StaticCall::new("error", vec![String], Void).varargs(Object))),
        ("exit", direct(StaticCall::new("exit", vec![Int], Void))),
        ("random", direct(StaticCall::new("random", vec![Int], Int).optional(1))),
        ("urandom", direct(StaticCall::new("urandom", vec![Int], Int).optional(1))),
        ("urandom_range", direct(StaticCall::new("urandomRange", vec![Int, Int], Int).optional(1))),
        ("get_time", direct(StaticCall::new("getTime", vec![Int], Int))),
        ("get_cycle", direct(StaticCall::new("getCycle", vec![], Int))),
        ("delay", direct(StaticCall::new("delay", vec![Int], Void))),
        ("os_command", direct(StaticCall::new("osCommand", vec![String], Int))),
        ("alloc", direct(StaticCall::new("alloc", vec![Int, Int, Int], Int))),
        ("semaphore_get", direct(StaticCall::new("semaphoreGet", vec![Int, Int, Int], Int))),
        ("semaphore_put", direct(StaticCall::new("semaphorePut", vec![Int, Int], Void))),
        ("assert", Strategy::Assert),
        ("assoc_index", Strategy::AssocIndex),
        ("cast_assign", Strategy::CastAssign),
        ("wait_var", Strategy::WaitVar),
        ("trigger", Strategy::Trigger),
        ("sprintf", Strategy::Sprintf),
    ])
});

/// String method: parameters, required count, result, and whether it replaces the
/// string's contents
#[derive(Debug, Clone)]
struct StringMethod {
    params: Vec<JavaType>,
    required: usize,
    ret: JavaType,
    mutates: bool,
    /// Reads state left behind by a previous `match`
    stateful: bool,
}

static STRING_METHODS: Lazy<BTreeMap<&'static str, StringMethod>> = Lazy::new(|| {
    use JavaType::*;
    let method = |params: Vec<JavaType>, ret: JavaType| StringMethod {
        required: params.len(),
        params,
        ret,
        mutates: false,
        stateful: false,
    };
    let mutator = |params: Vec<JavaType>| StringMethod {
        mutates: true,
        ..method(params, Void)
    };
    let stateful = |params: Vec<JavaType>| StringMethod {
        stateful: true,
        ..method(params, String)
    };
    BTreeMap::from([
        ("len", method(vec![], Int)),
        ("getc", method(vec![Int], Int)),
        ("putc", mutator(vec![Int, Int])),
        ("itoa", mutator(vec![Int])),
        ("toupper", method(vec![], String)),
        ("tolower", method(vec![], String)),
        (
            "substr",
            StringMethod {
                required: 1,
                ..method(vec![Int, Int], String)
            },
        ),
        ("compare", method(vec![String], Int)),
        ("icompare", method(vec![String], Int)),
        ("atoi", method(vec![], Int)),
        ("search", method(vec![String], Int)),
        ("match", method(vec![String], Boolean)),
        ("prematch", stateful(vec![])),
        ("postmatch", stateful(vec![])),
        ("thismatch", stateful(vec![])),
        ("backref", stateful(vec![Int])),
    ])
});

pub fn is_builtin(name: &str) -> bool {
    BUILTINS.contains_key(name)
}

/// Translate a call of the intrinsic `name`
pub fn translate_builtin(
    ctx: &mut TranslationContext<'_, '_>,
    name: &str,
    receiver: Option<&VeraExpr>,
    args: &[VeraExpr],
    expr: &VeraExpr,
) -> Result<ConvertedExpression> {
    if let Some(receiver) = receiver {
        return translate_method(ctx, name, receiver, args, expr);
    }
    let Some(strategy) = BUILTINS.get(name) else {
        return Err(TranslationError::unsupported(
            format!("built-in `{}`", name),
            expr.loc,
        ));
    };
    trace!("built-in {} at {}", name, expr.loc);
    match strategy {
        Strategy::Static(call) => translate_static(ctx, name, call, args, expr.loc),
        Strategy::Assert => translate_assert(ctx, args, expr.loc),
        Strategy::AssocIndex => translate_assoc_index(ctx, args, expr.loc),
        Strategy::CastAssign => translate_cast_assign(ctx, args, expr.loc),
        Strategy::WaitVar => translate_wait_var(ctx, args, expr.loc),
        Strategy::Trigger => translate_trigger(ctx, args, expr.loc),
        Strategy::Sprintf => translate_sprintf(ctx, args, expr.loc),
    }
}

fn arity_error(name: &str, count: usize, loc: Loc) -> TranslationError {
    TranslationError::unsupported(format!("`{}` with {} arguments", name, count), loc)
}

/// Keyword argument such as `CHECK` or `FIRST`, passed as a string literal
fn keyword(arg: &VeraExpr) -> Option<&str> {
    match &arg.kind {
        VeraExprKind::StringLiteral(text) => Some(text),
        _ => None,
    }
}

/// Translate `arg` as a value of `ty`. `Object` parameters take any value.
fn translate_argument(ctx: &mut TranslationContext<'_, '_>, arg: &VeraExpr, ty: &JavaType) -> Result<ConvertedExpression> {
    let mut conv = ConvertedExpression::empty();
    let value = match ty {
        JavaType::Object => conv::to_object(translate_value(ctx, arg, &mut conv)?),
        _ => translate_as(ctx, arg, ty, &mut conv)?,
    };
    Ok(conv.with_value(value))
}

/// Void calls run as statements, others become the value
fn finish(mut conv: ConvertedExpression, call: Expr) -> ConvertedExpression {
    if call.ty.is_void() {
        conv.add_init(Stmt::expr(call));
    } else {
        conv.set_value(call);
    }
    conv
}

fn translate_static(
    ctx: &mut TranslationContext<'_, '_>,
    name: &str,
    call: &StaticCall,
    args: &[VeraExpr],
    loc: Loc,
) -> Result<ConvertedExpression> {
    if !call.accepts(args.len()) {
        return Err(arity_error(name, args.len(), loc));
    }
    let operands = args
        .iter()
        .enumerate()
        .map(|(i, arg)| translate_argument(ctx, arg, call.param(i)))
        .collect::<Result<Vec<_>>>()?;
    let mut conv = ConvertedExpression::empty();
    let values = sequence(ctx, operands, &mut conv);
    let call = Expr::static_call(JUNO, call.method, values, call.ret.clone());
    Ok(finish(conv, call))
}

fn translate_assert(ctx: &mut TranslationContext<'_, '_>, args: &[VeraExpr], loc: Loc) -> Result<ConvertedExpression> {
    let [cond] = args else {
        return Err(arity_error("assert", args.len(), loc));
    };
    let mut conv = ConvertedExpression::empty();
    let value = translate_value(ctx, cond, &mut conv)?;
    if !ctx.session.options.emit_assertions {
        conv.add_inits(discard_value(value));
        return Ok(conv);
    }
    let cond = conv::to_boolean(value, false).map_err(|e| e.at("assertion", loc))?;
    conv.add_init(Stmt::Assert {
        cond,
        message: Some(Expr::string(format!("assertion failed at {}", loc))),
    });
    Ok(conv)
}

// ============================================================================
// Associative arrays

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssocOp {
    Check,
    Delete,
    First,
    Next,
}

fn assoc_op(arg: &VeraExpr) -> Option<AssocOp> {
    match keyword(arg)? {
        "CHECK" => Some(AssocOp::Check),
        "DELETE" => Some(AssocOp::Delete),
        "FIRST" => Some(AssocOp::First),
        "NEXT" => Some(AssocOp::Next),
        _ => None,
    }
}

fn translate_assoc_index(
    ctx: &mut TranslationContext<'_, '_>,
    args: &[VeraExpr],
    loc: Loc,
) -> Result<ConvertedExpression> {
    let (op, array, index) = match args {
        [op, array] => (op, array, None),
        [op, array, index] => (op, array, Some(index)),
        _ => return Err(arity_error("assoc_index", args.len(), loc)),
    };
    let Some(op) = assoc_op(op) else {
        return Err(TranslationError::unsupported("assoc_index operation other than CHECK, DELETE, FIRST or NEXT", loc));
    };
    let mut conv = ConvertedExpression::empty();
    let array = translate_value(ctx, array, &mut conv)?;
    let JavaType::AssocArray { key, .. } = array.ty.clone() else {
        return Err(TranslationError::unsupported(format!("assoc_index on {}", array.ty), loc));
    };
    match (op, index) {
        (AssocOp::Check, None) => {
            conv.set_value(Expr::call(array, "size", vec![], JavaType::Int));
        }
        (AssocOp::Check, Some(index)) => {
            let mut operands = vec![ConvertedExpression::of(array)];
            operands.push(translate_argument(ctx, index, &key)?);
            let mut values = sequence(ctx, operands, &mut conv).into_iter();
            let (Some(array), Some(index)) = (values.next(), values.next()) else {
                panic!("BUG: assoc_index operands lost");
            };
            conv.set_value(Expr::call(array, "containsKey", vec![index], JavaType::Boolean));
        }
        (AssocOp::Delete, None) => {
            conv.add_init(Stmt::expr(Expr::call(array, "clear", vec![], JavaType::Void)));
            conv.set_value(Expr::bool(true));
            conv.set_optional_result(true);
        }
        (AssocOp::Delete, Some(index)) => {
            let mut operands = vec![ConvertedExpression::of(array)];
            operands.push(translate_argument(ctx, index, &key)?);
            let mut values = sequence(ctx, operands, &mut conv).into_iter();
            let (Some(array), Some(index)) = (values.next(), values.next()) else {
                panic!("BUG: assoc_index operands lost");
            };
            conv.add_init(Stmt::expr(Expr::call(array, "remove", vec![index], JavaType::Void)));
            conv.set_value(Expr::bool(true));
            conv.set_optional_result(true);
        }
        (AssocOp::First | AssocOp::Next, None) => {
            return Err(arity_error("assoc_index", args.len(), loc));
        }
        (_, Some(index)) if index.is_assignable() => {
            let mut init = vec![];
            let array = ctx.capture("map", array, &mut init);
            conv.add_inits(init);
            return translate_step_into(ctx, op, array, &key, index, conv, loc);
        }
        (_, Some(index)) => {
            // No location to store the key in; the runtime fills a throwaway holder
            let current = match op {
                AssocOp::Next => Some(translate_argument(ctx, index, &key)?),
                _ => None,
            };
            let mut operands = vec![ConvertedExpression::of(array)];
            operands.extend(current);
            let mut values = sequence(ctx, operands, &mut conv).into_iter();
            let Some(array) = values.next() else {
                panic!("BUG: assoc_index operands lost");
            };
            let (method, holder) = match values.next() {
                Some(current) => ("assocNext", Expr::array_init((*key).clone(), vec![current])),
                None => ("assocFirst", Expr::new_array((*key).clone(), Expr::int(1))),
            };
            conv.set_value(Expr::static_call(JUNO, method, vec![array, holder], JavaType::Boolean));
        }
    }
    Ok(conv)
}

/// FIRST/NEXT with an assignable index: the found key is stored straight into the
/// index location. When there is no such key the location is reset to X (or `null`),
/// except for two-valued `int`/`boolean` locations, which keep their value.
fn translate_step_into(
    ctx: &mut TranslationContext<'_, '_>,
    op: AssocOp,
    array: Expr,
    key_ty: &JavaType,
    index: &VeraExpr,
    mut conv: ConvertedExpression,
    loc: Loc,
) -> Result<ConvertedExpression> {
    let access = if op == AssocOp::Next { Access::READ_WRITE } else { Access::WRITE };
    let lhs = translate_lhs(ctx, index, access, &mut conv)?;
    let found_key = match op {
        AssocOp::Next => {
            let current = convert_to(ctx, lhs.read(), key_ty, false, "assoc_index NEXT", loc)?;
            Expr::call(array, "nextKey", vec![current], key_ty.clone())
        }
        _ => Expr::call(array, "firstKey", vec![], key_ty.clone()),
    };
    let (decl, key) = ctx.declare_temp("key", found_key);
    conv.add_init(decl);
    let found = Expr::binary(BinaryOp::Ne, key.clone(), Expr::null(JavaType::Null), JavaType::Boolean);

    let target = lhs.result_type();
    let stored = store_conversion(ctx, key, &target, false, loc)?;
    let on_found = ctx.scoped(|ctx| Ok(lhs.write(ctx, stored)?.flatten()))?;
    let step = if target.is_primitive() {
        Stmt::if_then(found.clone(), Stmt::from_stmts(on_found))
    } else {
        let on_missing = ctx.scoped(|ctx| Ok(lhs.write(ctx, default_value(&target))?.flatten()))?;
        Stmt::if_else(found.clone(), Stmt::from_stmts(on_found), Stmt::from_stmts(on_missing))
    };
    conv.add_init(step);
    conv.set_value(found);
    conv.set_optional_result(true);
    Ok(conv)
}

// ============================================================================
// Checked casts

/// How a `cast_assign` source relates to its destination
#[derive(Debug, Clone, PartialEq, Eq)]
enum CastKind {
    /// Source is assignable as it is, or through a value conversion
    Convert,
    /// Class downcast needing a runtime type test
    Downcast,
    /// Integral value to enum, which may name no enumerator
    ToEnum(String),
}

fn classify_cast(ctx: &TranslationContext<'_, '_>, from: &JavaType, to: &JavaType) -> Option<CastKind> {
    let schema = &ctx.session.schema;
    match (from, to) {
        (_, JavaType::Class(_)) if schema.is_assignable_from(to, from) => Some(CastKind::Convert),
        (JavaType::Class(_), JavaType::Class(_)) if schema.is_assignable_from(from, to) => Some(CastKind::Downcast),
        (JavaType::Class(_), _) | (_, JavaType::Class(_)) => None,
        (JavaType::Enum(a), JavaType::Enum(b)) if a != b => None,
        (from, JavaType::Enum(name)) if from != to && conv::has_int_conversion(from) => {
            Some(CastKind::ToEnum(name.clone()))
        }
        (from, to) if conv::has_conversion(from, to) => Some(CastKind::Convert),
        _ => None,
    }
}

/// `cast_assign(dest, src [, CHECK])`. The result is a success flag. A failed checked
/// cast stores a poison value (`null` for classes, `UNDEFINED` for enums); a failed
/// unchecked cast throws at run time.
fn translate_cast_assign(
    ctx: &mut TranslationContext<'_, '_>,
    args: &[VeraExpr],
    loc: Loc,
) -> Result<ConvertedExpression> {
    let (dest, src, checked) = match args {
        [dest, src] => (dest, src, false),
        [dest, src, flag] if keyword(flag) == Some("CHECK") => (dest, src, true),
        _ => return Err(arity_error("cast_assign", args.len(), loc)),
    };
    let mut conv = ConvertedExpression::empty();
    let lhs = translate_lhs(ctx, dest, Access::WRITE, &mut conv)?;
    let target = lhs.result_type();
    let value = translate_value_with(ctx, src, &Expected::of(&target), &mut conv)?;
    let Some(kind) = classify_cast(ctx, &value.ty, &target) else {
        return Err(TranslationError::conversion(&value.ty, &target, "cast_assign", loc));
    };
    let signed = src.ty.is_signed();
    match kind {
        CastKind::Convert => {
            let stored = store_conversion(ctx, value, &target, signed, loc)?;
            conv.add_inits(lhs.write(ctx, stored)?.flatten());
            conv.set_value(Expr::bool(true));
        }
        CastKind::Downcast if !checked => {
            let stored = value.cast(target.clone());
            conv.add_inits(lhs.write(ctx, stored)?.flatten());
            conv.set_value(Expr::bool(true));
        }
        CastKind::Downcast => {
            let mut init = vec![];
            let source = ctx.capture("src", value, &mut init);
            conv.add_inits(init);
            let test = Expr::new(
                ExprKind::InstanceOf {
                    expr: Box::new(source.clone()),
                    class: target.clone(),
                },
                JavaType::Boolean,
            );
            let is_null = Expr::binary(BinaryOp::Eq, source.clone(), Expr::null(JavaType::Null), JavaType::Boolean);
            let ok = Expr::binary(BinaryOp::Or, is_null, test, JavaType::Boolean);
            let (decl, ok) = ctx.declare_temp("ok", ok);
            conv.add_init(decl);
            let on_ok = ctx.scoped(|ctx| Ok(lhs.write(ctx, source.cast(target.clone()))?.flatten()))?;
            let on_fail = ctx.scoped(|ctx| Ok(lhs.write(ctx, Expr::null(target.clone()))?.flatten()))?;
            conv.add_init(Stmt::if_else(ok.clone(), Stmt::from_stmts(on_ok), Stmt::from_stmts(on_fail)));
            conv.set_value(ok);
        }
        CastKind::ToEnum(name) => {
            let converted = conv::to_enum(value, &name, !checked).map_err(|e| e.at("cast_assign", loc))?;
            if !checked {
                conv.add_inits(lhs.write(ctx, converted)?.flatten());
                conv.set_value(Expr::bool(true));
            } else {
                // Converted once; the stored value doubles as the poison on failure
                let (decl, converted) = ctx.declare_temp("cast", converted);
                conv.add_init(decl);
                let undefined = Expr::static_field(name.clone(), UNDEFINED, target.clone());
                let ok = Expr::binary(BinaryOp::Ne, converted.clone(), undefined, JavaType::Boolean);
                let (decl, ok) = ctx.declare_temp("ok", ok);
                conv.add_init(decl);
                conv.add_inits(lhs.write(ctx, converted)?.flatten());
                conv.set_value(ok);
            }
        }
    }
    conv.set_optional_result(true);
    Ok(conv)
}

// ============================================================================
// Events and formatting

/// Change-notification event of a waited-on location
fn location_event(lhs: &Lhs, arg: &VeraExpr) -> Result<Expr> {
    match lhs.update_event() {
        Some(event) => Ok(event.clone()),
        None => Err(TranslationError::unsupported(
            "wait_var on a location without a change event",
            arg.loc,
        )),
    }
}

fn translate_wait_var(ctx: &mut TranslationContext<'_, '_>, args: &[VeraExpr], loc: Loc) -> Result<ConvertedExpression> {
    if args.is_empty() {
        return Err(arity_error("wait_var", 0, loc));
    }
    let mut conv = ConvertedExpression::empty();
    let mut events = vec![];
    for arg in args {
        let lhs = translate_lhs(ctx, arg, Access::READ, &mut conv)?;
        events.push(location_event(&lhs, arg)?);
    }
    let wait = match events.len() {
        1 => Expr::static_call(JUNO, "waitFor", events, JavaType::Void),
        _ => {
            let events = Expr::array_init(JavaType::Event, events);
            Expr::static_call(JUNO, "waitForAny", vec![events], JavaType::Void)
        }
    };
    conv.add_init(Stmt::expr(wait));
    Ok(conv)
}

fn translate_trigger(ctx: &mut TranslationContext<'_, '_>, args: &[VeraExpr], loc: Loc) -> Result<ConvertedExpression> {
    if args.is_empty() {
        return Err(arity_error("trigger", 0, loc));
    }
    let mut conv = ConvertedExpression::empty();
    for arg in args {
        let event = translate_value(ctx, arg, &mut conv)?;
        if event.ty != JavaType::Event {
            return Err(TranslationError::conversion(&event.ty, &JavaType::Event, "trigger", arg.loc));
        }
        conv.add_init(Stmt::expr(Expr::call(event, "trigger", vec![], JavaType::Void)));
    }
    Ok(conv)
}

fn translate_sprintf(ctx: &mut TranslationContext<'_, '_>, args: &[VeraExpr], loc: Loc) -> Result<ConvertedExpression> {
    let [dest, format, rest @ ..] = args else {
        return Err(arity_error("sprintf", args.len(), loc));
    };
    let mut conv = ConvertedExpression::empty();
    let lhs = translate_lhs(ctx, dest, Access::WRITE, &mut conv)?;
    let mut operands = vec![translate_argument(ctx, format, &JavaType::String)?];
    for arg in rest {
        operands.push(translate_argument(ctx, arg, &JavaType::Object)?);
    }
    let values = sequence(ctx, operands, &mut conv);
    let text = Expr::static_call(JUNO, "format", values, JavaType::String);
    let stored = store_conversion(ctx, text, &lhs.result_type(), false, loc)?;
    conv.add_inits(lhs.write(ctx, stored)?.flatten());
    Ok(conv)
}

// ============================================================================
// Methods on a receiver

fn translate_method(
    ctx: &mut TranslationContext<'_, '_>,
    name: &str,
    receiver: &VeraExpr,
    args: &[VeraExpr],
    expr: &VeraExpr,
) -> Result<ConvertedExpression> {
    let mut conv = ConvertedExpression::empty();
    let writes_back = matches!(name, "putc" | "itoa" | "delete") && receiver.is_assignable();
    let (value, lhs) = if writes_back {
        let lhs = translate_lhs(ctx, receiver, Access::READ_WRITE, &mut conv)?;
        (lhs.read(), Some(lhs))
    } else {
        (translate_value(ctx, receiver, &mut conv)?, None)
    };
    trace!("built-in method {} on {} at {}", name, value.ty, expr.loc);
    match value.ty.clone() {
        JavaType::JunoString | JavaType::String => {
            translate_string_method(ctx, name, value, lhs, args, conv, expr.loc)
        }
        JavaType::Array(_) => match (name, args) {
            ("size", []) => Ok(conv.with_value(Expr::field(Some(value), "length", JavaType::Int))),
            ("delete", []) => {
                let Some(lhs) = lhs else {
                    return Err(TranslationError::unsupported("delete on an array value", expr.loc));
                };
                let cleared = Expr::null(lhs.result_type());
                conv.add_inits(lhs.write(ctx, cleared)?.flatten());
                Ok(conv)
            }
            _ => Err(TranslationError::unsupported(format!("array method `{}`", name), expr.loc)),
        },
        JavaType::AssocArray { key, .. } => match (name, args) {
            ("size", []) => Ok(conv.with_value(Expr::call(value, "size", vec![], JavaType::Int))),
            ("delete", []) => {
                conv.add_init(Stmt::expr(Expr::call(value, "clear", vec![], JavaType::Void)));
                Ok(conv)
            }
            ("delete", [index]) => {
                let operands = vec![ConvertedExpression::of(value), translate_argument(ctx, index, &key)?];
                let values = sequence(ctx, operands, &mut conv);
                let [map, index] = <[Expr; 2]>::try_from(values)
                    .unwrap_or_else(|_| panic!("BUG: delete operands lost"));
                conv.add_init(Stmt::expr(Expr::call(map, "remove", vec![index], JavaType::Void)));
                Ok(conv)
            }
            _ => Err(TranslationError::unsupported(
                format!("associative array method `{}`", name),
                expr.loc,
            )),
        },
        other => Err(TranslationError::unsupported(format!("method `{}` on {}", name, other), expr.loc)),
    }
}

/// String methods. Mutable strings carry the method themselves; plain strings go
/// through `StringOp`, and mutators store the returned string back.
fn translate_string_method(
    ctx: &mut TranslationContext<'_, '_>,
    name: &str,
    receiver: Expr,
    lhs: Option<Lhs>,
    args: &[VeraExpr],
    mut conv: ConvertedExpression,
    loc: Loc,
) -> Result<ConvertedExpression> {
    let Some(method) = STRING_METHODS.get(name) else {
        return Err(TranslationError::unsupported(format!("string method `{}`", name), loc));
    };
    if args.len() < method.required || args.len() > method.params.len() {
        return Err(arity_error(name, args.len(), loc));
    }
    let stateful_receiver = receiver.ty == JavaType::JunoString;
    if method.stateful && !stateful_receiver {
        return Err(TranslationError::unsupported(
            format!("`{}` on a string without match state", name),
            loc,
        ));
    }
    let mut operands = vec![ConvertedExpression::of(receiver)];
    for (arg, ty) in args.iter().zip(&method.params) {
        operands.push(translate_argument(ctx, arg, ty)?);
    }
    let mut values = sequence(ctx, operands, &mut conv);
    let receiver = values.remove(0);

    if stateful_receiver {
        let call = Expr::call(receiver, name, values, method.ret.clone());
        return Ok(finish(conv, call));
    }
    let mut op_args = vec![receiver];
    op_args.extend(values);
    if !method.mutates {
        let call = Expr::static_call(STRING_OP, name, op_args, method.ret.clone());
        return Ok(finish(conv, call));
    }
    let Some(lhs) = lhs else {
        return Err(TranslationError::unsupported(
            format!("`{}` on a string that is not a variable", name),
            loc,
        ));
    };
    let updated = Expr::static_call(STRING_OP, name, op_args, JavaType::String);
    conv.add_inits(lhs.write(ctx, updated)?.flatten());
    Ok(conv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::TranslatorOptions;
    use crate::session::TranslationSession;
    use insta::assert_snapshot;
    use java_schema::{render_stmts_to_string, Block};
    use vera_model::{
        AnalysisResults, AssocKey, ClassDecl, ClassId, CompilationUnit, EnumDecl, EnumId, NodeId, VarDecl, VarId,
        VeraType,
    };

    fn e(kind: VeraExprKind, ty: VeraType) -> VeraExpr {
        VeraExpr::new(NodeId(0), kind, ty)
    }

    fn var(id: u32, ty: VeraType) -> VeraExpr {
        e(VeraExprKind::Var(VarId(id)), ty)
    }

    fn word(text: &str) -> VeraExpr {
        e(VeraExprKind::StringLiteral(text.into()), VeraType::String)
    }

    fn builtin(name: &str, receiver: Option<VeraExpr>, args: Vec<VeraExpr>) -> VeraExpr {
        e(
            VeraExprKind::BuiltinCall {
                name: name.into(),
                receiver: receiver.map(Box::new),
                args,
            },
            VeraType::Integer,
        )
    }

    fn table_type() -> VeraType {
        VeraType::AssocArray {
            element: Box::new(VeraType::Integer),
            key: AssocKey::BitVector,
        }
    }

    fn unit() -> CompilationUnit {
        let base = ClassDecl::new(ClassId(0), "base");
        let mut derived = ClassDecl::new(ClassId(1), "derived");
        derived.extends = Some(ClassId(0));
        CompilationUnit {
            name: "top".into(),
            enums: vec![EnumDecl::new(EnumId(0), "shape", &["circle", "square"])],
            classes: vec![base, derived],
            globals: vec![
                VarDecl::new(VarId(1), "msg", VeraType::String),
                VarDecl::new(VarId(2), "table", table_type()),
                VarDecl::new(VarId(3), "idx", VeraType::bit(64)),
                VarDecl::new(VarId(4), "count", VeraType::Integer),
                VarDecl::new(VarId(5), "shape_var", VeraType::Enum(EnumId(0))),
                VarDecl::new(VarId(6), "b", VeraType::Class(ClassId(0))),
                VarDecl::new(VarId(7), "d", VeraType::Class(ClassId(1))),
                VarDecl::new(VarId(8), "flag", VeraType::bit(1)),
            ],
            ..Default::default()
        }
    }

    fn facts() -> AnalysisResults {
        let mut facts = AnalysisResults::new();
        facts.mark_not_assigned_xz(VarId(4));
        facts
    }

    fn render(conv: ConvertedExpression) -> String {
        render_stmts_to_string(&Block::new(conv.flatten()))
    }

    fn with_ctx<T>(options: TranslatorOptions, f: impl FnOnce(&mut TranslationContext<'_, '_>) -> T) -> T {
        let unit = unit();
        let facts = facts();
        let mut session = TranslationSession::new(&unit, &facts, options);
        let mut ctx = TranslationContext::new(&mut session, None, true);
        f(&mut ctx)
    }

    fn translate(ctx: &mut TranslationContext<'_, '_>, call: &VeraExpr) -> Result<ConvertedExpression> {
        let VeraExprKind::BuiltinCall { name, receiver, args } = &call.kind else {
            unreachable!()
        };
        translate_builtin(ctx, name, receiver.as_deref(), args, call)
    }

    #[test]
    fn test_printf_maps_to_static_call() {
        let text = with_ctx(TranslatorOptions::default(), |ctx| {
            let call = builtin("printf", None, vec![word("%0d"), var(4, VeraType::Integer)]);
            render(translate(ctx, &call).unwrap())
        });
        assert_snapshot!(text, @r#"Juno.printf("%0d", Top.count);"#);
    }

    #[test]
    fn test_assert_counts_xz_as_failure() {
        let text = with_ctx(TranslatorOptions::default(), |ctx| {
            let call = builtin("assert", None, vec![var(8, VeraType::bit(1))]);
            render(translate(ctx, &call).unwrap())
        });
        assert!(text.starts_with("assert Top.flag.isTrue() : "), "{}", text);

        let options = TranslatorOptions {
            emit_assertions: false,
            ..TranslatorOptions::default()
        };
        let text = with_ctx(options, |ctx| {
            let call = builtin("assert", None, vec![var(8, VeraType::bit(1))]);
            render(translate(ctx, &call).unwrap())
        });
        assert_eq!(text, "");
    }

    #[test]
    fn test_assoc_first_writes_index_or_resets_it() {
        let text = with_ctx(TranslatorOptions::default(), |ctx| {
            let call = builtin(
                "assoc_index",
                None,
                vec![word("FIRST"), var(2, table_type()), var(3, VeraType::bit(64))],
            );
            let conv = translate(ctx, &call).unwrap();
            assert!(conv.is_optional_result());
            render(conv)
        });
        assert_snapshot!(text, @r"
        final BitVector key = Top.table.firstKey();
        if (key != null) {
            Top.idx = key;
        } else {
            Top.idx = BitVector.allX(64);
        }
        ");
    }

    #[test]
    fn test_assoc_next_into_int_keeps_index_when_missing() {
        let text = with_ctx(TranslatorOptions::default(), |ctx| {
            let call = builtin(
                "assoc_index",
                None,
                vec![word("NEXT"), var(2, table_type()), var(4, VeraType::Integer)],
            );
            render(translate(ctx, &call).unwrap())
        });
        assert!(text.contains("Top.table.nextKey("), "{}", text);
        assert!(text.contains("if (key != null) {"), "{}", text);
        assert!(!text.contains("else"), "{}", text);
    }

    #[test]
    fn test_assoc_first_without_location_uses_holder() {
        let text = with_ctx(TranslatorOptions::default(), |ctx| {
            let literal = e(VeraExprKind::IntegerLiteral(0), VeraType::Integer);
            let call = builtin("assoc_index", None, vec![word("FIRST"), var(2, table_type()), literal]);
            let conv = translate(ctx, &call).unwrap();
            java_schema::render_expr_to_string(conv.value().unwrap())
        });
        assert_snapshot!(text, @"Juno.assocFirst(Top.table, new BitVector[1])");
    }

    #[test]
    fn test_checked_cast_to_enum_poisons_with_undefined() {
        let text = with_ctx(TranslatorOptions::default(), |ctx| {
            let call = builtin(
                "cast_assign",
                None,
                vec![var(5, VeraType::Enum(EnumId(0))), var(4, VeraType::Integer), word("CHECK")],
            );
            let conv = translate(ctx, &call).unwrap();
            let (init, value, _) = conv.into_parts();
            assert_eq!(value, Some(Expr::local("ok", JavaType::Boolean)));
            render_stmts_to_string(&Block::new(init))
        });
        assert_snapshot!(text, @r"
        final Shape cast = Shape.forValueOrUndefined(Top.count);
        final boolean ok = cast != Shape.UNDEFINED;
        Top.shape_var = cast;
        ");
    }

    #[test]
    fn test_checked_downcast_tests_type() {
        let text = with_ctx(TranslatorOptions::default(), |ctx| {
            let call = builtin(
                "cast_assign",
                None,
                vec![var(7, VeraType::Class(ClassId(1))), var(6, VeraType::Class(ClassId(0))), word("CHECK")],
            );
            render(translate(ctx, &call).unwrap())
        });
        assert_snapshot!(text, @r"
        final boolean ok = Top.b == null || Top.b instanceof Derived;
        if (ok) {
            Top.d = (Derived) Top.b;
        } else {
            Top.d = null;
        }
        ");
    }

    #[test]
    fn test_cast_between_unrelated_types_is_rejected() {
        let err = with_ctx(TranslatorOptions::default(), |ctx| {
            let call = builtin(
                "cast_assign",
                None,
                vec![var(6, VeraType::Class(ClassId(0))), var(1, VeraType::String)],
            );
            translate(ctx, &call).unwrap_err()
        });
        assert!(matches!(err, TranslationError::Conversion { .. }));
    }

    #[test]
    fn test_string_mutator_writes_back() {
        let text = with_ctx(TranslatorOptions::default(), |ctx| {
            let int = |v| e(VeraExprKind::IntegerLiteral(v), VeraType::Integer);
            let call = builtin("putc", Some(var(1, VeraType::String)), vec![int(0), int(65)]);
            render(translate(ctx, &call).unwrap())
        });
        assert_snapshot!(text, @"Top.msg = StringOp.putc(Top.msg, 0, 65);");
    }

    #[test]
    fn test_unknown_builtin_is_unsupported() {
        let err = with_ctx(TranslatorOptions::default(), |ctx| {
            translate(ctx, &builtin("mailbox_get", None, vec![])).unwrap_err()
        });
        assert!(matches!(err, TranslationError::Unsupported { .. }));
        assert!(is_builtin("printf"));
        assert!(!is_builtin("mailbox_get"));
    }
}
