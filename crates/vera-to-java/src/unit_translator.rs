// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Compilation unit translation
//!
//! A Vera unit becomes one Java source file holding a single public class named after
//! the unit. Globals and global functions are its static members, the `program` block
//! is its `run()` method, and Vera enums and classes are static nested types.

use crate::context::TranslationContext;
use crate::converted_expression::ConvertedExpression;
use crate::error::{Result, TranslationError, TranslationWarning};
use crate::options::TranslatorOptions;
use crate::session::TranslationSession;
use crate::translation::assignment_translator::store_conversion;
use crate::translation::expression_translator::{translate_value_with, Expected};
use crate::translation::function_translator::{member_visibility, translate_function, translate_program};
use crate::translation::initial_value;
use java_schema::naming::escape_identifier;
use java_schema::runtime::{RUNTIME_PACKAGE, UNDEFINED};
use java_schema::{
    BinaryOp, Block, ClassDecl, ClassKind, CompilationUnit as JavaUnit, EnumConstant, Expr, FieldDecl, JavaType,
    MethodDecl, Modifiers, Param, Stmt, SwitchCase,
};
use log::{debug, info};
use std::collections::BTreeSet;
use vera_model::{AnalysisFacts, ClassDecl as VeraClass, CompilationUnit, EnumDecl, VarDecl};

/// Java source produced for one compilation unit
#[derive(Debug, Clone)]
pub struct TranslationOutput {
    pub unit: JavaUnit,
    pub warnings: Vec<TranslationWarning>,
}

impl TranslationOutput {
    pub fn render(&self) -> String {
        java_schema::render_unit(&self.unit)
    }
}

/// Translate one compilation unit. Translation is all or nothing: the first error
/// aborts the unit.
pub fn translate_unit(
    unit: &CompilationUnit,
    facts: &dyn AnalysisFacts,
    options: TranslatorOptions,
) -> Result<TranslationOutput> {
    info!("translating unit `{}`", unit.name);
    let package = options.package.clone();
    let mut session = TranslationSession::new(unit, facts, options);
    let mut main = ClassDecl::new(session.unit_class.clone());

    for decl in &unit.enums {
        main.nested.push(translate_enum(&session, decl));
    }
    for class in &unit.classes {
        main.nested.push(translate_class(&mut session, class)?);
    }
    for global in &unit.globals {
        let mut ctx = TranslationContext::new(&mut session, None, true);
        let target = Expr::static_field(ctx.session.unit_class.clone(), ctx.session.var_name(global.id), ctx.session.var_type(global.id));
        let (fields, init) = translate_field(&mut ctx, global, true, target)?;
        main.fields.extend(fields);
        main.static_init.extend(init);
    }
    for func in &unit.functions {
        main.methods.push(translate_function(&mut session, func)?);
    }
    if let Some(program) = &unit.program {
        main.methods.push(translate_program(&mut session, program)?);
    }

    let warnings = session.into_warnings();
    debug!("unit `{}` done with {} warnings", unit.name, warnings.len());
    Ok(TranslationOutput {
        unit: JavaUnit {
            package,
            imports: vec![format!("{}.*", RUNTIME_PACKAGE), "java.util.Objects".to_string()],
            classes: vec![main],
        },
        warnings,
    })
}

// ============================================================================
// Fields

/// Field declarations for `decl` (the variable and its change event) and the
/// statements a static initializer needs when the initial value takes statements
fn translate_field(
    ctx: &mut TranslationContext<'_, '_>,
    decl: &VarDecl,
    is_static: bool,
    target: Expr,
) -> Result<(Vec<FieldDecl>, Vec<Stmt>)> {
    let name = ctx.session.var_name(decl.id);
    let ty = ctx.session.var_type(decl.id);
    let visibility = member_visibility(ctx.session, decl.visibility, &decl.name, decl.loc);
    let modifiers = Modifiers {
        visibility,
        is_static,
        ..Modifiers::default()
    };

    let mut static_init = vec![];
    let init = match &decl.init {
        None => Some(initial_value(&decl.ty, &ty)),
        Some(source) => {
            let mut conv = ConvertedExpression::empty();
            let value = translate_value_with(ctx, source, &Expected::of(&ty), &mut conv)?;
            let value = store_conversion(ctx, value, &ty, source.ty.is_signed(), source.loc)?;
            if !conv.has_statements() {
                Some(value)
            } else if is_static {
                let (init, _, update) = conv.into_parts();
                static_init.extend(init);
                static_init.push(Stmt::expr(Expr::assign(target, value)));
                static_init.extend(update);
                None
            } else {
                return Err(TranslationError::unsupported(
                    "instance field initializer with side effects",
                    source.loc,
                ));
            }
        }
    };

    let mut fields = vec![FieldDecl {
        modifiers,
        ty,
        name,
        init,
    }];
    if ctx.session.facts.is_wait_var(decl.id) {
        fields.push(FieldDecl {
            modifiers: Modifiers {
                is_static,
                ..Modifiers::public().with_final()
            },
            ty: JavaType::Event,
            name: ctx.session.event_name(decl.id),
            init: Some(Expr::new_object(JavaType::Event, vec![])),
        });
    }
    Ok((fields, static_init))
}

// ============================================================================
// Classes

fn translate_class(session: &mut TranslationSession<'_>, class: &VeraClass) -> Result<ClassDecl> {
    debug!("translating class `{}`", class.name);
    let name = session.class_name(class.id);
    let mut decl = ClassDecl::new(name.clone());
    decl.modifiers = Modifiers::public().with_static();
    decl.extends = class.extends.map(|parent| session.class_name(parent));

    let this = Expr::this(JavaType::Class(name.clone()));
    for field in &class.fields {
        let mut ctx = TranslationContext::new(session, Some(class.id), field.is_static);
        let target = if field.is_static {
            Expr::static_field(name.clone(), ctx.session.var_name(field.id), ctx.session.var_type(field.id))
        } else {
            Expr::field(Some(this.clone()), ctx.session.var_name(field.id), ctx.session.var_type(field.id))
        };
        let (fields, init) = translate_field(&mut ctx, field, field.is_static, target)?;
        decl.fields.extend(fields);
        decl.static_init.extend(init);
    }
    for method in &class.methods {
        decl.methods.push(translate_function(session, method)?);
    }
    Ok(decl)
}

// ============================================================================
// Enums

/// Java enum with the integer value of every enumerator, the `UNDEFINED` sentinel,
/// and `forValue`/`forValueOrUndefined` lookups
fn translate_enum(session: &TranslationSession<'_>, decl: &EnumDecl) -> ClassDecl {
    let name = session.enum_name(decl.id);
    let ty = JavaType::Enum(name.clone());
    debug!("translating enum `{}`", name);

    let mut constants: Vec<EnumConstant> = decl
        .values
        .iter()
        .map(|v| EnumConstant {
            name: escape_identifier(&v.name),
            args: vec![Expr::int(v.value as i32)],
        })
        .collect();
    let undefined_value = decl.values.iter().map(|v| v.value).min().map_or(-1, |min| min.min(0) - 1);
    constants.push(EnumConstant {
        name: UNDEFINED.to_string(),
        args: vec![Expr::int(undefined_value as i32)],
    });

    let mut class = ClassDecl::new(name.clone());
    class.modifiers = Modifiers::public().with_static();
    class.kind = ClassKind::Enum(constants);
    class.fields.push(FieldDecl {
        modifiers: Modifiers::private().with_final(),
        ty: JavaType::Int,
        name: "value".into(),
        init: None,
    });

    let value = Expr::local("value", JavaType::Int);
    let this_value = Expr::field(Some(Expr::this(ty.clone())), "value", JavaType::Int);
    let mut ctor = MethodDecl::constructor(
        name.clone(),
        vec![Param::new(JavaType::Int, "value")],
        Block::new(vec![Stmt::expr(Expr::assign(this_value, value.clone()))]),
    );
    ctor.modifiers = Modifiers::private();
    class.methods.push(ctor);
    class.methods.push(MethodDecl::new(
        "getValue",
        JavaType::Int,
        vec![],
        Block::new(vec![Stmt::Return(Some(value.clone()))]),
    ));

    // Aliased values resolve to the first enumerator declared with them
    let mut seen = BTreeSet::new();
    let cases: Vec<SwitchCase> = decl
        .values
        .iter()
        .filter(|v| seen.insert(v.value))
        .map(|v| SwitchCase {
            labels: vec![Expr::int(v.value as i32)],
            body: vec![Stmt::Return(Some(Expr::local(escape_identifier(&v.name), ty.clone())))],
        })
        .collect();
    let lookup = |name: &str, fallback: Stmt| {
        let switch = Stmt::Switch {
            selector: value.clone(),
            cases: cases.clone(),
            default: None,
        };
        let mut method = MethodDecl::new(
            name,
            ty.clone(),
            vec![Param::new(JavaType::Int, "value")],
            Block::new(vec![switch, fallback]),
        );
        method.modifiers = Modifiers::public().with_static();
        method
    };
    let message = Expr::binary(
        BinaryOp::Add,
        Expr::string(format!("no {} with value ", name)),
        value.clone(),
        JavaType::String,
    );
    let exception = JavaType::Class("IllegalArgumentException".into());
    class
        .methods
        .push(lookup("forValue", Stmt::Throw(Expr::new_object(exception, vec![message]))));
    class.methods.push(lookup(
        "forValueOrUndefined",
        Stmt::Return(Some(Expr::local(UNDEFINED, ty.clone()))),
    ));
    class
}

#[cfg(test)]
mod tests {
    use super::*;
    use java_schema::Visibility as JavaVisibility;
    use vera_model::{AnalysisResults, ClassId, EnumId, FuncId, FunctionDecl, VarId, VeraType, Visibility};

    fn unit() -> CompilationUnit {
        let mut base = VeraClass::new(ClassId(0), "packet");
        let mut len = VarDecl::new(VarId(2), "len", VeraType::Integer);
        len.visibility = Visibility::Local;
        base.fields = vec![len, VarDecl::new(VarId(3), "done", VeraType::Event)];
        let mut derived = VeraClass::new(ClassId(1), "long_packet");
        derived.extends = Some(ClassId(0));
        CompilationUnit {
            name: "top".into(),
            enums: vec![EnumDecl::new(EnumId(0), "mode", &["read", "write"])],
            classes: vec![base, derived],
            globals: vec![VarDecl::new(VarId(1), "count", VeraType::Integer)],
            functions: vec![FunctionDecl::task(FuncId(0), "reset")],
            program: Some(vera_model::Block::new(vec![])),
            ..Default::default()
        }
    }

    fn translate(facts: &AnalysisResults) -> TranslationOutput {
        translate_unit(&unit(), facts, TranslatorOptions::default()).unwrap()
    }

    #[test]
    fn test_unit_layout() {
        let output = translate(&AnalysisResults::new());
        let main = &output.unit.classes[0];
        assert_eq!(main.name, "Top");
        assert_eq!(
            main.nested.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            vec!["Mode", "Packet", "Long_packet"]
        );
        assert_eq!(main.nested_class("Long_packet").unwrap().extends.as_deref(), Some("Packet"));
        assert!(main.method("reset").unwrap().modifiers.is_static);
        assert!(main.method("run").is_some());
        let text = output.render();
        assert!(text.starts_with("import juno.runtime.*;\nimport java.util.Objects;\n\npublic class Top {\n"));
        assert!(text.contains("    public static Integer count = null;\n"), "{}", text);
    }

    #[test]
    fn test_enum_lookups() {
        let output = translate(&AnalysisResults::new());
        let text = output.render();
        assert!(text.contains("        read(0),\n        write(1),\n        UNDEFINED(-1);\n"), "{}", text);
        assert!(text.contains("        public static Mode forValueOrUndefined(int value) {\n"), "{}", text);
        assert!(text.contains("throw new IllegalArgumentException(\"no Mode with value \" + value);"), "{}", text);
    }

    #[test]
    fn test_wait_var_field_gets_event_and_local_is_private() {
        let mut facts = AnalysisResults::new();
        facts.mark_wait_var(VarId(2));
        let output = translate(&facts);
        let packet = output.unit.classes[0].nested_class("Packet").unwrap();
        assert_eq!(packet.field("len").unwrap().modifiers.visibility, JavaVisibility::Private);
        let event = packet.field("len_event").unwrap();
        assert!(event.modifiers.is_final && !event.modifiers.is_static);
        // The event-typed field itself is a plain field
        assert_eq!(packet.field("done").unwrap().ty, JavaType::Event);
        assert_eq!(output.warnings.len(), 2, "{:?}", output.warnings);
    }
}
