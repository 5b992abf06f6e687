// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Declaration rendering

use super::expr::render_expr;
use super::stmt::{render_block_body, render_stmts};
use super::writer::JavaWriter;
use crate::decl::{ClassDecl, ClassKind, CompilationUnit, FieldDecl, MethodDecl, Modifiers};

pub fn render_compilation_unit(unit: &CompilationUnit, w: &mut JavaWriter) {
    if let Some(package) = &unit.package {
        w.line_fmt(format_args!("package {};", package));
        w.newline();
    }
    if !unit.imports.is_empty() {
        for import in &unit.imports {
            w.line_fmt(format_args!("import {};", import));
        }
        w.newline();
    }
    for (i, class) in unit.classes.iter().enumerate() {
        if i > 0 {
            w.newline();
        }
        render_class(class, w);
    }
}

fn render_modifiers(modifiers: &Modifiers, w: &mut JavaWriter) {
    if let Some(keyword) = modifiers.visibility.keyword() {
        write!(w, "{} ", keyword);
    }
    if modifiers.is_abstract {
        w.write("abstract ");
    }
    if modifiers.is_static {
        w.write("static ");
    }
    if modifiers.is_final {
        w.write("final ");
    }
}

pub fn render_class(class: &ClassDecl, w: &mut JavaWriter) {
    render_modifiers(&class.modifiers, w);
    match &class.kind {
        ClassKind::Class => write!(w, "class {}", class.name),
        ClassKind::Enum(_) => write!(w, "enum {}", class.name),
    }
    if let Some(extends) = &class.extends {
        write!(w, " extends {}", extends);
    }
    w.open_brace();

    let mut sections = 0;
    if let ClassKind::Enum(constants) = &class.kind {
        for (i, constant) in constants.iter().enumerate() {
            w.write(&constant.name);
            if !constant.args.is_empty() {
                w.write("(");
                w.sep_with(", ", &constant.args, |w, arg| render_expr(arg, w));
                w.write(")");
            }
            w.line(if i + 1 == constants.len() { ";" } else { "," });
        }
        sections += 1;
    }

    if !class.fields.is_empty() {
        if sections > 0 {
            w.newline();
        }
        for field in &class.fields {
            render_field(field, w);
        }
        sections += 1;
    }

    if !class.static_init.is_empty() {
        if sections > 0 {
            w.newline();
        }
        w.write("static");
        w.open_brace();
        render_stmts(&class.static_init, w);
        w.close_brace();
        w.newline();
        sections += 1;
    }

    for method in &class.methods {
        if sections > 0 {
            w.newline();
        }
        render_method(method, &class.name, w);
        sections += 1;
    }

    for nested in &class.nested {
        if sections > 0 {
            w.newline();
        }
        render_class(nested, w);
        sections += 1;
    }

    w.close_brace();
    w.newline();
}

fn render_field(field: &FieldDecl, w: &mut JavaWriter) {
    render_modifiers(&field.modifiers, w);
    write!(w, "{} {}", field.ty, field.name);
    if let Some(init) = &field.init {
        w.write(" = ");
        render_expr(init, w);
    }
    w.line(";");
}

pub fn render_method(method: &MethodDecl, class_name: &str, w: &mut JavaWriter) {
    render_modifiers(&method.modifiers, w);
    if method.is_constructor {
        w.write(class_name);
    } else {
        write!(w, "{} {}", method.return_type, method.name);
    }
    w.write("(");
    let count = method.params.len();
    w.sep_with(", ", method.params.iter().enumerate(), |w, (i, param)| {
        match (&param.ty, method.is_varargs && i + 1 == count) {
            (crate::types::JavaType::Array(element), true) => write!(w, "{}... {}", element, param.name),
            (ty, _) => write!(w, "{} {}", ty, param.name),
        }
    });
    w.write(")");
    match &method.body {
        Some(body) => {
            render_block_body(body, w);
            w.newline();
        }
        None => w.line(";"),
    }
}
