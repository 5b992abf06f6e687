// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Per-method translation state
//!
//! A `TranslationContext` lives for the translation of one method body. It borrows the
//! session and carries what nested statements need to see: the enclosing class, the
//! variable map, open name scopes and the stack of enclosing loop and switch frames
//! used to resolve `break` and `continue`.

use crate::error::{Result, TranslationError};
use crate::session::TranslationSession;
use crate::var_info::{VarAccess, VarInfo, VarInfoMap};
use java_schema::{Expr, JavaType, NameScopes, Stmt};
use vera_model::{ClassId, Loc, VarId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Loop,
    Switch,
}

/// One enclosing breakable construct. Labels are only created when a jump needs them.
#[derive(Debug, Clone)]
pub struct Frame {
    pub kind: FrameKind,
    pub label: Option<String>,
    /// Label of the block wrapping the body of a rewritten loop; `continue` becomes a
    /// break out of that block so the hoisted guard still runs
    pub continue_label: Option<String>,
    /// The loop was rewritten to `while (true)` with the guard at the end of the body
    pub rewritten: bool,
}

pub struct TranslationContext<'s, 'a> {
    pub session: &'s mut TranslationSession<'a>,
    pub class: Option<ClassId>,
    pub is_static: bool,
    pub return_type: JavaType,
    pub names: NameScopes,
    pub vars: VarInfoMap,
    frames: Vec<Frame>,
    label_count: usize,
}

impl<'s, 'a> TranslationContext<'s, 'a> {
    pub fn new(session: &'s mut TranslationSession<'a>, class: Option<ClassId>, is_static: bool) -> Self {
        Self {
            session,
            class,
            is_static,
            return_type: JavaType::Void,
            names: NameScopes::new(),
            vars: VarInfoMap::new(),
            frames: vec![],
            label_count: 0,
        }
    }

    pub fn this_type(&self) -> Option<JavaType> {
        self.class.map(|c| JavaType::Class(self.session.class_name(c)))
    }

    // === Variables ===

    /// How `id` is reached from the current scope
    pub fn var_info(&mut self, id: VarId) -> VarInfo {
        if let Some(info) = self.vars.get(&id) {
            return info.clone();
        }
        let name = self.session.var_name(id);
        let ty = self.session.var_type(id);
        let is_static = self.session.symbols.var(id).is_static;
        let access = match self.session.symbols.field_owner(id) {
            Some(owner) if is_static => VarAccess::StaticField {
                class: self.session.class_name(owner),
                name,
            },
            Some(_) => VarAccess::Field(name),
            None if self.session.is_global(id) => VarAccess::StaticField {
                class: self.session.unit_class.clone(),
                name,
            },
            None => panic!("BUG: local {} used outside its declaring scope", id),
        };
        let event = self.member_event(id, None);
        VarInfo { access, ty, event }
    }

    /// Companion event of a field or global, reached through `target` for members of
    /// another object
    pub fn member_event(&mut self, id: VarId, target: Option<Expr>) -> Option<Expr> {
        if !self.session.facts.is_wait_var(id) {
            return None;
        }
        let name = self.session.event_name(id);
        let is_static = self.session.symbols.var(id).is_static;
        Some(match self.session.symbols.field_owner(id) {
            Some(owner) if is_static => {
                Expr::static_field(self.session.class_name(owner), name, JavaType::Event)
            }
            Some(_) => Expr::field(target, name, JavaType::Event),
            None => Expr::static_field(self.session.unit_class.clone(), name, JavaType::Event),
        })
    }

    pub fn bind(&mut self, id: VarId, info: VarInfo) {
        self.vars.insert(id, info);
    }

    // === Scopes and temporaries ===

    /// Run `f` inside a fresh name scope. Variable bindings made inside are dropped.
    pub fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let saved = self.vars.clone();
        self.names.push();
        let result = f(self);
        self.names.pop();
        self.vars = saved;
        result
    }

    /// Declare `final T base = value;` under a fresh name and return a reference to it
    pub fn declare_temp(&mut self, base: &str, value: Expr) -> (Stmt, Expr) {
        let name = self.names.fresh(base);
        let ty = value.ty.clone();
        (Stmt::final_local(ty.clone(), name.clone(), value), Expr::local(name, ty))
    }

    /// Mutable counterpart of `declare_temp`
    pub fn declare_var(&mut self, base: &str, ty: JavaType, value: Option<Expr>) -> (Stmt, Expr) {
        let name = self.names.fresh(base);
        (Stmt::local(ty.clone(), name.clone(), value), Expr::local(name, ty))
    }

    /// Capture `value` in a temporary unless re-evaluating it is free
    pub fn capture(&mut self, base: &str, value: Expr, init: &mut Vec<Stmt>) -> Expr {
        if value.is_simple() {
            return value;
        }
        let (decl, reference) = self.declare_temp(base, value);
        init.push(decl);
        reference
    }

    // === Loop and switch frames ===

    pub fn push_frame(&mut self, kind: FrameKind, rewritten: bool) {
        self.frames.push(Frame {
            kind,
            label: None,
            continue_label: None,
            rewritten,
        });
    }

    pub fn pop_frame(&mut self) -> Frame {
        match self.frames.pop() {
            Some(frame) => frame,
            None => panic!("BUG: popping an empty frame stack"),
        }
    }

    /// Forked code cannot jump out of its thread, so it starts with no frames
    pub fn take_frames(&mut self) -> Vec<Frame> {
        std::mem::take(&mut self.frames)
    }

    pub fn restore_frames(&mut self, frames: Vec<Frame>) {
        self.frames = frames;
    }

    fn fresh_label(&mut self, base: &str) -> String {
        self.label_count += 1;
        format!("{}{}", base, self.label_count)
    }

    /// Java statement for a source `break`, which always leaves the innermost loop
    pub fn break_stmt(&mut self, loc: Loc) -> Result<Stmt> {
        let Some(loop_index) = self.frames.iter().rposition(|f| f.kind == FrameKind::Loop) else {
            return Err(TranslationError::unsupported("break outside of a loop", loc));
        };
        if loop_index + 1 == self.frames.len() {
            return Ok(Stmt::Break(None));
        }
        // A switch sits between the break and its loop
        let label = match &self.frames[loop_index].label {
            Some(label) => label.clone(),
            None => {
                let label = self.fresh_label("loop");
                self.frames[loop_index].label = Some(label.clone());
                label
            }
        };
        Ok(Stmt::Break(Some(label)))
    }

    pub fn continue_stmt(&mut self, loc: Loc) -> Result<Stmt> {
        let Some(loop_index) = self.frames.iter().rposition(|f| f.kind == FrameKind::Loop) else {
            return Err(TranslationError::unsupported("continue outside of a loop", loc));
        };
        if !self.frames[loop_index].rewritten {
            return Ok(Stmt::Continue(None));
        }
        let label = match &self.frames[loop_index].continue_label {
            Some(label) => label.clone(),
            None => {
                let label = self.fresh_label("next");
                self.frames[loop_index].continue_label = Some(label.clone());
                label
            }
        };
        Ok(Stmt::Break(Some(label)))
    }
}
