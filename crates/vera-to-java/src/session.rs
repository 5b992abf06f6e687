// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Translation session
//!
//! One session translates one compilation unit. It owns everything shared by the
//! translation of the unit's methods: options, the analysis oracle, the symbol table,
//! the target schema, a cache of translated source types, and collected warnings. No
//! state outlives the session, so independent units never observe each other.

use crate::error::{TranslationWarning, WarningKind};
use crate::options::TranslatorOptions;
use java_schema::naming::{capitalize_first, escape_identifier};
use java_schema::{ClassInfo, JavaType, MethodSig, Schema, SignalKind};
use log::{trace, warn};
use std::collections::{HashMap, HashSet};
use vera_model::{
    AnalysisFacts, AssocKey, ClassId, CompilationUnit, EnumId, FuncId, FunctionDecl, Loc, SignalDirection,
    SymbolTable, VarId, VeraType,
};

pub struct TranslationSession<'a> {
    pub options: TranslatorOptions,
    pub facts: &'a dyn AnalysisFacts,
    pub symbols: SymbolTable,
    pub schema: Schema,
    /// Name of the top-level class holding globals, global functions and `run()`
    pub unit_class: String,
    globals: HashSet<VarId>,
    /// Owning function and position of every parameter
    params: HashMap<VarId, (FuncId, usize)>,
    type_cache: HashMap<VeraType, JavaType>,
    var_types: HashMap<VarId, JavaType>,
    warnings: Vec<TranslationWarning>,
}

impl<'a> TranslationSession<'a> {
    pub fn new(unit: &CompilationUnit, facts: &'a dyn AnalysisFacts, options: TranslatorOptions) -> Self {
        let unit_class = options
            .unit_class
            .clone()
            .unwrap_or_else(|| capitalize_first(&escape_identifier(&unit.name)));
        let functions = unit
            .functions
            .iter()
            .chain(unit.classes.iter().flat_map(|c| c.methods.iter()));
        let params = functions
            .flat_map(|f| f.params.iter().enumerate().map(move |(i, p)| (p.var.id, (f.id, i))))
            .collect();
        let mut session = Self {
            options,
            facts,
            symbols: SymbolTable::new(unit),
            schema: Schema::new(),
            unit_class,
            globals: unit.globals.iter().map(|g| g.id).collect(),
            params,
            type_cache: HashMap::new(),
            var_types: HashMap::new(),
            warnings: vec![],
        };
        session.register_unit(unit);
        session
    }

    /// Add the unit's enums, classes and global functions to the schema so calls and
    /// casts see the class hierarchy and every overload before any body is translated
    fn register_unit(&mut self, unit: &CompilationUnit) {
        for decl in &unit.enums {
            let name = self.enum_name(decl.id);
            let mut info = ClassInfo::new(&name)
                .with_method(MethodSig::new("forValue", vec![JavaType::Int], JavaType::Enum(name.clone())).with_static())
                .with_method(
                    MethodSig::new("forValueOrUndefined", vec![JavaType::Int], JavaType::Enum(name.clone())).with_static(),
                )
                .with_method(MethodSig::new("getValue", vec![], JavaType::Int));
            info.is_enum = true;
            self.schema.add_class(info);
        }
        for class in &unit.classes {
            let name = self.class_name(class.id);
            let mut info = ClassInfo::new(&name);
            if let Some(parent) = class.extends {
                info = info.extending(self.class_name(parent));
            }
            for method in &class.methods {
                let sig = self.signature(method);
                if method.is_constructor() {
                    info = info.with_constructor(sig.params);
                } else {
                    info = info.with_method(sig);
                }
            }
            self.schema.add_class(info);
        }
        let mut info = ClassInfo::new(&self.unit_class);
        for func in &unit.functions {
            info = info.with_method(self.signature(func).with_static());
        }
        self.schema.add_class(info);
    }

    fn signature(&mut self, func: &FunctionDecl) -> MethodSig {
        let params = (0..func.params.len()).map(|i| self.param_type(func.id, i)).collect();
        let return_type = if func.is_constructor() {
            JavaType::Void
        } else {
            self.return_type(func.id)
        };
        let sig = MethodSig::new(self.method_name(func.id), params, return_type);
        if func.is_static {
            sig.with_static()
        } else {
            sig
        }
    }

    // === Names ===

    pub fn class_name(&self, id: ClassId) -> String {
        capitalize_first(&escape_identifier(&self.symbols.class(id).name))
    }

    pub fn enum_name(&self, id: EnumId) -> String {
        capitalize_first(&escape_identifier(&self.symbols.enum_decl(id).name))
    }

    pub fn var_name(&self, id: VarId) -> String {
        escape_identifier(&self.symbols.var(id).name)
    }

    /// Companion event of a `wait_var` target
    pub fn event_name(&self, id: VarId) -> String {
        format!("{}_event", self.symbols.var(id).name)
    }

    /// Java name of a function or method. Non-virtual overrides are renamed so Java's
    /// virtual dispatch does not reach them through a superclass reference.
    pub fn method_name(&self, id: FuncId) -> String {
        let func = self.symbols.function(id);
        let base = escape_identifier(&func.name);
        match func.class {
            Some(class) if self.facts.is_non_virtual_override(id) => {
                format!("{}_{}", base, self.symbols.class(class).name)
            }
            _ => base,
        }
    }

    // === Types ===

    /// Target type of a source type, before any per-variable narrowing
    pub fn translate_type(&mut self, ty: &VeraType) -> JavaType {
        if let Some(cached) = self.type_cache.get(ty) {
            return cached.clone();
        }
        let translated = match ty {
            VeraType::Void => JavaType::Void,
            VeraType::Integer => JavaType::Integer,
            VeraType::Bit { width: Some(1), .. } => JavaType::Bit,
            VeraType::Bit { width, .. } => JavaType::BitVector(*width),
            VeraType::String => JavaType::String,
            VeraType::Enum(id) => JavaType::Enum(self.enum_name(*id)),
            VeraType::Class(id) => JavaType::Class(self.class_name(*id)),
            VeraType::Event => JavaType::Event,
            VeraType::FixedArray { element, dims } => {
                let element = self.translate_type(element);
                dims.iter().fold(element, |acc, _| JavaType::array_of(acc))
            }
            VeraType::DynamicArray(element) => JavaType::array_of(self.translate_type(element)),
            VeraType::AssocArray { element, key } => JavaType::AssocArray {
                key: Box::new(match key {
                    AssocKey::BitVector => JavaType::BitVector(Some(64)),
                    AssocKey::String => JavaType::String,
                }),
                value: Box::new(self.translate_type(element)),
            },
            VeraType::Signal { width, direction } => JavaType::Signal {
                width: *width,
                kind: match direction {
                    SignalDirection::Input => SignalKind::Input,
                    SignalDirection::Output => SignalKind::Output,
                    SignalDirection::InOut => SignalKind::InOut,
                },
            },
            VeraType::Null => JavaType::Null,
        };
        trace!("type {} -> {}", ty, translated);
        self.type_cache.insert(ty.clone(), translated.clone());
        translated
    }

    /// Narrow a four-valued type to its two-valued form when X/Z cannot occur
    fn narrow(ty: JavaType, xz_free: bool) -> JavaType {
        match ty {
            JavaType::Integer if xz_free => JavaType::Int,
            JavaType::Bit if xz_free => JavaType::Boolean,
            JavaType::Array(element) => JavaType::array_of(Self::narrow(*element, xz_free)),
            other => other,
        }
    }

    /// Value type of a variable, with the analysis facts applied
    pub fn var_type(&mut self, id: VarId) -> JavaType {
        if let Some(cached) = self.var_types.get(&id) {
            return cached.clone();
        }
        let decl_ty = self.symbols.var(id).ty.clone();
        let mut xz_free = self.facts.is_not_assigned_xz(id);
        if let Some((func, index)) = self.params.get(&id) {
            xz_free &= !self.facts.may_arg_be_xz(*func, *index);
        }
        let mut ty = Self::narrow(self.translate_type(&decl_ty), xz_free);
        if ty == JavaType::String && self.facts.is_need_stateful_string(id) {
            ty = JavaType::JunoString;
        }
        self.var_types.insert(id, ty.clone());
        ty
    }

    pub fn is_global(&self, id: VarId) -> bool {
        self.globals.contains(&id)
    }

    pub fn is_param(&self, id: VarId) -> bool {
        self.params.contains_key(&id)
    }

    /// Whether a local must live in a single-element array so that closures and callees
    /// can write it
    pub fn needs_holder(&mut self, id: VarId) -> bool {
        let decl = self.symbols.var(id);
        if decl.is_shadow || decl.is_static || self.symbols.field_owner(id).is_some() || self.is_global(id) {
            return false;
        }
        if self.var_type(id).has_mutable_reference_semantics() {
            return false;
        }
        self.facts.is_passed_by_ref_nva(id)
            || self.facts.is_fork_write(id)
            || (self.facts.is_fork_read(id) && self.facts.is_write_access(id))
    }

    /// Declared Java type of parameter `index` of `func`, holder arrays included. Only
    /// `var` parameters take a holder from the caller; a by-value parameter that needs
    /// one inside the callee is copied into it there.
    pub fn param_type(&mut self, func: FuncId, index: usize) -> JavaType {
        let param = &self.symbols.function(func).params[index];
        let (id, by_ref) = (param.var.id, param.by_ref);
        let ty = self.var_type(id);
        if by_ref && !ty.has_mutable_reference_semantics() {
            JavaType::array_of(ty)
        } else {
            ty
        }
    }

    /// Parameter is stored in a holder array inside the callee
    pub fn is_holder_param(&mut self, func: FuncId, index: usize) -> bool {
        let ty = self.param_type(func, index);
        let id = self.symbols.function(func).params[index].var.id;
        ty.is_array() && !self.var_type(id).is_array()
    }

    pub fn return_type(&mut self, func: FuncId) -> JavaType {
        let ty = self.symbols.function(func).return_type.clone();
        let translated = self.translate_type(&ty);
        Self::narrow(translated, !self.facts.may_return_xz(func))
    }

    // === Warnings ===

    pub fn warn(&mut self, kind: WarningKind, message: impl Into<String>, loc: Loc) {
        let warning = TranslationWarning {
            kind,
            message: message.into(),
            loc,
        };
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[TranslationWarning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<TranslationWarning> {
        self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vera_model::{AnalysisResults, ParamDecl, VarDecl};

    fn unit() -> CompilationUnit {
        let params = vec![
            ParamDecl::new(VarDecl::new(VarId(10), "count", VeraType::Integer)).by_ref(),
            ParamDecl::new(VarDecl::new(VarId(11), "name", VeraType::String)).by_ref(),
        ];
        CompilationUnit {
            name: "top".into(),
            globals: vec![
                VarDecl::new(VarId(1), "flag", VeraType::bit(1)),
                VarDecl::new(VarId(2), "data", VeraType::bit(8)),
                VarDecl::new(VarId(3), "msg", VeraType::String),
            ],
            functions: vec![FunctionDecl::function(FuncId(0), "step", VeraType::Integer).with_params(params)],
            ..Default::default()
        }
    }

    #[test]
    fn test_facts_narrow_types() {
        let mut facts = AnalysisResults::new();
        facts.mark_not_assigned_xz(VarId(1)).mark_stateful_string(VarId(3));
        let mut session = TranslationSession::new(&unit(), &facts, TranslatorOptions::default());
        assert_eq!(session.unit_class, "Top");
        assert_eq!(session.var_type(VarId(1)), JavaType::Boolean);
        assert_eq!(session.var_type(VarId(2)).bit_width(), Some(8));
        assert_eq!(session.var_type(VarId(3)), JavaType::JunoString);
        assert_eq!(session.return_type(FuncId(0)), JavaType::Integer);
    }

    #[test]
    fn test_by_ref_params_use_holders_unless_mutable() {
        let facts = AnalysisResults::new();
        let mut session = TranslationSession::new(&unit(), &facts, TranslatorOptions::default());
        assert_eq!(session.param_type(FuncId(0), 0), JavaType::array_of(JavaType::Integer));
        assert!(session.is_holder_param(FuncId(0), 0));
        // Plain strings are immutable values in Java, so they still need a holder
        assert!(session.is_holder_param(FuncId(0), 1));
    }
}
