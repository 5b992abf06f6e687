// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Class schema
//!
//! Registry of every class visible to translated code: the runtime library and the
//! classes produced from the source unit. Answers assignability and method lookup
//! queries for overload resolution.

use crate::runtime;
use crate::types::JavaType;
use indexmap::IndexMap;
use itertools::Itertools;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct MethodSig {
    pub name: String,
    pub params: Vec<JavaType>,
    pub return_type: JavaType,
    pub is_static: bool,
    /// The last parameter is an array accepting trailing arguments
    pub is_varargs: bool,
}

impl MethodSig {
    pub fn new(name: impl Into<String>, params: Vec<JavaType>, return_type: JavaType) -> Self {
        Self {
            name: name.into(),
            params,
            return_type,
            is_static: false,
            is_varargs: false,
        }
    }

    pub fn with_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn with_varargs(mut self) -> Self {
        self.is_varargs = true;
        self
    }

    /// Whether `count` arguments can be passed to this method
    pub fn accepts_arity(&self, count: usize) -> bool {
        if self.is_varargs {
            count + 1 >= self.params.len()
        } else {
            count == self.params.len()
        }
    }

    /// Declared type of argument `index`, unwrapping the varargs array
    pub fn param_type(&self, index: usize) -> Option<&JavaType> {
        if self.is_varargs && index + 1 >= self.params.len() {
            self.params.last().and_then(|p| p.element_type())
        } else {
            self.params.get(index)
        }
    }
}

impl fmt::Display for MethodSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let last = self.params.len().saturating_sub(1);
        let params = self.params.iter().enumerate().map(|(i, p)| match p.element_type() {
            Some(element) if self.is_varargs && i == last => format!("{}...", element),
            _ => p.to_string(),
        });
        write!(f, "{}({})", self.name, params.format(", "))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassInfo {
    pub name: String,
    pub superclass: Option<String>,
    pub methods: Vec<MethodSig>,
    pub constructors: Vec<MethodSig>,
    pub is_enum: bool,
}

impl ClassInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            superclass: None,
            methods: vec![],
            constructors: vec![],
            is_enum: false,
        }
    }

    pub fn extending(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn with_method(mut self, sig: MethodSig) -> Self {
        self.methods.push(sig);
        self
    }

    pub fn with_constructor(mut self, params: Vec<JavaType>) -> Self {
        let name = self.name.clone();
        self.constructors
            .push(MethodSig::new(name, params, JavaType::Void));
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Schema {
    classes: IndexMap<String, ClassInfo>,
}

impl Schema {
    /// Schema with the runtime library registered
    pub fn new() -> Self {
        let mut schema = Self::empty();
        runtime::register_library(&mut schema);
        schema
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn add_class(&mut self, info: ClassInfo) {
        log::trace!("schema: registering class {}", info.name);
        self.classes.insert(info.name.clone(), info);
    }

    pub fn class(&self, name: &str) -> Option<&ClassInfo> {
        self.classes.get(name)
    }

    pub fn class_mut(&mut self, name: &str) -> Option<&mut ClassInfo> {
        self.classes.get_mut(name)
    }

    /// `name` and its registered superclasses, nearest first
    pub fn superclass_chain(&self, name: &str) -> Vec<&ClassInfo> {
        let mut chain: Vec<&ClassInfo> = vec![];
        let mut current = self.classes.get(name);
        while let Some(info) = current {
            if chain.iter().any(|c| c.name == info.name) {
                panic!("BUG: cyclic class hierarchy at {}", info.name);
            }
            chain.push(info);
            current = info.superclass.as_deref().and_then(|s| self.classes.get(s));
        }
        chain
    }

    pub fn is_subclass(&self, sub: &str, sup: &str) -> bool {
        sub == sup || self.superclass_chain(sub).iter().any(|c| c.name == sup)
    }

    /// Java assignment compatibility, including widening and boxing
    pub fn is_assignable_from(&self, target: &JavaType, source: &JavaType) -> bool {
        if target == source {
            return true;
        }
        match (target, source) {
            (_, JavaType::Void) | (JavaType::Void, _) => false,
            (JavaType::Object, _) => true,
            (t, JavaType::Null) => t.is_reference(),
            (JavaType::Long, JavaType::Int | JavaType::Char) => true,
            (JavaType::Int, JavaType::Char) => true,
            (JavaType::Integer, JavaType::Int) => true,
            (JavaType::Class(t), JavaType::Class(s)) => self.is_subclass(s, t),
            (JavaType::Array(t), JavaType::Array(s)) => {
                t.is_reference() && self.is_assignable_from(t, s)
            }
            _ => false,
        }
    }

    /// Methods named `name` visible on `class`, overriding methods hiding overridden ones
    pub fn find_methods(&self, class: &str, name: &str) -> Vec<&MethodSig> {
        let mut found: Vec<&MethodSig> = vec![];
        for info in self.superclass_chain(class) {
            for sig in info.methods.iter().filter(|m| m.name == name) {
                if !found.iter().any(|f| f.params == sig.params) {
                    found.push(sig);
                }
            }
        }
        found
    }

    pub fn constructors(&self, class: &str) -> &[MethodSig] {
        self.classes
            .get(class)
            .map(|c| c.constructors.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema_with_hierarchy() -> Schema {
        let mut schema = Schema::empty();
        schema.add_class(
            ClassInfo::new("Base")
                .with_method(MethodSig::new("run", vec![JavaType::Int], JavaType::Void))
                .with_method(MethodSig::new("size", vec![], JavaType::Int)),
        );
        schema.add_class(
            ClassInfo::new("Derived")
                .extending("Base")
                .with_method(MethodSig::new("run", vec![JavaType::Int], JavaType::Void))
                .with_method(MethodSig::new("run", vec![JavaType::String], JavaType::Void)),
        );
        schema
    }

    #[test]
    fn test_overridden_methods_are_hidden() {
        let schema = schema_with_hierarchy();
        assert_eq!(schema.find_methods("Derived", "run").len(), 2);
        assert_eq!(schema.find_methods("Derived", "size").len(), 1);
        assert!(schema.find_methods("Base", "missing").is_empty());
    }

    #[test]
    fn test_assignability() {
        let schema = schema_with_hierarchy();
        let base = JavaType::Class("Base".into());
        let derived = JavaType::Class("Derived".into());
        assert!(schema.is_assignable_from(&base, &derived));
        assert!(!schema.is_assignable_from(&derived, &base));
        assert!(schema.is_assignable_from(&base, &JavaType::Null));
        assert!(!schema.is_assignable_from(&JavaType::Int, &JavaType::Null));
        assert!(schema.is_assignable_from(&JavaType::Long, &JavaType::Int));
        assert!(schema.is_assignable_from(&JavaType::Object, &JavaType::Bit));
        assert!(schema.is_assignable_from(&JavaType::bit_vector(4), &JavaType::bit_vector(8)));
    }

    #[test]
    fn test_varargs_arity() {
        let sig = MethodSig::new(
            "printf",
            vec![JavaType::String, JavaType::array_of(JavaType::Object)],
            JavaType::Void,
        )
        .with_varargs();
        assert!(sig.accepts_arity(1));
        assert!(sig.accepts_arity(4));
        assert_eq!(sig.param_type(3), Some(&JavaType::Object));
        assert_eq!(sig.to_string(), "printf(String, Object...)");
    }

    #[test]
    fn test_runtime_library_is_registered() {
        let schema = Schema::new();
        assert!(schema.class(runtime::BIT_VECTOR).is_some());
        assert!(schema.is_subclass(runtime::OUTPUT_SIGNAL, runtime::SIGNAL));
    }
}
