// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Local name management
//!
//! Java forbids a local from shadowing another local of an enclosing block, so fresh
//! names are checked against every open scope. Sibling blocks may reuse a name once
//! the earlier block is closed.

use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashSet};

static JAVA_KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class",
        "const", "continue", "default", "do", "double", "else", "enum", "extends", "final",
        "finally", "float", "for", "goto", "if", "implements", "import", "instanceof", "int",
        "interface", "long", "native", "new", "package", "private", "protected", "public",
        "return", "short", "static", "strictfp", "super", "switch", "synchronized", "this",
        "throw", "throws", "transient", "try", "void", "volatile", "while", "true", "false",
        "null", "var", "record", "yield",
    ]
    .into_iter()
    .collect()
});

/// Escape identifiers that collide with Java reserved words
pub fn escape_identifier(name: &str) -> String {
    if JAVA_KEYWORDS.contains(name) {
        format!("{}_", name)
    } else {
        name.to_string()
    }
}

/// Capitalize first character
pub fn capitalize_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

/// Stack of block scopes for one method body
#[derive(Debug, Clone)]
pub struct NameScopes {
    scopes: Vec<BTreeSet<String>>,
}

impl Default for NameScopes {
    fn default() -> Self {
        Self::new()
    }
}

impl NameScopes {
    pub fn new() -> Self {
        Self {
            scopes: vec![BTreeSet::new()],
        }
    }

    pub fn push(&mut self) {
        self.scopes.push(BTreeSet::new());
    }

    pub fn pop(&mut self) {
        if self.scopes.len() <= 1 {
            panic!("BUG: popping the outermost name scope");
        }
        self.scopes.pop();
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.scopes.iter().any(|s| s.contains(name))
    }

    /// Declare a source-level name in the innermost scope
    pub fn declare(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string());
        }
    }

    /// Declare and return a name derived from `base` that no open scope uses
    pub fn fresh(&mut self, base: &str) -> String {
        let base = escape_identifier(base);
        let name = if self.is_declared(&base) {
            (1..)
                .map(|i| format!("{}_{}", base, i))
                .find(|candidate| !self.is_declared(candidate))
                .unwrap_or_else(|| panic!("BUG: name space exhausted for {}", base))
        } else {
            base
        };
        self.declare(&name);
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_names_avoid_enclosing_scopes() {
        let mut scopes = NameScopes::new();
        scopes.declare("tmp");
        scopes.push();
        assert_eq!(scopes.fresh("tmp"), "tmp_1");
        assert_eq!(scopes.fresh("tmp"), "tmp_2");
        scopes.pop();
        scopes.push();
        // The sibling block may reuse names of the closed block
        assert_eq!(scopes.fresh("tmp"), "tmp_1");
    }

    #[test]
    fn test_keywords_are_escaped() {
        assert_eq!(escape_identifier("new"), "new_");
        assert_eq!(escape_identifier("count"), "count");
        let mut scopes = NameScopes::new();
        assert_eq!(scopes.fresh("class"), "class_");
    }
}
