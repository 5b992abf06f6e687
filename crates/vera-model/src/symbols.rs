// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Symbol table over one compilation unit
//!
//! Indexes declarations by id so the translator can resolve references without
//! walking the unit. Locals are indexed too, including those nested in blocks.

use crate::decl::{ClassDecl, CompilationUnit, EnumDecl, FunctionDecl, NamedRange, VarDecl};
use crate::ids::{ClassId, EnumId, FuncId, VarId};
use crate::stmt::{Block, Stmt, StmtKind};
use indexmap::IndexMap;

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    functions: IndexMap<FuncId, FunctionDecl>,
    classes: IndexMap<ClassId, ClassDecl>,
    enums: IndexMap<EnumId, EnumDecl>,
    vars: IndexMap<VarId, VarDecl>,
    ranges: IndexMap<String, NamedRange>,
    /// Owning class of each field
    field_owner: IndexMap<VarId, ClassId>,
}

impl SymbolTable {
    pub fn new(unit: &CompilationUnit) -> Self {
        let mut table = Self::default();
        for decl in &unit.enums {
            table.enums.insert(decl.id, decl.clone());
        }
        for var in &unit.globals {
            table.vars.insert(var.id, var.clone());
        }
        for range in &unit.ranges {
            table.ranges.insert(range.name.clone(), range.clone());
        }
        for func in &unit.functions {
            table.add_function(func);
        }
        for class in &unit.classes {
            for field in &class.fields {
                table.vars.insert(field.id, field.clone());
                table.field_owner.insert(field.id, class.id);
            }
            for method in &class.methods {
                table.add_function(method);
            }
            table.classes.insert(class.id, class.clone());
        }
        if let Some(program) = &unit.program {
            table.add_block_locals(program);
        }
        table
    }

    fn add_function(&mut self, func: &FunctionDecl) {
        for param in &func.params {
            self.vars.insert(param.var.id, param.var.clone());
        }
        if let Some(body) = &func.body {
            self.add_block_locals(body);
        }
        self.functions.insert(func.id, func.clone());
    }

    fn add_block_locals(&mut self, block: &Block) {
        for stmt in &block.stmts {
            self.add_stmt_locals(stmt);
        }
    }

    fn add_stmt_locals(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::VarDecl(var) => {
                self.vars.insert(var.id, var.clone());
            }
            StmtKind::Block(block) => self.add_block_locals(block),
            StmtKind::If {
                then_stmt,
                else_stmt,
                ..
            } => {
                self.add_stmt_locals(then_stmt);
                if let Some(else_stmt) = else_stmt {
                    self.add_stmt_locals(else_stmt);
                }
            }
            StmtKind::While { body, .. }
            | StmtKind::DoWhile { body, .. }
            | StmtKind::For { body, .. }
            | StmtKind::Repeat { body, .. } => self.add_stmt_locals(body),
            StmtKind::Case { items, default, .. } => {
                for item in items {
                    self.add_stmt_locals(&item.body);
                }
                if let Some(default) = default {
                    self.add_stmt_locals(default);
                }
            }
            StmtKind::RandCase(items) => {
                for item in items {
                    self.add_stmt_locals(&item.body);
                }
            }
            StmtKind::Fork { branches, .. } => {
                for branch in branches {
                    self.add_stmt_locals(branch);
                }
            }
            _ => {}
        }
    }

    /// Panics if the function is unknown (front-end contract violation)
    pub fn function(&self, id: FuncId) -> &FunctionDecl {
        self.functions
            .get(&id)
            .unwrap_or_else(|| panic!("BUG: function {} not in symbol table", id))
    }

    pub fn class(&self, id: ClassId) -> &ClassDecl {
        self.classes
            .get(&id)
            .unwrap_or_else(|| panic!("BUG: class {} not in symbol table", id))
    }

    pub fn enum_decl(&self, id: EnumId) -> &EnumDecl {
        self.enums
            .get(&id)
            .unwrap_or_else(|| panic!("BUG: enum {} not in symbol table", id))
    }

    pub fn var(&self, id: VarId) -> &VarDecl {
        self.vars
            .get(&id)
            .unwrap_or_else(|| panic!("BUG: variable {} not in symbol table", id))
    }

    pub fn try_var(&self, id: VarId) -> Option<&VarDecl> {
        self.vars.get(&id)
    }

    pub fn range(&self, name: &str) -> Option<&NamedRange> {
        self.ranges.get(name)
    }

    pub fn field_owner(&self, id: VarId) -> Option<ClassId> {
        self.field_owner.get(&id).copied()
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassDecl> {
        self.classes.values()
    }

    /// Superclass chain starting at `id` itself
    pub fn class_chain(&self, id: ClassId) -> Vec<ClassId> {
        let mut chain = vec![id];
        let mut current = self.class(id).extends;
        while let Some(parent) = current {
            if chain.contains(&parent) {
                panic!("BUG: cyclic class hierarchy at {}", parent);
            }
            chain.push(parent);
            current = self.class(parent).extends;
        }
        chain
    }

    /// Whether `sub` is `sup` or derives from it
    pub fn is_subclass(&self, sub: ClassId, sup: ClassId) -> bool {
        self.class_chain(sub).contains(&sup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VeraType;
    use crate::{Loc, NodeId};

    #[test]
    fn test_locals_and_hierarchy_are_indexed() {
        let local = VarDecl::new(VarId(7), "count", VeraType::Integer);
        let body = Block::new(vec![Stmt {
            id: NodeId(1),
            kind: StmtKind::VarDecl(local),
            loc: Loc::default(),
        }]);
        let base = ClassDecl::new(ClassId(0), "Base");
        let mut derived = ClassDecl::new(ClassId(1), "Derived");
        derived.extends = Some(ClassId(0));
        derived.fields.push(VarDecl::new(VarId(3), "data", VeraType::bit(8)));
        derived
            .methods
            .push(FunctionDecl::task(FuncId(2), "run").in_class(ClassId(1)).with_body(body));

        let unit = CompilationUnit {
            name: "test".into(),
            classes: vec![base, derived],
            ..Default::default()
        };
        let table = SymbolTable::new(&unit);
        assert_eq!(table.var(VarId(7)).name, "count");
        assert_eq!(table.field_owner(VarId(3)), Some(ClassId(1)));
        assert_eq!(table.class_chain(ClassId(1)), vec![ClassId(1), ClassId(0)]);
        assert!(table.is_subclass(ClassId(1), ClassId(0)));
        assert!(!table.is_subclass(ClassId(0), ClassId(1)));
    }
}
