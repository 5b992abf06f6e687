// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Declarations of one compilation unit

use crate::expr::Expr;
use crate::ids::{ClassId, EnumId, FuncId, VarId};
use crate::loc::Loc;
use crate::stmt::Block;
use crate::types::VeraType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    /// Vera `local`
    Local,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub id: VarId,
    pub name: String,
    pub ty: VeraType,
    pub init: Option<Expr>,
    /// `shadow` locals are snapshotted when a fork captures them
    pub is_shadow: bool,
    pub is_static: bool,
    pub visibility: Visibility,
    pub loc: Loc,
}

impl VarDecl {
    pub fn new(id: VarId, name: impl Into<String>, ty: VeraType) -> Self {
        Self {
            id,
            name: name.into(),
            ty,
            init: None,
            is_shadow: false,
            is_static: false,
            visibility: Visibility::Public,
            loc: Loc::default(),
        }
    }

    pub fn with_init(mut self, init: Expr) -> Self {
        self.init = Some(init);
        self
    }

    pub fn shadow(mut self) -> Self {
        self.is_shadow = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub var: VarDecl,
    /// `var` parameters are passed by reference
    pub by_ref: bool,
    pub default: Option<Expr>,
}

impl ParamDecl {
    pub fn new(var: VarDecl) -> Self {
        Self {
            var,
            by_ref: false,
            default: None,
        }
    }

    pub fn by_ref(mut self) -> Self {
        self.by_ref = true;
        self
    }

    pub fn with_default(mut self, default: Expr) -> Self {
        self.default = Some(default);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Function,
    Task,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub id: FuncId,
    pub name: String,
    pub kind: FunctionKind,
    pub params: Vec<ParamDecl>,
    pub return_type: VeraType,
    /// `None` for extern and pure virtual declarations
    pub body: Option<Block>,
    pub class: Option<ClassId>,
    pub is_virtual: bool,
    pub is_static: bool,
    pub visibility: Visibility,
    pub loc: Loc,
}

impl FunctionDecl {
    pub fn task(id: FuncId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            kind: FunctionKind::Task,
            params: vec![],
            return_type: VeraType::Void,
            body: None,
            class: None,
            is_virtual: false,
            is_static: false,
            visibility: Visibility::Public,
            loc: Loc::default(),
        }
    }

    pub fn function(id: FuncId, name: impl Into<String>, return_type: VeraType) -> Self {
        Self {
            kind: FunctionKind::Function,
            return_type,
            ..Self::task(id, name)
        }
    }

    pub fn with_params(mut self, params: Vec<ParamDecl>) -> Self {
        self.params = params;
        self
    }

    pub fn with_body(mut self, body: Block) -> Self {
        self.body = Some(body);
        self
    }

    pub fn in_class(mut self, class: ClassId) -> Self {
        self.class = Some(class);
        self
    }

    /// The class constructor is the task named `new`
    pub fn is_constructor(&self) -> bool {
        self.class.is_some() && self.name == "new"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub id: ClassId,
    pub name: String,
    pub extends: Option<ClassId>,
    pub fields: Vec<VarDecl>,
    pub methods: Vec<FunctionDecl>,
    pub is_virtual: bool,
    pub loc: Loc,
}

impl ClassDecl {
    pub fn new(id: ClassId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            extends: None,
            fields: vec![],
            methods: vec![],
            is_virtual: false,
            loc: Loc::default(),
        }
    }

    pub fn constructor(&self) -> Option<&FunctionDecl> {
        self.methods.iter().find(|m| m.is_constructor())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValueDecl {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDecl {
    pub id: EnumId,
    pub name: String,
    pub values: Vec<EnumValueDecl>,
    pub loc: Loc,
}

impl EnumDecl {
    /// Values are numbered consecutively from zero
    pub fn new(id: EnumId, name: impl Into<String>, values: &[&str]) -> Self {
        Self {
            id,
            name: name.into(),
            values: values
                .iter()
                .enumerate()
                .map(|(i, v)| EnumValueDecl {
                    name: v.to_string(),
                    value: i as i64,
                })
                .collect(),
            loc: Loc::default(),
        }
    }
}

/// A named bit range usable as `vec[name]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedRange {
    pub name: String,
    pub high: u32,
    pub low: u32,
}

impl NamedRange {
    pub fn width(&self) -> u32 {
        self.high - self.low + 1
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompilationUnit {
    pub name: String,
    pub enums: Vec<EnumDecl>,
    pub classes: Vec<ClassDecl>,
    pub functions: Vec<FunctionDecl>,
    pub globals: Vec<VarDecl>,
    pub ranges: Vec<NamedRange>,
    /// The `program` block, if this unit contains one
    pub program: Option<Block>,
}
