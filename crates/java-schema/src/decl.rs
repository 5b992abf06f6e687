// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Target declarations

use crate::expr::Expr;
use crate::stmt::{Block, Stmt};
use crate::types::JavaType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
    /// No modifier
    Package,
}

impl Visibility {
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            Visibility::Public => Some("public"),
            Visibility::Protected => Some("protected"),
            Visibility::Private => Some("private"),
            Visibility::Package => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_final: bool,
    pub is_abstract: bool,
}

impl Modifiers {
    pub fn public() -> Self {
        Self::default()
    }

    pub fn private() -> Self {
        Self {
            visibility: Visibility::Private,
            ..Self::default()
        }
    }

    pub fn with_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn with_final(mut self) -> Self {
        self.is_final = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub modifiers: Modifiers,
    pub ty: JavaType,
    pub name: String,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub ty: JavaType,
    pub name: String,
}

impl Param {
    pub fn new(ty: JavaType, name: impl Into<String>) -> Self {
        Self {
            ty,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub modifiers: Modifiers,
    pub return_type: JavaType,
    pub name: String,
    pub params: Vec<Param>,
    /// The last parameter is `T...`
    pub is_varargs: bool,
    pub is_constructor: bool,
    /// `None` for abstract methods
    pub body: Option<Block>,
}

impl MethodDecl {
    pub fn new(name: impl Into<String>, return_type: JavaType, params: Vec<Param>, body: Block) -> Self {
        Self {
            modifiers: Modifiers::public(),
            return_type,
            name: name.into(),
            params,
            is_varargs: false,
            is_constructor: false,
            body: Some(body),
        }
    }

    pub fn constructor(class: impl Into<String>, params: Vec<Param>, body: Block) -> Self {
        Self {
            is_constructor: true,
            ..Self::new(class, JavaType::Void, params, body)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumConstant {
    pub name: String,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassKind {
    Class,
    Enum(Vec<EnumConstant>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub modifiers: Modifiers,
    pub kind: ClassKind,
    pub name: String,
    pub extends: Option<String>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
    /// Body of a `static { ... }` initializer; omitted when empty
    pub static_init: Vec<Stmt>,
    /// Static nested classes
    pub nested: Vec<ClassDecl>,
}

impl ClassDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            modifiers: Modifiers::public(),
            kind: ClassKind::Class,
            name: name.into(),
            extends: None,
            fields: vec![],
            methods: vec![],
            static_init: vec![],
            nested: vec![],
        }
    }

    pub fn method(&self, name: &str) -> Option<&MethodDecl> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn nested_class(&self, name: &str) -> Option<&ClassDecl> {
        self.nested.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompilationUnit {
    pub package: Option<String>,
    pub imports: Vec<String>,
    pub classes: Vec<ClassDecl>,
}
