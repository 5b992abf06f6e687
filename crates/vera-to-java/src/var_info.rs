// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! How a source variable is reached from generated code
//!
//! Scopes are persistent maps: a fork branch or a nested method body installs
//! remappings on a cheap copy and drops it on exit, leaving the enclosing scope intact.

use java_schema::{Expr, JavaType};
use vera_model::VarId;

#[derive(Debug, Clone, PartialEq)]
pub enum VarAccess {
    /// Local or parameter read and written by name
    Local(String),
    /// Single-element array `name[0]`, shared with closures or callers
    Holder(String),
    /// Fork-time snapshot or per-branch alias standing in for the original local
    Remapped(String),
    /// Instance field of the enclosing class
    Field(String),
    StaticField { class: String, name: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarInfo {
    pub access: VarAccess,
    /// Type of the value, not of a holder array
    pub ty: JavaType,
    /// Companion change-notification event, for `wait_var` targets
    pub event: Option<Expr>,
}

impl VarInfo {
    pub fn local(name: impl Into<String>, ty: JavaType) -> Self {
        Self {
            access: VarAccess::Local(name.into()),
            ty,
            event: None,
        }
    }

    pub fn holder(name: impl Into<String>, ty: JavaType) -> Self {
        Self {
            access: VarAccess::Holder(name.into()),
            ty,
            event: None,
        }
    }

    pub fn remapped(name: impl Into<String>, ty: JavaType) -> Self {
        Self {
            access: VarAccess::Remapped(name.into()),
            ty,
            event: None,
        }
    }

    pub fn with_event(mut self, event: Option<Expr>) -> Self {
        self.event = event;
        self
    }

    /// Expression reading or assigning the variable's value
    pub fn reference(&self) -> Expr {
        match &self.access {
            VarAccess::Local(name) | VarAccess::Remapped(name) => Expr::local(name, self.ty.clone()),
            VarAccess::Holder(name) => Expr::array_access(
                Expr::local(name, JavaType::array_of(self.ty.clone())),
                Expr::int(0),
            ),
            VarAccess::Field(name) => Expr::field(None, name, self.ty.clone()),
            VarAccess::StaticField { class, name } => Expr::static_field(class, name, self.ty.clone()),
        }
    }

    /// The holder array itself, for passing by reference without a copy
    pub fn holder_array(&self) -> Option<Expr> {
        match &self.access {
            VarAccess::Holder(name) => Some(Expr::local(name, JavaType::array_of(self.ty.clone()))),
            _ => None,
        }
    }

    /// Name of the Java local backing this variable, if any
    pub fn local_name(&self) -> Option<&str> {
        match &self.access {
            VarAccess::Local(name) | VarAccess::Holder(name) | VarAccess::Remapped(name) => Some(name),
            _ => None,
        }
    }
}

pub type VarInfoMap = im::HashMap<VarId, VarInfo>;

#[cfg(test)]
mod tests {
    use super::*;
    use java_schema::render_expr_to_string;

    #[test]
    fn test_references() {
        let holder = VarInfo::holder("count", JavaType::Int);
        assert_eq!(render_expr_to_string(&holder.reference()), "count[0]");
        assert!(holder.holder_array().is_some());

        let global = VarInfo {
            access: VarAccess::StaticField {
                class: "Top".into(),
                name: "total".into(),
            },
            ty: JavaType::Integer,
            event: None,
        };
        assert_eq!(render_expr_to_string(&global.reference()), "Top.total");
        assert_eq!(global.local_name(), None);
    }

    #[test]
    fn test_scopes_are_persistent() {
        let mut outer = VarInfoMap::new();
        outer.insert(VarId(1), VarInfo::local("i", JavaType::Int));
        let mut branch = outer.clone();
        branch.insert(VarId(1), VarInfo::remapped("i_1", JavaType::Int));
        assert_eq!(outer[&VarId(1)].local_name(), Some("i"));
        assert_eq!(branch[&VarId(1)].local_name(), Some("i_1"));
    }
}
