// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Identity types for source declarations and nodes

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_id!(
    /// A declared variable: global, field, parameter or local
    VarId,
    "v"
);
define_id!(
    /// A function, task or method
    FuncId,
    "f"
);
define_id!(ClassId, "c");
define_id!(EnumId, "e");
define_id!(
    /// Identity of an expression or statement node, used to query per-node analysis facts
    NodeId,
    "n"
);
