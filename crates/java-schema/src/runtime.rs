// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Runtime library classes
//!
//! Names of the classes translated code links against, and their registration in the
//! schema. Only signatures consulted by overload resolution are registered; helpers the
//! translator calls directly are not.

use crate::schema::{ClassInfo, MethodSig, Schema};
use crate::types::JavaType;

pub const RUNTIME_PACKAGE: &str = "juno.runtime";

pub const BIT: &str = "Bit";
pub const BIT_VECTOR: &str = "BitVector";
pub const BIT_OP: &str = "BitOp";
pub const INT_OP: &str = "IntOp";
pub const STRING_OP: &str = "StringOp";
pub const JUNO: &str = "Juno";
pub const JUNO_STRING: &str = "JunoString";
pub const JUNO_EVENT: &str = "JunoEvent";
pub const ASSOC_ARRAY: &str = "AssocArray";
pub const SIGNAL: &str = "Signal";
pub const INPUT_SIGNAL: &str = "InputSignal";
pub const OUTPUT_SIGNAL: &str = "OutputSignal";
pub const INOUT_SIGNAL: &str = "InOutSignal";
pub const JUNO_THREAD: &str = "JunoThread";

/// `java.util.Objects`, used for null-safe change detection
pub const OBJECTS: &str = "Objects";

/// Sentinel constant added to every translated enum
pub const UNDEFINED: &str = "UNDEFINED";

pub fn register_library(schema: &mut Schema) {
    use JavaType::*;

    schema.add_class(ClassInfo::new(BIT));
    schema.add_class(
        ClassInfo::new(BIT_VECTOR)
            .with_constructor(vec![Int, Long])
            .with_constructor(vec![String])
            .with_method(MethodSig::new("length", vec![], Int)),
    );
    for helper in [BIT_OP, INT_OP, STRING_OP, JUNO] {
        schema.add_class(ClassInfo::new(helper));
    }
    schema.add_class(
        ClassInfo::new(JUNO_STRING)
            .with_constructor(vec![String])
            .with_method(MethodSig::new("len", vec![], Int))
            .with_method(MethodSig::new("getc", vec![Int], Int))
            .with_method(MethodSig::new("putc", vec![Int, Int], Void))
            .with_method(MethodSig::new("putc", vec![Int, String], Void))
            .with_method(MethodSig::new("toupper", vec![], String))
            .with_method(MethodSig::new("tolower", vec![], String))
            .with_method(MethodSig::new("substr", vec![Int, Int], String))
            .with_method(MethodSig::new("match", vec![String], Boolean))
            .with_method(MethodSig::new("prematch", vec![], String))
            .with_method(MethodSig::new("postmatch", vec![], String))
            .with_method(MethodSig::new("thismatch", vec![], String))
            .with_method(MethodSig::new("backref", vec![Int], String)),
    );
    schema.add_class(
        ClassInfo::new(JUNO_EVENT)
            .with_constructor(vec![])
            .with_method(MethodSig::new("trigger", vec![], Void)),
    );
    schema.add_class(
        ClassInfo::new(ASSOC_ARRAY)
            .with_constructor(vec![])
            .with_method(MethodSig::new("size", vec![], Int))
            .with_method(MethodSig::new("clear", vec![], Void)),
    );
    schema.add_class(
        ClassInfo::new(SIGNAL)
            .with_method(MethodSig::new("sample", vec![], BitVector(None)))
            .with_method(MethodSig::new("sample", vec![Int], BitVector(None))),
    );
    for signal in [INPUT_SIGNAL, OUTPUT_SIGNAL, INOUT_SIGNAL] {
        schema.add_class(ClassInfo::new(signal).extending(SIGNAL));
    }
}
