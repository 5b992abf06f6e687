// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Target type system
//!
//! The four-valued data types of the runtime library are first-class variants so the
//! translator can dispatch on them without string comparisons.

use crate::runtime;
use std::fmt;

/// Direction of a hardware signal class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    Input,
    Output,
    InOut,
}

impl SignalKind {
    pub fn is_drivable(self) -> bool {
        !matches!(self, SignalKind::Input)
    }

    pub fn class_name(self) -> &'static str {
        match self {
            SignalKind::Input => runtime::INPUT_SIGNAL,
            SignalKind::Output => runtime::OUTPUT_SIGNAL,
            SignalKind::InOut => runtime::INOUT_SIGNAL,
        }
    }
}

#[derive(Debug, Clone, Eq)]
pub enum JavaType {
    Void,
    Boolean,
    Char,
    Int,
    Long,
    /// Type of the `null` literal
    Null,
    /// Four-valued single bit
    Bit,
    /// Four-valued bit vector. The width is an annotation for the translator and does
    /// not take part in type identity.
    BitVector(Option<u32>),
    /// `java.lang.Integer`, with `null` standing for X
    Integer,
    String,
    /// Mutable string wrapper carrying match state
    JunoString,
    Enum(String),
    Class(String),
    Array(Box<JavaType>),
    AssocArray {
        key: Box<JavaType>,
        value: Box<JavaType>,
    },
    Signal {
        width: u32,
        kind: SignalKind,
    },
    /// Change-notification event
    Event,
    Object,
}

impl PartialEq for JavaType {
    fn eq(&self, other: &Self) -> bool {
        use JavaType::*;
        match (self, other) {
            (BitVector(_), BitVector(_)) => true,
            (Enum(a), Enum(b)) | (Class(a), Class(b)) => a == b,
            (Array(a), Array(b)) => a == b,
            (AssocArray { key: k1, value: v1 }, AssocArray { key: k2, value: v2 }) => {
                k1 == k2 && v1 == v2
            }
            (Signal { kind: a, .. }, Signal { kind: b, .. }) => a == b,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

impl JavaType {
    pub fn bit_vector(width: u32) -> Self {
        JavaType::BitVector(Some(width))
    }

    pub fn array_of(element: JavaType) -> Self {
        JavaType::Array(Box::new(element))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, JavaType::Void)
    }

    /// `int` or `long`
    pub fn is_numeric(&self) -> bool {
        matches!(self, JavaType::Int | JavaType::Long)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            JavaType::Boolean | JavaType::Char | JavaType::Int | JavaType::Long
        )
    }

    /// One of the representations an integral source value may take
    pub fn is_dv_integral(&self) -> bool {
        matches!(
            self,
            JavaType::Boolean
                | JavaType::Int
                | JavaType::Long
                | JavaType::Bit
                | JavaType::BitVector(_)
                | JavaType::Integer
                | JavaType::Enum(_)
        )
    }

    pub fn is_string_like(&self) -> bool {
        matches!(self, JavaType::String | JavaType::JunoString)
    }

    pub fn is_bit_vector(&self) -> bool {
        matches!(self, JavaType::BitVector(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, JavaType::Array(_))
    }

    /// Values of these types are shared, so a callee mutating them is visible to the
    /// caller without a holder.
    pub fn has_mutable_reference_semantics(&self) -> bool {
        matches!(
            self,
            JavaType::JunoString
                | JavaType::Array(_)
                | JavaType::AssocArray { .. }
                | JavaType::Event
                | JavaType::Signal { .. }
        )
    }

    pub fn is_reference(&self) -> bool {
        !self.is_primitive() && !self.is_void()
    }

    /// Statically known bit width of an integral representation
    pub fn bit_width(&self) -> Option<u32> {
        match self {
            JavaType::Boolean | JavaType::Bit => Some(1),
            JavaType::Char => Some(16),
            JavaType::Int | JavaType::Integer => Some(32),
            JavaType::Long => Some(64),
            JavaType::BitVector(width) => *width,
            JavaType::Signal { width, .. } => Some(*width),
            _ => None,
        }
    }

    pub fn element_type(&self) -> Option<&JavaType> {
        match self {
            JavaType::Array(element) => Some(element),
            JavaType::AssocArray { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Name of the class providing methods of this type, if it is a reference type
    pub fn class_name(&self) -> Option<&str> {
        match self {
            JavaType::Bit => Some(runtime::BIT),
            JavaType::BitVector(_) => Some(runtime::BIT_VECTOR),
            JavaType::Integer => Some("Integer"),
            JavaType::String => Some("String"),
            JavaType::JunoString => Some(runtime::JUNO_STRING),
            JavaType::Enum(name) | JavaType::Class(name) => Some(name),
            JavaType::AssocArray { .. } => Some(runtime::ASSOC_ARRAY),
            JavaType::Signal { kind, .. } => Some(kind.class_name()),
            JavaType::Event => Some(runtime::JUNO_EVENT),
            JavaType::Object => Some("Object"),
            _ => None,
        }
    }

    /// Reference form used for generic arguments
    pub fn boxed(&self) -> JavaType {
        match self {
            JavaType::Boolean => JavaType::Class("Boolean".into()),
            JavaType::Char => JavaType::Class("Character".into()),
            JavaType::Int => JavaType::Integer,
            JavaType::Long => JavaType::Class("Long".into()),
            other => other.clone(),
        }
    }
}

impl fmt::Display for JavaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JavaType::Void => write!(f, "void"),
            JavaType::Boolean => write!(f, "boolean"),
            JavaType::Char => write!(f, "char"),
            JavaType::Int => write!(f, "int"),
            JavaType::Long => write!(f, "long"),
            JavaType::Null | JavaType::Object => write!(f, "Object"),
            JavaType::Array(element) => write!(f, "{}[]", element),
            JavaType::AssocArray { key, value } => write!(
                f,
                "{}<{}, {}>",
                runtime::ASSOC_ARRAY,
                key.boxed(),
                value.boxed()
            ),
            other => match other.class_name() {
                Some(name) => write!(f, "{}", name),
                None => panic!("BUG: type {:?} has no source form", other),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_vector_width_is_not_identity() {
        assert_eq!(JavaType::bit_vector(8), JavaType::bit_vector(16));
        assert_eq!(JavaType::bit_vector(8), JavaType::BitVector(None));
        assert_ne!(JavaType::Bit, JavaType::bit_vector(1));
        assert_ne!(JavaType::Class("A".into()), JavaType::Class("B".into()));
    }

    #[test]
    fn test_display() {
        let assoc = JavaType::AssocArray {
            key: Box::new(JavaType::bit_vector(64)),
            value: Box::new(JavaType::Int),
        };
        assert_eq!(assoc.to_string(), "AssocArray<BitVector, Integer>");
        assert_eq!(JavaType::array_of(JavaType::Bit).to_string(), "Bit[]");
        let sig = JavaType::Signal {
            width: 4,
            kind: SignalKind::Output,
        };
        assert_eq!(sig.to_string(), "OutputSignal");
    }

    #[test]
    fn test_reference_semantics() {
        assert!(JavaType::JunoString.has_mutable_reference_semantics());
        assert!(!JavaType::String.has_mutable_reference_semantics());
        assert!(!JavaType::bit_vector(4).has_mutable_reference_semantics());
        assert!(JavaType::array_of(JavaType::Int).has_mutable_reference_semantics());
    }
}
