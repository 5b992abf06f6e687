// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Source type system
//!
//! Types are attached to every expression by the front-end. The translator only reads
//! them to pick a target representation; operator dispatch happens on target types.

use crate::ids::{ClassId, EnumId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key type of an associative array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssocKey {
    /// Indexed by bit vectors (the default for `[]` arrays)
    BitVector,
    /// Indexed by strings
    String,
}

/// Direction of an interface signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalDirection {
    Input,
    Output,
    InOut,
}

impl SignalDirection {
    /// Whether the signal can be the target of a drive
    pub fn is_drivable(self) -> bool {
        matches!(self, SignalDirection::Output | SignalDirection::InOut)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VeraType {
    Void,
    /// 32-bit four-state integer
    Integer,
    /// `bit [width-1:0]`; width is `None` when only known at run time
    Bit { width: Option<u32>, signed: bool },
    String,
    Enum(EnumId),
    Class(ClassId),
    Event,
    FixedArray { element: Box<VeraType>, dims: Vec<u32> },
    DynamicArray(Box<VeraType>),
    AssocArray { element: Box<VeraType>, key: AssocKey },
    Signal { width: u32, direction: SignalDirection },
    /// Type of the `null` literal
    Null,
}

impl VeraType {
    pub fn bit(width: u32) -> Self {
        VeraType::Bit {
            width: Some(width),
            signed: false,
        }
    }

    pub fn signed_bit(width: u32) -> Self {
        VeraType::Bit {
            width: Some(width),
            signed: true,
        }
    }

    /// Bit vector whose width is only known at run time
    pub fn bit_unknown_width() -> Self {
        VeraType::Bit {
            width: None,
            signed: false,
        }
    }

    /// Integral types take part in arithmetic and concatenation
    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            VeraType::Integer | VeraType::Bit { .. } | VeraType::Enum(_) | VeraType::Signal { .. }
        )
    }

    pub fn is_string(&self) -> bool {
        matches!(self, VeraType::String)
    }

    pub fn is_array(&self) -> bool {
        matches!(
            self,
            VeraType::FixedArray { .. } | VeraType::DynamicArray(_) | VeraType::AssocArray { .. }
        )
    }

    pub fn is_signal(&self) -> bool {
        matches!(self, VeraType::Signal { .. })
    }

    pub fn is_drivable_signal(&self) -> bool {
        matches!(self, VeraType::Signal { direction, .. } if direction.is_drivable())
    }

    /// Bit width when statically known. Enums have no meaningful width.
    pub fn bit_width(&self) -> Option<u32> {
        match self {
            VeraType::Integer => Some(32),
            VeraType::Bit { width, .. } => *width,
            VeraType::Signal { width, .. } => Some(*width),
            _ => None,
        }
    }

    pub fn is_signed(&self) -> bool {
        match self {
            VeraType::Integer => true,
            VeraType::Bit { signed, .. } => *signed,
            _ => false,
        }
    }

    /// Element type of an array, `None` for non-array types
    pub fn element_type(&self) -> Option<&VeraType> {
        match self {
            VeraType::FixedArray { element, .. }
            | VeraType::DynamicArray(element)
            | VeraType::AssocArray { element, .. } => Some(element),
            _ => None,
        }
    }
}

impl fmt::Display for VeraType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VeraType::Void => write!(f, "void"),
            VeraType::Integer => write!(f, "integer"),
            VeraType::Bit {
                width: Some(1),
                signed: false,
            } => write!(f, "bit"),
            VeraType::Bit { width, signed } => {
                if *signed {
                    write!(f, "signed ")?;
                }
                match width {
                    Some(w) => write!(f, "bit[{}:0]", w - 1),
                    None => write!(f, "bit[?:0]"),
                }
            }
            VeraType::String => write!(f, "string"),
            VeraType::Enum(id) => write!(f, "enum {}", id),
            VeraType::Class(id) => write!(f, "class {}", id),
            VeraType::Event => write!(f, "event"),
            VeraType::FixedArray { element, dims } => {
                write!(f, "{}", element)?;
                for d in dims {
                    write!(f, "[{}]", d)?;
                }
                Ok(())
            }
            VeraType::DynamicArray(element) => write!(f, "{}[*]", element),
            VeraType::AssocArray { element, key } => match key {
                AssocKey::BitVector => write!(f, "{}[]", element),
                AssocKey::String => write!(f, "{}[string]", element),
            },
            VeraType::Signal { width, direction } => {
                write!(f, "{:?} signal[{}:0]", direction, width - 1)
            }
            VeraType::Null => write!(f, "null"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_width_of_integral_types() {
        assert_eq!(VeraType::Integer.bit_width(), Some(32));
        assert_eq!(VeraType::bit(12).bit_width(), Some(12));
        assert_eq!(VeraType::bit_unknown_width().bit_width(), None);
        assert_eq!(VeraType::Enum(EnumId(0)).bit_width(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(VeraType::bit(1).to_string(), "bit");
        assert_eq!(VeraType::signed_bit(8).to_string(), "signed bit[7:0]");
        let assoc = VeraType::AssocArray {
            element: Box::new(VeraType::Integer),
            key: AssocKey::String,
        };
        assert_eq!(assoc.to_string(), "integer[string]");
    }
}
