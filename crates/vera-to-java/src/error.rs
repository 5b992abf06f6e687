// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Translation errors and warnings
//!
//! Errors are recoverable: the caller can report them against the offending source
//! construct and keep going with the next unit. Violated internal invariants are not
//! errors and panic with a `BUG:` prefix instead.

use itertools::Itertools;
use java_schema::JavaType;
use std::fmt;
use vera_model::Loc;

/// A representation change the converter has no rule for
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("cannot convert {from} to {to}")]
pub struct ConversionError {
    pub from: String,
    pub to: String,
}

impl ConversionError {
    pub fn new(from: &JavaType, to: &JavaType) -> Self {
        Self {
            from: describe_type(from),
            to: describe_type(to),
        }
    }
}

fn describe_type(ty: &JavaType) -> String {
    match ty {
        JavaType::Void => "void".to_string(),
        JavaType::BitVector(Some(w)) => format!("BitVector[{}]", w),
        JavaType::Signal { width, kind } => format!("{}[{}]", kind.class_name(), width),
        JavaType::Event => "JunoEvent".to_string(),
        other => other.to_string(),
    }
}

/// A candidate considered during overload resolution and why it lost
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedCandidate {
    pub signature: String,
    pub reason: String,
}

impl fmt::Display for RejectedCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.signature, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TranslationError {
    #[error("unsupported construct: {construct}")]
    Unsupported { construct: String, loc: Loc },

    #[error("cannot convert {from} to {to} in {site}")]
    Conversion {
        from: String,
        to: String,
        site: String,
        loc: Loc,
    },

    #[error("cannot resolve `{name}`: {}", describe_candidates(.candidates))]
    Resolution {
        name: String,
        candidates: Vec<RejectedCandidate>,
        loc: Loc,
    },
}

fn describe_candidates(candidates: &[RejectedCandidate]) -> String {
    if candidates.is_empty() {
        return "no candidates".to_string();
    }
    candidates.iter().join("; ")
}

impl TranslationError {
    pub fn unsupported(construct: impl Into<String>, loc: Loc) -> Self {
        TranslationError::Unsupported {
            construct: construct.into(),
            loc,
        }
    }

    pub fn conversion(from: &JavaType, to: &JavaType, site: impl Into<String>, loc: Loc) -> Self {
        ConversionError::new(from, to).at(site, loc)
    }

    pub fn resolution(name: impl Into<String>, candidates: Vec<RejectedCandidate>, loc: Loc) -> Self {
        TranslationError::Resolution {
            name: name.into(),
            candidates,
            loc,
        }
    }

    pub fn loc(&self) -> Loc {
        match self {
            TranslationError::Unsupported { loc, .. }
            | TranslationError::Conversion { loc, .. }
            | TranslationError::Resolution { loc, .. } => *loc,
        }
    }

    /// Attach `loc` if the error was raised without a source position
    pub fn or_loc(mut self, fallback: Loc) -> Self {
        let slot = match &mut self {
            TranslationError::Unsupported { loc, .. }
            | TranslationError::Conversion { loc, .. }
            | TranslationError::Resolution { loc, .. } => loc,
        };
        if *slot == Loc::default() {
            *slot = fallback;
        }
        self
    }
}

impl ConversionError {
    /// Locate a converter failure at the construct that requested it
    pub fn at(self, site: impl Into<String>, loc: Loc) -> TranslationError {
        TranslationError::Conversion {
            from: self.from,
            to: self.to,
            site: site.into(),
            loc,
        }
    }
}

impl From<ConversionError> for TranslationError {
    fn from(err: ConversionError) -> Self {
        err.at("expression", Loc::default())
    }
}

pub type Result<T> = std::result::Result<T, TranslationError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// A `local` member was emitted with narrower Java visibility
    VisibilityNarrowed,
    /// A local or parameter was declared `final`
    MarkedFinal,
    /// A method without a body got a throwing stub
    StubGenerated,
    /// An enum inside a concatenation target was set to the undefined sentinel
    UndefinedEnumInConcat,
}

impl WarningKind {
    pub fn code(self) -> &'static str {
        match self {
            WarningKind::VisibilityNarrowed => "W0001",
            WarningKind::MarkedFinal => "W0002",
            WarningKind::StubGenerated => "W0003",
            WarningKind::UndefinedEnumInConcat => "W0004",
        }
    }
}

/// Non-fatal observation made while translating
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationWarning {
    pub kind: WarningKind,
    pub message: String,
    pub loc: Loc,
}

impl fmt::Display for TranslationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} at {}", self.kind.code(), self.message, self.loc)
    }
}
