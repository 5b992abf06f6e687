// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! OpenVera to Java translation
//!
//! Translates one typed Vera compilation unit, together with the facts the semantic
//! analyzer computed for it, into a Java compilation unit written against the Juno
//! runtime.

mod builtins;
pub mod context;
pub mod converted_expression;
pub mod diagnostics;
pub mod error;
mod expression_converter;
mod lhs;
mod operation_builder;
pub mod options;
pub mod session;
pub mod translation;
mod unit_translator;
mod var_info;

pub use context::TranslationContext;
pub use converted_expression::ConvertedExpression;
pub use diagnostics::{emit_diagnostics, render_diagnostics, SourceFiles};
pub use error::{TranslationError, TranslationWarning, WarningKind};
pub use options::TranslatorOptions;
pub use session::TranslationSession;
pub use unit_translator::{translate_unit, TranslationOutput};
