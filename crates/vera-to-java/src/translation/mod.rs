// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Translation of Vera expressions and statements to Java
//!
//! This module provides specialized translators:
//! - utilities: shared helpers (value conversion with schema rules, default values)
//! - expression_translator: expressions to `ConvertedExpression`s
//! - assignment_translator: plain, compound and increment/decrement assignments
//! - call_translator: function, method and constructor calls with overload resolution
//! - statement_translator: statements, including loop guard hoisting
//! - switch_translator: `case` and `randcase`
//! - fork_translator: `fork`/`join` with variable snapshots
//! - function_translator: method bodies and signatures

mod utilities;
pub mod assignment_translator;
pub mod call_translator;
pub mod expression_translator;
pub mod fork_translator;
pub mod function_translator;
pub mod statement_translator;
pub mod switch_translator;

pub use utilities::{convert_to, default_value, initial_value};
