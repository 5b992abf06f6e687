// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Semantic analysis facts
//!
//! The analyzer runs before translation and answers questions about variables,
//! functions and blocks by identity. The translator consults these facts read-only.

use crate::ids::{FuncId, NodeId, VarId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Read-only oracle queried by the translator
pub trait AnalysisFacts {
    // === Per-variable facts ===
    fn is_read_access(&self, var: VarId) -> bool;
    fn is_write_access(&self, var: VarId) -> bool;
    /// The variable is never assigned a value containing X or Z
    fn is_not_assigned_xz(&self, var: VarId) -> bool;
    /// String variable mutated in place (`putc`, match state, ...)
    fn is_need_stateful_string(&self, var: VarId) -> bool;
    /// Variable is waited on with `wait_var`
    fn is_wait_var(&self, var: VarId) -> bool;
    /// Variable is passed to a by-reference parameter somewhere
    fn is_passed_by_ref_nva(&self, var: VarId) -> bool;
    fn is_fork_read(&self, var: VarId) -> bool;
    fn is_fork_write(&self, var: VarId) -> bool;

    // === Per-function facts ===
    fn may_return_xz(&self, func: FuncId) -> bool;
    fn may_arg_be_xz(&self, func: FuncId, index: usize) -> bool;
    /// Method shadows a non-virtual method of a superclass
    fn is_non_virtual_override(&self, func: FuncId) -> bool;

    // === Per-block facts ===
    /// Shadow locals referenced inside the fork statement `block`
    fn captured_locals(&self, block: NodeId) -> Vec<VarId>;
    /// Forked code needs the parent thread's context re-established
    fn needs_thread_context(&self, block: NodeId) -> bool;
    /// `var` is written somewhere inside the statement `stmt`
    fn is_written_in(&self, var: VarId, stmt: NodeId) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArgFact {
    pub func: FuncId,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WriteFact {
    pub var: VarId,
    pub stmt: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureFact {
    pub block: NodeId,
    pub vars: Vec<VarId>,
}

/// Concrete fact table, typically produced by the analyzer and loaded with serde.
///
/// Absent facts take the conservative answer: variables are read and written, values
/// may be X/Z, and every other property is false.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisResults {
    pub unread: BTreeSet<VarId>,
    pub unwritten: BTreeSet<VarId>,
    pub not_assigned_xz: BTreeSet<VarId>,
    pub stateful_strings: BTreeSet<VarId>,
    pub wait_vars: BTreeSet<VarId>,
    pub passed_by_ref: BTreeSet<VarId>,
    pub fork_read: BTreeSet<VarId>,
    pub fork_write: BTreeSet<VarId>,
    pub xz_free_returns: BTreeSet<FuncId>,
    pub xz_free_args: BTreeSet<ArgFact>,
    pub non_virtual_overrides: BTreeSet<FuncId>,
    pub captures: Vec<CaptureFact>,
    pub thread_context_blocks: BTreeSet<NodeId>,
    pub writes: BTreeSet<WriteFact>,
}

impl AnalysisResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_not_assigned_xz(&mut self, var: VarId) -> &mut Self {
        self.not_assigned_xz.insert(var);
        self
    }

    pub fn mark_wait_var(&mut self, var: VarId) -> &mut Self {
        self.wait_vars.insert(var);
        self
    }

    pub fn mark_stateful_string(&mut self, var: VarId) -> &mut Self {
        self.stateful_strings.insert(var);
        self
    }

    pub fn mark_passed_by_ref(&mut self, var: VarId) -> &mut Self {
        self.passed_by_ref.insert(var);
        self
    }

    pub fn mark_fork_write(&mut self, var: VarId) -> &mut Self {
        self.fork_write.insert(var);
        self
    }

    pub fn mark_unwritten(&mut self, var: VarId) -> &mut Self {
        self.unwritten.insert(var);
        self
    }

    pub fn add_capture(&mut self, block: NodeId, vars: Vec<VarId>) -> &mut Self {
        self.captures.push(CaptureFact { block, vars });
        self
    }

    pub fn add_write(&mut self, var: VarId, stmt: NodeId) -> &mut Self {
        self.writes.insert(WriteFact { var, stmt });
        self
    }

    /// Capture lists grouped by block, for diagnostics dumps
    pub fn captures_by_block(&self) -> BTreeMap<NodeId, Vec<VarId>> {
        self.captures
            .iter()
            .map(|c| (c.block, c.vars.clone()))
            .collect()
    }
}

impl AnalysisFacts for AnalysisResults {
    fn is_read_access(&self, var: VarId) -> bool {
        !self.unread.contains(&var)
    }

    fn is_write_access(&self, var: VarId) -> bool {
        !self.unwritten.contains(&var)
    }

    fn is_not_assigned_xz(&self, var: VarId) -> bool {
        self.not_assigned_xz.contains(&var)
    }

    fn is_need_stateful_string(&self, var: VarId) -> bool {
        self.stateful_strings.contains(&var)
    }

    fn is_wait_var(&self, var: VarId) -> bool {
        self.wait_vars.contains(&var)
    }

    fn is_passed_by_ref_nva(&self, var: VarId) -> bool {
        self.passed_by_ref.contains(&var)
    }

    fn is_fork_read(&self, var: VarId) -> bool {
        self.fork_read.contains(&var)
    }

    fn is_fork_write(&self, var: VarId) -> bool {
        self.fork_write.contains(&var)
    }

    fn may_return_xz(&self, func: FuncId) -> bool {
        !self.xz_free_returns.contains(&func)
    }

    fn may_arg_be_xz(&self, func: FuncId, index: usize) -> bool {
        !self.xz_free_args.contains(&ArgFact { func, index })
    }

    fn is_non_virtual_override(&self, func: FuncId) -> bool {
        self.non_virtual_overrides.contains(&func)
    }

    fn captured_locals(&self, block: NodeId) -> Vec<VarId> {
        self.captures
            .iter()
            .filter(|c| c.block == block)
            .flat_map(|c| c.vars.iter().copied())
            .collect()
    }

    fn needs_thread_context(&self, block: NodeId) -> bool {
        self.thread_context_blocks.contains(&block)
    }

    fn is_written_in(&self, var: VarId, stmt: NodeId) -> bool {
        self.writes.contains(&WriteFact { var, stmt })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conservative_defaults() {
        let facts = AnalysisResults::new();
        assert!(facts.is_read_access(VarId(1)));
        assert!(facts.is_write_access(VarId(1)));
        assert!(!facts.is_not_assigned_xz(VarId(1)));
        assert!(facts.may_return_xz(FuncId(0)));
        assert!(facts.may_arg_be_xz(FuncId(0), 2));
        assert!(facts.captured_locals(NodeId(4)).is_empty());
    }

    #[test]
    fn test_load_from_toml() {
        let text = r#"
            not_assigned_xz = [1, 2]
            wait_vars = [3]
            xz_free_returns = [9]

            [[captures]]
            block = 40
            vars = [1, 3]

            [[writes]]
            var = 3
            stmt = 41
        "#;
        let facts: AnalysisResults = toml::from_str(text).unwrap();
        assert!(facts.is_not_assigned_xz(VarId(2)));
        assert!(facts.is_wait_var(VarId(3)));
        assert!(!facts.may_return_xz(FuncId(9)));
        assert_eq!(facts.captured_locals(NodeId(40)), vec![VarId(1), VarId(3)]);
        assert!(facts.is_written_in(VarId(3), NodeId(41)));
        assert!(!facts.is_written_in(VarId(1), NodeId(41)));
        assert_eq!(facts.captures_by_block().len(), 1);
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let result: Result<AnalysisResults, _> = toml::from_str("bogus = [1]");
        assert!(result.is_err());
    }
}
