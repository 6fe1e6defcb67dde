//! Per-parse mutable state: input, cursors, the CRF, the BSR forest, the
//! descriptor worklist, and the configuration governing how `parse` drives
//! them.
//!
//! A `Context` is deliberately not `Sync`: its slice-FIRST memo lives on
//! the immutable `Grammar` it borrows (shareable read-only across threads
//! behind an `Arc`), but the worklist, CRF, and BSR forest are exclusive to
//! one parse and mutated without any synchronization. Running two parses of
//! the same grammar concurrently means building two `Context`s, not sharing
//! one.

use crate::bsr::BsrForest;
use crate::crf::Crf;
use crate::debug::Counters;
use cnp_index::HeadIdx;
use std::collections::{BTreeSet, HashMap};

/// Tunables controlling how a single `parse` call behaves. `Default`
/// matches a top-level, whole-input parse with no diagnostics enabled.
#[derive(Debug, Clone)]
pub struct ParseConfig {
    /// Require the parse to consume the entire input to count as a success.
    /// `false` accepts any successful derivation of the start symbol
    /// starting at position 0, regardless of how much input is left over.
    pub whole: bool,
    /// Marks this as a sub-parse invoked by a `nofollow`/`reject` filter
    /// entry: `parse` exits its descriptor loop as soon as `success` is
    /// set, rather than draining the worklist, since filters only need a
    /// yes/no answer.
    pub sub: bool,
    /// An optional cap on descriptors processed, after which `parse`
    /// returns whatever `success` currently holds. Diagnostics only — a
    /// budget-truncated parse should never be reported as a clean failure.
    pub step_budget: Option<usize>,
    /// Pops descriptors LIFO instead of FIFO. Changes dispatch order, not
    /// which descriptors eventually run, since the dedup set `U` still
    /// accepts every triple exactly once either way. Exists for tracing
    /// depth-first rather than breadth-first.
    pub lifo_worklist: bool,
    /// Disables the `test_select` lookahead guard, falling through every
    /// production regardless of lookahead. Exists to demonstrate, by
    /// contrast, how many descriptors `test_select` prunes on a given
    /// grammar and input (see the `test_select_rejections` counter).
    pub test_select_disabled: bool,
}

impl Default for ParseConfig {
    fn default() -> Self {
        ParseConfig {
            whole: true,
            sub: false,
            step_budget: None,
            lifo_worklist: false,
            test_select_disabled: false,
        }
    }
}

impl ParseConfig {
    pub fn with_whole(mut self, whole: bool) -> Self {
        self.whole = whole;
        self
    }

    pub fn with_sub(mut self, sub: bool) -> Self {
        self.sub = sub;
        self
    }

    pub fn with_step_budget(mut self, budget: usize) -> Self {
        self.step_budget = Some(budget);
        self
    }

    pub fn with_lifo_worklist(mut self, lifo: bool) -> Self {
        self.lifo_worklist = lifo;
        self
    }

    pub fn with_test_select_disabled(mut self, disabled: bool) -> Self {
        self.test_select_disabled = disabled;
        self
    }
}

pub struct Context {
    pub input: Vec<char>,
    pub start: HeadIdx,
    pub config: ParseConfig,

    /// Current call-site cursor (the `cU` of the descriptor being handled).
    pub c_u: usize,
    /// Current input cursor (the `cI` of the descriptor being handled).
    pub c_i: usize,

    pub crf: Crf,
    /// `P[(head, k)]`: the set of positions a cluster has already been
    /// observed to return to, keyed the same way a cluster node is.
    pub returns: HashMap<(HeadIdx, usize), BTreeSet<usize>>,
    pub bsr: BsrForest,
    pub worklist: crate::descriptor::Worklist,
    pub success: bool,
    pub counters: Counters,
}

impl Context {
    pub fn new(input: &str, start: HeadIdx, config: ParseConfig) -> Self {
        Self::from_chars(input.chars().collect(), start, config)
    }

    pub fn from_chars(input: Vec<char>, start: HeadIdx, config: ParseConfig) -> Self {
        Context {
            input,
            start,
            config,
            c_u: 0,
            c_i: 0,
            crf: Crf::new(),
            returns: HashMap::new(),
            bsr: BsrForest::new(),
            worklist: crate::descriptor::Worklist::new(),
            success: false,
            counters: Counters::default(),
        }
    }

    /// The code point at `input[i]`, or the sentinel `'\0'` one past the
    /// end of input. Mirrors treating the input as implicitly
    /// zero-terminated rather than threading `Option<char>` through every
    /// lookahead check.
    pub fn char_at(&self, i: usize) -> char {
        self.input.get(i).copied().unwrap_or('\0')
    }

    pub fn at_end(&self, i: usize) -> bool {
        i >= self.input.len()
    }

    /// Explicit counterpart to `Drop` for callers that want to free a large
    /// CRF/BSR forest at a known point rather than waiting for scope exit.
    pub fn release(self) {}
}
