//! FIRST/FOLLOW fixed-point computation.
//!
//! The fixed-point shape (seed, then iterate production bodies left to
//! right until nothing changes) follows the LR table builder's
//! `first_sets`/`follow_sets` pair: grow sets monotonically, track whether
//! any set grew this pass, stop when a pass makes no changes.
//!
//! This module only computes the two tables. The `test_select` oracle that
//! consults them lives on [`crate::grammar::Grammar`], which also owns the
//! terminal table `predicts` needs.

use crate::fset::{BodySlice, FSet};
use crate::symbol::Symbol;
use cnp_index::{HeadIdx, SymbolIdx, SymbolVec, TermIdx};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::HashMap;

pub fn compute_first_sets(
    symbols: &SymbolVec<Symbol>,
    term_count: usize,
    productions: &IndexMap<HeadIdx, Vec<Vec<SymbolIdx>>>,
) -> SymbolVec<FSet> {
    let mut first: SymbolVec<FSet> = SymbolVec::with_capacity(symbols.len());
    for idx in symbols.indices() {
        if idx.0 < term_count {
            first.push(FSet::singleton(TermIdx(idx.0)));
        } else {
            first.push(FSet::default());
        }
    }

    loop {
        let mut changed = false;
        for (&head, bodies) in productions {
            let head_symbol = head.to_symbol_idx(term_count);
            for body in bodies {
                let seq_first = first_of_sequence(&first, body, 0, body.len());
                if first[head_symbol].union_in_place(&seq_first) {
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }

    first
}

/// FIRST of `body[start..stop]`, given each symbol's already-known FIRST
/// set. Concatenates FIRST sets left to right, stopping as soon as a
/// symbol's FIRST set is not `special` (not nullable).
fn first_of_sequence(first: &SymbolVec<FSet>, body: &[SymbolIdx], start: usize, stop: usize) -> FSet {
    let mut result = FSet::default();
    let mut all_special = true;
    for &sym in &body[start..stop] {
        let sym_first = &first[sym];
        for &t in &sym_first.terminals {
            result.terminals.insert(t);
        }
        if !sym_first.special {
            all_special = false;
            break;
        }
    }
    result.special = all_special;
    result
}

pub fn compute_follow_sets(
    term_count: usize,
    start: HeadIdx,
    productions: &IndexMap<HeadIdx, Vec<Vec<SymbolIdx>>>,
    first: &SymbolVec<FSet>,
) -> HashMap<HeadIdx, FSet> {
    let mut follow: HashMap<HeadIdx, FSet> = productions.keys().map(|&h| (h, FSet::default())).collect();
    follow.entry(start).or_default().special = true;

    loop {
        let mut changed = false;
        for bodies in productions.values() {
            for body in bodies {
                for (pos, &sym) in body.iter().enumerate() {
                    if sym.0 < term_count {
                        continue;
                    }
                    let sym_head = HeadIdx(sym.0 - term_count);
                    let rest_first = first_of_sequence(first, body, pos + 1, body.len());
                    let rest_terms = FSet { terminals: rest_first.terminals.clone(), special: false };
                    let entry = follow
                        .get_mut(&sym_head)
                        .expect("every non-terminal symbol has a FOLLOW entry");
                    if entry.union_in_place(&rest_terms) {
                        changed = true;
                    }
                }
            }
        }
        // Propagate FOLLOW(head) into FOLLOW(sym) for any sym that can end a
        // body of head (nullable suffix after sym). Done as a second pass
        // per iteration so a head's FOLLOW set from the first pass is fully
        // formed before it propagates further down.
        for (&head, bodies) in productions {
            for body in bodies {
                for (pos, &sym) in body.iter().enumerate() {
                    if sym.0 < term_count {
                        continue;
                    }
                    let sym_head = HeadIdx(sym.0 - term_count);
                    let rest_first = first_of_sequence(first, body, pos + 1, body.len());
                    if rest_first.special {
                        let head_follow = follow.get(&head).cloned().unwrap_or_default();
                        let entry = follow.get_mut(&sym_head).unwrap();
                        if entry.union_in_place(&head_follow) {
                            changed = true;
                        }
                    }
                }
            }
        }
        if !changed {
            break;
        }
    }

    follow
}

/// Holds both fixed points plus the memo table for arbitrary-slice FIRST,
/// computed once at grammar build time. The memo table is the only
/// interior-mutable part: descriptors query it read-only during parsing.
pub struct FirstFollowTables {
    pub first: SymbolVec<FSet>,
    pub follow: HashMap<HeadIdx, FSet>,
    slice_memo: RefCell<HashMap<BodySlice, FSet>>,
}

impl FirstFollowTables {
    pub fn new(first: SymbolVec<FSet>, follow: HashMap<HeadIdx, FSet>) -> Self {
        FirstFollowTables { first, follow, slice_memo: RefCell::new(HashMap::new()) }
    }

    pub fn first_of_slice(&self, slice: BodySlice, body: &[SymbolIdx]) -> FSet {
        if let Some(cached) = self.slice_memo.borrow().get(&slice) {
            return cached.clone();
        }
        let result = first_of_sequence(&self.first, body, slice.start, slice.stop);
        self.slice_memo.borrow_mut().insert(slice, result.clone());
        result
    }

    pub fn follow_of(&self, head: HeadIdx) -> FSet {
        self.follow.get(&head).cloned().unwrap_or_default()
    }
}
