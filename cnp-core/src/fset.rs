//! FIRST/FOLLOW sets and slice identity for the memoized arbitrary-slice
//! FIRST computation used by `test_select`.

use cnp_index::{BodyIdx, HeadIdx, TermIdx};
use std::collections::BTreeSet;

/// A FIRST or FOLLOW set: a set of terminals plus a flag standing in for
/// "the empty string may appear here" (for FIRST) or "end of input may
/// follow here" (for FOLLOW). Keeping the flag out of the terminal set
/// avoids needing a synthetic end-of-input terminal index threaded through
/// every oracle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FSet {
    pub terminals: BTreeSet<TermIdx>,
    pub special: bool,
}

impl FSet {
    pub fn singleton(t: TermIdx) -> Self {
        let mut terminals = BTreeSet::new();
        terminals.insert(t);
        FSet { terminals, special: false }
    }

    pub fn epsilon() -> Self {
        FSet { terminals: BTreeSet::new(), special: true }
    }

    /// Merges `other` into `self`, returning whether `self` grew. Used to
    /// detect convergence in the FIRST/FOLLOW fixed-point loops.
    pub fn union_in_place(&mut self, other: &FSet) -> bool {
        let mut grew = false;
        for &t in &other.terminals {
            grew |= self.terminals.insert(t);
        }
        if other.special && !self.special {
            self.special = true;
            grew = true;
        }
        grew
    }

    pub fn contains(&self, t: TermIdx) -> bool {
        self.terminals.contains(&t)
    }
}

/// Identifies a contiguous slice `body[start..stop]` of a specific
/// production body. Two slices are equal iff they name the same body range
/// of the same production — there is no lookahead or context folded into
/// the key, so the memo table in [`crate::grammar::Grammar`] is sound to
/// share across every descriptor that ever asks about the same slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodySlice {
    pub head: HeadIdx,
    pub body: BodyIdx,
    pub start: usize,
    pub stop: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_reports_growth_only_when_new_terminals_added() {
        let mut a = FSet::singleton(TermIdx(0));
        let b = FSet::singleton(TermIdx(0));
        assert!(!a.union_in_place(&b));
        let c = FSet::singleton(TermIdx(1));
        assert!(a.union_in_place(&c));
        assert!(a.contains(TermIdx(1)));
    }

    #[test]
    fn union_propagates_special_flag() {
        let mut a = FSet::singleton(TermIdx(0));
        assert!(!a.special);
        let eps = FSet::epsilon();
        assert!(a.union_in_place(&eps));
        assert!(a.special);
        // Once set, re-unioning with a non-special set doesn't clear it.
        let b = FSet::singleton(TermIdx(2));
        a.union_in_place(&b);
        assert!(a.special);
    }

    #[test]
    fn slice_identity_ignores_nothing_but_head_body_start_stop() {
        let s1 = BodySlice { head: HeadIdx(0), body: BodyIdx(1), start: 0, stop: 2 };
        let s2 = BodySlice { head: HeadIdx(0), body: BodyIdx(1), start: 0, stop: 2 };
        let s3 = BodySlice { head: HeadIdx(0), body: BodyIdx(1), start: 0, stop: 3 };
        assert_eq!(s1, s2);
        assert_ne!(s1, s3);
    }
}
