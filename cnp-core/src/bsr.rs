//! The BSR forest (C7): an insert-only map from a production or partial-body
//! span to the set of pivots (split points) at which that span has been
//! derived. Every entry the engine ever inserts stays in the forest even if
//! a later precedence-filter pass discards a pivot, except for precedence
//! filtering itself, which is documented as the one pass allowed to retract
//! pivots after the fact.

use cnp_index::{BodyIdx, HeadIdx};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BsrKey {
    /// A whole production `head ::= body` spans `[i, k)`.
    Prod { head: HeadIdx, body: BodyIdx, i: usize, k: usize },
    /// A proper prefix `body[0..dot)` of a production spans `[i, k)`.
    Str { head: HeadIdx, body: BodyIdx, dot: usize, i: usize, k: usize },
}

#[derive(Default)]
pub struct BsrForest {
    pivots: HashMap<BsrKey, BTreeSet<usize>>,
}

impl BsrForest {
    pub fn new() -> Self {
        Default::default()
    }

    /// Records `pivot` as a valid split point for `key`. Returns whether
    /// this was a new pivot (insert-only dedup, matching the forest's role
    /// as a set-valued map rather than a multiset).
    pub fn insert(&mut self, key: BsrKey, pivot: usize) -> bool {
        self.pivots.entry(key).or_default().insert(pivot)
    }

    pub fn get(&self, key: &BsrKey) -> Option<&BTreeSet<usize>> {
        self.pivots.get(key)
    }

    pub fn contains_key(&self, key: &BsrKey) -> bool {
        self.pivots.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &BsrKey> {
        self.pivots.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BsrKey, &BTreeSet<usize>)> {
        self.pivots.iter()
    }

    pub fn len(&self) -> usize {
        self.pivots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pivots.is_empty()
    }

    /// Removes a single pivot from `key`'s pivot set, dropping the key
    /// entirely once its pivot set is empty. Used only by the precedence
    /// filter post-pass.
    pub fn remove_pivot(&mut self, key: &BsrKey, pivot: usize) {
        if let Some(set) = self.pivots.get_mut(key) {
            set.remove(&pivot);
            if set.is_empty() {
                self.pivots.remove(key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prod_key(i: usize, k: usize) -> BsrKey {
        BsrKey::Prod { head: HeadIdx(0), body: BodyIdx(0), i, k }
    }

    #[test]
    fn inserting_the_same_pivot_twice_does_not_duplicate() {
        let mut y = BsrForest::new();
        assert!(y.insert(prod_key(0, 3), 1));
        assert!(!y.insert(prod_key(0, 3), 1));
        assert_eq!(y.get(&prod_key(0, 3)).unwrap().len(), 1);
    }

    #[test]
    fn ambiguous_span_accumulates_multiple_pivots() {
        let mut y = BsrForest::new();
        y.insert(prod_key(0, 5), 2);
        y.insert(prod_key(0, 5), 4);
        let pivots: Vec<_> = y.get(&prod_key(0, 5)).unwrap().iter().copied().collect();
        assert_eq!(pivots, vec![2, 4]);
    }

    #[test]
    fn removing_the_last_pivot_drops_the_key() {
        let mut y = BsrForest::new();
        y.insert(prod_key(0, 3), 1);
        y.remove_pivot(&prod_key(0, 3), 1);
        assert!(!y.contains_key(&prod_key(0, 3)));
    }
}
