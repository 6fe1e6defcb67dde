//! Slots (labels): the grammar positions the CNP engine dispatches control
//! to.

use cnp_index::{BodyIdx, HeadIdx, SlotIdx, SlotVec, SymbolIdx};
use indexmap::IndexMap;
use std::collections::HashMap;

/// A (head, body-index, dot) triple marking a dispatch point in a
/// production. `dot` ranges over `0..=body.len()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot {
    pub head: HeadIdx,
    pub body: BodyIdx,
    pub dot: usize,
}

/// Enumerates the labels the engine jumps to for a grammar: the dot-0 slot
/// of every body, plus every slot whose dot immediately follows a
/// non-terminal. Terminals never anchor a label because `handle_label`
/// consumes runs of terminals in a tight loop rather than one dispatch per
/// terminal.
pub fn generate_labels(
    productions: &IndexMap<HeadIdx, Vec<Vec<SymbolIdx>>>,
    is_terminal: impl Fn(SymbolIdx) -> bool,
) -> (SlotVec<Slot>, HashMap<(HeadIdx, BodyIdx, usize), SlotIdx>) {
    let mut labels = SlotVec::new();
    let mut index = HashMap::new();

    for (&head, bodies) in productions {
        for (body_idx, body) in bodies.iter().enumerate() {
            let body_idx = BodyIdx(body_idx);
            let slot = Slot { head, body: body_idx, dot: 0 };
            let idx = labels.push(slot);
            index.insert((head, body_idx, 0), idx);

            for dot in 1..=body.len() {
                if !is_terminal(body[dot - 1]) {
                    let slot = Slot { head, body: body_idx, dot };
                    let idx = labels.push(slot);
                    index.insert((head, body_idx, dot), idx);
                }
            }
        }
    }

    (labels, index)
}
