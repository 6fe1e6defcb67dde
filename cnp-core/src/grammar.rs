//! The grammar store (C1): a validated, immutable grammar plus the
//! derived FIRST/FOLLOW tables and slot labels the engine dispatches on.
//!
//! Construction is two-phase, mirroring how a table-driven parser generator
//! separates "collect productions" from "build derived tables": a
//! [`GrammarBuilder`] accumulates terminals, non-terminals, bodies, and
//! filter/precedence annotations by name; [`GrammarBuilder::build`]
//! resolves names to indices, validates every cross-reference, and
//! computes FIRST, FOLLOW, and slot labels once up front so parsing itself
//! never has to.

use crate::error::{Error, Result};
use crate::first_follow::{compute_first_sets, compute_follow_sets, FirstFollowTables};
use crate::fset::{BodySlice, FSet};
use crate::label::{generate_labels, Slot};
use crate::symbol::{FilterEntry, Precedence, Symbol, Terminal};
use cnp_index::{BodyIdx, HeadIdx, SlotIdx, SlotVec, SymbolIdx, SymbolVec, TermIdx};
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap};

pub type Body = Vec<SymbolIdx>;

/// A production body as the builder sees it, before terminal/head counts
/// are final and symbol indices can be assigned. Kept separate from the
/// final `Body` (`Vec<SymbolIdx>`) so that terminals can keep being added
/// after non-terminals start appearing in bodies without invalidating
/// already-recorded references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SymbolRef {
    Term(TermIdx),
    Head(HeadIdx),
}

pub struct GrammarBuilder {
    term_names: Vec<String>,
    terminals: Vec<Terminal>,
    head_names: Vec<String>,
    name_to_head: HashMap<String, HeadIdx>,
    productions: IndexMap<HeadIdx, Vec<Vec<SymbolRef>>>,
    start: Option<HeadIdx>,
    nofollow: HashMap<HeadIdx, FilterEntry>,
    reject: HashMap<HeadIdx, FilterEntry>,
    precedence: HashMap<(HeadIdx, BodyIdx), Precedence>,
}

impl GrammarBuilder {
    pub fn new() -> Self {
        GrammarBuilder {
            term_names: Vec::new(),
            terminals: Vec::new(),
            head_names: Vec::new(),
            name_to_head: HashMap::new(),
            productions: IndexMap::new(),
            start: None,
            nofollow: HashMap::new(),
            reject: HashMap::new(),
            precedence: HashMap::new(),
        }
    }

    pub fn add_charset_terminal(&mut self, name: &str, set: BTreeSet<char>) -> TermIdx {
        let idx = TermIdx(self.terminals.len());
        self.terminals.push(Terminal::Charset(set));
        self.term_names.push(name.to_string());
        idx
    }

    pub fn add_literal_terminal(&mut self, name: &str, literal: &str) -> TermIdx {
        let idx = TermIdx(self.terminals.len());
        self.terminals.push(Terminal::Literal(literal.chars().collect()));
        self.term_names.push(name.to_string());
        idx
    }

    /// Interns a non-terminal name, creating it with no bodies yet if this
    /// is the first mention.
    pub fn ensure_head(&mut self, name: &str) -> HeadIdx {
        if let Some(&idx) = self.name_to_head.get(name) {
            return idx;
        }
        let idx = HeadIdx(self.head_names.len());
        self.head_names.push(name.to_string());
        self.name_to_head.insert(name.to_string(), idx);
        self.productions.entry(idx).or_default();
        idx
    }

    pub fn add_production(&mut self, head: HeadIdx, body: Vec<SymbolRefArg>) -> BodyIdx {
        let body: Vec<SymbolRef> = body
            .into_iter()
            .map(|s| match s {
                SymbolRefArg::Term(t) => SymbolRef::Term(t),
                SymbolRefArg::Head(h) => SymbolRef::Head(h),
            })
            .collect();
        let bodies = self.productions.entry(head).or_default();
        let idx = BodyIdx(bodies.len());
        bodies.push(body);
        idx
    }

    pub fn set_start(&mut self, head: HeadIdx) {
        self.start = Some(head);
    }

    pub fn set_nofollow(&mut self, head: HeadIdx, entry: FilterEntry) {
        self.nofollow.insert(head, entry);
    }

    pub fn set_reject(&mut self, head: HeadIdx, entry: FilterEntry) {
        self.reject.insert(head, entry);
    }

    pub fn set_precedence(&mut self, head: HeadIdx, body: BodyIdx, prec: Precedence) {
        self.precedence.insert((head, body), prec);
    }

    pub fn build(self) -> Result<Grammar> {
        let term_count = self.terminals.len();
        let head_count = self.head_names.len();

        let start = self.start.ok_or(Error::NoStartSymbol)?;
        if start.0 >= head_count {
            return Err(Error::StartSymbolNotNonTerminal(start.0));
        }

        let mut symbols: SymbolVec<Symbol> = SymbolVec::with_capacity(term_count + head_count);
        for (name, terminal) in self.term_names.into_iter().zip(self.terminals.into_iter()) {
            symbols.push(Symbol::Terminal { name, terminal });
        }
        for name in self.head_names {
            symbols.push(Symbol::NonTerminal { name });
        }

        let resolve = |s: SymbolRef| -> Result<SymbolIdx> {
            match s {
                SymbolRef::Term(t) => {
                    if t.0 >= term_count {
                        return Err(Error::UnknownSymbol(t.0));
                    }
                    Ok(t.to_symbol_idx())
                }
                SymbolRef::Head(h) => {
                    if h.0 >= head_count {
                        return Err(Error::UnknownSymbol(h.0 + term_count));
                    }
                    Ok(h.to_symbol_idx(term_count))
                }
            }
        };

        let mut productions: IndexMap<HeadIdx, Vec<Body>> = IndexMap::new();
        for (head, bodies) in self.productions {
            let mut resolved_bodies = Vec::with_capacity(bodies.len());
            for body in bodies {
                let mut resolved = Vec::with_capacity(body.len());
                for s in body {
                    resolved.push(resolve(s)?);
                }
                resolved_bodies.push(resolved);
            }
            productions.insert(head, resolved_bodies);
        }

        for entry in self.nofollow.values().chain(self.reject.values()) {
            if let FilterEntry::Head(h) = entry {
                if h.0 >= head_count {
                    return Err(Error::UnknownSymbol(h.0 + term_count));
                }
            }
        }
        for &(head, body) in self.precedence.keys() {
            let bodies = productions.get(&head).ok_or(Error::DanglingBody { head: head.0, body: body.0 })?;
            if body.0 >= bodies.len() {
                return Err(Error::DanglingBody { head: head.0, body: body.0 });
            }
        }

        let is_terminal = |s: SymbolIdx| s.0 < term_count;
        let first = compute_first_sets(&symbols, term_count, &productions);
        let follow = compute_follow_sets(term_count, start, &productions, &first);
        let tables = FirstFollowTables::new(first, follow);
        let (labels, label_index) = generate_labels(&productions, is_terminal);

        Ok(Grammar {
            symbols,
            term_count,
            productions,
            start,
            nofollow: self.nofollow,
            reject: self.reject,
            precedence: self.precedence,
            tables,
            labels,
            label_index,
        })
    }
}

impl Default for GrammarBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// What `add_production`'s body vector holds before resolution. Exists so
/// callers write `SymbolRefArg::Term(t)` / `SymbolRefArg::Head(h)` without
/// reaching into this module's private `SymbolRef`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolRefArg {
    Term(TermIdx),
    Head(HeadIdx),
}

/// A fully validated grammar with its derived FIRST/FOLLOW tables and slot
/// labels. Cheap to share across threads behind an `Arc` (nothing here is
/// mutated once built except the interior FIRST-of-slice memo, which is a
/// private, lock-free `RefCell` local to a single parse's call graph of
/// read-only lookups — see the note on `Context` not being `Sync`).
pub struct Grammar {
    symbols: SymbolVec<Symbol>,
    term_count: usize,
    productions: IndexMap<HeadIdx, Vec<Body>>,
    start: HeadIdx,
    nofollow: HashMap<HeadIdx, FilterEntry>,
    reject: HashMap<HeadIdx, FilterEntry>,
    precedence: HashMap<(HeadIdx, BodyIdx), Precedence>,
    tables: FirstFollowTables,
    labels: SlotVec<Slot>,
    label_index: HashMap<(HeadIdx, BodyIdx, usize), SlotIdx>,
}

impl Grammar {
    pub fn builder() -> GrammarBuilder {
        GrammarBuilder::new()
    }

    pub fn is_terminal(&self, s: SymbolIdx) -> bool {
        s.0 < self.term_count
    }

    pub fn symbol(&self, s: SymbolIdx) -> &Symbol {
        &self.symbols[s]
    }

    pub fn symbol_to_head(&self, s: SymbolIdx) -> HeadIdx {
        debug_assert!(!self.is_terminal(s));
        HeadIdx(s.0 - self.term_count)
    }

    pub fn start_head(&self) -> HeadIdx {
        self.start
    }

    pub fn start_symbol_idx(&self) -> SymbolIdx {
        self.start.to_symbol_idx(self.term_count)
    }

    pub fn bodies(&self, head: HeadIdx) -> &[Body] {
        self.productions.get(&head).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn body(&self, head: HeadIdx, body: BodyIdx) -> &Body {
        &self.productions[&head][body.0]
    }

    pub fn body_indices(&self, head: HeadIdx) -> impl Iterator<Item = BodyIdx> {
        (0..self.bodies(head).len()).map(BodyIdx)
    }

    pub fn nofollow(&self, head: HeadIdx) -> Option<&FilterEntry> {
        self.nofollow.get(&head)
    }

    pub fn reject(&self, head: HeadIdx) -> Option<&FilterEntry> {
        self.reject.get(&head)
    }

    pub fn precedence(&self, head: HeadIdx, body: BodyIdx) -> Option<Precedence> {
        self.precedence.get(&(head, body)).copied()
    }

    pub fn label_of(&self, head: HeadIdx, body: BodyIdx, dot: usize) -> Option<Slot> {
        self.label_index.get(&(head, body, dot)).map(|&idx| self.labels[idx])
    }

    pub fn terminal_match_len(&self, s: SymbolIdx, input: &[char], at: usize) -> Option<usize> {
        match self.symbol(s) {
            Symbol::Terminal { terminal, .. } => terminal.match_len(input, at),
            Symbol::NonTerminal { .. } => None,
        }
    }

    pub fn first_of_slice(&self, slice: BodySlice) -> FSet {
        let body = self.body(slice.head, slice.body);
        self.tables.first_of_slice(slice, body)
    }

    fn terminal_set_predicts(&self, set: &BTreeSet<TermIdx>, c: char) -> bool {
        set.iter().any(|&t| match self.symbol(t.to_symbol_idx()) {
            Symbol::Terminal { terminal, .. } => terminal.predicts(c),
            Symbol::NonTerminal { .. } => false,
        })
    }

    /// `test_select(c, at_end, A, slice)`: true iff the upcoming input can
    /// plausibly continue a derivation of `slice`, either because `c`
    /// (irrelevant when `at_end`) is in FIRST(slice), or because `slice` is
    /// nullable and the lookahead is in FOLLOW(A).
    pub fn test_select(&self, c: char, at_end: bool, head: HeadIdx, slice: BodySlice) -> bool {
        let first = self.first_of_slice(slice);
        if !at_end && self.terminal_set_predicts(&first.terminals, c) {
            return true;
        }
        if first.special {
            return self.follow_accepts(head, at_end, c);
        }
        false
    }

    pub fn follow_accepts(&self, head: HeadIdx, at_end: bool, c: char) -> bool {
        let follow = self.tables.follow_of(head);
        if at_end {
            follow.special
        } else {
            self.terminal_set_predicts(&follow.terminals, c)
        }
    }

    /// Explicit counterpart to `Drop` for callers that want to free the
    /// grammar's symbol tables and FIRST/FOLLOW/label data at a known point.
    pub fn release(self) {}
}
