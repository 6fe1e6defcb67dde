//! Grammar symbols: terminals (charsets or literal code-point strings) and
//! non-terminals.

use std::collections::BTreeSet;

/// The atom a terminal symbol matches against the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminal {
    /// Matches exactly one code point drawn from the set.
    Charset(BTreeSet<char>),
    /// Matches the exact sequence of code points, consuming all of them at
    /// once (e.g. a keyword). Must be non-empty — an empty match belongs to
    /// an ε-body, not a terminal.
    Literal(Vec<char>),
}

impl Terminal {
    /// The code point a one-character lookahead oracle (`test_select`,
    /// FOLLOW-membership) should compare against. For a literal this is its
    /// first character: FIRST/FOLLOW sets only ever need a single character
    /// of lookahead, even though committing to a literal match later
    /// consumes its whole length.
    pub fn predicts(&self, c: char) -> bool {
        match self {
            Terminal::Charset(set) => set.contains(&c),
            Terminal::Literal(lit) => lit.first() == Some(&c),
        }
    }

    /// Attempts to match this terminal at `input[at..]`, returning the
    /// number of code points consumed on success.
    pub fn match_len(&self, input: &[char], at: usize) -> Option<usize> {
        match self {
            Terminal::Charset(set) => {
                let c = *input.get(at)?;
                set.contains(&c).then_some(1)
            }
            Terminal::Literal(lit) => {
                let end = at.checked_add(lit.len())?;
                if end > input.len() {
                    return None;
                }
                (input[at..end] == lit[..]).then_some(lit.len())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol {
    Terminal { name: String, terminal: Terminal },
    NonTerminal { name: String },
}

impl Symbol {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Symbol::Terminal { .. })
    }

    pub fn name(&self) -> &str {
        match self {
            Symbol::Terminal { name, .. } => name,
            Symbol::NonTerminal { name } => name,
        }
    }
}

/// The three documented shapes a `nofollow`/`reject` filter entry can take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterEntry {
    Charset(BTreeSet<char>),
    Literal(Vec<char>),
    Head(cnp_index::HeadIdx),
}

/// A production's precedence annotation, consulted by the post-pass
/// precedence filter (§4.10).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precedence {
    pub group: u32,
    pub assoc: Assoc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
    NonAssoc,
}
