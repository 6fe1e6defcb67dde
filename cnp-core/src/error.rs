//! Crate-level error type.
//!
//! Only grammar construction is fallible. Once a [`crate::grammar::Grammar`]
//! has been built successfully the engine trusts it completely: an
//! inconsistency discovered while parsing (a dangling body reference, an
//! out-of-range symbol index) is a bug in `Grammar::build`'s validation, not
//! a condition a caller can recover from, and is reported with a panic
//! instead of a `Result` (see the design notes on fatal errors).

use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// A production body referenced a symbol index that has no entry in the
    /// symbol table.
    UnknownSymbol(usize),
    /// A production referenced a body index that does not exist for its
    /// head.
    DanglingBody { head: usize, body: usize },
    /// A `nofollow`/`reject` filter entry did not match one of the three
    /// documented shapes (charset, literal string, head index).
    UnknownFilterTag,
    /// No start symbol was designated before calling `build`.
    NoStartSymbol,
    /// The designated start symbol index is not a non-terminal.
    StartSymbolNotNonTerminal(usize),
    /// A convenience constructor that reads a grammar or input from disk
    /// failed at the filesystem boundary.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownSymbol(idx) => {
                write!(f, "grammar references unknown symbol index {idx}")
            }
            Error::DanglingBody { head, body } => write!(
                f,
                "grammar references body {body} of head {head}, which has no such body"
            ),
            Error::UnknownFilterTag => {
                write!(f, "filter entry did not match charset, literal, or head-index shape")
            }
            Error::NoStartSymbol => write!(f, "grammar has no start symbol"),
            Error::StartSymbolNotNonTerminal(idx) => {
                write!(f, "start symbol {idx} is not a non-terminal")
            }
            Error::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
