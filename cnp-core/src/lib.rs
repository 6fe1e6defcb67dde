//! Clustered Non-terminal Parsing: a worst-case-cubic, fully general
//! context-free parsing engine that handles left recursion, right
//! recursion, ambiguity, and nullable productions uniformly, producing a
//! Binary Subtree Representation forest of every derivation rather than a
//! single parse tree.
//!
//! A grammar is assembled with [`GrammarBuilder`] and validated once by
//! [`GrammarBuilder::build`]; parsing an input against it is a single call
//! to [`parse`] with a fresh [`Context`]. The BSR forest left behind on
//! `Context::bsr` records every span any production derived, plus the
//! pivot (split point) of each derivation, which is enough to reconstruct
//! every tree in an ambiguous parse without ever materializing them all at
//! once.

pub mod bsr;
pub mod context;
pub mod crf;
pub mod debug;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod filters;
pub mod first_follow;
pub mod fset;
pub mod grammar;
pub mod label;
pub mod symbol;

pub use bsr::{BsrForest, BsrKey};
pub use context::{Context, ParseConfig};
pub use debug::Counters;
pub use engine::parse;
pub use error::{Error, Result};
pub use grammar::{Grammar, GrammarBuilder, SymbolRefArg};
pub use label::Slot;
pub use symbol::{Assoc, FilterEntry, Precedence, Symbol, Terminal};
