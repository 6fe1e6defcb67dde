//! Diagnostic tracing of descriptor dispatch, CRF mutation, and BSR
//! insertion.
//!
//! `log!`/`logn!` mirror the shape of a `println!`/`print!` call but compile
//! to nothing unless the `trace` feature is enabled, so instrumented builds
//! can narrate the worklist without a release build paying for it. Colored
//! output is available under the same feature via the `colored` crate.

#[macro_export]
#[cfg(feature = "trace")]
macro_rules! log {
    ($($arg:tt)*) => {
        println!($($arg)*)
    };
}

#[macro_export]
#[cfg(not(feature = "trace"))]
macro_rules! log {
    ($($arg:tt)*) => {};
}

#[macro_export]
#[cfg(feature = "trace")]
macro_rules! logn {
    ($($arg:tt)*) => {
        print!($($arg)*)
    };
}

#[macro_export]
#[cfg(not(feature = "trace"))]
macro_rules! logn {
    ($($arg:tt)*) => {};
}

pub use crate::log;
pub use crate::logn;

/// Colorizes a trace line by outcome: green for an accepted descriptor
/// outcome, red for a rejected one. Only used inside `log!` call sites, so
/// it compiles to an identity function when `trace` is off and `colored`
/// is not even a dependency.
#[cfg(feature = "trace")]
pub fn paint(accepted: bool, s: &str) -> colored::ColoredString {
    use colored::Colorize;
    if accepted {
        s.green()
    } else {
        s.red()
    }
}

/// Plain counters kept on every [`crate::context::Context`] regardless of
/// the `trace` feature. Unlike `log!`/`logn!` these cost a handful of
/// integer increments, not a formatting call, so they stay on unconditionally
/// and back the E4 test-select-pruning regression (see
/// [`crate::engine`] and the crate's integration tests).
#[derive(Debug, Default, Clone, Copy)]
pub struct Counters {
    /// Descriptors offered to `descriptor_add`, whether or not they were new.
    pub descriptors_considered: usize,
    /// Descriptors actually dequeued and dispatched by `handle_label`.
    pub descriptors_processed: usize,
    /// Times `test_select` returned `false` and aborted a descriptor before
    /// any cursor advance or CRF mutation.
    pub test_select_rejections: usize,
}
