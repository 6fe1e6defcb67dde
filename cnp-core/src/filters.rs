//! Filter evaluation (C9): the `nofollow` and `reject` guards consulted on
//! every candidate return, and the precedence/associativity post-pass that
//! prunes ambiguous BSR pivots once a parse finishes.
//!
//! `nofollow` and `reject` entries that name a non-terminal re-enter the
//! engine as a nested sub-parse (`ParseConfig::sub`), which is the one
//! place outside the top-level `parse` call where this crate runs the
//! descriptor loop recursively.

use crate::bsr::BsrKey;
use crate::context::{Context, ParseConfig};
use crate::engine;
use crate::grammar::Grammar;
use crate::symbol::{Assoc, FilterEntry, Precedence};
use cnp_index::{BodyIdx, HeadIdx};

/// Runs both filters for a candidate return from `head`'s cluster at the
/// current cursor. `true` means the return is allowed.
pub fn rule_passes_filters(g: &Grammar, ctx: &Context, head: HeadIdx) -> bool {
    if let Some(entry) = g.nofollow(head) {
        if nofollow_matches(g, ctx, entry) {
            return false;
        }
    }
    if let Some(entry) = g.reject(head) {
        if reject_matches(g, ctx, entry) {
            return false;
        }
    }
    true
}

/// `nofollow`: the return is rejected if `entry` matches what comes
/// *after* the current cursor.
fn nofollow_matches(g: &Grammar, ctx: &Context, entry: &FilterEntry) -> bool {
    match entry {
        FilterEntry::Charset(set) => {
            // Code point 0 (end of input) is never a member of a charset
            // filter, so running past the end of input never matches here.
            !ctx.at_end(ctx.c_i) && set.contains(&ctx.char_at(ctx.c_i))
        }
        FilterEntry::Literal(lit) => {
            let end = ctx.c_i + lit.len();
            end <= ctx.input.len() && ctx.input[ctx.c_i..end] == lit[..]
        }
        FilterEntry::Head(h) => sub_parse_accepts(g, ctx.input[ctx.c_i..].to_vec(), *h, false),
    }
}

/// `reject`: the return is rejected if `entry` matches the span that was
/// just derived, `input[cU..cI)`.
fn reject_matches(g: &Grammar, ctx: &Context, entry: &FilterEntry) -> bool {
    let span = &ctx.input[ctx.c_u..ctx.c_i];
    match entry {
        FilterEntry::Charset(set) => span.len() == 1 && set.contains(&span[0]),
        FilterEntry::Literal(lit) => span == lit.as_slice(),
        FilterEntry::Head(h) => sub_parse_accepts(g, span.to_vec(), *h, true),
    }
}

fn sub_parse_accepts(g: &Grammar, slice: Vec<char>, head: HeadIdx, whole: bool) -> bool {
    let cfg = ParseConfig::default().with_whole(whole).with_sub(true);
    let mut sub_ctx = Context::from_chars(slice, head, cfg);
    engine::parse(g, &mut sub_ctx)
}

/// The post-pass precedence/associativity filter (§4.10). Scoped to binary
/// infix productions of the shape `head ::= operand ... operand` (a
/// non-terminal, then any number of symbols, then a non-terminal): these
/// are the only shape where "the left/right operand nests a lower- or
/// equal-precedence sibling" is unambiguous to state from the BSR alone.
/// Productions with any other shape simply keep every pivot they derived.
pub fn apply_precedence_filters(g: &Grammar, ctx: &mut Context) {
    let candidates: Vec<(HeadIdx, BodyIdx, usize, usize, Precedence)> = ctx
        .bsr
        .keys()
        .filter_map(|key| match key {
            BsrKey::Prod { head, body, i, k } => {
                g.precedence(*head, *body).map(|p| (*head, *body, *i, *k, p))
            }
            BsrKey::Str { .. } => None,
        })
        .collect();

    for (head, body, i, k, prec) in candidates {
        let syms = g.body(head, body);
        if syms.len() < 2 || g.is_terminal(syms[0]) || g.is_terminal(*syms.last().unwrap()) {
            continue;
        }
        let prod_key = BsrKey::Prod { head, body, i, k };
        let Some(pivots) = ctx.bsr.get(&prod_key).cloned() else { continue };

        for j in pivots {
            let left_ends = left_operand_ends(g, ctx, head, body, i, j);
            let mut remove = false;
            for left_end in &left_ends {
                if let Some(child_prec) = dominant_precedence(g, ctx, i, *left_end) {
                    if violates_as_left(prec, child_prec) {
                        remove = true;
                    }
                }
            }
            if let Some(child_prec) = dominant_precedence(g, ctx, j, k) {
                if violates_as_right(prec, child_prec) {
                    remove = true;
                }
            }
            if remove {
                ctx.bsr.remove_pivot(&prod_key, j);
            }
        }
    }
}

/// Where the left operand (`body[0]`) could end, given that the whole
/// production's last split point is `j`. A two-symbol body (`operand
/// OPERATOR`-less edge case, e.g. `head ::= operand operand`) has the left
/// operand occupy the entire prefix `[i, j)` directly; a longer body looks
/// up the recorded str-BSR split for the prefix excluding the last symbol.
fn left_operand_ends(g: &Grammar, ctx: &Context, head: HeadIdx, body: BodyIdx, i: usize, j: usize) -> Vec<usize> {
    let syms = g.body(head, body);
    if syms.len() == 2 {
        return vec![j];
    }
    let prefix_dot = syms.len() - 1;
    match ctx.bsr.get(&BsrKey::Str { head, body, dot: prefix_dot, i, k: j }) {
        Some(set) => set.iter().copied().collect(),
        None => Vec::new(),
    }
}

/// Finds a precedence-annotated production whose Prod-BSR spans exactly
/// `[start, stop)`, if any. When more than one candidate exists (an
/// ambiguous sub-derivation), the first one iteration happens to visit is
/// used — good enough to decide "is *a* lower-precedence production
/// nested here", which is all the filter needs.
fn dominant_precedence(g: &Grammar, ctx: &Context, start: usize, stop: usize) -> Option<Precedence> {
    ctx.bsr.keys().find_map(|key| match key {
        BsrKey::Prod { head, body, i, k } if *i == start && *k == stop => g.precedence(*head, *body),
        _ => None,
    })
}

fn violates_as_left(parent: Precedence, child: Precedence) -> bool {
    if child.group < parent.group {
        return true;
    }
    if child.group == parent.group {
        return !matches!(parent.assoc, Assoc::Left);
    }
    false
}

fn violates_as_right(parent: Precedence, child: Precedence) -> bool {
    if child.group < parent.group {
        return true;
    }
    if child.group == parent.group {
        return !matches!(parent.assoc, Assoc::Right);
    }
    false
}
