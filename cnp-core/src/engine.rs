//! The parse driver (C8): the descriptor loop and the five operations —
//! `handle_label`, `call`, `return_`, `bsr_add`, `descriptor_add` — that
//! advance it.

use crate::bsr::BsrKey;
use crate::context::Context;
use crate::descriptor::Descriptor;
use crate::filters;
use crate::fset::BodySlice;
use crate::grammar::Grammar;
use crate::label::Slot;
use crate::log;
use cnp_index::{BodyIdx, HeadIdx};

/// Runs the descriptor loop to completion (or, for a sub-parse, until
/// `success` is set) and returns whether the parse succeeded.
pub fn parse(g: &Grammar, ctx: &mut Context) -> bool {
    nonterminal_add(g, ctx, ctx.start, 0);

    loop {
        if ctx.config.sub && ctx.success {
            break;
        }
        if let Some(budget) = ctx.config.step_budget {
            if ctx.counters.descriptors_processed >= budget {
                break;
            }
        }
        let Some(d) = ctx.worklist.pop(ctx.config.lifo_worklist) else {
            break;
        };
        ctx.counters.descriptors_processed += 1;
        ctx.c_u = d.k;
        ctx.c_i = d.j;
        log!("handle_label {:?} cU={} cI={}", d.slot, d.k, d.j);
        handle_label(g, ctx, d.slot);
    }

    if !ctx.config.sub {
        apply_precedence_filters(g, ctx);
    }

    #[cfg(feature = "trace")]
    log!("parse finished: {}", crate::debug::paint(ctx.success, if ctx.success { "success" } else { "failure" }));

    ctx.success
}

fn add_descriptor(ctx: &mut Context, slot: Slot, k: usize, j: usize) {
    ctx.counters.descriptors_considered += 1;
    ctx.worklist.add(Descriptor { slot, k, j });
}

/// Seeds the worklist with every body of `head` whose FIRST/FOLLOW
/// predicts the lookahead at `j`. Used both to start the whole parse (at
/// the start symbol, position 0) and by `call` when a non-terminal's
/// cluster is encountered for the first time.
fn nonterminal_add(g: &Grammar, ctx: &mut Context, head: HeadIdx, j: usize) {
    let at_end = ctx.at_end(j);
    let c = ctx.char_at(j);
    for body_idx in g.body_indices(head) {
        let body = g.body(head, body_idx);
        let slice = BodySlice { head, body: body_idx, start: 0, stop: body.len() };
        if ctx.config.test_select_disabled || g.test_select(c, at_end, head, slice) {
            if let Some(slot) = g.label_of(head, body_idx, 0) {
                add_descriptor(ctx, slot, j, j);
            }
        }
    }
}

fn handle_label(g: &Grammar, ctx: &mut Context, slot: Slot) {
    let body = g.body(slot.head, slot.body);
    let body_len = body.len();

    if slot.dot == 0 && body_len == 0 {
        bsr_add(g, ctx, Slot { head: slot.head, body: slot.body, dot: 0 }, ctx.c_i, ctx.c_i, ctx.c_i);
        return_if_accepted(g, ctx, slot.head, ctx.c_u, ctx.c_i);
        return;
    }

    let mut dot = slot.dot;

    while dot < body_len && g.is_terminal(body[dot]) {
        if dot != 0 && !test_select_guard(g, ctx, slot.head, slot.body, dot, body_len) {
            return;
        }
        let Some(len) = g.terminal_match_len(body[dot], &ctx.input, ctx.c_i) else {
            return;
        };
        let pivot = ctx.c_i;
        dot += 1;
        let new_k = pivot + len;
        let advanced = Slot { head: slot.head, body: slot.body, dot };
        bsr_add(g, ctx, advanced, ctx.c_u, pivot, new_k);
        ctx.c_i = new_k;
    }

    if dot < body_len {
        if dot != 0 && !test_select_guard(g, ctx, slot.head, slot.body, dot, body_len) {
            return;
        }
        let call_position = ctx.c_i;
        dot += 1;
        let l_prime = g
            .label_of(slot.head, slot.body, dot)
            .expect("dot immediately after a non-terminal is always a registered label");
        call(g, ctx, l_prime, ctx.c_u, call_position);
        return;
    }

    let completed_on_terminal = dot > 0 && g.is_terminal(body[dot - 1]);
    if slot.dot == body_len || completed_on_terminal {
        return_if_accepted(g, ctx, slot.head, ctx.c_u, ctx.c_i);
    }
}

fn test_select_guard(g: &Grammar, ctx: &mut Context, head: HeadIdx, body: BodyIdx, dot: usize, body_len: usize) -> bool {
    if ctx.config.test_select_disabled {
        return true;
    }
    let at_end = ctx.at_end(ctx.c_i);
    let c = ctx.char_at(ctx.c_i);
    let slice = BodySlice { head, body, start: dot, stop: body_len };
    if g.test_select(c, at_end, head, slice) {
        true
    } else {
        ctx.counters.test_select_rejections += 1;
        false
    }
}

fn return_if_accepted(g: &Grammar, ctx: &mut Context, head: HeadIdx, k: usize, j: usize) {
    let at_end = ctx.at_end(j);
    let c = ctx.char_at(j);
    if g.follow_accepts(head, at_end, c) && filters::rule_passes_filters(g, ctx, head) {
        return_(g, ctx, head, k, j);
    }
}

/// Resolves the non-terminal call implied by `label` (whose dot now points
/// just past it), registering `label` as a child of the `(head_of_x, j)`
/// cluster and either seeding the cluster (first visit) or replaying its
/// already-known returns (revisit).
fn call(g: &Grammar, ctx: &mut Context, label: Slot, i: usize, j: usize) {
    let body = g.body(label.head, label.body);
    let x = body[label.dot - 1];
    let x_head = g.symbol_to_head(x);

    let (label_node, _) = ctx.crf.label(label, i);

    match ctx.crf.cluster_exists(x_head, j) {
        None => {
            let (cluster_node, _) = ctx.crf.cluster(x_head, j);
            ctx.crf.add_edge_if_absent(cluster_node, label_node);
            nonterminal_add(g, ctx, x_head, j);
        }
        Some(cluster_node) => {
            let newly = ctx.crf.add_edge_if_absent(cluster_node, label_node);
            if newly {
                if let Some(returns) = ctx.returns.get(&(x_head, j)).cloned() {
                    for h in returns {
                        add_descriptor(ctx, label, i, h);
                        bsr_add(g, ctx, label, i, j, h);
                    }
                }
            }
        }
    }
}

/// Records that `head`'s cluster starting at `k` has successfully derived
/// up to `j`, and replays that result to every label currently registered
/// as a child of `(head, k)`.
fn return_(g: &Grammar, ctx: &mut Context, head: HeadIdx, k: usize, j: usize) {
    {
        let set = ctx.returns.entry((head, k)).or_default();
        if !set.insert(j) {
            return;
        }
    }
    if head == ctx.start && k == 0 && (!ctx.config.whole || ctx.at_end(j)) {
        ctx.success = true;
    }
    let Some(cluster) = ctx.crf.cluster_exists(head, k) else {
        return;
    };
    let children: Vec<(Slot, usize)> = ctx.crf.children(cluster).collect();
    for (l_prime, i) in children {
        add_descriptor(ctx, l_prime, i, j);
        bsr_add(g, ctx, l_prime, i, k, j);
    }
}

/// Inserts a BSR entry for `label` spanning `[i, k)` with split point `j`,
/// and marks the parse successful if this completes the start symbol's
/// production across the whole call tree.
fn bsr_add(g: &Grammar, ctx: &mut Context, label: Slot, i: usize, j: usize, k: usize) {
    let body_len = g.body(label.head, label.body).len();
    if label.dot == body_len {
        let key = BsrKey::Prod { head: label.head, body: label.body, i, k };
        ctx.bsr.insert(key, j);
        if label.head == ctx.start && i == 0 && (!ctx.config.whole || k == ctx.input.len()) {
            ctx.success = true;
        }
    } else if label.dot > 1 {
        let key = BsrKey::Str { head: label.head, body: label.body, dot: label.dot, i, k };
        ctx.bsr.insert(key, j);
    }
}

fn apply_precedence_filters(g: &Grammar, ctx: &mut Context) {
    filters::apply_precedence_filters(g, ctx);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{GrammarBuilder, SymbolRefArg};
    use std::collections::BTreeSet;

    fn digit_list_grammar() -> Grammar {
        // S ::= D S | D ;  D ::= '0'..'9'
        let mut b = GrammarBuilder::new();
        let digits: BTreeSet<char> = ('0'..='9').collect();
        let d_term = b.add_charset_terminal("digit", digits);
        let s_head = b.ensure_head("S");
        let d_head = b.ensure_head("D");
        b.add_production(s_head, vec![SymbolRefArg::Head(d_head), SymbolRefArg::Head(s_head)]);
        b.add_production(s_head, vec![SymbolRefArg::Head(d_head)]);
        b.add_production(d_head, vec![SymbolRefArg::Term(d_term)]);
        b.set_start(s_head);
        b.build().unwrap()
    }

    #[test]
    fn parses_a_run_of_digits() {
        let g = digit_list_grammar();
        let mut ctx = Context::new("123", g.start_head(), crate::context::ParseConfig::default());
        assert!(parse(&g, &mut ctx));
    }

    #[test]
    fn rejects_input_with_a_non_digit() {
        let g = digit_list_grammar();
        let mut ctx = Context::new("12x", g.start_head(), crate::context::ParseConfig::default());
        assert!(!parse(&g, &mut ctx));
    }

    #[test]
    fn sub_parse_mode_accepts_a_prefix() {
        let g = digit_list_grammar();
        let cfg = crate::context::ParseConfig::default().with_whole(false).with_sub(true);
        let mut ctx = Context::new("12x", g.start_head(), cfg);
        assert!(parse(&g, &mut ctx));
    }

    #[test]
    fn ambiguous_grammar_records_multiple_bsr_pivots() {
        // E ::= E E | 'a'
        let mut b = GrammarBuilder::new();
        let mut set = BTreeSet::new();
        set.insert('a');
        let a_term = b.add_charset_terminal("a", set);
        let e_head = b.ensure_head("E");
        b.add_production(e_head, vec![SymbolRefArg::Head(e_head), SymbolRefArg::Head(e_head)]);
        b.add_production(e_head, vec![SymbolRefArg::Term(a_term)]);
        b.set_start(e_head);
        let g = b.build().unwrap();

        let mut ctx = Context::new("aaa", g.start_head(), crate::context::ParseConfig::default());
        assert!(parse(&g, &mut ctx));
        let key = BsrKey::Prod { head: e_head_idx(&g), body: BodyIdx(0), i: 0, k: 3 };
        let pivots = ctx.bsr.get(&key).expect("ambiguous top span recorded");
        assert!(pivots.len() >= 2, "expected both splits of aaa to be recorded, got {pivots:?}");
    }

    fn e_head_idx(g: &Grammar) -> HeadIdx {
        g.start_head()
    }
}
