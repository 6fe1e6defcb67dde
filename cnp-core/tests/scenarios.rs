//! Black-box integration tests covering the end-to-end scenarios.

use cnp_core::{
    Assoc, BsrKey, Context, FilterEntry, Grammar, GrammarBuilder, ParseConfig, Precedence,
    SymbolRefArg,
};
use std::collections::BTreeSet;

fn charset(chars: impl IntoIterator<Item = char>) -> BTreeSet<char> {
    chars.into_iter().collect()
}

/// E1: `S ::= ε`, input "". success=true, one prod-BSR (S,0,0,0) pivot 0.
#[test]
fn e1_nullable_start() {
    let mut b = GrammarBuilder::new();
    let s = b.ensure_head("S");
    let body = b.add_production(s, vec![]);
    b.set_start(s);
    let g = b.build().unwrap();

    let mut ctx = Context::new("", g.start_head(), ParseConfig::default());
    assert!(cnp_core::parse(&g, &mut ctx));

    let key = BsrKey::Prod { head: s, body, i: 0, k: 0 };
    let pivots = ctx.bsr.get(&key).expect("epsilon prod-BSR recorded");
    assert_eq!(pivots.iter().copied().collect::<Vec<_>>(), vec![0]);
}

/// E2: `E ::= E '+' '1' | '1'`, input "1+1+1". Unambiguous left recursion:
/// success=true, and every completed prod-BSR carries exactly one pivot.
#[test]
fn e2_left_recursion_is_unambiguous() {
    let mut b = GrammarBuilder::new();
    let plus = b.add_charset_terminal("plus", charset(['+']));
    let one = b.add_charset_terminal("one", charset(['1']));
    let e = b.ensure_head("E");
    b.add_production(e, vec![SymbolRefArg::Head(e), SymbolRefArg::Term(plus), SymbolRefArg::Term(one)]);
    b.add_production(e, vec![SymbolRefArg::Term(one)]);
    b.set_start(e);
    let g = b.build().unwrap();

    let mut ctx = Context::new("1+1+1", g.start_head(), ParseConfig::default());
    assert!(cnp_core::parse(&g, &mut ctx));

    for (key, pivots) in ctx.bsr.iter() {
        if let BsrKey::Prod { .. } = key {
            assert_eq!(pivots.len(), 1, "unambiguous grammar should only ever record one pivot per span, got {pivots:?} for {key:?}");
        }
    }
}

/// E3: `E ::= E '+' E | '1'`, input "1+1+1". The top span is ambiguous:
/// prod-BSR(E, plus-body, i=0, k=5) has pivots {2, 4}.
#[test]
fn e3_ambiguity_produces_two_pivots() {
    let mut b = GrammarBuilder::new();
    let plus = b.add_charset_terminal("plus", charset(['+']));
    let one = b.add_charset_terminal("one", charset(['1']));
    let e = b.ensure_head("E");
    let plus_body = b.add_production(e, vec![SymbolRefArg::Head(e), SymbolRefArg::Term(plus), SymbolRefArg::Head(e)]);
    b.add_production(e, vec![SymbolRefArg::Term(one)]);
    b.set_start(e);
    let g = b.build().unwrap();

    let mut ctx = Context::new("1+1+1", g.start_head(), ParseConfig::default());
    assert!(cnp_core::parse(&g, &mut ctx));

    let key = BsrKey::Prod { head: e, body: plus_body, i: 0, k: 5 };
    let pivots: Vec<usize> = ctx.bsr.get(&key).expect("top span recorded").iter().copied().collect();
    assert_eq!(pivots, vec![2, 4]);
}

/// E4: `S ::= 'a' A 'b' | 'a' A 'c'; A ::= 'x'`, input "axc". test_select
/// must prune the `'a' A 'b'` alternative once `A` returns and the
/// lookahead is 'c', so the processed-descriptor count with the oracle on
/// is strictly smaller than with it disabled.
#[test]
fn e4_test_select_prunes_work() {
    fn build() -> Grammar {
        let mut b = GrammarBuilder::new();
        let a = b.add_charset_terminal("a", charset(['a']));
        let x = b.add_charset_terminal("x", charset(['x']));
        let bt = b.add_charset_terminal("b", charset(['b']));
        let c = b.add_charset_terminal("c", charset(['c']));
        let s = b.ensure_head("S");
        let a_head = b.ensure_head("A");
        b.add_production(s, vec![SymbolRefArg::Term(a), SymbolRefArg::Head(a_head), SymbolRefArg::Term(bt)]);
        b.add_production(s, vec![SymbolRefArg::Term(a), SymbolRefArg::Head(a_head), SymbolRefArg::Term(c)]);
        b.add_production(a_head, vec![SymbolRefArg::Term(x)]);
        b.set_start(s);
        b.build().unwrap()
    }

    let g = build();
    let mut with_select = Context::new("axc", g.start_head(), ParseConfig::default());
    assert!(cnp_core::parse(&g, &mut with_select));

    let g2 = build();
    let cfg = ParseConfig::default().with_test_select_disabled(true);
    let mut without_select = Context::new("axc", g2.start_head(), cfg);
    assert!(cnp_core::parse(&g2, &mut without_select));

    assert!(with_select.counters.descriptors_processed < without_select.counters.descriptors_processed);
    assert!(with_select.counters.test_select_rejections > 0);
}

/// E5: `K ::= 'if'` with nofollow = charset{a..z,0..9,_}. Input "ifx": the
/// keyword match at [0,2) must be rejected because 'x' follows, so a
/// top-level rule requiring exactly `K` fails on "ifx".
#[test]
fn e5_nofollow_charset_rejects_keyword_prefix_of_identifier() {
    let mut b = GrammarBuilder::new();
    let if_lit = b.add_literal_terminal("if", "if");
    let k = b.ensure_head("K");
    b.add_production(k, vec![SymbolRefArg::Term(if_lit)]);
    let mut nofollow_chars: BTreeSet<char> = ('a'..='z').collect();
    nofollow_chars.extend('0'..='9');
    nofollow_chars.insert('_');
    b.set_nofollow(k, FilterEntry::Charset(nofollow_chars));
    b.set_start(k);
    let g = b.build().unwrap();

    let mut ctx = Context::new("ifx", g.start_head(), ParseConfig::default());
    assert!(!cnp_core::parse(&g, &mut ctx));
}

/// E6: `Id ::= letter (letter|digit)*` with reject = head-index pointing at
/// `Keyword ::= 'if'`. Input "if": Id's span [0,2) is rejected because the
/// sub-parse of Keyword over "if" succeeds, so the whole parse fails.
#[test]
fn e6_reject_subparse_rejects_keyword_shaped_identifier() {
    let mut b = GrammarBuilder::new();
    let letter = b.add_charset_terminal("letter", ('a'..='z').collect());
    let digit = b.add_charset_terminal("digit", ('0'..='9').collect());
    let id = b.ensure_head("Id");
    let tail = b.ensure_head("IdTail");
    b.add_production(id, vec![SymbolRefArg::Term(letter), SymbolRefArg::Head(tail)]);
    b.add_production(tail, vec![SymbolRefArg::Term(letter), SymbolRefArg::Head(tail)]);
    b.add_production(tail, vec![SymbolRefArg::Term(digit), SymbolRefArg::Head(tail)]);
    b.add_production(tail, vec![]);

    let keyword = b.ensure_head("Keyword");
    let if_lit = b.add_literal_terminal("if", "if");
    b.add_production(keyword, vec![SymbolRefArg::Term(if_lit)]);

    b.set_reject(id, FilterEntry::Head(keyword));
    b.set_start(id);
    let g = b.build().unwrap();

    let mut ctx = Context::new("if", g.start_head(), ParseConfig::default());
    assert!(!cnp_core::parse(&g, &mut ctx));
}

/// Extra coverage: precedence/associativity filtering keeps only the
/// declared-associativity derivation of an otherwise-ambiguous expression
/// grammar, exercising `Precedence`/`Assoc` end to end through the public API.
#[test]
fn precedence_filter_resolves_mixed_precedence_expression() {
    // E ::= E '+' E  (group 0, left)
    //     | E '*' E  (group 1, left)
    //     | digit
    let mut b = GrammarBuilder::new();
    let plus = b.add_charset_terminal("plus", charset(['+']));
    let star = b.add_charset_terminal("star", charset(['*']));
    let digit = b.add_charset_terminal("digit", ('1'..='9').collect());
    let e = b.ensure_head("E");
    let plus_body = b.add_production(e, vec![SymbolRefArg::Head(e), SymbolRefArg::Term(plus), SymbolRefArg::Head(e)]);
    let star_body = b.add_production(e, vec![SymbolRefArg::Head(e), SymbolRefArg::Term(star), SymbolRefArg::Head(e)]);
    b.add_production(e, vec![SymbolRefArg::Term(digit)]);
    b.set_start(e);
    b.set_precedence(e, plus_body, Precedence { group: 0, assoc: Assoc::Left });
    b.set_precedence(e, star_body, Precedence { group: 1, assoc: Assoc::Left });
    let g = b.build().unwrap();

    // "1+2*3": '*' binds tighter, so the top-level split must be the '+'
    // at position 1 (right operand "2*3" spans [2,5)).
    let mut ctx = Context::new("1+2*3", g.start_head(), ParseConfig::default());
    assert!(cnp_core::parse(&g, &mut ctx));

    let top = BsrKey::Prod { head: e, body: plus_body, i: 0, k: 5 };
    let pivots = ctx.bsr.get(&top).expect("a + at the top level survives filtering");
    assert_eq!(pivots.iter().copied().collect::<Vec<_>>(), vec![2]);
}
